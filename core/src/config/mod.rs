mod load;
mod types;

pub use load::{
    apply_env_overrides, get_taskwatch_data_dir, load_default, load_from, ENV_API_URL, ENV_TOKEN,
    ENV_WS_URL,
};
pub use types::{
    ApiConfig, AppConfig, LoggingConfig, PollConfig, StreamConfig, TuiConfig,
};
