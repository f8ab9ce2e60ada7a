use std::path::{Path, PathBuf};

use super::types::AppConfig;

pub const ENV_API_URL: &str = "TASKWATCH_API_URL";
pub const ENV_WS_URL: &str = "TASKWATCH_WS_URL";
pub const ENV_TOKEN: &str = "TASKWATCH_TOKEN";

/// Get the default taskwatch data directory: ~/.taskwatch
pub fn get_taskwatch_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".taskwatch"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    let data_dir = get_taskwatch_data_dir()?;
    load_from(&data_dir, Path::new("taskwatch.toml"))
}

/// Load with explicit locations. `data_dir/config.toml` wins over
/// `local_config`; defaults apply when neither exists.
pub fn load_from(data_dir: &Path, local_config: &Path) -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.taskwatch/config.toml
    let home_config = data_dir.join("config.toml");

    let mut cfg: AppConfig = if home_config.exists() {
        read_config(&home_config)?
    } else if local_config.exists() {
        read_config(local_config)?
    } else {
        AppConfig::default()
    };

    // Log directory defaults to the data directory
    if cfg
        .logging
        .directory
        .as_ref()
        .map_or(true, |s| s.trim().is_empty())
    {
        cfg.logging.directory = Some(data_dir.join("logs").to_string_lossy().to_string());
    }

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    Ok(cfg)
}

fn read_config(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)?;
    toml::from_str::<AppConfig>(&s)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))
}

/// Environment variable overrides (Priority 0: highest after CLI flags)
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, var: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());
    if let Some(v) = non_empty(ENV_API_URL) {
        cfg.api.base_url = v;
    }
    if let Some(v) = non_empty(ENV_WS_URL) {
        cfg.api.ws_url = v;
    }
    if let Some(v) = non_empty(ENV_TOKEN) {
        cfg.api.token = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_from(dir.path(), &dir.path().join("missing.toml")).unwrap();
        assert_eq!(cfg.poll.interval_ms, 2000);
        assert_eq!(cfg.stream.initial_backoff_ms, 500);
        assert_eq!(cfg.stream.max_backoff_ms, 10_000);
        assert!(cfg.logging.directory.unwrap().ends_with("logs"));
    }

    #[test]
    fn test_home_config_wins_over_local() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[api]\nbase_url = \"http://home:1\"\n",
        )
        .unwrap();
        let local = dir.path().join("taskwatch.toml");
        std::fs::write(&local, "[api]\nbase_url = \"http://local:2\"\n[poll]\ninterval_ms = 50\n").unwrap();

        let cfg = load_from(dir.path(), &local).unwrap();
        assert_eq!(cfg.api.base_url, "http://home:1");
        assert_eq!(cfg.poll.interval_ms, 2000);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let cfg: AppConfig = toml::from_str("[stream]\nenabled = false\n").unwrap();
        assert!(!cfg.stream.enabled);
        assert_eq!(cfg.stream.channel_capacity, 256);
        assert_eq!(cfg.tui.update_interval_ms, 100);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "https://tasks.example.com"),
            (ENV_TOKEN, "secret"),
            (ENV_WS_URL, "  "),
        ]
        .into_iter()
        .collect();
        let mut cfg = AppConfig::default();
        apply_env_overrides(&mut cfg, |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.api.base_url, "https://tasks.example.com");
        assert_eq!(cfg.api.token(), Some("secret"));
        assert_eq!(cfg.api.resolved_ws_url(), "wss://tasks.example.com");
    }

    #[test]
    fn test_session_config_from_app_config() {
        let cfg: AppConfig = toml::from_str("[poll]\ninterval_ms = 750\n").unwrap();
        let session = cfg.session_config();
        assert_eq!(session.poll_interval.as_millis(), 750);
        assert!(session.stream_enabled);
    }
}
