use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entry of the backend tool catalog (`GET /tools`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub parameters: Value,
    #[serde(default)]
    pub required_permissions: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl ToolInfo {
    /// Case-insensitive match on name or description.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        term.is_empty()
            || self.name.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
    }
}

/// The catalog response, either `{ "tools": [...] }` or a bare array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "CatalogWire")]
pub struct ToolCatalog {
    pub tools: Vec<ToolInfo>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogWire {
    List(Vec<ToolInfo>),
    Wrapped {
        #[serde(default)]
        tools: Vec<ToolInfo>,
    },
}

impl From<CatalogWire> for ToolCatalog {
    fn from(w: CatalogWire) -> Self {
        match w {
            CatalogWire::List(tools) | CatalogWire::Wrapped { tools } => ToolCatalog { tools },
        }
    }
}
