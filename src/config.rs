use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Defaults stamped onto newly created regions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionConfig {
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default)]
    pub description: String,
    /// Minecraft data version (2975 = 1.18.2)
    #[serde(default = "default_data_version")]
    pub minecraft_data_version: i32,
    /// Litematica schema version
    #[serde(default = "default_version")]
    pub version: i32,
}

fn default_author() -> String {
    "Author".to_string()
}

fn default_data_version() -> i32 {
    2975
}

fn default_version() -> i32 {
    6
}

impl Default for RegionConfig {
    fn default() -> Self {
        RegionConfig {
            author: default_author(),
            description: String::new(),
            minecraft_data_version: default_data_version(),
            version: default_version(),
        }
    }
}

impl RegionConfig {
    /// Parses a JSON settings object; missing keys fall back to the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
