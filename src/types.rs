// src/types.rs

use std::str::FromStr;

use serde::Deserialize;

/// Where per-task records and outcomes are persisted.
///
/// - `None`: nothing is written (default).
/// - `Text`: append one line per record to `<data_path>/<project_name>.txt`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    #[default]
    None,
    Text,
}

impl FromStr for StoreMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(StoreMode::None),
            "text" => Ok(StoreMode::Text),
            other => Err(format!(
                "invalid store mode: {other} (expected \"none\" or \"text\")"
            )),
        }
    }
}
