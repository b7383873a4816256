//! Utility functions for CLI commands

use crate::config::AbsaConfig;
use serde::de::DeserializeOwned;

/// Read input from file
pub fn read_input_file(path: &str) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("Failed to read file {}: {}", path, e))
}

/// Parse a JSON document from file
pub fn read_json_file<T: DeserializeOwned>(path: &str) -> Result<T, String> {
    let content = read_input_file(path)?;
    serde_json::from_str(&content).map_err(|e| format!("Failed to parse JSON in {}: {}", path, e))
}

/// Parse a JSON Lines file
pub fn read_jsonl_file<T: DeserializeOwned>(path: &str) -> Result<Vec<T>, String> {
    crate::dataset::read_jsonl(path).map_err(|e| format!("Failed to read {}: {}", path, e))
}

/// Load and validate the config file, or fall back to defaults
pub fn load_config(path: Option<&str>) -> Result<AbsaConfig, String> {
    let config = match path {
        Some(path) => AbsaConfig::from_file(path)
            .map_err(|e| format!("Failed to load config {}: {}", path, e))?,
        None => AbsaConfig::default(),
    };
    config
        .validate()
        .map_err(|e| format!("Invalid configuration: {}", e))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_without_path() {
        let config = load_config(None).unwrap();
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_missing_files_are_reported() {
        let err = read_input_file("/nonexistent/absa/input.json").unwrap_err();
        assert!(err.contains("/nonexistent/absa/input.json"));
        assert!(load_config(Some("/nonexistent/absa.toml")).is_err());
    }
}
