//! INI file configuration adapter.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

/// Section and key names are case-insensitive; `[rules]` keeps file order.
#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, String> {
        self.config.getint(section, key).map_err(|e| {
            format!(
                "'{}' is not an integer: {}",
                self.config.get(section, key).unwrap_or_default(),
                e
            )
        })
    }

    fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, String> {
        match self.config.get(section, key) {
            None => Ok(None),
            Some(value) => Self::parse_bool(&value)
                .map(Some)
                .ok_or_else(|| format!("'{}' is not a boolean", value)),
        }
    }

    fn entries(&self, section: &str) -> Vec<(String, String)> {
        self.config
            .get_map_ref()
            .get(&section.to_lowercase())
            .map(|keys| {
                keys.iter()
                    .filter_map(|(k, v)| v.as_ref().map(|v| (k.clone(), v.clone())))
                    .collect()
            })
            .unwrap_or_default()
    }
}
