//! INI file configuration adapter.

use crate::domain::error::SteptraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

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

    fn invalid(section: &str, key: &str, reason: String) -> SteptraderError {
        SteptraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, SteptraderError> {
        self.get_string(section, key)
            .map(|v| {
                v.parse::<i64>()
                    .map_err(|_| Self::invalid(section, key, format!("expected an integer, got {v:?}")))
            })
            .transpose()
    }

    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, SteptraderError> {
        self.get_string(section, key)
            .map(|v| {
                v.parse::<f64>()
                    .map_err(|_| Self::invalid(section, key, format!("expected a number, got {v:?}")))
            })
            .transpose()
    }
}
