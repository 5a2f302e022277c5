use tracing::debug;

use super::parse::{normalize_key, LoadReport};
use super::source::ConfigSource;
use super::{Config, ConfigError};

/// Applies environment variables named `<prefix><separator><KEY>`.
///
/// The part after the separator is upper-cased and becomes the key; it must
/// start with a letter like keys read from a file. Values are stored as-is.
/// Variables whose name or value is not valid Unicode are ignored.
#[derive(Debug, Clone)]
pub struct EnvSource {
    /// Prefix and separator joined, e.g. `MYAPP_`.
    lead: String,
}

impl EnvSource {
    /// # Panics
    ///
    /// Panics if `separator` is empty.
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        let separator: String = separator.into();
        assert!(!separator.is_empty(), "env separator must not be empty");
        let mut lead: String = prefix.into();
        lead.push_str(&separator);
        Self { lead }
    }

    fn matching_vars(&self) -> Vec<(String, String)> {
        let mut vars: Vec<(String, String)> = std::env::vars_os()
            .filter_map(|(name, value)| match (name.into_string(), value.into_string()) {
                (Ok(name), Ok(value)) => Some((name, value)),
                (Ok(name), Err(_)) => {
                    if name.starts_with(&self.lead) {
                        debug!(var = %name, "ignoring environment variable with non-Unicode value");
                    }
                    None
                }
                (Err(name), _) => {
                    debug!(var = ?name, "ignoring environment variable with non-Unicode name");
                    None
                }
            })
            .filter(|(name, _)| name.starts_with(&self.lead))
            .collect();
        vars.sort();
        vars
    }
}

impl ConfigSource for EnvSource {
    fn apply(&self, config: &mut Config) -> Result<LoadReport, ConfigError> {
        let mut report = LoadReport::default();

        for (var, value) in self.matching_vars() {
            let name = &var[self.lead.len()..];
            if name.is_empty() {
                continue;
            }

            match normalize_key(name) {
                Ok(key) => {
                    config.set(key, value);
                    report.applied += 1;
                }
                Err(reason) => debug!(var = %var, %reason, "ignoring environment variable"),
            }
        }

        Ok(report)
    }
}
