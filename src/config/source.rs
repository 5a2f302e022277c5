use super::parse::LoadReport;
use super::{Config, ConfigError};

/// Something that can contribute entries to a [`Config`].
///
/// Sources overwrite entries already present in the store, so applying them
/// in sequence gives later sources precedence.
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    fn apply(&self, config: &mut Config) -> Result<LoadReport, ConfigError>;
}
