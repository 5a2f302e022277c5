use std::path::Path;

use tracing::debug;

use super::env::EnvSource;
use super::file::FileSource;
use super::parse::ParseOptions;
use super::source::ConfigSource;
use super::{Config, ConfigError};

/// Builder for a [`Config`] layered from several sources.
///
/// Sources are applied in registration order. Each one overwrites the keys it
/// provides, so later sources win.
///
/// ## Example
///
/// ```no_run
/// use flatconf::Config;
///
/// // defaults -> local overrides -> environment
/// let config = Config::builder()
///     .with_file("config/default.cfg", true)
///     .with_file("config/local.cfg", false)
///     .with_env("MYAPP", "_")
///     .build()?;
///
/// let port: u16 = config.get("PORT");
/// # Ok::<(), flatconf::ConfigError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct ConfigBuilder {
    sources: Vec<Box<dyn ConfigSource>>,
    options: ParseOptions,
}

impl Config {
    /// Creates a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

impl ConfigBuilder {
    /// Adds a config file to be loaded.
    ///
    /// If `required` is `true`, the build will fail if the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(self, path: impl AsRef<Path>, required: bool) -> Self {
        self.with_source(FileSource::new(path.as_ref(), required))
    }

    /// Loads entries from environment variables with the given prefix.
    ///
    /// With prefix `MYAPP` and separator `_`, `MYAPP_PORT=9000` sets `PORT`.
    /// Variable names are upper-cased after the prefix is removed.
    ///
    /// # Panics
    ///
    /// Panics if `separator` is empty.
    pub fn with_env(self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.with_source(EnvSource::new(prefix, separator))
    }

    /// Adds a custom source.
    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Sets the parse options used for file sources and kept by the result.
    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the configuration by applying every source in order.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut config = Config::new().with_options(self.options);

        for source in &self.sources {
            let report = source.apply(&mut config)?;
            debug!(
                ?source,
                applied = report.applied,
                skipped = report.skipped.len(),
                "applied config source"
            );
        }

        Ok(config)
    }
}
