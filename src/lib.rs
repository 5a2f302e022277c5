pub mod config;
pub mod object;

pub use config::{Config, ConfigBuilder, ConfigError, LoadReport, ParseOptions};
pub use object::{resolve_option, ConfigBinding, ConfigOption, ConfigurableObject};
