//! The key-value store and its file format.

mod builder;
mod env;
mod error;
mod extract;
mod file;
mod parse;
mod source;
mod store;

pub use builder::ConfigBuilder;
pub use env::EnvSource;
pub use error::ConfigError;
pub use file::FileSource;
pub use parse::{
    is_valid_key, CommentBoundary, LoadReport, ParseOptions, SkipReason, SkippedLine, MAX_LINE_LEN,
};
pub use source::ConfigSource;
pub use store::Config;
