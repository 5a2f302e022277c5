//! File-based configuration source and file I/O.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error};

use super::parse::LoadReport;
use super::source::ConfigSource;
use super::{Config, ConfigError};

/// Overlays the `KEY = VALUE` lines of one file onto an existing store.
///
/// Entries from the file replace entries already in the store; keys the file
/// does not mention are kept. A missing optional file leaves the store as it
/// was, a missing required one fails with [`ConfigError::FileNotFound`].
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    required: bool,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, required: bool) -> Self {
        Self {
            path: path.into(),
            required,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileSource {
    fn apply(&self, config: &mut Config) -> Result<LoadReport, ConfigError> {
        match load_config_file(config, &self.path) {
            Err(ConfigError::FileNotFound(_)) if !self.required => {
                debug!(path = %self.path.display(), "optional config file not found");
                Ok(LoadReport::default())
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "failed to load config file");
                Err(e)
            }
            ok => ok,
        }
    }
}

/// Reads the file at `path` into `config`.
///
/// The file handle lives only for this call. Entries read before an I/O
/// error remain applied.
pub(crate) fn load_config_file(config: &mut Config, path: &Path) -> Result<LoadReport, ConfigError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    config
        .load_reader(BufReader::new(file))
        .map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Creates or truncates `path` and writes every entry of `config` to it.
pub(crate) fn write_config_file(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let write_error = |source: std::io::Error| ConfigError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(File::create(path).map_err(write_error)?);
    write!(writer, "{config}").map_err(write_error)?;
    writer.flush().map_err(write_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_source_loads_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "key = value").unwrap();

        let source = FileSource::new(file.path(), true);
        let mut config = Config::new();
        let report = source.apply(&mut config).unwrap();

        assert_eq!(report.applied, 1);
        assert_eq!(config.get_str("KEY"), Some("value"));
    }

    #[test]
    fn test_file_source_required_missing() {
        let source = FileSource::new("/nonexistent/path/app.cfg", true);
        let result = source.apply(&mut Config::new());

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_file_source_optional_missing() {
        let source = FileSource::new("/nonexistent/path/app.cfg", false);
        let mut config = Config::new();
        let report = source.apply(&mut config).unwrap();

        assert_eq!(report, LoadReport::default());
        assert!(config.is_empty());
    }

    #[test]
    fn test_invalid_utf8_comment_keeps_later_entries() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"FIRST = 1\n# Gr\xf6\xdfe in mm\nSECOND = 2\n")
            .unwrap();

        let mut config = Config::new();
        let report = load_config_file(&mut config, file.path()).unwrap();

        assert_eq!(report.applied, 2);
        assert_eq!(config.get_str("FIRST"), Some("1"));
        assert_eq!(config.get_str("SECOND"), Some("2"));
    }

    #[test]
    fn test_file_source_overlays_existing_entries() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "PORT = 9000").unwrap();

        let mut config = Config::new();
        config.set("PORT", 8080);
        config.set("HOST", "localhost");
        FileSource::new(file.path(), true).apply(&mut config).unwrap();

        assert_eq!(config.get::<u16>("PORT"), 9000);
        assert_eq!(config.get_str("HOST"), Some("localhost"));
    }
}
