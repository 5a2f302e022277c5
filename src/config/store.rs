use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, error};

use super::file::{load_config_file, write_config_file};
use super::parse::{
    parse_line, read_capped_line, truncate_line, LoadReport, ParseOptions, ParsedLine, SkippedLine,
};
use super::ConfigError;

/// A flat, key-ordered store of string values.
///
/// Values are kept as strings and converted on access. Files are read and
/// written in the `KEY = VALUE` format, one entry per line:
///
/// ```text
/// # network
/// PORT = 8080
/// HOST = localhost   # trailing comments are dropped
/// ```
///
/// ## Example
///
/// ```no_run
/// use flatconf::Config;
///
/// let mut config = Config::from_file("app.cfg")?;
/// let port: u16 = config.get("PORT");
/// config.set("PORT", port + 1);
/// config.write("app.cfg")?;
/// # Ok::<(), flatconf::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    entries: BTreeMap<String, String>,
    options: ParseOptions,
}

impl Config {
    /// Creates an empty store with default parse options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store and loads `path` into it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = Self::new();
        config.read(path)?;
        Ok(config)
    }

    /// Replaces the parse options used by later loads.
    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Returns the value of `key` converted to `T`.
    ///
    /// A missing key is treated as an empty string. When the conversion
    /// fails, `T::default()` is returned, so `get::<i32>` of a missing key is
    /// `0` and `get::<String>` is `""`. Use [`try_get`](Self::try_get) to tell
    /// these cases apart.
    pub fn get<T>(&self, key: &str) -> T
    where
        T: FromStr + Default,
    {
        let raw = self.get_str(key).unwrap_or("");
        raw.parse().unwrap_or_else(|_| {
            if self.exists(key) {
                debug!(
                    key,
                    value = raw,
                    ty = std::any::type_name::<T>(),
                    "config value not convertible, using default"
                );
            }
            T::default()
        })
    }

    /// Returns the value of `key` converted to `T`, or `None` if absent.
    pub fn try_get<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let Some(raw) = self.entries.get(key) else {
            return Ok(None);
        };
        raw.parse::<T>()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Conversion {
                key: key.to_string(),
                value: raw.clone(),
                target: std::any::type_name::<T>(),
                reason: e.to_string(),
            })
    }

    /// Returns the raw string stored under `key`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Stores the string form of `value` under `key`, replacing any previous
    /// value. Strings are stored unchanged.
    pub fn set<T>(&mut self, key: impl Into<String>, value: T)
    where
        T: fmt::Display,
    {
        self.entries.insert(key.into(), value.to_string());
    }

    pub fn exists(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Loads entries from the file at `path` on top of the current ones.
    ///
    /// Later lines override earlier ones and existing entries. Failures are
    /// logged and returned; entries read before an I/O error stay in the
    /// store.
    pub fn read(&mut self, path: impl AsRef<Path>) -> Result<LoadReport, ConfigError> {
        let path = path.as_ref();
        match load_config_file(self, path) {
            Ok(report) => {
                debug!(
                    path = %path.display(),
                    applied = report.applied,
                    skipped = report.skipped.len(),
                    "read configuration file"
                );
                Ok(report)
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to read configuration file");
                Err(e)
            }
        }
    }

    /// Writes all entries to `path` as `KEY = VALUE` lines, truncating the
    /// file first.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        write_config_file(self, path).map_err(|e| {
            error!(path = %path.display(), error = %e, "failed to write configuration file");
            e
        })
    }

    /// Loads entries from in-memory text.
    pub fn load_str(&mut self, text: &str) -> LoadReport {
        let mut report = LoadReport::default();
        for (idx, line) in text.lines().enumerate() {
            self.apply_line(idx + 1, line, false, &mut report);
        }
        report
    }

    /// Loads entries line by line from `reader`.
    ///
    /// Lines are read as bytes and capped before decoding, so a single long
    /// line never grows the buffer past the line limit. Bytes that are not
    /// valid UTF-8 are replaced and the line is parsed like any other.
    pub(crate) fn load_reader<R: BufRead>(&mut self, mut reader: R) -> std::io::Result<LoadReport> {
        let mut report = LoadReport::default();
        let cap = self.options.max_line_len.saturating_mul(4);
        let mut buf = Vec::new();
        let mut line_no = 0;

        while let Some(overflowed) = read_capped_line(&mut reader, &mut buf, cap)? {
            line_no += 1;
            let line = String::from_utf8_lossy(&buf);
            if let Cow::Owned(_) = line {
                debug!(line = line_no, "config line is not valid UTF-8");
            }
            self.apply_line(line_no, &line, overflowed, &mut report);
        }
        Ok(report)
    }

    fn apply_line(&mut self, line_no: usize, raw: &str, overflowed: bool, report: &mut LoadReport) {
        let (line, cut) = truncate_line(raw, self.options.max_line_len);
        if overflowed || cut {
            debug!(line = line_no, "config line truncated");
            report.truncated.push(line_no);
        }

        match parse_line(line, &self.options) {
            ParsedLine::Entry { key, value } => {
                self.entries.insert(key, value);
                report.applied += 1;
            }
            ParsedLine::Ignored => {}
            ParsedLine::Skipped(reason) => {
                debug!(line = line_no, %reason, "skipping config line");
                report.skipped.push(SkippedLine {
                    line: line_no,
                    reason,
                });
            }
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.entries {
            writeln!(f, "{key} = {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CommentBoundary, SkipReason};
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_get_missing_returns_default() {
        let config = Config::new();

        assert_eq!(config.get::<i32>("MISSING"), 0);
        assert_eq!(config.get::<String>("MISSING"), "");
        assert!(!config.get::<bool>("MISSING"));
    }

    #[test]
    fn test_get_unparsable_returns_default() {
        let mut config = Config::new();
        config.set("PORT", "eighty");

        assert_eq!(config.get::<u16>("PORT"), 0);
        assert_eq!(config.get::<String>("PORT"), "eighty");
    }

    #[test]
    fn test_set_and_get_typed() {
        let mut config = Config::new();
        config.set("PORT", 8080u16);
        config.set("RATIO", 0.25f64);
        config.set("DEBUG", true);
        config.set("NAME", String::from("demo"));

        assert_eq!(config.get_str("PORT"), Some("8080"));
        assert_eq!(config.get::<u16>("PORT"), 8080);
        assert_eq!(config.get::<f64>("RATIO"), 0.25);
        assert!(config.get::<bool>("DEBUG"));
        assert_eq!(config.get::<String>("NAME"), "demo");
    }

    #[test]
    fn test_set_overwrites() {
        let mut config = Config::new();
        config.set("A", 1);
        config.set("A", 2);

        assert_eq!(config.len(), 1);
        assert_eq!(config.get::<i32>("A"), 2);
    }

    #[test]
    fn test_try_get_distinguishes_missing_and_invalid() {
        let mut config = Config::new();
        config.set("PORT", "eighty");
        config.set("COUNT", 3);

        assert!(matches!(config.try_get::<u16>("MISSING"), Ok(None)));
        assert!(matches!(config.try_get::<u16>("COUNT"), Ok(Some(3))));
        let err = config.try_get::<u16>("PORT").unwrap_err();
        assert!(matches!(err, ConfigError::Conversion { ref key, .. } if key == "PORT"));
    }

    #[test]
    fn test_load_str_last_value_wins() {
        let mut config = Config::new();
        let report = config.load_str("A = 1\nB = 2\nA = 3\n");

        assert_eq!(report.applied, 3);
        assert_eq!(config.get::<i32>("A"), 3);
        assert_eq!(config.len(), 2);
    }

    #[test]
    fn test_load_str_reports_skipped_lines() {
        let mut config = Config::new();
        let report = config.load_str("# header\n\n1x=5\n_k=5\nnoise\nOK = yes\n");

        assert_eq!(report.applied, 1);
        assert_eq!(
            report.skipped,
            vec![
                SkippedLine {
                    line: 3,
                    reason: SkipReason::InvalidKeyStart('1')
                },
                SkippedLine {
                    line: 4,
                    reason: SkipReason::InvalidKeyStart('_')
                },
                SkippedLine {
                    line: 5,
                    reason: SkipReason::MissingSeparator
                },
            ]
        );
        assert!(!config.exists("1X"));
        assert!(!config.exists("_K"));
        assert!(config.exists("OK"));
    }

    #[test]
    fn test_report_is_clean() {
        let mut config = Config::new();

        assert!(config.load_str("# header\n\nA = 1\n").is_clean());
        assert!(!config.load_str("A = 1\nnoise\n").is_clean());

        let long = format!("LONG = {}", "x".repeat(2000));
        assert!(!config.load_str(&long).is_clean());
    }

    #[test]
    fn test_long_line_from_reader_is_capped() {
        let mut data = format!("LONG = {}", "y".repeat(100_000)).into_bytes();
        data.extend_from_slice(b"\nAFTER = 2\n");

        let mut config = Config::new();
        let report = config.load_reader(data.as_slice()).unwrap();

        assert_eq!(report.truncated, vec![1]);
        assert_eq!(config.get_str("LONG").map(str::len), Some(1023 - "LONG = ".len()));
        assert_eq!(config.get_str("AFTER"), Some("2"));
    }

    #[test]
    fn test_invalid_utf8_line_does_not_stop_reader() {
        let data: &[u8] = b"FIRST = 1\n# Gr\xf6\xdfe in mm\nNAME = caf\xe9\nSECOND = 2\n";

        let mut config = Config::new();
        let report = config.load_reader(data).unwrap();

        assert_eq!(report.applied, 3);
        assert!(report.skipped.is_empty());
        assert_eq!(config.get_str("FIRST"), Some("1"));
        assert_eq!(config.get_str("NAME"), Some("caf\u{fffd}"));
        assert_eq!(config.get_str("SECOND"), Some("2"));
    }

    #[test]
    fn test_long_line_truncated() {
        let mut config = Config::new();
        let long = format!("LONG = {}", "x".repeat(2000));
        let report = config.load_str(&long);

        assert_eq!(report.truncated, vec![1]);
        assert_eq!(config.get_str("LONG").map(str::len), Some(1023 - "LONG = ".len()));
    }

    #[test]
    fn test_legacy_comment_boundary() {
        let options = ParseOptions::default().with_comment_boundary(CommentBoundary::BeforeMarker);
        let mut config = Config::new().with_options(options);
        config.load_str("VAL = 10# ms\nOTHER = 10 # ms\n");

        assert_eq!(config.get_str("VAL"), Some("1"));
        assert_eq!(config.get_str("OTHER"), Some("10"));
    }

    #[test]
    fn test_display_in_key_order() {
        let mut config = Config::new();
        config.set("ZETA", 1);
        config.set("ALPHA", "a");

        assert_eq!(config.to_string(), "ALPHA = a\nZETA = 1\n");
    }

    #[test]
    fn test_read_write_round_trip() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "port = 8080").unwrap();
        writeln!(file, "HOST=localhost").unwrap();
        writeln!(file, "# comment").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.get::<u16>("PORT"), 8080);

        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.cfg");
        config.write(&out).unwrap();

        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            "HOST = localhost\nPORT = 8080\n"
        );
        let reread = Config::from_file(&out).unwrap();
        assert_eq!(reread, config);
    }

    #[test]
    fn test_read_missing_file_leaves_store() {
        let mut config = Config::new();
        config.set("KEEP", 1);

        let result = config.read("/nonexistent/path/app.cfg");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
        assert_eq!(config.get::<i32>("KEEP"), 1);
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let mut config = Config::new();
        config.set("A", 1);

        let result = config.write("/nonexistent/dir/app.cfg");

        assert!(matches!(result, Err(ConfigError::WriteError { .. })));
    }

    #[test]
    fn test_write_truncates_existing_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "OLD = value that is quite long").unwrap();

        let mut config = Config::new();
        config.set("NEW", 1);
        config.write(file.path()).unwrap();

        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "NEW = 1\n");
    }
}
