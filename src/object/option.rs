use std::cell::RefCell;
use std::fmt::Display;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::Config;

/// Returns the value of `param`, writing `default` into the store if absent.
///
/// - With a store that holds `param`, the stored value is converted with
///   [`Config::get`], so an unparsable value yields `T::default()`.
/// - With a store that lacks `param`, `default` is stored and returned.
/// - Without a store, `default` is returned and nothing is written.
pub fn resolve_option<T>(config: Option<&mut Config>, param: &str, default: T) -> T
where
    T: FromStr + Display + Default,
{
    match config {
        Some(config) if config.exists(param) => config.get(param),
        Some(config) => {
            debug!(param, default = %default, "storing config default");
            config.set(param, &default);
            default
        }
        None => default,
    }
}

/// A named setting with a default value.
///
/// ```
/// use flatconf::{Config, ConfigOption};
///
/// const PORT: ConfigOption<u16> = ConfigOption::new("PORT", 8080);
///
/// let mut config = Config::new();
/// assert_eq!(PORT.get(&mut config), 8080);
/// assert_eq!(config.get_str(PORT.param()), Some("8080"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigOption<T> {
    param: &'static str,
    default: T,
}

impl<T> ConfigOption<T> {
    pub const fn new(param: &'static str, default: T) -> Self {
        Self { param, default }
    }

    /// The key this option is stored under.
    pub const fn param(&self) -> &'static str {
        self.param
    }

    pub fn default_value(&self) -> T
    where
        T: Clone,
    {
        self.default.clone()
    }
}

impl<T> ConfigOption<T>
where
    T: FromStr + Display + Default + Clone,
{
    /// Resolves the option against `config`, storing the default if absent.
    pub fn get(&self, config: &mut Config) -> T {
        resolve_option(Some(config), self.param, self.default_value())
    }

    /// Resolves the option against an optional shared store.
    ///
    /// If the store is already mutably borrowed elsewhere, the default is
    /// returned and the store is left alone.
    pub fn get_shared(&self, config: Option<&RefCell<Config>>) -> T {
        let Some(cell) = config else {
            return self.default_value();
        };
        match cell.try_borrow_mut() {
            Ok(mut config) => self.get(&mut config),
            Err(_) => {
                warn!(param = self.param, "config store is borrowed, using default");
                self.default_value()
            }
        }
    }
}
