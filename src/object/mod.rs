//! Objects that take their settings from a shared [`Config`].

mod option;

pub use option::{resolve_option, ConfigOption};

use std::cell::RefCell;
use std::fmt::Display;
use std::str::FromStr;

use crate::Config;

/// A type whose settings come from an optional, externally owned [`Config`].
///
/// Implementors usually embed a [`ConfigBinding`] and forward to it. Options
/// read through [`option`](Self::option) store their default in the config
/// the first time they are read.
///
/// ## Example
///
/// ```
/// use std::cell::RefCell;
/// use flatconf::{Config, ConfigBinding, ConfigOption, ConfigurableObject};
///
/// const PORT: ConfigOption<u16> = ConfigOption::new("PORT", 8080);
///
/// struct Server<'a> {
///     binding: ConfigBinding<'a>,
/// }
///
/// impl ConfigurableObject for Server<'_> {
///     fn config(&self) -> Option<&RefCell<Config>> {
///         self.binding.config()
///     }
///
///     fn object_name(&self) -> &str {
///         self.binding.object_name()
///     }
/// }
///
/// let shared = RefCell::new(Config::new());
/// let server = Server {
///     binding: ConfigBinding::new(Some(&shared), "server"),
/// };
///
/// assert_eq!(server.option(&PORT), 8080);
/// assert_eq!(shared.borrow().get_str("PORT"), Some("8080"));
/// ```
pub trait ConfigurableObject {
    /// The attached config, if any.
    fn config(&self) -> Option<&RefCell<Config>>;

    fn object_name(&self) -> &str;

    /// Resolves `option` against the attached config.
    fn option<T>(&self, option: &ConfigOption<T>) -> T
    where
        T: FromStr + Display + Default + Clone,
        Self: Sized,
    {
        option.get_shared(self.config())
    }
}

/// An optional borrowed [`Config`] paired with a fixed name.
///
/// The binding never owns the config; the caller keeps it alive for `'a`.
#[derive(Debug, Clone, Default)]
pub struct ConfigBinding<'a> {
    config: Option<&'a RefCell<Config>>,
    name: String,
}

impl<'a> ConfigBinding<'a> {
    pub fn new(config: Option<&'a RefCell<Config>>, name: impl Into<String>) -> Self {
        Self {
            config,
            name: name.into(),
        }
    }

    /// Creates a binding without a config; options resolve to their defaults.
    pub fn detached(name: impl Into<String>) -> Self {
        Self::new(None, name)
    }

    /// Creates a new builder for a `ConfigBinding`.
    pub fn builder() -> ConfigBindingBuilder<'a> {
        ConfigBindingBuilder::default()
    }

    pub fn is_attached(&self) -> bool {
        self.config.is_some()
    }
}

impl ConfigurableObject for ConfigBinding<'_> {
    fn config(&self) -> Option<&RefCell<Config>> {
        self.config
    }

    fn object_name(&self) -> &str {
        &self.name
    }
}

/// Builder for constructing a [`ConfigBinding`].
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct ConfigBindingBuilder<'a> {
    config: Option<&'a RefCell<Config>>,
    name: String,
}

impl<'a> ConfigBindingBuilder<'a> {
    /// Attaches a config to the binding.
    pub fn with_config(mut self, config: &'a RefCell<Config>) -> Self {
        self.config = Some(config);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn build(self) -> ConfigBinding<'a> {
        ConfigBinding {
            config: self.config,
            name: self.name,
        }
    }
}
