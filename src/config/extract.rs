//! Typed extraction of the whole store through serde.
//!
//! Keys are matched to field names in lower case, so `PORT` fills `port` and
//! `LOG_LEVEL` fills `log_level`. Each value is parsed into whatever type the
//! field asks for; an empty value deserializes as `None` for `Option` fields.

use std::fmt;
use std::str::FromStr;

use serde::de::value::{Error as DeError, MapDeserializer};
use serde::de::{self, DeserializeOwned, Deserializer, IntoDeserializer, Visitor};
use serde::forward_to_deserialize_any;

use super::{Config, ConfigError};

impl Config {
    /// Deserializes the store into `T`.
    ///
    /// ## Example
    ///
    /// ```
    /// use flatconf::Config;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Server {
    ///     host: String,
    ///     port: u16,
    /// }
    ///
    /// let mut config = Config::new();
    /// config.load_str("HOST = localhost\nPORT = 8080\n");
    ///
    /// let server: Server = config.extract()?;
    /// assert_eq!(server.port, 8080);
    /// # Ok::<(), flatconf::ConfigError>(())
    /// ```
    pub fn extract<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        let entries = self
            .iter()
            .map(|(key, value)| (key.to_ascii_lowercase(), FlatValue { key, value }));
        let map: MapDeserializer<'_, _, DeError> = MapDeserializer::new(entries);
        Ok(T::deserialize(map)?)
    }
}

/// A single stored string, parsed on demand into the requested type.
#[derive(Debug)]
struct FlatValue<'a> {
    key: &'a str,
    value: &'a str,
}

impl FlatValue<'_> {
    fn parse<T>(&self) -> Result<T, DeError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.value.parse().map_err(|e| {
            de::Error::custom(format!(
                "invalid value {:?} for {}: {}",
                self.value, self.key, e
            ))
        })
    }
}

impl<'de> IntoDeserializer<'de, DeError> for FlatValue<'_> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
                visitor.$visit(self.parse()?)
            }
        )*
    };
}

impl<'de> Deserializer<'de> for FlatValue<'_> {
    type Error = DeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        visitor.visit_str(self.value)
    }

    deserialize_parsed! {
        deserialize_bool => visit_bool,
        deserialize_i8 => visit_i8,
        deserialize_i16 => visit_i16,
        deserialize_i32 => visit_i32,
        deserialize_i64 => visit_i64,
        deserialize_u8 => visit_u8,
        deserialize_u16 => visit_u16,
        deserialize_u32 => visit_u32,
        deserialize_u64 => visit_u64,
        deserialize_f32 => visit_f32,
        deserialize_f64 => visit_f64,
        deserialize_char => visit_char,
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        if self.value.is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DeError> {
        visitor.visit_enum(<&str as IntoDeserializer<'de, DeError>>::into_deserializer(self.value))
    }

    forward_to_deserialize_any! {
        str string bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}
