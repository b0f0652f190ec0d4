//! Configuration file loading.
//!
//! The TOML document is flattened into a list of [`Section`]s: a table `[variables]` becomes one
//! section of kind `variables`, an array of tables `[[input]]` becomes one `input` section per
//! element. Values are kept as strings; their meaning is up to the consumer. TOML integers also
//! keep their numeric value, so `vendor = 0x1234` isn't re-read as a hexadecimal string.

use std::{fs, path::Path};

use toml::{Table, Value};

use crate::error::{ConfigError, Error};

/// A parsed configuration file.
#[derive(Debug, Clone, Default)]
pub struct Config {
    sections: Vec<Section>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::io(format!("failed to read `{}`", path.display()), e))?;
        log::debug!("loaded configuration from `{}`", path.display());
        Ok(Self::parse(&text)?)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let table: Table = text.parse()?;
        let mut sections = Vec::new();
        for (kind, value) in table {
            match value {
                Value::Table(table) => sections.push(Section::from_table(&kind, table)?),
                Value::Array(array) => {
                    for value in array {
                        let Value::Table(table) = value else {
                            return Err(ConfigError::InvalidValue {
                                key: kind,
                                reason: "expected an array of tables".into(),
                            });
                        };
                        sections.push(Section::from_table(&kind, table)?);
                    }
                }
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: kind,
                        reason: "top-level keys must be sections".into(),
                    });
                }
            }
        }
        Ok(Self { sections })
    }

    /// Returns all sections of the given kind, in file order.
    pub fn sections<'a>(&'a self, kind: &str) -> impl Iterator<Item = &'a Section> {
        self.sections.iter().filter(move |s| s.kind == kind)
    }

    /// Returns the first section of the given kind.
    pub fn section(&self, kind: &str) -> Option<&Section> {
        self.sections(kind).next()
    }
}

/// Converts a setting written as a TOML integer.
fn integer<T: TryFrom<u64>>(key: &str, value: i64) -> Result<Option<T>, ConfigError> {
    u64::try_from(value)
        .ok()
        .and_then(|v| T::try_from(v).ok())
        .map(Some)
        .ok_or_else(|| ConfigError::InvalidValue {
            key: key.into(),
            reason: format!("`{value}` is out of range"),
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    key: String,
    text: String,
    /// Set if the value was written as a TOML integer.
    integer: Option<i64>,
}

/// A named group of key/value settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    kind: String,
    entries: Vec<Entry>,
}

impl Section {
    /// Creates a section from textual settings.
    pub fn new(kind: impl Into<String>, entries: Vec<(String, String)>) -> Self {
        Self {
            kind: kind.into(),
            entries: entries
                .into_iter()
                .map(|(key, text)| Entry {
                    key,
                    text,
                    integer: None,
                })
                .collect(),
        }
    }

    fn from_table(kind: &str, table: Table) -> Result<Self, ConfigError> {
        let entries = table
            .into_iter()
            .map(|(key, value)| {
                let integer = value.as_integer();
                let text = match value {
                    Value::String(s) => s,
                    Value::Integer(i) => i.to_string(),
                    Value::Float(f) => f.to_string(),
                    Value::Boolean(b) => b.to_string(),
                    _ => {
                        return Err(ConfigError::InvalidValue {
                            key: format!("{kind}.{key}"),
                            reason: "expected a string, number or boolean".into(),
                        });
                    }
                };
                Ok(Entry { key, text, integer })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self {
            kind: kind.into(),
            entries,
        })
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns all entries, in file order, including empty ones.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|e| (e.key.as_str(), e.text.as_str()))
    }

    fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Returns the value of `key`, or `None` if it is missing or empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entry(key)
            .map(|e| e.text.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key).ok_or_else(|| ConfigError::MissingKey {
            section: self.kind.clone(),
            key: key.into(),
        })
    }

    /// Parses `key` as an integer, accepting decimal or `0x`-prefixed hexadecimal.
    pub fn get_int<T: TryFrom<u64>>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        if let Some(value) = self.entry(key).and_then(|e| e.integer) {
            return integer(key, value);
        }
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        let invalid = |reason: &str| ConfigError::InvalidValue {
            key: key.into(),
            reason: format!("`{value}` {reason}"),
        };
        let parsed = match value
            .strip_prefix("0x")
            .or_else(|| value.strip_prefix("0X"))
        {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => value.parse(),
        }
        .map_err(|_| invalid("is not a number"))?;
        T::try_from(parsed)
            .map(Some)
            .map_err(|_| invalid("is out of range"))
    }

    /// Parses `key` as a hexadecimal integer, with or without a `0x` prefix.
    ///
    /// Only strings are read as hexadecimal. TOML integers are taken as they are, so `0x045e`
    /// and `1118` are the same value.
    pub fn get_hex<T: TryFrom<u64>>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        if let Some(value) = self.entry(key).and_then(|e| e.integer) {
            return integer(key, value);
        }
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        let invalid = |reason: &str| ConfigError::InvalidValue {
            key: key.into(),
            reason: format!("`{value}` {reason}"),
        };
        let digits = value
            .strip_prefix("0x")
            .or_else(|| value.strip_prefix("0X"))
            .unwrap_or(value);
        let parsed =
            u64::from_str_radix(digits, 16).map_err(|_| invalid("is not a hexadecimal number"))?;
        T::try_from(parsed)
            .map(Some)
            .map_err(|_| invalid("is out of range"))
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Some(true)),
            "false" | "no" | "off" | "0" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue {
                key: key.into(),
                reason: format!("`{value}` is not a boolean"),
            }),
        }
    }
}
