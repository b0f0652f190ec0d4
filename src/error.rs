use std::io;

/// A problem with the configuration, detected before any device is polled.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no `{0}` section found")]
    MissingSection(&'static str),

    #[error("`{section}` section is missing the required key `{key}`")]
    MissingKey { section: String, key: String },

    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("syntax error in `{expr}`: {reason}")]
    Syntax { expr: String, reason: String },

    #[error("unknown device `{device}` referenced in `{expr}`")]
    UnknownDevice { expr: String, device: String },

    #[error("device `{device}` has no channel named `{channel}`")]
    UnknownChannel { device: String, channel: String },

    #[error("unknown variable `{name}` referenced in `{expr}`")]
    UnknownVariable { expr: String, name: String },

    #[error("device name `{0}` is used more than once")]
    DuplicateDevice(String),

    #[error("variable `{0}` is defined more than once")]
    DuplicateVariable(String),

    #[error("input driver `{0}` is not supported")]
    UnsupportedDriver(String),
}

/// Errors that prevent the remapper from starting or running.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
