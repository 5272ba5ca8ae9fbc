/// Top-level error type. All public API functions return this.
#[derive(Debug, thiserror::Error)]
pub enum FormatsError {
    /// Auto-detection found no format, or more than one, for the input.
    #[error("unable to guess input format for {input}")]
    FormatDetection { input: String },

    /// An explicitly named input format is not registered or cannot be read.
    #[error("unknown input format: '{name}'")]
    UnknownFormat { name: String },

    /// An explicitly named output format is not registered or cannot be written.
    #[error("unknown output format: '{name}'")]
    UnknownOutputFormat { name: String },

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("Malformed {format} file: {detail}")]
    MalformedFile { format: String, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ReadError {
    pub(crate) fn malformed(format: &str, detail: impl Into<String>) -> Self {
        ReadError::MalformedFile {
            format: format.to_string(),
            detail: detail.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("Cannot write {format}: {detail}")]
    Unsupported { format: String, detail: String },

    #[error("Serialization failed: {0}")]
    Serialize(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
