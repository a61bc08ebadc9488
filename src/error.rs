//! Error types for voxsplice.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoxspliceError {
    // Engine errors
    #[error("Malformed audio: {message}")]
    MalformedAudio { message: String },

    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter { name: String, message: String },

    #[error("Fragment {index} failed: {source}")]
    Fragment {
        index: usize,
        #[source]
        source: Box<VoxspliceError>,
    },

    // Upload decoding errors
    #[error("Unsupported audio format: {message}")]
    UnsupportedFormat { message: String },

    // Configuration errors
    #[error("Failed to serialize configuration: {message}")]
    ConfigSerialize { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Manifest errors
    #[error("Invalid manifest: {message}")]
    Manifest { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl VoxspliceError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedAudio {
            message: message.into(),
        }
    }

    pub(crate) fn invalid(name: &str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn manifest(message: impl Into<String>) -> Self {
        Self::Manifest {
            message: message.into(),
        }
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, VoxspliceError>;
