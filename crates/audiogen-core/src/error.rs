//! Error types for the Audiogen model tools.

/// Result type alias for Audiogen operations
pub type AudiogenResult<T> = Result<T, AudiogenError>;

/// Main error type for Audiogen operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AudiogenError {
    /// Invalid input error
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Error message describing the invalid input
        message: String,
    },

    /// Configuration error (missing environment variable, bad config file)
    #[error("{message}")]
    ConfigurationError {
        /// Error message describing the configuration issue
        message: String,
    },

    /// The model's artifacts are not present in the cache
    #[error("Model '{model}' is not installed. Run {hint} first")]
    ModelNotInstalled {
        /// Model identifier
        model: String,
        /// Command that installs the model
        hint: String,
    },

    /// Model loading error
    #[error("Model loading error: {message}")]
    ModelError {
        /// Error message describing the model loading failure
        message: String,
    },

    /// Network or download error
    #[error("Download failed: {message}")]
    DownloadError {
        /// Error message describing the download failure
        message: String,
    },

    /// Text-to-phoneme conversion failed
    #[error("Phonemization failed: {message}")]
    PhonemizerError {
        /// Error message describing the phonemizer failure
        message: String,
    },

    /// Generation failed
    #[error("Generation failed: {message}")]
    SynthesisError {
        /// Error message describing the failure
        message: String,
    },

    /// The backend returned no audio
    #[error("No audio generated")]
    EmptyOutput,

    /// Audio format or processing error
    #[error("Audio processing error: {message}")]
    AudioProcessingError {
        /// Error message describing the processing issue
        message: String,
    },

    /// File I/O error
    #[error("File I/O error: {message}")]
    FileError {
        /// Error message describing the file operation failure
        message: String,
    },

    /// The model has no inference runtime in this build
    #[error("{message}")]
    Unsupported {
        /// Error message naming the missing runtime
        message: String,
    },
}

impl AudiogenError {
    /// Create a new invalid input error
    #[must_use]
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    #[must_use]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Create a new model not installed error
    #[must_use]
    pub fn not_installed<M: Into<String>, H: Into<String>>(model: M, hint: H) -> Self {
        Self::ModelNotInstalled {
            model: model.into(),
            hint: hint.into(),
        }
    }

    /// Create a new model error
    #[must_use]
    pub fn model<S: Into<String>>(message: S) -> Self {
        Self::ModelError {
            message: message.into(),
        }
    }

    /// Create a new download error
    #[must_use]
    pub fn download<S: Into<String>>(message: S) -> Self {
        Self::DownloadError {
            message: message.into(),
        }
    }

    /// Create a new phonemizer error
    #[must_use]
    pub fn phonemizer<S: Into<String>>(message: S) -> Self {
        Self::PhonemizerError {
            message: message.into(),
        }
    }

    /// Create a new synthesis error
    #[must_use]
    pub fn synthesis<S: Into<String>>(message: S) -> Self {
        Self::SynthesisError {
            message: message.into(),
        }
    }

    /// Create a new audio processing error
    #[must_use]
    pub fn audio_processing<S: Into<String>>(message: S) -> Self {
        Self::AudioProcessingError {
            message: message.into(),
        }
    }

    /// Create a new file error
    #[must_use]
    pub fn file<S: Into<String>>(message: S) -> Self {
        Self::FileError {
            message: message.into(),
        }
    }

    /// Create a new unsupported runtime error
    #[must_use]
    pub fn unsupported<S: Into<String>>(message: S) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Check if this error is due to invalid user input or setup
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. }
                | Self::ConfigurationError { .. }
                | Self::ModelNotInstalled { .. }
        )
    }

    /// Get the error category for logging
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "input",
            Self::ConfigurationError { .. } => "configuration",
            Self::ModelNotInstalled { .. } => "not_installed",
            Self::ModelError { .. } => "model",
            Self::DownloadError { .. } => "download",
            Self::PhonemizerError { .. } => "phonemizer",
            Self::SynthesisError { .. } => "synthesis",
            Self::EmptyOutput => "empty_output",
            Self::AudioProcessingError { .. } => "audio_processing",
            Self::FileError { .. } => "file",
            Self::Unsupported { .. } => "unsupported",
        }
    }
}

// Convert from common error types
impl From<std::io::Error> for AudiogenError {
    fn from(err: std::io::Error) -> Self {
        Self::file(err.to_string())
    }
}

impl From<serde_json::Error> for AudiogenError {
    fn from(err: serde_json::Error) -> Self {
        Self::model(format!("JSON parse error: {err}"))
    }
}

impl From<toml::de::Error> for AudiogenError {
    fn from(err: toml::de::Error) -> Self {
        Self::configuration(format!("Invalid config file: {err}"))
    }
}

impl From<hound::Error> for AudiogenError {
    fn from(err: hound::Error) -> Self {
        Self::audio_processing(err.to_string())
    }
}

impl From<ort::Error> for AudiogenError {
    fn from(err: ort::Error) -> Self {
        Self::model(format!("ONNX Runtime: {err}"))
    }
}

impl From<hf_hub::api::tokio::ApiError> for AudiogenError {
    fn from(err: hf_hub::api::tokio::ApiError) -> Self {
        Self::download(err.to_string())
    }
}

impl From<anyhow::Error> for AudiogenError {
    fn from(err: anyhow::Error) -> Self {
        Self::download(format!("{err:#}"))
    }
}
