//! Error types for configuration, the generation provider and the query service.

/// Startup configuration problems. These are fatal: the assistant cannot run.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No credential in the environment nor in the config file.
    #[error("GEMINI_API_KEY environment variable not set (API_KEY or the config file's api_key also work)")]
    MissingCredential,

    /// The config file exists but could not be read or parsed.
    #[error("failed to read config file {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

/// Failures reported by a [`Generator`](crate::ai::Generator).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    /// The provider rejected the configured credential.
    #[error("credential rejected: {0}")]
    InvalidCredential(String),

    /// Transport failure, error status or malformed payload.
    #[error("generation request failed: {0}")]
    Request(String),
}

/// User-facing query failures. The Display text is shown as a bot message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("A chave de API configurada não é válida. Por favor, verifique.")]
    InvalidCredential,

    #[error("Não foi possível obter uma resposta do assistente. Tente novamente mais tarde.")]
    Unavailable,
}

impl From<GenerateError> for ServiceError {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::InvalidCredential(_) => ServiceError::InvalidCredential,
            GenerateError::Request(_) => ServiceError::Unavailable,
        }
    }
}
