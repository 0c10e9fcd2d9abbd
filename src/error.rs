use thiserror::Error;

/// Terminal failure of a run. Each variant maps to a process exit code.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("BLS fetch failed: {0}")]
    Fetch(String),

    #[error("Unexpected data shape ({context}): {message}")]
    DataShape { context: String, message: String },

    #[error("Join dropped {dropped} period(s) present in only one series")]
    JoinMismatch { dropped: usize },

    #[error("Render failed: {0}")]
    Render(String),
}

impl AppError {
    pub fn data_shape(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataShape {
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Fetch(_) => 3,
            Self::DataShape { .. } | Self::JoinMismatch { .. } => 4,
            Self::Render(_) => 5,
        }
    }
}
