/// Why a selector search produced no options
#[derive(Debug, thiserror::Error)]
pub enum SelectorError {
    #[error("Backend reported an error: {message}")]
    Backend { message: String },

    #[error("Search request failed: {0:#}")]
    Transport(#[from] anyhow::Error),
}

impl SelectorError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
