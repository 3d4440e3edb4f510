use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("journey must contain at least one touchpoint")]
    EmptyJourney,

    #[error("unknown attribution model: {0}")]
    UnknownModel(String),

    #[error("at least 2 variants are required, got {found}")]
    InsufficientVariants { found: usize },

    #[error("variant `{0}` must have at least one visitor")]
    NonPositiveVisitors(String),

    #[error("variant `{variant}` has {conversions} conversions but only {visitors} visitors")]
    ConversionsExceedVisitors {
        variant: String,
        conversions: u64,
        visitors: u64,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("statistics error: {0}")]
    Statistics(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// True for caller mistakes that must be corrected before retrying.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            EngineError::EmptyJourney
                | EngineError::UnknownModel(_)
                | EngineError::InsufficientVariants { .. }
                | EngineError::NonPositiveVisitors(_)
                | EngineError::ConversionsExceedVisitors { .. }
                | EngineError::InvalidParameter(_)
        )
    }
}
