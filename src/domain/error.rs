//! Domain error types.

/// Reasons a position-size calculation is rejected.
///
/// Incomplete input (a field that does not parse as a number) is not an error:
/// the sizer returns `Ok(None)` for it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SizingError {
    #[error("all values must be positive and risk must be at most 100%")]
    OutOfRange,

    #[error("entry and stop loss cannot be the same price")]
    EqualPrices,

    #[error("pip distance is zero, adjust your entry or stop loss")]
    ZeroPipDistance,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChecklistError {
    #[error("unknown checklist item: {0}")]
    UnknownItem(String),

    #[error("checklist item {0} is already answered, reset to change it")]
    AlreadyAnswered(String),

    #[error("checklist is incomplete: {answered}/{total} items answered")]
    Incomplete { answered: usize, total: usize },

    #[error("checklist has failed items, use the override to log anyway")]
    NotValid,
}

/// Top-level error type for tradeflow.
#[derive(Debug, thiserror::Error)]
pub enum TradeflowError {
    #[error("store error: {reason}")]
    Store { reason: String },

    #[error("store query error: {reason}")]
    StoreQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown pair: {0}")]
    UnknownPair(String),

    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error(transparent)]
    Sizing(#[from] SizingError),

    #[error(transparent)]
    Checklist(#[from] ChecklistError),

    #[error("calendar source error: {reason}")]
    Calendar { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TradeflowError> for std::process::ExitCode {
    fn from(err: &TradeflowError) -> Self {
        let code: u8 = match err {
            TradeflowError::Io(_) => 1,
            TradeflowError::ConfigParse { .. } | TradeflowError::ConfigInvalid { .. } => 2,
            TradeflowError::Store { .. } | TradeflowError::StoreQuery { .. } => 3,
            TradeflowError::UnknownPair(_)
            | TradeflowError::MissingField { .. }
            | TradeflowError::Sizing(_)
            | TradeflowError::Checklist(_) => 4,
            TradeflowError::Calendar { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
