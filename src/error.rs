use rust_decimal::Decimal;
use thiserror::Error;

/// Input rejected before it reaches the API or the progress calculator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("a category must be selected")]
    MissingCategory,
    #[error("amount must be greater than 0 (got {0})")]
    NonPositiveAmount(Decimal),
    #[error("amount is too high (got {0}, max 1000000)")]
    AmountTooLarge(Decimal),
    #[error("month must be between 1 and 12 (got {0})")]
    MonthOutOfRange(u32),
    #[error("year must be between 2020 and 2100 (got {0})")]
    YearOutOfRange(i32),
    #[error("not a valid email address: {0:?}")]
    InvalidEmail(String),
    #[error("password must be 6 to 100 characters (got {0})")]
    PasswordLength(usize),
}

/// Failure talking to the finance API, remote or local.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("not authenticated")]
    Unauthorized,
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl ApiError {
    pub(crate) fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                ApiError::Conflict(msg.unwrap_or_else(|| e.to_string()))
            }
            other => ApiError::Storage(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<rusqlite::Error>() {
            Ok(sql) => sql.into(),
            Err(err) => ApiError::Storage(format!("{err:#}")),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
