use axum::http::StatusCode;
use thiserror::Error;

/// Local validation failures. Nothing is sent to the server when one of these
/// is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("habit name must not be empty")]
    EmptyName,
    #[error("habit unit must not be empty")]
    EmptyUnit,
    #[error("deleting a habit requires confirmation")]
    DeleteNotConfirmed,
    #[error("invalid date {0}")]
    InvalidDate(String),
    #[error("task title must not be empty")]
    EmptyTitle,
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("unknown theme '{0}'")]
    UnknownTheme(String),
    #[error("birth date lies in the future")]
    BirthInFuture,
    #[error("expected lifespan must be at least one year")]
    ZeroLifespan,
}

/// Failures reported by a record store, local or remote.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("habit {0} not found")]
    HabitNotFound(u64),
    #[error("task {0} not found")]
    TaskNotFound(u64),
    #[error("invalid date {year}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server responded with {status}: {message}")]
    Status { status: u16, message: String },
    #[error("storage failure: {0}")]
    Io(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::HabitNotFound(_) | StoreError::TaskNotFound(_) => {
                Self::not_found(err.to_string())
            }
            StoreError::InvalidDate { .. } => Self::bad_request(err.to_string()),
            _ => Self::internal(err),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_http_status() {
        assert_eq!(
            AppError::from(StoreError::HabitNotFound(4)).status,
            StatusCode::NOT_FOUND
        );
        let invalid = StoreError::InvalidDate {
            year: 2025,
            month: 2,
            day: 30,
        };
        assert_eq!(AppError::from(invalid).status, StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::from(StoreError::Io("disk full".into())).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(ValidationError::EmptyName).status,
            StatusCode::BAD_REQUEST
        );
    }
}
