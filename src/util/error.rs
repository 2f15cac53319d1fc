//! Error classification shared by every queue stage to decide ack vs. retry.
use anyhow::Error;
use reqwest::StatusCode;
use sqlx::Error as SqlxError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transient error (network hiccup, timeout, 5xx) — safe to retry.
    Retryable,
    /// Permanent error (bad input, 404, validation) — retrying won't help.
    NonRetryable,
    /// Unrecoverable error (bad config, corrupt data, auth failure).
    Fatal,
}

#[must_use]
pub fn classify_error(error: &Error) -> ErrorKind {
    if let Some(reqwest_err) = error.downcast_ref::<reqwest::Error>() {
        if reqwest_err.is_timeout() || reqwest_err.is_connect() {
            return ErrorKind::Retryable;
        }

        if let Some(status) = reqwest_err.status() {
            match status {
                StatusCode::INTERNAL_SERVER_ERROR
                | StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT
                | StatusCode::TOO_MANY_REQUESTS => return ErrorKind::Retryable,
                StatusCode::BAD_REQUEST
                | StatusCode::NOT_FOUND
                | StatusCode::UNPROCESSABLE_ENTITY => return ErrorKind::NonRetryable,
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return ErrorKind::Fatal,
                _ => {}
            }
        }
    }

    if let Some(sqlx_err) = error.downcast_ref::<SqlxError>() {
        match sqlx_err {
            SqlxError::PoolTimedOut | SqlxError::PoolClosed | SqlxError::Database(_) => {
                return ErrorKind::Retryable;
            }
            SqlxError::RowNotFound => return ErrorKind::NonRetryable,
            SqlxError::Configuration(_) => return ErrorKind::Fatal,
            _ => {}
        }
    }

    ErrorKind::NonRetryable
}

#[must_use]
pub fn is_retryable(error: &Error) -> bool {
    matches!(classify_error(error), ErrorKind::Retryable)
}

#[must_use]
pub fn is_fatal(error: &Error) -> bool {
    matches!(classify_error(error), ErrorKind::Fatal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn generic_error_is_non_retryable() {
        let error = anyhow!("validation failed");
        assert!(!is_retryable(&error));
        assert!(!is_fatal(&error));
    }

    #[test]
    fn row_not_found_is_non_retryable() {
        let error = Error::new(SqlxError::RowNotFound);
        assert_eq!(classify_error(&error), ErrorKind::NonRetryable);
    }

    #[test]
    fn pool_timeout_is_retryable() {
        let error = Error::new(SqlxError::PoolTimedOut);
        assert_eq!(classify_error(&error), ErrorKind::Retryable);
    }
}
