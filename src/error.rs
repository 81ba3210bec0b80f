use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duckdb: {0}")]
    Duckdb(#[from] duckdb::Error),

    #[error("code store lock poisoned")]
    Poisoned,

    #[error("duplicate procedure code {0:?}")]
    DuplicateCode(String),

    #[error("invalid procedure code record {code:?}: {reason}")]
    InvalidRecord { code: String, reason: String },
}

/// Failure of a lookup that requires the code to exist.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("procedure code {0:?} not found")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub details: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn with_details(message: impl Into<String>, details: Vec<ValidationIssue>) -> Self {
        Self {
            message: message.into(),
            details,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Code not found")]
    NotFound,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{message}")]
    Internal {
        message: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    /// Builds a mapper for `map_err` that tags a store failure with the route's message.
    pub fn internal(message: &'static str) -> impl FnOnce(StoreError) -> ApiError {
        move |source| ApiError::Internal { message, source }
    }

    pub fn from_lookup(err: LookupError, message: &'static str) -> ApiError {
        match err {
            LookupError::NotFound(_) => ApiError::NotFound,
            LookupError::Store(source) => ApiError::Internal { message, source },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a [ValidationIssue]>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::Internal { message, source } = &self {
            tracing::error!("{}: {}", message, source);
        }

        let details = match &self {
            ApiError::Validation(v) if !v.details.is_empty() => Some(v.details.as_slice()),
            _ => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}
