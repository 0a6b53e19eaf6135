use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use vitrola_core::{AdmissionError, ConfigError, PlayerError, RequestError};

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{resource}:{identifier} not found")]
    NotFound {
        resource: &'static str,
        identifier: String,
    },
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("Unknown internal error: {0}")]
    Unknown(String),
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.as_status_code(), self.to_string()).into_response()
    }
}

impl From<RequestError> for ServerError {
    fn from(value: RequestError) -> Self {
        match value {
            RequestError::NotFound(id) => Self::NotFound {
                resource: "request",
                identifier: id.to_string(),
            },
            e => Self::Conflict(e.to_string()),
        }
    }
}

impl From<AdmissionError> for ServerError {
    fn from(value: AdmissionError) -> Self {
        match value {
            AdmissionError::Request(e) => e.into(),
            e => Self::Conflict(e.to_string()),
        }
    }
}

impl From<PlayerError> for ServerError {
    fn from(value: PlayerError) -> Self {
        match value {
            PlayerError::InvalidVolume(_) => Self::InvalidInput(value.to_string()),
            e => Self::Conflict(e.to_string()),
        }
    }
}

impl From<ConfigError> for ServerError {
    fn from(value: ConfigError) -> Self {
        Self::InvalidInput(value.to_string())
    }
}
