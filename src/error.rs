use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::form::validation::{Field, FieldError};

/// Failures talking to the booking backend
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to booking backend failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("booking backend rejected the request with {status}")]
    Rejected { status: u16, message: Option<String> },

    #[error("invalid response from booking backend: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Human readable reason supplied by the backend, if any
    pub fn upstream_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Failures of a form operation, before or instead of a submit
#[derive(Debug, Error)]
pub enum FormError {
    #[error("form has {} invalid field(s)", .0.len())]
    Invalid(Vec<FieldError>),

    #[error("a submission is already in flight")]
    AlreadySubmitting,

    #[error("time slot {0} is full")]
    SlotUnavailable(String),

    #[error("{0} cannot be set as a text field")]
    NotRegistered(Field),

    #[error("no form session {0}")]
    UnknownSession(String),

    #[error("submission for form {0} was interrupted")]
    Interrupted(String),
}

impl ResponseError for FormError {
    fn status_code(&self) -> StatusCode {
        match self {
            FormError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            FormError::AlreadySubmitting => StatusCode::CONFLICT,
            FormError::SlotUnavailable(_) => StatusCode::CONFLICT,
            FormError::NotRegistered(_) => StatusCode::BAD_REQUEST,
            FormError::UnknownSession(_) => StatusCode::NOT_FOUND,
            FormError::Interrupted(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            FormError::Invalid(errors) => json!({ "error": self.to_string(), "fields": errors }),
            _ => json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
