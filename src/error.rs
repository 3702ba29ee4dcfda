use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::db;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("this time slot is no longer available; please pick another")]
    SlotUnavailable,
    #[error("your reservation could not be recorded; please try again")]
    ReservationFailed,
    #[error("{0}")]
    DependencyExists(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Invalid(String),
    #[error("store unavailable: {0}")]
    Store(#[from] sqlx::Error),
}

impl ServiceError {
    fn code(&self) -> &'static str {
        match self {
            Self::SlotUnavailable => "slot_unavailable",
            Self::ReservationFailed => "reservation_failed",
            Self::DependencyExists(_) => "dependency_exists",
            Self::NotFound(_) => "not_found",
            Self::Invalid(_) => "invalid_request",
            Self::Store(_) => "store_unavailable",
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::SlotUnavailable | Self::DependencyExists(_) => StatusCode::CONFLICT,
            Self::ReservationFailed => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        if let Self::Store(err) = self {
            body["class"] = json!(db::classify(err).as_str());
        }
        HttpResponse::build(self.status_code()).json(body)
    }
}
