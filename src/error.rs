// src/error.rs
use std::convert::Infallible;

use log::error;
use serde::Serialize;
use thiserror::Error;
use warp::http::StatusCode;
use warp::reject::Reject;
use warp::{Rejection, Reply};

#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("stock {0} not found")]
    NotFound(i64),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl PortfolioError {
    pub fn status(&self) -> StatusCode {
        match self {
            PortfolioError::NotFound(_) => StatusCode::NOT_FOUND,
            PortfolioError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Reject for PortfolioError {}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: u16,
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if let Some(e) = err.find::<PortfolioError>() {
        if let PortfolioError::Database(_) = e {
            error!("Store failure: {}", e);
        }
        (e.status(), e.to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("invalid stock payload: {}", e))
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "payload too large".to_string())
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "expected an application/json body".to_string(),
        )
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (
            StatusCode::LENGTH_REQUIRED,
            "a content-length header is required".to_string(),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        // Last before not-found: a sibling route's 405 must not mask the
        // rejection of the route that matched the path and method.
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else {
        error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal server error".to_string(),
        )
    };

    let body = ErrorBody {
        error: message,
        code: status.as_u16(),
    };
    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}
