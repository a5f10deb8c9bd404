use crate::fetch::FetchError;
use crate::store::StoreError;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;

/// Application-wide error types with user-friendly messages
#[derive(Debug)]
pub enum AppError {
    // Validation Errors
    InvalidInput { field: String, message: String },
    ResourceNotFound { resource: String },

    // Feed-related Errors
    FeedUnreachable,
    FeedParseError,

    // Store Errors
    StoreClosed,
    DatabaseError,
    ConnectionPoolError,

    // System Errors
    InternalError,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Validation Errors
            AppError::InvalidInput { field, message } => write!(f, "Invalid {}: {}", field, message),
            AppError::ResourceNotFound { resource } => write!(f, "{} not found", resource),

            // Feed-related Errors
            AppError::FeedUnreachable => write!(f, "Feed not found or inaccessible"),
            AppError::FeedParseError => write!(f, "Unable to parse feed - invalid format"),

            // Store Errors
            AppError::StoreClosed => write!(f, "Service is shutting down - request rejected"),
            AppError::DatabaseError => write!(f, "A database error occurred - please try again"),
            AppError::ConnectionPoolError => {
                write!(f, "Service temporarily unavailable - please try again")
            }

            // System Errors
            AppError::InternalError => write!(f, "An unexpected error occurred - please try again"),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code, message) = match self {
            // 400 Bad Request
            AppError::InvalidInput { .. } => (400, "INVALID_INPUT", self.to_string()),
            AppError::FeedParseError => (400, "FEED_PARSE_ERROR", self.to_string()),

            // 404 Not Found
            AppError::ResourceNotFound { .. } => (404, "RESOURCE_NOT_FOUND", self.to_string()),

            // 500 Internal Server Error
            AppError::DatabaseError => (500, "DATABASE_ERROR", self.to_string()),
            AppError::ConnectionPoolError => (500, "CONNECTION_POOL_ERROR", self.to_string()),
            AppError::InternalError => (500, "INTERNAL_ERROR", self.to_string()),

            // 502 Bad Gateway
            AppError::FeedUnreachable => (502, "FEED_UNREACHABLE", self.to_string()),

            // 503 Service Unavailable
            AppError::StoreClosed => (503, "STORE_CLOSED", self.to_string()),
        };

        // Log detailed error information for debugging
        match self {
            AppError::DatabaseError | AppError::ConnectionPoolError | AppError::InternalError => {
                log::error!("Server error: {:?}", self);
            }
            _ => {
                log::info!("Client error: {:?}", self);
            }
        }

        HttpResponse::build(actix_web::http::StatusCode::from_u16(status).unwrap()).json(json!({
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Helper functions for common error conversions
impl AppError {
    pub fn invalid_input(field: &str, message: &str) -> Self {
        AppError::InvalidInput {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn resource_not_found(resource: &str) -> Self {
        AppError::ResourceNotFound {
            resource: resource.to_string(),
        }
    }
}

/// Convert database connection pool errors
impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        log::error!("Database connection pool error: {}", err);
        AppError::ConnectionPoolError
    }
}

/// Convert posted-state store errors
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Closed => AppError::StoreClosed,
            StoreError::Pool(e) => e.into(),
            StoreError::Database(diesel::result::Error::NotFound) => {
                AppError::resource_not_found("Record")
            }
            StoreError::Database(e) => {
                log::error!("Database error: {}", e);
                AppError::DatabaseError
            }
            StoreError::Migration(e) => {
                log::error!("Migration error: {}", e);
                AppError::InternalError
            }
            StoreError::UnknownFeed(_) => AppError::resource_not_found("Feed"),
        }
    }
}

/// Convert feed fetch errors
impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Http(e) => {
                log::warn!("Error fetching feed: {}", e);
                AppError::FeedUnreachable
            }
            FetchError::Status(status) => {
                log::warn!("Feed returned HTTP {}", status);
                AppError::FeedUnreachable
            }
            FetchError::Parse(e) => {
                log::warn!("Feed parse error: {}", e);
                AppError::FeedParseError
            }
            FetchError::MalformedFeed(field) => {
                log::warn!("Feed has no usable {}", field);
                AppError::FeedParseError
            }
        }
    }
}
