//! JSON API
//!
//! String in, string out. Every call returns an `ApiResponse` envelope, even
//! when the request could not be parsed.

pub mod tournament_json;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::ValidationErrors;

use crate::error::TournamentError;
use crate::save::SaveError;

pub use tournament_json::*;

/// API version for schema compatibility
pub const API_VERSION: &str = "v1";

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
    pub schema_version: String,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            schema_version: API_VERSION.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn error(error: ApiError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            schema_version: API_VERSION.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Structured API error with codes and details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    pub details: Option<HashMap<String, serde_json::Value>>,
}

impl ApiError {
    pub fn new(code: &str, message: &str) -> Self {
        Self { code: code.to_string(), message: message.to_string(), details: None }
    }

    pub fn with_details(mut self, details: HashMap<String, serde_json::Value>) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<TournamentError> for ApiError {
    fn from(err: TournamentError) -> Self {
        ApiError::new(err.code(), &err.to_string())
    }
}

impl From<SaveError> for ApiError {
    fn from(err: SaveError) -> Self {
        ApiError::new("STORAGE_ERROR", &err.to_string())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let codes: Vec<serde_json::Value> =
                    errs.iter().map(|e| serde_json::Value::String(e.code.to_string())).collect();
                (field.to_string(), serde_json::Value::Array(codes))
            })
            .collect();
        ApiError::new("VALIDATION_FAILED", "Request failed validation").with_details(details)
    }
}
