// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps `BlmError` onto the HTTP status codes of spec.md §6/§7.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use blm_core::BlmError;
use serde_json::json;

pub struct AppError(pub BlmError);

impl From<BlmError> for AppError {
    fn from(e: BlmError) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            BlmError::LimitExceeded
            | BlmError::Conflict
            | BlmError::IllegalTransition { .. }
            | BlmError::IllegalState { .. }
            | BlmError::AlreadySet { .. } => StatusCode::CONFLICT,
            BlmError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            BlmError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            BlmError::NotFound => StatusCode::NOT_FOUND,
            BlmError::OrchestratorFailed(_) => StatusCode::BAD_GATEWAY,
            BlmError::Unauthorized => StatusCode::UNAUTHORIZED,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
