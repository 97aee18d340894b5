use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use registry_core::DomainError;
use registry_infra::residents::RepositoryError;

/// The resident operation a failure belongs to; decides the caller-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SaveBulk,
    Save,
    Fetch,
    FetchAll,
    Update,
    Delete,
}

impl Operation {
    fn invalid_message(self) -> &'static str {
        match self {
            Operation::SaveBulk => "No residents provided",
            Operation::Save => "All fields are required",
            Operation::Update => "At least one field is required to update",
            Operation::Fetch | Operation::FetchAll | Operation::Delete => "Invalid request",
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            Operation::SaveBulk => "Failed to save bulk residents",
            Operation::Save => "Failed to save resident",
            Operation::Fetch => "Failed to fetch resident",
            Operation::FetchAll => "Failed to fetch residents",
            Operation::Update => "Failed to update resident",
            Operation::Delete => "Failed to delete resident",
        }
    }
}

pub fn domain_error_to_response(op: Operation, err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(detail) => {
            tracing::debug!(operation = ?op, %detail, "rejected request");
            json_error(StatusCode::BAD_REQUEST, "validation_error", op.invalid_message())
        }
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "Resident not found"),
    }
}

/// Store failures are logged in full but answered with a generic message only.
pub fn repository_error_to_response(op: Operation, err: RepositoryError) -> axum::response::Response {
    match err {
        RepositoryError::Domain(e) => domain_error_to_response(op, e),
        RepositoryError::Store(e) => {
            tracing::error!(operation = ?op, error = %e, "store operation failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", op.failure_message())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
