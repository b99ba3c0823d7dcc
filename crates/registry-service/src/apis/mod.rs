//! Request handlers for the registry API.
//!
//! Handlers stay thin: they validate request shape, pass the caller identity
//! and payload to the engine and map [`RegistryError`] onto [`APIError`].

pub mod access;
pub mod caller;
pub mod orders;
pub mod transactions;

use registry_core::{state::successors, RegistryError};
use registry_types::APIError;

/// Maps an engine failure to its HTTP representation.
pub fn to_api_error(err: RegistryError) -> APIError {
	let message = err.to_string();
	match err {
		RegistryError::Unauthorized { .. } => {
			tracing::warn!("Request rejected: {}", message);
			APIError::Forbidden {
				error_type: "UNAUTHORIZED".into(),
				message,
			}
		},
		RegistryError::DuplicateOrder(_) => APIError::Conflict {
			error_type: "DUPLICATE_ORDER".into(),
			message,
		},
		RegistryError::OrderNotFound(_) => APIError::NotFound {
			error_type: "ORDER_NOT_FOUND".into(),
			message,
		},
		RegistryError::InvalidTransition { from, to } => APIError::UnprocessableEntity {
			error_type: "INVALID_TRANSITION".into(),
			message,
			details: Some(serde_json::json!({
				"from": from,
				"to": to,
				"allowed": successors(from),
			})),
		},
		RegistryError::AlreadyApproved { .. } => APIError::Conflict {
			error_type: "ALREADY_APPROVED".into(),
			message,
		},
		RegistryError::AlreadyCommitted(_) => APIError::Conflict {
			error_type: "ALREADY_COMMITTED".into(),
			message,
		},
		RegistryError::LastAdminProtected => APIError::Conflict {
			error_type: "LAST_ADMIN_PROTECTED".into(),
			message,
		},
		RegistryError::InvalidAccount(_) => APIError::BadRequest {
			error_type: "INVALID_ACCOUNT".into(),
			message,
		},
		RegistryError::Storage(_) => {
			tracing::error!("Storage failure while handling request: {}", message);
			APIError::InternalServerError {
				error_type: "STORAGE_ERROR".into(),
				message: "Internal storage failure".into(),
			}
		},
	}
}

pub(crate) fn bad_request(error_type: &str, message: impl Into<String>) -> APIError {
	APIError::BadRequest {
		error_type: error_type.to_string(),
		message: message.into(),
	}
}
