//! API types for the registry HTTP API.
//!
//! This module defines the request and response bodies for the `/api`
//! endpoints and the structured error type rendered for failed requests.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Address, Hash256, OrderStatus, Role, UnknownStatus};

/// Request body for issuing an order.
///
/// Exactly one of `content_hash` and `content` must be present. Raw content is
/// hashed with the registry's configured commitment algorithm.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueOrderRequest {
	pub id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub content_hash: Option<Hash256>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub content: Option<String>,
}

/// A status given either by name or by legacy ordinal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusInput {
	Ordinal(u8),
	Name(String),
}

impl StatusInput {
	pub fn resolve(&self) -> Result<OrderStatus, UnknownStatus> {
		match self {
			StatusInput::Ordinal(ordinal) => OrderStatus::from_ordinal(*ordinal)
				.ok_or_else(|| UnknownStatus(ordinal.to_string())),
			StatusInput::Name(name) => name.parse(),
		}
	}
}

/// Request body for updating an order status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
	pub status: StatusInput,
}

/// Request body for adding a signer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetSignerRequest {
	pub account: Address,
}

/// Request body for assigning a role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetRoleRequest {
	pub role: Role,
}

/// Request body for submitting a digest for consensus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTransactionRequest {
	pub digest: Hash256,
}

/// Request body for the digest helper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestRequest {
	pub content: String,
}

/// Response body of the digest helper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestResponse {
	pub digest: Hash256,
	pub algorithm: String,
}

/// Current signer set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignersResponse {
	pub signers: Vec<Address>,
}

/// Role held by an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleResponse {
	pub account: Address,
	pub role: Role,
}

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
	/// Additional error context
	pub details: Option<serde_json::Value>,
	/// Suggested retry delay in seconds
	#[serde(rename = "retryAfter")]
	pub retry_after: Option<u64>,
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Malformed request (400)
	BadRequest { error_type: String, message: String },
	/// Caller identity missing or unreadable (401)
	Unauthenticated { message: String },
	/// Caller lacks the required role (403)
	Forbidden { error_type: String, message: String },
	/// Record not found (404)
	NotFound { error_type: String, message: String },
	/// Request conflicts with current ledger state (409)
	Conflict { error_type: String, message: String },
	/// Request violates a business rule (422)
	UnprocessableEntity {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Internal server error (500)
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::Unauthenticated { .. } => 401,
			APIError::Forbidden { .. } => 403,
			APIError::NotFound { .. } => 404,
			APIError::Conflict { .. } => 409,
			APIError::UnprocessableEntity { .. } => 422,
			APIError::InternalServerError { .. } => 500,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		let (error, message, details) = match self {
			APIError::BadRequest {
				error_type,
				message,
			}
			| APIError::Forbidden {
				error_type,
				message,
			}
			| APIError::NotFound {
				error_type,
				message,
			}
			| APIError::Conflict {
				error_type,
				message,
			}
			| APIError::InternalServerError {
				error_type,
				message,
			} => (error_type.clone(), message.clone(), None),
			APIError::Unauthenticated { message } => {
				("UNAUTHENTICATED".to_string(), message.clone(), None)
			},
			APIError::UnprocessableEntity {
				error_type,
				message,
				details,
			} => (error_type.clone(), message.clone(), details.clone()),
		};

		ErrorResponse {
			error,
			message,
			details,
			retry_after: None,
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let response = self.to_error_response();
		write!(f, "{} ({}): {}", response.error, self.status_code(), response.message)
	}
}

impl std::error::Error for APIError {}

impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status =
			StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		(status, Json(self.to_error_response())).into_response()
	}
}
