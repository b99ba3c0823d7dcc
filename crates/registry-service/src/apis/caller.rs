//! Caller identity extraction.
//!
//! The registry trusts an authenticating gateway to put the caller's address
//! in a configured header. A header that is present but unreadable is always
//! rejected, even on routes where identity is optional.

use crate::server::AppState;
use axum::{extract::FromRequestParts, http::request::Parts};
use registry_types::{APIError, Address};

/// Authenticated caller, required.
pub struct Caller(pub Address);

/// Authenticated caller, if the request carried one.
pub struct OptionalCaller(pub Option<Address>);

fn read_caller(parts: &Parts, state: &AppState) -> Result<Option<Address>, APIError> {
	let Some(value) = parts.headers.get(&state.caller_header) else {
		return Ok(None);
	};

	value
		.to_str()
		.ok()
		.and_then(|text| text.trim().parse::<Address>().ok())
		.map(Some)
		.ok_or_else(|| APIError::Unauthenticated {
			message: format!(
				"Header '{}' is not a valid address",
				state.caller_header.as_str()
			),
		})
}

impl FromRequestParts<AppState> for Caller {
	type Rejection = APIError;

	async fn from_request_parts(
		parts: &mut Parts,
		state: &AppState,
	) -> Result<Self, Self::Rejection> {
		read_caller(parts, state)?
			.map(Caller)
			.ok_or_else(|| APIError::Unauthenticated {
				message: format!(
					"Missing caller identity header '{}'",
					state.caller_header.as_str()
				),
			})
	}
}

impl FromRequestParts<AppState> for OptionalCaller {
	type Rejection = APIError;

	async fn from_request_parts(
		parts: &mut Parts,
		state: &AppState,
	) -> Result<Self, Self::Rejection> {
		Ok(OptionalCaller(read_caller(parts, state)?))
	}
}
