//! Signer-set and role endpoints.

use super::{bad_request, caller::Caller, to_api_error};
use crate::server::AppState;
use axum::{
	extract::{Path, State},
	response::Json,
};
use registry_types::{
	APIError, Address, RoleResponse, SetRoleRequest, SetSignerRequest, SignersResponse,
};

fn parse_account(account: &str) -> Result<Address, APIError> {
	account
		.parse()
		.map_err(|_| bad_request("INVALID_ACCOUNT", format!("Invalid address: {}", account)))
}

/// Handles GET /api/signers.
pub async fn list_signers(
	State(state): State<AppState>,
) -> Result<Json<SignersResponse>, APIError> {
	let signers = state.registry.signers().await.map_err(to_api_error)?;
	Ok(Json(SignersResponse { signers }))
}

/// Handles POST /api/signers.
pub async fn add_signer(
	State(state): State<AppState>,
	Caller(caller): Caller,
	Json(request): Json<SetSignerRequest>,
) -> Result<Json<SignersResponse>, APIError> {
	let signers = state
		.registry
		.set_signer(caller, request.account)
		.await
		.map_err(to_api_error)?;
	Ok(Json(SignersResponse { signers }))
}

/// Handles GET /api/roles/{account}.
pub async fn get_role(
	State(state): State<AppState>,
	Path(account): Path<String>,
) -> Result<Json<RoleResponse>, APIError> {
	let account = parse_account(&account)?;
	let role = state
		.registry
		.role_of(&account)
		.await
		.map_err(to_api_error)?;
	Ok(Json(RoleResponse { account, role }))
}

/// Handles PUT /api/roles/{account}.
pub async fn set_role(
	State(state): State<AppState>,
	Caller(caller): Caller,
	Path(account): Path<String>,
	Json(request): Json<SetRoleRequest>,
) -> Result<Json<RoleResponse>, APIError> {
	let account = parse_account(&account)?;
	let assignment = state
		.registry
		.set_role(caller, account, request.role)
		.await
		.map_err(to_api_error)?;
	Ok(Json(RoleResponse {
		account: assignment.account,
		role: assignment.role,
	}))
}
