//! Consensus submission endpoints and the digest helper.

use super::{bad_request, caller::Caller, to_api_error};
use crate::server::AppState;
use axum::{
	extract::{Path, State},
	response::Json,
};
use registry_types::{
	APIError, DigestRequest, DigestResponse, Hash256, PendingTransaction,
	SubmitTransactionRequest,
};

/// Handles POST /api/transactions.
pub async fn submit_transaction(
	State(state): State<AppState>,
	Caller(caller): Caller,
	Json(request): Json<SubmitTransactionRequest>,
) -> Result<Json<PendingTransaction>, APIError> {
	let transaction = state
		.registry
		.submit_transaction(caller, request.digest)
		.await
		.map_err(to_api_error)?;
	Ok(Json(transaction))
}

/// Handles GET /api/transactions/{digest}.
pub async fn get_transaction(
	State(state): State<AppState>,
	Path(digest): Path<String>,
) -> Result<Json<PendingTransaction>, APIError> {
	let digest: Hash256 = digest
		.parse()
		.map_err(|_| bad_request("INVALID_DIGEST", format!("Invalid digest: {}", digest)))?;

	state
		.registry
		.get_transaction(&digest)
		.await
		.map_err(to_api_error)?
		.map(Json)
		.ok_or_else(|| APIError::NotFound {
			error_type: "TRANSACTION_NOT_FOUND".into(),
			message: format!("No submissions for digest {}", digest),
		})
}

/// Handles POST /api/digest.
pub async fn digest(
	State(state): State<AppState>,
	Json(request): Json<DigestRequest>,
) -> Json<DigestResponse> {
	Json(DigestResponse {
		digest: state.registry.digest(request.content.as_bytes()),
		algorithm: state.registry.digest_algorithm().to_string(),
	})
}
