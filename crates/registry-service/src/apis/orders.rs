//! Order endpoints: issue, read and status updates.

use super::{bad_request, caller::Caller, caller::OptionalCaller, to_api_error};
use crate::server::AppState;
use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::Json,
};
use registry_types::{APIError, IssueOrderRequest, Order, UpdateStatusRequest};

/// Longest accepted order id, in bytes.
const MAX_ORDER_ID_LEN: usize = 100;

fn validate_order_id(id: &str) -> Result<(), APIError> {
	if id.trim().is_empty() {
		return Err(bad_request("INVALID_ORDER_ID", "Order ID cannot be empty"));
	}
	if id.len() > MAX_ORDER_ID_LEN {
		return Err(bad_request(
			"INVALID_ORDER_ID",
			format!("Order ID exceeds {} bytes", MAX_ORDER_ID_LEN),
		));
	}
	if id.chars().any(char::is_control) {
		return Err(bad_request(
			"INVALID_ORDER_ID",
			"Order ID cannot contain control characters",
		));
	}
	Ok(())
}

/// Handles POST /api/orders.
pub async fn issue_order(
	State(state): State<AppState>,
	Caller(caller): Caller,
	Json(request): Json<IssueOrderRequest>,
) -> Result<(StatusCode, Json<Order>), APIError> {
	validate_order_id(&request.id)?;

	let result = match (request.content_hash, request.content) {
		(Some(hash), None) => state.registry.issue(caller, &request.id, hash).await,
		(None, Some(content)) => {
			state
				.registry
				.issue_content(caller, &request.id, content.as_bytes())
				.await
		},
		_ => {
			return Err(bad_request(
				"INVALID_REQUEST",
				"Provide exactly one of contentHash or content",
			))
		},
	};

	let order = result.map_err(to_api_error)?;
	Ok((StatusCode::CREATED, Json(order)))
}

/// Handles GET /api/orders/{id}.
pub async fn get_order(
	State(state): State<AppState>,
	OptionalCaller(caller): OptionalCaller,
	Path(id): Path<String>,
) -> Result<Json<Order>, APIError> {
	validate_order_id(&id)?;
	let order = state
		.registry
		.get_order(caller, &id)
		.await
		.map_err(to_api_error)?;
	Ok(Json(order))
}

/// Handles PUT /api/orders/{id}/status.
pub async fn update_order_status(
	State(state): State<AppState>,
	Caller(caller): Caller,
	Path(id): Path<String>,
	Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, APIError> {
	validate_order_id(&id)?;
	let status = request
		.status
		.resolve()
		.map_err(|e| bad_request("UNKNOWN_STATUS", e.to_string()))?;

	let order = state
		.registry
		.update_order_status(caller, &id, status)
		.await
		.map_err(to_api_error)?;
	Ok(Json(order))
}
