//! HTTP server for the registry API.
//!
//! All routes live under `/api`. Mutating routes require the caller identity
//! header configured in `[api]`.

use crate::apis::{access, orders, transactions};
use axum::{
	extract::DefaultBodyLimit,
	http::HeaderName,
	routing::{get, post, put},
	Router,
};
use registry_config::ApiConfig;
use registry_core::RegistryEngine;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Reference to the registry engine for processing requests.
	pub registry: Arc<RegistryEngine>,
	/// Header carrying the authenticated caller address.
	pub caller_header: HeaderName,
}

/// Builds the API router.
pub fn router(state: AppState, max_request_size: usize) -> Router {
	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/orders", post(orders::issue_order))
				.route("/orders/{id}", get(orders::get_order))
				.route("/orders/{id}/status", put(orders::update_order_status))
				.route(
					"/signers",
					get(access::list_signers).post(access::add_signer),
				)
				.route(
					"/roles/{account}",
					get(access::get_role).put(access::set_role),
				)
				.route("/transactions", post(transactions::submit_transaction))
				.route(
					"/transactions/{digest}",
					get(transactions::get_transaction),
				)
				.route("/digest", post(transactions::digest)),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive()),
		)
		.layer(DefaultBodyLimit::max(max_request_size))
		.with_state(state)
}

/// Starts the HTTP server and serves until `shutdown` resolves.
pub async fn start_server(
	api_config: ApiConfig,
	registry: Arc<RegistryEngine>,
	shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), Box<dyn std::error::Error>> {
	let caller_header = HeaderName::from_bytes(api_config.caller_header.as_bytes())?;
	let app = router(
		AppState {
			registry,
			caller_header,
		},
		api_config.max_request_size,
	);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Registry API server starting on {}", bind_address);

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown)
		.await?;

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::factory_registry::build_registry_from_config;
	use axum::{
		body::Body,
		http::{Method, Request, StatusCode},
	};
	use registry_config::Config;
	use registry_types::Address;
	use serde_json::{json, Value};
	use std::str::FromStr;
	use tower::ServiceExt;

	const HEADER: &str = "x-registry-caller";
	const ABC_SHA256: &str = "0xba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

	fn admin() -> Address {
		Address::repeat_byte(0xad)
	}

	fn signer(byte: u8) -> Address {
		Address::repeat_byte(byte)
	}

	fn outsider() -> Address {
		Address::repeat_byte(0x99)
	}

	async fn app(consensus: &str) -> Router {
		let src = format!(
			r#"
[registry]
id = "api-test"

[access]
admins = ["{admin}"]
signers = ["{a}", "{b}", "{c}"]

{consensus}

[commitment]
[commitment.implementations.sha256]

[storage]
primary = "memory"
[storage.implementations.memory]
"#,
			admin = admin(),
			a = signer(0x0a),
			b = signer(0x0b),
			c = signer(0x0c),
			consensus = consensus,
		);
		let config = Config::from_str(&src).unwrap();
		let registry = Arc::new(build_registry_from_config(config).unwrap());
		registry.initialize().await.unwrap();

		router(
			AppState {
				registry,
				caller_header: HeaderName::from_static(HEADER),
			},
			64 * 1024,
		)
	}

	async fn send(
		app: &Router,
		method: Method,
		uri: &str,
		caller: Option<Address>,
		body: Option<Value>,
	) -> (StatusCode, Value) {
		let mut builder = Request::builder().method(method).uri(uri);
		if let Some(caller) = caller {
			builder = builder.header(HEADER, caller.to_string());
		}
		let request = match body {
			Some(body) => builder
				.header("content-type", "application/json")
				.body(Body::from(body.to_string()))
				.unwrap(),
			None => builder.body(Body::empty()).unwrap(),
		};

		let response = app.clone().oneshot(request).await.unwrap();
		let status = response.status();
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
			.await
			.unwrap();
		let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
		(status, value)
	}

	#[tokio::test]
	async fn test_issue_and_read_order() {
		let app = app("").await;

		let (status, body) = send(
			&app,
			Method::POST,
			"/api/orders",
			Some(signer(0x0a)),
			Some(json!({ "id": "1234", "contentHash": ABC_SHA256 })),
		)
		.await;
		assert_eq!(status, StatusCode::CREATED);
		assert_eq!(body["status"], "accepted");
		assert_eq!(body["contentHash"], ABC_SHA256);

		let (status, body) = send(&app, Method::GET, "/api/orders/1234", None, None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["id"], "1234");
	}

	#[tokio::test]
	async fn test_issue_from_raw_content() {
		let app = app("").await;
		let (status, body) = send(
			&app,
			Method::POST,
			"/api/orders",
			Some(admin()),
			Some(json!({ "id": "O1", "content": "abc" })),
		)
		.await;
		assert_eq!(status, StatusCode::CREATED);
		assert_eq!(body["contentHash"], ABC_SHA256);

		let (status, body) = send(
			&app,
			Method::POST,
			"/api/orders",
			Some(admin()),
			Some(json!({ "id": "O2", "content": "abc", "contentHash": ABC_SHA256 })),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "INVALID_REQUEST");
	}

	#[tokio::test]
	async fn test_caller_identity_required() {
		let app = app("").await;
		let payload = json!({ "id": "O1", "contentHash": ABC_SHA256 });

		let (status, body) =
			send(&app, Method::POST, "/api/orders", None, Some(payload.clone())).await;
		assert_eq!(status, StatusCode::UNAUTHORIZED);
		assert_eq!(body["error"], "UNAUTHENTICATED");

		let request = Request::builder()
			.method(Method::POST)
			.uri("/api/orders")
			.header(HEADER, "not-an-address")
			.header("content-type", "application/json")
			.body(Body::from(payload.to_string()))
			.unwrap();
		let response = app.clone().oneshot(request).await.unwrap();
		assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

		let (status, body) =
			send(&app, Method::POST, "/api/orders", Some(outsider()), Some(payload)).await;
		assert_eq!(status, StatusCode::FORBIDDEN);
		assert_eq!(body["error"], "UNAUTHORIZED");
	}

	#[tokio::test]
	async fn test_duplicate_and_missing_orders() {
		let app = app("").await;
		let payload = json!({ "id": "O1", "contentHash": ABC_SHA256 });

		send(&app, Method::POST, "/api/orders", Some(admin()), Some(payload.clone())).await;
		let (status, body) =
			send(&app, Method::POST, "/api/orders", Some(admin()), Some(payload)).await;
		assert_eq!(status, StatusCode::CONFLICT);
		assert_eq!(body["error"], "DUPLICATE_ORDER");

		let (status, body) = send(&app, Method::GET, "/api/orders/nope", None, None).await;
		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_eq!(body["error"], "ORDER_NOT_FOUND");

		let long_id = "x".repeat(101);
		let (status, _) = send(
			&app,
			Method::POST,
			"/api/orders",
			Some(admin()),
			Some(json!({ "id": long_id, "contentHash": ABC_SHA256 })),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
	}

	#[tokio::test]
	async fn test_status_updates() {
		let app = app("").await;
		send(
			&app,
			Method::POST,
			"/api/orders",
			Some(signer(0x0a)),
			Some(json!({ "id": "O1", "contentHash": ABC_SHA256 })),
		)
		.await;

		let (status, body) = send(
			&app,
			Method::PUT,
			"/api/orders/O1/status",
			Some(signer(0x0b)),
			Some(json!({ "status": "call_ship" })),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["status"], "call_ship");

		// Ordinal 5 is delivery_success.
		let (status, body) = send(
			&app,
			Method::PUT,
			"/api/orders/O1/status",
			Some(signer(0x0b)),
			Some(json!({ "status": 5 })),
		)
		.await;
		assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
		assert_eq!(body["error"], "INVALID_TRANSITION");
		assert_eq!(body["details"]["from"], "call_ship");
		assert_eq!(body["details"]["allowed"], json!(["taken", "cancel"]));

		// Legacy spelling is accepted.
		let (status, body) = send(
			&app,
			Method::PUT,
			"/api/orders/O1/status",
			Some(signer(0x0b)),
			Some(json!({ "status": "taked" })),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["status"], "taken");

		let (status, body) = send(
			&app,
			Method::PUT,
			"/api/orders/O1/status",
			Some(signer(0x0b)),
			Some(json!({ "status": "flying" })),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "UNKNOWN_STATUS");
	}

	#[tokio::test]
	async fn test_signers_and_roles() {
		let app = app("").await;
		let newcomer = signer(0x0d);

		let (status, _) = send(
			&app,
			Method::POST,
			"/api/signers",
			Some(signer(0x0a)),
			Some(json!({ "account": newcomer })),
		)
		.await;
		assert_eq!(status, StatusCode::FORBIDDEN);

		let (status, body) = send(
			&app,
			Method::POST,
			"/api/signers",
			Some(admin()),
			Some(json!({ "account": newcomer })),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["signers"].as_array().unwrap().len(), 4);

		let (_, body) = send(&app, Method::GET, "/api/signers", None, None).await;
		assert_eq!(body["signers"].as_array().unwrap().len(), 4);

		let admin_uri = format!("/api/roles/{}", admin());
		let (status, body) = send(
			&app,
			Method::PUT,
			&admin_uri,
			Some(admin()),
			Some(json!({ "role": "signer" })),
		)
		.await;
		assert_eq!(status, StatusCode::CONFLICT);
		assert_eq!(body["error"], "LAST_ADMIN_PROTECTED");

		let (status, body) = send(&app, Method::GET, &admin_uri, None, None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["role"], "admin");

		let (status, body) = send(
			&app,
			Method::PUT,
			&format!("/api/roles/{}", newcomer),
			Some(admin()),
			Some(json!({ "role": "signer" })),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["role"], "signer");

		let (status, body) = send(&app, Method::GET, "/api/roles/0x12", None, None).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "INVALID_ACCOUNT");
	}

	#[tokio::test]
	async fn test_consensus_flow() {
		let app = app("[consensus]\npolicy = \"fixed\"\nthreshold = 2").await;
		let payload = json!({ "digest": ABC_SHA256 });

		let (status, body) = send(
			&app,
			Method::POST,
			"/api/transactions",
			Some(signer(0x0a)),
			Some(payload.clone()),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["state"], "pending");

		let (status, body) = send(
			&app,
			Method::POST,
			"/api/transactions",
			Some(signer(0x0a)),
			Some(payload.clone()),
		)
		.await;
		assert_eq!(status, StatusCode::CONFLICT);
		assert_eq!(body["error"], "ALREADY_APPROVED");

		let (_, body) = send(
			&app,
			Method::POST,
			"/api/transactions",
			Some(signer(0x0b)),
			Some(payload.clone()),
		)
		.await;
		assert_eq!(body["state"], "committed");

		let (status, body) = send(
			&app,
			Method::POST,
			"/api/transactions",
			Some(signer(0x0c)),
			Some(payload),
		)
		.await;
		assert_eq!(status, StatusCode::CONFLICT);
		assert_eq!(body["error"], "ALREADY_COMMITTED");

		let uri = format!("/api/transactions/{}", ABC_SHA256);
		let (status, body) = send(&app, Method::GET, &uri, None, None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["approvals"].as_array().unwrap().len(), 2);
		assert_eq!(body["threshold"], 2);

		let (status, _) = send(
			&app,
			Method::GET,
			"/api/transactions/0x0000000000000000000000000000000000000000000000000000000000000001",
			None,
			None,
		)
		.await;
		assert_eq!(status, StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_digest_helper() {
		let app = app("").await;
		let (status, body) = send(
			&app,
			Method::POST,
			"/api/digest",
			None,
			Some(json!({ "content": "abc" })),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["digest"], ABC_SHA256);
		assert_eq!(body["algorithm"], "sha256");
	}
}
