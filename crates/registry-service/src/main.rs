//! Main entry point for the order registry service.
//!
//! Loads configuration, assembles the registry engine from the configured
//! storage and commitment backends, seeds or recovers the access table and
//! serves the HTTP API until interrupted.

use clap::Parser;
use registry_config::Config;
use registry_types::{AccessEvent, ConsensusEvent, OrderEvent, RegistryEvent};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::{error::RecvError, Receiver};

mod apis;
mod factory_registry;
mod server;

/// Command-line arguments for the registry service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config/registry.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started registry");

	let config_path = args
		.config
		.to_str()
		.ok_or("Configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.registry.id);

	let registry = Arc::new(factory_registry::build_registry_from_config(config.clone())?);
	registry.initialize().await?;

	let event_logger = tokio::spawn(log_events(registry.event_bus().subscribe()));

	match config.api.clone().filter(|api| api.enabled) {
		Some(api_config) => {
			server::start_server(api_config, Arc::clone(&registry), shutdown_signal()).await?;
		},
		None => {
			tracing::warn!("API server disabled; idling until shutdown");
			shutdown_signal().await;
		},
	}

	registry.shutdown().await?;
	event_logger.abort();

	tracing::info!("Stopped registry");
	Ok(())
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!("Failed to listen for shutdown signal: {}", e);
	}
	tracing::info!("Shutdown signal received");
}

/// Writes every registry event to the log.
async fn log_events(mut events: Receiver<RegistryEvent>) {
	loop {
		match events.recv().await {
			Ok(event) => log_event(&event),
			Err(RecvError::Lagged(skipped)) => {
				tracing::warn!(skipped, "Event logger fell behind");
			},
			Err(RecvError::Closed) => break,
		}
	}
}

fn log_event(event: &RegistryEvent) {
	match event {
		RegistryEvent::Order(OrderEvent::Issued { order }) => {
			tracing::info!(order_id = %order.id, issuer = %order.issuer, "Order issued");
		},
		RegistryEvent::Order(OrderEvent::StatusChanged {
			order_id,
			from,
			to,
			caller,
		}) => {
			tracing::info!(%order_id, %from, %to, %caller, "Order status changed");
		},
		RegistryEvent::Access(AccessEvent::SignerAdded { account, caller }) => {
			tracing::info!(%account, %caller, "Signer added");
		},
		RegistryEvent::Access(AccessEvent::RoleAssigned {
			account,
			previous,
			role,
			caller,
		}) => {
			tracing::info!(%account, %previous, %role, %caller, "Role assigned");
		},
		RegistryEvent::Consensus(ConsensusEvent::Proposed {
			digest,
			proposer,
			threshold,
		}) => {
			tracing::info!(%digest, %proposer, threshold, "Transaction proposed");
		},
		RegistryEvent::Consensus(ConsensusEvent::Approved {
			digest,
			signer,
			approvals,
			threshold,
		}) => {
			tracing::info!(%digest, %signer, approvals, threshold, "Transaction approved");
		},
		RegistryEvent::Consensus(ConsensusEvent::Committed { digest, approvals }) => {
			tracing::info!(%digest, approvals, "Transaction committed");
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::TempDir;

	#[test]
	fn test_args_defaults() {
		let args = Args::try_parse_from(["registry"]).unwrap();
		assert_eq!(args.config, PathBuf::from("config/registry.toml"));
		assert_eq!(args.log_level, "info");
	}

	#[test]
	fn test_args_custom_values() {
		let args =
			Args::try_parse_from(["registry", "--config", "custom.toml", "-l", "debug"]).unwrap();
		assert_eq!(args.config, PathBuf::from("custom.toml"));
		assert_eq!(args.log_level, "debug");
	}

	#[tokio::test]
	async fn test_startup_with_file_storage() {
		let dir = TempDir::new().unwrap();
		let data_dir = dir.path().join("data");
		let config_path = dir.path().join("registry.toml");
		fs::write(
			&config_path,
			format!(
				r#"
[registry]
id = "startup-test"

[access]
admins = ["0x1111111111111111111111111111111111111111"]
signers = ["0x2222222222222222222222222222222222222222"]

[commitment]
[commitment.implementations.sha256]

[storage]
primary = "file"
[storage.implementations.file]
storage_path = "{}"
"#,
				data_dir.display().to_string().replace('\\', "/")
			),
		)
		.unwrap();

		let config = Config::from_file(config_path.to_str().unwrap()).await.unwrap();
		let registry = factory_registry::build_registry_from_config(config).unwrap();
		registry.initialize().await.unwrap();

		let mut events = registry.event_bus().subscribe();
		let signer = "0x2222222222222222222222222222222222222222".parse().unwrap();
		registry
			.issue_content(signer, "O1", b"order body")
			.await
			.unwrap();

		let event = events.recv().await.unwrap();
		log_event(&event);
		assert!(matches!(event, RegistryEvent::Order(OrderEvent::Issued { .. })));
		assert!(data_dir.join("access").exists());
	}
}
