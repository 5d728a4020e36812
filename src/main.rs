//! `catalog-proxy` binary: resolves configuration, installs logging, and serves the proxy routes.

// crates.io
use catalog_proxy::{
	catalog::CatalogClient,
	config::{ProxyArgs, ProxyConfig},
	obs,
	provider::TokenProvider,
	reqwest,
	router::{self, ProxyState},
};
use color_eyre::Result;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let args = ProxyArgs::load();

	obs::init_logging(args.log_level.as_deref())?;

	let config = ProxyConfig::try_from(args)?;
	let tokens = TokenProvider::new(
		config.descriptor.clone(),
		config.client_id.clone(),
		config.client_secret.clone(),
	)?
	.with_refresh_margin(config.refresh_margin);
	let catalog = CatalogClient::new(reqwest::Client::builder().build()?, &config.descriptor);
	let app = router::router(ProxyState::new(tokens, catalog));
	let listener = TcpListener::bind(config.listen).await?;

	tracing::info!(
		listen = %config.listen,
		api_base = %config.descriptor.api_base,
		"Catalog proxy listening."
	);

	axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

	Ok(())
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "Failed to listen for the shutdown signal.");

		// Keep serving; the process can still be stopped externally.
		std::future::pending::<()>().await;
	}

	tracing::info!("Shutting down.");
}
