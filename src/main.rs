//! Thumb Streamer - on-demand image thumbnails with a shared S3 cache.
//!
//! This binary starts the HTTP server and configures all components.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use thumb_streamer::{
    config::{Cli, Command, ServeConfig, SignConfig, SignOutputFormat},
    create_router, create_s3_client, HttpOrigin, ImageTransformer, ObjectStore, RequestSigner,
    RouterConfig, S3ObjectStore, ThumbnailService, SIGNATURE_HEADER,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Sign(config) => run_sign(config),
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("thumb-streamer v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");

    let sizes = config.size_table();
    for (token, spec) in sizes.sorted_entries() {
        info!("  Size: {} = {}", token, spec);
    }
    info!(
        "  Transform: crop={}, quality={}",
        config.crop, config.quality
    );

    if config.auth_enabled {
        info!("  Auth: enabled");
    } else {
        warn!("  Auth: DISABLED - any path can be requested without a signature");
        warn!("        Enable for production: --auth-enabled=true --auth-secret=<secret>");
    }

    let origin = match HttpOrigin::new(config.origin_timeout()) {
        Ok(origin) => origin,
        Err(e) => {
            error!("Failed to create HTTP origin client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut service = ThumbnailService::new(
        sizes,
        Arc::new(origin),
        Arc::new(ImageTransformer::new()),
    )
    .with_options(config.transform_options());

    if config.auth_enabled {
        service = service.with_signer(RequestSigner::new(config.auth_secret_or_empty()));
    }

    if config.caching_enabled() {
        info!("  S3 region: {}", config.s3_region);
        if let Some(ref endpoint) = config.s3_endpoint {
            info!("  S3 endpoint: {}", endpoint);
        }

        let client = create_s3_client(&config.s3_settings()).await;
        let store = S3ObjectStore::new(client, config.s3_bucket.clone());
        info!("  Cache: {}", store.describe());
        service = service.with_store(Arc::new(store), config.persist_queue);
    } else {
        warn!("  Cache: DISABLED - no bucket configured, only remote URLs can be served");
    }

    let service = Arc::new(service);
    let router_config = RouterConfig::new()
        .with_cache_max_age(config.cache_max_age)
        .with_tracing(!config.no_tracing);
    let router = create_router(service.clone(), router_config);

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("");
    info!("  Server listening on: http://{}", addr);
    info!("    curl http://{}/health", addr);
    info!("");

    let result = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("Draining pending thumbnail writes");
    service.shutdown().await;

    if let Err(e) = result {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "thumb_streamer=debug,tower_http=debug"
    } else {
        "thumb_streamer=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

// =============================================================================
// Sign Command
// =============================================================================

fn run_sign(config: SignConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let signer = RequestSigner::new(&config.secret);
    let signature = match signer.sign(&config.path) {
        Ok(signature) => signature,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match config.format {
        SignOutputFormat::Signature => {
            println!("{}", signature);
        }
        SignOutputFormat::Json => {
            let json = serde_json::json!({
                "path": config.path,
                "header": SIGNATURE_HEADER,
                "signature": signature,
                "url": config.url(),
            });
            match serde_json::to_string_pretty(&json) {
                Ok(output) => println!("{}", output),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
        SignOutputFormat::Curl => {
            // validate() guarantees a base URL for this format
            if let Some(url) = config.url() {
                println!(
                    "curl -H '{}: {}' '{}'",
                    SIGNATURE_HEADER, signature, url
                );
            }
        }
    }

    ExitCode::SUCCESS
}
