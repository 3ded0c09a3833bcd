//! Simple REST - demo server and signature tools.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use simple_rest::{
    auth::{signature_required, static_key, unix_now, SignatureAuth, SIGNATURE_PARAM, TIMESTAMP_PARAM},
    config::{take_timestamp, Cli, Command, ServeConfig, SignConfig, UrlencodeConfig},
    negotiate::{Negotiator, Payload, Reply},
    server::{create_router, RestResource, RouterConfig},
    Args, HandlerError, Request, Resource,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Sign(config) => run_sign(config),
        Command::Urlencode(config) => run_urlencode(config),
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

    info!("Configuration:");
    info!("  Charset: {}", config.charset);
    info!("  Body limit: {} bytes", config.body_limit);
    match &config.cors_origins {
        Some(origins) => info!("  CORS origins: {}", origins.join(", ")),
        None => info!("  CORS origins: any"),
    }

    let negotiator = Negotiator::new().with_charset(config.charset.clone());
    let echo = echo_resource(&negotiator, config.secret_or_empty());
    let routes = vec![
        ("/echo".to_string(), echo.clone()),
        ("/echo/{_format}".to_string(), echo),
    ];

    let router = create_router(routes, build_router_config(&config));

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl \"http://{}/echo?$(simple-rest sign <secret> a=1 --urlencode)\"", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// `/echo`: returns the received parameters, minus the signature fields.
fn echo_resource(negotiator: &Negotiator, secret: &str) -> RestResource {
    let echo = Resource::new("echo")
        .get(echo_params)
        .post(echo_params)
        .put(echo_params)
        .delete(echo_params);

    negotiator.apply(signature_required(static_key(secret), echo))
}

fn echo_params(request: &Request, _: &Args) -> Result<Reply, HandlerError> {
    let mut params = request.params();
    params.remove(SIGNATURE_PARAM);
    params.remove(TIMESTAMP_PARAM);

    let body: serde_json::Map<String, serde_json::Value> = params
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::from(v)))
        .collect();

    Ok(Reply::ok(Payload::from(serde_json::json!({
        "method": request.method().as_str(),
        "params": body,
    }))))
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "simple_rest=debug,tower_http=debug"
    } else {
        "simple_rest=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new().with_body_limit(config.body_limit);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}

// =============================================================================
// Sign Command
// =============================================================================

fn run_sign(config: SignConfig) -> ExitCode {
    let (params, timestamp) = match config.parse_data() {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let auth = SignatureAuth::new(&config.secret);
    let timestamp = timestamp.unwrap_or_else(unix_now);

    if config.urlencode {
        println!("{}", auth.signed_params(&params, timestamp).to_urlencoded());
    } else {
        println!("t={} sig={}", timestamp, auth.sign_at(&params, timestamp));
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Urlencode Command
// =============================================================================

fn run_urlencode(config: UrlencodeConfig) -> ExitCode {
    let mut params = match config.parse_data() {
        Ok(params) => params,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(ref secret_key) = config.secret_key {
        let timestamp = match take_timestamp(&mut params) {
            Ok(timestamp) => timestamp.unwrap_or_else(unix_now),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        };
        params = SignatureAuth::new(secret_key).signed_params(&params, timestamp);
    }

    println!("{}", params.to_urlencoded());
    ExitCode::SUCCESS
}
