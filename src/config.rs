//! Command-line configuration.
//!
//! The binary has three subcommands:
//!
//! - `serve` - run the demo API
//! - `sign` - compute a request signature offline
//! - `urlencode` - URL-encode parameters, optionally signing them
//!
//! # Environment Variables
//!
//! `serve` options can also be set via environment variables with the
//! `REST_` prefix:
//!
//! - `REST_HOST` - Server bind address (default: 0.0.0.0)
//! - `REST_PORT` - Server port (default: 3000)
//! - `REST_SECRET` - HMAC secret for signed requests
//! - `REST_CHARSET` - Response charset (default: utf-8)
//! - `REST_CORS_ORIGINS` - Allowed CORS origins, comma-separated
//! - `REST_BODY_LIMIT` - Maximum request body in bytes (default: 1 MiB)

use clap::{Args, Parser, Subcommand};

use crate::auth::TIMESTAMP_PARAM;
use crate::error::CliError;
use crate::negotiate::DEFAULT_CHARSET;
use crate::request::Params;
use crate::server::DEFAULT_BODY_LIMIT;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Simple REST - signed requests and content negotiation for HTTP resources.
#[derive(Parser, Debug, Clone)]
#[command(name = "simple-rest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the demo API server.
    Serve(ServeConfig),

    /// Calculate the signature for a set of parameters.
    Sign(SignConfig),

    /// URL-encode parameters, signing them when a key is given.
    Urlencode(UrlencodeConfig),
}

/// Options for `serve`.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "REST_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "REST_PORT")]
    pub port: u16,

    /// Maximum request body size in bytes.
    #[arg(long, default_value_t = DEFAULT_BODY_LIMIT, env = "REST_BODY_LIMIT")]
    pub body_limit: usize,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// Secret key for HMAC-SHA256 request signatures.
    #[arg(long, env = "REST_SECRET")]
    pub secret: Option<String>,

    // =========================================================================
    // Negotiation Configuration
    // =========================================================================
    /// Charset advertised in every Content-Type.
    #[arg(long, default_value = DEFAULT_CHARSET, env = "REST_CHARSET")]
    pub charset: String,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "REST_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        match self.secret.as_deref() {
            None | Some("") => {
                return Err(
                    "No signing secret provided. Set --secret or REST_SECRET".to_string(),
                )
            }
            Some(_) => {}
        }

        if self.charset.trim().is_empty() {
            return Err("charset must not be empty".to_string());
        }

        if self.body_limit == 0 {
            return Err("body_limit must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The signing secret, empty if unset (call validate() first).
    pub fn secret_or_empty(&self) -> &str {
        self.secret.as_deref().unwrap_or("")
    }
}

/// Options for `sign`.
#[derive(Args, Debug, Clone)]
pub struct SignConfig {
    /// Secret key shared with the server.
    pub secret: String,

    /// Parameters as key=value. A `t=<unix seconds>` pair sets the timestamp.
    pub data: Vec<String>,

    /// Print the URL-encoded parameters with `t` and `sig` appended.
    #[arg(long, default_value_t = false)]
    pub urlencode: bool,
}

impl SignConfig {
    /// Parse the data into parameters and an optional timestamp.
    pub fn parse_data(&self) -> Result<(Params, Option<i64>), CliError> {
        let mut params = parse_pairs(&self.data)?;
        let timestamp = take_timestamp(&mut params)?;
        Ok((params, timestamp))
    }
}

/// Options for `urlencode`.
#[derive(Args, Debug, Clone)]
pub struct UrlencodeConfig {
    /// Parameters as key=value. With a key, a `t=<unix seconds>` pair sets
    /// the timestamp.
    pub data: Vec<String>,

    /// Calculate the signature with this secret key and append it.
    #[arg(long)]
    pub secret_key: Option<String>,
}

impl UrlencodeConfig {
    pub fn parse_data(&self) -> Result<Params, CliError> {
        parse_pairs(&self.data)
    }
}

// =============================================================================
// Parsing Helpers
// =============================================================================

/// Parse `key=value` arguments. The value may itself contain `=`.
pub fn parse_pairs(items: &[String]) -> Result<Params, CliError> {
    let mut params = Params::new();
    for item in items {
        let (key, value) = item
            .split_once('=')
            .ok_or_else(|| CliError::InvalidPair(item.clone()))?;
        params.insert(key, value);
    }
    Ok(params)
}

/// Remove `t` from `params` and parse it.
pub fn take_timestamp(params: &mut Params) -> Result<Option<i64>, CliError> {
    match params.remove(TIMESTAMP_PARAM) {
        Some(raw) if !raw.is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CliError::InvalidTimestamp(raw)),
        _ => Ok(None),
    }
}

// =============================================================================
// Tests
// =============================================================================
