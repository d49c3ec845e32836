//! Configuration management for the thumbnail server.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `THUMB_` prefix
//! - Defaults for all optional settings
//!
//! # Subcommands
//!
//! - `serve` - run the HTTP server
//! - `sign` - print the signature for a request path
//!
//! # Environment Variables
//!
//! - `THUMB_HOST` - Server bind address (default: 0.0.0.0)
//! - `THUMB_PORT` - Server port (default: 8080)
//! - `THUMB_SIZES` - Size table, e.g. `thumb=150x150,large=1024x768`
//! - `THUMB_S3_BUCKET` - Cache/original bucket (empty disables caching)
//! - `THUMB_S3_REGION` - AWS region (default: us-east-1)
//! - `THUMB_S3_ENDPOINT` - Custom S3 endpoint for S3-compatible services
//! - `THUMB_S3_ACCESS_KEY_ID` / `THUMB_S3_SECRET_ACCESS_KEY` - Static credentials
//! - `THUMB_AUTH_SECRET` - HMAC secret for request signatures
//! - `THUMB_AUTH_ENABLED` - Require signatures (default: true)
//! - `THUMB_CROP` - Fill and crop instead of fit (default: false)
//! - `THUMB_QUALITY` - Encoder quality (default: 80)
//! - `THUMB_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)
//! - `THUMB_PERSIST_QUEUE` - Write-back queue capacity (default: 256)
//! - `THUMB_ORIGIN_TIMEOUT` - Origin read timeout in seconds (default: none)

use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::resolve::SizeTable;
use crate::server::DEFAULT_CACHE_MAX_AGE;
use crate::storage::S3Settings;
use crate::thumbnail::DEFAULT_PERSIST_QUEUE;
use crate::transform::{is_valid_quality, TransformOptions, DEFAULT_QUALITY};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

// =============================================================================
// CLI Arguments
// =============================================================================

/// Thumb Streamer - on-demand image thumbnails with a shared S3 cache.
#[derive(Parser, Debug, Clone)]
#[command(name = "thumb-streamer")]
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
    /// Run the thumbnail server.
    Serve(ServeConfig),

    /// Compute the signature for a request path.
    Sign(SignConfig),
}

// =============================================================================
// Serve Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "THUMB_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "THUMB_PORT")]
    pub port: u16,

    // =========================================================================
    // Size Table
    // =========================================================================
    /// Size token definition, NAME=WIDTHxHEIGHT. Repeat for several sizes.
    #[arg(
        long = "size",
        value_name = "NAME=WxH",
        env = "THUMB_SIZES",
        value_delimiter = ',',
        value_parser = parse_size_entry
    )]
    pub sizes: Vec<(String, String)>,

    // =========================================================================
    // S3 Configuration
    // =========================================================================
    /// Bucket holding stored originals and cached thumbnails.
    ///
    /// Leave empty to disable caching; only remote URLs can then be served.
    #[arg(long, default_value = "", env = "THUMB_S3_BUCKET")]
    pub s3_bucket: String,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "THUMB_S3_REGION")]
    pub s3_region: String,

    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    #[arg(long, env = "THUMB_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// Static access key id. Uses the default AWS credential chain if unset.
    #[arg(long, env = "THUMB_S3_ACCESS_KEY_ID")]
    pub s3_access_key_id: Option<String>,

    /// Static secret access key, paired with --s3-access-key-id.
    #[arg(long, env = "THUMB_S3_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub s3_secret_access_key: Option<String>,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// Secret key for HMAC-SHA256 request signatures.
    #[arg(long, env = "THUMB_AUTH_SECRET", hide_env_values = true)]
    pub auth_secret: Option<String>,

    /// Require a valid Signature header on every thumbnail request.
    ///
    /// WARNING: Only disable authentication in development/testing.
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        env = "THUMB_AUTH_ENABLED"
    )]
    pub auth_enabled: bool,

    // =========================================================================
    // Transform Configuration
    // =========================================================================
    /// Fill the target size and crop the overflow instead of fitting inside it.
    #[arg(long, env = "THUMB_CROP")]
    pub crop: bool,

    /// Encoder quality for lossy output (1-100).
    #[arg(long, default_value_t = DEFAULT_QUALITY, env = "THUMB_QUALITY")]
    pub quality: u8,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "THUMB_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// Number of fresh thumbnails that may wait for write-back.
    #[arg(long, default_value_t = DEFAULT_PERSIST_QUEUE, env = "THUMB_PERSIST_QUEUE")]
    pub persist_queue: usize,

    /// Timeout in seconds for reading a remote original.
    #[arg(long, env = "THUMB_ORIGIN_TIMEOUT")]
    pub origin_timeout: Option<u64>,

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
        if self.auth_enabled && self.auth_secret.as_deref().map_or(true, str::is_empty) {
            return Err(
                "Authentication is enabled but no secret provided. \
                 Set --auth-secret or THUMB_AUTH_SECRET, or disable auth with --auth-enabled=false"
                    .to_string(),
            );
        }

        if self.sizes.is_empty() {
            return Err(
                "No sizes configured. Add at least one --size NAME=WxH or set THUMB_SIZES"
                    .to_string(),
            );
        }

        if !is_valid_quality(self.quality) {
            return Err("quality must be between 1 and 100".to_string());
        }

        if self.persist_queue == 0 {
            return Err("persist_queue must be greater than 0".to_string());
        }

        if self.s3_access_key_id.is_some() != self.s3_secret_access_key.is_some() {
            return Err(
                "--s3-access-key-id and --s3-secret-access-key must be set together".to_string(),
            );
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn auth_secret_or_empty(&self) -> &str {
        self.auth_secret.as_deref().unwrap_or("")
    }

    /// Whether a bucket is configured.
    pub fn caching_enabled(&self) -> bool {
        !self.s3_bucket.is_empty()
    }

    /// Build the size table. Later entries for the same name win.
    pub fn size_table(&self) -> SizeTable {
        self.sizes.iter().cloned().collect()
    }

    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            crop: self.crop,
            quality: self.quality,
        }
    }

    pub fn origin_timeout(&self) -> Option<Duration> {
        self.origin_timeout.map(Duration::from_secs)
    }

    pub fn s3_settings(&self) -> S3Settings {
        S3Settings {
            region: self.s3_region.clone(),
            endpoint: self.s3_endpoint.clone(),
            access_key_id: self.s3_access_key_id.clone(),
            secret_access_key: self.s3_secret_access_key.clone(),
        }
    }
}

/// Parse a `NAME=VALUE` size entry.
///
/// Only the shape of the entry is checked here; the `WxH` value is validated
/// when a request resolves the token.
pub fn parse_size_entry(entry: &str) -> Result<(String, String), String> {
    let (name, value) = entry
        .split_once('=')
        .ok_or_else(|| format!("invalid size entry {:?}, expected NAME=WxH", entry))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("size entry {:?} has an empty name", entry));
    }

    Ok((name.to_string(), value.trim().to_string()))
}

// =============================================================================
// Sign Command
// =============================================================================

/// Output format for the sign command.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignOutputFormat {
    /// Only the signature
    #[default]
    Signature,

    /// JSON object with path, signature and (with --base-url) the URL
    Json,

    /// A curl command line (requires --base-url)
    Curl,
}

#[derive(Args, Debug, Clone)]
pub struct SignConfig {
    /// Escaped request path to sign, e.g. /thumb/photos%2Fcat.jpg
    pub path: String,

    /// Secret key shared with the server.
    #[arg(long, env = "THUMB_AUTH_SECRET", hide_env_values = true)]
    pub secret: String,

    /// Server base URL, e.g. http://localhost:8080
    #[arg(long)]
    pub base_url: Option<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = SignOutputFormat::Signature)]
    pub format: SignOutputFormat,
}

impl SignConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.secret.is_empty() {
            return Err("Secret must not be empty".to_string());
        }

        if !self.path.starts_with('/') {
            return Err(format!("Path must start with '/': {}", self.path));
        }

        if self.format == SignOutputFormat::Curl && self.base_url.is_none() {
            return Err("--format curl requires --base-url".to_string());
        }

        Ok(())
    }

    /// Full request URL, if a base URL was given.
    pub fn url(&self) -> Option<String> {
        self.base_url
            .as_ref()
            .map(|base| format!("{}{}", base.trim_end_matches('/'), self.path))
    }
}

// =============================================================================
// Tests
// =============================================================================
