use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{env, fmt, str::FromStr, time::Duration};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub store: StoreConfig,
    /// Present only when the metadata index is enabled (`DB_URL`).
    pub db: Option<DbConfig>,
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub env: Environment,
    pub max_file_size_mb: u64,
    pub shutdown_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Connection settings for the S3-compatible object store.
#[derive(Clone)]
pub struct StoreConfig {
    /// Host (and optional port) of the store, without scheme.
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub use_ssl: bool,
    pub bucket_name: String,
    pub region: String,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "gRPC broker for S3-compatible object storage")]
pub struct Args {
    /// Host to bind to (overrides APP_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides APP_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Metadata database URL (overrides DB_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Run metadata migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

const DEFAULT_MAX_FILE_SIZE_MB: u64 = 20;
const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 2_000;

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    ///
    /// A `.env` file is loaded first when `APP_ENV` is not already set.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        if env::var_os("APP_ENV").is_none() {
            if let Err(err) = dotenvy::dotenv() {
                if !err.not_found() {
                    return Err(err).context("loading .env");
                }
            }
        }

        let args = Args::parse();
        let migrate = args.migrate;
        let cfg = Self::from_sources(args, |name| env::var(name).ok())?;

        Ok((cfg, migrate))
    }

    /// Merge CLI arguments over values produced by `lookup`.
    pub fn from_sources<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_port = parse_or(&lookup, "APP_PORT", 3000u16)?;
        let env_host = lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let env = match lookup("APP_ENV") {
            Some(value) => value.parse()?,
            None => Environment::Development,
        };

        let app = AppSettings {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            env,
            max_file_size_mb: parse_or(&lookup, "APP_MAX_FILE_SIZE_MB", DEFAULT_MAX_FILE_SIZE_MB)?,
            shutdown_timeout: Duration::from_millis(parse_or(
                &lookup,
                "APP_SHUTDOWN_TIMEOUT_MS",
                DEFAULT_SHUTDOWN_TIMEOUT_MS,
            )?),
        };

        let store = StoreConfig {
            endpoint: required(&lookup, "STORE_ENDPOINT")?,
            access_key: lookup("STORE_ACCESS_KEY").unwrap_or_default(),
            secret_key: lookup("STORE_SECRET_KEY").unwrap_or_default(),
            use_ssl: parse_or(&lookup, "STORE_USE_SSL", true)?,
            bucket_name: required(&lookup, "STORE_BUCKET_NAME")?,
            region: lookup("STORE_REGION").unwrap_or_else(|| "us-east-1".into()),
        };

        let db = args
            .database_url
            .or_else(|| lookup("DB_URL"))
            .filter(|url| !url.is_empty())
            .map(|url| DbConfig { url });

        Ok(Self { app, store, db })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

impl AppSettings {
    pub fn is_development(&self) -> bool {
        self.env == Environment::Development
    }

    pub fn max_file_size_bytes(&self) -> usize {
        (self.max_file_size_mb as usize).saturating_mul(1024 * 1024)
    }
}

impl StoreConfig {
    /// Full endpoint URL handed to the S3 client.
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}", scheme, self.endpoint)
    }
}

// Keeps the secret key out of startup logs.
impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("use_ssl", &self.use_ssl)
            .field("bucket_name", &self.bucket_name)
            .field("region", &self.region)
            .finish()
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "development" | "" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => bail!("unknown APP_ENV value `{}`", other),
        }
    }
}

fn required<F>(lookup: &F, name: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.is_empty())
        .with_context(|| format!("missing required variable {}", name))
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        None => Ok(default),
    }
}
