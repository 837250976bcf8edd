use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{env, str::FromStr};

/// Default request body limit; above the 10 MiB photo limit so oversized
/// uploads reach validation and get the size-specific message.
pub const DEFAULT_MAX_BODY_BYTES: usize = 12 * 1024 * 1024;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_body_bytes: usize,
    pub s3: S3Settings,
}

/// Where photo bytes live.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for MinIO/LocalStack.
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Photo gallery backed by S3 and SQLite")]
pub struct Args {
    /// Host to bind to (overrides PHOTO_GALLERY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PHOTO_GALLERY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides PHOTO_GALLERY_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// S3 bucket holding photos (overrides PHOTO_GALLERY_S3_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// AWS region (overrides PHOTO_GALLERY_AWS_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Custom S3 endpoint (overrides PHOTO_GALLERY_S3_ENDPOINT)
    #[arg(long)]
    pub s3_endpoint: Option<String>,

    /// Use path-style bucket addressing (overrides PHOTO_GALLERY_S3_FORCE_PATH_STYLE)
    #[arg(long)]
    pub force_path_style: bool,

    /// Maximum request body size in bytes (overrides PHOTO_GALLERY_MAX_BODY_BYTES)
    #[arg(long)]
    pub max_body_bytes: Option<usize>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        Ok((Self::merge(args, |name| env::var(name))?, migrate))
    }

    /// Merge CLI args over values looked up by `var` (normally `std::env::var`).
    pub fn merge<F>(args: Args, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let env_host = var("PHOTO_GALLERY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = parse_var(&var, "PHOTO_GALLERY_PORT")?.unwrap_or(8080);
        let env_db = var("PHOTO_GALLERY_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/photos.db".into());
        let env_max_body =
            parse_var(&var, "PHOTO_GALLERY_MAX_BODY_BYTES")?.unwrap_or(DEFAULT_MAX_BODY_BYTES);
        let env_region = var("PHOTO_GALLERY_AWS_REGION").unwrap_or_else(|_| "us-east-1".into());
        let env_path_style =
            parse_var::<_, bool>(&var, "PHOTO_GALLERY_S3_FORCE_PATH_STYLE")?.unwrap_or(false);

        let Some(bucket) = args.bucket.or_else(|| var("PHOTO_GALLERY_S3_BUCKET").ok()) else {
            bail!("an S3 bucket is required (--bucket or PHOTO_GALLERY_S3_BUCKET)");
        };

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            max_body_bytes: args.max_body_bytes.unwrap_or(env_max_body),
            s3: S3Settings {
                bucket,
                region: args.region.unwrap_or(env_region),
                endpoint_url: args
                    .s3_endpoint
                    .or_else(|| var("PHOTO_GALLERY_S3_ENDPOINT").ok()),
                force_path_style: args.force_path_style || env_path_style,
            },
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `Ok(None)` when unset, an error naming the variable when it does not parse.
fn parse_var<F, T>(var: &F, name: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Result<String, env::VarError>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(name) {
        Ok(value) => value
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, env::VarError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned().ok_or(env::VarError::NotPresent)
    }

    #[test]
    fn defaults_apply_when_only_bucket_is_set() {
        let cfg =
            AppConfig::merge(Args::default(), lookup(&[("PHOTO_GALLERY_S3_BUCKET", "pics")]))
                .unwrap();

        assert_eq!(cfg.addr(), "0.0.0.0:8080");
        assert_eq!(cfg.database_url, "sqlite://./data/photos.db");
        assert_eq!(cfg.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert_eq!(cfg.s3.bucket, "pics");
        assert_eq!(cfg.s3.region, "us-east-1");
        assert!(cfg.s3.endpoint_url.is_none());
        assert!(!cfg.s3.force_path_style);
    }

    #[test]
    fn cli_overrides_environment() {
        let args = Args {
            port: Some(9000),
            bucket: Some("cli-bucket".into()),
            region: Some("eu-west-1".into()),
            ..Default::default()
        };
        let cfg = AppConfig::merge(
            args,
            lookup(&[
                ("PHOTO_GALLERY_PORT", "7000"),
                ("PHOTO_GALLERY_S3_BUCKET", "env-bucket"),
                ("PHOTO_GALLERY_S3_ENDPOINT", "http://localhost:9000"),
                ("PHOTO_GALLERY_S3_FORCE_PATH_STYLE", "true"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.s3.bucket, "cli-bucket");
        assert_eq!(cfg.s3.region, "eu-west-1");
        assert_eq!(cfg.s3.endpoint_url.as_deref(), Some("http://localhost:9000"));
        assert!(cfg.s3.force_path_style);
    }

    #[test]
    fn missing_bucket_is_an_error() {
        assert!(AppConfig::merge(Args::default(), lookup(&[])).is_err());
    }

    #[test]
    fn invalid_port_names_the_variable() {
        let err = AppConfig::merge(
            Args::default(),
            lookup(&[
                ("PHOTO_GALLERY_S3_BUCKET", "pics"),
                ("PHOTO_GALLERY_PORT", "eighty"),
            ]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("PHOTO_GALLERY_PORT"));
    }
}
