//! Server configuration.
//!
//! Settings come from command-line flags (each with an environment fallback), then an
//! optional JSON file passed with `--config`, then defaults.

use std::path::{Path, PathBuf};

use clap::{Parser, builder::BoolishValueParser};
use serde::Deserialize;

use crate::error::{Result, ServerError};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_API_PATH: &str = "/api";
const DEFAULT_APP_DIR: &str = "app";

/// docrest - a REST CRUD layer over schemaless document collections
#[derive(Parser, Debug, Default)]
#[command(name = "docrest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Store connection URL (mongodb://, mongodb+srv:// or memory://<db>)
    #[arg(long, env = "DB_URL")]
    pub db_url: Option<String>,

    /// Port to listen on (default: 8000)
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Host to bind to (default: 0.0.0.0)
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Directory of the static application bundle (default: ./app)
    #[arg(long, env = "APP_PATH")]
    pub app_path: Option<PathBuf>,

    /// Root of the REST surface (default: /api)
    #[arg(long, env = "API_PATH")]
    pub api_path: Option<String>,

    /// Answer reads of unknown ids with a not_found error instead of null
    #[arg(long, env = "DOCREST_STRICT_NOT_FOUND", value_parser = BoolishValueParser::new())]
    pub strict_not_found: Option<bool>,

    /// Give error envelopes a 4xx/5xx status instead of 200
    #[arg(long, env = "DOCREST_ERROR_STATUS", value_parser = BoolishValueParser::new())]
    pub error_status: Option<bool>,

    /// Path to a JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Contents of the `--config` file. Every key is optional.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    pub db_url: Option<String>,
    pub port: Option<u16>,
    pub host: Option<String>,
    pub app_path: Option<PathBuf>,
    pub api_path: Option<String>,
    pub strict_not_found: Option<bool>,
    pub error_status: Option<bool>,
}

impl FileConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;

        serde_json::from_str(&raw)
            .map_err(|e| ServerError::Config(format!("invalid config file {}: {e}", path.display())))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreScheme {
    MongoDb,
    Memory,
}

/// A parsed store connection URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreUrl {
    pub scheme: StoreScheme,
    pub url: String,
    /// Database named by the URL: the path of a MongoDB URL, the host of a memory URL.
    pub database: String,
}

impl StoreUrl {
    pub fn parse(url: &str) -> Result<Self> {
        let Some((scheme, rest)) = url.split_once("://") else {
            return Err(ServerError::Config(format!("cannot parse store url {url:?}")));
        };

        let (scheme, database) = match scheme {
            "mongodb" | "mongodb+srv" => {
                let path = rest
                    .split_once('/')
                    .map(|(_, path)| path)
                    .unwrap_or_default();
                let database = path
                    .split(['?', '/'])
                    .next()
                    .unwrap_or_default();
                (StoreScheme::MongoDb, database)
            }
            "memory" => (StoreScheme::Memory, rest.trim_matches('/')),
            other => {
                return Err(ServerError::Config(format!("unsupported store scheme {other:?}")));
            }
        };

        if database.is_empty() {
            return Err(ServerError::Config(format!("store url {url:?} names no database")));
        }

        Ok(Self {
            scheme,
            url: url.to_string(),
            database: database.to_string(),
        })
    }
}

/// Behaviour switches of the CRUD router.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterOptions {
    pub strict_not_found: bool,
    pub error_status: bool,
}

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub store: StoreUrl,
    pub host: String,
    pub port: u16,
    pub app_path: PathBuf,
    /// Normalized API root: starts with `/`, no trailing `/` unless it is `/` itself.
    pub api_path: String,
    pub options: RouterOptions,
}

impl ServerConfig {
    /// Resolves the command line, reading the `--config` file when one is given.
    pub fn load(cli: Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::from_path(path)?,
            None => FileConfig::default(),
        };

        Self::merge(cli, file)
    }

    pub fn merge(cli: Cli, file: FileConfig) -> Result<Self> {
        let db_url = cli
            .db_url
            .or(file.db_url)
            .ok_or_else(|| ServerError::Config("no store url configured (set DB_URL)".to_string()))?;

        let app_path = match cli.app_path.or(file.app_path) {
            Some(path) => path,
            None => std::env::current_dir()?.join(DEFAULT_APP_DIR),
        };

        Ok(Self {
            store: StoreUrl::parse(&db_url)?,
            host: cli.host.or(file.host).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
            app_path,
            api_path: normalize_api_path(
                cli.api_path
                    .or(file.api_path)
                    .as_deref()
                    .unwrap_or(DEFAULT_API_PATH),
            )?,
            options: RouterOptions {
                strict_not_found: cli.strict_not_found.or(file.strict_not_found).unwrap_or(false),
                error_status: cli.error_status.or(file.error_status).unwrap_or(false),
            },
        })
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn normalize_api_path(path: &str) -> Result<String> {
    if !path.starts_with('/') {
        return Err(ServerError::Config(format!("api path {path:?} must start with '/'")));
    }
    if path.contains(['{', '}', '*', '?', '#']) || path.contains(char::is_whitespace) {
        return Err(ServerError::Config(format!("api path {path:?} is not a plain path")));
    }

    let trimmed = path.trim_end_matches('/');
    Ok(match trimmed.is_empty() {
        true => "/".to_string(),
        false => trimmed.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cli(db_url: &str) -> Cli {
        Cli {
            db_url: Some(db_url.to_string()),
            app_path: Some(PathBuf::from("/srv/app")),
            ..Default::default()
        }
    }

    #[test]
    fn mongodb_urls_name_their_database() {
        let url = StoreUrl::parse("mongodb://user:pw@localhost:27017/shop?retryWrites=true").unwrap();
        assert_eq!(url.scheme, StoreScheme::MongoDb);
        assert_eq!(url.database, "shop");

        let srv = StoreUrl::parse("mongodb+srv://cluster.example.net/inventory").unwrap();
        assert_eq!(srv.database, "inventory");
    }

    #[test]
    fn memory_urls_use_the_host_as_database() {
        let url = StoreUrl::parse("memory://shop").unwrap();

        assert_eq!(url.scheme, StoreScheme::Memory);
        assert_eq!(url.database, "shop");
    }

    #[test]
    fn bad_store_urls_are_rejected() {
        for url in ["localhost:27017", "mongodb://localhost:27017", "mongodb://localhost/", "memory://", "postgres://db/x"] {
            let err = StoreUrl::parse(url).unwrap_err();
            assert_eq!(err.kind(), "configuration", "{url}");
        }
    }

    #[test]
    fn defaults_fill_the_gaps() {
        let config = ServerConfig::merge(cli("memory://shop"), FileConfig::default()).unwrap();

        assert_eq!(config.socket_addr(), "0.0.0.0:8000");
        assert_eq!(config.api_path, "/api");
        assert_eq!(config.options, RouterOptions::default());
    }

    #[test]
    fn flags_win_over_the_file() {
        let file = FileConfig {
            db_url: Some("memory://other".to_string()),
            port: Some(9000),
            api_path: Some("/rest/".to_string()),
            error_status: Some(true),
            ..Default::default()
        };
        let mut flags = cli("memory://shop");
        flags.port = Some(8080);

        let config = ServerConfig::merge(flags, file).unwrap();
        assert_eq!(config.store.database, "shop");
        assert_eq!(config.port, 8080);
        assert_eq!(config.api_path, "/rest");
        assert!(config.options.error_status);
        assert!(!config.options.strict_not_found);
    }

    #[test]
    fn a_store_url_is_required() {
        let err = ServerConfig::merge(Cli::default(), FileConfig::default()).unwrap_err();
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn api_paths_are_validated() {
        assert_eq!(normalize_api_path("/").unwrap(), "/");
        assert_eq!(normalize_api_path("/v1/api//").unwrap(), "/v1/api");
        assert!(normalize_api_path("api").is_err());
        assert!(normalize_api_path("/{name}").is_err());
    }

    #[test]
    fn config_files_use_camel_case_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "dbUrl": "memory://shop", "apiPath": "/rest", "strictNotFound": true }}"#).unwrap();

        let loaded = FileConfig::from_path(file.path()).unwrap();
        assert_eq!(loaded.db_url.as_deref(), Some("memory://shop"));
        assert_eq!(loaded.api_path.as_deref(), Some("/rest"));
        assert_eq!(loaded.strict_not_found, Some(true));
    }
}
