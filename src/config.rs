// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the `AppConfig` loaded from them
//! once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AUTH0_DOMAIN` | Identity provider domain (derives JWKS URL and issuer) | Required unless `JWKS_URL` and `AUTH_ISSUER` are set |
//! | `JWKS_URL` | JWKS endpoint, must be `https` | `https://{AUTH0_DOMAIN}/.well-known/jwks.json` |
//! | `AUTH_ISSUER` | Expected token issuer | `https://{AUTH0_DOMAIN}/` |
//! | `API_AUDIENCE` | Expected token audience | Required |
//! | `AUTH_ALGORITHMS` | Accepted signing algorithms, comma-separated | `RS256` |
//! | `JWKS_CACHE_TTL_SECS` | Key set cache TTL | `300` |
//! | `AUTH_LEEWAY_SECS` | Clock skew tolerance | `60` |
//! | `DATABASE_PATH` | Catalog database file | `data/drinks.redb` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; HTTPS when both are set | Plain HTTP |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use url::Url;

pub const AUTH0_DOMAIN_ENV: &str = "AUTH0_DOMAIN";
pub const JWKS_URL_ENV: &str = "JWKS_URL";
pub const AUTH_ISSUER_ENV: &str = "AUTH_ISSUER";
pub const API_AUDIENCE_ENV: &str = "API_AUDIENCE";
pub const AUTH_ALGORITHMS_ENV: &str = "AUTH_ALGORITHMS";
pub const JWKS_CACHE_TTL_ENV: &str = "JWKS_CACHE_TTL_SECS";
pub const AUTH_LEEWAY_ENV: &str = "AUTH_LEEWAY_SECS";
pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_DATABASE_PATH: &str = "data/drinks.redb";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_LEEWAY_SECS: u64 = 60;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Token verification settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub jwks_url: Url,
    pub issuer: String,
    pub audience: String,
    pub algorithms: Vec<Algorithm>,
    pub jwks_cache_ttl: Duration,
    pub leeway_secs: u64,
}

/// PEM certificate and key for HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Full application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub auth: AuthSettings,
    pub database_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            auth: auth_settings(&get)?,
            database_path: get(DATABASE_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH)),
            bind_addr: bind_addr(&get)?,
            tls: tls_paths(&get)?,
            log_format: log_format(&get)?,
        })
    }
}

/// Read the log format on its own, so logging can start before full config load.
pub fn log_format_from_env() -> LogFormat {
    log_format(&|name: &str| std::env::var(name).ok()).unwrap_or_default()
}

fn auth_settings(get: &impl Fn(&str) -> Option<String>) -> Result<AuthSettings, ConfigError> {
    let domain = get(AUTH0_DOMAIN_ENV).map(|d| d.trim().trim_end_matches('/').to_string());

    let jwks_url = match (get(JWKS_URL_ENV), &domain) {
        (Some(url), _) => url,
        (None, Some(domain)) => format!("https://{domain}/.well-known/jwks.json"),
        (None, None) => return Err(ConfigError::Missing(AUTH0_DOMAIN_ENV)),
    };
    let jwks_url = Url::parse(&jwks_url).map_err(|e| ConfigError::Invalid {
        name: JWKS_URL_ENV,
        reason: e.to_string(),
    })?;
    if jwks_url.scheme() != "https" {
        return Err(ConfigError::Invalid {
            name: JWKS_URL_ENV,
            reason: "JWKS must be fetched over https".to_string(),
        });
    }

    let issuer = match (get(AUTH_ISSUER_ENV), &domain) {
        (Some(issuer), _) => issuer,
        (None, Some(domain)) => format!("https://{domain}/"),
        (None, None) => return Err(ConfigError::Missing(AUTH_ISSUER_ENV)),
    };

    let audience = get(API_AUDIENCE_ENV).ok_or(ConfigError::Missing(API_AUDIENCE_ENV))?;

    let algorithms = match get(AUTH_ALGORITHMS_ENV) {
        Some(list) => parse_algorithms(&list)?,
        None => vec![Algorithm::RS256],
    };

    Ok(AuthSettings {
        jwks_url,
        issuer,
        audience,
        algorithms,
        jwks_cache_ttl: Duration::from_secs(parse_or(
            get,
            JWKS_CACHE_TTL_ENV,
            DEFAULT_JWKS_CACHE_TTL_SECS,
        )?),
        leeway_secs: parse_or(get, AUTH_LEEWAY_ENV, DEFAULT_LEEWAY_SECS)?,
    })
}

fn parse_algorithms(list: &str) -> Result<Vec<Algorithm>, ConfigError> {
    let algorithms = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| {
            Algorithm::from_str(name).map_err(|_| ConfigError::Invalid {
                name: AUTH_ALGORITHMS_ENV,
                reason: format!("unknown algorithm '{name}'"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if algorithms.is_empty() {
        return Err(ConfigError::Invalid {
            name: AUTH_ALGORITHMS_ENV,
            reason: "at least one algorithm is required".to_string(),
        });
    }
    Ok(algorithms)
}

fn bind_addr(get: &impl Fn(&str) -> Option<String>) -> Result<SocketAddr, ConfigError> {
    let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
    let ip: IpAddr = host.parse().map_err(|_| ConfigError::Invalid {
        name: HOST_ENV,
        reason: format!("'{host}' is not an IP address"),
    })?;
    let port = parse_or(get, PORT_ENV, DEFAULT_PORT)?;
    Ok(SocketAddr::new(ip, port))
}

fn tls_paths(get: &impl Fn(&str) -> Option<String>) -> Result<Option<TlsPaths>, ConfigError> {
    match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
        (Some(cert), Some(key)) => Ok(Some(TlsPaths {
            cert: cert.into(),
            key: key.into(),
        })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
        (None, Some(_)) => Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
    }
}

fn log_format(get: &impl Fn(&str) -> Option<String>) -> Result<LogFormat, ConfigError> {
    match get(LOG_FORMAT_ENV).as_deref().map(str::to_lowercase).as_deref() {
        None | Some("pretty") => Ok(LogFormat::Pretty),
        Some("json") => Ok(LogFormat::Json),
        Some(other) => Err(ConfigError::Invalid {
            name: LOG_FORMAT_ENV,
            reason: format!("expected 'json' or 'pretty', got '{other}'"),
        }),
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            reason: format!("'{raw}' is not a valid number"),
        }),
        None => Ok(default),
    }
}
