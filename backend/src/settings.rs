//! Environment-driven application settings.
//!
//! Every variable is optional; unset or blank values fall back to the
//! defaults below. Values that are present but unparsable are errors rather
//! than silently ignored.
//!
//! | Variable                        | Default                      |
//! |---------------------------------|------------------------------|
//! | `PORT`                          | `8000`                       |
//! | `BIND_HOST`                     | `0.0.0.0`                    |
//! | `FRONTEND_URL`                  | `http://localhost:3000`      |
//! | `REDIS_URL`                     | `redis://localhost:6379`     |
//! | `REDIS_POOL_SIZE`               | `16`                         |
//! | `FIREBASE_SERVICE_ACCOUNT_FILE` | `./service-account-key.json` |
//! | `FIREBASE_JWKS_URL`             | Google secure-token JWKS     |
//!
//! `FRONTEND_URL` must be a bare `http`/`https` origin. It is normalised to
//! the serialisation browsers send in the `Origin` header.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use mockable::Env;
use url::Url;

use crate::outbound::identity::FIREBASE_JWKS_URL;

pub const PORT_ENV: &str = "PORT";
pub const BIND_HOST_ENV: &str = "BIND_HOST";
pub const FRONTEND_URL_ENV: &str = "FRONTEND_URL";
pub const REDIS_URL_ENV: &str = "REDIS_URL";
pub const REDIS_POOL_SIZE_ENV: &str = "REDIS_POOL_SIZE";
pub const SERVICE_ACCOUNT_FILE_ENV: &str = "FIREBASE_SERVICE_ACCOUNT_FILE";
pub const JWKS_URL_ENV: &str = "FIREBASE_JWKS_URL";

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";
const DEFAULT_REDIS_POOL_SIZE: u32 = 16;
const DEFAULT_SERVICE_ACCOUNT_FILE: &str = "./service-account-key.json";

/// Errors raised while reading settings from the environment.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{name} has invalid value '{value}': expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub bind_addr: SocketAddr,
    pub frontend_origin: String,
    pub redis_url: String,
    pub redis_pool_size: u32,
    pub service_account_file: PathBuf,
    pub jwks_url: Url,
}

fn lookup<E: Env>(env: &E, name: &str) -> Option<String> {
    env.string(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_or<E, T>(env: &E, name: &'static str, expected: &'static str, default: T) -> Result<T, SettingsError>
where
    E: Env,
    T: std::str::FromStr,
{
    match lookup(env, name) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| SettingsError::InvalidEnv {
                name,
                value,
                expected,
            }),
    }
}

const ORIGIN_EXPECTED: &str = "a bare http(s) origin such as https://app.example.com";

fn parse_origin(raw: String) -> Result<String, SettingsError> {
    let invalid = |value: String| SettingsError::InvalidEnv {
        name: FRONTEND_URL_ENV,
        value,
        expected: ORIGIN_EXPECTED,
    };
    let Ok(url) = Url::parse(&raw) else {
        return Err(invalid(raw));
    };
    let bare = matches!(url.scheme(), "http" | "https")
        && url.has_host()
        && url.username().is_empty()
        && url.password().is_none()
        && url.path() == "/"
        && url.query().is_none()
        && url.fragment().is_none();
    if !bare {
        return Err(invalid(raw));
    }
    Ok(url.origin().ascii_serialization())
}

impl AppSettings {
    /// Read settings from `env`.
    ///
    /// # Errors
    /// Returns [`SettingsError::InvalidEnv`] for unparsable values, including a
    /// `FRONTEND_URL` that is not a bare origin.
    ///
    /// # Examples
    /// ```
    /// use backend::settings::AppSettings;
    /// use mockable::MockEnv;
    ///
    /// let mut env = MockEnv::new();
    /// env.expect_string().returning(|name| match name {
    ///     "PORT" => Some("9000".to_owned()),
    ///     _ => None,
    /// });
    /// let settings = AppSettings::from_env(&env).expect("valid settings");
    /// assert_eq!(settings.bind_addr.port(), 9000);
    /// assert_eq!(settings.redis_url, "redis://localhost:6379");
    /// ```
    pub fn from_env<E: Env>(env: &E) -> Result<Self, SettingsError> {
        let port = parse_or(env, PORT_ENV, "a TCP port number", DEFAULT_PORT)?;
        let host = parse_or(
            env,
            BIND_HOST_ENV,
            "an IP address",
            IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        )?;
        let redis_pool_size = parse_or(
            env,
            REDIS_POOL_SIZE_ENV,
            "a positive integer",
            DEFAULT_REDIS_POOL_SIZE,
        )?;
        if redis_pool_size == 0 {
            return Err(SettingsError::InvalidEnv {
                name: REDIS_POOL_SIZE_ENV,
                value: "0".to_owned(),
                expected: "a positive integer",
            });
        }
        let default_jwks =
            Url::parse(FIREBASE_JWKS_URL).map_err(|_| SettingsError::InvalidEnv {
                name: JWKS_URL_ENV,
                value: FIREBASE_JWKS_URL.to_owned(),
                expected: "an absolute URL",
            })?;
        let jwks_url = parse_or(env, JWKS_URL_ENV, "an absolute URL", default_jwks)?;
        let frontend_origin = parse_origin(
            lookup(env, FRONTEND_URL_ENV).unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_owned()),
        )?;

        Ok(Self {
            bind_addr: SocketAddr::new(host, port),
            frontend_origin,
            redis_url: lookup(env, REDIS_URL_ENV).unwrap_or_else(|| DEFAULT_REDIS_URL.to_owned()),
            redis_pool_size,
            service_account_file: lookup(env, SERVICE_ACCOUNT_FILE_ENV)
                .map_or_else(|| PathBuf::from(DEFAULT_SERVICE_ACCOUNT_FILE), PathBuf::from),
            jwks_url,
        })
    }
}
