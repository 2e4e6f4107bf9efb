use qrcode::EcLevel;
use std::net::{IpAddr, SocketAddr};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MODULE_SIZE: u32 = 4;
const MAX_MODULE_SIZE: u32 = 64;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("QR_MODULE_SIZE must be between 1 and 64, got {0}")]
    ModuleSizeOutOfRange(u32),
}

/// Runtime settings, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub module_size: u32,
    pub ec_level: EcLevel,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::from([0, 0, 0, 0]), DEFAULT_PORT),
            module_size: DEFAULT_MODULE_SIZE,
            ec_level: EcLevel::M,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = match lookup("HOST") {
            Some(raw) => parse_value::<IpAddr>("HOST", &raw)?,
            None => defaults.bind_addr.ip(),
        };
        let port = match lookup("PORT") {
            Some(raw) => parse_value::<u16>("PORT", &raw)?,
            None => defaults.bind_addr.port(),
        };
        let module_size = match lookup("QR_MODULE_SIZE") {
            Some(raw) => parse_value::<u32>("QR_MODULE_SIZE", &raw)?,
            None => defaults.module_size,
        };
        if !(1..=MAX_MODULE_SIZE).contains(&module_size) {
            return Err(ConfigError::ModuleSizeOutOfRange(module_size));
        }
        let ec_level = match lookup("QR_ERROR_CORRECTION") {
            Some(raw) => parse_ec_level(&raw)?,
            None => defaults.ec_level,
        };

        Ok(Self {
            bind_addr: SocketAddr::new(host, port),
            module_size,
            ec_level,
        })
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

fn parse_ec_level(raw: &str) -> Result<EcLevel, ConfigError> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "L" => Ok(EcLevel::L),
        "M" => Ok(EcLevel::M),
        "Q" => Ok(EcLevel::Q),
        "H" => Ok(EcLevel::H),
        _ => Err(ConfigError::InvalidValue {
            key: "QR_ERROR_CORRECTION",
            value: raw.to_string(),
        }),
    }
}
