//! Silo Configuration
//!
//! JSON-based settings loading with sensible defaults.
//! A missing settings file is created with defaults at startup, so a
//! first run needs no configuration at all.
//!
//! # Example Settings File
//!
//! ```json
//! {
//!   "udp_port": 514,
//!   "tcp_port": 6514,
//!   "use_tcp": false,
//!   "ip_address": ""
//! }
//! ```
//!
//! An empty `ip_address` binds to `0.0.0.0`.

mod error;

use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use error::{ConfigError, Result};

/// Default syslog UDP port (privileged - may need root)
pub const DEFAULT_UDP_PORT: u16 = 514;

/// Default syslog-over-TLS port
pub const DEFAULT_TCP_PORT: u16 = 6514;

/// Collector settings
///
/// All fields are optional in the settings file; missing fields take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// UDP listen port
    pub udp_port: u16,

    /// TLS listen port (transport handled outside the core pipeline)
    pub tcp_port: u16,

    /// Select the TCP/TLS transport instead of UDP
    pub use_tcp: bool,

    /// Bind address; empty means `0.0.0.0`
    pub ip_address: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            udp_port: DEFAULT_UDP_PORT,
            tcp_port: DEFAULT_TCP_PORT,
            use_tcp: false,
            ip_address: String::new(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid
    /// JSON, or fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        let settings: Settings = serde_json::from_str(&contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings, creating the file with defaults if it is absent
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            let defaults = Settings::default();
            defaults.write_to(path)?;
            tracing::info!(
                path = %path.display(),
                "settings file not found, created with defaults"
            );
            return Ok(defaults);
        }

        Self::from_file(path)
    }

    /// Write settings to a JSON file
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Resolve the bind address
    ///
    /// An empty `ip_address` resolves to `0.0.0.0`; anything else must
    /// parse as an IPv4 or IPv6 address.
    pub fn bind_address(&self) -> Result<IpAddr> {
        if self.ip_address.is_empty() {
            return Ok(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        }

        IpAddr::from_str(&self.ip_address).map_err(|_| ConfigError::InvalidAddress {
            value: self.ip_address.clone(),
        })
    }

    /// The listen port for the selected transport
    #[inline]
    pub fn listen_port(&self) -> u16 {
        if self.use_tcp {
            self.tcp_port
        } else {
            self.udp_port
        }
    }

    /// Validate the settings
    fn validate(&self) -> Result<()> {
        if self.udp_port == 0 {
            return Err(ConfigError::InvalidPort { field: "udp_port" });
        }
        if self.tcp_port == 0 {
            return Err(ConfigError::InvalidPort { field: "tcp_port" });
        }
        // Surface a bad address at load time rather than at bind time
        self.bind_address()?;
        Ok(())
    }
}
