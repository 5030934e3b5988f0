//! Server configuration loaded from the environment.

use crate::error::ConfigError;

const LISTEN_ADDR: &str = "REASON_LISTEN_ADDR";
const REDIRECT_TRAILING_SLASH: &str = "REASON_REDIRECT_TRAILING_SLASH";
const PERMISSIVE_CORS: &str = "REASON_PERMISSIVE_CORS";

/// Default address the binary listens on.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3456";

/// Settings for building and serving the resource router.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `127.0.0.1:3456`.
    pub listen_addr: String,

    /// Redirect `/{path}/` to `/{path}` when only the latter is routed.
    pub redirect_trailing_slash: bool,

    /// Attach a permissive CORS layer to the router.
    pub permissive_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_owned(),
            redirect_trailing_slash: true,
            permissive_cors: false,
        }
    }
}

impl ServerConfig {
    /// Read the configuration from process environment variables.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidFlag`] if a boolean variable is set to an
    /// unrecognised value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Unset variables fall back to [`ServerConfig::default`].
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidFlag`] for unrecognised boolean values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            listen_addr: lookup(LISTEN_ADDR).unwrap_or(defaults.listen_addr),
            redirect_trailing_slash: flag(&lookup, REDIRECT_TRAILING_SLASH, defaults.redirect_trailing_slash)?,
            permissive_cors: flag(&lookup, PERMISSIVE_CORS, defaults.permissive_cors)?,
        })
    }

    /// Override the listen address.
    #[must_use]
    pub fn with_listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = addr.into();
        self
    }

    #[must_use]
    pub fn with_redirect_trailing_slash(mut self, enabled: bool) -> Self {
        self.redirect_trailing_slash = enabled;
        self
    }

    #[must_use]
    pub fn with_permissive_cors(mut self, enabled: bool) -> Self {
        self.permissive_cors = enabled;
        self
    }
}

fn flag(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(value) = lookup(name) else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { name, value }),
    }
}
