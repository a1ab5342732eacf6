use crate::error::ConfigError;
use std::env;

/// Environment variable holding the reservation id prefix.
pub const RESERVATION_PREFIX_VAR: &str = "CINEMA_RESERVATION_PREFIX";
/// Environment variable holding the user id prefix.
pub const USER_PREFIX_VAR: &str = "CINEMA_USER_PREFIX";
/// Environment variable holding the `tracing` filter directive.
pub const LOG_FILTER_VAR: &str = "RUST_LOG";

/// Runtime settings of a [`Cinema`](crate::Cinema).
///
/// Identifiers are allocated sequentially as `<prefix><n>`, starting at 1,
/// e.g. `R1`, `R2` for reservations and `U1` for users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CinemaConfig {
    /// Prefix of reservation ids
    pub reservation_prefix: String,
    /// Prefix of user ids
    pub user_prefix: String,
    /// Filter directive handed to `tracing-subscriber` by binaries
    pub log_filter: String,
}

impl CinemaConfig {
    /// Reads the configuration from the process environment, falling back to
    /// [`CinemaConfig::default`] for every unset variable.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::EmptyPrefix`] if a prefix variable is set but empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// This is what [`CinemaConfig::from_env`] delegates to; tests use it to
    /// avoid mutating the process environment.
    ///
    /// ## Examples
    ///
    /// ```
    /// use cinema_booking::CinemaConfig;
    ///
    /// let config = CinemaConfig::from_lookup(|name| match name {
    ///     "CINEMA_RESERVATION_PREFIX" => Some("BK-".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    /// assert_eq!(config.reservation_prefix, "BK-");
    /// assert_eq!(config.user_prefix, "U");
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let reservation_prefix =
            non_empty(lookup(RESERVATION_PREFIX_VAR), RESERVATION_PREFIX_VAR)?
                .unwrap_or(defaults.reservation_prefix);
        let user_prefix = non_empty(lookup(USER_PREFIX_VAR), USER_PREFIX_VAR)?
            .unwrap_or(defaults.user_prefix);
        let log_filter = lookup(LOG_FILTER_VAR)
            .filter(|filter| !filter.trim().is_empty())
            .unwrap_or(defaults.log_filter);

        Ok(Self {
            reservation_prefix,
            user_prefix,
            log_filter,
        })
    }
}

fn non_empty(
    value: Option<String>,
    variable: &'static str,
) -> Result<Option<String>, ConfigError> {
    match value {
        Some(prefix) if prefix.is_empty() => Err(ConfigError::EmptyPrefix { variable }),
        other => Ok(other),
    }
}

impl Default for CinemaConfig {
    fn default() -> Self {
        Self {
            reservation_prefix: "R".to_string(),
            user_prefix: "U".to_string(),
            log_filter: "cinema_booking=info".to_string(),
        }
    }
}
