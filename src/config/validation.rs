//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early. Problems
//! are reported all at once; none of them stop the bot.

use super::Config;
use std::net::SocketAddr;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("host is required")]
    MissingHost,
    #[error("port must be non-zero")]
    ZeroPort,
    #[error("username is required")]
    MissingUsername,
    #[error("main.bot_id is required")]
    MissingBotId,
    #[error("main.owner is required")]
    MissingOwner,
    #[error("commands.prefix must be non-empty and contain no whitespace, got '{0}'")]
    InvalidPrefix(String),
    #[error("commands.teleport_pattern is not a valid regex: {0}")]
    InvalidTeleportPattern(String),
    #[error("reconnect.interval_secs must be non-zero")]
    ZeroReconnectInterval,
    #[error("bridge.connect_timeout_secs must be non-zero")]
    ZeroConnectTimeout,
    #[error("web.address is not a socket address: {0}")]
    InvalidWebAddress(String),
    #[error("web.broadcast_interval_ms must be non-zero")]
    ZeroBroadcastInterval,
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Connection identity
    if config.host.trim().is_empty() {
        errors.push(ValidationError::MissingHost);
    }
    if config.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if config.username.trim().is_empty() {
        errors.push(ValidationError::MissingUsername);
    }
    if config.main.bot_id.trim().is_empty() {
        errors.push(ValidationError::MissingBotId);
    }
    if config.main.owner.trim().is_empty() {
        errors.push(ValidationError::MissingOwner);
    }

    // Command recognition
    let prefix = &config.commands.prefix;
    if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
        errors.push(ValidationError::InvalidPrefix(prefix.clone()));
    }
    if let Err(e) = regex::Regex::new(&config.commands.teleport_pattern) {
        errors.push(ValidationError::InvalidTeleportPattern(e.to_string()));
    }

    if config.reconnect.interval_secs == 0 {
        errors.push(ValidationError::ZeroReconnectInterval);
    }
    if config.bridge.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }

    // Status server
    if config.web.enabled {
        if config.web.address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidWebAddress(config.web.address.clone()));
        }
        if config.web.broadcast_interval_ms == 0 {
            errors.push(ValidationError::ZeroBroadcastInterval);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIN_BROADCAST_INTERVAL_MS;
    use std::time::Duration;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate(&Config::default()), Ok(()));
    }

    #[test]
    fn reports_every_problem() {
        let mut config = Config::default();
        config.host = String::new();
        config.commands.prefix = ".zy bot".to_string();
        config.commands.teleport_pattern = "(".to_string();
        config.web.address = "not-an-address".to_string();

        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::MissingHost));
        assert!(errors.contains(&ValidationError::InvalidPrefix(".zy bot".into())));
    }

    #[test]
    fn zero_periods_are_flagged_and_clamped() {
        let mut config = Config::default();
        config.reconnect.interval_secs = 0;
        config.bridge.connect_timeout_secs = 0;
        config.web.broadcast_interval_ms = 0;

        let errors = validate(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::ZeroReconnectInterval));
        assert!(errors.contains(&ValidationError::ZeroConnectTimeout));
        assert!(errors.contains(&ValidationError::ZeroBroadcastInterval));

        assert_eq!(config.reconnect.interval(), Duration::from_secs(1));
        assert_eq!(config.bridge.connect_timeout(), Duration::from_secs(1));
        assert_eq!(
            config.web.broadcast_interval(),
            Duration::from_millis(MIN_BROADCAST_INTERVAL_MS)
        );
    }

    #[test]
    fn disabled_web_skips_address_check() {
        let mut config = Config::default();
        config.web.enabled = false;
        config.web.address = "nope".to_string();
        assert!(validate(&config).is_ok());
    }
}
