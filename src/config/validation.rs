//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::ServerConfig;

/// Upper bound for any configured timeout.
pub const MAX_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut fail = |field, message: String| errors.push(ValidationError { field, message });

    if let Err(message) = check_bind_address(&config.listener.bind_address) {
        fail("listener.bind_address", message);
    }
    if config.listener.max_request_bytes == 0 {
        fail("listener.max_request_bytes", "must be greater than 0".into());
    }
    if let Err(message) = check_timeout(config.timeouts.call_secs) {
        fail("timeouts.call_secs", message);
    }
    if let Err(message) = check_timeout(config.timeouts.shutdown_secs) {
        fail("timeouts.shutdown_secs", message);
    }
    if config.logging.filter.trim().is_empty() {
        fail("logging.filter", "must not be empty".into());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_timeout(secs: u64) -> Result<(), String> {
    match secs {
        0 => Err("must be greater than 0".into()),
        s if s > MAX_TIMEOUT_SECS => Err(format!("must be at most {MAX_TIMEOUT_SECS} seconds")),
        _ => Ok(()),
    }
}

/// `host:port` with a non-empty host and a numeric port. Port 0 is allowed.
fn check_bind_address(address: &str) -> Result<(), String> {
    let Some((host, port)) = address.rsplit_once(':') else {
        return Err(format!("`{address}` is not in host:port form"));
    };
    if host.is_empty() {
        return Err(format!("`{address}` has no host"));
    }
    port.parse::<u16>()
        .map(|_| ())
        .map_err(|_| format!("`{port}` is not a valid port"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn bind_address_forms() {
        assert!(check_bind_address("localhost:8080").is_ok());
        assert!(check_bind_address("127.0.0.1:0").is_ok());
        assert!(check_bind_address("[::1]:8080").is_ok());
        assert!(check_bind_address("localhost").is_err());
        assert!(check_bind_address(":8080").is_err());
        assert!(check_bind_address("localhost:http").is_err());
        assert!(check_bind_address("localhost:70000").is_err());
    }

    #[test]
    fn all_errors_are_reported() {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.timeouts.call_secs = 0;
        config.timeouts.shutdown_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["listener.bind_address", "timeouts.call_secs", "timeouts.shutdown_secs"]
        );
    }

    #[test]
    fn oversized_timeouts_are_rejected() {
        let mut config = ServerConfig::default();
        config.timeouts.call_secs = i64::MAX as u64;
        config.timeouts.shutdown_secs = MAX_TIMEOUT_SECS + 1;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["timeouts.call_secs", "timeouts.shutdown_secs"]);
        assert!(errors[0].message.contains("at most"));

        config.timeouts.call_secs = MAX_TIMEOUT_SECS;
        config.timeouts.shutdown_secs = MAX_TIMEOUT_SECS;
        assert_eq!(validate_config(&config), Ok(()));
    }
}
