//! Command-line interface.

pub mod commands;
pub mod display;
pub mod types;

use console::style;
use serde_json::json;

pub use commands::CommandContext;
pub use types::{Cli, Commands};

use crate::domain::errors::{BackendError, DomainError};
use crate::infrastructure::config::ConfigError;
use crate::infrastructure::logging::SecretScrubber;

/// Exit status for configuration errors.
pub const EXIT_CONFIG: i32 = 2;
/// Exit status for every other failure.
pub const EXIT_FAILURE: i32 = 1;

/// Exit code for an error: configuration problems are distinguished from
/// request failures.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if err.chain().any(|cause| cause.is::<ConfigError>()) {
        EXIT_CONFIG
    } else {
        EXIT_FAILURE
    }
}

/// Short machine-readable category for `--json` error output.
pub fn error_kind(err: &anyhow::Error) -> &'static str {
    if err.chain().any(|cause| cause.is::<ConfigError>()) {
        return "config";
    }
    let backend = err.chain().find_map(|cause| {
        cause.downcast_ref::<BackendError>().or_else(|| {
            match cause.downcast_ref::<DomainError>() {
                Some(DomainError::Backend(inner)) => Some(inner),
                _ => None,
            }
        })
    });
    match backend {
        Some(e) if e.is_permission_denied() => "permission_denied",
        Some(BackendError::UnfilteredMutation { .. }) => "unfiltered_mutation",
        Some(_) => "backend",
        None if err.chain().any(|cause| {
            matches!(
                cause.downcast_ref::<DomainError>(),
                Some(DomainError::Validation(_))
            )
        }) =>
        {
            "validation"
        }
        None => "error",
    }
}

/// Print the error chain to stderr and exit.
///
/// Backend messages may echo request details, so the text is scrubbed of
/// credentials first.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    let scrubber = SecretScrubber::new();
    let message = scrubber.scrub_message(&format!("{err:#}"));
    if json_mode {
        let body = json!({
            "error": {
                "kind": error_kind(&err),
                "message": message,
            }
        });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );
    } else {
        eprintln!("{} {message}", style("Error:").red().bold());
    }
    std::process::exit(exit_code(&err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Privilege;
    use anyhow::Context;

    #[test]
    fn test_config_errors_exit_with_two() {
        let err = anyhow::Error::new(ConfigError::MissingEndpoint);
        assert_eq!(exit_code(&err), EXIT_CONFIG);
        assert_eq!(error_kind(&err), "config");

        let wrapped: anyhow::Result<()> = Err(ConfigError::MissingKey {
            privilege: Privilege::Elevated,
            variable: "BACKEND_SERVICE_KEY",
        })
        .context("resolving connection");
        assert_eq!(exit_code(&wrapped.unwrap_err()), EXIT_CONFIG);
    }

    #[test]
    fn test_backend_errors_exit_with_one() {
        let err: anyhow::Error = DomainError::from(BackendError::PermissionDenied {
            status: 401,
            message: "permission denied for table ingredients".into(),
        })
        .into();
        assert_eq!(exit_code(&err), EXIT_FAILURE);
        assert_eq!(error_kind(&err), "permission_denied");
    }

    #[test]
    fn test_validation_kind() {
        let err = anyhow::Error::new(DomainError::Validation("bad".into())).context("outer");
        assert_eq!(error_kind(&err), "validation");
    }
}
