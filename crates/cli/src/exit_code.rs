//! Process exit codes
//!
//! Scripts rely on these values; changing one is a breaking change.

use zs_core::Error;

/// Exit status of a `zs` invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// Failure without a more specific code
    GeneralError = 1,

    /// Invalid arguments, malformed path or key, missing credentials
    UsageError = 2,

    /// Transport failure or server error; retrying may help
    NetworkError = 3,

    /// Rejected credentials or insufficient permissions
    AuthError = 4,

    /// Profile, container or key does not exist
    NotFound = 5,

    /// Stopped by Ctrl+C
    Interrupted = 130,
}

impl ExitCode {
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Exit code for a library error
    pub const fn from_error(error: &Error) -> Self {
        match error.exit_code() {
            2 => Self::UsageError,
            3 => Self::NetworkError,
            4 => Self::AuthError,
            5 => Self::NotFound,
            _ => Self::GeneralError,
        }
    }

    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(i32::from(ExitCode::GeneralError), 1);
        assert_eq!(ExitCode::UsageError.as_i32(), 2);
        assert_eq!(ExitCode::NetworkError.as_i32(), 3);
        assert_eq!(ExitCode::AuthError.as_i32(), 4);
        assert_eq!(ExitCode::NotFound.as_i32(), 5);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
    }

    #[test]
    fn test_exit_code_from_error() {
        let cases = [
            (Error::NotFound("c/d".into()), ExitCode::NotFound),
            (Error::ProfileNotFound("demo".into()), ExitCode::NotFound),
            (Error::AuthMissingParameter("x".into()), ExitCode::UsageError),
            (Error::InvalidKey("..".into()), ExitCode::UsageError),
            (Error::InvalidPath("".into()), ExitCode::UsageError),
            (Error::Network("reset".into()), ExitCode::NetworkError),
            (Error::Auth("401".into()), ExitCode::AuthError),
            (Error::General("boom".into()), ExitCode::GeneralError),
        ];
        for (error, expected) in cases {
            assert_eq!(ExitCode::from_error(&error), expected, "{error}");
        }
    }

    #[test]
    fn test_only_success_is_success() {
        assert!(ExitCode::Success.is_success());
        assert!(!ExitCode::NotFound.is_success());
    }
}
