//! Exit codes of the pan CLI
//!
//! Scripts depend on these values. Changing one is a breaking change.

use pan_core::{BatchReport, Error};

/// Remote error codes meaning the session is missing or expired
const SESSION_ERROR_CODES: &[&str] = &[
    "HTTP401",
    "HTTP403",
    "InvalidSessionKey",
    "UserInvalidOpenToken",
    "InvalidAccessToken",
];

/// Process exit status of a pan command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// Unspecified failure, or a batch where some paths were not processed
    GeneralError = 1,

    /// Invalid arguments, malformed path, bad config value
    UsageError = 2,

    /// Transport failure, worth retrying
    NetworkError = 3,

    /// Session rejected by the service
    AuthError = 4,

    /// A path segment or file id does not exist
    NotFound = 5,

    /// Ctrl+C
    Interrupted = 130,
}

impl ExitCode {
    /// Convert exit code to i32 for use with std::process::exit
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Success only when every input path of the batch was processed
    pub fn for_report(report: &BatchReport) -> Self {
        if report.is_success() {
            Self::Success
        } else {
            Self::GeneralError
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::Remote { code, .. } if SESSION_ERROR_CODES.contains(&code.as_str()) => {
                Self::AuthError
            }
            Error::InvalidPath(_) | Error::InvalidInput(_) | Error::Config(_) => Self::UsageError,
            Error::Network(_) => Self::NetworkError,
            Error::NotFound(_) => Self::NotFound,
            _ => Self::GeneralError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}
