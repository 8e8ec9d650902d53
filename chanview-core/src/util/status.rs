use core::fmt;

#[cfg(feature = "use_backtrace")]
use backtrace::Backtrace;
use log::error;

/// gRPC compatible error status
#[derive(Clone, PartialEq, Eq)]
pub struct Status {
    /// The gRPC status code
    code: Code,
    /// A relevant error message
    message: String,
}

/// gRPC compatible error status code
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Code {
    /// The operation completed successfully.
    Ok = 0,

    /// Client specified an invalid argument.
    InvalidArgument = 3,

    /// Some requested entity was not found.
    NotFound = 5,

    /// Internal error.
    Internal = 13,
}

impl Status {
    /// Create a new `Status` with the associated code and message.
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Status { code, message: message.into() }
    }

    /// Get the gRPC `Code` of this `Status`.
    pub fn code(&self) -> Code {
        self.code
    }

    /// Get the text error message of this `Status`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Construct an invalid argument status
    pub fn invalid_argument(message: impl Into<String>) -> Status {
        Self::new(Code::InvalidArgument, message)
    }

    /// Construct a not found status
    pub fn not_found(message: impl Into<String>) -> Status {
        Self::new(Code::NotFound, message)
    }

    /// Construct an internal error status
    pub fn internal(message: impl Into<String>) -> Status {
        Self::new(Code::Internal, message)
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // A manual impl to reduce the noise of frequently empty fields.
        let mut builder = f.debug_struct("Status");

        builder.field("code", &self.code);

        if !self.message.is_empty() {
            builder.field("message", &self.message);
        }

        builder.finish()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status: {:?}, message: {:?}", self.code(), self.message())
    }
}

impl std::error::Error for Status {}

/// An invalid argument was detected
pub fn invalid_argument(msg: impl Into<String>) -> Status {
    let s = msg.into();
    error!("INVALID ARGUMENT: {}", &s);
    #[cfg(feature = "use_backtrace")]
    error!("BACKTRACE:\n{:?}", Backtrace::new());
    Status::invalid_argument(s)
}

/// A requested entity was not found
pub fn not_found(msg: impl Into<String>) -> Status {
    let s = msg.into();
    error!("NOT FOUND: {}", &s);
    Status::not_found(s)
}

pub(crate) fn internal_error(msg: impl Into<String>) -> Status {
    let s = msg.into();
    error!("INTERNAL ERROR: {}", &s);
    #[cfg(feature = "use_backtrace")]
    error!("BACKTRACE:\n{:?}", Backtrace::new());
    Status::internal(s)
}

impl From<serde_json::Error> for Status {
    fn from(e: serde_json::Error) -> Self {
        invalid_argument(format!("malformed json: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_test() {
        let s = Status::not_found("channel abcd");
        assert_eq!(s.code(), Code::NotFound);
        assert_eq!(s.to_string(), "status: NotFound, message: \"channel abcd\"");
        assert_eq!(format!("{:?}", Status::new(Code::Ok, "")), "Status { code: Ok }");
    }

    #[test]
    fn status_from_json_error_test() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        let s: Status = err.into();
        assert_eq!(s.code(), Code::InvalidArgument);
        assert!(s.message().starts_with("malformed json"));
    }
}
