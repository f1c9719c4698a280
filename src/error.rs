use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid handle: {0}")]
    InvalidHandle(String),

    #[error("error compiling shader source:\n{0}")]
    Compile(String),

    #[error("error creating compute pipeline:\n{0}")]
    Build(String),

    #[error("failed to create buffer: {0}")]
    AllocationFailed(String),

    #[error("{0}")]
    Bounds(String),

    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    #[error("no default device found: {0}")]
    NoDevice(String),

    #[error("device mismatch: {0}")]
    DeviceMismatch(String),

    #[error("dispatch failed: {0}")]
    DispatchFailed(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("telemetry error: {0}")]
    Telemetry(String),
}

/// Machine-distinguishable failure kind, independent of the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidHandle,
    CompileError,
    BuildError,
    AllocationFailed,
    BoundsError,
    UnsupportedType,
    NoDevice,
    DeviceMismatch,
    DispatchFailed,
    Config,
    Telemetry,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidHandle => "InvalidHandle",
            ErrorKind::CompileError => "CompileError",
            ErrorKind::BuildError => "BuildError",
            ErrorKind::AllocationFailed => "AllocationFailed",
            ErrorKind::BoundsError => "BoundsError",
            ErrorKind::UnsupportedType => "UnsupportedType",
            ErrorKind::NoDevice => "NoDevice",
            ErrorKind::DeviceMismatch => "DeviceMismatch",
            ErrorKind::DispatchFailed => "DispatchFailed",
            ErrorKind::Config => "Config",
            ErrorKind::Telemetry => "Telemetry",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    pub fn invalid_handle<S: Into<String>>(msg: S) -> Self {
        Error::InvalidHandle(msg.into())
    }

    pub fn compile<S: Into<String>>(diagnostic: S) -> Self {
        Error::Compile(diagnostic.into())
    }

    pub fn build<S: Into<String>>(diagnostic: S) -> Self {
        Error::Build(diagnostic.into())
    }

    pub fn allocation<S: Into<String>>(msg: S) -> Self {
        Error::AllocationFailed(msg.into())
    }

    pub fn bounds<S: Into<String>>(msg: S) -> Self {
        Error::Bounds(msg.into())
    }

    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        Error::UnsupportedType(msg.into())
    }

    pub fn no_device<S: Into<String>>(msg: S) -> Self {
        Error::NoDevice(msg.into())
    }

    pub fn device_mismatch<S: Into<String>>(msg: S) -> Self {
        Error::DeviceMismatch(msg.into())
    }

    pub fn dispatch<S: Into<String>>(msg: S) -> Self {
        Error::DispatchFailed(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn telemetry<S: Into<String>>(msg: S) -> Self {
        Error::Telemetry(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidHandle(_) => ErrorKind::InvalidHandle,
            Error::Compile(_) => ErrorKind::CompileError,
            Error::Build(_) => ErrorKind::BuildError,
            Error::AllocationFailed(_) => ErrorKind::AllocationFailed,
            Error::Bounds(_) => ErrorKind::BoundsError,
            Error::UnsupportedType(_) => ErrorKind::UnsupportedType,
            Error::NoDevice(_) => ErrorKind::NoDevice,
            Error::DeviceMismatch(_) => ErrorKind::DeviceMismatch,
            Error::DispatchFailed(_) => ErrorKind::DispatchFailed,
            Error::Config(_) => ErrorKind::Config,
            Error::Telemetry(_) => ErrorKind::Telemetry,
        }
    }

    /// The message without the kind prefix added by `Display`.
    pub fn detail(&self) -> &str {
        match self {
            Error::InvalidHandle(msg)
            | Error::Compile(msg)
            | Error::Build(msg)
            | Error::AllocationFailed(msg)
            | Error::Bounds(msg)
            | Error::UnsupportedType(msg)
            | Error::NoDevice(msg)
            | Error::DeviceMismatch(msg)
            | Error::DispatchFailed(msg)
            | Error::Config(msg)
            | Error::Telemetry(msg) => msg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_constructor() {
        assert_eq!(Error::compile("x").kind(), ErrorKind::CompileError);
        assert_eq!(Error::build("x").kind(), ErrorKind::BuildError);
        assert_eq!(Error::bounds("x").kind(), ErrorKind::BoundsError);
        assert_eq!(Error::no_device("x").kind(), ErrorKind::NoDevice);
        assert_eq!(Error::invalid_handle("x").kind(), ErrorKind::InvalidHandle);
    }

    #[test]
    fn test_compile_message_keeps_diagnostic() {
        let err = Error::compile("error: expected `;`");
        assert!(err.to_string().contains("expected `;`"));
        assert_eq!(err.detail(), "error: expected `;`");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::AllocationFailed.to_string(), "AllocationFailed");
    }
}
