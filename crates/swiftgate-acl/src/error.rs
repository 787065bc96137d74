//! Error types

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use http::StatusCode;

/// Boxed error source
pub(crate) type BoxStdError = Box<dyn StdError + Send + Sync + 'static>;

/// Result carrying an [`S3Error`]
pub type S3Result<T, E = S3Error> = Result<T, E>;

/// Constructs an [`S3Error`] from an error code, an optional source and an
/// optional formatted message.
macro_rules! s3_error {
    ($source:expr, $code:ident) => {{
        let mut err = $crate::S3Error::new($crate::S3ErrorCode::$code);
        err.set_source(Box::new($source));
        err
    }};
    ($source:expr, $code:ident, $($arg:tt)+) => {{
        let mut err = $crate::S3Error::with_message($crate::S3ErrorCode::$code, format!($($arg)+));
        err.set_source(Box::new($source));
        err
    }};
    ($code:ident) => {
        $crate::S3Error::new($crate::S3ErrorCode::$code)
    };
    ($code:ident, $($arg:tt)+) => {
        $crate::S3Error::with_message($crate::S3ErrorCode::$code, format!($($arg)+))
    };
}

/// Error codes surfaced by the authorization core.
///
/// The boundary layer is responsible for serializing these into wire
/// responses; here a code only carries its identity and HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum S3ErrorCode {
    /// The caller does not hold the required permission
    AccessDenied,
    /// The request carries an argument with an invalid value
    InvalidArgument,
    /// The request is invalid as a whole (e.g. conflicting inputs)
    InvalidRequest,
    /// An unexpected internal failure
    InternalError,
    /// The ACL body failed to parse against the access control policy schema
    MalformedACLError,
    /// A required security header was absent
    MissingSecurityHeader,
    /// The target container does not exist
    NoSuchBucket,
    /// The target object does not exist
    NoSuchKey,
    /// The requested feature is not implemented
    NotImplemented,
    /// An ACL update attempted to change the resource owner
    OwnerMismatch,
    /// Content was supplied where none was expected
    UnexpectedContent,
}

impl S3ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccessDenied => "AccessDenied",
            Self::InvalidArgument => "InvalidArgument",
            Self::InvalidRequest => "InvalidRequest",
            Self::InternalError => "InternalError",
            Self::MalformedACLError => "MalformedACLError",
            Self::MissingSecurityHeader => "MissingSecurityHeader",
            Self::NoSuchBucket => "NoSuchBucket",
            Self::NoSuchKey => "NoSuchKey",
            Self::NotImplemented => "NotImplemented",
            Self::OwnerMismatch => "OwnerMismatch",
            Self::UnexpectedContent => "UnexpectedContent",
        }
    }

    #[must_use]
    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::AccessDenied | Self::OwnerMismatch => StatusCode::FORBIDDEN,
            Self::InvalidArgument
            | Self::InvalidRequest
            | Self::MalformedACLError
            | Self::MissingSecurityHeader
            | Self::UnexpectedContent => StatusCode::BAD_REQUEST,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoSuchBucket | Self::NoSuchKey => StatusCode::NOT_FOUND,
            Self::NotImplemented => StatusCode::NOT_IMPLEMENTED,
        }
    }
}

impl fmt::Display for S3ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised while authorizing a request
#[derive(Debug)]
pub struct S3Error {
    code: S3ErrorCode,
    message: Option<Cow<'static, str>>,
    source: Option<BoxStdError>,
}

impl S3Error {
    #[must_use]
    pub fn new(code: S3ErrorCode) -> Self {
        Self {
            code,
            message: None,
            source: None,
        }
    }

    #[must_use]
    pub fn with_message(code: S3ErrorCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            message: Some(message.into()),
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(code: S3ErrorCode, source: BoxStdError) -> Self {
        Self {
            code,
            message: None,
            source: Some(source),
        }
    }

    /// Wraps an unexpected failure as an [`S3ErrorCode::InternalError`].
    #[must_use]
    pub fn internal_error(source: impl StdError + Send + Sync + 'static) -> Self {
        Self::with_source(S3ErrorCode::InternalError, Box::new(source))
    }

    pub fn set_source(&mut self, source: BoxStdError) {
        self.source = Some(source);
    }

    #[must_use]
    pub fn code(&self) -> &S3ErrorCode {
        &self.code
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }
}

impl From<S3ErrorCode> for S3Error {
    fn from(code: S3ErrorCode) -> Self {
        Self::new(code)
    }
}

impl fmt::Display for S3Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

impl StdError for S3Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn StdError + 'static))
    }
}
