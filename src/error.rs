use thiserror::Error;

/// A single closed taxonomy of caller-induced / resource / terminal error
/// conditions, mirroring the stable integer error registry of the wire
/// protocol. Recoverable-suspension conditions (`need-more-text-input`,
/// `out-of-buffer`, `try-again`) are modeled as *values* returned by the
/// JSON engine and uploader rather than as this enum, so that retry-with-
/// more-input call sites don't need to downcast an error to keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    OutOfMemory,
    TryAgain,
    InvalidArgument,
    OverflowUpperBound,
    OverflowLowerBound,
    BadUtf8Sequence,
    OutOfBuffer,
    OutOfCapacity,
    NoSuchEntry,
    JsonBadTextInput,
    JsonTooManyParsingLevels,
    JsonNeedMoreTextInput,
    JsonModifyingImmutableObject,
    JsonModifyingImmutableArray,
    JsonNotThisType,
    JsonOutOfIndex,
    HttpInvalidHeaderSyntax,
    HttpAddingStringFieldFailed,
    HttpAddingFileFieldFailed,
    HttpAddingBufferFieldFailed,
    HttpMismatchingFileSize,
    HttpDnsFailed,
    HttpTransmissionFailed,
    FileOpeningFailed,
    FileDuplicatingFailed,
    FileReadingFailed,
    FileSeekingFailed,
    FileStatingFailed,
    StorLackOfAuth,
    StorInvalidResumableSession,
    StorInvalidListResult,
    StorPuttingAbortedByFilter,
    StorInvalidChunkPutResult,
    StorApiReturnNoValue,
    QetagInitializingFailed,
    QetagUpdatingFailed,
    QetagMakingDigestFailed,
}

impl ErrorKind {
    /// Stable numeric code, kept as the wire/log compatibility surface.
    pub fn code(&self) -> u32 {
        use ErrorKind::*;
        match self {
            OutOfMemory => 1001,
            TryAgain => 1002,
            InvalidArgument => 1003,
            OverflowUpperBound => 1004,
            OverflowLowerBound => 1005,
            BadUtf8Sequence => 1006,
            OutOfBuffer => 1007,
            OutOfCapacity => 1008,
            NoSuchEntry => 1009,
            JsonBadTextInput => 2001,
            JsonTooManyParsingLevels => 2002,
            JsonNeedMoreTextInput => 2003,
            JsonModifyingImmutableObject => 2004,
            JsonModifyingImmutableArray => 2005,
            JsonNotThisType => 2006,
            JsonOutOfIndex => 2007,
            HttpInvalidHeaderSyntax => 3001,
            HttpAddingStringFieldFailed => 3002,
            HttpAddingFileFieldFailed => 3003,
            HttpAddingBufferFieldFailed => 3004,
            HttpMismatchingFileSize => 3005,
            HttpDnsFailed => 3006,
            HttpTransmissionFailed => 3007,
            FileOpeningFailed => 11001,
            FileDuplicatingFailed => 11002,
            FileReadingFailed => 11003,
            FileSeekingFailed => 11004,
            FileStatingFailed => 11101,
            StorLackOfAuth => 21001,
            StorInvalidResumableSession => 21002,
            StorInvalidListResult => 21003,
            StorPuttingAbortedByFilter => 21004,
            StorInvalidChunkPutResult => 21006,
            StorApiReturnNoValue => 21007,
            QetagInitializingFailed => 31001,
            QetagUpdatingFailed => 31002,
            QetagMakingDigestFailed => 31003,
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{kind:?} ({}): {message}", kind.code())]
    Core { kind: ErrorKind, message: String },

    #[error("request: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("url parse: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    #[error("invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("header to string: {0}")]
    HeaderToStr(#[from] http::header::ToStrError),

    #[error("hmac key of invalid length: {0}")]
    HmacInvalidLength(#[from] hmac::digest::InvalidLength),

    #[error("env var missing: {0}")]
    EnvVarMissing(#[from] std::env::VarError),

    #[error("got HTTP {0} with content '{1}'")]
    HttpFailWithBody(u16, String),

    #[error("tokio task join: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error::Core {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Core { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// True for the "recoverable-suspension" class: progress/state is kept
    /// intact and the caller may retry with more input, a fresh buffer, or
    /// after a backoff.
    pub fn is_recoverable(&self) -> bool {
        if matches!(
            self.kind(),
            Some(ErrorKind::JsonNeedMoreTextInput)
                | Some(ErrorKind::OutOfBuffer)
                | Some(ErrorKind::TryAgain)
        ) {
            return true;
        }
        matches!(self, Error::Reqwest(e) if e.is_timeout() || e.is_connect())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
