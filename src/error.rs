//! Error types for dot1q-discovery.
//!
//! Every [`Error`] variant belongs to one [`ErrorKind`]; callers and the
//! HTTP layer branch on the kind, logs show the variant.

use std::net::SocketAddr;
use std::time::Duration;

use crate::oid::Oid;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Transport failure or no response within the timeout.
    DeviceUnreachable,
    /// The device answered with an error status or something we cannot parse.
    Protocol,
    /// Raw tables are inconsistent with each other or with the bitmap encoding.
    Decode,
    /// Caller-supplied input was rejected before anything was sent.
    InvalidInput,
    /// The downstream metrics forwarder failed.
    Forward,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeviceUnreachable => write!(f, "device unreachable"),
            Self::Protocol => write!(f, "protocol error"),
            Self::Decode => write!(f, "decode error"),
            Self::InvalidInput => write!(f, "invalid input"),
            Self::Forward => write!(f, "forwarding error"),
        }
    }
}

/// BER/message parse error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BerErrorKind {
    /// Expected different tag.
    UnexpectedTag { expected: u8, actual: u8 },
    /// Data truncated unexpectedly.
    TruncatedData,
    /// Invalid BER length encoding.
    InvalidLength,
    /// Indefinite length not supported.
    IndefiniteLength,
    /// Length field too long.
    LengthTooLong { octets: usize },
    /// Integer value overflow.
    IntegerOverflow,
    /// Zero-length integer.
    ZeroLengthInteger,
    /// Invalid OID encoding.
    InvalidOidEncoding,
    /// NULL with non-zero length.
    InvalidNull,
    /// Invalid IP address length.
    InvalidIpAddressLength { length: usize },
    /// Unknown SNMP version.
    UnknownVersion(i32),
    /// Unknown PDU type.
    UnknownPduType(u8),
    /// Bytes left over after the message.
    TrailingData { remaining: usize },
}

impl std::fmt::Display for BerErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedTag { expected, actual } => {
                write!(f, "expected tag 0x{:02X}, got 0x{:02X}", expected, actual)
            }
            Self::TruncatedData => write!(f, "unexpected end of data"),
            Self::InvalidLength => write!(f, "invalid length encoding"),
            Self::IndefiniteLength => write!(f, "indefinite length encoding not supported"),
            Self::LengthTooLong { octets } => {
                write!(f, "length encoding too long ({} octets)", octets)
            }
            Self::IntegerOverflow => write!(f, "integer overflow"),
            Self::ZeroLengthInteger => write!(f, "zero-length integer"),
            Self::InvalidOidEncoding => write!(f, "invalid OID encoding"),
            Self::InvalidNull => write!(f, "NULL with non-zero length"),
            Self::InvalidIpAddressLength { length } => {
                write!(f, "IP address must be 4 bytes, got {}", length)
            }
            Self::UnknownVersion(v) => write!(f, "unknown SNMP version: {}", v),
            Self::UnknownPduType(t) => write!(f, "unknown PDU type: 0x{:02X}", t),
            Self::TrailingData { remaining } => {
                write!(f, "{} trailing bytes after message", remaining)
            }
        }
    }
}

/// OID validation error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OidErrorKind {
    /// Empty OID string.
    Empty,
    /// Invalid arc value.
    InvalidArc,
    /// First arc must be 0, 1, or 2.
    InvalidFirstArc(u32),
    /// OID too short (minimum 2 arcs).
    TooShort,
    /// OID has too many arcs (exceeds MAX_OID_LEN).
    TooManyArcs { count: usize, max: usize },
}

impl std::fmt::Display for OidErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty OID"),
            Self::InvalidArc => write!(f, "invalid arc value"),
            Self::InvalidFirstArc(v) => write!(f, "first arc must be 0, 1, or 2, got {}", v),
            Self::TooShort => write!(f, "OID must have at least 2 arcs"),
            Self::TooManyArcs { count, max } => {
                write!(f, "OID has {} arcs, exceeds maximum {}", count, max)
            }
        }
    }
}

/// Topology decode error kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Hex bitmap with an odd number of digits.
    OddBitmapLength { length: usize },
    /// Character that is not a hex digit.
    InvalidHexDigit { position: usize, found: char },
    /// Index referenced by one table is absent from another.
    MissingIndex { table: &'static str, index: u32 },
    /// Value that should be an integer index is not.
    NotAnInteger { table: &'static str, index: u32, value: String },
    /// Bitmap column entry that is not an octet string.
    NotABitmap { table: &'static str, index: u32 },
}

impl std::fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OddBitmapLength { length } => {
                write!(f, "bitmap has odd number of hex digits ({})", length)
            }
            Self::InvalidHexDigit { position, found } => {
                write!(f, "invalid hex digit {:?} at position {}", found, position)
            }
            Self::MissingIndex { table, index } => {
                write!(f, "index {} missing from {}", index, table)
            }
            Self::NotAnInteger {
                table,
                index,
                value,
            } => write!(f, "{}.{} is not an integer: {:?}", table, index, value),
            Self::NotABitmap { table, index } => {
                write!(f, "{}.{} is not an octet string bitmap", table, index)
            }
        }
    }
}

/// SNMP error status codes (RFC 3416).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorStatus {
    NoError,
    TooBig,
    NoSuchName,
    BadValue,
    ReadOnly,
    GenErr,
    NoAccess,
    AuthorizationError,
    /// Any other status code. Write-related codes land here.
    Other(i32),
}

impl ErrorStatus {
    /// Create from raw status code.
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => Self::NoError,
            1 => Self::TooBig,
            2 => Self::NoSuchName,
            3 => Self::BadValue,
            4 => Self::ReadOnly,
            5 => Self::GenErr,
            6 => Self::NoAccess,
            16 => Self::AuthorizationError,
            other => Self::Other(other),
        }
    }

    /// Convert to raw status code.
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::NoError => 0,
            Self::TooBig => 1,
            Self::NoSuchName => 2,
            Self::BadValue => 3,
            Self::ReadOnly => 4,
            Self::GenErr => 5,
            Self::NoAccess => 6,
            Self::AuthorizationError => 16,
            Self::Other(code) => *code,
        }
    }
}

impl std::fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoError => write!(f, "noError"),
            Self::TooBig => write!(f, "tooBig"),
            Self::NoSuchName => write!(f, "noSuchName"),
            Self::BadValue => write!(f, "badValue"),
            Self::ReadOnly => write!(f, "readOnly"),
            Self::GenErr => write!(f, "genErr"),
            Self::NoAccess => write!(f, "noAccess"),
            Self::AuthorizationError => write!(f, "authorizationError"),
            Self::Other(code) => write!(f, "status({})", code),
        }
    }
}

/// Library error type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O error during communication.
    #[error("I/O error{}: {source}", target.map(|t| format!(" communicating with {}", t)).unwrap_or_default())]
    Io {
        target: Option<SocketAddr>,
        #[source]
        source: std::io::Error,
    },

    /// Request timed out (after retries if configured).
    #[error("timeout after {elapsed:?}{} (request_id={request_id}, retries={retries})", target.map(|t| format!(" waiting for {}", t)).unwrap_or_default())]
    Timeout {
        target: Option<SocketAddr>,
        elapsed: Duration,
        request_id: i32,
        retries: u32,
    },

    /// SNMP protocol error returned by agent.
    #[error("SNMP error{}: {status} at index {index}", target.map(|t| format!(" from {}", t)).unwrap_or_default())]
    Snmp {
        target: Option<SocketAddr>,
        status: ErrorStatus,
        index: u32,
        oid: Option<Oid>,
    },

    /// Response could not be parsed.
    #[error("malformed response at offset {offset}: {kind}")]
    MalformedResponse { offset: usize, kind: BerErrorKind },

    /// Invalid OID format.
    #[error("invalid OID: {kind}")]
    InvalidOid {
        kind: OidErrorKind,
        input: Option<Box<str>>, // Only allocated when parsing string input
    },

    /// Walk returned an OID whose index below the root is not a single arc.
    #[error("malformed table index {oid} under {root}")]
    MalformedIndex { root: Oid, oid: Oid },

    /// Non-increasing OID detected during walk (agent misbehavior).
    ///
    /// Returned when a walk receives an OID that is not lexicographically
    /// greater than the previous one, which would otherwise loop forever.
    #[error("walk detected non-increasing OID: {previous} >= {current}")]
    NonIncreasingOid { previous: Oid, current: Oid },

    /// Response request ID doesn't match.
    #[error("request ID mismatch: expected {expected}, got {actual}")]
    RequestIdMismatch { expected: i32, actual: i32 },

    /// Response community doesn't match the request.
    #[error("community mismatch{}", target.map(|t| format!(" from {}", t)).unwrap_or_default())]
    CommunityMismatch { target: Option<SocketAddr> },

    /// A PDU of the wrong type arrived.
    #[error("unexpected PDU type 0x{actual:02X}, expected 0x{expected:02X}")]
    UnexpectedPdu { expected: u8, actual: u8 },

    /// Raw tables could not be turned into a topology.
    #[error("decode error: {kind}")]
    Decode { kind: DecodeErrorKind },

    /// Target address could not be resolved.
    #[error("could not resolve target {target:?}")]
    UnresolvedTarget { target: Box<str> },

    /// The metrics forwarder could not be run or produced unusable output.
    #[error("forwarding via {program} failed: {source}")]
    Forward {
        program: Box<str>,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a malformed-response error.
    pub fn malformed(offset: usize, kind: BerErrorKind) -> Self {
        Self::MalformedResponse { offset, kind }
    }

    /// Create a topology decode error.
    pub fn decode(kind: DecodeErrorKind) -> Self {
        Self::Decode { kind }
    }

    /// Create an invalid OID error from a kind (no input string).
    pub fn invalid_oid(kind: OidErrorKind) -> Self {
        Self::InvalidOid { kind, input: None }
    }

    /// Create an invalid OID error with the input string that failed.
    pub fn invalid_oid_with_input(kind: OidErrorKind, input: impl Into<Box<str>>) -> Self {
        Self::InvalidOid {
            kind,
            input: Some(input.into()),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } | Self::Timeout { .. } => ErrorKind::DeviceUnreachable,
            Self::Snmp { .. }
            | Self::MalformedResponse { .. }
            | Self::MalformedIndex { .. }
            | Self::NonIncreasingOid { .. }
            | Self::RequestIdMismatch { .. }
            | Self::CommunityMismatch { .. }
            | Self::UnexpectedPdu { .. } => ErrorKind::Protocol,
            // Parsing an OID typed by a user happens before any request.
            Self::InvalidOid { input: Some(_), .. } => ErrorKind::InvalidInput,
            Self::InvalidOid { input: None, .. } => ErrorKind::Protocol,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::UnresolvedTarget { .. } => ErrorKind::InvalidInput,
            Self::Forward { .. } => ErrorKind::Forward,
        }
    }

    /// Get the target address if this error has one.
    pub fn target(&self) -> Option<SocketAddr> {
        match self {
            Self::Io { target, .. } => *target,
            Self::Timeout { target, .. } => *target,
            Self::Snmp { target, .. } => *target,
            Self::CommunityMismatch { target } => *target,
            _ => None,
        }
    }
}
