use std::fmt;

use thiserror::Error;

/// Top-level error for the binary surface: parameter parsing and other
/// failures that make the whole item "not supported". Measurement
/// failures never take this path, they are encoded as negative codes.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("invalid parameter #{0}: {1}")]
    InvalidParameter(usize, String),
    #[error("{0}")]
    Unsupported(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProbeError>;

/// An error kind paired with its human-readable diagnostic. The kind is
/// what gets mapped into the numeric taxonomy, the message goes to the
/// test log.
#[derive(Debug, Clone)]
pub struct Failure<K> {
    pub kind: K,
    pub message: String,
}

impl<K> Failure<K> {
    pub fn new(kind: K, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl<K: fmt::Debug> fmt::Display for Failure<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Errors of recursive lookups through the local resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverError {
    Internal,
    NoReply,
    ServFail,
    NxDomain,
    Catchall,
}

/// Errors of the DNSKEY fetch from the local resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsKeysError {
    Internal,
    NoReply,
    NoKeys,
    NoAdBit,
    NxDomain,
    Catchall,
}

/// Errors of one query against an authoritative name server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NsQueryError {
    Internal,
    /// UDP only; aliases to the internal code on TCP.
    NoReply,
    /// TCP only; aliases to the internal code on UDP.
    Econ,
    /// TCP only; aliases to the internal code on UDP.
    To,
    IncHeader,
    IncQuestion,
    IncAnswer,
    IncAuthority,
    IncAdditional,
    Catchall,
}

/// Errors of the answer content of an authoritative reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NsAnswerError {
    Internal,
    NoAaFlag,
    NoDomain,
}

/// DNSSEC validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnssecError {
    Internal,
    /// Unknown cryptographic algorithm.
    AlgoUnknown,
    /// Cryptographic algorithm not implemented.
    AlgoNotImpl,
    /// No RRSIGs found where they were required.
    RrsigNone,
    /// Negative reply without NSEC/NSEC3 RRs in the authority section.
    NoNsecInAuth,
    /// The signature does not cover this RRset.
    RrsigNotCovered,
    /// The RRSIG found is not signed by a DNSKEY from the zone keyset.
    RrsigNotSigned,
    SigBogus,
    SigExpired,
    SigNotIncepted,
    /// Expiration date earlier than inception date.
    SigExpirationBeforeInception,
    /// Error in the NSEC3 denial of existence proof.
    Nsec3Error,
    /// RR not covered by the given NSEC RRs.
    RrNotCovered,
    /// Wildcard not covered by the given NSEC RRs.
    WildNotCovered,
    /// The RRSIG has too few RDATA fields.
    RrsigMissRdata,
    Catchall,
}

impl fmt::Display for DnssecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Internal => "internal error",
            Self::AlgoUnknown => "unknown cryptographic algorithm",
            Self::AlgoNotImpl => "cryptographic algorithm not implemented",
            Self::RrsigNone => "no RRSIG records found",
            Self::NoNsecInAuth => "no NSEC/NSEC3 RRs were found in the authority section",
            Self::RrsigNotCovered => "the signature does not cover this RRset",
            Self::RrsigNotSigned => "the RRSIG found is not signed by a DNSKEY",
            Self::SigBogus => "bogus DNSSEC signature",
            Self::SigExpired => "DNSSEC signature has expired",
            Self::SigNotIncepted => "DNSSEC signature not incepted yet",
            Self::SigExpirationBeforeInception => {
                "DNSSEC signature has expiration date earlier than inception date"
            }
            Self::Nsec3Error => "error in NSEC3 denial of existence proof",
            Self::RrNotCovered => "RR not covered by the given NSEC RRs",
            Self::WildNotCovered => "wildcard not covered by the given NSEC RRs",
            Self::RrsigMissRdata => "the RRSIG has too few RDATA fields",
            Self::Catchall => "malformed DNSSEC response",
        };

        write!(f, "{}", text)
    }
}

/// Errors of the class check over every RR of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RrClassError {
    Internal,
    Chaos,
    Hesiod,
    Catchall,
}

/// HTTP transport failures that happen before a status code is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpPreStatusError {
    Internal,
    Timeout,
    Econ,
    EHttp,
    EHttps,
    NoCode,
    EMaxRedirects,
}

/// Any failure of the one-shot HTTP test: either a transport failure or
/// a non-200 final status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    PreStatus(HttpPreStatusError),
    HttpStatus(u16),
}
