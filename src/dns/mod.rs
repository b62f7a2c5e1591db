mod edns;
mod enums;
mod header;
mod name;
mod packet;
mod question;
mod resource;

pub use edns::{EdnsOpt, EdnsOption};
pub use enums::{DNSResourceClass, DNSResourceType, rcode_to_str};
pub use header::DNSHeader;
pub use name::{labels_from_str, labels_to_fqdn, parse_domain_name, skip_domain_name, write_labels};
pub use packet::{DNSPacket, Section};
pub use question::DNSQuestion;
pub use resource::{DNSResource, DnskeyRdata, Nsec3Rdata, RrsigRdata};

use std::fmt;

/// Parse failures classified by the wire section they occurred in, so the
/// resolver can map them into the per-section taxonomy codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    IncompleteHeader,
    IncompleteQuestion,
    IncompleteAnswer,
    IncompleteAuthority,
    IncompleteAdditional,
    InvalidLabel,
    Malformed(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncompleteHeader => write!(f, "header section incomplete"),
            Self::IncompleteQuestion => write!(f, "question section incomplete"),
            Self::IncompleteAnswer => write!(f, "answer section incomplete"),
            Self::IncompleteAuthority => write!(f, "authority section incomplete"),
            Self::IncompleteAdditional => write!(f, "additional section incomplete"),
            Self::InvalidLabel => write!(f, "invalid label"),
            Self::Malformed(msg) => write!(f, "malformed DNS message: {}", msg),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        ParseError::Malformed(err.to_string())
    }
}
