pub mod check;
pub mod constants;
pub mod dns;
pub mod dnssec;
pub mod errcode;
pub mod error;
pub mod http;
pub mod params;
pub mod probelog;
pub mod resolver;
pub mod url;

pub use dns::DNSPacket;
pub use error::{ProbeError, Result};
