pub const DEFAULT_RESOLVER_PORT: u16 = 53;
pub const DEFAULT_NAMESERVER_PORT: u16 = 53;
pub const DEFAULT_RDDS43_PORT: u16 = 43;

pub const EDNS_VERSION: u8 = 0;
pub const EDNS_UDP_SIZE: u16 = 4096;
pub const MAX_UDP_PACKET_SIZE: usize = 65535;

/// NSID option code, from RFC 5001.
pub const EDNS_NSID: u16 = 3;
/// Hex representation of NSID must fit into 255 characters.
pub const NSID_MAX_LENGTH: usize = 127;

/// Seconds for one UDP try against an authoritative server.
pub const UDP_TIMEOUT: u64 = 3;
pub const UDP_RETRY: u8 = 1;
/// Seconds for one TCP try (SLA: 5 times higher than the 2-second maximum).
pub const TCP_TIMEOUT: u64 = 11;
pub const TCP_RETRY: u8 = 1;

/// Cap on the host part extracted from free-text RDDS43 answers.
pub const HOST_BUF_SIZE: usize = 128;
/// Answer bytes echoed into the test log.
pub const RESPONSE_PREVIEW_SIZE: usize = 100;

pub const METADATA_FILE_PREFIX: &str = "dns-test-metadata";

pub const HTTP_USER_AGENT: &str = concat!("rsmprobe ", env!("CARGO_PKG_VERSION"));
