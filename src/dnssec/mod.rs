mod algorithm;
mod denial;
mod key_tag;
mod verify;

pub use algorithm::DnsSecAlgorithm;
pub use denial::verify_denial_of_existence;
pub use key_tag::calculate_key_tag;
pub use verify::{check_dnssec, verify_rr_class, verify_rrsigs};

use crate::dns::DnskeyRdata;

/// One key of the zone's DNSKEY set with its precomputed tag.
#[derive(Clone, Debug)]
pub struct ZoneKey {
    pub data: DnskeyRdata,
    pub key_tag: u16,
}

impl ZoneKey {
    pub fn new(data: DnskeyRdata) -> Self {
        let key_tag =
            calculate_key_tag(data.flags, data.protocol, data.algorithm, &data.public_key);
        Self { data, key_tag }
    }
}

/// Maximum NSEC3 iterations the probe is willing to hash (RFC 5155 cap).
pub const MAX_NSEC3_ITERATIONS: u16 = 2500;
