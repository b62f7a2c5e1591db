use super::enums::DNSResourceType;
use super::resource::DNSResource;
use super::ParseError;
use crate::constants::{EDNS_NSID, NSID_MAX_LENGTH};

/// EDNS0 OPT pseudo-record (RFC 6891). The OPT resource overloads its
/// fixed fields: CLASS carries the UDP payload size and TTL packs the
/// extended RCODE, version and flags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EdnsOpt {
    pub udp_payload_size: u16,
    pub extended_rcode: u8,
    pub version: u8,
    pub flags: u16,
    pub options: Vec<EdnsOption>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdnsOption {
    pub code: u16,
    pub data: Vec<u8>,
}

impl EdnsOpt {
    pub fn with_payload_size(payload_size: u16) -> Self {
        Self {
            udp_payload_size: payload_size,
            ..Self::default()
        }
    }

    pub fn do_flag(&self) -> bool {
        (self.flags & 0x8000) != 0
    }

    pub fn set_do_flag(&mut self, value: bool) {
        if value {
            self.flags |= 0x8000;
        } else {
            self.flags &= !0x8000;
        }
    }

    pub fn add_option(&mut self, code: u16, data: Vec<u8>) {
        self.options.push(EdnsOption { code, data });
    }

    pub fn find_option(&self, code: u16) -> Option<&EdnsOption> {
        self.options.iter().find(|opt| opt.code == code)
    }

    /// The NSID option payload as lowercase hex, truncated so that the
    /// text fits into 255 characters.
    pub fn nsid_hex(&self) -> Option<String> {
        self.find_option(EDNS_NSID).map(|opt| {
            let cap = opt.data.len().min(NSID_MAX_LENGTH);
            hex::encode(&opt.data[..cap])
        })
    }

    pub fn parse_from_resource(rr: &DNSResource) -> Result<Self, ParseError> {
        let udp_payload_size = rr.raw_class;
        let extended_rcode = ((rr.ttl >> 24) & 0xFF) as u8;
        let version = ((rr.ttl >> 16) & 0xFF) as u8;
        let flags = (rr.ttl & 0xFFFF) as u16;

        let mut options = Vec::new();
        let mut pos = 0;

        while pos + 4 <= rr.rdata.len() {
            let code = u16::from_be_bytes([rr.rdata[pos], rr.rdata[pos + 1]]);
            let len = u16::from_be_bytes([rr.rdata[pos + 2], rr.rdata[pos + 3]]) as usize;
            pos += 4;

            if pos + len > rr.rdata.len() {
                return Err(ParseError::Malformed("EDNS option overruns rdata".into()));
            }

            options.push(EdnsOption {
                code,
                data: rr.rdata[pos..pos + len].to_vec(),
            });
            pos += len;
        }

        Ok(EdnsOpt {
            udp_payload_size,
            extended_rcode,
            version,
            flags,
            options,
        })
    }

    pub fn to_resource(&self) -> DNSResource {
        let mut rdata = Vec::new();
        for option in &self.options {
            rdata.extend_from_slice(&option.code.to_be_bytes());
            rdata.extend_from_slice(&(option.data.len() as u16).to_be_bytes());
            rdata.extend_from_slice(&option.data);
        }

        let ttl = ((self.extended_rcode as u32) << 24)
            | ((self.version as u32) << 16)
            | (self.flags as u32);

        DNSResource {
            labels: Vec::new(),
            rtype: DNSResourceType::OPT,
            rclass: self.udp_payload_size.into(),
            raw_class: self.udp_payload_size,
            ttl,
            rdata,
        }
    }
}
