use super::enums::{DNSResourceClass, DNSResourceType};
use super::name::{self, labels_to_fqdn};
use super::ParseError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DNSQuestion {
    pub labels: Vec<String>,
    pub qtype: DNSResourceType,
    pub qclass: DNSResourceClass,
}

impl DNSQuestion {
    pub fn parse(buf: &[u8], offset: usize) -> Result<(Self, usize), ParseError> {
        let (labels, offset) =
            name::parse_domain_name(buf, offset).map_err(|_| ParseError::IncompleteQuestion)?;

        if offset + 4 > buf.len() {
            return Err(ParseError::IncompleteQuestion);
        }

        let qtype = u16::from_be_bytes([buf[offset], buf[offset + 1]]).into();
        let qclass = u16::from_be_bytes([buf[offset + 2], buf[offset + 3]]).into();

        Ok((
            DNSQuestion {
                labels,
                qtype,
                qclass,
            },
            offset + 4,
        ))
    }

    pub fn to_wire(&self, out: &mut Vec<u8>) {
        name::write_labels(out, &self.labels);
        out.extend_from_slice(&u16::from(self.qtype).to_be_bytes());
        out.extend_from_slice(&u16::from(self.qclass).to_be_bytes());
    }

    /// Owner in presentation format with a trailing dot.
    pub fn owner(&self) -> String {
        labels_to_fqdn(&self.labels)
    }
}
