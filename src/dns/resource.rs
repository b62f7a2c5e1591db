use super::enums::{DNSResourceClass, DNSResourceType};
use super::name::{self, labels_to_fqdn};
use super::ParseError;

/// One resource record with its rdata kept raw; typed accessors decode
/// the handful of rdata formats the probe inspects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DNSResource {
    pub labels: Vec<String>,
    pub rtype: DNSResourceType,
    pub rclass: DNSResourceClass,
    /// Raw class value, meaningful for OPT where the field carries the
    /// advertised UDP payload size instead of a class.
    pub raw_class: u16,
    pub ttl: u32,
    pub rdata: Vec<u8>,
}

impl DNSResource {
    pub fn parse(buf: &[u8], offset: usize) -> Result<(Self, usize), ParseError> {
        let (labels, offset) = name::parse_domain_name(buf, offset)?;

        if offset + 10 > buf.len() {
            return Err(ParseError::InvalidLabel);
        }

        let rtype = u16::from_be_bytes([buf[offset], buf[offset + 1]]).into();
        let raw_class = u16::from_be_bytes([buf[offset + 2], buf[offset + 3]]);
        let ttl = u32::from_be_bytes([
            buf[offset + 4],
            buf[offset + 5],
            buf[offset + 6],
            buf[offset + 7],
        ]);
        let rdlength = u16::from_be_bytes([buf[offset + 8], buf[offset + 9]]) as usize;
        let rdata_start = offset + 10;

        if rdata_start + rdlength > buf.len() {
            return Err(ParseError::InvalidLabel);
        }

        let rdata = buf[rdata_start..rdata_start + rdlength].to_vec();

        Ok((
            DNSResource {
                labels,
                rtype,
                rclass: raw_class.into(),
                raw_class,
                ttl,
                rdata,
            },
            rdata_start + rdlength,
        ))
    }

    pub fn to_wire(&self, out: &mut Vec<u8>) {
        name::write_labels(out, &self.labels);
        out.extend_from_slice(&u16::from(self.rtype).to_be_bytes());
        out.extend_from_slice(&self.raw_class.to_be_bytes());
        out.extend_from_slice(&self.ttl.to_be_bytes());
        out.extend_from_slice(&(self.rdata.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.rdata);
    }

    /// Owner in presentation format with a trailing dot.
    pub fn owner(&self) -> String {
        labels_to_fqdn(&self.labels)
    }

    pub fn owner_eq(&self, other: &[String]) -> bool {
        self.labels.len() == other.len()
            && self
                .labels
                .iter()
                .zip(other)
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }

    /// A/AAAA address in presentation format.
    pub fn address(&self) -> Option<String> {
        match self.rtype {
            DNSResourceType::A if self.rdata.len() == 4 => {
                let octets: [u8; 4] = self.rdata[..4].try_into().ok()?;
                Some(std::net::Ipv4Addr::from(octets).to_string())
            }
            DNSResourceType::AAAA if self.rdata.len() == 16 => {
                let octets: [u8; 16] = self.rdata[..16].try_into().ok()?;
                Some(std::net::Ipv6Addr::from(octets).to_string())
            }
            _ => None,
        }
    }

    pub fn rrsig(&self) -> Result<RrsigRdata, ParseError> {
        if self.rtype != DNSResourceType::RRSIG {
            return Err(ParseError::Malformed("not an RRSIG record".into()));
        }

        if self.rdata.len() < 18 {
            return Err(ParseError::Malformed("RRSIG rdata too short".into()));
        }

        let type_covered = u16::from_be_bytes([self.rdata[0], self.rdata[1]]).into();
        let algorithm = self.rdata[2];
        let labels = self.rdata[3];
        let original_ttl =
            u32::from_be_bytes([self.rdata[4], self.rdata[5], self.rdata[6], self.rdata[7]]);
        let expiration =
            u32::from_be_bytes([self.rdata[8], self.rdata[9], self.rdata[10], self.rdata[11]]);
        let inception = u32::from_be_bytes([
            self.rdata[12],
            self.rdata[13],
            self.rdata[14],
            self.rdata[15],
        ]);
        let key_tag = u16::from_be_bytes([self.rdata[16], self.rdata[17]]);

        /* the signer name is never compressed inside RRSIG rdata */
        let (signer_name, signer_end) = parse_uncompressed_name(&self.rdata[18..])?;
        let signature = self.rdata[18 + signer_end..].to_vec();

        if signature.is_empty() {
            return Err(ParseError::Malformed("RRSIG carries no signature".into()));
        }

        Ok(RrsigRdata {
            type_covered,
            algorithm,
            labels,
            original_ttl,
            expiration,
            inception,
            key_tag,
            signer_name,
            signature,
        })
    }

    pub fn dnskey(&self) -> Result<DnskeyRdata, ParseError> {
        if self.rtype != DNSResourceType::DNSKEY {
            return Err(ParseError::Malformed("not a DNSKEY record".into()));
        }

        if self.rdata.len() < 5 {
            return Err(ParseError::Malformed("DNSKEY rdata too short".into()));
        }

        Ok(DnskeyRdata {
            flags: u16::from_be_bytes([self.rdata[0], self.rdata[1]]),
            protocol: self.rdata[2],
            algorithm: self.rdata[3],
            public_key: self.rdata[4..].to_vec(),
        })
    }

    pub fn nsec3(&self) -> Result<Nsec3Rdata, ParseError> {
        if self.rtype != DNSResourceType::NSEC3 {
            return Err(ParseError::Malformed("not an NSEC3 record".into()));
        }

        if self.rdata.len() < 5 {
            return Err(ParseError::Malformed("NSEC3 rdata too short".into()));
        }

        let hash_algorithm = self.rdata[0];
        let flags = self.rdata[1];
        let iterations = u16::from_be_bytes([self.rdata[2], self.rdata[3]]);
        let salt_len = self.rdata[4] as usize;

        if self.rdata.len() < 5 + salt_len + 1 {
            return Err(ParseError::Malformed("NSEC3 rdata too short".into()));
        }

        let salt = self.rdata[5..5 + salt_len].to_vec();
        let hash_len = self.rdata[5 + salt_len] as usize;
        let hash_start = 5 + salt_len + 1;

        if self.rdata.len() < hash_start + hash_len {
            return Err(ParseError::Malformed("NSEC3 rdata too short".into()));
        }

        let next_hashed_owner = self.rdata[hash_start..hash_start + hash_len].to_vec();
        let types = parse_type_bitmap(&self.rdata[hash_start + hash_len..]);

        Ok(Nsec3Rdata {
            hash_algorithm,
            flags,
            iterations,
            salt,
            next_hashed_owner,
            types,
        })
    }

    /// NSEC rdata: (next owner name, covered types).
    pub fn nsec(&self) -> Result<(Vec<String>, Vec<DNSResourceType>), ParseError> {
        if self.rtype != DNSResourceType::NSEC {
            return Err(ParseError::Malformed("not an NSEC record".into()));
        }

        let (next, end) = parse_uncompressed_name(&self.rdata)?;
        let types = parse_type_bitmap(&self.rdata[end..]);

        Ok((next, types))
    }
}

/// RRSIG rdata fields, RFC 4034 §3.
#[derive(Clone, Debug)]
pub struct RrsigRdata {
    pub type_covered: DNSResourceType,
    pub algorithm: u8,
    pub labels: u8,
    pub original_ttl: u32,
    pub expiration: u32,
    pub inception: u32,
    pub key_tag: u16,
    pub signer_name: Vec<String>,
    pub signature: Vec<u8>,
}

/// DNSKEY rdata fields, RFC 4034 §2.
#[derive(Clone, Debug)]
pub struct DnskeyRdata {
    pub flags: u16,
    pub protocol: u8,
    pub algorithm: u8,
    pub public_key: Vec<u8>,
}

/// NSEC3 rdata fields, RFC 5155 §3.
#[derive(Clone, Debug)]
pub struct Nsec3Rdata {
    pub hash_algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    pub salt: Vec<u8>,
    pub next_hashed_owner: Vec<u8>,
    pub types: Vec<DNSResourceType>,
}

fn parse_uncompressed_name(data: &[u8]) -> Result<(Vec<String>, usize), ParseError> {
    let mut labels = Vec::new();
    let mut pos = 0;

    loop {
        if pos >= data.len() {
            return Err(ParseError::InvalidLabel);
        }

        let len = data[pos] as usize;
        if len == 0 {
            pos += 1;
            break;
        }

        if len > 63 {
            return Err(ParseError::InvalidLabel);
        }

        pos += 1;
        if pos + len > data.len() {
            return Err(ParseError::InvalidLabel);
        }

        labels.push(String::from_utf8_lossy(&data[pos..pos + len]).into_owned());
        pos += len;
    }

    Ok((labels, pos))
}

/// RFC 4034 §4.1.2 type bitmap, shared by NSEC and NSEC3.
fn parse_type_bitmap(data: &[u8]) -> Vec<DNSResourceType> {
    let mut types = Vec::new();
    let mut pos = 0;

    while pos + 2 <= data.len() {
        let window = data[pos] as u16;
        let len = data[pos + 1] as usize;
        pos += 2;

        if pos + len > data.len() {
            break;
        }

        for (byte_idx, byte) in data[pos..pos + len].iter().enumerate() {
            for bit in 0..8 {
                if byte & (0x80 >> bit) != 0 {
                    let value = window * 256 + (byte_idx as u16) * 8 + bit as u16;
                    types.push(value.into());
                }
            }
        }

        pos += len;
    }

    types
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_record_address() {
        let rr = DNSResource {
            labels: vec!["example".into()],
            rtype: DNSResourceType::A,
            rclass: DNSResourceClass::IN,
            raw_class: 1,
            ttl: 60,
            rdata: vec![192, 0, 2, 7],
        };

        assert_eq!(rr.address().unwrap(), "192.0.2.7");
    }

    #[test]
    fn parses_type_bitmap() {
        /* window 0, 6 bytes: bits for NS(2), SOA(6), RRSIG(46), NSEC(47) */
        let bitmap = vec![0x00, 0x06, 0x22, 0x00, 0x00, 0x00, 0x00, 0x03];
        let types = parse_type_bitmap(&bitmap);

        assert!(types.contains(&DNSResourceType::NS));
        assert!(types.contains(&DNSResourceType::SOA));
        assert!(types.contains(&DNSResourceType::RRSIG));
        assert!(types.contains(&DNSResourceType::NSEC));
        assert!(!types.contains(&DNSResourceType::A));
    }

    #[test]
    fn rrsig_too_short_is_malformed() {
        let rr = DNSResource {
            labels: vec![],
            rtype: DNSResourceType::RRSIG,
            rclass: DNSResourceClass::IN,
            raw_class: 1,
            ttl: 0,
            rdata: vec![0; 10],
        };

        assert!(rr.rrsig().is_err());
    }
}
