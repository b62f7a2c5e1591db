use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};

use super::ParseError;

/// The 12-byte DNS message header with the flag bits split out, AD and CD
/// included since the probe both sets and inspects them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSHeader {
    pub id: u16,
    pub qr: bool,
    pub opcode: u8,
    pub aa: bool,
    pub tc: bool,
    pub rd: bool,
    pub ra: bool,
    pub z: bool,
    pub ad: bool,
    pub cd: bool,
    pub rcode: u8,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl DNSHeader {
    pub fn parse(buf: &[u8]) -> Result<Self, ParseError> {
        if buf.len() < 12 {
            return Err(ParseError::IncompleteHeader);
        }

        let mut reader = BitReader::<_, BigEndian>::new(&buf[..12]);
        let mut header = DNSHeader::default();

        header.id = reader.read_var::<u16>(16)?;
        header.qr = reader.read_var::<u8>(1)? == 1;
        header.opcode = reader.read_var::<u8>(4)?;
        header.aa = reader.read_var::<u8>(1)? == 1;
        header.tc = reader.read_var::<u8>(1)? == 1;
        header.rd = reader.read_var::<u8>(1)? == 1;
        header.ra = reader.read_var::<u8>(1)? == 1;
        header.z = reader.read_var::<u8>(1)? == 1;
        header.ad = reader.read_var::<u8>(1)? == 1;
        header.cd = reader.read_var::<u8>(1)? == 1;
        header.rcode = reader.read_var::<u8>(4)?;
        header.qdcount = reader.read_var::<u16>(16)?;
        header.ancount = reader.read_var::<u16>(16)?;
        header.nscount = reader.read_var::<u16>(16)?;
        header.arcount = reader.read_var::<u16>(16)?;

        Ok(header)
    }

    pub fn to_wire(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(12);
        {
            let mut writer = BitWriter::<_, BigEndian>::new(&mut bytes);

            /* the writes below cannot fail on a Vec sink */
            let _ = writer.write_var::<u16>(16, self.id);
            let _ = writer.write_var::<u8>(1, self.qr as u8);
            let _ = writer.write_var::<u8>(4, self.opcode);
            let _ = writer.write_var::<u8>(1, self.aa as u8);
            let _ = writer.write_var::<u8>(1, self.tc as u8);
            let _ = writer.write_var::<u8>(1, self.rd as u8);
            let _ = writer.write_var::<u8>(1, self.ra as u8);
            let _ = writer.write_var::<u8>(1, self.z as u8);
            let _ = writer.write_var::<u8>(1, self.ad as u8);
            let _ = writer.write_var::<u8>(1, self.cd as u8);
            let _ = writer.write_var::<u8>(4, self.rcode);
            let _ = writer.write_var::<u16>(16, self.qdcount);
            let _ = writer.write_var::<u16>(16, self.ancount);
            let _ = writer.write_var::<u16>(16, self.nscount);
            let _ = writer.write_var::<u16>(16, self.arcount);
        }

        bytes
    }
}
