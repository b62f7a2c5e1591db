use super::edns::EdnsOpt;
use super::enums::{DNSResourceClass, DNSResourceType};
use super::header::DNSHeader;
use super::name::labels_from_str;
use super::question::DNSQuestion;
use super::resource::DNSResource;
use super::ParseError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Answer,
    Authority,
    Additional,
}

#[derive(Clone, Debug, Default)]
pub struct DNSPacket {
    pub header: DNSHeader,
    pub questions: Vec<DNSQuestion>,
    pub answers: Vec<DNSResource>,
    pub authorities: Vec<DNSResource>,
    pub additionals: Vec<DNSResource>,
}

impl DNSPacket {
    /// A query packet for one owner/type, class IN, no flags set. Header
    /// flags and EDNS are layered on by the resolver.
    pub fn query(id: u16, owner: &str, qtype: DNSResourceType) -> Self {
        let mut packet = DNSPacket::default();

        packet.header.id = id;
        packet.questions.push(DNSQuestion {
            labels: labels_from_str(owner),
            qtype,
            qclass: DNSResourceClass::IN,
        });
        packet.header.qdcount = 1;

        packet
    }

    pub fn add_edns(&mut self, opt: EdnsOpt) {
        self.additionals.push(opt.to_resource());
        self.header.arcount = self.additionals.len() as u16;
    }

    pub fn parse(buf: &[u8]) -> Result<Self, ParseError> {
        let header = DNSHeader::parse(buf)?;
        let mut offset = 12;

        let mut questions = Vec::with_capacity(header.qdcount as usize);
        for _ in 0..header.qdcount {
            let (question, next) = DNSQuestion::parse(buf, offset)?;
            questions.push(question);
            offset = next;
        }

        let mut answers = Vec::with_capacity(header.ancount as usize);
        for _ in 0..header.ancount {
            let (rr, next) =
                DNSResource::parse(buf, offset).map_err(|_| ParseError::IncompleteAnswer)?;
            answers.push(rr);
            offset = next;
        }

        let mut authorities = Vec::with_capacity(header.nscount as usize);
        for _ in 0..header.nscount {
            let (rr, next) =
                DNSResource::parse(buf, offset).map_err(|_| ParseError::IncompleteAuthority)?;
            authorities.push(rr);
            offset = next;
        }

        let mut additionals = Vec::with_capacity(header.arcount as usize);
        for _ in 0..header.arcount {
            let (rr, next) =
                DNSResource::parse(buf, offset).map_err(|_| ParseError::IncompleteAdditional)?;
            additionals.push(rr);
            offset = next;
        }

        Ok(DNSPacket {
            header,
            questions,
            answers,
            authorities,
            additionals,
        })
    }

    pub fn to_wire(&self) -> Vec<u8> {
        let mut packet = self.clone();
        packet.header.qdcount = packet.questions.len() as u16;
        packet.header.ancount = packet.answers.len() as u16;
        packet.header.nscount = packet.authorities.len() as u16;
        packet.header.arcount = packet.additionals.len() as u16;

        let mut bytes = packet.header.to_wire();

        for question in &packet.questions {
            question.to_wire(&mut bytes);
        }
        for rr in packet
            .answers
            .iter()
            .chain(packet.authorities.iter())
            .chain(packet.additionals.iter())
        {
            rr.to_wire(&mut bytes);
        }

        bytes
    }

    pub fn section(&self, section: Section) -> &[DNSResource] {
        match section {
            Section::Answer => &self.answers,
            Section::Authority => &self.authorities,
            Section::Additional => &self.additionals,
        }
    }

    pub fn all_records(&self) -> impl Iterator<Item = &DNSResource> {
        self.answers
            .iter()
            .chain(self.authorities.iter())
            .chain(self.additionals.iter())
    }

    pub fn rr_list_by_type(&self, rtype: DNSResourceType, section: Section) -> Vec<&DNSResource> {
        self.section(section)
            .iter()
            .filter(|rr| rr.rtype == rtype)
            .collect()
    }

    pub fn rr_list_by_name_and_type(
        &self,
        owner: &[String],
        rtype: DNSResourceType,
        section: Section,
    ) -> Vec<&DNSResource> {
        self.section(section)
            .iter()
            .filter(|rr| rr.rtype == rtype && rr.owner_eq(owner))
            .collect()
    }

    pub fn section_has_rr_type(&self, rtype: DNSResourceType, section: Section) -> bool {
        self.section(section).iter().any(|rr| rr.rtype == rtype)
    }

    /// The OPT pseudo-record of the reply, if present.
    pub fn edns_opt(&self) -> Option<EdnsOpt> {
        self.additionals
            .iter()
            .find(|rr| rr.rtype == DNSResourceType::OPT)
            .and_then(|rr| EdnsOpt::parse_from_resource(rr).ok())
    }

    /// Effective RCODE with the EDNS extension bits folded in.
    pub fn rcode(&self) -> u16 {
        let base = self.header.rcode as u16;

        match self.edns_opt() {
            Some(opt) => ((opt.extended_rcode as u16) << 4) | base,
            None => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{EDNS_NSID, EDNS_UDP_SIZE};

    #[test]
    fn query_round_trip() {
        let mut query = DNSPacket::query(0x4242, "www.zz--check.example.", DNSResourceType::A);
        query.header.rd = false;

        let mut opt = EdnsOpt::with_payload_size(EDNS_UDP_SIZE);
        opt.set_do_flag(true);
        opt.add_option(EDNS_NSID, Vec::new());
        query.add_edns(opt);

        let wire = query.to_wire();
        let parsed = DNSPacket::parse(&wire).unwrap();

        assert_eq!(parsed.header.id, 0x4242);
        assert_eq!(parsed.questions.len(), 1);
        assert_eq!(parsed.questions[0].owner(), "www.zz--check.example.");
        assert_eq!(parsed.questions[0].qtype, DNSResourceType::A);

        let opt = parsed.edns_opt().unwrap();
        assert!(opt.do_flag());
        assert!(opt.find_option(EDNS_NSID).is_some());
    }

    #[test]
    fn truncated_answer_section_is_classified() {
        let query = DNSPacket::query(7, "example.", DNSResourceType::A);
        let mut wire = query.to_wire();
        /* claim an answer that is not there */
        wire[7] = 1;

        assert_eq!(
            DNSPacket::parse(&wire).unwrap_err(),
            ParseError::IncompleteAnswer
        );
    }

    #[test]
    fn extended_rcode_folds_in() {
        let mut reply = DNSPacket::query(1, "example.", DNSResourceType::A);
        reply.header.qr = true;
        reply.header.rcode = 0; /* BADVERS = 16: low nibble 0, extended 1 */

        let mut opt = EdnsOpt::with_payload_size(512);
        opt.extended_rcode = 1;
        reply.add_edns(opt);

        let parsed = DNSPacket::parse(&reply.to_wire()).unwrap();
        assert_eq!(parsed.rcode(), 16);
    }
}
