use tracing::debug;

use super::algorithm::DnsSecAlgorithm;
use super::denial::verify_denial_of_existence;
use super::ZoneKey;
use crate::dns::{
    labels_to_fqdn, DNSPacket, DNSResource, DNSResourceClass, DNSResourceType, RrsigRdata, Section,
};
use crate::error::{DnssecError, Failure, RrClassError};

fn covered_to_str(covered_type: DNSResourceType) -> &'static str {
    match covered_type {
        DNSResourceType::DS => "DS",
        DNSResourceType::NSEC => "NSEC",
        DNSResourceType::NSEC3 => "NSEC3",
        _ => "*UNKNOWN*",
    }
}

/// Every RR of the reply must be class IN. The OPT pseudo-record is
/// exempt, its class field carries the UDP payload size.
pub fn verify_rr_class(pkt: &DNSPacket) -> Result<(), Failure<RrClassError>> {
    let question_classes = pkt.questions.iter().map(|q| q.qclass);
    let rr_classes = pkt
        .all_records()
        .filter(|rr| rr.rtype != DNSResourceType::OPT)
        .map(|rr| rr.rclass);

    for class in question_classes.chain(rr_classes) {
        if class != DNSResourceClass::IN {
            let kind = match class {
                DNSResourceClass::CH => RrClassError::Chaos,
                DNSResourceClass::HS => RrClassError::Hesiod,
                _ => RrClassError::Catchall,
            };

            return Err(Failure::new(
                kind,
                format!("unexpected RR class, expected IN got {}", class),
            ));
        }
    }

    Ok(())
}

/// Collect the AUTHORITY-section RRSIGs that cover `covered_type`,
/// keyed by owner.
fn covered_rrsigs(
    pkt: &DNSPacket,
    covered_type: DNSResourceType,
) -> Result<Vec<(Vec<String>, RrsigRdata)>, Failure<DnssecError>> {
    let all = pkt.rr_list_by_type(DNSResourceType::RRSIG, Section::Authority);

    if all.is_empty() {
        return Err(Failure::new(
            DnssecError::RrsigNone,
            format!(
                "no {} RRSIG records found in reply",
                covered_to_str(covered_type)
            ),
        ));
    }

    let mut result = Vec::new();
    for rr in all {
        let rrsig = rr.rrsig().map_err(|err| {
            Failure::new(
                DnssecError::RrsigMissRdata,
                format!("cannot parse RRSIG record: {}", err),
            )
        })?;

        if rrsig.type_covered == covered_type {
            result.push((rr.labels.clone(), rrsig));
        }
    }

    Ok(result)
}

/// Verify the RRSIGs of the AUTHORITY section that cover `covered_type`
/// against the zone's DNSKEY set, owner by owner.
pub fn verify_rrsigs(
    pkt: &DNSPacket,
    covered_type: DNSResourceType,
    dnskeys: &[ZoneKey],
    ns: &str,
    ip: &str,
    now: u32,
) -> Result<(), Failure<DnssecError>> {
    let sigs = covered_rrsigs(pkt, covered_type)?;

    let mut owners: Vec<&Vec<String>> = Vec::new();
    for (owner, _) in &sigs {
        if !owners
            .iter()
            .any(|seen| labels_eq(seen, owner))
        {
            owners.push(owner);
        }
    }

    if owners.is_empty() {
        return Err(Failure::new(
            DnssecError::RrsigNotCovered,
            format!(
                "no RRSIG records covering {} found",
                covered_to_str(covered_type)
            ),
        ));
    }

    for owner in owners {
        let owner_str = labels_to_fqdn(owner);

        let rrset = pkt.rr_list_by_name_and_type(owner, covered_type, Section::Authority);
        if rrset.is_empty() {
            return Err(Failure::new(
                DnssecError::RrsigNotCovered,
                format!(
                    "no {} records covering RRSIG of \"{}\" found at nameserver \"{}\" ({})",
                    covered_to_str(covered_type),
                    owner_str,
                    ns,
                    ip
                ),
            ));
        }

        let owner_sigs: Vec<&RrsigRdata> = sigs
            .iter()
            .filter(|(sig_owner, _)| labels_eq(sig_owner, owner))
            .map(|(_, rrsig)| rrsig)
            .collect();

        if let Err(err) = verify_rrset_signatures(&rrset, &owner_sigs, dnskeys, now) {
            return Err(Failure::new(
                err.kind,
                format!(
                    "cannot verify {} RRSIGs of \"{}\": {} (used {} {}, {} RRSIG and {} DNSKEY RRs)",
                    covered_to_str(covered_type),
                    owner_str,
                    err.kind,
                    rrset.len(),
                    covered_to_str(covered_type),
                    owner_sigs.len(),
                    dnskeys.len()
                ),
            ));
        }

        debug!("verified {} RRSIGs of {}", covered_to_str(covered_type), owner_str);
    }

    Ok(())
}

fn labels_eq(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.eq_ignore_ascii_case(y))
}

/// Verify one RRset against its signatures. Succeeds on the first
/// signature that validates; otherwise reports the last failure.
fn verify_rrset_signatures(
    rrset: &[&DNSResource],
    rrsigs: &[&RrsigRdata],
    dnskeys: &[ZoneKey],
    now: u32,
) -> Result<(), Failure<DnssecError>> {
    let mut last_err = Failure::new(DnssecError::RrsigNone, "no RRSIG records to verify");

    for rrsig in rrsigs {
        match verify_one_signature(rrset, rrsig, dnskeys, now) {
            Ok(()) => return Ok(()),
            Err(err) => last_err = err,
        }
    }

    Err(last_err)
}

fn verify_one_signature(
    rrset: &[&DNSResource],
    rrsig: &RrsigRdata,
    dnskeys: &[ZoneKey],
    now: u32,
) -> Result<(), Failure<DnssecError>> {
    let key = dnskeys
        .iter()
        .find(|key| key.key_tag == rrsig.key_tag && key.data.algorithm == rrsig.algorithm)
        .ok_or_else(|| {
            Failure::new(
                DnssecError::RrsigNotSigned,
                format!(
                    "no DNSKEY with tag {} and algorithm {} in the keyset",
                    rrsig.key_tag, rrsig.algorithm
                ),
            )
        })?;

    if rrsig.expiration < rrsig.inception {
        return Err(Failure::new(
            DnssecError::SigExpirationBeforeInception,
            "signature expiration date is earlier than inception date",
        ));
    }
    if now > rrsig.expiration {
        return Err(Failure::new(
            DnssecError::SigExpired,
            "signature has expired",
        ));
    }
    if now < rrsig.inception {
        return Err(Failure::new(
            DnssecError::SigNotIncepted,
            "signature not incepted yet",
        ));
    }

    let algorithm = DnsSecAlgorithm::classify(rrsig.algorithm)
        .map_err(|kind| Failure::new(kind, format!("algorithm {}", rrsig.algorithm)))?;

    let verify_alg = algorithm.ring_algorithm().ok_or_else(|| {
        Failure::new(
            DnssecError::AlgoNotImpl,
            format!("algorithm {}", rrsig.algorithm),
        )
    })?;

    let signed_data = build_signed_data(rrsig, rrset);
    let key_bytes = ring_public_key(algorithm, &key.data.public_key).ok_or_else(|| {
        Failure::new(DnssecError::SigBogus, "cannot decode DNSKEY public key")
    })?;

    ring::signature::UnparsedPublicKey::new(verify_alg, &key_bytes)
        .verify(&signed_data, &rrsig.signature)
        .map_err(|_| Failure::new(DnssecError::SigBogus, "bogus DNSSEC signature"))
}

/// The canonical byte stream an RRSIG signs: its own rdata up to the
/// signer name, the signer name, then the RRset in canonical form
/// (RFC 4034 §3.1.8.1).
fn build_signed_data(rrsig: &RrsigRdata, rrset: &[&DNSResource]) -> Vec<u8> {
    let mut data = Vec::new();

    data.extend_from_slice(&u16::from(rrsig.type_covered).to_be_bytes());
    data.push(rrsig.algorithm);
    data.push(rrsig.labels);
    data.extend_from_slice(&rrsig.original_ttl.to_be_bytes());
    data.extend_from_slice(&rrsig.expiration.to_be_bytes());
    data.extend_from_slice(&rrsig.inception.to_be_bytes());
    data.extend_from_slice(&rrsig.key_tag.to_be_bytes());

    write_canonical_name(&mut data, &rrsig.signer_name);

    let mut sorted: Vec<&DNSResource> = rrset.to_vec();
    sorted.sort_by(|a, b| a.rdata.cmp(&b.rdata));

    for rr in sorted {
        write_canonical_name(&mut data, &rr.labels);
        data.extend_from_slice(&u16::from(rr.rtype).to_be_bytes());
        data.extend_from_slice(&rr.raw_class.to_be_bytes());
        data.extend_from_slice(&rrsig.original_ttl.to_be_bytes());
        data.extend_from_slice(&(rr.rdata.len() as u16).to_be_bytes());
        data.extend_from_slice(&rr.rdata);
    }

    data
}

fn write_canonical_name(out: &mut Vec<u8>, labels: &[String]) {
    for label in labels {
        if label.is_empty() {
            continue;
        }
        out.push(label.len() as u8);
        out.extend_from_slice(label.to_lowercase().as_bytes());
    }
    out.push(0);
}

/// DNSKEY public keys in the form ring expects: RFC 3110 RSA keys are
/// re-encoded as a DER RSAPublicKey, ECDSA points get the uncompressed
/// prefix, Ed25519 passes through.
fn ring_public_key(algorithm: DnsSecAlgorithm, key: &[u8]) -> Option<Vec<u8>> {
    if algorithm.is_rsa() {
        return rfc3110_to_der(key);
    }

    if algorithm.is_ecdsa() {
        let mut point = Vec::with_capacity(key.len() + 1);
        point.push(0x04);
        point.extend_from_slice(key);
        return Some(point);
    }

    Some(key.to_vec())
}

/// RFC 3110 wire key: exponent length (1 or 3 bytes), exponent, modulus.
fn rfc3110_to_der(key: &[u8]) -> Option<Vec<u8>> {
    if key.is_empty() {
        return None;
    }

    let (exp_len, exp_start) = if key[0] == 0 {
        if key.len() < 3 {
            return None;
        }
        (u16::from_be_bytes([key[1], key[2]]) as usize, 3)
    } else {
        (key[0] as usize, 1)
    };

    if key.len() < exp_start + exp_len || exp_len == 0 {
        return None;
    }

    let exponent = &key[exp_start..exp_start + exp_len];
    let modulus = &key[exp_start + exp_len..];
    if modulus.is_empty() {
        return None;
    }

    let modulus_der = der_integer(modulus);
    let exponent_der = der_integer(exponent);

    let mut seq = Vec::with_capacity(modulus_der.len() + exponent_der.len() + 4);
    seq.push(0x30);
    der_length(&mut seq, modulus_der.len() + exponent_der.len());
    seq.extend_from_slice(&modulus_der);
    seq.extend_from_slice(&exponent_der);

    Some(seq)
}

fn der_integer(value: &[u8]) -> Vec<u8> {
    let stripped: &[u8] = {
        let mut v = value;
        while v.len() > 1 && v[0] == 0 {
            v = &v[1..];
        }
        v
    };

    let needs_pad = stripped.first().is_some_and(|&b| b & 0x80 != 0);
    let mut out = Vec::with_capacity(stripped.len() + 3);
    out.push(0x02);
    der_length(&mut out, stripped.len() + needs_pad as usize);
    if needs_pad {
        out.push(0);
    }
    out.extend_from_slice(stripped);
    out
}

fn der_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
    } else if len <= 0xFF {
        out.push(0x81);
        out.push(len as u8);
    } else {
        out.push(0x82);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    }
}

/// Full DNSSEC check of an authoritative NXDOMAIN reply: at least one
/// RRSIG anywhere, NSEC or NSEC3 in AUTHORITY, their signatures valid
/// against the keyset, and the denial proof itself. A failed denial
/// proof overrides a keyset mismatch from the signature step.
pub fn check_dnssec(
    pkt: &DNSPacket,
    dnskeys: &[ZoneKey],
    ns: &str,
    ip: &str,
    now: u32,
) -> Result<(), Failure<DnssecError>> {
    let has_rrsig = pkt.section_has_rr_type(DNSResourceType::RRSIG, Section::Answer)
        || pkt.section_has_rr_type(DNSResourceType::RRSIG, Section::Authority)
        || pkt.section_has_rr_type(DNSResourceType::RRSIG, Section::Additional);

    if !has_rrsig {
        return Err(Failure::new(
            DnssecError::RrsigNone,
            "no RRSIGs where found in any section",
        ));
    }

    let auth_has_nsec = pkt.section_has_rr_type(DNSResourceType::NSEC, Section::Authority);
    let auth_has_nsec3 = pkt.section_has_rr_type(DNSResourceType::NSEC3, Section::Authority);

    if !auth_has_nsec && !auth_has_nsec3 {
        return Err(Failure::new(
            DnssecError::NoNsecInAuth,
            "no NSEC/NSEC3 RRs were found in the authority section",
        ));
    }

    let mut result = Ok(());

    if auth_has_nsec {
        result = verify_rrsigs(pkt, DNSResourceType::NSEC, dnskeys, ns, ip, now);
    }

    if result.is_ok() && auth_has_nsec3 {
        result = verify_rrsigs(pkt, DNSResourceType::NSEC3, dnskeys, ns, ip, now);
    }

    /* a denial-of-existence failure overrides a keyset mismatch */
    let run_denial = match &result {
        Ok(()) => true,
        Err(err) => err.kind == DnssecError::RrsigNotSigned,
    };

    if run_denial {
        if let Err(err) = verify_denial_of_existence(pkt) {
            return Err(err);
        }
    }

    result
}
