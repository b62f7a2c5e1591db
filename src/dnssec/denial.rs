//! NSEC and NSEC3 proof-of-absence checks for NXDOMAIN replies.

use std::cmp::Ordering;

use super::MAX_NSEC3_ITERATIONS;
use crate::dns::{DNSPacket, DNSResource, DNSResourceType, Section};
use crate::error::{DnssecError, Failure};

/// Validate the denial proof of a negative reply. The QUESTION section's
/// A query and the AUTHORITY section's RRSIG/NSEC/NSEC3 records drive
/// the check; NOERROR replies are accepted without proof.
pub fn verify_denial_of_existence(pkt: &DNSPacket) -> Result<(), Failure<DnssecError>> {
    let question = pkt
        .questions
        .iter()
        .find(|q| q.qtype == DNSResourceType::A)
        .ok_or_else(|| Failure::new(DnssecError::Internal, "cannot obtain query section"))?;

    if question.labels.is_empty() {
        return Err(Failure::new(
            DnssecError::Internal,
            "question section is empty",
        ));
    }

    let rrsigs = pkt.rr_list_by_type(DNSResourceType::RRSIG, Section::Authority);
    let nsecs = pkt.rr_list_by_type(DNSResourceType::NSEC, Section::Authority);
    let nsec3s = pkt.rr_list_by_type(DNSResourceType::NSEC3, Section::Authority);

    let nxdomain = pkt.rcode() == 3;

    if !nsecs.is_empty() {
        if rrsigs.is_empty() {
            return Err(Failure::new(DnssecError::RrsigNone, "missing rrsigs"));
        }

        if nxdomain {
            verify_nsec_denial(&question.labels, &nsecs)?;
        }
    }

    if !nsec3s.is_empty() {
        if rrsigs.is_empty() {
            return Err(Failure::new(DnssecError::RrsigNone, "missing rrsigs"));
        }

        if nxdomain {
            verify_nsec3_denial(&question.labels, &nsec3s)?;
        }
    }

    Ok(())
}

fn verify_nsec_denial(
    qname: &[String],
    nsecs: &[&DNSResource],
) -> Result<(), Failure<DnssecError>> {
    let mut covering_owner: Option<&[String]> = None;

    for nsec in nsecs {
        /* an NSEC at the queried name proves existence, not absence */
        if canonical_cmp(&nsec.labels, qname) == Ordering::Equal {
            return Err(Failure::new(
                DnssecError::RrNotCovered,
                "RR not covered by the given NSEC RRs",
            ));
        }

        let (next, _) = nsec.nsec().map_err(|err| {
            Failure::new(DnssecError::Internal, format!("cannot parse NSEC: {}", err))
        })?;

        if nsec_covers(&nsec.labels, &next, qname) {
            covering_owner = Some(&nsec.labels);
            break;
        }
    }

    let Some(covering_owner) = covering_owner else {
        return Err(Failure::new(
            DnssecError::RrNotCovered,
            "RR not covered by the given NSEC RRs",
        ));
    };

    /* the source of synthesis must be denied as well */
    let closest_encloser = common_suffix(qname, covering_owner);
    let mut wildcard: Vec<String> = vec!["*".to_string()];
    wildcard.extend(closest_encloser.iter().cloned());

    for nsec in nsecs {
        if canonical_cmp(&nsec.labels, &wildcard) == Ordering::Equal {
            continue;
        }

        let (next, _) = nsec.nsec().map_err(|err| {
            Failure::new(DnssecError::Internal, format!("cannot parse NSEC: {}", err))
        })?;

        if nsec_covers(&nsec.labels, &next, &wildcard) {
            return Ok(());
        }
    }

    Err(Failure::new(
        DnssecError::WildNotCovered,
        "wildcard not covered by the given NSEC RRs",
    ))
}

fn verify_nsec3_denial(
    qname: &[String],
    nsec3s: &[&DNSResource],
) -> Result<(), Failure<DnssecError>> {
    let params = nsec3s[0].nsec3().map_err(|err| {
        Failure::new(
            DnssecError::Nsec3Error,
            format!("cannot parse NSEC3: {}", err),
        )
    })?;

    /* only SHA-1 is defined for NSEC3 */
    if params.hash_algorithm != 1 {
        return Err(Failure::new(
            DnssecError::Nsec3Error,
            format!("unsupported NSEC3 hash algorithm {}", params.hash_algorithm),
        ));
    }

    if params.iterations > MAX_NSEC3_ITERATIONS {
        return Err(Failure::new(
            DnssecError::Nsec3Error,
            format!("too many NSEC3 iterations ({})", params.iterations),
        ));
    }

    let mut records = Vec::with_capacity(nsec3s.len());
    for rr in nsec3s {
        let rdata = rr.nsec3().map_err(|err| {
            Failure::new(
                DnssecError::Nsec3Error,
                format!("cannot parse NSEC3: {}", err),
            )
        })?;

        let owner_hash = rr
            .labels
            .first()
            .map(|label| label.to_lowercase())
            .ok_or_else(|| Failure::new(DnssecError::Nsec3Error, "NSEC3 owner has no labels"))?;

        let next_hash = base32hex(&rdata.next_hashed_owner);

        records.push((owner_hash, next_hash));
    }

    /* find the closest encloser: the deepest ancestor whose hash has a
     * matching NSEC3 record */
    let mut closest_encloser = None;
    for depth in 1..qname.len() {
        let candidate = &qname[depth..];
        let hash = nsec3_hash(candidate, &params.salt, params.iterations);

        if records.iter().any(|(owner, _)| *owner == hash) {
            closest_encloser = Some(depth);
            break;
        }
    }

    let Some(depth) = closest_encloser else {
        return Err(Failure::new(
            DnssecError::RrNotCovered,
            "RR not covered by the given NSEC RRs",
        ));
    };

    let next_closer = &qname[depth - 1..];
    let next_closer_hash = nsec3_hash(next_closer, &params.salt, params.iterations);

    if !records
        .iter()
        .any(|(owner, next)| hash_covers(owner, next, &next_closer_hash))
    {
        return Err(Failure::new(
            DnssecError::RrNotCovered,
            "RR not covered by the given NSEC RRs",
        ));
    }

    let mut wildcard: Vec<String> = vec!["*".to_string()];
    wildcard.extend(qname[depth..].iter().cloned());
    let wildcard_hash = nsec3_hash(&wildcard, &params.salt, params.iterations);

    if !records
        .iter()
        .any(|(owner, next)| hash_covers(owner, next, &wildcard_hash) || *owner == wildcard_hash)
    {
        return Err(Failure::new(
            DnssecError::WildNotCovered,
            "wildcard not covered by the given NSEC RRs",
        ));
    }

    Ok(())
}

/// Canonical DNS name ordering (RFC 4034 §6.1): compare label sequences
/// right to left, case-insensitively.
fn canonical_cmp(a: &[String], b: &[String]) -> Ordering {
    let mut a_iter = a.iter().rev();
    let mut b_iter = b.iter().rev();

    loop {
        match (a_iter.next(), b_iter.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = x
                    .to_lowercase()
                    .as_bytes()
                    .cmp(y.to_lowercase().as_bytes());
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Does the NSEC interval (owner, next) cover `name`? The last NSEC of a
/// zone wraps around to the apex.
fn nsec_covers(owner: &[String], next: &[String], name: &[String]) -> bool {
    match canonical_cmp(next, owner) {
        Ordering::Greater => {
            canonical_cmp(name, owner) == Ordering::Greater
                && canonical_cmp(name, next) == Ordering::Less
        }
        _ => {
            canonical_cmp(name, owner) == Ordering::Greater
                || canonical_cmp(name, next) == Ordering::Less
        }
    }
}

/// Interval cover over base32hex hash strings; base32hex preserves the
/// byte ordering of the underlying hashes.
fn hash_covers(owner: &str, next: &str, hash: &str) -> bool {
    if next > owner {
        hash > owner && hash < next
    } else {
        hash > owner || hash < next
    }
}

fn base32hex(data: &[u8]) -> String {
    base32::encode(base32::Alphabet::Rfc4648Hex { padding: false }, data).to_lowercase()
}

/// NSEC3 hash of a name (RFC 5155 §5): iterated SHA-1 over the canonical
/// wire form with the salt appended each round.
fn nsec3_hash(labels: &[String], salt: &[u8], iterations: u16) -> String {
    let mut wire = Vec::new();
    for label in labels {
        if label.is_empty() {
            continue;
        }
        wire.push(label.len() as u8);
        wire.extend_from_slice(label.to_lowercase().as_bytes());
    }
    wire.push(0);

    let mut input = wire;
    input.extend_from_slice(salt);
    let mut hash = ring::digest::digest(&ring::digest::SHA1_FOR_LEGACY_USE_ONLY, &input);

    for _ in 0..iterations {
        let mut next = hash.as_ref().to_vec();
        next.extend_from_slice(salt);
        hash = ring::digest::digest(&ring::digest::SHA1_FOR_LEGACY_USE_ONLY, &next);
    }

    base32hex(hash.as_ref())
}

fn common_suffix(a: &[String], b: &[String]) -> Vec<String> {
    let mut suffix = Vec::new();

    for (x, y) in a.iter().rev().zip(b.iter().rev()) {
        if x.eq_ignore_ascii_case(y) {
            suffix.insert(0, x.clone());
        } else {
            break;
        }
    }

    suffix
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(name: &str) -> Vec<String> {
        name.split('.')
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn canonical_ordering() {
        assert_eq!(
            canonical_cmp(&labels("a.example"), &labels("b.example")),
            Ordering::Less
        );
        assert_eq!(
            canonical_cmp(&labels("A.EXAMPLE"), &labels("a.example")),
            Ordering::Equal
        );
        assert_eq!(
            canonical_cmp(&labels("z.a.example"), &labels("b.example")),
            Ordering::Less
        );
        assert_eq!(
            canonical_cmp(&labels("example"), &labels("a.example")),
            Ordering::Less
        );
    }

    #[test]
    fn nsec_interval_cover() {
        assert!(nsec_covers(
            &labels("a.example"),
            &labels("c.example"),
            &labels("b.example")
        ));
        assert!(!nsec_covers(
            &labels("a.example"),
            &labels("c.example"),
            &labels("d.example")
        ));
        /* wrap-around at the end of the zone */
        assert!(nsec_covers(
            &labels("x.example"),
            &labels("example"),
            &labels("z.example")
        ));
    }

    #[test]
    fn nsec3_hash_changes_with_salt() {
        let plain = nsec3_hash(&labels("example.com"), &[], 0);
        let salted = nsec3_hash(&labels("example.com"), &[0xAA, 0xBB], 1);

        assert!(!plain.is_empty());
        assert_ne!(plain, salted);
        assert!(plain
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='v').contains(&c)));
    }
}
