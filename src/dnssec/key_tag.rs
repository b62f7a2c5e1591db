/// Key tag of a DNSKEY record (RFC 4034 Appendix B): a 16-bit
/// checksum over the rdata, with a carry fold at the end.
pub fn calculate_key_tag(flags: u16, protocol: u8, algorithm: u8, public_key: &[u8]) -> u16 {
    /* RSA/MD5 keys predate the checksum: their tag is the third- and
     * second-to-last byte of the modulus (RFC 4034 Appendix B.1) */
    if algorithm == 1 {
        let len = public_key.len();
        if len < 3 {
            return 0;
        }

        return u16::from_be_bytes([public_key[len - 3], public_key[len - 2]]);
    }

    let mut rdata = Vec::with_capacity(4 + public_key.len());
    rdata.extend_from_slice(&flags.to_be_bytes());
    rdata.push(protocol);
    rdata.push(algorithm);
    rdata.extend_from_slice(public_key);

    let mut accumulator: u32 = 0;
    for pair in rdata.chunks(2) {
        accumulator += u32::from(pair[0]) << 8;
        if let Some(&low) = pair.get(1) {
            accumulator += u32::from(low);
        }
    }

    accumulator += accumulator >> 16;
    (accumulator & 0xFFFF) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::DnskeyRdata;
    use crate::dnssec::ZoneKey;

    #[test]
    fn checksum_over_dnskey_rdata() {
        /* rdata 01 00 03 08 01 02 03 04, summed by hand */
        assert_eq!(
            calculate_key_tag(256, 3, 8, &[0x01, 0x02, 0x03, 0x04]),
            0x080E
        );

        /* odd rdata length exercises the trailing high byte and the
         * carry fold: 01 01 03 0D AA BB CC sums to 0x17AC9 */
        assert_eq!(calculate_key_tag(257, 3, 13, &[0xAA, 0xBB, 0xCC]), 0x7ACA);
    }

    #[test]
    fn zone_key_precomputes_its_tag() {
        let key = ZoneKey::new(DnskeyRdata {
            flags: 256,
            protocol: 3,
            algorithm: 8,
            public_key: vec![0x01, 0x02, 0x03, 0x04],
        });

        assert_eq!(key.key_tag, 0x080E);
        assert_eq!(
            key.key_tag,
            calculate_key_tag(key.data.flags, key.data.protocol, key.data.algorithm, &key.data.public_key)
        );
    }

    #[test]
    fn rsamd5_tag_comes_from_the_modulus_tail() {
        /* third- and second-to-last bytes of the key material */
        assert_eq!(
            calculate_key_tag(257, 3, 1, &[0x12, 0x34, 0x56, 0x78]),
            0x3456
        );

        /* too short to hold a tag */
        assert_eq!(calculate_key_tag(257, 3, 1, &[0x01, 0x02]), 0);
        assert_eq!(calculate_key_tag(257, 3, 1, &[]), 0);
    }
}
