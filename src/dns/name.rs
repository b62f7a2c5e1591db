//! Domain name wire handling with compression-pointer support.

use super::ParseError;

/// Parse a domain name starting at `start`, following compression
/// pointers. Returns the labels and the offset just past the name in the
/// original position (after the first pointer if one was followed).
pub fn parse_domain_name(data: &[u8], start: usize) -> Result<(Vec<String>, usize), ParseError> {
    let mut labels = Vec::new();
    let mut offset = start;
    let mut jumps = 0;
    let mut first_pointer_offset = None;

    loop {
        if offset >= data.len() {
            return Err(ParseError::InvalidLabel);
        }

        let len = data[offset];

        if (len & 0xC0) == 0xC0 {
            if offset + 1 >= data.len() {
                return Err(ParseError::InvalidLabel);
            }

            if first_pointer_offset.is_none() {
                first_pointer_offset = Some(offset + 2);
            }

            jumps += 1;
            if jumps > 5 {
                return Err(ParseError::InvalidLabel);
            }

            let pointer = u16::from_be_bytes([data[offset] & 0x3F, data[offset + 1]]) as usize;

            let (pointer_labels, _) = parse_domain_name(data, pointer)?;
            labels.extend(pointer_labels);

            return Ok((labels, first_pointer_offset.unwrap_or(offset + 2)));
        }

        if len == 0 {
            return Ok((labels, offset + 1));
        }

        if len > 63 {
            return Err(ParseError::InvalidLabel);
        }

        offset += 1;
        let label_end = offset + len as usize;

        if label_end > data.len() {
            return Err(ParseError::InvalidLabel);
        }

        let label = String::from_utf8_lossy(&data[offset..label_end]).into_owned();
        labels.push(label);

        offset = label_end;
    }
}

/// Skip a domain name and return the offset just past it.
pub fn skip_domain_name(data: &[u8], mut offset: usize) -> Result<usize, ParseError> {
    let mut jumps = 0;
    let mut first_pointer_offset = None;

    loop {
        if offset >= data.len() {
            return Err(ParseError::InvalidLabel);
        }

        let len = data[offset];

        if (len & 0xC0) == 0xC0 {
            if offset + 1 >= data.len() {
                return Err(ParseError::InvalidLabel);
            }

            if first_pointer_offset.is_none() {
                first_pointer_offset = Some(offset + 2);
            }

            jumps += 1;
            if jumps > 5 {
                return Err(ParseError::InvalidLabel);
            }

            offset = u16::from_be_bytes([data[offset] & 0x3F, data[offset + 1]]) as usize;
            continue;
        }

        if len == 0 {
            offset += 1;
            break;
        }

        if len > 63 {
            return Err(ParseError::InvalidLabel);
        }

        offset += 1 + len as usize;
    }

    Ok(first_pointer_offset.unwrap_or(offset))
}

/// Append labels in uncompressed wire format, root terminator included.
pub fn write_labels(out: &mut Vec<u8>, labels: &[String]) {
    for label in labels {
        if label.is_empty() {
            continue;
        }
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
}

/// Split a presentation-format name into labels, tolerating a trailing dot.
pub fn labels_from_str(name: &str) -> Vec<String> {
    name.split('.')
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join labels back into a presentation-format name with a trailing dot,
/// the way owner names are logged and compared.
pub fn labels_to_fqdn(labels: &[String]) -> String {
    if labels.is_empty() {
        return ".".to_string();
    }

    let mut name = labels.join(".");
    name.push('.');
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compressed_names() {
        let packet = vec![
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
            0x07, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 0x03, b'c', b'o', b'm', 0x00, //
            0x03, b'w', b'w', b'w', 0xC0, 0x0C,
        ];

        let (labels, next) = parse_domain_name(&packet, 12).unwrap();
        assert_eq!(labels, vec!["example", "com"]);
        assert_eq!(next, 25);

        let (labels, next) = parse_domain_name(&packet, 25).unwrap();
        assert_eq!(labels, vec!["www", "example", "com"]);
        assert_eq!(next, 31);
    }

    #[test]
    fn rejects_pointer_loops() {
        let packet = vec![0xC0, 0x02, 0xC0, 0x00];
        assert!(parse_domain_name(&packet, 0).is_err());
    }

    #[test]
    fn fqdn_round_trip() {
        let labels = labels_from_str("www.zz--check.example.");
        assert_eq!(labels, vec!["www", "zz--check", "example"]);
        assert_eq!(labels_to_fqdn(&labels), "www.zz--check.example.");
        assert_eq!(labels_to_fqdn(&[]), ".");
    }
}
