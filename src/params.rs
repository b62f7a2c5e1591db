//! Parsing of the positional test parameters the monitoring platform
//! hands to each check.

use crate::probelog::TestLog;
use crate::resolver::validate_ip;

/// Numeric parameters must fit an unsigned 31-bit integer.
pub fn parse_uint31(value: &str) -> Result<u32, String> {
    match value.parse::<u32>() {
        Ok(number) if number <= 0x7FFF_FFFF => Ok(number),
        _ => Err(format!("\"{}\" is not a valid unsigned integer", value)),
    }
}

/// Split `host[<delim>port]`. An unparsable or out-of-range port is
/// rejected rather than truncated.
pub fn host_and_port(value: &str, delim: char, default_port: u16) -> Result<(String, u16), String> {
    match value.split_once(delim) {
        None => Ok((value.to_string(), default_port)),
        Some((host, port)) => {
            let port: u16 = port
                .parse()
                .map_err(|_| format!("invalid port \"{}\" in \"{}\"", port, value))?;
            Ok((host.to_string(), port))
        }
    }
}

/// One authoritative name server with its tested endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameServer {
    pub name: String,
    pub endpoints: Vec<NsEndpoint>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsEndpoint {
    pub ip: String,
    pub port: u16,
}

/// Parse the space-separated `NAME,IP[;PORT]` list. Endpoints whose
/// address is not supported by the enabled IP versions are dropped with
/// a warning; duplicate (name, ip, port) triples collapse; first-seen
/// name server order is preserved.
pub fn parse_nameservers(
    list: &str,
    ipv4_enabled: bool,
    ipv6_enabled: bool,
    default_port: u16,
    log: &TestLog,
) -> Result<Vec<NameServer>, String> {
    let mut nss: Vec<NameServer> = Vec::new();

    for entry in list.split(' ').filter(|entry| !entry.is_empty()) {
        let Some((name, ip_part)) = entry.split_once(',') else {
            return Err(format!(
                "invalid entry \"{}\" in the list of name servers, expected \"<NS>,<IP>[;<PORT>]\"",
                entry
            ));
        };

        let (ip, port) = host_and_port(ip_part, ';', default_port)?;

        if validate_ip(&ip, ipv4_enabled, ipv6_enabled).is_none() {
            log.warn(format!(
                "unsupported IP address \"{}\" in the list of name servers, ignored",
                ip
            ));
            continue;
        }

        let endpoint = NsEndpoint { ip, port };

        match nss.iter_mut().find(|ns| ns.name == name) {
            Some(ns) => {
                if !ns.endpoints.contains(&endpoint) {
                    ns.endpoints.push(endpoint);
                }
            }
            None => nss.push(NameServer {
                name: name.to_string(),
                endpoints: vec![endpoint],
            }),
        }
    }

    Ok(nss)
}

/// Serialise a parsed list back into the wire form; parsing the result
/// yields the same list again.
pub fn nameservers_to_list(nss: &[NameServer], default_port: u16) -> String {
    let mut entries = Vec::new();

    for ns in nss {
        for endpoint in &ns.endpoints {
            if endpoint.port == default_port {
                entries.push(format!("{},{}", ns.name, endpoint.ip));
            } else {
                entries.push(format!("{},{};{}", ns.name, endpoint.ip, endpoint.port));
            }
        }
    }

    entries.join(" ")
}

/// The minimum-working-name-servers value, optionally scheduled:
/// `<value>` or `<value>;<ts>:<newvalue>[;<ts>:<newvalue>…]`. Overrides
/// whose timestamp has passed shift the value; the first still-future
/// timestamp ends the scan.
pub fn minns_from_expr(now: i64, value: &str) -> Result<u32, String> {
    let mut current = value;

    while let Some(semi) = current.find(';') {
        let rest = &current[semi + 1..];

        let ts_end = rest.find(':').ok_or_else(|| {
            format!("unexpected format of minimum name servers value \"{}\"", value)
        })?;

        let ts: i64 = rest[..ts_end]
            .parse()
            .map_err(|_| format!("unexpected format of minimum name servers value \"{}\"", value))?;

        if ts > now {
            break;
        }

        current = &rest[ts_end + 1..];
    }

    let end = current.find(';').unwrap_or(current.len());
    current[..end]
        .parse()
        .map_err(|_| format!("unexpected format of minimum name servers value \"{}\"", value))
}

/// Check a separator-delimited host list for characters outside
/// `[A-Za-z0-9.:_-]`; returns the first offender.
pub fn validate_host_list(list: &str, delim: char) -> Option<char> {
    list.chars().find(|&c| {
        !(c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' || c == ':' || c == delim)
    })
}

/// Split a delimited list into its non-empty members.
pub fn strings_from_list(list: &str, delim: char) -> Vec<String> {
    list.split(delim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uint31_bounds() {
        assert_eq!(parse_uint31("0").unwrap(), 0);
        assert_eq!(parse_uint31("2147483647").unwrap(), 0x7FFF_FFFF);
        assert!(parse_uint31("2147483648").is_err());
        assert!(parse_uint31("-1").is_err());
        assert!(parse_uint31("").is_err());
        assert!(parse_uint31("12x").is_err());
    }

    #[test]
    fn host_and_port_rejects_out_of_range() {
        assert_eq!(
            host_and_port("whois.example", ';', 43).unwrap(),
            ("whois.example".to_string(), 43)
        );
        assert_eq!(
            host_and_port("whois.example;4343", ';', 43).unwrap(),
            ("whois.example".to_string(), 4343)
        );
        assert!(host_and_port("whois.example;70000", ';', 43).is_err());
        assert!(host_and_port("whois.example;4a", ';', 43).is_err());
    }

    #[test]
    fn nameserver_list_parsing() {
        let log = TestLog::buffer();
        let nss = parse_nameservers(
            "ns1.example,192.0.2.1 ns1.example,192.0.2.2;5353 ns2.example,2001:db8::1 ns1.example,192.0.2.1",
            true,
            true,
            53,
            &log,
        )
        .unwrap();

        assert_eq!(nss.len(), 2);
        assert_eq!(nss[0].name, "ns1.example");
        assert_eq!(nss[0].endpoints.len(), 2);
        assert_eq!(nss[0].endpoints[1].port, 5353);
        assert_eq!(nss[1].name, "ns2.example");
    }

    #[test]
    fn unsupported_ips_are_dropped_with_warning() {
        let log = TestLog::buffer();
        let nss = parse_nameservers(
            "ns1.example,192.0.2.1 ns1.example,2001:db8::1",
            true,
            false,
            53,
            &log,
        )
        .unwrap();

        assert_eq!(nss.len(), 1);
        assert_eq!(nss[0].endpoints.len(), 1);
        assert!(log.take().contains("unsupported IP address"));
    }

    #[test]
    fn nameserver_list_is_idempotent_after_canonicalisation() {
        let log = TestLog::buffer();
        let input = "ns2.example,192.0.2.9;5300 ns1.example,192.0.2.1 ns1.example,2001:db8::1";

        let parsed = parse_nameservers(input, true, true, 53, &log).unwrap();
        let canonical = nameservers_to_list(&parsed, 53);
        let reparsed = parse_nameservers(&canonical, true, true, 53, &log).unwrap();

        assert_eq!(parsed, reparsed);
        assert_eq!(canonical, nameservers_to_list(&reparsed, 53));
    }

    #[test]
    fn malformed_entry_is_rejected() {
        let log = TestLog::buffer();
        assert!(parse_nameservers("ns1.example", true, true, 53, &log).is_err());
    }

    #[test]
    fn minns_expression() {
        assert_eq!(minns_from_expr(1000, "2").unwrap(), 2);
        /* override already in effect */
        assert_eq!(minns_from_expr(1000, "2;500:4").unwrap(), 4);
        /* override still in the future */
        assert_eq!(minns_from_expr(1000, "2;2000:4").unwrap(), 2);
        /* chain: first passed, second future */
        assert_eq!(minns_from_expr(1000, "2;500:4;2000:8").unwrap(), 4);
        /* chain fully in effect */
        assert_eq!(minns_from_expr(3000, "2;500:4;2000:8").unwrap(), 8);

        assert!(minns_from_expr(1000, "2;abc:4").is_err());
        assert!(minns_from_expr(1000, "").is_err());
    }

    #[test]
    fn host_list_charset() {
        assert_eq!(validate_host_list("192.0.2.1,2001:db8::1", ','), None);
        assert_eq!(validate_host_list("192.0.2.1, 2001:db8::1", ','), Some(' '));
        assert_eq!(
            strings_from_list(",192.0.2.1,,192.0.2.2,", ','),
            vec!["192.0.2.1", "192.0.2.2"]
        );
    }
}
