//! The outbound DNS client.
//!
//! One resolver talks to exactly one nameserver endpoint at a time;
//! `retarget` swaps the endpoint in place, everything else stays. The
//! probe never recurses itself, so recursive lookups go to the locally
//! configured caching resolver while the per-nameserver test points the
//! resolver at each authoritative server in turn.

use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::constants::{EDNS_UDP_SIZE, MAX_UDP_PACKET_SIZE};
use crate::dns::{
    DNSPacket, DNSResourceType, EdnsOpt, ParseError, Section,
};
use crate::dnssec::ZoneKey;
use crate::errcode::DnsInterface;
use crate::error::{DnsKeysError, Failure, NsQueryError, ResolverError};
use crate::probelog::TestLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Udp,
    Tcp,
}

impl Protocol {
    pub fn interface(self) -> DnsInterface {
        match self {
            Protocol::Udp => DnsInterface::Udp,
            Protocol::Tcp => DnsInterface::Tcp,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Udp => "UDP",
            Protocol::Tcp => "TCP",
        }
    }
}

/// Validate an IP string against the enabled address families.
pub fn validate_ip(ip: &str, ipv4_enabled: bool, ipv6_enabled: bool) -> Option<IpAddr> {
    if ipv4_enabled {
        if let Ok(addr) = ip.parse::<std::net::Ipv4Addr>() {
            return Some(IpAddr::V4(addr));
        }
    }

    if ipv6_enabled {
        if let Ok(addr) = ip.parse::<std::net::Ipv6Addr>() {
            return Some(IpAddr::V6(addr));
        }
    }

    None
}

/// Header flags requested for one query.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryFlags {
    pub rd: bool,
    pub ad: bool,
}

impl QueryFlags {
    pub const NONE: QueryFlags = QueryFlags { rd: false, ad: false };
    pub const RD: QueryFlags = QueryFlags { rd: true, ad: false };
    pub const RD_AD: QueryFlags = QueryFlags { rd: true, ad: true };
}

pub struct Resolver {
    name: String,
    addr: IpAddr,
    port: u16,
    protocol: Protocol,
    timeout: Duration,
    retries: u8,
    dnssec_ok: bool,
}

impl Resolver {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        ip: &str,
        port: u16,
        protocol: Protocol,
        ipv4_enabled: bool,
        ipv6_enabled: bool,
        dnssec_ok: bool,
        timeout_s: u64,
        retries: u8,
    ) -> Result<Self, String> {
        let addr = validate_ip(ip, ipv4_enabled, ipv6_enabled)
            .ok_or_else(|| format!("invalid or unsupported IP of \"{}\": \"{}\"", name, ip))?;

        Ok(Self {
            name: name.to_string(),
            addr,
            port,
            protocol,
            timeout: Duration::from_secs(timeout_s),
            retries: retries.max(1),
            dnssec_ok,
        })
    }

    /// Swap the single configured nameserver endpoint; all other
    /// settings are untouched.
    pub fn retarget(
        &mut self,
        name: &str,
        ip: &str,
        port: u16,
        ipv4_enabled: bool,
        ipv6_enabled: bool,
    ) -> Result<(), String> {
        let addr = validate_ip(ip, ipv4_enabled, ipv6_enabled)
            .ok_or_else(|| format!("invalid or unsupported IP of \"{}\": \"{}\"", name, ip))?;

        self.name = name.to_string();
        self.addr = addr;
        self.port = port;

        Ok(())
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn interface(&self) -> DnsInterface {
        self.protocol.interface()
    }

    fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr, self.port)
    }

    pub fn describe(&self) -> String {
        format!("{} ({}:{})", self.name, self.addr, self.port)
    }

    /// Build a query for one owner/type with this resolver's EDNS
    /// settings, send it, and return the reply with the measured RTT in
    /// milliseconds.
    pub async fn query(
        &self,
        owner: &str,
        qtype: DNSResourceType,
        flags: QueryFlags,
    ) -> Result<(DNSPacket, u32), Failure<NsQueryError>> {
        let mut query = DNSPacket::query(rand::rng().random(), owner, qtype);
        query.header.rd = flags.rd;
        query.header.ad = flags.ad;

        if self.dnssec_ok {
            let mut opt = EdnsOpt::with_payload_size(EDNS_UDP_SIZE);
            opt.set_do_flag(true);
            query.add_edns(opt);
        }

        self.send(&query).await
    }

    /// Send a prepared query packet. Transport and parse failures are
    /// classified into `NsQueryError` with the UDP/TCP-specific rules.
    pub async fn send(&self, query: &DNSPacket) -> Result<(DNSPacket, u32), Failure<NsQueryError>> {
        let wire = query.to_wire();
        let started = Instant::now();

        let reply_bytes = match self.protocol {
            Protocol::Udp => self.exchange_udp(&wire).await,
            Protocol::Tcp => self.exchange_tcp(&wire).await,
        };

        let reply_bytes = reply_bytes.map_err(|err| self.classify_transport(err, started))?;
        let rtt = started.elapsed().as_millis() as u32;

        let reply = DNSPacket::parse(&reply_bytes).map_err(|err| {
            Failure::new(
                classify_parse_error(&err),
                format!("cannot parse reply from {}: {}", self.describe(), err),
            )
        })?;

        trace!(
            server = %self.describe(),
            rcode = reply.rcode(),
            rtt_ms = rtt,
            "received DNS reply"
        );

        Ok((reply, rtt))
    }

    async fn exchange_udp(&self, wire: &[u8]) -> Result<Vec<u8>, TransportError> {
        let bind_addr: SocketAddr = if self.addr.is_ipv4() {
            "0.0.0.0:0".parse().unwrap()
        } else {
            "[::]:0".parse().unwrap()
        };

        let mut last_err = TransportError::Io("no tries attempted".to_string());

        for attempt in 0..self.retries {
            let result = async {
                let socket = UdpSocket::bind(bind_addr)
                    .await
                    .map_err(|e| TransportError::Io(e.to_string()))?;
                socket
                    .connect(self.server_addr())
                    .await
                    .map_err(|e| TransportError::Io(e.to_string()))?;
                socket
                    .send(wire)
                    .await
                    .map_err(|e| TransportError::Io(e.to_string()))?;

                let mut buf = vec![0u8; MAX_UDP_PACKET_SIZE];
                let len = socket
                    .recv(&mut buf)
                    .await
                    .map_err(|e| TransportError::Io(e.to_string()))?;
                buf.truncate(len);

                Ok::<_, TransportError>(buf)
            };

            match timeout(self.timeout, result).await {
                Ok(Ok(reply)) => return Ok(reply),
                Ok(Err(err)) => last_err = err,
                Err(_) => last_err = TransportError::Timeout,
            }

            debug!(
                server = %self.describe(),
                attempt = attempt + 1,
                "UDP exchange failed, {}",
                last_err
            );
        }

        Err(last_err)
    }

    async fn exchange_tcp(&self, wire: &[u8]) -> Result<Vec<u8>, TransportError> {
        let mut last_err = TransportError::Io("no tries attempted".to_string());

        for attempt in 0..self.retries {
            let result = async {
                let mut stream = TcpStream::connect(self.server_addr())
                    .await
                    .map_err(|e| TransportError::Connect(e.to_string()))?;

                stream
                    .write_all(&(wire.len() as u16).to_be_bytes())
                    .await
                    .map_err(|e| TransportError::Io(e.to_string()))?;
                stream
                    .write_all(wire)
                    .await
                    .map_err(|e| TransportError::Io(e.to_string()))?;
                stream
                    .flush()
                    .await
                    .map_err(|e| TransportError::Io(e.to_string()))?;

                let mut length_buf = [0u8; 2];
                stream
                    .read_exact(&mut length_buf)
                    .await
                    .map_err(|e| TransportError::Io(e.to_string()))?;

                let mut buf = vec![0u8; u16::from_be_bytes(length_buf) as usize];
                stream
                    .read_exact(&mut buf)
                    .await
                    .map_err(|e| TransportError::Io(e.to_string()))?;

                Ok::<_, TransportError>(buf)
            };

            match timeout(self.timeout, result).await {
                Ok(Ok(reply)) => return Ok(reply),
                Ok(Err(err)) => last_err = err,
                Err(_) => last_err = TransportError::Timeout,
            }

            debug!(
                server = %self.describe(),
                attempt = attempt + 1,
                "TCP exchange failed, {}",
                last_err
            );
        }

        Err(last_err)
    }

    fn classify_transport(&self, err: TransportError, started: Instant) -> Failure<NsQueryError> {
        let message = format!("cannot send query to {}: {}", self.describe(), err);

        let kind = match self.protocol {
            Protocol::Udp => NsQueryError::NoReply,
            Protocol::Tcp => {
                /* a deadline that ran its course is a timeout, anything
                 * quicker failed to connect */
                let deadline = self.timeout * u32::from(self.retries);
                if matches!(err, TransportError::Timeout) || started.elapsed() >= deadline {
                    NsQueryError::To
                } else {
                    NsQueryError::Econ
                }
            }
        };

        Failure::new(kind, message)
    }

    /// Log the endpoint before a query, mirroring the test-log layout
    /// the platform's operators grep for.
    pub fn log_target(&self, log: &TestLog, purpose: &str) {
        log.info(format!(
            "making DNS query to {}: {}",
            self.describe(),
            purpose
        ));
    }

    /// Resolve a host through the configured (caching) resolver. Both
    /// address families are queried; only addresses of enabled families
    /// are returned, deduplicated and sorted.
    pub async fn resolve_host(
        &self,
        host: &str,
        ipv4_enabled: bool,
        ipv6_enabled: bool,
        log: &TestLog,
    ) -> Result<Vec<String>, Failure<ResolverError>> {
        let mut ips: Vec<String> = Vec::new();

        let families = [
            ("IPv4", DNSResourceType::A, ipv4_enabled),
            ("IPv6", DNSResourceType::AAAA, ipv6_enabled),
        ];

        for (family, rtype, enabled) in families {
            let (reply, _) = self
                .query(host, rtype, QueryFlags::RD)
                .await
                .map_err(|err| {
                    Failure::new(
                        ResolverError::NoReply,
                        format!(
                            "cannot resolve host \"{}\" to {} address: {}",
                            host, family, err
                        ),
                    )
                })?;

            log_packet(log, &reply);

            let rcode = reply.rcode();
            if rcode != 0 {
                let kind = match rcode {
                    2 => ResolverError::ServFail,
                    3 => ResolverError::NxDomain,
                    _ => ResolverError::Catchall,
                };

                return Err(Failure::new(
                    kind,
                    format!("expected NOERROR got {}", crate::dns::rcode_to_str(rcode)),
                ));
            }

            if enabled {
                for rr in reply.rr_list_by_type(rtype, Section::Answer) {
                    if let Some(address) = rr.address() {
                        ips.push(address);
                    }
                }
            }
        }

        ips.sort();
        ips.dedup();

        Ok(ips)
    }

    /// Fetch and parse the zone's DNSKEY set via the validating local
    /// resolver; the AD bit of the reply is the trust signal.
    pub async fn get_dnskeys(
        &self,
        rsmhost: &str,
        log: &TestLog,
    ) -> Result<Vec<ZoneKey>, Failure<DnsKeysError>> {
        self.log_target(log, "get DNSKEY records");

        let (reply, _) = self
            .query(rsmhost, DNSResourceType::DNSKEY, QueryFlags::RD_AD)
            .await
            .map_err(|err| {
                Failure::new(DnsKeysError::NoReply, format!("cannot connect: {}", err))
            })?;

        log_packet(log, &reply);

        if !reply.header.ad {
            return Err(Failure::new(
                DnsKeysError::NoAdBit,
                "ad flag not present in the answer",
            ));
        }

        let rcode = reply.rcode();
        if rcode != 0 {
            let kind = match rcode {
                3 => DnsKeysError::NxDomain,
                _ => DnsKeysError::Catchall,
            };

            return Err(Failure::new(
                kind,
                format!("expected NOERROR got {}", crate::dns::rcode_to_str(rcode)),
            ));
        }

        let owner = crate::dns::labels_from_str(rsmhost);
        let records = reply.rr_list_by_name_and_type(&owner, DNSResourceType::DNSKEY, Section::Answer);

        if records.is_empty() {
            return Err(Failure::new(
                DnsKeysError::NoKeys,
                "no DNSKEY records found in reply",
            ));
        }

        let mut keys = Vec::with_capacity(records.len());
        for rr in records {
            let data = rr.dnskey().map_err(|err| {
                Failure::new(
                    DnsKeysError::Internal,
                    format!("cannot parse DNSKEY record: {}", err),
                )
            })?;
            keys.push(ZoneKey::new(data));
        }

        Ok(keys)
    }

    /// `SOA .` connectivity probe used by the probe-status and
    /// resolver-status checks.
    pub async fn check_conn(
        &self,
        flags: ConnCheck,
        reply_ms: u32,
        log: &TestLog,
    ) -> Result<(), String> {
        let query_flags = if flags.recursive {
            QueryFlags::RD
        } else {
            QueryFlags::NONE
        };

        let (reply, rtt) = self
            .query(".", DNSResourceType::SOA, query_flags)
            .await
            .map_err(|_| "cannot connect to host".to_string())?;

        log_packet(log, &reply);

        if !reply.section_has_rr_type(DNSResourceType::SOA, Section::Answer) {
            return Err("no SOA records found".to_string());
        }

        if flags.require_rrsigs
            && !reply.section_has_rr_type(DNSResourceType::RRSIG, Section::Answer)
        {
            return Err("no RRSIG records found".to_string());
        }

        if flags.check_rtt && rtt > reply_ms {
            return Err(format!("query RTT {} over limit ({})", rtt, reply_ms));
        }

        Ok(())
    }
}

/// Which conditions a `SOA .` connectivity probe enforces.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnCheck {
    pub require_rrsigs: bool,
    pub check_rtt: bool,
    pub recursive: bool,
}

#[derive(Debug, Clone)]
enum TransportError {
    Timeout,
    Connect(String),
    Io(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timed out"),
            Self::Connect(msg) => write!(f, "connection failed: {}", msg),
            Self::Io(msg) => write!(f, "{}", msg),
        }
    }
}

fn classify_parse_error(err: &ParseError) -> NsQueryError {
    match err {
        ParseError::IncompleteHeader => NsQueryError::IncHeader,
        ParseError::IncompleteQuestion => NsQueryError::IncQuestion,
        ParseError::IncompleteAnswer => NsQueryError::IncAnswer,
        ParseError::IncompleteAuthority => NsQueryError::IncAuthority,
        ParseError::IncompleteAdditional => NsQueryError::IncAdditional,
        ParseError::InvalidLabel | ParseError::Malformed(_) => NsQueryError::Catchall,
    }
}

/// Compact reply summary for the test log.
pub fn log_packet(log: &TestLog, pkt: &DNSPacket) {
    let question = pkt
        .questions
        .first()
        .map(|q| format!("{} {:?}", q.owner(), q.qtype))
        .unwrap_or_else(|| "<no question>".to_string());

    log.info(format!(
        "reply: {}, rcode:{} aa:{} ad:{} qd:{} an:{} ns:{} ar:{}",
        question,
        crate::dns::rcode_to_str(pkt.rcode()),
        pkt.header.aa as u8,
        pkt.header.ad as u8,
        pkt.questions.len(),
        pkt.answers.len(),
        pkt.authorities.len(),
        pkt.additionals.len()
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_ip_against_enabled_families() {
        assert!(validate_ip("192.0.2.1", true, false).is_some());
        assert!(validate_ip("192.0.2.1", false, true).is_none());
        assert!(validate_ip("2001:db8::1", false, true).is_some());
        assert!(validate_ip("2001:db8::1", true, false).is_none());
        assert!(validate_ip("not-an-ip", true, true).is_none());
    }

    #[test]
    fn rejects_unsupported_resolver_ip() {
        let result = Resolver::new(
            "resolver",
            "2001:db8::53",
            53,
            Protocol::Udp,
            true,
            false,
            false,
            3,
            1,
        );

        assert!(result.is_err());
    }

    #[test]
    fn retarget_swaps_endpoint() {
        let mut resolver = Resolver::new(
            "resolver",
            "192.0.2.53",
            53,
            Protocol::Udp,
            true,
            true,
            false,
            3,
            1,
        )
        .unwrap();

        resolver.retarget("ns1.example", "2001:db8::1", 5353, true, true).unwrap();
        assert_eq!(resolver.describe(), "ns1.example (2001:db8::1:5353)");
    }
}
