//! The authoritative DNS test: one NXDOMAIN probe against every
//! (name server, IP) endpoint, DNSSEC chain checks, aggregation into
//! the per-NS and rsmhost-level verdicts, and the critical-mode update.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::mode::{choose_protocol, update_mode, ModeStore};
use super::state::ProbeStateStore;
use super::subtest_result;
use crate::constants::{
    DEFAULT_NAMESERVER_PORT, DEFAULT_RESOLVER_PORT, EDNS_NSID, EDNS_UDP_SIZE, TCP_RETRY,
    TCP_TIMEOUT, UDP_RETRY, UDP_TIMEOUT,
};
use crate::dns::{DNSPacket, DNSResourceType, EdnsOpt};
use crate::dnssec::{check_dnssec, verify_rr_class, ZoneKey};
use crate::errcode::is_dnssec_ec;
use crate::error::{NsAnswerError, NsQueryError, ProbeError, Result};
use crate::params::{host_and_port, minns_from_expr, parse_nameservers, NameServer};
use crate::probelog::TestLog;
use crate::resolver::{log_packet, Protocol, QueryFlags, Resolver};

pub struct DnsCheckParams {
    pub rsmhost: String,
    pub testprefix: String,
    pub name_servers: String,
    pub dnssec_enabled: bool,
    pub udp_enabled: bool,
    pub tcp_enabled: bool,
    pub ipv4_enabled: bool,
    pub ipv6_enabled: bool,
    pub resolver: String,
    pub udp_rtt_limit: u32,
    pub tcp_rtt_limit: u32,
    pub tcp_ratio: u32,
    pub test_recover_udp: u32,
    pub test_recover_tcp: u32,
    pub minns_value: String,
}

/// Scheduling context the host platform owns; only used as protocol
/// selection noise.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleContext {
    pub hostid: u64,
    pub itemid: u64,
    pub nextcheck: i64,
}

/// Status of one name server minding all its endpoints.
///
/// value | DNS status | DNSSEC status
/// ------|------------|--------------
///  0    | Old Down   |
///  1    | Old Up     |
///  2    | Down       | Disabled
///  3    | Down       | Down
///  4    | Down       | Up
///  5    | Up         | Disabled
///  6    | Up         | Up
///
/// 0 and 1 predate the DNSSEC-aware values and are kept for backward
/// compatibility; nothing emits them anymore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NsStatus {
    OldDown,
    OldUp,
    DownDnssecOff,
    DownDnssecDown,
    DownDnssecUp,
    UpDnssecOff,
    UpDnssecUp,
}

impl NsStatus {
    pub fn as_u8(self) -> u8 {
        match self {
            NsStatus::OldDown => 0,
            NsStatus::OldUp => 1,
            NsStatus::DownDnssecOff => 2,
            NsStatus::DownDnssecDown => 3,
            NsStatus::DownDnssecUp => 4,
            NsStatus::UpDnssecOff => 5,
            NsStatus::UpDnssecUp => 6,
        }
    }
}

#[derive(Debug, Clone)]
struct EndpointResult {
    ip: String,
    rtt: i32,
    nsid: Option<String>,
}

#[derive(Serialize)]
struct NsIpJson {
    ns: String,
    ip: String,
    nsid: Option<String>,
    protocol: &'static str,
    rtt: i32,
}

#[derive(Serialize)]
struct NsJson {
    ns: String,
    status: u8,
}

#[derive(Serialize)]
struct DnsJson {
    nsips: Vec<NsIpJson>,
    nss: Vec<NsJson>,
    mode: u32,
    status: u32,
    protocol: u32,
    testedname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    dnssecstatus: Option<u32>,
}

pub async fn check_dns(
    params: &DnsCheckParams,
    schedule: ScheduleContext,
    mode_store: &ModeStore,
    state: &dyn ProbeStateStore,
    log: &TestLog,
) -> Result<serde_json::Value> {
    let minns = minns_from_expr(schedule.nextcheck, &params.minns_value)
        .map_err(ProbeError::Unsupported)?;

    let file_exists = mode_store.exists(&params.rsmhost);
    let (mut mode, mut successful_tests) = mode_store
        .read(&params.rsmhost)
        .map_err(ProbeError::Unsupported)?;

    let protocol = choose_protocol(
        params.udp_enabled,
        params.tcp_enabled,
        mode,
        schedule.nextcheck,
        schedule.hostid,
        schedule.itemid,
        params.tcp_ratio,
    );

    let (rtt_limit, test_recover) = match protocol {
        Protocol::Udp => (params.udp_rtt_limit, params.test_recover_udp),
        Protocol::Tcp => (params.tcp_rtt_limit, params.test_recover_tcp),
    };

    log.start_test();
    log.info(format!(
        "DNSSEC:{}, UDP:{}, TCP:{}, IPv4:{}, IPv6:{}, mode:{}, protocol:{}, rtt_limit:{}, \
         tcp_ratio:{}, minns:{}, testprefix:{}",
        enabled(params.dnssec_enabled),
        enabled(params.udp_enabled),
        enabled(params.tcp_enabled),
        enabled(params.ipv4_enabled),
        enabled(params.ipv6_enabled),
        if mode.is_critical() { "critical" } else { "normal" },
        protocol.as_str(),
        rtt_limit,
        params.tcp_ratio,
        minns,
        params.testprefix
    ));

    if mode.is_critical() {
        log.info(format!(
            "critical test mode details: successful:{}, required:{}",
            successful_tests, test_recover
        ));
    }

    let (resolver_ip, resolver_port) =
        host_and_port(&params.resolver, ';', DEFAULT_RESOLVER_PORT)
            .map_err(ProbeError::Unsupported)?;

    let (timeout_s, retries) = match protocol {
        Protocol::Udp => (UDP_TIMEOUT, UDP_RETRY),
        Protocol::Tcp => (TCP_TIMEOUT, TCP_RETRY),
    };

    let resolver = Resolver::new(
        "resolver",
        &resolver_ip,
        resolver_port,
        protocol,
        params.ipv4_enabled,
        params.ipv6_enabled,
        params.dnssec_enabled,
        timeout_s,
        retries,
    )
    .map_err(|err| ProbeError::Unsupported(format!("cannot create resolver: {}", err)))?;

    let nss = parse_nameservers(
        &params.name_servers,
        params.ipv4_enabled,
        params.ipv6_enabled,
        DEFAULT_NAMESERVER_PORT,
        log,
    )
    .map_err(ProbeError::Unsupported)?;

    if nss.is_empty() {
        return Err(ProbeError::Unsupported(
            "nothing to do, no Name Servers to test".to_string(),
        ));
    }

    let testedname = if params.rsmhost == "." {
        format!("{}.", params.testprefix)
    } else {
        format!("{}.{}.", params.testprefix, params.rsmhost)
    };

    let mut dnskeys = None;
    let mut dnskeys_failed_code = None;

    if params.dnssec_enabled {
        print_ds_records(&resolver, &params.rsmhost, log).await;

        match resolver.get_dnskeys(&params.rsmhost, log).await {
            Ok(keys) => dnskeys = Some(Arc::new(keys)),
            Err(err) => {
                log.err(&err.message);
                dnskeys_failed_code = Some(protocol.interface().dnskeys_error(err.kind));
            }
        }
    }

    let results = match dnskeys_failed_code {
        Some(code) => nss
            .iter()
            .map(|ns| {
                ns.endpoints
                    .iter()
                    .map(|ep| EndpointResult {
                        ip: ep.ip.clone(),
                        rtt: code,
                        nsid: None,
                    })
                    .collect()
            })
            .collect(),
        None => {
            test_nameservers(
                &nss,
                protocol,
                dnskeys.clone(),
                &testedname,
                params.ipv4_enabled,
                params.ipv6_enabled,
                log,
            )
            .await
        }
    };

    /* aggregate per-NS and rsmhost-level statuses */
    let mut nsips = Vec::new();
    let mut ns_statuses = Vec::new();
    let mut dns_nssok = 0u32;
    let mut dnssec_nssok = 0u32;

    for (ns, endpoints) in nss.iter().zip(&results) {
        let mut dns_ok = true;
        let mut dnssec_ok = true;

        for ep in endpoints {
            if !subtest_result(ep.rtt, rtt_limit, state) {
                /* one failing endpoint takes the whole name server down */
                dns_ok = false;
            }

            if params.dnssec_enabled && is_dnssec_ec(ep.rtt) {
                dnssec_ok = false;
            }

            nsips.push(NsIpJson {
                ns: ns.name.clone(),
                ip: ep.ip.clone(),
                nsid: ep.nsid.clone(),
                protocol: match protocol {
                    Protocol::Udp => "udp",
                    Protocol::Tcp => "tcp",
                },
                rtt: ep.rtt,
            });
        }

        let status = match (dns_ok, params.dnssec_enabled, dnssec_ok) {
            (false, false, _) => NsStatus::DownDnssecOff,
            (false, true, false) => NsStatus::DownDnssecDown,
            (false, true, true) => NsStatus::DownDnssecUp,
            (true, false, _) => NsStatus::UpDnssecOff,
            (true, true, _) => NsStatus::UpDnssecUp,
        };

        if dns_ok {
            dns_nssok += 1;
        }

        if params.dnssec_enabled {
            if dnssec_ok {
                dnssec_nssok += 1;
            } else {
                log.info(format!("{}: DNSSEC error", ns.name));
            }
        }

        ns_statuses.push(NsJson {
            ns: ns.name.clone(),
            status: status.as_u8(),
        });
    }

    let dns_status = dns_nssok >= minns;
    let dnssec_status = params.dnssec_enabled.then(|| dnssec_nssok >= minns);

    if let Err(err) = update_mode(
        mode_store,
        &params.rsmhost,
        file_exists,
        dns_status,
        test_recover,
        protocol,
        &mut mode,
        &mut successful_tests,
        log,
    ) {
        log.err(format!("internal error: {}", err));
    }

    let json = DnsJson {
        nsips,
        nss: ns_statuses,
        mode: mode.as_u32(),
        status: dns_status as u32,
        protocol: match protocol {
            Protocol::Udp => 0,
            Protocol::Tcp => 1,
        },
        testedname,
        dnssecstatus: dnssec_status.map(u32::from),
    };

    let value = serde_json::to_value(&json).expect("result encoding cannot fail");
    log.info(value.to_string());
    log.end_test();

    Ok(value)
}

fn enabled(flag: bool) -> &'static str {
    if flag { "enabled" } else { "disabled" }
}

/// Log the rsmhost's DS records. Purely diagnostic, failures are only
/// warnings.
async fn print_ds_records(resolver: &Resolver, rsmhost: &str, log: &TestLog) {
    resolver.log_target(log, "print DS records");

    match resolver.query(rsmhost, DNSResourceType::DS, QueryFlags::RD).await {
        Ok((reply, _)) => {
            log_packet(log, &reply);

            let rcode = reply.rcode();
            if rcode != 0 {
                log.warn(format!(
                    "expected NOERROR got {}",
                    crate::dns::rcode_to_str(rcode)
                ));
            }
        }
        Err(err) => log.warn(format!("cannot connect: {}", err)),
    }
}

/// Fan the endpoints out to one task each and collect their results and
/// log blocks. Every worker owns its resolver socket; logs are appended
/// only after the owning worker completed, in spawn order.
async fn test_nameservers(
    nss: &[NameServer],
    protocol: Protocol,
    dnskeys: Option<Arc<Vec<ZoneKey>>>,
    testedname: &str,
    ipv4_enabled: bool,
    ipv6_enabled: bool,
    log: &TestLog,
) -> Vec<Vec<EndpointResult>> {
    let mut workers = Vec::new();
    let mut tasks = Vec::new();

    for (i, ns) in nss.iter().enumerate() {
        for (j, ep) in ns.endpoints.iter().enumerate() {
            let worker_log = TestLog::buffer();

            tasks.push(tokio::spawn(test_nameserver(
                ns.name.clone(),
                ep.ip.clone(),
                ep.port,
                protocol,
                dnskeys.clone(),
                testedname.to_string(),
                ipv4_enabled,
                ipv6_enabled,
                worker_log.clone(),
            )));
            workers.push((i, j, worker_log));
        }
    }

    let mut results: Vec<Vec<EndpointResult>> = nss
        .iter()
        .map(|ns| {
            ns.endpoints
                .iter()
                .map(|ep| EndpointResult {
                    ip: ep.ip.clone(),
                    rtt: protocol.interface().ns_query_error(NsQueryError::Internal),
                    nsid: None,
                })
                .collect()
        })
        .collect();

    let outcomes = futures::future::join_all(tasks).await;

    for ((i, j, worker_log), outcome) in workers.into_iter().zip(outcomes) {
        log.dump(&worker_log.take());

        match outcome {
            Ok((rtt, nsid)) => {
                results[i][j].rtt = rtt;
                results[i][j].nsid = nsid;
            }
            Err(err) => {
                /* a worker that died keeps the internal code */
                log.err(format!("test task failed: {}", err));
            }
        }
    }

    debug!("all {} endpoint tests collected", results.iter().map(Vec::len).sum::<usize>());

    results
}

/// One test against one endpoint. Returns the RTT in milliseconds or
/// the mapped negative code, plus the NSID the server reported.
#[allow(clippy::too_many_arguments)]
async fn test_nameserver(
    ns: String,
    ip: String,
    port: u16,
    protocol: Protocol,
    dnskeys: Option<Arc<Vec<ZoneKey>>>,
    testedname: String,
    ipv4_enabled: bool,
    ipv6_enabled: bool,
    log: TestLog,
) -> (i32, Option<String>) {
    let iface = protocol.interface();

    let (timeout_s, retries) = match protocol {
        Protocol::Udp => (UDP_TIMEOUT, UDP_RETRY),
        Protocol::Tcp => (TCP_TIMEOUT, TCP_RETRY),
    };

    let resolver = match Resolver::new(
        &ns,
        &ip,
        port,
        protocol,
        ipv4_enabled,
        ipv6_enabled,
        dnskeys.is_some(),
        timeout_s,
        retries,
    ) {
        Ok(resolver) => resolver,
        Err(err) => {
            log.err(&err);
            return (iface.ns_query_error(NsQueryError::Internal), None);
        }
    };

    resolver.log_target(&log, "query a non-existent domain");

    /* IN A query with an empty NSID option; DO set iff DNSSEC is on */
    let mut query = DNSPacket::query(rand::random(), &testedname, DNSResourceType::A);
    let mut opt = EdnsOpt::with_payload_size(EDNS_UDP_SIZE);
    opt.set_do_flag(dnskeys.is_some());
    opt.add_option(EDNS_NSID, Vec::new());
    query.add_edns(opt);

    let (reply, rtt) = match resolver.send(&query).await {
        Ok(ok) => ok,
        Err(err) => {
            log.err(&err.message);
            return (iface.ns_query_error(err.kind), None);
        }
    };

    let nsid = reply.edns_opt().and_then(|opt| opt.nsid_hex());

    log_packet(&log, &reply);

    if let Err(err) = verify_rr_class(&reply) {
        log.err(&err.message);
        return (iface.rr_class_error(err.kind), nsid);
    }

    /* only NOERROR and NXDOMAIN are acceptable for the tested name */
    let rcode = reply.rcode();
    if rcode != 0 && rcode != 3 {
        log.err(format!(
            "expected NXDOMAIN got {}",
            crate::dns::rcode_to_str(rcode)
        ));
        return (iface.rcode_not_nxdomain(rcode), nsid);
    }

    if !reply.header.aa {
        log.err("aa flag is not present in the answer");
        return (iface.ns_answer_error(NsAnswerError::NoAaFlag), nsid);
    }

    match reply
        .questions
        .iter()
        .find(|q| q.qtype == DNSResourceType::A)
    {
        None => {
            log.err("no A record in QUESTION section");
            return (iface.ns_answer_error(NsAnswerError::NoDomain), nsid);
        }
        Some(question) => {
            let owner = question.owner();
            if !owner.eq_ignore_ascii_case(&testedname) {
                log.err(format!(
                    "A RR owner \"{}\" does not match expected \"{}\"",
                    owner, testedname
                ));
                return (iface.ns_answer_error(NsAnswerError::NoDomain), nsid);
            }
        }
    }

    if let Some(dnskeys) = &dnskeys {
        let now = chrono::Utc::now().timestamp() as u32;

        if let Err(err) = check_dnssec(&reply, dnskeys, &ns, &ip, now) {
            log.err(&err.message);
            return (iface.dnssec_error(err.kind), nsid);
        }
    }

    log.info(format!(
        "\"{}\" ({}) RTT:{} NSID:{}",
        ns,
        ip,
        rtt,
        nsid.as_deref().unwrap_or("(null)")
    ));

    (rtt as i32, nsid)
}
