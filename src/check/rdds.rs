//! RDDS43 (port-43 WHOIS) and RDDS80 (Web-WHOIS) tests.

use std::time::{Duration, Instant};

use rand::Rng;
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::state::ProbeStateStore;
use super::subtest_result;
use crate::constants::{
    DEFAULT_RDDS43_PORT, DEFAULT_RESOLVER_PORT, HOST_BUF_SIZE, RESPONSE_PREVIEW_SIZE, TCP_RETRY,
    TCP_TIMEOUT,
};
use crate::errcode::{
    resolver_error_to_rdds43, resolver_error_to_rdds80, RDDS43_ECON, RDDS43_EMPTY, RDDS43_NONS,
    RDDS43_TO, RDDS43_INTERNAL_IP_UNSUP, RDDS80_INTERNAL_GENERAL, RDDS80_INTERNAL_IP_UNSUP,
    RSM_NO_VALUE, WebInterface,
};
use crate::error::{ProbeError, Result};
use crate::http::{http_test, BodyCapture};
use crate::params::host_and_port;
use crate::probelog::TestLog;
use crate::resolver::{validate_ip, Protocol, Resolver};
use crate::url::split_url;

pub struct RddsCheckParams {
    pub rsmhost: String,
    pub rdds43_server: String,
    pub rdds80_url: String,
    pub rdds43_testedname: String,
    pub rdds43_ns_string: String,
    pub probe_rdds_enabled: bool,
    pub rdds43_enabled: bool,
    pub rdds80_enabled: bool,
    pub ipv4_enabled: bool,
    pub ipv6_enabled: bool,
    pub resolver: String,
    pub rtt_limit: u32,
    pub maxredirs: u32,
}

#[derive(Serialize)]
struct Rdds43Json {
    rtt: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    upd: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    testedname: Option<String>,
    status: u32,
}

#[derive(Serialize)]
struct Rdds80Json {
    rtt: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    status: u32,
}

#[derive(Serialize)]
struct RddsJson {
    rdds43: Rdds43Json,
    rdds80: Rdds80Json,
    status: u32,
}

/// Run the RDDS test. Returns `None` (no item value) when RDDS is
/// disabled on the probe or the rsmhost.
pub async fn check_rdds(
    params: &RddsCheckParams,
    state: &dyn ProbeStateStore,
    log: &TestLog,
) -> Result<Option<serde_json::Value>> {
    let rdds_enabled = params.rdds43_enabled || params.rdds80_enabled;

    let mut server43 = None;
    if params.rdds43_enabled {
        if params.rdds43_server.is_empty() {
            return Err(ProbeError::Unsupported(
                "RDDS43 server cannot be empty".to_string(),
            ));
        }

        server43 = Some(
            host_and_port(&params.rdds43_server, ';', DEFAULT_RDDS43_PORT)
                .map_err(ProbeError::Unsupported)?,
        );
    }

    let mut url80 = None;
    if params.rdds80_enabled {
        if params.rdds80_url.is_empty() {
            return Err(ProbeError::Unsupported(
                "RDDS80 URL cannot be empty".to_string(),
            ));
        }

        let url = split_url(&params.rdds80_url)
            .map_err(|err| ProbeError::Unsupported(format!("\"{}\": {}", params.rdds80_url, err)))?;
        url80 = Some(url);
    }

    let (resolver_ip, resolver_port) =
        host_and_port(&params.resolver, ';', DEFAULT_RESOLVER_PORT)
            .map_err(ProbeError::Unsupported)?;

    /* one resolver serves both RDDS43 and RDDS80 */
    let resolver = Resolver::new(
        "resolver",
        &resolver_ip,
        resolver_port,
        Protocol::Tcp,
        params.ipv4_enabled,
        params.ipv6_enabled,
        false,
        TCP_TIMEOUT,
        TCP_RETRY,
    )
    .map_err(|err| ProbeError::Unsupported(format!("cannot create resolver: {}", err)))?;

    log.start_test();

    if !params.probe_rdds_enabled {
        log.info("RDDS disabled on this probe");
        log.end_test();
        return Ok(None);
    }

    if !rdds_enabled {
        log.info("RDDS disabled on this RSM host");
        log.end_test();
        return Ok(None);
    }

    let mut rtt43 = RSM_NO_VALUE;
    let mut ip43 = None;
    let mut rtt80 = RSM_NO_VALUE;
    let mut ip80 = None;

    if let Some((server, port)) = &server43 {
        (rtt43, ip43) = rdds43_test(params, server, *port, &resolver, log).await;
    }

    if params.rdds80_enabled {
        let url = url80.as_ref().expect("URL was split above");
        (rtt80, ip80) = rdds80_test(params, url, &resolver, log).await;
    }

    let rdds43_status = subtest_result(rtt43, params.rtt_limit, state);
    let rdds80_status = subtest_result(rtt80, params.rtt_limit, state);

    let json = RddsJson {
        rdds43: Rdds43Json {
            rtt: rtt43,
            ip: ip43,
            upd: None,
            target: server43.as_ref().map(|(host, _)| host.clone()),
            testedname: (!params.rdds43_testedname.is_empty())
                .then(|| params.rdds43_testedname.clone()),
            status: rdds43_status as u32,
        },
        rdds80: Rdds80Json {
            rtt: rtt80,
            ip: ip80,
            target: (!params.rdds80_url.is_empty()).then(|| params.rdds80_url.clone()),
            status: rdds80_status as u32,
        },
        status: (rdds43_status && rdds80_status) as u32,
    };

    let value = serde_json::to_value(&json).expect("result encoding cannot fail");
    log.info(value.to_string());
    log.end_test();

    Ok(Some(value))
}

async fn rdds43_test(
    params: &RddsCheckParams,
    server: &str,
    port: u16,
    resolver: &Resolver,
    log: &TestLog,
) -> (i32, Option<String>) {
    let ips = match resolver
        .resolve_host(server, params.ipv4_enabled, params.ipv6_enabled, log)
        .await
    {
        Ok(ips) => ips,
        Err(err) => {
            log.err(format!("RDDS43 \"{}\": {}", server, err.message));
            return (resolver_error_to_rdds43(err.kind), None);
        }
    };

    if ips.is_empty() {
        log.err(format!(
            "RDDS43 \"{}\": IP address(es) of host not supported by the Probe",
            server
        ));
        return (RDDS43_INTERNAL_IP_UNSUP, None);
    }

    let ip = ips[rand::rng().random_range(0..ips.len())].clone();

    log.info(format!(
        "start RDDS43 test (ip {}, request \"{}\", expected NS string \"{}\")",
        ip, params.rdds43_testedname, params.rdds43_ns_string
    ));

    let (answer, rtt) = match rdds43_exchange(&params.rdds43_testedname, &ip, port).await {
        Ok(ok) => ok,
        Err((code, message)) => {
            log.err(format!(
                "RDDS43 of \"{}\" ({}) failed: {}",
                server, ip, message
            ));
            return (code, Some(ip));
        }
    };

    let nss = extract_rdds43_nss(&answer, &params.rdds43_ns_string, log);

    if nss.is_empty() {
        log.err(format!(
            "no Name Servers found in the output of RDDS43 server \"{}\" ({}) for query \"{}\" \
             (expecting prefix \"{}\")",
            server, ip, params.rdds43_testedname, params.rdds43_ns_string
        ));
        return (RDDS43_NONS, Some(ip));
    }

    let preview: String = answer.chars().take(RESPONSE_PREVIEW_SIZE).collect();
    log.info(format!("===>\n{}\n<=== end RDDS43 test (rtt:{})", preview, rtt));

    (rtt as i32, Some(ip))
}

/// Plain TCP request/response: send `<query>\r\n`, read until EOF under
/// the deadline. The RTT is wall-clock around the whole exchange.
async fn rdds43_exchange(
    query: &str,
    ip: &str,
    port: u16,
) -> std::result::Result<(String, u32), (i32, String)> {
    let started = Instant::now();
    let deadline = Duration::from_secs(TCP_TIMEOUT);

    let exchange = async {
        let mut stream = TcpStream::connect((ip, port))
            .await
            .map_err(|err| (RDDS43_ECON, format!("cannot connect: {}", err)))?;

        stream
            .write_all(format!("{}\r\n", query).as_bytes())
            .await
            .map_err(|err| (RDDS43_ECON, format!("cannot send data: {}", err)))?;

        let mut answer = Vec::new();
        stream
            .read_to_end(&mut answer)
            .await
            .map_err(|err| (RDDS43_ECON, format!("cannot receive data: {}", err)))?;

        Ok(answer)
    };

    let answer = match timeout(deadline, exchange).await {
        Ok(Ok(answer)) => answer,
        Ok(Err(err)) => return Err(err),
        Err(_) => return Err((RDDS43_TO, "timed out".to_string())),
    };

    if answer.is_empty() {
        return Err((RDDS43_EMPTY, "empty response received".to_string()));
    }

    let rtt = started.elapsed().as_millis() as u32;

    Ok((String::from_utf8_lossy(&answer).into_owned(), rtt))
}

/// Scan the free-text WHOIS answer for `<ns_string>` prefixes and pull
/// out the host names behind them, byte-exact, deduplicated and sorted.
pub fn extract_rdds43_nss(answer: &str, ns_string: &str, log: &TestLog) -> Vec<String> {
    let mut nss: Vec<String> = Vec::new();

    let bytes = answer.as_bytes();
    let needle = ns_string.as_bytes();

    if needle.is_empty() {
        return nss;
    }

    let mut search_from = 0;
    while let Some(found) = find_case_insensitive(bytes, needle, search_from) {
        let mut pos = found + needle.len();
        search_from = pos;

        while pos < bytes.len() && (bytes[pos] == b' ' || bytes[pos] == b'\t') {
            pos += 1;
        }

        if pos >= bytes.len() || !bytes[pos].is_ascii_alphanumeric() {
            continue;
        }

        let start = pos;
        while pos < bytes.len()
            && !bytes[pos].is_ascii_whitespace()
            && pos - start < HOST_BUF_SIZE
        {
            pos += 1;
        }

        if pos - start == HOST_BUF_SIZE {
            log.err(format!(
                "RDDS internal error, NS buffer too small ({} bytes) for host in \"{}...\"",
                HOST_BUF_SIZE,
                String::from_utf8_lossy(&bytes[start..pos])
            ));
            continue;
        }

        nss.push(String::from_utf8_lossy(&bytes[start..pos]).into_owned());
    }

    nss.sort();
    nss.dedup();

    nss
}

fn find_case_insensitive(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() || from > haystack.len() - needle.len() {
        return None;
    }

    (from..=haystack.len() - needle.len())
        .find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

async fn rdds80_test(
    params: &RddsCheckParams,
    url: &crate::url::SplitUrl,
    resolver: &Resolver,
    log: &TestLog,
) -> (i32, Option<String>) {
    log.info(format!("start RDDS80 test (url {})", params.rdds80_url));

    let ips = match resolver
        .resolve_host(&url.domain, params.ipv4_enabled, params.ipv6_enabled, log)
        .await
    {
        Ok(ips) => ips,
        Err(err) => {
            log.err(format!("RDDS80 \"{}\": {}", url.domain, err.message));
            return (resolver_error_to_rdds80(err.kind), None);
        }
    };

    if ips.is_empty() {
        log.err(format!(
            "RDDS80 \"{}\": IP address(es) of host not supported by the Probe",
            params.rdds80_url
        ));
        return (RDDS80_INTERNAL_IP_UNSUP, None);
    }

    let ip = ips[rand::rng().random_range(0..ips.len())].clone();

    let Some(addr) = validate_ip(&ip, params.ipv4_enabled, params.ipv6_enabled) else {
        log.err(format!(
            "internal error, selected unsupported IP of \"{}\": \"{}\"",
            params.rdds80_url, ip
        ));
        return (RDDS80_INTERNAL_GENERAL, Some(ip));
    };

    let formed_url = if addr.is_ipv6() {
        format!("{}[{}]:{}{}", url.scheme, ip, url.port, url.path)
    } else {
        format!("{}{}:{}{}", url.scheme, ip, url.port, url.path)
    };

    log.info(format!(
        "domain \"{}\" was resolved to {}, using URL \"{}\".",
        url.domain, ip, formed_url
    ));

    let rtt = match http_test(
        &url.domain,
        &formed_url,
        TCP_TIMEOUT,
        params.maxredirs,
        BodyCapture::Discard,
    )
    .await
    {
        Ok((rtt, _)) => rtt as i32,
        Err(err) => {
            let code = WebInterface::Rdds80.http_error(err.kind);
            log.err(format!(
                "RDDS80 of \"{}\" ({}) failed: {} ({})",
                params.rdds80_url, formed_url, err.message, code
            ));
            code
        }
    };

    log.info(format!("end RDDS80 test (rtt:{})", rtt));

    (rtt, Some(ip))
}
