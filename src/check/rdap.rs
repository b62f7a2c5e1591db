//! RDAP: fetch `<base-url>/domain/<testedname>` at a resolved IP and
//! validate the JSON registration data.

use rand::Rng;
use serde::Serialize;

use super::state::ProbeStateStore;
use super::subtest_result;
use crate::constants::{DEFAULT_RESOLVER_PORT, RESPONSE_PREVIEW_SIZE, TCP_RETRY, TCP_TIMEOUT};
use crate::errcode::{
    resolver_error_to_rdap, RDAP_EJSON, RDAP_ENAME, RDAP_INTERNAL_GENERAL, RDAP_INTERNAL_IP_UNSUP,
    RDAP_NOHTTPS, RDAP_NONAME, RDAP_NOTLISTED, RSM_NO_VALUE, WebInterface,
};
use crate::error::{ProbeError, Result};
use crate::http::{http_test, BodyCapture};
use crate::params::host_and_port;
use crate::probelog::TestLog;
use crate::resolver::{validate_ip, Protocol, Resolver};
use crate::url::split_url;

pub struct RdapCheckParams {
    pub rsmhost: String,
    pub testedname: String,
    pub base_url: String,
    pub maxredirs: u32,
    pub rtt_limit: u32,
    pub tld_enabled: bool,
    pub probe_enabled: bool,
    pub ipv4_enabled: bool,
    pub ipv6_enabled: bool,
    pub resolver: String,
}

#[derive(Serialize)]
struct RdapJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    ip: Option<String>,
    rtt: i32,
    target: String,
    testedname: String,
    status: u32,
}

/// Run the RDAP test. Returns `None` (no item value) when RDAP is
/// disabled on the probe or the TLD.
pub async fn check_rdap(
    params: &RdapCheckParams,
    state: &dyn ProbeStateStore,
    log: &TestLog,
) -> Result<Option<serde_json::Value>> {
    log.start_test();

    if !params.probe_enabled {
        log.info("RDAP disabled on this probe");
        log.end_test();
        return Ok(None);
    }

    if !params.tld_enabled {
        log.info("RDAP disabled on this TLD");
        log.end_test();
        return Ok(None);
    }

    let mut rtt = RSM_NO_VALUE;
    let mut ip = None;

    /* Bootstrap Service Registry sentinels skip the test entirely */
    if params.base_url == "not listed" {
        log.err("The TLD is not listed in the Bootstrap Service Registry for Domain Name Space");
        rtt = RDAP_NOTLISTED;
    } else if params.base_url == "no https" {
        log.err(
            "The RDAP base URL obtained from Bootstrap Service Registry for Domain Name Space \
             does not use HTTPS",
        );
        rtt = RDAP_NOHTTPS;
    } else {
        (rtt, ip) = rdap_test(params, log).await?;
    }

    let status = subtest_result(rtt, params.rtt_limit, state);

    let json = RdapJson {
        ip,
        rtt,
        target: params.base_url.clone(),
        testedname: params.testedname.clone(),
        status: status as u32,
    };

    let value = serde_json::to_value(&json).expect("result encoding cannot fail");
    log.info(value.to_string());
    log.end_test();

    Ok(Some(value))
}

async fn rdap_test(
    params: &RdapCheckParams,
    log: &TestLog,
) -> Result<(i32, Option<String>)> {
    let url = split_url(&params.base_url)
        .map_err(|err| ProbeError::Unsupported(format!("\"{}\": {}", params.base_url, err)))?;

    let (resolver_ip, resolver_port) =
        host_and_port(&params.resolver, ';', DEFAULT_RESOLVER_PORT)
            .map_err(ProbeError::Unsupported)?;

    let resolver = Resolver::new(
        "resolver",
        &resolver_ip,
        resolver_port,
        Protocol::Tcp,
        params.ipv4_enabled,
        params.ipv6_enabled,
        true,
        TCP_TIMEOUT,
        TCP_RETRY,
    )
    .map_err(|err| ProbeError::Unsupported(format!("cannot create resolver: {}", err)))?;

    let ips = match resolver
        .resolve_host(&url.domain, params.ipv4_enabled, params.ipv6_enabled, log)
        .await
    {
        Ok(ips) => ips,
        Err(err) => {
            log.err(format!("trying to resolve \"{}\": {}", url.domain, err.message));
            return Ok((resolver_error_to_rdap(err.kind), None));
        }
    };

    if ips.is_empty() {
        log.err(format!(
            "IP address(es) of host \"{}\" are not supported on this Probe",
            url.domain
        ));
        return Ok((RDAP_INTERNAL_IP_UNSUP, None));
    }

    let ip = ips[rand::rng().random_range(0..ips.len())].clone();

    let Some(addr) = validate_ip(&ip, params.ipv4_enabled, params.ipv6_enabled) else {
        log.err(format!(
            "internal error, selected unsupported IP of \"{}\": \"{}\"",
            url.domain, ip
        ));
        return Ok((RDAP_INTERNAL_GENERAL, Some(ip)));
    };

    let query = if url.path.ends_with('/') {
        "domain"
    } else {
        "/domain"
    };

    let formed_url = if addr.is_ipv6() {
        format!(
            "{}[{}]:{}{}{}/{}",
            url.scheme, ip, url.port, url.path, query, params.testedname
        )
    } else {
        format!(
            "{}{}:{}{}{}/{}",
            url.scheme, ip, url.port, url.path, query, params.testedname
        )
    };

    log.info(format!(
        "domain \"{}\" was resolved to {}, using URL \"{}\".",
        url.domain, ip, formed_url
    ));

    let failure = match http_test(
        &url.domain,
        &formed_url,
        TCP_TIMEOUT,
        params.maxredirs,
        BodyCapture::Capture,
    )
    .await
    {
        Ok((rtt, body)) => {
            let body = body.unwrap_or_default();
            let preview = String::from_utf8_lossy(&body);
            let preview: String = preview.chars().take(RESPONSE_PREVIEW_SIZE).collect();
            log.info(format!("got response ===>\n{}\n<===", preview));

            match parse_rdap_body(&body, &params.testedname) {
                Ok(()) => {
                    log.info(format!(
                        "end test of \"{}\" ({}) (rtt:{})",
                        params.base_url, ip, rtt
                    ));
                    return Ok((rtt as i32, Some(ip)));
                }
                Err(code) => {
                    let reason = match code {
                        RDAP_EJSON => "invalid JSON format in response",
                        RDAP_NONAME => "ldhName member not found in response",
                        _ => "ldhName member doesn't match query in response",
                    };
                    log.err(format!("{} of \"{}\" ({})", reason, params.base_url, ip));
                    return Ok((code, Some(ip)));
                }
            }
        }
        Err(err) => err,
    };

    let code = WebInterface::Rdap.http_error(failure.kind);
    log.err(format!(
        "test of \"{}\" ({}) failed: {} ({})",
        params.base_url, formed_url, failure.message, code
    ));

    Ok((code, Some(ip)))
}

/// Response body checks: parsable JSON object whose top-level `ldhName`
/// matches the tested name exactly.
fn parse_rdap_body(body: &[u8], testedname: &str) -> std::result::Result<(), i32> {
    if body.is_empty() {
        return Err(RDAP_EJSON);
    }

    let value: serde_json::Value = serde_json::from_slice(body).map_err(|_| RDAP_EJSON)?;

    let ldh_name = value.get("ldhName").ok_or(RDAP_NONAME)?;

    match ldh_name.as_str() {
        Some(name) if name == testedname => Ok(()),
        _ => Err(RDAP_ENAME),
    }
}
