//! Automatic probe-status check: a quorum of root servers per enabled
//! IP family must answer a DNSSEC `SOA .` query within the RTT limit,
//! and a freshly recovered probe stays reported offline until it has
//! been healthy for `online_delay` seconds.

use super::state::ProbeStateStore;
use crate::constants::{DEFAULT_RESOLVER_PORT, UDP_RETRY, UDP_TIMEOUT};
use crate::errcode::{PROBE_OFFLINE, PROBE_ONLINE, PROBE_UNSUPPORTED};
use crate::error::{ProbeError, Result};
use crate::params::{strings_from_list, validate_host_list};
use crate::probelog::TestLog;
use crate::resolver::{ConnCheck, Protocol, Resolver};

pub struct ProbeCheckParams {
    pub check_mode: String,
    pub ipv4_enabled: bool,
    pub ipv6_enabled: bool,
    pub ipv4_rootservers: String,
    pub ipv6_rootservers: String,
    pub ipv4_min_servers: u32,
    pub ipv6_min_servers: u32,
    pub ipv4_reply_ms: u32,
    pub ipv6_reply_ms: u32,
    pub online_delay: u32,
}

pub async fn check_probe_status(
    params: &ProbeCheckParams,
    state: &dyn ProbeStateStore,
    now: i64,
    log: &TestLog,
) -> Result<i32> {
    log.start_test();

    let result = run_check(params, log).await;

    let status = match &result {
        Ok(status) => *status,
        Err(err) => {
            log.err(err.to_string());
            PROBE_UNSUPPORTED
        }
    };

    let reported = apply_online_delay(status, params.online_delay, state, now, log);

    log.end_test();

    result.map(|_| reported)
}

async fn run_check(params: &ProbeCheckParams, log: &TestLog) -> Result<i32> {
    if params.check_mode != "automatic" {
        return Err(ProbeError::Unsupported(
            "first parameter has to be \"automatic\"".to_string(),
        ));
    }

    log.info(format!(
        "IPv4:{} IPv6:{}",
        if params.ipv4_enabled { "ENABLED" } else { "DISABLED" },
        if params.ipv6_enabled { "ENABLED" } else { "DISABLED" }
    ));

    let families = [
        (
            "IPv4",
            params.ipv4_enabled,
            &params.ipv4_rootservers,
            params.ipv4_min_servers,
            params.ipv4_reply_ms,
        ),
        (
            "IPv6",
            params.ipv6_enabled,
            &params.ipv6_rootservers,
            params.ipv6_min_servers,
            params.ipv6_reply_ms,
        ),
    ];

    for (family, enabled, rootservers, min_servers, reply_ms) in families {
        if !enabled {
            continue;
        }

        if let Some(c) = validate_host_list(rootservers, ',') {
            return Err(ProbeError::Unsupported(format!(
                "invalid character in {} root servers list: {}",
                family, c
            )));
        }

        let ips = strings_from_list(rootservers, ',');
        let mut ok_servers = 0;

        for ip in &ips {
            let resolver = Resolver::new(
                "root server",
                ip,
                DEFAULT_RESOLVER_PORT,
                Protocol::Udp,
                params.ipv4_enabled,
                params.ipv6_enabled,
                true,
                UDP_TIMEOUT,
                UDP_RETRY,
            )
            .map_err(|err| {
                ProbeError::Unsupported(format!("cannot instantiate resolver: {}", err))
            })?;

            let check = ConnCheck {
                require_rrsigs: true,
                check_rtt: true,
                recursive: false,
            };

            match resolver.check_conn(check, reply_ms, log).await {
                Ok(()) => ok_servers += 1,
                Err(err) => {
                    log.err(format!("dns check of root server {} failed: {}", ip, err));
                }
            }

            if ok_servers == min_servers {
                log.info(format!(
                    "{} successful results, {} considered working",
                    ok_servers, family
                ));
                break;
            }
        }

        if ok_servers != min_servers {
            log.warn(format!(
                "status OFFLINE. {} protocol check failed, {} out of {} root servers replied \
                 successfully, minimum required {}",
                family,
                ok_servers,
                ips.len(),
                min_servers
            ));
            return Ok(PROBE_OFFLINE);
        }
    }

    Ok(PROBE_ONLINE)
}

/// The online-delay hysteresis: coming back from offline, the probe
/// keeps reporting offline until it has been continuously healthy for
/// `online_delay` seconds. Any unhealthy check resets the clock.
fn apply_online_delay(
    status: i32,
    online_delay: u32,
    state: &dyn ProbeStateStore,
    now: i64,
    log: &TestLog,
) -> i32 {
    let mut reported = status;

    if status == PROBE_UNSUPPORTED || status == PROBE_OFFLINE {
        state.set_online_since(0);
    } else if status == PROBE_ONLINE && state.last_status() == PROBE_OFFLINE {
        if state.online_since() == 0 {
            state.set_online_since(now);
        }

        let healthy_for = now - state.online_since();

        if healthy_for < i64::from(online_delay) {
            log.warn(format!(
                "probe status successful for {} seconds, still OFFLINE",
                healthy_for
            ));
            reported = PROBE_OFFLINE;
        } else {
            log.warn(format!(
                "probe status successful for {} seconds, changing to ONLINE",
                healthy_for
            ));
        }
    }

    state.set_last_status(if status == PROBE_UNSUPPORTED {
        PROBE_UNSUPPORTED
    } else {
        reported
    });

    reported
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::state::MemoryStateStore;

    #[test]
    fn online_delay_holds_the_probe_offline() {
        let log = TestLog::buffer();
        let state = MemoryStateStore::new(0, PROBE_OFFLINE);

        /* healthy checks at t=1000, t=1120, t=1200 with a 180 s delay */
        assert_eq!(
            apply_online_delay(PROBE_ONLINE, 180, &state, 1000, &log),
            PROBE_OFFLINE
        );
        assert_eq!(
            apply_online_delay(PROBE_ONLINE, 180, &state, 1120, &log),
            PROBE_OFFLINE
        );
        assert_eq!(
            apply_online_delay(PROBE_ONLINE, 180, &state, 1200, &log),
            PROBE_ONLINE
        );

        /* once online, the delay no longer applies */
        assert_eq!(
            apply_online_delay(PROBE_ONLINE, 180, &state, 1201, &log),
            PROBE_ONLINE
        );
    }

    #[test]
    fn failed_check_resets_the_clock() {
        let log = TestLog::buffer();
        let state = MemoryStateStore::new(0, PROBE_OFFLINE);

        assert_eq!(
            apply_online_delay(PROBE_ONLINE, 180, &state, 1000, &log),
            PROBE_OFFLINE
        );

        assert_eq!(
            apply_online_delay(PROBE_OFFLINE, 180, &state, 1100, &log),
            PROBE_OFFLINE
        );
        assert_eq!(state.online_since(), 0);

        /* the healthy streak starts over */
        assert_eq!(
            apply_online_delay(PROBE_ONLINE, 180, &state, 1150, &log),
            PROBE_OFFLINE
        );
        assert_eq!(
            apply_online_delay(PROBE_ONLINE, 180, &state, 1300, &log),
            PROBE_OFFLINE
        );
        assert_eq!(
            apply_online_delay(PROBE_ONLINE, 180, &state, 1330, &log),
            PROBE_ONLINE
        );
    }

    #[test]
    fn online_probe_stays_online_without_delay_checks() {
        let log = TestLog::buffer();
        let state = MemoryStateStore::new(0, PROBE_ONLINE);

        assert_eq!(
            apply_online_delay(PROBE_ONLINE, 180, &state, 1000, &log),
            PROBE_ONLINE
        );
    }
}
