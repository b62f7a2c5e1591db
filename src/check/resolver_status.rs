//! Liveness check of the local caching resolver. A dead resolver takes
//! every other check down with it, so a failure here also knocks the
//! probe's health counter.

use super::state::ProbeStateStore;
use crate::constants::DEFAULT_RESOLVER_PORT;
use crate::error::Result;
use crate::probelog::TestLog;
use crate::resolver::{ConnCheck, Protocol, Resolver};

pub struct ResolverCheckParams {
    pub resolver_ip: String,
    pub timeout: u32,
    pub tries: u32,
    pub ipv4_enabled: bool,
    pub ipv6_enabled: bool,
}

pub async fn check_resolver_status(
    params: &ResolverCheckParams,
    state: &dyn ProbeStateStore,
    log: &TestLog,
) -> Result<i32> {
    log.start_test();

    let resolver = Resolver::new(
        "resolver",
        &params.resolver_ip,
        DEFAULT_RESOLVER_PORT,
        Protocol::Udp,
        params.ipv4_enabled,
        params.ipv6_enabled,
        true,
        u64::from(params.timeout.max(1)),
        1,
    )
    .map_err(|err| {
        crate::error::ProbeError::Unsupported(format!("cannot create resolver: {}", err))
    })?;

    log.info(format!(
        "IPv4:{} IPv6:{}",
        if params.ipv4_enabled { "ENABLED" } else { "DISABLED" },
        if params.ipv6_enabled { "ENABLED" } else { "DISABLED" }
    ));

    let check = ConnCheck {
        recursive: true,
        ..ConnCheck::default()
    };

    let mut status = 0;
    let mut tries = params.tries.max(1);

    while tries > 0 {
        tries -= 1;

        match resolver.check_conn(check, 0, log).await {
            Ok(()) => {
                status = 1;
                break;
            }
            Err(err) if tries == 0 => {
                log.err(format!(
                    "dns check of local resolver {} failed: {}",
                    params.resolver_ip, err
                ));
            }
            Err(err) => {
                log.err(format!(
                    "dns check of local resolver {} failed: {}, will try {} more time{}",
                    params.resolver_ip,
                    err,
                    tries,
                    if tries == 1 { "" } else { "s" }
                ));
            }
        }
    }

    log.info(format!("status of \"{}\": {}", params.resolver_ip, status));

    if status == 0 {
        state.errors_inc();
    }

    log.end_test();

    Ok(status)
}
