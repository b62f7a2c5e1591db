//! Resolver behaviour against local mock name servers.

mod common;

use rsmprobe::probelog::TestLog;
use rsmprobe::resolver::{ConnCheck, Protocol, Resolver};

fn udp_resolver(port: u16, dnssec: bool) -> Resolver {
    Resolver::new(
        "resolver",
        "127.0.0.1",
        port,
        Protocol::Udp,
        true,
        false,
        dnssec,
        3,
        1,
    )
    .unwrap()
}

#[tokio::test]
async fn conn_check_passes_with_soa_and_rrsig() {
    let addr = common::spawn_udp_dns(|query| common::soa_reply(query, true)).await;
    let resolver = udp_resolver(addr.port(), true);
    let log = TestLog::buffer();

    let check = ConnCheck {
        require_rrsigs: true,
        check_rtt: true,
        recursive: false,
    };

    assert!(resolver.check_conn(check, 5000, &log).await.is_ok());
}

#[tokio::test]
async fn conn_check_requires_rrsigs_when_asked() {
    let addr = common::spawn_udp_dns(|query| common::soa_reply(query, false)).await;
    let resolver = udp_resolver(addr.port(), true);
    let log = TestLog::buffer();

    let check = ConnCheck {
        require_rrsigs: true,
        check_rtt: false,
        recursive: false,
    };

    let err = resolver.check_conn(check, 0, &log).await.unwrap_err();
    assert!(err.contains("no RRSIG records"));
}

#[tokio::test]
async fn conn_check_enforces_the_rtt_limit() {
    let addr =
        common::spawn_udp_dns_delayed(80, |query| common::soa_reply(query, true)).await;
    let resolver = udp_resolver(addr.port(), true);
    let log = TestLog::buffer();

    let check = ConnCheck {
        require_rrsigs: false,
        check_rtt: true,
        recursive: false,
    };

    let err = resolver.check_conn(check, 10, &log).await.unwrap_err();
    assert!(err.contains("over limit"));
}

#[tokio::test]
async fn resolve_host_collects_sorted_unique_addresses() {
    let addr = common::spawn_udp_dns(|query| {
        common::resolver_reply(query, &[[192, 0, 2, 9], [192, 0, 2, 1], [192, 0, 2, 9]])
    })
    .await;

    let resolver = udp_resolver(addr.port(), false);
    let log = TestLog::buffer();

    let ips = resolver
        .resolve_host("whois.example", true, false, &log)
        .await
        .unwrap();

    assert_eq!(ips, vec!["192.0.2.1", "192.0.2.9"]);
}

#[tokio::test]
async fn resolve_host_maps_nxdomain() {
    let addr = common::spawn_udp_dns(|query| {
        let mut reply = common::resolver_reply(query, &[]);
        reply.header.rcode = 3;
        reply
    })
    .await;

    let resolver = udp_resolver(addr.port(), false);
    let log = TestLog::buffer();

    let err = resolver
        .resolve_host("missing.example", true, false, &log)
        .await
        .unwrap_err();

    assert_eq!(err.kind, rsmprobe::error::ResolverError::NxDomain);
}

#[tokio::test]
async fn dnskeys_require_the_ad_bit() {
    let addr = common::spawn_udp_dns(|query| {
        /* a NOERROR reply without AD must be rejected */
        let mut reply = common::resolver_reply(query, &[]);
        reply.header.ad = false;
        reply
    })
    .await;

    let resolver = udp_resolver(addr.port(), true);
    let log = TestLog::buffer();

    let err = resolver.get_dnskeys("zz", &log).await.unwrap_err();
    assert_eq!(err.kind, rsmprobe::error::DnsKeysError::NoAdBit);
}

#[tokio::test]
async fn tcp_framing_round_trip() {
    let addr = common::spawn_tcp_dns(|query| common::soa_reply(query, false)).await;

    let resolver = Resolver::new(
        "resolver",
        "127.0.0.1",
        addr.port(),
        Protocol::Tcp,
        true,
        false,
        false,
        11,
        1,
    )
    .unwrap();

    let log = TestLog::buffer();
    let check = ConnCheck {
        recursive: true,
        ..ConnCheck::default()
    };

    assert!(resolver.check_conn(check, 0, &log).await.is_ok());
}

#[tokio::test]
async fn unreachable_udp_server_is_no_reply() {
    let resolver = udp_resolver(1, false);

    let (reply, _rtt) = match resolver
        .query(".", rsmprobe::dns::DNSResourceType::SOA, Default::default())
        .await
    {
        Err(err) => {
            assert_eq!(err.kind, rsmprobe::error::NsQueryError::NoReply);
            return;
        }
        Ok(ok) => ok,
    };

    panic!("unexpected reply: {:?}", reply.header);
}
