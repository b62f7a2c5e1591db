//! End-to-end DNS check scenarios against local mock name servers.

mod common;

use rsmprobe::check::dns::{check_dns, DnsCheckParams, ScheduleContext};
use rsmprobe::check::mode::{ModeStore, TestMode};
use rsmprobe::check::state::MemoryStateStore;
use rsmprobe::probelog::TestLog;

fn dns_params(name_servers: String) -> DnsCheckParams {
    DnsCheckParams {
        rsmhost: "zz".to_string(),
        testprefix: "www.zz--rsm-monitoring".to_string(),
        name_servers,
        dnssec_enabled: false,
        udp_enabled: true,
        tcp_enabled: true,
        ipv4_enabled: true,
        ipv6_enabled: false,
        resolver: "127.0.0.1".to_string(),
        udp_rtt_limit: 5000,
        tcp_rtt_limit: 20000,
        tcp_ratio: 50,
        test_recover_udp: 3,
        test_recover_tcp: 3,
        minns_value: "1".to_string(),
    }
}

#[tokio::test]
async fn failing_nameserver_switches_to_critical_mode() {
    let statedir = tempfile::tempdir().unwrap();
    let mode_store = ModeStore::new(statedir.path());
    let state = MemoryStateStore::default();
    let log = TestLog::buffer();

    /* 127.0.0.1:1 answers nothing, the endpoint test has to fail */
    let params = dns_params("ns1.example,127.0.0.1;1".to_string());

    let schedule = ScheduleContext {
        hostid: 0,
        itemid: 0,
        /* 60/60 = 1, 1 % 50 != 0, stays on UDP */
        nextcheck: 60,
    };

    let value = check_dns(&params, schedule, &mode_store, &state, &log)
        .await
        .unwrap();

    assert_eq!(value["status"], 0);
    assert_eq!(value["protocol"], 0);
    assert_eq!(value["mode"], 1);
    assert_eq!(value["testedname"], "www.zz--rsm-monitoring.zz.");
    assert!(value.get("dnssecstatus").is_none());

    let nsips = value["nsips"].as_array().unwrap();
    assert_eq!(nsips.len(), 1);
    assert_eq!(nsips[0]["ns"], "ns1.example");
    assert_eq!(nsips[0]["ip"], "127.0.0.1");
    assert_eq!(nsips[0]["protocol"], "udp");
    assert!(nsips[0]["rtt"].as_i64().unwrap() < 0);

    let nss = value["nss"].as_array().unwrap();
    assert_eq!(nss[0]["status"], 2);

    /* the metadata file records (CriticalUDP, 0) */
    assert!(mode_store.exists("zz"));
    assert_eq!(mode_store.read("zz").unwrap(), (TestMode::CriticalUdp, 0));
}

#[tokio::test]
async fn successful_test_recovers_from_critical_mode() {
    let statedir = tempfile::tempdir().unwrap();
    let mode_store = ModeStore::new(statedir.path());
    let state = MemoryStateStore::default();
    let log = TestLog::buffer();

    /* one success away from recovery */
    mode_store.write("zz", TestMode::CriticalUdp, 2).unwrap();

    let ns_addr = common::spawn_udp_dns(|query| common::nxdomain_reply(query, b"abc")).await;

    let params = dns_params(format!("ns1.example,127.0.0.1;{}", ns_addr.port()));

    let schedule = ScheduleContext {
        hostid: 0,
        itemid: 0,
        nextcheck: 60,
    };

    let value = check_dns(&params, schedule, &mode_store, &state, &log)
        .await
        .unwrap();

    assert_eq!(value["status"], 1);
    assert_eq!(value["mode"], 0);

    let nsips = value["nsips"].as_array().unwrap();
    assert!(nsips[0]["rtt"].as_i64().unwrap() >= 0);
    assert_eq!(nsips[0]["nsid"], "616263");

    let nss = value["nss"].as_array().unwrap();
    assert_eq!(nss[0]["status"], 5);

    /* recovery removes the metadata file */
    assert!(!mode_store.exists("zz"));
}

#[tokio::test]
async fn wrong_rcode_maps_to_its_dedicated_code() {
    let statedir = tempfile::tempdir().unwrap();
    let mode_store = ModeStore::new(statedir.path());
    let state = MemoryStateStore::default();
    let log = TestLog::buffer();

    let ns_addr = common::spawn_udp_dns(|query| {
        let mut reply = common::nxdomain_reply(query, b"");
        reply.header.rcode = 5; /* REFUSED */
        reply
    })
    .await;

    let params = dns_params(format!("ns1.example,127.0.0.1;{}", ns_addr.port()));

    let value = check_dns(
        &params,
        ScheduleContext::default(),
        &mode_store,
        &state,
        &log,
    )
    .await
    .unwrap();

    let nsips = value["nsips"].as_array().unwrap();
    assert_eq!(nsips[0]["rtt"], -256);
    assert_eq!(value["status"], 0);
}

#[tokio::test]
async fn missing_aa_flag_takes_the_nameserver_down() {
    let statedir = tempfile::tempdir().unwrap();
    let mode_store = ModeStore::new(statedir.path());
    let state = MemoryStateStore::default();
    let log = TestLog::buffer();

    let ns_addr = common::spawn_udp_dns(|query| {
        let mut reply = common::nxdomain_reply(query, b"");
        reply.header.aa = false;
        reply
    })
    .await;

    let params = dns_params(format!("ns1.example,127.0.0.1;{}", ns_addr.port()));

    let value = check_dns(
        &params,
        ScheduleContext::default(),
        &mode_store,
        &state,
        &log,
    )
    .await
    .unwrap();

    assert_eq!(value["nsips"][0]["rtt"], -250);
}

#[tokio::test]
async fn empty_nameserver_list_is_not_supported() {
    let statedir = tempfile::tempdir().unwrap();
    let mode_store = ModeStore::new(statedir.path());
    let state = MemoryStateStore::default();
    let log = TestLog::buffer();

    /* the only endpoint is IPv6 while only IPv4 is enabled */
    let params = dns_params("ns1.example,2001:db8::1".to_string());

    let result = check_dns(
        &params,
        ScheduleContext::default(),
        &mode_store,
        &state,
        &log,
    )
    .await;

    assert!(result.is_err());
}
