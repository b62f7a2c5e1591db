//! RDDS check against a mock resolver and a mock port-43 server.

mod common;

use rsmprobe::check::rdds::{check_rdds, RddsCheckParams};
use rsmprobe::check::state::MemoryStateStore;
use rsmprobe::probelog::TestLog;

const WHOIS_ANSWER: &str = "Domain Name: rsm-monitoring.zz\n\
                            Name Server: ns1.example.\n\
                            Name Server: ns2.example.\n\
                            >>> Last update of WHOIS database <<<\n";

fn rdds_params(resolver_port: u16, rdds43_port: u16) -> RddsCheckParams {
    RddsCheckParams {
        rsmhost: "zz".to_string(),
        rdds43_server: format!("whois.example;{}", rdds43_port),
        rdds80_url: String::new(),
        rdds43_testedname: "rsm-monitoring.zz".to_string(),
        rdds43_ns_string: "Name Server:".to_string(),
        probe_rdds_enabled: true,
        rdds43_enabled: true,
        rdds80_enabled: false,
        ipv4_enabled: true,
        ipv6_enabled: false,
        resolver: format!("127.0.0.1;{}", resolver_port),
        rtt_limit: 10000,
        maxredirs: 10,
    }
}

#[tokio::test]
async fn rdds43_end_to_end() {
    let state = MemoryStateStore::default();
    let log = TestLog::buffer();

    /* the resolver answers whois.example with 127.0.0.1, the WHOIS mock
     * serves the answer body */
    let dns_addr = common::spawn_tcp_dns(|query| {
        common::resolver_reply(query, &[[127, 0, 0, 1]])
    })
    .await;
    let whois_addr = common::spawn_whois(WHOIS_ANSWER).await;

    let params = rdds_params(dns_addr.port(), whois_addr.port());

    let value = check_rdds(&params, &state, &log).await.unwrap().unwrap();

    assert_eq!(value["status"], 1);
    assert_eq!(value["rdds43"]["status"], 1);
    assert_eq!(value["rdds43"]["ip"], "127.0.0.1");
    assert_eq!(value["rdds43"]["target"], "whois.example");
    assert_eq!(value["rdds43"]["testedname"], "rsm-monitoring.zz");
    assert!(value["rdds43"]["rtt"].as_i64().unwrap() >= 0);
    assert!(value["rdds43"].get("upd").is_none());

    /* RDDS80 was not tested at all */
    assert_eq!(value["rdds80"]["rtt"], -1000);
    assert_eq!(value["rdds80"]["status"], 1);
}

#[tokio::test]
async fn rdds43_no_nameservers_in_answer() {
    let state = MemoryStateStore::default();
    let log = TestLog::buffer();

    let dns_addr = common::spawn_tcp_dns(|query| {
        common::resolver_reply(query, &[[127, 0, 0, 1]])
    })
    .await;
    let whois_addr = common::spawn_whois("Domain Name: rsm-monitoring.zz\nno entries\n").await;

    let params = rdds_params(dns_addr.port(), whois_addr.port());

    let value = check_rdds(&params, &state, &log).await.unwrap().unwrap();

    assert_eq!(value["rdds43"]["rtt"], -201);
    assert_eq!(value["rdds43"]["status"], 0);
    assert_eq!(value["status"], 0);
}

#[tokio::test]
async fn rdds43_unresolvable_server() {
    let state = MemoryStateStore::default();
    let log = TestLog::buffer();

    let dns_addr = common::spawn_tcp_dns(|query| {
        let mut reply = common::resolver_reply(query, &[]);
        reply.header.rcode = 3;
        reply
    })
    .await;

    let params = rdds_params(dns_addr.port(), 4343);

    let value = check_rdds(&params, &state, &log).await.unwrap().unwrap();

    /* NXDOMAIN from the local resolver has its own RDDS43 code */
    assert_eq!(value["rdds43"]["rtt"], -225);
    assert_eq!(value["rdds43"]["status"], 0);
    assert!(value["rdds43"].get("ip").is_none());
}

#[tokio::test]
async fn disabled_on_probe_returns_no_value() {
    let state = MemoryStateStore::default();
    let log = TestLog::buffer();

    let mut params = rdds_params(5353, 4343);
    params.probe_rdds_enabled = false;

    let value = check_rdds(&params, &state, &log).await.unwrap();
    assert!(value.is_none());
    assert!(log.take().contains("RDDS disabled on this probe"));
}

#[tokio::test]
async fn disabled_on_rsmhost_returns_no_value() {
    let state = MemoryStateStore::default();
    let log = TestLog::buffer();

    let mut params = rdds_params(5353, 4343);
    params.rdds43_enabled = false;
    params.rdds80_enabled = false;
    params.rdds43_server = String::new();

    let value = check_rdds(&params, &state, &log).await.unwrap();
    assert!(value.is_none());
    assert!(log.take().contains("RDDS disabled on this RSM host"));
}

#[tokio::test]
async fn out_of_range_rdds43_port_is_rejected() {
    let state = MemoryStateStore::default();
    let log = TestLog::buffer();

    let mut params = rdds_params(5353, 4343);
    params.rdds43_server = "whois.example;99999".to_string();

    assert!(check_rdds(&params, &state, &log).await.is_err());
}
