//! RDAP check behaviour that needs no live registry: the bootstrap
//! sentinels and the enable gates.

use rsmprobe::check::rdap::{check_rdap, RdapCheckParams};
use rsmprobe::check::state::MemoryStateStore;
use rsmprobe::probelog::TestLog;

fn rdap_params(base_url: &str) -> RdapCheckParams {
    RdapCheckParams {
        rsmhost: "zz".to_string(),
        testedname: "rsm-monitoring.zz".to_string(),
        base_url: base_url.to_string(),
        maxredirs: 10,
        rtt_limit: 5000,
        tld_enabled: true,
        probe_enabled: true,
        ipv4_enabled: true,
        ipv6_enabled: false,
        resolver: "127.0.0.1".to_string(),
    }
}

#[tokio::test]
async fn not_listed_sentinel_skips_the_test() {
    let state = MemoryStateStore::default();
    let log = TestLog::buffer();

    let value = check_rdap(&rdap_params("not listed"), &state, &log)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(value["rtt"], -390);
    assert_eq!(value["target"], "not listed");
    assert_eq!(value["testedname"], "rsm-monitoring.zz");
    assert_eq!(value["status"], 0);
    assert!(value.get("ip").is_none());

    /* the sentinel short-circuits before any network activity */
    assert!(log.take().contains("not listed in the Bootstrap Service Registry"));
}

#[tokio::test]
async fn no_https_sentinel_skips_the_test() {
    let state = MemoryStateStore::default();
    let log = TestLog::buffer();

    let value = check_rdap(&rdap_params("no https"), &state, &log)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(value["rtt"], -391);
    assert_eq!(value["status"], 0);
    assert!(value.get("ip").is_none());
}

#[tokio::test]
async fn disabled_on_probe_returns_no_value() {
    let state = MemoryStateStore::default();
    let log = TestLog::buffer();

    let mut params = rdap_params("https://rdap.example/");
    params.probe_enabled = false;

    let value = check_rdap(&params, &state, &log).await.unwrap();
    assert!(value.is_none());
    assert!(log.take().contains("RDAP disabled on this probe"));
}

#[tokio::test]
async fn disabled_on_tld_returns_no_value() {
    let state = MemoryStateStore::default();
    let log = TestLog::buffer();

    let mut params = rdap_params("https://rdap.example/");
    params.tld_enabled = false;

    let value = check_rdap(&params, &state, &log).await.unwrap();
    assert!(value.is_none());
}

#[tokio::test]
async fn malformed_base_url_is_not_supported() {
    let state = MemoryStateStore::default();
    let log = TestLog::buffer();

    let result = check_rdap(&rdap_params("gopher://rdap.example/"), &state, &log).await;
    assert!(result.is_err());
}

#[test]
fn sentinel_codes_sit_outside_the_internal_band() {
    /* a sentinel outcome counts as a service failure, not probe trouble */
    let state = MemoryStateStore::default();
    assert!(!rsmprobe::check::subtest_result(-390, 5000, &state));
    assert!(!rsmprobe::check::subtest_result(-391, 5000, &state));
    assert_eq!(state.errors(), 0);
}
