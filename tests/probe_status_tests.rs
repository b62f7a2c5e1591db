//! Probe-status check: the quorum decision and the online-delay
//! hysteresis.

use rsmprobe::check::probe::{check_probe_status, ProbeCheckParams};
use rsmprobe::check::state::{MemoryStateStore, ProbeStateStore};
use rsmprobe::errcode::{PROBE_OFFLINE, PROBE_ONLINE};
use rsmprobe::probelog::TestLog;

fn probe_params(v4_roots: &str) -> ProbeCheckParams {
    ProbeCheckParams {
        check_mode: "automatic".to_string(),
        ipv4_enabled: true,
        ipv6_enabled: false,
        ipv4_rootservers: v4_roots.to_string(),
        ipv6_rootservers: "2001:db8::1".to_string(),
        ipv4_min_servers: 1,
        ipv6_min_servers: 1,
        ipv4_reply_ms: 5000,
        ipv6_reply_ms: 5000,
        online_delay: 180,
    }
}

#[tokio::test]
async fn missed_quorum_goes_offline() {
    let log = TestLog::buffer();
    let state = MemoryStateStore::new(0, PROBE_ONLINE);

    /* nothing listens on this loopback address */
    let params = probe_params("127.255.255.254");

    let status = check_probe_status(&params, &state, 1000, &log).await.unwrap();
    assert_eq!(status, PROBE_OFFLINE);
    assert_eq!(state.last_status(), PROBE_OFFLINE);
    assert!(log.take().contains("IPv4 protocol check failed"));
}

#[tokio::test]
async fn offline_to_online_respects_the_delay() {
    let log = TestLog::buffer();
    let state = MemoryStateStore::new(0, PROBE_OFFLINE);

    /* both families disabled: the check itself always passes, which
     * isolates the hysteresis */
    let mut params = probe_params("127.0.0.1");
    params.ipv4_enabled = false;
    params.ipv6_enabled = false;

    let s1 = check_probe_status(&params, &state, 1000, &log).await.unwrap();
    let s2 = check_probe_status(&params, &state, 1120, &log).await.unwrap();
    let s3 = check_probe_status(&params, &state, 1200, &log).await.unwrap();

    assert_eq!((s1, s2, s3), (PROBE_OFFLINE, PROBE_OFFLINE, PROBE_ONLINE));
}

#[tokio::test]
async fn unhealthy_check_resets_online_since() {
    let log = TestLog::buffer();
    let state = MemoryStateStore::new(500, PROBE_OFFLINE);

    /* IPv4 enabled with an unreachable root: quorum fails */
    let params = probe_params("127.255.255.254");

    let status = check_probe_status(&params, &state, 1000, &log).await.unwrap();

    assert_eq!(status, PROBE_OFFLINE);
    assert_eq!(state.online_since(), 0);
    assert_eq!(state.last_status(), PROBE_OFFLINE);
}

#[tokio::test]
async fn non_automatic_mode_is_not_supported() {
    let log = TestLog::buffer();
    let state = MemoryStateStore::default();

    let mut params = probe_params("127.0.0.1");
    params.check_mode = "manual".to_string();

    assert!(check_probe_status(&params, &state, 1000, &log).await.is_err());
}

#[tokio::test]
async fn bad_character_in_root_list_is_not_supported() {
    let log = TestLog::buffer();
    let state = MemoryStateStore::default();

    let params = probe_params("127.0.0.1, 127.0.0.2");

    assert!(check_probe_status(&params, &state, 1000, &log).await.is_err());
}
