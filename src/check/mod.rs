pub mod dns;
pub mod mode;
pub mod probe;
pub mod rdap;
pub mod rdds;
pub mod resolver_status;
pub mod state;

use crate::errcode::{DNS_UDP_INTERNAL_GENERAL, INTERNAL_LAST, RSM_NO_VALUE};
use self::state::ProbeStateStore;

/// Success/failure of a single RTT measurement against its limit.
///
/// Sentinels: a measurement that was never taken passes; codes in the
/// internal band pass (they are probe trouble, not service trouble),
/// with the general internal code additionally knocking the probe down.
pub fn subtest_result(rtt: i32, rtt_limit: u32, state: &dyn ProbeStateStore) -> bool {
    if rtt == RSM_NO_VALUE {
        return true;
    }

    if rtt == DNS_UDP_INTERNAL_GENERAL {
        state.errors_inc();
    }

    if rtt <= DNS_UDP_INTERNAL_GENERAL && INTERNAL_LAST <= rtt {
        return true;
    }

    rtt >= 0 && rtt <= rtt_limit as i32
}

#[cfg(test)]
mod tests {
    use super::state::MemoryStateStore;
    use super::*;

    #[test]
    fn subtest_sentinels() {
        let state = MemoryStateStore::default();

        assert!(subtest_result(RSM_NO_VALUE, 100, &state));
        assert_eq!(state.errors(), 0);

        /* the general internal code passes but knocks the probe down */
        assert!(subtest_result(-1, 100, &state));
        assert_eq!(state.errors(), 1);

        /* the rest of the internal band passes quietly */
        assert!(subtest_result(-2, 100, &state));
        assert!(subtest_result(-199, 100, &state));
        assert_eq!(state.errors(), 1);

        /* service errors fail */
        assert!(!subtest_result(-200, 100, &state));
        assert!(!subtest_result(-427, 100, &state));
        assert!(!subtest_result(-800, 100, &state));
    }

    #[test]
    fn subtest_limits() {
        let state = MemoryStateStore::default();

        assert!(subtest_result(0, 100, &state));
        assert!(subtest_result(100, 100, &state));
        assert!(!subtest_result(101, 100, &state));
    }
}
