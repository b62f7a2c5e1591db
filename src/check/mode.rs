//! The persistent normal/critical test-mode machine.
//!
//! Per rsmhost the DNS check keeps a `(mode, successful_tests)` pair in
//! a small binary file. Failures push the machine into the critical
//! mode of the protocol that failed; the configured number of
//! consecutive successes brings it back and removes the file. The host
//! platform never runs overlapping tests for one rsmhost, so the file
//! needs no locking.

use std::path::{Path, PathBuf};

use crate::constants::METADATA_FILE_PREFIX;
use crate::probelog::TestLog;
use crate::resolver::Protocol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestMode {
    Normal,
    CriticalUdp,
    CriticalTcp,
}

impl TestMode {
    pub fn as_u32(self) -> u32 {
        match self {
            TestMode::Normal => 0,
            TestMode::CriticalUdp => 1,
            TestMode::CriticalTcp => 2,
        }
    }

    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(TestMode::Normal),
            1 => Some(TestMode::CriticalUdp),
            2 => Some(TestMode::CriticalTcp),
            _ => None,
        }
    }

    pub fn is_critical(self) -> bool {
        self != TestMode::Normal
    }
}

/// Storage for the metadata files, one per rsmhost.
pub struct ModeStore {
    dir: PathBuf,
}

impl ModeStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn file_path(&self, rsmhost: &str) -> PathBuf {
        self.dir
            .join(format!("{}-{}.bin", METADATA_FILE_PREFIX, rsmhost))
    }

    pub fn exists(&self, rsmhost: &str) -> bool {
        self.file_path(rsmhost).is_file()
    }

    /// Read the persisted pair. An absent file means `(Normal, 0)`; a
    /// short or unintelligible file is corruption.
    pub fn read(&self, rsmhost: &str) -> Result<(TestMode, i32), String> {
        let path = self.file_path(rsmhost);

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok((TestMode::Normal, 0));
            }
            Err(err) => {
                return Err(format!(
                    "cannot open metadata file \"{}\": {}",
                    path.display(),
                    err
                ));
            }
        };

        Self::decode(&bytes)
            .ok_or_else(|| format!("cannot read metadata from file \"{}\"", path.display()))
    }

    fn decode(bytes: &[u8]) -> Option<(TestMode, i32)> {
        if bytes.len() < 8 {
            return None;
        }

        let mode = u32::from_ne_bytes(bytes[0..4].try_into().ok()?);
        let successful_tests = i32::from_ne_bytes(bytes[4..8].try_into().ok()?);

        TestMode::from_u32(mode).map(|mode| (mode, successful_tests))
    }

    pub fn write(&self, rsmhost: &str, mode: TestMode, successful_tests: i32) -> Result<(), String> {
        let path = self.file_path(rsmhost);

        let mut bytes = Vec::with_capacity(8);
        bytes.extend_from_slice(&mode.as_u32().to_ne_bytes());
        bytes.extend_from_slice(&successful_tests.to_ne_bytes());

        std::fs::write(&path, bytes).map_err(|err| {
            format!(
                "cannot write metadata to file \"{}\": {}",
                path.display(),
                err
            )
        })
    }

    pub fn delete(&self, rsmhost: &str) -> Result<(), String> {
        let path = self.file_path(rsmhost);

        std::fs::remove_file(&path).map_err(|err| {
            format!(
                "cannot delete metadata file \"{}\": {}",
                path.display(),
                err
            )
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Pick the transport for this test.
///
/// With both transports enabled and the machine in normal mode, one in
/// `tcp_ratio` tests runs over TCP; the `nextcheck/60 + hostid + itemid`
/// quantum spreads the TCP minutes across probes so the name servers
/// never see them all switch at once.
pub fn choose_protocol(
    udp_enabled: bool,
    tcp_enabled: bool,
    mode: TestMode,
    nextcheck: i64,
    hostid: u64,
    itemid: u64,
    tcp_ratio: u32,
) -> Protocol {
    if udp_enabled && !tcp_enabled {
        return Protocol::Udp;
    }
    if tcp_enabled && !udp_enabled {
        return Protocol::Tcp;
    }

    match mode {
        TestMode::Normal => {
            let noise = (nextcheck / 60) as u64 + hostid + itemid;
            if noise % u64::from(tcp_ratio.max(1)) == 0 {
                Protocol::Tcp
            } else {
                Protocol::Udp
            }
        }
        TestMode::CriticalUdp => Protocol::Udp,
        TestMode::CriticalTcp => Protocol::Tcp,
    }
}

/// Advance the machine with this test's aggregate DNS status and
/// persist the outcome: the file disappears whenever the machine lands
/// in normal mode.
pub fn update_mode(
    store: &ModeStore,
    rsmhost: &str,
    file_exists: bool,
    dns_up: bool,
    test_recover: u32,
    protocol: Protocol,
    mode: &mut TestMode,
    successful_tests: &mut i32,
    log: &TestLog,
) -> Result<(), String> {
    if dns_up {
        if mode.is_critical() {
            *successful_tests += 1;

            if *successful_tests == test_recover as i32 {
                *successful_tests = 0;
                *mode = TestMode::Normal;

                log.info(
                    "mode changed from critical back to normal for the TLD due to no errors \
                     in the authoritative server tests, will continue using transport protocol \
                     according to the algorithm",
                );
            }
        }
    } else {
        *successful_tests = 0;

        if !mode.is_critical() {
            *mode = match protocol {
                Protocol::Udp => TestMode::CriticalUdp,
                Protocol::Tcp => TestMode::CriticalTcp,
            };

            log.info(format!(
                "mode changed from normal to critical for the TLD due to errors in the \
                 authoritative server tests, will continue using {} protocol",
                protocol.as_str()
            ));
        }
    }

    if *mode == TestMode::Normal {
        if file_exists {
            log.info("removing the metadata file");
            return store.delete(rsmhost);
        }

        return Ok(());
    }

    store.write(rsmhost, *mode, *successful_tests)
}
