use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rsmprobe::check::dns::{check_dns, DnsCheckParams, ScheduleContext};
use rsmprobe::check::mode::ModeStore;
use rsmprobe::check::probe::{check_probe_status, ProbeCheckParams};
use rsmprobe::check::rdap::{check_rdap, RdapCheckParams};
use rsmprobe::check::rdds::{check_rdds, RddsCheckParams};
use rsmprobe::check::resolver_status::{check_resolver_status, ResolverCheckParams};
use rsmprobe::check::state::FileStateStore;
use rsmprobe::error::{ProbeError, Result};
use rsmprobe::probelog::TestLog;

/// Registry service monitoring probe: one-shot DNS, RDDS and RDAP
/// measurements against TLD infrastructure.
#[derive(Parser)]
#[command(name = "rsmprobe", version)]
struct Cli {
    /// Name of this probe node; prefixes the per-test log files.
    #[arg(long, default_value = "probe")]
    probe: String,

    /// Directory for the per-test log files.
    #[arg(long)]
    logdir: Option<PathBuf>,

    /// Directory for persistent probe state (test-mode metadata,
    /// online-since bookkeeping).
    #[arg(long)]
    statedir: Option<PathBuf>,

    /// Host identifier of the monitored entity, protocol-selection noise.
    #[arg(long, default_value_t = 0)]
    hostid: u64,

    /// Item identifier of this check, protocol-selection noise.
    #[arg(long, default_value_t = 0)]
    itemid: u64,

    /// Scheduled check time as a Unix timestamp; defaults to now.
    #[arg(long)]
    nextcheck: Option<i64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Authoritative DNS test of one rsmhost.
    #[command(arg_required_else_help = true)]
    Dns {
        rsmhost: String,
        testprefix: String,
        name_servers: String,
        dnssec_enabled: String,
        reserved1: String,
        reserved2: String,
        udp_enabled: String,
        tcp_enabled: String,
        ipv4_enabled: String,
        ipv6_enabled: String,
        resolver: String,
        udp_rtt_limit: String,
        tcp_rtt_limit: String,
        tcp_ratio: String,
        test_recover_udp: String,
        test_recover_tcp: String,
        minns: String,
    },
    /// RDDS43 + RDDS80 registration data test.
    #[command(arg_required_else_help = true)]
    Rdds {
        rsmhost: String,
        rdds43_server: String,
        rdds80_url: String,
        rdds43_testedname: String,
        rdds43_ns_string: String,
        probe_rdds_enabled: String,
        rdds43_enabled: String,
        rdds80_enabled: String,
        ipv4_enabled: String,
        ipv6_enabled: String,
        resolver: String,
        rtt_limit: String,
        maxredirs: String,
    },
    /// RDAP registration data test.
    #[command(arg_required_else_help = true)]
    Rdap {
        rsmhost: String,
        testedname: String,
        base_url: String,
        maxredirs: String,
        rtt_limit: String,
        tld_enabled: String,
        probe_enabled: String,
        ipv4_enabled: String,
        ipv6_enabled: String,
        resolver: String,
    },
    /// Automatic probe online/offline decision.
    #[command(arg_required_else_help = true)]
    ProbeStatus {
        check_mode: String,
        ipv4_enabled: String,
        ipv6_enabled: String,
        ipv4_rootservers: String,
        ipv6_rootservers: String,
        ipv4_min_servers: String,
        ipv6_min_servers: String,
        ipv4_reply_ms: String,
        ipv6_reply_ms: String,
        online_delay: String,
    },
    /// Liveness of the local caching resolver.
    #[command(arg_required_else_help = true)]
    ResolverStatus {
        resolver_ip: String,
        timeout: String,
        tries: String,
        ipv4_enabled: String,
        ipv6_enabled: String,
    },
}

fn nonempty(value: &str, num: usize, description: &str) -> Result<String> {
    if value.is_empty() {
        return Err(ProbeError::InvalidParameter(
            num,
            format!("{} cannot be empty", description),
        ));
    }

    Ok(value.to_string())
}

fn uint(value: &str, num: usize, description: &str) -> Result<u32> {
    rsmprobe::params::parse_uint31(value)
        .map_err(|_| ProbeError::InvalidParameter(num, description.to_string()))
}

fn flag(value: &str, num: usize, description: &str) -> Result<bool> {
    Ok(uint(value, num, description)? != 0)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(Some(output)) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<Option<String>> {
    let logdir = cli.logdir.clone().unwrap_or_else(std::env::temp_dir);
    let statedir = cli.statedir.clone().unwrap_or_else(std::env::temp_dir);
    let nextcheck = cli
        .nextcheck
        .unwrap_or_else(|| chrono::Utc::now().timestamp());

    let state = FileStateStore::new(statedir.join("probe-state.json"));

    match &cli.command {
        Command::Dns {
            rsmhost,
            testprefix,
            name_servers,
            dnssec_enabled,
            reserved1: _,
            reserved2: _,
            udp_enabled,
            tcp_enabled,
            ipv4_enabled,
            ipv6_enabled,
            resolver,
            udp_rtt_limit,
            tcp_rtt_limit,
            tcp_ratio,
            test_recover_udp,
            test_recover_tcp,
            minns,
        } => {
            let params = DnsCheckParams {
                rsmhost: nonempty(rsmhost, 1, "Rsmhost")?,
                testprefix: nonempty(testprefix, 2, "Test prefix")?,
                name_servers: nonempty(name_servers, 3, "List of Name Servers")?,
                dnssec_enabled: flag(dnssec_enabled, 4, "DNSSEC enabled on rsmhost")?,
                udp_enabled: flag(udp_enabled, 7, "DNS UDP enabled")?,
                tcp_enabled: flag(tcp_enabled, 8, "DNS TCP enabled")?,
                ipv4_enabled: flag(ipv4_enabled, 9, "IPv4 enabled")?,
                ipv6_enabled: flag(ipv6_enabled, 10, "IPv6 enabled")?,
                resolver: nonempty(resolver, 11, "IP address of local resolver")?,
                udp_rtt_limit: uint(udp_rtt_limit, 12, "maximum allowed UDP RTT")?,
                tcp_rtt_limit: uint(tcp_rtt_limit, 13, "maximum allowed TCP RTT")?,
                tcp_ratio: uint(tcp_ratio, 14, "TCP ratio")?,
                test_recover_udp: uint(
                    test_recover_udp,
                    15,
                    "successful tests to recover from critical mode (UDP)",
                )?,
                test_recover_tcp: uint(
                    test_recover_tcp,
                    16,
                    "successful tests to recover from critical mode (TCP)",
                )?,
                minns_value: nonempty(minns, 17, "minimum number of working name servers")?,
            };

            let schedule = ScheduleContext {
                hostid: cli.hostid,
                itemid: cli.itemid,
                nextcheck,
            };

            let log = open_log(&logdir, &cli.probe, Some(&params.rsmhost), "dns")?;
            let mode_store = ModeStore::new(&statedir);

            let value = check_dns(&params, schedule, &mode_store, &state, &log).await?;
            Ok(Some(value.to_string()))
        }

        Command::Rdds {
            rsmhost,
            rdds43_server,
            rdds80_url,
            rdds43_testedname,
            rdds43_ns_string,
            probe_rdds_enabled,
            rdds43_enabled,
            rdds80_enabled,
            ipv4_enabled,
            ipv6_enabled,
            resolver,
            rtt_limit,
            maxredirs,
        } => {
            let params = RddsCheckParams {
                rsmhost: nonempty(rsmhost, 1, "Rsmhost")?,
                rdds43_server: rdds43_server.clone(),
                rdds80_url: rdds80_url.clone(),
                rdds43_testedname: rdds43_testedname.clone(),
                rdds43_ns_string: rdds43_ns_string.clone(),
                probe_rdds_enabled: flag(probe_rdds_enabled, 6, "RDDS enabled on probe")?,
                rdds43_enabled: flag(rdds43_enabled, 7, "RDDS43 enabled on rsmhost")?,
                rdds80_enabled: flag(rdds80_enabled, 8, "RDDS80 enabled on rsmhost")?,
                ipv4_enabled: flag(ipv4_enabled, 9, "IPv4 enabled")?,
                ipv6_enabled: flag(ipv6_enabled, 10, "IPv6 enabled")?,
                resolver: nonempty(resolver, 11, "IP address of local resolver")?,
                rtt_limit: uint(rtt_limit, 12, "RTT limit")?,
                maxredirs: uint(maxredirs, 13, "max redirects")?,
            };

            let log = open_log(&logdir, &cli.probe, Some(&params.rsmhost), "rdds")?;

            let value = check_rdds(&params, &state, &log).await?;
            Ok(value.map(|v| v.to_string()))
        }

        Command::Rdap {
            rsmhost,
            testedname,
            base_url,
            maxredirs,
            rtt_limit,
            tld_enabled,
            probe_enabled,
            ipv4_enabled,
            ipv6_enabled,
            resolver,
        } => {
            let params = RdapCheckParams {
                rsmhost: nonempty(rsmhost, 1, "Rsmhost")?,
                testedname: nonempty(testedname, 2, "Test domain")?,
                base_url: nonempty(base_url, 3, "RDAP service endpoint")?,
                maxredirs: uint(maxredirs, 4, "maximal number of redirections allowed")?,
                rtt_limit: uint(rtt_limit, 5, "maximum allowed RTT")?,
                tld_enabled: flag(tld_enabled, 6, "RDAP enabled for TLD")?,
                probe_enabled: flag(probe_enabled, 7, "RDAP enabled for probe")?,
                ipv4_enabled: flag(ipv4_enabled, 8, "IPv4 enabled")?,
                ipv6_enabled: flag(ipv6_enabled, 9, "IPv6 enabled")?,
                resolver: nonempty(resolver, 10, "IP address of local resolver")?,
            };

            let log = open_log(&logdir, &cli.probe, Some(&params.rsmhost), "rdap")?;

            let value = check_rdap(&params, &state, &log).await?;
            Ok(value.map(|v| v.to_string()))
        }

        Command::ProbeStatus {
            check_mode,
            ipv4_enabled,
            ipv6_enabled,
            ipv4_rootservers,
            ipv6_rootservers,
            ipv4_min_servers,
            ipv6_min_servers,
            ipv4_reply_ms,
            ipv6_reply_ms,
            online_delay,
        } => {
            let params = ProbeCheckParams {
                check_mode: nonempty(check_mode, 1, "mode of the check")?,
                ipv4_enabled: flag(ipv4_enabled, 2, "IPv4 enabled")?,
                ipv6_enabled: flag(ipv6_enabled, 3, "IPv6 enabled")?,
                ipv4_rootservers: nonempty(ipv4_rootservers, 4, "IPv4 root servers")?,
                ipv6_rootservers: nonempty(ipv6_rootservers, 5, "IPv6 root servers")?,
                ipv4_min_servers: uint(
                    ipv4_min_servers,
                    6,
                    "IPv4 root servers required to be working",
                )?,
                ipv6_min_servers: uint(
                    ipv6_min_servers,
                    7,
                    "IPv6 root servers required to be working",
                )?,
                ipv4_reply_ms: uint(ipv4_reply_ms, 8, "RTT to consider IPv4 root server working")?,
                ipv6_reply_ms: uint(ipv6_reply_ms, 9, "RTT to consider IPv6 root server working")?,
                online_delay: uint(
                    online_delay,
                    10,
                    "seconds to be successful in order to switch from OFFLINE to ONLINE",
                )?,
            };

            let log = open_log(&logdir, &cli.probe, None, "probestatus")?;
            let now = chrono::Utc::now().timestamp();

            let status = check_probe_status(&params, &state, now, &log).await?;
            Ok(Some(status.to_string()))
        }

        Command::ResolverStatus {
            resolver_ip,
            timeout,
            tries,
            ipv4_enabled,
            ipv6_enabled,
        } => {
            let params = ResolverCheckParams {
                resolver_ip: nonempty(resolver_ip, 1, "IP address of local resolver")?,
                timeout: uint(timeout, 2, "timeout in seconds")?,
                tries: uint(tries, 3, "maximum number of tries")?,
                ipv4_enabled: flag(ipv4_enabled, 4, "IPv4 enabled")?,
                ipv6_enabled: flag(ipv6_enabled, 5, "IPv6 enabled")?,
            };

            let log = open_log(&logdir, &cli.probe, None, "resolverstatus")?;

            let status = check_resolver_status(&params, &state, &log).await?;
            Ok(Some(status.to_string()))
        }
    }
}

fn open_log(
    logdir: &std::path::Path,
    probe: &str,
    rsmhost: Option<&str>,
    check: &str,
) -> Result<TestLog> {
    TestLog::open(logdir, probe, rsmhost, check).map_err(|err| {
        ProbeError::Unsupported(format!(
            "cannot open log file \"{}\": {}",
            TestLog::file_path(logdir, probe, rsmhost, check).display(),
            err
        ))
    })
}
