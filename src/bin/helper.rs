//! Thin per-party process wiring, grounded on the teacher's `src/bin`
//! convention: parse `--pid`/network/TLS configuration (CLI flags overriding
//! a TOML file), open the three pairwise channels, and drive one
//! offline-then-online pass.
//!
//! Building the graph-analytics circuits this binary would serve in
//! production is out of scope here: [`run_with`] takes the circuit (and this
//! party's local input map) as a closure parameter, so test code and any
//! external driver supplies them rather than this binary hard-coding them.

use std::collections::HashMap;

use clap::Parser;

use triparty_mpc::circuit::{order_gates_by_level, Circuit, WireId};
use triparty_mpc::config::{NetworkTopologyResolved, PortScheme, RuntimeConfig, TlsConfig, DEFAULT_PORT, DEFAULT_THREADS};
use triparty_mpc::net::tcp::TcpChannel;
#[cfg(feature = "tls")]
use triparty_mpc::net::tls::TlsChannel;
use triparty_mpc::net::Channel;
use triparty_mpc::protocol::offline::OfflineEvaluator;
use triparty_mpc::protocol::online::{dealer_learn_outputs, OnlineEvaluator};
use triparty_mpc::protocol::{PartyNetwork, Role};
use triparty_mpc::rand_gen_pool::{RandGenPool, Seeds};
use triparty_mpc::ring::Ring;
use triparty_mpc::{Error, Result};

#[derive(Parser, Debug)]
#[command(name = "helper", about = "One party of the three-party MPC engine")]
struct Args {
    #[arg(long)]
    pid: Option<u8>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    threads: Option<usize>,
    #[arg(long)]
    localhost: bool,
    /// Path to a JSON file holding a three-element array of peer addresses,
    /// indexed by party id.
    #[arg(long)]
    net_config: Option<String>,
    #[arg(long)]
    certificate_path: Option<String>,
    #[arg(long)]
    private_key_path: Option<String>,
    #[arg(long = "trusted-cert-path")]
    trusted_cert_paths: Vec<String>,
    #[arg(long)]
    seed_self_hi: Option<u64>,
    #[arg(long)]
    seed_self_lo: Option<u64>,
    #[arg(long)]
    seed_all_hi: Option<u64>,
    #[arg(long)]
    seed_all_lo: Option<u64>,
    #[arg(long)]
    seed_p01_hi: Option<u64>,
    #[arg(long)]
    seed_p01_lo: Option<u64>,
    #[arg(long)]
    seed_p02_hi: Option<u64>,
    #[arg(long)]
    seed_p02_lo: Option<u64>,
    #[arg(long)]
    seed_p12_hi: Option<u64>,
    #[arg(long)]
    seed_p12_lo: Option<u64>,
    /// TOML file supplying any of the above not passed on the command line.
    #[arg(long, default_value = "helper.toml")]
    config: String,
}

/// Folds `args` over an optional TOML config file into a validated
/// [`RuntimeConfig`], CLI flags taking priority — the same "file defaults,
/// flags override" order `config.rs`'s module doc describes.
fn resolve_config(args: &Args) -> Result<RuntimeConfig> {
    let file = config::Config::builder()
        .add_source(config::File::from(std::path::PathBuf::from(&args.config)).required(false))
        .build()?;

    let int = |key: &str| file.get::<i64>(key).ok();
    let string = |key: &str| file.get::<String>(key).ok();

    let pid = args
        .pid
        .or_else(|| int("pid").map(|v| v as u8))
        .ok_or_else(|| Error::Config("pid must be given via --pid or the config file".into()))?;

    let port = args.port.or_else(|| int("port").map(|v| v as u16)).unwrap_or(DEFAULT_PORT);
    let threads = args.threads.or_else(|| int("threads").map(|v| v as usize)).unwrap_or(DEFAULT_THREADS);

    let net_config_path = args.net_config.clone().or_else(|| string("net_config"));
    let topology = if args.localhost || net_config_path.is_none() {
        NetworkTopologyResolved::Localhost
    } else {
        #[cfg(feature = "enable-serde")]
        {
            let path = net_config_path.expect("checked above");
            let raw = std::fs::read_to_string(path)?;
            triparty_mpc::config::parse_net_config(&raw)?
        }
        #[cfg(not(feature = "enable-serde"))]
        {
            return Err(Error::Config("net-config requires the enable-serde feature".into()));
        }
    };

    let certificate_path = args.certificate_path.clone().or_else(|| string("certificate_path"));
    let private_key_path = args.private_key_path.clone().or_else(|| string("private_key_path"));
    let mut trusted_cert_paths = args.trusted_cert_paths.clone();
    if trusted_cert_paths.is_empty() {
        if let Ok(list) = file.get::<Vec<String>>("trusted_cert_paths") {
            trusted_cert_paths = list;
        }
    }
    let tls = match (certificate_path, private_key_path) {
        (Some(certificate_path), Some(private_key_path)) => Some(TlsConfig {
            certificate_path: certificate_path.into(),
            private_key_path: private_key_path.into(),
            trusted_cert_paths: trusted_cert_paths.into_iter().map(Into::into).collect(),
        }),
        _ => None,
    };

    let seeds = Seeds {
        self_seed: (
            args.seed_self_hi.or_else(|| int("seed_self_hi").map(|v| v as u64)).unwrap_or(0),
            args.seed_self_lo.or_else(|| int("seed_self_lo").map(|v| v as u64)).unwrap_or(u64::from(pid)),
        ),
        all_seed: (
            args.seed_all_hi.or_else(|| int("seed_all_hi").map(|v| v as u64)).unwrap_or(0),
            args.seed_all_lo.or_else(|| int("seed_all_lo").map(|v| v as u64)).unwrap_or(0),
        ),
        p01_seed: (
            args.seed_p01_hi.or_else(|| int("seed_p01_hi").map(|v| v as u64)).unwrap_or(1),
            args.seed_p01_lo.or_else(|| int("seed_p01_lo").map(|v| v as u64)).unwrap_or(1),
        ),
        p02_seed: (
            args.seed_p02_hi.or_else(|| int("seed_p02_hi").map(|v| v as u64)).unwrap_or(2),
            args.seed_p02_lo.or_else(|| int("seed_p02_lo").map(|v| v as u64)).unwrap_or(2),
        ),
        p12_seed: (
            args.seed_p12_hi.or_else(|| int("seed_p12_hi").map(|v| v as u64)).unwrap_or(12),
            args.seed_p12_lo.or_else(|| int("seed_p12_lo").map(|v| v as u64)).unwrap_or(12),
        ),
    };

    let cfg = RuntimeConfig { pid, threads, seeds, port, topology, tls };
    cfg.validate()?;
    Ok(cfg)
}

fn peer_host(topology: &NetworkTopologyResolved, pid: u8) -> String {
    match topology {
        NetworkTopologyResolved::Localhost => "127.0.0.1".to_string(),
        NetworkTopologyResolved::Hosts(hosts) => hosts[pid as usize].clone(),
    }
}

/// Opens this party's two pairwise channels. For each unordered pair `{i,
/// j}`, the lower-numbered party listens and the higher-numbered party
/// dials out — a fixed convention so neither side needs to coordinate who
/// binds first.
async fn build_network(cfg: &RuntimeConfig) -> Result<PartyNetwork> {
    let scheme = PortScheme::new(cfg.port);
    let mut channels: HashMap<u8, Box<dyn Channel>> = HashMap::new();

    for peer in (0u8..3).filter(|&p| p != cfg.pid) {
        let channel: Box<dyn Channel> = if cfg.pid < peer {
            let addr = format!("0.0.0.0:{}", scheme.port_for(cfg.pid, peer));
            open_listener(cfg, &addr).await?
        } else {
            let addr = format!("{}:{}", peer_host(&cfg.topology, peer), scheme.port_for(peer, cfg.pid));
            open_dialer(cfg, &addr).await?
        };
        channels.insert(peer, channel);
    }

    Ok(PartyNetwork::new(channels))
}

#[cfg(feature = "tls")]
async fn open_listener(cfg: &RuntimeConfig, addr: &str) -> Result<Box<dyn Channel>> {
    match &cfg.tls {
        Some(tls) => {
            let trusted: Vec<String> = tls.trusted_cert_paths.iter().map(|p| p.to_string_lossy().into_owned()).collect();
            let ch = TlsChannel::accept(
                addr,
                &tls.certificate_path.to_string_lossy(),
                &tls.private_key_path.to_string_lossy(),
                &trusted,
            )
            .await?;
            Ok(Box::new(ch))
        }
        None => Ok(Box::new(TcpChannel::accept(addr).await?)),
    }
}

#[cfg(not(feature = "tls"))]
async fn open_listener(_cfg: &RuntimeConfig, addr: &str) -> Result<Box<dyn Channel>> {
    Ok(Box::new(TcpChannel::accept(addr).await?))
}

#[cfg(feature = "tls")]
async fn open_dialer(cfg: &RuntimeConfig, addr: &str) -> Result<Box<dyn Channel>> {
    match &cfg.tls {
        Some(tls) => {
            let trusted: Vec<String> = tls.trusted_cert_paths.iter().map(|p| p.to_string_lossy().into_owned()).collect();
            let server_name = addr.split(':').next().unwrap_or(addr);
            let ch = TlsChannel::connect(
                addr,
                server_name,
                &tls.certificate_path.to_string_lossy(),
                &tls.private_key_path.to_string_lossy(),
                &trusted,
            )
            .await?;
            Ok(Box::new(ch))
        }
        None => Ok(Box::new(TcpChannel::connect(addr).await?)),
    }
}

#[cfg(not(feature = "tls"))]
async fn open_dialer(_cfg: &RuntimeConfig, addr: &str) -> Result<Box<dyn Channel>> {
    Ok(Box::new(TcpChannel::connect(addr).await?))
}

/// Drives one full offline-then-online pass for `cfg.pid`'s role. `build`
/// returns the (identical across all three processes) circuit plus this
/// party's own local input map — each process calls it independently.
pub async fn run_with<C>(cfg: RuntimeConfig, build: C) -> Result<HashMap<WireId, Ring>>
where
    C: FnOnce() -> (Circuit, HashMap<WireId, Ring>),
{
    let (circuit, inputs) = build();
    let circuit = order_gates_by_level(circuit);
    let role = Role::from_pid(cfg.pid);
    let network = build_network(&cfg).await?;

    let offline = OfflineEvaluator::new(role, RandGenPool::new(cfg.pid, cfg.seeds), &network);
    let dealer_inputs = if role == Role::Dealer { inputs.clone() } else { HashMap::new() };
    let preproc = offline.run(&circuit, &dealer_inputs).await?;

    match role {
        Role::Dealer => {
            let output_mask = preproc.output_mask.expect("dealer always produces an output mask");
            dealer_learn_outputs(&network, &circuit, &output_mask).await
        }
        Role::OnlineA | Role::OnlineB => {
            let mut online = OnlineEvaluator::new(role, RandGenPool::new(cfg.pid, cfg.seeds), &network, preproc, circuit.num_wires, cfg.threads);
            online.run(&circuit, &inputs).await
        }
    }
}

/// A minimal connectivity smoke-test circuit: party 1 and party 2 each
/// contribute one input, the dealer contributes none, and the single output
/// is their sum. Exercises the full offline/online wiring without
/// depending on any graph-analytics payload (out of scope for this binary).
fn smoke_circuit(pid: u8) -> (Circuit, HashMap<WireId, Ring>) {
    let mut c = Circuit::new();
    let a = c.new_input_wire(1);
    let b = c.new_input_wire(2);
    let sum = c.add_arith(triparty_mpc::circuit::GateKind::Add, &[a, b]).expect("fixed-arity Add never fails");
    c.set_as_output(sum).expect("sum is a valid wire");

    let mut inputs = HashMap::new();
    match pid {
        1 => {
            inputs.insert(a, Ring(1));
        }
        2 => {
            inputs.insert(b, Ring(1));
        }
        _ => {}
    }
    (c, inputs)
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let result = async {
        let cfg = resolve_config(&args)?;
        let pid = cfg.pid;
        run_with(cfg, move || smoke_circuit(pid)).await
    }
    .await;

    match result {
        Ok(outputs) => {
            tracing::info!(?outputs, "helper run completed");
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "helper run failed");
            std::process::ExitCode::FAILURE
        }
    }
}
