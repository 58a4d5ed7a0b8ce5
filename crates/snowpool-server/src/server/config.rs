use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use core::time::Duration;
use snowpool::{DEFAULT_EPOCH, DEFAULT_SEQUENCE_BITS, DEFAULT_WORKER_BITS, Layout};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Runtime configuration for the `snowpool-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a `.env`
/// file is loaded first). They are fixed for the lifetime of the process.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "snowpool-server",
    version,
    about = "An HTTP service handing out Snowflake IDs from a pool of workers",
    args_override_self = true
)]
pub struct CliArgs {
    /// Address to bind.
    ///
    /// Environment variable: `SNOWPOOL_HOST`
    #[arg(long, env = "SNOWPOOL_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on.
    ///
    /// Environment variable: `SNOWPOOL_PORT`
    #[arg(long, env = "SNOWPOOL_PORT", default_value_t = 8181)]
    pub port: u16,

    /// Worker id of the first worker in this process.
    ///
    /// Workers take the contiguous ids `[id, id + num - 1]`. Ranges of
    /// processes sharing a layout must not overlap.
    ///
    /// Environment variable: `SNOWPOOL_WORKER_ID`
    #[arg(long = "id", env = "SNOWPOOL_WORKER_ID", default_value_t = 0)]
    pub worker_id: u64,

    /// Number of workers to create.
    ///
    /// Bounds how many requests can generate IDs at the same time; further
    /// requests wait for a worker to be returned.
    ///
    /// Environment variable: `SNOWPOOL_NUM_WORKERS`
    #[arg(long = "num", env = "SNOWPOOL_NUM_WORKERS", default_value_t = 1)]
    pub num_workers: usize,

    /// Number of runtime threads. `0` uses the number of CPUs.
    ///
    /// Environment variable: `SNOWPOOL_PROC`
    #[arg(long = "proc", env = "SNOWPOOL_PROC", default_value_t = 0)]
    pub threads: usize,

    /// Largest number of IDs a single request may ask for.
    ///
    /// Environment variable: `SNOWPOOL_MAX_COUNT`
    #[arg(long, env = "SNOWPOOL_MAX_COUNT", default_value_t = 500)]
    pub max_count: usize,

    /// Epoch, in milliseconds since 1970-01-01 UTC, subtracted from every
    /// timestamp. Must never change once IDs have been issued.
    ///
    /// Environment variable: `SNOWPOOL_EPOCH_MS`
    #[arg(long, env = "SNOWPOOL_EPOCH_MS", default_value_t = DEFAULT_EPOCH.as_millis() as u64)]
    pub epoch_ms: u64,

    /// Width of the worker id field in bits.
    ///
    /// Environment variable: `SNOWPOOL_WORKER_BITS`
    #[arg(long, env = "SNOWPOOL_WORKER_BITS", default_value_t = DEFAULT_WORKER_BITS)]
    pub worker_bits: u8,

    /// Width of the sequence field in bits.
    ///
    /// Environment variable: `SNOWPOOL_SEQUENCE_BITS`
    #[arg(long, env = "SNOWPOOL_SEQUENCE_BITS", default_value_t = DEFAULT_SEQUENCE_BITS)]
    pub sequence_bits: u8,

    /// Log output format.
    ///
    /// Environment variable: `SNOWPOOL_LOG_FORMAT`
    #[arg(long, env = "SNOWPOOL_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub worker_id: u64,
    pub num_workers: usize,
    pub threads: usize,
    pub max_count: usize,
    pub layout: Layout,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Highest worker id owned by this process.
    pub fn last_worker_id(&self) -> u64 {
        self.worker_id + self.num_workers as u64 - 1
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.num_workers == 0 {
            bail!("SNOWPOOL_NUM_WORKERS must be greater than 0");
        }

        if args.max_count == 0 {
            bail!("SNOWPOOL_MAX_COUNT must be greater than 0");
        }

        let layout = Layout::new(
            Duration::from_millis(args.epoch_ms),
            args.worker_bits,
            args.sequence_bits,
        )
        .context("invalid ID layout")?;

        let last_worker_id = u64::try_from(args.num_workers - 1)
            .ok()
            .and_then(|offset| args.worker_id.checked_add(offset))
            .ok_or_else(|| anyhow::anyhow!("Overflow in worker id range computation"))?;

        if last_worker_id > layout.max_worker_id() {
            bail!(
                "worker ids {}..={} exceed the {}-bit worker id space (max = {})",
                args.worker_id,
                last_worker_id,
                layout.worker_bits(),
                layout.max_worker_id()
            );
        }

        let threads = if args.threads == 0 {
            num_cpus::get()
        } else {
            args.threads
        };

        Ok(Self {
            addr: SocketAddr::new(args.host, args.port),
            worker_id: args.worker_id,
            num_workers: args.num_workers,
            threads,
            max_count: args.max_count,
            layout,
            log_format: args.log_format,
        })
    }
}
