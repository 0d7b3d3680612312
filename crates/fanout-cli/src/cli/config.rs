use clap::{Parser, ValueEnum};
use core::time::Duration;
use fanout::{PanicPolicy, PoolConfig, SimulatedWork, TallyMode};
use std::path::PathBuf;

/// Count the words in a text file that contain a pattern, using a fixed-size
/// worker pool.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Text file to read; tokens are split on whitespace.
    #[arg(short, long, env = "FANOUT_INPUT")]
    pub input: PathBuf,

    /// Number of workers.
    #[arg(short, long, default_value_t = 1, env = "FANOUT_WORKERS")]
    pub workers: usize,

    /// A word counts when it contains this pattern.
    #[arg(short, long, default_value = "whal", env = "FANOUT_PATTERN")]
    pub pattern: String,

    /// Match the pattern regardless of ASCII case.
    #[arg(long, env = "FANOUT_IGNORE_CASE")]
    pub ignore_case: bool,

    /// Items the handoff channel holds before the producer waits.
    #[arg(long, default_value_t = 1, env = "FANOUT_CAPACITY")]
    pub capacity: usize,

    /// How workers record matches.
    #[arg(long, value_enum, default_value_t = TallyArg::Merged, env = "FANOUT_TALLY")]
    pub tally: TallyArg,

    /// Artificial delay after each match.
    #[arg(long, value_enum, default_value_t = WorkArg::Random, env = "FANOUT_WORK")]
    pub work: WorkArg,

    /// Delay in milliseconds: the exact delay for `fixed`, the exclusive upper
    /// bound for `random`.
    #[arg(long, default_value_t = 100, env = "FANOUT_WORK_MS")]
    pub work_ms: u64,

    /// Seed for the random delays.
    #[arg(long, env = "FANOUT_SEED")]
    pub seed: Option<u64>,

    /// Cancel the run after this many seconds.
    #[arg(long, env = "FANOUT_TIMEOUT_SECS")]
    pub timeout_secs: Option<f64>,

    /// What to do when a worker panics.
    #[arg(long, value_enum, default_value_t = PolicyArg::Abort, env = "FANOUT_ON_WORKER_PANIC")]
    pub on_worker_panic: PolicyArg,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Text, env = "FANOUT_FORMAT")]
    pub format: Format,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TallyArg {
    Locked,
    Atomic,
    Merged,
}

impl From<TallyArg> for TallyMode {
    fn from(value: TallyArg) -> Self {
        match value {
            TallyArg::Locked => Self::Locked,
            TallyArg::Atomic => Self::Atomic,
            TallyArg::Merged => Self::Merged,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkArg {
    None,
    Fixed,
    Random,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyArg {
    Abort,
    Continue,
}

impl From<PolicyArg> for PanicPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Abort => Self::Abort,
            PolicyArg::Continue => Self::Continue,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

/// Validated settings for one invocation.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub input: PathBuf,
    pub pattern: String,
    pub ignore_case: bool,
    pub format: Format,
    pub pool: PoolConfig,
}

impl TryFrom<CliArgs> for CliConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.workers == 0 {
            anyhow::bail!("--workers must be greater than zero");
        }
        if args.capacity == 0 {
            anyhow::bail!("--capacity must be greater than zero");
        }

        let delay = Duration::from_millis(args.work_ms);
        let work = match args.work {
            WorkArg::None => SimulatedWork::None,
            WorkArg::Fixed => SimulatedWork::Fixed(delay),
            WorkArg::Random => SimulatedWork::Random { max: delay },
        };

        let timeout = match args.timeout_secs {
            None => None,
            Some(secs) => Some(
                Duration::try_from_secs_f64(secs)
                    .map_err(|e| anyhow::anyhow!("invalid --timeout-secs {secs}: {e}"))?,
            ),
        };

        let pool = PoolConfig {
            workers: args.workers,
            capacity: args.capacity,
            tally: args.tally.into(),
            work,
            seed: args.seed,
            timeout,
            on_worker_panic: args.on_worker_panic.into(),
        };
        pool.validate()?;

        Ok(Self {
            input: args.input,
            pattern: args.pattern,
            ignore_case: args.ignore_case,
            format: args.format,
            pool,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(["fanout"].iter().chain(args)).unwrap()
    }

    #[test]
    fn defaults_match_the_classic_run() {
        let config = CliConfig::try_from(parse(&["--input", "moby.txt"])).unwrap();

        assert_eq!(config.input, PathBuf::from("moby.txt"));
        assert_eq!(config.pattern, "whal");
        assert_eq!(config.format, Format::Text);
        assert_eq!(config.pool.workers, 1);
        assert_eq!(config.pool.capacity, 1);
        assert_eq!(config.pool.tally, TallyMode::Merged);
        assert_eq!(
            config.pool.work,
            SimulatedWork::Random {
                max: Duration::from_millis(100)
            }
        );
        assert_eq!(config.pool.timeout, None);
        assert_eq!(config.pool.on_worker_panic, PanicPolicy::Abort);
    }

    #[test]
    fn flags_map_onto_pool_config() {
        let config = CliConfig::try_from(parse(&[
            "-i",
            "moby.txt",
            "-w",
            "16",
            "--capacity",
            "8",
            "--tally",
            "locked",
            "--work",
            "fixed",
            "--work-ms",
            "5",
            "--seed",
            "42",
            "--timeout-secs",
            "1.5",
            "--on-worker-panic",
            "continue",
            "--format",
            "json",
        ]))
        .unwrap();

        assert_eq!(config.pool.workers, 16);
        assert_eq!(config.pool.capacity, 8);
        assert_eq!(config.pool.tally, TallyMode::Locked);
        assert_eq!(
            config.pool.work,
            SimulatedWork::Fixed(Duration::from_millis(5))
        );
        assert_eq!(config.pool.seed, Some(42));
        assert_eq!(config.pool.timeout, Some(Duration::from_millis(1_500)));
        assert_eq!(config.pool.on_worker_panic, PanicPolicy::Continue);
        assert_eq!(config.format, Format::Json);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let err = CliConfig::try_from(parse(&["-i", "x", "--workers", "0"])).unwrap_err();
        assert!(err.to_string().contains("--workers"));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = CliConfig::try_from(parse(&["-i", "x", "--capacity", "0"])).unwrap_err();
        assert!(err.to_string().contains("--capacity"));
    }

    #[test]
    fn negative_timeout_is_rejected() {
        assert!(CliConfig::try_from(parse(&["-i", "x", "--timeout-secs=-1"])).is_err());
    }

    #[test]
    fn input_is_required() {
        assert!(CliArgs::try_parse_from(["fanout"]).is_err());
    }
}
