use crate::{Error, Result, SimulatedWork, TallyMode};
use core::time::Duration;

/// What the coordinator does when a worker terminates abnormally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PanicPolicy {
    /// Cancel the run and return [`Error::WorkerPanicked`].
    #[default]
    Abort,
    /// Record the failure and let the remaining workers drain the stream.
    Continue,
}

/// Settings for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfig {
    /// Number of concurrent workers. Must be at least one.
    pub workers: usize,
    /// Handoff channel bound. Must be at least one.
    pub capacity: usize,
    /// Shared counter strategy.
    pub tally: TallyMode,
    /// Per-match delay hook.
    pub work: SimulatedWork,
    /// Seed for the per-worker delay RNGs.
    pub seed: Option<u64>,
    /// Cancels the run once this much time has passed.
    pub timeout: Option<Duration>,
    pub on_worker_panic: PanicPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            capacity: 1,
            tally: TallyMode::default(),
            work: SimulatedWork::default(),
            seed: None,
            timeout: None,
            on_worker_panic: PanicPolicy::default(),
        }
    }
}

impl PoolConfig {
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `workers` or `capacity` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::InvalidConfig {
                reason: "workers must be greater than zero".to_owned(),
            });
        }
        if self.capacity == 0 {
            return Err(Error::InvalidConfig {
                reason: "capacity must be greater than zero".to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_one_worker_unit_capacity() {
        let config = PoolConfig::default();
        assert_eq!(config.workers, 1);
        assert_eq!(config.capacity, 1);
        assert_eq!(config.tally, TallyMode::Merged);
        assert_eq!(config.work, SimulatedWork::None);
        assert_eq!(config.on_worker_panic, PanicPolicy::Abort);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_workers_and_zero_capacity() {
        assert!(matches!(
            PoolConfig::with_workers(0).validate(),
            Err(Error::InvalidConfig { .. })
        ));

        let config = PoolConfig {
            capacity: 0,
            ..PoolConfig::with_workers(4)
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfig { .. })
        ));
    }
}
