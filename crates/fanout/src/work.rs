use core::time::Duration;
use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Artificial per-match delay used to stress scheduling.
///
/// Workers run this hook after every matching item. It has no effect on the
/// tally; it only widens the window in which workers interleave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SimulatedWork {
    /// No delay.
    #[default]
    None,
    /// The same delay after every match.
    Fixed(Duration),
    /// A uniformly random delay in `[0, max)` after every match.
    Random { max: Duration },
}

impl SimulatedWork {
    /// Picks the delay for one match.
    pub fn delay(&self, rng: &mut SmallRng) -> Duration {
        match *self {
            Self::None => Duration::ZERO,
            Self::Fixed(delay) => delay,
            Self::Random { max } if max.is_zero() => Duration::ZERO,
            Self::Random { max } => rng.random_range(Duration::ZERO..max),
        }
    }

    /// Sleeps for one match's worth of work.
    pub async fn perform(&self, rng: &mut SmallRng) {
        let delay = self.delay(rng);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Builds the RNG for one worker.
    ///
    /// With a seed, worker `n` always gets the same sequence of delays; without
    /// one, each worker is seeded from the thread-local generator.
    pub(crate) fn worker_rng(seed: Option<u64>, worker_id: usize) -> SmallRng {
        match seed {
            Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(worker_id as u64)),
            None => SmallRng::from_rng(&mut rand::rng()),
        }
    }
}
