use std::num::NonZeroU64;

use rand::RngExt as _;

use super::RequestConfig;

/// Source of the uniform draws made while handling one request.
pub trait Dice {
    /// Uniform value in `[0, 1)`.
    fn unit_interval(&mut self) -> f64;

    /// Uniform integer in `[low, high]`.
    fn uniform_inclusive(&mut self, low: u64, high: u64) -> u64;
}

/// [`Dice`] backed by the thread local rng.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDice;

impl Dice for ThreadDice {
    fn unit_interval(&mut self) -> f64 {
        rand::rng().random_range(0.0..1.0)
    }

    fn uniform_inclusive(&mut self, low: u64, high: u64) -> u64 {
        if low >= high {
            return low;
        }
        rand::rng().random_range(low..=high)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCause {
    FailRate,
    Burst,
}

/// Memoryless fault injection policy of a single request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultPlan {
    fail_rate: f64,
    burst_period: Option<NonZeroU64>,
}

impl FaultPlan {
    pub fn new(fail_rate: f64, burst_period: Option<NonZeroU64>) -> Self {
        Self {
            fail_rate,
            burst_period,
        }
    }

    pub fn from_config(cfg: &RequestConfig) -> Self {
        Self::new(cfg.fail_rate, cfg.burst_period)
    }

    /// Decide whether this request fails.
    ///
    /// The burst draw hits once in `burst_period` requests on average,
    /// without any counter shared between requests.
    pub fn evaluate(&self, dice: &mut impl Dice) -> Option<FaultCause> {
        if self.fail_rate > 0.0 && dice.unit_interval() < self.fail_rate {
            return Some(FaultCause::FailRate);
        }

        if let Some(period) = self.burst_period
            && dice.uniform_inclusive(1, period.get()) == 1
        {
            return Some(FaultCause::Burst);
        }

        None
    }
}
