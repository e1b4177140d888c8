//! Run configuration for the halo-exchange engine.

#![warn(missing_docs)]

use serde::{Deserialize, Serialize};

use crate::algs::communicator::CommTag;

/// How neighbours trade halo cells each timestep.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExchangeMode {
    /// Post non-blocking exchanges, update the interior while they are in
    /// flight, then finish the two edge points.
    #[default]
    Overlapped,
    /// Finish both exchanges before touching any point.
    Blocking,
}

/// Tags used by one simulation run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HaloTags {
    /// A worker's leftmost value travelling to `rank-1`.
    pub leftward: CommTag,
    /// A worker's rightmost value travelling to `rank+1`.
    pub rightward: CommTag,
    /// Final sub-ranges travelling to the coordinator.
    pub gather: CommTag,
}

impl HaloTags {
    /// Three consecutive tags starting at `base`. Two runs sharing a group
    /// need bases at least three apart.
    pub const fn from_base(base: CommTag) -> Self {
        Self {
            leftward: base,
            rightward: base.offset(1),
            gather: base.offset(2),
        }
    }
}

impl Default for HaloTags {
    fn default() -> Self {
        Self::from_base(CommTag::new(0x5A00))
    }
}

/// Everything one worker needs to know about a run besides the field.
/// Every member of a group must use the same configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of timesteps to advance.
    pub t_max: usize,
    /// Halo exchange strategy; both give identical results.
    pub exchange: ExchangeMode,
    /// Message tags for the halo and gather traffic.
    pub tags: HaloTags,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            t_max: 0,
            exchange: ExchangeMode::Overlapped,
            tags: HaloTags::default(),
        }
    }
}

impl SimulationConfig {
    /// Default configuration advancing `t_max` timesteps.
    pub fn with_steps(t_max: usize) -> Self {
        Self {
            t_max,
            ..Default::default()
        }
    }

    /// Builder-style override of the exchange mode.
    pub fn exchange(mut self, mode: ExchangeMode) -> Self {
        self.exchange = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_distinct() {
        let t = HaloTags::default();
        assert_ne!(t.leftward, t.rightward);
        assert_ne!(t.rightward, t.gather);
        assert_ne!(t.leftward, t.gather);
    }

    #[test]
    fn json_roundtrip() {
        let cfg = SimulationConfig::with_steps(25).exchange(ExchangeMode::Blocking);
        let s = serde_json::to_string(&cfg).unwrap();
        let back: SimulationConfig = serde_json::from_str(&s).unwrap();
        assert_eq!(back, cfg);
    }
}
