//! Forwarder configuration, loaded from layered sources by `udcn-cli` via
//! the `config` crate and deserialized here with `serde`.

use std::time::Duration;

use serde::Deserialize;

/// The fixed twenty-rung bitrate ladder a variant name's quality token is
/// looked up against, lowest bitrate first.
pub const DEFAULT_BITRATE_LADDER: &[&str] = &[
    "_50", "_100", "_150", "_200", "_250", "_300", "_400", "_500", "_600", "_700", "_900",
    "_1200", "_1500", "_2000", "_2500", "_3000", "_4000", "_5000", "_6000", "_8000",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of Data entries held in the Content Store.
    pub cs_max_size: usize,
    /// Maximum number of Data entries held in the Object Processor cache.
    pub op_max_size: usize,
    /// Object Processor compute budget, in derivations per second. Not
    /// enforced by the engine itself — external policy (e.g. a strategy or
    /// an admission layer in front of the forwarder) reads this to decide
    /// whether OP derivation should be attempted at all.
    pub op_mips: u32,
    /// How long a (name, nonce) pair is remembered in the Dead Nonce List.
    pub dnl_lifetime_ms: u64,
    /// Upper bound on Dead Nonce List size.
    pub dnl_max_size: usize,
    /// Grace period an entry lingers in the PIT after being satisfied.
    pub straggler_time_ms: u64,
    /// Quality tokens in ascending bitrate order.
    pub bitrate_ladder: Vec<String>,
    /// The token marking where the movie identifier sits in a Name.
    pub movie_token: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cs_max_size: 1024,
            op_max_size: 1024,
            op_mips: 100,
            dnl_lifetime_ms: 6_000,
            dnl_max_size: 10_000,
            straggler_time_ms: 100,
            bitrate_ladder: DEFAULT_BITRATE_LADDER.iter().map(|s| s.to_string()).collect(),
            movie_token: "bunny_2s".to_string(),
        }
    }
}

impl Config {
    pub fn dnl_lifetime(&self) -> Duration {
        Duration::from_millis(self.dnl_lifetime_ms)
    }

    pub fn straggler_time(&self) -> Duration {
        Duration::from_millis(self.straggler_time_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ladder_has_twenty_rungs() {
        assert_eq!(Config::default().bitrate_ladder.len(), 20);
    }
}
