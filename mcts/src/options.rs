use anyhow::Result;
use common::{Config, ConfigLoader};

#[derive(Clone, Debug, PartialEq)]
pub struct MCTSOptions {
    pub exploration_constant: f32,
    pub keep_subtree: bool,
    /// Maximum steps from the root, counted through selection, expansion and rollout.
    pub max_depth: usize,
    pub seed: Option<u64>,
}

impl MCTSOptions {
    pub fn new(
        exploration_constant: f32,
        keep_subtree: bool,
        max_depth: usize,
        seed: Option<u64>,
    ) -> Self {
        MCTSOptions {
            exploration_constant,
            keep_subtree,
            max_depth,
            seed,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for MCTSOptions {
    fn default() -> Self {
        Self::new(std::f32::consts::SQRT_2, true, 1000, None)
    }
}

impl Config for MCTSOptions {
    fn load(config: &ConfigLoader) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            exploration_constant: config
                .get("exploration_constant")
                .and_then(|v| v.as_f32())
                .unwrap_or(defaults.exploration_constant),
            keep_subtree: config
                .get("keep_subtree")
                .and_then(|v| v.as_bool())
                .unwrap_or(defaults.keep_subtree),
            max_depth: config
                .get("max_depth")
                .and_then(|v| v.as_usize())
                .unwrap_or(defaults.max_depth),
            seed: config.get("seed").and_then(|v| v.as_u64()),
        })
    }
}
