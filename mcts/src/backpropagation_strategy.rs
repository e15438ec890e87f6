use anyhow::Result;
use common::{Config, ConfigLoader};
use engine::Player;

/// How an outcome is folded into the nodes on the way back to the root.
pub trait BackpropagationStrategy {
    /// Value stored at the node that produced `outcome`, whose player to move is `player`.
    fn leaf_value(&self, player: Player, outcome: f32) -> f32;

    /// Value stored at the parent of a node that stored `value`.
    fn parent_value(&self, value: f32) -> f32;

    /// Per-step discount applied to rewards collected during a rollout.
    fn rollout_discount(&self) -> f32;
}

/// Two-player zero-sum folding. Rewards are from the agent's perspective; every node keeps its
/// score from the point of view of the player choosing it, so the sign flips at every level.
#[derive(Clone, Copy, Debug, Default)]
pub struct AdversarialBackpropagation;

impl BackpropagationStrategy for AdversarialBackpropagation {
    fn leaf_value(&self, player: Player, outcome: f32) -> f32 {
        match player {
            Player::Agent => -outcome,
            Player::Opponent => outcome,
        }
    }

    fn parent_value(&self, value: f32) -> f32 {
        -value
    }

    fn rollout_discount(&self) -> f32 {
        1.0
    }
}

/// Single-agent folding with a discount factor per level.
#[derive(Clone, Copy, Debug)]
pub struct DiscountedBackpropagation {
    pub gamma: f32,
}

impl DiscountedBackpropagation {
    pub fn new(gamma: f32) -> Self {
        Self { gamma }
    }
}

impl Default for DiscountedBackpropagation {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl BackpropagationStrategy for DiscountedBackpropagation {
    fn leaf_value(&self, _: Player, outcome: f32) -> f32 {
        outcome
    }

    fn parent_value(&self, value: f32) -> f32 {
        value * self.gamma
    }

    fn rollout_discount(&self) -> f32 {
        self.gamma
    }
}

impl Config for DiscountedBackpropagation {
    fn load(config: &ConfigLoader) -> Result<Self> {
        Ok(Self {
            gamma: config
                .get("gamma")
                .and_then(|v| v.as_f32())
                .unwrap_or(1.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_adversarial_sign_follows_player_to_move() {
        let strategy = AdversarialBackpropagation;

        assert_approx_eq!(strategy.leaf_value(Player::Opponent, 1.0), 1.0);
        assert_approx_eq!(strategy.leaf_value(Player::Agent, 1.0), -1.0);
        assert_approx_eq!(strategy.parent_value(strategy.parent_value(0.5)), 0.5);
    }

    #[test]
    fn test_discounted_attenuates_per_level() {
        let strategy = DiscountedBackpropagation::new(0.9);

        let leaf = strategy.leaf_value(Player::Agent, 1.0);
        assert_approx_eq!(leaf, 1.0);
        assert_approx_eq!(strategy.parent_value(strategy.parent_value(leaf)), 0.81);
    }

    #[test]
    fn test_gamma_from_config() {
        let config = ConfigLoader::from_str("gamma = 0.95", "planner".to_string()).unwrap();
        let strategy: DiscountedBackpropagation = config.load().unwrap();

        assert_approx_eq!(strategy.gamma, 0.95);
    }
}
