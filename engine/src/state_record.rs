use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    Agent,
    Opponent,
}

/// A full snapshot of a transition model, sufficient to restore it with `load`.
///
/// `player` is the player to move in `state`. `reward` is the reward of the transition that
/// produced `state`, seen from the agent's perspective.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateRecord<S, A> {
    pub state: S,
    pub last_action: Option<A>,
    pub done: bool,
    pub reward: f32,
    pub player: Player,
    pub t: usize,
}
