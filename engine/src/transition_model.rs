use anyhow::Result;

use super::state_record::StateRecord;

/// The result of advancing a transition model by one action.
#[derive(Clone, Debug, PartialEq)]
pub struct Step<O, I> {
    pub observation: O,
    pub reward: f32,
    pub done: bool,
    pub truncated: bool,
    pub info: I,
}

/// A mutable simulator that the search advances and rewinds.
///
/// `load(&backup())` must leave the model observationally unchanged.
pub trait TransitionModel {
    type State: Clone + PartialEq;
    type Action: Clone + PartialEq;
    type Observation;
    type Info;

    fn legal_actions(&self) -> Vec<Self::Action>;

    fn step(&mut self, action: &Self::Action) -> Result<Step<Self::Observation, Self::Info>>;

    fn backup(&self) -> StateRecord<Self::State, Self::Action>;

    fn load(&mut self, record: &StateRecord<Self::State, Self::Action>) -> Result<()>;
}

pub trait StochasticTransitionModel: TransitionModel {
    /// Every state that `action` can lead to from the current state, without duplicates.
    fn next_states(&self, action: &Self::Action) -> Vec<Self::State>;
}
