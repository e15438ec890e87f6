pub mod evaluator;
pub mod state_record;
pub mod transition_model;

pub use crate::evaluator::*;
pub use crate::state_record::*;
pub use crate::transition_model::*;
