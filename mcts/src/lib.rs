pub mod backpropagation_strategy;
pub mod budget;
pub mod chance_mcts;
pub mod chance_node;
pub mod chance_tree;
pub mod checkpoint;
pub mod edge_store;
#[cfg(test)]
mod grid_world;
pub mod mcts;
pub mod node;
pub mod node_arena;
pub mod node_details;
pub mod options;
pub mod rollout;
pub mod selection_strategy;
#[cfg(test)]
mod tic_tac_toe;
pub mod tree;

pub use backpropagation_strategy::*;
pub use budget::*;
pub use chance_mcts::*;
pub use chance_node::*;
pub use chance_tree::*;
pub use checkpoint::*;
pub use edge_store::*;
pub use mcts::*;
pub use node::*;
pub use node_arena::*;
pub use node_details::*;
pub use options::*;
pub use rollout::*;
pub use selection_strategy::*;
pub use tree::*;
