use std::fmt::Debug;
use std::time::Duration;

use anyhow::{anyhow, bail, ensure, Context, Result};
use common::create_rng;
use engine::{Evaluator, TransitionModel};
use itertools::Itertools;
use log::debug;
use rand::prelude::StdRng;
use rand::Rng;

use super::rollout::evaluate_leaf;
use super::{
    BackpropagationStrategy, Checkpoint, EdgeDetails, MCTSOptions, NodeDetails,
    NodeId, SearchBudget, SelectionStrategy, Tree, UCB,
};

pub(crate) type BoxedEvaluator<S> = Box<dyn Evaluator<State = S>>;

/// Monte Carlo tree search over a mutable transition model.
///
/// The model is stepped during every iteration and always rolled back afterwards, so between
/// calls it only ever reflects the moves made by the caller.
pub struct MCTS<M, B>
where
    M: TransitionModel,
{
    model: M,
    tree: Option<Tree<M::State, M::Action>>,
    backpropagation: B,
    selection: UCB,
    evaluator: Option<BoxedEvaluator<M::State>>,
    options: MCTSOptions,
    rng: StdRng,
    decision_salt: u64,
}

impl<M, B> MCTS<M, B>
where
    M: TransitionModel,
    M::Action: Debug,
    B: BackpropagationStrategy,
{
    pub fn new(model: M, backpropagation: B, options: MCTSOptions) -> Self {
        let mut rng = create_rng(options.seed);
        let decision_salt = rng.gen();

        Self {
            model,
            tree: None,
            backpropagation,
            selection: UCB::new(options.exploration_constant),
            evaluator: None,
            options,
            rng,
            decision_salt,
        }
    }

    /// Replaces random rollouts with static evaluation of leaf states.
    pub fn with_evaluator<E>(mut self, evaluator: E) -> Self
    where
        E: Evaluator<State = M::State> + 'static,
    {
        self.evaluator = Some(Box::new(evaluator));
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Direct access to the live model, used to apply the real moves between decisions.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    pub fn tree(&self) -> Option<&Tree<M::State, M::Action>> {
        self.tree.as_ref()
    }

    pub fn options(&self) -> &MCTSOptions {
        &self.options
    }

    /// Discards the current tree and re-roots the search at the model's current state.
    pub fn init_tree(&mut self) {
        self.tree = Some(Tree::new(self.model.legal_actions(), self.model.backup()));
    }

    /// Runs search iterations without making a decision. Returns the number of iterations run.
    pub fn search(&mut self, iterations: Option<usize>, time: Option<Duration>) -> Result<usize> {
        let budget = SearchBudget::new(iterations, time)?;
        self.sync_root();

        let root = self.tree_ref()?.root_node();
        ensure!(!root.is_terminal(), "Cannot search from a terminal state");

        let mut tracker = budget.start();
        while !tracker.is_exhausted() {
            self.iterate()?;
            tracker.record_iteration();
        }

        debug!(
            "Searched {} iterations in {:?}, tree size {}",
            tracker.iterations(),
            tracker.elapsed(),
            self.tree_ref()?.len()
        );

        Ok(tracker.iterations())
    }

    /// Searches within the budget, then commits to the best root action.
    pub fn plan(&mut self, iterations: Option<usize>, time: Option<Duration>) -> Result<M::Action> {
        self.decision_salt = self.rng.gen();
        self.search(iterations, time)?;

        let salt = self.decision_salt;
        let keep_subtree = self.options.keep_subtree;
        let tree = self
            .tree
            .as_mut()
            .ok_or_else(|| anyhow!("No search tree"))?;
        let best = tree
            .best_child(tree.root(), salt)
            .ok_or_else(|| anyhow!("The root has no expanded children"))?;
        let action = tree
            .node(best)
            .action()
            .cloned()
            .ok_or_else(|| anyhow!("Child {} has no action", best))?;

        if keep_subtree {
            tree.keep_subtree(best);
        } else {
            self.tree = None;
        }

        debug!("Chose action {:?}", action);

        Ok(action)
    }

    /// Follows an action taken outside of the search, e.g. by an opponent.
    pub fn opponent_action(&mut self, action: &M::Action) -> Result<()> {
        let tree = match self.tree.as_mut() {
            Some(tree) => tree,
            None => return Ok(()),
        };

        let root = tree.root_node();
        ensure!(
            root.edges().contains(action),
            "Action {:?} is not legal at the root",
            action
        );

        let is_leaf = root.is_leaf();
        let child = root.edges().child(action);

        if is_leaf {
            return tree.root_node_mut().ply(action);
        }

        match child {
            Some(child) => tree.keep_subtree(child),
            None => self.tree = None,
        }

        Ok(())
    }

    /// Statistics of the root's children, best first.
    pub fn root_details(&self) -> Result<NodeDetails<M::Action>> {
        let tree = self.tree_ref()?;
        let root = tree.root_node();

        let children = tree
            .ranked_children(tree.root(), self.decision_salt)
            .into_iter()
            .map(|id| {
                let child = tree.node(id);
                let action = child
                    .action()
                    .cloned()
                    .ok_or_else(|| anyhow!("Child {} has no action", id))?;
                let details = EdgeDetails {
                    Nsa: child.visits(),
                    Wsa: child.score(),
                    Qsa: child.mean_score(),
                    Usa: self.selection.exploration(root.visits(), child.visits()),
                    c: self.selection.c,
                    UCB: self
                        .selection
                        .score(root.visits(), child.visits(), child.score()),
                };

                Ok((action, details))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(NodeDetails {
            visits: root.visits(),
            children,
        })
    }

    /// The sequence of best actions from the root, at most `max_len` long.
    pub fn principal_variation(&self, max_len: usize) -> Result<Vec<M::Action>> {
        let tree = self.tree_ref()?;
        let mut id = tree.root();
        let mut actions = Vec::new();

        while actions.len() < max_len {
            match tree.best_child(id, self.decision_salt) {
                Some(child) => {
                    actions.extend(tree.node(child).action().cloned());
                    id = child;
                }
                None => break,
            }
        }

        Ok(actions)
    }

    fn tree_ref(&self) -> Result<&Tree<M::State, M::Action>> {
        self.tree.as_ref().ok_or_else(|| anyhow!("No search tree"))
    }

    /// Rebuilds the tree when it is missing or no longer rooted at the live model state.
    fn sync_root(&mut self) {
        let record = self.model.backup();

        let in_sync = self.tree.as_ref().map_or(false, |tree| {
            let root = tree.root_node().record();
            root.state == record.state && root.t == record.t
        });

        if !in_sync {
            if self.tree.is_some() {
                debug!("Tree root does not match the model, rebuilding");
            }

            self.tree = Some(Tree::new(self.model.legal_actions(), record));
        }
    }

    fn iterate(&mut self) -> Result<()> {
        let tree = self
            .tree
            .as_mut()
            .ok_or_else(|| anyhow!("No search tree"))?;
        let mut model = Checkpoint::new(&mut self.model);
        let mut depth = 0;

        let selected = Self::select(tree, &mut *model, &self.selection, &mut depth)?;

        let (outcome_node, outcome) = if tree.node(selected).is_terminal() {
            (selected, tree.node(selected).game_reward())
        } else {
            let expanded = Self::expand(tree, &mut *model, &mut self.rng, selected)?;
            depth += 1;

            let node = tree.node(expanded);
            if node.is_terminal() {
                (expanded, node.game_reward())
            } else {
                let evaluation = evaluate_leaf(
                    &mut *model,
                    &mut self.rng,
                    self.evaluator.as_deref(),
                    depth,
                    self.options.max_depth,
                    self.backpropagation.rollout_discount(),
                )?;

                if let Some(node) = tree.get_mut(expanded) {
                    node.set_features(evaluation.features);
                }

                (expanded, evaluation.value)
            }
        };

        Self::backpropagate(tree, &self.backpropagation, outcome_node, outcome);

        model.restore()
    }

    fn select(
        tree: &Tree<M::State, M::Action>,
        model: &mut M,
        selection: &UCB,
        depth: &mut usize,
    ) -> Result<NodeId> {
        let mut id = tree.root();

        loop {
            let node = tree.node(id);
            if node.is_terminal() || node.is_leaf() || !node.is_fully_expanded() {
                return Ok(id);
            }

            let children = node.edges().children().collect_vec();
            let idx = selection
                .select(
                    node.visits(),
                    children.iter().map(|(_, child)| {
                        let child = tree.node(*child);
                        (child.visits(), child.score())
                    }),
                )
                .ok_or_else(|| anyhow!("Node {} has no children to select", id))?;

            let (action, child) = children[idx];
            model
                .step(action)
                .with_context(|| format!("Failed to step {:?} during selection", action))?;
            *depth += 1;
            id = child;
        }
    }

    fn expand(
        tree: &mut Tree<M::State, M::Action>,
        model: &mut M,
        rng: &mut StdRng,
        id: NodeId,
    ) -> Result<NodeId> {
        let action = match tree.node(id).random_untried_action(rng) {
            Some(action) => action,
            None => bail!("Node {} is not terminal but has no actions to expand", id),
        };

        model
            .step(&action)
            .with_context(|| format!("Failed to step {:?} during expansion", action))?;

        tree.insert(id, action, model.legal_actions(), model.backup())
    }

    fn backpropagate(
        tree: &mut Tree<M::State, M::Action>,
        backpropagation: &B,
        id: NodeId,
        outcome: f32,
    ) {
        let mut value = backpropagation.leaf_value(tree.node(id).player(), outcome);
        let mut current = Some(id);

        while let Some(id) = current {
            current = match tree.get_mut(id) {
                Some(node) => {
                    node.update(value);
                    node.parent()
                }
                None => None,
            };
            value = backpropagation.parent_value(value);
        }
    }
}
