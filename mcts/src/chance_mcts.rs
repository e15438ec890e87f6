use std::fmt::Debug;
use std::time::Duration;

use anyhow::{anyhow, bail, ensure, Context, Result};
use common::{create_rng, TranspositionHash};
use engine::{Evaluator, StochasticTransitionModel};
use itertools::Itertools;
use log::{debug, trace};
use rand::prelude::StdRng;
use rand::Rng;

use super::mcts::BoxedEvaluator;
use super::rollout::evaluate_leaf;
use super::{
    BackpropagationStrategy, ChanceTree, Checkpoint, DiscountedBackpropagation, EdgeDetails,
    MCTSOptions, NodeDetails, NodeId, SearchBudget, SelectionStrategy, TranspositionKey, UCB,
};

/// Where selection stopped.
enum Selection {
    /// A choice node that is terminal or still has untried actions.
    Choice(NodeId),
    /// The last chance node of the path, whose sampled outcome has no node yet.
    Chance,
}

/// Single-agent search for stochastic models, alternating choice and chance nodes.
///
/// Choice nodes reached through different outcomes with the same state and time are shared.
/// After `plan` the root is the chosen chance node; `determinize_chance_node` moves it to the
/// outcome the environment actually produced.
pub struct ChanceMCTS<M>
where
    M: StochasticTransitionModel,
{
    model: M,
    tree: Option<ChanceTree<M::State, M::Action>>,
    backpropagation: DiscountedBackpropagation,
    selection: UCB,
    evaluator: Option<BoxedEvaluator<M::State>>,
    options: MCTSOptions,
    rng: StdRng,
    decision_salt: u64,
}

impl<M> ChanceMCTS<M>
where
    M: StochasticTransitionModel,
    M::State: TranspositionHash + Debug,
    M::Action: Debug,
{
    pub fn new(model: M, backpropagation: DiscountedBackpropagation, options: MCTSOptions) -> Self {
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

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    pub fn tree(&self) -> Option<&ChanceTree<M::State, M::Action>> {
        self.tree.as_ref()
    }

    pub fn init_tree(&mut self) {
        self.tree = Some(ChanceTree::new(
            self.model.legal_actions(),
            self.model.backup(),
        ));
    }

    pub fn search(&mut self, iterations: Option<usize>, time: Option<Duration>) -> Result<usize> {
        let budget = SearchBudget::new(iterations, time)?;

        if let Some(tree) = &self.tree {
            assert!(
                !tree.root_node().is_chance(),
                "Cannot search from chance node {}, determinize it first",
                tree.root()
            );
        }

        self.sync_root();

        let tree = self.tree_ref()?;
        ensure!(
            !tree.choice(tree.root()).is_terminal(),
            "Cannot search from a terminal state"
        );

        let mut tracker = budget.start();
        while !tracker.is_exhausted() {
            self.iterate()?;
            tracker.record_iteration();
        }

        debug!(
            "Searched {} iterations in {:?}, tree size {}, transpositions {}",
            tracker.iterations(),
            tracker.elapsed(),
            self.tree_ref()?.len(),
            self.tree_ref()?.transposition_count()
        );

        Ok(tracker.iterations())
    }

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
        let action = tree.chance(best).action().clone();

        if keep_subtree {
            tree.keep_subtree(best);
        } else {
            self.tree = None;
        }

        debug!("Chose action {:?}", action);

        Ok(action)
    }

    /// Moves the root from the chosen chance node to the outcome that was observed.
    pub fn determinize_chance_node(&mut self, state: &M::State) -> Result<()> {
        let tree = match self.tree.as_mut() {
            Some(tree) => tree,
            None => return Ok(()),
        };

        assert!(
            tree.root_node().is_chance(),
            "Root {} is not a chance node",
            tree.root()
        );

        let outcomes = tree.chance(tree.root()).outcomes();
        ensure!(
            outcomes.contains(state),
            "State {:?} is not a possible outcome of the root",
            state
        );

        match outcomes.child(state) {
            Some(child) => tree.keep_subtree(child),
            None => self.tree = None,
        }

        Ok(())
    }

    /// Statistics of the root's actions, best first. The root must be a choice node.
    pub fn root_details(&self) -> Result<NodeDetails<M::Action>> {
        let tree = self.tree_ref()?;
        let root = tree.root_node().as_choice().ok_or_else(|| {
            anyhow!("Root {} is a chance node", tree.root())
        })?;

        let children = tree
            .ranked_children(tree.root(), self.decision_salt)
            .into_iter()
            .map(|id| {
                let visits = tree.visits(id);
                let details = EdgeDetails {
                    Nsa: visits,
                    Wsa: tree.score(id),
                    Qsa: tree.mean_score(id),
                    Usa: self.selection.exploration(root.visits(), visits),
                    c: self.selection.c,
                    UCB: self.selection.score(root.visits(), visits, tree.score(id)),
                };

                (tree.chance(id).action().clone(), details)
            })
            .collect();

        Ok(NodeDetails {
            visits: root.visits(),
            children,
        })
    }

    fn tree_ref(&self) -> Result<&ChanceTree<M::State, M::Action>> {
        self.tree.as_ref().ok_or_else(|| anyhow!("No search tree"))
    }

    fn sync_root(&mut self) {
        let record = self.model.backup();

        let in_sync = self.tree.as_ref().map_or(false, |tree| {
            let root = tree.choice(tree.root()).record();
            root.state == record.state && root.t == record.t
        });

        if !in_sync {
            if self.tree.is_some() {
                debug!("Tree root does not match the model, rebuilding");
            }

            self.tree = Some(ChanceTree::new(self.model.legal_actions(), record));
        }
    }

    fn iterate(&mut self) -> Result<()> {
        let tree = self
            .tree
            .as_mut()
            .ok_or_else(|| anyhow!("No search tree"))?;
        let mut model = Checkpoint::new(&mut self.model);
        let backpropagation = &self.backpropagation;
        let mut path = Vec::new();

        let leaf = match Self::select(tree, &mut *model, &self.selection, &mut path)? {
            Selection::Choice(id) if tree.choice(id).is_terminal() => id,
            Selection::Choice(id) => {
                let chance = Self::expand(tree, &mut *model, &mut self.rng, id)?;
                path.push((id, chance));
                Self::resolve_outcome(tree, &*model, backpropagation, &path)?
            }
            Selection::Chance => Self::resolve_outcome(tree, &*model, backpropagation, &path)?,
        };

        let value = if tree.choice(leaf).is_terminal() {
            tree.choice(leaf).game_reward()
        } else {
            let evaluation = evaluate_leaf(
                &mut *model,
                &mut self.rng,
                self.evaluator.as_deref(),
                path.len(),
                self.options.max_depth,
                backpropagation.rollout_discount(),
            )?;

            tree.choice_mut(leaf).set_features(evaluation.features);
            evaluation.value
        };

        let player = tree.choice(leaf).record().player;
        let value = backpropagation.leaf_value(player, value);
        tree.choice_mut(leaf).update(1, value);
        Self::backpropagate(tree, backpropagation, &path, leaf, 1, value);

        model.restore()
    }

    /// Descends from the root, recording every `(choice, chance)` pair passed through in `path`.
    fn select(
        tree: &ChanceTree<M::State, M::Action>,
        model: &mut M,
        selection: &UCB,
        path: &mut Vec<(NodeId, NodeId)>,
    ) -> Result<Selection> {
        let mut id = tree.root();

        loop {
            let node = tree.choice(id);
            if node.is_terminal() || node.is_leaf() || !node.is_fully_expanded() {
                return Ok(Selection::Choice(id));
            }

            let children = node.edges().children().collect_vec();
            let idx = selection
                .select(
                    node.visits(),
                    children
                        .iter()
                        .map(|(_, chance)| (tree.visits(*chance), tree.score(*chance))),
                )
                .ok_or_else(|| anyhow!("Node {} has no children to select", id))?;

            let (action, chance) = children[idx];
            model
                .step(action)
                .with_context(|| format!("Failed to step {:?} during selection", action))?;
            path.push((id, chance));

            let state = model.backup().state;
            let outcomes = tree.chance(chance).outcomes();
            ensure!(
                outcomes.contains(&state),
                "Outcome {:?} of {:?} is not in the support of chance node {}",
                state,
                action,
                chance
            );

            match outcomes.child(&state) {
                Some(next) => id = next,
                None => return Ok(Selection::Chance),
            }
        }
    }

    /// Tries a new action from choice node `id` and returns the chance node created for it.
    fn expand(
        tree: &mut ChanceTree<M::State, M::Action>,
        model: &mut M,
        rng: &mut StdRng,
        id: NodeId,
    ) -> Result<NodeId> {
        let action = match tree.choice(id).edges().random_available(rng) {
            Some(action) => action.clone(),
            None => bail!("Node {} is not terminal but has no actions to expand", id),
        };

        let support = model.next_states(&action);
        model
            .step(&action)
            .with_context(|| format!("Failed to step {:?} during expansion", action))?;

        tree.insert_chance(id, action, support)
    }

    /// Finds or creates the choice node for the model's current state under the last chance
    /// node of `path`.
    ///
    /// An existing node found through the transposition table is attached as an extra child and
    /// its statistics are added once along `path`, so the new edge accounts for what was already
    /// learned about it.
    fn resolve_outcome(
        tree: &mut ChanceTree<M::State, M::Action>,
        model: &M,
        backpropagation: &DiscountedBackpropagation,
        path: &[(NodeId, NodeId)],
    ) -> Result<NodeId> {
        let (parent, chance) = *path
            .last()
            .ok_or_else(|| anyhow!("No chance node to resolve"))?;
        let record = model.backup();

        ensure!(
            record.t > tree.choice(parent).t(),
            "The transition model did not advance time at {}",
            record.t
        );
        ensure!(
            tree.chance(chance).outcomes().contains(&record.state),
            "Outcome {:?} is not in the support of chance node {}",
            record.state,
            chance
        );

        let key = TranspositionKey::new(&record.state, record.t);
        match tree.find_choice(&key) {
            Some(existing) => {
                tree.attach_choice(chance, &record.state, existing)?;

                let node = tree.choice(existing);
                let (visits, score) = (node.visits(), node.score());
                trace!(
                    "Transposition {} merged under chance node {} with {} visits",
                    existing,
                    chance,
                    visits
                );

                if visits > 0 {
                    Self::backpropagate(tree, backpropagation, path, existing, visits, score);
                }

                Ok(existing)
            }
            None => {
                let legal_actions = model.legal_actions();
                tree.insert_choice(chance, record.state.clone(), legal_actions, record)
            }
        }
    }

    /// Adds `visits` and `value`, the score gained by choice node `child` below the last pair of
    /// `path`, to every node of `path`. A chance node books its outcome's value as is on the
    /// edge it came through; the choice node above it takes it discounted.
    fn backpropagate(
        tree: &mut ChanceTree<M::State, M::Action>,
        backpropagation: &DiscountedBackpropagation,
        path: &[(NodeId, NodeId)],
        mut child: NodeId,
        visits: u32,
        mut value: f32,
    ) {
        for &(choice, chance) in path.iter().rev() {
            tree.chance_mut(chance).update(child, visits, value);
            value = backpropagation.parent_value(value);
            tree.choice_mut(choice).update(visits, value);
            child = choice;
        }
    }
}
