use anyhow::{anyhow, Context, Result};
use engine::{Evaluation, Evaluator, TransitionModel};
use log::trace;
use rand::seq::SliceRandom;
use rand::Rng;

/// Plays uniformly random actions until the episode ends and returns the discounted sum of
/// rewards. `depth` is the number of steps already taken from the root; reaching `max_depth`
/// without the episode ending scores 0, while an episode ending on the last allowed step keeps
/// its reward.
pub fn random_rollout<M, R>(
    model: &mut M,
    rng: &mut R,
    mut depth: usize,
    max_depth: usize,
    discount: f32,
) -> Result<f32>
where
    M: TransitionModel,
    R: Rng + ?Sized,
{
    let mut total = 0.0;
    let mut weight = 1.0;

    loop {
        if depth >= max_depth {
            trace!("Rollout reached the depth limit of {}", max_depth);
            return Ok(0.0);
        }

        let actions = model.legal_actions();
        let action = actions
            .choose(rng)
            .ok_or_else(|| anyhow!("No legal actions in a non-terminal state"))?;

        let step = model.step(action).context("Failed to step during rollout")?;
        total += weight * step.reward;
        weight *= discount;
        depth += 1;

        if step.done || step.truncated {
            return Ok(total);
        }
    }
}

/// Value of the model's current state: the evaluator's estimate when one is configured,
/// otherwise a random rollout.
pub(crate) fn evaluate_leaf<M, R>(
    model: &mut M,
    rng: &mut R,
    evaluator: Option<&dyn Evaluator<State = M::State>>,
    depth: usize,
    max_depth: usize,
    discount: f32,
) -> Result<Evaluation>
where
    M: TransitionModel,
    R: Rng + ?Sized,
{
    match evaluator {
        Some(evaluator) => {
            let record = model.backup();
            Ok(evaluator.evaluate(&record.state, record.t))
        }
        None => {
            let value = random_rollout(model, rng, depth, max_depth, discount)?;
            Ok(Evaluation::new(value))
        }
    }
}
