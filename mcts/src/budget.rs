use std::time::{Duration, Instant};

use anyhow::{ensure, Result};

/// Limits on a search. At least one limit is set; an unset limit is unbounded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchBudget {
    iterations: Option<usize>,
    time: Option<Duration>,
}

impl SearchBudget {
    pub fn new(iterations: Option<usize>, time: Option<Duration>) -> Result<Self> {
        ensure!(
            iterations.is_some() || time.is_some(),
            "Either an iterations budget or a time budget must be set"
        );

        Ok(Self { iterations, time })
    }

    pub fn start(self) -> BudgetTracker {
        BudgetTracker {
            budget: self,
            started: Instant::now(),
            iterations: 0,
        }
    }
}

/// Checked between whole iterations only, so the last iteration can overrun the time limit.
pub struct BudgetTracker {
    budget: SearchBudget,
    started: Instant,
    iterations: usize,
}

impl BudgetTracker {
    pub fn is_exhausted(&self) -> bool {
        let out_of_iterations = self
            .budget
            .iterations
            .map_or(false, |max| self.iterations >= max);

        let out_of_time = self
            .budget
            .time
            .map_or(false, |max| self.started.elapsed() >= max);

        out_of_iterations || out_of_time
    }

    pub fn record_iteration(&mut self) {
        self.iterations += 1;
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
