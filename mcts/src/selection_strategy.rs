use common::div_or_zero;

pub trait SelectionStrategy {
    fn score(&self, parent_visits: u32, child_visits: u32, child_score: f32) -> f32;

    /// Index of the best child among `(visits, score)` pairs. The first maximum wins.
    fn select<I>(&self, parent_visits: u32, children: I) -> Option<usize>
    where
        I: IntoIterator<Item = (u32, f32)>,
    {
        let mut best: Option<(usize, f32)> = None;

        for (idx, (visits, score)) in children.into_iter().enumerate() {
            let value = self.score(parent_visits, visits, score);
            if best.map_or(true, |(_, best_value)| value > best_value) {
                best = Some((idx, value));
            }
        }

        best.map(|(idx, _)| idx)
    }
}

/// Upper confidence bound applied to trees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UCB {
    pub c: f32,
}

impl UCB {
    pub fn new(c: f32) -> Self {
        Self { c }
    }

    pub fn exploitation(&self, child_visits: u32, child_score: f32) -> f32 {
        div_or_zero(child_score, child_visits as f32)
    }

    pub fn exploration(&self, parent_visits: u32, child_visits: u32) -> f32 {
        if parent_visits == 0 {
            return 0.0;
        }

        ((parent_visits as f32).ln() / child_visits as f32).sqrt()
    }
}

impl Default for UCB {
    fn default() -> Self {
        Self::new(std::f32::consts::SQRT_2)
    }
}

impl SelectionStrategy for UCB {
    fn score(&self, parent_visits: u32, child_visits: u32, child_score: f32) -> f32 {
        // Unvisited children are only reached through expansion.
        if child_visits == 0 {
            return f32::INFINITY;
        }

        self.exploitation(child_visits, child_score)
            + self.c * self.exploration(parent_visits, child_visits)
    }
}
