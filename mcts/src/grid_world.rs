use anyhow::{bail, ensure, Result};
use engine::{Player, StateRecord, StochasticTransitionModel, Step, TransitionModel};
use rand::prelude::{SeedableRng, SliceRandom, StdRng};

pub const LEFT: usize = 0;
pub const DOWN: usize = 1;
pub const RIGHT: usize = 2;
pub const UP: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cell {
    Start,
    Frozen,
    Hole,
    Goal,
}

/// A frozen-lake style grid. Falling into a hole ends the episode with -1, reaching the goal
/// ends it with +1. When slippery, the agent moves in the intended direction or in one of the
/// two perpendicular directions with equal probability, and stays put when that move leaves
/// the grid.
pub struct GridWorld {
    cells: Vec<Cell>,
    width: usize,
    position: usize,
    last_action: Option<usize>,
    done: bool,
    reward: f32,
    t: usize,
    slip: Option<StdRng>,
}

impl GridWorld {
    pub fn new(rows: &[&str], start: usize) -> Result<Self> {
        let width = rows.first().map_or(0, |row| row.len());
        ensure!(width > 0, "The grid is empty");

        let mut cells = Vec::new();
        for row in rows {
            ensure!(row.len() == width, "Rows must have the same width");
            for c in row.chars() {
                cells.push(match c {
                    'S' => Cell::Start,
                    'F' => Cell::Frozen,
                    'H' => Cell::Hole,
                    'G' => Cell::Goal,
                    other => bail!("Unknown cell {:?}", other),
                });
            }
        }

        ensure!(start < cells.len(), "Start is outside the grid");

        Ok(Self {
            cells,
            width,
            position: start,
            last_action: None,
            done: false,
            reward: 0.0,
            t: 0,
            slip: None,
        })
    }

    pub fn slippery(mut self, seed: u64) -> Self {
        self.slip = Some(StdRng::seed_from_u64(seed));
        self
    }

    pub fn position(&self) -> usize {
        self.position
    }

    fn height(&self) -> usize {
        self.cells.len() / self.width
    }

    fn target(&self, from: usize, action: usize) -> Option<usize> {
        let (row, col) = (from / self.width, from % self.width);
        match action {
            LEFT if col > 0 => Some(from - 1),
            DOWN if row + 1 < self.height() => Some(from + self.width),
            RIGHT if col + 1 < self.width => Some(from + 1),
            UP if row > 0 => Some(from - self.width),
            _ => None,
        }
    }

    fn directions(&self, action: usize) -> Vec<usize> {
        match self.slip {
            Some(_) => vec![action, (action + 1) % 4, (action + 3) % 4],
            None => vec![action],
        }
    }
}

impl TransitionModel for GridWorld {
    type State = usize;
    type Action = usize;
    type Observation = usize;
    type Info = ();

    fn legal_actions(&self) -> Vec<usize> {
        if self.done {
            return Vec::new();
        }

        (0..4)
            .filter(|a| self.target(self.position, *a).is_some())
            .collect()
    }

    fn step(&mut self, action: &usize) -> Result<Step<usize, ()>> {
        ensure!(!self.done, "The episode is over");
        ensure!(
            self.target(self.position, *action).is_some(),
            "Action {} leaves the grid",
            action
        );

        let directions = self.directions(*action);
        let direction = match self.slip.as_mut() {
            Some(rng) => *directions.choose(rng).unwrap_or(action),
            None => *action,
        };

        self.position = self.target(self.position, direction).unwrap_or(self.position);
        self.last_action = Some(*action);
        self.t += 1;

        let (done, reward) = match self.cells[self.position] {
            Cell::Hole => (true, -1.0),
            Cell::Goal => (true, 1.0),
            Cell::Start | Cell::Frozen => (false, 0.0),
        };
        self.done = done;
        self.reward = reward;

        Ok(Step {
            observation: self.position,
            reward,
            done,
            truncated: false,
            info: (),
        })
    }

    fn backup(&self) -> StateRecord<usize, usize> {
        StateRecord {
            state: self.position,
            last_action: self.last_action,
            done: self.done,
            reward: self.reward,
            player: Player::Agent,
            t: self.t,
        }
    }

    fn load(&mut self, record: &StateRecord<usize, usize>) -> Result<()> {
        ensure!(
            record.state < self.cells.len(),
            "Position {} is outside the grid",
            record.state
        );

        self.position = record.state;
        self.last_action = record.last_action;
        self.done = record.done;
        self.reward = record.reward;
        self.t = record.t;

        Ok(())
    }
}

impl StochasticTransitionModel for GridWorld {
    fn next_states(&self, action: &usize) -> Vec<usize> {
        let mut states = Vec::new();
        for direction in self.directions(*action) {
            let state = self.target(self.position, direction).unwrap_or(self.position);
            if !states.contains(&state) {
                states.push(state);
            }
        }

        states
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_actions_stay_on_grid() {
        let world = GridWorld::new(&["SFF", "FHF", "FFG"], 0).unwrap();

        assert_eq!(world.legal_actions(), vec![DOWN, RIGHT]);
    }

    #[test]
    fn test_goal_and_hole() {
        let mut world = GridWorld::new(&["SFF", "FHF", "FFG"], 5).unwrap();
        let record = world.backup();

        let step = world.step(&DOWN).unwrap();
        assert!(step.done);
        assert_eq!(step.reward, 1.0);

        world.load(&record).unwrap();
        let step = world.step(&LEFT).unwrap();
        assert!(step.done);
        assert_eq!(step.reward, -1.0);
    }

    #[test]
    fn test_slippery_support() {
        let world = GridWorld::new(&["SF", "HG"], 0).unwrap().slippery(0);

        let mut right = world.next_states(&RIGHT);
        right.sort();
        let mut down = world.next_states(&DOWN);
        down.sort();

        assert_eq!(right, vec![0, 1, 2]);
        assert_eq!(down, vec![0, 1, 2]);
    }

    #[test]
    fn test_slippery_step_stays_in_support() {
        let mut world = GridWorld::new(&["SF", "HG"], 0).unwrap().slippery(5);
        let record = world.backup();
        let support = world.next_states(&RIGHT);

        for _ in 0..20 {
            world.step(&RIGHT).unwrap();
            assert!(support.contains(&world.position()));
            assert_eq!(world.backup().t, 1);
            world.load(&record).unwrap();
        }

        assert_eq!(world.backup(), record);
    }
}
