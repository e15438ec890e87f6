use anyhow::{bail, ensure, Result};
use engine::{Player, StateRecord, Step, TransitionModel};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    fn player(self) -> Player {
        match self {
            Mark::X => Player::Agent,
            Mark::O => Player::Opponent,
        }
    }

    fn from_player(player: Player) -> Self {
        match player {
            Player::Agent => Mark::X,
            Player::Opponent => Mark::O,
        }
    }

    fn other(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

pub type Board = [Option<Mark>; 9];

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

fn winner(board: &Board) -> Option<Mark> {
    LINES.iter().find_map(|[a, b, c]| match (board[*a], board[*b], board[*c]) {
        (Some(x), Some(y), Some(z)) if x == y && y == z => Some(x),
        _ => None,
    })
}

/// X is the agent. Rewards are +1 when X wins, -1 when O wins.
#[derive(Clone, Debug)]
pub struct TicTacToe {
    board: Board,
    to_move: Mark,
    last_action: Option<usize>,
    done: bool,
    reward: f32,
    t: usize,
}

impl TicTacToe {
    pub fn new(first: Mark) -> Self {
        Self {
            board: [None; 9],
            to_move: first,
            last_action: None,
            done: false,
            reward: 0.0,
            t: 0,
        }
    }

    /// Plays `moves` in order, alternating from `first`.
    pub fn from_moves(first: Mark, moves: &[usize]) -> Result<Self> {
        let mut game = Self::new(first);
        for action in moves {
            game.step(action)?;
        }

        Ok(game)
    }

    /// A position with the given marks and player to move.
    pub fn from_board(board: Board, to_move: Mark) -> Self {
        Self {
            board,
            to_move,
            last_action: None,
            done: false,
            reward: 0.0,
            t: board.iter().filter(|c| c.is_some()).count(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }
}

impl TransitionModel for TicTacToe {
    type State = Board;
    type Action = usize;
    type Observation = Board;
    type Info = ();

    fn legal_actions(&self) -> Vec<usize> {
        if self.done {
            return Vec::new();
        }

        (0..9).filter(|i| self.board[*i].is_none()).collect()
    }

    fn step(&mut self, action: &usize) -> Result<Step<Board, ()>> {
        ensure!(!self.done, "The game is over");
        ensure!(
            *action < 9 && self.board[*action].is_none(),
            "Cell {} is not playable",
            action
        );

        self.board[*action] = Some(self.to_move);
        self.last_action = Some(*action);
        self.t += 1;

        let (done, reward) = match winner(&self.board) {
            Some(Mark::X) => (true, 1.0),
            Some(Mark::O) => (true, -1.0),
            None => (self.board.iter().all(|c| c.is_some()), 0.0),
        };

        self.done = done;
        self.reward = reward;
        self.to_move = self.to_move.other();

        Ok(Step {
            observation: self.board,
            reward,
            done,
            truncated: false,
            info: (),
        })
    }

    fn backup(&self) -> StateRecord<Board, usize> {
        StateRecord {
            state: self.board,
            last_action: self.last_action,
            done: self.done,
            reward: self.reward,
            player: self.to_move.player(),
            t: self.t,
        }
    }

    fn load(&mut self, record: &StateRecord<Board, usize>) -> Result<()> {
        let xs = record.state.iter().filter(|c| **c == Some(Mark::X)).count();
        let os = record.state.iter().filter(|c| **c == Some(Mark::O)).count();
        if xs.abs_diff(os) > 1 {
            bail!("Malformed board: {} X and {} O", xs, os);
        }

        self.board = record.state;
        self.last_action = record.last_action;
        self.done = record.done;
        self.reward = record.reward;
        self.to_move = Mark::from_player(record.player);
        self.t = record.t;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_wins() {
        let game = TicTacToe::from_moves(Mark::X, &[0, 3, 1, 4, 2]).unwrap();
        let record = game.backup();

        assert!(record.done);
        assert_eq!(record.reward, 1.0);
        assert!(game.legal_actions().is_empty());
    }

    #[test]
    fn test_occupied_cell_is_rejected() {
        let mut game = TicTacToe::from_moves(Mark::O, &[4]).unwrap();

        assert!(game.step(&4).is_err());
        assert_eq!(game.legal_actions().len(), 8);
    }

    #[test]
    fn test_round_trip() {
        let mut game = TicTacToe::from_moves(Mark::O, &[0, 4, 2]).unwrap();
        let record = game.backup();

        game.step(&1).unwrap();
        game.load(&record).unwrap();

        assert_eq!(game.backup(), record);
        assert_eq!(game.legal_actions(), vec![1, 3, 5, 6, 7, 8]);
        assert_eq!(game.backup().player, Player::Agent);
    }

    #[test]
    fn test_malformed_record_is_rejected() {
        let mut game = TicTacToe::new(Mark::X);
        let mut record = game.backup();
        record.state = [Some(Mark::X); 9];

        assert!(game.load(&record).is_err());
    }
}
