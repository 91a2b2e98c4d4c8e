use crate::othello::prelude::*;

use super::search::CancelToken;
use super::{SCORE_TIMEOUT, SCORE_WIPEOUT, START_DEPTH};

/// Below this disc count the opening weights apply.
pub const OPENING_PHASE_LIMIT: usize = 14;

/// Weights applied to the normalized sub-scores in one game phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseWeights {
    pub parity: i32,
    pub corners: i32,
    pub mobility: i32,
    pub stability: i32,
}

/// Staged positional evaluator: parity, mobility, corners, and spiral
/// stability, blended by game phase. Every score is from the maximizing
/// player's point of view.
#[derive(Clone, Copy, Debug)]
pub struct Evaluator {
    max: Player,
    endgame_at: usize,
    pub opening: PhaseWeights,
    pub midgame: PhaseWeights,
    pub endgame: PhaseWeights,
}

impl Evaluator {
    pub fn new(max: Player) -> Evaluator {
        Evaluator {
            max,
            endgame_at: 64 - START_DEPTH as usize,
            opening: PhaseWeights { parity: 5, corners: 30, mobility: 10, stability: 20 },
            midgame: PhaseWeights { parity: 25, corners: 30, mobility: 1, stability: 25 },
            // Zeroing corners this late is aggressive; tune per opponent.
            endgame: PhaseWeights { parity: 1, corners: 0, mobility: 0, stability: 0 },
        }
    }

    /// The colour this evaluator maximizes for.
    pub fn maximizing(&self) -> Player {
        self.max
    }

    /// Disc-count differential; +10000 once the opponent is wiped out.
    pub fn parity(&self, board: &Board) -> i32 {
        let max_val = board.count(self.max) as i32;
        let min_val = board.count(-self.max) as i32;
        if min_val == 0 {
            return SCORE_WIPEOUT;
        }
        normalized(max_val, min_val)
    }

    /// Legal-move-count differential.
    pub fn mobility(&self, board: &Board) -> i32 {
        normalized(
            board.legal_moves(self.max).len() as i32,
            board.legal_moves(-self.max).len() as i32,
        )
    }

    /// Corner-ownership differential.
    pub fn corners(&self, board: &Board) -> i32 {
        let mine: Cell = self.max.into();
        let theirs: Cell = (-self.max).into();
        let max_val = CORNERS.iter().filter(|&&sq| board.get(sq) == mine).count() as i32;
        let min_val = CORNERS.iter().filter(|&&sq| board.get(sq) == theirs).count() as i32;
        normalized(max_val, min_val)
    }

    /// Net stable-minus-unstable discs; None when cancelled mid-walk.
    pub fn stability(&self, board: &Board, cancel: &CancelToken) -> Option<i32> {
        board
            .stability_counts(self.max, || cancel.is_cancelled())
            .map(|(max_net, min_net)| normalized(max_net, min_net))
    }

    /// Phase-weighted blend of the four sub-scores.
    pub fn evaluate(&self, board: &Board, cancel: &CancelToken) -> i32 {
        let phase = board.occupied();
        let weights = if phase < OPENING_PHASE_LIMIT {
            self.opening
        } else if phase < self.endgame_at {
            self.midgame
        } else {
            self.endgame
        };

        let mut total = 0;
        if weights.parity != 0 {
            total += weights.parity * self.parity(board);
        }
        if weights.corners != 0 {
            total += weights.corners * self.corners(board);
        }
        if weights.mobility != 0 {
            total += weights.mobility * self.mobility(board);
        }
        if weights.stability != 0 {
            match self.stability(board, cancel) {
                Some(score) => total += weights.stability * score,
                None => return SCORE_TIMEOUT,
            }
        }
        total
    }
}

/// 100·(max−min)/(max+min), zero when the denominator vanishes.
fn normalized(max_val: i32, min_val: i32) -> i32 {
    if max_val + min_val == 0 {
        0
    } else {
        100 * (max_val - min_val) / (max_val + min_val)
    }
}
