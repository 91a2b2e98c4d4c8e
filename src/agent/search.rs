use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::othello::prelude::*;

use super::evaluator::Evaluator;
use super::{SCORE_MAX, SCORE_MIN, SCORE_TIMEOUT};

/// Advisory stop flag shared by a rank group. Setting it is idempotent;
/// searches observe it cooperatively and bail out with a sentinel score
/// instead of unwinding.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Node entries between polls of the cancel flag. Must stay small enough
/// that the deadline margin holds on the deepest branch.
const POLL_INTERVAL: u64 = 64;

/// One alpha-beta minimax over private board copies.
pub struct Search<'a> {
    evaluator: &'a Evaluator,
    cancel: &'a CancelToken,
    nodes: u64,
    timed_out: bool,
}

impl<'a> Search<'a> {
    pub fn new(evaluator: &'a Evaluator, cancel: &'a CancelToken) -> Search<'a> {
        Search { evaluator, cancel, nodes: 0, timed_out: false }
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// Minimax with alpha-beta pruning. Depth 0 and move-less nodes fall
    /// through to the evaluator. Alpha only ever narrows on the way
    /// down. A cancelled search returns the timeout sentinel, which the
    /// caller must discard.
    pub fn minimax(
        &mut self,
        board: &Board,
        to_move: Player,
        depth: u8,
        mut alpha: i32,
        mut beta: i32,
    ) -> i32 {
        if self.poll() {
            return SCORE_TIMEOUT;
        }

        let moves = board.legal_moves(to_move);
        if depth == 0 || moves.is_empty() {
            return self.evaluator.evaluate(board, self.cancel);
        }

        if to_move == self.evaluator.maximizing() {
            let mut best = SCORE_MIN;
            for square in moves.iter() {
                let mut child = *board;
                child.make_move(square, to_move);
                let score = self.minimax(&child, -to_move, depth - 1, alpha, beta);
                if score > best {
                    best = score;
                }
                if best > alpha {
                    alpha = best;
                }
                if beta <= alpha {
                    break;
                }
            }
            best
        } else {
            let mut best = SCORE_MAX;
            for square in moves.iter() {
                let mut child = *board;
                child.make_move(square, to_move);
                let score = self.minimax(&child, -to_move, depth - 1, alpha, beta);
                if score < best {
                    best = score;
                }
                if best < beta {
                    beta = best;
                }
                if beta <= alpha {
                    break;
                }
            }
            best
        }
    }

    fn poll(&mut self) -> bool {
        if self.timed_out {
            return true;
        }
        self.nodes += 1;
        if self.nodes % POLL_INTERVAL == 1 && self.cancel.is_cancelled() {
            self.timed_out = true;
        }
        self.timed_out
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    /// Reference minimax with no pruning and no cancellation.
    fn exhaustive(evaluator: &Evaluator, board: &Board, to_move: Player, depth: u8) -> i32 {
        let moves = board.legal_moves(to_move);
        if depth == 0 || moves.is_empty() {
            return evaluator.evaluate(board, &CancelToken::new());
        }
        let children = moves.iter().map(|square| {
            let mut child = *board;
            child.make_move(square, to_move);
            exhaustive(evaluator, &child, -to_move, depth - 1)
        });
        if to_move == evaluator.maximizing() {
            children.max().unwrap()
        } else {
            children.min().unwrap()
        }
    }

    /// A position reached by a handful of random legal moves.
    fn random_position(seed: u64, plies: usize) -> (Board, Player) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut board = Board::new();
        let mut to_move = Player::Black;
        for _ in 0..plies {
            let moves = board.legal_moves(to_move);
            if moves.is_empty() {
                break;
            }
            board.make_move(moves.as_slice()[rng.gen_range(0..moves.len())], to_move);
            to_move = -to_move;
        }
        (board, to_move)
    }

    #[test]
    fn pruning_never_changes_the_root_score() {
        for seed in 0..12 {
            let (board, to_move) = random_position(seed, 6);
            let evaluator = Evaluator::new(Player::Black);
            let expected = exhaustive(&evaluator, &board, to_move, 3);
            let cancel = CancelToken::new();
            let mut search = Search::new(&evaluator, &cancel);
            let pruned = search.minimax(&board, to_move, 3, SCORE_MIN, SCORE_MAX);
            assert_eq!(pruned, expected, "seed {seed}");
        }
    }

    #[test]
    fn a_cancelled_search_returns_the_sentinel() {
        let evaluator = Evaluator::new(Player::Black);
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut search = Search::new(&evaluator, &cancel);
        let score = search.minimax(&Board::new(), Player::Black, 5, SCORE_MIN, SCORE_MAX);
        assert_eq!(score, SCORE_TIMEOUT);
        assert!(search.timed_out());
    }

    #[test]
    fn a_wipeout_is_terminal() {
        let mut board = Board::blank();
        board.put(44, Player::Black);
        board.put(45, Player::Black);
        let evaluator = Evaluator::new(Player::Black);
        let cancel = CancelToken::new();
        let mut search = Search::new(&evaluator, &cancel);
        // Neither side can bracket anything, so any depth evaluates the
        // position directly instead of recursing.
        let score = search.minimax(&board, Player::White, 9, SCORE_MIN, SCORE_MAX);
        assert_eq!(score, evaluator.evaluate(&board, &CancelToken::new()));
        assert_eq!(search.nodes(), 1);
    }

    #[test]
    fn deeper_search_still_sees_the_forced_wipeout_score() {
        let mut board = Board::blank();
        board.put(44, Player::Black);
        board.put(45, Player::Black);
        let evaluator = Evaluator::new(Player::Black);
        let cancel = CancelToken::new();
        let mut search = Search::new(&evaluator, &cancel);
        let score = search.minimax(&board, Player::White, 3, SCORE_MIN, SCORE_MAX);
        // Opening blend: parity weight 5 on the wipeout sentinel, plus
        // stability counting both discs as anchorless.
        assert!(score >= 5 * crate::agent::SCORE_WIPEOUT - 5_000);
    }
}
