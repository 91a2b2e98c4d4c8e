use std::cmp::Reverse;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Barrier};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use itertools::Itertools;

use crate::agent::prelude::*;
use crate::othello::prelude::*;

use super::messages::{Broadcast, Envelope, Message, SearchReply};
use super::{COORDINATOR, worker};

/// How long one handout probe blocks before the deadline is rechecked.
const HANDOUT_POLL: Duration = Duration::from_millis(1);

/// Channel handles the coordinator holds for one worker rank.
struct WorkerLink {
    messages: Sender<Envelope>,
    broadcasts: Sender<Broadcast>,
}

/// The coordinator's face of the rank group. Spawns the workers once at
/// startup; they live until shutdown and are re-armed for every search
/// by a fresh position broadcast.
pub struct SearchPool {
    colour: Player,
    time_limit: Duration,
    links: Vec<WorkerLink>,
    inbox: Receiver<Envelope>,
    gather: Receiver<SearchReply>,
    barrier: Arc<Barrier>,
    cancel: CancelToken,
    handles: Vec<JoinHandle<()>>,
}

impl SearchPool {
    /// Spawns `workers` ranks and announces the colour they maximize.
    pub fn spawn(colour: Player, workers: usize, time_limit: Duration) -> Result<SearchPool> {
        let workers = workers.max(1);
        let barrier = Arc::new(Barrier::new(workers + 1));
        let cancel = CancelToken::new();
        let (to_coordinator, inbox) = mpsc::channel();
        let (gather_tx, gather) = mpsc::channel();

        let (message_txs, message_rxs): (Vec<_>, Vec<_>) =
            (0..workers).map(|_| mpsc::channel()).unzip();
        let (broadcast_txs, broadcast_rxs): (Vec<_>, Vec<_>) =
            (0..workers).map(|_| mpsc::channel()).unzip();

        let mut handles = Vec::with_capacity(workers);
        for (index, (worker_inbox, broadcasts)) in
            message_rxs.into_iter().zip(broadcast_rxs).enumerate()
        {
            let rank = index + 1;
            let harness = worker::Harness {
                rank,
                inbox: worker_inbox,
                broadcasts,
                coordinator: to_coordinator.clone(),
                peers: message_txs
                    .iter()
                    .enumerate()
                    .filter(|&(peer, _)| peer != index)
                    .map(|(_, tx)| tx.clone())
                    .collect(),
                gather: gather_tx.clone(),
                barrier: barrier.clone(),
                cancel: cancel.clone(),
            };
            let handle = thread::Builder::new()
                .name(format!("reverso-worker-{rank}"))
                .spawn(move || worker::run(harness))
                .context("could not spawn a worker rank")?;
            handles.push(handle);
        }

        let links = message_txs
            .into_iter()
            .zip(broadcast_txs)
            .map(|(messages, broadcasts)| WorkerLink { messages, broadcasts })
            .collect();

        let pool = SearchPool {
            colour,
            time_limit,
            links,
            inbox,
            gather,
            barrier,
            cancel,
            handles,
        };
        pool.broadcast(Broadcast::Colour(colour))?;
        Ok(pool)
    }

    pub fn colour(&self) -> Player {
        self.colour
    }

    /// Picks a move for the current position, inside the wall-clock
    /// budget. Returns `Move::Pass` iff there is no legal move.
    ///
    /// Runs the iterative-deepening ladder: each depth streams the sorted
    /// root moves to whichever worker asks first, then meets the workers
    /// at a barrier, drains in-flight messages, and gathers their best
    /// pairs. A depth interrupted by the deadline is discarded; the last
    /// completed depth's choice stands.
    pub fn generate_move(&mut self, board: &Board) -> Result<Move> {
        let started = Instant::now();
        self.cancel.reset();
        self.broadcast(Broadcast::Running(true))?;
        self.broadcast(Broadcast::Position(*board))?;

        let roots = sorted_roots(board, self.colour);
        let n = roots.len();
        let budget = self.time_limit.saturating_sub(SAFETY_MARGIN);

        let mut best: (Option<usize>, i32) = (None, SCORE_MIN);
        let mut depth = START_DEPTH - 1;
        let mut timeout = false;
        let mut stop_after_this_depth = false;
        // Ranks whose next-depth opening request was swept up by the
        // previous depth's drain; they are owed a move before anyone else.
        let mut pending_openers: Vec<usize> = Vec::new();

        while !timeout {
            let mut handed_out = 0;
            let mut completed = 0;
            let depth_started = Instant::now();

            if started.elapsed() >= budget || depth >= DEPTH_CAP || stop_after_this_depth {
                self.raise_timeout();
                timeout = true;
            }

            for rank in pending_openers.drain(..) {
                if !timeout && n > 1 && handed_out < n {
                    self.post(rank, Message::SendMove(roots[handed_out]))?;
                    handed_out += 1;
                }
            }

            while completed < n && !timeout && n > 1 {
                match self.inbox.recv_timeout(HANDOUT_POLL) {
                    Ok(Envelope { from, message: Message::RequestMove { completed: done } }) => {
                        if done {
                            completed += 1;
                        }
                        if handed_out < n {
                            self.post(from, Message::SendMove(roots[handed_out]))?;
                            handed_out += 1;
                        }
                    }
                    Ok(_) => {}
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => {
                        return Err(anyhow!("worker ranks vanished during handout"));
                    }
                }
                if completed >= n {
                    // Going deeper costs at least as much as this depth
                    // did; stop here if that cannot fit the budget.
                    if depth_started.elapsed() + started.elapsed() >= budget {
                        stop_after_this_depth = true;
                    }
                } else if started.elapsed() >= budget {
                    self.raise_timeout();
                    timeout = true;
                }
            }

            // With one root move there is nothing to parallelize, and
            // with zero the reply is a pass; either way the workers are
            // told to drop out of their ladder.
            if n <= 1 && !timeout {
                self.raise_timeout();
                timeout = true;
            }

            if !timeout {
                self.post_all(Message::NoMovesLeft)?;
            }

            self.barrier.wait();
            while let Ok(envelope) = self.inbox.try_recv() {
                if let Envelope { from, message: Message::RequestMove { completed: false } } =
                    envelope
                {
                    pending_openers.push(from);
                }
            }

            let mut replies = Vec::with_capacity(self.links.len());
            for _ in 0..self.links.len() {
                replies.push(self.gather.recv().context("lost a worker rank during gather")?);
            }

            let depth_completed = n > 1 && completed == n;
            if depth_completed {
                // Lowest rank wins ties, so order the replies first.
                replies.sort_by_key(|reply| reply.rank);
                for reply in replies {
                    if reply.best.is_some() && reply.score > best.1 {
                        best = (reply.best, reply.score);
                    }
                }
                log::debug!(
                    "depth {} complete in {:?}, best {:?}",
                    depth + 1,
                    depth_started.elapsed(),
                    best
                );
            }
            depth += 1;
        }

        // Deadline beat the very first depth, or the position allowed no
        // parallel search at all: fall back to the strongest-ordered root.
        if best.0.is_none() && n > 0 {
            best.0 = Some(roots[0]);
        }

        log::info!(
            "chose {:?} from {} roots in {:?}",
            best.0,
            n,
            started.elapsed()
        );
        Ok(match best.0 {
            Some(square) => Move::Square(square),
            None => Move::Pass,
        })
    }

    /// Stops the workers and joins them. Safe to call twice.
    pub fn shutdown(&mut self) {
        for link in self.links.iter() {
            let _ = link.broadcasts.send(Broadcast::Running(false));
        }
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }

    fn broadcast(&self, payload: Broadcast) -> Result<()> {
        for link in self.links.iter() {
            link.broadcasts
                .send(payload.clone())
                .map_err(|_| anyhow!("a worker rank is unreachable"))?;
        }
        Ok(())
    }

    fn post(&self, rank: usize, message: Message) -> Result<()> {
        self.links[rank - 1]
            .messages
            .send(Envelope { from: COORDINATOR, message })
            .map_err(|_| anyhow!("worker rank {rank} is unreachable"))
    }

    fn post_all(&self, message: Message) -> Result<()> {
        for rank in 1..=self.links.len() {
            self.post(rank, message)?;
        }
        Ok(())
    }

    /// Advisory and idempotent: the flag stops searches mid-tree, the
    /// messages release workers blocked on their inboxes.
    fn raise_timeout(&self) {
        self.cancel.cancel();
        for rank in 1..=self.links.len() {
            let _ = self.post(rank, Message::Timeout);
        }
    }
}

impl Drop for SearchPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Root moves sorted by the static square weights, strongest first.
/// Ties keep their row-major enumeration order.
fn sorted_roots(board: &Board, colour: Player) -> Vec<usize> {
    board
        .legal_moves(colour)
        .iter()
        .sorted_by_key(|&square| Reverse(SQUARE_WEIGHTS[square]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(colour: Player, workers: usize, limit: Duration) -> SearchPool {
        SearchPool::spawn(colour, workers, limit).unwrap()
    }

    /// Black's four openings are symmetric; any of them is correct.
    #[test]
    fn picks_one_of_the_four_openings() {
        let mut pool = pool(Player::Black, 4, Duration::from_millis(1000));
        let mv = pool.generate_move(&Board::new()).unwrap();
        let Move::Square(square) = mv else { panic!("expected a square, got {mv:?}") };
        assert!([34, 43, 56, 65].contains(&square));
    }

    #[test]
    fn an_open_corner_is_handed_out_first() {
        let mut board = Board::blank();
        board.put(12, Player::White);
        board.put(13, Player::Black);
        board.put(51, Player::White);
        board.put(61, Player::Black);
        assert_eq!(sorted_roots(&board, Player::Black), vec![11, 41]);
    }

    #[test]
    fn ties_keep_row_major_order() {
        assert_eq!(sorted_roots(&Board::new(), Player::Black), vec![34, 43, 56, 65]);
    }

    #[test]
    fn passes_without_searching() {
        let mut board = Board::blank();
        board.put(11, Player::Black);
        let started = Instant::now();
        let mut pool = pool(Player::Black, 2, Duration::from_secs(4));
        assert_eq!(pool.generate_move(&board).unwrap(), Move::Pass);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn a_forced_move_is_played_immediately() {
        let mut board = Board::blank();
        board.put(11, Player::Black);
        board.put(12, Player::White);
        let started = Instant::now();
        let mut pool = pool(Player::Black, 2, Duration::from_secs(4));
        assert_eq!(pool.generate_move(&board).unwrap(), Move::Square(13));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn a_tight_deadline_still_yields_a_legal_move() {
        // A midgame-ish position three plies in.
        let mut board = Board::new();
        board.make_move(34, Player::Black);
        board.make_move(35, Player::White);
        board.make_move(36, Player::Black);

        let started = Instant::now();
        let mut pool = pool(Player::White, 2, Duration::from_millis(500));
        let mv = pool.generate_move(&board).unwrap();
        assert!(started.elapsed() < Duration::from_millis(1000));

        let Move::Square(square) = mv else { panic!("expected a square, got {mv:?}") };
        assert!(board.is_legal(square, Player::White));
    }

    #[test]
    fn worker_count_does_not_change_a_scripted_board() {
        let script = [(34, Player::Black), (35, Player::White), (36, Player::Black)];
        let mut one = Board::new();
        let mut other = Board::new();
        for (square, colour) in script {
            one.make_move(square, colour);
            other.make_move(square, colour);
        }
        assert_eq!(one, other);

        for workers in [1, 4] {
            let mut pool = pool(Player::White, workers, Duration::from_millis(500));
            let mv = pool.generate_move(&one).unwrap();
            let Move::Square(square) = mv else { panic!("expected a square, got {mv:?}") };
            assert!(one.is_legal(square, Player::White));
        }
    }
}
