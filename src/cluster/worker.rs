use std::sync::{Arc, Barrier};
use std::sync::mpsc::{Receiver, Sender};

use crate::agent::prelude::*;
use crate::othello::prelude::*;

use super::messages::{Broadcast, Envelope, Message, SearchReply};

/// Everything one worker rank owns: its inbox, handles to every other
/// rank, and the group-wide barrier and cancel flag.
pub(super) struct Harness {
    pub rank: usize,
    pub inbox: Receiver<Envelope>,
    pub broadcasts: Receiver<Broadcast>,
    pub coordinator: Sender<Envelope>,
    pub peers: Vec<Sender<Envelope>>,
    pub gather: Sender<SearchReply>,
    pub barrier: Arc<Barrier>,
    pub cancel: CancelToken,
}

impl Harness {
    fn post(&self, message: Message) {
        let _ = self.coordinator.send(Envelope { from: self.rank, message });
    }
}

/// The worker main loop. Blocks on broadcasts between searches; a closed
/// broadcast channel counts as a shutdown.
pub(super) fn run(harness: Harness) {
    let colour = match harness.broadcasts.recv() {
        Ok(Broadcast::Colour(colour)) => colour,
        _ => return,
    };
    let evaluator = Evaluator::new(colour);

    loop {
        match harness.broadcasts.recv() {
            Ok(Broadcast::Running(true)) => {}
            Ok(Broadcast::Running(false)) | Err(_) => return,
            Ok(_) => continue,
        }
        let board = match harness.broadcasts.recv() {
            Ok(Broadcast::Position(board)) => board,
            Err(_) => return,
            Ok(_) => continue,
        };
        search_one_move(&harness, &evaluator, colour, &board);
    }
}

/// One iterative-deepening ladder: request roots, search each to the
/// current depth, gather, deepen, until the coordinator calls time.
fn search_one_move(harness: &Harness, evaluator: &Evaluator, colour: Player, board: &Board) {
    let mut depth = START_DEPTH - 1;
    let mut timed_out = false;

    while !timed_out {
        let mut best: (Option<usize>, i32) = (None, SCORE_MIN);
        let mut alpha = SCORE_MIN;
        harness.post(Message::RequestMove { completed: false });

        loop {
            let envelope = match harness.inbox.recv() {
                Ok(envelope) => envelope,
                Err(_) => return,
            };
            match envelope.message {
                Message::SendMove(square) => {
                    let mut child = *board;
                    child.make_move(square, colour);
                    let mut search = Search::new(evaluator, &harness.cancel);
                    let score = search.minimax(&child, -colour, depth, alpha, SCORE_MAX);
                    if harness.cancel.is_cancelled() {
                        timed_out = true;
                        break;
                    }
                    if score > best.1 {
                        best = (Some(square), score);
                    }
                    if best.1 > alpha {
                        alpha = best.1;
                        for peer in harness.peers.iter() {
                            let _ = peer.send(Envelope {
                                from: harness.rank,
                                message: Message::ShareAlpha(alpha),
                            });
                        }
                    }
                    harness.post(Message::RequestMove { completed: true });
                }
                Message::ShareAlpha(shared) => {
                    if shared > alpha {
                        alpha = shared;
                    }
                }
                Message::NoMovesLeft => break,
                Message::Timeout => {
                    timed_out = true;
                    break;
                }
                // Never addressed to a worker.
                Message::RequestMove { .. } => {}
            }
        }

        harness.barrier.wait();
        while let Ok(envelope) = harness.inbox.try_recv() {
            if envelope.message == Message::Timeout {
                timed_out = true;
            }
        }

        let reply = match timed_out {
            true => SearchReply { rank: harness.rank, best: None, score: SCORE_MIN },
            false => SearchReply { rank: harness.rank, best: best.0, score: best.1 },
        };
        if harness.gather.send(reply).is_err() {
            return;
        }
        depth += 1;
    }
}
