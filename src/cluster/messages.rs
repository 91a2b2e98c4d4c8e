use crate::othello::prelude::*;

/// Point-to-point traffic inside the rank group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Message {
    /// Worker asks the coordinator for work; `completed` reports that a
    /// root evaluation just finished.
    RequestMove { completed: bool },
    /// Coordinator hands a root square to one worker.
    SendMove(usize),
    /// Coordinator signals that the current depth's pool is exhausted.
    NoMovesLeft,
    /// Worker shares a raised lower bound with its peers. Advisory: a
    /// stale value may arrive after a better one and is simply ignored.
    ShareAlpha(i32),
    /// Coordinator tells everyone to abandon the current depth.
    Timeout,
}

/// A message stamped with its source rank.
#[derive(Clone, Copy, Debug)]
pub struct Envelope {
    pub from: usize,
    pub message: Message,
}

/// Collective payloads pushed from the coordinator to every worker.
#[derive(Clone, Debug)]
pub enum Broadcast {
    /// The colour this engine maximizes, fixed for the whole game.
    Colour(Player),
    /// False tears the group down.
    Running(bool),
    /// The authoritative position for the next search.
    Position(Board),
}

/// One worker's best (move, score) pair, gathered after every depth.
#[derive(Clone, Copy, Debug)]
pub struct SearchReply {
    pub rank: usize,
    pub best: Option<usize>,
    pub score: i32,
}
