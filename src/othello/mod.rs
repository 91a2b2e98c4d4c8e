/*
 *  An Othello (Reversi) game model on a sentinel-padded 10x10 grid.
 */

pub(crate) mod board;
pub(crate) mod consts;
pub mod notation;

pub mod prelude {
    pub(crate) use crate::utils::prelude::*;

    pub use super::{
        board::{Board, MoveList},
        consts::*,
        notation::Move,
    };
}
