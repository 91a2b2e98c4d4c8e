use crate::othello::prelude::*;

pub const UNSTABLE: u8 = 0;
pub const H_BORDER: u8 = 1;
pub const V_BORDER: u8 = 2;
/// Down-right diagonal.
pub const UDD_BORDER: u8 = 4;
/// Up-right diagonal.
pub const DUD_BORDER: u8 = 8;
pub const STABLE: u8 = 15;

/// The 64 playable squares from the outermost ring inward. Anchoring
/// bits spread from the edge, so walking edge-first lets a dead outer
/// ring prove the interior dead too.
pub const SPIRAL: [usize; 64] = [
    11, 12, 13, 14, 15, 16, 17, 18,
    28, 38, 48, 58, 68, 78, 88,
    87, 86, 85, 84, 83, 82, 81,
    71, 61, 51, 41, 31, 21,

    22, 23, 24, 25, 26, 27,
    37, 47, 57, 67, 77,
    76, 75, 74, 73, 72,
    62, 52, 42, 32,

    33, 34, 35, 36,
    46, 56, 66,
    65, 64, 63,
    53, 43,

    44, 45,
    55, 54,
];

/// The last square of each ring in the spiral.
fn ring_completed(square: usize) -> bool {
    matches!(square, 21 | 32 | 43 | 54)
}

impl Board {
    /// Net (stable − unstable) disc counts for `max` and its opponent.
    ///
    /// Discs stable on all four axes count +1, discs anchored on no axis
    /// count −1, partially anchored discs are neutral. If a completed
    /// ring held discs and none of them picked up a single border bit,
    /// nothing further in can be anchored and the walk stops there.
    ///
    /// `poll` is consulted every step; returning true abandons the walk.
    pub fn stability_counts(
        &self,
        max: Player,
        mut poll: impl FnMut() -> bool,
    ) -> Option<(i32, i32)> {
        let mine: Cell = max.into();
        let mut tags = [UNSTABLE; BOARD_CELLS];
        let mut ring_saw_disc = false;
        let mut ring_saw_border = false;
        let mut max_net = 0;
        let mut min_net = 0;

        for &square in SPIRAL.iter() {
            if poll() {
                return None;
            }

            let cell = self.cells[square];
            if cell != Cell::Empty {
                let tag = self.classify(square, &tags);
                tags[square] = tag;

                ring_saw_disc = true;
                if tag != UNSTABLE {
                    ring_saw_border = true;
                }

                let net = if cell == mine { &mut max_net } else { &mut min_net };
                if tag == STABLE {
                    *net += 1;
                } else if tag == UNSTABLE {
                    *net -= 1;
                }
            }

            if ring_completed(square) {
                if ring_saw_disc && !ring_saw_border {
                    break;
                }
                ring_saw_disc = false;
                ring_saw_border = false;
            }
        }
        Some((max_net, min_net))
    }

    /// Border bits for one occupied square. A square is anchored on an
    /// axis if it sits on a physical border for that axis, or a
    /// same-colour neighbour along the axis is already anchored there.
    fn classify(&self, square: usize, tags: &[u8; BOARD_CELLS]) -> u8 {
        let row = square / 10;
        let col = square % 10;
        let on_edge = row == 1 || row == 8 || col == 1 || col == 8;
        let mut tag = UNSTABLE;

        if col == 1 || col == 8 || self.anchored(square, 1, tags, H_BORDER) {
            tag |= H_BORDER;
        }
        if row == 1 || row == 8 || self.anchored(square, 10, tags, V_BORDER) {
            tag |= V_BORDER;
        }
        if on_edge || self.anchored(square, 11, tags, UDD_BORDER) {
            tag |= UDD_BORDER;
        }
        if on_edge || self.anchored(square, 9, tags, DUD_BORDER) {
            tag |= DUD_BORDER;
        }
        tag
    }

    fn anchored(&self, square: usize, step: usize, tags: &[u8; BOARD_CELLS], bit: u8) -> bool {
        let cell = self.cells[square];
        [square - step, square + step].into_iter().any(|neighbour| {
            self.cells[neighbour] == cell && tags[neighbour] & bit != 0
        })
    }
}
