use itertools::Itertools;

use crate::othello::prelude::*;

impl Board {
    /// Renders the position the way it appears in the engine log.
    pub fn pretty(&self) -> String {
        let header = format!(
            "   1 2 3 4 5 6 7 8 [b={} w={}]",
            self.count(Player::Black),
            self.count(Player::White)
        );
        let rows = (1..=8).map(|row| {
            let discs = (1..=8).map(|col| self.get(10 * row + col).glyph()).join(" ");
            format!("{row}  {discs}")
        });
        std::iter::once(header).chain(rows).join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_the_starting_position() {
        let text = Board::new().pretty();
        assert!(text.starts_with("   1 2 3 4 5 6 7 8 [b=2 w=2]"));
        assert_eq!(text.lines().count(), 9);
        assert!(text.contains("4  . . . w b . . ."));
        assert!(text.contains("5  . . . b w . . ."));
    }
}
