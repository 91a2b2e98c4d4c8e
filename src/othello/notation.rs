use crate::othello::prelude::*;

/// A playable square index, or the pass that exists only on the referee
/// wire. Inside the engine a pass is always represented as an empty
/// legal-move list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Move {
    Square(usize),
    Pass,
}

impl Move {
    /// Wire form: two row/column digits in 0..7 and a newline, or the
    /// pass keyword.
    pub fn notate(&self) -> String {
        match self {
            Move::Square(square) => format!("{}{}\n", square / 10 - 1, square % 10 - 1),
            Move::Pass => "pass\n".into(),
        }
    }
}

impl std::str::FromStr for Move {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s == "pass" {
            return Ok(Move::Pass);
        }
        let digits = s
            .chars()
            .map(|c| c.to_digit(8))
            .collect::<Option<Vec<u32>>>()
            .ok_or_else(|| anyhow!("expected two digits in 0..7, received {s:?}"))?;
        let [row, col] = digits[..] else {
            return Err(anyhow!("expected a two-digit move, received {s:?}"));
        };
        Ok(Move::Square(10 * (row as usize + 1) + (col as usize + 1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_square() {
        for row in 0..8 {
            for col in 0..8 {
                let text = format!("{row}{col}");
                let mv = text.parse::<Move>().unwrap();
                assert_eq!(mv, Move::Square(10 * (row + 1) + (col + 1)));
                assert_eq!(mv.notate(), format!("{text}\n"));
            }
        }
    }

    #[test]
    fn parses_a_pass_with_trailing_newline() {
        assert_eq!("pass\n".parse::<Move>().unwrap(), Move::Pass);
    }

    #[test]
    fn rejects_junk() {
        assert!("".parse::<Move>().is_err());
        assert!("9".parse::<Move>().is_err());
        assert!("88".parse::<Move>().is_err());
        assert!("ab".parse::<Move>().is_err());
        assert!("123".parse::<Move>().is_err());
    }
}
