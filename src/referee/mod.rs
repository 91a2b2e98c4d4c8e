mod options;

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::LazyLock;
use std::time::Duration;

pub use options::RefereeOptions;
use regex::Regex;

use crate::cluster::prelude::*;
use crate::othello::prelude::*;

/// A referee payload: one keyword, optionally followed by a move token.
static COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\S+)(?:\s+(\S+))?").unwrap());

/// TCP client for the match referee. Owns the socket, the authoritative
/// board, and the search pool; all referee I/O is serialized here.
pub struct RefereeClient {
    stream: TcpStream,
    board: Board,
    colour: Player,
    pool: SearchPool,
}

impl RefereeClient {
    /// Connects, reads the one-byte colour assignment, and spins up the
    /// worker ranks.
    pub fn connect(options: &RefereeOptions) -> Result<RefereeClient> {
        let mut stream = TcpStream::connect((options.ip, options.port))
            .context("could not connect to the referee")?;

        let mut assigned = [0u8; 1];
        stream
            .read_exact(&mut assigned)
            .context("could not receive the colour assignment")?;
        let colour = match assigned[0] {
            b'1' => Player::Black,
            b'2' => Player::White,
            b'0' => {
                log::info!("referee left the colour undecided, defaulting to black");
                Player::Black
            }
            other => {
                log::warn!("unrecognized colour byte {other:#04x}, defaulting to black");
                Player::Black
            }
        };
        log::info!("playing as {}", colour.glyph());

        let pool = SearchPool::spawn(
            colour,
            default_worker_count(),
            Duration::from_secs(options.time_limit),
        )?;

        Ok(RefereeClient { stream, board: Board::new(), colour, pool })
    }

    /// The game loop. Returns Ok on a clean game_over; referee-channel
    /// failures are the only fatal class, everything else is logged and
    /// skipped.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let payload = match self.read_payload() {
                Ok(payload) => payload,
                Err(error) => {
                    self.pool.shutdown();
                    return Err(error);
                }
            };

            let (command, argument) = match COMMAND.captures(&payload) {
                Some(caps) => (
                    caps.get(1).map_or("", |m| m.as_str()).to_owned(),
                    caps.get(2).map(|m| m.as_str().to_owned()),
                ),
                None => {
                    log::warn!("empty referee payload");
                    continue;
                }
            };

            match command.as_str() {
                "game_over" => {
                    log::info!("game over");
                    self.pool.shutdown();
                    return Ok(());
                }
                "gen_move" => {
                    if let Err(error) = self.answer_gen_move() {
                        self.pool.shutdown();
                        return Err(error);
                    }
                }
                "play_move" => self.apply_opponent_move(argument.as_deref()),
                unknown => log::warn!("unrecognized referee command {unknown:?}"),
            }
        }
    }

    /// Searches the current position and sends the chosen move as a bare
    /// "rc\n" or "pass\n" payload.
    fn answer_gen_move(&mut self) -> Result<()> {
        let mv = self.pool.generate_move(&self.board)?;
        if let Move::Square(square) = mv {
            self.board.make_move(square, self.colour);
        }
        log::debug!("position after our move:\n{}", self.board.pretty());

        self.stream
            .write_all(mv.notate().as_bytes())
            .context("could not send our move")
    }

    /// Applies the opponent's move to the authoritative board. A pass
    /// leaves the board untouched; garbage is logged and skipped.
    fn apply_opponent_move(&mut self, argument: Option<&str>) {
        let Some(token) = argument else {
            log::warn!("play_move arrived without a move");
            return;
        };
        match token.parse::<Move>() {
            Ok(Move::Square(square)) => {
                self.board.make_move(square, -self.colour);
                log::debug!("position after opponent move:\n{}", self.board.pretty());
            }
            Ok(Move::Pass) => log::debug!("opponent passed"),
            Err(error) => log::warn!("unparseable opponent move: {error}"),
        }
    }

    /// One framed referee message: a two-byte decimal length, then that
    /// many payload bytes. An unparseable length is treated as zero; the
    /// empty payload then falls through the command dispatch as unknown.
    fn read_payload(&mut self) -> Result<String> {
        let mut prefix = [0u8; 2];
        self.stream
            .read_exact(&mut prefix)
            .context("could not read the length prefix")?;

        let text = String::from_utf8_lossy(&prefix);
        let digits: String = text
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        let length = match digits.parse::<usize>() {
            Ok(length) => length,
            Err(_) => {
                log::warn!("unparseable length prefix {text:?}");
                0
            }
        };

        let mut payload = vec![0u8; length];
        self.stream
            .read_exact(&mut payload)
            .context("could not read the payload")?;
        Ok(String::from_utf8_lossy(&payload).into_owned())
    }
}
