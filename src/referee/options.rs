use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::Parser;

/// Connects to a match referee and plays one game of Othello.
#[derive(Clone, Debug, Parser)]
pub struct RefereeOptions {
    /// IPv4 address the referee listens on.
    pub ip: Ipv4Addr,

    /// TCP port the referee listens on.
    pub port: u16,

    /// Wall-clock budget for answering one gen_move, in seconds.
    pub time_limit: u64,

    /// File the engine log is written to.
    pub log_file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_four_positional_arguments() {
        let options =
            RefereeOptions::try_parse_from(["reverso", "127.0.0.1", "4000", "4", "game.log"])
                .unwrap();
        assert_eq!(options.ip, Ipv4Addr::LOCALHOST);
        assert_eq!(options.port, 4000);
        assert_eq!(options.time_limit, 4);
        assert_eq!(options.log_file, PathBuf::from("game.log"));
    }

    #[test]
    fn rejects_any_other_argument_count() {
        assert!(RefereeOptions::try_parse_from(["reverso"]).is_err());
        assert!(RefereeOptions::try_parse_from(["reverso", "127.0.0.1", "4000", "4"]).is_err());
        assert!(
            RefereeOptions::try_parse_from([
                "reverso", "127.0.0.1", "4000", "4", "game.log", "extra"
            ])
            .is_err()
        );
    }
}
