use shakmaty::{Chess, Position, san::SanPlus};

/// A move that was resolved and played.
#[derive(Debug, Clone)]
pub struct Ply {
    pub san: String,
    /// Position after the move.
    pub position: Chess,
}

/// Where and why a replay stopped before the last token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncation {
    /// 1-based ply of the token that could not be played.
    pub ply: usize,
    pub token: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct Replay {
    pub plies: Vec<Ply>,
    pub truncated: Option<Truncation>,
}

/// Replays SAN tokens from the standard starting position.
///
/// Replay stops at the first token that does not parse as SAN or is not a
/// legal move in the current position; every ply before it is kept.
pub fn replay<S: AsRef<str>>(tokens: &[S]) -> Replay {
    let mut pos = Chess::default();
    let mut replay = Replay {
        plies: Vec::with_capacity(tokens.len()),
        truncated: None,
    };

    for (idx, token) in tokens.iter().enumerate() {
        let token = token.as_ref();
        let stop = |reason: String| Truncation {
            ply: idx + 1,
            token: token.to_string(),
            reason,
        };

        let san: SanPlus = match token.parse() {
            Ok(san) => san,
            Err(e) => {
                replay.truncated = Some(stop(e.to_string()));
                break;
            }
        };

        let m = match san.san.to_move(&pos) {
            Ok(m) => m,
            Err(e) => {
                replay.truncated = Some(stop(e.to_string()));
                break;
            }
        };

        pos.play_unchecked(m);
        replay.plies.push(Ply {
            san: token.to_string(),
            position: pos.clone(),
        });
    }

    replay
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fen_string;
    use shakmaty::Color;

    #[test]
    fn test_replay_basic() {
        let replay = replay(&["e4", "e5", "Nf3"]);
        assert_eq!(replay.plies.len(), 3);
        assert!(replay.truncated.is_none());
        assert_eq!(replay.plies[0].san, "e4");
        assert_eq!(replay.plies[0].position.turn(), Color::Black);
        assert_eq!(replay.plies[2].position.turn(), Color::Black);
    }

    #[test]
    fn test_replay_records_post_move_position() {
        let replay = replay(&["e4"]);
        assert_eq!(
            fen_string(&replay.plies[0].position),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_replay_empty() {
        let replay = replay::<&str>(&[]);
        assert!(replay.plies.is_empty());
        assert!(replay.truncated.is_none());
    }

    #[test]
    fn test_replay_stops_at_illegal_move() {
        let replay = replay(&["e4", "e5", "Ke3", "Nc6"]);
        assert_eq!(replay.plies.len(), 2);
        let truncation = replay.truncated.expect("should be truncated");
        assert_eq!(truncation.ply, 3);
        assert_eq!(truncation.token, "Ke3");
    }

    #[test]
    fn test_replay_stops_at_unparsable_token() {
        let replay = replay(&["d4", "INVALID", "d5"]);
        assert_eq!(replay.plies.len(), 1);
        assert_eq!(replay.truncated.unwrap().token, "INVALID");
    }

    #[test]
    fn test_replay_accepts_check_suffix_and_castling() {
        let mate = replay(&["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6", "Qxf7#"]);
        assert_eq!(mate.plies.len(), 7);
        assert!(mate.plies[6].position.is_check());

        let castle = replay(&["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5", "O-O"]);
        assert_eq!(castle.plies.len(), 7);
        assert!(castle.truncated.is_none());
    }
}
