use regex::Regex;
use std::sync::LazyLock;

use crate::comment::parse_comment;
use crate::error::GameError;
use crate::moves::replay;
use crate::types::{Game, GameResult, Item, Tag, Tags, tag_value};

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]+\}").expect("valid comment regex"));

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]+\]").expect("valid tag regex"));

static TAG_PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[([^\s\]"]+)\s+"([^"]*)"\]"#).expect("valid tag pair regex")
});

// `12.` and `12...` markers, with or without a following space.
static MOVE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.+\s*").expect("valid move number regex"));

/// Parses one raw PGN record into a replayed game.
///
/// Moves are replayed from the standard starting position. Each replayed ply
/// carries the position after the move and the comment that follows it. A
/// token that is not a legal move ends the game early instead of failing it.
pub fn parse_game(pgn: &str) -> Result<Game, GameError> {
    let tags = parse_tags(pgn);
    if tags.is_empty() {
        return Err(GameError::EmptyTags);
    }

    let mut sans = san_moves(pgn);
    let comments = comments(pgn);

    if sans.len() == comments.len() + 1 {
        // trailing result marker
        sans.pop();
    }
    if sans.len() != comments.len() {
        return Err(GameError::MoveCommentMismatch {
            moves: sans.len(),
            comments: comments.len(),
        });
    }

    let result = tag_value(&tags, "Result").ok_or(GameError::MissingResult)?;
    let result = GameResult::from_tag(result)?;

    let replay = replay(&sans);
    if let Some(stop) = &replay.truncated {
        log::debug!(
            "game truncated at ply {}: '{}' ({})",
            stop.ply,
            stop.token,
            stop.reason
        );
    }

    let mut items = Vec::with_capacity(replay.plies.len());
    for (idx, (ply, raw_comment)) in replay.plies.into_iter().zip(&comments).enumerate() {
        let comment = parse_comment(raw_comment).map_err(|source| GameError::Comment {
            ply: idx + 1,
            source,
        })?;

        items.push(Item {
            index: idx + 1,
            san: ply.san,
            position: ply.position,
            comment,
            skip: None,
        });
    }

    if items.is_empty() {
        return Err(GameError::NoMoves);
    }

    Ok(Game::new(tags, result, items))
}

pub fn parse_tags(pgn: &str) -> Tags {
    TAG_PAIR_RE
        .captures_iter(pgn)
        .map(|caps| Tag {
            key: caps[1].to_string(),
            value: caps[2].to_string(),
        })
        .collect()
}

/// Movetext tokens with comments, tags and move numbers removed. The result
/// marker, when present, is still the last token.
pub fn san_moves(pgn: &str) -> Vec<String> {
    let without_comments = COMMENT_RE.replace_all(pgn, " ");
    let without_tags = TAG_RE.replace_all(&without_comments, " ");
    let movetext = MOVE_NUMBER_RE.replace_all(&without_tags, " ");

    movetext.split_whitespace().map(str::to_string).collect()
}

/// Every `{...}` span in document order, braces included.
pub fn comments(pgn: &str) -> Vec<&str> {
    COMMENT_RE.find_iter(pgn).map(|m| m.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Comment, Score};
    use shakmaty::Position;

    const SCHOLAR: &str = r#"[Event "Test"]
[White "A"]
[Black "B"]
[Result "1-0"]

1. e4 {+0.30/12} e5 {-0.25/13 0.5s} 2. Bc4 {+0.40/14} Nc6 {-0.35/15}
3. Qh5 {+0.20/16} Nf6 {-M1/17} 4. Qxf7# {+M1/18} 1-0
"#;

    #[test]
    fn test_parse_game_items_match_moves() {
        let game = parse_game(SCHOLAR).unwrap();
        assert_eq!(game.items().len(), 7);
        assert_eq!(game.result(), GameResult::WhiteWin);

        for (idx, item) in game.items().iter().enumerate() {
            assert_eq!(item.index, idx + 1);
            assert!(item.skip.is_none());
        }

        let last = &game.items()[6];
        assert_eq!(last.san, "Qxf7#");
        assert!(last.position.is_check());
        assert_eq!(last.comment.score, Score::Mate(1));
    }

    #[test]
    fn test_parse_game_first_item_comment() {
        let game = parse_game(SCHOLAR).unwrap();
        assert_eq!(
            game.items()[0].comment,
            Comment {
                depth: 12,
                score: Score::Centipawns(30),
            }
        );
        assert_eq!(game.items()[1].comment.score, Score::Centipawns(-25));
    }

    #[test]
    fn test_parse_game_tags_in_order() {
        let game = parse_game(SCHOLAR).unwrap();
        let keys: Vec<&str> = game.tags().iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, ["Event", "White", "Black", "Result"]);
        assert_eq!(game.tag("White"), Some("A"));
    }

    #[test]
    fn test_parse_game_without_result_marker() {
        let pgn = r#"[Result "1/2-1/2"]

1. d4 {+0.10/20} d5 {0.00/20}
"#;
        let game = parse_game(pgn).unwrap();
        assert_eq!(game.items().len(), 2);
        assert_eq!(game.result(), GameResult::Draw);
    }

    #[test]
    fn test_parse_game_empty_tags() {
        let pgn = "1. e4 {+0.10/20} e5 {0.00/20} 1-0\n";
        assert_eq!(parse_game(pgn).unwrap_err(), GameError::EmptyTags);
    }

    #[test]
    fn test_parse_game_bad_result() {
        let pgn = r#"[Result "*"]

1. e4 {+0.10/20} e5 {0.00/20} *
"#;
        assert_eq!(
            parse_game(pgn).unwrap_err(),
            GameError::BadResult("*".to_string())
        );
    }

    #[test]
    fn test_parse_game_missing_result() {
        let pgn = r#"[Event "No result"]

1. e4 {+0.10/20} e5 {0.00/20}
"#;
        assert_eq!(parse_game(pgn).unwrap_err(), GameError::MissingResult);
    }

    #[test]
    fn test_parse_game_move_comment_mismatch() {
        let pgn = r#"[Result "1-0"]

1. e4 {+0.10/20} e5 2. Nf3 Nc6 1-0
"#;
        assert_eq!(
            parse_game(pgn).unwrap_err(),
            GameError::MoveCommentMismatch {
                moves: 5,
                comments: 1,
            }
        );
    }

    #[test]
    fn test_parse_game_truncates_at_illegal_move() {
        let pgn = r#"[Result "0-1"]

1. e4 {+0.10/20} e5 {0.00/20} 2. Ke3 {+0.10/20} Nc6 {0.00/20} 0-1
"#;
        let game = parse_game(pgn).unwrap();
        assert_eq!(game.items().len(), 2);
        assert_eq!(game.result(), GameResult::BlackWin);
    }

    #[test]
    fn test_parse_game_no_legal_moves() {
        let pgn = r#"[Result "1-0"]

1. Ke2 {+0.10/20} 1-0
"#;
        assert_eq!(parse_game(pgn).unwrap_err(), GameError::NoMoves);
    }

    #[test]
    fn test_parse_game_malformed_comment() {
        let pgn = r#"[Result "1-0"]

1. e4 {+0.10/20} e5 {garbage} 1-0
"#;
        assert!(matches!(
            parse_game(pgn).unwrap_err(),
            GameError::Comment { ply: 2, .. }
        ));
    }

    #[test]
    fn test_parse_game_book_moves() {
        let pgn = r#"[Result "1-0"]

1. e4 {book} e5 {book} 2. Nf3 {+0.20/15} 1-0
"#;
        let game = parse_game(pgn).unwrap();
        assert_eq!(game.items()[0].comment, Comment::default());
        assert_eq!(game.items()[2].comment.depth, 15);
    }

    #[test]
    fn test_san_moves_strips_numbers_comments_and_tags() {
        let pgn = r#"[Event "x"]
1. e4 {+0.1/1} e5 2.Nf3 {c} 2... Nc6 1-0"#;
        assert_eq!(san_moves(pgn), ["e4", "e5", "Nf3", "Nc6", "1-0"]);
    }

    #[test]
    fn test_comments_in_document_order() {
        let pgn = "1. e4 {first} e5 {second} 2. Nf3 {third}";
        assert_eq!(comments(pgn), ["{first}", "{second}", "{third}"]);
    }

    #[test]
    fn test_parse_tags_multiple_per_line() {
        let tags = parse_tags(r#"[Event "A B"] [Result "1-0"]"#);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].value, "A B");
        assert_eq!(tags[1].key, "Result");
    }
}
