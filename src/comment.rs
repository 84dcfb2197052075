use crate::error::CommentError;
use crate::types::{Comment, Score};

const BOOK: &str = "book";

/// Parses one `{score/depth ...}` annotation, delimiters included.
///
/// Accepted shapes are `{book}`, `{+0.34/18 ...}`, `{-M5/22 ...}` and the
/// alternate-move form `{(Nf3) +0.34/18 ...}` where the evaluation follows a
/// parenthesised move.
pub fn parse_comment(raw: &str) -> Result<Comment, CommentError> {
    let body = raw.trim_start_matches('{').trim_end_matches('}').trim();

    if body == BOOK {
        return Ok(Comment::default());
    }

    let mut fields = body.split_whitespace();
    let field = match fields.next() {
        Some(first) if first.starts_with('(') => fields.next(),
        other => other,
    };
    let Some(field) = field else {
        return Err(CommentError::Malformed(body.to_string()));
    };

    let Some((score, depth)) = field.split_once('/') else {
        return Err(CommentError::Malformed(body.to_string()));
    };

    let score = parse_score(score)?;
    let depth = depth
        .parse::<i32>()
        .map_err(|_| CommentError::Depth(depth.to_string()))?;

    Ok(Comment { depth, score })
}

fn parse_score(raw: &str) -> Result<Score, CommentError> {
    let (negative, unsigned) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };

    if let Some(mate) = unsigned.strip_prefix('M') {
        let n = mate
            .parse::<i32>()
            .map_err(|_| CommentError::Score(raw.to_string()))?;
        return Ok(Score::Mate(if negative { -n } else { n }));
    }

    let pawns = raw
        .parse::<f64>()
        .map_err(|_| CommentError::Score(raw.to_string()))?;
    if !pawns.is_finite() {
        return Err(CommentError::Score(raw.to_string()));
    }

    // Truncates toward zero.
    Ok(Score::Centipawns((pawns * 100.0) as i32))
}
