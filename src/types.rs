use shakmaty::{Chess, Color, EnPassantMode, Position, fen::Fen};
use smallvec::SmallVec;
use std::fmt;

use crate::error::GameError;

pub const GAME_RESULT_WHITE_WIN: &str = "1-0";
pub const GAME_RESULT_BLACK_WIN: &str = "0-1";
pub const GAME_RESULT_DRAW: &str = "1/2-1/2";

/// One `[Key "Value"]` header pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// Header tags in first-seen order.
pub type Tags = SmallVec<[Tag; 16]>;

/// Looks up a tag; duplicate keys resolve to the first occurrence.
pub fn tag_value<'a>(tags: &'a [Tag], key: &str) -> Option<&'a str> {
    tags.iter()
        .find(|tag| tag.key == key)
        .map(|tag| tag.value.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    WhiteWin,
    BlackWin,
    Draw,
}

impl GameResult {
    pub fn from_tag(value: &str) -> Result<Self, GameError> {
        match value {
            GAME_RESULT_WHITE_WIN => Ok(Self::WhiteWin),
            GAME_RESULT_BLACK_WIN => Ok(Self::BlackWin),
            GAME_RESULT_DRAW => Ok(Self::Draw),
            other => Err(GameError::BadResult(other.to_string())),
        }
    }

    /// Training label: 1 for a white win, 0 for a black win, 0.5 for a draw.
    pub fn outcome(self) -> f32 {
        match self {
            Self::WhiteWin => 1.0,
            Self::BlackWin => 0.0,
            Self::Draw => 0.5,
        }
    }

    pub fn is_draw(self) -> bool {
        self == Self::Draw
    }
}

/// Engine score attached to a ply. Centipawns and mate distances are
/// mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    Mate(i32),
}

impl Default for Score {
    fn default() -> Self {
        Self::Centipawns(0)
    }
}

impl Score {
    pub fn centipawns(self) -> i32 {
        match self {
            Self::Centipawns(cp) => cp,
            Self::Mate(_) => 0,
        }
    }

    pub fn is_mate(self) -> bool {
        matches!(self, Self::Mate(n) if n != 0)
    }
}

/// Parsed `{score/depth}` annotation. `Comment::default()` is the zero
/// comment used for book moves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Comment {
    pub depth: i32,
    pub score: Score,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    InsufficientDepth,
    MateImminent,
    InCheck,
    NearFiftyMoveDraw,
    RepeatedPosition,
    TacticallyNoisy,
}

impl SkipReason {
    pub const ALL: [SkipReason; 6] = [
        Self::InsufficientDepth,
        Self::MateImminent,
        Self::InCheck,
        Self::NearFiftyMoveDraw,
        Self::RepeatedPosition,
        Self::TacticallyNoisy,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::InsufficientDepth => "insufficient_depth",
            Self::MateImminent => "mate_imminent",
            Self::InCheck => "in_check",
            Self::NearFiftyMoveDraw => "near_fifty_move_draw",
            Self::RepeatedPosition => "repeated_position",
            Self::TacticallyNoisy => "tactically_noisy",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One replayed ply.
#[derive(Debug, Clone)]
pub struct Item {
    /// 1-based ply number.
    pub index: usize,
    pub san: String,
    /// Position after the move was played.
    pub position: Chess,
    pub comment: Comment,
    pub skip: Option<SkipReason>,
}

impl Item {
    pub fn is_retained(&self) -> bool {
        self.skip.is_none()
    }

    /// Marks the item as excluded. The first reason sticks.
    pub(crate) fn mark_skipped(&mut self, reason: SkipReason) {
        if self.skip.is_none() {
            self.skip = Some(reason);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Game {
    tags: Tags,
    result: GameResult,
    items: Vec<Item>,
}

impl Game {
    pub(crate) fn new(tags: Tags, result: GameResult, items: Vec<Item>) -> Self {
        Self {
            tags,
            result,
            items,
        }
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        tag_value(&self.tags, key)
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut [Item] {
        &mut self.items
    }

    pub fn retained(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|item| item.is_retained())
    }

    /// Output records for every retained item, in ply order.
    pub fn position_infos(&self) -> impl Iterator<Item = PositionInfo> + '_ {
        let outcome = self.result.outcome();
        self.retained()
            .map(move |item| PositionInfo::new(&item.position, item.comment.score, outcome))
    }
}

/// One line of the output dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionInfo {
    pub fen: String,
    /// Centipawns from White's point of view.
    pub score: i32,
    pub outcome: f32,
}

impl PositionInfo {
    pub fn new(position: &Chess, score: Score, outcome: f32) -> Self {
        let raw = score.centipawns();
        let score = match position.turn() {
            Color::White => raw,
            Color::Black => -raw,
        };
        Self {
            fen: fen_string(position),
            score,
            outcome,
        }
    }
}

impl fmt::Display for PositionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{};{}", self.fen, self.score, self.outcome)
    }
}

pub fn fen_string(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::{Move, Role, Square};

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(key, value)| Tag {
                key: key.to_string(),
                value: value.to_string(),
            })
            .collect()
    }

    fn after_e4() -> Chess {
        let mut pos = Chess::default();
        pos.play_unchecked(Move::Normal {
            role: Role::Pawn,
            from: Square::E2,
            capture: None,
            to: Square::E4,
            promotion: None,
        });
        pos
    }

    #[test]
    fn test_tag_value_found() {
        let tags = tags(&[("Event", "Test"), ("Result", "1-0")]);
        assert_eq!(tag_value(&tags, "Result"), Some("1-0"));
    }

    #[test]
    fn test_tag_value_missing() {
        let tags = tags(&[("Event", "Test")]);
        assert_eq!(tag_value(&tags, "Result"), None);
    }

    #[test]
    fn test_tag_value_duplicate_keys_first_wins() {
        let tags = tags(&[("Result", "1-0"), ("Result", "0-1")]);
        assert_eq!(tag_value(&tags, "Result"), Some("1-0"));
    }

    #[test]
    fn test_game_result_from_tag() {
        assert_eq!(GameResult::from_tag("1-0"), Ok(GameResult::WhiteWin));
        assert_eq!(GameResult::from_tag("0-1"), Ok(GameResult::BlackWin));
        assert_eq!(GameResult::from_tag("1/2-1/2"), Ok(GameResult::Draw));
        assert_eq!(
            GameResult::from_tag("*"),
            Err(GameError::BadResult("*".to_string()))
        );
    }

    #[test]
    fn test_game_result_outcome() {
        assert_eq!(GameResult::WhiteWin.outcome(), 1.0);
        assert_eq!(GameResult::BlackWin.outcome(), 0.0);
        assert_eq!(GameResult::Draw.outcome(), 0.5);
    }

    #[test]
    fn test_score_is_mate_ignores_zero() {
        assert!(Score::Mate(3).is_mate());
        assert!(Score::Mate(-1).is_mate());
        assert!(!Score::Mate(0).is_mate());
        assert!(!Score::Centipawns(500).is_mate());
    }

    #[test]
    fn test_position_info_white_to_move_keeps_sign() {
        let info = PositionInfo::new(&Chess::default(), Score::Centipawns(50), 1.0);
        assert_eq!(info.score, 50);
    }

    #[test]
    fn test_position_info_black_to_move_negates() {
        let info = PositionInfo::new(&after_e4(), Score::Centipawns(50), 0.5);
        assert_eq!(info.score, -50);
    }

    #[test]
    fn test_position_info_display() {
        let info = PositionInfo::new(&Chess::default(), Score::Centipawns(12), 0.5);
        assert_eq!(
            info.to_string(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1;12;0.5"
        );

        let info = PositionInfo::new(&Chess::default(), Score::Centipawns(0), 1.0);
        assert!(info.to_string().ends_with(";0;1"));

        let info = PositionInfo::new(&Chess::default(), Score::Centipawns(0), 0.0);
        assert!(info.to_string().ends_with(";0;0"));
    }

    #[test]
    fn test_mark_skipped_is_terminal() {
        let mut item = Item {
            index: 1,
            san: "e4".to_string(),
            position: after_e4(),
            comment: Comment::default(),
            skip: None,
        };
        item.mark_skipped(SkipReason::InCheck);
        item.mark_skipped(SkipReason::TacticallyNoisy);
        assert_eq!(item.skip, Some(SkipReason::InCheck));
        assert!(!item.is_retained());
    }

    #[test]
    fn test_skip_reason_indices_are_dense() {
        for (idx, reason) in SkipReason::ALL.iter().enumerate() {
            assert_eq!(reason.index(), idx);
        }
    }
}
