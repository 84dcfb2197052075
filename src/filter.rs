use shakmaty::zobrist::Zobrist64;
use shakmaty::{EnPassantMode, Position};
use std::collections::HashSet;

use crate::error::GameError;
use crate::game::parse_game;
use crate::quiet::QuietOracle;
use crate::types::{Game, GameResult, Item, SkipReason};

/// Annotations searched shallower than this are not trusted.
pub const MIN_DEPTH: i32 = 10;

/// Halfmove clock at which drawn games are considered to be shuffling
/// towards the fifty-move rule.
pub const NEAR_FIFTY_MOVE_PLIES: u32 = 40;

pub fn repetition_key(item: &Item) -> u64 {
    item.position
        .zobrist_hash::<Zobrist64>(EnPassantMode::Legal)
        .0
}

/// Classifies every item of a game in ply order.
///
/// The first matching rule wins: shallow annotation, mate score, check,
/// drawn game near the fifty-move rule, repetition of an earlier position of
/// the same game, tactically noisy position.
pub struct Classifier<Q> {
    oracle: Q,
}

impl<Q: QuietOracle> Classifier<Q> {
    pub fn new(oracle: Q) -> Self {
        Self { oracle }
    }

    pub fn classify(&mut self, mut game: Game) -> Game {
        let result = game.result();
        let mut seen: HashSet<u64> = HashSet::with_capacity(game.items().len());

        for item in game.items_mut() {
            let key = repetition_key(item);
            if let Some(reason) = self.skip_reason(item, result, &seen, key) {
                item.mark_skipped(reason);
            }
            seen.insert(key);
        }

        game
    }

    fn skip_reason(
        &mut self,
        item: &Item,
        result: GameResult,
        seen: &HashSet<u64>,
        key: u64,
    ) -> Option<SkipReason> {
        let pos = &item.position;

        if item.comment.depth < MIN_DEPTH {
            return Some(SkipReason::InsufficientDepth);
        }
        if item.comment.score.is_mate() {
            return Some(SkipReason::MateImminent);
        }
        if pos.is_check() {
            return Some(SkipReason::InCheck);
        }
        if pos.halfmoves() >= NEAR_FIFTY_MOVE_PLIES && result.is_draw() {
            return Some(SkipReason::NearFiftyMoveDraw);
        }
        if seen.contains(&key) {
            return Some(SkipReason::RepeatedPosition);
        }
        if !self.oracle.is_quiet(pos) {
            return Some(SkipReason::TacticallyNoisy);
        }
        None
    }
}

/// Per-worker game analysis: parse, replay, classify.
pub struct Analyzer<Q> {
    classifier: Classifier<Q>,
}

impl<Q: QuietOracle> Analyzer<Q> {
    pub fn new(oracle: Q) -> Self {
        Self {
            classifier: Classifier::new(oracle),
        }
    }

    pub fn analyze(&mut self, pgn: &str) -> Result<Game, GameError> {
        let game = parse_game(pgn)?;
        Ok(self.classifier.classify(game))
    }
}
