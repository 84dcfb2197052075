use shakmaty::{Board, Chess, Color, Position, Role};

/// Default ply budget of the capture search.
pub const DEFAULT_QUIET_DEPTH: u32 = 40;

const MATERIAL: [(Role, i32); 5] = [
    (Role::Pawn, 100),
    (Role::Knight, 400),
    (Role::Bishop, 400),
    (Role::Rook, 600),
    (Role::Queen, 1200),
];

/// Decides whether a position is tactically quiet enough to label.
///
/// Implementations may keep search state between calls, so every worker
/// owns its own instance.
pub trait QuietOracle {
    fn is_quiet(&mut self, pos: &Chess) -> bool;
}

impl<F> QuietOracle for F
where
    F: FnMut(&Chess) -> bool,
{
    fn is_quiet(&mut self, pos: &Chess) -> bool {
        self(pos)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysQuiet;

impl QuietOracle for AlwaysQuiet {
    fn is_quiet(&mut self, _: &Chess) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NeverQuiet;

impl QuietOracle for NeverQuiet {
    fn is_quiet(&mut self, _: &Chess) -> bool {
        false
    }
}

/// Capture-only search over material balance.
///
/// A position is quiet when no sequence of captures improves on the static
/// evaluation for the side to move.
#[derive(Debug, Clone)]
pub struct MaterialQuiescence {
    max_depth: u32,
}

impl Default for MaterialQuiescence {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_DEPTH)
    }
}

impl MaterialQuiescence {
    pub fn new(max_depth: u32) -> Self {
        Self { max_depth }
    }

    fn search(&self, pos: &Chess, mut alpha: i32, beta: i32, depth: u32) -> i32 {
        let stand_pat = evaluate(pos);
        if depth >= self.max_depth || stand_pat >= beta {
            return stand_pat;
        }
        alpha = alpha.max(stand_pat);

        for m in pos.capture_moves() {
            let mut child = pos.clone();
            child.play_unchecked(m);

            let score = -self.search(&child, -beta, -alpha, depth + 1);
            if score >= beta {
                return score;
            }
            alpha = alpha.max(score);
        }

        alpha
    }
}

impl QuietOracle for MaterialQuiescence {
    fn is_quiet(&mut self, pos: &Chess) -> bool {
        let static_eval = evaluate(pos);
        let q = self.search(pos, i32::MIN + 1, i32::MAX, 0);
        q <= static_eval
    }
}

/// Material balance relative to the side to move.
pub fn evaluate(pos: &Chess) -> i32 {
    let board = pos.board();
    let eval = material(board, Color::White) - material(board, Color::Black);
    match pos.turn() {
        Color::White => eval,
        Color::Black => -eval,
    }
}

fn material(board: &Board, color: Color) -> i32 {
    let side = board.by_color(color);
    MATERIAL
        .iter()
        .map(|&(role, value)| (side & board.by_role(role)).count() as i32 * value)
        .sum()
}
