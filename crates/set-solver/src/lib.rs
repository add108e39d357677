use serde::{Deserialize, Serialize};
use set_state::{Board, Card, SetTriple, BOARD_SIZE};
use tracing::debug;

/// Outcome of searching one board.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolveReport {
    /// First Set in search order, if any.
    pub first: Option<SetTriple>,
    /// Every distinct Set on the board, each with ascending indices.
    pub all: Vec<SetTriple>,
}

/// Three values pass when they are all equal or pairwise distinct.
fn attribute_ok<T: PartialEq>(a: T, b: T, c: T) -> bool {
    let ab = a == b;
    let bc = b == c;
    let ac = a == c;
    (ab && bc) || (!ab && !bc && !ac)
}

/// Check the four attributes of a candidate triple.
///
/// Degraded cards never take part in a Set: three empty slots would
/// otherwise agree on every attribute.
pub fn is_set(a: &Card, b: &Card, c: &Card) -> bool {
    if !(a.is_recognized() && b.is_recognized() && c.is_recognized()) {
        return false;
    }
    attribute_ok(a.color, b.color, c.color)
        && attribute_ok(a.shape, b.shape, c.shape)
        && attribute_ok(a.count, b.count, c.count)
        && attribute_ok(a.filling, b.filling, c.filling)
}

/// Find the first Set on the board.
///
/// Candidates are ordered index triples `(i, j, k)` with pairwise distinct
/// indices, visited in ascending lexicographic order. Callers rely on this
/// order being stable from cycle to cycle.
pub fn find_set(board: &Board) -> Option<SetTriple> {
    let cards = board.cards();
    let mut checked = 0u32;

    for i in 0..BOARD_SIZE {
        for j in 0..BOARD_SIZE {
            if j == i {
                continue;
            }
            for k in 0..BOARD_SIZE {
                if k == i || k == j {
                    continue;
                }
                checked += 1;
                if is_set(&cards[i], &cards[j], &cards[k]) {
                    debug!("Set [{}, {}, {}] after {} candidates", i, j, k, checked);
                    return Some(SetTriple([i, j, k]));
                }
            }
        }
    }

    debug!("No set among {} candidates", checked);
    None
}

/// Every distinct Set on the board, as ascending index triples.
pub fn find_all_sets(board: &Board) -> Vec<SetTriple> {
    let cards = board.cards();
    let mut sets = Vec::new();
    for i in 0..BOARD_SIZE {
        for j in (i + 1)..BOARD_SIZE {
            for k in (j + 1)..BOARD_SIZE {
                if is_set(&cards[i], &cards[j], &cards[k]) {
                    sets.push(SetTriple([i, j, k]));
                }
            }
        }
    }
    sets
}

pub fn solve(board: &Board) -> SolveReport {
    let report = SolveReport {
        first: find_set(board),
        all: find_all_sets(board),
    };
    debug!(
        "Board has {} recognized card(s), {} set(s)",
        board.recognized_count(),
        report.all.len()
    );
    report
}
