use crate::engine::{Board, CELLS};

/// Positional weights per corner, indexed by cell (row-major).
///
/// Each pattern gives its corner 10 and 5, 2, 1 to cells at Manhattan
/// distance 1, 2, 3 from it; the four are reflections of the upper-left one.
#[rustfmt::skip]
const CORNER_WEIGHTS: [[u64; CELLS]; 4] = [
    // upper left
    [
        10, 5, 2, 1,
        5, 2, 1, 0,
        2, 1, 0, 0,
        1, 0, 0, 0,
    ],
    // upper right
    [
        1, 2, 5, 10,
        0, 1, 2, 5,
        0, 0, 1, 2,
        0, 0, 0, 1,
    ],
    // lower left
    [
        1, 0, 0, 0,
        2, 1, 0, 0,
        5, 2, 1, 0,
        10, 5, 2, 1,
    ],
    // lower right
    [
        0, 0, 0, 1,
        0, 0, 1, 2,
        0, 1, 2, 5,
        1, 2, 5, 10,
    ],
];

/// Best corner-anchored weighted sum of `2^e` over all cells.
///
/// Empty cells count as `2^0 = 1`.
pub(crate) fn corner_score(board: Board) -> u64 {
    let mut values = [0u64; CELLS];
    for (idx, value) in values.iter_mut().enumerate() {
        *value = 1 << board.cell(idx);
    }
    CORNER_WEIGHTS
        .iter()
        .map(|weights| weights.iter().zip(values.iter()).map(|(&w, &v)| w * v).sum::<u64>())
        .fold(0, u64::max)
}
