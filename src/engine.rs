use rand::Rng;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Number of cells on the board.
pub const CELLS: usize = 16;

/// Largest exponent a 4-bit cell can hold (a 32768 tile).
pub const MAX_EXPONENT: u8 = 0xf;

/// A direction to slide/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Left,
    Right,
    Up,
    Down,
}

impl Move {
    /// Every move, in the order legal moves are enumerated.
    pub const ALL: [Move; 4] = [Move::Left, Move::Right, Move::Up, Move::Down];

    pub fn as_str(self) -> &'static str {
        match self {
            Move::Left => "left",
            Move::Right => "right",
            Move::Up => "up",
            Move::Down => "down",
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown move {0:?}, expected one of left, right, up, down")]
pub struct ParseMoveError(String);

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Move::Left),
            "right" | "r" => Ok(Move::Right),
            "up" | "u" => Ok(Move::Up),
            "down" | "d" => Ok(Move::Down),
            _ => Err(ParseMoveError(s.to_string())),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseBoardError {
    #[error("empty board literal")]
    Empty,
    #[error("board literal has {0} hex digits, a packed board holds at most 16")]
    TooLong(usize),
    #[error("invalid board literal: {0}")]
    Digits(#[from] std::num::ParseIntError),
}

const LINE_TABLE_SIZE: usize = 0x1_0000; // 65,536 possible 16-bit lines

struct Stores {
    shift_left: Box<[Line]>,
    shift_right: Box<[Line]>,
    score: Box<[Score]>,
}

type BoardRaw = u64;
type Line = u16;
type Score = u64;

/// Packed 4x4 2048 board: 16 exponents of 4 bits each in a `u64`.
///
/// Cell `i` (row-major, `0..16`) lives in bits `[4i, 4i + 4)`, so row `r`
/// is the 16-bit slice starting at bit `16r` with its leftmost cell in the
/// lowest nibble. An exponent of `0` is an empty cell, `e > 0` is a tile
/// worth `2^e`.
///
/// Boards are values: every operation returns a new board.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board(BoardRaw);

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board(0);

    /// Construct a `Board` from its raw packed representation.
    #[inline]
    pub fn from_raw(raw: BoardRaw) -> Self { Board(raw) }

    /// Consume this `Board`, returning the raw packed `u64`.
    #[inline]
    pub fn into_raw(self) -> BoardRaw { self.0 }

    /// Borrow the raw packed `u64` for this `Board`.
    #[inline]
    pub fn raw(&self) -> BoardRaw { self.0 }

    /// Build a board from a row-major grid of exponents.
    ///
    /// ```
    /// use packed_2048::engine::Board;
    /// let b = Board::from_grid([[1, 0, 0, 0], [0; 4], [0; 4], [0, 0, 0, 2]]);
    /// assert_eq!(b.cell(0), 1);
    /// assert_eq!(b.cell(15), 2);
    /// ```
    pub fn from_grid(grid: [[u8; 4]; 4]) -> Self {
        let mut board = Board::EMPTY;
        for (row_idx, row) in grid.iter().enumerate() {
            for (col_idx, &exponent) in row.iter().enumerate() {
                if exponent != 0 {
                    board = board.with_cell(row_idx * 4 + col_idx, exponent);
                }
            }
        }
        board
    }

    /// Row-major grid of exponents.
    pub fn to_grid(self) -> [[u8; 4]; 4] {
        let mut grid = [[0; 4]; 4];
        for (idx, slot) in grid.iter_mut().flatten().enumerate() {
            *slot = self.cell(idx);
        }
        grid
    }

    /// Exponent stored in cell `idx`.
    ///
    /// Panics if `idx >= 16`.
    #[inline]
    pub fn cell(self, idx: usize) -> u8 {
        assert!(idx < CELLS, "cell index {idx} out of range");
        ((self.0 >> (4 * idx)) & 0xf) as u8
    }

    /// Place `exponent` into the empty cell `idx`.
    ///
    /// The exponent is OR-ed into the nibble, so the cell must be empty.
    /// Panics on an occupied cell, an out-of-range index or an exponent
    /// that does not fit in 4 bits.
    #[inline]
    pub fn with_cell(self, idx: usize, exponent: u8) -> Self {
        assert!(exponent <= MAX_EXPONENT, "exponent {exponent} does not fit in a cell");
        assert!(self.cell(idx) == 0, "cell {idx} of {self:?} is already occupied");
        Board(self.0 | (BoardRaw::from(exponent) << (4 * idx)))
    }

    /// Indices of empty cells in ascending order.
    pub fn empty_cells(self) -> impl Iterator<Item = usize> {
        (0..CELLS).filter(move |&idx| self.cell(idx) == 0)
    }

    /// Count the number of empty cells on the board.
    #[inline]
    pub fn count_empty(self) -> u64 { count_empty(self) }

    /// Return the board resulting from sliding/merging tiles in `dir` (no random insert).
    ///
    /// ```
    /// use packed_2048::engine::{Board, Move};
    /// let b = Board::from_grid([[1, 1, 2, 0], [0; 4], [0; 4], [0; 4]]);
    /// assert_eq!(b.shift(Move::Left).to_grid()[0], [2, 2, 0, 0]);
    /// ```
    #[inline]
    pub fn shift(self, dir: Move) -> Self { shift(self, dir) }

    /// Insert a 2 (90%) or 4 (10%) tile into a uniformly chosen empty cell.
    ///
    /// A full board is returned unchanged.
    ///
    /// ```
    /// use packed_2048::engine::Board;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    pub fn with_random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let mut cells = [0usize; CELLS];
        let mut empty = 0;
        for idx in self.empty_cells() {
            cells[empty] = idx;
            empty += 1;
        }
        if empty == 0 {
            return self;
        }
        let idx = cells[rng.gen_range(0..empty)];
        let tile = generate_random_tile(rng);
        self.with_cell(idx, tile)
    }

    /// A fresh game: two random tiles on the empty board.
    pub fn initial<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Board::EMPTY.with_random_tile(rng).with_random_tile(rng)
    }

    /// Apply `dir`, then insert a random tile when `spawn` is set.
    ///
    /// `spawn = false` yields the deterministic afterstate used by search.
    #[inline]
    pub fn apply_move<R: Rng + ?Sized>(self, dir: Move, spawn: bool, rng: &mut R) -> Self {
        let moved = self.shift(dir);
        if spawn { moved.with_random_tile(rng) } else { moved }
    }

    /// Perform a move and insert a random tile, using the provided RNG.
    ///
    /// ```
    /// use packed_2048::engine::{Board, Move};
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(1);
    /// let b0 = Board::initial(&mut rng);
    /// let dir = b0.legal_moves()[0];
    /// let b1 = b0.make_move(dir, &mut rng);
    /// assert_ne!(b0, b1);
    /// ```
    #[inline]
    pub fn make_move<R: Rng + ?Sized>(self, dir: Move, rng: &mut R) -> Self {
        self.apply_move(dir, true, rng)
    }

    /// Moves that change the board, paired with the resulting afterstate.
    ///
    /// Order is [`Move::ALL`].
    pub fn legal_shifts(self) -> impl Iterator<Item = (Move, Board)> {
        Move::ALL
            .into_iter()
            .map(move |dir| (dir, self.shift(dir)))
            .filter(move |&(_, moved)| moved != self)
    }

    /// Moves that change the board, in [`Move::ALL`] order.
    pub fn legal_moves(self) -> Vec<Move> {
        self.legal_shifts().map(|(dir, _)| dir).collect()
    }

    /// Return true if no legal moves remain.
    ///
    /// ```
    /// use packed_2048::engine::Board;
    /// // Shifting the empty board never changes it.
    /// assert!(Board::EMPTY.is_terminal());
    /// ```
    #[inline]
    pub fn is_terminal(self) -> bool { is_terminal(self) }

    /// Compute the total score for this board.
    #[inline]
    pub fn score(self) -> Score { get_score(self) }

    /// Return the highest tile value (e.g., 2048) present on the board, 0 if empty.
    pub fn highest_tile(self) -> u64 {
        let max_exponent = (0..CELLS).map(|idx| self.cell(idx)).max().unwrap_or(0);
        tile_value_of(max_exponent)
    }

    /// Tile value at `idx` (`2^exponent`, 0 for an empty cell).
    #[inline]
    pub fn tile_value(self, idx: usize) -> u64 { tile_value_of(self.cell(idx)) }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#018x})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.to_grid() {
            let cells: Vec<String> = row.iter().map(|&exponent| format_val(exponent)).collect();
            writeln!(f, "{}", cells.join("\t"))?;
        }
        Ok(())
    }
}

impl FromStr for Board {
    type Err = ParseBoardError;

    /// Parse a hex literal such as `0x0000000000002211`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim();
        let digits = digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
            .unwrap_or(digits);
        if digits.is_empty() {
            return Err(ParseBoardError::Empty);
        }
        if digits.len() > 16 {
            return Err(ParseBoardError::TooLong(digits.len()));
        }
        Ok(Board(BoardRaw::from_str_radix(digits, 16)?))
    }
}

impl From<BoardRaw> for Board { fn from(v: BoardRaw) -> Self { Board::from_raw(v) } }
impl From<Board> for BoardRaw { fn from(b: Board) -> Self { b.into_raw() } }

/// Initialize internal tables ahead of first use. Safe to call multiple times.
pub fn new() {
    let _ = stores();
}

/// A fresh game: two random tiles on the empty board.
pub fn initial_state<R: Rng + ?Sized>(rng: &mut R) -> Board { Board::initial(rng) }

/// Sum of `(e - 1) * 2^e` over every tile.
pub fn get_score(board: Board) -> Score {
    let score_table = &stores().score;
    (0..4).fold(0, |acc, row_idx| acc + score_table[extract_line(board.0, row_idx) as usize])
}

/// Slide/merge tiles in the given direction. No randomness.
pub fn shift(board: Board, direction: Move) -> Board {
    match direction {
        Move::Left => move_left(board),
        Move::Right => move_right(board),
        Move::Up => move_up(board),
        Move::Down => move_down(board),
    }
}

pub fn move_left(board: Board) -> Board { Board(shift_rows(board.0, &stores().shift_left)) }

pub fn move_right(board: Board) -> Board { Board(shift_rows(board.0, &stores().shift_right)) }

pub fn move_up(board: Board) -> Board { Board(transpose(shift_rows(transpose(board.0), &stores().shift_left))) }

pub fn move_down(board: Board) -> Board { Board(transpose(shift_rows(transpose(board.0), &stores().shift_right))) }

/// True if no move in any direction changes the board.
pub fn is_terminal(board: Board) -> bool {
    Move::ALL.iter().all(|&dir| shift(board, dir) == board)
}

/// Merge one row or column of exponents toward index 0 (toward index 3 when `reverse`).
///
/// Zeros are dropped, equal neighbours merge into the next exponent and a
/// merged tile does not merge again in the same pass. Two maximal tiles stay
/// apart since their sum does not fit in a cell.
///
/// ```
/// use packed_2048::engine::merge_line;
/// assert_eq!(merge_line([1, 1, 1, 0], false), [2, 1, 0, 0]);
/// assert_eq!(merge_line([0, 0, 1, 1], true), [0, 0, 0, 2]);
/// ```
pub fn merge_line(line: [u8; 4], reverse: bool) -> [u8; 4] {
    let mut tiles = line;
    if reverse {
        tiles.reverse();
    }
    let mut merged = [0u8; 4];
    let mut len = 0;
    let mut open = false;
    for &tile in tiles.iter().filter(|&&tile| tile != 0) {
        if open && merged[len - 1] == tile && tile < MAX_EXPONENT {
            merged[len - 1] += 1;
            open = false;
        } else {
            merged[len] = tile;
            len += 1;
            open = true;
        }
    }
    if reverse {
        merged.reverse();
    }
    merged
}

// Credit to Nneonneo. Swaps nibble 4a+b with 4b+a, i.e. cell (r, c) with (c, r).
pub(crate) fn transpose(x: BoardRaw) -> BoardRaw {
    let a1 = x & 0xF0F00F0FF0F00F0F;
    let a2 = x & 0x0000F0F00000F0F0;
    let a3 = x & 0x0F0F00000F0F0000;
    let a = a1 | (a2 << 12) | (a3 >> 12);
    let b1 = a & 0xFF00FF0000FF00FF;
    let b2 = a & 0x00FF00FF00000000;
    let b3 = a & 0x00000000FF00FF00;
    b1 | (b2 >> 24) | (b3 << 24)
}

// https://stackoverflow.com/questions/38225571/count-number-of-zero-nibbles-in-an-unsigned-64-bit-integer
/// Count the number of zero tiles.
pub fn count_empty(board: Board) -> u64 {
    16 - count_non_empty(board)
}

static STORES: OnceLock<Stores> = OnceLock::new();

fn create_stores() -> Stores {
    // Allocate on the heap to avoid large stack frames
    let mut shift_left = vec![0 as Line; LINE_TABLE_SIZE];
    let mut shift_right = vec![0 as Line; LINE_TABLE_SIZE];
    let mut score = vec![0 as Score; LINE_TABLE_SIZE];

    for (val, ((left, right), line_score)) in shift_left
        .iter_mut()
        .zip(shift_right.iter_mut())
        .zip(score.iter_mut())
        .enumerate()
    {
        let tiles = unpack_line(val as Line);
        *left = pack_line(merge_line(tiles, false));
        *right = pack_line(merge_line(tiles, true));
        *line_score = calc_score(tiles);
    }

    Stores {
        shift_left: shift_left.into_boxed_slice(),
        shift_right: shift_right.into_boxed_slice(),
        score: score.into_boxed_slice(),
    }
}

#[inline(always)]
fn stores() -> &'static Stores {
    STORES.get_or_init(create_stores)
}

#[inline(always)]
fn extract_line(board: BoardRaw, line_idx: u64) -> Line {
    ((board >> (16 * line_idx)) & 0xffff) as Line
}

fn shift_rows(board: BoardRaw, table: &[Line]) -> BoardRaw {
    (0..4).fold(0, |new_board, row_idx| {
        let row_val = extract_line(board, row_idx);
        new_board | (BoardRaw::from(table[row_val as usize]) << (16 * row_idx))
    })
}

fn unpack_line(line: Line) -> [u8; 4] {
    [
        (line & 0xf) as u8,
        ((line >> 4) & 0xf) as u8,
        ((line >> 8) & 0xf) as u8,
        ((line >> 12) & 0xf) as u8,
    ]
}

fn pack_line(tiles: [u8; 4]) -> Line {
    tiles
        .iter()
        .enumerate()
        .fold(0, |line, (idx, &tile)| line | (Line::from(tile) << (4 * idx)))
}

fn generate_random_tile<R: Rng + ?Sized>(rng: &mut R) -> u8 { if rng.gen_range(0..10) < 9 { 1 } else { 2 } }

fn calc_score(tiles: [u8; 4]) -> Score {
    tiles
        .iter()
        .filter(|&&tile| tile > 0)
        .map(|&tile| Score::from(tile - 1) * (1 << tile))
        .sum()
}

fn count_non_empty(board: Board) -> u64 {
    let mut board_copy = board.0;
    board_copy |= board_copy >> 1;
    board_copy |= board_copy >> 2;
    board_copy &= 0x1111111111111111;
    board_copy.count_ones() as u64
}

fn tile_value_of(exponent: u8) -> u64 {
    if exponent == 0 { 0 } else { 1 << exponent }
}

fn format_val(exponent: u8) -> String {
    match exponent {
        0 => String::from("."),
        e => (1u64 << e).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    /// Boards reached by random play, so every one is well formed.
    fn played_boards(seed: u64, count: usize) -> Vec<Board> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut boards = Vec::with_capacity(count);
        let mut board = Board::initial(&mut rng);
        while boards.len() < count {
            boards.push(board);
            let moves = board.legal_moves();
            if moves.is_empty() {
                board = Board::initial(&mut rng);
                continue;
            }
            let dir = moves[rng.gen_range(0..moves.len())];
            board = board.make_move(dir, &mut rng);
        }
        boards
    }

    fn non_empty(board: Board) -> usize {
        (0..CELLS).filter(|&idx| board.cell(idx) != 0).count()
    }

    #[test]
    fn it_merge_line() {
        assert_eq!(merge_line([1, 1, 0, 0], false), [2, 0, 0, 0]);
        assert_eq!(merge_line([1, 1, 1, 0], false), [2, 1, 0, 0]);
        assert_eq!(merge_line([0, 0, 1, 1], true), [0, 0, 0, 2]);
        assert_eq!(merge_line([0, 0, 0, 0], false), [0, 0, 0, 0]);
        assert_eq!(merge_line([1, 2, 1, 2], false), [1, 2, 1, 2]);
        assert_eq!(merge_line([1, 1, 2, 2], false), [2, 3, 0, 0]);
        assert_eq!(merge_line([1, 0, 0, 1], false), [2, 0, 0, 0]);
        assert_eq!(merge_line([2, 2, 2, 2], false), [3, 3, 0, 0]);
    }

    #[test]
    fn it_merge_line_reverse() {
        assert_eq!(merge_line([1, 1, 2, 2], true), [0, 0, 2, 3]);
        assert_eq!(merge_line([5, 0, 0, 5], true), [0, 0, 0, 6]);
        assert_eq!(merge_line([0, 2, 2, 2], true), [0, 0, 2, 3]);
        assert_eq!(merge_line([1, 1, 1, 0], true), [0, 0, 1, 2]);
    }

    #[test]
    fn max_exponent_tiles_do_not_merge() {
        assert_eq!(merge_line([15, 15, 0, 0], false), [15, 15, 0, 0]);
        assert_eq!(merge_line([14, 14, 15, 0], false), [15, 15, 0, 0]);
    }

    #[test]
    fn test_cell_layout() {
        let board = Board::from_raw(0xfedc_ba98_7654_3210);
        for idx in 0..CELLS {
            assert_eq!(board.cell(idx) as usize, idx);
        }
        assert_eq!(Board::EMPTY.with_cell(1, 3).raw(), 0x30);
        assert_eq!(Board::EMPTY.with_cell(15, 2).raw(), 0x2000_0000_0000_0000);
    }

    #[test]
    #[should_panic]
    fn with_cell_rejects_occupied_cell() {
        let _ = Board::EMPTY.with_cell(4, 1).with_cell(4, 2);
    }

    #[test]
    #[should_panic]
    fn cell_rejects_out_of_range_index() {
        let _ = Board::EMPTY.cell(16);
    }

    #[test]
    fn test_grid_round_trip() {
        let grid = [[1, 2, 3, 4], [5, 6, 7, 8], [9, 10, 11, 12], [13, 14, 15, 0]];
        assert_eq!(Board::from_grid(grid).to_grid(), grid);
    }

    #[test]
    fn it_empty_cells() {
        let board = Board::from_grid([[1, 0, 0, 0], [0, 2, 0, 0], [0; 4], [3, 3, 3, 3]]);
        let empty: Vec<usize> = board.empty_cells().collect();
        assert_eq!(empty, vec![1, 2, 3, 4, 6, 7, 8, 9, 10, 11]);
        assert_eq!(board.count_empty(), 10);
    }

    #[test]
    fn it_count_empty() {
        let game = Board::from_raw(0x1111000011110000);
        assert_eq!(count_empty(game), 8);
        let game = Board::from_raw(0x0000000000000011);
        assert_eq!(count_empty(game), 14);
        assert_eq!(count_non_empty(Board::from_raw(0x1134000000000000)), 4);
    }

    #[test]
    fn test_transpose() {
        let board = Board::from_grid([[1, 2, 3, 4], [5, 6, 7, 8], [9, 10, 11, 12], [13, 14, 15, 0]]);
        let transposed = Board::from_raw(transpose(board.raw()));
        assert_eq!(
            transposed.to_grid(),
            [[1, 5, 9, 13], [2, 6, 10, 14], [3, 7, 11, 15], [4, 8, 12, 0]]
        );
        assert_eq!(transpose(transposed.raw()), board.raw());
    }

    #[test]
    fn test_move_left() {
        let game = Board::from_grid([[1, 2, 3, 4], [1, 3, 3, 2], [2, 0, 0, 2], [1, 0, 0, 2]]);
        assert_eq!(
            move_left(game).to_grid(),
            [[1, 2, 3, 4], [1, 4, 2, 0], [3, 0, 0, 0], [1, 2, 0, 0]]
        );
    }

    #[test]
    fn test_move_right() {
        let game = Board::from_grid([[1, 2, 3, 4], [1, 3, 3, 2], [2, 0, 0, 2], [1, 0, 0, 2]]);
        assert_eq!(
            move_right(game).to_grid(),
            [[1, 2, 3, 4], [0, 1, 4, 2], [0, 0, 0, 3], [0, 0, 1, 2]]
        );
    }

    #[test]
    fn test_move_up() {
        let game = Board::from_grid([[1, 1, 2, 1], [2, 3, 0, 0], [3, 3, 0, 0], [4, 2, 2, 2]]);
        assert_eq!(
            move_up(game).to_grid(),
            [[1, 1, 3, 1], [2, 4, 0, 2], [3, 2, 0, 0], [4, 0, 0, 0]]
        );
    }

    #[test]
    fn test_move_down() {
        let game = Board::from_grid([[1, 1, 2, 1], [2, 3, 0, 0], [3, 3, 0, 0], [4, 2, 2, 2]]);
        assert_eq!(
            move_down(game).to_grid(),
            [[1, 0, 0, 0], [2, 1, 0, 0], [3, 4, 0, 1], [4, 2, 3, 2]]
        );
    }

    #[test]
    fn row_merges_twice_over_two_moves() {
        let game = Board::from_grid([[1, 1, 2, 0], [0; 4], [0; 4], [0; 4]]);
        let once = game.shift(Move::Left);
        assert_eq!(once.to_grid()[0], [2, 2, 0, 0]);
        let twice = once.shift(Move::Left);
        assert_eq!(twice.to_grid()[0], [3, 0, 0, 0]);
        assert_eq!(twice.count_empty(), 15);
    }

    #[test]
    fn test_legal_moves_order() {
        let corner = Board::from_grid([[1, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
        assert_eq!(corner.legal_moves(), vec![Move::Right, Move::Down]);

        let spread = Board::from_grid([[1, 0, 0, 0], [0; 4], [0; 4], [0, 0, 0, 1]]);
        assert_eq!(spread.legal_moves(), Move::ALL.to_vec());

        let only_up = Board::from_grid([[0, 0, 0, 0], [1, 2, 1, 2], [2, 1, 2, 1], [1, 2, 1, 2]]);
        assert_eq!(only_up.legal_moves(), vec![Move::Up]);
    }

    #[test]
    fn full_board_without_neighbours_is_terminal() {
        let board = Board::from_grid([[1, 2, 1, 2], [2, 1, 2, 1], [1, 2, 1, 2], [2, 1, 2, 1]]);
        assert!(board.legal_moves().is_empty());
        assert!(board.is_terminal());

        let mergeable = Board::from_grid([[1, 2, 1, 2], [2, 1, 2, 1], [1, 2, 1, 2], [2, 1, 2, 2]]);
        assert!(!mergeable.is_terminal());
        assert_eq!(mergeable.legal_moves(), Move::ALL.to_vec());
    }

    #[test]
    fn illegal_moves_leave_board_unchanged() {
        let mut rng = StdRng::seed_from_u64(3);
        for board in played_boards(11, 400) {
            let legal = board.legal_moves();
            for dir in Move::ALL {
                let moved = board.apply_move(dir, false, &mut rng);
                assert_eq!(legal.contains(&dir), moved != board, "{dir} on {board:?}");
            }
        }
    }

    #[test]
    fn moves_never_add_tiles() {
        for board in played_boards(5, 400) {
            for dir in Move::ALL {
                assert!(non_empty(board.shift(dir)) <= non_empty(board));
            }
        }
    }

    #[test]
    fn merging_never_lowers_score() {
        for board in played_boards(8, 400) {
            let moved = move_left(board);
            if non_empty(moved) < non_empty(board) {
                assert!(moved.score() >= board.score(), "{board:?}");
            }
        }
    }

    #[test]
    fn spawn_fills_exactly_one_empty_cell() {
        let mut rng = StdRng::seed_from_u64(21);
        for board in played_boards(13, 300) {
            let spawned = board.with_random_tile(&mut rng);
            if board.count_empty() == 0 {
                assert_eq!(spawned, board);
                continue;
            }
            assert_eq!(spawned.count_empty() + 1, board.count_empty());
            for idx in 0..CELLS {
                if board.cell(idx) != 0 {
                    assert_eq!(spawned.cell(idx), board.cell(idx));
                } else if spawned.cell(idx) != 0 {
                    assert!(matches!(spawned.cell(idx), 1 | 2));
                }
            }
        }
    }

    #[test]
    fn spawn_reaches_every_empty_cell() {
        let board = Board::from_grid([[0, 2, 1, 2], [2, 1, 2, 1], [1, 2, 0, 2], [2, 1, 2, 0]]);
        let mut rng = StdRng::seed_from_u64(3);
        let mut hits = [0u32; CELLS];
        for _ in 0..300 {
            let spawned = board.with_random_tile(&mut rng);
            let idx = (0..CELLS).find(|&idx| board.cell(idx) == 0 && spawned.cell(idx) != 0).unwrap();
            hits[idx] += 1;
        }
        assert_eq!(hits.iter().sum::<u32>(), 300);
        for idx in [0, 10, 15] {
            assert!(hits[idx] > 50, "cell {idx}: {hits:?}");
        }
    }

    #[test]
    fn spawn_on_full_board_is_noop() {
        let full = Board::from_grid([[1, 2, 1, 2], [2, 1, 2, 1], [1, 2, 1, 2], [2, 1, 2, 1]]);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(full.with_random_tile(&mut rng), full);
    }

    #[test]
    fn it_test_insert_random_tile() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut game = Board::EMPTY;
        for _ in 0..16 {
            game = game.with_random_tile(&mut rng);
        }
        assert_eq!(count_empty(game), 0);
    }

    #[test]
    fn spawn_favours_twos() {
        let mut rng = StdRng::seed_from_u64(2048);
        let twos = (0..10_000)
            .filter(|_| Board::EMPTY.with_random_tile(&mut rng).highest_tile() == 2)
            .count();
        assert!((8_600..9_400).contains(&twos), "{twos} twos out of 10000");
    }

    #[test]
    fn initial_state_has_two_tiles() {
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..50 {
            let board = initial_state(&mut rng);
            assert_eq!(board.count_empty(), 14);
            assert!(board.highest_tile() <= 4);
        }
    }

    #[test]
    fn it_get_score() {
        assert_eq!(Board::EMPTY.score(), 0);
        // 2 -> 0, 4 -> 4, 8 -> 16, 2048 -> 20480
        let board = Board::from_grid([[1, 2, 3, 0], [0; 4], [0; 4], [0, 0, 0, 11]]);
        assert_eq!(board.score(), 4 + 16 + 20480);
    }

    #[test]
    fn it_tile_values() {
        let board = Board::from_raw(0xfedc_ba98_7654_3210);
        assert_eq!(board.tile_value(0), 0);
        assert_eq!(board.tile_value(3), 8);
        assert_eq!(board.tile_value(10), 1024);
        assert_eq!(board.tile_value(15), 32768);
        assert_eq!(board.highest_tile(), 32768);
        assert_eq!(Board::EMPTY.highest_tile(), 0);
    }

    #[test]
    fn test_parse_move() {
        assert_eq!("left".parse::<Move>(), Ok(Move::Left));
        assert_eq!(" Down ".parse::<Move>(), Ok(Move::Down));
        assert_eq!("u".parse::<Move>(), Ok(Move::Up));
        assert!("sideways".parse::<Move>().is_err());
        for dir in Move::ALL {
            assert_eq!(dir.to_string().parse::<Move>(), Ok(dir));
        }
    }

    #[test]
    fn test_parse_board() {
        assert_eq!("0x2211".parse::<Board>(), Ok(Board::from_raw(0x2211)));
        assert_eq!("FEDCBA9876543210".parse::<Board>(), Ok(Board::from_raw(0xfedc_ba98_7654_3210)));
        assert_eq!("0x".parse::<Board>(), Err(ParseBoardError::Empty));
        assert_eq!("0x1fedcba9876543210".parse::<Board>(), Err(ParseBoardError::TooLong(17)));
        assert!(matches!("0xzz".parse::<Board>(), Err(ParseBoardError::Digits(_))));
    }

    #[test]
    fn test_display() {
        let board = Board::from_grid([[1, 0, 0, 0], [0; 4], [0; 4], [0, 0, 0, 11]]);
        assert_eq!(
            board.to_string(),
            "2\t.\t.\t.\n.\t.\t.\t.\n.\t.\t.\t.\n.\t.\t.\t2048\n"
        );
        assert_eq!(format!("{:?}", Board::from_raw(0x21)), "Board(0x0000000000000021)");
    }
}
