use rand::Rng;
use std::fmt;

/// Side length of the square board.
pub const SIZE: usize = 4;
const CELLS: usize = SIZE * SIZE;

type Tile = u32;
type Score = u64;

/// A direction to push tiles towards.
///
/// The discriminants are the stable indices used for child slots and vote
/// counters; every "first wins" tie-break scans directions in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Move {
    Left = 0,
    Right = 1,
    Up = 2,
    Down = 3,
}

impl Move {
    /// All directions in scan order.
    pub const ALL: [Move; 4] = [Move::Left, Move::Right, Move::Up, Move::Down];

    #[inline]
    pub fn index(self) -> usize { self as usize }

    /// Inverse of [`Move::index`].
    #[inline]
    pub fn from_index(idx: usize) -> Option<Move> { Move::ALL.get(idx).copied() }

    /// Stable display name (`LEFT`, `RIGHT`, `UP`, `DOWN`).
    pub fn name(self) -> &'static str {
        match self {
            Move::Left => "LEFT",
            Move::Right => "RIGHT",
            Move::Up => "UP",
            Move::Down => "DOWN",
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid direction index {0} (expected 0..4)")]
pub struct InvalidDirection(pub u8);

impl TryFrom<u8> for Move {
    type Error = InvalidDirection;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Move::from_index(v as usize).ok_or(InvalidDirection(v))
    }
}

impl From<Move> for u8 {
    fn from(m: Move) -> Self { m as u8 }
}

/// Rejections from [`Board::set_tile`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileError {
    #[error("position ({row}, {col}) is outside the 4x4 board")]
    OutOfBounds { row: usize, col: usize },
    #[error("position ({row}, {col}) is already occupied")]
    Occupied { row: usize, col: usize },
    #[error("tile value {0} is not a power of two >= 2")]
    BadValue(Tile),
}

/// A 4x4 board of tile values (0 = empty) plus the cumulative merge score.
///
/// `Board` is `Copy`: every search branch works on its own copy, so
/// mutating one never shows through another.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board {
    cells: [[Tile; SIZE]; SIZE],
    score: Score,
}

impl Board {
    /// A constant empty board with zero score.
    pub const EMPTY: Board = Board { cells: [[0; SIZE]; SIZE], score: 0 };

    /// Build a board from `(row, col, value)` triples and a starting score.
    ///
    /// Panics if a coordinate is outside the board.
    ///
    /// ```
    /// use ai_2048_mc::engine::Board;
    /// let b = Board::from_sparse(&[(0, 0, 2), (3, 3, 4)], 0);
    /// assert_eq!(b.tile(3, 3), 4);
    /// ```
    pub fn from_sparse(tiles: &[(usize, usize, Tile)], score: Score) -> Self {
        let mut board = Board { score, ..Board::EMPTY };
        for &(row, col, val) in tiles {
            board.cells[row][col] = val;
        }
        board
    }

    /// Build a board from a full cell matrix.
    pub fn from_cells(cells: [[Tile; SIZE]; SIZE], score: Score) -> Self { Board { cells, score } }

    #[inline]
    pub fn cells(&self) -> &[[Tile; SIZE]; SIZE] { &self.cells }

    #[inline]
    pub fn tile(&self, row: usize, col: usize) -> Tile { self.cells[row][col] }

    /// Cumulative sum of every tile produced by a merge.
    #[inline]
    pub fn score(&self) -> Score { self.score }

    /// Place a known tile, as reported by an external game.
    pub fn set_tile(&mut self, row: usize, col: usize, value: Tile) -> Result<(), TileError> {
        if row >= SIZE || col >= SIZE {
            return Err(TileError::OutOfBounds { row, col });
        }
        if value < 2 || !value.is_power_of_two() {
            return Err(TileError::BadValue(value));
        }
        if self.cells[row][col] != 0 {
            return Err(TileError::Occupied { row, col });
        }
        self.cells[row][col] = value;
        Ok(())
    }

    /// Slide and merge every line towards `dir`.
    ///
    /// Returns `true` iff some tile moved or merged; on `false` the board
    /// (cells and score) is untouched.
    ///
    /// ```
    /// use ai_2048_mc::engine::{Board, Move};
    /// let mut b = Board::from_sparse(&[(0, 0, 2), (0, 1, 2), (0, 2, 2), (0, 3, 2)], 0);
    /// assert!(b.shift(Move::Left));
    /// assert_eq!(b.cells()[0], [4, 4, 0, 0]);
    /// assert_eq!(b.score(), 8);
    /// ```
    pub fn shift(&mut self, dir: Move) -> bool {
        let mut moved = false;
        for line in 0..SIZE {
            moved |= self.shift_line(&line_positions(dir, line));
        }
        moved
    }

    /// Same as [`Board::shift`] but returns the result as a new board.
    #[inline]
    pub fn shifted(mut self, dir: Move) -> Option<Board> {
        if self.shift(dir) { Some(self) } else { None }
    }

    /// Compact one line. `line[0]` is the cell nearest the push edge.
    fn shift_line(&mut self, line: &[(usize, usize); SIZE]) -> bool {
        let mut moved = false;
        let mut slot = 0;
        // A slot that already took a merge this pass cannot take another.
        let mut slot_merged = false;
        for scan in 1..SIZE {
            let (sr, sc) = line[scan];
            let val = self.cells[sr][sc];
            if val == 0 {
                continue;
            }
            let (tr, tc) = line[slot];
            let target = self.cells[tr][tc];
            if target == 0 {
                self.cells[tr][tc] = val;
                self.cells[sr][sc] = 0;
                moved = true;
            } else if target == val && !slot_merged {
                let merged = val * 2;
                self.cells[tr][tc] = merged;
                self.cells[sr][sc] = 0;
                self.score += Score::from(merged);
                slot_merged = true;
                moved = true;
            } else {
                slot += 1;
                slot_merged = false;
                if slot != scan {
                    let (nr, nc) = line[slot];
                    self.cells[nr][nc] = val;
                    self.cells[sr][sc] = 0;
                    moved = true;
                }
            }
        }
        moved
    }

    /// Insert a 2 (90%) or 4 (10%) into an empty cell using the provided RNG.
    ///
    /// Probing starts at a uniformly random cell and walks forward in
    /// row-major order, wrapping, until an empty cell is found. Returns
    /// `false` without touching the board when it is full.
    ///
    /// ```
    /// use ai_2048_mc::engine::Board;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let mut b = Board::EMPTY;
    /// assert!(b.place_random(&mut rng));
    /// assert_eq!(b.count_empty(), 15);
    /// ```
    pub fn place_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.count_empty() == 0 {
            return false;
        }
        let tile = generate_random_tile(rng);
        let start = rng.gen_range(0..CELLS);
        for offset in 0..CELLS {
            let idx = (start + offset) % CELLS;
            let (row, col) = (idx / SIZE, idx % SIZE);
            if self.cells[row][col] == 0 {
                self.cells[row][col] = tile;
                return true;
            }
        }
        false
    }

    /// Number of empty cells.
    pub fn count_empty(&self) -> usize {
        self.cells.iter().flatten().filter(|&&v| v == 0).count()
    }

    /// Highest tile value on the board (0 when empty).
    pub fn highest_tile(&self) -> Tile {
        self.cells.iter().flatten().copied().max().unwrap_or(0)
    }

    /// True if shifting towards `dir` would change the board.
    #[inline]
    pub fn can_move(&self, dir: Move) -> bool { self.shifted(dir).is_some() }

    /// True if no direction changes the board.
    ///
    /// ```
    /// use ai_2048_mc::engine::Board;
    /// // Nothing can slide on an empty board.
    /// assert!(Board::EMPTY.is_game_over());
    /// ```
    pub fn is_game_over(&self) -> bool { !Move::ALL.iter().any(|&dir| self.can_move(dir)) }
}

/// Cell coordinates of one row/column ordered from the push edge outward.
fn line_positions(dir: Move, line: usize) -> [(usize, usize); SIZE] {
    let mut out = [(0, 0); SIZE];
    for (k, pos) in out.iter_mut().enumerate() {
        let far = SIZE - 1 - k;
        *pos = match dir {
            Move::Left => (line, k),
            Move::Right => (line, far),
            Move::Up => (k, line),
            Move::Down => (far, line),
        };
    }
    out
}

fn generate_random_tile<R: Rng + ?Sized>(rng: &mut R) -> Tile { if rng.gen_range(0..10) < 9 { 2 } else { 4 } }

fn format_val(val: Tile) -> String {
    match val {
        0 => String::from("      ."),
        x => format!("{:>7}", x),
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:?}, score: {})", self.cells, self.score)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            let line: Vec<String> = row.iter().map(|&v| format_val(v)).collect();
            writeln!(f, "{}", line.join("|"))?;
        }
        write!(f, "Score: {}", self.score)
    }
}
