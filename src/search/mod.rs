//! Monte-Carlo move selection for 2048.
//!
//! - [`SearchNode`]: a depth-bounded tree that samples one random tile per
//!   branch and keeps the best reachable merge score.
//! - [`Selector`]: runs many such trees across a fixed set of worker threads
//!   and returns the direction that won the most trials.
//!
//! The search is not expectimax: spawn positions are sampled, not
//! enumerated, so the result is a statistically favoured move.
//!
//! Quick start
//! ```
//! use ai_2048_mc::engine::{Board, Move};
//! use ai_2048_mc::search::{SearchConfig, Selector};
//!
//! let board = Board::from_sparse(&[(0, 0, 4), (0, 1, 4)], 0);
//! let cfg = SearchConfig { depth: 2, samples: 64, workers: 2 };
//! let mut selector = Selector::with_seed(cfg, 42).unwrap();
//! let decision = selector.decide(&board);
//! assert!(decision.best.is_some());
//! assert!(decision.trials >= 64);
//! ```

use crate::engine::{Board, Move};

mod selector;
mod tree;

pub use selector::Selector;
pub use tree::SearchNode;

/// The three knobs of a search.
///
/// - `depth`: tree height per trial.
/// - `samples`: requested number of trials. Rounded up to a multiple of
///   `workers`.
/// - `workers`: number of parallel worker tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    pub depth: u32,
    pub samples: u64,
    pub workers: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self { depth: 6, samples: 2 * workers as u64, workers }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        Ok(())
    }

    /// Trials run by each worker: `ceil(samples / workers)`.
    #[inline]
    pub fn trials_per_worker(&self) -> u64 { self.samples.div_ceil(self.workers.max(1) as u64) }

    /// Trials actually executed, which may exceed `samples`.
    #[inline]
    pub fn total_trials(&self) -> u64 { self.trials_per_worker() * self.workers as u64 }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("worker count must be at least 1")]
    NoWorkers,
    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Outcome of one selection round.
///
/// `votes` is indexed by [`Move::index`]; `best` is `None` when no trial
/// found a legal move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub best: Option<Move>,
    pub votes: [u64; 4],
    pub trials: u64,
}

impl Decision {
    /// Trials that produced a vote.
    #[inline]
    pub fn voted(&self) -> u64 { self.votes.iter().sum() }
}

/// Basic search stats for a single decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub trials: u64,
    pub nodes: u64,
    pub peak_nodes: u64,
}

/// Majority direction; ties go to the earlier direction in [`Move::ALL`].
pub fn tally(votes: &[u64; 4]) -> Option<Move> {
    let mut best = None;
    let mut best_count = 0;
    for dir in Move::ALL {
        let count = votes[dir.index()];
        if count > best_count {
            best_count = count;
            best = Some(dir);
        }
    }
    best
}

/// One-shot helper: build a [`Selector`] for these knobs and pick a move.
///
/// ```
/// use ai_2048_mc::engine::Board;
/// use ai_2048_mc::search::next_move;
/// let stuck = Board::from_cells([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]], 0);
/// assert_eq!(next_move(&stuck, 3, 8, 2).unwrap(), None);
/// ```
pub fn next_move(board: &Board, depth: u32, samples: u64, workers: usize) -> Result<Option<Move>, ConfigError> {
    let mut selector = Selector::new(SearchConfig { depth, samples, workers })?;
    Ok(selector.select(board))
}
