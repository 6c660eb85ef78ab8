use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::{rngs::StdRng, SeedableRng};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::engine::{Board, Move};

use super::{tally, ConfigError, Decision, SearchConfig, SearchNode, SearchStats};

/// Parallel Monte-Carlo voting over single-sample search trees.
///
/// Each decision forks exactly `workers` tasks on a dedicated rayon pool and
/// joins them before tallying. Workers share nothing but the vote counters.
pub struct Selector {
    cfg: SearchConfig,
    pool: ThreadPool,
    seed: Option<u64>,
    rounds: u64,
    stats: SearchStats,
}

impl Selector {
    /// Selector seeded from the wall clock at every decision.
    pub fn new(cfg: SearchConfig) -> Result<Self, ConfigError> { Self::build(cfg, None) }

    /// Selector whose worker seeds derive from `seed`, for reproducible runs.
    pub fn with_seed(cfg: SearchConfig, seed: u64) -> Result<Self, ConfigError> { Self::build(cfg, Some(seed)) }

    fn build(cfg: SearchConfig, seed: Option<u64>) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(cfg.workers)
            .thread_name(|i| format!("mc-worker-{i}"))
            .build()?;
        Ok(Self { cfg, pool, seed, rounds: 0, stats: SearchStats::default() })
    }

    #[inline]
    pub fn config(&self) -> &SearchConfig { &self.cfg }

    /// Majority direction over all trials, or `None` when no trial found a
    /// legal move.
    #[inline]
    pub fn select(&mut self, board: &Board) -> Option<Move> { self.decide(board).best }

    /// Run one fork/join round and return the vote breakdown.
    pub fn decide(&mut self, board: &Board) -> Decision {
        let votes: [AtomicU64; 4] = Default::default();
        let nodes = AtomicU64::new(0);
        let peak = AtomicU64::new(0);
        let trials = self.cfg.trials_per_worker();
        let depth = self.cfg.depth;
        let workers = self.cfg.workers;
        let base = self.round_seed();

        self.pool.scope(|s| {
            for worker in 0..workers {
                let seed = base.wrapping_add(worker as u64);
                let (votes, nodes, peak) = (&votes, &nodes, &peak);
                s.spawn(move |_| {
                    let mut rng = StdRng::seed_from_u64(seed);
                    let done = run_trials(board, depth, trials, &mut rng, votes);
                    log::trace!("worker {worker}: {trials} trials, {} nodes", done.nodes);
                    nodes.fetch_add(done.nodes, Ordering::Relaxed);
                    peak.fetch_max(done.peak_nodes, Ordering::Relaxed);
                });
            }
        });

        let votes = votes.map(AtomicU64::into_inner);
        let decision = Decision { best: tally(&votes), votes, trials: self.cfg.total_trials() };
        self.stats = SearchStats { trials: decision.trials, nodes: nodes.into_inner(), peak_nodes: peak.into_inner() };
        self.rounds += 1;
        log::debug!(
            "votes L/R/U/D = {:?} over {} trials -> {}",
            decision.votes,
            decision.trials,
            decision.best.map_or("no move", Move::name)
        );
        decision
    }

    /// Statistics collected from the last call to [`Selector::decide`] or
    /// [`Selector::select`].
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    /// Base seed for this round; workers add their index.
    fn round_seed(&self) -> u64 {
        match self.seed {
            // Offset by whole rounds so successive decisions never reuse a stream.
            Some(seed) => seed.wrapping_add(self.rounds.wrapping_mul(self.cfg.workers as u64)),
            None => clock_seed(),
        }
    }
}

/// Per-worker totals, folded into the shared stats after the worker ends.
#[derive(Debug, Default, Clone, Copy)]
struct WorkerTally {
    nodes: u64,
    peak_nodes: u64,
}

/// Build, score and drop `trials` trees, voting for each root's best move.
fn run_trials(board: &Board, depth: u32, trials: u64, rng: &mut StdRng, votes: &[AtomicU64; 4]) -> WorkerTally {
    let mut out = WorkerTally::default();
    for _ in 0..trials {
        let mut root = SearchNode::build(*board, depth, rng);
        root.score();
        let n = root.node_count();
        out.nodes += n;
        out.peak_nodes = out.peak_nodes.max(n);
        if let Some(dir) = root.best_move() {
            votes[dir.index()].fetch_add(1, Ordering::Relaxed);
        }
    }
    out
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(depth: u32, samples: u64, workers: usize) -> SearchConfig { SearchConfig { depth, samples, workers } }

    #[test]
    fn stuck_board_reports_no_move() {
        let stuck = Board::from_cells([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]], 0);
        for (samples, workers) in [(1, 1), (7, 3), (64, 4)] {
            let mut sel = Selector::with_seed(cfg(3, samples, workers), 1).unwrap();
            let d = sel.decide(&stuck);
            assert_eq!(d.best, None);
            assert_eq!(d.votes, [0; 4]);
        }
    }

    #[test]
    fn single_legal_direction_wins() {
        // Bottom row is full with no merges and everything else is empty:
        // only Up changes the board.
        let board = Board::from_cells([[0; 4], [0; 4], [0; 4], [2, 4, 8, 16]], 0);
        let mut sel = Selector::with_seed(cfg(1, 200, 4), 9).unwrap();
        let d = sel.decide(&board);
        assert_eq!(d.best, Some(Move::Up));
        assert_eq!(d.votes[Move::Up.index()], 200);
        assert_eq!(d.voted(), 200);
    }

    #[test]
    fn rounds_up_total_trials() {
        let board = Board::from_sparse(&[(0, 0, 2), (2, 3, 2)], 0);
        let mut sel = Selector::with_seed(cfg(2, 10, 4), 3).unwrap();
        let d = sel.decide(&board);
        assert_eq!(d.trials, 12);
        assert_eq!(d.voted(), 12);
        assert_eq!(sel.last_stats().trials, 12);
        assert!(sel.last_stats().nodes >= 12);
    }

    #[test]
    fn zero_samples_is_no_move() {
        let board = Board::from_sparse(&[(0, 0, 2)], 0);
        let mut sel = Selector::with_seed(cfg(2, 0, 2), 3).unwrap();
        assert_eq!(sel.select(&board), None);
    }

    #[test]
    fn seeded_selector_is_reproducible() {
        let board = Board::from_sparse(&[(0, 0, 2), (1, 1, 4), (2, 3, 2), (3, 0, 8)], 12);
        let mut a = Selector::with_seed(cfg(3, 40, 4), 77).unwrap();
        let mut b = Selector::with_seed(cfg(3, 40, 4), 77).unwrap();
        assert_eq!(a.decide(&board), b.decide(&board));
        assert_eq!(a.decide(&board), b.decide(&board));
    }

    #[test]
    fn board_is_not_mutated() {
        let board = Board::from_sparse(&[(0, 0, 2), (0, 1, 2)], 4);
        let copy = board;
        let mut sel = Selector::with_seed(cfg(3, 16, 2), 5).unwrap();
        sel.select(&board);
        assert_eq!(board, copy);
    }

    #[test]
    fn zero_workers_is_config_error() {
        assert!(matches!(Selector::new(cfg(1, 1, 0)), Err(ConfigError::NoWorkers)));
    }
}
