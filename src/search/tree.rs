use rand::Rng;

use crate::engine::{Board, Move};

/// One node of a depth-bounded, single-sample decision tree.
///
/// Each present child is the board after one legal move followed by one
/// sampled random tile. A missing child means the move was a no-op (or the
/// node is a leaf).
#[derive(Debug)]
pub struct SearchNode {
    board: Board,
    children: [Option<Box<SearchNode>>; 4],
    best_score: u64,
    best_move: Option<Move>,
}

impl SearchNode {
    /// A node with no children.
    pub fn leaf(board: Board) -> Self {
        SearchNode { board, children: [None, None, None, None], best_score: board.score(), best_move: None }
    }

    /// Grow a tree of height `depth` below `board`, sampling one random
    /// tile per branch from `rng`.
    ///
    /// ```
    /// use ai_2048_mc::engine::{Board, Move};
    /// use ai_2048_mc::search::SearchNode;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(5);
    /// let board = Board::from_sparse(&[(0, 0, 2), (0, 1, 2)], 0);
    /// let mut root = SearchNode::build(board, 1, &mut rng);
    /// root.score();
    /// assert_eq!(root.best_move(), Some(Move::Left));
    /// ```
    pub fn build<R: Rng + ?Sized>(board: Board, depth: u32, rng: &mut R) -> Self {
        let mut node = SearchNode::leaf(board);
        if depth == 0 {
            return node;
        }
        for dir in Move::ALL {
            let Some(mut next) = board.shifted(dir) else { continue };
            let child = if next.place_random(rng) {
                SearchNode::build(next, depth - 1, rng)
            } else {
                SearchNode::leaf(next)
            };
            node.children[dir.index()] = Some(Box::new(child));
        }
        node
    }

    /// Post-order scoring pass; returns the root's best score.
    ///
    /// Leaves take their board's score. Inner nodes take the maximum over
    /// present children; on equal scores the earlier direction in
    /// [`Move::ALL`] wins.
    pub fn score(&mut self) -> u64 {
        let mut best: Option<(u64, Move)> = None;
        for dir in Move::ALL {
            if let Some(child) = self.children[dir.index()].as_deref_mut() {
                let s = child.score();
                if best.map_or(true, |(top, _)| s > top) {
                    best = Some((s, dir));
                }
            }
        }
        match best {
            Some((s, dir)) => {
                self.best_score = s;
                self.best_move = Some(dir);
            }
            None => {
                self.best_score = self.board.score();
                self.best_move = None;
            }
        }
        self.best_score
    }

    #[inline]
    pub fn board(&self) -> &Board { &self.board }

    /// Valid after [`SearchNode::score`].
    #[inline]
    pub fn best_score(&self) -> u64 { self.best_score }

    /// Valid after [`SearchNode::score`]. `None` means no viable move.
    #[inline]
    pub fn best_move(&self) -> Option<Move> { self.best_move }

    #[inline]
    pub fn child(&self, dir: Move) -> Option<&SearchNode> { self.children[dir.index()].as_deref() }

    #[inline]
    pub fn is_leaf(&self) -> bool { self.children.iter().all(Option::is_none) }

    /// Nodes in this subtree, including `self`.
    pub fn node_count(&self) -> u64 {
        1 + self.children.iter().flatten().map(|c| c.node_count()).sum::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn depth_zero_is_scored_leaf() {
        let mut rng = StdRng::seed_from_u64(1);
        let board = Board::from_sparse(&[(0, 0, 2), (0, 1, 2)], 36);
        let mut root = SearchNode::build(board, 0, &mut rng);
        assert!(root.is_leaf());
        assert_eq!(root.node_count(), 1);
        assert_eq!(root.score(), 36);
        assert_eq!(root.best_move(), None);
    }

    #[test]
    fn illegal_moves_have_no_child() {
        let mut rng = StdRng::seed_from_u64(2);
        // A lone tile in the top-left corner can only go right or down.
        let board = Board::from_sparse(&[(0, 0, 2)], 0);
        let root = SearchNode::build(board, 1, &mut rng);
        assert!(root.child(Move::Left).is_none());
        assert!(root.child(Move::Up).is_none());
        assert!(root.child(Move::Right).is_some());
        assert!(root.child(Move::Down).is_some());
        assert_eq!(root.node_count(), 3);
    }

    #[test]
    fn blocked_board_has_no_move() {
        let mut rng = StdRng::seed_from_u64(3);
        let stuck = Board::from_cells([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]], 10);
        let mut root = SearchNode::build(stuck, 4, &mut rng);
        assert!(root.is_leaf());
        assert_eq!(root.score(), 10);
        assert_eq!(root.best_move(), None);
    }

    #[test]
    fn picks_merging_branch() {
        let mut rng = StdRng::seed_from_u64(4);
        // Only horizontal moves merge the pair; Left is scanned before Right.
        let board = Board::from_sparse(&[(3, 0, 8), (3, 1, 8)], 0);
        let mut root = SearchNode::build(board, 1, &mut rng);
        assert_eq!(root.score(), 16);
        assert_eq!(root.best_move(), Some(Move::Left));
        assert_eq!(root.child(Move::Right).map(|c| c.best_score()), Some(16));
    }

    #[test]
    fn zero_score_children_still_choose_first_legal() {
        let mut rng = StdRng::seed_from_u64(5);
        let board = Board::from_sparse(&[(0, 0, 2)], 0);
        let mut root = SearchNode::build(board, 1, &mut rng);
        assert_eq!(root.score(), 0);
        assert_eq!(root.best_move(), Some(Move::Right));
    }

    #[test]
    fn merge_frees_cell_for_sampled_tile() {
        let mut rng = StdRng::seed_from_u64(6);
        // Only vertical moves merge (the 2s in the left column), freeing one
        // cell that the sampled tile fills again.
        let board = Board::from_cells([[2, 4, 8, 16], [2, 8, 16, 32], [4, 16, 32, 64], [8, 32, 64, 128]], 0);
        let root = SearchNode::build(board, 3, &mut rng);
        assert!(root.child(Move::Left).is_none());
        assert!(root.child(Move::Right).is_none());
        let up = root.child(Move::Up).expect("up merges the 2s");
        assert_eq!(up.board().count_empty(), 0);
        assert_eq!(up.board().score(), 4);
    }

    #[test]
    fn node_count_bounded_by_branching() {
        let mut rng = StdRng::seed_from_u64(7);
        let board = Board::from_sparse(&[(1, 1, 2), (2, 2, 4)], 0);
        let depth = 4;
        let root = SearchNode::build(board, depth, &mut rng);
        let bound: u64 = (0..=depth).map(|d| 4u64.pow(d)).sum();
        assert!(root.node_count() <= bound);
        assert!(root.node_count() > 1);
    }
}
