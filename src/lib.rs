//! ai-2048-mc: a 2048 engine with a Monte-Carlo voting policy
//!
//! This crate provides:
//! - A `Board` value type with the sliding/merging rules (`shift`) and random
//!   tile spawning (`place_random`)
//! - A sampled search tree (`search::SearchNode`) and a parallel voting
//!   selector (`search::Selector`) that turns many trees into one move
//!
//! Quick start:
//! ```
//! use ai_2048_mc::engine::{Board, Move};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut b = Board::EMPTY;
//! b.place_random(&mut rng);
//! b.place_random(&mut rng);
//! let before = b.score();
//! b.shift(Move::Left);
//! assert!(b.score() >= before);
//! ```
//!
//! Full loop (simplest possible)
//! ```
//! use ai_2048_mc::engine::Board;
//! use ai_2048_mc::search::{SearchConfig, Selector};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // 1) Policy with small knobs to keep doctests fast
//! let cfg = SearchConfig { depth: 3, samples: 8, workers: 2 };
//! let mut policy = Selector::with_seed(cfg, 123).unwrap();
//! let mut rng = StdRng::seed_from_u64(123);
//!
//! // 2) Start board with two random tiles
//! let mut b = Board::EMPTY;
//! b.place_random(&mut rng);
//! b.place_random(&mut rng);
//!
//! // 3) A few turns: pick, move, spawn
//! let mut moves = 0u32;
//! while moves < 4 {
//!     let Some(dir) = policy.select(&b) else { break };
//!     b.shift(dir);
//!     moves += 1;
//!     if !b.place_random(&mut rng) {
//!         break;
//!     }
//! }
//! assert!(moves > 0);
//! ```
//!
pub mod engine;
pub mod search;
