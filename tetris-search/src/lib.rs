//! The AI search tree: an arena-indexed `SearchNode` forest, per-node child
//! enumeration (`offspring`), and the iterative-deepening, bounded-width
//! `NodeCalculator` that drives it across a worker pool.

mod calculator;
mod node;
mod offspring;

pub use calculator::{CalculatorError, NodeCalculator, Status};
pub use node::{Arena, NodeId, SearchNode};
pub use offspring::{generate, Candidate};
