pub mod config;
pub mod error;
pub mod events;
pub mod exact;
pub mod heuristic;
pub mod plan;
pub mod pool;
pub mod render;
pub mod solver;
pub mod types;
pub mod verify;

pub use config::SearchConfig;
pub use error::{CutError, Result};
pub use solver::{Mode, Solver};
pub use types::{CutResult, CutSummary, CuttingPlan, LengthSpec};

/// Solves with the branch-and-bound engine under `config`'s budgets.
///
/// Like [`solve_heuristic`], this always returns a [`CutResult`];
/// `summary.is_order_fulfilled` is the only failure signal.
pub fn solve_exact(
    stock_lengths: &[f64],
    stock_counts: &[u32],
    order_lengths: &[f64],
    order_counts: &[u32],
    cut_width: f64,
    config: SearchConfig,
) -> CutResult {
    match Solver::from_arrays(stock_lengths, stock_counts, order_lengths, order_counts, cut_width) {
        Ok(solver) => solver.solve_exact(&config),
        Err(err) => {
            tracing::warn!(%err, "rejected input");
            CutResult::unfulfilled()
        }
    }
}

/// Solves with the best of the heuristic packers.
pub fn solve_heuristic(
    stock_lengths: &[f64],
    stock_counts: &[u32],
    order_lengths: &[f64],
    order_counts: &[u32],
    cut_width: f64,
) -> CutResult {
    match Solver::from_arrays(stock_lengths, stock_counts, order_lengths, order_counts, cut_width) {
        Ok(solver) => solver.solve_heuristic(),
        Err(err) => {
            tracing::warn!(%err, "rejected input");
            CutResult::unfulfilled()
        }
    }
}
