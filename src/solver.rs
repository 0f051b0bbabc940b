use crate::config::SearchConfig;
use crate::error::{CutError, Result};
use crate::events::{EventSink, TracingSink};
use crate::exact::ExactSearch;
use crate::heuristic::HeuristicEngine;
use crate::plan::aggregate;
use crate::pool::{expand, zip_specs};
use crate::types::{CutResult, CutSummary, LengthSpec, Solution};
use crate::verify::{check_invariants, verify};
use serde::{Deserialize, Serialize};

/// Which engine answers a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Branch-and-bound search seeded by first-fit-decreasing.
    #[default]
    Exact,
    /// Best of FFD, BFD and the hybrid local search.
    Heuristic,
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Mode::Exact),
            "heuristic" => Ok(Mode::Heuristic),
            _ => Err(format!(
                "invalid mode '{}', expected: exact or heuristic",
                s
            )),
        }
    }
}

pub struct Solver {
    stock: Vec<LengthSpec>,
    kerf: f64,
    orders: Vec<LengthSpec>,
}

impl Solver {
    pub fn new(stock: Vec<LengthSpec>, kerf: f64, orders: Vec<LengthSpec>) -> Self {
        Self {
            stock,
            kerf,
            orders,
        }
    }

    /// Builds a solver from parallel length/count arrays.
    pub fn from_arrays(
        stock_lengths: &[f64],
        stock_counts: &[u32],
        order_lengths: &[f64],
        order_counts: &[u32],
        cut_width: f64,
    ) -> Result<Self> {
        Ok(Self::new(
            zip_specs(stock_lengths, stock_counts, "stock")?,
            cut_width,
            zip_specs(order_lengths, order_counts, "orders")?,
        ))
    }

    pub fn solve(&self, mode: Mode, config: &SearchConfig) -> CutResult {
        self.solve_with_sink(mode, config, &mut TracingSink)
    }

    pub fn solve_exact(&self, config: &SearchConfig) -> CutResult {
        self.solve(Mode::Exact, config)
    }

    pub fn solve_heuristic(&self) -> CutResult {
        self.solve(Mode::Heuristic, &SearchConfig::default())
    }

    /// Runs one engine end to end. Every failure collapses into
    /// [`CutResult::unfulfilled`].
    pub fn solve_with_sink(
        &self,
        mode: Mode,
        config: &SearchConfig,
        sink: &mut dyn EventSink,
    ) -> CutResult {
        match self.try_solve(mode, config, sink) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(%err, ?mode, "solve failed, reporting unfulfilled result");
                CutResult::unfulfilled()
            }
        }
    }

    fn try_solve(
        &self,
        mode: Mode,
        config: &SearchConfig,
        sink: &mut dyn EventSink,
    ) -> Result<CutResult> {
        if !self.kerf.is_finite() || self.kerf < 0.0 {
            return Err(CutError::InvalidInput(format!(
                "cut width must be a non-negative number, got {}",
                self.kerf
            )));
        }

        let stock_pool = expand(&self.stock)?;
        let order_pool = expand(&self.orders)?;
        if stock_pool.is_empty() || order_pool.is_empty() {
            tracing::debug!(
                stock = stock_pool.len(),
                orders = order_pool.len(),
                "empty pool, nothing to solve"
            );
            return Ok(CutResult::unfulfilled());
        }

        let solution = match mode {
            Mode::Exact => {
                ExactSearch::new(&stock_pool, &order_pool, self.kerf, *config, sink).solve()?
            }
            Mode::Heuristic => HeuristicEngine::new(&stock_pool, &order_pool, self.kerf).solve(sink)?,
        };

        Ok(build_result(&solution, self.kerf, &order_pool))
    }
}

/// Verifies a final solution and folds it into the reported plans.
pub fn build_result(solution: &Solution, kerf: f64, order_pool: &[f64]) -> CutResult {
    let verification = verify(solution, kerf, order_pool);
    let mut fulfilled = verification.is_valid;
    if let Err(err) = check_invariants(solution, kerf) {
        tracing::error!(%err, "solution failed verification");
        fulfilled = false;
    }
    if !verification.is_valid {
        tracing::error!(
            difference = verification.difference,
            covered = verification.total_order_length,
            "solution does not balance"
        );
    }

    CutResult {
        plans: aggregate(solution),
        summary: CutSummary {
            total_stock_used: solution.stocks_used(),
            total_cut_loss: verification.total_cut_loss,
            total_waste: solution.total_waste(),
            is_order_fulfilled: fulfilled,
        },
    }
}
