use crate::error::{CutError, Result};
use crate::types::Solution;

/// Tolerance on the aggregate mass balance and covered order length.
pub const BALANCE_TOLERANCE: f64 = 0.001;

/// Tolerance on each bar's own mass balance.
pub const BAR_TOLERANCE: f64 = 1e-6;

/// Totals recomputed from a solution's cut lists alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verification {
    pub total_order_length: f64,
    pub total_cut_loss: f64,
    pub total_stock_length: f64,
    pub total_waste: f64,
    pub calculated_total: f64,
    pub difference: f64,
    pub is_valid: bool,
}

/// Checks `order + kerf loss + waste == stock` over the whole solution and
/// that the covered length matches the expanded orders.
pub fn verify(solution: &Solution, kerf: f64, order_pool: &[f64]) -> Verification {
    let bars = &solution.bars;
    let total_order_length: f64 = bars.iter().map(|b| b.cut_total()).sum();
    let total_cut_loss: f64 = bars.iter().map(|b| b.kerf_loss(kerf)).sum();
    let total_stock_length: f64 = bars.iter().map(|b| b.stock_length).sum();
    let total_waste = solution.total_waste();

    let calculated_total = total_order_length + total_cut_loss + total_waste;
    let difference = total_stock_length - calculated_total;
    let expected_order_length: f64 = order_pool.iter().sum();

    let is_valid = difference.abs() < BALANCE_TOLERANCE
        && (total_order_length - expected_order_length).abs() < BALANCE_TOLERANCE;

    Verification {
        total_order_length,
        total_cut_loss,
        total_stock_length,
        total_waste,
        calculated_total,
        difference,
        is_valid,
    }
}

/// Per-bar invariants: non-negative waste and exact mass balance.
pub fn check_invariants(solution: &Solution, kerf: f64) -> Result<()> {
    for (idx, bar) in solution.bars.iter().enumerate() {
        if bar.waste < 0.0 {
            return Err(CutError::InvariantViolation(format!(
                "bar {idx} ({}) has negative waste {}",
                bar.stock_length, bar.waste
            )));
        }
        let balance = bar.cut_total() + bar.kerf_loss(kerf) + bar.waste;
        if (balance - bar.stock_length).abs() > BAR_TOLERANCE {
            return Err(CutError::InvariantViolation(format!(
                "bar {idx}: cuts {:?} + kerf + waste {} = {balance}, stock is {}",
                bar.cuts, bar.waste, bar.stock_length
            )));
        }
    }
    Ok(())
}
