use crate::error::{CutError, Result};
use crate::events::{EventSink, SolveEvent, Strategy};
use crate::pool::sort_descending;
use crate::types::{BarUsage, LENGTH_EPSILON, Solution};

/// Upper bound on full swap passes in the hybrid strategy.
const MAX_SWAP_PASSES: usize = 100;

/// How an item picks among the bars that can hold it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitRule {
    /// First bar in creation order.
    FirstFit,
    /// Bar left with the smallest leftover.
    BestFit,
}

/// Index of the bar that should receive `item` under `rule`, if any fits.
pub fn find_bar(bars: &[BarUsage], item: f64, kerf: f64, rule: FitRule) -> Option<usize> {
    match rule {
        FitRule::FirstFit => bars
            .iter()
            .position(|bar| bar.room_after(item, kerf).is_some()),
        FitRule::BestFit => {
            let mut best: Option<(usize, f64)> = None;
            for (idx, bar) in bars.iter().enumerate() {
                if let Some(room) = bar.room_after(item, kerf)
                    && best.is_none_or(|(_, best_room)| room < best_room)
                {
                    best = Some((idx, room));
                }
            }
            best.map(|(idx, _)| idx)
        }
    }
}

pub struct HeuristicEngine {
    stock: Vec<f64>,
    orders: Vec<f64>,
    kerf: f64,
}

impl HeuristicEngine {
    pub fn new(stock_pool: &[f64], order_pool: &[f64], kerf: f64) -> Self {
        let mut stock = stock_pool.to_vec();
        let mut orders = order_pool.to_vec();
        sort_descending(&mut stock);
        sort_descending(&mut orders);
        Self {
            stock,
            orders,
            kerf,
        }
    }

    /// Runs every strategy and keeps the one with the least total waste.
    /// Ties go to the earlier strategy: hybrid, then FFD, then BFD.
    ///
    /// Bar count is deliberately not consulted here.
    pub fn solve(&self, sink: &mut dyn EventSink) -> Result<Solution> {
        let strategies = [
            Strategy::Hybrid,
            Strategy::FirstFitDecreasing,
            Strategy::BestFitDecreasing,
        ];

        let mut best: Option<(Strategy, Solution)> = None;
        let mut unplaced = 0;
        for strategy in strategies {
            match self.run(strategy) {
                Ok(solution) => {
                    sink.record(&SolveEvent::StrategyEvaluated {
                        strategy,
                        bars: solution.stocks_used(),
                        waste: solution.total_waste(),
                    });
                    let better = best.as_ref().is_none_or(|(_, current)| {
                        solution.total_waste() < current.total_waste() - LENGTH_EPSILON
                    });
                    if better {
                        best = Some((strategy, solution));
                    }
                }
                Err(CutError::SupplyInsufficient { unplaced: n }) => {
                    sink.record(&SolveEvent::StrategyFailed {
                        strategy,
                        unplaced: n,
                    });
                    unplaced = unplaced.max(n);
                }
                Err(err) => return Err(err),
            }
        }

        let (strategy, solution) = best.ok_or(CutError::SupplyInsufficient { unplaced })?;
        sink.record(&SolveEvent::StrategySelected { strategy });
        Ok(solution)
    }

    pub fn run(&self, strategy: Strategy) -> Result<Solution> {
        match strategy {
            Strategy::Hybrid => self.hybrid(),
            Strategy::FirstFitDecreasing => self.first_fit_decreasing(),
            Strategy::BestFitDecreasing => self.best_fit_decreasing(),
        }
    }

    pub fn first_fit_decreasing(&self) -> Result<Solution> {
        self.pack(FitRule::FirstFit)
    }

    pub fn best_fit_decreasing(&self) -> Result<Solution> {
        self.pack(FitRule::BestFit)
    }

    /// BFD, then pairwise swaps, then dissolving low-utilization bars.
    pub fn hybrid(&self) -> Result<Solution> {
        let mut bars = self.best_fit_decreasing()?.bars;
        swap_passes(&mut bars);
        Ok(Solution::new(consolidate(bars, self.kerf)))
    }

    /// Places items longest first. New bars consume the stock pool in
    /// descending order; since both lists are descending, a next stock that
    /// is too short for the current item means nothing left can hold it.
    fn pack(&self, rule: FitRule) -> Result<Solution> {
        let mut next_stock = self.stock.iter().copied();
        let mut bars: Vec<BarUsage> = Vec::new();

        for (placed, &item) in self.orders.iter().enumerate() {
            if let Some(idx) = find_bar(&bars, item, self.kerf, rule) {
                bars[idx].place(item, self.kerf);
                continue;
            }
            match next_stock.next() {
                Some(length) if item <= length + LENGTH_EPSILON => {
                    bars.push(BarUsage::open(length, item));
                }
                _ => {
                    return Err(CutError::SupplyInsufficient {
                        unplaced: self.orders.len() - placed,
                    });
                }
            }
        }

        Ok(Solution::new(bars))
    }
}

/// Exchanges single items between bars while that strictly lowers the
/// pair's combined waste. Returns the number of passes run.
///
/// A swap keeps both cut counts, so each bar's kerf charge is unchanged.
fn swap_passes(bars: &mut [BarUsage]) -> usize {
    for pass in 1..=MAX_SWAP_PASSES {
        let mut swapped = false;
        for i in 0..bars.len() {
            for j in (i + 1)..bars.len() {
                let (head, tail) = bars.split_at_mut(j);
                let (a, b) = (&mut head[i], &mut tail[0]);
                for ci in 0..a.cuts.len() {
                    for cj in 0..b.cuts.len() {
                        let (cut_a, cut_b) = (a.cuts[ci], b.cuts[cj]);
                        let waste_a = a.waste + cut_a - cut_b;
                        let waste_b = b.waste + cut_b - cut_a;
                        let before = a.waste + b.waste;
                        if waste_a >= 0.0
                            && waste_b >= 0.0
                            && waste_a + waste_b < before - LENGTH_EPSILON
                        {
                            a.cuts[ci] = cut_b;
                            b.cuts[cj] = cut_a;
                            a.waste = waste_a;
                            b.waste = waste_b;
                            swapped = true;
                        }
                    }
                }
            }
        }
        if !swapped {
            return pass;
        }
    }
    MAX_SWAP_PASSES
}

/// Walks bars from least to most utilized and dismisses a bar when every one
/// of its items can move, first fit, into a bar already kept. A bar with any
/// item that cannot move is kept as it is.
fn consolidate(mut bars: Vec<BarUsage>, kerf: f64) -> Vec<BarUsage> {
    bars.sort_by(|a, b| a.utilization().total_cmp(&b.utilization()));

    let mut kept: Vec<BarUsage> = Vec::with_capacity(bars.len());
    for bar in bars {
        if bar.cuts.is_empty() {
            continue;
        }
        let mut items = bar.cuts.clone();
        sort_descending(&mut items);

        match plan_relocation(&kept, &items, kerf) {
            Some(targets) => {
                for (&item, idx) in items.iter().zip(targets) {
                    kept[idx].place(item, kerf);
                }
            }
            None => kept.push(bar),
        }
    }
    kept
}

/// First-fit targets for `items` in `kept`, or `None` if any item has no room.
/// Works on a scratch copy of the leftovers so a failed attempt moves nothing.
fn plan_relocation(kept: &[BarUsage], items: &[f64], kerf: f64) -> Option<Vec<usize>> {
    let mut scratch: Vec<BarUsage> = kept.to_vec();
    let mut targets = Vec::with_capacity(items.len());
    for &item in items {
        let idx = find_bar(&scratch, item, kerf, FitRule::FirstFit)?;
        scratch[idx].place(item, kerf);
        targets.push(idx);
    }
    Some(targets)
}
