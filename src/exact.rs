use std::collections::HashSet;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::Instant;

use crate::config::SearchConfig;
use crate::error::Result;
use crate::events::{EventSink, PruneCounts, SearchStats, SolveEvent, Termination};
use crate::heuristic::{FitRule, HeuristicEngine, find_bar};
use crate::pool::{StockInventory, sort_descending};
use crate::types::{BarUsage, LENGTH_EPSILON, Solution};

/// Which branch a node tries next: the best-fitting open bar first, then a
/// new bar from each stock slot in turn.
#[derive(Debug, Clone, Copy)]
enum Branch {
    ContinueBar,
    NewBar(usize),
}

/// The change a node applied for the child it is exploring.
#[derive(Debug, Clone, Copy)]
enum Undo {
    Placed { bar: usize, previous_waste: f64 },
    Opened { slot: usize },
}

#[derive(Debug)]
struct Frame {
    depth: usize,
    next: Branch,
    undo: Option<Undo>,
}

impl Frame {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            next: Branch::ContinueBar,
            undo: None,
        }
    }
}

/// Branch-and-bound depth-first search over piece-to-bar assignments.
///
/// One working list of bars is mutated in place. Each frame on the explicit
/// work stack records what its current branch changed and reverts it before
/// trying the next sibling, so the native call stack stays flat however
/// many pieces there are.
pub struct ExactSearch<'a> {
    /// Order pieces, longest first. The pieces still to place at depth `d`
    /// are exactly `orders[d..]`.
    orders: Vec<f64>,
    /// `suffix_sums[d]` is the total length of `orders[d..]`.
    suffix_sums: Vec<f64>,
    stock_pool: Vec<f64>,
    inventory: StockInventory,
    kerf: f64,
    config: SearchConfig,
    bars: Vec<BarUsage>,
    best: Solution,
    visited: HashSet<u64>,
    scratch: Vec<u64>,
    iterations: u64,
    started: Instant,
    stopped: Option<Termination>,
    pruned: PruneCounts,
    sink: &'a mut dyn EventSink,
}

impl<'a> ExactSearch<'a> {
    pub fn new(
        stock_pool: &[f64],
        order_pool: &[f64],
        kerf: f64,
        config: SearchConfig,
        sink: &'a mut dyn EventSink,
    ) -> Self {
        let mut orders = order_pool.to_vec();
        sort_descending(&mut orders);
        let mut suffix_sums = vec![0.0; orders.len() + 1];
        for i in (0..orders.len()).rev() {
            suffix_sums[i] = suffix_sums[i + 1] + orders[i];
        }

        Self {
            orders,
            suffix_sums,
            stock_pool: stock_pool.to_vec(),
            inventory: StockInventory::from_pool(stock_pool),
            kerf,
            config,
            bars: Vec::new(),
            best: Solution::default(),
            visited: HashSet::new(),
            scratch: Vec::new(),
            iterations: 0,
            started: Instant::now(),
            stopped: None,
            pruned: PruneCounts::default(),
            sink,
        }
    }

    /// Seeds with first-fit-decreasing and searches for something better.
    ///
    /// Fails only when the seed cannot place every piece. Running out of
    /// budget returns the best solution found, which is never worse than
    /// the seed.
    pub fn solve(mut self) -> Result<Solution> {
        let seed =
            HeuristicEngine::new(&self.stock_pool, &self.orders, self.kerf).first_fit_decreasing()?;
        self.sink.record(&SolveEvent::SeedFound {
            bars: seed.stocks_used(),
            waste: seed.total_waste(),
        });
        self.best = seed;

        self.started = Instant::now();
        self.search();

        let stats = SearchStats {
            iterations: self.iterations,
            visited_states: self.visited.len(),
            pruned: self.pruned,
            elapsed_ms: self.started.elapsed().as_millis() as u64,
            termination: self.stopped.unwrap_or(Termination::Exhausted),
        };
        self.sink.record(&SolveEvent::SearchFinished(stats));
        Ok(self.best)
    }

    fn search(&mut self) {
        let mut stack: Vec<Frame> = Vec::new();
        if self.enter(0) {
            stack.push(Frame::new(0));
        }

        while let Some(frame) = stack.last_mut() {
            if let Some(undo) = frame.undo.take() {
                self.revert(undo);
            }
            if self.stopped.is_some() {
                stack.pop();
                continue;
            }

            let Some(undo) = self.next_branch(frame) else {
                stack.pop();
                continue;
            };
            frame.undo = Some(undo);
            let child = frame.depth + 1;
            if self.enter(child) {
                stack.push(Frame::new(child));
            }
        }
    }

    /// Arrival at a node: budgets, then the leaf check, then pruning.
    /// Returns whether the node's branches should be explored.
    fn enter(&mut self, depth: usize) -> bool {
        if self.should_terminate() {
            return false;
        }
        if depth == self.orders.len() {
            self.accept();
            return false;
        }
        !self.should_prune(depth)
    }

    /// Applies the frame's next untried branch and returns how to revert it.
    fn next_branch(&mut self, frame: &mut Frame) -> Option<Undo> {
        let item = self.orders[frame.depth];

        if let Branch::ContinueBar = frame.next {
            frame.next = Branch::NewBar(0);
            if let Some(bar) = find_bar(&self.bars, item, self.kerf, FitRule::BestFit) {
                let previous_waste = self.bars[bar].place(item, self.kerf);
                return Some(Undo::Placed {
                    bar,
                    previous_waste,
                });
            }
        }

        while let Branch::NewBar(slot) = frame.next {
            if slot >= self.inventory.slot_count() {
                return None;
            }
            frame.next = Branch::NewBar(slot + 1);
            let length = self.inventory.length(slot);
            if self.inventory.available(slot) == 0 || item > length + LENGTH_EPSILON {
                continue;
            }
            self.inventory.take(slot);
            self.bars.push(BarUsage::open(length, item));
            return Some(Undo::Opened { slot });
        }
        None
    }

    fn revert(&mut self, undo: Undo) {
        match undo {
            Undo::Placed {
                bar,
                previous_waste,
            } => self.bars[bar].undo_place(previous_waste),
            Undo::Opened { slot } => {
                self.bars.pop();
                self.inventory.put_back(slot);
            }
        }
    }

    /// Budget checks. Once tripped, stays tripped for the rest of the unwind.
    fn should_terminate(&mut self) -> bool {
        if self.stopped.is_some() {
            return true;
        }
        if self.started.elapsed() >= self.config.time_limit() {
            self.stopped = Some(Termination::TimeLimit);
            return true;
        }
        self.iterations += 1;
        if self.iterations > self.config.max_iterations {
            self.stopped = Some(Termination::IterationLimit);
            return true;
        }
        false
    }

    fn accept(&mut self) {
        let candidate = Solution::new(self.bars.clone());
        if candidate.is_better_than(&self.best) {
            self.sink.record(&SolveEvent::Improved {
                bars: candidate.stocks_used(),
                waste: candidate.total_waste(),
                iteration: self.iterations,
            });
            self.best = candidate;
        }
    }

    fn should_prune(&mut self, depth: usize) -> bool {
        let key = self.state_key(depth);
        if !self.visited.insert(key) {
            self.pruned.revisits += 1;
            return true;
        }

        let best_count = self.best.stocks_used();
        if self.bars.len() >= best_count {
            self.pruned.dominated += 1;
            return true;
        }

        let bounded = match self.additional_bars_lower_bound(depth) {
            Some(extra) => self.bars.len() + extra >= best_count,
            None => true,
        };
        if bounded {
            self.pruned.bounded += 1;
        }
        bounded
    }

    /// Structural hash of the remaining pieces and the sorted cuts of every
    /// open bar. Remaining pieces are always a suffix of the sorted orders,
    /// so the depth identifies them.
    fn state_key(&mut self, depth: usize) -> u64 {
        let mut hasher = DefaultHasher::new();
        depth.hash(&mut hasher);
        for bar in &self.bars {
            self.scratch.clear();
            self.scratch.extend(bar.cuts.iter().map(|c| c.to_bits()));
            self.scratch.sort_unstable();
            bar.stock_length.to_bits().hash(&mut hasher);
            self.scratch.hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Minimum number of new bars needed for `orders[depth..]`, or `None`
    /// when the remaining stock cannot hold them.
    ///
    /// With `n` pieces left, `j` new bars and open bars already cut, the
    /// pieces consume `S + (n - j) * kerf` against `free + j * L`, giving
    /// `j >= (S + n * kerf - free) / (L + kerf)`.
    fn additional_bars_lower_bound(&self, depth: usize) -> Option<usize> {
        let remaining = (self.orders.len() - depth) as f64;
        let free: f64 = self.bars.iter().map(|b| b.waste).sum();
        let demand = self.suffix_sums[depth] + remaining * self.kerf - free;
        if demand <= LENGTH_EPSILON {
            return Some(0);
        }

        let longest = self.inventory.longest_available()?;
        let capacity = longest + self.kerf;
        if capacity <= 0.0 {
            return None;
        }
        Some(((demand / capacity) - LENGTH_EPSILON).ceil().max(0.0) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CutError;
    use crate::events::{PruneCounts, RecordingSink};

    fn solve(
        stock: &[f64],
        orders: &[f64],
        kerf: f64,
        config: SearchConfig,
    ) -> (Result<Solution>, RecordingSink) {
        let mut sink = RecordingSink::default();
        let result = ExactSearch::new(stock, orders, kerf, config, &mut sink).solve();
        (result, sink)
    }

    fn sorted_cuts(solution: &Solution) -> Vec<f64> {
        let mut all: Vec<f64> = solution.bars.iter().flat_map(|b| b.cuts.clone()).collect();
        sort_descending(&mut all);
        all
    }

    #[test]
    fn test_single_bar_exact_fit() {
        let (result, _) = solve(&[100.0, 100.0], &[60.0, 40.0], 0.0, SearchConfig::default());
        let solution = result.unwrap();
        assert_eq!(solution.stocks_used(), 1);
        assert_eq!(solution.bars[0].cuts, vec![60.0, 40.0]);
        assert_eq!(solution.bars[0].waste, 0.0);
    }

    #[test]
    fn test_beats_first_fit_seed() {
        // FFD needs 3 bars; {5,3,2} + {4,3,3} fills two exactly.
        let orders = [5.0, 4.0, 3.0, 3.0, 3.0, 2.0];
        let (result, sink) = solve(&[10.0; 4], &orders, 0.0, SearchConfig::default());
        let solution = result.unwrap();
        assert_eq!(solution.stocks_used(), 2);
        assert_eq!(solution.total_waste(), 0.0);
        assert_eq!(sorted_cuts(&solution), vec![5.0, 4.0, 3.0, 3.0, 3.0, 2.0]);

        assert_eq!(sink.events[0], SolveEvent::SeedFound { bars: 3, waste: 10.0 });
        assert!(
            sink.events
                .iter()
                .any(|e| matches!(e, SolveEvent::Improved { bars: 2, .. }))
        );
        assert_eq!(
            sink.search_stats().map(|s| s.termination),
            Some(Termination::Exhausted)
        );
    }

    #[test]
    fn test_iteration_budget_keeps_seed() {
        let orders = [5.0, 4.0, 3.0, 3.0, 3.0, 2.0];
        let config = SearchConfig::default().with_max_iterations(1);
        let (result, sink) = solve(&[10.0; 4], &orders, 0.0, config);
        let solution = result.unwrap();
        assert_eq!(solution.stocks_used(), 3);

        let stats = sink.search_stats().unwrap();
        assert_eq!(stats.termination, Termination::IterationLimit);
        assert_eq!(stats.iterations, 2);
    }

    #[test]
    fn test_zero_time_budget_still_returns_seed() {
        let orders = [5.0, 4.0, 3.0, 3.0, 3.0, 2.0];
        let config = SearchConfig::default().with_time_limit_ms(0);
        let (result, sink) = solve(&[10.0; 4], &orders, 0.0, config);
        let solution = result.unwrap();
        assert_eq!(solution.stocks_used(), 3);
        assert_eq!(sorted_cuts(&solution).len(), 6);

        let stats = sink.search_stats().unwrap();
        assert_eq!(stats.termination, Termination::TimeLimit);
        assert_eq!(stats.iterations, 0);
        assert_eq!(stats.visited_states, 0);
    }

    #[test]
    fn test_respects_stock_supply() {
        // Only one long bar: the two 70s cannot both use it.
        let (result, _) = solve(&[100.0, 70.0, 70.0], &[70.0, 70.0, 25.0], 0.0, SearchConfig::default());
        let solution = result.unwrap();
        let long_bars = solution
            .bars
            .iter()
            .filter(|b| b.stock_length == 100.0)
            .count();
        assert!(long_bars <= 1);
        assert_eq!(sorted_cuts(&solution), vec![70.0, 70.0, 25.0]);
    }

    #[test]
    fn test_supply_insufficient_from_seed() {
        let (result, sink) = solve(&[100.0], &[60.0, 60.0], 0.0, SearchConfig::default());
        assert_eq!(result, Err(CutError::SupplyInsufficient { unplaced: 1 }));
        assert!(sink.events.is_empty());
    }

    #[test]
    fn test_kerf_limits_pieces_per_bar() {
        // 33 + 34 + 34 = 101 > 100, so two pieces per bar.
        let (result, _) = solve(&[100.0; 6], &[33.0; 9], 1.0, SearchConfig::default());
        let solution = result.unwrap();
        assert_eq!(solution.stocks_used(), 5);
        for bar in &solution.bars {
            assert!(bar.cuts.len() <= 2);
        }
    }

    #[test]
    fn test_identical_pieces_revisit_states() {
        // Continuing a bar then opening one reaches the same bars as the
        // reverse order, so equal pieces keep landing on known states.
        let (result, sink) = solve(&[100.0; 6], &[33.0; 9], 1.0, SearchConfig::default());
        assert_eq!(result.unwrap().stocks_used(), 5);

        let stats = sink.search_stats().unwrap();
        assert_eq!(stats.termination, Termination::Exhausted);
        assert!(stats.pruned.revisits > 0);
        assert!(stats.pruned.dominated > 0);
        assert!((stats.visited_states as u64) < stats.iterations);
    }

    #[test]
    fn test_revisited_state_is_pruned() {
        let mut sink = RecordingSink::default();
        let mut search = ExactSearch::new(&[100.0; 3], &[60.0, 30.0, 30.0], 0.0, SearchConfig::default(), &mut sink);
        search.best = Solution::new(vec![BarUsage::open(100.0, 60.0); 3]);
        search.inventory.take(0);
        search.bars.push(BarUsage::open(100.0, 60.0));

        assert!(!search.should_prune(1));
        assert!(search.should_prune(1));
        assert_eq!(
            search.pruned,
            PruneCounts {
                revisits: 1,
                dominated: 0,
                bounded: 0,
            }
        );
    }

    #[test]
    fn test_dominated_state_is_pruned() {
        let mut sink = RecordingSink::default();
        let mut search = ExactSearch::new(&[100.0; 3], &[60.0, 60.0, 30.0], 0.0, SearchConfig::default(), &mut sink);
        search.best = Solution::new(vec![BarUsage::open(100.0, 60.0); 2]);
        for _ in 0..2 {
            search.inventory.take(0);
            search.bars.push(BarUsage::open(100.0, 60.0));
        }

        assert!(search.should_prune(2));
        assert_eq!(search.pruned.dominated, 1);
        assert_eq!(search.pruned.revisits, 0);
        assert_eq!(search.visited.len(), 1);
    }

    #[test]
    fn test_deep_search_runs_on_a_small_stack() {
        // No two pieces share a bar, so the only path is one level per piece.
        let pieces = 6_000;
        let handle = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(move || {
                let (result, sink) = solve(&vec![100.0; pieces], &vec![60.0; pieces], 0.0, SearchConfig::default());
                (result.map(|s| s.stocks_used()), sink.search_stats())
            })
            .unwrap();
        let (bars, stats) = handle.join().unwrap();
        assert_eq!(bars, Ok(pieces));

        let stats = stats.unwrap();
        assert_eq!(stats.termination, Termination::Exhausted);
        assert_eq!(stats.iterations, pieces as u64 + 1);
        assert_eq!(stats.visited_states, pieces);
    }

    #[test]
    fn test_lower_bound_credits_open_bars() {
        let mut sink = RecordingSink::default();
        let mut search = ExactSearch::new(&[100.0; 3], &[60.0, 30.0], 0.0, SearchConfig::default(), &mut sink);
        search.inventory.take(0);
        search.bars.push(BarUsage::open(100.0, 60.0));
        assert_eq!(search.additional_bars_lower_bound(1), Some(0));
        assert_eq!(search.additional_bars_lower_bound(0), Some(1));
    }
}
