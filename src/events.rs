use std::fmt;

/// Why the exact search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Every branch was explored or pruned.
    Exhausted,
    /// The wall-clock budget ran out.
    TimeLimit,
    /// The node budget ran out.
    IterationLimit,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => write!(f, "exhausted"),
            Self::TimeLimit => write!(f, "time limit"),
            Self::IterationLimit => write!(f, "iteration limit"),
        }
    }
}

/// Heuristic packing strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Hybrid,
    FirstFitDecreasing,
    BestFitDecreasing,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hybrid => write!(f, "hybrid"),
            Self::FirstFitDecreasing => write!(f, "first-fit-decreasing"),
            Self::BestFitDecreasing => write!(f, "best-fit-decreasing"),
        }
    }
}

/// How many nodes each pruning rule cut off.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PruneCounts {
    /// State already expanded via another path.
    pub revisits: u64,
    /// Already as many open bars as the best solution.
    pub dominated: u64,
    /// Lower bound on the remaining bars cannot beat the best solution.
    pub bounded: u64,
}

/// Counters collected over one exact search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchStats {
    pub iterations: u64,
    pub visited_states: usize,
    pub pruned: PruneCounts,
    pub elapsed_ms: u64,
    pub termination: Termination,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolveEvent {
    /// The first-fit-decreasing seed of the exact search.
    SeedFound { bars: usize, waste: f64 },
    /// The exact search replaced its best known solution.
    Improved { bars: usize, waste: f64, iteration: u64 },
    /// The exact search finished.
    SearchFinished(SearchStats),
    /// A heuristic strategy produced a solution.
    StrategyEvaluated { strategy: Strategy, bars: usize, waste: f64 },
    /// A heuristic strategy ran out of stock.
    StrategyFailed { strategy: Strategy, unplaced: usize },
    /// The heuristic engine picked its answer.
    StrategySelected { strategy: Strategy },
}

/// Receives progress from the engines, which never print on their own.
/// The public entry points pass a [`TracingSink`].
pub trait EventSink {
    fn record(&mut self, event: &SolveEvent);
}

impl<F: FnMut(&SolveEvent)> EventSink for F {
    fn record(&mut self, event: &SolveEvent) {
        self(event)
    }
}

/// Forwards every event to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&mut self, event: &SolveEvent) {
        match event {
            SolveEvent::SeedFound { bars, waste } => {
                tracing::debug!(bars, waste, "seed solution");
            }
            SolveEvent::Improved {
                bars,
                waste,
                iteration,
            } => {
                tracing::debug!(bars, waste, iteration, "improved solution");
            }
            SolveEvent::SearchFinished(stats) => {
                tracing::debug!(
                    iterations = stats.iterations,
                    visited_states = stats.visited_states,
                    revisits = stats.pruned.revisits,
                    dominated = stats.pruned.dominated,
                    bounded = stats.pruned.bounded,
                    elapsed_ms = stats.elapsed_ms,
                    termination = %stats.termination,
                    "search finished"
                );
            }
            SolveEvent::StrategyEvaluated {
                strategy,
                bars,
                waste,
            } => {
                tracing::debug!(%strategy, bars, waste, "strategy evaluated");
            }
            SolveEvent::StrategyFailed { strategy, unplaced } => {
                tracing::debug!(%strategy, unplaced, "strategy ran out of stock");
            }
            SolveEvent::StrategySelected { strategy } => {
                tracing::debug!(%strategy, "strategy selected");
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub events: Vec<SolveEvent>,
}

impl EventSink for RecordingSink {
    fn record(&mut self, event: &SolveEvent) {
        self.events.push(event.clone());
    }
}

impl RecordingSink {
    pub fn search_stats(&self) -> Option<SearchStats> {
        self.events.iter().find_map(|e| match e {
            SolveEvent::SearchFinished(stats) => Some(*stats),
            _ => None,
        })
    }
}
