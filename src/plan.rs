use std::collections::HashMap;

use crate::types::{BarUsage, CuttingPlan, Solution};

/// Identity of a cutting pattern: stock length plus `(cut length, count)`
/// pairs sorted by length descending. Lengths are compared bitwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PatternKey {
    stock_length: u64,
    cuts: Vec<(u64, u32)>,
}

/// Distinct cut lengths, longest first, with their counts.
fn group_cuts(bar: &BarUsage) -> (Vec<f64>, Vec<u32>) {
    let mut sorted = bar.cuts.clone();
    sorted.sort_by(|a, b| b.total_cmp(a));

    let mut lengths: Vec<f64> = Vec::new();
    let mut counts: Vec<u32> = Vec::new();
    for cut in sorted {
        match lengths.last() {
            Some(&last) if last == cut => {
                if let Some(count) = counts.last_mut() {
                    *count += 1;
                }
            }
            _ => {
                lengths.push(cut);
                counts.push(1);
            }
        }
    }
    (lengths, counts)
}

/// Groups bars sharing a pattern. Plans come out in order of first occurrence.
pub fn aggregate(solution: &Solution) -> Vec<CuttingPlan> {
    let mut index: HashMap<PatternKey, usize> = HashMap::new();
    let mut plans: Vec<CuttingPlan> = Vec::new();

    for bar in &solution.bars {
        let (cut_lengths, cut_counts) = group_cuts(bar);
        let key = PatternKey {
            stock_length: normalize(bar.stock_length),
            cuts: cut_lengths
                .iter()
                .zip(&cut_counts)
                .map(|(&len, &count)| (normalize(len), count))
                .collect(),
        };

        match index.get(&key) {
            Some(&idx) => {
                let plan = &mut plans[idx];
                plan.count += 1;
                plan.total_waste += bar.waste;
                plan.avg_waste = plan.total_waste / plan.count as f64;
            }
            None => {
                index.insert(key, plans.len());
                plans.push(CuttingPlan {
                    stock_length: bar.stock_length,
                    cut_lengths,
                    cut_counts,
                    count: 1,
                    total_waste: bar.waste,
                    avg_waste: bar.waste,
                });
            }
        }
    }

    plans
}

// -0.0 and 0.0 must land on the same key.
fn normalize(length: f64) -> u64 {
    if length == 0.0 { 0 } else { length.to_bits() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(stock_length: f64, cuts: &[f64], waste: f64) -> BarUsage {
        BarUsage {
            stock_length,
            cuts: cuts.to_vec(),
            waste,
        }
    }

    #[test]
    fn test_groups_by_pattern_regardless_of_cut_order() {
        let solution = Solution::new(vec![
            bar(100.0, &[40.0, 60.0], 0.0),
            bar(100.0, &[30.0, 30.0, 30.0], 10.0),
            bar(100.0, &[60.0, 40.0], 0.0),
            bar(100.0, &[30.0, 30.0, 30.0], 6.0),
        ]);
        let plans = aggregate(&solution);
        assert_eq!(plans.len(), 2);

        assert_eq!(plans[0].cut_lengths, vec![60.0, 40.0]);
        assert_eq!(plans[0].cut_counts, vec![1, 1]);
        assert_eq!(plans[0].count, 2);

        assert_eq!(plans[1].cut_lengths, vec![30.0]);
        assert_eq!(plans[1].cut_counts, vec![3]);
        assert_eq!(plans[1].count, 2);
        assert_eq!(plans[1].total_waste, 16.0);
        assert_eq!(plans[1].avg_waste, 8.0);
    }

    #[test]
    fn test_stock_length_separates_patterns() {
        let solution = Solution::new(vec![
            bar(120.0, &[50.0], 70.0),
            bar(100.0, &[50.0], 50.0),
        ]);
        let plans = aggregate(&solution);
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].stock_length, 120.0);
        assert_eq!(plans[1].stock_length, 100.0);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let solution = Solution::new(vec![
            bar(100.0, &[25.0, 25.0, 50.0], 0.0),
            bar(100.0, &[50.0, 25.0, 25.0], 0.0),
        ]);
        assert_eq!(aggregate(&solution), aggregate(&solution));
        assert!(aggregate(&Solution::default()).is_empty());
    }
}
