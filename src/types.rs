use serde::{Deserialize, Deserializer, Serialize};

/// Tolerance used when deciding whether a piece fits into a bar.
pub const LENGTH_EPSILON: f64 = 1e-9;

/// A `(length, count)` pair describing either stock or orders before expansion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthSpec {
    pub length: f64,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub count: u32,
}

impl LengthSpec {
    pub fn new(length: f64, count: u32) -> Self {
        Self { length, count }
    }
}

impl std::fmt::Display for LengthSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.length, self.count)
    }
}

/// Accepts `3`, `3.0` or `"3"` for a count field.
pub fn deserialize_u32_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(u64),
        Float(f64),
        Text(String),
    }

    let value = match Number::deserialize(deserializer)? {
        Number::Int(n) => n as f64,
        Number::Float(n) => n,
        Number::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("invalid count '{s}'")))?,
    };
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(D::Error::custom(format!(
            "count must be a non-negative integer, got {value}"
        )));
    }
    Ok(value as u32)
}

/// One consumed stock bar and the pieces cut from it.
///
/// `sum(cuts) + kerf * max(0, cuts.len() - 1) + waste == stock_length`
/// holds for every record an engine hands out.
#[derive(Debug, Clone, PartialEq)]
pub struct BarUsage {
    pub stock_length: f64,
    pub cuts: Vec<f64>,
    pub waste: f64,
}

impl BarUsage {
    /// Opens a fresh bar holding a single piece. The first cut costs no kerf.
    pub fn open(stock_length: f64, item: f64) -> Self {
        Self {
            stock_length,
            cuts: vec![item],
            waste: (stock_length - item).max(0.0),
        }
    }

    /// Length consumed by adding `item` to this bar.
    pub fn required(&self, item: f64, kerf: f64) -> f64 {
        if self.cuts.is_empty() {
            item
        } else {
            item + kerf
        }
    }

    /// Leftover after placing `item`, or `None` when it does not fit.
    pub fn room_after(&self, item: f64, kerf: f64) -> Option<f64> {
        let required = self.required(item, kerf);
        if required <= self.waste + LENGTH_EPSILON {
            Some((self.waste - required).max(0.0))
        } else {
            None
        }
    }

    /// Appends `item` and returns the waste before the placement so the
    /// caller can undo it with [`BarUsage::undo_place`].
    pub fn place(&mut self, item: f64, kerf: f64) -> f64 {
        let previous = self.waste;
        self.waste = (self.waste - self.required(item, kerf)).max(0.0);
        self.cuts.push(item);
        previous
    }

    pub fn undo_place(&mut self, previous_waste: f64) {
        self.cuts.pop();
        self.waste = previous_waste;
    }

    pub fn cut_total(&self) -> f64 {
        self.cuts.iter().sum()
    }

    pub fn kerf_loss(&self, kerf: f64) -> f64 {
        self.cuts.len().saturating_sub(1) as f64 * kerf
    }

    pub fn utilization(&self) -> f64 {
        if self.stock_length <= 0.0 {
            return 0.0;
        }
        (self.stock_length - self.waste) / self.stock_length
    }
}

/// A set of consumed bars produced by one of the engines.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Solution {
    pub bars: Vec<BarUsage>,
}

impl Solution {
    pub fn new(bars: Vec<BarUsage>) -> Self {
        Self { bars }
    }

    pub fn stocks_used(&self) -> usize {
        self.bars.len()
    }

    pub fn total_waste(&self) -> f64 {
        self.bars.iter().map(|b| b.waste).sum()
    }

    /// Lexicographic preference: fewer bars, then less waste.
    pub fn is_better_than(&self, other: &Solution) -> bool {
        match self.stocks_used().cmp(&other.stocks_used()) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => self.total_waste() < other.total_waste() - LENGTH_EPSILON,
        }
    }
}

/// A group of bars sharing the same stock length and cut multiset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CuttingPlan {
    pub stock_length: f64,
    /// Distinct cut lengths, longest first.
    pub cut_lengths: Vec<f64>,
    /// Occurrences of each entry of `cut_lengths` within one bar.
    pub cut_counts: Vec<u32>,
    pub count: u32,
    pub total_waste: f64,
    pub avg_waste: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutSummary {
    pub total_stock_used: usize,
    pub total_cut_loss: f64,
    pub total_waste: f64,
    pub is_order_fulfilled: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutResult {
    pub plans: Vec<CuttingPlan>,
    pub summary: CutSummary,
}

impl CutResult {
    /// The all-zero result reported for empty input or insufficient supply.
    pub fn unfulfilled() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_cut_costs_no_kerf() {
        let mut bar = BarUsage::open(100.0, 60.0);
        assert_eq!(bar.waste, 40.0);
        assert_eq!(bar.room_after(38.0, 2.0), Some(0.0));
        assert_eq!(bar.room_after(39.0, 2.0), None);

        bar.place(30.0, 2.0);
        assert_eq!(bar.cuts, vec![60.0, 30.0]);
        assert_eq!(bar.waste, 8.0);
        assert_eq!(bar.kerf_loss(2.0), 2.0);
    }

    #[test]
    fn test_undo_restores_bar() {
        let mut bar = BarUsage::open(100.0, 50.0);
        let before = bar.clone();
        let previous = bar.place(20.0, 3.0);
        assert_eq!(bar.waste, 27.0);
        bar.undo_place(previous);
        assert_eq!(bar, before);
    }

    #[test]
    fn test_lexicographic_preference() {
        let two_bars = Solution::new(vec![
            BarUsage::open(100.0, 90.0),
            BarUsage::open(100.0, 90.0),
        ]);
        let one_bar_more_waste = Solution::new(vec![BarUsage::open(200.0, 10.0)]);
        assert!(one_bar_more_waste.is_better_than(&two_bars));
        assert!(!two_bars.is_better_than(&one_bar_more_waste));

        let tighter = Solution::new(vec![
            BarUsage::open(100.0, 95.0),
            BarUsage::open(100.0, 90.0),
        ]);
        assert!(tighter.is_better_than(&two_bars));
        assert!(!two_bars.is_better_than(&two_bars.clone()));
    }

    #[test]
    fn test_count_accepts_float_and_text() {
        let spec: LengthSpec = serde_json::from_str(r#"{"length": 120.5, "count": 3.0}"#).unwrap();
        assert_eq!(spec, LengthSpec::new(120.5, 3));
        let spec: LengthSpec = serde_json::from_str(r#"{"length": 10, "count": "4"}"#).unwrap();
        assert_eq!(spec.count, 4);
        assert!(serde_json::from_str::<LengthSpec>(r#"{"length": 10, "count": 1.5}"#).is_err());
        assert!(serde_json::from_str::<LengthSpec>(r#"{"length": 10, "count": -1}"#).is_err());
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let json = serde_json::to_value(CutResult::unfulfilled()).unwrap();
        assert_eq!(json["summary"]["isOrderFulfilled"], false);
        assert_eq!(json["summary"]["totalStockUsed"], 0);
        assert!(json["plans"].as_array().unwrap().is_empty());
    }
}
