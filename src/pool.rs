use crate::error::{CutError, Result};
use crate::types::LengthSpec;

/// Zips parallel length/count arrays into specs.
pub fn zip_specs(lengths: &[f64], counts: &[u32], what: &str) -> Result<Vec<LengthSpec>> {
    if lengths.len() != counts.len() {
        return Err(CutError::InvalidInput(format!(
            "{what}: {} lengths but {} counts",
            lengths.len(),
            counts.len()
        )));
    }
    Ok(lengths
        .iter()
        .zip(counts)
        .map(|(&length, &count)| LengthSpec::new(length, count))
        .collect())
}

/// Flattens specs into one entry per unit, sorted longest first.
pub fn expand(specs: &[LengthSpec]) -> Result<Vec<f64>> {
    let mut pool = Vec::new();
    for spec in specs {
        if !spec.length.is_finite() || spec.length < 0.0 {
            return Err(CutError::InvalidInput(format!(
                "length must be a non-negative number, got {spec}"
            )));
        }
        pool.extend(std::iter::repeat_n(spec.length, spec.count as usize));
    }
    sort_descending(&mut pool);
    Ok(pool)
}

pub fn sort_descending(lengths: &mut [f64]) {
    lengths.sort_by(|a, b| b.total_cmp(a));
}

/// Distinct stock lengths with the number of units not yet consumed.
///
/// Used by the exact search, which takes and returns units as it branches.
#[derive(Debug, Clone)]
pub struct StockInventory {
    /// `(length, available)`, longest first.
    slots: Vec<(f64, usize)>,
}

impl StockInventory {
    /// Builds the inventory from an expanded pool.
    pub fn from_pool(pool: &[f64]) -> Self {
        let mut sorted = pool.to_vec();
        sort_descending(&mut sorted);
        let mut slots: Vec<(f64, usize)> = Vec::new();
        for length in sorted {
            match slots.last_mut() {
                Some((last, available)) if *last == length => *available += 1,
                _ => slots.push((length, 1)),
            }
        }
        Self { slots }
    }

    /// Number of distinct stock lengths.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn length(&self, slot: usize) -> f64 {
        self.slots[slot].0
    }

    pub fn available(&self, slot: usize) -> usize {
        self.slots[slot].1
    }

    pub fn take(&mut self, slot: usize) {
        debug_assert!(self.slots[slot].1 > 0, "took from an empty stock slot");
        self.slots[slot].1 -= 1;
    }

    pub fn put_back(&mut self, slot: usize) {
        self.slots[slot].1 += 1;
    }

    /// Longest length that still has a unit available.
    pub fn longest_available(&self) -> Option<f64> {
        self.slots
            .iter()
            .find(|(_, available)| *available > 0)
            .map(|(length, _)| *length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_sorts_descending() {
        let specs = zip_specs(&[40.0, 100.0, 60.0], &[2, 1, 0], "orders").unwrap();
        assert_eq!(expand(&specs).unwrap(), vec![100.0, 40.0, 40.0]);
    }

    #[test]
    fn test_mismatched_arrays() {
        let err = zip_specs(&[1.0, 2.0], &[1], "stock").unwrap_err();
        assert!(matches!(err, CutError::InvalidInput(_)));
    }

    #[test]
    fn test_rejects_negative_and_nan() {
        assert!(expand(&[LengthSpec::new(-1.0, 1)]).is_err());
        assert!(expand(&[LengthSpec::new(f64::NAN, 1)]).is_err());
        assert!(expand(&[LengthSpec::new(0.0, 2)]).is_ok());
    }

    #[test]
    fn test_inventory_take_and_put_back() {
        let mut inventory = StockInventory::from_pool(&[60.0, 100.0, 100.0]);
        assert_eq!(inventory.slot_count(), 2);
        assert_eq!(inventory.length(0), 100.0);
        assert_eq!(inventory.available(0), 2);

        inventory.take(0);
        inventory.take(0);
        assert_eq!(inventory.longest_available(), Some(60.0));
        inventory.take(1);
        assert_eq!(inventory.longest_available(), None);
        inventory.put_back(0);
        assert_eq!(inventory.longest_available(), Some(100.0));
    }
}
