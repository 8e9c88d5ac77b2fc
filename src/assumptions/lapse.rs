//! Select-and-ultimate lapse (surrender) tables

use serde::{Deserialize, Serialize};

/// Annual lapse rates by policy duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapseTable {
    /// Rates for durations 0, 1, 2, ... (completed policy years)
    select: Vec<f64>,

    /// Rate once the select period has run off
    ultimate: f64,
}

impl LapseTable {
    pub fn new(select: Vec<f64>, ultimate: f64) -> Self {
        Self { select, ultimate }
    }

    /// Same rate at every duration
    pub fn flat(rate: f64) -> Self {
        Self::new(Vec::new(), rate)
    }

    /// Annual lapse rate at a duration
    pub fn rate(&self, duration: u32) -> f64 {
        self.select
            .get(duration as usize)
            .copied()
            .unwrap_or(self.ultimate)
    }

    /// Length of the select period in years
    pub fn select_period(&self) -> u32 {
        self.select.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_then_ultimate() {
        let table = LapseTable::new(vec![0.10, 0.08, 0.06], 0.04);

        assert_eq!(table.select_period(), 3);
        assert_eq!(table.rate(0), 0.10);
        assert_eq!(table.rate(2), 0.06);
        assert_eq!(table.rate(3), 0.04);
        assert_eq!(table.rate(50), 0.04);
    }

    #[test]
    fn test_flat() {
        let table = LapseTable::flat(0.05);
        assert_eq!(table.rate(0), 0.05);
        assert_eq!(table.rate(30), 0.05);
    }
}
