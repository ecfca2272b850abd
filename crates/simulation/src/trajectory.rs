//! Recorded compartment counts over time.

use epinet_types::Compartment;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Compartment counts sampled along a run.
///
/// `counts[c][i]` is the number of nodes in `c` at `times[i]`. Every
/// series has the same length as `times`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub times: Vec<f64>,
    pub counts: IndexMap<Compartment, Vec<usize>>,
}

impl Trajectory {
    /// Empty trajectory with one series per compartment.
    pub fn new<'a>(compartments: impl IntoIterator<Item = &'a Compartment>) -> Self {
        Self {
            times: Vec::new(),
            counts: compartments
                .into_iter()
                .map(|c| (c.clone(), Vec::new()))
                .collect(),
        }
    }

    /// Append a sample.
    ///
    /// Compartments missing from `counts` are recorded as zero.
    pub(crate) fn push(&mut self, time: f64, counts: &IndexMap<Compartment, usize>) {
        self.times.push(time);
        for (compartment, series) in &mut self.counts {
            series.push(counts.get(compartment).copied().unwrap_or(0));
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// The count series of one compartment.
    pub fn series(&self, compartment: &str) -> Option<&[usize]> {
        self.counts.get(compartment).map(Vec::as_slice)
    }

    /// The last sample of each compartment.
    pub fn last(&self) -> Option<IndexMap<Compartment, usize>> {
        let index = self.len().checked_sub(1)?;
        Some(
            self.counts
                .iter()
                .map(|(c, series)| (c.clone(), series[index]))
                .collect(),
        )
    }
}
