use serde::{Deserialize, Serialize};

/// Severity sum above which a downgrade-based presence is declared.
pub const DOWNGRADE_THRESHOLD: f64 = 0.04;

/// Definition of "the disease was present" for a selection of samples.
///
/// Both definitions have downstream consumers, so they are kept as separate modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum PresenceRule {
    /// At least one sample has a positive indicator.
    #[default]
    Count,
    /// The summed severity exceeds `threshold`.
    SeverityThreshold { threshold: f64 },
}

impl PresenceRule {
    /// Severity rule at the standard downgrade threshold.
    pub fn downgrade() -> Self {
        PresenceRule::SeverityThreshold { threshold: DOWNGRADE_THRESHOLD }
    }
}

/// One observation as the lag joiner sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Sample {
    pub positive: bool,
    pub severity: Option<f64>,
}

/// Summary statistics over one selection of samples.
///
/// Over an empty selection `percnt_true` and `median_severity` are `NaN`
/// until [`SelectionStats::fill_undefined`] runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionStats {
    pub rows: usize,
    pub present: bool,
    pub percnt_true: f64,
    pub sum_severity: f64,
    pub median_severity: f64,
}

impl SelectionStats {
    pub(crate) fn from_samples<'a>(samples: impl IntoIterator<Item = &'a Sample>, rule: PresenceRule) -> Self {
        let mut rows = 0usize;
        let mut positives = 0usize;
        let mut severities = Vec::new();
        for sample in samples {
            rows += 1;
            positives += usize::from(sample.positive);
            severities.extend(sample.severity.filter(|s| !s.is_nan()));
        }

        let sum_severity = severities.iter().sum::<f64>();
        let present = match rule {
            PresenceRule::Count => positives > 0,
            PresenceRule::SeverityThreshold { threshold } => sum_severity > threshold,
        };

        Self {
            rows,
            present,
            percnt_true: if rows == 0 { f64::NAN } else { positives as f64 / rows as f64 },
            sum_severity,
            median_severity: median(&mut severities),
        }
    }

    #[inline] pub fn is_empty(&self) -> bool { self.rows == 0 }

    /// Replace undefined ratios with 0, and undefined medians too when `fill_median` is set.
    pub fn fill_undefined(&mut self, fill_median: bool) {
        if self.percnt_true.is_nan() { self.percnt_true = 0.0 }
        if fill_median && self.median_severity.is_nan() { self.median_severity = 0.0 }
    }
}

/// Median of the values (reorders them); `NaN` when empty.
fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() { return f64::NAN }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 { (values[mid - 1] + values[mid]) / 2.0 } else { values[mid] }
}
