//! Minimum-coverage and maximum-regression checks.

use serde::{Deserialize, Serialize};

use crate::model::{round2, MetricKind, ProjectStats};

/// Configured limits, in percent. `None`, `0` and NaN all disable a check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Thresholds {
    pub min_line_coverage: Option<f64>,
    pub min_method_coverage: Option<f64>,
    pub max_line_coverage_decrease: Option<f64>,
    pub max_method_coverage_decrease: Option<f64>,
}

impl Thresholds {
    /// Overlay the values set in `other` on top of `self`.
    #[must_use]
    pub fn merged_with(self, other: Thresholds) -> Thresholds {
        Thresholds {
            min_line_coverage: other.min_line_coverage.or(self.min_line_coverage),
            min_method_coverage: other.min_method_coverage.or(self.min_method_coverage),
            max_line_coverage_decrease: other
                .max_line_coverage_decrease
                .or(self.max_line_coverage_decrease),
            max_method_coverage_decrease: other
                .max_method_coverage_decrease
                .or(self.max_method_coverage_decrease),
        }
    }

    fn minimum(&self, metric: MetricKind) -> Option<f64> {
        match metric {
            MetricKind::Lines => configured(self.min_line_coverage),
            MetricKind::Methods => configured(self.min_method_coverage),
            MetricKind::Branches => None,
        }
    }

    fn max_decrease(&self, metric: MetricKind) -> Option<f64> {
        match metric {
            MetricKind::Lines => configured(self.max_line_coverage_decrease),
            MetricKind::Methods => configured(self.max_method_coverage_decrease),
            MetricKind::Branches => None,
        }
    }
}

fn configured(limit: Option<f64>) -> Option<f64> {
    limit.filter(|v| *v != 0.0 && !v.is_nan())
}

#[derive(Debug, Clone, Copy)]
enum Check {
    Minimum(MetricKind),
    MaxDecrease(MetricKind),
}

/// Evaluation order of the checks.
const CHECKS: [Check; 4] = [
    Check::Minimum(MetricKind::Lines),
    Check::Minimum(MetricKind::Methods),
    Check::MaxDecrease(MetricKind::Lines),
    Check::MaxDecrease(MetricKind::Methods),
];

fn evaluate(
    check: Check,
    current: &ProjectStats,
    baseline: Option<&ProjectStats>,
    limits: &Thresholds,
) -> Option<String> {
    match check {
        Check::Minimum(metric) => {
            let min = limits.minimum(metric)?;
            let now = current.total.get(metric).percent();
            (now < min).then(|| {
                format!(
                    "{} coverage of {now:.2}% is below the minimum of {min:.2}%",
                    metric.label()
                )
            })
        }
        Check::MaxDecrease(metric) => {
            let max = limits.max_decrease(metric)?;
            let before = baseline?.total.get(metric).percent();
            let now = current.total.get(metric).percent();
            let decrease = round2(before - now);
            (decrease >= max).then(|| {
                format!(
                    "{} coverage decreased by {decrease:.2}% (from {before:.2}% to {now:.2}%), \
                     at or above the maximum allowed decrease of {max:.2}%",
                    metric.label()
                )
            })
        }
    }
}

/// Lazily evaluate the configured checks, yielding one message per
/// violation in order: minimum line, minimum method, then (only with a
/// baseline) line decrease and method decrease.
///
/// A minimum is violated when coverage is strictly below it; a decrease is
/// violated when it is greater than or equal to the allowed maximum.
pub fn check_thresholds<'a>(
    current: &'a ProjectStats,
    baseline: Option<&'a ProjectStats>,
    limits: &'a Thresholds,
) -> impl Iterator<Item = String> + 'a {
    CHECKS
        .into_iter()
        .filter_map(move |check| evaluate(check, current, baseline, limits))
}
