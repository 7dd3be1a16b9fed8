//! Evaluation scores attached to assistant replies

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Lowest valid score
pub const MIN_SCORE: f64 = 0.0;

/// Highest valid score
pub const MAX_SCORE: f64 = 10.0;

/// Metrics shown first, in this order
pub const STANDARD_METRICS: [&str; 4] = ["accuracy", "relevance", "completeness", "clarity"];

/// Mapping from metric name to a score in `[0, 10]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreSet {
    scores: BTreeMap<String, f64>,
}

impl ScoreSet {
    /// Empty score set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a score, clamped into `[0, 10]`. Non-finite scores are ignored.
    pub fn insert(&mut self, metric: impl Into<String>, score: f64) {
        if score.is_finite() {
            self.scores
                .insert(metric.into(), score.clamp(MIN_SCORE, MAX_SCORE));
        }
    }

    /// Builder form of [`ScoreSet::insert`]
    pub fn with(mut self, metric: impl Into<String>, score: f64) -> Self {
        self.insert(metric, score);
        self
    }

    /// Score for one metric
    pub fn get(&self, metric: &str) -> Option<f64> {
        self.scores.get(metric).copied()
    }

    /// Number of metrics
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether no metric is present
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Scores with the standard metrics first, then the rest by name
    pub fn ordered(&self) -> Vec<(&str, f64)> {
        let mut out: Vec<(&str, f64)> = STANDARD_METRICS
            .iter()
            .filter_map(|m| self.scores.get_key_value(*m))
            .map(|(k, v)| (k.as_str(), *v))
            .collect();
        out.extend(
            self.scores
                .iter()
                .filter(|(k, _)| !STANDARD_METRICS.contains(&k.as_str()))
                .map(|(k, v)| (k.as_str(), *v)),
        );
        out
    }

    /// Read scores from the wire.
    ///
    /// Numeric entries (and numeric strings) are kept; everything else, such
    /// as free-text feedback, is dropped. Scores nested under
    /// `criteria_scores` are lifted to the top level. Returns `None` when no
    /// numeric score remains.
    pub fn from_wire(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let mut set = ScoreSet::new();

        for (metric, raw) in obj {
            if metric == "criteria_scores" {
                if let Some(nested) = raw.as_object() {
                    for (inner, score) in nested {
                        if let Some(score) = numeric(score) {
                            set.insert(inner.clone(), score);
                        }
                    }
                }
                continue;
            }
            if let Some(score) = numeric(raw) {
                set.insert(metric.clone(), score);
            }
        }

        if set.is_empty() {
            None
        } else {
            Some(set)
        }
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Display band for a score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTier {
    /// 8 and above
    Excellent,
    /// 6 up to 8
    Good,
    /// 4 up to 6
    Fair,
    /// Below 4
    Poor,
}

impl ScoreTier {
    /// Band for a score
    pub fn for_score(score: f64) -> Self {
        if score >= 8.0 {
            ScoreTier::Excellent
        } else if score >= 6.0 {
            ScoreTier::Good
        } else if score >= 4.0 {
            ScoreTier::Fair
        } else {
            ScoreTier::Poor
        }
    }
}
