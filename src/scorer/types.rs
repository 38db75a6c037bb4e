use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowReport {
    pub input: Vec<bool>,
    pub expected: Vec<bool>,

    // Exact mode: decoded outputs of the single run (None = no result).
    pub observed: Option<Vec<Option<bool>>>,

    // Statistical mode: per-bit fraction of trials that matched.
    pub accuracy: Vec<f64>,

    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    pub passed: bool,
    pub score: f64,
    pub max_score: f64,
    /// Rows actually simulated; rows cut off by fail-fast are absent.
    pub rows: Vec<RowReport>,
}

impl EvaluationReport {
    /// Score as a fraction of the attainable maximum.
    pub fn normalized(&self) -> f64 {
        if self.max_score > 0.0 {
            self.score / self.max_score
        } else {
            0.0
        }
    }
}
