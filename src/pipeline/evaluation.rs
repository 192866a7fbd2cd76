//! Read-only view over candidate evaluation scores, plus the rate-limited loop
//! that requests evaluations from the external evaluation service.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::model::{CandidateId, RoundTemplateId};
use crate::api::{ApiError, RecruitingApi};

/// Display band for a numeric score. Presentation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Weak,
    Fair,
    Good,
    Strong,
}

impl ScoreBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            ScoreBand::Strong
        } else if score >= 60.0 {
            ScoreBand::Good
        } else if score >= 40.0 {
            ScoreBand::Fair
        } else {
            // NaN lands here too.
            ScoreBand::Weak
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreBand::Strong => write!(f, "strong"),
            ScoreBand::Good => write!(f, "good"),
            ScoreBand::Fair => write!(f, "fair"),
            ScoreBand::Weak => write!(f, "weak"),
        }
    }
}

/// Scores attached to a candidate, keyed by round order.
///
/// The overall score is whatever the evaluation service computed. It is never
/// derived locally from the per-round scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    #[serde(default)]
    pub overall_score: Option<f64>,
    #[serde(default)]
    pub round_scores: BTreeMap<u32, f64>,
    #[serde(default)]
    pub recommendation: Option<String>,
}

impl EvaluationSummary {
    pub fn overall(&self) -> Option<f64> {
        self.overall_score
    }

    pub fn overall_band(&self) -> Option<ScoreBand> {
        self.overall_score.map(ScoreBand::from_score)
    }

    pub fn round_score(&self, order_index: u32) -> Option<f64> {
        self.round_scores.get(&order_index).copied()
    }

    pub fn round_band(&self, order_index: u32) -> Option<ScoreBand> {
        self.round_score(order_index).map(ScoreBand::from_score)
    }
}

/// Result of one item in a batch evaluation run.
#[derive(Debug)]
pub struct EvaluationOutcome {
    pub candidate_id: CandidateId,
    pub result: Result<EvaluationSummary, ApiError>,
}

/// Requests evaluations one candidate at a time with a fixed pause between
/// requests, keeping load on the evaluation service flat.
pub struct BatchEvaluator<'a, A> {
    api: &'a A,
    delay: Duration,
}

impl<'a, A: RecruitingApi> BatchEvaluator<'a, A> {
    pub fn new(api: &'a A, delay: Duration) -> Self {
        Self { api, delay }
    }

    /// Evaluate every candidate in order. A failed item is recorded and the
    /// run continues with the next candidate.
    pub async fn evaluate_all(
        &self,
        template_id: &RoundTemplateId,
        candidates: &[CandidateId],
    ) -> Vec<EvaluationOutcome> {
        let mut outcomes = Vec::with_capacity(candidates.len());
        for (i, candidate_id) in candidates.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.delay).await;
            }
            let result = self.api.evaluate_candidate(template_id, candidate_id).await;
            if let Err(err) = &result {
                warn!(%candidate_id, error = %err, "evaluation failed");
            }
            outcomes.push(EvaluationOutcome {
                candidate_id: candidate_id.clone(),
                result,
            });
        }
        let succeeded = outcomes.iter().filter(|o| o.result.is_ok()).count();
        info!(%template_id, total = candidates.len(), succeeded, "batch evaluation finished");
        outcomes
    }
}
