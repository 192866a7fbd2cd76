use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::evaluation::EvaluationSummary;

/// Identifier of a job opening that owns a pipeline of rounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobOpeningId(pub String);

/// Identifier of a round template within a job opening.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundTemplateId(pub String);

/// Identifier of a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub String);

macro_rules! id_impls {
    ($($name:ident),*) => {$(
        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    )*};
}

id_impls!(JobOpeningId, RoundTemplateId, CandidateId);

/// Outcome of a candidate within one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    ActionPending,
    Selected,
    Rejected,
    Waitlisted,
}

impl RoundStatus {
    pub const ALL: [RoundStatus; 4] = [
        RoundStatus::ActionPending,
        RoundStatus::Selected,
        RoundStatus::Rejected,
        RoundStatus::Waitlisted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoundStatus::ActionPending => "action_pending",
            RoundStatus::Selected => "selected",
            RoundStatus::Rejected => "rejected",
            RoundStatus::Waitlisted => "waitlisted",
        }
    }
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoundStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        RoundStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| {
                format!("unknown status '{s}' (expected action_pending, selected, rejected or waitlisted)")
            })
    }
}

/// An ordered stage in a job opening's hiring pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundTemplate {
    pub id: RoundTemplateId,
    pub job_opening_id: JobOpeningId,
    pub name: String,
    pub order_index: u32,
    #[serde(default)]
    pub is_mandatory: bool,
    /// Set by the server once the template has been confirmed.
    #[serde(default)]
    pub is_active: bool,
}

/// Candidate identity. Contact attributes beyond these are not tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Per-candidate, per-round status record. Keyed by (candidate, round template).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRoundRecord {
    pub candidate_id: CandidateId,
    pub job_round_template_id: RoundTemplateId,
    pub status: RoundStatus,
    #[serde(default)]
    pub evaluation_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate: Option<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationSummary>,
}

impl CandidateRoundRecord {
    pub fn new(
        candidate_id: CandidateId,
        job_round_template_id: RoundTemplateId,
        status: RoundStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            candidate_id,
            job_round_template_id,
            status,
            evaluation_completed: false,
            created_at: now,
            updated_at: now,
            candidate: None,
            evaluation: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.candidate
            .as_ref()
            .and_then(|c| c.name.as_deref())
            .unwrap_or(self.candidate_id.as_str())
    }
}

/// A candidate paired with a status: the unit of every batch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateStatus {
    pub candidate_id: CandidateId,
    pub status: RoundStatus,
}

impl CandidateStatus {
    pub fn new(candidate_id: CandidateId, status: RoundStatus) -> Self {
        Self {
            candidate_id,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&RoundStatus::ActionPending).unwrap();
        assert_eq!(json, r#""action_pending""#);
        let parsed: RoundStatus = serde_json::from_str(r#""waitlisted""#).unwrap();
        assert_eq!(parsed, RoundStatus::Waitlisted);
    }

    #[test]
    fn status_parses_from_cli_spelling() {
        assert_eq!("Selected".parse::<RoundStatus>(), Ok(RoundStatus::Selected));
        assert_eq!(
            "action-pending".parse::<RoundStatus>(),
            Ok(RoundStatus::ActionPending)
        );
        assert!("hired".parse::<RoundStatus>().is_err());
    }

    #[test]
    fn record_deserializes_from_listing_row() {
        let json = r#"{
            "candidate_id": "c-1",
            "job_round_template_id": "rt-2",
            "status": "rejected",
            "created_at": "2026-01-05T10:00:00Z",
            "updated_at": "2026-01-06T10:00:00Z",
            "candidate": {"id": "c-1", "name": "Ada"}
        }"#;
        let record: CandidateRoundRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status, RoundStatus::Rejected);
        assert!(!record.evaluation_completed);
        assert_eq!(record.display_name(), "Ada");
        assert!(record.evaluation.is_none());
    }

    #[test]
    fn template_flags_default_to_false() {
        let json = r#"{"id": "rt-1", "job_opening_id": "job-1", "name": "Resume Screening", "order_index": 1}"#;
        let template: RoundTemplate = serde_json::from_str(json).unwrap();
        assert!(!template.is_active);
        assert!(!template.is_mandatory);
        assert_eq!(template.id, RoundTemplateId::from("rt-1"));
    }
}
