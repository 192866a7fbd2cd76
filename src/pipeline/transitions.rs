use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{info, warn};

use super::model::{CandidateId, CandidateRoundRecord, CandidateStatus, RoundStatus, RoundTemplateId};
use super::pending::{PendingChangeSet, StageOutcome};
use crate::api::{ApiError, FailedCandidate, RecruitingApi, StatusUpdateRequest, StatusUpdateResponse};
use crate::error::PipelineError;

/// Per-item outcome of a batch status commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub template_id: Option<RoundTemplateId>,
    pub submitted: usize,
    pub succeeded: Vec<CandidateId>,
    pub failed: Vec<FailedCandidate>,
}

impl CommitReport {
    fn empty(template_id: &RoundTemplateId) -> Self {
        Self {
            template_id: Some(template_id.clone()),
            ..Self::default()
        }
    }

    /// Attribute a server response to the submitted candidates.
    ///
    /// Failures are taken from `failed_candidates`. Candidates are credited
    /// only when the named failures account for every missing success;
    /// otherwise nothing can be attributed and every submission counts as
    /// failed.
    fn from_response(
        template_id: &RoundTemplateId,
        submitted: &[CandidateStatus],
        response: StatusUpdateResponse,
    ) -> Result<Self, PipelineError> {
        let successful_count = response.successful_count.ok_or_else(|| {
            PipelineError::Transport(ApiError::MalformedResponse(
                "status commit response has no successful_count".into(),
            ))
        })? as usize;

        let mut report = Self {
            template_id: Some(template_id.clone()),
            submitted: submitted.len(),
            ..Self::default()
        };

        if successful_count >= submitted.len() {
            report.succeeded = submitted.iter().map(|c| c.candidate_id.clone()).collect();
            return Ok(report);
        }

        let named: Vec<FailedCandidate> = response.failed_candidates.unwrap_or_default();
        let failed_ids: HashSet<&CandidateId> = named.iter().map(|f| &f.candidate_id).collect();
        let succeeded: Vec<CandidateId> = submitted
            .iter()
            .map(|c| &c.candidate_id)
            .filter(|id| !failed_ids.contains(id))
            .cloned()
            .collect();

        if succeeded.len() != successful_count {
            report.failed = submitted
                .iter()
                .map(|c| {
                    let error = named
                        .iter()
                        .find(|f| f.candidate_id == c.candidate_id)
                        .and_then(|f| f.error.clone())
                        .unwrap_or_else(|| "not confirmed by server".into());
                    FailedCandidate {
                        candidate_id: c.candidate_id.clone(),
                        error: Some(error),
                    }
                })
                .collect();
            return Ok(report);
        }

        report.succeeded = succeeded;
        report.failed = named;
        Ok(report)
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.succeeded.len() == self.submitted
    }

    pub fn failed_count(&self) -> usize {
        self.submitted - self.succeeded.len()
    }
}

/// Stages status edits per round and commits them in batches.
pub struct StatusTransitionManager<A> {
    api: Arc<A>,
    rounds: HashMap<RoundTemplateId, PendingChangeSet>,
}

impl<A: RecruitingApi> StatusTransitionManager<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            rounds: HashMap::new(),
        }
    }

    /// Rebase a round on persisted records. Staged edits are kept.
    pub fn load_baseline(&mut self, template_id: &RoundTemplateId, records: &[CandidateRoundRecord]) {
        self.rounds
            .entry(template_id.clone())
            .or_insert_with(|| PendingChangeSet::new(template_id.clone()))
            .rebase(records);
    }

    /// Merge statuses known to be persisted into a round's baseline. Staged
    /// edits and candidates absent from `statuses` are kept.
    pub fn seed(&mut self, template_id: &RoundTemplateId, statuses: &[CandidateStatus]) {
        self.rounds
            .entry(template_id.clone())
            .or_insert_with(|| PendingChangeSet::new(template_id.clone()))
            .absorb(statuses.iter().map(|c| (c.candidate_id.clone(), c.status)));
    }

    pub fn is_loaded(&self, template_id: &RoundTemplateId) -> bool {
        self.rounds.contains_key(template_id)
    }

    pub fn changes(&self, template_id: &RoundTemplateId) -> Result<&PendingChangeSet, PipelineError> {
        self.rounds
            .get(template_id)
            .ok_or_else(|| not_loaded(template_id))
    }

    fn changes_mut(&mut self, template_id: &RoundTemplateId) -> Result<&mut PendingChangeSet, PipelineError> {
        self.rounds
            .get_mut(template_id)
            .ok_or_else(|| not_loaded(template_id))
    }

    /// Record `status` as the candidate's current status in a round.
    pub fn stage(
        &mut self,
        candidate_id: &CandidateId,
        template_id: &RoundTemplateId,
        status: RoundStatus,
    ) -> Result<StageOutcome, PipelineError> {
        let set = self.changes_mut(template_id)?;
        if !set.contains(candidate_id) {
            return Err(PipelineError::NotFound(format!(
                "candidate {candidate_id} has no record in round {template_id}"
            )));
        }
        Ok(set.stage(candidate_id, status))
    }

    pub fn revert(&mut self, template_id: &RoundTemplateId, candidate_id: &CandidateId) -> Result<bool, PipelineError> {
        Ok(self.changes_mut(template_id)?.revert(candidate_id))
    }

    pub fn revert_all(&mut self, template_id: &RoundTemplateId) -> Result<usize, PipelineError> {
        Ok(self.changes_mut(template_id)?.revert_all())
    }

    /// Current status of every candidate in a round, committed or not.
    pub fn snapshot(&self, template_id: &RoundTemplateId) -> Result<Vec<CandidateStatus>, PipelineError> {
        Ok(self.changes(template_id)?.snapshot())
    }

    /// Submit the pending-change set of a round as one batch.
    ///
    /// Candidates the server accepted have their baseline advanced; rejected
    /// ones stay pending for retry. A transport failure or a response without
    /// a success count commits nothing.
    pub async fn commit(&mut self, template_id: &RoundTemplateId) -> Result<CommitReport, PipelineError> {
        let changes = self.changes(template_id)?.pending();
        self.submit(template_id, changes).await
    }

    /// Stage the same status for every listed candidate, then commit.
    pub async fn bulk_set_status(
        &mut self,
        template_id: &RoundTemplateId,
        status: RoundStatus,
        candidate_ids: &[CandidateId],
    ) -> Result<CommitReport, PipelineError> {
        if candidate_ids.is_empty() {
            return Err(PipelineError::Validation(
                "bulk status update needs at least one candidate".into(),
            ));
        }
        let set = self.changes(template_id)?;
        if let Some(missing) = candidate_ids.iter().find(|c| !set.contains(c)) {
            return Err(PipelineError::NotFound(format!(
                "candidate {missing} has no record in round {template_id}"
            )));
        }
        for candidate_id in candidate_ids {
            self.stage(candidate_id, template_id, status)?;
        }
        self.commit(template_id).await
    }

    /// Persist the current status of every candidate in a round, not only the
    /// pending ones, correcting any drift left by skipped commits.
    pub async fn resync(&mut self, template_id: &RoundTemplateId) -> Result<CommitReport, PipelineError> {
        let snapshot = self.changes(template_id)?.snapshot();
        self.submit(template_id, snapshot).await
    }

    async fn submit(
        &mut self,
        template_id: &RoundTemplateId,
        updates: Vec<CandidateStatus>,
    ) -> Result<CommitReport, PipelineError> {
        if updates.is_empty() {
            return Ok(CommitReport::empty(template_id));
        }
        validate_updates(template_id, &updates)?;

        let request = StatusUpdateRequest {
            job_round_template_id: template_id.clone(),
            candidate_updates: updates,
        };
        let response = self.api.update_candidate_statuses(&request).await?;
        let report = CommitReport::from_response(template_id, &request.candidate_updates, response)?;

        self.changes_mut(template_id)?
            .mark_committed(report.succeeded.iter());

        if report.is_complete() {
            info!(%template_id, committed = report.submitted, "status changes committed");
        } else {
            warn!(
                %template_id,
                submitted = report.submitted,
                succeeded = report.succeeded.len(),
                failed = report.failed_count(),
                "status commit partially failed; failed candidates remain pending"
            );
        }
        Ok(report)
    }
}

fn not_loaded(template_id: &RoundTemplateId) -> PipelineError {
    PipelineError::NotFound(format!("round {template_id} has no loaded candidates"))
}

fn validate_updates(template_id: &RoundTemplateId, updates: &[CandidateStatus]) -> Result<(), PipelineError> {
    if template_id.as_str().trim().is_empty() {
        return Err(PipelineError::Validation("round template id is required".into()));
    }
    if updates.iter().any(|u| u.candidate_id.as_str().trim().is_empty()) {
        return Err(PipelineError::Validation("candidate id is required for every update".into()));
    }
    Ok(())
}
