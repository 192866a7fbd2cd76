use std::sync::Arc;

use tracing::{debug, info, warn};

use super::model::{
    CandidateId, CandidateRoundRecord, CandidateStatus, JobOpeningId, RoundStatus, RoundTemplate,
    RoundTemplateId,
};
use super::pending::StageOutcome;
use super::records::{CandidateRoundRecordStore, FetchOptions, PagingConfig};
use super::registry::RoundTemplateRegistry;
use super::state::{RoundCommand, RoundState};
use super::transitions::{CommitReport, StatusTransitionManager};
use crate::api::RecruitingApi;
use crate::error::PipelineError;

/// Settings shared by the pipeline components.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub cache_ttl: std::time::Duration,
    pub paging: PagingConfig,
    /// Recorded as `created_by` on records created during progression.
    pub created_by: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            cache_ttl: crate::cache::DEFAULT_TTL,
            paging: PagingConfig::default(),
            created_by: "hirepath".to_string(),
        }
    }
}

/// What a successful progression did.
#[derive(Debug, Clone)]
pub struct ProgressionReport {
    pub from: RoundTemplate,
    pub to: RoundTemplate,
    /// Every candidate of the source round with the status carried forward.
    pub carried: Vec<CandidateStatus>,
    pub resynced: usize,
}

impl ProgressionReport {
    pub fn count(&self, status: RoundStatus) -> usize {
        self.carried.iter().filter(|c| c.status == status).count()
    }
}

/// Orchestrates round work: loading, staging, committing, and moving a whole
/// round's candidate population into the next round.
pub struct RoundProgressionController<A> {
    registry: RoundTemplateRegistry<A>,
    records: CandidateRoundRecordStore<A>,
    transitions: StatusTransitionManager<A>,
    created_by: String,
}

impl<A: RecruitingApi> RoundProgressionController<A> {
    pub fn new(api: Arc<A>, settings: PipelineSettings) -> Self {
        Self {
            registry: RoundTemplateRegistry::new(api.clone(), settings.cache_ttl),
            records: CandidateRoundRecordStore::new(api.clone(), settings.cache_ttl, settings.paging),
            transitions: StatusTransitionManager::new(api),
            created_by: settings.created_by,
        }
    }

    pub fn registry(&self) -> &RoundTemplateRegistry<A> {
        &self.registry
    }

    pub fn transitions(&self) -> &StatusTransitionManager<A> {
        &self.transitions
    }

    pub async fn list_rounds(
        &mut self,
        job_opening_id: &JobOpeningId,
        force_refresh: bool,
    ) -> Result<Vec<RoundTemplate>, PipelineError> {
        self.registry.list(job_opening_id, force_refresh).await
    }

    pub async fn confirm_round(&mut self, template_id: &RoundTemplateId) -> Result<RoundTemplate, PipelineError> {
        self.registry.confirm(template_id).await
    }

    /// Read a round's records and rebase its pending-change set on them.
    ///
    /// A cached listing only seeds a round that is not loaded yet. Once loaded,
    /// the baseline moves on fresh fetches alone, since a cached listing can
    /// predate commits made through this controller.
    pub async fn load_round(
        &mut self,
        template_id: &RoundTemplateId,
        options: &FetchOptions,
    ) -> Result<Vec<CandidateRoundRecord>, PipelineError> {
        self.registry.template(template_id)?;
        let listing = self.records.read(template_id, options).await?;
        if listing.from_cache && self.transitions.is_loaded(template_id) {
            debug!(%template_id, "cached listing; keeping the loaded baseline");
        } else {
            self.transitions.load_baseline(template_id, &listing.records);
        }
        Ok(listing.records)
    }

    /// Stage a status edit. Work on a locked round is refused; the first
    /// edit in an unlocked round activates it.
    pub fn stage(
        &mut self,
        candidate_id: &CandidateId,
        template_id: &RoundTemplateId,
        status: RoundStatus,
    ) -> Result<StageOutcome, PipelineError> {
        self.ensure_workable(template_id)?;
        self.transitions.stage(candidate_id, template_id, status)
    }

    pub fn revert(&mut self, template_id: &RoundTemplateId, candidate_id: &CandidateId) -> Result<bool, PipelineError> {
        self.transitions.revert(template_id, candidate_id)
    }

    pub async fn commit(&mut self, template_id: &RoundTemplateId) -> Result<CommitReport, PipelineError> {
        self.ensure_workable(template_id)?;
        self.transitions.commit(template_id).await
    }

    pub async fn bulk_set_status(
        &mut self,
        template_id: &RoundTemplateId,
        status: RoundStatus,
        candidate_ids: &[CandidateId],
    ) -> Result<CommitReport, PipelineError> {
        self.ensure_workable(template_id)?;
        self.transitions
            .bulk_set_status(template_id, status, candidate_ids)
            .await
    }

    fn ensure_workable(&mut self, template_id: &RoundTemplateId) -> Result<(), PipelineError> {
        match self.registry.state(template_id)? {
            RoundState::Locked => Err(PipelineError::RoundLocked(template_id.clone())),
            _ => self.registry.apply(template_id, RoundCommand::Activate).map(|_| ()),
        }
    }

    /// Move every candidate of `current` into the next round.
    ///
    /// Steps: resolve the next template (order index + 1), resync the full
    /// current status of the round, confirm the next template, then upsert a
    /// record per candidate carrying the status forward verbatim, whatever
    /// that status is. Rejected and pending candidates are carried too.
    ///
    /// The first failing step aborts the rest. Steps already applied stay
    /// applied; re-invoking is safe since confirm and upsert are idempotent.
    pub async fn progress_to_next_round(
        &mut self,
        current: &RoundTemplateId,
    ) -> Result<ProgressionReport, PipelineError> {
        let from = self.registry.template(current)?.clone();
        // Resolved before anything else so a missing round changes nothing.
        let to = self.registry.next_after(current)?.clone();
        if self.registry.state(current)? == RoundState::Locked {
            return Err(PipelineError::RoundLocked(current.clone()));
        }

        if !self.transitions.is_loaded(current) {
            self.load_round(current, &FetchOptions::refresh()).await?;
        }

        info!(from = %from.name, to = %to.name, "progressing round");
        let resync = self
            .transitions
            .resync(current)
            .await
            .inspect_err(|err| warn!(%current, error = %err, "progression aborted during resync"))?;
        if !resync.is_complete() {
            warn!(%current, failed = resync.failed_count(), "progression aborted: resync partially failed");
            return Err(PipelineError::PartialFailure(resync));
        }

        let carried = self.transitions.snapshot(current)?;

        self.registry.apply(&to.id, RoundCommand::Unlock)?;
        let to = self
            .registry
            .confirm(&to.id)
            .await
            .inspect_err(|err| warn!(next = %to.id, error = %err, "progression aborted during confirm"))?;

        self.records
            .upsert(&to.id, &carried, &self.created_by)
            .await
            .inspect_err(|err| {
                warn!(next = %to.id, error = %err, "progression aborted during record creation; next round stays confirmed")
            })?;
        self.transitions.seed(&to.id, &carried);

        info!(
            from = %from.name,
            to = %to.name,
            carried = carried.len(),
            "round progression complete"
        );
        Ok(ProgressionReport {
            from,
            to,
            carried,
            resynced: resync.submitted,
        })
    }
}
