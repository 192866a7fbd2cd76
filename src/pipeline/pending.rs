use std::collections::BTreeMap;

use super::model::{CandidateId, CandidateRoundRecord, CandidateStatus, RoundStatus, RoundTemplateId};

/// What a call to [`PendingChangeSet::stage`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The candidate now has a pending change.
    Staged,
    /// The staged value equals the baseline, so the pending change was dropped.
    Reverted,
    /// Nothing changed: the value was already staged, or already the baseline.
    Unchanged,
}

/// Staged status edits for one round, held against the last persisted state.
///
/// `original` is the baseline (what the server is known to hold) and
/// `current` the post-edit view. A candidate is pending exactly when the two
/// differ, so staging a value back to its baseline removes the entry.
#[derive(Debug, Clone)]
pub struct PendingChangeSet {
    template_id: RoundTemplateId,
    original: BTreeMap<CandidateId, RoundStatus>,
    current: BTreeMap<CandidateId, RoundStatus>,
}

impl PendingChangeSet {
    pub fn new(template_id: RoundTemplateId) -> Self {
        Self {
            template_id,
            original: BTreeMap::new(),
            current: BTreeMap::new(),
        }
    }

    pub fn from_baseline(
        template_id: RoundTemplateId,
        baseline: impl IntoIterator<Item = (CandidateId, RoundStatus)>,
    ) -> Self {
        let original: BTreeMap<_, _> = baseline.into_iter().collect();
        Self {
            template_id,
            current: original.clone(),
            original,
        }
    }

    pub fn template_id(&self) -> &RoundTemplateId {
        &self.template_id
    }

    /// Record `status` as the candidate's current value.
    pub fn stage(&mut self, candidate_id: &CandidateId, status: RoundStatus) -> StageOutcome {
        let previous = self.current.insert(candidate_id.clone(), status);
        if previous == Some(status) {
            return StageOutcome::Unchanged;
        }
        if self.original.get(candidate_id) == Some(&status) {
            StageOutcome::Reverted
        } else {
            StageOutcome::Staged
        }
    }

    /// Drop the staged edit for one candidate. Returns whether one existed.
    pub fn revert(&mut self, candidate_id: &CandidateId) -> bool {
        if !self.is_pending(candidate_id) {
            return false;
        }
        match self.original.get(candidate_id) {
            Some(status) => {
                self.current.insert(candidate_id.clone(), *status);
            }
            None => {
                self.current.remove(candidate_id);
            }
        }
        true
    }

    pub fn revert_all(&mut self) -> usize {
        let pending: Vec<CandidateId> = self.pending().into_iter().map(|c| c.candidate_id).collect();
        for candidate_id in &pending {
            self.revert(candidate_id);
        }
        pending.len()
    }

    pub fn is_pending(&self, candidate_id: &CandidateId) -> bool {
        self.current.get(candidate_id) != self.original.get(candidate_id)
    }

    /// Every candidate whose current status differs from the baseline.
    pub fn pending(&self) -> Vec<CandidateStatus> {
        self.current
            .iter()
            .filter(|(candidate_id, status)| self.original.get(*candidate_id) != Some(*status))
            .map(|(candidate_id, status)| CandidateStatus::new(candidate_id.clone(), *status))
            .collect()
    }

    pub fn pending_len(&self) -> usize {
        self.current
            .iter()
            .filter(|(candidate_id, status)| self.original.get(*candidate_id) != Some(*status))
            .count()
    }

    pub fn has_pending(&self) -> bool {
        self.pending_len() > 0
    }

    /// Current status of every candidate in the round, staged or not.
    pub fn snapshot(&self) -> Vec<CandidateStatus> {
        self.current
            .iter()
            .map(|(candidate_id, status)| CandidateStatus::new(candidate_id.clone(), *status))
            .collect()
    }

    pub fn contains(&self, candidate_id: &CandidateId) -> bool {
        self.original.contains_key(candidate_id) || self.current.contains_key(candidate_id)
    }

    pub fn current_status(&self, candidate_id: &CandidateId) -> Option<RoundStatus> {
        self.current.get(candidate_id).copied()
    }

    pub fn original_status(&self, candidate_id: &CandidateId) -> Option<RoundStatus> {
        self.original.get(candidate_id).copied()
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Advance the baseline to the current value for these candidates.
    pub fn mark_committed<'a>(&mut self, candidates: impl IntoIterator<Item = &'a CandidateId>) {
        for candidate_id in candidates {
            if let Some(status) = self.current.get(candidate_id) {
                self.original.insert(candidate_id.clone(), *status);
            }
        }
    }

    /// Move the baseline to freshly persisted records, keeping staged edits.
    ///
    /// Candidates without a pending change take the persisted value. A staged
    /// edit survives, and disappears on its own if the server already holds it.
    pub fn rebase<'a>(&mut self, records: impl IntoIterator<Item = &'a CandidateRoundRecord>) {
        self.absorb(records.into_iter().map(|r| (r.candidate_id.clone(), r.status)));
    }

    /// [`rebase`](Self::rebase) from bare statuses. Candidates not listed are left alone.
    pub fn absorb(&mut self, persisted: impl IntoIterator<Item = (CandidateId, RoundStatus)>) {
        for (candidate_id, status) in persisted {
            if !self.is_pending(&candidate_id) {
                self.current.insert(candidate_id.clone(), status);
            }
            self.original.insert(candidate_id, status);
        }
    }
}
