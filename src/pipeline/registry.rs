use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::model::{JobOpeningId, RoundTemplate, RoundTemplateId};
use super::state::{RoundCommand, RoundState, RoundStateMachine, Transition};
use crate::api::RecruitingApi;
use crate::cache::TtlCache;
use crate::error::PipelineError;

#[derive(Debug, Clone)]
struct TrackedRound {
    template: RoundTemplate,
    state: RoundState,
}

/// Ordered round templates per job opening, with their lifecycle state.
pub struct RoundTemplateRegistry<A> {
    api: Arc<A>,
    cache: TtlCache<Vec<RoundTemplate>>,
    rounds: HashMap<RoundTemplateId, TrackedRound>,
}

impl<A: RecruitingApi> RoundTemplateRegistry<A> {
    pub fn new(api: Arc<A>, cache_ttl: Duration) -> Self {
        Self {
            api,
            cache: TtlCache::new(cache_ttl),
            rounds: HashMap::new(),
        }
    }

    /// Templates of a job opening sorted by order index.
    ///
    /// Served from cache for one TTL unless `force_refresh` is set. Every
    /// listed template becomes tracked; a tracked template never moves back
    /// to an earlier lifecycle state because of a listing.
    pub async fn list(
        &mut self,
        job_opening_id: &JobOpeningId,
        force_refresh: bool,
    ) -> Result<Vec<RoundTemplate>, PipelineError> {
        let key = job_opening_id.as_str();
        let cached = if force_refresh { None } else { self.cache.get(key) };
        let templates = match cached {
            Some(templates) => templates,
            None => {
                let mut templates = self.api.list_round_templates(job_opening_id).await?;
                templates.sort_by_key(|t| t.order_index);
                validate_ordering(job_opening_id, &templates)?;
                debug!(%job_opening_id, count = templates.len(), "round templates fetched");
                self.cache.insert(key, templates.clone());
                templates
            }
        };

        self.track(&templates);
        Ok(templates)
    }

    fn track(&mut self, templates: &[RoundTemplate]) {
        let first_order = templates.iter().map(|t| t.order_index).min();
        for template in templates {
            let observed =
                RoundStateMachine::initial(template.is_active, Some(template.order_index) == first_order);
            let entry = self
                .rounds
                .entry(template.id.clone())
                .or_insert_with(|| TrackedRound {
                    template: template.clone(),
                    state: observed,
                });
            entry.template = template.clone();
            entry.state = entry.state.max(observed);
        }
    }

    fn tracked(&self, template_id: &RoundTemplateId) -> Result<&TrackedRound, PipelineError> {
        self.rounds
            .get(template_id)
            .ok_or_else(|| PipelineError::NotFound(format!("round template {template_id}")))
    }

    pub fn template(&self, template_id: &RoundTemplateId) -> Result<&RoundTemplate, PipelineError> {
        self.tracked(template_id).map(|r| &r.template)
    }

    pub fn state(&self, template_id: &RoundTemplateId) -> Result<RoundState, PipelineError> {
        self.tracked(template_id).map(|r| r.state)
    }

    /// Tracked templates of one job with their states, in order.
    pub fn rounds_of(&self, job_opening_id: &JobOpeningId) -> Vec<(RoundTemplate, RoundState)> {
        let ordered: BTreeMap<u32, (RoundTemplate, RoundState)> = self
            .rounds
            .values()
            .filter(|r| &r.template.job_opening_id == job_opening_id)
            .map(|r| (r.template.order_index, (r.template.clone(), r.state)))
            .collect();
        ordered.into_values().collect()
    }

    /// The template whose order index is exactly one past `template_id`'s.
    pub fn next_after(&self, template_id: &RoundTemplateId) -> Result<&RoundTemplate, PipelineError> {
        let current = self.template(template_id)?;
        let wanted = current.order_index + 1;
        self.rounds
            .values()
            .map(|r| &r.template)
            .find(|t| t.job_opening_id == current.job_opening_id && t.order_index == wanted)
            .ok_or_else(|| PipelineError::NoNextRound(template_id.clone()))
    }

    /// Apply a lifecycle command to a tracked template.
    pub fn apply(
        &mut self,
        template_id: &RoundTemplateId,
        command: RoundCommand,
    ) -> Result<Transition, PipelineError> {
        let round = self
            .rounds
            .get_mut(template_id)
            .ok_or_else(|| PipelineError::NotFound(format!("round template {template_id}")))?;
        let transition = RoundStateMachine::next(round.state, command)?;
        if let Transition::Advanced { from, to } = transition {
            debug!(%template_id, %from, %to, %command, "round state advanced");
        }
        round.state = transition.state();
        Ok(transition)
    }

    /// Mark a template active server-side.
    ///
    /// Confirming an already confirmed template is a no-op success. A locked
    /// template is unlocked first.
    pub async fn confirm(&mut self, template_id: &RoundTemplateId) -> Result<RoundTemplate, PipelineError> {
        if let Some(round) = self.rounds.get(template_id) {
            if round.state == RoundState::Confirmed {
                debug!(%template_id, "round template already confirmed");
                return Ok(round.template.clone());
            }
        }

        let confirmed = self.api.confirm_round_template(template_id).await?;
        info!(%template_id, name = %confirmed.name, "round template confirmed");

        let round = self
            .rounds
            .entry(template_id.clone())
            .or_insert_with(|| TrackedRound {
                template: confirmed.clone(),
                state: RoundState::Locked,
            });
        round.template = confirmed.clone();
        if round.state == RoundState::Locked {
            round.state = RoundStateMachine::next(round.state, RoundCommand::Unlock)?.state();
        }
        round.state = RoundStateMachine::next(round.state, RoundCommand::Confirm)?.state();
        Ok(confirmed)
    }
}

fn validate_ordering(
    job_opening_id: &JobOpeningId,
    sorted: &[RoundTemplate],
) -> Result<(), PipelineError> {
    let mut seen = HashSet::new();
    for template in sorted {
        if !seen.insert(template.order_index) {
            return Err(PipelineError::Validation(format!(
                "job opening {job_opening_id} has two rounds with order index {}",
                template.order_index
            )));
        }
    }
    Ok(())
}
