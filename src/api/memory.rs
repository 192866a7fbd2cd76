//! In-process recruiting backend.
//!
//! Behaves like the REST API (idempotent upserts keyed by candidate and round
//! template, partial-success status commits) without a network. The `demo`
//! command runs against it, and so do the pipeline tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use super::client::RecruitingApi;
use super::error::ApiError;
use super::types::{
    BulkRecordRequest, BulkRecordResponse, CandidatePage, FailedCandidate, PageQuery, Pagination,
    StatusUpdateRequest, StatusUpdateResponse,
};
use crate::pipeline::{
    Candidate, CandidateId, CandidateRoundRecord, EvaluationSummary, JobOpeningId, RoundStatus,
    RoundTemplate, RoundTemplateId,
};

#[derive(Default)]
struct Store {
    templates: BTreeMap<RoundTemplateId, RoundTemplate>,
    records: BTreeMap<(RoundTemplateId, CandidateId), CandidateRoundRecord>,
    names: HashMap<CandidateId, String>,
    evaluations: HashMap<CandidateId, EvaluationSummary>,
    rejected_updates: HashSet<CandidateId>,
    omit_success_count: bool,
    fail_bulk_create: bool,
    page_latency: Duration,
}

/// Counters for requests served, so callers can observe caching behaviour.
#[derive(Debug, Default)]
struct Calls {
    list_templates: AtomicUsize,
    confirm: AtomicUsize,
    page_fetches: AtomicUsize,
    pages_in_flight: AtomicUsize,
    peak_pages_in_flight: AtomicUsize,
    status_commits: AtomicUsize,
    bulk_creates: AtomicUsize,
}

#[derive(Default)]
pub struct InMemoryRecruitingApi {
    store: Mutex<Store>,
    calls: Calls,
}

impl InMemoryRecruitingApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> std::sync::MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create a job opening with one template per name, ordered from 1.
    pub fn seed_job(&self, job_opening_id: &JobOpeningId, round_names: &[&str]) -> Vec<RoundTemplate> {
        let mut store = self.store();
        round_names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let template = RoundTemplate {
                    id: RoundTemplateId(format!("rt-{}", Uuid::new_v4().simple())),
                    job_opening_id: job_opening_id.clone(),
                    name: (*name).to_string(),
                    order_index: i as u32 + 1,
                    is_mandatory: i == 0 || i + 1 == round_names.len(),
                    is_active: false,
                };
                store.templates.insert(template.id.clone(), template.clone());
                template
            })
            .collect()
    }

    /// Insert a template as-is (lets tests build irregular orderings).
    pub fn insert_template(&self, template: RoundTemplate) {
        self.store().templates.insert(template.id.clone(), template);
    }

    /// Place a candidate into a round with the given status.
    pub fn seed_candidate(
        &self,
        template_id: &RoundTemplateId,
        candidate_id: &CandidateId,
        name: &str,
        status: RoundStatus,
    ) {
        let mut store = self.store();
        store.names.insert(candidate_id.clone(), name.to_string());
        let record =
            CandidateRoundRecord::new(candidate_id.clone(), template_id.clone(), status);
        store
            .records
            .insert((template_id.clone(), candidate_id.clone()), record);
    }

    pub fn seed_evaluation(&self, candidate_id: &CandidateId, evaluation: EvaluationSummary) {
        self.store()
            .evaluations
            .insert(candidate_id.clone(), evaluation);
    }

    /// Make status commits reject these candidates.
    pub fn reject_updates_for(&self, candidates: &[CandidateId]) {
        self.store().rejected_updates.extend(candidates.iter().cloned());
    }

    pub fn accept_all_updates(&self) {
        self.store().rejected_updates.clear();
    }

    /// Drop `successful_count` from status commit responses.
    pub fn omit_success_count(&self, omit: bool) {
        self.store().omit_success_count = omit;
    }

    /// Make bulk record creation fail with a 503.
    pub fn fail_bulk_create(&self, fail: bool) {
        self.store().fail_bulk_create = fail;
    }

    /// Hold every page request for `latency` before answering.
    pub fn set_page_latency(&self, latency: Duration) {
        self.store().page_latency = latency;
    }

    pub fn record(
        &self,
        template_id: &RoundTemplateId,
        candidate_id: &CandidateId,
    ) -> Option<CandidateRoundRecord> {
        self.store()
            .records
            .get(&(template_id.clone(), candidate_id.clone()))
            .cloned()
    }

    pub fn records_for(&self, template_id: &RoundTemplateId) -> Vec<CandidateRoundRecord> {
        self.store()
            .records
            .iter()
            .filter(|((t, _), _)| t == template_id)
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn template(&self, template_id: &RoundTemplateId) -> Option<RoundTemplate> {
        self.store().templates.get(template_id).cloned()
    }

    fn page(&self, template_id: &RoundTemplateId, query: &PageQuery) -> Result<CandidatePage, ApiError> {
        let store = self.store();
        if !store.templates.contains_key(template_id) {
            return Err(ApiError::NotFound {
                resource: format!("round template {template_id}"),
            });
        }

        let limit = query.limit.max(1) as usize;
        let all: Vec<CandidateRoundRecord> = store
            .records
            .iter()
            .filter(|((t, _), _)| t == template_id)
            .map(|((_, candidate_id), record)| {
                let mut record = record.clone();
                record.candidate = store.names.get(candidate_id).map(|name| Candidate {
                    id: candidate_id.clone(),
                    name: Some(name.clone()),
                    email: None,
                });
                if query.include_evaluations {
                    record.evaluation = store.evaluations.get(candidate_id).cloned();
                }
                record
            })
            .collect();

        let total_pages = all.len().div_ceil(limit).max(1) as u32;
        let start = (query.page.saturating_sub(1) as usize) * limit;
        let data = all.iter().skip(start).take(limit).cloned().collect();

        Ok(CandidatePage {
            data,
            pagination: Pagination {
                total_pages,
                current_page: query.page,
                total_items: Some(all.len() as u64),
            },
        })
    }

    pub fn page_fetches(&self) -> usize {
        self.calls.page_fetches.load(Ordering::SeqCst)
    }

    /// Most page requests ever served at the same time.
    pub fn peak_pages_in_flight(&self) -> usize {
        self.calls.peak_pages_in_flight.load(Ordering::SeqCst)
    }

    pub fn template_listings(&self) -> usize {
        self.calls.list_templates.load(Ordering::SeqCst)
    }

    pub fn confirmations(&self) -> usize {
        self.calls.confirm.load(Ordering::SeqCst)
    }

    pub fn status_commits(&self) -> usize {
        self.calls.status_commits.load(Ordering::SeqCst)
    }

    pub fn bulk_creates(&self) -> usize {
        self.calls.bulk_creates.load(Ordering::SeqCst)
    }
}

impl RecruitingApi for InMemoryRecruitingApi {
    async fn list_round_templates(
        &self,
        job_opening_id: &JobOpeningId,
    ) -> Result<Vec<RoundTemplate>, ApiError> {
        self.calls.list_templates.fetch_add(1, Ordering::SeqCst);
        let templates: Vec<RoundTemplate> = self
            .store()
            .templates
            .values()
            .filter(|t| &t.job_opening_id == job_opening_id)
            .cloned()
            .collect();
        if templates.is_empty() {
            return Err(ApiError::NotFound {
                resource: format!("job opening {job_opening_id}"),
            });
        }
        Ok(templates)
    }

    async fn confirm_round_template(
        &self,
        template_id: &RoundTemplateId,
    ) -> Result<RoundTemplate, ApiError> {
        self.calls.confirm.fetch_add(1, Ordering::SeqCst);
        let mut store = self.store();
        let template = store
            .templates
            .get_mut(template_id)
            .ok_or_else(|| ApiError::NotFound {
                resource: format!("round template {template_id}"),
            })?;
        template.is_active = true;
        Ok(template.clone())
    }

    async fn fetch_candidate_page(
        &self,
        template_id: &RoundTemplateId,
        query: &PageQuery,
    ) -> Result<CandidatePage, ApiError> {
        self.calls.page_fetches.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.calls.pages_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls
            .peak_pages_in_flight
            .fetch_max(in_flight, Ordering::SeqCst);

        let latency = self.store().page_latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let page = self.page(template_id, query);
        self.calls.pages_in_flight.fetch_sub(1, Ordering::SeqCst);
        page
    }

    async fn update_candidate_statuses(
        &self,
        request: &StatusUpdateRequest,
    ) -> Result<StatusUpdateResponse, ApiError> {
        self.calls.status_commits.fetch_add(1, Ordering::SeqCst);
        let mut store = self.store();
        let template_id = &request.job_round_template_id;
        if !store.templates.contains_key(template_id) {
            return Err(ApiError::NotFound {
                resource: format!("round template {template_id}"),
            });
        }

        let mut failed = Vec::new();
        let mut succeeded = 0u32;
        for update in &request.candidate_updates {
            if store.rejected_updates.contains(&update.candidate_id) {
                failed.push(FailedCandidate {
                    candidate_id: update.candidate_id.clone(),
                    error: Some("update rejected".into()),
                });
                continue;
            }
            match store
                .records
                .get_mut(&(template_id.clone(), update.candidate_id.clone()))
            {
                Some(record) => {
                    record.status = update.status;
                    record.updated_at = Utc::now();
                    succeeded += 1;
                }
                None => failed.push(FailedCandidate {
                    candidate_id: update.candidate_id.clone(),
                    error: Some("candidate has no record in this round".into()),
                }),
            }
        }

        Ok(StatusUpdateResponse {
            successful_count: (!store.omit_success_count).then_some(succeeded),
            failed_count: failed.len() as u32,
            failed_candidates: (!failed.is_empty()).then_some(failed),
        })
    }

    async fn bulk_create_round_records(
        &self,
        request: &BulkRecordRequest,
    ) -> Result<BulkRecordResponse, ApiError> {
        self.calls.bulk_creates.fetch_add(1, Ordering::SeqCst);
        let mut store = self.store();
        if store.fail_bulk_create {
            return Err(ApiError::Status {
                status: 503,
                message: "record service unavailable".into(),
            });
        }
        let template_id = &request.job_round_template_id;
        if !store.templates.contains_key(template_id) {
            return Err(ApiError::NotFound {
                resource: format!("round template {template_id}"),
            });
        }

        let mut response = BulkRecordResponse::default();
        for entry in &request.candidates {
            let key = (template_id.clone(), entry.candidate_id.clone());
            match store.records.get_mut(&key) {
                Some(record) => {
                    record.status = entry.status;
                    record.updated_at = Utc::now();
                    response.updated_count += 1;
                }
                None => {
                    let record = CandidateRoundRecord::new(
                        entry.candidate_id.clone(),
                        template_id.clone(),
                        entry.status,
                    );
                    store.records.insert(key, record);
                    response.created_count += 1;
                }
            }
        }
        Ok(response)
    }

    async fn evaluate_candidate(
        &self,
        template_id: &RoundTemplateId,
        candidate_id: &CandidateId,
    ) -> Result<EvaluationSummary, ApiError> {
        let mut store = self.store();
        let evaluation = store
            .evaluations
            .get(candidate_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                resource: format!("evaluation for candidate {candidate_id}"),
            })?;
        if let Some(record) = store
            .records
            .get_mut(&(template_id.clone(), candidate_id.clone()))
        {
            record.evaluation_completed = true;
        }
        Ok(evaluation)
    }
}
