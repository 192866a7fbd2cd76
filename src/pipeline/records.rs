use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::model::{CandidateRoundRecord, CandidateStatus, RoundTemplateId};
use crate::api::{BulkRecordRequest, BulkRecordResponse, CandidatePage, PageQuery, RecruitingApi};
use crate::cache::TtlCache;
use crate::error::PipelineError;

/// How a round listing should be read.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Skip the cache and fetch from the API. The result repopulates the cache.
    pub force_refresh: bool,
    pub include_custom_fields: bool,
    pub include_evaluations: bool,
    pub cancel: Option<CancellationToken>,
}

impl FetchOptions {
    pub fn refresh() -> Self {
        Self {
            force_refresh: true,
            ..Self::default()
        }
    }

    pub fn with_evaluations(mut self) -> Self {
        self.include_evaluations = true;
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }
}

/// Paging limits for candidate listings.
#[derive(Debug, Clone, Copy)]
pub struct PagingConfig {
    pub page_size: u32,
    /// Pages fetched concurrently per batch after the first page.
    pub page_concurrency: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            page_concurrency: 3,
        }
    }
}

/// Records of one round as returned by [`CandidateRoundRecordStore::read`].
#[derive(Debug, Clone)]
pub struct RoundListing {
    pub records: Vec<CandidateRoundRecord>,
    /// Served from cache; may predate writes made in the last TTL.
    pub from_cache: bool,
}

/// Read/write access to per-candidate round records.
pub struct CandidateRoundRecordStore<A> {
    api: Arc<A>,
    cache: TtlCache<Vec<CandidateRoundRecord>>,
    paging: PagingConfig,
}

impl<A: RecruitingApi> CandidateRoundRecordStore<A> {
    pub fn new(api: Arc<A>, cache_ttl: Duration, paging: PagingConfig) -> Self {
        Self {
            api,
            cache: TtlCache::new(cache_ttl),
            paging: PagingConfig {
                page_size: paging.page_size.max(1),
                page_concurrency: paging.page_concurrency.max(1),
            },
        }
    }

    /// Every record of a round.
    ///
    /// Writes made through [`upsert`](Self::upsert) or status commits do not
    /// purge this cache, so a cached read can trail the server by up to one TTL.
    pub async fn list(
        &mut self,
        template_id: &RoundTemplateId,
        options: &FetchOptions,
    ) -> Result<Vec<CandidateRoundRecord>, PipelineError> {
        self.read(template_id, options).await.map(|listing| listing.records)
    }

    /// Like [`list`](Self::list), but says whether the records came from the cache.
    pub async fn read(
        &mut self,
        template_id: &RoundTemplateId,
        options: &FetchOptions,
    ) -> Result<RoundListing, PipelineError> {
        if !options.force_refresh {
            if let Some(records) = self.cache.get(template_id.as_str()) {
                return Ok(RoundListing {
                    records,
                    from_cache: true,
                });
            }
        }

        let records = self.fetch_all_pages(template_id, options).await?;
        self.cache.insert(template_id.as_str(), records.clone());
        Ok(RoundListing {
            records,
            from_cache: false,
        })
    }

    async fn fetch_all_pages(
        &self,
        template_id: &RoundTemplateId,
        options: &FetchOptions,
    ) -> Result<Vec<CandidateRoundRecord>, PipelineError> {
        if options.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let first = self.fetch_page(template_id, 1, options).await?;
        let total_pages = first.pagination.total_pages.max(1);
        let mut records = first.data;

        let remaining: Vec<u32> = (2..=total_pages).collect();
        for batch in remaining.chunks(self.paging.page_concurrency) {
            if options.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }
            let fetches = try_join_all(
                batch
                    .iter()
                    .map(|&page| self.fetch_page(template_id, page, options)),
            );
            let pages = match &options.cancel {
                Some(token) => tokio::select! {
                    _ = token.cancelled() => return Err(PipelineError::Cancelled),
                    pages = fetches => pages?,
                },
                None => fetches.await?,
            };
            for page in pages {
                records.extend(page.data);
            }
        }

        debug!(%template_id, pages = total_pages, records = records.len(), "round listing fetched");
        Ok(records)
    }

    async fn fetch_page(
        &self,
        template_id: &RoundTemplateId,
        page: u32,
        options: &FetchOptions,
    ) -> Result<CandidatePage, PipelineError> {
        let query = PageQuery {
            page,
            limit: self.paging.page_size,
            include_custom_fields: options.include_custom_fields,
            include_evaluations: options.include_evaluations,
        };
        Ok(self.api.fetch_candidate_page(template_id, &query).await?)
    }

    /// Create or update the records of `entries` in a round.
    pub async fn upsert(
        &self,
        template_id: &RoundTemplateId,
        entries: &[CandidateStatus],
        created_by: &str,
    ) -> Result<BulkRecordResponse, PipelineError> {
        if created_by.trim().is_empty() {
            return Err(PipelineError::Validation(
                "created_by is required for round record creation".into(),
            ));
        }
        if entries.is_empty() {
            return Ok(BulkRecordResponse::default());
        }

        let request = BulkRecordRequest {
            job_round_template_id: template_id.clone(),
            candidates: entries.to_vec(),
            created_by: created_by.to_string(),
        };
        let response = self.api.bulk_create_round_records(&request).await?;
        info!(
            %template_id,
            created = response.created_count,
            updated = response.updated_count,
            "round records upserted"
        );
        Ok(response)
    }
}
