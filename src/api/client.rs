use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use super::auth::CredentialProvider;
use super::error::ApiError;
use super::types::{
    BulkRecordRequest, BulkRecordResponse, CandidatePage, PageQuery, StatusUpdateRequest,
    StatusUpdateResponse,
};
use crate::pipeline::{
    CandidateId, EvaluationSummary, JobOpeningId, RoundTemplate, RoundTemplateId,
};

/// Everything the pipeline needs from the recruiting backend.
///
/// Implemented by [`HiringClient`] over HTTP and by
/// [`InMemoryRecruitingApi`](super::InMemoryRecruitingApi) for demos and tests.
/// The backend is expected to upsert idempotently on (candidate, round template).
pub trait RecruitingApi {
    async fn list_round_templates(
        &self,
        job_opening_id: &JobOpeningId,
    ) -> Result<Vec<RoundTemplate>, ApiError>;

    async fn confirm_round_template(
        &self,
        template_id: &RoundTemplateId,
    ) -> Result<RoundTemplate, ApiError>;

    async fn fetch_candidate_page(
        &self,
        template_id: &RoundTemplateId,
        query: &PageQuery,
    ) -> Result<CandidatePage, ApiError>;

    async fn update_candidate_statuses(
        &self,
        request: &StatusUpdateRequest,
    ) -> Result<StatusUpdateResponse, ApiError>;

    async fn bulk_create_round_records(
        &self,
        request: &BulkRecordRequest,
    ) -> Result<BulkRecordResponse, ApiError>;

    async fn evaluate_candidate(
        &self,
        template_id: &RoundTemplateId,
        candidate_id: &CandidateId,
    ) -> Result<EvaluationSummary, ApiError>;
}

/// HTTP client for the recruiting REST API.
pub struct HiringClient<C> {
    client: Client,
    base_url: String,
    credentials: C,
}

impl<C: CredentialProvider> HiringClient<C> {
    pub fn new(base_url: impl Into<String>, credentials: C) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    pub fn credentials(&self) -> &C {
        &self.credentials
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Send a request with the current bearer token. A 401 triggers exactly one
    /// credential refresh and one retry.
    async fn send<F>(&self, build: F) -> Result<Response, ApiError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let token = self.credentials.bearer_token().await?;
        let response = build(&self.client).bearer_auth(&token).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warn!("bearer token rejected, refreshing credentials");
        let token = self.credentials.refresh().await?;
        let retry = build(&self.client).bearer_auth(&token).send().await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        Ok(retry)
    }
}

async fn check_status(response: Response, resource: impl FnOnce() -> String) -> Result<Response, ApiError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound {
            resource: resource(),
        });
    }
    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response)
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::MalformedResponse(e.to_string()))
}

impl<C: CredentialProvider> RecruitingApi for HiringClient<C> {
    async fn list_round_templates(
        &self,
        job_opening_id: &JobOpeningId,
    ) -> Result<Vec<RoundTemplate>, ApiError> {
        let url = self.url(&format!("job-openings/{job_opening_id}/round-templates"));
        debug!(%job_opening_id, "listing round templates");
        let response = self.send(|c| c.get(&url)).await?;
        let response = check_status(response, || format!("job opening {job_opening_id}")).await?;
        decode(response).await
    }

    async fn confirm_round_template(
        &self,
        template_id: &RoundTemplateId,
    ) -> Result<RoundTemplate, ApiError> {
        let url = self.url(&format!("job-round-templates/{template_id}/confirm"));
        debug!(%template_id, "confirming round template");
        let response = self.send(|c| c.post(&url)).await?;
        let response = check_status(response, || format!("round template {template_id}")).await?;
        decode(response).await
    }

    async fn fetch_candidate_page(
        &self,
        template_id: &RoundTemplateId,
        query: &PageQuery,
    ) -> Result<CandidatePage, ApiError> {
        let url = self.url(&format!("candidates/by-job-round-template/{template_id}"));
        debug!(%template_id, page = query.page, limit = query.limit, "fetching candidate page");
        let response = self.send(|c| c.get(&url).query(query)).await?;
        let response = check_status(response, || format!("round template {template_id}")).await?;
        decode(response).await
    }

    async fn update_candidate_statuses(
        &self,
        request: &StatusUpdateRequest,
    ) -> Result<StatusUpdateResponse, ApiError> {
        let url = self.url("candidate-job-rounds/bulk-status");
        let response = self.send(|c| c.put(&url).json(request)).await?;
        let status = response.status();
        if status.is_success() {
            return decode(response).await;
        }

        let body = response.text().await.unwrap_or_default();
        // A client error that still reports a success count is a partial commit.
        if status.is_client_error() {
            if let Ok(parsed) = serde_json::from_str::<StatusUpdateResponse>(&body) {
                if parsed.successful_count.is_some() {
                    warn!(
                        status = status.as_u16(),
                        successful = parsed.successful_count,
                        failed = parsed.failed_count,
                        "status commit partially rejected"
                    );
                    return Ok(parsed);
                }
            }
        }

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound {
                resource: format!("round template {}", request.job_round_template_id),
            });
        }
        Err(ApiError::Status {
            status: status.as_u16(),
            message: body,
        })
    }

    async fn bulk_create_round_records(
        &self,
        request: &BulkRecordRequest,
    ) -> Result<BulkRecordResponse, ApiError> {
        let url = self.url("candidate-job-rounds/bulk");
        let response = self.send(|c| c.post(&url).json(request)).await?;
        let response = check_status(response, || {
            format!("round template {}", request.job_round_template_id)
        })
        .await?;
        decode(response).await
    }

    async fn evaluate_candidate(
        &self,
        template_id: &RoundTemplateId,
        candidate_id: &CandidateId,
    ) -> Result<EvaluationSummary, ApiError> {
        let url = self.url(&format!("candidates/{candidate_id}/evaluate"));
        let response = self
            .send(|c| {
                c.post(&url)
                    .query(&[("job_round_template_id", template_id.as_str())])
            })
            .await?;
        let response = check_status(response, || format!("candidate {candidate_id}")).await?;
        decode(response).await
    }
}
