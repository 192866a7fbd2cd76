use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hirepath::PipelineError;
use hirepath::api::{
    ApiError, CredentialProvider, HiringClient, RecruitingApi, StaticToken, StatusUpdateRequest,
};
use hirepath::cache::DEFAULT_TTL;
use hirepath::pipeline::{
    CandidateId, CandidateRoundRecordStore, CandidateStatus, FetchOptions, JobOpeningId,
    PagingConfig, RoundStatus, RoundTemplateId, StatusTransitionManager,
};

/// Hands out "stale" until refreshed, then "fresh".
#[derive(Default)]
struct RotatingToken {
    refreshes: AtomicUsize,
}

impl CredentialProvider for RotatingToken {
    async fn bearer_token(&self) -> Result<String, ApiError> {
        if self.refreshes.load(Ordering::SeqCst) == 0 {
            Ok("stale".into())
        } else {
            Ok("fresh".into())
        }
    }

    async fn refresh(&self) -> Result<String, ApiError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok("fresh".into())
    }

    fn clear(&self) {}
}

fn client(server: &MockServer) -> HiringClient<StaticToken> {
    HiringClient::new(format!("{}/api/v1", server.uri()), StaticToken::new("test-token")).unwrap()
}

fn record(candidate: &str, template: &str, status: &str) -> serde_json::Value {
    json!({
        "candidate_id": candidate,
        "job_round_template_id": template,
        "status": status,
        "evaluation_completed": false,
        "created_at": "2026-03-01T10:00:00Z",
        "updated_at": "2026-03-01T10:00:00Z",
        "candidate": {"id": candidate, "name": format!("Candidate {candidate}")}
    })
}

fn page(records: Vec<serde_json::Value>, current: u32, total: u32) -> serde_json::Value {
    json!({
        "data": records,
        "pagination": {"current_page": current, "total_pages": total}
    })
}

#[tokio::test]
async fn lists_round_templates_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/job-openings/job-1/round-templates"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "rt-2", "job_opening_id": "job-1", "name": "Technical", "order_index": 2},
            {"id": "rt-1", "job_opening_id": "job-1", "name": "Screening", "order_index": 1,
             "is_mandatory": true, "is_active": true}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let templates = client(&server)
        .list_round_templates(&JobOpeningId::from("job-1"))
        .await
        .unwrap();
    assert_eq!(templates.len(), 2);
    assert_eq!(templates[1].id, RoundTemplateId::from("rt-1"));
    assert!(templates[1].is_active);
    assert!(!templates[0].is_mandatory);
}

#[tokio::test]
async fn confirm_unknown_template_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/job-round-templates/rt-404/confirm"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such template"))
        .mount(&server)
        .await;

    let err = client(&server)
        .confirm_round_template(&RoundTemplateId::from("rt-404"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));
    assert!(matches!(PipelineError::from(err), PipelineError::NotFound(_)));
}

#[tokio::test]
async fn unauthorized_refreshes_once_and_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/job-openings/job-1/round-templates"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/job-openings/job-1/round-templates"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = HiringClient::new(format!("{}/api/v1", server.uri()), RotatingToken::default()).unwrap();
    let templates = client
        .list_round_templates(&JobOpeningId::from("job-1"))
        .await
        .unwrap();
    assert!(templates.is_empty());
    assert_eq!(client.credentials().refreshes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn second_unauthorized_gives_up() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let err = client(&server)
        .list_round_templates(&JobOpeningId::from("job-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn client_error_with_success_count_is_a_partial_commit() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/candidate-job-rounds/bulk-status"))
        .and(body_json(json!({
            "job_round_template_id": "rt-1",
            "candidate_updates": [
                {"candidate_id": "c-1", "status": "selected"},
                {"candidate_id": "c-2", "status": "rejected"}
            ]
        })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "successful_count": 1,
            "failed_count": 1,
            "failed_candidates": [{"candidate_id": "c-2", "error": "record missing"}]
        })))
        .mount(&server)
        .await;

    let request = StatusUpdateRequest {
        job_round_template_id: "rt-1".into(),
        candidate_updates: vec![
            CandidateStatus::new("c-1".into(), RoundStatus::Selected),
            CandidateStatus::new("c-2".into(), RoundStatus::Rejected),
        ],
    };
    let response = client(&server).update_candidate_statuses(&request).await.unwrap();
    assert_eq!(response.successful_count, Some(1));
    let failed = response.failed_candidates.unwrap();
    assert_eq!(failed[0].candidate_id, CandidateId::from("c-2"));
}

#[tokio::test]
async fn client_error_without_success_count_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/candidate-job-rounds/bulk-status"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "bad payload"})))
        .mount(&server)
        .await;

    let request = StatusUpdateRequest {
        job_round_template_id: "rt-1".into(),
        candidate_updates: vec![CandidateStatus::new("c-1".into(), RoundStatus::Selected)],
    };
    let err = client(&server).update_candidate_statuses(&request).await.unwrap_err();
    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("bad payload"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn commit_without_success_count_advances_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/candidate-job-rounds/bulk-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"failed_count": 0})))
        .expect(1)
        .mount(&server)
        .await;

    let api = Arc::new(client(&server));
    let template = RoundTemplateId::from("rt-1");
    let mut manager = StatusTransitionManager::new(api);
    manager.seed(
        &template,
        &[CandidateStatus::new("c-1".into(), RoundStatus::ActionPending)],
    );
    manager
        .stage(&CandidateId::from("c-1"), &template, RoundStatus::Selected)
        .unwrap();

    let err = manager.commit(&template).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Transport(ApiError::MalformedResponse(_))
    ));
    assert!(manager.changes(&template).unwrap().is_pending(&CandidateId::from("c-1")));
}

#[tokio::test]
async fn paginated_listing_fetches_every_page_then_serves_cache() {
    let server = MockServer::start().await;
    let base = "/api/v1/candidates/by-job-round-template/rt-1";
    for (number, ids) in [(1, ["c-1", "c-2"]), (2, ["c-3", "c-4"]), (3, ["c-5", "c-6"])] {
        let records = ids
            .iter()
            .map(|id| record(id, "rt-1", "action_pending"))
            .collect();
        Mock::given(method("GET"))
            .and(path(base))
            .and(query_param("page", number.to_string()))
            .and(query_param("limit", "2"))
            .and(query_param("include_evaluations", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(records, number, 3)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let paging = PagingConfig {
        page_size: 2,
        page_concurrency: 3,
    };
    let mut store = CandidateRoundRecordStore::new(Arc::new(client(&server)), DEFAULT_TTL, paging);
    let template = RoundTemplateId::from("rt-1");

    let first = store.list(&template, &FetchOptions::default()).await.unwrap();
    let ids: Vec<&str> = first.iter().map(|r| r.candidate_id.as_str()).collect();
    assert_eq!(ids, ["c-1", "c-2", "c-3", "c-4", "c-5", "c-6"]);
    assert_eq!(first[0].display_name(), "Candidate c-1");

    // Served from cache; each page mock expects exactly one hit.
    let second = store.list(&template, &FetchOptions::default()).await.unwrap();
    assert_eq!(second.len(), 6);
}

#[tokio::test]
async fn failing_page_fails_the_listing() {
    let server = MockServer::start().await;
    let base = "/api/v1/candidates/by-job-round-template/rt-1";
    Mock::given(method("GET"))
        .and(path(base))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page(vec![record("c-1", "rt-1", "selected")], 1, 2)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(base))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let mut store =
        CandidateRoundRecordStore::new(Arc::new(client(&server)), DEFAULT_TTL, PagingConfig::default());
    let err = store
        .list(&RoundTemplateId::from("rt-1"), &FetchOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert!(matches!(
        err,
        PipelineError::Transport(ApiError::Status { status: 500, .. })
    ));
}

#[tokio::test]
async fn evaluate_passes_round_template_as_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/candidates/c-7/evaluate"))
        .and(query_param("job_round_template_id", "rt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "overall_score": 81.5,
            "round_scores": {"1": 81.5},
            "recommendation": "advance"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let summary = client(&server)
        .evaluate_candidate(&RoundTemplateId::from("rt-1"), &CandidateId::from("c-7"))
        .await
        .unwrap();
    assert_eq!(summary.overall(), Some(81.5));
    assert_eq!(summary.round_score(1), Some(81.5));
}
