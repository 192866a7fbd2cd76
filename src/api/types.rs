//! Tipos de dados para requisições e respostas da API de recrutamento.
//!
//! Todas as structs derivam `Serialize` e `Deserialize` para conversão JSON
//! conforme o formato esperado pelos endpoints de rounds e candidatos.

use serde::{Deserialize, Serialize};

use crate::pipeline::{CandidateId, CandidateRoundRecord, CandidateStatus, RoundTemplateId};

/// Parâmetros de consulta para a listagem paginada de candidatos de um round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageQuery {
    /// Página solicitada, começando em 1.
    pub page: u32,
    /// Quantidade máxima de registros por página.
    pub limit: u32,
    pub include_custom_fields: bool,
    pub include_evaluations: bool,
}

/// Metadados de paginação devolvidos pela listagem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total_pages: u32,
    pub current_page: u32,
    #[serde(default)]
    pub total_items: Option<u64>,
}

/// Uma página da listagem `candidates/by-job-round-template`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatePage {
    /// Registros desta página. Alguns servidores usam a chave `candidates`.
    #[serde(alias = "candidates")]
    pub data: Vec<CandidateRoundRecord>,
    pub pagination: Pagination,
}

/// Corpo do commit de status em lote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub job_round_template_id: RoundTemplateId,
    pub candidate_updates: Vec<CandidateStatus>,
}

/// Resposta do commit de status em lote.
///
/// `successful_count` é opcional no fio: a ausência dele é tratada pelo
/// chamador como falha total, nunca como sucesso.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdateResponse {
    #[serde(default)]
    pub successful_count: Option<u32>,
    #[serde(default)]
    pub failed_count: u32,
    #[serde(default)]
    pub failed_candidates: Option<Vec<FailedCandidate>>,
}

/// Um candidato cuja atualização foi recusada pelo servidor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedCandidate {
    pub candidate_id: CandidateId,
    #[serde(default, alias = "reason")]
    pub error: Option<String>,
}

/// Corpo da criação em lote de registros de round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkRecordRequest {
    pub job_round_template_id: RoundTemplateId,
    pub candidates: Vec<CandidateStatus>,
    pub created_by: String,
}

/// Resposta da criação em lote (upsert por candidato e template).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkRecordResponse {
    #[serde(default)]
    pub created_count: u32,
    #[serde(default)]
    pub updated_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::RoundStatus;

    #[test]
    fn status_update_request_wire_format() {
        let req = StatusUpdateRequest {
            job_round_template_id: "rt-2".into(),
            candidate_updates: vec![CandidateStatus::new("c-1".into(), RoundStatus::Selected)],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "job_round_template_id": "rt-2",
                "candidate_updates": [{"candidate_id": "c-1", "status": "selected"}]
            })
        );
    }

    #[test]
    fn status_update_response_without_success_count() {
        let resp: StatusUpdateResponse = serde_json::from_str(r#"{"failed_count": 2}"#).unwrap();
        assert_eq!(resp.successful_count, None);
        assert_eq!(resp.failed_count, 2);
        assert!(resp.failed_candidates.is_none());
    }

    #[test]
    fn failed_candidate_accepts_reason_alias() {
        let json = r#"{
            "successful_count": 1,
            "failed_count": 1,
            "failed_candidates": [{"candidate_id": "c-9", "reason": "record missing"}]
        }"#;
        let resp: StatusUpdateResponse = serde_json::from_str(json).unwrap();
        let failed = resp.failed_candidates.unwrap();
        assert_eq!(failed[0].candidate_id, CandidateId::from("c-9"));
        assert_eq!(failed[0].error.as_deref(), Some("record missing"));
    }

    #[test]
    fn candidate_page_accepts_candidates_key() {
        let json = r#"{
            "candidates": [],
            "pagination": {"total_pages": 3, "current_page": 1}
        }"#;
        let page: CandidatePage = serde_json::from_str(json).unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.pagination.total_pages, 3);
        assert_eq!(page.pagination.total_items, None);
    }
}
