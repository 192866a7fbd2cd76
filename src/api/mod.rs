pub mod auth;
pub mod client;
pub mod error;
pub mod memory;
pub mod types;

pub use auth::{CredentialProvider, StaticToken};
pub use client::{HiringClient, RecruitingApi};
pub use error::ApiError;
pub use memory::InMemoryRecruitingApi;
pub use types::{
    BulkRecordRequest, BulkRecordResponse, CandidatePage, FailedCandidate, PageQuery, Pagination,
    StatusUpdateRequest, StatusUpdateResponse,
};
