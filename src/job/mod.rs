mod api;
mod client;
mod error;
mod polling;
#[cfg(test)]
mod testing;
mod types;
pub mod validation;
mod view;

pub use api::{HttpJobApi, JobApi};
pub use client::JobSubmissionClient;
pub use error::JobError;
pub use types::{
    AnalysisSummary, ArtifactKind, ArtifactRequest, JobHandle, JobState, JobStatus, RiskLevel,
    SelectedFile, ServerHealth,
};
pub use view::{JobEvent, JobView, Notice, NoticeLevel};
