use crate::job::error::JobError;
use crate::job::types::{
    AnalysisSummary, ArtifactRequest, JobHandle, JobState, JobStatus, SelectedFile, ServerHealth,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

impl From<&JobError> for Notice {
    fn from(error: &JobError) -> Self {
        let level = if error.is_fatal() {
            NoticeLevel::Error
        } else {
            NoticeLevel::Warning
        };
        Notice::new(level, error.to_string())
    }
}

/// Discrete changes the job client reports to its presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    StateChanged { from: JobState, to: JobState },
    FileSelected(SelectedFile),
    /// A new submission started; progress and result displays should be cleared.
    ProcessingReset { file_name: String },
    JobAccepted(JobHandle),
    Progress {
        status: JobStatus,
        percent: f32,
        message: String,
    },
    Completed(AnalysisSummary),
    DownloadRequested(ArtifactRequest),
    ServerHealth(ServerHealth),
    Notify(Notice),
}

pub trait JobView {
    fn on_event(&mut self, event: JobEvent);
}
