//! Scripted collaborators for exercising the job client without a server.

use crate::job::api::JobApi;
use crate::job::error::{ApiError, ApiResult};
use crate::job::types::{
    AnalysisResult, AnalysisStats, AnalysisSummary, ArtifactKind, JobHandle, JobStatus,
    SelectedFile, ServerHealth, StatusSnapshot,
};
use crate::job::view::{JobEvent, JobView, Notice};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub enum Reply {
    Status(StatusSnapshot),
    Transport(String),
    Slow(Duration, StatusSnapshot),
}

pub fn processing(progress: f64) -> StatusSnapshot {
    StatusSnapshot {
        status: JobStatus::Processing,
        progress,
        message: "Analyzing frames".to_string(),
        result: None,
    }
}

pub fn completed(processed_frames: u64, total_alarms: u64, max_danger_level: u32) -> StatusSnapshot {
    StatusSnapshot {
        status: JobStatus::Completed,
        progress: 100.0,
        message: "Video analysis completed successfully!".to_string(),
        result: Some(AnalysisResult {
            message: None,
            stats: AnalysisStats {
                total_frames: processed_frames,
                processed_frames,
                total_alarms,
                max_danger_level,
            },
        }),
    }
}

pub struct ScriptedApi {
    upload: Result<String, String>,
    statuses: Mutex<VecDeque<Reply>>,
    results: Mutex<Option<AnalysisResult>>,
    uploads: AtomicUsize,
    status_calls: AtomicUsize,
    cleanups: AtomicUsize,
}

impl ScriptedApi {
    fn with_upload(upload: Result<String, String>) -> Self {
        Self {
            upload,
            statuses: Mutex::new(VecDeque::new()),
            results: Mutex::new(None),
            uploads: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            cleanups: AtomicUsize::new(0),
        }
    }

    pub fn accepting(task_id: &str) -> Self {
        Self::with_upload(Ok(task_id.to_string()))
    }

    pub fn rejecting(message: &str) -> Self {
        Self::with_upload(Err(message.to_string()))
    }

    /// Queue the reply for the next status request. Once the queue runs dry the
    /// job reports itself as still processing.
    pub fn push(&self, reply: Reply) {
        self.statuses.lock().unwrap().push_back(reply);
    }

    pub fn set_results(&self, result: AnalysisResult) {
        *self.results.lock().unwrap() = Some(result);
    }

    pub fn upload_calls(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn cleanup_calls(&self) -> usize {
        self.cleanups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobApi for ScriptedApi {
    async fn upload(&self, _file: &SelectedFile) -> ApiResult<JobHandle> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        match &self.upload {
            Ok(id) => Ok(JobHandle::new(id.clone())),
            Err(message) => Err(ApiError::Rejected(message.clone())),
        }
    }

    async fn status(&self, _handle: &JobHandle) -> ApiResult<StatusSnapshot> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.statuses.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Status(snapshot)) => Ok(snapshot),
            Some(Reply::Transport(message)) => Err(ApiError::Rejected(message)),
            Some(Reply::Slow(delay, snapshot)) => {
                tokio::time::sleep(delay).await;
                Ok(snapshot)
            }
            None => Ok(processing(50.0)),
        }
    }

    async fn results(&self, _handle: &JobHandle) -> ApiResult<AnalysisResult> {
        let result = self.results.lock().unwrap().clone();
        result.ok_or_else(|| ApiError::Rejected("Analysis not completed yet".to_string()))
    }

    async fn cleanup(&self, _handle: &JobHandle) -> ApiResult<String> {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
        Ok("Task cleaned up successfully".to_string())
    }

    async fn health(&self) -> ApiResult<ServerHealth> {
        Ok(ServerHealth {
            status: "healthy".to_string(),
            timestamp: None,
            active_tasks: 1,
        })
    }

    fn download_url(&self, kind: ArtifactKind, handle: &JobHandle) -> String {
        format!(
            "http://analysis.test/download/{}/{}",
            kind.path_segment(),
            handle
        )
    }
}

/// Keeps every event it is shown.
#[derive(Debug, Default)]
pub struct RecordingView {
    pub events: Vec<JobEvent>,
}

impl RecordingView {
    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.events.iter().filter_map(|e| match e {
            JobEvent::Notify(n) => Some(n),
            _ => None,
        })
    }

    pub fn last_summary(&self) -> Option<&AnalysisSummary> {
        self.events.iter().rev().find_map(|e| match e {
            JobEvent::Completed(s) => Some(s),
            _ => None,
        })
    }
}

impl JobView for RecordingView {
    fn on_event(&mut self, event: JobEvent) {
        self.events.push(event);
    }
}
