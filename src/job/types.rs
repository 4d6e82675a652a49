use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub mime: Option<String>,
}

impl SelectedFile {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        size: u64,
        mime: Option<&str>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            size,
            mime: mime.map(str::to_string),
        }
    }

    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
    }
}

/// Server-assigned task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters followed by an ellipsis.
    pub fn short(&self) -> String {
        let prefix: String = self.0.chars().take(8).collect();
        format!("{}...", prefix)
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client-side life cycle of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Idle,
    FileSelected,
    Uploading,
    Polling,
    Completed,
    Failed,
    Stopped,
}

impl JobState {
    pub fn is_active(&self) -> bool {
        matches!(self, JobState::Uploading | JobState::Polling)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Stopped
        )
    }
}

/// Status reported by the server for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[serde(alias = "uploaded")]
    Queued,
    Processing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusSnapshot {
    pub status: JobStatus,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: Option<AnalysisResult>,
}

impl StatusSnapshot {
    /// Progress clamped to `[0, 100]`.
    pub fn clamped_progress(&self) -> f32 {
        clamp_progress(self.progress)
    }
}

pub fn clamp_progress(progress: f64) -> f32 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 100.0) as f32
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub stats: AnalysisStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct AnalysisStats {
    #[serde(default)]
    pub total_frames: u64,
    #[serde(default)]
    pub processed_frames: u64,
    #[serde(default)]
    pub total_alarms: u64,
    #[serde(default)]
    pub max_danger_level: u32,
}

const ASSUMED_FPS: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_danger(level: u32) -> Self {
        match level {
            l if l >= 7 => RiskLevel::High,
            l if l >= 4 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

/// Display-ready figures derived from a finished analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisSummary {
    pub processed_frames: u64,
    pub total_alarms: u64,
    pub duration_secs: u64,
    pub max_danger_level: u32,
    pub risk: RiskLevel,
}

impl From<&AnalysisStats> for AnalysisSummary {
    fn from(stats: &AnalysisStats) -> Self {
        Self {
            processed_frames: stats.processed_frames,
            total_alarms: stats.total_alarms,
            duration_secs: (stats.total_frames as f64 / ASSUMED_FPS).round() as u64,
            max_danger_level: stats.max_danger_level,
            risk: RiskLevel::from_danger(stats.max_danger_level),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Video,
    Database,
}

impl ArtifactKind {
    pub fn path_segment(&self) -> &'static str {
        match self {
            ArtifactKind::Video => "video",
            ArtifactKind::Database => "database",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactKind::Video => "analyzed_video.mp4",
            ArtifactKind::Database => "analysis_database.db",
        }
    }
}

/// A download to be opened by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRequest {
    pub kind: ArtifactKind,
    pub url: String,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerHealth {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub active_tasks: u64,
}

impl ServerHealth {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy" || self.status == "ok"
    }
}

// Wire envelopes.

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    pub success: bool,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}
