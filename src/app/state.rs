use crate::job::{
    AnalysisSummary, ArtifactRequest, JobEvent, JobState, JobStatus, JobView, Notice, NoticeLevel,
    RiskLevel, ServerHealth,
};
use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct ShownNotice {
    pub notice: Notice,
    pub shown_at: Instant,
}

/// Display model of the dashboard, driven by job events.
#[derive(Debug)]
pub struct DashboardState {
    pub job_state: JobState,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub analysis_id: Option<String>,
    pub status_text: String,
    pub progress: f32,
    pub progress_message: String,
    pub summary: Option<AnalysisSummary>,
    pub server: Option<ServerHealth>,
    pub notifications: Vec<ShownNotice>,
    pending_downloads: VecDeque<ArtifactRequest>,
    notification_ttl: Duration,
}

impl DashboardState {
    pub fn new(notification_ttl: Duration) -> Self {
        Self {
            job_state: JobState::Idle,
            file_name: None,
            file_size: None,
            analysis_id: None,
            status_text: "-".to_string(),
            progress: 0.0,
            progress_message: String::new(),
            summary: None,
            server: None,
            notifications: Vec::new(),
            pending_downloads: VecDeque::new(),
            notification_ttl,
        }
    }

    pub fn downloads_enabled(&self) -> bool {
        self.job_state == JobState::Completed
    }

    pub fn progress_fraction(&self) -> f32 {
        self.progress / 100.0
    }

    /// Headline and risk for the danger card.
    pub fn danger_status(&self) -> (String, Option<RiskLevel>) {
        if let Some(summary) = &self.summary {
            let headline = if summary.total_alarms > 0 {
                format!("{} alarms detected", summary.total_alarms)
            } else {
                "No danger detected".to_string()
            };
            return (headline, Some(summary.risk));
        }

        match self.job_state {
            JobState::Polling if self.progress > 0.0 => {
                ("Analysis in progress...".to_string(), Some(RiskLevel::Medium))
            }
            _ => ("Waiting...".to_string(), None),
        }
    }

    /// Hand queued downloads to `opener`; failures become error notifications.
    pub fn open_downloads(&mut self, opener: impl Fn(&str) -> io::Result<()>) {
        while let Some(request) = self.pending_downloads.pop_front() {
            if let Err(e) = opener(&request.url) {
                warn!("Failed to open {}: {}", request.url, e);
                self.on_event(JobEvent::Notify(Notice::new(
                    NoticeLevel::Error,
                    format!("Could not download {}: {}", request.file_name, e),
                )));
            }
        }
    }

    pub fn prune_notifications(&mut self, now: Instant) {
        let ttl = self.notification_ttl;
        self.notifications
            .retain(|n| now.saturating_duration_since(n.shown_at) < ttl);
    }

    pub fn dismiss(&mut self, index: usize) {
        if index < self.notifications.len() {
            self.notifications.remove(index);
        }
    }

    fn clear_job_display(&mut self) {
        self.analysis_id = None;
        self.status_text = "-".to_string();
        self.progress = 0.0;
        self.progress_message.clear();
        self.summary = None;
    }

    fn on_state_changed(&mut self, to: JobState) {
        self.job_state = to;
        match to {
            JobState::Idle | JobState::FileSelected => self.clear_job_display(),
            JobState::Uploading => self.status_text = "Uploading...".to_string(),
            JobState::Polling => self.status_text = "Starting analysis...".to_string(),
            JobState::Completed => self.status_text = "Completed".to_string(),
            JobState::Failed => self.status_text = "Failed".to_string(),
            JobState::Stopped => {
                self.status_text = "Stopped".to_string();
                self.progress = 0.0;
                self.progress_message = "Analysis stopped".to_string();
            }
        }
    }
}

impl JobView for DashboardState {
    fn on_event(&mut self, event: JobEvent) {
        match event {
            JobEvent::StateChanged { to, .. } => self.on_state_changed(to),
            JobEvent::FileSelected(file) => {
                self.file_name = Some(file.name);
                self.file_size = Some(file.size);
            }
            JobEvent::ProcessingReset { file_name } => {
                self.clear_job_display();
                self.status_text = "Uploading...".to_string();
                self.file_name = Some(file_name);
            }
            JobEvent::JobAccepted(handle) => {
                self.analysis_id = Some(handle.short());
            }
            JobEvent::Progress {
                status,
                percent,
                message,
            } => {
                if self.job_state == JobState::Polling {
                    self.status_text = match status {
                        JobStatus::Processing => "Processing...".to_string(),
                        _ => "Preparing...".to_string(),
                    };
                }
                self.progress = percent;
                self.progress_message = message;
            }
            JobEvent::Completed(summary) => self.summary = Some(summary),
            JobEvent::DownloadRequested(request) => self.pending_downloads.push_back(request),
            JobEvent::ServerHealth(health) => self.server = Some(health),
            JobEvent::Notify(notice) => self.notifications.push(ShownNotice {
                notice,
                shown_at: Instant::now(),
            }),
        }
    }
}
