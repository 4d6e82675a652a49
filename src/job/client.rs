//! Life cycle of one video-analysis job: select, upload, poll, finish.
//!
//! All state lives on a single [`JobSubmissionClient`] owned by one thread.
//! Network calls run as tokio tasks and report back through a channel; the
//! owner feeds those continuations in with [`JobSubmissionClient::pump`] or
//! [`JobSubmissionClient::next`]. Every job start and every stop bumps a
//! generation counter, and continuations from older generations are dropped.

use crate::config::ClientConfig;
use crate::job::api::JobApi;
use crate::job::error::{ApiError, ApiResult, JobError};
use crate::job::polling::PollingSession;
use crate::job::types::{
    AnalysisResult, AnalysisSummary, ArtifactKind, ArtifactRequest, JobHandle, JobState,
    JobStatus, SelectedFile, ServerHealth, StatusSnapshot,
};
use crate::job::validation;
use crate::job::view::{JobEvent, JobView, Notice, NoticeLevel};
use crate::utils::file_size::FileSizeUtils;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

/// Results of asynchronous work, delivered back to the owning client.
pub(crate) enum Continuation {
    Uploaded {
        generation: u64,
        result: ApiResult<JobHandle>,
    },
    Tick {
        generation: u64,
    },
    Polled {
        generation: u64,
        result: ApiResult<StatusSnapshot>,
    },
    ResultsFetched {
        generation: u64,
        result: ApiResult<AnalysisResult>,
    },
    CleanedUp {
        handle: JobHandle,
        result: ApiResult<String>,
    },
    Health(ApiResult<ServerHealth>),
}

pub struct JobSubmissionClient<V: JobView> {
    api: Arc<dyn JobApi>,
    runtime: Handle,
    view: V,
    poll_interval: Duration,
    status_timeout: Duration,
    max_upload_bytes: u64,
    state: JobState,
    selected: Option<SelectedFile>,
    submitted: Option<SelectedFile>,
    current: Option<JobHandle>,
    last_completed: Option<JobHandle>,
    session: Option<PollingSession>,
    generation: u64,
    sender: UnboundedSender<Continuation>,
    receiver: UnboundedReceiver<Continuation>,
}

impl<V: JobView> JobSubmissionClient<V> {
    pub fn new(api: Arc<dyn JobApi>, view: V, config: &ClientConfig, runtime: Handle) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            api,
            runtime,
            view,
            poll_interval: config.poll_interval,
            status_timeout: config.status_timeout,
            max_upload_bytes: config.max_upload_bytes,
            state: JobState::Idle,
            selected: None,
            submitted: None,
            current: None,
            last_completed: None,
            session: None,
            generation: 0,
            sender,
            receiver,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    #[cfg(test)]
    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    #[cfg(test)]
    pub fn current_job(&self) -> Option<&JobHandle> {
        self.current.as_ref()
    }

    #[cfg(test)]
    pub fn is_polling(&self) -> bool {
        self.session.is_some()
    }

    pub fn can_start(&self) -> bool {
        self.selected.is_some() && !self.state.is_active()
    }

    pub fn has_artifacts(&self) -> bool {
        self.current.is_some() || self.last_completed.is_some()
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn select_path(&mut self, path: &Path) -> Result<(), JobError> {
        match validation::inspect_path(path) {
            Ok(file) => self.select_file(file),
            Err(e) => {
                warn!("Could not read {}: {}", path.display(), e);
                self.report(&e);
                Err(e)
            }
        }
    }

    /// Validate and remember a candidate upload. A running job is left alone;
    /// the new file is used by the next explicit start.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<(), JobError> {
        if let Err(e) = validation::validate(&file, self.max_upload_bytes) {
            warn!("Rejected {}: {}", file.name, e);
            self.report(&e);
            return Err(e);
        }

        info!("Selected {} ({} bytes)", file.name, file.size);
        let message = format!(
            "{} selected ({})",
            file.name,
            FileSizeUtils::format_size(file.size)
        );

        self.selected = Some(file.clone());
        self.view.on_event(JobEvent::FileSelected(file));
        if !self.state.is_active() {
            self.set_state(JobState::FileSelected);
        }
        self.notify(NoticeLevel::Success, message);
        Ok(())
    }

    pub fn start_processing(&mut self) {
        if self.state.is_active() {
            debug!("Job already running in state {:?}, ignoring start", self.state);
            return;
        }
        let Some(file) = self.selected.clone() else {
            debug!("No file selected, ignoring start");
            return;
        };

        self.generation += 1;
        self.current = None;
        self.submitted = Some(file.clone());
        info!("Starting job generation {} for {}", self.generation, file.name);

        self.set_state(JobState::Uploading);
        self.view.on_event(JobEvent::ProcessingReset {
            file_name: file.name.clone(),
        });
        self.view.on_event(JobEvent::Progress {
            status: JobStatus::Queued,
            percent: 0.0,
            message: "Uploading video...".to_string(),
        });

        self.upload(file);
    }

    fn upload(&mut self, file: SelectedFile) {
        let api = Arc::clone(&self.api);
        let sender = self.sender.clone();
        let generation = self.generation;

        self.runtime.spawn(async move {
            let result = api.upload(&file).await;
            deliver(&sender, Continuation::Uploaded { generation, result });
        });
    }

    fn on_uploaded(&mut self, generation: u64, result: ApiResult<JobHandle>) {
        if generation != self.generation || self.state != JobState::Uploading {
            debug!("Dropping upload result from generation {}", generation);
            return;
        }

        let submitted = self.submitted.take();
        match result {
            Ok(handle) => {
                info!("Upload accepted, task {}", handle);
                if submitted.is_some() && self.selected == submitted {
                    self.selected = None;
                }
                self.current = Some(handle.clone());
                self.view.on_event(JobEvent::JobAccepted(handle.clone()));
                self.notify(
                    NoticeLevel::Info,
                    "Video uploaded successfully, starting analysis...",
                );

                self.session = Some(PollingSession::start(
                    &self.runtime,
                    generation,
                    handle,
                    self.poll_interval,
                    self.sender.clone(),
                ));
                self.set_state(JobState::Polling);
            }
            Err(e) => {
                error!("Upload failed: {}", e);
                self.fail(JobError::UploadFailed(e.to_string()));
            }
        }
    }

    fn poll(&mut self, generation: u64) {
        if self.state != JobState::Polling {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.generation() != generation {
            debug!("Ignoring tick from generation {}", generation);
            return;
        }
        if !session.begin_poll() {
            debug!("Status check for {} still outstanding, skipping tick", session.handle());
            return;
        }

        let handle = session.handle().clone();
        let api = Arc::clone(&self.api);
        let sender = self.sender.clone();
        let limit = self.status_timeout;

        // Bounded so a stalled request releases the in-flight guard.
        self.runtime.spawn(async move {
            let result = match tokio::time::timeout(limit, api.status(&handle)).await {
                Ok(result) => result,
                Err(_) => Err(ApiError::Timeout(limit)),
            };
            deliver(&sender, Continuation::Polled { generation, result });
        });
    }

    fn on_polled(&mut self, generation: u64, result: ApiResult<StatusSnapshot>) {
        let Some(session) = self
            .session
            .as_mut()
            .filter(|s| s.generation() == generation)
        else {
            debug!("Dropping status from generation {}", generation);
            return;
        };
        session.finish_poll();

        match result {
            Ok(snapshot) => self.apply_snapshot(generation, snapshot),
            Err(e) => {
                let e = JobError::PollTransportError(e.to_string());
                warn!("{}", e);
                self.report(&e);
            }
        }
    }

    fn apply_snapshot(&mut self, generation: u64, snapshot: StatusSnapshot) {
        let percent = snapshot.clamped_progress();
        debug!(
            "Task status {} at {:.1}%: {}",
            snapshot.status, percent, snapshot.message
        );

        match snapshot.status {
            JobStatus::Completed => {
                self.session = None;
                self.last_completed = self.current.take();
                info!("Analysis completed");

                self.view.on_event(JobEvent::Progress {
                    status: JobStatus::Completed,
                    percent: 100.0,
                    message: "Analysis completed successfully!".to_string(),
                });
                self.set_state(JobState::Completed);

                match snapshot.result {
                    Some(result) => self.materialize(&result),
                    None => self.fetch_results(generation),
                }
            }
            JobStatus::Failed => {
                self.view.on_event(JobEvent::Progress {
                    status: JobStatus::Failed,
                    percent,
                    message: snapshot.message.clone(),
                });
                error!("Analysis failed: {}", snapshot.message);
                self.fail(JobError::JobFailed(snapshot.message));
            }
            status => {
                self.view.on_event(JobEvent::Progress {
                    status,
                    percent,
                    message: snapshot.message,
                });
            }
        }
    }

    fn fetch_results(&mut self, generation: u64) {
        let Some(handle) = self.last_completed.clone() else {
            return;
        };
        debug!("Status for {} carried no result, fetching it", handle);

        let api = Arc::clone(&self.api);
        let sender = self.sender.clone();
        self.runtime.spawn(async move {
            let result = api.results(&handle).await;
            deliver(&sender, Continuation::ResultsFetched { generation, result });
        });
    }

    fn on_results(&mut self, generation: u64, result: ApiResult<AnalysisResult>) {
        if generation != self.generation || self.state != JobState::Completed {
            debug!("Dropping results from generation {}", generation);
            return;
        }

        match result {
            Ok(result) => self.materialize(&result),
            Err(e) => {
                warn!("Could not load analysis results: {}", e);
                self.notify(
                    NoticeLevel::Warning,
                    format!("Could not load analysis results: {}", e),
                );
            }
        }
    }

    fn materialize(&mut self, result: &AnalysisResult) {
        let summary = AnalysisSummary::from(&result.stats);
        info!(
            "Processed {} frames, {} alarms, max danger {}",
            summary.processed_frames, summary.total_alarms, summary.max_danger_level
        );
        self.view.on_event(JobEvent::Completed(summary));
        self.notify(NoticeLevel::Success, "Video analysis completed successfully!");
    }

    /// Cancel the running job. Does nothing unless a job is uploading or polling.
    pub fn stop_processing(&mut self) {
        if !self.state.is_active() {
            debug!("Nothing to stop in state {:?}", self.state);
            return;
        }

        info!("Stopping job generation {}", self.generation);
        self.generation += 1;
        self.session = None;
        self.current = None;
        self.submitted = None;
        self.set_state(JobState::Stopped);
        self.notify(NoticeLevel::Warning, "Analysis stopped");
    }

    pub fn download_artifact(&mut self, kind: ArtifactKind) -> Result<ArtifactRequest, JobError> {
        let Some(handle) = self.current.as_ref().or(self.last_completed.as_ref()) else {
            let e = JobError::NoActiveJob;
            warn!("Download of {} requested without a job", kind.path_segment());
            self.report(&e);
            return Err(e);
        };

        let request = ArtifactRequest {
            kind,
            url: self.api.download_url(kind, handle),
            file_name: kind.file_name().to_string(),
        };
        info!("Requesting download {}", request.url);

        self.view.on_event(JobEvent::DownloadRequested(request.clone()));
        self.notify(
            NoticeLevel::Info,
            format!("Downloading {}...", request.file_name),
        );
        Ok(request)
    }

    /// Download every artifact of the latest job, video first.
    pub fn export_all(&mut self) -> Result<Vec<ArtifactRequest>, JobError> {
        if !self.has_artifacts() {
            let e = JobError::NoActiveJob;
            self.report(&e);
            return Err(e);
        }

        [ArtifactKind::Video, ArtifactKind::Database]
            .into_iter()
            .map(|kind| self.download_artifact(kind))
            .collect()
    }

    /// Ask the server to delete the files of the latest finished job.
    pub fn discard_job(&mut self) -> Result<(), JobError> {
        if self.state.is_active() {
            debug!("Refusing to discard a running job");
            return Ok(());
        }
        let Some(handle) = self.last_completed.clone().or_else(|| self.current.clone()) else {
            let e = JobError::NoActiveJob;
            self.report(&e);
            return Err(e);
        };

        info!("Cleaning up task {}", handle);
        let api = Arc::clone(&self.api);
        let sender = self.sender.clone();
        self.runtime.spawn(async move {
            let result = api.cleanup(&handle).await;
            deliver(&sender, Continuation::CleanedUp { handle, result });
        });
        Ok(())
    }

    fn on_cleaned_up(&mut self, handle: JobHandle, result: ApiResult<String>) {
        match result {
            Ok(message) => {
                info!("Task {} cleaned up", handle);
                if self.last_completed.as_ref() == Some(&handle) {
                    self.last_completed = None;
                }
                if self.current.as_ref() == Some(&handle) {
                    self.current = None;
                }
                self.notify(NoticeLevel::Info, message);
            }
            Err(e) => {
                warn!("Cleanup of {} failed: {}", handle, e);
                self.notify(NoticeLevel::Warning, format!("Cleanup failed: {}", e));
            }
        }
    }

    pub fn check_server(&self) {
        let api = Arc::clone(&self.api);
        let sender = self.sender.clone();
        self.runtime.spawn(async move {
            let result = api.health().await;
            deliver(&sender, Continuation::Health(result));
        });
    }

    fn on_health(&mut self, result: ApiResult<ServerHealth>) {
        match result {
            Ok(health) => {
                debug!("Server {} with {} active tasks", health.status, health.active_tasks);
                if !health.is_healthy() {
                    self.notify(
                        NoticeLevel::Warning,
                        format!("Analysis server reports status '{}'", health.status),
                    );
                }
                self.view.on_event(JobEvent::ServerHealth(health));
            }
            Err(e) => {
                warn!("Health check failed: {}", e);
                self.notify(
                    NoticeLevel::Warning,
                    format!("Analysis server unreachable: {}", e),
                );
            }
        }
    }

    /// Forget the finished job and go back to file selection.
    pub fn reset(&mut self) {
        if self.state.is_active() {
            debug!("Cannot reset while a job is running");
            return;
        }

        self.generation += 1;
        self.current = None;
        self.last_completed = None;
        let next = if self.selected.is_some() {
            JobState::FileSelected
        } else {
            JobState::Idle
        };
        self.set_state(next);
    }

    /// Apply every continuation that is ready without waiting.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(continuation) = self.receiver.try_recv() {
            self.apply(continuation);
            applied += 1;
        }
        applied
    }

    /// Wait for the next continuation and apply it.
    pub async fn next(&mut self) {
        if let Some(continuation) = self.receiver.recv().await {
            self.apply(continuation);
        }
    }

    fn apply(&mut self, continuation: Continuation) {
        match continuation {
            Continuation::Uploaded { generation, result } => self.on_uploaded(generation, result),
            Continuation::Tick { generation } => self.poll(generation),
            Continuation::Polled { generation, result } => self.on_polled(generation, result),
            Continuation::ResultsFetched { generation, result } => {
                self.on_results(generation, result)
            }
            Continuation::CleanedUp { handle, result } => self.on_cleaned_up(handle, result),
            Continuation::Health(result) => self.on_health(result),
        }
    }

    fn fail(&mut self, e: JobError) {
        self.session = None;
        self.current = None;
        self.set_state(JobState::Failed);
        self.report(&e);
    }

    fn set_state(&mut self, to: JobState) {
        let from = self.state;
        if from == to {
            return;
        }
        debug!("Job state {:?} -> {:?}", from, to);
        self.state = to;
        self.view.on_event(JobEvent::StateChanged { from, to });
    }

    fn report(&mut self, e: &JobError) {
        self.view.on_event(JobEvent::Notify(Notice::from(e)));
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.view.on_event(JobEvent::Notify(Notice::new(level, message)));
    }
}

fn deliver(sender: &UnboundedSender<Continuation>, continuation: Continuation) {
    if sender.send(continuation).is_err() {
        debug!("Job client is gone, discarding continuation");
    }
}
