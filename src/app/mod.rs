mod state;
mod ui;

use crate::config::ClientConfig;
use crate::job::{ArtifactKind, JobApi, JobSubmissionClient};
use eframe::{egui, App};
pub use state::DashboardState;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tracing::info;

pub struct AnalysisDashboard {
    client: JobSubmissionClient<DashboardState>,
}

impl AnalysisDashboard {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        api: Arc<dyn JobApi>,
        config: &ClientConfig,
        runtime: Handle,
    ) -> Self {
        info!("Initializing video analysis dashboard for {}", config.base_url);
        let view = DashboardState::new(config.notification_ttl);
        let client = JobSubmissionClient::new(api, view, config, runtime);
        client.check_server();
        Self { client }
    }

    pub fn state(&self) -> &DashboardState {
        self.client.view()
    }

    fn pick_file(&mut self) {
        let extensions = crate::job::validation::ALLOWED_EXTENSIONS;
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Video", &extensions)
            .pick_file()
        {
            self.select(path);
        }
    }

    fn select(&mut self, path: PathBuf) {
        // Rejections are already surfaced as notifications.
        let _ = self.client.select_path(&path);
    }

    fn download(&mut self, kind: ArtifactKind) {
        let _ = self.client.download_artifact(kind);
    }

    fn export(&mut self) {
        let _ = self.client.export_all();
    }

    fn discard(&mut self) {
        let _ = self.client.discard_job();
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if let Some(path) = dropped.into_iter().find_map(|f| f.path) {
            self.select(path);
        }
    }

    fn open_downloads(&mut self) {
        self.client.view_mut().open_downloads(|url| open::that(url));
    }

    pub fn update_state(&mut self, ctx: &egui::Context) {
        self.handle_dropped_files(ctx);
        self.client.pump();
        self.open_downloads();
        self.client.view_mut().prune_notifications(Instant::now());
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

impl App for AnalysisDashboard {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);
        self.render(ctx);
    }
}
