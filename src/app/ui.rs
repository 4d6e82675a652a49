use super::AnalysisDashboard;
use crate::job::{ArtifactKind, JobState};
use crate::utils::color::{LevelColor, ACCENT, MUTED, SUCCESS, WARNING};
use crate::utils::file_size::FileSizeUtils;
use eframe::egui::{self, Align, RichText};

impl AnalysisDashboard {
    pub fn render(&mut self, ctx: &egui::Context) {
        self.render_notifications(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(20.0);
                ui.vertical_centered(|ui| {
                    ui.heading("Video Analysis");
                    ui.add_space(5.0);
                    ui.label(
                        RichText::new("Upload a video and follow its danger analysis")
                            .color(ui.visuals().text_color().gamma_multiply(0.7)),
                    );
                });

                ui.add_space(20.0);
                self.render_server_status(ui);

                ui.add_space(10.0);
                self.render_file_selection(ui);

                ui.add_space(20.0);
                self.render_controls(ui);

                if self.state().job_state != JobState::Idle
                    && self.state().job_state != JobState::FileSelected
                {
                    ui.add_space(20.0);
                    self.render_analysis(ui);
                }

                if self.state().summary.is_some() {
                    ui.add_space(20.0);
                    self.render_results(ui);
                }

                ui.add_space(20.0);
            });
        });
    }

    fn render_server_status(&self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label("Server:");
                match &self.state().server {
                    Some(health) if health.is_healthy() => {
                        ui.colored_label(SUCCESS, "Online");
                        ui.label(
                            RichText::new(format!("{} active tasks", health.active_tasks))
                                .color(MUTED),
                        );
                    }
                    Some(health) => {
                        ui.colored_label(WARNING, health.status.as_str());
                    }
                    None => {
                        ui.colored_label(MUTED, "Unknown");
                    }
                }
            });
        });
    }

    fn render_file_selection(&mut self, ui: &mut egui::Ui) {
        ui.label("Supported formats: MP4, AVI, MOV, MKV, WMV, FLV, WEBM (max 500 MB)");
        ui.add_space(5.0);
        ui.group(|ui| {
            ui.horizontal(|ui| {
                if ui.button("🎬 Select Video").clicked() {
                    self.pick_file();
                }
                match (&self.state().file_name, self.state().file_size) {
                    (Some(name), Some(size)) => {
                        ui.label(format!(
                            "Selected: {} ({})",
                            name,
                            FileSizeUtils::format_size(size)
                        ));
                    }
                    _ => {
                        ui.label(RichText::new("…or drop a video onto the window").color(MUTED));
                    }
                }
            });
        });
    }

    fn render_controls(&mut self, ui: &mut egui::Ui) {
        let can_start = self.client.can_start();
        let can_stop = self.client.state().is_active();
        let finished = self.client.state().is_terminal();
        let start_label = if finished {
            "▶ Start New Analysis"
        } else {
            "▶ Start Analysis"
        };

        ui.vertical_centered(|ui| {
            ui.horizontal(|ui| {
                let start = egui::Button::new(start_label).min_size(egui::vec2(180.0, 36.0));
                if ui.add_enabled(can_start, start).clicked() {
                    self.client.start_processing();
                }

                let stop = egui::Button::new("⏹ Stop").min_size(egui::vec2(100.0, 36.0));
                if ui.add_enabled(can_stop, stop).clicked() {
                    self.client.stop_processing();
                }

                if finished && ui.button("🗑 Clear").clicked() {
                    self.client.reset();
                }
            });
        });
    }

    fn render_analysis(&self, ui: &mut egui::Ui) {
        let state = self.state();
        ui.group(|ui| {
            egui::Grid::new("analysis_info").num_columns(2).show(ui, |ui| {
                ui.label("Analysis ID:");
                ui.label(state.analysis_id.as_deref().unwrap_or("-"));
                ui.end_row();

                ui.label("File:");
                ui.label(state.file_name.as_deref().unwrap_or("-"));
                ui.end_row();

                ui.label("Status:");
                ui.label(state.status_text.as_str());
                ui.end_row();
            });

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.label(state.progress_message.as_str());
                ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                    ui.label(format!("{}%", state.progress.round()));
                });
            });
            ui.add(
                egui::ProgressBar::new(state.progress_fraction())
                    .animate(state.job_state.is_active())
                    .fill(ACCENT),
            );

            ui.add_space(8.0);
            let (headline, risk) = state.danger_status();
            ui.horizontal(|ui| {
                ui.label("Danger:");
                match risk {
                    Some(risk) => {
                        ui.colored_label(risk.color(), headline);
                        ui.label(
                            RichText::new(format!("Risk level: {}", risk.label())).color(MUTED),
                        );
                    }
                    None => {
                        ui.colored_label(MUTED, headline);
                    }
                }
            });
        });
    }

    fn render_results(&mut self, ui: &mut egui::Ui) {
        let Some(summary) = self.state().summary else {
            return;
        };
        let downloads_enabled = self.state().downloads_enabled();

        ui.group(|ui| {
            ui.heading("Results");
            egui::Grid::new("analysis_stats").num_columns(2).show(ui, |ui| {
                ui.label("Processed frames:");
                ui.label(summary.processed_frames.to_string());
                ui.end_row();

                ui.label("Alarms:");
                ui.label(summary.total_alarms.to_string());
                ui.end_row();

                ui.label("Duration (s):");
                ui.label(summary.duration_secs.to_string());
                ui.end_row();

                ui.label("Max danger level:");
                ui.colored_label(summary.risk.color(), summary.max_danger_level.to_string());
                ui.end_row();
            });

            ui.add_space(10.0);
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(downloads_enabled, egui::Button::new("⬇ Analyzed Video"))
                    .clicked()
                {
                    self.download(ArtifactKind::Video);
                }
                if ui
                    .add_enabled(downloads_enabled, egui::Button::new("⬇ Database"))
                    .clicked()
                {
                    self.download(ArtifactKind::Database);
                }
                if ui
                    .add_enabled(downloads_enabled, egui::Button::new("📦 Export All"))
                    .clicked()
                {
                    self.export();
                }
                if ui
                    .add_enabled(downloads_enabled, egui::Button::new("🧹 Delete From Server"))
                    .clicked()
                {
                    self.discard();
                }
            });
        });
    }

    fn render_notifications(&mut self, ctx: &egui::Context) {
        if self.state().notifications.is_empty() {
            return;
        }

        let mut dismissed = None;
        egui::TopBottomPanel::bottom("notifications").show(ctx, |ui| {
            ui.add_space(4.0);
            for (index, shown) in self.state().notifications.iter().enumerate() {
                ui.horizontal(|ui| {
                    ui.colored_label(shown.notice.level.color(), shown.notice.message.as_str());
                    ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                        if ui.small_button("✕").clicked() {
                            dismissed = Some(index);
                        }
                    });
                });
            }
            ui.add_space(4.0);
        });

        if let Some(index) = dismissed {
            self.client.view_mut().dismiss(index);
        }
    }
}
