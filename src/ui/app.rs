//! Main application struct and eframe integration

use crate::catalog::QuestionCatalog;
use crate::integration::{AppConfig, Services};
use crate::notice::Notice;
use crate::practice::PracticeController;
use crate::recordings::RecordingsBrowser;
use crate::storage::StorageGateway;
use crate::ui::components::{CatalogView, PracticeView, RecordingsView};
use crate::ui::theme::Theme;
use chrono::Datelike;
use egui::{self, CentralPanel, RichText, TopBottomPanel};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info};

/// How long shutdown waits for each in-flight save
const SAVE_FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Catalog,
    Practice,
    Recordings,
}

impl View {
    pub const ALL: [View; 3] = [View::Catalog, View::Practice, View::Recordings];

    pub fn title(&self) -> &'static str {
        match self {
            View::Catalog => "Questions",
            View::Practice => "Practice",
            View::Recordings => "Recordings",
        }
    }
}

pub struct MockerviewApp {
    view: View,
    catalog: QuestionCatalog,
    practice: PracticeController,
    recordings: RecordingsBrowser,
    theme: Theme,

    notices: VecDeque<Notice>,
    /// Notice on screen and the frame time it appeared
    showing: Option<(Notice, f64)>,
    notice_secs: f64,
}

impl MockerviewApp {
    pub fn new(storage: StorageGateway, services: Services, config: &AppConfig) -> Self {
        let Services {
            capabilities,
            announcer,
            microphone,
            player,
        } = services;

        let mut catalog = QuestionCatalog::new(storage.clone());
        catalog.reload();

        Self {
            view: View::default(),
            catalog,
            practice: PracticeController::new(
                storage.clone(),
                announcer,
                microphone,
                capabilities,
                config.speech.locale.clone(),
            ),
            recordings: RecordingsBrowser::new(storage, player),
            theme: Theme::dark(),
            notices: VecDeque::new(),
            showing: None,
            notice_secs: config.ui.notice_duration().as_secs_f64(),
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    pub fn practice(&self) -> &PracticeController {
        &self.practice
    }

    pub fn practice_mut(&mut self) -> &mut PracticeController {
        &mut self.practice
    }

    pub fn recordings(&self) -> &RecordingsBrowser {
        &self.recordings
    }

    /// The notice currently on screen
    pub fn current_notice(&self) -> Option<&Notice> {
        self.showing.as_ref().map(|(notice, _)| notice)
    }

    /// Navigate, stopping activity in the view being left and reloading the target
    pub fn switch_to(&mut self, view: View) {
        if view == self.view {
            return;
        }
        debug!("View {:?} -> {:?}", self.view, view);

        match self.view {
            View::Practice => self.practice.pause(),
            View::Recordings => self.recordings.stop(),
            View::Catalog => {}
        }

        match view {
            View::Catalog => self.catalog.reload(),
            View::Recordings => self.recordings.reload(),
            View::Practice => {}
        }
        self.view = view;
    }

    /// Stop everything and wait for pending saves
    pub fn shutdown(&mut self) {
        self.practice.pause();
        self.recordings.stop();
        let stored = self.practice.flush_saves(SAVE_FLUSH_TIMEOUT);
        info!("Shut down ({} pending save(s) flushed)", stored);
    }

    fn collect_notices(&mut self) {
        self.notices.extend(self.catalog.notices_mut().drain());
        self.notices.extend(self.practice.notices_mut().drain());
        self.notices.extend(self.recordings.notices_mut().drain());
    }

    fn update_snackbar(&mut self, now: f64) {
        if let Some((_, since)) = &self.showing {
            if now - since >= self.notice_secs {
                self.showing = None;
            }
        }
        if self.showing.is_none() {
            if let Some(next) = self.notices.pop_front() {
                self.showing = Some((next, now));
            }
        }
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("header")
            .frame(egui::Frame::none().fill(self.theme.bg_secondary).inner_margin(12.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("Mockerview")
                            .size(20.0)
                            .strong()
                            .color(self.theme.text_primary),
                    );
                    ui.add_space(self.theme.spacing);

                    let mut target = None;
                    for view in View::ALL {
                        let active = view == self.view;
                        let text = RichText::new(view.title()).color(if active {
                            self.theme.primary
                        } else {
                            self.theme.text_secondary
                        });
                        let response = ui.selectable_label(active, text);
                        response.widget_info(|| {
                            egui::WidgetInfo::selected(
                                egui::WidgetType::SelectableLabel,
                                true,
                                active,
                                format!("Go to {}", view.title()),
                            )
                        });
                        if response.clicked() {
                            target = Some(view);
                        }
                    }
                    if let Some(view) = target {
                        self.switch_to(view);
                    }
                });
            });
    }

    fn show_footer(&self, ctx: &egui::Context) {
        TopBottomPanel::bottom("footer")
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(8.0))
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(
                        RichText::new(format!(
                            "Mockerview © {}",
                            chrono::Local::now().year()
                        ))
                        .small()
                        .color(self.theme.text_muted),
                    );
                });
            });
    }

    fn show_content(&mut self, ctx: &egui::Context) {
        CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing_lg))
            .show(ctx, |ui| match self.view {
                View::Catalog => CatalogView::new(&mut self.catalog, &self.theme).show(ui),
                View::Practice => PracticeView::new(&mut self.practice, &self.theme).show(ui),
                View::Recordings => {
                    RecordingsView::new(&mut self.recordings, &self.theme).show(ui)
                }
            });
    }

    fn show_snackbar(&self, ctx: &egui::Context) {
        let Some((notice, _)) = &self.showing else {
            return;
        };

        egui::Area::new(egui::Id::new("snackbar"))
            .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -48.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::none()
                    .fill(self.theme.notice_color(notice.level))
                    .rounding(self.theme.button_rounding)
                    .inner_margin(egui::Margin::symmetric(self.theme.spacing, self.theme.spacing_sm))
                    .show(ui, |ui| {
                        let label = ui.label(
                            RichText::new(&notice.message).color(self.theme.text_primary),
                        );
                        label.widget_info(|| {
                            egui::WidgetInfo::labeled(
                                egui::WidgetType::Label,
                                true,
                                format!("Notice: {}", notice.message),
                            )
                        });
                    });
            });
    }

    /// Render one frame. Split from `update` so tests can drive it without eframe.
    pub fn show(&mut self, ctx: &egui::Context) {
        self.practice.poll();
        self.recordings.poll();

        self.show_header(ctx);
        self.show_footer(ctx);
        self.show_content(ctx);

        self.collect_notices();
        self.update_snackbar(ctx.input(|i| i.time));
        self.show_snackbar(ctx);

        let busy = self.practice.is_announcing()
            || self.practice.is_recording()
            || self.practice.pending_saves() > 0
            || self.recordings.playing_id().is_some()
            || self.showing.is_some();
        if busy {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

impl eframe::App for MockerviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.show(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> MockerviewApp {
        let storage = StorageGateway::in_memory();
        storage.add_question("Tell me about yourself").unwrap();
        MockerviewApp::new(storage, Services::unavailable(), &AppConfig::default())
    }

    #[test]
    fn test_catalog_is_default_view() {
        let app = app();
        assert_eq!(app.view(), View::Catalog);
        assert_eq!(app.catalog().questions().len(), 1);
    }

    #[test]
    fn test_leaving_practice_stops_activity() {
        let mut app = app();
        app.switch_to(View::Practice);
        app.practice_mut().request_question();
        assert!(app.practice().current_question().is_some());

        app.switch_to(View::Recordings);
        assert!(!app.practice().is_announcing());
        assert!(!app.practice().is_recording());
    }

    #[test]
    fn test_snackbar_queue_advances() {
        let mut app = app();
        app.notices.push_back(Notice::info("first"));
        app.notices.push_back(Notice::info("second"));

        app.update_snackbar(0.0);
        assert_eq!(app.current_notice().unwrap().message, "first");
        app.update_snackbar(1.0);
        assert_eq!(app.current_notice().unwrap().message, "first");
        app.update_snackbar(app.notice_secs + 0.1);
        assert_eq!(app.current_notice().unwrap().message, "second");
    }
}
