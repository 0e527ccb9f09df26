//! Random practice view

use crate::practice::{PracticeController, PracticeEvent, PracticePhase};
use crate::ui::theme::Theme;
use egui::{self, RichText, Vec2};

pub struct PracticeView<'a> {
    practice: &'a mut PracticeController,
    theme: &'a Theme,
}

impl<'a> PracticeView<'a> {
    pub fn new(practice: &'a mut PracticeController, theme: &'a Theme) -> Self {
        Self { practice, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        ui.heading("Random practice");
        ui.add_space(self.theme.spacing);

        let event = match self.practice.phase() {
            PracticePhase::Idle => self.show_idle(ui),
            phase => self.show_question(ui, phase),
        };

        if let Some(event) = event {
            self.practice.handle(event);
        }
    }

    fn show_idle(&self, ui: &mut egui::Ui) -> Option<PracticeEvent> {
        ui.label(
            RichText::new("Get a random question from your catalog and answer it out loud.")
                .color(self.theme.text_secondary),
        );
        ui.add_space(self.theme.spacing_sm);

        let button = ui.add(
            egui::Button::new(RichText::new("Get a question").size(16.0))
                .min_size(Vec2::new(160.0, 40.0))
                .rounding(self.theme.button_rounding)
                .fill(self.theme.primary),
        );
        button.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Get random question")
        });

        button.clicked().then_some(PracticeEvent::Request)
    }

    fn show_question(&self, ui: &mut egui::Ui, phase: PracticePhase) -> Option<PracticeEvent> {
        let mut event = None;

        if let Some(question) = self.practice.current_question() {
            egui::Frame::none()
                .fill(self.theme.bg_secondary)
                .rounding(self.theme.card_rounding)
                .inner_margin(self.theme.spacing)
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    let label = ui.label(
                        RichText::new(&question.text)
                            .size(20.0)
                            .color(self.theme.text_primary),
                    );
                    label.widget_info(|| {
                        egui::WidgetInfo::labeled(
                            egui::WidgetType::Label,
                            true,
                            format!("Current question: {}", question.text),
                        )
                    });
                });
        }
        ui.add_space(self.theme.spacing_sm);

        self.show_status(ui, phase);
        ui.add_space(self.theme.spacing);

        ui.horizontal(|ui| {
            match phase {
                PracticePhase::Speaking => {
                    if self.labeled_button(ui, "Stop", "Stop announcing", true) {
                        event = Some(PracticeEvent::StopAnnouncing);
                    }
                }
                PracticePhase::Ready => {
                    if self.labeled_button(ui, "Replay", "Replay question", true) {
                        event = Some(PracticeEvent::Replay);
                    }
                    let can_record = self.practice.can_record();
                    if self.labeled_button(ui, "Record answer", "Start recording", can_record) {
                        event = Some(PracticeEvent::StartRecording);
                    }
                }
                PracticePhase::Recording => {
                    let stop = ui.add(
                        egui::Button::new(RichText::new("Stop recording").color(self.theme.text_primary))
                            .fill(self.theme.recording)
                            .rounding(self.theme.button_rounding),
                    );
                    stop.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Stop recording")
                    });
                    if stop.clicked() {
                        event = Some(PracticeEvent::StopRecording);
                    }
                }
                PracticePhase::Idle => {}
            }

            if self.labeled_button(ui, "Next question", "Next question", true) {
                event = Some(PracticeEvent::Advance);
            }
        });

        if self.practice.pending_saves() > 0 {
            ui.add_space(self.theme.spacing_sm);
            ui.label(RichText::new("Saving...").small().color(self.theme.text_muted));
        }

        event
    }

    fn show_status(&self, ui: &mut egui::Ui, phase: PracticePhase) {
        match phase {
            PracticePhase::Speaking => {
                ui.label(RichText::new("Reading the question...").color(self.theme.text_muted));
            }
            PracticePhase::Ready => {
                ui.label(
                    RichText::new("Your turn. Record your answer when you are ready.")
                        .color(self.theme.text_muted),
                );
            }
            PracticePhase::Recording => {
                ui.horizontal(|ui| {
                    let t = ui.ctx().input(|i| i.time);
                    let pulse = ((t * 3.0).sin() * 0.5 + 0.5) as f32;
                    let (rect, _) = ui.allocate_exact_size(Vec2::splat(12.0), egui::Sense::hover());
                    ui.painter().circle_filled(
                        rect.center(),
                        4.0 + pulse * 2.0,
                        self.theme.recording.gamma_multiply(0.5 + pulse * 0.5),
                    );
                    ui.label(RichText::new("Recording...").color(self.theme.recording));
                });
            }
            PracticePhase::Idle => {}
        }
    }

    fn labeled_button(&self, ui: &mut egui::Ui, text: &str, label: &str, enabled: bool) -> bool {
        let button = ui.add_enabled(
            enabled,
            egui::Button::new(text).rounding(self.theme.button_rounding),
        );
        button.widget_info(|| egui::WidgetInfo::labeled(egui::WidgetType::Button, enabled, label));
        button.clicked()
    }
}
