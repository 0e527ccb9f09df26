//! Recordings browser view
//!
//! Recordings grouped by day, each with play/stop and a confirmed delete.

use crate::recordings::RecordingsBrowser;
use crate::ui::theme::Theme;
use chrono::Local;
use egui::{self, RichText};
use uuid::Uuid;

enum RowAction {
    Toggle(Uuid),
    Delete(Uuid),
}

pub struct RecordingsView<'a> {
    browser: &'a mut RecordingsBrowser,
    theme: &'a Theme,
}

impl<'a> RecordingsView<'a> {
    pub fn new(browser: &'a mut RecordingsBrowser, theme: &'a Theme) -> Self {
        Self { browser, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        self.show_delete_dialog(ui.ctx());

        ui.heading("Recordings");
        ui.add_space(self.theme.spacing_sm);

        if self.browser.is_empty() {
            ui.label(
                RichText::new("No recordings yet. Answer a question in practice to create one.")
                    .color(self.theme.text_muted)
                    .italics(),
            );
            return;
        }

        let playing = self.browser.playing_id();
        let mut action = None;

        egui::ScrollArea::vertical()
            .id_salt("recordings_list")
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for group in self.browser.groups() {
                    ui.add_space(self.theme.spacing_sm);
                    ui.label(
                        RichText::new(group.date.format("%A, %B %-d, %Y").to_string())
                            .strong()
                            .color(self.theme.text_secondary),
                    );

                    for recording in &group.recordings {
                        let question = self.browser.question_label(recording);
                        let time = recording.created_at.with_timezone(&Local).format("%H:%M");
                        let is_playing = playing == Some(recording.id);

                        egui::Frame::none()
                            .fill(self.theme.bg_secondary)
                            .rounding(self.theme.card_rounding)
                            .inner_margin(self.theme.spacing_sm)
                            .show(ui, |ui| {
                                ui.horizontal(|ui| {
                                    let (icon, label) = if is_playing {
                                        ("⏹", format!("Stop playback: {}", question))
                                    } else {
                                        ("▶", format!("Play recording: {}", question))
                                    };
                                    let toggle = ui.add(
                                        egui::Button::new(icon).rounding(self.theme.button_rounding),
                                    );
                                    toggle.widget_info(|| {
                                        egui::WidgetInfo::labeled(
                                            egui::WidgetType::Button,
                                            true,
                                            &label,
                                        )
                                    });
                                    if toggle.clicked() {
                                        action = Some(RowAction::Toggle(recording.id));
                                    }

                                    ui.label(
                                        RichText::new(time.to_string())
                                            .monospace()
                                            .color(self.theme.text_muted),
                                    );
                                    let color = if is_playing {
                                        self.theme.primary
                                    } else {
                                        self.theme.text_primary
                                    };
                                    ui.label(RichText::new(question).color(color));

                                    ui.with_layout(
                                        egui::Layout::right_to_left(egui::Align::Center),
                                        |ui| {
                                            let delete = ui.button("🗑");
                                            delete.widget_info(|| {
                                                egui::WidgetInfo::labeled(
                                                    egui::WidgetType::Button,
                                                    true,
                                                    format!("Delete recording: {}", question),
                                                )
                                            });
                                            if delete.clicked() {
                                                action = Some(RowAction::Delete(recording.id));
                                            }
                                        },
                                    );
                                });
                            });
                    }
                }
            });

        match action {
            Some(RowAction::Toggle(id)) => self.browser.toggle_playback(id),
            Some(RowAction::Delete(id)) => self.browser.request_delete(id),
            None => {}
        }
    }

    fn show_delete_dialog(&mut self, ctx: &egui::Context) {
        let Some(recording) = self.browser.pending_delete() else {
            return;
        };
        let question = self.browser.question_label(recording).to_string();
        let when = recording
            .created_at
            .with_timezone(&Local)
            .format("%B %-d, %H:%M")
            .to_string();

        let mut confirm = false;
        let mut cancel = false;

        egui::Window::new("Delete recording?")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(RichText::new(&question).strong());
                ui.label(RichText::new(&when).color(self.theme.text_muted));

                ui.horizontal(|ui| {
                    let delete = ui.add(
                        egui::Button::new(RichText::new("Delete").color(self.theme.text_primary))
                            .fill(self.theme.error),
                    );
                    delete.widget_info(|| {
                        egui::WidgetInfo::labeled(
                            egui::WidgetType::Button,
                            true,
                            "Confirm recording delete",
                        )
                    });
                    confirm = delete.clicked();

                    let keep = ui.button("Cancel");
                    keep.widget_info(|| {
                        egui::WidgetInfo::labeled(
                            egui::WidgetType::Button,
                            true,
                            "Cancel recording delete",
                        )
                    });
                    cancel = keep.clicked();
                });
            });

        if confirm {
            self.browser.confirm_delete();
        } else if cancel {
            self.browser.cancel_delete();
        }
    }
}
