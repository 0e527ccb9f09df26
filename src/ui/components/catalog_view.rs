//! Question catalog view
//!
//! Draft field, question list, edit dialog and delete confirmation.

use crate::catalog::QuestionCatalog;
use crate::ui::theme::Theme;
use egui::{self, Key, RichText};
use uuid::Uuid;

enum RowAction {
    Edit(Uuid),
    Delete(Uuid),
}

pub struct CatalogView<'a> {
    catalog: &'a mut QuestionCatalog,
    theme: &'a Theme,
}

impl<'a> CatalogView<'a> {
    pub fn new(catalog: &'a mut QuestionCatalog, theme: &'a Theme) -> Self {
        Self { catalog, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        ui.heading("Questions");
        ui.add_space(self.theme.spacing_sm);

        self.show_draft(ui);
        ui.add_space(self.theme.spacing);

        if self.catalog.is_empty() {
            ui.label(
                RichText::new("No questions yet. Add one above to start practising.")
                    .color(self.theme.text_muted)
                    .italics(),
            );
        } else {
            self.show_list(ui);
        }

        self.show_edit_dialog(ui.ctx());
        self.show_delete_dialog(ui.ctx());
    }

    fn show_draft(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let text_edit = egui::TextEdit::singleline(&mut self.catalog.draft)
                .hint_text("Add a question...")
                .desired_width(ui.available_width() - 80.0)
                .id(egui::Id::new("question_draft"));

            let response = ui.add(text_edit);
            response.widget_info(|| {
                egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, true, "New question")
            });
            let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter));

            let enabled = !self.catalog.draft.trim().is_empty();
            let add = ui.add_enabled(
                enabled,
                egui::Button::new("Add").rounding(self.theme.button_rounding),
            );
            add.widget_info(|| {
                egui::WidgetInfo::labeled(egui::WidgetType::Button, enabled, "Add question")
            });

            if add.clicked() || submitted {
                self.catalog.add_draft();
            }
        });
    }

    fn show_list(&mut self, ui: &mut egui::Ui) {
        let mut action = None;

        egui::ScrollArea::vertical()
            .id_salt("question_list")
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for question in self.catalog.questions() {
                    egui::Frame::none()
                        .fill(self.theme.bg_secondary)
                        .rounding(self.theme.card_rounding)
                        .inner_margin(self.theme.spacing_sm)
                        .show(ui, |ui| {
                            ui.horizontal(|ui| {
                                let label = ui.label(
                                    RichText::new(&question.text).color(self.theme.text_primary),
                                );
                                label.widget_info(|| {
                                    egui::WidgetInfo::labeled(
                                        egui::WidgetType::Label,
                                        true,
                                        format!("Question: {}", question.text),
                                    )
                                });

                                ui.with_layout(
                                    egui::Layout::right_to_left(egui::Align::Center),
                                    |ui| {
                                        let delete = ui.button("Delete");
                                        delete.widget_info(|| {
                                            egui::WidgetInfo::labeled(
                                                egui::WidgetType::Button,
                                                true,
                                                format!("Delete question: {}", question.text),
                                            )
                                        });
                                        if delete.clicked() {
                                            action = Some(RowAction::Delete(question.id));
                                        }

                                        let edit = ui.button("Edit");
                                        edit.widget_info(|| {
                                            egui::WidgetInfo::labeled(
                                                egui::WidgetType::Button,
                                                true,
                                                format!("Edit question: {}", question.text),
                                            )
                                        });
                                        if edit.clicked() {
                                            action = Some(RowAction::Edit(question.id));
                                        }
                                    },
                                );
                            });
                        });
                    ui.add_space(self.theme.spacing_sm / 2.0);
                }
            });

        match action {
            Some(RowAction::Edit(id)) => self.catalog.begin_edit(id),
            Some(RowAction::Delete(id)) => self.catalog.request_delete(id),
            None => {}
        }
    }

    fn show_edit_dialog(&mut self, ctx: &egui::Context) {
        let Some(edit) = self.catalog.editing_mut() else {
            return;
        };

        let mut save = false;
        let mut cancel = false;

        egui::Window::new("Edit question")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                let text = ui.add(
                    egui::TextEdit::multiline(&mut edit.text)
                        .desired_rows(3)
                        .id(egui::Id::new("question_edit")),
                );
                text.widget_info(|| {
                    egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, true, "Edit question text")
                });

                ui.horizontal(|ui| {
                    let enabled = !edit.text.trim().is_empty();
                    let save_button = ui.add_enabled(enabled, egui::Button::new("Save"));
                    save_button.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Button, enabled, "Save question")
                    });
                    save = save_button.clicked();

                    let cancel_button = ui.button("Cancel");
                    cancel_button.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Cancel edit")
                    });
                    cancel = cancel_button.clicked();
                });
            });

        if save {
            self.catalog.commit_edit();
        } else if cancel {
            self.catalog.cancel_edit();
        }
    }

    fn show_delete_dialog(&mut self, ctx: &egui::Context) {
        let Some(question) = self.catalog.pending_delete() else {
            return;
        };
        let text = question.text.clone();

        let mut confirm = false;
        let mut cancel = false;

        egui::Window::new("Delete question?")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(RichText::new(&text).strong());
                ui.label(
                    RichText::new("Recordings of this question will be deleted too.")
                        .color(self.theme.text_muted),
                );

                ui.horizontal(|ui| {
                    let delete = ui.add(
                        egui::Button::new(RichText::new("Delete").color(self.theme.text_primary))
                            .fill(self.theme.error),
                    );
                    delete.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Confirm delete")
                    });
                    confirm = delete.clicked();

                    let keep = ui.button("Cancel");
                    keep.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Cancel delete")
                    });
                    cancel = keep.clicked();
                });
            });

        if confirm {
            self.catalog.confirm_delete();
        } else if cancel {
            self.catalog.cancel_delete();
        }
    }
}
