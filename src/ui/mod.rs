//! GUI implementation with egui/eframe
//!
//! A header navigates between the question catalog, random practice and the
//! recordings browser. Notices from all three appear in a snackbar.

mod app;
mod components;
mod theme;

pub use app::{MockerviewApp, View};
pub use components::{CatalogView, PracticeView, RecordingsView};
pub use theme::Theme;

use crate::integration::{AppConfig, Services};
use crate::storage::StorageGateway;

/// Run the Mockerview application
pub fn run(config: AppConfig, storage: StorageGateway, services: Services) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 700.0])
            .with_min_inner_size([600.0, 400.0])
            .with_title("Mockerview"),
        ..Default::default()
    };

    eframe::run_native(
        "Mockerview",
        options,
        Box::new(move |cc| {
            let app = MockerviewApp::new(storage, services, &config);
            app.theme().apply(&cc.egui_ctx);
            Ok(Box::new(app))
        }),
    )
}
