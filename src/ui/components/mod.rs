//! The three views of the shell

mod catalog_view;
mod practice_view;
mod recordings_view;

pub use catalog_view::CatalogView;
pub use practice_view::PracticeView;
pub use recordings_view::RecordingsView;
