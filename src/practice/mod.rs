//! Random-question practice: announce, record, persist

pub mod controller;
pub mod state;

pub use controller::PracticeController;
pub use state::{PracticeEvent, PracticePhase};
