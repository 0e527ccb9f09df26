pub mod channels;

pub use channels::{pending, Pending, Resolver};
