//! Context resolution over event lists

pub mod sweep;

pub use sweep::{edit_requires_resweep, ContextSweep, SweepReport};
