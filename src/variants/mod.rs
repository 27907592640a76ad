//! Variant readings and their classification

pub mod compare;
pub mod reading;

pub use compare::{calc_variant_types, VariantTypes};
pub use reading::{VariantBlock, VariantReading, VersionId};
