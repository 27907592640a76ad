//! Utility modules for the mensural engine

pub mod math;

pub use math::{gcd, lcm};
