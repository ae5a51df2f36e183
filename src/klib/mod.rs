//! # Kernel Library
//!
//! Utilitários internos sem dependência de subsistemas.

pub mod align;

#[cfg(feature = "self_test")]
pub mod test_framework;

#[cfg(feature = "self_test")]
pub use test_framework::run_self_tests;
