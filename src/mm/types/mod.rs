//! # Tipos de Memória
//!
//! - **Vmo**: Virtual Memory Object, o descritor de memória de apoio que um
//!   VAS mapeia (físico contíguo ou esparso).

pub mod vmo;

pub use vmo::{Lookup, SparseElement, Vmo};
