//! Traits do HAL
//!
//! Define as interfaces abstratas para a plataforma.

pub mod clock;
pub mod cpu;
pub mod frame;
pub mod mmu;
pub mod sched;

pub use clock::*;
pub use cpu::*;
pub use frame::*;
pub use mmu::*;
pub use sched::*;
