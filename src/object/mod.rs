//! # Object - Sistema de Objetos do Kernel
//!
//! Inspirado no Zircon (Fuchsia). Todos os recursos são objetos, e userspace só
//! os alcança por tokens opacos que a tabela de capabilities do processo
//! converte em `Handle`s com direitos.
//!
//! ```text
//! Token (u64, por processo) ──► CapabilityTable ──► Arc<Handle> ──► KernelObject
//!                                                    (Rights)        (Process, VAS, ...)
//! ```

pub mod error;
pub mod handle;
pub mod kobject;
pub mod rights;
pub mod table;
pub mod token;

pub use error::{CapError, CapResult};
pub use handle::{Handle, KernelObject};
pub use kobject::{generate_koid, KObject, Koid};
pub use rights::Rights;
pub use table::CapabilityTable;
pub use token::Token;
