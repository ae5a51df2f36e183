//! # Memory Management Subsystem (MM)
//!
//! Memória virtual do ponto de vista dos processos: VMOs descrevem a memória
//! de apoio, VAS a posicionam.
//!
//! ## 🏗️ Arquitetura dos Módulos
//!
//! | Módulo   | Responsabilidade                                          |
//! |----------|-----------------------------------------------------------|
//! | `addr`   | `PhysAddr` / `VirtAddr` type-safe                         |
//! | `config` | Tamanhos de página por nível de alinhamento               |
//! | `types`  | `Vmo` (físico contíguo ou esparso)                        |
//! | `aspace` | `Vas`, mapeamentos, faixas e locks de faixa               |
//! | `fault`  | Page fault → commit sob demanda                           |
//!
//! Tabelas de páginas e frames físicos são da plataforma (`hal::MmuHal`,
//! `hal::FrameHal`); este módulo só decide *o que* mapear e *onde*.
//!
//! ```text
//! Vmo ──(map_vmo)──► VmoMapping ──► Vas.mappings ──► MmuHal::map_physical
//! ```

pub mod addr;
pub mod aspace;
pub mod config;
pub mod error;
pub mod fault;
pub mod types;

#[cfg(feature = "self_test")]
pub mod test;

pub use addr::{PhysAddr, VirtAddr};
pub use aspace::{AddressRange, MappingFlags, RangeGuard, Vas, VmoMapping};
pub use error::{MmError, MmResult};
pub use types::{SparseElement, Vmo};
