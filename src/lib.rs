//! Anvil - Núcleo de processos, memória virtual e capabilities do Redstone OS.
//!
//! Ponto central de exportação dos módulos do núcleo.
//!
//! O Anvil não sobe CPUs nem programa timers: recebe a plataforma pronta através
//! dos traits de `hal` e constrói em cima dela processos, espaços de endereçamento,
//! tabelas de capabilities e mailboxes.

#![cfg_attr(not(test), no_std)]

// Habilitar alocação dinâmica (necessário para Vec/Box/Arc/BTreeMap)
extern crate alloc;

// --- Infraestrutura ---
#[macro_use]
pub mod logging; // Macros kerror!/kwarn!/kinfo!/kdebug!/ktrace!
pub mod config; // KernelConfig
pub mod hal; // Traits da plataforma (CPU, MMU, Clock, Frames, Scheduler)
pub mod klib; // Utilitários (alinhamento, self-tests)
pub mod sync; // Locks com interrupções mascaradas
pub mod time; // Instant monotônico

// --- Núcleo ---
pub mod ipc; // Mailboxes
pub mod kernel; // Registro global explícito (Kernel)
pub mod mm; // VMOs, VAS, mapeamentos
pub mod object; // KObject, Handle, Rights, Token, CapabilityTable
pub mod sched; // Processos e threads
pub mod syscall; // Fronteira com userspace

pub use crate::kernel::Kernel;
pub use crate::object::{Handle, Rights, Token};
