//! # Synchronization Primitives
//!
//! Todo objeto dono de estado (Process, VAS, Mailbox) carrega o próprio lock.
//! Não existe lock global do kernel.
//!
//! ## Regras
//!
//! - Caminhos alcançáveis por handlers de interrupção mascaram IRQs no core
//!   atual ANTES de adquirir o lock (`IrqMutex`). Um handler no mesmo core
//!   nunca reentra e trava contra si mesmo.
//! - Locks são não-reentrantes e nunca ficam presos através de uma suspensão.
//! - Ordem de aquisição: Mailbox → Process. Nunca dois Process ao mesmo tempo.

/// Guard de interrupções + mutex com IRQs mascaradas
pub mod irq;

pub use irq::{InterruptGuard, IrqMutex, IrqMutexGuard};
