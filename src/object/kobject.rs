//! Kernel Object Base
//!
//! Definição base para Objetos do Kernel (Kernel Objects).
//! Todo recurso gerenciável via Handle (Processo, Thread, VAS, VMO, Mailbox)
//! implementa o trait `KObject`.
//!
//! - IDs únicos globais (KOID), nunca reutilizados.
//! - Ciclo de vida via `Arc`: o objeto morre com a última referência.

use core::sync::atomic::{AtomicU64, Ordering};

/// Kernel Object ID
pub type Koid = u64;

/// Gerador de KOIDs (0 é reservado para "nenhum objeto")
static KOID_GENERATOR: AtomicU64 = AtomicU64::new(1);

/// Gera um novo KOID único
pub fn generate_koid() -> Koid {
    KOID_GENERATOR.fetch_add(1, Ordering::Relaxed)
}

/// Trait base que todos os objetos do kernel gerenciáveis devem implementar.
pub trait KObject: Send + Sync {
    /// Retorna o ID único do objeto.
    fn koid(&self) -> Koid;

    /// Retorna o nome do tipo do objeto (para debug/diagnóstico).
    fn type_name(&self) -> &'static str;
}
