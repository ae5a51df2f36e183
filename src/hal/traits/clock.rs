//! Trait do relógio de alta precisão

use crate::time::Instant;

/// Relógio monotônico de alta precisão (HPET/TSC na plataforma real).
pub trait ClockHal: Send + Sync {
    /// Instante atual. Nunca retrocede.
    fn now(&self) -> Instant;
}
