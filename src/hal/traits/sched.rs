//! Trait do scheduler
//!
//! Seleção de run-queue e política de preempção são da plataforma. O núcleo
//! apenas entrega threads prontas e pede a suspensão da thread atual.

use crate::sched::Thread;
use alloc::sync::Arc;

pub trait SchedHal: Send + Sync {
    /// Entrega uma thread pronta para despacho (fire-and-forget).
    fn schedule(&self, thread: Arc<Thread>);

    /// Suspende a thread chamadora até que alguém a entregue via `schedule`.
    ///
    /// Deve retornar imediatamente se a thread já não estiver `Blocked`
    /// (o despertar pode ter acontecido antes da suspensão).
    fn block(&self, thread: &Arc<Thread>);
}
