//! Estados de thread

/// Estado de uma thread
///
/// ```text
/// Created ──► Ready ──► Running ⇄ Blocked
///                          │         │
///                          └─► Exited ◄┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    /// Recém criada, contexto ainda sendo montado
    Created,
    /// Entregue ao scheduler
    Ready,
    /// Executando em algum core
    Running,
    /// Esperando um evento (mensagem, lock de faixa, timeout)
    Blocked,
    /// Terminou (ou o processo terminou)
    Exited,
}

impl ThreadState {
    /// Verifica se pode ser escalonada
    pub const fn is_runnable(self) -> bool {
        matches!(self, Self::Ready | Self::Running)
    }
}
