//! Trait de CPU

/// Identificador de um core (índice no armazenamento core-local)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct CoreId(pub u32);

impl CoreId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Abstração de CPU
pub trait CpuHal: Send + Sync {
    /// Retorna o core que está executando o chamador
    fn current_core(&self) -> CoreId;

    /// Interrupções estão habilitadas neste core?
    fn interrupts_enabled(&self) -> bool;

    /// Desabilita interrupções no core atual
    fn disable_interrupts(&self);

    /// Habilita interrupções no core atual
    fn enable_interrupts(&self);

    /// Entropia de hardware (RDRAND ou equivalente)
    fn random_u64(&self) -> u64;
}
