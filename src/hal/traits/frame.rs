//! Trait de alocação de frames físicos
//!
//! A política do alocador (buddy, zonas, NUMA) é da plataforma. O núcleo só
//! pede frames para o commit sob demanda de VMOs esparsos.

use crate::mm::PhysAddr;

pub trait FrameHal: Send + Sync {
    /// Aloca um frame zerado de `page_size` bytes, alinhado ao próprio tamanho.
    fn allocate(&self, page_size: u64) -> Option<PhysAddr>;

    /// Devolve um frame obtido com `allocate`.
    fn free(&self, frame: PhysAddr, page_size: u64);
}
