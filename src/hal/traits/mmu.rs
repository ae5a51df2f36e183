//! Trait de MMU
//!
//! Instalação de traduções nas tabelas de páginas de um espaço de
//! endereçamento identificado pelo seu ASID (endereço físico da tabela de topo).

use crate::mm::aspace::MappingFlags;
use crate::mm::{MmResult, PhysAddr, VirtAddr};

pub trait MmuHal: Send + Sync {
    /// Cria uma nova tabela de topo compartilhando a metade superior (kernel).
    fn clone_upper_half(&self) -> MmResult<PhysAddr>;

    /// Libera a tabela de topo e todas as tabelas intermediárias da metade inferior.
    fn release_asid(&self, asid: PhysAddr);

    /// Mapeia `[start, end)` linearmente a partir de `phys`.
    fn map_physical(
        &self,
        asid: PhysAddr,
        start: VirtAddr,
        end: VirtAddr,
        phys: PhysAddr,
        flags: MappingFlags,
    ) -> MmResult<()>;

    /// Remove as traduções de `[start, end)` (páginas ausentes são ignoradas).
    fn unmap_range(&self, asid: PhysAddr, start: VirtAddr, end: VirtAddr);

    /// Tradução instalada para `virt`, se houver.
    fn translate(&self, asid: PhysAddr, virt: VirtAddr) -> Option<PhysAddr>;
}
