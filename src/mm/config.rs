//! # Configuração do Módulo de Memória
//!
//! Constantes de paginação. Os tamanhos seguem a hierarquia x86_64:
//! nível 0 = página de 4 KiB, nível 1 = 2 MiB, nível 2 = 1 GiB.

/// Tamanho de uma página (4 KiB)
pub const PAGE_SIZE: u64 = 4096;

/// Tamanho de uma huge page (2 MiB)
pub const HUGE_PAGE_SIZE: u64 = 2 * 1024 * 1024;

/// Tamanho de uma giant page (1 GiB)
pub const GIANT_PAGE_SIZE: u64 = 1024 * 1024 * 1024;

/// Tamanhos de página suportados, indexados pelo nível de alinhamento
pub const PAGE_SIZES: [u64; 3] = [PAGE_SIZE, HUGE_PAGE_SIZE, GIANT_PAGE_SIZE];

/// Bits de offset dentro de uma página
pub const PAGE_OFFSET_BITS: u32 = 12;

/// Tamanho de página para um nível de alinhamento, `None` se o nível não existe.
#[inline]
pub const fn page_size_for_level(level: usize) -> Option<u64> {
    if level < PAGE_SIZES.len() {
        Some(PAGE_SIZES[level])
    } else {
        None
    }
}
