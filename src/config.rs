//! # Configuração do Núcleo
//!
//! Parâmetros de runtime entregues ao `Kernel` na inicialização.
//! Constantes de paginação ficam em `mm::config`.

use crate::mm::VirtAddr;

// =============================================================================
// VALORES PADRÃO
// =============================================================================

/// Número máximo de CPUs suportadas
pub const MAX_CPUS: usize = 64;

/// Início da janela onde o VDSO é posicionado aleatoriamente
pub const VDSO_WINDOW_BASE: u64 = 0x0000_7F00_0000_0000;

/// Número de páginas de 4 KiB candidatas dentro da janela (1 GiB)
pub const VDSO_WINDOW_PAGES: u64 = 0x4_0000;

/// Fim (exclusivo) da metade inferior do espaço de endereçamento (canonical x86_64)
pub const USER_SPACE_END: u64 = 0x0000_8000_0000_0000;

// =============================================================================
// KERNEL CONFIG
// =============================================================================

/// Configuração do núcleo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    /// Quantidade de cores com armazenamento local
    pub max_cores: usize,
    /// Base da janela de randomização do VDSO
    pub vdso_window_base: VirtAddr,
    /// Páginas de 4 KiB na janela do VDSO
    pub vdso_window_pages: u64,
    /// Nenhum mapeamento de usuário pode terminar acima deste endereço
    pub user_space_end: VirtAddr,
}

impl KernelConfig {
    pub const fn new() -> Self {
        Self {
            max_cores: MAX_CPUS,
            vdso_window_base: VirtAddr::new(VDSO_WINDOW_BASE),
            vdso_window_pages: VDSO_WINDOW_PAGES,
            user_space_end: VirtAddr::new(USER_SPACE_END),
        }
    }

    /// Mesmo padrão, mas com `cores` CPUs.
    pub const fn with_cores(cores: usize) -> Self {
        let mut cfg = Self::new();
        cfg.max_cores = cores;
        cfg
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self::new()
    }
}
