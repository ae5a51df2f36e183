//! # Funções de Alinhamento de Endereços
//!
//! Funções utilitárias para alinhamento de endereços físicos e virtuais.
//! `align` deve ser potência de dois.

/// Alinha um valor para cima ao próximo múltiplo de `align`.
#[inline(always)]
pub const fn align_up_u64(val: u64, align: u64) -> u64 {
    (val + align - 1) & !(align - 1)
}

/// Alinha um valor para baixo ao múltiplo anterior de `align`.
#[inline(always)]
pub const fn align_down_u64(val: u64, align: u64) -> u64 {
    val & !(align - 1)
}

/// Verifica se um valor está alinhado a `align`.
#[inline(always)]
pub const fn is_aligned_u64(val: u64, align: u64) -> bool {
    val & (align - 1) == 0
}
