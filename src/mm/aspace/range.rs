//! Faixa de endereços `[start, end)`, chave ordenada dos mapeamentos de um VAS.

use crate::mm::VirtAddr;
use core::fmt;

/// Intervalo semiaberto de endereços virtuais.
///
/// Ordenado por `start` e depois por `end`. Dentro de um VAS as faixas nunca se
/// sobrepõem, então a ordem por `start` basta para buscas.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AddressRange {
    start: VirtAddr,
    end: VirtAddr,
}

impl AddressRange {
    /// `start <= end` é responsabilidade do chamador.
    #[inline]
    pub const fn new(start: VirtAddr, end: VirtAddr) -> Self {
        Self { start, end }
    }

    #[inline]
    pub const fn start(&self) -> VirtAddr {
        self.start
    }

    #[inline]
    pub const fn end(&self) -> VirtAddr {
        self.end
    }

    #[inline]
    pub const fn len(&self) -> u64 {
        self.end.as_u64() - self.start.as_u64()
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.end.as_u64() == self.start.as_u64()
    }

    #[inline]
    pub fn contains(&self, addr: VirtAddr) -> bool {
        addr >= self.start && addr < self.end
    }

    #[inline]
    pub fn overlaps(&self, other: &AddressRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Debug for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#x}, {:#x})", self.start.as_u64(), self.end.as_u64())
    }
}
