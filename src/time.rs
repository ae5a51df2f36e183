//! Tempo monotônico de alta precisão.
//!
//! O relógio em si (HPET, TSC, timer genérico) pertence à plataforma e é lido
//! através de `hal::ClockHal`. Aqui vive apenas o tipo de valor.

use core::fmt;

/// Nanossegundos por segundo
pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Instante monotônico em nanossegundos desde o boot.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Instant(u64);

impl Instant {
    /// Instante zero (boot)
    pub const ZERO: Instant = Instant(0);

    #[inline]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    #[inline]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Soma uma duração em nanossegundos (satura no máximo).
    #[inline]
    pub const fn add_nanos(self, nanos: u64) -> Self {
        Self(self.0.saturating_add(nanos))
    }

    /// Nanossegundos decorridos desde `earlier` (zero se `earlier` for posterior).
    #[inline]
    pub const fn saturating_since(self, earlier: Instant) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Debug for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Instant({}.{:09}s)",
            self.0 / NANOS_PER_SEC,
            self.0 % NANOS_PER_SEC
        )
    }
}
