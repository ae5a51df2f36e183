//! Seções críticas com interrupções mascaradas.

use crate::hal::CpuHal;
use core::ops::{Deref, DerefMut};

/// Desabilita interrupções no core atual enquanto viver.
///
/// Restaura o estado anterior no drop, então guards aninhados funcionam.
pub struct InterruptGuard<'a> {
    cpu: &'a dyn CpuHal,
    interrupts_were_enabled: bool,
}

impl<'a> InterruptGuard<'a> {
    pub fn new(cpu: &'a dyn CpuHal) -> Self {
        let interrupts_were_enabled = cpu.interrupts_enabled();
        cpu.disable_interrupts();
        Self {
            cpu,
            interrupts_were_enabled,
        }
    }
}

impl Drop for InterruptGuard<'_> {
    fn drop(&mut self) {
        if self.interrupts_were_enabled {
            self.cpu.enable_interrupts();
        }
    }
}

/// `spin::Mutex` que só pode ser adquirido com interrupções mascaradas.
pub struct IrqMutex<T> {
    inner: spin::Mutex<T>,
}

impl<T> IrqMutex<T> {
    pub const fn new(data: T) -> Self {
        Self {
            inner: spin::Mutex::new(data),
        }
    }

    /// Mascara IRQs no core atual e então adquire o lock (spin).
    pub fn lock<'a>(&'a self, cpu: &'a dyn CpuHal) -> IrqMutexGuard<'a, T> {
        let irq = InterruptGuard::new(cpu);
        let guard = self.inner.lock();
        IrqMutexGuard { guard, _irq: irq }
    }

    /// Tenta adquirir sem girar. As interrupções são restauradas se falhar.
    pub fn try_lock<'a>(&'a self, cpu: &'a dyn CpuHal) -> Option<IrqMutexGuard<'a, T>> {
        let irq = InterruptGuard::new(cpu);
        let guard = self.inner.try_lock()?;
        Some(IrqMutexGuard { guard, _irq: irq })
    }

    /// Acesso exclusivo sem lock (`&mut self` já garante unicidade, ex.: em `Drop`).
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }
}

/// Guard do `IrqMutex`.
///
/// A ordem dos campos importa: o lock é solto antes das interrupções voltarem.
pub struct IrqMutexGuard<'a, T> {
    guard: spin::MutexGuard<'a, T>,
    _irq: InterruptGuard<'a>,
}

impl<T> Deref for IrqMutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for IrqMutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}
