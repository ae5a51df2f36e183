//! Mapeamento de um VMO num VAS e o lock de faixa associado.
//!
//! O lock de faixa é exclusivo e suspende a thread atual quando contendido:
//! ela entra no fim de uma fila FIFO e chama `SchedHal::block`. Quem solta o
//! lock o passa direto para a primeira da fila (`WaitResult::Granted`), então
//! o lock nunca fica livre com threads esperando.
//!
//! Ordem de locks: `VmoMapping` → `Thread`. O scheduler é chamado fora do lock.

use super::range::AddressRange;
use crate::kernel::Kernel;
use crate::mm::types::Vmo;
use crate::mm::{MmError, MmResult};
use crate::sched::{Thread, ThreadState, WaitResult};
use crate::sync::IrqMutex;
use crate::time::Instant;
use alloc::collections::VecDeque;
use alloc::sync::Arc;
use alloc::vec::Vec;
use bitflags::bitflags;

bitflags! {
    /// Flags de um mapeamento (aceitas de userspace em `vas_map_vmo`).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct MappingFlags: u32 {
        /// Escritas são proibidas
        const READ_ONLY  = 1 << 0;
        /// Páginas executáveis
        const EXECUTABLE = 1 << 1;
    }
}

struct RangeWaiter {
    thread: Arc<Thread>,
    deadline: Option<Instant>,
}

struct RangeLockState {
    held: bool,
    /// Mapeamento saiu do VAS: ninguém mais adquire
    retired: bool,
    waiters: VecDeque<RangeWaiter>,
}

/// Um VMO colocado em uma faixa de um VAS.
///
/// Pertence ao conjunto de mapeamentos do VAS; quem opera sobre o conteúdo
/// (cópias, I/O) segura uma referência e o lock de faixa, nunca o lock do VAS.
pub struct VmoMapping {
    range: AddressRange,
    vmo: Arc<Vmo>,
    flags: MappingFlags,
    kernel: Arc<Kernel>,
    lock: IrqMutex<RangeLockState>,
}

impl VmoMapping {
    pub(crate) fn new(
        kernel: Arc<Kernel>,
        range: AddressRange,
        vmo: Arc<Vmo>,
        flags: MappingFlags,
    ) -> Self {
        Self {
            range,
            vmo,
            flags,
            kernel,
            lock: IrqMutex::new(RangeLockState {
                held: false,
                retired: false,
                waiters: VecDeque::new(),
            }),
        }
    }

    #[inline]
    pub fn range(&self) -> AddressRange {
        self.range
    }

    #[inline]
    pub fn vmo(&self) -> &Arc<Vmo> {
        &self.vmo
    }

    #[inline]
    pub fn flags(&self) -> MappingFlags {
        self.flags
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.flags.contains(MappingFlags::READ_ONLY)
    }

    pub fn is_locked(&self) -> bool {
        self.lock.lock(self.kernel.cpu()).held
    }

    pub fn is_retired(&self) -> bool {
        self.lock.lock(self.kernel.cpu()).retired
    }

    pub fn waiting_threads(&self) -> usize {
        self.lock.lock(self.kernel.cpu()).waiters.len()
    }

    // =========================================================================
    // AQUISIÇÃO
    // =========================================================================

    /// Adquire sem esperar: `Busy` se travada, `NotMapped` se aposentada.
    pub(crate) fn try_acquire(self: &Arc<Self>, write: bool) -> MmResult<RangeGuard> {
        let mut state = self.lock.lock(self.kernel.cpu());
        if state.retired {
            return Err(MmError::NotMapped);
        }
        if state.held {
            return Err(MmError::Busy);
        }
        debug_assert!(state.waiters.is_empty(), "lock de faixa livre com waiters");
        state.held = true;
        Ok(self.guard(write))
    }

    /// Adquire o lock de faixa, suspendendo a thread atual enquanto estiver
    /// travado.
    ///
    /// Com `deadline`, desiste com `TimedOut` (a expiração chega por `expire`).
    /// Se o mapeamento for aposentado durante a espera, retorna `NotMapped`.
    pub(crate) fn acquire(
        self: &Arc<Self>,
        write: bool,
        deadline: Option<Instant>,
    ) -> MmResult<RangeGuard> {
        // Sem thread atual (boot) não há o que suspender
        let Some(thread) = self.kernel.current_thread() else {
            return self.spin_acquire(write, deadline);
        };

        loop {
            {
                let mut state = self.lock.lock(self.kernel.cpu());
                if state.retired {
                    return Err(MmError::NotMapped);
                }
                if !state.held {
                    state.held = true;
                    return Ok(self.guard(write));
                }
                if deadline.is_some_and(|d| self.kernel.clock().now() >= d) {
                    return Err(MmError::TimedOut);
                }
                thread.prepare_wait();
                state.waiters.push_back(RangeWaiter {
                    thread: thread.clone(),
                    deadline,
                });
            }

            self.kernel.sched().block(&thread);

            let result = match thread.take_wait_result() {
                Some(result) => result,
                // Voltou sem evento: sai da fila e tenta de novo
                None if self.withdraw(&thread) => continue,
                None => match thread.take_wait_result() {
                    Some(result) => result,
                    None => {
                        kerror!("(VAS) range lock: thread acordada sem resultado tid=", thread.tid().as_u64());
                        panic!("wait slot empty after wake");
                    }
                },
            };

            return match result {
                WaitResult::Granted => Ok(self.guard(write)),
                WaitResult::TimedOut => Err(MmError::TimedOut),
                WaitResult::Cancelled => Err(MmError::NotMapped),
                WaitResult::Message(_) => {
                    kerror!("(VAS) range lock: acordada por mensagem tid=", thread.tid().as_u64());
                    panic!("range-lock waiter woken with a message");
                }
            };
        }
    }

    fn spin_acquire(self: &Arc<Self>, write: bool, deadline: Option<Instant>) -> MmResult<RangeGuard> {
        loop {
            match self.try_acquire(write) {
                Err(MmError::Busy) => {}
                other => return other,
            }
            if deadline.is_some_and(|d| self.kernel.clock().now() >= d) {
                return Err(MmError::TimedOut);
            }
            core::hint::spin_loop();
        }
    }

    fn guard(self: &Arc<Self>, write: bool) -> RangeGuard {
        RangeGuard {
            mapping: self.clone(),
            write,
        }
    }

    // =========================================================================
    // ESPERA
    // =========================================================================

    /// Acorda com `TimedOut` toda thread cujo prazo já passou em `now`.
    pub fn expire(&self, now: Instant) -> usize {
        let expired: Vec<Arc<Thread>> = {
            let mut state = self.lock.lock(self.kernel.cpu());
            let mut expired = Vec::new();
            state.waiters.retain(|w| match w.deadline {
                Some(deadline) if deadline <= now => {
                    expired.push(w.thread.clone());
                    false
                }
                _ => true,
            });
            expired
                .into_iter()
                .filter(|t| t.wake(WaitResult::TimedOut).is_ok())
                .collect()
        };

        let count = expired.len();
        for thread in expired {
            self.kernel.sched().schedule(thread);
        }
        count
    }

    /// Aposenta o mapeamento (saiu do VAS): waiters acordam com `Cancelled`
    /// e aquisições futuras falham. Quem segura o lock continua com ele.
    pub(crate) fn retire(&self) {
        let waiters: Vec<Arc<Thread>> = {
            let mut state = self.lock.lock(self.kernel.cpu());
            state.retired = true;
            state
                .waiters
                .drain(..)
                .map(|w| w.thread)
                .filter(|t| t.wake(WaitResult::Cancelled).is_ok())
                .collect()
        };
        for thread in waiters {
            self.kernel.sched().schedule(thread);
        }
    }

    /// Desiste da espera da própria thread: sai da fila sem passar pelo
    /// scheduler. `false` se alguém já a acordou.
    fn withdraw(&self, thread: &Arc<Thread>) -> bool {
        let mut state = self.lock.lock(self.kernel.cpu());
        let Some(pos) = state
            .waiters
            .iter()
            .position(|w| Arc::ptr_eq(&w.thread, thread))
        else {
            return false;
        };
        state.waiters.remove(pos);
        thread.set_state(ThreadState::Running);
        true
    }

    /// Solta o lock. Havendo waiter vivo, o lock passa para ele (que é
    /// devolvido para ir ao scheduler) e continua travado.
    fn release(&self) -> Option<Arc<Thread>> {
        let mut state = self.lock.lock(self.kernel.cpu());
        while let Some(waiter) = state.waiters.pop_front() {
            if waiter.thread.wake(WaitResult::Granted).is_ok() {
                return Some(waiter.thread);
            }
        }
        state.held = false;
        None
    }
}

/// Posse exclusiva da faixa de um mapeamento. Solta o lock no drop.
pub struct RangeGuard {
    mapping: Arc<VmoMapping>,
    write: bool,
}

impl RangeGuard {
    #[inline]
    pub fn range(&self) -> AddressRange {
        self.mapping.range
    }

    #[inline]
    pub fn mapping(&self) -> &Arc<VmoMapping> {
        &self.mapping
    }

    /// A faixa foi travada para escrita?
    #[inline]
    pub fn is_write(&self) -> bool {
        self.write
    }
}

impl Drop for RangeGuard {
    fn drop(&mut self) {
        if let Some(next) = self.mapping.release() {
            ktrace!("(VAS) range lock passado para tid=", next.tid().as_u64());
            self.mapping.kernel.sched().schedule(next);
        }
    }
}
