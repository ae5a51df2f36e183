//! Thread Control Block
//!
//! Uma thread pertence a exatamente um processo e o mantém vivo (`Arc`).

use super::context::ThreadContext;
use super::process::Process;
use super::state::ThreadState;
use crate::ipc::Message;
use crate::object::{generate_koid, KObject, Koid};
use crate::sync::IrqMutex;
use crate::time::Instant;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicU64, Ordering};

/// Thread ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Tid(u64);

impl Tid {
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// Task ID counter
static NEXT_TID: AtomicU64 = AtomicU64::new(1);

/// Como terminou a última espera da thread
#[derive(Debug)]
pub enum WaitResult {
    /// Mensagem entregue diretamente por um `send`
    Message(Message),
    /// Prazo expirou
    TimedOut,
    /// Espera cancelada (mailbox fechado, mapeamento removido ou cancelamento explícito)
    Cancelled,
    /// Lock de faixa passado diretamente por quem o soltou
    Granted,
}

struct ThreadInner {
    state: ThreadState,
    context: ThreadContext,
    wait: Option<WaitResult>,
}

pub struct Thread {
    koid: Koid,
    tid: Tid,
    process: Arc<Process>,
    created_at: Instant,
    inner: IrqMutex<ThreadInner>,
}

impl Thread {
    /// Só `Process::create_thread` constrói threads.
    pub(super) fn new(process: Arc<Process>, created_at: Instant) -> Self {
        Self {
            koid: generate_koid(),
            tid: Tid(NEXT_TID.fetch_add(1, Ordering::Relaxed)),
            process,
            created_at,
            inner: IrqMutex::new(ThreadInner {
                state: ThreadState::Created,
                context: ThreadContext::new(),
                wait: None,
            }),
        }
    }

    #[inline]
    pub fn tid(&self) -> Tid {
        self.tid
    }

    #[inline]
    pub fn process(&self) -> &Arc<Process> {
        &self.process
    }

    /// Timestamp do relógio de alta precisão na criação
    #[inline]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn state(&self) -> ThreadState {
        self.inner.lock(self.process.kernel().cpu()).state
    }

    pub fn set_state(&self, state: ThreadState) {
        self.inner.lock(self.process.kernel().cpu()).state = state;
    }

    /// Cópia do contexto atual
    pub fn context(&self) -> ThreadContext {
        self.inner.lock(self.process.kernel().cpu()).context
    }

    /// Altera o contexto sob o lock da thread.
    pub fn update_context<R>(&self, f: impl FnOnce(&mut ThreadContext) -> R) -> R {
        f(&mut self.inner.lock(self.process.kernel().cpu()).context)
    }

    // =========================================================================
    // ESPERA
    // =========================================================================

    /// Entra em `Blocked` com o slot de espera vazio.
    pub(crate) fn prepare_wait(&self) {
        let mut inner = self.inner.lock(self.process.kernel().cpu());
        inner.state = ThreadState::Blocked;
        inner.wait = None;
    }

    /// Acorda a thread com `result` se ela ainda estiver bloqueada.
    ///
    /// Devolve `result` em `Err` se outro evento já a acordou.
    pub(crate) fn wake(&self, result: WaitResult) -> Result<(), WaitResult> {
        let mut inner = self.inner.lock(self.process.kernel().cpu());
        if inner.state != ThreadState::Blocked {
            return Err(result);
        }
        inner.wait = Some(result);
        inner.state = ThreadState::Ready;
        Ok(())
    }

    /// Retira o resultado da última espera.
    pub(crate) fn take_wait_result(&self) -> Option<WaitResult> {
        self.inner.lock(self.process.kernel().cpu()).wait.take()
    }
}

impl KObject for Thread {
    fn koid(&self) -> Koid {
        self.koid
    }

    fn type_name(&self) -> &'static str {
        "Thread"
    }
}

impl core::fmt::Debug for Thread {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Thread")
            .field("tid", &self.tid)
            .field("process", &self.process.koid())
            .finish()
    }
}
