//! # Mailbox
//!
//! Duas filas FIFO drenadas uma contra a outra: mensagens pendentes e threads
//! esperando. Nunca as duas ficam não-vazias ao mesmo tempo, então nenhuma
//! thread dorme com mensagem disponível.
//!
//! Ordem de locks: `Mailbox` → `Thread`. O scheduler é chamado fora do lock.

use super::error::{IpcError, IpcResult, SendError};
use super::message::Message;
use crate::kernel::Kernel;
use crate::object::{generate_koid, KObject, Koid};
use crate::sched::{Thread, ThreadState, WaitResult};
use crate::sync::IrqMutex;
use crate::time::Instant;
use alloc::collections::VecDeque;
use alloc::sync::Arc;
use alloc::vec::Vec;

struct Waiter {
    thread: Arc<Thread>,
    deadline: Option<Instant>,
}

struct MailboxInner {
    queue: VecDeque<Message>,
    waiters: VecDeque<Waiter>,
    closed: bool,
}

impl MailboxInner {
    #[inline]
    fn check_drained(&self) {
        debug_assert!(
            self.queue.is_empty() || self.waiters.is_empty(),
            "mailbox com mensagens e waiters ao mesmo tempo"
        );
    }
}

/// Resultado imediato de `receive`
#[derive(Debug)]
pub enum Receive {
    /// Havia mensagem na fila
    Message(Message),
    /// A thread entrou na fila de espera; o chamador deve suspendê-la
    Blocked,
}

pub struct Mailbox {
    koid: Koid,
    kernel: Arc<Kernel>,
    inner: IrqMutex<MailboxInner>,
}

impl Mailbox {
    pub(crate) fn new(kernel: Arc<Kernel>) -> Self {
        Self {
            koid: generate_koid(),
            kernel,
            inner: IrqMutex::new(MailboxInner {
                queue: VecDeque::new(),
                waiters: VecDeque::new(),
                closed: false,
            }),
        }
    }

    /// Envia `message`. Se houver thread esperando, a primeira da fila recebe
    /// a mensagem diretamente e é entregue ao scheduler.
    ///
    /// Num mailbox fechado a mensagem volta em `SendError`.
    pub fn send(&self, message: Message) -> Result<(), SendError> {
        let woken = {
            let mut inner = self.inner.lock(self.kernel.cpu());
            if inner.closed {
                return Err(SendError {
                    kind: IpcError::Closed,
                    message,
                });
            }

            let mut message = message;
            let woken = loop {
                let Some(waiter) = inner.waiters.pop_front() else {
                    inner.queue.push_back(message);
                    break None;
                };
                match waiter.thread.wake(WaitResult::Message(message)) {
                    Ok(()) => break Some(waiter.thread),
                    // Thread já saiu (processo terminou): tenta a próxima
                    Err(WaitResult::Message(returned)) => message = returned,
                    Err(_) => {
                        kerror!("(IPC) send: wake devolveu resultado diferente do entregue");
                        panic!("mailbox wake returned a foreign result");
                    }
                }
            };
            inner.check_drained();
            woken
        };

        if let Some(thread) = woken {
            ktrace!("(IPC) send: entregue direto para tid=", thread.tid().as_u64());
            self.kernel.sched().schedule(thread);
        }
        Ok(())
    }

    /// Recebe para `thread`.
    ///
    /// Sem mensagem na fila, a thread entra em `Blocked` no fim da fila de
    /// espera com o prazo opcional `deadline`, e o chamador deve suspendê-la
    /// (`SchedHal::block`) depois de retornar daqui, já fora do lock.
    pub fn receive(&self, thread: &Arc<Thread>, deadline: Option<Instant>) -> IpcResult<Receive> {
        let mut inner = self.inner.lock(self.kernel.cpu());
        if let Some(message) = inner.queue.pop_front() {
            return Ok(Receive::Message(message));
        }
        if inner.closed {
            return Err(IpcError::Closed);
        }

        thread.prepare_wait();
        inner.waiters.push_back(Waiter {
            thread: thread.clone(),
            deadline,
        });
        inner.check_drained();
        Ok(Receive::Blocked)
    }

    /// Acorda com `TimedOut` toda thread cujo prazo já passou em `now`.
    pub fn expire(&self, now: Instant) -> usize {
        let expired: Vec<Arc<Thread>> = {
            let mut inner = self.inner.lock(self.kernel.cpu());
            let mut expired = Vec::new();
            inner.waiters.retain(|w| match w.deadline {
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

    /// Tira `thread` da fila de espera e a acorda com `Cancelled`.
    pub fn cancel(&self, thread: &Arc<Thread>) -> bool {
        let removed = {
            let mut inner = self.inner.lock(self.kernel.cpu());
            Self::remove_waiter(&mut *inner, thread)
                && thread.wake(WaitResult::Cancelled).is_ok()
        };
        if removed {
            self.kernel.sched().schedule(thread.clone());
        }
        removed
    }

    /// Desiste da espera da própria thread (em execução): sai da fila sem
    /// passar pelo scheduler. `false` se alguém já a acordou.
    pub(crate) fn withdraw(&self, thread: &Arc<Thread>) -> bool {
        let mut inner = self.inner.lock(self.kernel.cpu());
        if !Self::remove_waiter(&mut *inner, thread) {
            return false;
        }
        thread.set_state(ThreadState::Running);
        true
    }

    /// Fecha o mailbox: waiters acordam com `Cancelled`, mensagens pendentes
    /// são descartadas (e seus handles soltos).
    pub fn close(&self) {
        let (waiters, dropped) = {
            let mut inner = self.inner.lock(self.kernel.cpu());
            inner.closed = true;
            let waiters: Vec<Arc<Thread>> = inner
                .waiters
                .drain(..)
                .map(|w| w.thread)
                .filter(|t| t.wake(WaitResult::Cancelled).is_ok())
                .collect();
            let dropped: Vec<Message> = inner.queue.drain(..).collect();
            (waiters, dropped)
        };

        drop(dropped);
        for thread in waiters {
            self.kernel.sched().schedule(thread);
        }
        kdebug!("(IPC) mailbox fechado koid=", self.koid);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock(self.kernel.cpu()).closed
    }

    pub fn pending_messages(&self) -> usize {
        self.inner.lock(self.kernel.cpu()).queue.len()
    }

    pub fn waiting_threads(&self) -> usize {
        self.inner.lock(self.kernel.cpu()).waiters.len()
    }

    fn remove_waiter(inner: &mut MailboxInner, thread: &Arc<Thread>) -> bool {
        match inner
            .waiters
            .iter()
            .position(|w| Arc::ptr_eq(&w.thread, thread))
        {
            Some(pos) => {
                inner.waiters.remove(pos);
                true
            }
            None => false,
        }
    }
}

impl KObject for Mailbox {
    fn koid(&self) -> Koid {
        self.koid
    }

    fn type_name(&self) -> &'static str {
        "Mailbox"
    }
}
