//! Syscalls de IPC (Mailbox)
//!
//! A mensagem carrega um handle: o send tira o token da tabela do remetente e
//! o receive registra o handle na tabela do receptor com um token novo.

use super::abi::token_arg;
use super::error::{SysError, SysResult};
use super::token::{register, resolve, resolve_mailbox};
use crate::ipc::{Message, Receive};
use crate::object::{KObject, KernelObject, Rights};
use crate::sched::{Thread, WaitResult};
use alloc::sync::Arc;

/// Cria um mailbox.
///
/// # Syscall
/// `SYS_MAILBOX_CREATE (0x30)` - Args: nenhum
pub fn sys_mailbox_create(thread: &Arc<Thread>) -> SysResult<usize> {
    let caller = thread.process();
    let kernel = caller.kernel();

    let mailbox = kernel.create_mailbox();
    let handle = kernel.create_handle(KernelObject::Mailbox(mailbox), Rights::ALL);
    register(caller, handle)
}

/// Envia o handle de `payload_token` (exige `TRANSFER`) ao mailbox (exige `WRITE`).
///
/// # Syscall
/// `SYS_MAILBOX_SEND (0x31)` - Args: (mailbox_token, payload_token)
pub fn sys_mailbox_send(
    thread: &Arc<Thread>,
    mailbox_token: usize,
    payload_token: usize,
) -> SysResult<usize> {
    let caller = thread.process();
    let mailbox = resolve_mailbox(caller, token_arg(mailbox_token), Rights::WRITE)?;
    let payload = token_arg(payload_token);
    resolve(caller, payload, Rights::TRANSFER)?;

    let handle = caller.unregister_token(payload)?;
    if let Err(refused) = mailbox.send(Message::new(handle, caller.koid())) {
        // Mailbox fechado não consome o payload: volta sob o mesmo token
        caller.restore_token(payload, refused.message.into_payload())?;
        return Err(refused.kind.into());
    }
    Ok(0)
}

/// Recebe um handle do mailbox (exige `READ`).
///
/// Fila vazia bloqueia a thread até um send, o prazo (`timeout_ns` > 0),
/// um cancelamento ou o fechamento do mailbox.
///
/// # Syscall
/// `SYS_MAILBOX_RECEIVE (0x32)` - Args: (mailbox_token, timeout_ns)
pub fn sys_mailbox_receive(
    thread: &Arc<Thread>,
    mailbox_token: usize,
    timeout_ns: usize,
) -> SysResult<usize> {
    let caller = thread.process();
    let kernel = caller.kernel();
    let mailbox = resolve_mailbox(caller, token_arg(mailbox_token), Rights::READ)?;

    let deadline = match timeout_ns {
        0 => None,
        ns => Some(kernel.clock().now().add_nanos(ns as u64)),
    };

    let message = match mailbox.receive(thread, deadline)? {
        Receive::Message(message) => message,
        Receive::Blocked => {
            kernel.sched().block(thread);
            let result = match thread.take_wait_result() {
                Some(result) => result,
                None => {
                    // Voltou sem evento: desiste da espera
                    if mailbox.withdraw(thread) {
                        return Err(SysError::WouldBlock);
                    }
                    match thread.take_wait_result() {
                        Some(result) => result,
                        None => {
                            kerror!("(Syscall) receive: thread acordada sem resultado tid=", thread.tid().as_u64());
                            panic!("wait slot empty after wake");
                        }
                    }
                }
            };
            match result {
                WaitResult::Message(message) => message,
                WaitResult::TimedOut => return Err(SysError::TimedOut),
                WaitResult::Cancelled => return Err(SysError::Cancelled),
                WaitResult::Granted => {
                    kerror!("(Syscall) receive: acordada por lock de faixa tid=", thread.tid().as_u64());
                    panic!("mailbox waiter woken with a range-lock grant");
                }
            }
        }
    };

    ktrace!("(Syscall) receive: remetente koid=", message.sender());
    register(caller, message.into_payload())
}
