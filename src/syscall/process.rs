//! Syscalls de Processo

use super::abi::token_arg;
use super::error::{SysError, SysResult};
use super::token::{register, resolve_process, resolve_vas};
use crate::mm::VirtAddr;
use crate::object::{KernelObject, Rights};
use crate::sched::Thread;
use alloc::sync::Arc;

/// Cria um processo sobre o VAS de `vas_token`.
///
/// # Syscall
/// `SYS_PROCESS_CREATE (0x01)` - Args: (vas_token)
pub fn sys_process_create(thread: &Arc<Thread>, vas_token: usize) -> SysResult<usize> {
    let caller = thread.process();
    let vas = resolve_vas(caller, token_arg(vas_token), Rights::empty())?;

    let kernel = caller.kernel();
    let process = kernel.create_process(vas);
    let handle = kernel.create_handle(KernelObject::Process(process), Rights::ALL);
    register(caller, handle)
}

/// Inicia o processo de `process_token`.
///
/// O handle de `bootstrap_token` (com `TRANSFER`) sai da tabela do chamador e
/// chega à thread inicial como argumento 0.
///
/// # Syscall
/// `SYS_PROCESS_START (0x02)` - Args: (process_token, entry, stack, bootstrap_token)
pub fn sys_process_start(
    thread: &Arc<Thread>,
    process_token: usize,
    entry: usize,
    stack: usize,
    bootstrap_token: usize,
) -> SysResult<usize> {
    let caller = thread.process();
    let target = resolve_process(caller, token_arg(process_token), Rights::empty())?;

    let user_end = caller.kernel().config().user_space_end;
    let entry = VirtAddr::new(entry as u64);
    let stack = VirtAddr::new(stack as u64);
    if entry >= user_end || stack > user_end {
        return Err(SysError::InvalidArguments);
    }

    target.start(caller, token_arg(bootstrap_token), entry, stack)?;
    Ok(0)
}
