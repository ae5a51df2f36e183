//! Dispatcher Central de Syscalls
//!
//! Ponto de entrada único para todas as syscalls. Resolve a thread chamadora
//! pelo armazenamento core-local e roteia pelo número da syscall.

use super::abi::SyscallArgs;
use super::error::{result_to_isize, SysError, SysResult};
use super::numbers::*;
use crate::kernel::Kernel;
use crate::sched::Thread;
use alloc::sync::Arc;

/// Executa a syscall descrita em `args` em nome da thread atual do core.
///
/// Retorno no formato de RAX: valor não-negativo em sucesso, `-código` em erro.
pub fn syscall_dispatcher(kernel: &Kernel, args: &SyscallArgs) -> isize {
    let Some(thread) = kernel.current_thread() else {
        kerror!("(Syscall) syscall sem thread atual num=", args.num);
        panic!("syscall without current thread");
    };

    ktrace!("(Syscall) num=", args.num);

    let result = dispatch(&thread, args);
    if let Err(e) = result {
        ktrace!("(Syscall) Erro na syscall num=", args.num);
        ktrace!(e.as_str());
    }
    result_to_isize(result)
}

/// Despacha syscall para o handler correto.
fn dispatch(thread: &Arc<Thread>, args: &SyscallArgs) -> SysResult<usize> {
    match args.num {
        // === Processo ===
        SYS_PROCESS_CREATE => super::process::sys_process_create(thread, args.arg1),
        SYS_PROCESS_START => {
            super::process::sys_process_start(thread, args.arg1, args.arg2, args.arg3, args.arg4)
        }

        // === Memória ===
        SYS_VAS_CREATE => super::memory::sys_vas_create(thread),
        SYS_VAS_MAP_VMO => {
            super::memory::sys_vas_map_vmo(thread, args.arg1, args.arg2, args.arg3, args.arg4)
        }

        // === Tokens ===
        SYS_TOKEN_RELEASE => super::token::sys_token_release(thread, args.arg1),
        SYS_TOKEN_DUPLICATE => super::token::sys_token_duplicate(thread, args.arg1, args.arg2),

        // === IPC ===
        SYS_MAILBOX_CREATE => super::ipc::sys_mailbox_create(thread),
        SYS_MAILBOX_SEND => super::ipc::sys_mailbox_send(thread, args.arg1, args.arg2),
        SYS_MAILBOX_RECEIVE => super::ipc::sys_mailbox_receive(thread, args.arg1, args.arg2),

        // === Desconhecida ===
        _ => {
            kwarn!("(Syscall) Desconhecida num=", args.num);
            Err(SysError::UnknownSyscall)
        }
    }
}
