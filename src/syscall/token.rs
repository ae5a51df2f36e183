//! Syscalls de Token e resolução tipada
//!
//! Todo handler começa aqui: token → handle (tabela do chamador) → checagem
//! de direitos → objeto do tipo esperado.

use super::abi::token_arg;
use super::error::{SysError, SysResult};
use crate::ipc::Mailbox;
use crate::mm::{Vas, Vmo};
use crate::object::{CapError, Handle, Rights, Token};
use crate::sched::{Process, Thread};
use alloc::sync::Arc;

/// Resolve `token` e exige `required` no handle.
pub fn resolve(caller: &Process, token: Token, required: Rights) -> SysResult<Arc<Handle>> {
    let handle = caller.get_handle(token).ok_or(CapError::InvalidToken)?;
    if !handle.has_permissions(required) {
        kwarn!("(Syscall) direitos insuficientes token=", token.raw());
        return Err(SysError::NotAllowed);
    }
    Ok(handle)
}

/// Gera os resolvedores tipados (`resolve_vas`, ...).
macro_rules! typed_resolver {
    ($name:ident, $accessor:ident, $ty:ty) => {
        pub fn $name(caller: &Process, token: Token, required: Rights) -> SysResult<Arc<$ty>> {
            let handle = resolve(caller, token, required)?;
            handle
                .$accessor()
                .cloned()
                .ok_or(SysError::WrongObjectType)
        }
    };
}

typed_resolver!(resolve_process, as_process, Process);
typed_resolver!(resolve_vas, as_vas, Vas);
typed_resolver!(resolve_vmo, as_vmo, Vmo);
typed_resolver!(resolve_mailbox, as_mailbox, Mailbox);

/// Registra um handle novo na tabela do chamador e devolve o token como retorno.
pub fn register(caller: &Process, handle: Arc<Handle>) -> SysResult<usize> {
    let token = caller.register_for_token(handle)?;
    Ok(token.raw() as usize)
}

/// Libera um token.
///
/// # Syscall
/// `SYS_TOKEN_RELEASE (0x20)` - Args: (token). Token 0 é no-op.
pub fn sys_token_release(thread: &Arc<Thread>, token: usize) -> SysResult<usize> {
    let token = token_arg(token);
    if token.is_none() {
        return Ok(0);
    }
    thread.process().unregister_token(token)?;
    Ok(0)
}

/// Duplica um token com direitos reduzidos (exige `CLONE`).
///
/// # Syscall
/// `SYS_TOKEN_DUPLICATE (0x21)` - Args: (token, rights)
pub fn sys_token_duplicate(thread: &Arc<Thread>, token: usize, rights: usize) -> SysResult<usize> {
    let rights = u32::try_from(rights)
        .ok()
        .and_then(Rights::from_bits)
        .ok_or(SysError::InvalidArguments)?;
    let token = thread.process().duplicate_token(token_arg(token), rights)?;
    Ok(token.raw() as usize)
}
