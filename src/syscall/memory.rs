//! Syscalls de Memória (VAS)

use super::abi::token_arg;
use super::error::{SysError, SysResult};
use super::token::{register, resolve_vas, resolve_vmo};
use crate::mm::{MappingFlags, VirtAddr};
use crate::object::{KernelObject, Rights};
use crate::sched::Thread;
use alloc::sync::Arc;

/// Cria um VAS. Com VDSO instalado, o layout é randomizado.
///
/// # Syscall
/// `SYS_VAS_CREATE (0x10)` - Args: nenhum
pub fn sys_vas_create(thread: &Arc<Thread>) -> SysResult<usize> {
    let caller = thread.process();
    let kernel = caller.kernel();

    let vas = kernel.create_vas(kernel.vdso().is_some())?;
    let handle = kernel.create_handle(KernelObject::Vas(vas), Rights::ALL);
    register(caller, handle)
}

/// Mapeia o VMO de `vmo_token` em `base` no VAS de `vas_token`.
///
/// Exige `WRITE` no VAS.
///
/// # Syscall
/// `SYS_VAS_MAP_VMO (0x11)` - Args: (vas_token, vmo_token, base, flags)
pub fn sys_vas_map_vmo(
    thread: &Arc<Thread>,
    vas_token: usize,
    vmo_token: usize,
    base: usize,
    flags: usize,
) -> SysResult<usize> {
    let flags = u32::try_from(flags)
        .ok()
        .and_then(MappingFlags::from_bits)
        .ok_or(SysError::InvalidArguments)?;

    let caller = thread.process();
    let vas = resolve_vas(caller, token_arg(vas_token), Rights::WRITE)?;
    let vmo = resolve_vmo(caller, token_arg(vmo_token), Rights::empty())?;

    vas.map_vmo(vmo, VirtAddr::new(base as u64), flags)?;
    Ok(0)
}
