//! ABI de Syscalls do Redstone OS (x86_64)
//!
//! # Convenção de Registradores
//!
//! | Registrador | Uso                       |
//! |-------------|---------------------------|
//! | RAX         | Número da syscall         |
//! | RDI         | Argumento 1               |
//! | RSI         | Argumento 2               |
//! | RDX         | Argumento 3               |
//! | R10         | Argumento 4               |
//! | R8          | Argumento 5               |
//! | R9          | Argumento 6               |
//! | RAX         | Retorno (valor ou -errno) |
//!
//! A entrada (`syscall`/`int 0x80`) e o salvamento dos registradores são da
//! plataforma; ela entrega aqui o `ThreadContext` já preenchido.

use crate::object::Token;
use crate::sched::ThreadContext;

/// Máximo de argumentos suportados por syscall
pub const MAX_SYSCALL_ARGS: usize = 6;

/// Argumentos de syscall extraídos do contexto
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyscallArgs {
    /// Número da syscall (RAX)
    pub num: usize,
    pub arg1: usize,
    pub arg2: usize,
    pub arg3: usize,
    pub arg4: usize,
    pub arg5: usize,
    pub arg6: usize,
}

impl SyscallArgs {
    pub const fn new(num: usize, args: [usize; MAX_SYSCALL_ARGS]) -> Self {
        Self {
            num,
            arg1: args[0],
            arg2: args[1],
            arg3: args[2],
            arg4: args[3],
            arg5: args[4],
            arg6: args[5],
        }
    }

    /// Extrai argumentos do contexto salvo da thread
    pub fn from_context(ctx: &ThreadContext) -> Self {
        Self {
            num: ctx.rax as usize,
            arg1: ctx.args[0] as usize,
            arg2: ctx.args[1] as usize,
            arg3: ctx.args[2] as usize,
            arg4: ctx.args[3] as usize,
            arg5: ctx.args[4] as usize,
            arg6: ctx.args[5] as usize,
        }
    }

    /// Argumentos vazios
    pub const fn empty() -> Self {
        Self::new(0, [0; MAX_SYSCALL_ARGS])
    }
}

/// Interpreta um argumento como token.
#[inline]
pub fn token_arg(raw: usize) -> Token {
    Token::from_raw(raw as u64)
}
