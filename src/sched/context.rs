//! Contexto de execução de uma thread
//!
//! Estado montado antes do primeiro despacho. O layout dos registradores e a
//! transição Ring 0 → Ring 3 são da plataforma; aqui ficam só os valores.

use crate::mm::VirtAddr;

/// Registradores de argumento disponíveis na entrada (SysV: rdi, rsi, rdx, rcx, r8, r9)
pub const MAX_ARGS: usize = 6;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThreadContext {
    pub rip: u64,
    pub rsp: u64,
    pub args: [u64; MAX_ARGS],
    /// Valor de retorno da syscall em curso (rax)
    pub rax: u64,
    /// Entrada em modo usuário (Ring 3)
    pub userspace: bool,
}

impl ThreadContext {
    pub const fn new() -> Self {
        Self {
            rip: 0,
            rsp: 0,
            args: [0; MAX_ARGS],
            rax: 0,
            userspace: false,
        }
    }

    pub fn set_userspace(&mut self) {
        self.userspace = true;
    }

    pub fn set_instruction_pointer(&mut self, entry: VirtAddr) {
        self.rip = entry.as_u64();
    }

    pub fn set_stack_pointer(&mut self, stack: VirtAddr) {
        self.rsp = stack.as_u64();
    }

    /// Índices fixos do kernel; fora do intervalo é bug interno.
    pub fn set_argument(&mut self, index: usize, value: u64) {
        self.args[index] = value;
    }

    pub fn set_return_value(&mut self, value: u64) {
        self.rax = value;
    }
}
