//! Sistema de Syscalls do Redstone OS
//!
//! Fronteira com userspace: tokens viram handles pela tabela do processo
//! chamador, direitos são checados e só então o objeto é tocado. Toda falha
//! alcançável por argumento de usuário volta como `SysError`.
//! Numeração própria (NÃO compatível com Linux/POSIX).
//!
//! # Módulos
//!
//! - `abi`: Convenção de chamada (SyscallArgs)
//! - `error`: Códigos de erro (SysError)
//! - `numbers`: Constantes das syscalls
//! - `dispatch`: Dispatcher central
//! - `token`: release, duplicate, resolução tipada
//! - `process`: create, start
//! - `memory`: vas_create, vas_map_vmo
//! - `ipc`: mailbox create, send, receive

pub mod abi;
pub mod dispatch;
pub mod error;
pub mod numbers;

// Módulos de implementação
pub mod ipc;
pub mod memory;
pub mod process;
pub mod token;

// Re-exports principais
pub use abi::SyscallArgs;
pub use dispatch::syscall_dispatcher;
pub use error::{SysError, SysResult};

