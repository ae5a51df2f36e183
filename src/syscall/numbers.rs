//! # Syscall Numbers Registry
//!
//! Catálogo central das operações do núcleo. Cada número é único e imutável.
//!
//! **ATENÇÃO**: Esta numeração é EXCLUSIVA do Redstone OS.
//! NÃO é compatível com Linux, POSIX ou qualquer outro sistema.
//!
//! # Organização
//!
//! | Range     | Categoria     |
//! |-----------|---------------|
//! | 0x01-0x0F | Processo      |
//! | 0x10-0x1F | Memória (VAS) |
//! | 0x20-0x2F | Tokens        |
//! | 0x30-0x3F | IPC           |

// ============================================================================
// PROCESSO (0x01 - 0x0F)
// ============================================================================

/// Cria um processo sobre um VAS.
/// Args: (vas_token)
/// Retorno: token do processo ou erro
pub const SYS_PROCESS_CREATE: usize = 0x01;

/// Inicia um processo entregando-lhe o bootstrap token.
/// Args: (process_token, entry, stack, bootstrap_token)
/// Retorno: 0 ou erro
pub const SYS_PROCESS_START: usize = 0x02;

// ============================================================================
// MEMÓRIA (0x10 - 0x1F)
// ============================================================================

/// Cria um espaço de endereçamento (VDSO randomizado se instalado).
/// Args: nenhum
/// Retorno: token do VAS ou erro
pub const SYS_VAS_CREATE: usize = 0x10;

/// Mapeia um VMO em um VAS.
/// Args: (vas_token, vmo_token, base, flags)
/// Retorno: 0 ou erro
pub const SYS_VAS_MAP_VMO: usize = 0x11;

// ============================================================================
// TOKENS (0x20 - 0x2F)
// ============================================================================

/// Libera um token (0 = no-op).
/// Args: (token)
/// Retorno: 0 ou erro
pub const SYS_TOKEN_RELEASE: usize = 0x20;

/// Duplica um token com direitos reduzidos.
/// Args: (token, rights)
/// Retorno: novo token ou erro
pub const SYS_TOKEN_DUPLICATE: usize = 0x21;

// ============================================================================
// IPC (0x30 - 0x3F)
// ============================================================================

/// Cria um mailbox.
/// Args: nenhum
/// Retorno: token do mailbox ou erro
pub const SYS_MAILBOX_CREATE: usize = 0x30;

/// Envia um handle (o token sai da tabela do chamador).
/// Args: (mailbox_token, payload_token)
/// Retorno: 0 ou erro
pub const SYS_MAILBOX_SEND: usize = 0x31;

/// Recebe um handle, bloqueando se a fila estiver vazia.
/// Args: (mailbox_token, timeout_ns); timeout 0 espera indefinidamente
/// Retorno: token do payload ou erro
pub const SYS_MAILBOX_RECEIVE: usize = 0x32;
