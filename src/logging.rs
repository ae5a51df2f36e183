// =============================================================================
// KERNEL LOGGING SYSTEM - ZERO OVERHEAD
// =============================================================================
//
// Sistema de logging do núcleo Anvil com custo ZERO em release.
//
// ARQUITETURA:
// - Usa features do Cargo para compile-time filtering
// - Com feature "no_logs", TODOS os macros viram expressões vazias
// - SEM core::fmt - Apenas strings literais + um valor hexadecimal
// - SEM alocação
// - Escreve no sink registrado pela plataforma (serial/console)
//
// NÍVEIS DE LOG (do mais crítico ao menos):
// - ERROR: Violações de invariantes internos (antes de um panic)
// - WARN:  Erros de contrato vindos de userspace
// - INFO:  Fluxo normal (criação de VAS, início de processo)
// - DEBUG: Informações de debugging
// - TRACE: Cada token, cada mapeamento, cada mensagem
//
// COMO USAR:
//   kinfo!("(VAS) Criado VAS");                 // Apenas string
//   kinfo!("(VAS) asid=", asid.as_u64());       // String + hex
//
// =============================================================================

use spin::Once;

/// Destino das linhas de log (normalmente a serial da plataforma).
pub trait LogSink: Sync {
    /// Escreve uma string crua.
    fn write_str(&self, s: &str);
}

static SINK: Once<&'static dyn LogSink> = Once::new();

/// Registra o sink de log. Só a primeira chamada tem efeito.
pub fn set_sink(sink: &'static dyn LogSink) {
    SINK.call_once(|| sink);
}

// =============================================================================
// PREFIXOS COM CORES ANSI
// =============================================================================

pub const P_ERROR: &str = "\x1b[1;31m[ERRO]\x1b[0m ";
pub const P_WARN: &str = "\x1b[1;33m[WARN]\x1b[0m ";
pub const P_INFO: &str = "\x1b[32m[INFO]\x1b[0m ";
pub const P_DEBUG: &str = "\x1b[36m[DEBG]\x1b[0m ";
pub const P_TRACE: &str = "\x1b[35m[TRAC]\x1b[0m ";

// =============================================================================
// EMISSÃO
// =============================================================================

#[inline]
pub fn emit_str(s: &str) {
    if let Some(sink) = SINK.get() {
        sink.write_str(s);
    }
}

#[inline]
pub fn emit_nl() {
    emit_str("\n");
}

/// Emite `0x` seguido do valor em hexadecimal, sem zeros à esquerda.
pub fn emit_hex(value: u64) {
    let mut buf = [0u8; 18];
    emit_str(format_hex(value, &mut buf));
}

/// Formata `value` como `0x...` dentro de `buf`, sem core::fmt.
pub fn format_hex(value: u64, buf: &mut [u8; 18]) -> &str {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";

    let mut len = 0;
    let mut v = value;
    let mut tmp = [0u8; 16];
    loop {
        tmp[len] = DIGITS[(v & 0xF) as usize];
        len += 1;
        v >>= 4;
        if v == 0 {
            break;
        }
    }

    buf[0] = b'0';
    buf[1] = b'x';
    for i in 0..len {
        buf[2 + i] = tmp[len - 1 - i];
    }

    // Só dígitos ASCII foram escritos
    core::str::from_utf8(&buf[..2 + len]).unwrap_or("0x?")
}

// =============================================================================
// MACROS DE LOG - NÍVEL ERROR
// =============================================================================

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kerror {
    ($msg:expr) => {{
        $crate::logging::emit_str($crate::logging::P_ERROR);
        $crate::logging::emit_str($msg);
        $crate::logging::emit_nl();
    }};
    ($msg:expr, $val:expr) => {{
        $crate::logging::emit_str($crate::logging::P_ERROR);
        $crate::logging::emit_str($msg);
        $crate::logging::emit_hex($val as u64);
        $crate::logging::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kerror {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL WARN
// =============================================================================

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kwarn {
    ($msg:expr) => {{
        $crate::logging::emit_str($crate::logging::P_WARN);
        $crate::logging::emit_str($msg);
        $crate::logging::emit_nl();
    }};
    ($msg:expr, $val:expr) => {{
        $crate::logging::emit_str($crate::logging::P_WARN);
        $crate::logging::emit_str($msg);
        $crate::logging::emit_hex($val as u64);
        $crate::logging::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kwarn {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL INFO
// =============================================================================

#[cfg(all(
    not(feature = "no_logs"),
    any(feature = "log_info", feature = "log_debug", feature = "log_trace")
))]
#[macro_export]
macro_rules! kinfo {
    ($msg:expr) => {{
        $crate::logging::emit_str($crate::logging::P_INFO);
        $crate::logging::emit_str($msg);
        $crate::logging::emit_nl();
    }};
    ($msg:expr, $val:expr) => {{
        $crate::logging::emit_str($crate::logging::P_INFO);
        $crate::logging::emit_str($msg);
        $crate::logging::emit_hex($val as u64);
        $crate::logging::emit_nl();
    }};
}

#[cfg(not(all(
    not(feature = "no_logs"),
    any(feature = "log_info", feature = "log_debug", feature = "log_trace")
)))]
#[macro_export]
macro_rules! kinfo {
    ($msg:expr) => {{
        let _ = $msg;
    }};
    ($msg:expr, $val:expr) => {{
        let _ = ($msg, $val);
    }};
}

// =============================================================================
// MACROS DE LOG - NÍVEL DEBUG
// =============================================================================

#[cfg(all(
    not(feature = "no_logs"),
    any(feature = "log_debug", feature = "log_trace")
))]
#[macro_export]
macro_rules! kdebug {
    ($msg:expr) => {{
        $crate::logging::emit_str($crate::logging::P_DEBUG);
        $crate::logging::emit_str($msg);
        $crate::logging::emit_nl();
    }};
    ($msg:expr, $val:expr) => {{
        $crate::logging::emit_str($crate::logging::P_DEBUG);
        $crate::logging::emit_str($msg);
        $crate::logging::emit_hex($val as u64);
        $crate::logging::emit_nl();
    }};
}

#[cfg(not(all(
    not(feature = "no_logs"),
    any(feature = "log_debug", feature = "log_trace")
)))]
#[macro_export]
macro_rules! kdebug {
    ($msg:expr) => {{
        let _ = $msg;
    }};
    ($msg:expr, $val:expr) => {{
        let _ = ($msg, $val);
    }};
}

// =============================================================================
// MACROS DE LOG - NÍVEL TRACE
// =============================================================================

#[cfg(all(not(feature = "no_logs"), feature = "log_trace"))]
#[macro_export]
macro_rules! ktrace {
    ($msg:expr) => {{
        $crate::logging::emit_str($crate::logging::P_TRACE);
        $crate::logging::emit_str($msg);
        $crate::logging::emit_nl();
    }};
    ($msg:expr, $val:expr) => {{
        $crate::logging::emit_str($crate::logging::P_TRACE);
        $crate::logging::emit_str($msg);
        $crate::logging::emit_hex($val as u64);
        $crate::logging::emit_nl();
    }};
}

#[cfg(not(all(not(feature = "no_logs"), feature = "log_trace")))]
#[macro_export]
macro_rules! ktrace {
    ($msg:expr) => {{
        let _ = $msg;
    }};
    ($msg:expr, $val:expr) => {{
        let _ = ($msg, $val);
    }};
}

// =============================================================================
// TESTS
// =============================================================================
