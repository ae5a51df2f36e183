//! Tokens de capability
//!
//! Um token é a chave opaca, imprevisível e local ao processo que userspace usa
//! para nomear uma entrada da sua tabela de capabilities. O mesmo valor em dois
//! processos não tem relação nenhuma.

use crate::time::Instant;
use core::fmt;

/// Token visto por userspace.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(u64);

impl Token {
    /// "Nenhum token". Nunca é gerado; operações de liberação o aceitam como no-op.
    pub const NONE: Token = Token(0);

    /// Tokens usam 63 bits: retornos negativos de syscall são códigos de erro.
    pub const MASK: u64 = i64::MAX as u64;

    /// Converte de valor vindo de syscall.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Valor para retorno de syscall.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Deriva um candidato a token.
    ///
    /// Combina a identidade do processo dono, a identidade do handle, o
    /// timestamp do relógio de alta precisão e o número da tentativa. A
    /// tentativa garante progresso quando o relógio não avança entre retries.
    /// O chamador verifica unicidade sob o lock da tabela.
    pub fn generate(owner: u64, handle: u64, timestamp: Instant, attempt: u64) -> Self {
        let seed = owner
            ^ handle
            ^ timestamp.as_nanos()
            ^ attempt.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        let mixed = mix64(seed) & Self::MASK;

        // 0 é reservado
        if mixed == 0 {
            Self((!seed | 1) & Self::MASK)
        } else {
            Self(mixed)
        }
    }
}

/// Finalizador do SplitMix64: espalha bits para que tokens vizinhos não sejam previsíveis.
#[inline]
const fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:#018x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_never_none() {
        for attempt in 0..1024 {
            let t = Token::generate(0, 0, Instant::ZERO, attempt);
            assert!(!t.is_none());
            assert_eq!(t.raw() & !Token::MASK, 0);
            assert!((t.raw() as isize) > 0);
        }
    }

    #[test]
    fn test_attempt_changes_token() {
        let now = Instant::from_nanos(42);
        let a = Token::generate(0x1000, 0x2000, now, 0);
        let b = Token::generate(0x1000, 0x2000, now, 1);
        assert_ne!(a, b);
    }
}
