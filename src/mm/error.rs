//! Tipos de Erro do Subsistema de Memória
//!
//! Define erros estruturados para diagnóstico preciso de falhas em MM.

/// Erros do subsistema de memória
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmError {
    /// Sem memória física disponível (OOM) ou sem ASID
    OutOfMemory,
    /// Endereço base não alinhado ao tamanho de página exigido
    InvalidAlignment,
    /// Faixa sobrepõe um mapeamento existente
    RegionOverlap,
    /// Tradução já instalada (reportado pela MMU)
    AlreadyMapped,
    /// Nenhum mapeamento cobre o endereço/faixa
    NotMapped,
    /// Escrita em mapeamento somente-leitura
    ProtectionViolation,
    /// Endereço inválido (overflow ou acima do fim do espaço de usuário)
    InvalidAddress,
    /// Tamanho inválido (zero ou não múltiplo da página)
    InvalidSize,
    /// Nível de alinhamento inexistente
    InvalidLevel,
    /// Elementos de VMO esparso fora de ordem ou fora do tamanho
    InvalidLayout,
    /// Lock de faixa ocupado (tentativa sem bloqueio)
    Busy,
    /// Prazo expirou esperando o lock de faixa
    TimedOut,
    /// Operação não suportada (ex.: VDSO não instalado)
    NotSupported,
}

impl MmError {
    /// Retorna descrição legível do erro
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfMemory => "OOM: sem frames físicos ou ASIDs disponíveis",
            Self::InvalidAlignment => "Endereço não alinhado",
            Self::RegionOverlap => "Faixa sobrepõe mapeamento existente",
            Self::AlreadyMapped => "Região já mapeada",
            Self::NotMapped => "Região não mapeada",
            Self::ProtectionViolation => "Escrita em mapeamento somente-leitura",
            Self::InvalidAddress => "Endereço inválido",
            Self::InvalidSize => "Tamanho inválido",
            Self::InvalidLevel => "Nível de alinhamento inexistente",
            Self::InvalidLayout => "Layout de VMO esparso inválido",
            Self::Busy => "Faixa travada por outro dono",
            Self::TimedOut => "Prazo expirado",
            Self::NotSupported => "Operação não suportada",
        }
    }
}

impl core::fmt::Display for MmError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tipo Result específico para operações de memória
pub type MmResult<T> = Result<T, MmError>;
