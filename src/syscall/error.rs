//! Códigos de Erro de Syscall
//!
//! Códigos estáveis devolvidos a userspace. Erros saem como valores negativos
//! em RAX; qualquer valor não-negativo é sucesso.

use crate::ipc::IpcError;
use crate::mm::MmError;
use crate::object::CapError;
use crate::sched::ProcError;

/// Enum de erros do sistema.
///
/// Valores são i32 para permitir representação negativa em isize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SysError {
    /// Token não existe na tabela do chamador
    InvalidToken = 1,
    /// Handle sem os direitos exigidos
    NotAllowed = 2,
    /// Argumento inválido (ou estado incompatível, ex.: processo já iniciado)
    InvalidArguments = 3,
    /// Token aponta para outro tipo de objeto
    WrongObjectType = 4,
    /// Endereço desalinhado para o tamanho de página do VMO
    BadAlignment = 5,
    /// Faixa já ocupada por outro mapeamento
    AddressInUse = 6,
    /// Endereço sem mapeamento
    NotMapped = 7,
    /// Acesso incompatível com a proteção do mapeamento
    ProtectionViolation = 8,
    /// Operação bloquearia
    WouldBlock = 9,
    /// Prazo expirado
    TimedOut = 10,
    /// Espera cancelada (ou mailbox fechado)
    Cancelled = 11,
    /// Sem memória disponível
    OutOfMemory = 12,
    /// Operação não suportada nesta configuração
    NotSupported = 13,

    /// Número de syscall desconhecido
    UnknownSyscall = 254,
}

impl SysError {
    /// Converte para isize negativo (formato de retorno da syscall)
    #[inline]
    pub fn as_isize(self) -> isize {
        -(self as i32 as isize)
    }

    /// Cria erro a partir de código negativo
    pub fn from_code(code: isize) -> Option<Self> {
        if code >= 0 {
            return None;
        }
        match code.unsigned_abs() {
            1 => Some(Self::InvalidToken),
            2 => Some(Self::NotAllowed),
            3 => Some(Self::InvalidArguments),
            4 => Some(Self::WrongObjectType),
            5 => Some(Self::BadAlignment),
            6 => Some(Self::AddressInUse),
            7 => Some(Self::NotMapped),
            8 => Some(Self::ProtectionViolation),
            9 => Some(Self::WouldBlock),
            10 => Some(Self::TimedOut),
            11 => Some(Self::Cancelled),
            12 => Some(Self::OutOfMemory),
            13 => Some(Self::NotSupported),
            254 => Some(Self::UnknownSyscall),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidToken => "Token inválido",
            Self::NotAllowed => "Operação não permitida",
            Self::InvalidArguments => "Argumentos inválidos",
            Self::WrongObjectType => "Tipo de objeto incompatível",
            Self::BadAlignment => "Alinhamento incorreto",
            Self::AddressInUse => "Endereço em uso",
            Self::NotMapped => "Endereço não mapeado",
            Self::ProtectionViolation => "Violação de proteção",
            Self::WouldBlock => "Operação bloquearia",
            Self::TimedOut => "Tempo esgotado",
            Self::Cancelled => "Cancelado",
            Self::OutOfMemory => "Sem memória",
            Self::NotSupported => "Não suportado",
            Self::UnknownSyscall => "Syscall desconhecida",
        }
    }
}

impl core::fmt::Display for SysError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// CONVERSÕES
// =============================================================================

impl From<CapError> for SysError {
    fn from(e: CapError) -> Self {
        match e {
            CapError::InvalidToken => Self::InvalidToken,
            CapError::NotAllowed => Self::NotAllowed,
            CapError::WrongObjectType => Self::WrongObjectType,
            CapError::ProcessDead => Self::InvalidArguments,
        }
    }
}

impl From<MmError> for SysError {
    fn from(e: MmError) -> Self {
        match e {
            MmError::OutOfMemory => Self::OutOfMemory,
            MmError::InvalidAlignment => Self::BadAlignment,
            MmError::RegionOverlap | MmError::AlreadyMapped => Self::AddressInUse,
            MmError::NotMapped => Self::NotMapped,
            MmError::ProtectionViolation => Self::ProtectionViolation,
            MmError::InvalidAddress
            | MmError::InvalidSize
            | MmError::InvalidLevel
            | MmError::InvalidLayout => Self::InvalidArguments,
            MmError::Busy => Self::WouldBlock,
            MmError::TimedOut => Self::TimedOut,
            MmError::NotSupported => Self::NotSupported,
        }
    }
}

impl From<ProcError> for SysError {
    fn from(e: ProcError) -> Self {
        match e {
            ProcError::AlreadyStarted | ProcError::Terminated => Self::InvalidArguments,
            ProcError::Cap(e) => e.into(),
        }
    }
}

impl From<IpcError> for SysError {
    fn from(e: IpcError) -> Self {
        match e {
            IpcError::Closed => Self::Cancelled,
        }
    }
}

/// Resultado de syscall: Ok(valor) ou Err(SysError)
pub type SysResult<T> = Result<T, SysError>;

/// Helper para converter SysResult<usize> em isize para retorno
pub fn result_to_isize(result: SysResult<usize>) -> isize {
    match result {
        Ok(val) => val as isize,
        Err(e) => e.as_isize(),
    }
}
