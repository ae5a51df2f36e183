//! Erros de ciclo de vida de processos

use crate::object::CapError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcError {
    /// Processo já foi iniciado (start só acontece uma vez)
    AlreadyStarted,
    /// Processo terminou
    Terminated,
    /// Falha na tabela de capabilities
    Cap(CapError),
}

impl ProcError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyStarted => "Processo já iniciado",
            Self::Terminated => "Processo terminado",
            Self::Cap(e) => e.as_str(),
        }
    }
}

impl From<CapError> for ProcError {
    fn from(e: CapError) -> Self {
        Self::Cap(e)
    }
}

impl core::fmt::Display for ProcError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub type ProcResult<T> = Result<T, ProcError>;
