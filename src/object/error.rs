//! Erros da tabela de capabilities

/// Erros de capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapError {
    /// Token não existe na tabela do processo
    InvalidToken,
    /// Handle não tem os direitos exigidos
    NotAllowed,
    /// Handle aponta para outro tipo de objeto
    WrongObjectType,
    /// Processo dono da tabela já terminou
    ProcessDead,
}

impl CapError {
    /// Retorna descrição legível do erro
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidToken => "Token inexistente na tabela do processo",
            Self::NotAllowed => "Direitos insuficientes no handle",
            Self::WrongObjectType => "Handle aponta para outro tipo de objeto",
            Self::ProcessDead => "Processo já terminou",
        }
    }
}

impl core::fmt::Display for CapError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tipo Result específico para operações de capability
pub type CapResult<T> = Result<T, CapError>;
