//! Erros de IPC

use super::message::Message;

/// Erro de IPC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpcError {
    /// Mailbox fechado: sends falham, receives não bloqueiam
    Closed,
}

impl IpcError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "Mailbox fechado",
        }
    }
}

impl core::fmt::Display for IpcError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub type IpcResult<T> = Result<T, IpcError>;

/// Send recusado: a mensagem volta intacta para quem a enviou.
#[derive(Debug)]
pub struct SendError {
    pub kind: IpcError,
    pub message: Message,
}

impl SendError {
    pub fn into_message(self) -> Message {
        self.message
    }
}
