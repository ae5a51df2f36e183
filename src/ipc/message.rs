//! Mensagem de mailbox

use crate::object::{Handle, Koid};
use alloc::sync::Arc;

/// Uma mensagem carrega exatamente um handle.
///
/// O handle fica vivo enquanto a mensagem estiver em trânsito; a mensagem
/// morre ao ser entregue.
#[derive(Debug)]
pub struct Message {
    payload: Arc<Handle>,
    /// KOID do processo remetente
    sender: Koid,
}

impl Message {
    pub fn new(payload: Arc<Handle>, sender: Koid) -> Self {
        Self { payload, sender }
    }

    #[inline]
    pub fn sender(&self) -> Koid {
        self.sender
    }

    #[inline]
    pub fn payload(&self) -> &Arc<Handle> {
        &self.payload
    }

    /// Consome a mensagem entregando o handle.
    pub fn into_payload(self) -> Arc<Handle> {
        self.payload
    }
}
