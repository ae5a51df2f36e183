//! # Handle
//!
//! Referência a um objeto do kernel + direitos. Compartilhado (via `Arc`) por
//! toda entrada de tabela que o segura e por mensagens em trânsito; morre com
//! a última referência.

use super::kobject::{KObject, Koid};
use super::rights::Rights;
use crate::ipc::Mailbox;
use crate::mm::{Vas, Vmo};
use crate::sched::{Process, Thread};
use alloc::sync::Arc;

/// Objeto referenciado por um handle.
#[derive(Clone)]
pub enum KernelObject {
    Process(Arc<Process>),
    Thread(Arc<Thread>),
    Vas(Arc<Vas>),
    Vmo(Arc<Vmo>),
    Mailbox(Arc<Mailbox>),
}

impl KernelObject {
    fn as_kobject(&self) -> &dyn KObject {
        match self {
            Self::Process(p) => p.as_ref(),
            Self::Thread(t) => t.as_ref(),
            Self::Vas(v) => v.as_ref(),
            Self::Vmo(v) => v.as_ref(),
            Self::Mailbox(m) => m.as_ref(),
        }
    }

    pub fn koid(&self) -> Koid {
        self.as_kobject().koid()
    }

    pub fn type_name(&self) -> &'static str {
        self.as_kobject().type_name()
    }
}

/// Handle: objeto + direitos
pub struct Handle {
    object: KernelObject,
    rights: Rights,
}

impl Handle {
    pub fn new(object: KernelObject, rights: Rights) -> Self {
        Self { object, rights }
    }

    #[inline]
    pub fn object(&self) -> &KernelObject {
        &self.object
    }

    #[inline]
    pub fn rights(&self) -> Rights {
        self.rights
    }

    /// Verifica se o handle tem todos os direitos em `required`.
    #[inline]
    pub fn has_permissions(&self, required: Rights) -> bool {
        self.rights.contains(required)
    }

    /// Novo handle para o mesmo objeto com direitos reduzidos.
    /// `None` se `rights` não for subconjunto dos atuais.
    pub fn derive(&self, rights: Rights) -> Option<Self> {
        if !self.rights.can_reduce_to(rights) {
            return None;
        }
        Some(Self {
            object: self.object.clone(),
            rights,
        })
    }

    /// Identidade do handle (usada na geração de tokens).
    #[inline]
    pub fn identity(this: &Arc<Self>) -> u64 {
        Arc::as_ptr(this) as usize as u64
    }

    pub fn as_process(&self) -> Option<&Arc<Process>> {
        match &self.object {
            KernelObject::Process(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_thread(&self) -> Option<&Arc<Thread>> {
        match &self.object {
            KernelObject::Thread(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_vas(&self) -> Option<&Arc<Vas>> {
        match &self.object {
            KernelObject::Vas(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vmo(&self) -> Option<&Arc<Vmo>> {
        match &self.object {
            KernelObject::Vmo(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_mailbox(&self) -> Option<&Arc<Mailbox>> {
        match &self.object {
            KernelObject::Mailbox(m) => Some(m),
            _ => None,
        }
    }
}

impl core::fmt::Debug for Handle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Handle")
            .field("type", &self.object.type_name())
            .field("koid", &self.object.koid())
            .field("rights", &self.rights)
            .finish()
    }
}
