//! Tabela de capabilities: Token → Handle
//!
//! Estrutura pura, sem lock próprio. Vive dentro do estado de um `Process` e
//! é sempre acessada sob o lock do processo (interrupções mascaradas), que é
//! também o que torna "verificar unicidade + inserir" atômico.

use super::handle::Handle;
use super::token::Token;
use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use alloc::vec::Vec;

/// Mapa de tokens locais do processo para handles.
#[derive(Default)]
pub struct CapabilityTable {
    entries: BTreeMap<Token, Arc<Handle>>,
}

impl CapabilityTable {
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn contains(&self, token: Token) -> bool {
        self.entries.contains_key(&token)
    }

    /// Insere se a chave estiver livre. `false` se já existir.
    pub fn insert(&mut self, token: Token, handle: Arc<Handle>) -> bool {
        if token.is_none() || self.entries.contains_key(&token) {
            return false;
        }
        self.entries.insert(token, handle);
        true
    }

    pub fn remove(&mut self, token: Token) -> Option<Arc<Handle>> {
        self.entries.remove(&token)
    }

    pub fn get(&self, token: Token) -> Option<&Arc<Handle>> {
        self.entries.get(&token)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Esvazia a tabela devolvendo os handles (para soltá-los fora do lock).
    pub fn drain(&mut self) -> Vec<Arc<Handle>> {
        core::mem::take(&mut self.entries).into_values().collect()
    }
}
