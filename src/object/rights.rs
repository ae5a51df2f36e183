//! Direitos de acesso a objetos

use bitflags::bitflags;

bitflags! {
    /// Direitos de um handle.
    /// Define O QUE o dono do token pode fazer com o objeto.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Rights: u32 {
        /// Ler estado / receber de um mailbox.
        const READ     = 1 << 0;
        /// Modificar estado / mapear num VAS / enviar a um mailbox.
        const WRITE    = 1 << 1;
        /// Mover o handle para outro processo (start, mensagens).
        const TRANSFER = 1 << 2;
        /// Duplicar o handle (com direitos iguais ou menores).
        const CLONE    = 1 << 3;

        /// Direitos totais (dono do objeto recém-criado).
        const ALL = Self::READ.bits() | Self::WRITE.bits() | Self::TRANSFER.bits() | Self::CLONE.bits();
    }
}

impl Rights {
    /// Verifica se pode reduzir para `new_rights` (nunca elevar).
    #[inline]
    pub fn can_reduce_to(&self, new_rights: Rights) -> bool {
        self.contains(new_rights)
    }
}
