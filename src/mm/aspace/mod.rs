//! # Address Space Manager (VAS)
//!
//! Um VAS é dono de um ASID (endereço físico da tabela de topo) e de um
//! conjunto ordenado de mapeamentos de VMOs, chaveado por `AddressRange`.
//!
//! ## Locks
//!
//! | Lock                      | Protege                                   |
//! |---------------------------|-------------------------------------------|
//! | `Vas::mappings` (IrqMutex)| Estrutura do conjunto (inserir/buscar)    |
//! | `VmoMapping` (range lock) | Acesso ao conteúdo de uma faixa           |
//!
//! O lock do VAS nunca é segurado enquanto se espera um lock de faixa, então
//! faixas diferentes são acessadas em paralelo e mudanças estruturais continuam
//! serializadas. Esperar um lock de faixa suspende a thread atual.

pub mod mapping;
pub mod range;

pub use mapping::{MappingFlags, RangeGuard, VmoMapping};
pub use range::AddressRange;

use crate::kernel::Kernel;
use crate::mm::fault::AccessType;
use crate::mm::types::{Lookup, Vmo};
use crate::mm::{MmError, MmResult, PhysAddr, VirtAddr};
use crate::object::{generate_koid, KObject, Koid};
use crate::sync::IrqMutex;
use crate::time::Instant;
use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use alloc::vec::Vec;
use spin::Once;

type MappingSet = BTreeMap<AddressRange, Arc<VmoMapping>>;

/// Espaço de endereçamento virtual
pub struct Vas {
    koid: Koid,
    kernel: Arc<Kernel>,
    asid: PhysAddr,
    /// `false` para ASIDs adotados (bootstrap): não são liberados no drop
    owns_asid: bool,
    mappings: IrqMutex<MappingSet>,
    vdso_base: Once<VirtAddr>,
}

impl Vas {
    pub(crate) fn new(kernel: Arc<Kernel>, asid: PhysAddr, owns_asid: bool) -> Self {
        Self {
            koid: generate_koid(),
            kernel,
            asid,
            owns_asid,
            mappings: IrqMutex::new(BTreeMap::new()),
            vdso_base: Once::new(),
        }
    }

    #[inline]
    pub fn asid(&self) -> PhysAddr {
        self.asid
    }

    /// Base onde o VDSO foi mapeado (só em VAS criados com layout aleatório).
    pub fn vdso_base(&self) -> Option<VirtAddr> {
        self.vdso_base.get().copied()
    }

    pub(crate) fn set_vdso_base(&self, base: VirtAddr) {
        self.vdso_base.call_once(|| base);
    }

    pub fn mapping_count(&self) -> usize {
        self.mappings.lock(self.kernel.cpu()).len()
    }

    /// Mapeia `vmo` em `[base, base + vmo.length())`.
    ///
    /// Falhas de validação não alteram o conjunto de mapeamentos.
    pub fn map_vmo(
        &self,
        vmo: Arc<Vmo>,
        base: VirtAddr,
        flags: MappingFlags,
    ) -> MmResult<Arc<VmoMapping>> {
        // 1. Alinhamento exigido pelo VMO
        let page_size = vmo.page_size();
        if !base.is_aligned(page_size) {
            kwarn!("(VAS) map_vmo: base desalinhada=", base.as_u64());
            return Err(MmError::InvalidAlignment);
        }

        // 2. Faixa dentro do espaço de usuário
        let end = base.checked_add(vmo.length()).ok_or(MmError::InvalidAddress)?;
        if end > self.kernel.config().user_space_end {
            kwarn!("(VAS) map_vmo: faixa além do espaço de usuário, fim=", end.as_u64());
            return Err(MmError::InvalidAddress);
        }
        let range = AddressRange::new(base, end);

        let mut mappings = self.mappings.lock(self.kernel.cpu());

        // 3. Sobreposição: nunca mescla nem divide
        if Self::find_overlap(&mappings, &range).is_some() {
            kwarn!("(VAS) map_vmo: sobreposição em base=", base.as_u64());
            return Err(MmError::RegionOverlap);
        }

        // 4. Traduções de hardware, depois inserção
        self.install(&range, &vmo, flags)?;

        let mapping = Arc::new(VmoMapping::new(self.kernel.clone(), range, vmo, flags));
        mappings.insert(range, mapping.clone());

        ktrace!("(VAS) map_vmo: base=", base.as_u64());
        ktrace!("(VAS) map_vmo: fim=", end.as_u64());
        Ok(mapping)
    }

    /// Mapeamento cuja faixa contém `addr`.
    pub fn find_mapping(&self, addr: VirtAddr) -> Option<Arc<VmoMapping>> {
        let mappings = self.mappings.lock(self.kernel.cpu());
        Self::find_containing(&mappings, addr).cloned()
    }

    /// Remove o mapeamento que começa em `base`.
    ///
    /// Espera quem estiver com o lock de faixa terminar antes de remover as
    /// traduções. Threads ainda na fila do lock acordam com `NotMapped`.
    pub fn unmap(&self, base: VirtAddr) -> MmResult<()> {
        let mapping = {
            let mut mappings = self.mappings.lock(self.kernel.cpu());
            let key = mappings
                .range(AddressRange::new(base, base)..)
                .next()
                .filter(|(r, _)| r.start() == base)
                .map(|(r, _)| *r)
                .ok_or(MmError::NotMapped)?;
            mappings.remove(&key).ok_or(MmError::NotMapped)?
        };

        let guard = mapping.acquire(true, None)?;
        let range = guard.range();
        self.kernel.mmu().unmap_range(self.asid, range.start(), range.end());
        mapping.retire();
        drop(guard);

        ktrace!("(VAS) unmap: base=", base.as_u64());
        Ok(())
    }

    /// Tradução instalada para `addr`.
    pub fn translate(&self, addr: VirtAddr) -> Option<PhysAddr> {
        self.kernel.mmu().translate(self.asid, addr)
    }

    // =========================================================================
    // LOCKS DE FAIXA
    // =========================================================================

    /// Trava a faixa do mapeamento exatamente igual a `[start, end)`.
    ///
    /// Retorna `None` se não houver tal mapeamento ou se `for_write` for pedido
    /// num mapeamento somente-leitura. Travada, suspende a thread atual até o
    /// lock ser passado a ela.
    pub fn lock_address_range(
        &self,
        start: VirtAddr,
        end: VirtAddr,
        for_write: bool,
    ) -> Option<RangeGuard> {
        let mapping = self.lockable(start, end, for_write).ok()?;
        mapping.acquire(for_write, None).ok()
    }

    /// Como `lock_address_range`, mas nunca bloqueia: `Busy` se travada.
    pub fn try_lock_address_range(
        &self,
        start: VirtAddr,
        end: VirtAddr,
        for_write: bool,
    ) -> MmResult<RangeGuard> {
        let mapping = self.lockable(start, end, for_write)?;
        mapping.try_acquire(for_write)
    }

    /// Como `lock_address_range`, mas desiste em `deadline` com `TimedOut`.
    ///
    /// A thread suspensa é acordada pelo `expire_range_locks` do timer.
    pub fn lock_address_range_until(
        &self,
        start: VirtAddr,
        end: VirtAddr,
        for_write: bool,
        deadline: Instant,
    ) -> MmResult<RangeGuard> {
        let mapping = self.lockable(start, end, for_write)?;
        mapping.acquire(for_write, Some(deadline))
    }

    /// Acorda com `TimedOut` as threads cujo prazo de lock de faixa passou.
    pub fn expire_range_locks(&self, now: Instant) -> usize {
        let mappings: Vec<Arc<VmoMapping>> = self
            .mappings
            .lock(self.kernel.cpu())
            .values()
            .cloned()
            .collect();
        mappings.iter().map(|m| m.expire(now)).sum()
    }

    /// Busca sob o lock do VAS; o lock de faixa é tomado depois de soltá-lo.
    fn lockable(&self, start: VirtAddr, end: VirtAddr, for_write: bool) -> MmResult<Arc<VmoMapping>> {
        let mappings = self.mappings.lock(self.kernel.cpu());
        let mapping = mappings
            .get(&AddressRange::new(start, end))
            .ok_or(MmError::NotMapped)?;
        if for_write && mapping.is_read_only() {
            return Err(MmError::ProtectionViolation);
        }
        Ok(mapping.clone())
    }

    // =========================================================================
    // COMMIT SOB DEMANDA
    // =========================================================================

    /// Resolve um fault em `addr`: commita a página de um VMO esparso (ou
    /// reinstala uma tradução existente) e retorna o frame físico de `addr`.
    pub fn handle_page_fault(&self, addr: VirtAddr, access: AccessType) -> MmResult<PhysAddr> {
        let mappings = self.mappings.lock(self.kernel.cpu());
        let mapping = Self::find_containing(&mappings, addr).ok_or(MmError::NotMapped)?;

        let flags = mapping.flags();
        match access {
            AccessType::Write if flags.contains(MappingFlags::READ_ONLY) => {
                return Err(MmError::ProtectionViolation)
            }
            AccessType::Execute if !flags.contains(MappingFlags::EXECUTABLE) => {
                return Err(MmError::ProtectionViolation)
            }
            _ => {}
        }

        let range = mapping.range();
        let vmo = mapping.vmo();
        let offset = addr.offset_from(range.start());

        let (page_offset, frame) = match vmo.lookup(offset) {
            Lookup::Backed { page_offset, frame } => (page_offset, frame),
            Lookup::Uncommitted { page_offset } => {
                let frame = vmo.commit(page_offset, self.kernel.frames())?;
                (page_offset, frame)
            }
            Lookup::Hole => return Err(MmError::NotMapped),
        };

        let page = range.start().add(page_offset);
        if self.kernel.mmu().translate(self.asid, page).is_none() {
            self.kernel.mmu().map_physical(
                self.asid,
                page,
                page.add(vmo.page_size()),
                frame,
                flags,
            )?;
        }

        ktrace!("(VAS) fault resolvido em:", addr.as_u64());
        Ok(frame.add(offset - page_offset))
    }

    // =========================================================================
    // INTERNOS
    // =========================================================================

    /// Instala as traduções de `vmo` em `range`.
    ///
    /// VMO físico: uma chamada. VMO esparso: uma página por elemento commitado;
    /// os não commitados ficam para o fault.
    fn install(&self, range: &AddressRange, vmo: &Vmo, flags: MappingFlags) -> MmResult<()> {
        let mmu = self.kernel.mmu();

        if let Some(phys) = vmo.physical_base() {
            return mmu.map_physical(self.asid, range.start(), range.end(), phys, flags);
        }

        let page_size = vmo.page_size();
        for element in vmo.committed_elements() {
            let Some(frame) = element.frame else {
                continue;
            };
            let page = range.start().add(element.offset);
            if let Err(e) = mmu.map_physical(self.asid, page, page.add(page_size), frame, flags) {
                // Desfaz as páginas já instaladas
                mmu.unmap_range(self.asid, range.start(), range.end());
                return Err(e);
            }
        }
        Ok(())
    }

    /// Mapeamento existente que intersecta `range`.
    ///
    /// Como as faixas do conjunto são disjuntas, só o último mapeamento que
    /// começa antes de `range.end()` pode intersectar.
    fn find_overlap<'a>(mappings: &'a MappingSet, range: &AddressRange) -> Option<&'a Arc<VmoMapping>> {
        mappings
            .range(..AddressRange::new(range.end(), range.end()))
            .next_back()
            .map(|(_, m)| m)
            .filter(|m| m.range().overlaps(range))
    }

    fn find_containing(mappings: &MappingSet, addr: VirtAddr) -> Option<&Arc<VmoMapping>> {
        mappings
            .range(..=AddressRange::new(addr, VirtAddr::new(u64::MAX)))
            .next_back()
            .map(|(_, m)| m)
            .filter(|m| m.range().contains(addr))
    }
}

impl KObject for Vas {
    fn koid(&self) -> Koid {
        self.koid
    }

    fn type_name(&self) -> &'static str {
        "Vas"
    }
}

impl Drop for Vas {
    fn drop(&mut self) {
        let mappings = core::mem::take(self.mappings.get_mut());
        let mmu = self.kernel.mmu();

        for (range, mapping) in mappings.iter() {
            // Quem segura a faixa termina antes das traduções sumirem
            let guard = mapping.acquire(true, None).ok();
            mmu.unmap_range(self.asid, range.start(), range.end());
            mapping.retire();
            drop(guard);
        }
        // As referências aos VMOs caem junto com `mappings`
        drop(mappings);

        if self.owns_asid {
            mmu.release_asid(self.asid);
            kdebug!("(VAS) ASID liberado=", self.asid.as_u64());
        }
    }
}
