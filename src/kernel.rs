//! # Kernel
//!
//! Registro explícito do núcleo, construído uma vez na inicialização e passado
//! como `Arc<Kernel>` para quem precisa da plataforma. Substitui singletons
//! globais (array de cores, relógio de alta precisão).
//!
//! ```text
//! Kernel
//!  ├── Platform  (CpuHal, ClockHal, MmuHal, FrameHal, SchedHal)
//!  ├── CoreLocal[max_cores]  { current_thread }
//!  ├── VDSO (opcional)
//!  └── KernelConfig
//! ```

use crate::config::KernelConfig;
use crate::hal::{ClockHal, CpuHal, FrameHal, MmuHal, SchedHal};
use crate::ipc::Mailbox;
use crate::klib::align::align_up_u64;
use crate::mm::config::PAGE_SIZE;
use crate::mm::{MappingFlags, MmError, MmResult, PhysAddr, SparseElement, Vas, VirtAddr, Vmo};
use crate::object::{Handle, KernelObject, Rights};
use crate::sched::{Process, Thread};
use alloc::sync::Arc;
use alloc::vec::Vec;
use spin::{Mutex, Once};

/// Objetos da plataforma consumidos pelo núcleo.
pub struct Platform {
    pub cpu: Arc<dyn CpuHal>,
    pub clock: Arc<dyn ClockHal>,
    pub mmu: Arc<dyn MmuHal>,
    pub frames: Arc<dyn FrameHal>,
    pub sched: Arc<dyn SchedHal>,
}

/// Armazenamento local de um core.
///
/// Só o próprio core escreve; o lock existe para leituras de diagnóstico.
pub struct CoreLocal {
    current_thread: Mutex<Option<Arc<Thread>>>,
}

impl CoreLocal {
    const fn new() -> Self {
        Self {
            current_thread: Mutex::new(None),
        }
    }
}

pub struct Kernel {
    config: KernelConfig,
    platform: Platform,
    cores: Vec<CoreLocal>,
    vdso: Once<Arc<Vmo>>,
}

impl Kernel {
    pub fn new(config: KernelConfig, platform: Platform) -> Arc<Self> {
        let cores = (0..config.max_cores).map(|_| CoreLocal::new()).collect();
        kinfo!("(Kernel) cores com armazenamento local=", config.max_cores);
        Arc::new(Self {
            config,
            platform,
            cores,
            vdso: Once::new(),
        })
    }

    // =========================================================================
    // PLATAFORMA
    // =========================================================================

    #[inline]
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    #[inline]
    pub fn cpu(&self) -> &dyn CpuHal {
        &*self.platform.cpu
    }

    /// Relógio de alta precisão
    #[inline]
    pub fn clock(&self) -> &dyn ClockHal {
        &*self.platform.clock
    }

    #[inline]
    pub fn mmu(&self) -> &dyn MmuHal {
        &*self.platform.mmu
    }

    #[inline]
    pub fn frames(&self) -> &Arc<dyn FrameHal> {
        &self.platform.frames
    }

    #[inline]
    pub fn sched(&self) -> &dyn SchedHal {
        &*self.platform.sched
    }

    // =========================================================================
    // CORE-LOCAL
    // =========================================================================

    /// Armazenamento do core que executa o chamador.
    pub fn core_local(&self) -> &CoreLocal {
        let core = self.cpu().current_core();
        match self.cores.get(core.index()) {
            Some(local) => local,
            None => {
                kerror!("(Kernel) core fora do armazenamento local:", core.0);
                panic!("core id out of range");
            }
        }
    }

    pub fn current_thread(&self) -> Option<Arc<Thread>> {
        self.core_local().current_thread.lock().clone()
    }

    /// Chamado pela plataforma ao despachar uma thread neste core.
    pub fn set_current_thread(&self, thread: Option<Arc<Thread>>) {
        let previous = core::mem::replace(&mut *self.core_local().current_thread.lock(), thread);
        // Solta a anterior fora do lock: o drop pode desmontar um VAS, que
        // consulta a thread atual
        drop(previous);
    }

    // =========================================================================
    // VDSO
    // =========================================================================

    /// Instala o VMO do VDSO. Só a primeira chamada tem efeito.
    pub fn install_vdso(&self, vmo: Arc<Vmo>) {
        self.vdso.call_once(|| vmo);
    }

    pub fn vdso(&self) -> Option<&Arc<Vmo>> {
        self.vdso.get()
    }

    /// Base aleatória, alinhada ao VMO, com `[base, base + len)` dentro da janela.
    fn random_vdso_base(&self, vmo: &Vmo) -> MmResult<VirtAddr> {
        let window_start = self.config.vdso_window_base.as_u64();
        let window_end = self
            .config
            .vdso_window_pages
            .checked_mul(PAGE_SIZE)
            .and_then(|len| window_start.checked_add(len))
            .ok_or(MmError::InvalidAddress)?;

        let align = vmo.page_size();
        let first = align_up_u64(window_start, align);
        let last_end = first.checked_add(vmo.length()).ok_or(MmError::InvalidAddress)?;
        if last_end > window_end {
            return Err(MmError::NotSupported);
        }

        let slots = (window_end - last_end) / align + 1;
        let slot = self.cpu().random_u64() % slots;
        Ok(VirtAddr::new(first + slot * align))
    }

    // =========================================================================
    // FÁBRICAS
    // =========================================================================

    /// VAS novo com a metade superior (kernel) clonada.
    ///
    /// Com `randomize_layout`, o VDSO é mapeado (RX) em base aleatória.
    pub fn create_vas(self: &Arc<Self>, randomize_layout: bool) -> MmResult<Arc<Vas>> {
        let vdso = if randomize_layout {
            Some(self.vdso().cloned().ok_or(MmError::NotSupported)?)
        } else {
            None
        };

        let asid = self.mmu().clone_upper_half()?;
        let vas = Arc::new(Vas::new(self.clone(), asid, true));

        if let Some(vdso) = vdso {
            let base = self.random_vdso_base(&vdso)?;
            vas.map_vmo(vdso, base, MappingFlags::READ_ONLY | MappingFlags::EXECUTABLE)?;
            vas.set_vdso_base(base);
            kdebug!("(Kernel) VDSO mapeado em=", base.as_u64());
        }

        kdebug!("(Kernel) VAS criado asid=", asid.as_u64());
        Ok(vas)
    }

    /// Envolve um ASID já existente (contexto de bootstrap). Não é liberado no drop.
    pub fn adopt_existing_asid(self: &Arc<Self>, asid: PhysAddr) -> Arc<Vas> {
        kdebug!("(Kernel) ASID adotado=", asid.as_u64());
        Arc::new(Vas::new(self.clone(), asid, false))
    }

    pub fn create_process(self: &Arc<Self>, vas: Arc<Vas>) -> Arc<Process> {
        Arc::new(Process::new(self.clone(), vas))
    }

    pub fn create_mailbox(self: &Arc<Self>) -> Arc<Mailbox> {
        Arc::new(Mailbox::new(self.clone()))
    }

    pub fn create_physical_vmo(&self, base: PhysAddr, length: u64, level: usize) -> MmResult<Arc<Vmo>> {
        Vmo::physical(base, length, level).map(Arc::new)
    }

    pub fn create_sparse_vmo(
        &self,
        length: u64,
        level: usize,
        elements: Vec<SparseElement>,
    ) -> MmResult<Arc<Vmo>> {
        Vmo::sparse(length, level, elements).map(Arc::new)
    }

    pub fn create_handle(&self, object: KernelObject, rights: Rights) -> Arc<Handle> {
        Arc::new(Handle::new(object, rights))
    }
}
