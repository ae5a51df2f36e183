//! Plataforma mock para testes no host
//!
//! Implementa os cinco traits do HAL em software:
//! - CPU: flag de interrupção e core atual por thread do host
//! - Clock: relógio que avança um passo a cada leitura
//! - MMU: tabelas de páginas como faixas `(asid, início) -> (fim, phys, flags)`
//! - Frames: alocador bump com limite opcional
//! - Sched: run-queue que só registra as threads entregues

use crate::config::KernelConfig;
use crate::hal::{ClockHal, CoreId, CpuHal, FrameHal, MmuHal, SchedHal};
use crate::kernel::{Kernel, Platform};
use crate::mm::aspace::MappingFlags;
use crate::mm::{MmError, MmResult, PhysAddr, VirtAddr};
use crate::sched::Thread;
use crate::time::Instant;
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use spin::Mutex;
use std::cell::Cell;

std::thread_local! {
    static IRQ_ENABLED: Cell<bool> = const { Cell::new(true) };
    static CURRENT_CORE: Cell<u32> = const { Cell::new(0) };
}

/// Base dos ASIDs entregues por `clone_upper_half`
const ASID_BASE: u64 = 0x10_0000;
/// Base do alocador bump de frames
const FRAME_BASE: u64 = 0x4000_0000;

/// Entrada de tradução instalada
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockEntry {
    pub end: VirtAddr,
    pub phys: PhysAddr,
    pub flags: MappingFlags,
}

type BlockHook = Box<dyn Fn(&Arc<Thread>) + Send + Sync>;

pub struct MockPlatform {
    clock: AtomicU64,
    clock_step: AtomicU64,
    rng: AtomicU64,
    next_asid: AtomicU64,
    fail_asid: AtomicBool,
    released_asids: Mutex<Vec<PhysAddr>>,
    tables: Mutex<BTreeMap<(PhysAddr, VirtAddr), MockEntry>>,
    map_calls: AtomicUsize,
    next_frame: AtomicU64,
    frame_limit: AtomicUsize,
    frames_allocated: AtomicUsize,
    freed_frames: Mutex<Vec<PhysAddr>>,
    run_queue: Mutex<Vec<Arc<Thread>>>,
    block_hook: Mutex<Option<BlockHook>>,
    block_calls: AtomicUsize,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            clock: AtomicU64::new(1_000),
            clock_step: AtomicU64::new(1),
            rng: AtomicU64::new(0x2545_F491_4F6C_DD1D),
            next_asid: AtomicU64::new(ASID_BASE),
            fail_asid: AtomicBool::new(false),
            released_asids: Mutex::new(Vec::new()),
            tables: Mutex::new(BTreeMap::new()),
            map_calls: AtomicUsize::new(0),
            next_frame: AtomicU64::new(FRAME_BASE),
            frame_limit: AtomicUsize::new(usize::MAX),
            frames_allocated: AtomicUsize::new(0),
            freed_frames: Mutex::new(Vec::new()),
            run_queue: Mutex::new(Vec::new()),
            block_hook: Mutex::new(None),
            block_calls: AtomicUsize::new(0),
        }
    }

    // --- CPU ---

    /// Define o core reportado para a thread do host chamadora.
    pub fn set_current_core(&self, core: u32) {
        CURRENT_CORE.with(|c| c.set(core));
    }

    // --- Clock ---

    /// Passo aplicado a cada leitura (0 congela o relógio).
    pub fn set_clock_step(&self, step: u64) {
        self.clock_step.store(step, Ordering::SeqCst);
    }

    pub fn advance(&self, nanos: u64) {
        self.clock.fetch_add(nanos, Ordering::SeqCst);
    }

    pub fn peek_now(&self) -> Instant {
        Instant::from_nanos(self.clock.load(Ordering::SeqCst))
    }

    // --- MMU ---

    pub fn fail_next_asid(&self) {
        self.fail_asid.store(true, Ordering::SeqCst);
    }

    pub fn released_asids(&self) -> Vec<PhysAddr> {
        self.released_asids.lock().clone()
    }

    /// Faixas instaladas para `asid`, em ordem de endereço.
    pub fn entries(&self, asid: PhysAddr) -> Vec<(VirtAddr, MockEntry)> {
        self.tables
            .lock()
            .iter()
            .filter(|((a, _), _)| *a == asid)
            .map(|((_, start), e)| (*start, *e))
            .collect()
    }

    pub fn map_calls(&self) -> usize {
        self.map_calls.load(Ordering::SeqCst)
    }

    // --- Frames ---

    pub fn set_frame_limit(&self, limit: usize) {
        self.frame_limit.store(limit, Ordering::SeqCst);
    }

    pub fn frames_allocated(&self) -> usize {
        self.frames_allocated.load(Ordering::SeqCst)
    }

    pub fn freed_frames(&self) -> Vec<PhysAddr> {
        self.freed_frames.lock().clone()
    }

    // --- Sched ---

    /// Threads entregues a `schedule`, na ordem de entrega.
    pub fn scheduled(&self) -> Vec<Arc<Thread>> {
        self.run_queue.lock().clone()
    }

    /// Executado uma vez no próximo `block`, simulando outro core agindo enquanto a thread dorme.
    pub fn on_block(&self, hook: impl Fn(&Arc<Thread>) + Send + Sync + 'static) {
        *self.block_hook.lock() = Some(Box::new(hook));
    }

    /// Quantas vezes `block` foi chamado.
    pub fn block_calls(&self) -> usize {
        self.block_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuHal for MockPlatform {
    fn current_core(&self) -> CoreId {
        CoreId(CURRENT_CORE.with(|c| c.get()))
    }

    fn interrupts_enabled(&self) -> bool {
        IRQ_ENABLED.with(|f| f.get())
    }

    fn disable_interrupts(&self) {
        IRQ_ENABLED.with(|f| f.set(false));
    }

    fn enable_interrupts(&self) {
        IRQ_ENABLED.with(|f| f.set(true));
    }

    fn random_u64(&self) -> u64 {
        // xorshift64
        let mut x = self.rng.load(Ordering::Relaxed);
        loop {
            let mut next = x;
            next ^= next << 13;
            next ^= next >> 7;
            next ^= next << 17;
            match self
                .rng
                .compare_exchange(x, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(current) => x = current,
            }
        }
    }
}

impl ClockHal for MockPlatform {
    fn now(&self) -> Instant {
        let step = self.clock_step.load(Ordering::SeqCst);
        Instant::from_nanos(self.clock.fetch_add(step, Ordering::SeqCst))
    }
}

impl MmuHal for MockPlatform {
    fn clone_upper_half(&self) -> MmResult<PhysAddr> {
        if self.fail_asid.swap(false, Ordering::SeqCst) {
            return Err(MmError::OutOfMemory);
        }
        Ok(PhysAddr::new(self.next_asid.fetch_add(0x1000, Ordering::SeqCst)))
    }

    fn release_asid(&self, asid: PhysAddr) {
        self.tables.lock().retain(|(a, _), _| *a != asid);
        self.released_asids.lock().push(asid);
    }

    fn map_physical(
        &self,
        asid: PhysAddr,
        start: VirtAddr,
        end: VirtAddr,
        phys: PhysAddr,
        flags: MappingFlags,
    ) -> MmResult<()> {
        let mut tables = self.tables.lock();
        let clash = tables
            .iter()
            .any(|((a, s), e)| *a == asid && *s < end && start < e.end);
        if clash {
            return Err(MmError::AlreadyMapped);
        }
        tables.insert((asid, start), MockEntry { end, phys, flags });
        self.map_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn unmap_range(&self, asid: PhysAddr, start: VirtAddr, end: VirtAddr) {
        self.tables
            .lock()
            .retain(|(a, s), _| !(*a == asid && *s >= start && *s < end));
    }

    fn translate(&self, asid: PhysAddr, virt: VirtAddr) -> Option<PhysAddr> {
        let tables = self.tables.lock();
        tables
            .range(..=(asid, virt))
            .next_back()
            .filter(|((a, s), e)| *a == asid && virt >= *s && virt < e.end)
            .map(|((_, s), e)| e.phys.add(virt.offset_from(*s)))
    }
}

impl FrameHal for MockPlatform {
    fn allocate(&self, page_size: u64) -> Option<PhysAddr> {
        let count = self.frames_allocated.fetch_add(1, Ordering::SeqCst);
        if count >= self.frame_limit.load(Ordering::SeqCst) {
            self.frames_allocated.fetch_sub(1, Ordering::SeqCst);
            return None;
        }
        let mut cur = self.next_frame.load(Ordering::SeqCst);
        loop {
            let base = crate::klib::align::align_up_u64(cur, page_size);
            match self.next_frame.compare_exchange(
                cur,
                base + page_size,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Some(PhysAddr::new(base)),
                Err(actual) => cur = actual,
            }
        }
    }

    fn free(&self, frame: PhysAddr, _page_size: u64) {
        self.freed_frames.lock().push(frame);
    }
}

impl SchedHal for MockPlatform {
    fn schedule(&self, thread: Arc<Thread>) {
        self.run_queue.lock().push(thread);
    }

    fn block(&self, thread: &Arc<Thread>) {
        self.block_calls.fetch_add(1, Ordering::SeqCst);
        let hook = self.block_hook.lock().take();
        if let Some(hook) = hook {
            hook(thread);
        }
    }
}

/// Kernel sobre uma plataforma mock nova.
pub fn mock_kernel() -> (Arc<MockPlatform>, Arc<Kernel>) {
    mock_kernel_with(KernelConfig::with_cores(4))
}

pub fn mock_kernel_with(config: KernelConfig) -> (Arc<MockPlatform>, Arc<Kernel>) {
    let platform = Arc::new(MockPlatform::new());
    let kernel = Kernel::new(
        config,
        Platform {
            cpu: platform.clone(),
            clock: platform.clone(),
            mmu: platform.clone(),
            frames: platform.clone(),
            sched: platform.clone(),
        },
    );
    (platform, kernel)
}
