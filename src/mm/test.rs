//! Self-tests de Memória Virtual
//!
//! Usam um VAS descartável: nada aqui é ativado na CPU.

use crate::kernel::Kernel;
use crate::klib::test_framework::{TestCase, TestResult};
use crate::mm::config::PAGE_SIZE;
use crate::mm::{MappingFlags, MmError, PhysAddr, Vas, VirtAddr};
use alloc::sync::Arc;

/// Casos de teste de memória
pub const MM_TESTS: &[TestCase] = &[
    TestCase::new("vmo_rejects_misaligned_base", test_vmo_misaligned),
    TestCase::new("vas_map_and_translate", test_map_and_translate),
    TestCase::new("vas_rejects_overlap", test_rejects_overlap),
    TestCase::new("vas_range_lock_exclusive", test_range_lock),
];

const BASE: u64 = 0x40_0000;
const FRAME: u64 = 0x10_0000;

/// VAS com um VMO físico de duas páginas em `BASE`.
fn vas_with_mapping(kernel: &Arc<Kernel>) -> Option<Arc<Vas>> {
    let vas = kernel.create_vas(false).ok()?;
    let vmo = kernel
        .create_physical_vmo(PhysAddr::new(FRAME), 2 * PAGE_SIZE, 0)
        .ok()?;
    vas.map_vmo(vmo, VirtAddr::new(BASE), MappingFlags::empty()).ok()?;
    Some(vas)
}

fn test_vmo_misaligned(kernel: &Arc<Kernel>) -> TestResult {
    match kernel.create_physical_vmo(PhysAddr::new(0x1001), PAGE_SIZE, 0) {
        Err(MmError::InvalidAlignment) => TestResult::Pass,
        _ => {
            crate::kerror!("(MM) VMO desalinhado aceito");
            TestResult::Fail
        }
    }
}

fn test_map_and_translate(kernel: &Arc<Kernel>) -> TestResult {
    let Some(vas) = vas_with_mapping(kernel) else {
        return TestResult::Fail;
    };
    let second = vas.translate(VirtAddr::new(BASE + PAGE_SIZE));
    if second != Some(PhysAddr::new(FRAME + PAGE_SIZE)) {
        crate::kerror!("(MM) Tradução errada da segunda página");
        return TestResult::Fail;
    }
    TestResult::Pass
}

fn test_rejects_overlap(kernel: &Arc<Kernel>) -> TestResult {
    let Some(vas) = vas_with_mapping(kernel) else {
        return TestResult::Fail;
    };
    let other = match kernel.create_physical_vmo(PhysAddr::new(FRAME), PAGE_SIZE, 0) {
        Ok(vmo) => vmo,
        Err(_) => return TestResult::Fail,
    };
    match vas.map_vmo(other, VirtAddr::new(BASE + PAGE_SIZE), MappingFlags::empty()) {
        Err(MmError::RegionOverlap) if vas.mapping_count() == 1 => TestResult::Pass,
        _ => {
            crate::kerror!("(MM) Sobreposição não rejeitada");
            TestResult::Fail
        }
    }
}

fn test_range_lock(kernel: &Arc<Kernel>) -> TestResult {
    let Some(vas) = vas_with_mapping(kernel) else {
        return TestResult::Fail;
    };
    let start = VirtAddr::new(BASE);
    let end = start.add(2 * PAGE_SIZE);

    let Some(guard) = vas.lock_address_range(start, end, true) else {
        return TestResult::Fail;
    };
    if !matches!(vas.try_lock_address_range(start, end, true), Err(MmError::Busy)) {
        crate::kerror!("(MM) Lock de faixa não é exclusivo");
        return TestResult::Fail;
    }
    drop(guard);
    if vas.try_lock_address_range(start, end, true).is_err() {
        return TestResult::Fail;
    }
    TestResult::Pass
}
