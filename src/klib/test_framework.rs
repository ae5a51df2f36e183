//! Framework de testes do kernel
//!
//! Self-tests executados no boot (feature `self_test`), sobre a plataforma
//! real. Cada subsistema exporta uma lista `const` de `TestCase`.

use crate::kernel::Kernel;
use alloc::sync::Arc;

/// Resultado de teste
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestResult {
    Pass,
    Fail,
    Skip,
}

/// Um caso de teste
pub struct TestCase {
    pub name: &'static str,
    pub func: fn(&Arc<Kernel>) -> TestResult,
}

impl TestCase {
    pub const fn new(name: &'static str, func: fn(&Arc<Kernel>) -> TestResult) -> Self {
        Self { name, func }
    }
}

/// Contagem de uma suite
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuiteReport {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl SuiteReport {
    fn merge(&mut self, other: SuiteReport) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

/// Executa suite de testes
pub fn run_test_suite(name: &str, kernel: &Arc<Kernel>, tests: &[TestCase]) -> SuiteReport {
    crate::kinfo!("=== Executando suite:");
    crate::kinfo!(name);

    let mut report = SuiteReport::default();
    for test in tests {
        match (test.func)(kernel) {
            TestResult::Pass => {
                crate::ktrace!("[PASS]");
                crate::ktrace!(test.name);
                report.passed += 1;
            }
            TestResult::Fail => {
                crate::kerror!("[FAIL]");
                crate::kerror!(test.name);
                report.failed += 1;
            }
            TestResult::Skip => {
                crate::kwarn!("[SKIP]");
                crate::kwarn!(test.name);
                report.skipped += 1;
            }
        }
    }

    crate::kinfo!("Resultados: passed=", report.passed);
    if report.failed > 0 {
        crate::kerror!("Resultados: failed=", report.failed);
    }
    report
}

/// Executa todas as suites. `true` se nenhuma falhou.
pub fn run_self_tests(kernel: &Arc<Kernel>) -> bool {
    let mut total = SuiteReport::default();
    total.merge(run_test_suite("Object", kernel, crate::object::test::OBJECT_TESTS));
    total.merge(run_test_suite("MM", kernel, crate::mm::test::MM_TESTS));
    total.merge(run_test_suite("Sched", kernel, crate::sched::test::SCHED_TESTS));
    total.merge(run_test_suite("IPC", kernel, crate::ipc::test::IPC_TESTS));

    crate::kinfo!("Self-tests: passed=", total.passed);
    total.failed == 0
}
