//! Self-tests de IPC (Mailbox)
//!
//! Só caminhos que não bloqueiam: a thread usada nunca é despachada.

use crate::ipc::{IpcError, Message, Receive};
use crate::kernel::Kernel;
use crate::klib::test_framework::{TestCase, TestResult};
use crate::object::{Handle, KernelObject, Rights};
use alloc::sync::Arc;

/// Casos de teste de IPC
pub const IPC_TESTS: &[TestCase] = &[
    TestCase::new("mailbox_fifo", test_mailbox_fifo),
    TestCase::new("mailbox_closed_rejects_send", test_closed_rejects_send),
];

fn payload(kernel: &Arc<Kernel>) -> Arc<Handle> {
    kernel.create_handle(KernelObject::Mailbox(kernel.create_mailbox()), Rights::READ)
}

fn test_mailbox_fifo(kernel: &Arc<Kernel>) -> TestResult {
    let Ok(vas) = kernel.create_vas(false) else {
        return TestResult::Fail;
    };
    let process = kernel.create_process(vas);
    let Ok(thread) = process.create_thread() else {
        return TestResult::Fail;
    };
    let mailbox = kernel.create_mailbox();

    for sender in 1..=3 {
        if mailbox.send(Message::new(payload(kernel), sender)).is_err() {
            return TestResult::Fail;
        }
    }
    for expected in 1..=3 {
        match mailbox.receive(&thread, None) {
            Ok(Receive::Message(msg)) if msg.sender() == expected => {}
            _ => {
                crate::kerror!("(IPC) Ordem FIFO quebrada em=", expected);
                return TestResult::Fail;
            }
        }
    }
    TestResult::Pass
}

fn test_closed_rejects_send(kernel: &Arc<Kernel>) -> TestResult {
    let mailbox = kernel.create_mailbox();
    mailbox.close();
    let handle = payload(kernel);
    match mailbox.send(Message::new(handle.clone(), 0)) {
        // A mensagem recusada volta com o mesmo handle
        Err(refused)
            if refused.kind == IpcError::Closed
                && Arc::ptr_eq(refused.message.payload(), &handle) =>
        {
            TestResult::Pass
        }
        _ => TestResult::Fail,
    }
}
