//! # Inter-Process Communication (IPC)
//!
//! Como processos conversam: mailboxes que carregam handles.
//!
//! ## Mecanismos
//!
//! | Tipo    | Padrão | Payload      | Bloqueio          |
//! |---------|--------|--------------|-------------------|
//! | Mailbox | N:N    | Um `Handle`  | Receive (opcional)|
//!
//! ## Filosofia
//!
//! - **Capability-First**: enviar exige `WRITE`, receber exige `READ` no mailbox
//! - **Move, não copia**: o handle sai da tabela do remetente ao ser enviado
//! - **FIFO dos dois lados**: mensagens na ordem de envio, waiters na ordem de espera

pub mod error;
pub mod mailbox;
pub mod message;

#[cfg(feature = "self_test")]
pub mod test;

pub use error::{IpcError, IpcResult, SendError};
pub use mailbox::{Mailbox, Receive};
pub use message::Message;
