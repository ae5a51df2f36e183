//! # Processos e Threads
//!
//! ## 🏗️ Arquitetura
//!
//! ```text
//! Process ──Arc──► Vas
//!    │  ◄──Arc── Thread (a thread mantém o processo vivo)
//!    └──Weak──► Thread  (só bookkeeping)
//! ```
//!
//! Run-queues, preempção e troca de contexto são da plataforma
//! (`hal::SchedHal`). Aqui vivem o ciclo de vida e o contexto inicial.

pub mod context;
pub mod error;
pub mod process;
pub mod state;
pub mod thread;


pub use context::ThreadContext;
pub use error::{ProcError, ProcResult};
pub use process::Process;
pub use state::ThreadState;
pub use thread::{Thread, Tid, WaitResult};
