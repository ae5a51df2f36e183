//! Hardware Abstraction Layer (HAL)
//!
//! Fronteira entre o núcleo e a plataforma. Bring-up de CPU, APIC/GDT/IDT,
//! HPET, ACPI e UEFI ficam do outro lado desta fronteira; o núcleo só enxerga
//! os traits abaixo.
//!
//! | Trait      | Usado por                                  |
//! |------------|--------------------------------------------|
//! | `CpuHal`   | Locks (máscara de IRQ), core-local storage |
//! | `ClockHal` | Tokens, timestamps de threads, timeouts    |
//! | `MmuHal`   | VAS: ASIDs e tabelas de páginas            |
//! | `FrameHal` | Commit sob demanda de VMOs esparsos        |
//! | `SchedHal` | Entrega de threads prontas / bloqueio      |

pub mod traits;

#[cfg(test)]
pub mod mock;

pub use traits::*;
