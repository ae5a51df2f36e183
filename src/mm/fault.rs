//! # Page Fault Handler
//!
//! Ponte entre o vetor de page fault da plataforma e o commit sob demanda do
//! VAS da thread atual.

use crate::kernel::Kernel;
use crate::mm::{MmError, MmResult, PhysAddr, VirtAddr};

/// Tipo de acesso que causou o fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    Read,
    Write,
    Execute,
}

#[derive(Debug, Clone, Copy)]
pub struct PageFaultInfo {
    pub addr: VirtAddr,
    pub ip: VirtAddr,
    pub error_code: u64,
    pub access: AccessType,
    pub user_mode: bool,
}

impl PageFaultInfo {
    /// Decodifica o error code de #PF (x86_64).
    pub fn from_error_code(addr: u64, ip: u64, error_code: u64) -> Self {
        let access = if error_code & 0x10 != 0 {
            AccessType::Execute
        } else if error_code & 0x02 != 0 {
            AccessType::Write
        } else {
            AccessType::Read
        };
        Self {
            addr: VirtAddr::new(addr),
            ip: VirtAddr::new(ip),
            error_code,
            access,
            user_mode: error_code & 0x04 != 0,
        }
    }
}

/// Resolve um fault no VAS do processo da thread atual.
///
/// Retorna o frame que passou a apoiar o endereço. Qualquer erro significa que
/// o fault não é recuperável e a plataforma deve matar o processo.
pub fn handle_page_fault(kernel: &Kernel, info: PageFaultInfo) -> MmResult<PhysAddr> {
    // 1. Faults no espaço do kernel nunca são resolvidos aqui
    if info.addr >= kernel.config().user_space_end {
        kerror!("(Fault) Page fault fora do espaço de usuário:", info.addr.as_u64());
        kerror!("(Fault) RIP:", info.ip.as_u64());
        return Err(MmError::InvalidAddress);
    }

    // 2. VAS da thread atual
    let thread = kernel.current_thread().ok_or(MmError::NotMapped)?;
    let vas = thread.process().vas().clone();

    // 3. Commit / reinstalação
    let result = vas.handle_page_fault(info.addr, info.access);
    if let Err(e) = result {
        kwarn!("(Fault) Fault não resolvido em:", info.addr.as_u64());
        kwarn!(e.as_str());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::mock::mock_kernel;
    use crate::mm::config::PAGE_SIZE;
    use crate::mm::{MappingFlags, SparseElement};
    use alloc::vec;

    #[test]
    fn test_decode_error_code() {
        let info = PageFaultInfo::from_error_code(0x1000, 0x2000, 0x06);
        assert_eq!(info.access, AccessType::Write);
        assert!(info.user_mode);

        let info = PageFaultInfo::from_error_code(0x1000, 0x2000, 0x14);
        assert_eq!(info.access, AccessType::Execute);

        let info = PageFaultInfo::from_error_code(0x1000, 0x2000, 0x00);
        assert_eq!(info.access, AccessType::Read);
        assert!(!info.user_mode);
    }

    #[test]
    fn test_fault_commits_in_current_vas() {
        let (platform, kernel) = mock_kernel();
        let vas = kernel.create_vas(false).unwrap();
        let vmo = kernel
            .create_sparse_vmo(2 * PAGE_SIZE, 0, vec![SparseElement::uncommitted(PAGE_SIZE)])
            .unwrap();
        vas.map_vmo(vmo, VirtAddr::new(0x50_0000), MappingFlags::empty()).unwrap();

        let process = kernel.create_process(vas.clone());
        kernel.set_current_thread(Some(process.create_thread().unwrap()));

        // Escrita na segunda página (0x06: user + write)
        let info = PageFaultInfo::from_error_code(0x50_1010, 0x40_0000, 0x06);
        let frame = handle_page_fault(&kernel, info).unwrap();
        assert_eq!(platform.frames_allocated(), 1);
        assert_eq!(vas.translate(VirtAddr::new(0x50_1010)), Some(frame));

        // Primeira página não existe no VMO
        let hole = PageFaultInfo::from_error_code(0x50_0000, 0x40_0000, 0x04);
        assert!(handle_page_fault(&kernel, hole).is_err());

        let kernel_addr = PageFaultInfo::from_error_code(0xFFFF_8000_0000_0000, 0, 0);
        assert_eq!(handle_page_fault(&kernel, kernel_addr).err(), Some(MmError::InvalidAddress));

        kernel.set_current_thread(None);
        assert_eq!(handle_page_fault(&kernel, info).err(), Some(MmError::NotMapped));
    }
}
