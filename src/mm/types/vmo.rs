//! # VMO - Virtual Memory Object
//!
//! Descritor da memória de apoio de um mapeamento.
//!
//! ## 🏗️ Arquitetura
//!
//! ```text
//! Vmo
//!  ├── length               (múltiplo do tamanho de página do nível)
//!  ├── page_alignment_level (0 = 4 KiB, 1 = 2 MiB, 2 = 1 GiB)
//!  └── backing
//!       ├── Physical { base }          uma faixa física contígua
//!       └── Sparse   { páginas }       offset + frame opcional (ausente = não commitado)
//! ```
//!
//! O VMO não conhece os VAS onde está mapeado. Frames alocados sob demanda
//! pertencem ao VMO e voltam ao `FrameHal` quando ele morre; a memória de um
//! VMO físico pertence a quem o criou.

use crate::hal::FrameHal;
use crate::mm::config::page_size_for_level;
use crate::mm::error::{MmError, MmResult};
use crate::mm::PhysAddr;
use crate::object::{generate_koid, KObject, Koid};
use alloc::sync::Arc;
use alloc::vec::Vec;
use spin::{Mutex, Once};

/// Elemento de um VMO esparso, como fornecido na criação.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SparseElement {
    /// Offset dentro do VMO (alinhado ao tamanho de página do nível)
    pub offset: u64,
    /// Frame de apoio; `None` = não commitado
    pub frame: Option<PhysAddr>,
}

impl SparseElement {
    pub const fn committed(offset: u64, frame: PhysAddr) -> Self {
        Self {
            offset,
            frame: Some(frame),
        }
    }

    pub const fn uncommitted(offset: u64) -> Self {
        Self {
            offset,
            frame: None,
        }
    }
}

/// Página de um VMO esparso
#[derive(Debug, Clone, Copy)]
struct SparsePage {
    offset: u64,
    frame: Option<PhysAddr>,
    /// Frame veio do commit sob demanda (o VMO é dono)
    on_demand: bool,
}

enum Backing {
    Physical {
        base: PhysAddr,
    },
    Sparse {
        /// Ordenado por offset. Adquirido sob o lock de um VAS (IRQs mascaradas).
        pages: Mutex<Vec<SparsePage>>,
        /// Alocador que forneceu os frames sob demanda
        frames: Once<Arc<dyn FrameHal>>,
    },
}

/// Resultado da busca de um offset no VMO
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Frame físico que apoia a página que começa em `page_offset`
    Backed { page_offset: u64, frame: PhysAddr },
    /// Elemento esparso existe mas ainda não tem frame
    Uncommitted { page_offset: u64 },
    /// Nenhum elemento cobre o offset (ou offset além do tamanho)
    Hole,
}

/// Virtual Memory Object
pub struct Vmo {
    koid: Koid,
    length: u64,
    level: usize,
    backing: Backing,
}

impl Vmo {
    /// VMO apoiado por `[base, base + length)` físico contíguo.
    pub fn physical(base: PhysAddr, length: u64, level: usize) -> MmResult<Self> {
        let page_size = Self::validate(length, level)?;
        if !base.is_aligned(page_size) {
            return Err(MmError::InvalidAlignment);
        }
        if base.as_u64().checked_add(length).is_none() {
            return Err(MmError::InvalidAddress);
        }

        Ok(Self {
            koid: generate_koid(),
            length,
            level,
            backing: Backing::Physical { base },
        })
    }

    /// VMO esparso. Cada elemento cobre uma página do nível; offsets
    /// estritamente crescentes, alinhados e dentro de `length`.
    pub fn sparse(length: u64, level: usize, elements: Vec<SparseElement>) -> MmResult<Self> {
        let page_size = Self::validate(length, level)?;

        let mut pages = Vec::with_capacity(elements.len());
        let mut next_free = 0u64;
        for element in elements {
            if element.offset % page_size != 0 {
                return Err(MmError::InvalidAlignment);
            }
            if element.offset < next_free || element.offset >= length {
                return Err(MmError::InvalidLayout);
            }
            if let Some(frame) = element.frame {
                if !frame.is_aligned(page_size) {
                    return Err(MmError::InvalidAlignment);
                }
            }
            next_free = element.offset + page_size;
            pages.push(SparsePage {
                offset: element.offset,
                frame: element.frame,
                on_demand: false,
            });
        }

        Ok(Self {
            koid: generate_koid(),
            length,
            level,
            backing: Backing::Sparse {
                pages: Mutex::new(pages),
                frames: Once::new(),
            },
        })
    }

    fn validate(length: u64, level: usize) -> MmResult<u64> {
        let page_size = page_size_for_level(level).ok_or(MmError::InvalidLevel)?;
        if length == 0 || length % page_size != 0 {
            return Err(MmError::InvalidSize);
        }
        Ok(page_size)
    }

    #[inline]
    pub fn length(&self) -> u64 {
        self.length
    }

    #[inline]
    pub fn page_alignment_level(&self) -> usize {
        self.level
    }

    /// Tamanho de página exigido para mapear este VMO.
    #[inline]
    pub fn page_size(&self) -> u64 {
        // Nível validado na construção
        page_size_for_level(self.level).unwrap_or(crate::mm::config::PAGE_SIZE)
    }

    /// Base física, se for um VMO físico contíguo.
    pub fn physical_base(&self) -> Option<PhysAddr> {
        match &self.backing {
            Backing::Physical { base } => Some(*base),
            Backing::Sparse { .. } => None,
        }
    }

    /// Elementos esparsos já commitados, em ordem de offset.
    pub fn committed_elements(&self) -> Vec<SparseElement> {
        match &self.backing {
            Backing::Physical { .. } => Vec::new(),
            Backing::Sparse { pages, .. } => pages
                .lock()
                .iter()
                .filter_map(|p| p.frame.map(|f| SparseElement::committed(p.offset, f)))
                .collect(),
        }
    }

    /// Localiza a página que contém `offset`.
    pub fn lookup(&self, offset: u64) -> Lookup {
        if offset >= self.length {
            return Lookup::Hole;
        }
        let page_offset = offset - offset % self.page_size();

        match &self.backing {
            Backing::Physical { base } => Lookup::Backed {
                page_offset,
                frame: base.add(page_offset),
            },
            Backing::Sparse { pages, .. } => {
                let pages = pages.lock();
                match pages.binary_search_by_key(&page_offset, |p| p.offset) {
                    Ok(i) => match pages[i].frame {
                        Some(frame) => Lookup::Backed { page_offset, frame },
                        None => Lookup::Uncommitted { page_offset },
                    },
                    Err(_) => Lookup::Hole,
                }
            }
        }
    }

    /// Commit sob demanda da página em `page_offset`.
    ///
    /// Se outro fault commitou a página primeiro, devolve o frame existente.
    pub fn commit(&self, page_offset: u64, frames: &Arc<dyn FrameHal>) -> MmResult<PhysAddr> {
        let page_size = self.page_size();
        match &self.backing {
            Backing::Physical { base } => Ok(base.add(page_offset)),
            Backing::Sparse {
                pages,
                frames: owner,
            } => {
                let mut pages = pages.lock();
                let idx = pages
                    .binary_search_by_key(&page_offset, |p| p.offset)
                    .map_err(|_| MmError::NotMapped)?;

                if let Some(frame) = pages[idx].frame {
                    return Ok(frame);
                }

                let frame = frames.allocate(page_size).ok_or(MmError::OutOfMemory)?;
                owner.call_once(|| frames.clone());
                pages[idx].frame = Some(frame);
                pages[idx].on_demand = true;
                ktrace!("(VMO) commit: frame=", frame.as_u64());
                Ok(frame)
            }
        }
    }
}

impl KObject for Vmo {
    fn koid(&self) -> Koid {
        self.koid
    }

    fn type_name(&self) -> &'static str {
        "Vmo"
    }
}

impl Drop for Vmo {
    fn drop(&mut self) {
        let page_size = self.page_size();
        if let Backing::Sparse { pages, frames } = &mut self.backing {
            let Some(allocator) = frames.get() else {
                return;
            };
            for page in pages.get_mut().iter() {
                if let (true, Some(frame)) = (page.on_demand, page.frame) {
                    allocator.free(frame, page_size);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::mock::MockPlatform;
    use crate::mm::config::{HUGE_PAGE_SIZE, PAGE_SIZE};
    use alloc::vec;

    #[test]
    fn test_physical_validation() {
        assert_eq!(
            Vmo::physical(PhysAddr::new(0x1000), 0, 0).err(),
            Some(MmError::InvalidSize)
        );
        assert_eq!(
            Vmo::physical(PhysAddr::new(0x1000), 0x1800, 0).err(),
            Some(MmError::InvalidSize)
        );
        assert_eq!(
            Vmo::physical(PhysAddr::new(0x1000), HUGE_PAGE_SIZE, 1).err(),
            Some(MmError::InvalidAlignment)
        );
        assert_eq!(
            Vmo::physical(PhysAddr::new(0x1000), PAGE_SIZE, 3).err(),
            Some(MmError::InvalidLevel)
        );

        let vmo = Vmo::physical(PhysAddr::new(0x20_0000), 2 * PAGE_SIZE, 0).unwrap();
        assert_eq!(vmo.length(), 2 * PAGE_SIZE);
        assert_eq!(vmo.physical_base(), Some(PhysAddr::new(0x20_0000)));
        assert_eq!(
            vmo.lookup(PAGE_SIZE + 5),
            Lookup::Backed {
                page_offset: PAGE_SIZE,
                frame: PhysAddr::new(0x20_1000)
            }
        );
        assert_eq!(vmo.lookup(2 * PAGE_SIZE), Lookup::Hole);
    }

    #[test]
    fn test_sparse_layout_rules() {
        let out_of_order = vec![
            SparseElement::uncommitted(PAGE_SIZE),
            SparseElement::uncommitted(0),
        ];
        assert_eq!(
            Vmo::sparse(4 * PAGE_SIZE, 0, out_of_order).err(),
            Some(MmError::InvalidLayout)
        );

        let beyond = vec![SparseElement::uncommitted(4 * PAGE_SIZE)];
        assert_eq!(
            Vmo::sparse(4 * PAGE_SIZE, 0, beyond).err(),
            Some(MmError::InvalidLayout)
        );

        let misaligned = vec![SparseElement::uncommitted(0x800)];
        assert_eq!(
            Vmo::sparse(4 * PAGE_SIZE, 0, misaligned).err(),
            Some(MmError::InvalidAlignment)
        );
    }

    #[test]
    fn test_sparse_commit_and_release() {
        let platform = Arc::new(MockPlatform::new());
        let frames: Arc<dyn FrameHal> = platform.clone();

        let vmo = Vmo::sparse(
            4 * PAGE_SIZE,
            0,
            vec![
                SparseElement::committed(0, PhysAddr::new(0x9000)),
                SparseElement::uncommitted(2 * PAGE_SIZE),
            ],
        )
        .unwrap();

        assert_eq!(vmo.committed_elements().len(), 1);
        assert_eq!(vmo.lookup(PAGE_SIZE), Lookup::Hole);
        assert_eq!(
            vmo.lookup(2 * PAGE_SIZE + 1),
            Lookup::Uncommitted {
                page_offset: 2 * PAGE_SIZE
            }
        );

        let frame = vmo.commit(2 * PAGE_SIZE, &frames).unwrap();
        // Segundo commit reaproveita o frame
        assert_eq!(vmo.commit(2 * PAGE_SIZE, &frames).unwrap(), frame);
        assert_eq!(platform.frames_allocated(), 1);
        assert_eq!(vmo.committed_elements().len(), 2);
        assert_eq!(vmo.commit(PAGE_SIZE, &frames).err(), Some(MmError::NotMapped));

        drop(vmo);
        // Só o frame sob demanda volta ao alocador
        assert_eq!(platform.freed_frames(), vec![frame]);
    }

    #[test]
    fn test_commit_out_of_memory() {
        let platform = Arc::new(MockPlatform::new());
        platform.set_frame_limit(0);
        let frames: Arc<dyn FrameHal> = platform.clone();

        let vmo = Vmo::sparse(PAGE_SIZE, 0, vec![SparseElement::uncommitted(0)]).unwrap();
        assert_eq!(vmo.commit(0, &frames).err(), Some(MmError::OutOfMemory));
        assert_eq!(vmo.lookup(0), Lookup::Uncommitted { page_offset: 0 });
    }
}
