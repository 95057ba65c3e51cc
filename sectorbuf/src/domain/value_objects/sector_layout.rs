//! Address-to-sector mapping for uniform and banked erase layouts.

use super::SectorId;

/// One row of a banked erase layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorBand {
    /// First physical address past this band's sector (exclusive bound).
    pub upper_bound: u32,
    /// Hardware sector index owning addresses below the bound.
    pub sector: SectorId,
}

/// Maps physical addresses to hardware erase-sector indices.
///
/// Evaluated only on the flush path, to pick the erase target for a
/// window. The banked variant models devices whose erase units vary with
/// the address (small sectors at the bottom of flash, larger ones above a
/// threshold); its table is the device's documented sector layout and is
/// kept as data rather than branching code, matched first-bound-wins.
///
/// Addresses handed to [`sector_id_of`](Self::sector_id_of) must lie
/// inside the laid-out range.
#[derive(Debug, Clone, Copy)]
pub enum SectorLayout {
    /// Equal-size erase units counted from `base`.
    Uniform {
        /// Physical address mapping to sector 0.
        base: u32,
        /// Size of one erase unit in bytes.
        erase_size: u32,
    },
    /// Ordered bands of growing addresses; addresses at or above the last
    /// bound belong to the `beyond` sector.
    Banked {
        /// Physical address of the first band's sector.
        base: u32,
        /// Physical end of the laid-out range (exclusive).
        end: u32,
        /// Ordered rows, one per sector below the last bound.
        bands: &'static [SectorBand],
        /// Sector owning the span from the last bound to `end`.
        beyond: SectorId,
    },
}

impl SectorLayout {
    /// STM32F405/F407 1 MiB internal flash: four 16 KiB sectors, one
    /// 64 KiB sector, then seven 128 KiB sectors.
    pub const STM32F405: Self = Self::Banked {
        base: 0x0800_0000,
        end: 0x0810_0000,
        bands: &[
            SectorBand { upper_bound: 0x0800_4000, sector: SectorId::new(0) },
            SectorBand { upper_bound: 0x0800_8000, sector: SectorId::new(1) },
            SectorBand { upper_bound: 0x0800_C000, sector: SectorId::new(2) },
            SectorBand { upper_bound: 0x0801_0000, sector: SectorId::new(3) },
            SectorBand { upper_bound: 0x0802_0000, sector: SectorId::new(4) },
            SectorBand { upper_bound: 0x0804_0000, sector: SectorId::new(5) },
            SectorBand { upper_bound: 0x0806_0000, sector: SectorId::new(6) },
            SectorBand { upper_bound: 0x0808_0000, sector: SectorId::new(7) },
            SectorBand { upper_bound: 0x080A_0000, sector: SectorId::new(8) },
            SectorBand { upper_bound: 0x080C_0000, sector: SectorId::new(9) },
            SectorBand { upper_bound: 0x080E_0000, sector: SectorId::new(10) },
        ],
        beyond: SectorId::new(11),
    };

    /// Map a physical address to the erase sector covering it.
    pub fn sector_id_of(&self, address: u32) -> SectorId {
        match *self {
            Self::Uniform { base, erase_size } => {
                SectorId::new((address - base) / erase_size)
            }
            Self::Banked { bands, beyond, .. } => {
                for band in bands {
                    if address < band.upper_bound {
                        return band.sector;
                    }
                }
                beyond
            }
        }
    }

    /// Inverse mapping: the physical span `(start, len)` the given sector
    /// erases, or `None` when the layout has no such sector.
    pub fn sector_span(&self, sector: SectorId) -> Option<(u32, u32)> {
        match *self {
            Self::Uniform { base, erase_size } => {
                let start = base.checked_add(sector.value().checked_mul(erase_size)?)?;
                Some((start, erase_size))
            }
            Self::Banked {
                base,
                end,
                bands,
                beyond,
            } => {
                let mut start = base;
                for band in bands {
                    if band.sector == sector {
                        return Some((start, band.upper_bound - start));
                    }
                    start = band.upper_bound;
                }
                if sector == beyond {
                    Some((start, end - start))
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_mapping() {
        let layout = SectorLayout::Uniform {
            base: 0x0800_0000,
            erase_size: 0x4000,
        };
        assert_eq!(layout.sector_id_of(0x0800_0000), SectorId::new(0));
        assert_eq!(layout.sector_id_of(0x0800_3FFF), SectorId::new(0));
        assert_eq!(layout.sector_id_of(0x0800_4000), SectorId::new(1));
        assert_eq!(layout.sector_id_of(0x0801_2345), SectorId::new(4));
    }

    #[test]
    fn test_uniform_span() {
        let layout = SectorLayout::Uniform {
            base: 0x0800_0000,
            erase_size: 0x4000,
        };
        assert_eq!(layout.sector_span(SectorId::new(2)), Some((0x0800_8000, 0x4000)));
    }

    #[test]
    fn test_banked_thresholds() {
        let layout = SectorLayout::STM32F405;
        assert_eq!(layout.sector_id_of(0x0800_0000), SectorId::new(0));
        assert_eq!(layout.sector_id_of(0x0800_3FFF), SectorId::new(0));
        assert_eq!(layout.sector_id_of(0x0800_4000), SectorId::new(1));
        assert_eq!(layout.sector_id_of(0x0800_FFFF), SectorId::new(3));
        assert_eq!(layout.sector_id_of(0x0801_0000), SectorId::new(4));
        assert_eq!(layout.sector_id_of(0x0801_FFFF), SectorId::new(4));
        assert_eq!(layout.sector_id_of(0x0802_0000), SectorId::new(5));
        assert_eq!(layout.sector_id_of(0x080D_FFFF), SectorId::new(10));
        assert_eq!(layout.sector_id_of(0x080E_0000), SectorId::new(11));
        assert_eq!(layout.sector_id_of(0x080F_FFFF), SectorId::new(11));
    }

    #[test]
    fn test_banked_mapping_is_stable() {
        let layout = SectorLayout::STM32F405;
        for address in [0x0800_0000, 0x0800_C123, 0x0805_0000] {
            assert_eq!(layout.sector_id_of(address), layout.sector_id_of(address));
        }
    }

    #[test]
    fn test_banked_spans() {
        let layout = SectorLayout::STM32F405;
        assert_eq!(layout.sector_span(SectorId::new(0)), Some((0x0800_0000, 0x4000)));
        assert_eq!(layout.sector_span(SectorId::new(4)), Some((0x0801_0000, 0x1_0000)));
        assert_eq!(layout.sector_span(SectorId::new(11)), Some((0x080E_0000, 0x2_0000)));
        assert_eq!(layout.sector_span(SectorId::new(12)), None);
    }
}
