//! Flush engine - commits windows through erase-then-program.
//!
//! This adapter connects the domain's [`SectorStore`] port to a raw
//! [`SectorFlash`] device, translating a window commit into the physical
//! sequence the hardware requires.

use crate::domain::{ports::SectorStore, value_objects::SectorLayout};
use sectorbuf_flash_device::{words, SectorFlash, WORD_SIZE};

/// Commits window images to a [`SectorFlash`] device.
///
/// `load` passes reads straight through. `commit` runs the whole
/// erase-then-program sequence under the device lock:
///
/// 1. unlock the program/erase engine; a refusal is returned to the
///    caller before anything destructive has happened,
/// 2. resolve the erase sector for the window base through the
///    [`SectorLayout`],
/// 3. erase that sector in full (bytes the window never touched are
///    restored from the image in the next step),
/// 4. program the image back word by word,
/// 5. relock, on the error path too.
///
/// `base_address` is the physical address that region offset `0`
/// corresponds to in the layout's address space; it is only used to
/// resolve erase sectors. The window size must match the erase-unit size
/// of every sector the region touches, otherwise an erase would destroy
/// bytes outside the committed span.
pub struct FlushEngine<F: SectorFlash> {
    flash: F,
    layout: SectorLayout,
    base_address: u32,
}

impl<F: SectorFlash> FlushEngine<F> {
    /// Create an engine committing through `flash`.
    pub fn new(flash: F, layout: SectorLayout, base_address: u32) -> Self {
        Self {
            flash,
            layout,
            base_address,
        }
    }

    /// Get a reference to the underlying flash.
    pub fn flash(&self) -> &F {
        &self.flash
    }

    /// Get a mutable reference to the underlying flash.
    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    /// Consume the engine and return the underlying flash.
    pub fn into_inner(self) -> F {
        self.flash
    }

    /// The layout used to resolve erase sectors.
    pub const fn layout(&self) -> &SectorLayout {
        &self.layout
    }

    fn erase_and_program(&mut self, base: u32, contents: &[u8]) -> Result<(), F::Error> {
        let sector = self.layout.sector_id_of(self.base_address + base);
        debug!("erasing sector {} for window at {}", sector.value(), base);
        self.flash.erase_sector(sector.value())?;

        let mut offset = base;
        for word in words(contents) {
            self.flash.program_word(offset, word)?;
            offset += WORD_SIZE as u32;
        }
        Ok(())
    }
}

impl<F: SectorFlash> SectorStore for FlushEngine<F> {
    type Error = F::Error;

    fn load(&self, address: u32, dest: &mut [u8]) -> Result<(), Self::Error> {
        self.flash.read(address, dest)
    }

    fn commit(&mut self, base: u32, contents: &[u8]) -> Result<(), Self::Error> {
        self.flash.unlock()?;
        let result = self.erase_and_program(base, contents);
        self.flash.lock();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Op {
        Unlock,
        Erase(u32),
        Program(u32, u32),
        Lock,
    }

    // Records the physical operation sequence instead of simulating memory.
    struct ScriptFlash {
        ops: Vec<Op>,
        refuse_unlock: bool,
        fail_erase: bool,
    }

    impl ScriptFlash {
        fn new() -> Self {
            Self {
                ops: Vec::new(),
                refuse_unlock: false,
                fail_erase: false,
            }
        }
    }

    #[derive(Debug)]
    struct ScriptError;

    impl fmt::Display for ScriptError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Scripted failure")
        }
    }

    impl core::error::Error for ScriptError {}

    impl SectorFlash for ScriptFlash {
        type Error = ScriptError;

        fn capacity(&self) -> u32 {
            64 * 1024
        }

        fn read(&self, _offset: u32, dest: &mut [u8]) -> Result<(), Self::Error> {
            dest.fill(0);
            Ok(())
        }

        fn unlock(&mut self) -> Result<(), Self::Error> {
            self.ops.push(Op::Unlock);
            if self.refuse_unlock {
                return Err(ScriptError);
            }
            Ok(())
        }

        fn lock(&mut self) {
            self.ops.push(Op::Lock);
        }

        fn erase_sector(&mut self, sector: u32) -> Result<(), Self::Error> {
            self.ops.push(Op::Erase(sector));
            if self.fail_erase {
                return Err(ScriptError);
            }
            Ok(())
        }

        fn program_word(&mut self, offset: u32, word: u32) -> Result<(), Self::Error> {
            self.ops.push(Op::Program(offset, word));
            Ok(())
        }
    }

    const LAYOUT: SectorLayout = SectorLayout::Uniform {
        base: 0x0800_0000,
        erase_size: 0x4000,
    };

    #[test]
    fn test_commit_runs_full_sequence() {
        let mut engine = FlushEngine::new(ScriptFlash::new(), LAYOUT, 0x0800_0000);
        engine
            .commit(0x4000, &[1, 2, 3, 4, 0xAA, 0xBB, 0xCC, 0xDD])
            .unwrap();

        assert_eq!(
            engine.flash().ops,
            vec![
                Op::Unlock,
                Op::Erase(1),
                Op::Program(0x4000, 0x0403_0201),
                Op::Program(0x4004, 0xDDCC_BBAA),
                Op::Lock,
            ]
        );
    }

    #[test]
    fn test_sector_resolution_honors_region_base() {
        // region starting one sector into the device
        let mut engine = FlushEngine::new(ScriptFlash::new(), LAYOUT, 0x0800_4000);
        engine.commit(0, &[0u8; 4]).unwrap();

        assert_eq!(engine.flash().ops[1], Op::Erase(1));
    }

    #[test]
    fn test_refused_unlock_stops_before_erase() {
        let mut flash = ScriptFlash::new();
        flash.refuse_unlock = true;
        let mut engine = FlushEngine::new(flash, LAYOUT, 0x0800_0000);

        assert!(engine.commit(0, &[0u8; 4]).is_err());
        assert_eq!(engine.flash().ops, vec![Op::Unlock]);
    }

    #[test]
    fn test_failed_erase_still_relocks() {
        let mut flash = ScriptFlash::new();
        flash.fail_erase = true;
        let mut engine = FlushEngine::new(flash, LAYOUT, 0x0800_0000);

        assert!(engine.commit(0, &[0u8; 4]).is_err());
        assert_eq!(engine.flash().ops, vec![Op::Unlock, Op::Erase(0), Op::Lock]);
    }

    #[test]
    fn test_banked_layout_resolution() {
        let mut engine =
            FlushEngine::new(ScriptFlash::new(), SectorLayout::STM32F405, 0x0800_0000);
        engine.commit(0x1_0000, &[0u8; 4]).unwrap();

        // 0x0801_0000 sits in the first 64 KiB sector
        assert_eq!(engine.flash().ops[1], Op::Erase(4));
    }
}
