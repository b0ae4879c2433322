#[cfg(test)]
mod unit_tests;

use anyhow::Result;
use std::{cell::RefCell, path::Path, rc::Rc};

use crate::{
    cartridge::{Cartridge, CartridgePPUPort, Mapper},
    debugger::{
        code_data_logger::CodeDataLogger, disassembler::DisassemblyCache,
        memory_dumper::MemoryDumper, video_decoder::DefaultVideoDecoder, StoreKind,
    },
    memory_manager::MemoryManager,
    ppu::PPU,
    state::StateStream,
};

/**
 * One emulation session. Owns the cartridge, PPU storage and CPU address
 * space along with the debugger's code/data log and disassembly, and hands
 * out memory dumpers that borrow all of them.
 */
pub struct Console {
    cartridge: Rc<RefCell<Box<dyn Mapper>>>,
    ppu: Rc<RefCell<PPU>>,
    memory_manager: Rc<RefCell<MemoryManager>>,
    code_data_logger: Rc<RefCell<CodeDataLogger>>,
    disassembly_cache: Rc<RefCell<DisassemblyCache>>,
}

impl Console {
    pub fn new(cartridge: Box<dyn Mapper>) -> Self {
        let prg_rom_size = cartridge.memory_size(StoreKind::PrgRom);
        let chr_size = cartridge.core().chr.len();
        let cartridge = Rc::new(RefCell::new(cartridge));

        let ppu = Rc::new(RefCell::new(PPU::new()));
        ppu.borrow_mut()
            .add_device(Rc::new(RefCell::new(CartridgePPUPort::new(cartridge.clone()))));

        let memory_manager = Rc::new(RefCell::new(MemoryManager::new(
            ppu.clone(),
            cartridge.clone(),
        )));

        Self {
            cartridge,
            ppu,
            memory_manager,
            code_data_logger: Rc::new(RefCell::new(CodeDataLogger::new(prg_rom_size, chr_size))),
            disassembly_cache: Rc::new(RefCell::new(DisassemblyCache::new(prg_rom_size))),
        }
    }

    pub fn load<P: AsRef<Path>>(file_name: P) -> Result<Self> {
        Ok(Self::new(Cartridge::load(file_name)?))
    }

    pub fn cartridge(&self) -> Rc<RefCell<Box<dyn Mapper>>> {
        self.cartridge.clone()
    }

    pub fn ppu(&self) -> Rc<RefCell<PPU>> {
        self.ppu.clone()
    }

    pub fn memory_manager(&self) -> Rc<RefCell<MemoryManager>> {
        self.memory_manager.clone()
    }

    pub fn code_data_logger(&self) -> Rc<RefCell<CodeDataLogger>> {
        self.code_data_logger.clone()
    }

    pub fn disassembly_cache(&self) -> Rc<RefCell<DisassemblyCache>> {
        self.disassembly_cache.clone()
    }

    pub fn memory_dumper(&self) -> MemoryDumper {
        MemoryDumper::new(
            self.memory_manager.clone(),
            self.ppu.clone(),
            self.cartridge.clone(),
            self.code_data_logger.clone(),
            self.disassembly_cache.clone(),
            Rc::new(DefaultVideoDecoder::new()),
        )
    }

    /// Mapper state, then internal RAM, palette RAM, primary and secondary OAM.
    pub fn save_state(&self) -> Result<Vec<u8>> {
        let mut stream = StateStream::saver();
        self.stream_state(&mut stream)?;
        Ok(stream.finish()?)
    }

    /// A rejected state leaves the session exactly as it was before the call.
    pub fn load_state(&mut self, data: Vec<u8>) -> Result<()> {
        let snapshot = self.save_state()?;
        if let Err(err) = self.restore_state(data) {
            log::debug!("state rejected: {}", err);
            self.restore_state(snapshot)?;
            return Err(err);
        }
        log::debug!("state loaded");
        Ok(())
    }

    fn restore_state(&self, data: Vec<u8>) -> Result<()> {
        let mut stream = StateStream::loader(data);
        self.stream_state(&mut stream)?;
        stream.finish()?;
        Ok(())
    }

    fn stream_state(&self, stream: &mut StateStream) -> Result<()> {
        self.cartridge.borrow_mut().stream_state(stream)?;

        let internal_ram = self.memory_manager.borrow().internal_ram();
        stream.stream_bytes(internal_ram.borrow_mut().raw_mut())?;

        let mut ppu = self.ppu.borrow_mut();
        stream.stream_bytes(ppu.palette_ram_mut())?;
        stream.stream_bytes(ppu.sprite_ram_mut())?;
        stream.stream_bytes(ppu.secondary_sprite_ram_mut())?;
        Ok(())
    }
}

/// A console around an in-memory ROM, see `cartridge::test_rom_image`.
#[cfg(test)]
pub fn create_test_console(mapper_number: u8, prg_pages: u8, chr_pages: u8, flags6: u8) -> Console {
    let image = crate::cartridge::test_rom_image(mapper_number, prg_pages, chr_pages, flags6);
    Console::new(Cartridge::from_bytes(&image).unwrap())
}
