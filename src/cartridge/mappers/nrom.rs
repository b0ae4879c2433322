use crate::cartridge::{CartridgeCore, Mapper};

const PRG_PAGE_SIZE: usize = 0x4000;
const CHR_PAGE_SIZE: usize = 0x2000;

/**
 * Mapper 0
 */
pub struct NRom {
    core: CartridgeCore,
}

impl NRom {
    pub fn new(mut core: CartridgeCore) -> Self {
        core.prg_rom.set_bank_size(PRG_PAGE_SIZE);
        core.chr.set_bank_size(CHR_PAGE_SIZE);
        Self { core }
    }
}

impl Mapper for NRom {
    fn core(&self) -> &CartridgeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CartridgeCore {
        &mut self.core
    }

    // NROM-128 mirrors its single page into both slots through the page modulo
    fn init_mapper(&mut self) {
        self.select_prg_page(0, 0);
        self.select_prg_page(1, 1);
        self.select_chr_page(0, 0);
    }

    fn write_register(&mut self, _addr: u16, _value: u8) {}
}
