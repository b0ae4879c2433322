use crate::cartridge::{CartridgeCore, Mapper};

const PRG_PAGE_SIZE: usize = 0x4000;
const CHR_PAGE_SIZE: usize = 0x2000;

/**
 * Mapper 3
 */
pub struct CNRom {
    core: CartridgeCore,
}

impl CNRom {
    pub fn new(mut core: CartridgeCore) -> Self {
        core.prg_rom.set_bank_size(PRG_PAGE_SIZE);
        core.chr.set_bank_size(CHR_PAGE_SIZE);
        Self { core }
    }
}

impl Mapper for CNRom {
    fn core(&self) -> &CartridgeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CartridgeCore {
        &mut self.core
    }

    fn init_mapper(&mut self) {
        self.select_prg_page(0, 0);
        self.select_prg_page(1, 1);
        self.select_chr_page(0, 0);
    }

    fn write_register(&mut self, _addr: u16, value: u8) {
        self.select_chr_page(0, value as i16);
    }
}
