
use crate::{
    cartridge::{CartridgeCore, Mapper, MirrorType},
    state::{StateError, StateStream},
};

const PRG_PAGE_SIZE: usize = 0x4000;
const CHR_PAGE_SIZE: usize = 0x2000;

/**
 * Mapper 202, the 150-in-1 multicart. Everything is decoded from the address
 * of the write, the data bus is ignored:
 *
 *   A~[1000 0000 0000 PPPM]
 *                     |||+- mirroring (0: vertical, 1: horizontal), also PRG mode together with A3
 *                     +++-- PRG page (16k) and CHR page (8k)
 *
 * With A3 and A0 both set the two PRG slots get pages P and P+1 (32k mode),
 * otherwise page P shows in both slots.
 */
pub struct Mapper202 {
    core: CartridgeCore,
    prg_mode1: bool,
}

impl Mapper202 {
    pub fn new(mut core: CartridgeCore) -> Self {
        core.prg_rom.set_bank_size(PRG_PAGE_SIZE);
        core.chr.set_bank_size(CHR_PAGE_SIZE);
        Self {
            core,
            prg_mode1: false,
        }
    }
}

impl Mapper for Mapper202 {
    fn core(&self) -> &CartridgeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CartridgeCore {
        &mut self.core
    }

    fn init_mapper(&mut self) {
        self.select_prg_page(0, 0);
        self.select_prg_page(1, 0);
        self.select_chr_page(0, 0);
    }

    fn write_register(&mut self, addr: u16, _value: u8) {
        let page = ((addr >> 1) & 0x07) as i16;
        self.prg_mode1 = (addr & 0x09) == 0x09;

        self.select_chr_page(0, page);
        self.select_prg_page(0, page);
        if self.prg_mode1 {
            self.select_prg_page(1, page + 1);
        } else {
            self.select_prg_page(1, page);
        }

        self.set_mirroring_type(if addr & 0x01 != 0 {
            MirrorType::Horizontal
        } else {
            MirrorType::Vertical
        });
    }

    fn stream_state(&mut self, stream: &mut StateStream) -> Result<(), StateError> {
        self.core.stream_state(stream)?;
        stream.stream(&mut self.prg_mode1)
    }
}
