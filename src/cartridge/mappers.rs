pub mod cnrom;
pub mod mapper202;
pub mod nrom;
pub mod uxrom;

use anyhow::Result;

use super::{CartridgeCore, CartridgeError, MirrorType};
use crate::{
    debugger::{AddressInfo, StoreKind},
    state::{StateError, StateStream},
};

use self::{cnrom::CNRom, mapper202::Mapper202, nrom::NRom, uxrom::UxRom};

pub fn get_mapper(mapper_number: u8, core: CartridgeCore) -> Result<Box<dyn Mapper>> {
    let mut mapper: Box<dyn Mapper> = match mapper_number {
        0 => Box::new(NRom::new(core)),
        2 => Box::new(UxRom::new(core)),
        3 => Box::new(CNRom::new(core)),
        202 => Box::new(Mapper202::new(core)),
        _ => Err(CartridgeError::UnsupportedMapper(mapper_number))?,
    };
    mapper.init_mapper();
    Ok(mapper)
}

/**
 * A cartridge board. Implementors supply the power-on bank layout, the
 * register decoding and any extra save-state fields; everything else is
 * provided on top of the shared `CartridgeCore`.
 */
pub trait Mapper {
    fn core(&self) -> &CartridgeCore;
    fn core_mut(&mut self) -> &mut CartridgeCore;

    /// Power-on bank selection.
    fn init_mapper(&mut self);

    /// A CPU write that landed in the register range. `addr` is the full CPU address.
    fn write_register(&mut self, addr: u16, value: u8);

    fn register_range(&self) -> (u16, u16) {
        (0x8000, 0xFFFF)
    }

    /// Base fields first, then whatever the board adds, identically in both directions.
    fn stream_state(&mut self, stream: &mut StateStream) -> Result<(), StateError> {
        self.core_mut().stream_state(stream)
    }

    fn select_prg_page(&mut self, slot: usize, page: i16) {
        self.core_mut().prg_rom.set_bank(slot, page);
    }

    fn select_chr_page(&mut self, slot: usize, page: i16) {
        self.core_mut().chr.set_bank(slot, page);
    }

    fn prg_page(&self, slot: usize) -> usize {
        self.core().prg_rom.get_bank(slot)
    }

    fn chr_page(&self, slot: usize) -> usize {
        self.core().chr.get_bank(slot)
    }

    fn set_mirroring_type(&mut self, mirror_type: MirrorType) {
        self.core_mut().set_mirror_type(mirror_type);
    }

    fn mirror_type(&self) -> MirrorType {
        self.core().mirror_type()
    }

    fn read_cpu(&mut self, addr: u16) -> Option<u8> {
        self.core().read_cpu(addr)
    }

    fn peek_cpu(&self, addr: u16) -> Option<u8> {
        self.core().read_cpu(addr)
    }

    fn write_cpu(&mut self, addr: u16, value: u8) -> u8 {
        let (start, end) = self.register_range();
        if (start..=end).contains(&addr) {
            log::trace!("mapper register write {:#06x} <- {:#04x}", addr, value);
            self.write_register(addr, value);
            0
        } else {
            self.core_mut().write_cpu(addr, value).unwrap_or(0)
        }
    }

    /// PPU bus read during emulation. Boards that watch the PPU address lines hook in here.
    fn read_vram(&mut self, addr: u16) -> u8 {
        self.core().read_ppu(addr)
    }

    fn write_vram(&mut self, addr: u16, value: u8) -> u8 {
        self.core_mut().write_ppu(addr, value)
    }

    /// Reads what's mapped at `addr` without telling the board about it.
    fn internal_read_vram(&self, addr: u16) -> u8 {
        self.core().read_ppu(addr)
    }

    fn internal_write_vram(&mut self, addr: u16, value: u8) {
        let core = self.core_mut();
        let addr = addr & 0x3FFF;
        if core.chr.contains_addr(addr) {
            if let Some(offset) = core.chr.convert(addr) {
                core.chr.write_absolute(offset, value);
            }
        } else {
            core.vram.write(addr, value);
        }
    }

    fn debug_read_vram(&mut self, addr: u16, disable_side_effects: bool) -> u8 {
        if disable_side_effects {
            self.internal_read_vram(addr)
        } else {
            self.read_vram(addr)
        }
    }

    fn to_absolute_address(&self, addr: u16) -> Option<AddressInfo> {
        self.core().to_absolute_address(addr)
    }

    fn to_absolute_chr_address(&self, addr: u16) -> Option<usize> {
        self.core().to_absolute_chr_address(addr)
    }

    fn memory_size(&self, kind: StoreKind) -> usize {
        self.core()
            .memory_region(kind)
            .map_or(0, |region| region.len())
    }

    fn copy_memory(&self, kind: StoreKind, buffer: &mut [u8]) -> usize {
        self.core()
            .memory_region(kind)
            .map_or(0, |region| region.copy_to(buffer))
    }

    fn write_memory(&mut self, kind: StoreKind, buffer: &[u8]) {
        if let Some(region) = self.core_mut().memory_region_mut(kind) {
            region.copy_from(buffer);
        }
    }

    fn get_memory_value(&self, kind: StoreKind, offset: usize) -> u8 {
        self.core()
            .memory_region(kind)
            .map_or(0, |region| region.read_absolute(offset))
    }

    fn set_memory_value(&mut self, kind: StoreKind, offset: usize, value: u8) {
        if let Some(region) = self.core_mut().memory_region_mut(kind) {
            region.write_absolute(offset, value);
        }
    }

    fn has_prg_chr_changes(&self) -> bool {
        self.core().has_prg_chr_changes()
    }

    fn revert_prg_chr_changes(&mut self) {
        self.core_mut().revert_prg_chr_changes();
    }
}
