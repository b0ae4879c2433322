pub mod flags;

#[cfg(test)]
mod unit_tests;

use std::{cell::RefCell, rc::Rc};

use crate::bus::{Bus, BusDevice};

use self::flags::{CtrlFlags, MaskFlags, StatusFlags};

const CPU_ADDR_START: u16 = 0x2000;
const CPU_ADDR_END: u16 = 0x3FFF;
const CPU_ADDR_MASK: u16 = 0x2007;
const PALETTE_START: u16 = 0x3F00;
pub const PALETTE_SIZE: usize = 0x0020;
const PALETTE_MASK: u16 = 0x001F;
pub const PRIMARY_OAM_SIZE: usize = 0x0100;
pub const SECONDARY_OAM_SIZE: usize = 0x0020;

// blargg's power on palette values. why not?
const INITIAL_PALETTE_VALUES: [u8; PALETTE_SIZE] = [
    0x09, 0x01, 0x00, 0x01, 0x00, 0x02, 0x02, 0x0D, 0x08, 0x10, 0x08, 0x24, 0x00, 0x00, 0x04, 0x2C,
    0x09, 0x01, 0x34, 0x03, 0x00, 0x04, 0x00, 0x14, 0x08, 0x3A, 0x00, 0x02, 0x00, 0x20, 0x2C, 0x08,
];

/// Control register state the debugger views need.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PpuControl {
    pub background_pattern_addr: u16,
    pub sprite_pattern_addr: u16,
    pub large_sprites: bool,
}

/**
 * PPU storage and its CPU facing registers: palette RAM, primary and
 * secondary OAM, CTRL/MASK/STATUS and the VRAM address latch. Rendering
 * lives elsewhere; this is what the rest of the machine reads and writes.
 */
#[allow(clippy::upper_case_acronyms)]
pub struct PPU {
    ctrl: CtrlFlags,
    mask: MaskFlags,
    status: StatusFlags,

    bus: Bus,

    primary_oam: OAMData<PRIMARY_OAM_SIZE>,
    secondary_oam: [u8; SECONDARY_OAM_SIZE],
    palettes: [u8; PALETTE_SIZE],

    write_toggle: bool,
    vram_address: u16,
    temporary_vram_address: u16,
    fine_x: u8,

    data_buffer: u8,
}

impl PPU {
    pub fn new() -> Self {
        Self {
            ctrl: CtrlFlags::empty(),
            mask: MaskFlags::empty(),
            status: StatusFlags::VerticalBlank | StatusFlags::SpriteOverflow,
            bus: Bus::new(),
            primary_oam: OAMData::new(),
            secondary_oam: [0xFF; SECONDARY_OAM_SIZE],
            palettes: INITIAL_PALETTE_VALUES,
            write_toggle: false,
            vram_address: 0,
            temporary_vram_address: 0,
            fine_x: 0,
            data_buffer: 0,
        }
    }

    pub fn add_device(&mut self, device: Rc<RefCell<dyn BusDevice>>) {
        self.bus.add_device(device);
    }

    pub fn control(&self) -> PpuControl {
        PpuControl {
            background_pattern_addr: if self.ctrl.contains(CtrlFlags::BackgroundPatternHigh) {
                0x1000
            } else {
                0x0000
            },
            sprite_pattern_addr: if self.ctrl.contains(CtrlFlags::SpritePatternHigh) {
                0x1000
            } else {
                0x0000
            },
            large_sprites: self.ctrl.contains(CtrlFlags::TallSprites),
        }
    }

    pub fn status(&self) -> StatusFlags {
        self.status
    }

    /// Called by the frame timing logic at the start and end of vertical blank.
    pub fn set_vertical_blank(&mut self, value: bool) {
        self.status.set(StatusFlags::VerticalBlank, value);
    }

    pub fn vram_address(&self) -> u16 {
        self.vram_address
    }

    pub fn write_toggle(&self) -> bool {
        self.write_toggle
    }

    fn palette_index(addr: u16) -> usize {
        let mirrored = addr & PALETTE_MASK;

        // 10/14/18/1C are mapped to 00/04/08/0C
        let physical = if mirrored & 0b00010011 == 0b00010000 {
            mirrored & 0b00001100
        } else {
            mirrored
        };
        physical as usize
    }

    /// Raw palette entry, without the greyscale mask the rendering path applies.
    pub fn read_palette_ram(&self, addr: u16) -> u8 {
        self.palettes[Self::palette_index(addr)]
    }

    pub fn write_palette_ram(&mut self, addr: u16, data: u8) -> u8 {
        let physical = Self::palette_index(addr);
        let old = self.palettes[physical];
        self.palettes[physical] = data & 0b00111111;
        old
    }

    pub fn palette_ram_mut(&mut self) -> &mut [u8; PALETTE_SIZE] {
        &mut self.palettes
    }

    fn read_palette(&self, addr: u16) -> u8 {
        let data = self.read_palette_ram(addr);
        // greyscale mode masks off the low bits
        if self.mask.contains(MaskFlags::Greyscale) {
            data & 0b00110000
        } else {
            data
        }
    }

    pub fn sprite_ram(&self) -> &[u8; PRIMARY_OAM_SIZE] {
        &self.primary_oam.table
    }

    pub fn sprite_ram_mut(&mut self) -> &mut [u8; PRIMARY_OAM_SIZE] {
        &mut self.primary_oam.table
    }

    pub fn secondary_sprite_ram(&self) -> &[u8; SECONDARY_OAM_SIZE] {
        &self.secondary_oam
    }

    pub fn secondary_sprite_ram_mut(&mut self) -> &mut [u8; SECONDARY_OAM_SIZE] {
        &mut self.secondary_oam
    }

    /// OAM DMA: 256 bytes starting at the current OAM address.
    pub fn write_oam_dma(&mut self, page: &[u8; PRIMARY_OAM_SIZE]) {
        for data in page {
            self.primary_oam.write_data(*data);
            self.primary_oam.inc_addr();
        }
    }

    fn inc_vram_addr(&mut self) {
        let amount = if self.ctrl.contains(CtrlFlags::VramIncrement32) {
            32
        } else {
            1
        };
        self.vram_address = self.vram_address.wrapping_add(amount) & 0x7FFF;
    }

    fn read_status(&self) -> u8 {
        self.status.bits() | (self.data_buffer & 0x1F)
    }
}

impl Default for PPU {
    fn default() -> Self {
        Self::new()
    }
}

impl BusDevice for PPU {
    fn read(&mut self, addr: u16) -> Option<u8> {
        if !(CPU_ADDR_START..=CPU_ADDR_END).contains(&addr) {
            return None;
        }
        Some(match addr & CPU_ADDR_MASK {
            0x2002 => {
                let result = self.read_status();
                self.write_toggle = false;
                self.status.remove(StatusFlags::VerticalBlank);
                result
            }
            0x2004 => self.primary_oam.read_data(),
            0x2007 => {
                let addr = self.vram_address & 0x3FFF;
                let result = if addr >= PALETTE_START {
                    // the buffer gets the nametable byte "under" the palette
                    self.data_buffer = self.bus.read(addr - 0x1000).unwrap_or(0);
                    self.read_palette(addr)
                } else {
                    let result = self.data_buffer;
                    self.data_buffer = self.bus.read(addr).unwrap_or(0);
                    result
                };
                self.inc_vram_addr();
                result
            }
            _ => self.data_buffer,
        })
    }

    fn write(&mut self, addr: u16, data: u8) -> Option<u8> {
        if !(CPU_ADDR_START..=CPU_ADDR_END).contains(&addr) {
            return None;
        }
        Some(match addr & CPU_ADDR_MASK {
            0x2000 => {
                let old = self.ctrl.bits();
                self.ctrl = CtrlFlags::from_bits_retain(data);
                self.temporary_vram_address =
                    (self.temporary_vram_address & !0x0C00) | (((data & 0b11) as u16) << 10);
                old
            }
            0x2001 => {
                let old = self.mask.bits();
                self.mask = MaskFlags::from_bits_retain(data);
                old
            }
            0x2002 => 0,
            0x2003 => self.primary_oam.load_addr(data),
            0x2004 => {
                let old = self.primary_oam.write_data(data);
                self.primary_oam.inc_addr();
                old
            }
            0x2005 => {
                let old = self.temporary_vram_address as u8;
                if !self.write_toggle {
                    self.fine_x = data & 0b111;
                    self.temporary_vram_address =
                        (self.temporary_vram_address & !0x001F) | (data >> 3) as u16;
                } else {
                    self.temporary_vram_address = (self.temporary_vram_address & !0x73E0)
                        | (((data & 0b111) as u16) << 12)
                        | (((data >> 3) as u16) << 5);
                }
                self.write_toggle = !self.write_toggle;
                old
            }
            0x2006 => {
                let old = self.temporary_vram_address as u8;
                if !self.write_toggle {
                    self.temporary_vram_address =
                        (self.temporary_vram_address & 0x00FF) | (((data & 0x3F) as u16) << 8);
                } else {
                    self.temporary_vram_address = (self.temporary_vram_address & 0xFF00) | data as u16;
                    self.vram_address = self.temporary_vram_address;
                }
                self.write_toggle = !self.write_toggle;
                old
            }
            0x2007 => {
                let addr = self.vram_address & 0x3FFF;
                let result = if addr >= PALETTE_START {
                    self.write_palette_ram(addr, data)
                } else {
                    self.bus.write(addr, data).unwrap_or(0)
                };
                self.inc_vram_addr();
                result
            }
            physical => unreachable!("writing to ppu register {}", physical),
        })
    }

    fn peek(&self, addr: u16) -> Option<u8> {
        if !(CPU_ADDR_START..=CPU_ADDR_END).contains(&addr) {
            return None;
        }
        Some(match addr & CPU_ADDR_MASK {
            0x2002 => self.read_status(),
            0x2004 => self.primary_oam.read_data(),
            0x2007 => {
                let addr = self.vram_address & 0x3FFF;
                if addr >= PALETTE_START {
                    self.read_palette(addr)
                } else {
                    self.data_buffer
                }
            }
            _ => self.data_buffer,
        })
    }
}

struct OAMData<const SIZE: usize> {
    addr: u8,
    table: [u8; SIZE],
    addr_mask: u8,
}

impl<const SIZE: usize> OAMData<SIZE> {
    fn new() -> Self {
        Self {
            addr: 0,
            table: [0; SIZE],
            addr_mask: (SIZE - 1) as u8,
        }
    }

    fn load_addr(&mut self, addr: u8) -> u8 {
        let old = self.addr;
        self.addr = addr & self.addr_mask;
        old
    }

    fn inc_addr(&mut self) {
        self.addr = self.addr.wrapping_add(1) & self.addr_mask;
    }

    fn write_data(&mut self, data: u8) -> u8 {
        let old = self.table[self.addr as usize];
        self.table[self.addr as usize] = data;
        old
    }

    fn read_data(&self) -> u8 {
        self.table[self.addr as usize]
    }
}
