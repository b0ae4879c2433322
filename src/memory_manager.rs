#[cfg(test)]
mod unit_tests;

use std::{cell::RefCell, rc::Rc};

use crate::{
    bus::Bus,
    cartridge::{CartridgeCPUPort, Mapper},
    ppu::{PPU, PRIMARY_OAM_SIZE},
    ram::RAM,
};

pub const INTERNAL_RAM_SIZE: usize = 0x0800;
const OAM_DMA_REGISTER: u16 = 0x4014;

/**
 * The CPU address space.
 *
 *   0x0000 - 0x1FFF  internal RAM, 2k mirrored 4 times
 *   0x2000 - 0x3FFF  PPU registers, mirrored every 8 bytes
 *   0x4000 - 0x401F  APU and IO (only OAM DMA is decoded here)
 *   0x4020 - 0xFFFF  cartridge
 *
 * `read`/`write` behave like the CPU driving the bus: registers see the
 * access and the open bus latch follows the data. `peek`/`poke` are for the
 * debugger and change nothing but the addressed byte.
 */
pub struct MemoryManager {
    internal_ram: Rc<RefCell<RAM>>,
    ppu: Rc<RefCell<PPU>>,
    bus: Bus,
    open_bus: u8,
}

impl MemoryManager {
    pub fn new(ppu: Rc<RefCell<PPU>>, cartridge: Rc<RefCell<Box<dyn Mapper>>>) -> Self {
        let internal_ram = Rc::new(RefCell::new(RAM::new(0x0000, 0x1FFF, 0x07FF)));

        let mut bus = Bus::new();
        bus.add_device(internal_ram.clone());
        bus.add_device(ppu.clone());
        bus.add_device(Rc::new(RefCell::new(CartridgeCPUPort::new(cartridge))));

        Self {
            internal_ram,
            ppu,
            bus,
            open_bus: 0,
        }
    }

    pub fn read(&mut self, addr: u16) -> u8 {
        let data = self.bus.read(addr).unwrap_or(self.open_bus);
        self.open_bus = data;
        data
    }

    pub fn write(&mut self, addr: u16, data: u8) {
        self.open_bus = data;
        if addr == OAM_DMA_REGISTER {
            self.oam_dma(data);
        } else {
            self.bus.write(addr, data);
        }
    }

    /// Side-effect free read. Undecoded addresses read as 0.
    pub fn peek(&self, addr: u16) -> u8 {
        self.bus.peek(addr).unwrap_or(0)
    }

    /// Side-effect free write. Registers ignore it.
    pub fn poke(&mut self, addr: u16, data: u8) {
        self.bus.poke(addr, data);
    }

    pub fn debug_read(&mut self, addr: u16, disable_side_effects: bool) -> u8 {
        if disable_side_effects {
            self.peek(addr)
        } else {
            self.read(addr)
        }
    }

    pub fn debug_write(&mut self, addr: u16, data: u8, disable_side_effects: bool) {
        if disable_side_effects {
            self.poke(addr, data);
        } else {
            self.write(addr, data);
        }
    }

    pub fn open_bus(&self) -> u8 {
        self.open_bus
    }

    pub fn internal_ram(&self) -> Rc<RefCell<RAM>> {
        self.internal_ram.clone()
    }

    fn oam_dma(&mut self, page: u8) {
        let base = (page as u16) << 8;
        let mut data = [0; PRIMARY_OAM_SIZE];
        for (i, byte) in data.iter_mut().enumerate() {
            *byte = self.read(base + i as u16);
        }
        self.ppu.borrow_mut().write_oam_dma(&data);
    }
}
