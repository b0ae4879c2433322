use std::{cell::RefCell, rc::Rc};

/**
 * Something that answers for part of an address space. Devices return `None`
 * for addresses they don't decode.
 *
 * `read`/`write` are live bus traffic and may change device state the way
 * the hardware would (acknowledging flags, advancing latches). `peek`/`poke`
 * are debugger access and must leave everything but the addressed byte alone.
 */
pub trait BusDevice {
    fn read(&mut self, addr: u16) -> Option<u8>;
    fn write(&mut self, addr: u16, data: u8) -> Option<u8>;

    fn peek(&self, addr: u16) -> Option<u8>;

    fn poke(&mut self, _addr: u16, _data: u8) -> Option<u8> {
        None
    }
}

pub struct Bus {
    bus_devices: Vec<Rc<RefCell<dyn BusDevice>>>,
}

impl Bus {
    pub fn new() -> Self {
        Self {
            bus_devices: Vec::new(),
        }
    }

    pub fn add_device(&mut self, device: Rc<RefCell<dyn BusDevice>>) {
        self.bus_devices.push(device);
    }

    pub fn read(&self, addr: u16) -> Option<u8> {
        self.bus_devices
            .iter()
            .find_map(|device| device.borrow_mut().read(addr))
    }

    pub fn write(&self, addr: u16, data: u8) -> Option<u8> {
        self.bus_devices
            .iter()
            .find_map(|device| device.borrow_mut().write(addr, data))
    }

    pub fn peek(&self, addr: u16) -> Option<u8> {
        self.bus_devices
            .iter()
            .find_map(|device| device.borrow().peek(addr))
    }

    pub fn poke(&self, addr: u16, data: u8) -> Option<u8> {
        self.bus_devices
            .iter()
            .find_map(|device| device.borrow_mut().poke(addr, data))
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
