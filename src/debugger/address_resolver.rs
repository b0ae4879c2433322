
use std::{cell::RefCell, rc::Rc};

use crate::{
    cartridge::Mapper,
    debugger::{AddressInfo, AddressType},
    memory_manager::INTERNAL_RAM_SIZE,
};

const INTERNAL_RAM_END: u16 = 0x1FFF;

/**
 * Translates a CPU address into the physical store behind it. PPU and APU
 * registers and open bus don't resolve.
 */
pub struct AddressResolver {
    cartridge: Rc<RefCell<Box<dyn Mapper>>>,
}

impl AddressResolver {
    pub fn new(cartridge: Rc<RefCell<Box<dyn Mapper>>>) -> Self {
        Self { cartridge }
    }

    pub fn resolve(&self, addr: u16) -> Option<AddressInfo> {
        if addr <= INTERNAL_RAM_END {
            Some(AddressInfo::new(
                AddressType::InternalRam,
                addr as usize & (INTERNAL_RAM_SIZE - 1),
            ))
        } else {
            self.cartridge.borrow().to_absolute_address(addr)
        }
    }
}
