use crate::bus::BusDevice;

/// RAM that answers for `start_addr..=end_addr`, mirrored through `addr_mask`.
pub struct RAM {
    start_addr: u16,
    end_addr: u16,
    addr_mask: u16,
    memory: Vec<u8>,
}

impl RAM {
    pub fn new(start_addr: u16, end_addr: u16, addr_mask: u16) -> Self {
        Self {
            start_addr,
            end_addr,
            addr_mask,
            memory: vec![
                0;
                (end_addr & addr_mask) as usize - (start_addr & addr_mask) as usize + 1
            ],
        }
    }

    pub fn raw(&self) -> &[u8] {
        &self.memory
    }

    pub fn raw_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    fn index(&self, addr: u16) -> Option<usize> {
        if addr >= self.start_addr && addr <= self.end_addr {
            Some(((addr & self.addr_mask) - (self.start_addr & self.addr_mask)) as usize)
        } else {
            None
        }
    }
}

// RAM has no side effects, so live and debugger access are the same
impl BusDevice for RAM {
    fn read(&mut self, addr: u16) -> Option<u8> {
        self.peek(addr)
    }

    fn write(&mut self, addr: u16, data: u8) -> Option<u8> {
        self.poke(addr, data)
    }

    fn peek(&self, addr: u16) -> Option<u8> {
        self.index(addr).map(|index| self.memory[index])
    }

    fn poke(&mut self, addr: u16, data: u8) -> Option<u8> {
        let index = self.index(addr)?;
        let old = self.memory[index];
        self.memory[index] = data;
        Some(old)
    }
}
