#[cfg(test)]
mod unit_tests;

use super::MirrorType;
use crate::state::{StateError, StateStream};

const MAX_BANKS: usize = 8;

/**
 * A chunk of cartridge storage seen through an address window that is split
 * into equally sized slots. Each slot shows one physical page of the storage.
 * Page numbers are reduced modulo the number of physical pages when they are
 * selected, so a slot can never point outside the storage.
 */
pub struct MemoryRegion {
    pub memory_type: MemoryType,
    memory: Vec<u8>,

    pub start_address: u16,
    pub end_address: u16,

    bank_size: usize,
    page_count: usize,
    bank_count: usize,
    bank_map: [usize; MAX_BANKS],

    write_protect: bool,
}

impl MemoryRegion {
    pub fn new(
        memory_type: MemoryType,
        memory: Vec<u8>,
        start_address: u16,
        end_address: u16,
        write_protect: bool,
    ) -> MemoryRegion {
        let mut result = Self {
            memory_type,
            memory,
            start_address,
            end_address,
            write_protect,

            bank_size: 0,
            page_count: 0,
            bank_count: 0,
            bank_map: [0; MAX_BANKS],
        };
        result.set_bank_size(result.get_address_size());
        result
    }

    pub fn read(&self, addr: u16) -> u8 {
        match self.convert(addr) {
            Some(converted) => self.memory[converted],
            None => 0,
        }
    }

    /// Bus write. Honors write protection and returns the previous value.
    pub fn write(&mut self, addr: u16, value: u8) -> u8 {
        match self.convert(addr) {
            Some(converted) => {
                let old = self.memory[converted];
                if !self.write_protect {
                    self.memory[converted] = value;
                }
                old
            }
            None => 0,
        }
    }

    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.memory
    }

    pub fn read_absolute(&self, offset: usize) -> u8 {
        self.memory.get(offset).copied().unwrap_or(0)
    }

    /// Debugger write by physical offset. Ignores write protection.
    pub fn write_absolute(&mut self, offset: usize, value: u8) {
        if let Some(byte) = self.memory.get_mut(offset) {
            *byte = value;
        }
    }

    /// Copies the whole storage into `buffer`, returning the byte count.
    pub fn copy_to(&self, buffer: &mut [u8]) -> usize {
        if buffer.len() < self.memory.len() {
            return 0;
        }
        buffer[..self.memory.len()].copy_from_slice(&self.memory);
        self.memory.len()
    }

    pub fn copy_from(&mut self, buffer: &[u8]) {
        if buffer.len() >= self.memory.len() {
            let len = self.memory.len();
            self.memory.copy_from_slice(&buffer[..len]);
        }
    }

    fn get_address_size(&self) -> usize {
        self.end_address as usize - self.start_address as usize + 1
    }

    pub fn set_bank_size(&mut self, bank_size: usize) {
        self.bank_size = bank_size;
        self.page_count = (self.get_address_size() / self.bank_size).min(MAX_BANKS);
        self.bank_count = (self.memory.len() / self.bank_size).max(1);
    }

    /// Number of slots the address window is split into.
    pub fn slot_count(&self) -> usize {
        self.page_count
    }

    pub fn set_mirror_type(&mut self, mirror_type: MirrorType) {
        match mirror_type {
            MirrorType::Vertical => {
                self.set_bank(0, 0);
                self.set_bank(1, 1);
                self.set_bank(2, 0);
                self.set_bank(3, 1);
            }
            MirrorType::Horizontal => {
                self.set_bank(0, 0);
                self.set_bank(1, 0);
                self.set_bank(2, 1);
                self.set_bank(3, 1);
            }
            MirrorType::FourScreen => {
                self.set_bank(0, 0);
                self.set_bank(1, 1);
                self.set_bank(2, 2);
                self.set_bank(3, 3);
            }
            MirrorType::SingleScreen(n) => {
                for slot in 0..4 {
                    self.set_bank(slot, n as i16);
                }
            }
        }
        self.bank_map.copy_within(0..4, 4);
    }

    /// Points `slot` at physical page `bank`. Negative banks count back from the
    /// last page (-1 is the last page).
    pub fn set_bank(&mut self, slot: usize, bank: i16) {
        if slot < self.page_count {
            self.bank_map[slot] = (bank as isize).rem_euclid(self.bank_count as isize) as usize;
        }
    }

    pub fn get_bank(&self, slot: usize) -> usize {
        self.bank_map.get(slot).copied().unwrap_or(0)
    }

    /// Physical offset that `addr` currently maps to, if the storage has any bytes.
    pub fn convert(&self, addr: u16) -> Option<usize> {
        if self.memory.is_empty() || !self.contains_addr(addr) {
            return None;
        }
        let raw_index = (addr - self.start_address) as usize;
        let slot = (raw_index / self.bank_size).min(self.page_count - 1);
        let base = self.bank_map[slot] * self.bank_size;
        let offset = raw_index % self.bank_size;

        Some((base + offset) % self.memory.len())
    }

    pub fn contains_addr(&self, addr: u16) -> bool {
        self.start_address <= addr && addr <= self.end_address
    }

    pub fn stream_banks(&mut self, stream: &mut StateStream) -> Result<(), StateError> {
        let mut count = self.page_count as u8;
        stream.stream(&mut count)?;
        if count as usize != self.page_count {
            Err(StateError::InvalidValue {
                field: "bank slot count",
                value: count as u32,
            })?;
        }
        for slot in 0..self.page_count {
            let mut page = self.bank_map[slot] as u16;
            stream.stream(&mut page)?;
            if page as usize >= self.bank_count {
                Err(StateError::InvalidValue {
                    field: "bank page",
                    value: page as u32,
                })?;
            }
            self.bank_map[slot] = page as usize;
        }
        Ok(())
    }

    pub fn stream_memory(&mut self, stream: &mut StateStream) -> Result<(), StateError> {
        stream.stream_bytes(&mut self.memory)
    }
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MemoryType {
    WorkRam,
    SaveRam,
    VRAM,
    ChrRam,
    ChrRom,
    PrgRom,
}
