#[cfg(test)]
mod unit_tests;

/// Anything holding state derived from PRG ROM bytes.
pub trait Disassembler {
    /// PRG ROM `offset..offset + length` changed; re-derive whatever depends on it.
    fn rebuild_prg_rom_cache(&mut self, prg_rom: &[u8], offset: usize, length: usize);
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DisassemblyInfo {
    pub opcode: u8,
    pub operands: [u8; 2],
    pub size: u8,
}

impl DisassemblyInfo {
    fn decode(prg_rom: &[u8], offset: usize) -> Option<Self> {
        let opcode = *prg_rom.get(offset)?;
        let size = instruction_size(opcode);
        let mut operands = [0; 2];
        for (i, operand) in operands.iter_mut().take(size as usize - 1).enumerate() {
            *operand = prg_rom.get(offset + 1 + i).copied().unwrap_or(0);
        }
        Some(Self {
            opcode,
            operands,
            size,
        })
    }
}

/**
 * Decoded instructions for every PRG ROM offset the CPU has executed from.
 * Offsets that were never executed stay empty.
 */
pub struct DisassemblyCache {
    entries: Vec<Option<DisassemblyInfo>>,
}

impl DisassemblyCache {
    pub fn new(prg_rom_size: usize) -> Self {
        Self {
            entries: vec![None; prg_rom_size],
        }
    }

    /// The CPU fetched an opcode from `offset`.
    pub fn build_cache(&mut self, prg_rom: &[u8], offset: usize) {
        if offset < self.entries.len() && self.entries[offset].is_none() {
            self.entries[offset] = DisassemblyInfo::decode(prg_rom, offset);
        }
    }

    pub fn get(&self, offset: usize) -> Option<DisassemblyInfo> {
        self.entries.get(offset).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Disassembler for DisassemblyCache {
    fn rebuild_prg_rom_cache(&mut self, prg_rom: &[u8], offset: usize, length: usize) {
        log::trace!("rebuilding disassembly {:#06x}+{:#x}", offset, length);
        // an instruction is at most 3 bytes, so one starting 2 bytes early still overlaps
        let start = offset.saturating_sub(2);
        let end = offset.saturating_add(length).min(self.entries.len());
        for i in start..end {
            if self.entries[i].is_some() {
                self.entries[i] = DisassemblyInfo::decode(prg_rom, i);
            }
        }
    }
}

/**
 * Instruction length from the opcode alone, official and unofficial.
 * Opcodes are aaabbbcc: cc picks the group, bbb the addressing mode.
 */
pub fn instruction_size(opcode: u8) -> u8 {
    let aaa = opcode >> 5;
    let bbb = (opcode >> 2) & 0b111;
    let cc = opcode & 0b11;

    match (cc, bbb) {
        // (zp,x) zp # (zp),y zp,x  |  abs abs,y abs,x
        (0b01 | 0b11, 0b011 | 0b110 | 0b111) => 3,
        (0b01 | 0b11, _) => 2,

        // JAM
        (0b10, 0b000) if aaa < 4 => 1,
        (0b10, 0b000 | 0b001 | 0b101) => 2,
        (0b10, 0b011 | 0b111) => 3,
        (0b10, _) => 1,

        // BRK, RTI, RTS
        (0b00, 0b000) if aaa != 1 && aaa < 4 => 1,
        // JSR
        (0b00, 0b000) if aaa == 1 => 3,
        (0b00, 0b000 | 0b001 | 0b100 | 0b101) => 2,
        (0b00, 0b011 | 0b111) => 3,
        (0b00, _) => 1,

        _ => unreachable!("cc is two bits"),
    }
}
