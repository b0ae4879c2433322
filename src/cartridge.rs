pub mod mappers;
pub mod memory_region;


use anyhow::Result;
use std::{cell::RefCell, fs::File, io::BufReader, io::Read, path::Path, rc::Rc};
use thiserror::Error;

use crate::{
    bus::BusDevice,
    debugger::{AddressInfo, AddressType, StoreKind},
    state::{StateError, StateStream},
};

pub use self::mappers::Mapper;
use self::memory_region::{MemoryRegion, MemoryType};

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum MirrorType {
    Vertical,
    Horizontal,
    FourScreen,
    SingleScreen(u8),
}

impl MirrorType {
    fn to_state(self) -> u8 {
        match self {
            MirrorType::Horizontal => 0,
            MirrorType::Vertical => 1,
            MirrorType::FourScreen => 2,
            MirrorType::SingleScreen(n) => 3 + n,
        }
    }

    fn from_state(value: u8) -> Result<Self, StateError> {
        match value {
            0 => Ok(MirrorType::Horizontal),
            1 => Ok(MirrorType::Vertical),
            2 => Ok(MirrorType::FourScreen),
            3..=6 => Ok(MirrorType::SingleScreen(value - 3)),
            _ => Err(StateError::InvalidValue {
                field: "mirroring mode",
                value: value as u32,
            }),
        }
    }
}

pub struct Cartridge {}

static NES_TAG: [u8; 4] = [b'N', b'E', b'S', 0x1A];
static HEADER_SIZE: usize = 16;
static TRAINER_SIZE: usize = 512;
static TRAINER_OFFSET: usize = 0x1000;
static PRG_RAM_PAGE_SIZE: usize = 0x2000;
static DEFAULT_PRG_RAM_SIZE: usize = 0x2000;
static PRG_ROM_PAGE_SIZE: usize = 0x4000;
static CHR_ROM_PAGE_SIZE: usize = 0x2000;
static NAMETABLE_SIZE: usize = 0x0400;

impl Cartridge {
    pub fn load<P: AsRef<Path>>(file_name: P) -> Result<Box<dyn Mapper>> {
        let file = File::open(file_name.as_ref())?;
        let mut image = Vec::new();
        BufReader::new(file).read_to_end(&mut image)?;
        log::info!("Loading cartridge from {}", file_name.as_ref().display());
        Self::from_bytes(&image)
    }

    pub fn from_bytes(image: &[u8]) -> Result<Box<dyn Mapper>> {
        if image.len() < HEADER_SIZE {
            Err(CartridgeError::TruncatedImage)?;
        }
        let mut header = [0; 16];
        header.copy_from_slice(&image[..HEADER_SIZE]);
        let nes_header = NesHeader::new(&header)?;

        let mut reader = &image[HEADER_SIZE..];

        let mut prg_ram_vec = vec![0; nes_header.prg_ram_size];
        if nes_header.has_trainer {
            let trainer = take(&mut reader, TRAINER_SIZE)?;
            if prg_ram_vec.len() >= TRAINER_OFFSET + TRAINER_SIZE {
                prg_ram_vec[TRAINER_OFFSET..(TRAINER_OFFSET + TRAINER_SIZE)].copy_from_slice(trainer);
            }
        }
        let (work_ram_vec, save_ram_vec) = if nes_header.has_battery {
            (Vec::new(), prg_ram_vec)
        } else {
            (prg_ram_vec, Vec::new())
        };
        let work_ram = MemoryRegion::new(MemoryType::WorkRam, work_ram_vec, 0x6000, 0x7FFF, false);
        let save_ram = MemoryRegion::new(MemoryType::SaveRam, save_ram_vec, 0x6000, 0x7FFF, false);

        let prg_rom_vec = take(&mut reader, nes_header.prg_rom_size)?.to_vec();
        let prg_rom = MemoryRegion::new(MemoryType::PrgRom, prg_rom_vec, 0x8000, 0xFFFF, true);

        let chr = if nes_header.chr_is_rom {
            let chr_rom_vec = take(&mut reader, nes_header.chr_size)?.to_vec();
            MemoryRegion::new(MemoryType::ChrRom, chr_rom_vec, 0x0000, 0x1FFF, true)
        } else {
            MemoryRegion::new(
                MemoryType::ChrRam,
                vec![0; nes_header.chr_size],
                0x0000,
                0x1FFF,
                false,
            )
        };

        // four screen carts bring their own extra 2k, everyone else gets the console's 2k
        let nametable_count = if nes_header.mirror_type == MirrorType::FourScreen {
            4
        } else {
            2
        };
        let mut vram = MemoryRegion::new(
            MemoryType::VRAM,
            vec![0; nametable_count * NAMETABLE_SIZE],
            0x2000,
            0x3FFF,
            false,
        );
        vram.set_bank_size(NAMETABLE_SIZE);
        vram.set_mirror_type(nes_header.mirror_type);

        let mapper_number = nes_header.mapper_number;
        let core = CartridgeCore::new(nes_header, prg_rom, chr, work_ram, save_ram, vram);

        mappers::get_mapper(mapper_number, core)
    }
}

fn take<'a>(reader: &mut &'a [u8], len: usize) -> Result<&'a [u8], CartridgeError> {
    if reader.len() < len {
        return Err(CartridgeError::TruncatedImage);
    }
    let (head, tail) = reader.split_at(len);
    *reader = tail;
    Ok(head)
}

pub struct NesHeader {
    pub mirror_type: MirrorType,
    pub has_battery: bool,
    pub chr_is_rom: bool,
    pub has_trainer: bool,
    pub prg_rom_size: usize,
    pub chr_size: usize,
    pub prg_ram_size: usize,
    pub mapper_number: u8,
}

impl NesHeader {
    fn new(header: &[u8; 16]) -> Result<NesHeader> {
        if header[0..4] != NES_TAG {
            Err(CartridgeError::UnrecognizedFileFormat)?;
        }

        let ines_ver = (header[7] >> 2) & 0x03;
        if ines_ver != 0 {
            Err(CartridgeError::UnsupportedInesVersion)?;
        }

        let four_screen = header[6] & 0x08 != 0;
        let has_trainer = header[6] & 0x04 != 0;
        let has_battery = header[6] & 0x02 != 0;
        let vertical_mirroring = header[6] & 0x01 != 0;

        let mirror_type = match (four_screen, vertical_mirroring) {
            (false, false) => MirrorType::Horizontal,
            (false, true) => MirrorType::Vertical,
            (true, _) => MirrorType::FourScreen,
        };

        let prg_rom_size = (header[4] as usize) * PRG_ROM_PAGE_SIZE;
        let mut chr_size = (header[5] as usize) * CHR_ROM_PAGE_SIZE;
        let chr_is_rom = if chr_size == 0 {
            chr_size = CHR_ROM_PAGE_SIZE;
            false
        } else {
            true
        };

        let mapper_number = (header[7] & 0xF0) | (header[6] >> 4);

        let mut prg_ram_size = (header[8] as usize) * PRG_RAM_PAGE_SIZE;
        if prg_ram_size == 0 {
            prg_ram_size = DEFAULT_PRG_RAM_SIZE;
        }

        log::info!(
            "prg ram size {:#06x} | battery {} | trainer {} | prg rom size {:#06x} | chr {} size {:#06x} | mirroring {:?} | mapper {}",
            prg_ram_size,
            has_battery,
            has_trainer,
            prg_rom_size,
            if chr_is_rom { "rom" } else { "ram" },
            chr_size,
            mirror_type,
            mapper_number
        );

        Ok(Self {
            mirror_type,
            has_battery,
            chr_is_rom,
            has_trainer,
            prg_rom_size,
            chr_size,
            prg_ram_size,
            mapper_number,
        })
    }
}

/**
 * The storage every board has. Mappers own one of these and only decide which
 * pages are visible where.
 */
pub struct CartridgeCore {
    pub nes_header: NesHeader,
    pub prg_rom: MemoryRegion,
    pub chr: MemoryRegion,
    pub work_ram: MemoryRegion,
    pub save_ram: MemoryRegion,
    pub vram: MemoryRegion,
    mirror_type: MirrorType,
    original_prg_rom: Vec<u8>,
    original_chr_rom: Vec<u8>,
}

impl CartridgeCore {
    pub fn new(
        nes_header: NesHeader,
        prg_rom: MemoryRegion,
        chr: MemoryRegion,
        work_ram: MemoryRegion,
        save_ram: MemoryRegion,
        vram: MemoryRegion,
    ) -> Self {
        let original_prg_rom = prg_rom.as_slice().to_vec();
        let original_chr_rom = if chr.memory_type == MemoryType::ChrRom {
            chr.as_slice().to_vec()
        } else {
            Vec::new()
        };
        Self {
            mirror_type: nes_header.mirror_type,
            nes_header,
            prg_rom,
            chr,
            work_ram,
            save_ram,
            vram,
            original_prg_rom,
            original_chr_rom,
        }
    }

    /// Whichever of work RAM or save RAM this board has at 0x6000.
    fn prg_ram(&self) -> &MemoryRegion {
        if self.save_ram.is_empty() {
            &self.work_ram
        } else {
            &self.save_ram
        }
    }

    fn prg_ram_mut(&mut self) -> &mut MemoryRegion {
        if self.save_ram.is_empty() {
            &mut self.work_ram
        } else {
            &mut self.save_ram
        }
    }

    pub fn read_cpu(&self, addr: u16) -> Option<u8> {
        if self.prg_rom.contains_addr(addr) {
            Some(self.prg_rom.read(addr))
        } else if self.prg_ram().contains_addr(addr) && !self.prg_ram().is_empty() {
            Some(self.prg_ram().read(addr))
        } else {
            None
        }
    }

    pub fn write_cpu(&mut self, addr: u16, value: u8) -> Option<u8> {
        if self.prg_rom.contains_addr(addr) {
            Some(self.prg_rom.write(addr, value))
        } else if self.prg_ram().contains_addr(addr) && !self.prg_ram().is_empty() {
            Some(self.prg_ram_mut().write(addr, value))
        } else {
            None
        }
    }

    pub fn read_ppu(&self, addr: u16) -> u8 {
        let addr = addr & 0x3FFF;
        if self.chr.contains_addr(addr) {
            self.chr.read(addr)
        } else {
            self.vram.read(addr)
        }
    }

    pub fn write_ppu(&mut self, addr: u16, value: u8) -> u8 {
        let addr = addr & 0x3FFF;
        if self.chr.contains_addr(addr) {
            self.chr.write(addr, value)
        } else {
            self.vram.write(addr, value)
        }
    }

    pub fn mirror_type(&self) -> MirrorType {
        self.mirror_type
    }

    pub fn set_mirror_type(&mut self, mirror_type: MirrorType) {
        // four screen boards have no mirroring control
        if self.nes_header.mirror_type != MirrorType::FourScreen {
            self.mirror_type = mirror_type;
            self.vram.set_mirror_type(mirror_type);
        }
    }

    pub fn memory_region(&self, kind: StoreKind) -> Option<&MemoryRegion> {
        match kind {
            StoreKind::PrgRom => Some(&self.prg_rom),
            StoreKind::ChrRom if self.chr.memory_type == MemoryType::ChrRom => Some(&self.chr),
            StoreKind::ChrRam if self.chr.memory_type == MemoryType::ChrRam => Some(&self.chr),
            StoreKind::WorkRam => Some(&self.work_ram),
            StoreKind::SaveRam => Some(&self.save_ram),
            _ => None,
        }
    }

    pub fn memory_region_mut(&mut self, kind: StoreKind) -> Option<&mut MemoryRegion> {
        match kind {
            StoreKind::PrgRom => Some(&mut self.prg_rom),
            StoreKind::ChrRom if self.chr.memory_type == MemoryType::ChrRom => Some(&mut self.chr),
            StoreKind::ChrRam if self.chr.memory_type == MemoryType::ChrRam => Some(&mut self.chr),
            StoreKind::WorkRam => Some(&mut self.work_ram),
            StoreKind::SaveRam => Some(&mut self.save_ram),
            _ => None,
        }
    }

    pub fn to_absolute_address(&self, addr: u16) -> Option<AddressInfo> {
        if let Some(offset) = self.prg_rom.convert(addr) {
            Some(AddressInfo::new(AddressType::PrgRom, offset))
        } else if let Some(offset) = self.save_ram.convert(addr) {
            Some(AddressInfo::new(AddressType::SaveRam, offset))
        } else {
            self.work_ram
                .convert(addr)
                .map(|offset| AddressInfo::new(AddressType::WorkRam, offset))
        }
    }

    pub fn to_absolute_chr_address(&self, addr: u16) -> Option<usize> {
        self.chr.convert(addr & 0x1FFF)
    }

    pub fn has_prg_chr_changes(&self) -> bool {
        self.prg_rom.as_slice() != self.original_prg_rom.as_slice()
            || (self.chr.memory_type == MemoryType::ChrRom
                && self.chr.as_slice() != self.original_chr_rom.as_slice())
    }

    pub fn revert_prg_chr_changes(&mut self) {
        self.prg_rom.copy_from(&self.original_prg_rom);
        if self.chr.memory_type == MemoryType::ChrRom {
            self.chr.copy_from(&self.original_chr_rom);
        }
    }

    /**
     * Common mapper state, in this order:
     * mirroring, PRG slot pages, CHR slot pages, work RAM, save RAM,
     * CHR RAM (nothing for CHR ROM), nametable RAM.
     */
    pub fn stream_state(&mut self, stream: &mut StateStream) -> Result<(), StateError> {
        let mut mirroring = self.mirror_type.to_state();
        stream.stream(&mut mirroring)?;
        if !stream.is_saving() {
            self.mirror_type = MirrorType::from_state(mirroring)?;
            self.vram.set_mirror_type(self.mirror_type);
        }

        self.prg_rom.stream_banks(stream)?;
        self.chr.stream_banks(stream)?;
        self.work_ram.stream_memory(stream)?;
        self.save_ram.stream_memory(stream)?;
        if self.chr.memory_type == MemoryType::ChrRam {
            self.chr.stream_memory(stream)?;
        }
        self.vram.stream_memory(stream)
    }
}

/// The cartridge as the CPU sees it, 0x4020 - 0xFFFF.
pub struct CartridgeCPUPort {
    cartridge: Rc<RefCell<Box<dyn Mapper>>>,
}

impl CartridgeCPUPort {
    pub fn new(cartridge: Rc<RefCell<Box<dyn Mapper>>>) -> Self {
        Self { cartridge }
    }
}

impl BusDevice for CartridgeCPUPort {
    fn read(&mut self, addr: u16) -> Option<u8> {
        if addr >= 0x4020 {
            self.cartridge.borrow_mut().read_cpu(addr)
        } else {
            None
        }
    }

    fn write(&mut self, addr: u16, data: u8) -> Option<u8> {
        if addr >= 0x4020 {
            Some(self.cartridge.borrow_mut().write_cpu(addr, data))
        } else {
            None
        }
    }

    fn peek(&self, addr: u16) -> Option<u8> {
        if addr >= 0x4020 {
            self.cartridge.borrow().peek_cpu(addr)
        } else {
            None
        }
    }

    fn poke(&mut self, addr: u16, data: u8) -> Option<u8> {
        if addr < 0x4020 {
            return None;
        }
        let mut cartridge = self.cartridge.borrow_mut();
        let info = cartridge.to_absolute_address(addr)?;
        let kind = StoreKind::from(info.address_type);
        let old = cartridge.get_memory_value(kind, info.offset);
        cartridge.set_memory_value(kind, info.offset, data);
        Some(old)
    }
}

/// The cartridge as the PPU sees it, 0x0000 - 0x3EFF.
pub struct CartridgePPUPort {
    cartridge: Rc<RefCell<Box<dyn Mapper>>>,
}

impl CartridgePPUPort {
    pub fn new(cartridge: Rc<RefCell<Box<dyn Mapper>>>) -> Self {
        Self { cartridge }
    }
}

impl BusDevice for CartridgePPUPort {
    fn read(&mut self, addr: u16) -> Option<u8> {
        Some(self.cartridge.borrow_mut().read_vram(addr))
    }

    fn write(&mut self, addr: u16, data: u8) -> Option<u8> {
        Some(self.cartridge.borrow_mut().write_vram(addr, data))
    }

    fn peek(&self, addr: u16) -> Option<u8> {
        Some(self.cartridge.borrow().internal_read_vram(addr))
    }

    fn poke(&mut self, addr: u16, data: u8) -> Option<u8> {
        let mut cartridge = self.cartridge.borrow_mut();
        let old = cartridge.internal_read_vram(addr);
        cartridge.internal_write_vram(addr, data);
        Some(old)
    }
}

#[derive(Error, Debug)]
pub enum CartridgeError {
    #[error("The file loaded in the cartridge wasn't recognized as having NES format")]
    UnrecognizedFileFormat,
    #[error("The file loaded in the cartridge has an unsupported NES version")]
    UnsupportedInesVersion,
    #[error("The file loaded requires mapper {0} which isn't supported yet")]
    UnsupportedMapper(u8),
    #[error("The file loaded in the cartridge is shorter than its header claims")]
    TruncatedImage,
}

/// Builds an iNES image with recognizable PRG/CHR contents: every byte of PRG
/// page n is `0x80 | n` and every byte of CHR page n is `n`.
#[cfg(test)]
pub fn test_rom_image(mapper_number: u8, prg_pages: u8, chr_pages: u8, flags6: u8) -> Vec<u8> {
    let mut image = vec![
        b'N',
        b'E',
        b'S',
        0x1A,
        prg_pages,
        chr_pages,
        (mapper_number << 4) | (flags6 & 0x0F),
        mapper_number & 0xF0,
    ];
    image.resize(HEADER_SIZE, 0);
    for page in 0..prg_pages {
        image.extend(std::iter::repeat_n(0x80 | page, PRG_ROM_PAGE_SIZE));
    }
    for page in 0..chr_pages {
        image.extend(std::iter::repeat_n(page, CHR_ROM_PAGE_SIZE));
    }
    image
}
