
use std::{cell::RefCell, rc::Rc};

use crate::{
    cartridge::Mapper,
    debugger::{
        address_resolver::AddressResolver,
        code_data_logger::CodeDataLogger,
        disassembler::Disassembler,
        video_decoder::{TRANSPARENT, VideoDecoder},
        AddressInfo, AddressType, CdlHighlight, StoreKind,
    },
    memory_manager::{MemoryManager, INTERNAL_RAM_SIZE},
    ppu::{PALETTE_SIZE, PPU, PRIMARY_OAM_SIZE, SECONDARY_OAM_SIZE},
};

pub const NAMETABLE_WIDTH: usize = 256;
pub const NAMETABLE_HEIGHT: usize = 240;
pub const NAMETABLE_TILES: usize = 32 * 30;
pub const CHR_BANK_WIDTH: usize = 128;
pub const CHR_BANK_HEIGHT: usize = 128;
pub const SPRITES_WIDTH: usize = 64;
pub const SPRITES_HEIGHT: usize = 128;
pub const PALETTE_WIDTH: usize = 4;
pub const PALETTE_HEIGHT: usize = 8;

const CPU_SPACE_SIZE: usize = 0x10000;
const PPU_SPACE_SIZE: usize = 0x4000;
const CHR_BANK_SIZE: usize = 0x1000;
const ATTRIBUTE_TABLE_OFFSET: u16 = 960;
const DIMMED_MASK: u32 = 0x4FFFFFFF;

/// Two bit colour of pixel `bit` (7 is leftmost) from a tile's low and high planes.
fn tile_pixel(low: u8, high: u8, bit: u8) -> u16 {
    (((low >> bit) & 0x01) | (((high >> bit) & 0x01) << 1)) as u16
}

/**
 * Debugger access to every memory space of the console: single bytes, words,
 * bulk edits, whole-store dumps and restores, plus decoded views of the
 * nametables, pattern tables, sprites and palette.
 *
 * Every accessor takes a `disable_side_effects` flag where the distinction
 * exists. With it set nothing but the addressed byte changes: registers are
 * not acknowledged, latches don't move and the open bus is left alone. Without
 * it the access is indistinguishable from the CPU's own.
 *
 * Out of range requests read as 0 and write nothing.
 */
pub struct MemoryDumper {
    memory_manager: Rc<RefCell<MemoryManager>>,
    ppu: Rc<RefCell<PPU>>,
    cartridge: Rc<RefCell<Box<dyn Mapper>>>,
    code_data_logger: Rc<RefCell<CodeDataLogger>>,
    disassembler: Rc<RefCell<dyn Disassembler>>,
    video_decoder: Rc<dyn VideoDecoder>,
    address_resolver: AddressResolver,
}

impl MemoryDumper {
    pub fn new(
        memory_manager: Rc<RefCell<MemoryManager>>,
        ppu: Rc<RefCell<PPU>>,
        cartridge: Rc<RefCell<Box<dyn Mapper>>>,
        code_data_logger: Rc<RefCell<CodeDataLogger>>,
        disassembler: Rc<RefCell<dyn Disassembler>>,
        video_decoder: Rc<dyn VideoDecoder>,
    ) -> Self {
        Self {
            address_resolver: AddressResolver::new(cartridge.clone()),
            memory_manager,
            ppu,
            cartridge,
            code_data_logger,
            disassembler,
            video_decoder,
        }
    }

    /// Where `addr` currently lands, if it lands in a store at all.
    pub fn resolve(&self, addr: u16) -> Option<AddressInfo> {
        self.address_resolver.resolve(addr)
    }

    pub fn get_memory_size(&self, kind: StoreKind) -> usize {
        kind.fixed_size()
            .unwrap_or_else(|| self.cartridge.borrow().memory_size(kind))
    }

    /**
     * Copies the whole of `kind` into `buffer` and returns the number of bytes
     * written. The CPU and PPU spaces are walked address by address through the
     * live accessors. A buffer shorter than the store gets nothing.
     */
    pub fn get_memory_state(&mut self, kind: StoreKind, buffer: &mut [u8]) -> usize {
        let size = self.get_memory_size(kind);
        if buffer.len() < size {
            log::debug!(
                "refusing {} dump into a {} byte buffer, {} needed",
                kind,
                buffer.len(),
                size
            );
            return 0;
        }

        match kind {
            StoreKind::CpuMemory => {
                let mut memory_manager = self.memory_manager.borrow_mut();
                for (addr, byte) in buffer[..CPU_SPACE_SIZE].iter_mut().enumerate() {
                    *byte = memory_manager.read(addr as u16);
                }
            }
            StoreKind::PpuMemory => {
                let mut cartridge = self.cartridge.borrow_mut();
                for (addr, byte) in buffer[..PPU_SPACE_SIZE].iter_mut().enumerate() {
                    *byte = cartridge.read_vram(addr as u16);
                }
            }
            StoreKind::InternalRam => {
                let memory_manager = self.memory_manager.borrow();
                let internal_ram = memory_manager.internal_ram();
                buffer[..INTERNAL_RAM_SIZE].copy_from_slice(internal_ram.borrow().raw());
            }
            StoreKind::PaletteMemory => {
                let ppu = self.ppu.borrow();
                for (addr, byte) in buffer[..PALETTE_SIZE].iter_mut().enumerate() {
                    *byte = ppu.read_palette_ram(addr as u16);
                }
            }
            StoreKind::SpriteMemory => {
                buffer[..PRIMARY_OAM_SIZE].copy_from_slice(self.ppu.borrow().sprite_ram());
            }
            StoreKind::SecondarySpriteMemory => {
                buffer[..SECONDARY_OAM_SIZE]
                    .copy_from_slice(self.ppu.borrow().secondary_sprite_ram());
            }
            StoreKind::PrgRom
            | StoreKind::ChrRom
            | StoreKind::ChrRam
            | StoreKind::WorkRam
            | StoreKind::SaveRam => return self.cartridge.borrow().copy_memory(kind, buffer),
        }
        size
    }

    /**
     * Writes `buffer` back over the whole of `kind`. The CPU and PPU spaces are
     * views over other stores and can't be restored as a block.
     */
    pub fn set_memory_state(&mut self, kind: StoreKind, buffer: &[u8]) {
        let size = self.get_memory_size(kind);
        if buffer.len() < size {
            log::debug!(
                "refusing {} restore from a {} byte buffer, {} needed",
                kind,
                buffer.len(),
                size
            );
            return;
        }

        match kind {
            StoreKind::CpuMemory | StoreKind::PpuMemory => {
                log::debug!("{} is an address space view and can't be restored", kind);
            }
            StoreKind::InternalRam => {
                let memory_manager = self.memory_manager.borrow();
                let internal_ram = memory_manager.internal_ram();
                internal_ram
                    .borrow_mut()
                    .raw_mut()
                    .copy_from_slice(&buffer[..INTERNAL_RAM_SIZE]);
            }
            StoreKind::PaletteMemory => {
                let mut ppu = self.ppu.borrow_mut();
                for (addr, byte) in buffer[..PALETTE_SIZE].iter().enumerate() {
                    ppu.write_palette_ram(addr as u16, *byte);
                }
            }
            StoreKind::SpriteMemory => {
                self.ppu
                    .borrow_mut()
                    .sprite_ram_mut()
                    .copy_from_slice(&buffer[..PRIMARY_OAM_SIZE]);
            }
            StoreKind::SecondarySpriteMemory => {
                self.ppu
                    .borrow_mut()
                    .secondary_sprite_ram_mut()
                    .copy_from_slice(&buffer[..SECONDARY_OAM_SIZE]);
            }
            StoreKind::PrgRom => {
                self.cartridge.borrow_mut().write_memory(kind, buffer);
                self.rebuild_prg_rom_cache(0, size);
            }
            StoreKind::ChrRom | StoreKind::ChrRam | StoreKind::WorkRam | StoreKind::SaveRam => {
                self.cartridge.borrow_mut().write_memory(kind, buffer);
            }
        }
    }

    pub fn get_memory_value(
        &mut self,
        kind: StoreKind,
        address: usize,
        disable_side_effects: bool,
    ) -> u8 {
        match kind {
            StoreKind::CpuMemory => {
                let Ok(addr) = u16::try_from(address) else {
                    return 0;
                };
                if disable_side_effects {
                    match self.resolve(addr) {
                        Some(info) => self.get_memory_value(info.address_type.into(), info.offset, true),
                        None => 0,
                    }
                } else {
                    self.memory_manager.borrow_mut().read(addr)
                }
            }
            StoreKind::InternalRam => {
                if address >= INTERNAL_RAM_SIZE {
                    return 0;
                }
                self.memory_manager
                    .borrow_mut()
                    .debug_read(address as u16, disable_side_effects)
            }
            StoreKind::PaletteMemory if address < PALETTE_SIZE => {
                self.ppu.borrow().read_palette_ram(address as u16)
            }
            StoreKind::SpriteMemory => self
                .ppu
                .borrow()
                .sprite_ram()
                .get(address)
                .copied()
                .unwrap_or(0),
            StoreKind::SecondarySpriteMemory => self
                .ppu
                .borrow()
                .secondary_sprite_ram()
                .get(address)
                .copied()
                .unwrap_or(0),
            StoreKind::PpuMemory if address < PPU_SPACE_SIZE => self
                .cartridge
                .borrow_mut()
                .debug_read_vram(address as u16, disable_side_effects),
            StoreKind::PrgRom
            | StoreKind::ChrRom
            | StoreKind::ChrRam
            | StoreKind::WorkRam
            | StoreKind::SaveRam => self.cartridge.borrow().get_memory_value(kind, address),
            StoreKind::PaletteMemory | StoreKind::PpuMemory => 0,
        }
    }

    /**
     * Writes one byte. A PRG ROM write rebuilds the disassembly for that byte
     * before returning unless `prevent_rebuild_cache` is set, in which case the
     * caller owes exactly one rebuild covering everything it deferred.
     */
    pub fn set_memory_value(
        &mut self,
        kind: StoreKind,
        address: usize,
        value: u8,
        prevent_rebuild_cache: bool,
        disable_side_effects: bool,
    ) {
        match kind {
            StoreKind::CpuMemory => {
                let Ok(addr) = u16::try_from(address) else {
                    return;
                };
                if disable_side_effects {
                    if let Some(info) = self.resolve(addr) {
                        self.set_memory_value(
                            info.address_type.into(),
                            info.offset,
                            value,
                            prevent_rebuild_cache,
                            true,
                        );
                    }
                } else {
                    self.memory_manager.borrow_mut().write(addr, value);
                }
            }
            StoreKind::InternalRam => {
                if address < INTERNAL_RAM_SIZE {
                    self.memory_manager.borrow_mut().debug_write(
                        address as u16,
                        value,
                        disable_side_effects,
                    );
                }
            }
            StoreKind::PaletteMemory => {
                if address < PALETTE_SIZE {
                    self.ppu.borrow_mut().write_palette_ram(address as u16, value);
                }
            }
            StoreKind::SpriteMemory => {
                if let Some(byte) = self.ppu.borrow_mut().sprite_ram_mut().get_mut(address) {
                    *byte = value;
                }
            }
            StoreKind::SecondarySpriteMemory => {
                if let Some(byte) = self
                    .ppu
                    .borrow_mut()
                    .secondary_sprite_ram_mut()
                    .get_mut(address)
                {
                    *byte = value;
                }
            }
            StoreKind::PpuMemory => {
                if address < PPU_SPACE_SIZE {
                    let mut cartridge = self.cartridge.borrow_mut();
                    if disable_side_effects {
                        cartridge.internal_write_vram(address as u16, value);
                    } else {
                        cartridge.write_vram(address as u16, value);
                    }
                }
            }
            StoreKind::ChrRom | StoreKind::ChrRam | StoreKind::WorkRam | StoreKind::SaveRam => {
                self.cartridge
                    .borrow_mut()
                    .set_memory_value(kind, address, value);
            }
            StoreKind::PrgRom => {
                self.cartridge
                    .borrow_mut()
                    .set_memory_value(kind, address, value);
                if !prevent_rebuild_cache {
                    self.rebuild_prg_rom_cache(address, 1);
                }
            }
        }
    }

    /// Little endian: `address` holds the low byte.
    pub fn get_memory_value_word(
        &mut self,
        kind: StoreKind,
        address: usize,
        disable_side_effects: bool,
    ) -> u16 {
        let low = self.get_memory_value(kind, address, disable_side_effects);
        let high = self.get_memory_value(kind, address.wrapping_add(1), disable_side_effects);
        u16::from_le_bytes([low, high])
    }

    pub fn set_memory_value_word(
        &mut self,
        kind: StoreKind,
        address: usize,
        value: u16,
        prevent_rebuild_cache: bool,
        disable_side_effects: bool,
    ) {
        let [low, high] = value.to_le_bytes();
        self.set_memory_value(kind, address, low, prevent_rebuild_cache, disable_side_effects);
        self.set_memory_value(
            kind,
            address.wrapping_add(1),
            high,
            prevent_rebuild_cache,
            disable_side_effects,
        );
    }

    /**
     * Writes `data` starting at `address` without side effects, then rebuilds
     * the disassembly for the edit. A CPU edit that lands in one contiguous
     * run of PRG ROM gets a single rebuild; otherwise every run of adjacent
     * PRG ROM bytes it touched is rebuilt on its own.
     */
    pub fn set_memory_values(&mut self, kind: StoreKind, address: usize, data: &[u8]) {
        for (i, value) in data.iter().enumerate() {
            self.set_memory_value(kind, address.wrapping_add(i), *value, true, true);
        }
        if data.is_empty() {
            return;
        }

        match kind {
            StoreKind::CpuMemory => match self.contiguous_prg_rom_offset(address, data.len()) {
                Some(offset) => self.rebuild_prg_rom_cache(offset, data.len()),
                None => {
                    for (offset, length) in self.prg_rom_runs(address, data.len()) {
                        self.rebuild_prg_rom_cache(offset, length);
                    }
                }
            },
            StoreKind::PrgRom => self.rebuild_prg_rom_cache(address, data.len()),
            _ => {}
        }
    }

    /// PRG ROM offset of `address` when both ends of the range resolve into it `length` bytes apart.
    fn contiguous_prg_rom_offset(&self, address: usize, length: usize) -> Option<usize> {
        let start = u16::try_from(address).ok()?;
        let end = u16::try_from(address.checked_add(length - 1)?).ok()?;
        let (start, end) = (self.resolve(start)?, self.resolve(end)?);
        if start.address_type == AddressType::PrgRom
            && end.address_type == AddressType::PrgRom
            && end.offset.checked_sub(start.offset) == Some(length - 1)
        {
            Some(start.offset)
        } else {
            None
        }
    }

    /// (offset, length) of each run of physically adjacent PRG ROM bytes behind a CPU range.
    fn prg_rom_runs(&self, address: usize, length: usize) -> Vec<(usize, usize)> {
        let mut runs: Vec<(usize, usize)> = Vec::new();
        let mut next_offset = None;
        for addr in address..address.saturating_add(length) {
            let Ok(addr) = u16::try_from(addr) else {
                break;
            };
            match self.resolve(addr) {
                Some(info) if info.address_type == AddressType::PrgRom => {
                    match runs.last_mut() {
                        Some((_, run_length)) if next_offset == Some(info.offset) => {
                            *run_length += 1
                        }
                        _ => runs.push((info.offset, 1)),
                    }
                    next_offset = Some(info.offset + 1);
                }
                _ => next_offset = None,
            }
        }
        runs
    }

    fn rebuild_prg_rom_cache(&self, offset: usize, length: usize) {
        let cartridge = self.cartridge.borrow();
        self.disassembler.borrow_mut().rebuild_prg_rom_cache(
            cartridge.core().prg_rom.as_slice(),
            offset,
            length,
        );
    }

    pub fn has_prg_chr_changes(&self) -> bool {
        self.cartridge.borrow().has_prg_chr_changes()
    }

    /// Puts back the PRG and CHR ROM the cartridge was loaded with.
    pub fn revert_prg_chr_changes(&mut self) {
        self.cartridge.borrow_mut().revert_prg_chr_changes();
        let size = self.get_memory_size(StoreKind::PrgRom);
        self.rebuild_prg_rom_cache(0, size);
    }

    /**
     * Nametable `index` (0-3) as a 256x240 picture using the current
     * background pattern table. The tile number and raw attribute byte of each
     * of the 32x30 tiles go to `tile_data` and `palette_data`.
     */
    pub fn get_nametable(
        &self,
        index: usize,
        frame_buffer: &mut [u32],
        tile_data: &mut [u8],
        palette_data: &mut [u8],
    ) {
        if frame_buffer.len() < NAMETABLE_WIDTH * NAMETABLE_HEIGHT
            || tile_data.len() < NAMETABLE_TILES
            || palette_data.len() < NAMETABLE_TILES
        {
            log::debug!("refusing nametable view into undersized buffers");
            return;
        }

        let ppu = self.ppu.borrow();
        let cartridge = self.cartridge.borrow();
        let bg_addr = ppu.control().background_pattern_addr;
        let base_addr = 0x2000 + (index as u16 & 0x03) * 0x0400;
        let base_attribute_addr = base_addr + ATTRIBUTE_TABLE_OFFSET;

        let mut screen_buffer = vec![0u16; NAMETABLE_WIDTH * NAMETABLE_HEIGHT];
        for y in 0..30u16 {
            for x in 0..32u16 {
                let tile_index = cartridge.internal_read_vram(base_addr + (y << 5) + x);
                let attribute = cartridge
                    .internal_read_vram(base_attribute_addr + ((y & 0xFC) << 1) + (x >> 2));
                tile_data[(y * 32 + x) as usize] = tile_index;
                palette_data[(y * 32 + x) as usize] = attribute;

                let shift = (x & 0x02) | ((y & 0x02) << 1);
                let palette_base_addr = (((attribute >> shift) & 0x03) as u16) << 2;
                let tile_addr = bg_addr + ((tile_index as u16) << 4);
                for i in 0..8u16 {
                    let low = cartridge.internal_read_vram(tile_addr + i);
                    let high = cartridge.internal_read_vram(tile_addr + i + 8);
                    for j in 0..8u16 {
                        let color = tile_pixel(low, high, 7 - j as u8);
                        let position = ((y << 11) + (x << 3) + (i << 8) + j) as usize;
                        screen_buffer[position] = if color == 0 {
                            ppu.read_palette_ram(0) as u16
                        } else {
                            ppu.read_palette_ram(palette_base_addr + color) as u16
                        };
                    }
                }
            }
        }

        self.video_decoder
            .decode_frame(&screen_buffer, &mut frame_buffer[..NAMETABLE_WIDTH * NAMETABLE_HEIGHT]);
    }

    /**
     * A 4k pattern table as a 128x128 picture in `palette` (0-7).
     *
     * Banks 0 and 1 are what's currently mapped at PPU 0x0000 and 0x1000.
     * Bank n >= 2 is physical CHR 0x1000 * (n - 2), whether mapped or not; a
     * bank past the end of CHR leaves `frame_buffer` untouched.
     *
     * `large_sprites` lays tiles out in 8x16 pairs. With a highlight mode,
     * pixels whose CHR byte doesn't match it (drawn for `HighlightUsed`, never
     * drawn for `HighlightUnused`) are dimmed.
     */
    pub fn get_chr_bank(
        &self,
        bank_index: usize,
        frame_buffer: &mut [u32],
        palette: u8,
        large_sprites: bool,
        highlight: CdlHighlight,
    ) {
        const PIXELS: usize = CHR_BANK_WIDTH * CHR_BANK_HEIGHT;
        if frame_buffer.len() < PIXELS {
            log::debug!("refusing chr bank view into a {} pixel buffer", frame_buffer.len());
            return;
        }

        let cartridge = self.cartridge.borrow();
        let code_data_logger = self.code_data_logger.borrow();
        let is_chr_ram = cartridge.memory_size(StoreKind::ChrRam) > 0;

        let mut chr_buffer = vec![0u8; CHR_BANK_SIZE];
        let mut chr_is_drawn = vec![true; CHR_BANK_SIZE];
        if bank_index < 2 {
            let base_addr = (bank_index * CHR_BANK_SIZE) as u16;
            for i in 0..CHR_BANK_SIZE {
                let addr = base_addr + i as u16;
                chr_buffer[i] = cartridge.internal_read_vram(addr);
                if !is_chr_ram {
                    chr_is_drawn[i] = cartridge
                        .to_absolute_chr_address(addr)
                        .is_some_and(|offset| code_data_logger.is_drawn(offset));
                }
            }
        } else {
            let kind = if is_chr_ram {
                StoreKind::ChrRam
            } else {
                StoreKind::ChrRom
            };
            let chr_size = cartridge.memory_size(kind);
            let base_addr = (bank_index - 2).saturating_mul(CHR_BANK_SIZE);
            if base_addr.saturating_add(CHR_BANK_SIZE - 1) >= chr_size {
                log::debug!(
                    "chr bank {} is past the end of {} bytes of {}",
                    bank_index,
                    chr_size,
                    kind
                );
                return;
            }

            let mut chr_data = vec![0u8; chr_size];
            cartridge.copy_memory(kind, &mut chr_data);
            chr_buffer.copy_from_slice(&chr_data[base_addr..base_addr + CHR_BANK_SIZE]);
            if !is_chr_ram {
                for (i, drawn) in chr_is_drawn.iter_mut().enumerate() {
                    *drawn = code_data_logger.is_drawn(base_addr + i);
                }
            }
        }
        drop(cartridge);

        let ppu = self.ppu.borrow();
        let palette_base_addr = ((palette & 0x07) as u16) << 2;
        let mut screen_buffer = vec![0u16; PIXELS];
        let mut tile_used = vec![false; PIXELS];
        for y in 0..16usize {
            for x in 0..16usize {
                let tile_addr = (y * 16 + x) << 4;
                for i in 0..8usize {
                    let low = chr_buffer[tile_addr + i];
                    let high = chr_buffer[tile_addr + i + 8];
                    let is_drawn = chr_is_drawn[tile_addr + i];
                    for j in 0..8usize {
                        let color = tile_pixel(low, high, 7 - j as u8);
                        let position = if large_sprites {
                            let tmp_x = x / 2 + if y & 0x01 != 0 { 8 } else { 0 };
                            let tmp_y = (y & 0xFE) + if x & 0x01 != 0 { 1 } else { 0 };
                            (tmp_y << 10) + (tmp_x << 3) + (i << 7) + j
                        } else {
                            (y << 10) + (x << 3) + (i << 7) + j
                        };

                        screen_buffer[position] = if color == 0 {
                            ppu.read_palette_ram(0) as u16
                        } else {
                            ppu.read_palette_ram(palette_base_addr + color) as u16
                        };
                        tile_used[position] = is_drawn;
                    }
                }
            }
        }

        let frame_buffer = &mut frame_buffer[..PIXELS];
        self.video_decoder.decode_frame(&screen_buffer, frame_buffer);

        if highlight != CdlHighlight::None {
            let dim_drawn = highlight != CdlHighlight::HighlightUsed;
            for (pixel, used) in frame_buffer.iter_mut().zip(tile_used) {
                if used == dim_drawn {
                    *pixel &= DIMMED_MASK;
                }
            }
        }
    }

    /**
     * All 64 sprites as an 8x8 grid of 8x16 cells, 64x128 pixels, honoring
     * each sprite's flip bits and the current sprite size. Colour 0 and the
     * unused half of 8x8 cells are transparent.
     */
    pub fn get_sprites(&self, frame_buffer: &mut [u32]) {
        const PIXELS: usize = SPRITES_WIDTH * SPRITES_HEIGHT;
        if frame_buffer.len() < PIXELS {
            log::debug!("refusing sprite view into a {} pixel buffer", frame_buffer.len());
            return;
        }

        let ppu = self.ppu.borrow();
        let cartridge = self.cartridge.borrow();
        let control = ppu.control();
        let sprite_ram = ppu.sprite_ram();
        let rows: u16 = if control.large_sprites { 16 } else { 8 };

        let mut screen_buffer = vec![TRANSPARENT; PIXELS];
        for y in 0..8u16 {
            for x in 0..8u16 {
                let ram_addr = (((y << 3) + x) << 2) as usize;
                let tile_index = sprite_ram[ram_addr + 1];
                let attributes = sprite_ram[ram_addr + 2];

                let vertical_mirror = attributes & 0x80 == 0x80;
                let horizontal_mirror = attributes & 0x40 == 0x40;

                let mut tile_addr = if control.large_sprites {
                    (if tile_index & 0x01 != 0 { 0x1000 } else { 0x0000 })
                        + (((tile_index & 0xFE) as u16) << 4)
                } else {
                    control.sprite_pattern_addr + ((tile_index as u16) << 4)
                };

                let palette_addr = 0x10 + (((attributes & 0x03) as u16) << 2);

                for i in 0..rows {
                    // second tile of an 8x16 sprite
                    if i == 8 {
                        tile_addr += 8;
                    }

                    let low = cartridge.internal_read_vram(tile_addr + i);
                    let high = cartridge.internal_read_vram(tile_addr + i + 8);
                    for j in 0..8u16 {
                        let color = if horizontal_mirror {
                            tile_pixel(low, high, j as u8)
                        } else {
                            tile_pixel(low, high, 7 - j as u8)
                        };

                        let row = if vertical_mirror { rows - 1 - i } else { i };
                        let dest_addr = ((y << 10) + (x << 3) + (row << 6) + j) as usize;

                        screen_buffer[dest_addr] = if color == 0 {
                            TRANSPARENT
                        } else {
                            ppu.read_palette_ram(palette_addr + color) as u16
                        };
                    }
                }
            }
        }

        self.video_decoder
            .decode_frame(&screen_buffer, &mut frame_buffer[..PIXELS]);
    }

    /// The 32 palette entries as a 4x8 picture.
    pub fn get_palette(&self, frame_buffer: &mut [u32]) {
        const PIXELS: usize = PALETTE_WIDTH * PALETTE_HEIGHT;
        if frame_buffer.len() < PIXELS {
            log::debug!("refusing palette view into a {} pixel buffer", frame_buffer.len());
            return;
        }

        let ppu = self.ppu.borrow();
        let screen_buffer: Vec<u16> = (0..PALETTE_SIZE as u16)
            .map(|addr| ppu.read_palette_ram(addr) as u16)
            .collect();
        self.video_decoder
            .decode_frame(&screen_buffer, &mut frame_buffer[..PIXELS]);
    }
}
