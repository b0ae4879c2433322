pub mod address_resolver;
pub mod code_data_logger;
pub mod disassembler;
pub mod memory_dumper;
pub mod video_decoder;

use strum_macros::{Display, EnumIter, EnumString};

/// Every memory space the debugger can address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display, EnumIter, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum StoreKind {
    CpuMemory,
    PpuMemory,
    InternalRam,
    PaletteMemory,
    SpriteMemory,
    SecondarySpriteMemory,
    PrgRom,
    ChrRom,
    ChrRam,
    WorkRam,
    SaveRam,
}

impl StoreKind {
    /// Size of the stores whose size doesn't depend on the cartridge.
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            StoreKind::CpuMemory => Some(0x10000),
            StoreKind::PpuMemory => Some(0x4000),
            StoreKind::InternalRam => Some(0x0800),
            StoreKind::PaletteMemory => Some(0x20),
            StoreKind::SpriteMemory => Some(0x100),
            StoreKind::SecondarySpriteMemory => Some(0x20),
            StoreKind::PrgRom
            | StoreKind::ChrRom
            | StoreKind::ChrRam
            | StoreKind::WorkRam
            | StoreKind::SaveRam => None,
        }
    }
}

/// Physical stores a CPU address can land in.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum AddressType {
    InternalRam,
    PrgRom,
    WorkRam,
    SaveRam,
}

impl From<AddressType> for StoreKind {
    fn from(address_type: AddressType) -> Self {
        match address_type {
            AddressType::InternalRam => StoreKind::InternalRam,
            AddressType::PrgRom => StoreKind::PrgRom,
            AddressType::WorkRam => StoreKind::WorkRam,
            AddressType::SaveRam => StoreKind::SaveRam,
        }
    }
}

/**
 * Where a CPU address lands right now. Only valid until the next bank switch,
 * so it's recomputed for every request rather than cached.
 */
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AddressInfo {
    pub address_type: AddressType,
    pub offset: usize,
}

impl AddressInfo {
    pub fn new(address_type: AddressType, offset: usize) -> Self {
        Self {
            address_type,
            offset,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CdlHighlight {
    #[default]
    None,
    HighlightUsed,
    HighlightUnused,
}
