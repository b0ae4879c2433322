use crate::cartridge::{
    memory_region::{MemoryRegion, MemoryType},
    MirrorType,
};

fn nametables(mirror_type: MirrorType) -> MemoryRegion {
    let mut vram = MemoryRegion::new(MemoryType::VRAM, vec![0; 0x0800], 0x2000, 0x3FFF, false);
    vram.set_bank_size(0x0400);
    vram.set_mirror_type(mirror_type);
    vram
}

#[test]
fn test_vertical_mirroring() {
    let vram = nametables(MirrorType::Vertical);

    assert_eq!(Some(0x0000), vram.convert(0x2000));
    assert_eq!(Some(0x0399), vram.convert(0x2399));
    assert_eq!(Some(0x0400), vram.convert(0x2400));
    assert_eq!(Some(0x0799), vram.convert(0x2799));
    assert_eq!(Some(0x0000), vram.convert(0x2800));
    assert_eq!(Some(0x0399), vram.convert(0x2B99));
    assert_eq!(Some(0x0400), vram.convert(0x2C00));
    assert_eq!(Some(0x0799), vram.convert(0x2F99));
    for i in 0..=0x0EFF {
        assert_eq!(vram.convert(0x2000 + i), vram.convert(0x3000 + i));
    }
}

#[test]
fn test_horizontal_mirroring() {
    let vram = nametables(MirrorType::Horizontal);

    assert_eq!(Some(0x0000), vram.convert(0x2000));
    assert_eq!(Some(0x0399), vram.convert(0x2399));
    assert_eq!(Some(0x0000), vram.convert(0x2400));
    assert_eq!(Some(0x0399), vram.convert(0x2799));
    assert_eq!(Some(0x0400), vram.convert(0x2800));
    assert_eq!(Some(0x0799), vram.convert(0x2B99));
    assert_eq!(Some(0x0400), vram.convert(0x2C00));
    assert_eq!(Some(0x0799), vram.convert(0x2F99));
}

#[test]
fn test_single_screen_mirroring() {
    let vram = nametables(MirrorType::SingleScreen(1));

    for nametable in 0..4 {
        assert_eq!(Some(0x0400), vram.convert(0x2000 + nametable * 0x0400));
    }
}

#[test]
fn test_with_bank_set() {
    let mut ram = MemoryRegion::new(MemoryType::WorkRam, vec![0; 0x4000], 0x3000, 0x4FFF, false);
    ram.set_bank_size(0x0800);

    assert_eq!(Some(0x0000), ram.convert(0x3000));
    assert_eq!(Some(0x07FF), ram.convert(0x37FF));
    assert_eq!(Some(0x0000), ram.convert(0x3800));
    assert_eq!(Some(0x07FF), ram.convert(0x3FFF));

    ram.set_bank(0, 1);

    assert_eq!(Some(0x0800), ram.convert(0x3000));
    assert_eq!(Some(0x0FFF), ram.convert(0x37FF));
    assert_eq!(Some(0x0000), ram.convert(0x3800));
    assert_eq!(Some(0x07FF), ram.convert(0x3FFF));

    ram.set_bank(1, 2);

    assert_eq!(Some(0x0800), ram.convert(0x3000));
    assert_eq!(Some(0x0FFF), ram.convert(0x37FF));
    assert_eq!(Some(0x1000), ram.convert(0x3800));
    assert_eq!(Some(0x17FF), ram.convert(0x3FFF));

    ram.set_bank(1, -2);

    assert_eq!(Some(0x0800), ram.convert(0x3000));
    assert_eq!(Some(0x0FFF), ram.convert(0x37FF));
    assert_eq!(Some(0x3000), ram.convert(0x3800));
    assert_eq!(Some(0x37FF), ram.convert(0x3FFF));
}

#[test]
fn test_page_selection_wraps() {
    let mut rom = MemoryRegion::new(MemoryType::PrgRom, vec![0; 0x8000], 0x8000, 0xFFFF, true);
    rom.set_bank_size(0x4000);

    rom.set_bank(0, 5);
    assert_eq!(1, rom.get_bank(0));
    assert_eq!(Some(0x4000), rom.convert(0x8000));

    rom.set_bank(1, -1);
    assert_eq!(1, rom.get_bank(1));
}

#[test]
fn test_page_selection_is_always_in_bounds() {
    let store_sizes = [0x2000, 0x4000, 0x6000, 0x8000, 0x1_0000, 0x2_0000, 0x8_0000];
    let page_sizes = [0x0400, 0x1000, 0x2000, 0x4000, 0x8000];

    for store_size in store_sizes {
        for page_size in page_sizes {
            let mut rom =
                MemoryRegion::new(MemoryType::PrgRom, vec![0; store_size], 0x8000, 0xFFFF, true);
            rom.set_bank_size(page_size);
            let physical_pages = (store_size / page_size).max(1);

            for page in (-64..=1100).chain([i16::MIN, i16::MAX]) {
                for slot in 0..rom.slot_count() {
                    rom.set_bank(slot, page);
                    assert!(rom.get_bank(slot) < physical_pages);
                }
                for addr in [0x8000u16, 0x9FFF, 0xBFFF, 0xC000, 0xFFFF] {
                    let converted = rom.convert(addr).unwrap();
                    assert!(
                        converted < store_size,
                        "page {page} size {page_size:#x} store {store_size:#x} -> {converted:#x}"
                    );
                }
            }
        }
    }
}

#[test]
fn test_empty_storage_is_unmapped() {
    let mut ram = MemoryRegion::new(MemoryType::SaveRam, Vec::new(), 0x6000, 0x7FFF, false);
    ram.set_bank(0, 3);

    assert_eq!(None, ram.convert(0x6000));
    assert_eq!(0, ram.read(0x6000));
    assert_eq!(0, ram.write(0x6000, 0x12));
    assert_eq!(0, ram.read_absolute(0));
}

#[test]
fn test_write_protect_only_applies_to_bus_writes() {
    let mut rom = MemoryRegion::new(MemoryType::PrgRom, vec![0; 0x4000], 0x8000, 0xFFFF, true);

    rom.write(0x8001, 0x55);
    assert_eq!(0, rom.read(0x8001));

    rom.write_absolute(1, 0x55);
    assert_eq!(0x55, rom.read(0x8001));
    assert_eq!(0x55, rom.read(0xC001));
}
