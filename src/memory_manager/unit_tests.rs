use std::{cell::RefCell, rc::Rc};

use crate::{
    cartridge::{test_rom_image, Cartridge, CartridgePPUPort},
    memory_manager::MemoryManager,
    ppu::{flags::StatusFlags, PPU},
};

fn create_test_configuration() -> (MemoryManager, Rc<RefCell<PPU>>) {
    let cartridge = Rc::new(RefCell::new(
        Cartridge::from_bytes(&test_rom_image(2, 4, 0, 0)).unwrap(),
    ));
    let ppu = Rc::new(RefCell::new(PPU::new()));
    ppu.borrow_mut()
        .add_device(Rc::new(RefCell::new(CartridgePPUPort::new(cartridge.clone()))));
    (MemoryManager::new(ppu.clone(), cartridge), ppu)
}

#[test]
fn test_internal_ram_is_mirrored() {
    let (mut mm, _ppu) = create_test_configuration();
    mm.write(0x0012, 0x34);

    assert_eq!(0x34, mm.read(0x0812));
    assert_eq!(0x34, mm.read(0x1012));
    assert_eq!(0x34, mm.peek(0x1812));
    assert_eq!(0x34, mm.internal_ram().borrow().raw()[0x12]);
}

#[test]
fn test_open_bus() {
    let (mut mm, _ppu) = create_test_configuration();
    mm.write(0x0000, 0x5A);
    assert_eq!(0x5A, mm.read(0x0000));

    // nothing answers at 0x4018, the last value on the bus comes back
    assert_eq!(0x5A, mm.read(0x4018));
    assert_eq!(0, mm.peek(0x4018));
    assert_eq!(0x5A, mm.open_bus());
}

#[test]
fn test_peek_has_no_side_effects() {
    let (mut mm, ppu) = create_test_configuration();
    ppu.borrow_mut().set_vertical_blank(true);
    mm.write(0x0000, 0x11);

    let peeked = mm.peek(0x2002);
    assert!(ppu.borrow().status().contains(StatusFlags::VerticalBlank));
    assert_eq!(0x11, mm.open_bus());

    assert_eq!(peeked, mm.read(0x2002));
    assert!(!ppu.borrow().status().contains(StatusFlags::VerticalBlank));
    assert_eq!(peeked, mm.open_bus());
}

#[test]
fn test_debug_access_honors_side_effect_flag() {
    let (mut mm, ppu) = create_test_configuration();
    ppu.borrow_mut().set_vertical_blank(true);

    mm.debug_read(0x2002, true);
    assert!(ppu.borrow().status().contains(StatusFlags::VerticalBlank));

    mm.debug_read(0x2002, false);
    assert!(!ppu.borrow().status().contains(StatusFlags::VerticalBlank));
}

#[test]
fn test_writes_reach_mapper_registers() {
    let (mut mm, _ppu) = create_test_configuration();
    assert_eq!(0x80, mm.read(0x8000));

    mm.write(0x8000, 2);
    assert_eq!(0x82, mm.read(0x8000));
    assert_eq!(0x83, mm.read(0xC000));
}

#[test]
fn test_inspection_write_to_rom_bypasses_registers() {
    let (mut mm, _ppu) = create_test_configuration();

    mm.debug_write(0x8000, 0x42, true);
    assert_eq!(0x42, mm.peek(0x8000));
    // no bank switch happened
    assert_eq!(0x80, mm.peek(0x8001));
}

#[test]
fn test_oam_dma() {
    let (mut mm, ppu) = create_test_configuration();
    for i in 0..=0xFFu16 {
        mm.write(0x0200 + i, i as u8);
    }
    mm.write(0x2003, 0x10);
    mm.write(0x4014, 0x02);

    let ppu = ppu.borrow();
    assert_eq!(0x00, ppu.sprite_ram()[0x10]);
    assert_eq!(0xEF, ppu.sprite_ram()[0xFF]);
    assert_eq!(0xF0, ppu.sprite_ram()[0x00]);
}
