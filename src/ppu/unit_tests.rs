use std::{cell::RefCell, rc::Rc};

use crate::bus::BusDevice;
use crate::ppu::flags::{CtrlFlags, StatusFlags};
use crate::ppu::PPU;
use crate::ram::RAM;

fn create_test_configuration() -> (PPU, Rc<RefCell<RAM>>) {
    let mut ppu = PPU::new();
    let mem = Rc::new(RefCell::new(RAM::new(0x0000, 0x3FFF, 0x3FFF)));
    ppu.add_device(mem.clone());
    (ppu, mem)
}

fn set_vram_address(ppu: &mut PPU, addr: u16) {
    ppu.write(0x2006, (addr >> 8) as u8);
    ppu.write(0x2006, addr as u8);
}

#[test]
fn test_status_read_acknowledges_vertical_blank() {
    let (mut ppu, _mem) = create_test_configuration();
    ppu.set_vertical_blank(true);

    let expected = (StatusFlags::VerticalBlank | StatusFlags::SpriteOverflow).bits();
    assert_eq!(Some(expected), ppu.read(0x2002));

    // first read should have cleared the vertical blank flag
    assert_eq!(Some(StatusFlags::SpriteOverflow.bits()), ppu.read(0x2002));
}

#[test]
fn test_status_peek_has_no_side_effects() {
    let (mut ppu, _mem) = create_test_configuration();
    ppu.set_vertical_blank(true);
    ppu.write(0x2006, 0x21);
    assert!(ppu.write_toggle());

    for _ in 0..3 {
        assert_eq!(Some(0b1010_0000), ppu.peek(0x3FFA));
    }
    assert!(ppu.status().contains(StatusFlags::VerticalBlank));
    assert!(ppu.write_toggle());
}

#[test]
fn test_data_reads_are_buffered() {
    let (mut ppu, mem) = create_test_configuration();
    mem.borrow_mut().raw_mut()[0x2105] = 0x42;
    mem.borrow_mut().raw_mut()[0x2106] = 0x43;
    set_vram_address(&mut ppu, 0x2105);

    assert_eq!(Some(0), ppu.read(0x2007));
    assert_eq!(Some(0x42), ppu.read(0x2007));
    assert_eq!(0x2107, ppu.vram_address());

    assert_eq!(Some(0x43), ppu.peek(0x2007));
    assert_eq!(0x2107, ppu.vram_address());
}

#[test]
fn test_increment_across() {
    let (mut ppu, _mem) = create_test_configuration();
    ppu.write(0x2000, CtrlFlags::VramIncrement32.bits());
    set_vram_address(&mut ppu, 0x2000);
    ppu.write(0x2007, 0x01);

    assert_eq!(0x2020, ppu.vram_address());
}

#[test]
fn test_palette_mirrors() {
    let (mut ppu, _mem) = create_test_configuration();

    ppu.write_palette_ram(0x10, 0x3F);
    assert_eq!(0x3F, ppu.read_palette_ram(0x00));
    ppu.write_palette_ram(0x1C, 0x2A);
    assert_eq!(0x2A, ppu.read_palette_ram(0x0C));
    ppu.write_palette_ram(0x11, 0x15);
    assert_eq!(0x15, ppu.read_palette_ram(0x11));
    assert_eq!(0x15, ppu.read_palette_ram(0x31));
    ppu.write_palette_ram(0x05, 0xFF);
    assert_eq!(0x3F, ppu.read_palette_ram(0x05));
}

#[test]
fn test_palette_through_data_port() {
    let (mut ppu, _mem) = create_test_configuration();
    set_vram_address(&mut ppu, 0x3F01);
    ppu.write(0x2007, 0x21);

    assert_eq!(0x21, ppu.read_palette_ram(0x01));
    set_vram_address(&mut ppu, 0x3F01);
    assert_eq!(Some(0x21), ppu.read(0x2007));
}

#[test]
fn test_control_snapshot() {
    let (mut ppu, _mem) = create_test_configuration();
    ppu.write(
        0x2000,
        (CtrlFlags::BackgroundPatternHigh | CtrlFlags::TallSprites).bits(),
    );

    let control = ppu.control();
    assert_eq!(0x1000, control.background_pattern_addr);
    assert_eq!(0x0000, control.sprite_pattern_addr);
    assert!(control.large_sprites);
}

#[test]
fn test_oam_dma_starts_at_oam_addr() {
    let (mut ppu, _mem) = create_test_configuration();
    let mut page = [0; 256];
    for (i, byte) in page.iter_mut().enumerate() {
        *byte = i as u8;
    }
    ppu.write(0x2003, 0x02);
    ppu.write_oam_dma(&page);

    for address in 0..0x0100 {
        let data = (address as u8).wrapping_sub(0x02);
        assert_eq!(data, ppu.sprite_ram()[address]);
    }
}
