use crate::{
    cartridge::MirrorType,
    console::create_test_console,
    debugger::StoreKind,
};

#[test]
fn test_state_round_trip() {
    let mut console = create_test_console(202, 8, 8, 0);
    {
        let mm = console.memory_manager();
        let mut mm = mm.borrow_mut();
        mm.write(0x0042, 0x99);
        mm.write(0x6001, 0x77);
        mm.write(0x8009, 0);
    }
    console.ppu().borrow_mut().sprite_ram_mut()[3] = 0x33;

    let saved = console.save_state().unwrap();

    let mut restored = create_test_console(202, 8, 8, 0);
    restored.load_state(saved.clone()).unwrap();

    let cartridge = restored.cartridge();
    assert_eq!(4, cartridge.borrow().prg_page(0));
    assert_eq!(5, cartridge.borrow().prg_page(1));
    assert_eq!(MirrorType::Horizontal, cartridge.borrow().mirror_type());

    let mut dumper = restored.memory_dumper();
    assert_eq!(0x99, dumper.get_memory_value(StoreKind::InternalRam, 0x42, true));
    assert_eq!(0x77, dumper.get_memory_value(StoreKind::WorkRam, 0x01, true));
    assert_eq!(0x33, dumper.get_memory_value(StoreKind::SpriteMemory, 3, true));

    assert_eq!(saved, restored.save_state().unwrap());
}

#[test]
fn test_load_state_rejects_garbage() {
    let mut console = create_test_console(0, 1, 1, 0);
    let mut saved = console.save_state().unwrap();

    assert!(console.load_state(saved[..saved.len() - 1].to_vec()).is_err());

    saved.push(0);
    assert!(console.load_state(saved).is_err());

    // mirroring mode 9 doesn't exist
    assert!(console.load_state(vec![9]).is_err());
}

#[test]
fn test_rejected_state_leaves_console_untouched() {
    let other = create_test_console(202, 8, 8, 0);
    {
        let mm = other.memory_manager();
        let mut mm = mm.borrow_mut();
        mm.write(0x0042, 0x99);
        mm.write(0x8009, 0);
    }
    let other_state = other.save_state().unwrap();

    let mut console = create_test_console(202, 8, 8, 0);
    let before = console.save_state().unwrap();

    // the bank registers and internal RAM load fine, the tail is missing
    let truncated = other_state[..other_state.len() - 5].to_vec();
    assert!(console.load_state(truncated).is_err());

    assert_eq!(before, console.save_state().unwrap());
    assert_eq!(0, console.cartridge().borrow().prg_page(0));
    let mut dumper = console.memory_dumper();
    assert_eq!(0, dumper.get_memory_value(StoreKind::InternalRam, 0x42, true));

    // a good state still goes through afterwards
    console.load_state(other_state.clone()).unwrap();
    assert_eq!(other_state, console.save_state().unwrap());
}

#[test]
fn test_dumpers_share_the_session() {
    let console = create_test_console(0, 2, 1, 0);
    let mut first = console.memory_dumper();
    let mut second = console.memory_dumper();

    first.set_memory_value(StoreKind::PrgRom, 0x10, 0xEA, false, true);
    assert_eq!(0xEA, second.get_memory_value(StoreKind::CpuMemory, 0x8010, true));
}

#[test]
fn test_debug_edits_keep_disassembly_current() {
    let console = create_test_console(0, 1, 1, 0);
    let mut dumper = console.memory_dumper();
    dumper.set_memory_values(StoreKind::CpuMemory, 0x8000, &[0xA9, 0x01, 0xEA]);

    let cache = console.disassembly_cache();
    {
        let cartridge = console.cartridge();
        let cartridge = cartridge.borrow();
        let prg_rom = cartridge.core().prg_rom.as_slice();
        cache.borrow_mut().build_cache(prg_rom, 0);
        cache.borrow_mut().build_cache(prg_rom, 2);
    }
    assert_eq!(2, cache.borrow().get(0).unwrap().size);

    // LDA # becomes LDA abs
    dumper.set_memory_values(StoreKind::CpuMemory, 0x8000, &[0xAD, 0x34, 0x12]);
    let entry = cache.borrow().get(0).unwrap();
    assert_eq!(0xAD, entry.opcode);
    assert_eq!([0x34, 0x12], entry.operands);
    assert_eq!(3, entry.size);
    assert_eq!(None, cache.borrow().get(1));
}
