use crate::debugger::disassembler::{instruction_size, Disassembler, DisassemblyCache, DisassemblyInfo};

#[test]
fn test_instruction_sizes() {
    // BRK, JSR abs, RTI, RTS
    assert_eq!(1, instruction_size(0x00));
    assert_eq!(3, instruction_size(0x20));
    assert_eq!(1, instruction_size(0x40));
    assert_eq!(1, instruction_size(0x60));

    // LDA #, LDA zp, LDA abs, LDA (zp),y, LDA abs,x
    assert_eq!(2, instruction_size(0xA9));
    assert_eq!(2, instruction_size(0xA5));
    assert_eq!(3, instruction_size(0xAD));
    assert_eq!(2, instruction_size(0xB1));
    assert_eq!(3, instruction_size(0xBD));

    // LDX #, LDY #, ASL A, TXS, LDX abs,y
    assert_eq!(2, instruction_size(0xA2));
    assert_eq!(2, instruction_size(0xA0));
    assert_eq!(1, instruction_size(0x0A));
    assert_eq!(1, instruction_size(0x9A));
    assert_eq!(3, instruction_size(0xBE));

    // BNE, JMP, JMP (ind), CLC
    assert_eq!(2, instruction_size(0xD0));
    assert_eq!(3, instruction_size(0x4C));
    assert_eq!(3, instruction_size(0x6C));
    assert_eq!(1, instruction_size(0x18));

    // unofficial: JAM, NOP #, LAX zp, DCP abs
    assert_eq!(1, instruction_size(0x02));
    assert_eq!(2, instruction_size(0x80));
    assert_eq!(2, instruction_size(0xA7));
    assert_eq!(3, instruction_size(0xCF));
}

#[test]
fn test_build_cache_only_decodes_executed_offsets() {
    let prg = [0xA9, 0x10, 0x8D, 0x00, 0x20, 0xEA];
    let mut cache = DisassemblyCache::new(prg.len());
    cache.build_cache(&prg, 0);
    cache.build_cache(&prg, 2);

    assert_eq!(
        Some(DisassemblyInfo {
            opcode: 0xA9,
            operands: [0x10, 0x00],
            size: 2
        }),
        cache.get(0)
    );
    assert_eq!(
        Some(DisassemblyInfo {
            opcode: 0x8D,
            operands: [0x00, 0x20],
            size: 3
        }),
        cache.get(2)
    );
    assert_eq!(None, cache.get(1));
    assert_eq!(None, cache.get(5));
    assert_eq!(None, cache.get(100));
}

#[test]
fn test_rebuild_redecodes_overlapping_entries() {
    let mut prg = vec![0xA9, 0x10, 0x8D, 0x00, 0x20, 0xEA];
    let mut cache = DisassemblyCache::new(prg.len());
    cache.build_cache(&prg, 0);
    cache.build_cache(&prg, 2);
    cache.build_cache(&prg, 5);

    // patch the high operand byte of the STA
    prg[4] = 0x40;
    cache.rebuild_prg_rom_cache(&prg, 4, 1);
    assert_eq!([0x00, 0x40], cache.get(2).unwrap().operands);

    // the entry before the range start is left alone
    prg[0] = 0xEA;
    cache.rebuild_prg_rom_cache(&prg, 4, 2);
    assert_eq!(0xA9, cache.get(0).unwrap().opcode);
    assert_eq!(None, cache.get(4));
}

#[test]
fn test_operands_past_the_end_read_as_zero() {
    let prg = [0x20, 0x34];
    let mut cache = DisassemblyCache::new(prg.len());
    cache.build_cache(&prg, 0);

    assert_eq!([0x34, 0x00], cache.get(0).unwrap().operands);
}
