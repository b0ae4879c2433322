use crate::debugger::code_data_logger::{CdlChrFlags, CdlPrgFlags, CodeDataLogger};

#[test]
fn test_flags_accumulate() {
    let mut cdl = CodeDataLogger::new(0x10, 0x10);
    cdl.set_prg_flags(3, CdlPrgFlags::Code);
    cdl.set_prg_flags(3, CdlPrgFlags::Data);
    cdl.set_chr_flags(5, CdlChrFlags::Read);

    assert!(cdl.is_code(3));
    assert!(cdl.is_data(3));
    assert!(!cdl.is_code(4));
    assert!(!cdl.is_drawn(5));

    cdl.set_chr_flags(5, CdlChrFlags::Drawn);
    assert!(cdl.is_drawn(5));
}

#[test]
fn test_out_of_range_is_ignored() {
    let mut cdl = CodeDataLogger::new(0x10, 0x10);
    cdl.set_prg_flags(0x10, CdlPrgFlags::Code);
    cdl.set_chr_flags(0x10, CdlChrFlags::Drawn);

    assert!(!cdl.is_code(0x10));
    assert!(!cdl.is_drawn(0x10));
    assert!(!cdl.is_drawn(usize::MAX));
}

#[test]
fn test_reset() {
    let mut cdl = CodeDataLogger::new(0x10, 0x10);
    cdl.set_prg_flags(0, CdlPrgFlags::Code);
    cdl.set_chr_flags(0, CdlChrFlags::Drawn);
    cdl.reset();

    assert!(!cdl.is_code(0));
    assert!(!cdl.is_drawn(0));
}
