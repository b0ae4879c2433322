#[cfg(test)]
mod unit_tests;

bitflags::bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct CdlPrgFlags: u8 {
        const Code = 0b00000001;
        const Data = 0b00000010;
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct CdlChrFlags: u8 {
        const Drawn = 0b00000001;
        const Read = 0b00000010;
    }
}

/// Records how each physical PRG and CHR byte has been used during the session.
pub struct CodeDataLogger {
    prg_flags: Vec<CdlPrgFlags>,
    chr_flags: Vec<CdlChrFlags>,
}

impl CodeDataLogger {
    pub fn new(prg_size: usize, chr_size: usize) -> Self {
        Self {
            prg_flags: vec![CdlPrgFlags::empty(); prg_size],
            chr_flags: vec![CdlChrFlags::empty(); chr_size],
        }
    }

    pub fn set_prg_flags(&mut self, offset: usize, flags: CdlPrgFlags) {
        if let Some(entry) = self.prg_flags.get_mut(offset) {
            entry.insert(flags);
        }
    }

    pub fn set_chr_flags(&mut self, offset: usize, flags: CdlChrFlags) {
        if let Some(entry) = self.chr_flags.get_mut(offset) {
            entry.insert(flags);
        }
    }

    pub fn is_code(&self, offset: usize) -> bool {
        self.prg_flags
            .get(offset)
            .is_some_and(|flags| flags.contains(CdlPrgFlags::Code))
    }

    pub fn is_data(&self, offset: usize) -> bool {
        self.prg_flags
            .get(offset)
            .is_some_and(|flags| flags.contains(CdlPrgFlags::Data))
    }

    pub fn is_drawn(&self, offset: usize) -> bool {
        self.chr_flags
            .get(offset)
            .is_some_and(|flags| flags.contains(CdlChrFlags::Drawn))
    }

    pub fn reset(&mut self) {
        self.prg_flags.fill(CdlPrgFlags::empty());
        self.chr_flags.fill(CdlChrFlags::empty());
    }
}
