bitflags::bitflags! {
    /// PPUCTRL ($2000)
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct CtrlFlags: u8 {
        const NametableX = 1 << 0;
        const NametableY = 1 << 1;
        const VramIncrement32 = 1 << 2;
        const SpritePatternHigh = 1 << 3;
        const BackgroundPatternHigh = 1 << 4;
        const TallSprites = 1 << 5;
        const ExtOutput = 1 << 6;
        const GenerateNmi = 1 << 7;
    }
}

bitflags::bitflags! {
    /// PPUMASK ($2001). Only greyscale affects what the CPU reads back.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct MaskFlags: u8 {
        const Greyscale = 1 << 0;
        const BackgroundLeftColumn = 1 << 1;
        const SpritesLeftColumn = 1 << 2;
        const Background = 1 << 3;
        const Sprites = 1 << 4;
        const EmphasizeRed = 1 << 5;
        const EmphasizeGreen = 1 << 6;
        const EmphasizeBlue = 1 << 7;
    }
}

bitflags::bitflags! {
    /// PPUSTATUS ($2002). The low 5 bits are open bus.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct StatusFlags: u8 {
        const SpriteOverflow = 1 << 5;
        const SpriteZeroHit = 1 << 6;
        const VerticalBlank = 1 << 7;
    }
}
