use anyhow::{Context, Result, bail};
use std::str::FromStr;

use nes_memcore::{console::Console, debugger::StoreKind};

const USAGE: &str = "usage: nes-memcore <rom.nes> [store-kind] [start] [length]";

fn parse_number(text: &str) -> Result<usize> {
    let hex = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .or_else(|| text.strip_prefix('$'));
    let value = match hex {
        Some(digits) => usize::from_str_radix(digits, 16),
        None => text.parse(),
    };
    value.with_context(|| format!("'{}' isn't a number", text))
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(rom) = args.first() else {
        bail!(USAGE);
    };
    let kind = match args.get(1) {
        Some(name) => StoreKind::from_str(name)
            .with_context(|| format!("unknown store kind '{}'", name))?,
        None => StoreKind::CpuMemory,
    };

    let console = Console::load(rom)?;
    let mut dumper = console.memory_dumper();

    let size = dumper.get_memory_size(kind);
    let start = args.get(2).map(|s| parse_number(s)).transpose()?.unwrap_or(0);
    let length = args
        .get(3)
        .map(|s| parse_number(s))
        .transpose()?
        .unwrap_or(size.saturating_sub(start));
    if start.saturating_add(length) > size {
        bail!(
            "{:#x}+{:#x} is outside {} ({:#x} bytes)",
            start,
            length,
            kind,
            size
        );
    }

    let mut memory = vec![0; size];
    dumper.get_memory_state(kind, &mut memory);

    for (row, chunk) in memory[start..start + length].chunks(16).enumerate() {
        let bytes: Vec<String> = chunk.iter().map(|b| format!("{:02X}", b)).collect();
        println!("{:06X}: {}", start + row * 16, bytes.join(" "));
    }
    Ok(())
}
