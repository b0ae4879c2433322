#![allow(clippy::upper_case_acronyms)]

pub mod bus;
pub mod cartridge;
pub mod console;
pub mod debugger;
pub mod memory_manager;
pub mod ppu;
pub mod ram;
pub mod state;
