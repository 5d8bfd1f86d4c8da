pub mod elf;
pub mod ident;

pub use elf::ElfHeader;
pub use ident::{Class, Endianness, Ident};
