// Adapters layer: concrete implementations that talk to external programs.

pub mod process;
