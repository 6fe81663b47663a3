use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Errors that can occur while loading a program image into a machine.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("could not read program from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("program is {len} bytes, but at most {max} bytes can be loaded")]
    TooLarge { len: usize, max: usize },
    #[error("program is empty")]
    Empty,
}

/// The reason a machine stopped executing. Faults are recorded in the machine's state and
/// surfaced to the host as a tick of zero cycles. They never unwind.
#[derive(thiserror::Error, Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fault {
    #[error("op code '0x{opcode:0>4X}' @ 0x{addr:0>4X} does not correspond to any valid operation")]
    InvalidOpcode { opcode: u16, addr: u16 },
    #[error("call @ 0x{addr:0>4X} overflowed the stack")]
    StackOverflow { addr: u16 },
    #[error("return @ 0x{addr:0>4X} with an empty stack")]
    StackUnderflow { addr: u16 },
}
