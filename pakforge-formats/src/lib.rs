use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("The file's magic value 0x{magic:08X} does not match the expectation")]
    InvalidMagic { magic: u32 },

    #[error("Unrecognized format version 0x{version:X}")]
    UnsupportedVersion { version: u32 },

    #[error("The file is violating the expected format, because: {reason}")]
    Malformed { reason: &'static str },

    /// Represents all cases of `std::io::Error`, including EOF mid-field.
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    UTF8ConversationError(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    UTF16ConversationError(#[from] std::string::FromUtf16Error),
}

pub mod anim;
pub mod audio;
pub mod cinf;
pub mod collision;
pub mod common;
pub mod cskr;
pub mod dgrp;
pub mod font;
pub mod frme;
pub mod hint;
pub mod map;
pub mod mat;
pub mod res_type;
pub mod resource;
pub mod scly;
pub mod strg;
pub mod unsupported;
pub mod world;
