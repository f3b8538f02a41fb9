use std::io;
use thiserror::Error;

/// Errors produced while cleaning a font
#[derive(Debug, Error)]
pub enum FontCleanerError {
    #[error("IO Error: {0}")]
    /// IO error
    IO(#[from] io::Error),

    #[error("Binary font reading error: {0}")]
    /// The font file could not be parsed
    BinaryFontRead(#[from] write_fonts::read::ReadError),

    /// The font has no TrueType outlines
    #[error("Font has no 'glyf'/'loca' tables; only TrueType outlines are supported")]
    NotTrueType,

    /// None of the cmap subtables could serve as a Unicode character map
    #[error("Font has no usable Unicode cmap subtable")]
    NoUnicodeCmap,

    #[error("Error compiling font: {0}")]
    /// A table could not be compiled when saving
    Compile(String),

    #[error("Name {name:?} cannot be encoded for platform {platform_id}")]
    /// A new name contains characters the record's encoding cannot represent
    UnencodableName {
        /// The name which was requested
        name: String,
        /// The platform ID of the record
        platform_id: u16,
    },
}

impl From<write_fonts::BuilderError> for FontCleanerError {
    fn from(val: write_fonts::BuilderError) -> Self {
        FontCleanerError::Compile(val.to_string())
    }
}
