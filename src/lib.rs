#![deny(clippy::unwrap_used, clippy::expect_used)]
//! Remove characters mapped to empty glyphs from TrueType fonts
//!
//! A font often maps characters to glyphs which draw nothing at all. This
//! crate finds those characters, using the font's best Unicode character map,
//! and unmaps them from every `cmap` subtable so that text renderers fall
//! back to another font instead of showing blanks. The font can optionally be
//! given a new family name at the same time.
//!
//! The work is done by [`filters::FontFilter`]s applied to a [`Font`];
//! [`cleanup`] runs the whole pipeline from one file to another.

#[cfg(feature = "cli")]
mod args;
pub mod cmap;
mod error;
pub mod filters;
mod font;
pub mod names;
pub mod pen;
pub mod visibility;

#[cfg(feature = "cli")]
pub use crate::args::Args;
pub use crate::{
    cmap::Charmap,
    error::FontCleanerError,
    font::{Font, GlyphTable, Partition, TrueTypeGlyph},
    visibility::{has_visible_contours, GlyphOutline, Probe, Visibility},
};
use filters::FontFilter;
use std::path::{Path, PathBuf};

/// Load a TrueType font from a file
pub fn load(filename: impl AsRef<Path>) -> Result<Font, FontCleanerError> {
    Font::load(filename)
}

/// The file a cleaned font is written to when no output path is given
///
/// This is the input file's stem with `_cleaned` appended, keeping the
/// extension and directory: `fonts/Foo.ttf` becomes `fonts/Foo_cleaned.ttf`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let mut file_name = input.file_stem().unwrap_or_default().to_os_string();
    file_name.push("_cleaned");
    if let Some(ext) = input.extension() {
        file_name.push(".");
        file_name.push(ext);
    }
    input.with_file_name(file_name)
}

/// Clean the font at `input`, writing the result to `output`
///
/// Characters whose glyph is empty are dropped from every character map
/// subtable and, if `new_name` is given, the family is renamed.
pub fn cleanup(input: &Path, output: &Path, new_name: Option<&str>) -> Result<(), FontCleanerError> {
    log::info!("Processing {}", input.display());
    let mut font = load(input)?;

    let mut filters: Vec<Box<dyn FontFilter>> = vec![Box::new(crate::filters::DropEmptyGlyphs::new())];
    if let Some(name) = new_name {
        filters.push(Box::new(crate::filters::RenameFamily::new(name)));
    }
    for filter in filters {
        filter.apply(&mut font)?;
    }

    log::info!("Saving {}", output.display());
    font.save(output)
}
