use crate::filters::FontFilter;

/// Unmap every character whose glyph draws nothing
#[derive(Default)]
pub struct DropEmptyGlyphs;

impl DropEmptyGlyphs {
    pub fn new() -> Self {
        DropEmptyGlyphs
    }
}

impl FontFilter for DropEmptyGlyphs {
    fn apply(&self, font: &mut crate::Font) -> Result<(), crate::FontCleanerError> {
        let partition = font.partition()?;
        log::info!("Empty glyphs: {}", partition.removed.len());
        log::info!("Valid glyphs: {}", partition.valid.len());
        font.retain_codepoints(&partition.valid_codepoints())
    }
}
