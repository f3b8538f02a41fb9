mod dropemptyglyphs;
mod renamefamily;

pub use dropemptyglyphs::DropEmptyGlyphs;
pub use renamefamily::RenameFamily;

pub trait FontFilter {
    fn apply(&self, font: &mut crate::Font) -> Result<(), crate::FontCleanerError>;
}
