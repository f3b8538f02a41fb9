use crate::filters::FontFilter;

/// Give the font a new family name
///
/// Family, full and PostScript name records are all replaced; the PostScript
/// name has its whitespace removed.
pub struct RenameFamily(String);

impl RenameFamily {
    pub fn new(name: impl Into<String>) -> Self {
        RenameFamily(name.into())
    }
}

impl FontFilter for RenameFamily {
    fn apply(&self, font: &mut crate::Font) -> Result<(), crate::FontCleanerError> {
        log::info!("Renaming font to {:?}", self.0);
        for rename in font.rename(&self.0)? {
            log::info!("{} -> {}", rename.old, rename.new);
        }
        Ok(())
    }
}
