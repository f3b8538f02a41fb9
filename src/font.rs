use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use skrifa::{
    instance::{LocationRef, Size},
    outline::{DrawSettings, OutlineGlyph, OutlineGlyphCollection},
    MetadataProvider,
};
use write_fonts::{
    read::{
        tables::{
            cmap::Cmap,
            glyf::{Glyf, Glyph},
            head::Head,
            loca::Loca,
            name::Name,
            post::Post,
        },
        FontRef, ReadError, TableProvider, TopLevelTable,
    },
    types::{GlyphId, GlyphId16},
    BuilderError, FontBuilder,
};

use crate::{
    cmap::{self, Charmap},
    names::{self, Rename},
    pen::RecordingPen,
    visibility::{has_visible_contours, DrawFailure, GlyphOutline},
    FontCleanerError,
};

/// The sum every font file's checksum must come to, once `checkSumAdjustment` is set
const CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;

/// A TrueType font held in memory
///
/// The font owns its binary data. Edits replace tables in that data, so every
/// read made after an edit sees the edited font.
#[derive(Debug, Clone)]
pub struct Font {
    data: Vec<u8>,
    /// The file this font was loaded from, if any
    pub source: Option<PathBuf>,
}

/// The best-cmap characters, split by whether their glyph is empty
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Characters whose glyph draws something
    pub valid: Charmap,
    /// Characters whose glyph is empty or missing
    pub removed: Charmap,
}

impl Partition {
    /// The character codes which should survive filtering
    pub fn valid_codepoints(&self) -> BTreeSet<u32> {
        self.valid.keys().copied().collect()
    }
}

impl Font {
    /// Wrap binary font data, checking that it is a TrueType font
    pub fn new(data: Vec<u8>) -> Result<Self, FontCleanerError> {
        {
            let font = FontRef::new(&data)?;
            if font.glyf().is_err() || font.loca(None).is_err() {
                return Err(FontCleanerError::NotTrueType);
            }
        }
        Ok(Font { data, source: None })
    }

    /// Load a font from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FontCleanerError> {
        let path = path.as_ref();
        let mut font = Font::new(std::fs::read(path)?)?;
        font.source = Some(path.to_path_buf());
        Ok(font)
    }

    /// A read-only view of the current font data
    pub fn font_ref(&self) -> Result<FontRef<'_>, ReadError> {
        FontRef::new(&self.data)
    }

    /// The best Unicode character map the font offers
    pub fn best_cmap(&self) -> Result<Charmap, FontCleanerError> {
        let font = self.font_ref()?;
        cmap::best_cmap(&font.cmap()?).ok_or(FontCleanerError::NoUnicodeCmap)
    }

    /// Access to the font's glyphs
    pub fn glyph_table(&self) -> Result<GlyphTable<'_>, FontCleanerError> {
        GlyphTable::new(&self.data)
    }

    /// Returns `true` if the glyph is missing or draws nothing
    pub fn is_empty_glyph(&self, gid: GlyphId) -> Result<bool, FontCleanerError> {
        Ok(self.glyph_table()?.is_empty_glyph(gid))
    }

    /// Split the best cmap into characters with visible glyphs and the rest
    pub fn partition(&self) -> Result<Partition, FontCleanerError> {
        let charmap = self.best_cmap()?;
        let glyphs = self.glyph_table()?;
        let mut partition = Partition::default();
        for (codepoint, gid) in charmap {
            if glyphs.is_empty_glyph(gid) {
                log::debug!(
                    "Removing U+{:04X} -> {} ({})",
                    codepoint,
                    gid,
                    glyphs.glyph_name(gid).unwrap_or("<unnamed>")
                );
                partition.removed.insert(codepoint, gid);
            } else {
                partition.valid.insert(codepoint, gid);
            }
        }
        Ok(partition)
    }

    /// Restrict every cmap subtable to the given character codes
    pub fn retain_codepoints(&mut self, valid: &BTreeSet<u32>) -> Result<(), FontCleanerError> {
        let cmap = {
            let font = self.font_ref()?;
            cmap::filter_cmap(&font.cmap()?, valid)?
        };
        self.rebuild(|builder| {
            builder.add_raw(Cmap::TAG, cmap);
            Ok(())
        })
    }

    /// Replace the family, full and PostScript names
    pub fn rename(&mut self, new_name: &str) -> Result<Vec<Rename>, FontCleanerError> {
        let (name, renames) = {
            let font = self.font_ref()?;
            names::rename_family(&font.name()?, new_name)?
        };
        self.rebuild(|builder| {
            builder.add_raw(Name::TAG, name);
            Ok(())
        })?;
        Ok(renames)
    }

    /// Reassemble the font, letting `add` supply replacement tables
    ///
    /// Tables `add` does not provide are copied over unchanged.
    fn rebuild(
        &mut self,
        add: impl FnOnce(&mut FontBuilder<'_>) -> Result<(), BuilderError>,
    ) -> Result<(), FontCleanerError> {
        let data = {
            let font = FontRef::new(&self.data)?;
            let mut builder = FontBuilder::new();
            add(&mut builder)?;
            builder.copy_missing_tables(font);
            builder.build()
        };
        self.data = data;
        Ok(())
    }

    /// The binary font, ready to be written out
    pub fn to_bytes(&self) -> Result<Vec<u8>, FontCleanerError> {
        let mut bytes = self.data.clone();
        update_checksum_adjustment(&mut bytes)?;
        Ok(bytes)
    }

    /// Write the font to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), FontCleanerError> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

/// Byte range of `checkSumAdjustment` within the `head` table
const CHECKSUM_ADJUSTMENT: std::ops::Range<usize> = 8..12;

/// Sum the data as big-endian u32s, zero-padding the final word
pub(crate) fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// Set `head.checkSumAdjustment` so the whole file sums to [`CHECKSUM_MAGIC`]
fn update_checksum_adjustment(bytes: &mut [u8]) -> Result<(), FontCleanerError> {
    let range = {
        let font = FontRef::new(bytes)?;
        let Some(record) = font
            .table_directory()
            .table_records()
            .iter()
            .find(|record| record.tag() == Head::TAG)
        else {
            log::warn!("Font has no 'head' table; not updating checksum");
            return Ok(());
        };
        let offset = record.offset() as usize;
        offset + CHECKSUM_ADJUSTMENT.start..offset + CHECKSUM_ADJUSTMENT.end
    };
    bytes
        .get_mut(range.clone())
        .ok_or(ReadError::OutOfBounds)?
        .fill(0);
    let adjustment = CHECKSUM_MAGIC.wrapping_sub(checksum(bytes));
    bytes
        .get_mut(range)
        .ok_or(ReadError::OutOfBounds)?
        .copy_from_slice(&adjustment.to_be_bytes());
    Ok(())
}

/// The font's glyph table, with enough context to draw and name glyphs
pub struct GlyphTable<'a> {
    glyf: Glyf<'a>,
    loca: Loca<'a>,
    num_glyphs: u32,
    post: Option<Post<'a>>,
    outlines: Option<OutlineGlyphCollection<'a>>,
}

impl<'a> GlyphTable<'a> {
    fn new(data: &'a [u8]) -> Result<Self, FontCleanerError> {
        let font = FontRef::new(data)?;
        // Outlines are only needed by the drawing probe, which tolerates their absence
        let outlines = skrifa::FontRef::new(data)
            .ok()
            .map(|font| font.outline_glyphs());
        Ok(GlyphTable {
            glyf: font.glyf()?,
            loca: font.loca(None)?,
            num_glyphs: font.maxp()?.num_glyphs() as u32,
            post: font.post().ok(),
            outlines,
        })
    }

    /// The glyph's name from the `post` table, if it has one
    pub fn glyph_name(&self, gid: GlyphId) -> Option<&str> {
        let gid = GlyphId16::new(u16::try_from(gid.to_u32()).ok()?);
        self.post.as_ref()?.glyph_name(gid)
    }

    /// Look a glyph up, returning `None` if the glyph table has no such glyph
    pub fn get(&self, gid: GlyphId) -> Option<TrueTypeGlyph<'a>> {
        if gid.to_u32() >= self.num_glyphs {
            return None;
        }
        let glyph = match self.loca.get_glyf(gid, &self.glyf) {
            Ok(glyph) => glyph,
            Err(e) => {
                log::debug!("Could not locate glyph {}: {}", gid, e);
                return None;
            }
        };
        let outline = self
            .outlines
            .as_ref()
            .and_then(|outlines| outlines.get(skrifa::GlyphId::new(gid.to_u32())));
        Some(TrueTypeGlyph { glyph, outline })
    }

    /// Returns `true` if the glyph is missing or has nothing visible
    pub fn is_empty_glyph(&self, gid: GlyphId) -> bool {
        match self.get(gid) {
            Some(glyph) => !has_visible_contours(&glyph),
            None => true,
        }
    }
}

/// A glyph from the `glyf` table
///
/// `glyph` is `None` for glyphs with no data at all (such as a space).
pub struct TrueTypeGlyph<'a> {
    glyph: Option<Glyph<'a>>,
    outline: Option<OutlineGlyph<'a>>,
}

impl GlyphOutline for TrueTypeGlyph<'_> {
    fn contour_count(&self) -> Option<i16> {
        Some(
            self.glyph
                .as_ref()
                .map(|glyph| glyph.number_of_contours())
                .unwrap_or(0),
        )
    }

    fn draw(&self, pen: &mut RecordingPen) -> Result<(), DrawFailure> {
        let outline = self
            .outline
            .as_ref()
            .ok_or_else(|| DrawFailure("no outline available".to_string()))?;
        outline
            .draw(
                DrawSettings::unhinted(Size::unscaled(), LocationRef::default()),
                pen,
            )
            .map(|_| ())
            .map_err(|e| DrawFailure(e.to_string()))
    }

    fn component_count(&self) -> Option<usize> {
        Some(match &self.glyph {
            Some(Glyph::Composite(composite)) => composite.components().count(),
            _ => 0,
        })
    }
}
