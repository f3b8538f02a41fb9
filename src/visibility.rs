//! Deciding whether a glyph has anything to show
//!
//! Glyph representations expose their geometry in different ways: a simple
//! glyph declares its contour count, a composite lists its components, and
//! some glyphs can only be judged by drawing them. Each of these is asked in
//! turn by a [`Probe`]; the first probe to give a definite answer wins.

use crate::pen::RecordingPen;

/// The answer a single probe gives about a glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// The glyph definitely draws something
    Visible,
    /// The glyph definitely draws nothing
    NotVisible,
    /// This probe cannot tell; ask the next one
    Inconclusive,
}

/// Drawing a glyph failed, so a drawing probe can tell nothing about it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawFailure(pub String);

impl std::fmt::Display for DrawFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The capabilities a glyph may offer to the visibility probes
///
/// Every capability is optional; a glyph which cannot answer a question
/// returns `None` (or a [`DrawFailure`]) and the probe asking it stays
/// inconclusive.
pub trait GlyphOutline {
    /// The declared number of contours, if the glyph declares one
    fn contour_count(&self) -> Option<i16>;

    /// Draw the glyph into the given pen
    fn draw(&self, pen: &mut RecordingPen) -> Result<(), DrawFailure>;

    /// The number of component references, if the glyph has any notion of them
    fn component_count(&self) -> Option<usize>;
}

/// A single question asked of a glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Does the glyph declare at least one contour?
    ContourCount,
    /// Does drawing the glyph produce any commands?
    Drawing,
    /// Does the glyph reference at least one component?
    Components,
}

/// The probes used by [`has_visible_contours`], in the order they are asked
pub const PROBES: [Probe; 3] = [Probe::ContourCount, Probe::Drawing, Probe::Components];

impl Probe {
    /// Ask this probe about a glyph
    ///
    /// Probes only ever report [`Visibility::Visible`] or
    /// [`Visibility::Inconclusive`]: an empty drawing says nothing about
    /// components, because the drawer flattens composites into their parts.
    pub fn probe(&self, glyph: &impl GlyphOutline) -> Visibility {
        match self {
            Probe::ContourCount => match glyph.contour_count() {
                Some(count) if count > 0 => Visibility::Visible,
                _ => Visibility::Inconclusive,
            },
            Probe::Drawing => {
                let mut pen = RecordingPen::new();
                match glyph.draw(&mut pen) {
                    Ok(()) if !pen.is_empty() => Visibility::Visible,
                    Ok(()) => Visibility::Inconclusive,
                    Err(e) => {
                        log::trace!("Drawing probe inconclusive: {}", e);
                        Visibility::Inconclusive
                    }
                }
            }
            Probe::Components => match glyph.component_count() {
                Some(count) if count > 0 => Visibility::Visible,
                _ => Visibility::Inconclusive,
            },
        }
    }
}

/// Run the probes in order, stopping at the first definite answer
///
/// If every probe is inconclusive the glyph is [`Visibility::NotVisible`].
pub fn visibility(glyph: &impl GlyphOutline, probes: &[Probe]) -> Visibility {
    probes
        .iter()
        .map(|probe| probe.probe(glyph))
        .find(|v| *v != Visibility::Inconclusive)
        .unwrap_or(Visibility::NotVisible)
}

/// Returns `true` if the glyph has visible geometry
pub fn has_visible_contours(glyph: &impl GlyphOutline) -> bool {
    visibility(glyph, &PROBES) == Visibility::Visible
}
