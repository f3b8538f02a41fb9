//! Choosing and filtering character maps
//!
//! The [best cmap](best_cmap) is a single Unicode mapping picked from the
//! font's subtables. [`filter_cmap`] then narrows *every* subtable down to a
//! set of character codes, keeping each subtable's platform, encoding and
//! format.

use std::collections::{BTreeMap, BTreeSet};

use write_fonts::{
    dump_table,
    from_obj::ToOwnedTable,
    read::{
        tables::cmap::{self as read_cmap, PlatformId},
        ReadError,
    },
    tables::cmap::{Cmap, CmapSubtable, ConstantMapGroup, SequentialMapGroup},
    types::GlyphId,
};

use crate::FontCleanerError;

/// A mapping from character code to glyph
pub type Charmap = BTreeMap<u32, GlyphId>;

/// Subtables consulted for the best cmap, most preferred first
pub const CMAP_PREFERENCES: [(PlatformId, u16); 8] = [
    (PlatformId::Windows, 10),
    (PlatformId::Unicode, 6),
    (PlatformId::Unicode, 4),
    (PlatformId::Windows, 1),
    (PlatformId::Unicode, 3),
    (PlatformId::Unicode, 2),
    (PlatformId::Unicode, 1),
    (PlatformId::Unicode, 0),
];

const MAX_CODEPOINT: u32 = 0x10FFFF;
// format, reserved, length, language, is32[8192], numGroups
const CMAP8_HEADER_LEN: u32 = 2 + 2 + 4 + 4 + 8192 + 4;
// format, reserved, length, language, numGroups
const CMAP13_HEADER_LEN: u32 = 2 + 2 + 4 + 4 + 4;
const GROUP_LEN: u32 = 12;

/// The format number of a subtable
pub fn subtable_format(subtable: &read_cmap::CmapSubtable) -> u16 {
    use read_cmap::CmapSubtable::*;
    match subtable {
        Format0(_) => 0,
        Format2(_) => 2,
        Format4(_) => 4,
        Format6(_) => 6,
        Format8(_) => 8,
        Format10(_) => 10,
        Format12(_) => 12,
        Format13(_) => 13,
        Format14(_) => 14,
    }
}

/// All `(code, glyph)` pairs a subtable maps, in subtable order
///
/// Glyph 0 means "unmapped" and is never returned. Returns `None` for
/// formats whose entries are not plain character codes (2 and 14).
pub fn subtable_mappings(subtable: &read_cmap::CmapSubtable) -> Option<Vec<(u32, GlyphId)>> {
    use read_cmap::CmapSubtable::*;
    let mappings: Vec<(u32, GlyphId)> = match subtable {
        Format0(table) => table
            .glyph_id_array()
            .iter()
            .enumerate()
            .map(|(code, gid)| (code as u32, GlyphId::new(*gid as u32)))
            .collect(),
        Format4(table) => table.iter().collect(),
        Format6(table) => {
            let first = table.first_code() as u32;
            table
                .glyph_id_array()
                .iter()
                .enumerate()
                .map(|(i, gid)| (first + i as u32, GlyphId::new(gid.get() as u32)))
                .collect()
        }
        Format8(table) => table
            .groups()
            .iter()
            .flat_map(|group| {
                let start = group.start_char_code();
                let first_gid = group.start_glyph_id();
                (start..=group.end_char_code().min(MAX_CODEPOINT))
                    .map(move |code| (code, GlyphId::new(first_gid.wrapping_add(code - start))))
            })
            .collect(),
        Format10(table) => {
            let first = table.start_char_code();
            table
                .glyph_id_array()
                .iter()
                .enumerate()
                .map(|(i, gid)| (first + i as u32, GlyphId::new(gid.get() as u32)))
                .collect()
        }
        Format12(table) => table.iter().collect(),
        Format13(table) => table
            .groups()
            .iter()
            .flat_map(|group| {
                let gid = GlyphId::new(group.glyph_id());
                (group.start_char_code()..=group.end_char_code().min(MAX_CODEPOINT))
                    .map(move |code| (code, gid))
            })
            .collect(),
        Format2(_) | Format14(_) => return None,
    };
    Some(
        mappings
            .into_iter()
            .filter(|(_, gid)| gid.to_u32() != 0)
            .collect(),
    )
}

/// The best Unicode mapping the cmap table offers
///
/// Subtables are tried in [`CMAP_PREFERENCES`] order; for each preferred
/// platform/encoding pair only the first matching record is considered.
pub fn best_cmap(cmap: &read_cmap::Cmap) -> Option<Charmap> {
    CMAP_PREFERENCES
        .iter()
        .filter_map(|(platform, encoding)| {
            cmap.encoding_records()
                .iter()
                .find(|record| record.platform_id() == *platform && record.encoding_id() == *encoding)
        })
        .find_map(|record| {
            let subtable = record.subtable(cmap.offset_data()).ok()?;
            let mappings = subtable_mappings(&subtable)?;
            log::debug!(
                "Using cmap subtable ({:?}, {}) format {} as the best cmap",
                record.platform_id(),
                record.encoding_id(),
                subtable_format(&subtable)
            );
            Some(mappings.into_iter().collect())
        })
}

/// Runs of consecutive codes mapped to consecutive glyphs
fn sequential_groups(mappings: &[(u32, GlyphId)]) -> Vec<SequentialMapGroup> {
    let mut groups: Vec<(u32, u32, u32)> = Vec::new();
    for (code, gid) in mappings {
        let gid = gid.to_u32();
        match groups.last_mut() {
            Some((start, end, start_gid))
                if end.checked_add(1) == Some(*code)
                    && start_gid.checked_add(*code - *start) == Some(gid) =>
            {
                *end = *code;
            }
            _ => groups.push((*code, *code, gid)),
        }
    }
    groups
        .into_iter()
        .map(|(start, end, gid)| SequentialMapGroup::new(start, end, gid))
        .collect()
}

/// Runs of consecutive codes all mapped to the same glyph
fn constant_groups(mappings: &[(u32, GlyphId)]) -> Vec<ConstantMapGroup> {
    let mut groups: Vec<(u32, u32, u32)> = Vec::new();
    for (code, gid) in mappings {
        let gid = gid.to_u32();
        match groups.last_mut() {
            Some((_, end, group_gid)) if end.checked_add(1) == Some(*code) && *group_gid == gid => {
                *end = *code;
            }
            _ => groups.push((*code, *code, gid)),
        }
    }
    groups
        .into_iter()
        .map(|(start, end, gid)| ConstantMapGroup::new(start, end, gid))
        .collect()
}

/// Read a big-endian u16, if the data is long enough
fn be_u16(data: &[u8], pos: usize) -> Option<u16> {
    let bytes = data.get(pos..pos + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn be_u32(data: &[u8], pos: usize) -> Option<u32> {
    let bytes = data.get(pos..pos + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// One character code of a format 2 subtable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format2Entry {
    pub code: u32,
    /// Byte position of the code's `glyphIdArray` slot within the subtable
    pub slot: usize,
    pub glyph: GlyphId,
}

// format, length, language
const FORMAT2_KEYS: usize = 6;
// ... followed by subHeaderKeys[256]
const FORMAT2_SUBHEADERS: usize = FORMAT2_KEYS + 512;

/// Walk a format 2 (high-byte mapping) subtable
///
/// Single-byte codes are those whose high byte selects subheader 0; every
/// other high byte selects a subheader covering a run of low bytes. Entries
/// whose slot lies outside the subtable are skipped. Returns `None` if the
/// header itself is truncated.
pub fn format2_entries(data: &[u8]) -> Option<Vec<Format2Entry>> {
    let mut entries = vec![];
    for high in 0..256usize {
        let subheader = be_u16(data, FORMAT2_KEYS + 2 * high)? as usize / 8;
        let header = FORMAT2_SUBHEADERS + 8 * subheader;
        let first = be_u16(data, header)? as usize;
        let count = be_u16(data, header + 2)? as usize;
        let delta = be_u16(data, header + 4)?;
        let range_offset = be_u16(data, header + 6)? as usize;
        let codes: Vec<(u32, usize)> = if subheader == 0 {
            if high < first || high >= first + count {
                continue;
            }
            vec![(high as u32, high - first)]
        } else {
            (0..count)
                .map(|index| (((high << 8) | (first + index)) as u32, index))
                .collect()
        };
        for (code, index) in codes {
            // idRangeOffset counts from its own position in the subheader
            let slot = header + 6 + range_offset + 2 * index;
            let Some(raw) = be_u16(data, slot) else {
                continue;
            };
            let glyph = if raw == 0 { 0 } else { raw.wrapping_add(delta) };
            entries.push(Format2Entry {
                code,
                slot,
                glyph: GlyphId::new(glyph as u32),
            });
        }
    }
    Some(entries)
}

/// Unmap the codes of a format 2 subtable which are not in `valid`
///
/// Slots are cleared in place, so the subtable keeps its layout. A slot
/// shared with a surviving code is left alone.
fn filter_format2(data: &[u8], valid: &BTreeSet<u32>) -> Vec<u8> {
    let mut filtered = data.to_vec();
    let Some(entries) = format2_entries(data) else {
        log::warn!("Format 2 cmap subtable is truncated; leaving it unchanged");
        return filtered;
    };
    let kept: BTreeSet<usize> = entries
        .iter()
        .filter(|entry| valid.contains(&entry.code))
        .map(|entry| entry.slot)
        .collect();
    for entry in entries {
        if !kept.contains(&entry.slot) {
            if let Some(slot) = filtered.get_mut(entry.slot..entry.slot + 2) {
                slot.fill(0);
            }
        }
    }
    filtered
}

/// Encode a BMP mapping as a format 4 subtable, as `Cmap::from_mappings` would
///
/// Returns `None` if nothing is left to encode.
fn encode_format_4(
    mappings: &[(u32, GlyphId)],
    language: u16,
) -> Result<Option<CmapSubtable>, FontCleanerError> {
    let chars: Vec<(char, GlyphId)> = mappings
        .iter()
        .filter_map(|(code, gid)| char::from_u32(*code).map(|c| (c, *gid)))
        .collect();
    if chars.len() != mappings.len() {
        log::warn!(
            "Format 4 cmap subtable loses {} surrogate code(s) which cannot be re-encoded",
            mappings.len() - chars.len()
        );
    }
    let built =
        Cmap::from_mappings(chars).map_err(|e| FontCleanerError::Compile(e.to_string()))?;
    let bmp = built
        .encoding_records
        .iter()
        .filter_map(|record| Some(record.subtable.as_ref()))
        .find(|subtable| matches!(subtable, CmapSubtable::Format4(_)))
        .cloned();
    Ok(bmp.map(|mut subtable| {
        if let CmapSubtable::Format4(table) = &mut subtable {
            table.language = language;
        }
        subtable
    }))
}

/// The bytes of the subtable a read record points at
fn raw_subtable<'a>(
    cmap_data: &'a [u8],
    offset: usize,
    format: u16,
) -> Result<&'a [u8], FontCleanerError> {
    let length = match format {
        2 => be_u16(cmap_data, offset + 2).map(|len| len as usize),
        _ => be_u32(cmap_data, offset + 2).map(|len| len as usize),
    }
    .ok_or(ReadError::OutOfBounds)?;
    Ok(cmap_data
        .get(offset..offset + length)
        .ok_or(ReadError::OutOfBounds)?)
}

/// Rewrite one subtable so it only maps codes in `valid`
///
/// Returns the compiled subtable, or `None` if the record should be dropped
/// from the table.
fn filter_subtable(
    owned: &CmapSubtable,
    original: &read_cmap::CmapSubtable,
    raw: impl FnOnce(u16) -> Result<Vec<u8>, FontCleanerError>,
    valid: &BTreeSet<u32>,
) -> Result<Option<Vec<u8>>, FontCleanerError> {
    let kept: Vec<(u32, GlyphId)> = subtable_mappings(original)
        .unwrap_or_default()
        .into_iter()
        .filter(|(code, _)| valid.contains(code))
        .collect();
    let mut subtable = owned.clone();
    match &mut subtable {
        CmapSubtable::Format0(table) => {
            for (code, gid) in table.glyph_id_array.iter_mut().enumerate() {
                if !valid.contains(&(code as u32)) {
                    *gid = 0;
                }
            }
        }
        CmapSubtable::Format6(table) => {
            let first = table.first_code as u32;
            for (i, gid) in table.glyph_id_array.iter_mut().enumerate() {
                if !valid.contains(&(first + i as u32)) {
                    *gid = 0;
                }
            }
        }
        CmapSubtable::Format10(table) => {
            let first = table.start_char_code;
            for (i, gid) in table.glyph_id_array.iter_mut().enumerate() {
                if !valid.contains(&(first + i as u32)) {
                    *gid = 0;
                }
            }
        }
        CmapSubtable::Format8(table) => {
            table.groups = sequential_groups(&kept);
            table.num_groups = table.groups.len() as u32;
            table.length = CMAP8_HEADER_LEN + GROUP_LEN * table.num_groups;
        }
        CmapSubtable::Format12(table) => {
            if kept.is_empty() {
                return Ok(None);
            }
            table.groups = sequential_groups(&kept);
        }
        CmapSubtable::Format13(table) => {
            table.groups = constant_groups(&kept);
            table.num_groups = table.groups.len() as u32;
            table.length = CMAP13_HEADER_LEN + GROUP_LEN * table.num_groups;
        }
        CmapSubtable::Format4(table) => {
            let language = table.language;
            return match encode_format_4(&kept, language)? {
                Some(encoded) => compile_subtable(&encoded).map(Some),
                None => Ok(None),
            };
        }
        // The owned forms of these do not carry every field, so they are
        // handled as raw bytes
        CmapSubtable::Format2(_) => return Ok(Some(filter_format2(&raw(2)?, valid))),
        CmapSubtable::Format14(_) => return Ok(Some(raw(14)?)),
    }
    compile_subtable(&subtable).map(Some)
}

fn compile_subtable(subtable: &CmapSubtable) -> Result<Vec<u8>, FontCleanerError> {
    dump_table(subtable).map_err(|e| FontCleanerError::Compile(e.to_string()))
}

/// Lay out a cmap table from `(platform, encoding, subtable)` records
///
/// Identical subtables are stored once and shared between records.
fn assemble_cmap(records: &[(u16, u16, Vec<u8>)]) -> Result<Vec<u8>, FontCleanerError> {
    let too_large = || FontCleanerError::Compile("cmap table is too large".to_string());
    let header_len = 4 + 8 * records.len();
    let mut storage: Vec<u8> = vec![];
    let mut offsets: Vec<(&[u8], u32)> = vec![];
    let mut bytes = Vec::with_capacity(header_len);
    bytes.extend_from_slice(&0u16.to_be_bytes());
    let num_tables = u16::try_from(records.len()).map_err(|_| too_large())?;
    bytes.extend_from_slice(&num_tables.to_be_bytes());
    for (platform, encoding, subtable) in records {
        let offset = match offsets.iter().find(|(data, _)| data == subtable) {
            Some((_, offset)) => *offset,
            None => {
                let offset =
                    u32::try_from(header_len + storage.len()).map_err(|_| too_large())?;
                storage.extend_from_slice(subtable);
                offsets.push((subtable, offset));
                offset
            }
        };
        bytes.extend_from_slice(&platform.to_be_bytes());
        bytes.extend_from_slice(&encoding.to_be_bytes());
        bytes.extend_from_slice(&offset.to_be_bytes());
    }
    bytes.extend_from_slice(&storage);
    Ok(bytes)
}

/// Restrict every subtable of a cmap table to the codes in `valid`
///
/// Every subtable is filtered against the same set. Records keep their
/// platform and encoding IDs and their order. Returns the compiled table.
pub fn filter_cmap(
    cmap: &read_cmap::Cmap,
    valid: &BTreeSet<u32>,
) -> Result<Vec<u8>, FontCleanerError> {
    let owned: Cmap = cmap.to_owned_table();
    let cmap_data = cmap.offset_data().as_bytes();
    let mut records = Vec::with_capacity(owned.encoding_records.len());
    for (index, (record, original)) in owned
        .encoding_records
        .iter()
        .zip(cmap.encoding_records().iter())
        .enumerate()
    {
        let header = 4 + 8 * index;
        let (Some(platform), Some(encoding)) =
            (be_u16(cmap_data, header), be_u16(cmap_data, header + 2))
        else {
            continue;
        };
        let Ok(subtable) = original.subtable(cmap.offset_data()) else {
            log::warn!("Dropping unreadable cmap subtable ({}, {})", platform, encoding);
            continue;
        };
        let Some(owned_subtable) = Some(record.subtable.as_ref()) else {
            continue;
        };
        let offset = original.subtable_offset().to_u32() as usize;
        let raw = |format| raw_subtable(cmap_data, offset, format).map(<[u8]>::to_vec);
        match filter_subtable(owned_subtable, &subtable, raw, valid)? {
            Some(filtered) => {
                log::debug!(
                    "Filtered cmap subtable ({}, {}) format {}",
                    platform,
                    encoding,
                    subtable_format(&subtable)
                );
                records.push((platform, encoding, filtered));
            }
            None => log::info!(
                "Dropping cmap subtable ({}, {}): nothing left to map",
                platform,
                encoding
            ),
        }
    }
    assemble_cmap(&records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use write_fonts::{
        read::{FontData, FontRead},
        tables::cmap::{Cmap0, Cmap10, Cmap13, Cmap6, Cmap8, EncodingRecord},
    };

    fn gid(id: u32) -> GlyphId {
        GlyphId::new(id)
    }

    fn compile(cmap: &Cmap) -> Vec<u8> {
        dump_table(cmap).unwrap()
    }

    fn read(bytes: &[u8]) -> read_cmap::Cmap<'_> {
        read_cmap::Cmap::read(FontData::new(bytes)).unwrap()
    }

    /// `(platform, encoding, format, mappings)` for every record
    fn describe(cmap: &read_cmap::Cmap) -> Vec<(u16, u16, u16, Vec<(u32, GlyphId)>)> {
        let data = cmap.offset_data().as_bytes();
        cmap.encoding_records()
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let subtable = record.subtable(cmap.offset_data()).unwrap();
                let format = subtable_format(&subtable);
                let mappings = match format {
                    2 => {
                        let raw = raw_subtable(data, record.subtable_offset().to_u32() as usize, 2)
                            .unwrap();
                        format2_entries(raw)
                            .unwrap()
                            .into_iter()
                            .filter(|entry| entry.glyph.to_u32() != 0)
                            .map(|entry| (entry.code, entry.glyph))
                            .collect()
                    }
                    _ => subtable_mappings(&subtable).unwrap_or_default(),
                };
                (
                    be_u16(data, 4 + 8 * index).unwrap(),
                    record.encoding_id(),
                    format,
                    mappings,
                )
            })
            .collect()
    }

    #[test]
    fn sequential_groups_split_on_gaps() {
        let mappings = [(10, gid(1)), (11, gid(2)), (12, gid(3)), (14, gid(4)), (15, gid(9))];
        let groups: Vec<(u32, u32, u32)> = sequential_groups(&mappings)
            .iter()
            .map(|g| (g.start_char_code, g.end_char_code, g.start_glyph_id))
            .collect();
        assert_eq!(groups, vec![(10, 12, 1), (14, 14, 4), (15, 15, 9)]);
    }

    #[test]
    fn constant_groups_split_on_glyph_change() {
        let mappings = [(0x20, gid(3)), (0x21, gid(3)), (0x22, gid(4)), (0x30, gid(4))];
        let groups: Vec<(u32, u32, u32)> = constant_groups(&mappings)
            .iter()
            .map(|g| (g.start_char_code, g.end_char_code, g.glyph_id))
            .collect();
        assert_eq!(groups, vec![(0x20, 0x21, 3), (0x22, 0x22, 4), (0x30, 0x30, 4)]);
    }

    #[test]
    fn prefers_full_repertoire_windows_subtable() {
        let bytes = compile(&Cmap::from_mappings([('A', gid(1)), ('😀', gid(2))]).unwrap());
        let best = best_cmap(&read(&bytes)).unwrap();
        assert_eq!(best, Charmap::from([(0x41, gid(1)), (0x1F600, gid(2))]));
    }

    #[test]
    fn falls_back_to_bmp_subtable() {
        let bytes = compile(&Cmap::from_mappings([('A', gid(1)), ('B', gid(2))]).unwrap());
        assert_eq!(
            best_cmap(&read(&bytes)).unwrap(),
            Charmap::from([(0x41, gid(1)), (0x42, gid(2))])
        );
    }

    #[test]
    fn no_unicode_subtable_means_no_best_cmap() {
        let bmp = Cmap::from_mappings([('A', gid(1))]).unwrap();
        let subtable = bmp.encoding_records[0].subtable.as_ref().clone();
        let mac_only = Cmap::new(vec![EncodingRecord::new(PlatformId::Macintosh, 0, subtable)]);
        let bytes = compile(&mac_only);
        assert_eq!(best_cmap(&read(&bytes)), None);
    }

    #[test]
    fn filters_every_subtable_against_the_same_set() {
        let bytes =
            compile(&Cmap::from_mappings([('A', gid(1)), ('B', gid(2)), ('😀', gid(3))]).unwrap());
        let filtered = filter_cmap(&read(&bytes), &BTreeSet::from([0x41, 0x1F600])).unwrap();

        let bmp = vec![(0x41, gid(1))];
        let full = vec![(0x41, gid(1)), (0x1F600, gid(3))];
        assert_eq!(
            describe(&read(&filtered)),
            vec![
                (0, 3, 4, bmp.clone()),
                (0, 4, 12, full.clone()),
                (3, 1, 4, bmp),
                (3, 10, 12, full),
            ]
        );
    }

    #[test]
    fn full_repertoire_subtable_keeps_its_format() {
        let bytes = compile(&Cmap::from_mappings([('A', gid(1)), ('😀', gid(3))]).unwrap());
        let filtered = filter_cmap(&read(&bytes), &BTreeSet::from([0x41])).unwrap();
        let formats: Vec<(u16, u16, u16)> = describe(&read(&filtered))
            .into_iter()
            .map(|(platform, encoding, format, _)| (platform, encoding, format))
            .collect();
        assert_eq!(formats, vec![(0, 3, 4), (0, 4, 12), (3, 1, 4), (3, 10, 12)]);
    }

    #[test]
    fn empty_unicode_subtables_are_dropped() {
        let bytes = compile(&Cmap::from_mappings([('A', gid(1)), ('😀', gid(3))]).unwrap());
        let filtered = filter_cmap(&read(&bytes), &BTreeSet::new()).unwrap();
        assert!(read(&filtered).encoding_records().is_empty());
    }

    #[test]
    fn mac_format_4_keeps_its_language() {
        let bmp = Cmap::from_mappings([('A', gid(1)), ('B', gid(2))]).unwrap();
        let mut subtable = bmp.encoding_records[0].subtable.as_ref().clone();
        if let CmapSubtable::Format4(table) = &mut subtable {
            table.language = 3;
        }
        let bytes = compile(&Cmap::new(vec![EncodingRecord::new(
            PlatformId::Macintosh,
            0,
            subtable,
        )]));
        let filtered = filter_cmap(&read(&bytes), &BTreeSet::from([0x41])).unwrap();
        let filtered = read(&filtered);
        let subtable = filtered.encoding_records()[0]
            .subtable(filtered.offset_data())
            .unwrap();
        match subtable {
            read_cmap::CmapSubtable::Format4(table) => assert_eq!(table.language(), 3),
            _ => panic!("expected a format 4 subtable"),
        }
    }

    #[test]
    fn dense_and_grouped_subtables_keep_their_format() {
        let mut bytes = vec![0u8; 256];
        bytes[0x41] = 1;
        bytes[0x42] = 2;
        let cmap = Cmap::new(vec![
            EncodingRecord::new(
                PlatformId::Unicode,
                1,
                CmapSubtable::Format6(Cmap6 {
                    length: 10 + 2 * 3,
                    language: 0,
                    first_code: 0x41,
                    entry_count: 3,
                    glyph_id_array: vec![1, 2, 3],
                }),
            ),
            EncodingRecord::new(
                PlatformId::Unicode,
                2,
                CmapSubtable::Format8(Cmap8 {
                    length: CMAP8_HEADER_LEN + GROUP_LEN,
                    language: 0,
                    is32: vec![0; 8192],
                    num_groups: 1,
                    groups: vec![SequentialMapGroup::new(0x41, 0x43, 1)],
                }),
            ),
            EncodingRecord::new(
                PlatformId::Unicode,
                3,
                CmapSubtable::Format10(Cmap10 {
                    length: 20 + 2 * 3,
                    language: 0,
                    start_char_code: 0x41,
                    glyph_id_array: vec![1, 2, 3],
                }),
            ),
            EncodingRecord::new(
                PlatformId::Unicode,
                4,
                CmapSubtable::Format13(Cmap13 {
                    length: CMAP13_HEADER_LEN + GROUP_LEN,
                    language: 0,
                    num_groups: 1,
                    groups: vec![ConstantMapGroup::new(0x41, 0x43, 5)],
                }),
            ),
            EncodingRecord::new(
                PlatformId::Macintosh,
                0,
                CmapSubtable::Format0(Cmap0 {
                    language: 0,
                    glyph_id_array: bytes,
                }),
            ),
        ]);
        let compiled = compile(&cmap);
        let filtered = filter_cmap(&read(&compiled), &BTreeSet::from([0x41, 0x43])).unwrap();
        let filtered = read(&filtered);

        let ends = vec![(0x41, gid(1)), (0x43, gid(3))];
        assert_eq!(
            describe(&filtered),
            vec![
                (0, 1, 6, ends.clone()),
                (0, 2, 8, ends.clone()),
                (0, 3, 10, ends),
                (0, 4, 13, vec![(0x41, gid(5)), (0x43, gid(5))]),
                (1, 0, 0, vec![(0x41, gid(1))]),
            ]
        );
        // dense arrays are cleared in place rather than shortened
        match filtered.encoding_records()[0]
            .subtable(filtered.offset_data())
            .unwrap()
        {
            read_cmap::CmapSubtable::Format6(table) => assert_eq!(table.entry_count(), 3),
            _ => panic!("expected a format 6 subtable"),
        }
    }

    /// A format 2 subtable mapping A and B as single bytes and 0x8140/0x8141
    /// through the 0x81 lead byte
    fn format2_subtable() -> Vec<u8> {
        let mut keys = [0u16; 256];
        keys[0x81] = 8;
        let mut glyphs = vec![0u16; 258];
        glyphs[0x41] = 1;
        glyphs[0x42] = 2;
        glyphs[256] = 3;
        glyphs[257] = 4;
        // (firstCode, entryCount, idDelta, idRangeOffset)
        let subheaders = [(0u16, 256u16, 0u16, 10u16), (0x40, 2, 0, 514)];

        let mut bytes = vec![];
        bytes.extend_from_slice(&2u16.to_be_bytes());
        bytes.extend_from_slice(&1050u16.to_be_bytes());
        bytes.extend_from_slice(&0u16.to_be_bytes());
        for key in keys {
            bytes.extend_from_slice(&key.to_be_bytes());
        }
        for (first, count, delta, range_offset) in subheaders {
            for value in [first, count, delta, range_offset] {
                bytes.extend_from_slice(&value.to_be_bytes());
            }
        }
        for glyph in glyphs {
            bytes.extend_from_slice(&glyph.to_be_bytes());
        }
        assert_eq!(bytes.len(), 1050);
        bytes
    }

    /// A format 14 subtable mapping A + U+FE00 to glyph 7
    fn format14_subtable() -> Vec<u8> {
        let mut bytes = vec![];
        bytes.extend_from_slice(&14u16.to_be_bytes());
        bytes.extend_from_slice(&30u32.to_be_bytes());
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&[0x00, 0xFE, 0x00]);
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&21u32.to_be_bytes());
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&[0x00, 0x00, 0x41]);
        bytes.extend_from_slice(&7u16.to_be_bytes());
        assert_eq!(bytes.len(), 30);
        bytes
    }

    #[test]
    fn walks_format_2_subtables() {
        let mappings: Vec<(u32, u32)> = format2_entries(&format2_subtable())
            .unwrap()
            .into_iter()
            .filter(|entry| entry.glyph.to_u32() != 0)
            .map(|entry| (entry.code, entry.glyph.to_u32()))
            .collect();
        assert_eq!(mappings, vec![(0x41, 1), (0x42, 2), (0x8140, 3), (0x8141, 4)]);
    }

    #[test]
    fn format_2_codes_are_unmapped_in_place() {
        let bytes = assemble_cmap(&[
            (0, 5, format14_subtable()),
            (1, 1, format2_subtable()),
        ])
        .unwrap();
        let filtered = filter_cmap(&read(&bytes), &BTreeSet::from([0x41, 0x8140])).unwrap();
        let filtered = read(&filtered);

        assert_eq!(
            describe(&filtered)[1],
            (1, 1, 2, vec![(0x41, gid(1)), (0x8140, gid(3))])
        );
        let data = filtered.offset_data().as_bytes();
        let format2 = raw_subtable(
            data,
            filtered.encoding_records()[1].subtable_offset().to_u32() as usize,
            2,
        )
        .unwrap();
        assert_eq!(format2.len(), 1050);
    }

    #[test]
    fn variation_sequences_are_kept_unchanged() {
        let bytes = assemble_cmap(&[
            (0, 5, format14_subtable()),
            (1, 1, format2_subtable()),
        ])
        .unwrap();
        let filtered = filter_cmap(&read(&bytes), &BTreeSet::new()).unwrap();
        let filtered = read(&filtered);
        let records = filtered.encoding_records();
        assert_eq!(records.len(), 2);
        let format14 = raw_subtable(
            filtered.offset_data().as_bytes(),
            records[0].subtable_offset().to_u32() as usize,
            14,
        )
        .unwrap();
        assert_eq!(format14, format14_subtable().as_slice());
    }

    #[test]
    fn identical_subtables_are_shared() {
        let bytes = assemble_cmap(&[
            (0, 3, format14_subtable()),
            (3, 1, format14_subtable()),
        ])
        .unwrap();
        let cmap = read(&bytes);
        let offsets: Vec<u32> = cmap
            .encoding_records()
            .iter()
            .map(|record| record.subtable_offset().to_u32())
            .collect();
        assert_eq!(offsets, vec![20, 20]);
        assert_eq!(bytes.len(), 20 + 30);
    }
}
