//! Renaming a font's family
//!
//! Only the family, full and PostScript records are rewritten. Every other
//! record, and every record in an encoding that cannot be written, keeps its
//! original string bytes: the table is laid out again from the raw records
//! rather than decoded and re-encoded.

use write_fonts::{
    read::{
        tables::name::{self as read_name, Encoding, MacRomanMapping},
        ReadError, Offset,
    },
    types::NameId,
};

use crate::FontCleanerError;

/// The name IDs rewritten when a font is renamed
pub const RENAMED_NAME_IDS: [NameId; 3] = [
    NameId::FAMILY_NAME,
    NameId::FULL_NAME,
    NameId::POSTSCRIPT_NAME,
];

/// A name record which was given a new value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub name_id: NameId,
    pub old: String,
    pub new: String,
}

/// A name record with its string already encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameEntry {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub name_id: NameId,
    pub string: Vec<u8>,
}

/// The value a record with the given name ID should take
///
/// PostScript names may not contain whitespace, so it is stripped for name ID 6.
pub fn name_for_id(name_id: NameId, new_name: &str) -> String {
    if name_id == NameId::POSTSCRIPT_NAME {
        new_name.chars().filter(|c| !c.is_whitespace()).collect()
    } else {
        new_name.to_string()
    }
}

/// Encode `value` for a record's platform and encoding
///
/// Records on the Unicode and Windows platforms are stored as UTF-16BE;
/// Mac Roman records as single bytes. Returns `Ok(None)` for encodings which
/// cannot be written.
pub fn encode_name(
    platform_id: u16,
    encoding_id: u16,
    value: &str,
) -> Result<Option<Vec<u8>>, FontCleanerError> {
    match Encoding::new(platform_id, encoding_id) {
        Encoding::Utf16Be => Ok(Some(
            value.encode_utf16().flat_map(u16::to_be_bytes).collect(),
        )),
        Encoding::MacRoman => value
            .chars()
            .map(|c| MacRomanMapping.encode(c))
            .collect::<Option<Vec<u8>>>()
            .map(Some)
            .ok_or_else(|| FontCleanerError::UnencodableName {
                name: value.to_string(),
                platform_id,
            }),
        Encoding::Unknown => Ok(None),
    }
}

/// Lay out a `name` table
///
/// A version 1 table is written when `lang_tags` is given. Identical strings
/// share storage.
pub fn compile_name_table(
    entries: &[NameEntry],
    lang_tags: Option<&[Vec<u8>]>,
) -> Result<Vec<u8>, FontCleanerError> {
    let too_large = || FontCleanerError::Compile("name table is too large".to_string());
    let to_u16 = |n: usize| u16::try_from(n).map_err(|_| too_large());

    let mut storage: Vec<u8> = vec![];
    let mut store = |string: &[u8]| -> Result<(u16, u16), FontCleanerError> {
        let offset = match storage
            .windows(string.len().max(1))
            .position(|window| window == string)
        {
            Some(offset) if !string.is_empty() => offset,
            _ => {
                storage.extend_from_slice(string);
                storage.len() - string.len()
            }
        };
        Ok((to_u16(string.len())?, to_u16(offset)?))
    };

    let mut records = vec![];
    for entry in entries {
        let (length, offset) = store(&entry.string)?;
        for value in [
            entry.platform_id,
            entry.encoding_id,
            entry.language_id,
            entry.name_id.to_u16(),
            length,
            offset,
        ] {
            records.extend_from_slice(&value.to_be_bytes());
        }
    }
    let mut tag_records = vec![];
    for tag in lang_tags.unwrap_or_default() {
        let (length, offset) = store(tag)?;
        tag_records.extend_from_slice(&length.to_be_bytes());
        tag_records.extend_from_slice(&offset.to_be_bytes());
    }

    let version: u16 = if lang_tags.is_some() { 1 } else { 0 };
    let mut header_len = 6 + records.len();
    if lang_tags.is_some() {
        header_len += 2 + tag_records.len();
    }
    let mut bytes = Vec::with_capacity(header_len + storage.len());
    bytes.extend_from_slice(&version.to_be_bytes());
    bytes.extend_from_slice(&to_u16(entries.len())?.to_be_bytes());
    bytes.extend_from_slice(&to_u16(header_len)?.to_be_bytes());
    bytes.extend_from_slice(&records);
    if let Some(tags) = lang_tags {
        bytes.extend_from_slice(&to_u16(tags.len())?.to_be_bytes());
        bytes.extend_from_slice(&tag_records);
    }
    bytes.extend_from_slice(&storage);
    Ok(bytes)
}

/// The raw bytes a record or lang tag points at in the string storage
fn stored_bytes(storage: &[u8], offset: usize, length: u16) -> Result<Vec<u8>, ReadError> {
    storage
        .get(offset..offset + length as usize)
        .map(<[u8]>::to_vec)
        .ok_or(ReadError::OutOfBounds)
}

/// Rewrite the family, full and PostScript name records
///
/// Returns the compiled table along with every rename which was made.
pub fn rename_family(
    name: &read_name::Name,
    new_name: &str,
) -> Result<(Vec<u8>, Vec<Rename>), FontCleanerError> {
    let string_data = name.string_data();
    let storage = string_data.as_bytes();
    let mut entries = vec![];
    let mut renames = vec![];
    for record in name.name_record() {
        let mut entry = NameEntry {
            platform_id: record.platform_id(),
            encoding_id: record.encoding_id(),
            language_id: record.language_id(),
            name_id: record.name_id(),
            string: stored_bytes(
                storage,
                record.string_offset().non_null().unwrap_or(0),
                record.length(),
            )?,
        };
        if RENAMED_NAME_IDS.contains(&entry.name_id) {
            let new = name_for_id(entry.name_id, new_name);
            match encode_name(entry.platform_id, entry.encoding_id, &new)? {
                Some(encoded) => {
                    renames.push(Rename {
                        platform_id: entry.platform_id,
                        encoding_id: entry.encoding_id,
                        language_id: entry.language_id,
                        name_id: entry.name_id,
                        old: record.string(string_data)?.to_string(),
                        new,
                    });
                    entry.string = encoded;
                }
                None => log::warn!(
                    "Not renaming name {} on platform {} encoding {}: encoding not supported",
                    entry.name_id,
                    entry.platform_id,
                    entry.encoding_id
                ),
            }
        }
        entries.push(entry);
    }
    let lang_tags = name
        .lang_tag_record()
        .map(|tags| {
            tags.iter()
                .map(|tag| {
                    stored_bytes(
                        storage,
                        tag.lang_tag_offset().non_null().unwrap_or(0),
                        tag.length(),
                    )
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;
    let table = compile_name_table(&entries, lang_tags.as_deref())?;
    Ok((table, renames))
}
