//! sfnt (OpenType/TrueType) table directory.

use read_fonts::{FileRef, FontRef};
use webprep_common::error::{WebprepError, WebprepResult};

/// `0x00010000`: TrueType outlines.
pub const TRUETYPE_FLAVOR: u32 = 0x0001_0000;
/// `OTTO`: CFF outlines.
pub const CFF_FLAVOR: u32 = u32::from_be_bytes(*b"OTTO");
/// `true`: legacy Apple TrueType.
pub const APPLE_TRUE_FLAVOR: u32 = u32::from_be_bytes(*b"true");

const SFNT_HEADER_LEN: usize = 12;
const TABLE_RECORD_LEN: usize = 16;

/// One table of a font: its tag and raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table<'a> {
    pub tag: [u8; 4],
    pub data: &'a [u8],
}

impl Table<'_> {
    pub fn tag_str(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }
}

/// A parsed single-font sfnt file borrowing its tables from the input.
#[derive(Debug, Clone)]
pub struct SfntFont<'a> {
    flavor: u32,
    tables: Vec<Table<'a>>,
}

impl<'a> SfntFont<'a> {
    /// Parse the table directory. Font collections are rejected.
    pub fn parse(data: &'a [u8]) -> WebprepResult<Self> {
        let font: FontRef<'a> = match FileRef::new(data) {
            Ok(FileRef::Font(font)) => font,
            Ok(FileRef::Collection(_)) => {
                return Err(WebprepError::unsupported(
                    "Font collections (.ttc/.otc) cannot be converted to WOFF2 one-to-one",
                ))
            }
            Err(e) => return Err(WebprepError::font(format!("Not an OpenType font: {e}"))),
        };

        let flavor = font.table_directory.sfnt_version();
        if ![TRUETYPE_FLAVOR, CFF_FLAVOR, APPLE_TRUE_FLAVOR].contains(&flavor) {
            return Err(WebprepError::font(format!(
                "Unknown sfnt version 0x{flavor:08X}"
            )));
        }

        let mut tables = Vec::with_capacity(font.table_directory.table_records().len());
        for record in font.table_directory.table_records() {
            let tag = record.tag();
            let data = font.table_data(tag).ok_or_else(|| {
                WebprepError::font(format!("Table '{tag}' extends past the end of the file"))
            })?;
            tables.push(Table {
                tag: tag.to_be_bytes(),
                data: data.as_bytes(),
            });
        }

        if tables.is_empty() {
            return Err(WebprepError::font("Font has no tables"));
        }

        Ok(Self { flavor, tables })
    }

    pub fn flavor(&self) -> u32 {
        self.flavor
    }

    /// Whether outlines are CFF (`OTTO`).
    pub fn is_cff(&self) -> bool {
        self.flavor == CFF_FLAVOR
    }

    /// Tables in directory order.
    pub fn tables(&self) -> &[Table<'a>] {
        &self.tables
    }

    pub fn table(&self, tag: &[u8; 4]) -> Option<&Table<'a>> {
        self.tables.iter().find(|t| &t.tag == tag)
    }

    /// Size of the font when laid out as an sfnt file with 4-byte aligned
    /// tables.
    pub fn total_sfnt_size(&self) -> u64 {
        sfnt_size(self.tables.iter().map(|t| t.data.len()))
    }
}

/// Header + directory + padded table sizes.
pub fn sfnt_size(table_lengths: impl ExactSizeIterator<Item = usize>) -> u64 {
    let count = table_lengths.len();
    let body: u64 = table_lengths.map(|len| pad4(len) as u64).sum();
    (SFNT_HEADER_LEN + TABLE_RECORD_LEN * count) as u64 + body
}

/// Round up to the next multiple of four.
pub fn pad4(len: usize) -> usize {
    (len + 3) & !3
}

/// OpenType table checksum: sum of big-endian u32 words, zero padded.
pub fn table_checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// Serialize tables into an sfnt file, sorted by tag with 4-byte alignment.
///
/// The `head` checksum is computed with `checkSumAdjustment` zeroed, as
/// OpenType requires; the adjustment itself is left untouched.
pub fn write_sfnt(flavor: u32, tables: &[Table<'_>]) -> Vec<u8> {
    let mut sorted: Vec<&Table<'_>> = tables.iter().collect();
    sorted.sort_by_key(|t| t.tag);

    let count = sorted.len() as u16;
    let entry_selector = if count == 0 { 0 } else { 15 - count.leading_zeros() as u16 };
    let search_range = (1u16 << entry_selector) * TABLE_RECORD_LEN as u16;
    let range_shift = (count * TABLE_RECORD_LEN as u16).saturating_sub(search_range);

    let total = sfnt_size(sorted.iter().map(|t| t.data.len())) as usize;
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&flavor.to_be_bytes());
    out.extend_from_slice(&count.to_be_bytes());
    out.extend_from_slice(&search_range.to_be_bytes());
    out.extend_from_slice(&entry_selector.to_be_bytes());
    out.extend_from_slice(&range_shift.to_be_bytes());

    let mut offset = SFNT_HEADER_LEN + TABLE_RECORD_LEN * sorted.len();
    for table in &sorted {
        let checksum = if &table.tag == b"head" && table.data.len() >= 12 {
            let mut head = table.data.to_vec();
            head[8..12].fill(0);
            table_checksum(&head)
        } else {
            table_checksum(table.data)
        };
        out.extend_from_slice(&table.tag);
        out.extend_from_slice(&checksum.to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(table.data.len() as u32).to_be_bytes());
        offset += pad4(table.data.len());
    }

    for table in &sorted {
        out.extend_from_slice(table.data);
        out.resize(pad4(out.len()), 0);
    }
    out
}
