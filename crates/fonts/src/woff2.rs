//! WOFF2 container encoding and decoding.
//!
//! Layout written by [`encode_woff2`]:
//!
//! ```text
//! +----------------------+  48-byte header ('wOF2', flavor, sizes)
//! | table directory      |  flags + optional tag + UIntBase128 length
//! | brotli stream        |  all tables concatenated, no padding
//! | zero padding         |  to a 4-byte boundary
//! +----------------------+
//! ```
//!
//! No table is transformed. `glyf` and `loca` carry transform version 3,
//! every other table version 0; both mean "stored as-is".

use std::io::Cursor;

use brotli::enc::backward_references::BrotliEncoderMode;
use brotli::enc::BrotliEncoderParams;
use webprep_common::error::{WebprepError, WebprepResult};

use crate::sfnt::{pad4, sfnt_size, write_sfnt, SfntFont, Table};

/// `wOF2`
pub const SIGNATURE: u32 = 0x774F_4632;

const HEADER_LEN: usize = 48;
const CUSTOM_TAG_INDEX: u8 = 63;
const NULL_TRANSFORM_GLYF_LOCA: u8 = 3;
const BROTLI_WINDOW_BITS: i32 = 22;

/// Tags with a one-byte directory encoding, by index.
pub const KNOWN_TAGS: [&[u8; 4]; 63] = [
    b"cmap", b"head", b"hhea", b"hmtx", b"maxp", b"name", b"OS/2", b"post", b"cvt ", b"fpgm",
    b"glyf", b"loca", b"prep", b"CFF ", b"VORG", b"EBDT", b"EBLC", b"gasp", b"hdmx", b"kern",
    b"LTSH", b"PCLT", b"VDMX", b"vhea", b"vmtx", b"BASE", b"GDEF", b"GPOS", b"GSUB", b"EBSC",
    b"JSTF", b"MATH", b"CBDT", b"CBLC", b"COLR", b"CPAL", b"SVG ", b"sbix", b"acnt", b"avar",
    b"bdat", b"bloc", b"bsln", b"cvar", b"fdsc", b"feat", b"fmtx", b"fvar", b"gvar", b"hsty",
    b"just", b"lcar", b"mort", b"morx", b"opbd", b"prop", b"trak", b"Zapf", b"Silf", b"Glat",
    b"Gloc", b"Feat", b"Sill",
];

fn known_tag_index(tag: &[u8; 4]) -> Option<u8> {
    KNOWN_TAGS
        .iter()
        .position(|known| *known == tag)
        .map(|i| i as u8)
}

fn is_glyf_or_loca(tag: &[u8; 4]) -> bool {
    tag == b"glyf" || tag == b"loca"
}

/// Append `value` as a WOFF2 `UIntBase128`: big-endian groups of seven bits,
/// high bit set on every byte but the last, no leading zero groups.
pub fn write_uint_base128(out: &mut Vec<u8>, value: u32) {
    let mut groups = [0u8; 5];
    let mut len = 0;
    let mut rest = value;
    loop {
        groups[len] = (rest & 0x7F) as u8;
        len += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    for i in (0..len).rev() {
        let continuation = if i == 0 { 0 } else { 0x80 };
        out.push(groups[i] | continuation);
    }
}

/// Read a `UIntBase128` at `*pos`, advancing it.
pub fn read_uint_base128(data: &[u8], pos: &mut usize) -> WebprepResult<u32> {
    let mut value: u32 = 0;
    for i in 0..5 {
        let byte = *data
            .get(*pos)
            .ok_or_else(|| WebprepError::font("Truncated UIntBase128"))?;
        *pos += 1;

        if i == 0 && byte == 0x80 {
            return Err(WebprepError::font("UIntBase128 with leading zeros"));
        }
        if value & 0xFE00_0000 != 0 {
            return Err(WebprepError::font("UIntBase128 overflows 32 bits"));
        }
        value = (value << 7) | u32::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(WebprepError::font("UIntBase128 longer than 5 bytes"))
}

/// Directory order: sorted by tag, with `loca` immediately after `glyf`.
fn directory_order<'t, 'a>(tables: &'t [Table<'a>]) -> Vec<&'t Table<'a>> {
    let mut order: Vec<&Table<'a>> = tables.iter().collect();
    order.sort_by_key(|t| t.tag);

    let loca = order.iter().position(|t| &t.tag == b"loca");
    if let Some(loca) = loca {
        let loca = order.remove(loca);
        match order.iter().position(|t| &t.tag == b"glyf") {
            Some(glyf) => order.insert(glyf + 1, loca),
            None => {
                let at = order.partition_point(|t| t.tag < loca.tag);
                order.insert(at, loca);
            }
        }
    }
    order
}

/// Font version for the header, taken from `head.fontRevision` (16.16).
fn font_revision(font: &SfntFont<'_>) -> (u16, u16) {
    match font.table(b"head") {
        Some(head) if head.data.len() >= 8 => {
            let major = u16::from_be_bytes([head.data[4], head.data[5]]);
            let fraction = u16::from_be_bytes([head.data[6], head.data[7]]);
            let minor = (f64::from(fraction) / 65536.0 * 1000.0).round() as u16;
            (major, minor)
        }
        _ => (1, 0),
    }
}

/// Encode `font` as WOFF2 with Brotli `quality` (0-11).
pub fn encode_woff2(font: &SfntFont<'_>, quality: u32) -> WebprepResult<Vec<u8>> {
    let order = directory_order(font.tables());

    let mut directory = Vec::with_capacity(order.len() * 6);
    let mut stream = Vec::with_capacity(order.iter().map(|t| t.data.len()).sum());
    for table in &order {
        let length = u32::try_from(table.data.len())
            .map_err(|_| WebprepError::font(format!("Table '{}' too large", table.tag_str())))?;

        let transform = if is_glyf_or_loca(&table.tag) {
            NULL_TRANSFORM_GLYF_LOCA << 6
        } else {
            0
        };
        match known_tag_index(&table.tag) {
            Some(index) => directory.push(transform | index),
            None => {
                directory.push(transform | CUSTOM_TAG_INDEX);
                directory.extend_from_slice(&table.tag);
            }
        }
        write_uint_base128(&mut directory, length);
        stream.extend_from_slice(table.data);
    }

    let compressed = brotli_compress(&stream, quality)?;

    let unpadded = HEADER_LEN + directory.len() + compressed.len();
    let total_len = pad4(unpadded);
    let total_sfnt_size = font.total_sfnt_size();
    let (major, minor) = font_revision(font);

    let mut out = Vec::with_capacity(total_len);
    out.extend_from_slice(&SIGNATURE.to_be_bytes());
    out.extend_from_slice(&font.flavor().to_be_bytes());
    out.extend_from_slice(&(total_len as u32).to_be_bytes());
    out.extend_from_slice(&(order.len() as u16).to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&(total_sfnt_size as u32).to_be_bytes());
    out.extend_from_slice(&(compressed.len() as u32).to_be_bytes());
    out.extend_from_slice(&major.to_be_bytes());
    out.extend_from_slice(&minor.to_be_bytes());
    // metaOffset, metaLength, metaOrigLength, privOffset, privLength
    out.extend_from_slice(&[0u8; 20]);
    debug_assert_eq!(out.len(), HEADER_LEN);

    out.extend_from_slice(&directory);
    out.extend_from_slice(&compressed);
    out.resize(total_len, 0);

    tracing::debug!(
        tables = order.len(),
        sfnt_bytes = total_sfnt_size,
        woff2_bytes = total_len,
        "Encoded WOFF2"
    );
    Ok(out)
}

fn brotli_compress(data: &[u8], quality: u32) -> WebprepResult<Vec<u8>> {
    let params = BrotliEncoderParams {
        quality: quality.min(11) as i32,
        lgwin: BROTLI_WINDOW_BITS,
        mode: BrotliEncoderMode::BROTLI_MODE_FONT,
        size_hint: data.len(),
        ..BrotliEncoderParams::default()
    };
    let mut compressed = Vec::new();
    brotli::BrotliCompress(&mut Cursor::new(data), &mut compressed, &params)
        .map_err(|e| WebprepError::font(format!("Brotli compression failed: {e}")))?;
    Ok(compressed)
}

/// Compress and decompress a small buffer to confirm Brotli works.
/// Returns the compressed size.
pub fn probe_compressor() -> WebprepResult<usize> {
    let sample: Vec<u8> = b"wOF2 probe ".iter().copied().cycle().take(1024).collect();
    let compressed = brotli_compress(&sample, 5)?;
    let mut restored = Vec::new();
    brotli::BrotliDecompress(&mut Cursor::new(&compressed), &mut restored)
        .map_err(|e| WebprepError::font(format!("Brotli decompression failed: {e}")))?;
    if restored != sample {
        return Err(WebprepError::font("Brotli round trip changed the data"));
    }
    Ok(compressed.len())
}

/// A WOFF2 file unpacked back into its tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedWoff2 {
    pub flavor: u32,
    /// `(tag, bytes)` in directory order.
    pub tables: Vec<([u8; 4], Vec<u8>)>,
    /// `totalSfntSize` as declared in the header.
    pub declared_sfnt_size: u32,
}

impl DecodedWoff2 {
    pub fn table(&self, tag: &[u8; 4]) -> Option<&[u8]> {
        self.tables
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, data)| data.as_slice())
    }

    /// Rebuild the sfnt file.
    pub fn to_sfnt(&self) -> Vec<u8> {
        let tables: Vec<Table<'_>> = self
            .tables
            .iter()
            .map(|(tag, data)| Table { tag: *tag, data })
            .collect();
        write_sfnt(self.flavor, &tables)
    }
}

fn read_u32(data: &[u8], at: usize) -> WebprepResult<u32> {
    data.get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| WebprepError::font("Truncated WOFF2 header"))
}

fn read_u16(data: &[u8], at: usize) -> WebprepResult<u16> {
    data.get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| WebprepError::font("Truncated WOFF2 header"))
}

/// Decode a WOFF2 file whose tables are all untransformed.
///
/// Files with transformed `glyf`/`loca`/`hmtx` (as produced by most other
/// encoders) are reported as unsupported.
pub fn decode_woff2(data: &[u8]) -> WebprepResult<DecodedWoff2> {
    if read_u32(data, 0)? != SIGNATURE {
        return Err(WebprepError::font("Missing wOF2 signature"));
    }
    let flavor = read_u32(data, 4)?;
    let length = read_u32(data, 8)? as usize;
    let num_tables = read_u16(data, 12)?;
    let declared_sfnt_size = read_u32(data, 16)?;
    let compressed_len = read_u32(data, 20)? as usize;

    if length != data.len() {
        return Err(WebprepError::font(format!(
            "Header length {length} does not match file size {}",
            data.len()
        )));
    }

    let mut pos = HEADER_LEN;
    let mut entries = Vec::with_capacity(num_tables as usize);
    for _ in 0..num_tables {
        let flags = *data
            .get(pos)
            .ok_or_else(|| WebprepError::font("Truncated table directory"))?;
        pos += 1;

        let tag: [u8; 4] = match flags & 0x3F {
            CUSTOM_TAG_INDEX => {
                let bytes = data
                    .get(pos..pos + 4)
                    .ok_or_else(|| WebprepError::font("Truncated table tag"))?;
                pos += 4;
                [bytes[0], bytes[1], bytes[2], bytes[3]]
            }
            index => *KNOWN_TAGS[index as usize],
        };

        let transform = flags >> 6;
        let untransformed = if is_glyf_or_loca(&tag) {
            transform == NULL_TRANSFORM_GLYF_LOCA
        } else {
            transform == 0
        };
        let orig_length = read_uint_base128(data, &mut pos)? as usize;
        if !untransformed {
            return Err(WebprepError::unsupported(format!(
                "Table '{}' uses transform version {transform}",
                String::from_utf8_lossy(&tag)
            )));
        }
        entries.push((tag, orig_length));
    }

    let compressed = data
        .get(pos..pos + compressed_len)
        .ok_or_else(|| WebprepError::font("Compressed stream extends past end of file"))?;
    let mut stream = Vec::new();
    brotli::BrotliDecompress(&mut Cursor::new(compressed), &mut stream)
        .map_err(|e| WebprepError::font(format!("Brotli decompression failed: {e}")))?;

    let expected: usize = entries.iter().map(|(_, len)| len).sum();
    if stream.len() != expected {
        return Err(WebprepError::font(format!(
            "Decompressed {} bytes, directory declares {expected}",
            stream.len()
        )));
    }

    let mut offset = 0;
    let tables = entries
        .into_iter()
        .map(|(tag, len)| {
            let table = stream[offset..offset + len].to_vec();
            offset += len;
            (tag, table)
        })
        .collect::<Vec<_>>();

    let recomputed = sfnt_size(tables.iter().map(|(_, t)| t.len()));
    if recomputed != u64::from(declared_sfnt_size) {
        tracing::warn!(
            declared = declared_sfnt_size,
            recomputed,
            "WOFF2 totalSfntSize mismatch"
        );
    }

    Ok(DecodedWoff2 {
        flavor,
        tables,
        declared_sfnt_size,
    })
}
