//! # FITS binary-table column reader
//!
//! Column-projected ingestion of catalog tables from **FITS** files. This module
//! implements the small subset of the FITS standard needed by the clustering and
//! random catalogs: it walks the 2880-byte header/data units of a file, locates
//! the first `BINTABLE` extension, and materializes a handful of named numeric
//! columns as `Vec<f64>`.
//!
//! ## Overview
//! -----------------
//! A FITS file is a sequence of HDUs. Each HDU starts with one or more
//! 2880-byte header blocks made of 80-byte ASCII cards (`KEYWORD = value`),
//! terminated by an `END` card, followed by the data payload padded to the next
//! 2880-byte boundary. Binary tables declare their geometry through `NAXIS1`
//! (row width in bytes), `NAXIS2` (row count) and `TFIELDS`, and describe each
//! field with `TTYPEn` (name) and `TFORMn` (repeat count + type letter).
//!
//! Key design points:
//! - **Projection-first**: only the requested columns are decoded; everything
//!   else is skipped by offset arithmetic.
//! - **Strict structure, lenient values**: a missing `END` card or truncated
//!   block is an error, but both fixed- and free-format card values are
//!   accepted.
//! - **Big-endian on disk**: FITS table payloads are big-endian; integer
//!   columns are widened to `f64` on read.
//!
//! ## Supported column formats
//! -----------------
//! Scalar `TFORM` letters `D` (f64), `E` (f32), `K` (i64), `J` (i32) and
//! `I` (i16), with an optional repeat count that must be 1 for a requested
//! column. Anything else surfaces as [`DesimapError::UnsupportedTform`].

use std::fs::File as StdFile;
use std::io::{self, BufReader, Read, Seek, SeekFrom};

use camino::Utf8Path;

use crate::desimap_errors::DesimapError;

/// Size of a FITS header/data block in bytes.
const BLOCK_SIZE: usize = 2880;

/// Size of a FITS header card in bytes.
const CARD_SIZE: usize = 80;

/// A parsed FITS header: cards in file order, comments stripped.
#[derive(Debug)]
struct Header {
    cards: Vec<(String, String)>,
}

impl Header {
    fn get(&self, keyword: &str) -> Option<&str> {
        self.cards
            .iter()
            .find(|(k, _)| k == keyword)
            .map(|(_, v)| v.as_str())
    }

    /// String-valued card with the surrounding quotes removed.
    fn get_str(&self, keyword: &str) -> Option<String> {
        let raw = self.get(keyword)?;
        let trimmed = raw.trim();
        let unquoted = trimmed
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .unwrap_or(trimmed);
        Some(unquoted.trim_end().to_string())
    }

    fn get_i64(&self, keyword: &str) -> Option<i64> {
        self.get(keyword)?.trim().parse().ok()
    }

    fn require_i64(&self, keyword: &str, path: &Utf8Path) -> Result<i64, DesimapError> {
        self.get_i64(keyword)
            .ok_or_else(|| DesimapError::InvalidFitsStructure {
                file: path.to_path_buf(),
                reason: format!("missing or non-integer {keyword} card"),
            })
    }

    /// Size in bytes of the data payload following this header, heap included,
    /// before padding to the block boundary.
    fn data_size(&self, path: &Utf8Path) -> Result<u64, DesimapError> {
        let bitpix = self.require_i64("BITPIX", path)?.unsigned_abs();
        let naxis = self.require_i64("NAXIS", path)?;
        if naxis == 0 {
            return Ok(0);
        }
        let mut elements: u64 = 1;
        for i in 1..=naxis {
            elements *= self.require_i64(&format!("NAXIS{i}"), path)? as u64;
        }
        let heap = self.get_i64("PCOUNT").unwrap_or(0) as u64;
        Ok(elements * (bitpix / 8) + heap)
    }
}

/// Extract the value part of a header card, dropping any trailing comment.
fn card_value(raw: &str) -> String {
    let trimmed = raw.trim_start();
    if let Some(rest) = trimmed.strip_prefix('\'') {
        // String value: scan to the closing quote, honoring '' escapes.
        let mut end = None;
        let bytes = rest.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'\'' {
                if i + 1 < bytes.len() && bytes[i + 1] == b'\'' {
                    i += 2;
                    continue;
                }
                end = Some(i);
                break;
            }
            i += 1;
        }
        match end {
            Some(e) => format!("'{}'", &rest[..e]),
            None => trimmed.to_string(),
        }
    } else {
        match trimmed.find('/') {
            Some(slash) => trimmed[..slash].trim().to_string(),
            None => trimmed.trim().to_string(),
        }
    }
}

/// Read header blocks until the END card.
///
/// Returns `Ok(None)` when the reader is already at end-of-file, which is how
/// the HDU walk detects that no further extension exists.
fn read_header<R: Read>(reader: &mut R, path: &Utf8Path) -> Result<Option<Header>, DesimapError> {
    let mut cards = Vec::new();
    let mut first_block = true;
    loop {
        let mut block = [0u8; BLOCK_SIZE];
        match reader.read_exact(&mut block) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof && first_block && cards.is_empty() => {
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }
        first_block = false;

        for card in block.chunks_exact(CARD_SIZE) {
            let card = std::str::from_utf8(card)
                .ok()
                .filter(|c| c.is_ascii())
                .ok_or_else(|| DesimapError::InvalidFitsStructure {
                    file: path.to_path_buf(),
                    reason: "non-ASCII bytes in header card".to_string(),
                })?;
            let keyword = card[..8].trim_end();
            if keyword == "END" {
                return Ok(Some(Header { cards }));
            }
            if &card[8..10] == "= " {
                cards.push((keyword.to_string(), card_value(&card[10..])));
            }
        }
    }
}

/// Binary-table field data type, as declared by the TFORM letter.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FieldType {
    F64,
    F32,
    I64,
    I32,
    I16,
}

impl FieldType {
    fn width(self) -> usize {
        match self {
            FieldType::F64 | FieldType::I64 => 8,
            FieldType::F32 | FieldType::I32 => 4,
            FieldType::I16 => 2,
        }
    }

    fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'D' => Some(FieldType::F64),
            'E' => Some(FieldType::F32),
            'K' => Some(FieldType::I64),
            'J' => Some(FieldType::I32),
            'I' => Some(FieldType::I16),
            _ => None,
        }
    }

    fn decode(self, bytes: &[u8]) -> f64 {
        match self {
            FieldType::F64 => f64::from_be_bytes(bytes.try_into().unwrap()),
            FieldType::F32 => f32::from_be_bytes(bytes.try_into().unwrap()) as f64,
            FieldType::I64 => i64::from_be_bytes(bytes.try_into().unwrap()) as f64,
            FieldType::I32 => i32::from_be_bytes(bytes.try_into().unwrap()) as f64,
            FieldType::I16 => i16::from_be_bytes(bytes.try_into().unwrap()) as f64,
        }
    }
}

/// One field of the table: name, declared TFORM, repeat count, byte offset in a row.
#[derive(Debug)]
struct FieldDesc {
    name: String,
    tform: String,
    repeat: usize,
    field_type: Option<FieldType>,
    offset: usize,
}

/// Split a TFORM value such as `"D"`, `"1E"` or `"10A"` into repeat count and letter.
fn parse_tform(tform: &str) -> Option<(usize, char)> {
    let tform = tform.trim();
    let split = tform.find(|c: char| !c.is_ascii_digit())?;
    let repeat = if split == 0 {
        1
    } else {
        tform[..split].parse().ok()?
    };
    let letter = tform[split..].chars().next()?;
    Some((repeat, letter))
}

/// Width in bytes of a single element of the given TFORM letter.
fn element_width(letter: char) -> Option<usize> {
    match letter {
        'L' | 'X' | 'B' | 'A' => Some(1),
        'I' => Some(2),
        'J' | 'E' => Some(4),
        'K' | 'D' => Some(8),
        'C' => Some(8),
        'M' | 'P' => Some(16),
        _ => None,
    }
}

/// Parse the field layout of a BINTABLE header into per-field byte offsets.
fn table_fields(header: &Header, path: &Utf8Path) -> Result<Vec<FieldDesc>, DesimapError> {
    let tfields = header.require_i64("TFIELDS", path)?;
    let mut fields = Vec::with_capacity(tfields as usize);
    let mut offset = 0usize;
    for n in 1..=tfields {
        let name = header.get_str(&format!("TTYPE{n}")).unwrap_or_default();
        let tform =
            header
                .get_str(&format!("TFORM{n}"))
                .ok_or_else(|| DesimapError::InvalidFitsStructure {
                    file: path.to_path_buf(),
                    reason: format!("missing TFORM{n} card"),
                })?;
        let (repeat, letter) =
            parse_tform(&tform).ok_or_else(|| DesimapError::InvalidFitsStructure {
                file: path.to_path_buf(),
                reason: format!("unparseable TFORM{n} value: {tform}"),
            })?;
        let width = element_width(letter).ok_or_else(|| DesimapError::InvalidFitsStructure {
            file: path.to_path_buf(),
            reason: format!("unknown TFORM letter in {tform}"),
        })?;
        fields.push(FieldDesc {
            name,
            tform,
            repeat,
            field_type: FieldType::from_letter(letter),
            offset,
        });
        offset += repeat * width;
    }
    Ok(fields)
}

/// Load named numeric columns from the first BINTABLE extension of a FITS file.
///
/// Arguments
/// ---------
/// * `path`: path of the FITS file
/// * `columns`: names of the columns to materialize (matched against `TTYPEn`)
///
/// Return
/// ------
/// * one `Vec<f64>` per requested column, in request order, each of length
///   `NAXIS2`. Integer columns are widened to f64.
pub fn read_bintable_columns(
    path: &Utf8Path,
    columns: &[&str],
) -> Result<Vec<Vec<f64>>, DesimapError> {
    let mut reader = BufReader::new(StdFile::open(path)?);

    // Primary HDU: header plus (usually empty) data payload.
    let primary = read_header(&mut reader, path)?.ok_or_else(|| {
        DesimapError::InvalidFitsStructure {
            file: path.to_path_buf(),
            reason: "empty file".to_string(),
        }
    })?;
    skip_data(&mut reader, primary.data_size(path)?)?;

    // Walk extensions until the first binary table.
    let table_header = loop {
        let Some(header) = read_header(&mut reader, path)? else {
            return Err(DesimapError::BintableNotFound(path.to_path_buf()));
        };
        if header.get_str("XTENSION").as_deref() == Some("BINTABLE") {
            break header;
        }
        skip_data(&mut reader, header.data_size(path)?)?;
    };

    let row_width = table_header.require_i64("NAXIS1", path)? as usize;
    let n_rows = table_header.require_i64("NAXIS2", path)? as usize;
    let fields = table_fields(&table_header, path)?;

    // Resolve the requested columns against the table layout.
    let mut selected = Vec::with_capacity(columns.len());
    for &name in columns {
        let field = fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| DesimapError::ColumnNotFound {
                file: path.to_path_buf(),
                column: name.to_string(),
            })?;
        let field_type = match (field.field_type, field.repeat) {
            (Some(ft), 1) => ft,
            _ => {
                return Err(DesimapError::UnsupportedTform {
                    file: path.to_path_buf(),
                    column: name.to_string(),
                    tform: field.tform.clone(),
                })
            }
        };
        selected.push((field.offset, field_type));
    }

    let mut payload = vec![0u8; row_width * n_rows];
    reader.read_exact(&mut payload)?;

    let mut out: Vec<Vec<f64>> = selected
        .iter()
        .map(|_| Vec::with_capacity(n_rows))
        .collect();
    for row in payload.chunks_exact(row_width) {
        for (slot, &(offset, field_type)) in out.iter_mut().zip(&selected) {
            slot.push(field_type.decode(&row[offset..offset + field_type.width()]));
        }
    }
    Ok(out)
}

/// Advance past a data payload, block padding included.
fn skip_data<R: Read + Seek>(reader: &mut R, data_size: u64) -> Result<(), DesimapError> {
    if data_size == 0 {
        return Ok(());
    }
    let padded = data_size.div_ceil(BLOCK_SIZE as u64) * BLOCK_SIZE as u64;
    reader.seek(SeekFrom::Current(padded as i64))?;
    Ok(())
}

#[cfg(test)]
mod test_fits {
    use super::*;

    #[test]
    fn tform_parsing() {
        assert_eq!(parse_tform("D"), Some((1, 'D')));
        assert_eq!(parse_tform("1E"), Some((1, 'E')));
        assert_eq!(parse_tform("10A"), Some((10, 'A')));
        assert_eq!(parse_tform("  K "), Some((1, 'K')));
        assert_eq!(parse_tform("123"), None);
    }

    #[test]
    fn card_value_strips_comments_and_quotes() {
        assert_eq!(card_value("                   32 / bits"), "32");
        assert_eq!(card_value(" 'BINTABLE'           / extension"), "'BINTABLE'");
        assert_eq!(card_value(" 'O''HARA'"), "'O''HARA'");
        assert_eq!(card_value("                    T"), "T");
    }

    #[test]
    fn field_type_decoding() {
        assert_eq!(FieldType::F64.decode(&1.5f64.to_be_bytes()), 1.5);
        assert_eq!(FieldType::F32.decode(&2.25f32.to_be_bytes()), 2.25);
        assert_eq!(FieldType::I64.decode(&(-7i64).to_be_bytes()), -7.0);
        assert_eq!(FieldType::I32.decode(&40000i32.to_be_bytes()), 40000.0);
        assert_eq!(FieldType::I16.decode(&(-12i16).to_be_bytes()), -12.0);
    }
}
