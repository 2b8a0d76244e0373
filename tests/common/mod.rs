//! Shared helpers for the integration suites: a minimal FITS BINTABLE writer
//! used to generate synthetic clustering and random catalogs on disk.

use std::fs::File;
use std::io::{BufWriter, Write};

use camino::Utf8Path;

const BLOCK_SIZE: usize = 2880;
const CARD_SIZE: usize = 80;
const CARDS_PER_BLOCK: usize = BLOCK_SIZE / CARD_SIZE;

fn card(keyword: &str, value: &str) -> [u8; CARD_SIZE] {
    let mut out = [b' '; CARD_SIZE];
    let text = format!("{keyword:<8}= {value:>20}");
    out[..text.len()].copy_from_slice(text.as_bytes());
    out
}

fn end_card() -> [u8; CARD_SIZE] {
    let mut out = [b' '; CARD_SIZE];
    out[..3].copy_from_slice(b"END");
    out
}

/// Write header cards padded with blank cards to a whole number of blocks.
fn write_header<W: Write>(writer: &mut W, cards: &[[u8; CARD_SIZE]]) {
    for c in cards {
        writer.write_all(c).unwrap();
    }
    let remainder = cards.len() % CARDS_PER_BLOCK;
    if remainder != 0 {
        for _ in remainder..CARDS_PER_BLOCK {
            writer.write_all(&[b' '; CARD_SIZE]).unwrap();
        }
    }
}

/// Write a FITS file holding a single BINTABLE extension of f64 columns.
///
/// All columns must have the same length; the table is preceded by an empty
/// primary HDU, as produced by the standard FITS writers.
pub fn write_bintable(path: &Utf8Path, columns: &[(&str, &[f64])]) {
    let n_rows = columns.first().map_or(0, |(_, v)| v.len());
    assert!(columns.iter().all(|(_, v)| v.len() == n_rows));

    let mut writer = BufWriter::new(File::create(path).unwrap());

    // Empty primary HDU.
    write_header(
        &mut writer,
        &[
            card("SIMPLE", "T"),
            card("BITPIX", "8"),
            card("NAXIS", "0"),
            end_card(),
        ],
    );

    // Binary-table header.
    let mut cards = vec![
        card("XTENSION", "'BINTABLE'"),
        card("BITPIX", "8"),
        card("NAXIS", "2"),
        card("NAXIS1", &(8 * columns.len()).to_string()),
        card("NAXIS2", &n_rows.to_string()),
        card("PCOUNT", "0"),
        card("GCOUNT", "1"),
        card("TFIELDS", &columns.len().to_string()),
    ];
    for (i, (name, _)) in columns.iter().enumerate() {
        cards.push(card(&format!("TTYPE{}", i + 1), &format!("'{name}'")));
        cards.push(card(&format!("TFORM{}", i + 1), "'D'"));
    }
    cards.push(end_card());
    write_header(&mut writer, &cards);

    // Row-major big-endian payload, zero-padded to the block boundary.
    let mut written = 0usize;
    for row in 0..n_rows {
        for (_, values) in columns {
            writer.write_all(&values[row].to_be_bytes()).unwrap();
            written += 8;
        }
    }
    if written % BLOCK_SIZE != 0 {
        writer
            .write_all(&vec![0u8; BLOCK_SIZE - written % BLOCK_SIZE])
            .unwrap();
    }
    writer.flush().unwrap();
}
