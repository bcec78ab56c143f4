//! I/O utilities for reading source exports and writing snapshots.
//!
//! Every file the crate touches flows through this module:
//!
//! - **Delimiter resolution**: extension-based (`.tsv` → tab, otherwise comma)
//!   with manual override.
//! - **Encoding**: inputs are decoded through `encoding_rs_io` (a BOM wins over
//!   the requested label, and is stripped); outputs are transcoded with
//!   `encoding_rs`. UTF-8 is the default both ways.
//! - **Reading**: a whole export becomes a [`RawTable`]; rows may be ragged and
//!   fully blank rows are skipped.
//! - **stdout**: the `-` path convention writes to standard output.

use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};
use encoding_rs_io::DecodeReaderBytesBuilder;
use log::{debug, info};

use crate::table::RawTable;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

/// How source exports are read.
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
        }
    }
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'")),
        None => Ok(UTF_8),
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn resolve_output_delimiter(path: Option<&Path>, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path {
        Some(path) if !is_dash(path) => resolve_input_delimiter(path, None),
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn parse_delimiter(value: &str) -> Result<u8> {
    match value {
        "tab" | "\\t" => Ok(b'\t'),
        "comma" => Ok(b','),
        "semicolon" => Ok(b';'),
        "pipe" => Ok(b'|'),
        other if other.len() == 1 && other.is_ascii() => Ok(other.as_bytes()[0]),
        other => Err(anyhow!("Unsupported delimiter '{other}'")),
    }
}

pub fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}

/// Reads a delimited export into a [`RawTable`] named `name`; the first row
/// becomes the header.
pub fn read_table(path: &Path, name: &str, options: &ReadOptions) -> Result<RawTable> {
    let delimiter = resolve_input_delimiter(path, options.delimiter);
    info!(
        "Reading {name} from {path:?} (delimiter '{}', encoding {})",
        printable_delimiter(delimiter),
        options.encoding.name()
    );
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    let decoded = DecodeReaderBytesBuilder::new()
        .encoding(Some(options.encoding))
        .bom_override(true)
        .strip_bom(true)
        .build(file);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(BufReader::new(decoded));

    let mut rows = Vec::new();
    let mut blank_rows = 0usize;
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Reading row {} of {path:?}", row_idx + 1))?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            blank_rows += 1;
            continue;
        }
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }
    if blank_rows > 0 {
        debug!("{name}: skipped {blank_rows} blank row(s)");
    }
    let table = RawTable::from_rows(name, rows);
    info!(
        "{name}: {} column(s), {} row(s)",
        table.headers().len(),
        table.len()
    );
    Ok(table)
}

/// Writes `text` to `path` (stdout for `-` or `None`) in `encoding`.
pub fn write_encoded(path: Option<&Path>, text: &str, encoding: &'static Encoding) -> Result<()> {
    let bytes = if encoding == UTF_8 {
        std::borrow::Cow::Borrowed(text.as_bytes())
    } else {
        let (encoded, _, had_errors) = encoding.encode(text);
        if had_errors {
            return Err(anyhow!(
                "Output contains characters not representable in {}",
                encoding.name()
            ));
        }
        encoded
    };
    match path {
        Some(p) if !is_dash(p) => {
            let mut file =
                File::create(p).with_context(|| format!("Creating output file {p:?}"))?;
            file.write_all(&bytes)
                .with_context(|| format!("Writing output file {p:?}"))?;
            file.flush().with_context(|| format!("Flushing output file {p:?}"))
        }
        _ => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes).context("Writing to stdout")?;
            stdout.flush().context("Flushing stdout")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_follows_extension_unless_overridden() {
        assert_eq!(resolve_input_delimiter(Path::new("a.tsv"), None), b'\t');
        assert_eq!(resolve_input_delimiter(Path::new("a.TSV"), None), b'\t');
        assert_eq!(resolve_input_delimiter(Path::new("a.csv"), None), b',');
        assert_eq!(resolve_input_delimiter(Path::new("a.tsv"), Some(b';')), b';');
        assert_eq!(resolve_output_delimiter(Some(Path::new("-")), None), b',');
        assert_eq!(resolve_output_delimiter(Some(Path::new("out.tsv")), None), b'\t');
    }

    #[test]
    fn parse_delimiter_accepts_names_and_single_chars() {
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert!(parse_delimiter("::").is_err());
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        assert!(resolve_encoding(Some("not-an-encoding")).is_err());
        assert_eq!(resolve_encoding(Some("latin1")).unwrap().name(), "windows-1252");
    }
}
