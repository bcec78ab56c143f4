use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::{cli::ExportArgs, io_utils, metrics::School};

/// Column order of exported record sets.
pub const EXPORT_HEADERS: [&str; 9] = [
    "school_id",
    "school_name",
    "neighborhood",
    "total_rooms",
    "ac_rooms",
    "rooms_without_ac",
    "ac_percentage",
    "early_score",
    "final_score",
];

/// Serializes `records` with [`EXPORT_HEADERS`]; absent values become empty
/// cells. The header is written even for an empty set.
pub fn to_delimited(records: &[School], delimiter: u8) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_writer(Vec::new());
    writer
        .write_record(EXPORT_HEADERS)
        .context("Writing export header")?;
    for school in records {
        writer
            .serialize(school)
            .with_context(|| format!("Writing school {}", school.school_id))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("Finishing export buffer: {}", err.error()))?;
    String::from_utf8(bytes).context("Export buffer is not valid UTF-8")
}

pub fn write_records(
    records: &[School],
    path: Option<&Path>,
    delimiter: u8,
    encoding: &'static encoding_rs::Encoding,
) -> Result<()> {
    let text = to_delimited(records, delimiter)?;
    io_utils::write_encoded(path, &text, encoding)
}

pub fn execute(args: &ExportArgs) -> Result<()> {
    let output_encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;
    let session = crate::load_session(&args.input)?;
    let view = session.filter(&args.filter.to_spec());

    let output = Some(args.output.as_path());
    let delimiter = io_utils::resolve_output_delimiter(output, args.output_delimiter);
    write_records(&view, output, delimiter, output_encoding)
        .with_context(|| format!("Exporting schools to {:?}", args.output))?;
    info!(
        "Exported {} school(s) to {:?} (delimiter '{}', encoding {})",
        view.len(),
        args.output,
        io_utils::printable_delimiter(delimiter),
        output_encoding.name()
    );
    Ok(())
}
