use std::io::{self, Write};

use anyhow::Result;
use lumen_io::{ConversionManager, Format, FormatInfo};
use tabwriter::TabWriter;

use crate::commands::util::print_json;

pub fn handle(manager: &ConversionManager, format: Option<Format>, json: bool) -> Result<()> {
    let formats = match format {
        Some(format) => vec![format],
        None => manager.formats(),
    };
    let infos = formats
        .into_iter()
        .map(|format| manager.format_info(format))
        .collect::<Result<Vec<FormatInfo>, _>>()?;

    if json {
        return print_json(&infos);
    }
    if let [info] = infos.as_slice() {
        return print_details(info);
    }
    print_table(&infos)
}

fn print_table(infos: &[FormatInfo]) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "ID\tNAME\tVERSIONS\tEXTENSIONS")?;
    for info in infos {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            info.format.id(),
            info.name,
            info.supported_versions.join(", "),
            info.file_extensions.join(", ")
        )?;
    }
    writer.flush()?;
    Ok(())
}

fn print_details(info: &FormatInfo) -> Result<()> {
    let caps = &info.capabilities;
    let limit = |max: Option<usize>| max.map_or("unlimited".to_string(), |n| n.to_string());
    let types: Vec<String> = caps.photometry_types.iter().map(|t| t.to_string()).collect();

    println!("{} ({})", info.name, info.format.id());
    println!("  {}", info.description);
    println!("  Versions         : {}", info.supported_versions.join(", "));
    println!("  Extensions       : {}", info.file_extensions.join(", "));
    println!("  Photometry types : {}", types.join(", "));
    println!("  Absolute / relative: {} / {}", caps.absolute_photometry, caps.relative_photometry);
    println!(
        "  Grid             : {} vertical x {} horizontal{}",
        limit(caps.max_vertical_angles),
        limit(caps.max_horizontal_angles),
        if caps.fixed_grid { " (fixed)" } else { "" }
    );
    println!(
        "  Keeps metadata / geometry / electrical: {} / {} / {}",
        caps.preserves_metadata, caps.preserves_geometry, caps.preserves_electrical
    );
    Ok(())
}
