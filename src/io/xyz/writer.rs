use std::io::Write;

use crate::io::{Provenance, error::Error, tag_value};
use crate::model::structure::Structure;

pub fn write<W: Write>(
    mut writer: W,
    structure: &Structure,
    provenance: Option<&Provenance<'_>>,
) -> Result<(), Error> {
    writeln!(writer, "{}", structure.site_count())?;

    match provenance {
        Some(p) => writeln!(
            writer,
            "source_shard={} source_index={}",
            tag_value(p.shard),
            p.index
        )?,
        None => writeln!(writer)?,
    }

    for site in &structure.sites {
        writeln!(
            writer,
            "{:<2} {:>15.8} {:>15.8} {:>15.8}",
            site.element.symbol(),
            site.position[0],
            site.position[1],
            site.position[2]
        )?;
    }

    Ok(())
}
