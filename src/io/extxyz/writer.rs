use std::io::Write;

use crate::io::{Provenance, error::Error, tag_value};
use crate::model::structure::Structure;

const PROPERTIES: &str = "Properties=species:S:1:pos:R:3";

pub fn write<W: Write>(
    mut writer: W,
    structure: &Structure,
    provenance: Option<&Provenance<'_>>,
) -> Result<(), Error> {
    writeln!(writer, "{}", structure.site_count())?;
    writeln!(writer, "{}", comment_line(structure, provenance))?;

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

fn comment_line(structure: &Structure, provenance: Option<&Provenance<'_>>) -> String {
    let mut fields = Vec::with_capacity(5);

    if structure.has_cell() {
        let lattice: Vec<String> = structure
            .cell
            .iter()
            .flatten()
            .map(|v| format!("{v:.8}"))
            .collect();
        fields.push(format!("Lattice=\"{}\"", lattice.join(" ")));
    }

    fields.push(PROPERTIES.to_string());

    if let Some(p) = provenance {
        fields.push(format!("source_shard={}", tag_value(p.shard)));
        fields.push(format!("source_index={}", p.index));
    }

    let flags: Vec<&str> = structure
        .pbc
        .iter()
        .map(|&periodic| if periodic { "T" } else { "F" })
        .collect();
    fields.push(format!("pbc=\"{}\"", flags.join(" ")));

    fields.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::Element;

    #[test]
    fn comment_carries_lattice_properties_provenance_and_pbc() {
        let mut s = Structure::from_sites([(Element::Ti, [0.0, 0.0, 0.0])]);
        s.cell = [[3.0, 0.0, 0.0], [-1.5, 2.5, 0.0], [0.0, 0.0, 20.0]];
        s.pbc = [true, true, false];

        let line = comment_line(&s, Some(&Provenance::new("db_2.db", 11)));
        assert_eq!(
            line,
            "Lattice=\"3.00000000 0.00000000 0.00000000 -1.50000000 2.50000000 0.00000000 \
             0.00000000 0.00000000 20.00000000\" Properties=species:S:1:pos:R:3 \
             source_shard=db_2.db source_index=11 pbc=\"T T F\""
        );
    }

    #[test]
    fn zero_cell_omits_lattice() {
        let s = Structure::from_sites([(Element::O, [0.0, 0.0, 0.0])]);
        let line = comment_line(&s, None);
        assert_eq!(line, "Properties=species:S:1:pos:R:3 pbc=\"F F F\"");
    }

    #[test]
    fn writes_one_line_per_site() {
        let s = Structure::from_sites([
            (Element::Nb, [0.0, 0.0, 0.0]),
            (Element::Nb, [1.0, 0.0, 0.0]),
            (Element::N, [0.5, 0.5, 0.0]),
        ]);
        let mut buf = Vec::new();
        write(&mut buf, &s, None).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 5);
        assert!(text.lines().nth(4).unwrap().starts_with("N  "));
    }
}
