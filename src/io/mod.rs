//! Structure encoders and tabular I/O.
//!
//! Structures are written as plain XYZ or extended XYZ, either one record
//! per file or appended to a single combined file (see [`sink`]). CSV
//! support covers reading selection tables, writing BOM-prefixed tables and
//! copying the head of a table (see [`table`]).

use std::fmt;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use crate::model::structure::Structure;

pub mod error;
pub mod sink;
pub mod table;

pub mod xyz {
    pub mod writer;
}

pub mod extxyz {
    pub mod writer;
}

use error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    #[default]
    Xyz,
    ExtXyz,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Xyz => "xyz",
            Format::ExtXyz => "extxyz",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "xyz" => Some(Format::Xyz),
            "extxyz" => Some(Format::ExtXyz),
            _ => None,
        }
    }

    /// Picks the format from a target path's extension.
    pub fn infer(path: &Path) -> Result<Self, Error> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| Error::UnknownExtension(path.to_path_buf()))
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Xyz => "XYZ",
            Format::ExtXyz => "extended XYZ",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s.trim()).ok_or_else(|| Error::UnknownFormat(s.to_string()))
    }
}

/// Where a written structure came from; rendered as comment-line tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provenance<'a> {
    pub shard: &'a str,
    pub index: usize,
}

impl<'a> Provenance<'a> {
    pub fn new(shard: &'a str, index: usize) -> Self {
        Self { shard, index }
    }
}

pub fn write_structure<W: Write>(
    writer: W,
    structure: &Structure,
    format: Format,
    provenance: Option<&Provenance<'_>>,
) -> Result<(), Error> {
    match format {
        Format::Xyz => xyz::writer::write(writer, structure, provenance),
        Format::ExtXyz => extxyz::writer::write(writer, structure, provenance),
    }
}

/// Writes one structure to `target`, truncating it unless `append` is set.
///
/// With no explicit format the target's extension decides. Returns the
/// format that was used.
pub fn encode(
    structure: &Structure,
    target: &Path,
    format: Option<Format>,
    append: bool,
    provenance: Option<&Provenance<'_>>,
) -> Result<Format, Error> {
    let format = match format {
        Some(format) => format,
        None => Format::infer(target)?,
    };

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(target)
        .map_err(|e| Error::output(target, e))?;

    let mut writer = BufWriter::new(file);
    write_structure(&mut writer, structure, format, provenance)?;
    writer.flush().map_err(|e| Error::output(target, e))?;
    Ok(format)
}

/// Renders a comment-line value, quoting it when it would not survive
/// whitespace-separated `key=value` parsing.
pub(crate) fn tag_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '=' | '"' | '\''));
    if needs_quotes {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::Element;
    use std::fs;
    use tempfile::TempDir;

    fn water_like() -> Structure {
        Structure::from_sites([
            (Element::O, [0.0, 0.0, 0.0]),
            (Element::H, [0.96, 0.0, 0.0]),
        ])
    }

    #[test]
    fn infers_format_from_extension() {
        assert_eq!(Format::infer(Path::new("out/a.xyz")).unwrap(), Format::Xyz);
        assert_eq!(Format::infer(Path::new("a.EXTXYZ")).unwrap(), Format::ExtXyz);
        assert!(matches!(
            Format::infer(Path::new("a.pdb")),
            Err(Error::UnknownExtension(_))
        ));
        assert!(Format::infer(Path::new("noext")).is_err());
    }

    #[test]
    fn parses_format_names() {
        assert_eq!("extxyz".parse::<Format>().unwrap(), Format::ExtXyz);
        assert_eq!(" XYZ ".parse::<Format>().unwrap(), Format::Xyz);
        assert!("cif".parse::<Format>().is_err());
    }

    #[test]
    fn encode_truncates_unless_appending() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.xyz");

        encode(&water_like(), &target, None, false, None).unwrap();
        encode(&water_like(), &target, None, false, None).unwrap();
        let single = fs::read_to_string(&target).unwrap();
        assert_eq!(single.lines().count(), 4);

        encode(&water_like(), &target, None, true, None).unwrap();
        let doubled = fs::read_to_string(&target).unwrap();
        assert_eq!(doubled.lines().count(), 8);
    }

    #[test]
    fn explicit_format_overrides_extension() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.xyz");
        let used = encode(&water_like(), &target, Some(Format::ExtXyz), false, None).unwrap();
        assert_eq!(used, Format::ExtXyz);
        let text = fs::read_to_string(&target).unwrap();
        assert!(text.contains("Properties=species:S:1:pos:R:3"));
    }

    #[test]
    fn encode_rejects_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.cif");
        assert!(encode(&water_like(), &target, None, false, None).is_err());
        assert!(!target.exists());
    }

    #[test]
    fn quotes_only_values_that_need_it() {
        assert_eq!(tag_value("db_1.db"), "db_1.db");
        assert_eq!(tag_value("my shard.db"), "\"my shard.db\"");
        assert_eq!(tag_value("a\"b"), "\"a\\\"b\"");
        assert_eq!(tag_value(""), "\"\"");
    }
}
