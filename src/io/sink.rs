//! Destinations for extracted structures.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Format, Provenance, encode, error::Error, write_structure};
use crate::model::structure::Structure;

pub trait StructureSink {
    /// Writes one structure and returns the file it went to.
    fn write(&mut self, provenance: &Provenance<'_>, structure: &Structure)
    -> Result<&Path, Error>;

    /// The output file or directory.
    fn target(&self) -> &Path;
}

/// One `{shard_stem}_{index}.xyz` file per record inside a directory.
#[derive(Debug)]
pub struct PerRecordFiles {
    dir: PathBuf,
    format: Format,
    last: PathBuf,
}

impl PerRecordFiles {
    /// Creates `dir` if needed. Content defaults to plain XYZ.
    pub fn create(dir: impl Into<PathBuf>, format: Option<Format>) -> Result<Self, Error> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| Error::output(&dir, e))?;
        Ok(Self {
            last: dir.clone(),
            dir,
            format: format.unwrap_or_default(),
        })
    }

    pub fn file_name(shard: &str, index: usize) -> String {
        let stem = Path::new(shard)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| shard.to_string());
        format!("{stem}_{index}.xyz")
    }
}

impl StructureSink for PerRecordFiles {
    fn write(
        &mut self,
        provenance: &Provenance<'_>,
        structure: &Structure,
    ) -> Result<&Path, Error> {
        self.last = self
            .dir
            .join(Self::file_name(provenance.shard, provenance.index));
        encode(structure, &self.last, Some(self.format), false, Some(provenance))?;
        debug!(path = %self.last.display(), "wrote structure");
        Ok(&self.last)
    }

    fn target(&self) -> &Path {
        &self.dir
    }
}

/// All records appended to one file, flushed after each record.
///
/// Any existing file at the path is removed when the sink is created; the
/// file itself is only created by the first write.
#[derive(Debug)]
pub struct CombinedFile {
    path: PathBuf,
    format: Format,
    writer: Option<BufWriter<File>>,
}

impl CombinedFile {
    pub fn create(path: impl Into<PathBuf>, format: Option<Format>) -> Result<Self, Error> {
        let path = path.into();
        let format = match format {
            Some(format) => format,
            None => Format::infer(&path)?,
        };

        if path.exists() {
            fs::remove_file(&path).map_err(|e| Error::output(&path, e))?;
            debug!(path = %path.display(), "removed previous combined output");
        }

        Ok(Self {
            path,
            format,
            writer: None,
        })
    }

    pub fn format(&self) -> Format {
        self.format
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>, Error> {
        if let Some(writer) = self.writer.take() {
            return Ok(self.writer.insert(writer));
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::output(parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::output(&self.path, e))?;
        Ok(self.writer.insert(BufWriter::new(file)))
    }
}

impl StructureSink for CombinedFile {
    fn write(
        &mut self,
        provenance: &Provenance<'_>,
        structure: &Structure,
    ) -> Result<&Path, Error> {
        let format = self.format;
        let writer = self.writer()?;
        write_structure(&mut *writer, structure, format, Some(provenance))?;
        writer.flush()?;
        Ok(&self.path)
    }

    fn target(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::Element;
    use tempfile::TempDir;

    fn single(element: Element) -> Structure {
        Structure::from_sites([(element, [0.0, 0.0, 0.0])])
    }

    #[test]
    fn per_record_names_use_the_shard_stem() {
        assert_eq!(PerRecordFiles::file_name("db_3.db", 12), "db_3_12.xyz");
        assert_eq!(PerRecordFiles::file_name("runs/db_3.aselmdb", 0), "db_3_0.xyz");
    }

    #[test]
    fn per_record_sink_creates_the_directory() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested/xyz_out");
        let mut sink = PerRecordFiles::create(&out, None).unwrap();

        let written = sink
            .write(&Provenance::new("db_1.db", 5), &single(Element::Ti))
            .unwrap()
            .to_path_buf();

        assert_eq!(written, out.join("db_1_5.xyz"));
        let text = fs::read_to_string(&written).unwrap();
        assert!(text.starts_with("1\nsource_shard=db_1.db source_index=5\n"));
    }

    #[test]
    fn combined_sink_replaces_stale_output_and_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("all.extxyz");
        fs::write(&path, "stale\n").unwrap();

        let mut sink = CombinedFile::create(&path, None).unwrap();
        assert!(!path.exists());
        assert_eq!(sink.format(), Format::ExtXyz);

        sink.write(&Provenance::new("db_1.db", 0), &single(Element::Ti))
            .unwrap();
        sink.write(&Provenance::new("db_2.db", 3), &single(Element::C))
            .unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(!text.contains("stale"));
        assert_eq!(text.lines().count(), 6);
        assert!(text.contains("source_shard=db_2.db source_index=3"));
    }

    #[test]
    fn combined_sink_writes_nothing_without_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("all.xyz");
        let _sink = CombinedFile::create(&path, None).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn combined_sink_needs_a_known_format() {
        let dir = TempDir::new().unwrap();
        assert!(CombinedFile::create(dir.path().join("all.txt"), None).is_err());
        assert!(CombinedFile::create(dir.path().join("all.txt"), Some(Format::Xyz)).is_ok());
    }
}
