use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::Error;

/// Shards available for a run, keyed by base file name.
///
/// Built once from a glob under a root directory; iteration is ordered by
/// name so every run visits shards in the same order.
#[derive(Debug, Clone, Default)]
pub struct ShardCatalog {
    root: PathBuf,
    pattern: String,
    shards: BTreeMap<String, PathBuf>,
    shadowed: Vec<PathBuf>,
}

impl ShardCatalog {
    /// Globs `pattern` relative to `root`.
    ///
    /// An empty result is not an error here; callers decide whether they can
    /// proceed without shards.
    pub fn discover(root: impl AsRef<Path>, pattern: &str) -> Result<Self, Error> {
        let root = root.as_ref();
        let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
        let full_pattern = Path::new(&escaped_root).join(pattern);

        let mut paths = Vec::new();
        for entry in glob::glob(&full_pattern.to_string_lossy())? {
            match entry {
                Ok(path) if path.is_file() => paths.push(path),
                Ok(_) => {}
                Err(e) => warn!(path = %e.path().display(), error = %e.error(), "skipping unreadable path"),
            }
        }

        Ok(Self::from_paths(root, pattern, paths))
    }

    /// Builds a catalog from already-listed paths, in the given order.
    ///
    /// A later path whose base name is already registered replaces the
    /// earlier one; the replaced path is kept in [`shadowed`](Self::shadowed).
    pub fn from_paths(
        root: impl Into<PathBuf>,
        pattern: impl Into<String>,
        paths: impl IntoIterator<Item = PathBuf>,
    ) -> Self {
        let mut catalog = Self {
            root: root.into(),
            pattern: pattern.into(),
            ..Self::default()
        };

        for path in paths {
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            if let Some(previous) = catalog.shards.insert(name.clone(), path.clone()) {
                warn!(
                    shard = %name,
                    kept = %path.display(),
                    dropped = %previous.display(),
                    "duplicate shard name; the later path wins"
                );
                catalog.shadowed.push(previous);
            }
        }

        catalog
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.shards.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.shards.get(name).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.shards.iter().map(|(n, p)| (n.as_str(), p.as_path()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.shards.keys().map(String::as_str)
    }

    /// The only shard, if exactly one is registered.
    pub fn sole(&self) -> Option<(&str, &Path)> {
        if self.shards.len() == 1 {
            self.iter().next()
        } else {
            None
        }
    }

    /// Paths that lost a base-name collision during discovery.
    pub fn shadowed(&self) -> &[PathBuf] {
        &self.shadowed
    }

    /// Resolves a shard reference from a selection list to a file.
    ///
    /// Tried in order: a registered base name; the reference as an existing
    /// path; the reference under the catalog root; the reference's own base
    /// name in the catalog.
    pub fn locate(&self, reference: &str) -> Option<PathBuf> {
        if let Some(path) = self.shards.get(reference) {
            return Some(path.clone());
        }

        let literal = Path::new(reference);
        if literal.is_file() {
            return Some(literal.to_path_buf());
        }

        let under_root = self.root.join(reference);
        if under_root.is_file() {
            return Some(under_root);
        }

        literal
            .file_name()
            .and_then(|base| self.shards.get(base.to_string_lossy().as_ref()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn discovers_matching_files_in_name_order() {
        let dir = TempDir::new().unwrap();
        for name in ["db_2.db", "db_10.db", "db_1.db", "other.db", "db_3.txt"] {
            touch(&dir.path().join(name));
        }
        fs::create_dir(dir.path().join("db_dir.db")).unwrap();

        let catalog = ShardCatalog::discover(dir.path(), "db_*.db").unwrap();
        let names: Vec<_> = catalog.names().collect();
        assert_eq!(names, vec!["db_1.db", "db_10.db", "db_2.db"]);
        assert_eq!(catalog.get("db_2.db"), Some(dir.path().join("db_2.db").as_path()));
        assert!(catalog.get("other.db").is_none());
        assert!(catalog.sole().is_none());
    }

    #[test]
    fn empty_match_is_an_empty_catalog() {
        let dir = TempDir::new().unwrap();
        let catalog = ShardCatalog::discover(dir.path(), "*.db").unwrap();
        assert!(catalog.is_empty());
        assert_eq!(catalog.pattern(), "*.db");
    }

    #[test]
    fn root_with_glob_characters_is_escaped() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("run[1]");
        touch(&root.join("db_1.db"));

        let catalog = ShardCatalog::discover(&root, "*.db").unwrap();
        assert_eq!(catalog.sole().map(|(n, _)| n), Some("db_1.db"));
    }

    #[test]
    fn bad_pattern_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            ShardCatalog::discover(dir.path(), "db_[.db"),
            Err(Error::Pattern(_))
        ));
    }

    #[test]
    fn duplicate_base_names_are_last_write_wins_and_reported() {
        let catalog = ShardCatalog::from_paths(
            "/data",
            "*/db.db",
            vec![PathBuf::from("/data/a/db.db"), PathBuf::from("/data/b/db.db")],
        );
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("db.db"), Some(Path::new("/data/b/db.db")));
        assert_eq!(catalog.shadowed(), &[PathBuf::from("/data/a/db.db")]);
    }

    #[test]
    fn locate_falls_back_to_paths_and_base_names() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("db_1.db"));
        touch(&dir.path().join("extra/db_9.db"));
        let catalog = ShardCatalog::discover(dir.path(), "db_*.db").unwrap();

        assert_eq!(catalog.locate("db_1.db"), Some(dir.path().join("db_1.db")));
        assert_eq!(
            catalog.locate("extra/db_9.db"),
            Some(dir.path().join("extra/db_9.db"))
        );
        let absolute = dir.path().join("extra/db_9.db");
        assert_eq!(catalog.locate(&absolute.to_string_lossy()), Some(absolute));
        assert_eq!(
            catalog.locate("elsewhere/db_1.db"),
            Some(dir.path().join("db_1.db"))
        );
        assert_eq!(catalog.locate("db_7.db"), None);
    }
}
