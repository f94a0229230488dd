use std::io::{self, Write};

use anyhow::Error;

use mxene_sieve::{IoError, PipelineError, ScreenError, SelectError, StoreError};

use crate::util::text::wrap;

#[rustfmt::skip]
pub fn print_error(err: &Error) {
    let mut stderr = io::stderr().lock();

    let _ = writeln!(stderr);
    let _ = writeln!(stderr, "   ╔══════════════════════════════════════════════════════════════╗");
    let _ = writeln!(stderr, "   ║  ✗ Error                                                     ║");
    let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");

    for line in wrap(&err.to_string(), 59) {
        let _ = writeln!(stderr, "   ║  {:<59} ║", line);
    }

    let mut source = err.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Caused by:                                                  ║");
        for line in wrap(&cause.to_string(), 57) {
            let _ = writeln!(stderr, "   ║    {:<57} ║", line);
        }
        source = cause.source();
    }

    let hints = HintCollector::collect(err);
    if !hints.is_empty() {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Hints:                                                      ║");
        for hint in hints {
            let wrapped = wrap(&hint, 55);
            if let Some((first, rest)) = wrapped.split_first() {
                let _ = writeln!(stderr, "   ║    • {:<55} ║", first);
                for line in rest {
                    let _ = writeln!(stderr, "   ║      {:<55} ║", line);
                }
            }
        }
    }

    let _ = writeln!(stderr, "   ╚══════════════════════════════════════════════════════════════╝");
    let _ = writeln!(stderr);
}

#[derive(Default)]
struct HintCollector {
    hints: Vec<String>,
}

impl HintCollector {
    fn collect(err: &Error) -> Vec<String> {
        let mut collector = Self::default();

        for cause in err.chain() {
            let typed = if let Some(e) = cause.downcast_ref::<PipelineError>() {
                collector.pipeline(e);
                true
            } else if let Some(e) = cause.downcast_ref::<SelectError>() {
                collector.select(e);
                true
            } else if let Some(e) = cause.downcast_ref::<ScreenError>() {
                collector.screen(e);
                true
            } else if let Some(e) = cause.downcast_ref::<StoreError>() {
                collector.store(e);
                true
            } else if let Some(e) = cause.downcast_ref::<IoError>() {
                collector.output(e);
                true
            } else if let Some(e) = cause.downcast_ref::<std::io::Error>() {
                collector.std_io(e);
                true
            } else {
                false
            };
            if typed {
                break;
            }
        }

        collector.hints
    }

    fn add(&mut self, hint: impl Into<String>) {
        self.hints.push(hint.into());
    }

    fn pipeline(&mut self, err: &PipelineError) {
        match err {
            PipelineError::NoShardsFound { root, pattern } => {
                self.add(format!(
                    "Nothing under '{}' matches '{}'",
                    root.display(),
                    pattern
                ));
                self.add("Point --root at the shard directory or adjust --pattern");
                self.add("The pattern is a glob: '*', '?' and '[...]' are supported");
            }
            PipelineError::Store(e) => self.store(e),
            PipelineError::Output(e) => self.output(e),
        }
    }

    fn select(&mut self, err: &SelectError) {
        match err {
            SelectError::MalformedIdentifier { row, .. } => {
                self.add(format!("Fix data row {row} of the selection table"));
                self.add("Identifiers look like 'db_1.aselmdb:42', 'db_1.aselmdb#42' or '42'");
                self.add("With --one-based, indices must start at 1");
            }
            SelectError::AmbiguousColumns { .. } => {
                self.add("Name the identifier column with --id-col");
                self.add("Or name the shard and index columns with --db-col and --idx-col");
            }
            SelectError::MissingColumn { headers, .. } => {
                self.add(format!("Available columns: {}", headers.join(", ")));
                self.add("Column names are matched exactly, then case-insensitively");
            }
            SelectError::AmbiguousShorthand { shard_count, .. } => {
                if *shard_count == 0 {
                    self.add("No shards were found; check --db-dir and --db-glob");
                } else {
                    self.add("Bare indices only work when exactly one shard is found");
                    self.add("Qualify them as 'shard:index' or narrow --db-glob");
                }
            }
        }
    }

    fn screen(&mut self, err: &ScreenError) {
        match err {
            ScreenError::RuleParse(_) => {
                self.add("The rule preset is not valid TOML or has an unknown key");
                self.add("Known keys: m, x, terminations, allowed_n, ratio_tolerance,");
                self.add("require_only_allowed, require_has_m_and_x, require_termination");
            }
            ScreenError::UnknownElement { .. } => {
                self.add("Element symbols are case-sensitive (Ti, not TI or ti)");
            }
            ScreenError::InvalidRule(_) => {
                self.add("--n values must be positive integers (e.g. --n 1 2 3)");
                self.add("--ratio-tol must be a non-negative number (0.2 = ±20%)");
            }
        }
    }

    fn store(&mut self, err: &StoreError) {
        match err {
            StoreError::Pattern(_) => {
                self.add("The shard pattern is not a valid glob");
                self.add("Check for unbalanced '[' or ']'");
            }
            StoreError::ShardOpen { .. } => {
                self.add("'.aselmdb' shards must be ASE LMDB files; other shards must be");
                self.add("ASE SQLite databases with a 'systems' table");
            }
            StoreError::Sqlite(_) | StoreError::Lmdb(_) => {
                self.add("The shard database could not be read");
            }
            StoreError::RecordNotFound { .. }
            | StoreError::CorruptRecord { .. }
            | StoreError::UnknownAtomicNumber { .. } => {
                self.add("A single record could not be read from its shard");
            }
        }
    }

    fn output(&mut self, err: &IoError) {
        match err {
            IoError::Io { source } | IoError::Output { source, .. } => self.std_io(source),
            IoError::Csv(_) => {
                self.add("The CSV could not be parsed or written");
                self.add("Check quoting and that the file is UTF-8");
            }
            IoError::MissingHeader => {
                self.add("The selection table must start with a header row");
            }
            IoError::UnknownExtension(_) | IoError::UnknownFormat(_) => {
                self.add("Use a .xyz or .extxyz output name, or pass --format");
            }
        }
    }

    fn std_io(&mut self, source: &std::io::Error) {
        use std::io::ErrorKind;

        match source.kind() {
            ErrorKind::NotFound => {
                self.add("File or directory not found");
                self.add("Check the path spelling and ensure the file exists");
            }
            ErrorKind::PermissionDenied => {
                self.add("Permission denied accessing the file");
                self.add("Check file permissions with `ls -la`");
            }
            ErrorKind::WriteZero | ErrorKind::StorageFull => {
                self.add("Failed to write data (disk full?)");
            }
            _ => {
                self.add("Check file path, permissions, and disk space");
            }
        }
    }
}
