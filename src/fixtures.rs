//! The compiled Java test fixtures.
//!
//! Fixtures live under `<root>/classes` as ordinary `.class` files. The
//! directory is resolved and indexed once, before the runtime starts, and is
//! read-only afterwards; test modules consult the index to skip cases whose
//! fixture class was not built.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Subdirectory of the fixture root holding compiled classes.
pub const CLASSES_DIR: &str = "classes";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureClasspath {
    root: PathBuf,
    classes_dir: PathBuf,
    classes: BTreeSet<String>,
}

impl FixtureClasspath {
    /// Indexes `<root>/classes`. A missing directory yields an empty index;
    /// the path is still forwarded to the JVM so the failure is visible in
    /// the tests that need it.
    pub fn resolve(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let classes_dir = root.join(CLASSES_DIR);
        let classes = if classes_dir.is_dir() {
            Self::discover_classes(&classes_dir)
        } else {
            log::warn!("fixture directory {} does not exist", classes_dir.display());
            BTreeSet::new()
        };
        log::debug!(
            "indexed {} fixture class(es) under {}",
            classes.len(),
            classes_dir.display()
        );
        Self {
            root,
            classes_dir,
            classes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The directory to put on `java.class.path`.
    pub fn classpath_dir(&self) -> &Path {
        &self.classes_dir
    }

    /// Internal names (`org/python/Version`) of every indexed class, sorted.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Accepts internal (`a/b/C`) or binary (`a.b.C`) names.
    pub fn contains_class(&self, name: &str) -> bool {
        self.classes.contains(&name.replace('.', "/"))
    }

    fn is_class_file(path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "class")
    }

    fn discover_classes(classes_dir: &Path) -> BTreeSet<String> {
        WalkDir::new(classes_dir)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    log::warn!("skipping unreadable fixture entry: {}", err);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && Self::is_class_file(entry.path()))
            .filter_map(|entry| {
                let relative = entry.path().strip_prefix(classes_dir).ok()?;
                let stem = relative.with_extension("");
                let parts: Vec<String> = stem
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                Some(parts.join("/"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn indexes_nested_class_files() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("classes/org/python");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("Version.class"), b"\xCA\xFE\xBA\xBE").unwrap();
        fs::write(pkg.join("version.properties"), b"jvm.python.version=3").unwrap();

        let fixtures = FixtureClasspath::resolve(dir.path());
        assert_eq!(fixtures.classes().collect::<Vec<_>>(), vec!["org/python/Version"]);
        assert!(fixtures.contains_class("org.python.Version"));
        assert!(!fixtures.contains_class("org.python.Missing"));
    }

    #[test]
    fn missing_directory_gives_empty_index() {
        let fixtures = FixtureClasspath::resolve("/nonexistent/jt-fixtures");
        assert!(fixtures.is_empty());
        assert_eq!(
            fixtures.classpath_dir(),
            Path::new("/nonexistent/jt-fixtures/classes")
        );
    }
}
