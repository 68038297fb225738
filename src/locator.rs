//! Finding a JVM shared library on the host.
//!
//! Probe order:
//! 1. an explicit path (CLI `--jvm`, `JT_JVM_PATH`, or config), which may be
//!    the library itself or a Java home; when given, nothing else is tried
//! 2. `JAVA_HOME`
//! 3. the home of the first `java` executable on `PATH`
//! 4. every installation under the platform's default install roots,
//!    newest-looking directory name first
//!
//! Inside a Java home the well-known relative locations are tried first and
//! a bounded directory walk is the fallback. Probing is read-only.

use crate::errors::LocationError;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// How deep the fallback walk descends below a Java home.
const WALK_DEPTH: usize = 6;

#[derive(Debug, Clone, Default)]
pub struct JvmLocator {
    explicit: Option<PathBuf>,
    java_home: Option<PathBuf>,
    path_var: Option<OsString>,
    search_roots: Vec<PathBuf>,
    library_name: Option<String>,
}

impl JvmLocator {
    /// A locator with no hints at all; see [`JvmLocator::from_env`].
    pub fn new() -> Self {
        Self::default()
    }

    /// A locator seeded from `JAVA_HOME`, `PATH` and the platform roots.
    pub fn from_env() -> Self {
        Self {
            explicit: None,
            java_home: env::var_os("JAVA_HOME")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            path_var: env::var_os("PATH"),
            search_roots: default_search_roots(),
            library_name: None,
        }
    }

    pub fn with_explicit(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    pub fn with_java_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.java_home = Some(home.into());
        self
    }

    pub fn with_path_var(mut self, path_var: impl Into<OsString>) -> Self {
        self.path_var = Some(path_var.into());
        self
    }

    pub fn with_search_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.search_roots = roots;
        self
    }

    pub fn with_library_name(mut self, name: impl Into<String>) -> Self {
        self.library_name = Some(name.into());
        self
    }

    /// `libjvm.so`, `libjvm.dylib` or `jvm.dll`, unless overridden.
    pub fn library_name(&self) -> String {
        self.library_name
            .clone()
            .unwrap_or_else(|| format!("{}jvm{}", env::consts::DLL_PREFIX, env::consts::DLL_SUFFIX))
    }

    /// Returns the first JVM library found.
    ///
    /// # Errors
    /// A [`LocationError`] listing every probed location when nothing matches.
    pub fn locate(&self) -> Result<PathBuf, LocationError> {
        let library = self.library_name();
        let mut probed = Vec::new();

        if let Some(explicit) = &self.explicit {
            if explicit.is_file() {
                log::debug!("using explicit JVM library {}", explicit.display());
                return Ok(explicit.clone());
            }
            if explicit.is_dir() {
                if let Some(found) = self.search_home(explicit, &library, &mut probed) {
                    return Ok(found);
                }
            } else {
                probed.push(explicit.clone());
            }
            return Err(LocationError { library, probed });
        }

        for home in self.candidate_homes() {
            if let Some(found) = self.search_home(&home, &library, &mut probed) {
                log::debug!("found JVM library {}", found.display());
                return Ok(found);
            }
        }
        Err(LocationError { library, probed })
    }

    /// Java homes in probe order, without duplicates.
    pub fn candidate_homes(&self) -> Vec<PathBuf> {
        let mut homes: Vec<PathBuf> = Vec::new();
        let mut push = |home: PathBuf| {
            if !homes.contains(&home) {
                homes.push(home);
            }
        };
        if let Some(home) = &self.java_home {
            push(home.clone());
        }
        if let Some(home) = self.home_from_path() {
            push(home);
        }
        for root in &self.search_roots {
            for home in installations_under(root) {
                push(home);
            }
        }
        homes
    }

    fn home_from_path(&self) -> Option<PathBuf> {
        let path_var = self.path_var.as_ref()?;
        let exe = format!("java{}", env::consts::EXE_SUFFIX);
        env::split_paths(path_var)
            .map(|dir| dir.join(&exe))
            .find(|candidate| candidate.is_file())
            .and_then(|java| {
                let resolved = fs::canonicalize(&java).unwrap_or(java);
                // <home>/bin/java
                resolved.parent()?.parent().map(Path::to_path_buf)
            })
    }

    fn search_home(&self, home: &Path, library: &str, probed: &mut Vec<PathBuf>) -> Option<PathBuf> {
        for relative in relative_library_dirs() {
            let candidate = home.join(relative).join(library);
            if candidate.is_file() {
                return Some(candidate);
            }
            probed.push(candidate);
        }
        if !home.is_dir() {
            return None;
        }
        let mut found: Vec<PathBuf> = WalkDir::new(home)
            .max_depth(WALK_DEPTH)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && e.file_name() == library)
            .map(|e| e.path().to_path_buf())
            .collect();
        // server VMs before client VMs, then shortest path
        found.sort_by_key(|p| {
            let server = p.components().any(|c| c.as_os_str() == "server");
            (!server, p.components().count(), p.clone())
        });
        if found.is_empty() {
            probed.push(home.join("**").join(library));
        }
        found.into_iter().next()
    }
}

fn relative_library_dirs() -> Vec<String> {
    let arch = match env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "i386",
        other => other,
    };
    vec![
        "lib/server".to_string(),
        "lib/client".to_string(),
        "lib".to_string(),
        format!("lib/{}/server", arch),
        "jre/lib/server".to_string(),
        format!("jre/lib/{}/server", arch),
        format!("jre/lib/{}/client", arch),
        "bin/server".to_string(),
        "bin/client".to_string(),
        "jre/bin/server".to_string(),
        "jre/bin/client".to_string(),
    ]
}

/// Installation directories directly below `root`, newest-looking first.
/// macOS bundles resolve to their `Contents/Home`.
fn installations_under(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(root) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    dirs.reverse();
    dirs.into_iter()
        .map(|dir| {
            let bundle_home = dir.join("Contents").join("Home");
            if bundle_home.is_dir() {
                bundle_home
            } else {
                dir
            }
        })
        .collect()
}

fn default_search_roots() -> Vec<PathBuf> {
    let roots: &[&str] = if cfg!(target_os = "macos") {
        &[
            "/Library/Java/JavaVirtualMachines",
            "/System/Library/Java/JavaVirtualMachines",
        ]
    } else if cfg!(windows) {
        &["C:\\Program Files\\Java", "C:\\Program Files (x86)\\Java"]
    } else {
        &["/usr/lib/jvm", "/usr/lib64/jvm", "/usr/java", "/opt/java"]
    };
    roots.iter().map(PathBuf::from).collect()
}
