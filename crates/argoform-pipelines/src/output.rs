//! Persisting a resource set
//!
//! Every resource is written as a YAML document at its relative path. Existing
//! files are only replaced when overwriting is requested, and the check runs
//! for every path before anything is written.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use argoform_core::config::Manifest;
use argoform_core::resources::ResourceSet;
use argoform_scm::repo_name_from_url;

use crate::error::{PipelineError, Result};

/// Minimal filesystem used to persist generated files
pub trait Filesystem {
    /// Write `contents` at a slash-separated relative path, creating parents
    fn write(&mut self, path: &str, contents: &[u8]) -> Result<()>;

    /// Whether a file exists at a slash-separated relative path
    fn exists(&self, path: &str) -> bool;
}

/// Filesystem rooted at a directory on disk
#[derive(Debug, Clone)]
pub struct DiskFilesystem {
    root: PathBuf,
}

impl DiskFilesystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of a relative path under the root
    ///
    /// `.` and `..` segments are refused so nothing lands outside the root.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let mut full = self.root.clone();
        for part in path.split('/').filter(|part| !part.is_empty()) {
            if part == "." || part == ".." || part.contains('\\') {
                return Err(PipelineError::InvalidOutputPath {
                    path: path.to_string(),
                });
            }
            full.push(part);
        }
        Ok(full)
    }
}

impl Filesystem for DiskFilesystem {
    fn write(&mut self, path: &str, contents: &[u8]) -> Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&full, contents)?;
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_ok_and(|full| full.exists())
    }
}

/// In-memory filesystem for tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct MemoryFilesystem {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    /// Written paths in sorted order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

impl Filesystem for MemoryFilesystem {
    fn write(&mut self, path: &str, contents: &[u8]) -> Result<()> {
        self.files.insert(path.to_string(), contents.to_vec());
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }
}

/// Directory a manifest is written to when none is given, named after the
/// GitOps repository
pub fn default_output_dir(manifest: &Manifest) -> PathBuf {
    PathBuf::from(repo_name_from_url(&manifest.gitops_url))
}

/// Write every resource as YAML, returning the number of files written
///
/// Without `overwrite`, the first path that already exists fails the call and
/// nothing is written.
pub fn write_resources(fs: &mut dyn Filesystem, resources: &ResourceSet, overwrite: bool) -> Result<usize> {
    if !overwrite {
        if let Some(path) = resources.paths().find(|path| fs.exists(path)) {
            return Err(PipelineError::OutputExists {
                path: path.to_string(),
            });
        }
    }

    for (path, resource) in resources.iter() {
        let yaml = resource.to_yaml()?;
        fs.write(path, yaml.as_bytes())?;
        tracing::debug!(path, kind = resource.kind(), "wrote resource");
    }
    tracing::info!(files = resources.len(), "wrote resources");
    Ok(resources.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use argoform_core::resources::Kustomization;

    fn resources() -> ResourceSet {
        let mut set = ResourceSet::new();
        set.insert("config/argocd/kustomization.yaml", Kustomization::new(vec!["a.yaml".to_string()]))
            .unwrap();
        set.insert("environments/dev/env/overlays/kustomization.yaml", Kustomization::new(vec!["../base".to_string()]))
            .unwrap();
        set
    }

    #[test]
    fn test_write_to_memory() {
        let mut fs = MemoryFilesystem::new();
        let written = write_resources(&mut fs, &resources(), false).unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            fs.paths().collect::<Vec<_>>(),
            vec![
                "config/argocd/kustomization.yaml",
                "environments/dev/env/overlays/kustomization.yaml",
            ]
        );
        let yaml = std::str::from_utf8(fs.get("config/argocd/kustomization.yaml").unwrap()).unwrap();
        assert!(yaml.contains("kind: Kustomization"));
        assert!(yaml.contains("- a.yaml"));
    }

    #[test]
    fn test_existing_file_blocks_every_write() {
        let mut fs = MemoryFilesystem::new();
        fs.write("environments/dev/env/overlays/kustomization.yaml", b"old").unwrap();

        let err = write_resources(&mut fs, &resources(), false).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::OutputExists { ref path } if path == "environments/dev/env/overlays/kustomization.yaml"
        ));
        assert!(!fs.exists("config/argocd/kustomization.yaml"));
        assert_eq!(fs.get("environments/dev/env/overlays/kustomization.yaml"), Some(&b"old"[..]));
    }

    #[test]
    fn test_overwrite() {
        let mut fs = MemoryFilesystem::new();
        fs.write("config/argocd/kustomization.yaml", b"old").unwrap();

        write_resources(&mut fs, &resources(), true).unwrap();
        assert_ne!(fs.get("config/argocd/kustomization.yaml"), Some(&b"old"[..]));
    }

    #[test]
    fn test_disk_refuses_paths_leaving_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("out");
        let mut fs = DiskFilesystem::new(&root);

        for path in ["../escaped.yaml", "config/../../escaped.yaml", "./config.yaml", "a\\..\\b.yaml"] {
            let err = fs.write(path, b"x").unwrap_err();
            assert!(matches!(err, PipelineError::InvalidOutputPath { .. }), "{}", path);
            assert!(!fs.exists(path));
        }
        assert!(!dir.path().join("escaped.yaml").exists());
        assert!(!root.exists());
    }

    #[test]
    fn test_write_resources_stops_at_escaping_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs = DiskFilesystem::new(dir.path().join("a").join("out"));
        let mut set = ResourceSet::new();
        set.insert("../../escaped/kustomization.yaml", Kustomization::default())
            .unwrap();

        let err = write_resources(&mut fs, &set, false).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidOutputPath { ref path } if path == "../../escaped/kustomization.yaml"));
        assert!(!dir.path().join("escaped").exists());
    }

    #[test]
    fn test_default_output_dir() {
        let manifest = Manifest::bootstrap("", "https://github.com/org/team-gitops.git");
        assert_eq!(default_output_dir(&manifest), PathBuf::from("team-gitops"));

        let manifest = Manifest::bootstrap("", "");
        assert_eq!(default_output_dir(&manifest), PathBuf::from("gitops"));
    }

    #[test]
    fn test_write_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs = DiskFilesystem::new(dir.path());

        write_resources(&mut fs, &resources(), false).unwrap();

        let on_disk = dir
            .path()
            .join("environments")
            .join("dev")
            .join("env")
            .join("overlays")
            .join("kustomization.yaml");
        let content = std::fs::read_to_string(on_disk).unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&content).unwrap();
        assert_eq!(value["resources"][0].as_str(), Some("../base"));

        assert!(fs.exists("config/argocd/kustomization.yaml"));
        let err = write_resources(&mut fs, &resources(), false).unwrap_err();
        assert!(matches!(err, PipelineError::OutputExists { .. }));
    }
}
