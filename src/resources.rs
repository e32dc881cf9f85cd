//! Resource loading
//!
//! Files are looked up inside the bundled zip archive first and then on the
//! local filesystem below the static root. Filesystem lookups cannot leave
//! the static root.

use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("no archive configured")]
    NoArchive,
    #[error("couldn't read '{path}' from archive {archive}: {source}")]
    Archive {
        path: String,
        archive: String,
        source: zip::result::ZipError,
    },
    #[error("couldn't open archive {archive}: {source}")]
    ArchiveIo {
        archive: String,
        source: std::io::Error,
    },
    #[error("couldn't read '{path}' from filesystem: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("'{0}' resolves outside the static root")]
    Traversal(String),
    #[error("archive lookup failed ({archive}), so did the filesystem lookup ({filesystem})")]
    NotFound {
        archive: Box<ResourceError>,
        filesystem: Box<ResourceError>,
    },
    #[error("'{0}' is not valid UTF-8")]
    Utf8(String),
    #[error("resource task failed: {0}")]
    Task(String),
}

/// A loaded file and the name it was found under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Relative path after index-file resolution
    pub name: String,
    pub data: Vec<u8>,
}

impl Resource {
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.name).extension().and_then(|e| e.to_str())
    }
}

/// Archive-then-filesystem file loader
#[derive(Debug, Clone)]
pub struct ResourceLoader {
    archive: Option<PathBuf>,
    static_root: PathBuf,
    index_files: Vec<String>,
}

impl ResourceLoader {
    pub fn new(
        archive: Option<PathBuf>,
        static_root: impl Into<PathBuf>,
        index_files: Vec<String>,
    ) -> Self {
        Self {
            archive,
            static_root: static_root.into(),
            index_files,
        }
    }

    pub fn archive(&self) -> Option<&Path> {
        self.archive.as_deref()
    }

    pub fn static_root(&self) -> &Path {
        &self.static_root
    }

    /// Load `path` from the archive, falling back to the filesystem
    pub async fn load(&self, path: &str) -> Result<Resource, ResourceError> {
        let archive_err = match self.load_from_archive(path).await {
            Ok(resource) => return Ok(resource),
            Err(e) => e,
        };
        tracing::debug!(path, error = %archive_err, "archive lookup failed, trying filesystem");
        match self.load_from_disk(path).await {
            Ok(resource) => Ok(resource),
            Err(fs_err) => Err(ResourceError::NotFound {
                archive: Box::new(archive_err),
                filesystem: Box::new(fs_err),
            }),
        }
    }

    /// Load `path` as UTF-8 text
    pub async fn load_text(&self, path: &str) -> Result<String, ResourceError> {
        let resource = self.load(path).await?;
        String::from_utf8(resource.data).map_err(|_| ResourceError::Utf8(resource.name))
    }

    pub async fn load_from_archive(&self, path: &str) -> Result<Resource, ResourceError> {
        let archive = self.archive.clone().ok_or(ResourceError::NoArchive)?;
        let candidates = self.candidates(path);
        tokio::task::spawn_blocking(move || read_from_archive(&archive, &candidates))
            .await
            .map_err(|e| ResourceError::Task(e.to_string()))?
    }

    pub async fn load_from_disk(&self, path: &str) -> Result<Resource, ResourceError> {
        let relative = clean_relative(path);
        let mut file_path = self.static_root.join(&relative);
        let mut name = relative.clone();

        // Directories (and the root) resolve to their first existing index file
        if relative.is_empty() || relative.ends_with('/') || file_path.is_dir() {
            if let Some(index) = self
                .index_files
                .iter()
                .find(|index| file_path.join(index).is_file())
            {
                file_path = file_path.join(index);
                name = join_name(&relative, index);
            }
        }

        let root = self.static_root.canonicalize().map_err(|source| ResourceError::Io {
            path: self.static_root.display().to_string(),
            source,
        })?;
        let canonical = file_path.canonicalize().map_err(|source| ResourceError::Io {
            path: name.clone(),
            source,
        })?;
        if !canonical.starts_with(&root) {
            tracing::warn!(path, resolved = %canonical.display(), "path traversal attempt blocked");
            return Err(ResourceError::Traversal(path.to_string()));
        }

        let data = fs::read(&canonical).await.map_err(|source| ResourceError::Io {
            path: name.clone(),
            source,
        })?;
        Ok(Resource { name, data })
    }

    /// Every file name inside the archive
    pub async fn list_archive(&self) -> Result<Vec<String>, ResourceError> {
        let archive = self.archive.clone().ok_or(ResourceError::NoArchive)?;
        tokio::task::spawn_blocking(move || {
            let mut zip = open_archive(&archive)?;
            let names = (0..zip.len())
                .filter_map(|i| zip.by_index(i).ok().map(|f| f.name().to_string()))
                .filter(|name| !name.ends_with('/'))
                .collect();
            Ok(names)
        })
        .await
        .map_err(|e| ResourceError::Task(e.to_string()))?
    }

    /// Every file below the static root, as sorted relative paths
    pub async fn list_filesystem(&self) -> Result<Vec<String>, ResourceError> {
        let root = self.static_root.clone();
        tokio::task::spawn_blocking(move || {
            let mut files = Vec::new();
            walk(&root, &root, &mut files).map_err(|source| ResourceError::Io {
                path: root.display().to_string(),
                source,
            })?;
            files.sort();
            Ok(files)
        })
        .await
        .map_err(|e| ResourceError::Task(e.to_string()))?
    }

    /// `path` itself, plus index files when it names a directory
    fn candidates(&self, path: &str) -> Vec<String> {
        let relative = clean_relative(path);
        let mut candidates = Vec::new();
        if !relative.is_empty() && !relative.ends_with('/') {
            candidates.push(relative.clone());
        }
        if relative.is_empty() || relative.ends_with('/') {
            candidates.extend(
                self.index_files
                    .iter()
                    .map(|index| join_name(&relative, index)),
            );
        }
        candidates
    }
}

/// Remove leading slashes and any `..` or `.` components
fn clean_relative(path: &str) -> String {
    let trailing = path.ends_with('/');
    let parts: Vec<&str> = Path::new(path.trim_start_matches('/'))
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    let mut cleaned = parts.join("/");
    if trailing && !cleaned.is_empty() {
        cleaned.push('/');
    }
    cleaned
}

fn join_name(dir: &str, file: &str) -> String {
    if dir.is_empty() {
        file.to_string()
    } else if dir.ends_with('/') {
        format!("{dir}{file}")
    } else {
        format!("{dir}/{file}")
    }
}

fn open_archive(archive: &Path) -> Result<zip::ZipArchive<File>, ResourceError> {
    let file = File::open(archive).map_err(|source| ResourceError::ArchiveIo {
        archive: archive.display().to_string(),
        source,
    })?;
    zip::ZipArchive::new(file).map_err(|source| ResourceError::Archive {
        path: String::new(),
        archive: archive.display().to_string(),
        source,
    })
}

fn read_from_archive(archive: &Path, candidates: &[String]) -> Result<Resource, ResourceError> {
    let mut zip = open_archive(archive)?;
    let mut last_err = None;
    for name in candidates {
        match zip.by_name(name) {
            Ok(mut entry) => {
                let mut data = Vec::new();
                entry
                    .read_to_end(&mut data)
                    .map_err(|source| ResourceError::Archive {
                        path: name.clone(),
                        archive: archive.display().to_string(),
                        source: source.into(),
                    })?;
                return Ok(Resource {
                    name: name.clone(),
                    data,
                });
            }
            Err(source) => {
                last_err = Some(ResourceError::Archive {
                    path: name.clone(),
                    archive: archive.display().to_string(),
                    source,
                });
            }
        }
    }
    Err(last_err.unwrap_or(ResourceError::Archive {
        path: String::new(),
        archive: archive.display().to_string(),
        source: zip::result::ZipError::FileNotFound,
    }))
}

fn walk(root: &Path, dir: &Path, files: &mut Vec<String>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let path = entry.path();
        // Symlinked directories are neither listed nor descended into
        let linked_dir = file_type.is_symlink() && path.is_dir();
        if file_type.is_dir() {
            walk(root, &path, files)?;
        } else if linked_dir {
            tracing::debug!(path = %path.display(), "skipping linked directory");
        } else if let Ok(relative) = path.strip_prefix(root) {
            files.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(())
}
