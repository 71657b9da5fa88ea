//! JSON side-file storage for annotations
//!
//! Every backing file is a complete snapshot: writers read the whole file,
//! change one page's entry and rewrite the whole file. Writes go to a sibling
//! temp file that is then renamed over the original.
//!
//! Read-modify-write cycles on the same file are serialized within this
//! process by a per-path lock. Nothing coordinates separate processes, so a
//! directory must only be written by one server at a time; a second writer
//! process can silently lose updates.

use std::collections::HashMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;

use super::types::{AnnotationKind, PageIndex, PageMap};
use crate::documents::DocumentName;

/// Shared vote tally file, keyed by document name
pub const VOTES_FILE: &str = "pdf_votes.json";

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed annotation file {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize annotations: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A value plus the warning raised while recovering from a malformed file
#[derive(Debug, Clone, PartialEq)]
pub struct Recovered<T> {
    pub value: T,
    pub warning: Option<String>,
}

impl<T> Recovered<T> {
    pub fn clean(value: T) -> Self {
        Self { value, warning: None }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Recovered<U> {
        Recovered {
            value: f(self.value),
            warning: self.warning,
        }
    }
}

/// Registry of per-path async locks
#[derive(Clone, Default)]
struct FileLocks {
    inner: Arc<parking_lot::Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>>,
}

impl FileLocks {
    fn lock_for(&self, path: &Path) -> Arc<AsyncMutex<()>> {
        let mut locks = self.inner.lock();
        locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

/// One JSON backing file holding a complete snapshot of type `T`
pub struct BackingFile<T> {
    path: PathBuf,
    lock: Arc<AsyncMutex<()>>,
    _value: std::marker::PhantomData<fn() -> T>,
}

impl<T> BackingFile<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Read the file. A missing file is the default (empty) value.
    pub async fn load(&self) -> Result<T, StoreError> {
        read_json(&self.path).await
    }

    /// Read the file, treating a malformed one as empty and returning a warning
    pub async fn load_lenient(&self) -> Result<Recovered<T>, StoreError> {
        match self.load().await {
            Ok(value) => Ok(Recovered::clean(value)),
            Err(StoreError::Malformed { path, source }) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %source,
                    "Malformed annotation file, treating as empty"
                );
                Ok(Recovered {
                    value: T::default(),
                    warning: Some(format!(
                        "Stored annotations in {} could not be read and were ignored",
                        file_name(&path)
                    )),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Overwrite the file with a complete snapshot
    pub async fn save(&self, value: &T) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        write_json(&self.path, value).await
    }

    /// Run one read-modify-write cycle under this file's lock.
    ///
    /// If `f` returns an error nothing is written and a malformed file stays
    /// where it is. Otherwise a malformed file is moved aside to
    /// `<file>.malformed` (or `<file>.malformed.<n>` if that is taken) and the
    /// cycle's result replaces it.
    pub async fn update<R, E, F>(&self, f: F) -> Result<Recovered<R>, E>
    where
        F: FnOnce(&mut T) -> Result<R, E>,
        E: From<StoreError>,
    {
        let _guard = self.lock.lock().await;

        let (mut value, malformed) = match read_json::<T>(&self.path).await {
            Ok(value) => (value, None),
            Err(StoreError::Malformed { source, .. }) => (T::default(), Some(source)),
            Err(e) => return Err(e.into()),
        };

        let result = f(&mut value)?;

        let warning = match malformed {
            Some(source) => Some(self.quarantine(&source).await?),
            None => None,
        };
        write_json(&self.path, &value).await?;

        Ok(Recovered {
            value: result,
            warning,
        })
    }

    /// Move a malformed file aside without replacing an earlier backup
    async fn quarantine(&self, source: &serde_json::Error) -> Result<String, StoreError> {
        let path = &self.path;
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };

        let mut target = sibling(path, ".malformed");
        let mut attempt = 1;
        while tokio::fs::try_exists(&target).await.map_err(io_err)? {
            target = sibling(path, &format!(".malformed.{}", attempt));
            attempt += 1;
        }

        tracing::warn!(
            path = %path.display(),
            quarantine = %target.display(),
            error = %source,
            "Malformed annotation file, moving aside and starting empty"
        );
        tokio::fs::rename(path, &target).await.map_err(io_err)?;

        Ok(format!(
            "Stored annotations in {} could not be read; the file was moved to {}",
            file_name(path),
            file_name(&target)
        ))
    }
}

/// File-backed annotation store rooted at the annotations directory
#[derive(Clone)]
pub struct AnnotationStore {
    root: PathBuf,
    locks: FileLocks,
}

impl AnnotationStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: FileLocks::default(),
        }
    }

    /// Backing file for one kind of one document: `<document>_<suffix>.json`
    pub fn file<K: AnnotationKind>(&self, document: &DocumentName) -> BackingFile<PageMap<K::Page>> {
        self.backing_file(format!("{}_{}.json", document, K::SUFFIX))
    }

    /// Backing file by name within the annotations directory
    pub fn backing_file<T>(&self, name: impl AsRef<Path>) -> BackingFile<T> {
        let path = self.root.join(name);
        BackingFile {
            lock: self.locks.lock_for(&path),
            path,
            _value: std::marker::PhantomData,
        }
    }

    /// Load the full page mapping of one kind for a document
    pub async fn load<K: AnnotationKind>(
        &self,
        document: &DocumentName,
    ) -> Result<PageMap<K::Page>, StoreError> {
        self.file::<K>(document).load().await
    }

    /// Like [`load`](Self::load), recovering from a malformed file
    pub async fn load_lenient<K: AnnotationKind>(
        &self,
        document: &DocumentName,
    ) -> Result<Recovered<PageMap<K::Page>>, StoreError> {
        self.file::<K>(document).load_lenient().await
    }

    /// Replace the full page mapping of one kind for a document
    pub async fn save<K: AnnotationKind>(
        &self,
        document: &DocumentName,
        pages: &PageMap<K::Page>,
    ) -> Result<(), StoreError> {
        tracing::debug!(
            document = %document,
            kind = K::SUFFIX,
            pages = pages.len(),
            "Saving annotations"
        );
        self.file::<K>(document).save(pages).await
    }

    /// Value for one page, or the kind's empty default
    pub async fn get_page<K: AnnotationKind>(
        &self,
        document: &DocumentName,
        page: PageIndex,
    ) -> Result<K::Page, StoreError> {
        let mut pages = self.load::<K>(document).await?;
        Ok(pages.remove(&page).unwrap_or_default())
    }

    /// Like [`get_page`](Self::get_page), recovering from a malformed file
    pub async fn get_page_lenient<K: AnnotationKind>(
        &self,
        document: &DocumentName,
        page: PageIndex,
    ) -> Result<Recovered<K::Page>, StoreError> {
        let pages = self.load_lenient::<K>(document).await?;
        Ok(pages.map(|mut pages| pages.remove(&page).unwrap_or_default()))
    }

    /// Read-modify-write one kind's full mapping for a document
    pub async fn update<K, R, E, F>(
        &self,
        document: &DocumentName,
        f: F,
    ) -> Result<Recovered<R>, E>
    where
        K: AnnotationKind,
        F: FnOnce(&mut PageMap<K::Page>) -> Result<R, E>,
        E: From<StoreError>,
    {
        self.file::<K>(document).update(f).await
    }
}

async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Malformed {
            path: path.to_path_buf(),
            source,
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(T::default()),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let bytes = serde_json::to_vec(value)?;
    let tmp = sibling(path, ".tmp");
    tokio::fs::write(&tmp, &bytes).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;

    Ok(())
}

/// `path` with `suffix` appended to its file name
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::types::{Comment, Comments, Highlight, Highlights, Notes};
    use tempfile::TempDir;

    #[derive(Debug)]
    enum RejectError {
        Rejected,
        Store(StoreError),
    }

    impl From<StoreError> for RejectError {
        fn from(err: StoreError) -> Self {
            RejectError::Store(err)
        }
    }

    fn doc(name: &str) -> DocumentName {
        DocumentName::parse(name).unwrap()
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = AnnotationStore::new(temp_dir.path());

        let pages = store.load::<Highlights>(&doc("x.pdf")).await.unwrap();
        assert!(pages.is_empty());

        let note = store.get_page::<Notes>(&doc("x.pdf"), 4).await.unwrap();
        assert_eq!(note, "");
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = AnnotationStore::new(temp_dir.path().join("nested"));
        let document = doc("report.pdf");

        let mut pages = PageMap::new();
        pages.insert(0, vec![Comment::new("ana", "first").unwrap()]);
        pages.insert(7, vec![]);

        store.save::<Comments>(&document, &pages).await.unwrap();
        let loaded = store.load::<Comments>(&document).await.unwrap();
        assert_eq!(loaded, pages);

        let path = temp_dir.path().join("nested").join("report.pdf_comments.json");
        assert!(path.exists());
        assert!(!sibling(&path, ".tmp").exists());
    }

    #[tokio::test]
    async fn test_file_layout() {
        let temp_dir = TempDir::new().unwrap();
        let store = AnnotationStore::new(temp_dir.path());
        let document = doc("x.pdf");

        let mut pages = PageMap::new();
        pages.insert(0, vec![Highlight::new(5, 10).unwrap()]);
        store.save::<Highlights>(&document, &pages).await.unwrap();

        let raw = std::fs::read_to_string(temp_dir.path().join("x.pdf_highlights.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json, serde_json::json!({ "0": [{ "range": [5, 10] }] }));
    }

    #[tokio::test]
    async fn test_malformed_file_strict_and_lenient() {
        let temp_dir = TempDir::new().unwrap();
        let store = AnnotationStore::new(temp_dir.path());
        let document = doc("x.pdf");
        std::fs::write(temp_dir.path().join("x.pdf_notes.json"), b"{not json").unwrap();

        let strict = store.load::<Notes>(&document).await;
        assert!(matches!(strict, Err(StoreError::Malformed { .. })));

        let lenient = store.get_page_lenient::<Notes>(&document, 0).await.unwrap();
        assert_eq!(lenient.value, "");
        assert!(lenient.warning.is_some());
    }

    #[tokio::test]
    async fn test_wrong_shape_is_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let store = AnnotationStore::new(temp_dir.path());
        std::fs::write(
            temp_dir.path().join("x.pdf_highlights.json"),
            br#"{"0": "not a list"}"#,
        )
        .unwrap();

        let result = store.load::<Highlights>(&doc("x.pdf")).await;
        assert!(matches!(result, Err(StoreError::Malformed { .. })));
    }

    #[tokio::test]
    async fn test_update_quarantines_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = AnnotationStore::new(temp_dir.path());
        let document = doc("x.pdf");
        let path = temp_dir.path().join("x.pdf_notes.json");
        std::fs::write(&path, b"[]]").unwrap();

        let updated = store
            .update::<Notes, _, StoreError, _>(&document, |pages| {
                pages.insert(1, "fresh".to_string());
                Ok(())
            })
            .await
            .unwrap();

        assert!(updated.warning.is_some());
        assert_eq!(
            std::fs::read(sibling(&path, ".malformed")).unwrap(),
            b"[]]".to_vec()
        );
        assert_eq!(store.get_page::<Notes>(&document, 1).await.unwrap(), "fresh");
    }

    #[tokio::test]
    async fn test_rejected_update_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = AnnotationStore::new(temp_dir.path());
        let document = doc("x.pdf");

        let result = store
            .update::<Highlights, (), RejectError, _>(&document, |pages| {
                pages.entry(0).or_default().push(Highlight::new(1, 2).unwrap());
                Err(RejectError::Rejected)
            })
            .await;

        assert!(matches!(result, Err(RejectError::Rejected)));
        assert!(!temp_dir.path().join("x.pdf_highlights.json").exists());
    }

    #[tokio::test]
    async fn test_rejected_update_leaves_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = AnnotationStore::new(temp_dir.path());
        let document = doc("x.pdf");
        let path = temp_dir.path().join("x.pdf_comments.json");
        std::fs::write(&path, b"garbage").unwrap();

        let result = store
            .update::<Comments, (), RejectError, _>(&document, |_| Err(RejectError::Rejected))
            .await;

        assert!(matches!(result, Err(RejectError::Rejected)));
        assert_eq!(std::fs::read(&path).unwrap(), b"garbage".to_vec());
        assert!(!sibling(&path, ".malformed").exists());

        let later = store.get_page_lenient::<Comments>(&document, 0).await.unwrap();
        assert!(later.warning.is_some());
    }

    #[tokio::test]
    async fn test_repeated_quarantine_keeps_earlier_backups() {
        let temp_dir = TempDir::new().unwrap();
        let store = AnnotationStore::new(temp_dir.path());
        let document = doc("x.pdf");
        let path = temp_dir.path().join("x.pdf_notes.json");

        for garbage in [&b"first"[..], &b"second"[..], &b"third"[..]] {
            std::fs::write(&path, garbage).unwrap();
            let updated = store
                .update::<Notes, _, StoreError, _>(&document, |pages| {
                    pages.insert(0, "ok".to_string());
                    Ok(())
                })
                .await
                .unwrap();
            assert!(updated.warning.is_some());
        }

        assert_eq!(std::fs::read(sibling(&path, ".malformed")).unwrap(), b"first".to_vec());
        assert_eq!(std::fs::read(sibling(&path, ".malformed.1")).unwrap(), b"second".to_vec());
        assert_eq!(std::fs::read(sibling(&path, ".malformed.2")).unwrap(), b"third".to_vec());
        assert_eq!(store.get_page::<Notes>(&document, 0).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_serialized() {
        let temp_dir = TempDir::new().unwrap();
        let store = AnnotationStore::new(temp_dir.path());
        let document = doc("x.pdf");

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            let document = document.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update::<Highlights, _, StoreError, _>(&document, |pages| {
                        pages.entry(0).or_default().push(Highlight::new(i, i + 1).unwrap());
                        Ok(())
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let highlights = store.get_page::<Highlights>(&document, 0).await.unwrap();
        assert_eq!(highlights.len(), 20);
    }
}
