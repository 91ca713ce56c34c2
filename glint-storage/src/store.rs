// Copyright 2026 glint Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{
    collections::HashSet,
    fmt::Debug,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use glint_common::strict_assert;
use hashlink::LinkedHashMap;
use itertools::Itertools;
use parking_lot::Mutex;

use crate::error::{StoreError, StoreResult};

const TMP_SUFFIX: &str = ".tmp";

#[derive(Debug)]
struct StoreInner {
    /// Hashed key to the byte length of its file. The front is the least recently used entry.
    index: LinkedHashMap<String, u64>,
    editing: HashSet<String>,
    size: u64,
    closed: bool,
}

impl StoreInner {
    fn insert(&mut self, key: String, len: u64) {
        if let Some(old) = self.index.insert(key, len) {
            strict_assert!(self.size >= old);
            self.size = self.size.saturating_sub(old);
        }
        self.size += len;
    }

    fn remove(&mut self, key: &str) -> Option<u64> {
        let len = self.index.remove(key)?;
        strict_assert!(self.size >= len);
        self.size = self.size.saturating_sub(len);
        Some(len)
    }

    /// Unindex least recently used entries until the store fits `max_size`.
    fn evict(&mut self, max_size: u64) -> Vec<String> {
        let mut victims = vec![];
        while self.size > max_size {
            let Some((key, len)) = self.index.pop_front() else {
                break;
            };
            self.size = self.size.saturating_sub(len);
            victims.push(key);
        }
        victims
    }
}

/// A size-bounded LRU store of files in one directory.
///
/// Each entry is one file named by its hashed key. Edits are written to `<key>.tmp` and published with an atomic
/// rename, so readers never observe partial files. Only one [`DiskLruStore`] may own a directory at a time.
pub struct DiskLruStore {
    dir: PathBuf,
    max_size: u64,
    inner: Mutex<StoreInner>,
}

impl Debug for DiskLruStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("DiskLruStore")
            .field("dir", &self.dir)
            .field("max_size", &self.max_size)
            .field("size", &inner.size)
            .field("len", &inner.index.len())
            .field("closed", &inner.closed)
            .finish()
    }
}

impl DiskLruStore {
    /// Open the store in `dir`, creating the directory if needed.
    ///
    /// The index is rebuilt from the files in the directory in modification time order. Leftovers of unfinished
    /// edits are deleted.
    pub fn open(dir: impl Into<PathBuf>, max_size: u64) -> StoreResult<Arc<Self>> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let mut files = vec![];
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.ends_with(TMP_SUFFIX) {
                tracing::debug!("[disk store]: Delete unfinished edit: {name}");
                remove_file_if_exists(&entry.path())?;
                continue;
            }
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((name, metadata.len(), modified));
        }

        let mut inner = StoreInner {
            index: LinkedHashMap::new(),
            editing: HashSet::new(),
            size: 0,
            closed: false,
        };
        for (name, len, _) in files.into_iter().sorted_by_key(|(_, _, modified)| *modified) {
            inner.insert(name, len);
        }
        let victims = inner.evict(max_size);

        tracing::debug!(
            "[disk store]: Open store, dir: {dir:?}, entries: {}, size: {}, max size: {max_size}",
            inner.index.len(),
            inner.size
        );

        let store = Arc::new(Self {
            dir,
            max_size,
            inner: Mutex::new(inner),
        });
        store.delete_files(&victims);
        Ok(store)
    }

    /// Get the path of the file of `key` and mark it as the most recently used.
    pub fn get(&self, key: &str) -> StoreResult<Option<PathBuf>> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(StoreError::Closed);
        }
        Ok(inner.index.to_back(key).map(|_| self.entry_path(key)))
    }

    /// Open an editor of `key`.
    ///
    /// Returns `None` if another editor of the same key is open.
    pub fn edit(self: &Arc<Self>, key: &str) -> StoreResult<Option<Editor>> {
        {
            let mut inner = self.inner.lock();
            if inner.closed {
                return Err(StoreError::Closed);
            }
            if !inner.editing.insert(key.to_string()) {
                return Ok(None);
            }
        }

        let tmp = self.tmp_path(key);
        match File::create(&tmp) {
            Ok(file) => Ok(Some(Editor {
                store: self.clone(),
                key: key.to_string(),
                tmp,
                writer: Some(BufWriter::new(file)),
            })),
            Err(e) => {
                self.inner.lock().editing.remove(key);
                Err(e.into())
            }
        }
    }

    /// Remove the entry of `key`. Returns `true` if the entry existed.
    pub fn remove(&self, key: &str) -> StoreResult<bool> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(StoreError::Closed);
        }
        if inner.remove(key).is_none() {
            return Ok(false);
        }
        // Unlink under the lock, a commit of the same key may publish a new file right after.
        remove_file_if_exists(&self.entry_path(key))?;
        Ok(true)
    }

    /// Close the store and delete its directory with all entries.
    pub fn delete(&self) -> StoreResult<()> {
        {
            let mut inner = self.inner.lock();
            inner.closed = true;
            inner.index.clear();
            inner.size = 0;
        }
        tracing::debug!("[disk store]: Delete store, dir: {:?}", self.dir);
        match fs::remove_dir_all(&self.dir) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    /// Total bytes of all entries.
    pub fn size(&self) -> u64 {
        self.inner.lock().size
    }

    /// Budget in bytes.
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Count of entries.
    pub fn len(&self) -> usize {
        self.inner.lock().index.len()
    }

    /// Returns `true` if the store has no entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Directory of the store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    fn tmp_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}{TMP_SUFFIX}"))
    }

    /// Finish the edit of `key`. A written edit is published from `tmp` and indexed with `len` bytes.
    ///
    /// Publishing and evicting happen under the store lock, so no unlink of a concurrent remove or eviction can
    /// hit a file that is indexed afterwards.
    fn complete_edit(&self, key: &str, written: Option<(&Path, u64)>) -> StoreResult<Commit> {
        let mut inner = self.inner.lock();
        inner.editing.remove(key);
        let Some((tmp, len)) = written else {
            return Ok(Commit::default());
        };
        if inner.closed {
            remove_file_if_exists(tmp)?;
            return Err(StoreError::Closed);
        }
        if let Err(e) = fs::rename(tmp, self.entry_path(key)) {
            remove_file_if_exists(tmp)?;
            return Err(e.into());
        }
        inner.insert(key.to_string(), len);
        let victims = inner.evict(self.max_size);
        self.delete_files(&victims);
        Ok(Commit {
            len,
            evicted: victims.len(),
        })
    }

    fn delete_files(&self, keys: &[String]) {
        for key in keys {
            tracing::trace!("[disk store]: Evict entry: {key}");
            if let Err(e) = remove_file_if_exists(&self.entry_path(key)) {
                tracing::warn!("[disk store]: Failed to delete evicted entry: {key}, error: {e}");
            }
        }
    }
}

/// Outcome of [`Editor::commit`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Commit {
    /// Byte length of the published entry.
    pub len: u64,
    /// Count of entries evicted to fit the budget.
    pub evicted: usize,
}

/// An open edit of one entry.
///
/// Written bytes become visible only after [`Editor::commit`]. Dropping an editor without committing aborts the edit.
pub struct Editor {
    store: Arc<DiskLruStore>,
    key: String,
    tmp: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor").field("key", &self.key).field("tmp", &self.tmp).finish()
    }
}

impl Editor {
    /// Hashed key of the entry.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The sink of the entry content.
    pub fn sink(&mut self) -> &mut dyn Write {
        match self.writer.as_mut() {
            Some(writer) => writer,
            None => unreachable!("the editor writer is only taken by commit"),
        }
    }

    /// Publish the written bytes as the entry and evict least recently used entries if the store is over budget.
    pub fn commit(mut self) -> StoreResult<Commit> {
        let result = match self.sync() {
            Ok(len) => self.store.complete_edit(&self.key, Some((self.tmp.as_path(), len))),
            Err(e) => {
                self.abort();
                Err(e)
            }
        };
        self.tmp = PathBuf::new();
        result
    }

    /// Flush and sync the written bytes. Returns their length.
    fn sync(&mut self) -> StoreResult<u64> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => return Err(StoreError::Closed),
        };
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        let len = file.metadata()?.len();
        Ok(len)
    }

    fn abort(&mut self) {
        drop(self.writer.take());
        if let Err(e) = remove_file_if_exists(&self.tmp) {
            tracing::warn!("[disk store]: Failed to delete unfinished edit: {:?}, error: {e}", self.tmp);
        }
        // Nothing is published, this never fails.
        let _ = self.store.complete_edit(&self.key, None);
    }
}

impl Drop for Editor {
    fn drop(&mut self) {
        // An empty tmp path marks a finished edit.
        if !self.tmp.as_os_str().is_empty() {
            self.abort();
        }
    }
}

fn remove_file_if_exists(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    fn write(store: &Arc<DiskLruStore>, key: &str, data: &[u8]) {
        let mut editor = store.edit(key).unwrap().unwrap();
        editor.sink().write_all(data).unwrap();
        editor.commit().unwrap();
    }

    fn read(path: &Path) -> Vec<u8> {
        let mut buf = vec![];
        File::open(path).unwrap().read_to_end(&mut buf).unwrap();
        buf
    }

    #[test_log::test]
    fn test_commit_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskLruStore::open(dir.path(), 1024).unwrap();

        write(&store, "a", b"hello");
        let path = store.get("a").unwrap().unwrap();
        assert_eq!(read(&path), b"hello");
        assert_eq!(store.size(), 5);
        assert_eq!(store.len(), 1);
        assert!(store.get("b").unwrap().is_none());
    }

    #[test_log::test]
    fn test_abort_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskLruStore::open(dir.path(), 1024).unwrap();

        {
            let mut editor = store.edit("a").unwrap().unwrap();
            editor.sink().write_all(b"partial").unwrap();
            assert!(store.edit("a").unwrap().is_none());
        }

        assert!(store.get("a").unwrap().is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        // The key can be edited again.
        write(&store, "a", b"full");
        assert_eq!(store.size(), 4);
    }

    #[test_log::test]
    fn test_evict_lru() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskLruStore::open(dir.path(), 10).unwrap();

        write(&store, "a", b"1234");
        write(&store, "b", b"1234");
        // Promote "a".
        assert!(store.get("a").unwrap().is_some());
        write(&store, "c", b"1234");

        assert!(store.get("b").unwrap().is_none());
        assert!(!dir.path().join("b").exists());
        assert!(store.get("a").unwrap().is_some());
        assert!(store.get("c").unwrap().is_some());
        assert_eq!(store.size(), 8);
    }

    #[test_log::test]
    fn test_replace_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskLruStore::open(dir.path(), 1024).unwrap();

        write(&store, "a", b"1234");
        write(&store, "a", b"12");
        assert_eq!(store.size(), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(read(&store.get("a").unwrap().unwrap()), b"12");
    }

    #[test_log::test]
    fn test_reopen_rebuilds_index() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = DiskLruStore::open(dir.path(), 1024).unwrap();
            write(&store, "a", b"1234");
            write(&store, "b", b"123456");
        }
        fs::write(dir.path().join("c.tmp"), b"garbage").unwrap();

        let store = DiskLruStore::open(dir.path(), 1024).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.size(), 10);
        assert!(!dir.path().join("c.tmp").exists());
        assert_eq!(read(&store.get("b").unwrap().unwrap()), b"123456");
    }

    #[test_log::test]
    fn test_commit_reports_evictions() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskLruStore::open(dir.path(), 10).unwrap();

        write(&store, "a", b"1234");
        write(&store, "b", b"1234");
        let mut editor = store.edit("c").unwrap().unwrap();
        editor.sink().write_all(b"12345678").unwrap();
        assert_eq!(editor.commit().unwrap(), Commit { len: 8, evicted: 2 });
        assert_eq!(store.len(), 1);
    }

    #[test_log::test]
    fn test_remove_during_edit_keeps_new_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskLruStore::open(dir.path(), 1024).unwrap();
        write(&store, "a", b"old");

        let mut editor = store.edit("a").unwrap().unwrap();
        editor.sink().write_all(b"new").unwrap();
        assert!(store.remove("a").unwrap());
        editor.commit().unwrap();

        let path = store.get("a").unwrap().unwrap();
        assert_eq!(read(&path), b"new");
        assert_eq!(store.size(), 3);
    }

    #[test_log::test]
    fn test_concurrent_remove_and_commit() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskLruStore::open(dir.path(), 1024).unwrap();

        std::thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..500 {
                    if let Some(mut editor) = store.edit("a").unwrap() {
                        editor.sink().write_all(b"1234").unwrap();
                        editor.commit().unwrap();
                    }
                }
            });
            s.spawn(|| {
                for _ in 0..500 {
                    store.remove("a").unwrap();
                }
            });
        });

        // An indexed entry always has its file.
        if let Some(path) = store.get("a").unwrap() {
            assert_eq!(read(&path), b"1234");
        }
        let files = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(files, store.len());
    }

    #[test_log::test]
    fn test_remove_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("store");
        let store = DiskLruStore::open(&root, 1024).unwrap();

        write(&store, "a", b"1234");
        write(&store, "b", b"1234");
        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());
        assert!(!root.join("a").exists());
        assert_eq!(store.size(), 4);

        store.delete().unwrap();
        assert!(!root.exists());
        assert!(matches!(store.get("b"), Err(StoreError::Closed)));
        assert!(matches!(store.edit("b"), Err(StoreError::Closed)));
    }
}
