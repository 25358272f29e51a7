use std::collections::HashSet;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

use qlens_common::error::{QlensError, QlensResult};

/// A JSON array persisted in one file. Every read-modify-write runs under
/// the same async lock, and writes go through a temp file + rename so a
/// crash never leaves a half-written array behind.
pub struct JsonFile<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> QlensResult<Vec<T>> {
        let _guard = self.lock.lock().await;
        load(&self.path).await
    }

    /// Load, apply `f`, and write the result back.
    pub async fn update<R, F>(&self, f: F) -> QlensResult<R>
    where
        F: FnOnce(&mut Vec<T>) -> R,
    {
        let _guard = self.lock.lock().await;
        let mut items = load(&self.path).await?;
        let result = f(&mut items);
        store(self.path.clone(), items).await?;
        Ok(result)
    }
}

async fn load<T: DeserializeOwned>(path: &Path) -> QlensResult<Vec<T>> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
            QlensError::Database(format!("corrupt data file {}: {e}", path.display()))
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(QlensError::Database(format!(
            "failed to read {}: {e}",
            path.display()
        ))),
    }
}

async fn store<T: Serialize + Send + 'static>(path: PathBuf, items: Vec<T>) -> QlensResult<()> {
    tokio::task::spawn_blocking(move || -> QlensResult<()> {
        let bytes = serde_json::to_vec_pretty(&items)
            .map_err(|e| QlensError::Internal(format!("failed to encode data file: {e}")))?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(|e| io_error(&path, e))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| io_error(&path, e))?;
        tmp.write_all(&bytes).map_err(|e| io_error(&path, e))?;
        tmp.persist(&path).map_err(|e| io_error(&path, e.error))?;
        Ok(())
    })
    .await
    .map_err(|e| QlensError::Internal(format!("file writer task failed: {e}")))?
}

fn io_error(path: &Path, e: std::io::Error) -> QlensError {
    QlensError::Database(format!("failed to write {}: {e}", path.display()))
}

/// Keep only the `keep` newest items of one project, leaving other projects
/// untouched. Equal timestamps favour the later-inserted item. Returns the
/// number of items removed.
pub fn retain_newest<T, P, K>(items: &mut Vec<T>, keep: usize, belongs: P, timestamp: K) -> usize
where
    P: Fn(&T) -> bool,
    K: Fn(&T) -> DateTime<Utc>,
{
    let mut owned: Vec<(DateTime<Utc>, usize)> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| belongs(item))
        .map(|(i, item)| (timestamp(item), i))
        .collect();

    if owned.len() <= keep {
        return 0;
    }

    owned.sort_by(|a, b| b.cmp(a));
    let evicted: HashSet<usize> = owned[keep..].iter().map(|(_, i)| *i).collect();

    let mut index = 0;
    items.retain(|_| {
        let kept = !evicted.contains(&index);
        index += 1;
        kept
    });

    evicted.len()
}
