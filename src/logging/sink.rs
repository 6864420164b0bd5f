//! Log sinks.
//!
//! A sink is handed to whatever needs to record calls; nothing in the crate
//! reaches for a global logger.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use crate::error::Result;
use super::entry::LogEntry;

/// Destination for rendered log entries.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Append one entry.
    async fn append(&self, entry: &LogEntry) -> Result<()>;
}

/// Process-wide append locks, one per absolute file path.
static FILE_LOCKS: OnceLock<std::sync::Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();

fn lock_for(path: &Path) -> Arc<Mutex<()>> {
    let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut locks = FILE_LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    locks.entry(key).or_default().clone()
}

/// Appends entries to a plain text file.
///
/// Every sink for the same file shares one lock, so concurrent appends never
/// interleave inside a block. The file is opened and closed on every append.
#[derive(Debug, Clone)]
pub struct FileLogSink {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl FileLogSink {
    /// Create a sink writing to `path`. Nothing is touched until the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock = lock_for(&path);
        Self { path, lock }
    }

    /// Target file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LogSink for FileLogSink {
    async fn append(&self, entry: &LogEntry) -> Result<()> {
        let block = entry.render();
        let _guard = self.lock.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(block.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!(
            "Appended trace entry for task {} to {}",
            entry.task_id,
            self.path.display()
        );
        Ok(())
    }
}

/// Keeps rendered entries in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogSink {
    blocks: Arc<Mutex<Vec<String>>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered blocks in append order.
    pub async fn blocks(&self) -> Vec<String> {
        self.blocks.lock().await.clone()
    }
}

#[async_trait]
impl LogSink for MemoryLogSink {
    async fn append(&self, entry: &LogEntry) -> Result<()> {
        self.blocks.lock().await.push(entry.render());
        Ok(())
    }
}

/// Append a single entry to `path`.
pub async fn append_entry(path: impl AsRef<Path>, entry: &LogEntry) -> Result<()> {
    FileLogSink::new(path.as_ref()).append(entry).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::logging::entry::SEPARATOR;

    fn banner_count(contents: &str) -> usize {
        contents.lines().filter(|l| l.starts_with("-----Task ID: ")).count()
    }

    #[tokio::test]
    async fn test_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("nested").join("trace.log");

        append_entry(&path, &LogEntry::new().with_task_id("t1")).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("-----Task ID: t1----\n"));
    }

    #[tokio::test]
    async fn test_two_appends_give_two_blocks_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileLogSink::new(dir.path().join("trace.log"));

        sink.append(&LogEntry::new().with_task_id("first")).await.unwrap();
        sink.append(&LogEntry::new().with_task_id("second")).await.unwrap();

        let contents = std::fs::read_to_string(sink.path()).unwrap();
        assert_eq!(banner_count(&contents), 2);
        assert_eq!(contents.lines().filter(|l| *l == SEPARATOR).count(), 2);
        assert!(contents.find("first").unwrap() < contents.find("second").unwrap());
        assert!(contents.ends_with("------------------------\n"));
    }

    #[tokio::test]
    async fn test_existing_content_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.log");
        std::fs::write(&path, "earlier line\n").unwrap();

        append_entry(&path, &LogEntry::new()).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("earlier line\n-----Task ID: Unknown Task ID----"));
    }

    #[tokio::test]
    async fn test_concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileLogSink::new(dir.path().join("trace.log"));

        let mut handles = Vec::new();
        for i in 0..16 {
            let sink = sink.clone();
            handles.push(tokio::spawn(async move {
                let entry = LogEntry::new()
                    .with_task_id(format!("task-{}", i))
                    .with_answer("x".repeat(4096));
                sink.append(&entry).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let contents = std::fs::read_to_string(sink.path()).unwrap();
        assert_eq!(banner_count(&contents), 16);

        let mut lines = contents.lines();
        while let Some(banner) = lines.next() {
            assert!(banner.starts_with("-----Task ID: task-"), "unexpected line: {}", banner);
            assert!(lines.next().unwrap().starts_with("Step ID: "));
            assert!(lines.next().unwrap().starts_with("Question: "));
            assert!(lines.next().unwrap().starts_with("Answer: "));
            assert!(lines.next().unwrap().starts_with("Chat Completion Kwargs: "));
            assert!(lines.next().unwrap().starts_with("Execution Time: "));
            assert_eq!(lines.next().unwrap(), SEPARATOR);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_append_entry_from_many_tasks_keeps_blocks_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.log");
        let answer = "y".repeat(2 * 1024 * 1024);

        let mut handles = Vec::new();
        for i in 0..8 {
            let path = path.clone();
            let answer = answer.clone();
            handles.push(tokio::spawn(async move {
                let entry = LogEntry::new()
                    .with_task_id(format!("task-{}", i))
                    .with_answer(answer);
                append_entry(&path, &entry).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(banner_count(&contents), 8);
        let answers: Vec<&str> = contents.lines().filter(|l| l.starts_with("Answer: ")).collect();
        assert_eq!(answers.len(), 8);
        for line in answers {
            assert_eq!(line.len(), "Answer: ".len() + answer.len());
        }
        assert_eq!(contents.lines().filter(|l| *l == SEPARATOR).count(), 8);
    }

    #[test]
    fn test_sinks_for_same_file_share_lock() {
        let dir = tempfile::tempdir().unwrap();
        let a = FileLogSink::new(dir.path().join("trace.log"));
        let b = FileLogSink::new(dir.path().join("trace.log"));
        let other = FileLogSink::new(dir.path().join("other.log"));

        assert!(Arc::ptr_eq(&a.lock, &b.lock));
        assert!(!Arc::ptr_eq(&a.lock, &other.lock));
    }

    #[tokio::test]
    async fn test_directory_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let result = append_entry(blocker.join("trace.log"), &LogEntry::new()).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_memory_sink_collects_blocks() {
        let sink = MemoryLogSink::new();
        sink.append(&LogEntry::new().with_task_id("a")).await.unwrap();
        sink.append(&LogEntry::new().with_task_id("b")).await.unwrap();

        let blocks = sink.blocks().await;
        assert_eq!(blocks.len(), 2);
        assert!(blocks[1].starts_with("-----Task ID: b----"));
    }
}
