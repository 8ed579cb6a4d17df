use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::default_data_dir;
use crate::error::{BoardError, Result};
use crate::model::task::{NewTask, Task, TaskPatch};
use crate::store::hub::{SnapshotHub, Subscription};
use crate::store::traits::{sort_tasks, SortKey, TaskStore};

const DEFAULT_FILE_NAME: &str = "tasks.json";
const LOCK_FILE_NAME: &str = "tasks.json.lock";

/// JSON-file store. Several instances, in this process or others, may share
/// one data directory: writes are serialized through a lock file, and
/// `refresh` publishes whatever another instance wrote since.
pub struct FileTaskStore {
    file_path: PathBuf,
    lock_path: PathBuf,
    // File contents as last read or written by this instance. `None` forces
    // the next refresh to publish.
    seen: Mutex<Option<Vec<u8>>>,
    hub: SnapshotHub,
}

impl FileTaskStore {
    pub fn new(base_dir: Option<PathBuf>) -> Result<Self> {
        let dir = match base_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };
        fs::create_dir_all(&dir)?;

        let store = FileTaskStore {
            file_path: dir.join(DEFAULT_FILE_NAME),
            lock_path: dir.join(LOCK_FILE_NAME),
            seen: Mutex::new(None),
            hub: SnapshotHub::new(),
        };

        let _file_lock = store.lock_file()?;
        if !store.file_path.exists() {
            let bytes = serde_json::to_vec_pretty(&Vec::<Task>::new())?;
            store.persist(&bytes)?;
            info!(path = %store.file_path.display(), "initialized task file");
        }
        *store.seen.lock() = Some(store.read_bytes()?);
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Exclusive advisory lock shared with every other instance on this
    /// directory. Released when the returned handle drops.
    fn lock_file(&self) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        file.lock()?;
        Ok(file)
    }

    fn read_bytes(&self) -> Result<Vec<u8>> {
        Ok(fs::read(&self.file_path)?)
    }

    // Writes beside the target and renames over it, so a failure midway
    // leaves the previous file intact.
    fn persist(&self, bytes: &[u8]) -> Result<()> {
        let dir = self.file_path.parent().unwrap_or_else(|| Path::new("."));
        let transient = |e: std::io::Error| {
            BoardError::TransientWrite(format!("{}: {}", self.file_path.display(), e))
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(transient)?;
        tmp.write_all(bytes).map_err(transient)?;
        tmp.as_file().sync_all().map_err(transient)?;
        tmp.persist(&self.file_path).map_err(|e| transient(e.error))?;
        Ok(())
    }

    /// Runs one locked read-modify-write and publishes the result. `change`
    /// returns `None` to leave the file untouched.
    fn modify<T>(
        &self,
        change: impl FnOnce(&mut Vec<Task>) -> Result<Option<T>>,
    ) -> Result<Option<T>> {
        let mut seen = self.seen.lock();
        match self.rewrite(change) {
            Ok(Some((value, tasks, bytes))) => {
                self.hub.publish(&tasks);
                *seen = Some(bytes);
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                // The next refresh republishes what is actually on disk.
                *seen = None;
                Err(e)
            }
        }
    }

    fn rewrite<T>(
        &self,
        change: impl FnOnce(&mut Vec<Task>) -> Result<Option<T>>,
    ) -> Result<Option<(T, Vec<Task>, Vec<u8>)>> {
        let _file_lock = self.lock_file()?;
        let mut tasks: Vec<Task> = serde_json::from_slice(&self.read_bytes()?)?;
        let Some(value) = change(&mut tasks)? else {
            return Ok(None);
        };
        let bytes = serde_json::to_vec_pretty(&tasks)?;
        self.persist(&bytes)?;
        Ok(Some((value, tasks, bytes)))
    }
}

impl TaskStore for FileTaskStore {
    fn subscribe(&self, key: SortKey) -> Result<Subscription> {
        let _seen = self.seen.lock();
        let _file_lock = self.lock_file()?;
        let tasks: Vec<Task> = serde_json::from_slice(&self.read_bytes()?)?;
        Ok(self.hub.subscribe(key, &tasks))
    }

    fn create(&self, task: NewTask) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.modify(|tasks| {
            tasks.push(Task::from_new(id, task));
            Ok(Some(()))
        })?;
        debug!(%id, "file store: created");
        Ok(id)
    }

    fn update(&self, id: Uuid, patch: TaskPatch) -> Result<()> {
        self.modify(|tasks| match tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.apply(&patch);
                Ok(Some(()))
            }
            None => Err(BoardError::NotFound(id)),
        })?;
        Ok(())
    }

    fn delete(&self, id: Uuid) -> Result<()> {
        let removed = self.modify(|tasks| {
            let initial_len = tasks.len();
            tasks.retain(|t| t.id != id);
            Ok((tasks.len() != initial_len).then_some(()))
        })?;
        if removed.is_none() {
            debug!(%id, "file store: delete of absent task");
        }
        Ok(())
    }

    fn snapshot(&self, key: SortKey) -> Result<Vec<Task>> {
        let _file_lock = self.lock_file()?;
        let mut tasks: Vec<Task> = serde_json::from_slice(&self.read_bytes()?)?;
        sort_tasks(&mut tasks, key);
        Ok(tasks)
    }

    fn refresh(&self) -> Result<bool> {
        let mut seen = self.seen.lock();
        let _file_lock = self.lock_file()?;
        let bytes = self.read_bytes()?;
        if seen.as_deref() == Some(bytes.as_slice()) {
            return Ok(false);
        }
        let tasks: Vec<Task> = serde_json::from_slice(&bytes)?;
        self.hub.publish(&tasks);
        debug!(tasks = tasks.len(), "file store: picked up outside change");
        *seen = Some(bytes);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Category;
    use tempfile::TempDir;

    fn new_task(title: &str, category: Category, order: i64) -> NewTask {
        NewTask { title: title.to_string(), category, order }
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let id = {
            let store = FileTaskStore::new(Some(dir.path().to_path_buf())).unwrap();
            let id = store.create(new_task("Ship it", Category::InProgress, 0)).unwrap();
            store.update(id, TaskPatch::completed(true)).unwrap();
            id
        };

        let store = FileTaskStore::new(Some(dir.path().to_path_buf())).unwrap();
        let tasks = store.snapshot(SortKey::Order).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, id);
        assert!(tasks[0].completed);
        assert_eq!(tasks[0].category, Category::InProgress);
    }

    #[test]
    fn test_file_holds_the_record_shape() {
        let dir = TempDir::new().unwrap();
        let store = FileTaskStore::new(Some(dir.path().to_path_buf())).unwrap();
        store.create(new_task("a", Category::ToDo, 0)).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let record = &value[0];
        for key in ["id", "title", "completed", "category", "order", "createdAt"] {
            assert!(record.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_subscription_follows_writes() {
        let dir = TempDir::new().unwrap();
        let store = FileTaskStore::new(Some(dir.path().to_path_buf())).unwrap();
        let a = store.create(new_task("a", Category::ToDo, 0)).unwrap();
        let b = store.create(new_task("b", Category::ToDo, 1)).unwrap();

        let sub = store.subscribe(SortKey::Order).unwrap();
        assert_eq!(sub.try_next().unwrap().len(), 2);

        store.update(a, TaskPatch::order(1)).unwrap();
        store.update(b, TaskPatch::order(0)).unwrap();
        store.delete(Uuid::new_v4()).unwrap();

        let snapshots = sub.drain();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[1][0].id, b);
    }

    #[test]
    fn test_update_after_delete_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FileTaskStore::new(Some(dir.path().to_path_buf())).unwrap();
        let id = store.create(new_task("a", Category::ToDo, 0)).unwrap();
        store.delete(id).unwrap();
        assert!(matches!(store.update(id, TaskPatch::order(3)), Err(BoardError::NotFound(_))));
        assert!(store.snapshot(SortKey::Order).unwrap().is_empty());
    }

    fn open(dir: &TempDir) -> FileTaskStore {
        FileTaskStore::new(Some(dir.path().to_path_buf())).unwrap()
    }

    #[test]
    fn test_refresh_publishes_changes_from_another_instance() {
        let dir = TempDir::new().unwrap();
        let viewer = open(&dir);
        let writer = open(&dir);

        let sub = viewer.subscribe(SortKey::Order).unwrap();
        assert!(sub.try_next().unwrap().is_empty());

        let id = writer.create(new_task("from elsewhere", Category::ToDo, 0)).unwrap();
        assert!(sub.drain().is_empty());

        assert!(viewer.refresh().unwrap());
        let snapshots = sub.drain();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0][0].id, id);

        assert!(!viewer.refresh().unwrap());
        assert!(sub.drain().is_empty());
    }

    #[test]
    fn test_refresh_skips_own_writes() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        let sub = store.subscribe(SortKey::Order).unwrap();
        store.create(new_task("a", Category::ToDo, 0)).unwrap();

        assert!(!store.refresh().unwrap());
        assert_eq!(sub.drain().len(), 2);
    }

    #[test]
    fn test_failed_write_republishes_on_refresh() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        let id = store.create(new_task("a", Category::ToDo, 0)).unwrap();
        let sub = store.subscribe(SortKey::Order).unwrap();
        sub.drain();

        assert!(store.update(Uuid::new_v4(), TaskPatch::order(5)).is_err());
        assert!(sub.drain().is_empty());

        assert!(store.refresh().unwrap());
        let snapshots = sub.drain();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0][0].id, id);
        assert_eq!(snapshots[0][0].order, 0);
    }

    #[test]
    fn test_update_from_stale_instance_cannot_resurrect() {
        let dir = TempDir::new().unwrap();
        let first = open(&dir);
        let second = open(&dir);
        let id = first.create(new_task("b", Category::ToDo, 1)).unwrap();

        second.delete(id).unwrap();
        assert!(matches!(first.update(id, TaskPatch::order(0)), Err(BoardError::NotFound(_))));
        assert!(first.snapshot(SortKey::Order).unwrap().is_empty());
    }

    #[test]
    fn test_writes_leave_no_stray_files() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        for i in 0..3 {
            store.create(new_task("t", Category::Done, i)).unwrap();
        }

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec![DEFAULT_FILE_NAME.to_string(), LOCK_FILE_NAME.to_string()]);

        let raw = fs::read(store.path()).unwrap();
        let tasks: Vec<Task> = serde_json::from_slice(&raw).unwrap();
        assert_eq!(tasks.len(), 3);
    }
}
