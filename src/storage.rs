use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Whole-blob key/value persistence. Writes replace the stored value.
pub trait Storage {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
    fn describe(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    File,
    Sqlite,
    Memory,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::File => "file",
            Backend::Sqlite => "sqlite",
            Backend::Memory => "memory",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" | "json" => Ok(Backend::File),
            "sqlite" => Ok(Backend::Sqlite),
            "memory" => Ok(Backend::Memory),
            other => Err(format!("unknown backend: {other}")),
        }
    }
}

pub fn open_storage(backend: Backend, workspace: &Path) -> anyhow::Result<Box<dyn Storage>> {
    Ok(match backend {
        Backend::File => Box::new(FileStorage::open(workspace)?),
        Backend::Sqlite => Box::new(SqliteStorage::open(workspace)?),
        Backend::Memory => Box::new(MemoryStorage::default()),
    })
}

/// One `<key>.json` file per key inside the workspace directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn open(dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create workspace {}", dir.to_string_lossy()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key);
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
        Ok(Some(text))
    }

    fn write(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let dst = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.writing"));
        {
            let mut f = std::fs::File::create(&tmp)
                .with_context(|| format!("failed to create {}", tmp.to_string_lossy()))?;
            f.write_all(value.as_bytes())
                .with_context(|| format!("failed to write {}", tmp.to_string_lossy()))?;
            f.sync_all().context("failed to flush dataset")?;
        }
        std::fs::rename(&tmp, &dst)
            .with_context(|| format!("failed to move dataset to {}", dst.to_string_lossy()))?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.dir.to_string_lossy())
    }
}

/// Key/value table in `<workspace>/roster.sqlite3`.
pub struct SqliteStorage {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStorage {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(workspace)?;
        let path = workspace.join("roster.sqlite3");
        let conn = Connection::open(&path)
            .with_context(|| format!("failed to open {}", path.to_string_lossy()))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv(
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT
            )",
            [],
        )?;
        Ok(Self { conn, path })
    }
}

impl Storage for SqliteStorage {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        let v = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |r| {
                r.get::<_, String>(0)
            })
            .optional()?;
        Ok(v)
    }

    fn write(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv(key, value, updated_at)
                 VALUES(?, ?, strftime('%Y-%m-%dT%H:%M:%SZ','now'))
                 ON CONFLICT(key) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at",
                (key, value),
            )
            .with_context(|| format!("failed to upsert key {key}"))?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.to_string_lossy())
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(storage: &mut dyn Storage) {
        assert_eq!(storage.read("classroomData").unwrap(), None);
        storage.write("classroomData", "{\"a\":1}").unwrap();
        assert_eq!(
            storage.read("classroomData").unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        storage.write("classroomData", "{\"a\":2}").unwrap();
        assert_eq!(
            storage.read("classroomData").unwrap().as_deref(),
            Some("{\"a\":2}")
        );
    }

    #[test]
    fn file_storage_overwrites_whole_blob() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = FileStorage::open(dir.path()).unwrap();
        exercise(&mut s);
        assert!(dir.path().join("classroomData.json").is_file());
        assert!(!dir.path().join("classroomData.json.writing").exists());
    }

    #[test]
    fn sqlite_storage_overwrites_whole_blob() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = SqliteStorage::open(dir.path()).unwrap();
        exercise(&mut s);

        let reopened = SqliteStorage::open(dir.path()).unwrap();
        assert_eq!(
            reopened.read("classroomData").unwrap().as_deref(),
            Some("{\"a\":2}")
        );
    }

    #[test]
    fn memory_storage_overwrites_whole_blob() {
        exercise(&mut MemoryStorage::default());
    }

    #[test]
    fn backend_parses_names() {
        assert_eq!("SQLite".parse::<Backend>(), Ok(Backend::Sqlite));
        assert_eq!("json".parse::<Backend>(), Ok(Backend::File));
        assert!("redis".parse::<Backend>().is_err());
    }
}
