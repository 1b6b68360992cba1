use crate::SearchEngine;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn snapshot(&self) -> PathBuf { self.root.join("snapshot.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

pub fn save_engine(paths: &IndexPaths, engine: &SearchEngine) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.snapshot())?;
    let bytes = bincode::serialize(engine)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn load_engine(paths: &IndexPaths) -> Result<SearchEngine> {
    let mut f = File::open(paths.snapshot())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let engine = bincode::deserialize(&buf)?;
    Ok(engine)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Write the engine and a meta.json describing it.
pub fn save_snapshot(paths: &IndexPaths, engine: &SearchEngine) -> Result<MetaFile> {
    save_engine(paths, engine)?;
    let meta = MetaFile {
        num_docs: engine.index.num_docs,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        version: SNAPSHOT_VERSION,
    };
    save_meta(paths, &meta)?;
    Ok(meta)
}

/// Load a snapshot written by `save_snapshot`, refusing unknown versions.
pub fn load_snapshot(paths: &IndexPaths) -> Result<(SearchEngine, MetaFile)> {
    let meta = load_meta(paths)?;
    if meta.version != SNAPSHOT_VERSION {
        bail!("unsupported snapshot version {} (expected {SNAPSHOT_VERSION})", meta.version);
    }
    let engine = load_engine(paths)?;
    Ok((engine, meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Document, Popover};
    use tempfile::tempdir;

    #[test]
    fn snapshot_round_trip_searches_the_same() {
        let docs = vec![
            Document { reference: "/a".into(), title: "Install Guide".into(), ..Default::default() },
            Document { reference: "/b".into(), title: "Uninstall Tips".into(), ..Default::default() },
        ];
        let (engine, _) = SearchEngine::new(&docs).unwrap();
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let meta = save_snapshot(&paths, &engine).unwrap();
        assert_eq!(meta.num_docs, 2);

        let (loaded, loaded_meta) = load_snapshot(&paths).unwrap();
        assert_eq!(loaded_meta.version, SNAPSHOT_VERSION);
        let before = engine.search("install", 10, "/");
        let after = loaded.search("install", 10, "/");
        assert!(matches!(after, Popover::Results { .. }));
        assert_eq!(before, after);
    }

    #[test]
    fn rejects_unknown_version() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        save_meta(&paths, &MetaFile { num_docs: 0, created_at: String::new(), version: 99 }).unwrap();
        assert!(load_snapshot(&paths).is_err());
    }
}
