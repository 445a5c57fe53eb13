//! The asset manager: resolves backslash-separated, case-insensitive
//! logical paths to bytes, with a loose-file overlay checked before the
//! archive tree, and owns the DBC and decoded-texture caches.
//!
//! Missing assets are not errors here: lookups return empty/`None` and the
//! caller substitutes a placeholder.

use std::{
    cell::RefCell,
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};
use blp::BlpImage;
use dbc::{DbcLayout, DbcTable};


const MINIMAP_TRANSLATE: &'static str = "Textures\\Minimap\\md5translate.trs";

pub struct AssetMgr {
    /// Lowercased logical path -> on-disk path, for the archive tree.
    archive: HashMap<String, PathBuf>,
    /// Same, for the loose-file overlay. Checked first.
    overlay: HashMap<String, PathBuf>,
    layout: DbcLayout,
    dbc_cache: RefCell<HashMap<String, Rc<DbcTable>>>,
    texture_cache: RefCell<HashMap<String, Rc<BlpImage>>>,
    minimap_hashes: RefCell<Option<HashMap<String, String>>>,
}

impl AssetMgr {
    /// Index the archive tree and the optional overlay. Roots that do not
    /// exist simply produce an empty index.
    pub fn new(archive_root: &Path, overlay_root: Option<&Path>, layout: DbcLayout) -> Self {
        let archive = build_index(archive_root);
        let overlay = overlay_root.map(build_index).unwrap_or_default();
        info!(
            archive_files = archive.len(),
            overlay_files = overlay.len(),
            "indexed asset roots",
        );
        AssetMgr {
            archive,
            overlay,
            layout,
            dbc_cache: RefCell::new(HashMap::new()),
            texture_cache: RefCell::new(HashMap::new()),
            minimap_hashes: RefCell::new(None),
        }
    }

    pub fn layout(&self) -> &DbcLayout {
        &self.layout
    }

    fn resolve(&self, logical: &str) -> Option<&PathBuf> {
        let key = normalize(logical);
        self.overlay.get(&key).or_else(|| self.archive.get(&key))
    }

    pub fn file_exists(&self, logical: &str) -> bool {
        self.resolve(logical).is_some()
    }

    /// Bytes of a logical path, or empty when absent or unreadable.
    pub fn read_file(&self, logical: &str) -> Vec<u8> {
        self.try_read_file(logical).unwrap_or_default()
    }

    pub fn try_read_file(&self, logical: &str) -> Option<Vec<u8>> {
        let path = self.resolve(logical)?;
        match fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(%e, logical, "indexed asset failed to read");
                None
            }
        }
    }

    /// Shared handle to a DBC by bare table name. The textual form the
    /// companion tool emits is accepted alongside the binary form.
    pub fn load_dbc(&self, name: &str) -> Option<Rc<DbcTable>> {
        if let Some(table) = self.dbc_cache.borrow().get(name) {
            return Some(table.clone());
        }
        let binary = format!("DBFilesClient\\{}.dbc", name);
        let textual = format!("DBFilesClient\\{}.dbc.csv", name);
        let bytes = self
            .try_read_file(&binary)
            .or_else(|| self.try_read_file(&textual))?;
        let table = match DbcTable::load(&bytes) {
            Ok(table) => Rc::new(table),
            Err(e) => {
                warn!(%e, name, "dbc failed to load");
                return None;
            }
        };
        self.dbc_cache
            .borrow_mut()
            .insert(name.to_owned(), table.clone());
        Some(table)
    }

    /// Decoded texture by logical path, cached.
    pub fn load_texture(&self, logical: &str) -> Option<Rc<BlpImage>> {
        let key = normalize(logical);
        if let Some(image) = self.texture_cache.borrow().get(&key) {
            return Some(image.clone());
        }
        let bytes = self.try_read_file(logical)?;
        let image = match blp::decode(&bytes) {
            Ok(image) => Rc::new(image),
            Err(e) => {
                warn!(%e, logical, "texture failed to decode");
                return None;
            }
        };
        self.texture_cache.borrow_mut().insert(key, image.clone());
        Some(image)
    }

    /// Resolve a minimap tile key ("Azeroth\map32_48") to its hashed
    /// texture path via `md5translate.trs`.
    pub fn minimap_texture_path(&self, tile_key: &str) -> Option<String> {
        let mut cache = self.minimap_hashes.borrow_mut();
        let map = cache.get_or_insert_with(|| {
            let bytes = self.read_file(MINIMAP_TRANSLATE);
            parse_md5_translate(&bytes)
        });
        map.get(&normalize(tile_key))
            .map(|hash| format!("Textures\\Minimap\\{}", hash))
    }
}

/// Lowercase and forward-slash the backslash convention.
fn normalize(logical: &str) -> String {
    logical.to_lowercase().replace('\\', "/")
}

/// Tab-separated `<tile-key>\t<hash-file>` lines; `dir: ` headers are
/// skipped.
fn parse_md5_translate(bytes: &[u8]) -> HashMap<String, String> {
    let text = String::from_utf8_lossy(bytes);
    let mut map = HashMap::new();
    for line in text.lines() {
        if line.is_empty() || line.starts_with("dir:") {
            continue;
        }
        let Some((key, hash)) = line.split_once('\t') else {
            continue;
        };
        map.insert(normalize(key.trim()), hash.trim().to_owned());
    }
    map
}

/// Walk a root, mapping lowercased relative paths to their files.
fn build_index(root: &Path) -> HashMap<String, PathBuf> {
    let mut index = HashMap::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if let Ok(rel) = path.strip_prefix(root) {
                let key = rel
                    .to_string_lossy()
                    .to_lowercase()
                    .replace('\\', "/");
                index.insert(key, path);
            }
        }
    }
    index
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write as _;

    fn scratch_root(tag: &str) -> PathBuf {
        let root = std::env::temp_dir()
            .join(format!("wowclient-asset-test-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("Textures/Minimap")).unwrap();
        root
    }

    #[test]
    fn backslash_lookup_is_case_insensitive() {
        let root = scratch_root("case");
        File::create(root.join("Textures/Minimap/abc123.blp"))
            .unwrap()
            .write_all(b"bytes")
            .unwrap();
        let mgr = AssetMgr::new(&root, None, DbcLayout::wotlk());
        assert!(mgr.file_exists("TEXTURES\\MINIMAP\\ABC123.BLP"));
        assert_eq!(mgr.read_file("textures\\minimap\\abc123.blp"), b"bytes");
        // missing files read as empty
        assert!(mgr.read_file("textures\\minimap\\missing.blp").is_empty());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn overlay_wins_over_archive() {
        let root = scratch_root("arch");
        let over = scratch_root("over");
        File::create(root.join("Textures/Minimap/x.blp"))
            .unwrap()
            .write_all(b"archive")
            .unwrap();
        File::create(over.join("Textures/Minimap/x.blp"))
            .unwrap()
            .write_all(b"overlay")
            .unwrap();
        let mgr = AssetMgr::new(&root, Some(over.as_path()), DbcLayout::wotlk());
        assert_eq!(mgr.read_file("Textures\\Minimap\\x.blp"), b"overlay");
        let _ = fs::remove_dir_all(&root);
        let _ = fs::remove_dir_all(&over);
    }

    #[test]
    fn minimap_translate_resolves_tiles() {
        let root = scratch_root("trs");
        let mut trs = File::create(root.join("Textures/Minimap/md5translate.trs")).unwrap();
        writeln!(trs, "dir: Azeroth").unwrap();
        writeln!(trs, "Azeroth\\map32_48.blp\tdeadbeef.blp").unwrap();
        drop(trs);
        let mgr = AssetMgr::new(&root, None, DbcLayout::wotlk());
        assert_eq!(
            mgr.minimap_texture_path("Azeroth\\map32_48.blp").as_deref(),
            Some("Textures\\Minimap\\deadbeef.blp"),
        );
        assert_eq!(mgr.minimap_texture_path("Azeroth\\map0_0.blp"), None);
        let _ = fs::remove_dir_all(&root);
    }
}
