//! In-memory, keyed cache over one backing file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{AppError, Result};
use crate::storage::local::{append_line, read_optional, render_lines, write_atomic};
use crate::storage::{Record, WritableRecord};
use crate::utils::contains_ignore_case;

/// Outcome of the initial file load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Distinct entities in the cache
    pub loaded: usize,
    /// Lines rejected as malformed
    pub skipped: usize,
    /// Lines whose ID replaced an earlier line
    pub duplicates: usize,
    /// Whether the backing file was absent
    pub missing: bool,
}

struct Cache<T: Record> {
    header: Option<String>,
    entries: Vec<T>,
    by_id: HashMap<T::Id, usize>,
    by_key: HashMap<String, Vec<usize>>,
}

impl<T: Record> Cache<T> {
    fn new(header: Option<String>) -> Self {
        Self {
            header,
            entries: Vec::new(),
            by_id: HashMap::new(),
            by_key: HashMap::new(),
        }
    }

    /// Insert or replace by ID. Returns true when an entry was replaced.
    ///
    /// A replacement keeps the slot of the first occurrence so file order
    /// is stable while the content is last-write-wins.
    fn insert(&mut self, entity: T) -> bool {
        let id = entity.id();
        if let Some(&idx) = self.by_id.get(&id) {
            self.entries[idx] = entity;
            self.rebuild_keys();
            return true;
        }

        let idx = self.entries.len();
        if let Some(key) = entity.foreign_key() {
            self.by_key.entry(key).or_default().push(idx);
        }
        self.by_id.insert(id, idx);
        self.entries.push(entity);
        false
    }

    fn rebuild(&mut self) {
        self.by_id = self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, entity)| (entity.id(), idx))
            .collect();
        self.rebuild_keys();
    }

    fn rebuild_keys(&mut self) {
        self.by_key.clear();
        for (idx, entity) in self.entries.iter().enumerate() {
            if let Some(key) = entity.foreign_key() {
                self.by_key.entry(key).or_default().push(idx);
            }
        }
    }

    /// Apply `f` to one entry, keeping the indexes consistent.
    fn modify<R>(&mut self, idx: usize, f: impl FnOnce(&mut T) -> R) -> R {
        let entity = &mut self.entries[idx];
        let (id, key) = (entity.id(), entity.foreign_key());
        let result = f(entity);
        if entity.id() != id {
            self.rebuild();
        } else if entity.foreign_key() != key {
            self.rebuild_keys();
        }
        result
    }
}

/// Keyed cache for one entity type, loaded once from its backing file.
///
/// Queries never touch the file. Mutations take the write lock for the
/// whole change, including any file write, so a reader never observes a
/// half-applied update.
pub struct EntityStore<T: Record> {
    path: PathBuf,
    summary: LoadSummary,
    cache: RwLock<Cache<T>>,
}

impl<T: Record> EntityStore<T> {
    /// Load the backing file.
    ///
    /// A missing file gives an empty store. Malformed lines are logged and
    /// skipped; later lines with a duplicate ID overwrite earlier ones.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format = T::FORMAT;

        let Some(content) = read_optional(&path)? else {
            log::warn!(
                "No {} file found at {}; starting empty",
                format.name,
                path.display()
            );
            return Ok(Self {
                path,
                summary: LoadSummary {
                    missing: true,
                    ..LoadSummary::default()
                },
                cache: RwLock::new(Cache::new(None)),
            });
        };

        let mut cache = Cache::new(format.header_of(&content));
        let mut summary = LoadSummary::default();

        for (line_no, fields) in format.records(&content) {
            match fields.and_then(|fields| T::from_fields(&fields)) {
                Ok(entity) => {
                    if cache.insert(entity) {
                        summary.duplicates += 1;
                    }
                }
                Err(e) if e.is_line_local() => {
                    summary.skipped += 1;
                    log::warn!("{}:{}: skipping line: {}", path.display(), line_no, e);
                }
                Err(e) => return Err(e),
            }
        }
        summary.loaded = cache.entries.len();

        log::info!(
            "Loaded {} {} records from {} ({} skipped, {} duplicates)",
            summary.loaded,
            format.name,
            path.display(),
            summary.skipped,
            summary.duplicates
        );

        Ok(Self {
            path,
            summary,
            cache: RwLock::new(cache),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn summary(&self) -> LoadSummary {
        self.summary
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find_by_id(&self, id: &T::Id) -> Option<T> {
        let cache = self.read();
        cache.by_id.get(id).map(|&idx| cache.entries[idx].clone())
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.read().by_id.contains_key(id)
    }

    /// Every entity, in first-seen file order.
    pub fn find_all(&self) -> Vec<T> {
        self.read().entries.clone()
    }

    /// Case-insensitive substring match on the entity's display name.
    pub fn find_by_name(&self, query: &str) -> Vec<T> {
        let query = query.trim();
        self.find_where(|entity| {
            entity
                .name()
                .is_some_and(|name| contains_ignore_case(name, query))
        })
    }

    /// Entities whose secondary key equals `key`, in file order.
    pub fn find_by_foreign_key(&self, key: &str) -> Vec<T> {
        let cache = self.read();
        cache
            .by_key
            .get(key)
            .map(|indexes| {
                indexes
                    .iter()
                    .map(|&idx| cache.entries[idx].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn find_where(&self, mut predicate: impl FnMut(&T) -> bool) -> Vec<T> {
        self.read()
            .entries
            .iter()
            .filter(|entity| predicate(*entity))
            .cloned()
            .collect()
    }

    /// Change one cached entity without touching the backing file.
    ///
    /// Returns `None` when the ID is unknown.
    pub fn update<R>(&self, id: &T::Id, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut cache = self.write();
        let idx = *cache.by_id.get(id)?;
        Some(cache.modify(idx, f))
    }

    fn read(&self) -> RwLockReadGuard<'_, Cache<T>> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Cache<T>> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: WritableRecord> EntityStore<T> {
    /// Apply a field-level change and persist the whole store.
    ///
    /// `f` returns whether it changed anything; the file is only rewritten
    /// when it did. If the rewrite fails the cached entity is restored.
    /// Returns `None` when the ID is unknown.
    pub fn mutate(&self, id: &T::Id, f: impl FnOnce(&mut T) -> bool) -> Result<Option<bool>> {
        let mut cache = self.write();
        let Some(&idx) = cache.by_id.get(id) else {
            return Ok(None);
        };

        let before = cache.entries[idx].clone();
        if !cache.modify(idx, f) {
            return Ok(Some(false));
        }

        if let Err(e) = self.write_file(&cache) {
            cache.modify(idx, |entity| *entity = before);
            return Err(e);
        }
        Ok(Some(true))
    }

    /// Rewrite the backing file from the cache.
    pub fn save_all(&self) -> Result<()> {
        let cache = self.write();
        self.write_file(&cache)
    }

    /// Append one entity to the file and the cache.
    ///
    /// An ID already in the store is rejected. The line is written first;
    /// the cache only changes once the file holds the record.
    pub fn append(&self, entity: T) -> Result<()> {
        let mut cache = self.write();
        if cache.by_id.contains_key(&entity.id()) {
            return Err(AppError::validation(format!(
                "{} {} already recorded",
                T::FORMAT.name,
                entity.id()
            )));
        }
        append_line(&self.path, &entity.to_line())?;
        cache.insert(entity);
        Ok(())
    }

    fn write_file(&self, cache: &Cache<T>) -> Result<()> {
        let content = render_lines(
            cache.header.as_deref(),
            cache.entries.iter().map(WritableRecord::to_line),
        );
        write_atomic(&self.path, &content)?;
        log::debug!(
            "Rewrote {} {} records to {}",
            cache.entries.len(),
            T::FORMAT.name,
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::record::{RecordFormat, parse_number};
    use std::fs;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: String,
        name: String,
        group: String,
        qty: u32,
    }

    impl Record for Item {
        type Id = String;

        const FORMAT: RecordFormat = RecordFormat::new("item", b'/', "id", 4);

        fn id(&self) -> String {
            self.id.clone()
        }

        fn from_fields(fields: &[String]) -> Result<Self> {
            Ok(Self {
                id: fields[0].clone(),
                name: fields[1].clone(),
                group: fields[2].clone(),
                qty: parse_number(Self::FORMAT.name, "qty", &fields[3])?,
            })
        }

        fn name(&self) -> Option<&str> {
            Some(&self.name)
        }

        fn foreign_key(&self) -> Option<String> {
            Some(self.group.clone())
        }
    }

    impl WritableRecord for Item {
        fn to_fields(&self) -> Vec<String> {
            vec![
                self.id.clone(),
                self.name.clone(),
                self.group.clone(),
                self.qty.to_string(),
            ]
        }
    }

    fn store_with(content: &str) -> (TempDir, EntityStore<Item>) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("items.txt");
        fs::write(&path, content).unwrap();
        let store = EntityStore::load(path).unwrap();
        (tmp, store)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store: EntityStore<Item> = EntityStore::load(tmp.path().join("none.txt")).unwrap();
        assert!(store.is_empty());
        assert!(store.summary().missing);
    }

    #[test]
    fn test_last_duplicate_wins() {
        let (_tmp, store) = store_with("id/name/group/qty\nA/Apple/g1/1\nB/Banana/g1/2\nA/Apricot/g2/3\n");
        assert_eq!(store.len(), 2);
        assert_eq!(store.summary().duplicates, 1);

        let a = store.find_by_id(&"A".to_string()).unwrap();
        assert_eq!(a.name, "Apricot");
        // first-seen position is kept
        assert_eq!(store.find_all()[0].id, "A");
        assert_eq!(store.find_by_foreign_key("g1").len(), 1);
        assert_eq!(store.find_by_foreign_key("g2")[0].name, "Apricot");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let (_tmp, store) = store_with("A/Apple/g1/1\nbroken\nB/Banana/g1/many\nC/Cherry/g2/3\n");
        let ids: Vec<_> = store.find_all().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["A", "C"]);
        assert_eq!(store.summary().skipped, 2);
    }

    #[test]
    fn test_find_by_name_ignores_case() {
        let (_tmp, store) = store_with("A/Apple Pie/g1/1\nB/banana/g1/2\n");
        assert_eq!(store.find_by_name("APPLE").len(), 1);
        assert_eq!(store.find_by_name("an")[0].id, "B");
        assert!(store.find_by_name("zzz").is_empty());
    }

    #[test]
    fn test_unknown_foreign_key_is_empty() {
        let (_tmp, store) = store_with("A/Apple/g1/1\n");
        assert!(store.find_by_foreign_key("nope").is_empty());
        assert!(store.find_by_id(&"Z".to_string()).is_none());
    }

    #[test]
    fn test_mutate_rewrites_file_with_header() {
        let (tmp, store) = store_with("id/name/group/qty\nA/Apple/g1/1\nB/Banana/g1/2\n");

        let changed = store
            .mutate(&"B".to_string(), |item| {
                item.qty += 5;
                true
            })
            .unwrap();
        assert_eq!(changed, Some(true));

        let written = fs::read_to_string(tmp.path().join("items.txt")).unwrap();
        assert_eq!(written, "id/name/group/qty\nA/Apple/g1/1\nB/Banana/g1/7\n");
    }

    #[test]
    fn test_mutate_without_change_skips_write() {
        let (tmp, store) = store_with("A/Apple/g1/1\n");
        let path = tmp.path().join("items.txt");
        fs::write(&path, "sentinel").unwrap();

        assert_eq!(store.mutate(&"A".to_string(), |_| false).unwrap(), Some(false));
        assert_eq!(store.mutate(&"Z".to_string(), |_| true).unwrap(), None);
        assert_eq!(fs::read_to_string(&path).unwrap(), "sentinel");
    }

    #[test]
    fn test_mutate_restores_cache_on_write_failure() {
        let (tmp, store) = store_with("A/Apple/g1/1\n");
        // A directory in place of the temp file makes the rewrite fail.
        fs::create_dir(tmp.path().join("items.txt.tmp")).unwrap();

        let result = store.mutate(&"A".to_string(), |item| {
            item.qty = 99;
            true
        });
        assert!(matches!(result, Err(AppError::Io(_))));
        assert_eq!(store.find_by_id(&"A".to_string()).unwrap().qty, 1);
    }

    #[test]
    fn test_update_reindexes_foreign_key() {
        let (_tmp, store) = store_with("A/Apple/g1/1\n");
        store.update(&"A".to_string(), |item| item.group = "g9".to_string());
        assert!(store.find_by_foreign_key("g1").is_empty());
        assert_eq!(store.find_by_foreign_key("g9").len(), 1);
    }

    #[test]
    fn test_append_writes_then_caches() {
        let (tmp, store) = store_with("A/Apple/g1/1");
        store
            .append(Item {
                id: "B".into(),
                name: "Banana".into(),
                group: "g1".into(),
                qty: 2,
            })
            .unwrap();

        assert_eq!(store.len(), 2);
        let written = fs::read_to_string(tmp.path().join("items.txt")).unwrap();
        assert_eq!(written, "A/Apple/g1/1\nB/Banana/g1/2\n");
    }

    fn item(id: &str, qty: u32) -> Item {
        Item {
            id: id.into(),
            name: format!("n{qty}"),
            group: "g1".into(),
            qty,
        }
    }

    #[test]
    fn test_append_rejects_known_id() {
        let (tmp, store) = store_with("A/n1/g1/1\n");

        let result = store.append(item("A", 2));
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(store.find_by_id(&"A".to_string()).unwrap().qty, 1);
        let written = fs::read_to_string(tmp.path().join("items.txt")).unwrap();
        assert_eq!(written, "A/n1/g1/1\n");
    }

    #[test]
    fn test_concurrent_appends_of_one_id_write_once() {
        let (tmp, store) = store_with("A/n1/g1/1\n");

        let store = &store;
        let accepted = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|qty| scope.spawn(move || store.append(item("B", qty)).is_ok()))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .filter(|ok| *ok)
                .count()
        });

        assert_eq!(accepted, 1);
        let written = fs::read_to_string(tmp.path().join("items.txt")).unwrap();
        assert_eq!(written.lines().filter(|line| line.starts_with("B/")).count(), 1);
    }

    #[test]
    fn test_readers_never_see_half_applied_mutation() {
        let (tmp, store) = store_with("id/name/group/qty\nA/n0/g1/0\nB/n0/g2/0\n");
        let id = "A".to_string();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for qty in 1..=200 {
                    store
                        .mutate(&id, |item| {
                            item.qty = qty;
                            item.name = format!("n{qty}");
                            item.group = if qty % 2 == 0 { "g1" } else { "g2" }.to_string();
                            true
                        })
                        .unwrap();
                }
            });

            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..200 {
                        for item in store.find_all() {
                            assert_eq!(item.name, format!("n{}", item.qty));
                        }
                        let a = store.find_by_id(&id).unwrap();
                        assert_eq!(a.name, format!("n{}", a.qty));
                        let in_g1 = store.find_by_foreign_key("g1").iter().any(|item| item.id == "A");
                        let in_g2 = store.find_by_foreign_key("g2").iter().any(|item| item.id == "A");
                        assert!(in_g1 != in_g2);
                    }
                });
            }
        });

        let a = store.find_by_id(&id).unwrap();
        assert_eq!((a.qty, a.name.as_str(), a.group.as_str()), (200, "n200", "g1"));
        let written = fs::read_to_string(tmp.path().join("items.txt")).unwrap();
        assert_eq!(written, "id/name/group/qty\nA/n200/g1/200\nB/n0/g2/0\n");
    }
}
