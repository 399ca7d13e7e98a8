//! 词汇仓库
//!
//! 所有写操作都是“读取全部 → 内存中修改 → 整体写回”。
//! 写闸门保证同一仓库实例上的读-改-写周期串行执行，不会互相覆盖；
//! 多个实例或多个进程共享同一数据库时仍可能丢失更新。

use std::sync::Arc;

use parking_lot::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::storage::{
    Familiarity, PartOfSpeech, SqliteKvStore, StorageError, StorageResult, VocabularyOverview,
    Word, WordPatch, WordQuery, WordStore,
};

/// 导入结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// 覆盖的已有记录数（按 id 匹配）
    pub updated: usize,
    /// 新追加的记录数
    pub added: usize,
}

pub struct WordRepository {
    store: WordStore,
    clock: Arc<dyn Clock>,
    write_gate: Mutex<()>,
}

impl WordRepository {
    pub fn new(store: WordStore) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: WordStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            write_gate: Mutex::new(()),
        }
    }

    /// 按配置打开 SQLite 数据库
    pub fn open(config: &Config) -> StorageResult<Self> {
        let kv = SqliteKvStore::open(&config.db_path)?;
        Ok(Self::new(WordStore::new(Arc::new(kv), config.storage_key.clone())))
    }

    pub fn store(&self) -> &WordStore {
        &self.store
    }

    // ============================================================
    // 读操作
    // ============================================================

    /// 全部单词，保持持久化顺序（即插入顺序）
    pub fn get_all_words(&self) -> Vec<Word> {
        self.store.load_all()
    }

    /// 与 [`get_all_words`](Self::get_all_words) 相同，但不吞掉存储错误
    pub fn try_get_all_words(&self) -> StorageResult<Vec<Word>> {
        self.store.try_load_all()
    }

    pub fn get_word_by_id(&self, id: &str) -> Option<Word> {
        self.store.load_all().into_iter().find(|w| w.id == id)
    }

    pub fn get_words_by_part_of_speech(&self, pos: PartOfSpeech) -> Vec<Word> {
        self.store
            .load_all()
            .into_iter()
            .filter(|w| w.part_of_speech() == pos)
            .collect()
    }

    /// 大小写不敏感地按单词或释义做子串匹配。
    ///
    /// 空查询匹配全部单词，是否特殊处理由调用方决定。
    pub fn search_words(&self, query: &str) -> Vec<Word> {
        let needle = query.to_lowercase();
        self.store
            .load_all()
            .into_iter()
            .filter(|w| w.matches_text(&needle))
            .collect()
    }

    /// 列表页组合筛选，结果按创建时间倒序
    pub fn query_words(&self, query: &WordQuery) -> Vec<Word> {
        let mut words: Vec<Word> = self
            .store
            .load_all()
            .into_iter()
            .filter(|w| query.matches(w))
            .collect();
        words.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        words
    }

    pub fn overview(&self) -> VocabularyOverview {
        VocabularyOverview::from_words(&self.store.load_all())
    }

    // ============================================================
    // 写操作
    // ============================================================

    /// 追加单词。调用方负责构造完整的记录（包括 id）。
    pub fn add_word(&self, word: Word) -> StorageResult<()> {
        let id = word.id.clone();
        self.mutate("add_word", Some(&id), move |words| {
            words.push(word);
            Ok(())
        })
    }

    /// 浅合并部分字段；id 不存在时返回 `NotFound`
    pub fn update_word(&self, id: &str, patch: WordPatch) -> StorageResult<()> {
        self.mutate("update_word", Some(id), |words| {
            let word = find_mut(words, id)?;
            patch.apply(word)
        })
    }

    /// 删除单词；id 不存在时视为成功（不做修改）
    pub fn delete_word(&self, id: &str) -> StorageResult<()> {
        self.mutate("delete_word", Some(id), |words| {
            let before = words.len();
            words.retain(|w| w.id != id);
            if words.len() == before {
                tracing::debug!(id, "delete_word: id not present");
            }
            Ok(())
        })
    }

    pub fn toggle_favorite(&self, id: &str) -> StorageResult<()> {
        self.mutate("toggle_favorite", Some(id), |words| {
            let word = find_mut(words, id)?;
            word.is_favorite = !word.is_favorite;
            Ok(())
        })
    }

    /// 记录一次练习作答。
    ///
    /// 正确/错误计数加一，刷新 `lastReviewedAt`；传入 `new_familiarity` 时覆盖熟悉度，
    /// 超出 0-5 的值被拒绝。
    pub fn update_practice_stats(
        &self,
        id: &str,
        is_correct: bool,
        new_familiarity: Option<i64>,
    ) -> StorageResult<()> {
        let familiarity = match new_familiarity.map(Familiarity::new).transpose() {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(id, error = %err, "update_practice_stats rejected");
                return Err(err);
            }
        };
        let now = self.clock.now_ms();

        self.mutate("update_practice_stats", Some(id), |words| {
            let word = find_mut(words, id)?;
            if is_correct {
                word.correct_count = word.correct_count.saturating_add(1);
            } else {
                word.wrong_count = word.wrong_count.saturating_add(1);
            }
            word.last_reviewed_at = Some(now);
            if let Some(familiarity) = familiarity {
                word.familiarity = familiarity;
            }
            Ok(())
        })
    }

    /// 删除全部数据
    pub fn clear_all(&self) -> StorageResult<()> {
        let _guard = self.write_gate.lock();
        match self.store.clear() {
            Ok(_) => Ok(()),
            Err(err) => {
                tracing::error!(key = %self.store.key(), error = %err, "clear_all failed");
                Err(err)
            }
        }
    }

    // ============================================================
    // 导入 / 导出
    // ============================================================

    /// 导出为格式化的 JSON 数组
    pub fn export_data(&self) -> StorageResult<String> {
        let words = self.store.try_load_all().map_err(|err| {
            tracing::error!(key = %self.store.key(), error = %err, "export_data failed");
            err
        })?;
        Ok(serde_json::to_string_pretty(&words)?)
    }

    /// 导入 JSON 数组并合并：相同 id 覆盖，新 id 追加。
    ///
    /// 输入不是合法的单词数组时返回错误，存储内容保持不变。
    pub fn import_data(&self, json: &str) -> StorageResult<ImportReport> {
        let incoming = match parse_import(json) {
            Ok(words) => words,
            Err(err) => {
                tracing::warn!(error = %err, "import_data rejected payload");
                return Err(err);
            }
        };

        self.mutate("import_data", None, move |words| {
            let mut report = ImportReport::default();
            for word in incoming {
                match words.iter_mut().find(|w| w.id == word.id) {
                    Some(existing) => {
                        *existing = word;
                        report.updated += 1;
                    }
                    None => {
                        words.push(word);
                        report.added += 1;
                    }
                }
            }
            tracing::info!(updated = report.updated, added = report.added, "vocabulary imported");
            Ok(report)
        })
    }

    // ============================================================
    // 内部实现
    // ============================================================

    /// 在写闸门内执行一次读-改-写。
    ///
    /// 读取使用严格模式，损坏的数据不会被写操作覆盖；闭包返回错误时不写回。
    fn mutate<T, F>(&self, op: &'static str, id: Option<&str>, f: F) -> StorageResult<T>
    where
        F: FnOnce(&mut Vec<Word>) -> StorageResult<T>,
    {
        let _guard = self.write_gate.lock();

        let result = self.store.try_load_all().and_then(|mut words| {
            let output = f(&mut words)?;
            self.store.save_all(&words)?;
            Ok(output)
        });

        if let Err(err) = &result {
            let id = id.unwrap_or("-");
            match err {
                StorageError::NotFound(_) | StorageError::Validation(_) => {
                    tracing::warn!(op, id, error = %err, "vocabulary operation rejected");
                }
                _ => {
                    tracing::error!(op, id, key = %self.store.key(), error = %err, "vocabulary operation failed");
                }
            }
        }

        result
    }
}

fn find_mut<'a>(words: &'a mut [Word], id: &str) -> StorageResult<&'a mut Word> {
    words
        .iter_mut()
        .find(|w| w.id == id)
        .ok_or_else(|| StorageError::NotFound(format!("单词 {}", id)))
}

fn parse_import(json: &str) -> StorageResult<Vec<Word>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    if !value.is_array() {
        return Err(StorageError::Validation(
            "导入数据必须是单词数组".to_string(),
        ));
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::{KeyValueStore, MemoryKvStore, WordClass, WordDraft};

    const KEY: &str = "@lingoflow_vocabulary";

    fn setup_repo() -> (WordRepository, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(1_700_000_000_000));
        let store = WordStore::new(Arc::new(MemoryKvStore::new()), KEY);
        (WordRepository::with_clock(store, clock.clone()), clock)
    }

    fn draft(word: &str, meaning: &str, pos: PartOfSpeech, clock: &FixedClock) -> Word {
        clock.advance(1);
        WordDraft::new(word, meaning, pos).build(clock).unwrap()
    }

    #[test]
    fn test_add_and_get_word() {
        let (repo, clock) = setup_repo();
        let word = draft("Haus", "ev", PartOfSpeech::Noun, &clock);
        repo.add_word(word.clone()).unwrap();

        assert_eq!(repo.get_word_by_id(&word.id), Some(word));
        assert_eq!(repo.get_word_by_id("missing"), None);
    }

    #[test]
    fn test_get_all_words_keeps_insertion_order() {
        let (repo, clock) = setup_repo();
        let ids: Vec<String> = ["eins", "zwei", "drei"]
            .iter()
            .map(|w| {
                let word = draft(w, "sayı", PartOfSpeech::Other, &clock);
                let id = word.id.clone();
                repo.add_word(word).unwrap();
                id
            })
            .collect();

        let stored: Vec<String> = repo.get_all_words().into_iter().map(|w| w.id).collect();
        assert_eq!(stored, ids);
    }

    #[test]
    fn test_update_missing_word_is_not_found() {
        let (repo, _) = setup_repo();
        let err = repo
            .update_word("missing", WordPatch::familiarity(2))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_update_can_change_word_class() {
        let (repo, clock) = setup_repo();
        let word = draft("laufen", "koşmak", PartOfSpeech::Noun, &clock);
        repo.add_word(word.clone()).unwrap();

        let patch = WordPatch {
            class: Some(WordClass::from_parts(PartOfSpeech::Verb, None)),
            ..WordPatch::default()
        };
        repo.update_word(&word.id, patch).unwrap();

        let updated = repo.get_word_by_id(&word.id).unwrap();
        assert_eq!(updated.part_of_speech(), PartOfSpeech::Verb);
        assert!(updated.verb_details().is_some());
    }

    #[test]
    fn test_toggle_favorite() {
        let (repo, clock) = setup_repo();
        let word = draft("Baum", "ağaç", PartOfSpeech::Noun, &clock);
        repo.add_word(word.clone()).unwrap();

        repo.toggle_favorite(&word.id).unwrap();
        assert!(repo.get_word_by_id(&word.id).unwrap().is_favorite);
        repo.toggle_favorite(&word.id).unwrap();
        assert!(!repo.get_word_by_id(&word.id).unwrap().is_favorite);

        assert!(repo.toggle_favorite("missing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_update_practice_stats() {
        let (repo, clock) = setup_repo();
        let word = draft("schnell", "hızlı", PartOfSpeech::Adjective, &clock);
        repo.add_word(word.clone()).unwrap();

        clock.set(1_800_000_000_000);
        repo.update_practice_stats(&word.id, true, None).unwrap();
        repo.update_practice_stats(&word.id, false, Some(3)).unwrap();

        let stored = repo.get_word_by_id(&word.id).unwrap();
        assert_eq!(stored.correct_count, 1);
        assert_eq!(stored.wrong_count, 1);
        assert_eq!(stored.familiarity.value(), 3);
        assert_eq!(stored.last_reviewed_at, Some(1_800_000_000_000));
    }

    #[test]
    fn test_update_practice_stats_rejects_bad_familiarity() {
        let (repo, clock) = setup_repo();
        let word = draft("schnell", "hızlı", PartOfSpeech::Adjective, &clock);
        repo.add_word(word.clone()).unwrap();

        let err = repo
            .update_practice_stats(&word.id, true, Some(6))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(repo.get_word_by_id(&word.id).unwrap().correct_count, 0);
    }

    #[test]
    fn test_update_practice_stats_missing_word() {
        let (repo, _) = setup_repo();
        assert!(repo
            .update_practice_stats("missing", true, None)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_query_words_newest_first() {
        let (repo, clock) = setup_repo();
        let old = draft("alt", "eski", PartOfSpeech::Adjective, &clock);
        let new = draft("neu", "yeni", PartOfSpeech::Adjective, &clock);
        let noun = draft("Tisch", "masa", PartOfSpeech::Noun, &clock);
        for word in [old.clone(), new.clone(), noun] {
            repo.add_word(word).unwrap();
        }

        let result = repo.query_words(&WordQuery::default().part_of_speech(PartOfSpeech::Adjective));
        let ids: Vec<&str> = result.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec![new.id.as_str(), old.id.as_str()]);
    }

    #[test]
    fn test_writes_do_not_overwrite_corrupted_blob() {
        let kv = Arc::new(MemoryKvStore::new());
        kv.set(KEY, "[{broken").unwrap();
        let repo = WordRepository::new(WordStore::new(kv.clone(), KEY));
        let clock = FixedClock::new(1);

        let word = WordDraft::new("Haus", "ev", PartOfSpeech::Noun)
            .build(&clock)
            .unwrap();
        assert!(repo.add_word(word).is_err());
        assert!(repo.delete_word("x").is_err());
        assert_eq!(kv.get(KEY).unwrap().as_deref(), Some("[{broken"));
        assert!(repo.get_all_words().is_empty());
    }

    #[test]
    fn test_import_rejects_non_array() {
        let (repo, clock) = setup_repo();
        repo.add_word(draft("Haus", "ev", PartOfSpeech::Noun, &clock))
            .unwrap();

        assert!(repo.import_data(r#"{"id": "1"}"#).unwrap_err().is_validation());
        assert!(repo.import_data("not json").is_err());
        assert!(repo.import_data(r#"[{"id": 5}]"#).is_err());
        assert_eq!(repo.get_all_words().len(), 1);
    }

    #[test]
    fn test_import_merges_by_id() {
        let (repo, clock) = setup_repo();
        let existing = draft("Haus", "ev", PartOfSpeech::Noun, &clock);
        repo.add_word(existing.clone()).unwrap();

        let mut replacement = existing.clone();
        replacement.meaning = "bina".to_string();
        let fresh = draft("Auto", "araba", PartOfSpeech::Noun, &clock);
        let payload = serde_json::to_string(&vec![replacement, fresh.clone()]).unwrap();

        let report = repo.import_data(&payload).unwrap();
        assert_eq!(report, ImportReport { updated: 1, added: 1 });

        let words = repo.get_all_words();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].meaning, "bina");
        assert_eq!(words[1].id, fresh.id);
    }

    #[test]
    fn test_export_is_pretty_json_array() {
        let (repo, clock) = setup_repo();
        repo.add_word(draft("Haus", "ev", PartOfSpeech::Noun, &clock))
            .unwrap();

        let exported = repo.export_data().unwrap();
        assert!(exported.starts_with("[\n"));
        let value: serde_json::Value = serde_json::from_str(&exported).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_clear_all() {
        let (repo, clock) = setup_repo();
        repo.add_word(draft("Haus", "ev", PartOfSpeech::Noun, &clock))
            .unwrap();
        repo.clear_all().unwrap();
        assert!(repo.get_all_words().is_empty());
        repo.clear_all().unwrap();
    }
}
