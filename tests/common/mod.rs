#![allow(dead_code)]

use std::sync::Arc;

use lingoflow_core::storage::{MemoryKvStore, PartOfSpeech, Word, WordDraft, WordRepository, WordStore};
use lingoflow_core::FixedClock;

pub const STORAGE_KEY: &str = "@lingoflow_vocabulary";

pub fn create_test_repo() -> (Arc<WordRepository>, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(1_700_000_000_000));
    let store = WordStore::new(Arc::new(MemoryKvStore::new()), STORAGE_KEY);
    (
        Arc::new(WordRepository::with_clock(store, clock.clone())),
        clock,
    )
}

pub fn make_word(clock: &FixedClock, word: &str, meaning: &str, pos: PartOfSpeech) -> Word {
    clock.advance(1);
    WordDraft::new(word, meaning, pos)
        .build(clock)
        .expect("valid draft")
}

/// 添加 n 个释义互不相同的名词，返回它们的 id
pub fn seed_words(repo: &WordRepository, clock: &FixedClock, n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            let word = make_word(clock, &format!("Wort{i}"), &format!("kelime {i}"), PartOfSpeech::Noun);
            let id = word.id.clone();
            repo.add_word(word).expect("add_word");
            id
        })
        .collect()
}
