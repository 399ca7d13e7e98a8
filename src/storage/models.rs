//! 数据模型定义
//!
//! 持久化格式是单个 JSON 数组，字段名使用 camelCase：
//! `partOfSpeech` 与 `verbDetails` 在线上是两个平铺字段，
//! 在内存中合并为 [`WordClass`]，动词专属字段只能通过 `WordClass::Verb` 访问。

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::storage::{StorageError, StorageResult};

// ============================================================
// PartOfSpeech - 词性
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Preposition,
    Conjunction,
    Pronoun,
    #[default]
    Other,
}

impl PartOfSpeech {
    pub const ALL: [PartOfSpeech; 8] = [
        PartOfSpeech::Noun,
        PartOfSpeech::Verb,
        PartOfSpeech::Adjective,
        PartOfSpeech::Adverb,
        PartOfSpeech::Preposition,
        PartOfSpeech::Conjunction,
        PartOfSpeech::Pronoun,
        PartOfSpeech::Other,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            PartOfSpeech::Noun => "noun",
            PartOfSpeech::Verb => "verb",
            PartOfSpeech::Adjective => "adjective",
            PartOfSpeech::Adverb => "adverb",
            PartOfSpeech::Preposition => "preposition",
            PartOfSpeech::Conjunction => "conjunction",
            PartOfSpeech::Pronoun => "pronoun",
            PartOfSpeech::Other => "other",
        }
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartOfSpeech {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|pos| pos.as_str() == normalized)
            .ok_or_else(|| StorageError::Validation(format!("未知词性: {}", s)))
    }
}

// ============================================================
// 例句与动词变位
// ============================================================

/// 例句及其母语翻译
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamplePair {
    pub example: String,
    #[serde(default)]
    pub example_meaning: String,
}

/// 现在时六个人称变位（德语：ich / du / er·sie·es / wir / ihr / sie·Sie）
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Conjugations {
    #[serde(rename = "ich")]
    pub first_singular: String,
    #[serde(rename = "du")]
    pub second_singular: String,
    #[serde(rename = "erSieEs")]
    pub third_singular: String,
    #[serde(rename = "wir")]
    pub first_plural: String,
    #[serde(rename = "ihr")]
    pub second_plural: String,
    #[serde(rename = "sieSie")]
    pub third_plural: String,
}

impl Conjugations {
    fn trimmed(self) -> Self {
        Self {
            first_singular: self.first_singular.trim().to_string(),
            second_singular: self.second_singular.trim().to_string(),
            third_singular: self.third_singular.trim().to_string(),
            first_plural: self.first_plural.trim().to_string(),
            second_plural: self.second_plural.trim().to_string(),
            third_plural: self.third_plural.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerbDetails {
    #[serde(default)]
    pub infinitive: String,
    #[serde(default)]
    pub conjugations: Conjugations,
    /// 可分动词（如 an|rufen）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_separable: Option<bool>,
}

// ============================================================
// WordClass - 词性 + 词性专属数据
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WordClass {
    Noun,
    Verb(VerbDetails),
    Adjective,
    Adverb,
    Preposition,
    Conjunction,
    Pronoun,
    #[default]
    Other,
}

impl WordClass {
    /// 由平铺字段组装。动词缺失详情时使用空详情，非动词携带的详情被丢弃。
    pub fn from_parts(pos: PartOfSpeech, verb_details: Option<VerbDetails>) -> Self {
        match pos {
            PartOfSpeech::Noun => WordClass::Noun,
            PartOfSpeech::Verb => WordClass::Verb(verb_details.unwrap_or_default()),
            PartOfSpeech::Adjective => WordClass::Adjective,
            PartOfSpeech::Adverb => WordClass::Adverb,
            PartOfSpeech::Preposition => WordClass::Preposition,
            PartOfSpeech::Conjunction => WordClass::Conjunction,
            PartOfSpeech::Pronoun => WordClass::Pronoun,
            PartOfSpeech::Other => WordClass::Other,
        }
    }

    pub fn part_of_speech(&self) -> PartOfSpeech {
        match self {
            WordClass::Noun => PartOfSpeech::Noun,
            WordClass::Verb(_) => PartOfSpeech::Verb,
            WordClass::Adjective => PartOfSpeech::Adjective,
            WordClass::Adverb => PartOfSpeech::Adverb,
            WordClass::Preposition => PartOfSpeech::Preposition,
            WordClass::Conjunction => PartOfSpeech::Conjunction,
            WordClass::Pronoun => PartOfSpeech::Pronoun,
            WordClass::Other => PartOfSpeech::Other,
        }
    }

    pub fn verb_details(&self) -> Option<&VerbDetails> {
        match self {
            WordClass::Verb(details) => Some(details),
            _ => None,
        }
    }

    fn into_parts(self) -> (PartOfSpeech, Option<VerbDetails>) {
        let pos = self.part_of_speech();
        match self {
            WordClass::Verb(details) => (pos, Some(details)),
            _ => (pos, None),
        }
    }
}

// ============================================================
// Familiarity - 熟悉度 (0-5)
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Familiarity(u8);

impl Familiarity {
    pub const MAX: u8 = 5;

    /// 校验后构造，超出 [0, 5] 返回校验错误
    pub fn new(value: i64) -> StorageResult<Self> {
        if (0..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(StorageError::Validation(format!(
                "熟悉度必须在 0-{} 之间: {}",
                Self::MAX,
                value
            )))
        }
    }

    /// 截断到合法区间（用于读取已持久化的数据）
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(0, Self::MAX as i64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

// ============================================================
// Word - 单词
// ============================================================

/// 达到该熟悉度视为“已掌握”
pub const LEARNED_FAMILIARITY: u8 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawWord", into = "RawWord")]
pub struct Word {
    /// 唯一标识，形如 `<毫秒时间戳>_<9 位随机串>`
    pub id: String,
    /// 目标语言词形
    pub word: String,
    /// 母语释义
    pub meaning: String,
    pub class: WordClass,
    pub examples: Vec<ExamplePair>,
    pub familiarity: Familiarity,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub is_favorite: bool,
    /// 创建时间（毫秒）
    pub created_at: i64,
    /// 最近一次练习作答时间（毫秒）
    pub last_reviewed_at: Option<i64>,
}

impl Word {
    pub fn part_of_speech(&self) -> PartOfSpeech {
        self.class.part_of_speech()
    }

    pub fn verb_details(&self) -> Option<&VerbDetails> {
        self.class.verb_details()
    }

    pub fn first_example(&self) -> Option<&ExamplePair> {
        self.examples.first()
    }

    pub fn is_learned(&self) -> bool {
        self.familiarity.value() >= LEARNED_FAMILIARITY
    }

    /// 大小写不敏感地匹配单词或释义；`needle` 需已转为小写
    pub fn matches_text(&self, needle: &str) -> bool {
        self.word.to_lowercase().contains(needle) || self.meaning.to_lowercase().contains(needle)
    }
}

/// 线上（JSON）格式
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWord {
    id: String,
    word: String,
    meaning: String,
    #[serde(default)]
    part_of_speech: PartOfSpeech,
    #[serde(default)]
    examples: Vec<ExamplePair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    verb_details: Option<VerbDetails>,
    #[serde(default)]
    familiarity: i64,
    #[serde(default)]
    correct_count: u32,
    #[serde(default)]
    wrong_count: u32,
    #[serde(default)]
    is_favorite: bool,
    #[serde(default)]
    created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_reviewed_at: Option<i64>,
}

impl From<RawWord> for Word {
    fn from(raw: RawWord) -> Self {
        Self {
            id: raw.id,
            word: raw.word,
            meaning: raw.meaning,
            class: WordClass::from_parts(raw.part_of_speech, raw.verb_details),
            examples: raw.examples,
            familiarity: Familiarity::clamped(raw.familiarity),
            correct_count: raw.correct_count,
            wrong_count: raw.wrong_count,
            is_favorite: raw.is_favorite,
            created_at: raw.created_at,
            last_reviewed_at: raw.last_reviewed_at,
        }
    }
}

impl From<Word> for RawWord {
    fn from(word: Word) -> Self {
        let (part_of_speech, verb_details) = word.class.into_parts();
        Self {
            id: word.id,
            word: word.word,
            meaning: word.meaning,
            part_of_speech,
            examples: word.examples,
            verb_details,
            familiarity: word.familiarity.value() as i64,
            correct_count: word.correct_count,
            wrong_count: word.wrong_count,
            is_favorite: word.is_favorite,
            created_at: word.created_at,
            last_reviewed_at: word.last_reviewed_at,
        }
    }
}

// ============================================================
// WordDraft - 新增单词表单
// ============================================================

const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// 生成单词 ID：毫秒时间戳 + 随机后缀
pub fn generate_word_id<R: Rng>(now_ms: i64, rng: &mut R) -> String {
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("{}_{}", now_ms, suffix)
}

/// 新增单词时用户填写的内容
#[derive(Debug, Clone, Default)]
pub struct WordDraft {
    pub word: String,
    pub meaning: String,
    pub part_of_speech: PartOfSpeech,
    pub example: String,
    pub example_meaning: String,
    /// 仅对动词生效
    pub conjugations: Conjugations,
    pub is_separable: Option<bool>,
}

impl WordDraft {
    pub fn new(word: impl Into<String>, meaning: impl Into<String>, pos: PartOfSpeech) -> Self {
        Self {
            word: word.into(),
            meaning: meaning.into(),
            part_of_speech: pos,
            ..Self::default()
        }
    }

    pub fn with_example(mut self, example: impl Into<String>, meaning: impl Into<String>) -> Self {
        self.example = example.into();
        self.example_meaning = meaning.into();
        self
    }

    pub fn with_conjugations(mut self, conjugations: Conjugations) -> Self {
        self.conjugations = conjugations;
        self
    }

    pub fn separable(mut self, is_separable: bool) -> Self {
        self.is_separable = Some(is_separable);
        self
    }

    /// 校验并生成完整的 [`Word`]
    pub fn build(self, clock: &dyn Clock) -> StorageResult<Word> {
        self.build_with_rng(clock, &mut rand::rng())
    }

    pub fn build_with_rng<R: Rng>(
        self,
        clock: &dyn Clock,
        rng: &mut R,
    ) -> StorageResult<Word> {
        let word = self.word.trim().to_string();
        let meaning = self.meaning.trim().to_string();
        if word.is_empty() || meaning.is_empty() {
            return Err(StorageError::Validation(
                "单词和释义不能为空".to_string(),
            ));
        }

        let example = self.example.trim();
        let examples = if example.is_empty() {
            Vec::new()
        } else {
            vec![ExamplePair {
                example: example.to_string(),
                example_meaning: self.example_meaning.trim().to_string(),
            }]
        };

        let class = match self.part_of_speech {
            PartOfSpeech::Verb => WordClass::Verb(VerbDetails {
                infinitive: word.clone(),
                conjugations: self.conjugations.trimmed(),
                is_separable: self.is_separable,
            }),
            other => WordClass::from_parts(other, None),
        };

        let now = clock.now_ms();
        Ok(Word {
            id: generate_word_id(now, rng),
            word,
            meaning,
            class,
            examples,
            familiarity: Familiarity::default(),
            correct_count: 0,
            wrong_count: 0,
            is_favorite: false,
            created_at: now,
            last_reviewed_at: None,
        })
    }
}

// ============================================================
// WordPatch - 部分更新
// ============================================================

/// `updateWord` 的部分字段。
///
/// id、创建时间以及练习计数不可经由此处修改。
#[derive(Debug, Clone, Default)]
pub struct WordPatch {
    pub word: Option<String>,
    pub meaning: Option<String>,
    pub class: Option<WordClass>,
    pub examples: Option<Vec<ExamplePair>>,
    pub familiarity: Option<i64>,
    pub is_favorite: Option<bool>,
}

impl WordPatch {
    pub fn familiarity(value: i64) -> Self {
        Self {
            familiarity: Some(value),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.word.is_none()
            && self.meaning.is_none()
            && self.class.is_none()
            && self.examples.is_none()
            && self.familiarity.is_none()
            && self.is_favorite.is_none()
    }

    /// 先整体校验再合并，校验失败时不修改 `target`
    pub fn apply(self, target: &mut Word) -> StorageResult<()> {
        let familiarity = self.familiarity.map(Familiarity::new).transpose()?;
        if let Some(word) = &self.word {
            if word.trim().is_empty() {
                return Err(StorageError::Validation("单词不能为空".to_string()));
            }
        }
        if let Some(meaning) = &self.meaning {
            if meaning.trim().is_empty() {
                return Err(StorageError::Validation("释义不能为空".to_string()));
            }
        }

        if let Some(word) = self.word {
            target.word = word;
        }
        if let Some(meaning) = self.meaning {
            target.meaning = meaning;
        }
        if let Some(class) = self.class {
            target.class = class;
        }
        if let Some(examples) = self.examples {
            target.examples = examples;
        }
        if let Some(familiarity) = familiarity {
            target.familiarity = familiarity;
        }
        if let Some(is_favorite) = self.is_favorite {
            target.is_favorite = is_favorite;
        }

        Ok(())
    }
}

// ============================================================
// 查询与统计
// ============================================================

/// 列表页的组合筛选条件
#[derive(Debug, Clone, Default)]
pub struct WordQuery {
    /// 匹配单词、释义或词性标签，空白时忽略
    pub text: Option<String>,
    pub part_of_speech: Option<PartOfSpeech>,
    pub favorites_only: bool,
}

impl WordQuery {
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn part_of_speech(mut self, pos: PartOfSpeech) -> Self {
        self.part_of_speech = Some(pos);
        self
    }

    pub fn favorites_only(mut self) -> Self {
        self.favorites_only = true;
        self
    }

    pub fn matches(&self, word: &Word) -> bool {
        if self.favorites_only && !word.is_favorite {
            return false;
        }
        if let Some(pos) = self.part_of_speech {
            if word.part_of_speech() != pos {
                return false;
            }
        }
        match self.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => {
                let needle = text.to_lowercase();
                word.matches_text(&needle) || word.part_of_speech().as_str().contains(&needle)
            }
            _ => true,
        }
    }
}

/// 学习进度概览
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyOverview {
    pub total_words: usize,
    pub learned_words: usize,
    pub favorite_words: usize,
    pub reviewed_words: usize,
    pub total_correct: u64,
    pub total_wrong: u64,
    /// 总体正确率（百分比，四舍五入；无作答时为 0）
    pub accuracy: u32,
}

impl VocabularyOverview {
    pub fn from_words(words: &[Word]) -> Self {
        let total_correct: u64 = words.iter().map(|w| w.correct_count as u64).sum();
        let total_wrong: u64 = words.iter().map(|w| w.wrong_count as u64).sum();
        let answered = total_correct + total_wrong;
        let accuracy = if answered == 0 {
            0
        } else {
            (total_correct as f64 / answered as f64 * 100.0).round() as u32
        };

        Self {
            total_words: words.len(),
            learned_words: words.iter().filter(|w| w.is_learned()).count(),
            favorite_words: words.iter().filter(|w| w.is_favorite).count(),
            reviewed_words: words
                .iter()
                .filter(|w| w.last_reviewed_at.is_some())
                .count(),
            total_correct,
            total_wrong,
            accuracy,
        }
    }
}
