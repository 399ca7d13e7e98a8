use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use serde::Serialize;

use crate::config::PracticeConfig;
use crate::practice::PracticeError;
use crate::storage::Word;

/// 每题选项数：1 个正确答案 + 3 个干扰项
pub const OPTION_COUNT: usize = 4;
const DISTRACTOR_COUNT: usize = OPTION_COUNT - 1;
/// 开始练习所需的最少单词数
pub const MIN_WORDS: usize = OPTION_COUNT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeQuestion {
    /// `q_<wordId>`
    pub id: String,
    pub word_id: String,
    pub question: String,
    /// 已打乱顺序的选项
    pub options: Vec<String>,
    pub correct_answer: String,
    /// 第一条例句，作答后展示
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

impl PracticeQuestion {
    pub fn is_correct(&self, selected: &str) -> bool {
        selected == self.correct_answer
    }
}

/// 检查词汇量是否足够出题
pub fn check_vocabulary_size(available: usize) -> Result<(), PracticeError> {
    match available {
        0 => Err(PracticeError::EmptyVocabulary),
        n if n < MIN_WORDS => Err(PracticeError::NotEnoughWords {
            available: n,
            required: MIN_WORDS,
        }),
        _ => Ok(()),
    }
}

/// 随机抽取 `min(question_count, words.len())` 个不重复的单词并各生成一道题。
///
/// 干扰项取自全部词汇（排除当前单词），与本轮抽中的子集无关。
pub fn generate_questions<R: Rng>(
    words: &[Word],
    config: &PracticeConfig,
    rng: &mut R,
) -> Result<Vec<PracticeQuestion>, PracticeError> {
    check_vocabulary_size(words.len())?;

    let count = config.question_count.max(1).min(words.len());
    let mut pool: Vec<&Word> = words.iter().collect();
    pool.shuffle(rng);

    Ok(pool
        .into_iter()
        .take(count)
        .map(|word| build_question(word, words, config, rng))
        .collect())
}

fn build_question<R: Rng>(
    word: &Word,
    all: &[Word],
    config: &PracticeConfig,
    rng: &mut R,
) -> PracticeQuestion {
    let mut options = Vec::with_capacity(OPTION_COUNT);
    options.push(word.meaning.clone());
    options.extend(pick_distractors(word, all, rng));
    options.shuffle(rng);

    let example = word.first_example();

    PracticeQuestion {
        id: format!("q_{}", word.id),
        word_id: word.id.clone(),
        question: config.render_prompt(&word.word),
        options,
        correct_answer: word.meaning.clone(),
        sentence: example.map(|e| e.example.clone()),
        translation: example.map(|e| e.example_meaning.clone()),
    }
}

/// 优先从与正确答案不同、且互不重复的释义中抽取；不足 3 个时退回到其他单词的原始释义
fn pick_distractors<R: Rng>(word: &Word, all: &[Word], rng: &mut R) -> Vec<String> {
    let others: Vec<&str> = all
        .iter()
        .filter(|w| w.id != word.id)
        .map(|w| w.meaning.as_str())
        .collect();

    let mut distinct: Vec<&str> = Vec::with_capacity(others.len());
    for meaning in &others {
        if *meaning != word.meaning && !distinct.contains(meaning) {
            distinct.push(*meaning);
        }
    }

    let candidates = if distinct.len() >= DISTRACTOR_COUNT {
        &distinct
    } else {
        &others
    };

    candidates
        .choose_multiple(rng, DISTRACTOR_COUNT)
        .map(|meaning| (*meaning).to_string())
        .collect()
}
