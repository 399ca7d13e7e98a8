//! 练习模块
//!
//! - `question`: 从词汇表生成四选一的题目
//! - `session`: 练习会话状态机（加载 → 作答 → 下一题 → 完成）
//! - `recorder`: 作答统计的异步持久化
//!
//! 计分在内存中立即生效；统计写回通过 [`StatsSink`] 异步进行，失败只记录日志，不回滚会话状态。

pub mod question;
pub mod recorder;
pub mod session;

pub use question::{generate_questions, PracticeQuestion, MIN_WORDS, OPTION_COUNT};
pub use recorder::{RecorderReport, RecorderWorker, StatsRecorder};
pub use session::{GenerationTicket, PracticeSession, PracticeSummary, SessionState};

use thiserror::Error;

use crate::storage::{StorageError, WordRepository};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PracticeError {
    #[error("还没有添加任何单词，请先添加单词")]
    EmptyVocabulary,

    #[error("至少需要 {required} 个单词才能练习，当前只有 {available} 个")]
    NotEnoughWords { available: usize, required: usize },

    #[error("加载单词失败: {0}")]
    Storage(String),
}

impl From<StorageError> for PracticeError {
    fn from(err: StorageError) -> Self {
        PracticeError::Storage(err.to_string())
    }
}

/// 一次作答产生的统计更新
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsUpdate {
    pub word_id: String,
    pub is_correct: bool,
    pub new_familiarity: Option<i64>,
}

/// 作答统计的去处
pub trait StatsSink: Send + Sync {
    /// 提交更新，不等待持久化结果
    fn submit(&self, update: StatsUpdate);
}

/// 直接在调用线程写回仓库
impl StatsSink for WordRepository {
    fn submit(&self, update: StatsUpdate) {
        if let Err(err) =
            self.update_practice_stats(&update.word_id, update.is_correct, update.new_familiarity)
        {
            tracing::warn!(word_id = %update.word_id, error = %err, "practice stats not persisted");
        }
    }
}
