//! LingoFlow 词汇学习核心
//!
//! - `storage`: 单词数据模型、键值持久化与词汇仓库
//! - `practice`: 选择题生成与练习会话状态机
//! - `config` / `logging` / `clock`: 运行环境支持

pub mod clock;
pub mod config;
pub mod logging;
pub mod practice;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, PracticeConfig};
pub use practice::{
    PracticeError, PracticeQuestion, PracticeSession, PracticeSummary, SessionState, StatsRecorder,
    StatsSink, StatsUpdate,
};
pub use storage::{
    Familiarity, KeyValueStore, MemoryKvStore, PartOfSpeech, SqliteKvStore, StorageError,
    StorageResult, Word, WordClass, WordDraft, WordPatch, WordRepository, WordStore,
};
