use std::path::PathBuf;

pub const DEFAULT_STORAGE_KEY: &str = "@lingoflow_vocabulary";
pub const DEFAULT_QUESTION_COUNT: usize = 10;
pub const DEFAULT_PROMPT_TEMPLATE: &str = "What does \"{word}\" mean?";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub storage_key: String,
    pub practice: PracticeConfig,
    pub log_level: String,
}

/// 练习会话参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeConfig {
    /// 每轮请求的题目数（实际数量受词汇量限制）
    pub question_count: usize,
    /// 题干模板，`{word}` 会被替换为目标单词
    pub prompt_template: String,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            question_count: DEFAULT_QUESTION_COUNT,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

impl PracticeConfig {
    pub fn render_prompt(&self, word: &str) -> String {
        self.prompt_template.replace("{word}", word)
    }
}

impl Config {
    /// 先读取工作目录下的 `.env`（不覆盖已有变量），再解析环境变量
    pub fn load() -> Self {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                tracing::warn!(error = %err, "failed to read .env file");
            }
        }
        Self::from_env()
    }

    pub fn from_env() -> Self {
        let db_path = std::env::var("LINGOFLOW_DB_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let storage_key = std::env::var("LINGOFLOW_STORAGE_KEY")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());

        let question_count = std::env::var("PRACTICE_QUESTION_COUNT")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|count| *count >= 1)
            .unwrap_or(DEFAULT_QUESTION_COUNT);

        let prompt_template = std::env::var("PRACTICE_PROMPT")
            .ok()
            .filter(|value| value.contains("{word}"))
            .unwrap_or_else(|| DEFAULT_PROMPT_TEMPLATE.to_string());

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            db_path,
            storage_key,
            practice: PracticeConfig {
                question_count,
                prompt_template,
            },
            log_level,
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("lingoflow").join("vocabulary.db"))
        .unwrap_or_else(|| PathBuf::from("./data/vocabulary.db"))
}
