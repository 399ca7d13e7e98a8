//! 练习会话状态机
//!
//! ```text
//! Loading ──install──▶ Answering(i) ──handle_answer──▶ Answered(i)
//!    ▲          │                                        │
//!    │          └──▶ Failed                 go_to_next ──┴──▶ Answering(i+1) / Completed
//!    └──────────────────────── reset ◀──────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::config::PracticeConfig;
use crate::practice::question::{generate_questions, PracticeQuestion};
use crate::practice::{PracticeError, StatsSink, StatsUpdate};
use crate::storage::{Word, WordRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    /// 当前题目等待作答
    Answering,
    /// 当前题目已作答
    Answered,
    Completed,
    Failed,
}

impl SessionState {
    pub const fn as_str(self) -> &'static str {
        match self {
            SessionState::Loading => "LOADING",
            SessionState::Answering => "ANSWERING",
            SessionState::Answered => "ANSWERED",
            SessionState::Completed => "COMPLETED",
            SessionState::Failed => "FAILED",
        }
    }
}

/// 一轮练习的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSummary {
    pub score: usize,
    pub total: usize,
    pub wrong: usize,
    /// `round(score / total * 100)`
    pub success_rate: u32,
}

impl PracticeSummary {
    pub fn new(score: usize, total: usize) -> Self {
        let success_rate = if total == 0 {
            0
        } else {
            (score as f64 / total as f64 * 100.0).round() as u32
        };
        Self {
            score,
            total,
            wrong: total.saturating_sub(score),
            success_rate,
        }
    }
}

/// 出题批次凭证，用于丢弃过期的加载结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenerationTicket(u64);

pub struct PracticeSession {
    repo: Arc<WordRepository>,
    sink: Arc<dyn StatsSink>,
    config: PracticeConfig,
    rng: StdRng,
    state: SessionState,
    questions: Vec<PracticeQuestion>,
    current_index: usize,
    score: usize,
    last_answer: Option<bool>,
    summary: Option<PracticeSummary>,
    error: Option<PracticeError>,
    generation: u64,
}

impl PracticeSession {
    pub fn new(repo: Arc<WordRepository>, sink: Arc<dyn StatsSink>, config: PracticeConfig) -> Self {
        Self::with_rng(repo, sink, config, StdRng::from_os_rng())
    }

    /// 使用指定随机源（测试中可固定种子）
    pub fn with_rng(
        repo: Arc<WordRepository>,
        sink: Arc<dyn StatsSink>,
        config: PracticeConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            repo,
            sink,
            config,
            rng,
            state: SessionState::Loading,
            questions: Vec::new(),
            current_index: 0,
            score: 0,
            last_answer: None,
            summary: None,
            error: None,
            generation: 0,
        }
    }

    // ============================================================
    // 出题
    // ============================================================

    /// 从仓库加载单词并生成新一轮题目，返回题目数量
    pub fn start(&mut self) -> Result<usize, PracticeError> {
        let ticket = self.begin_generation();
        let loaded = self.repo.try_get_all_words().map_err(PracticeError::from);
        self.install(ticket, loaded);

        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(self.questions.len()),
        }
    }

    /// 清空本轮状态并重新出题（新的随机抽样与干扰项）
    pub fn reset(&mut self) -> Result<usize, PracticeError> {
        tracing::debug!(generation = self.generation, "resetting practice session");
        self.start()
    }

    /// 进入 Loading 状态并签发新的批次凭证，之前签发的凭证随即失效。
    ///
    /// 供在其他线程加载单词的调用方使用，加载完成后通过 [`install`](Self::install) 交回结果。
    pub fn begin_generation(&mut self) -> GenerationTicket {
        self.generation += 1;
        self.state = SessionState::Loading;
        self.questions.clear();
        self.current_index = 0;
        self.score = 0;
        self.last_answer = None;
        self.summary = None;
        self.error = None;
        GenerationTicket(self.generation)
    }

    /// 交回加载结果。凭证过期或该批次已处理时丢弃并返回 `false`。
    pub fn install(
        &mut self,
        ticket: GenerationTicket,
        loaded: Result<Vec<Word>, PracticeError>,
    ) -> bool {
        if ticket.0 != self.generation || self.state != SessionState::Loading {
            tracing::debug!(
                ticket = ticket.0,
                current = self.generation,
                "discarding stale practice words"
            );
            return false;
        }

        let config = &self.config;
        let rng = &mut self.rng;
        match loaded.and_then(|words| generate_questions(&words, config, rng)) {
            Ok(questions) => {
                tracing::info!(questions = questions.len(), "practice session ready");
                self.questions = questions;
                self.state = SessionState::Answering;
            }
            Err(err) => {
                tracing::warn!(error = %err, "practice session could not start");
                self.error = Some(err);
                self.state = SessionState::Failed;
            }
        }

        true
    }

    // ============================================================
    // 作答与前进
    // ============================================================

    /// 提交答案，返回是否正确。
    ///
    /// 当前题目已作答或没有当前题目时不做任何事并返回 `None`。
    pub fn handle_answer(&mut self, selected: &str) -> Option<bool> {
        if self.state != SessionState::Answering {
            return None;
        }
        let question = self.questions.get(self.current_index)?;

        let correct = question.is_correct(selected);
        let update = StatsUpdate {
            word_id: question.word_id.clone(),
            is_correct: correct,
            new_familiarity: None,
        };

        self.last_answer = Some(correct);
        self.state = SessionState::Answered;
        if correct {
            self.score += 1;
        }

        self.sink.submit(update);
        Some(correct)
    }

    /// 进入下一题；已是最后一题时结束本轮并返回结果
    pub fn go_to_next(&mut self) -> Option<PracticeSummary> {
        match self.state {
            SessionState::Answering | SessionState::Answered => {}
            SessionState::Completed => return self.summary,
            SessionState::Loading | SessionState::Failed => return None,
        }

        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            self.last_answer = None;
            self.state = SessionState::Answering;
            return None;
        }

        let summary = PracticeSummary::new(self.score, self.questions.len());
        tracing::info!(
            score = summary.score,
            total = summary.total,
            success_rate = summary.success_rate,
            "practice session completed"
        );
        self.summary = Some(summary);
        self.state = SessionState::Completed;
        Some(summary)
    }

    // ============================================================
    // 状态查询
    // ============================================================

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == SessionState::Loading
    }

    pub fn questions(&self) -> &[PracticeQuestion] {
        &self.questions
    }

    pub fn current_question(&self) -> Option<&PracticeQuestion> {
        match self.state {
            SessionState::Answering | SessionState::Answered => {
                self.questions.get(self.current_index)
            }
            _ => None,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn has_answered(&self) -> bool {
        self.state == SessionState::Answered
    }

    /// 当前题目的作答结果，未作答时为 `None`
    pub fn is_correct(&self) -> Option<bool> {
        self.last_answer
    }

    pub fn summary(&self) -> Option<PracticeSummary> {
        self.summary
    }

    pub fn last_error(&self) -> Option<&PracticeError> {
        self.error.as_ref()
    }
}
