//! 作答统计后台写入
//!
//! 单一后台任务按提交顺序逐条写回仓库，写入在阻塞线程池上执行。

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::practice::{StatsSink, StatsUpdate};
use crate::storage::WordRepository;

/// 写入结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecorderReport {
    pub applied: usize,
    pub failed: usize,
}

/// 提交端，可克隆后交给多个会话
#[derive(Clone)]
pub struct StatsRecorder {
    tx: mpsc::UnboundedSender<StatsUpdate>,
}

/// 后台任务句柄
pub struct RecorderWorker {
    handle: JoinHandle<RecorderReport>,
}

impl StatsRecorder {
    /// 启动后台写入任务，需在 tokio 运行时内调用
    pub fn spawn(repo: Arc<WordRepository>) -> (Self, RecorderWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_recorder(repo, rx));
        (Self { tx }, RecorderWorker { handle })
    }
}

impl StatsSink for StatsRecorder {
    fn submit(&self, update: StatsUpdate) {
        if let Err(err) = self.tx.send(update) {
            tracing::error!(word_id = %err.0.word_id, "stats recorder stopped, update dropped");
        }
    }
}

impl RecorderWorker {
    /// 等待全部提交端释放并写完队列中剩余的更新
    pub async fn finish(self) -> RecorderReport {
        match self.handle.await {
            Ok(report) => report,
            Err(err) => {
                tracing::error!(error = %err, "stats recorder task aborted");
                RecorderReport::default()
            }
        }
    }
}

async fn run_recorder(
    repo: Arc<WordRepository>,
    mut rx: mpsc::UnboundedReceiver<StatsUpdate>,
) -> RecorderReport {
    let mut report = RecorderReport::default();

    while let Some(update) = rx.recv().await {
        let repo = Arc::clone(&repo);
        let word_id = update.word_id.clone();
        let result = tokio::task::spawn_blocking(move || {
            repo.update_practice_stats(&update.word_id, update.is_correct, update.new_familiarity)
        })
        .await;

        match result {
            Ok(Ok(())) => report.applied += 1,
            Ok(Err(err)) => {
                tracing::warn!(word_id = %word_id, error = %err, "practice stats not persisted");
                report.failed += 1;
            }
            Err(err) => {
                tracing::error!(word_id = %word_id, error = %err, "practice stats write panicked");
                report.failed += 1;
            }
        }
    }

    tracing::debug!(applied = report.applied, failed = report.failed, "stats recorder drained");
    report
}
