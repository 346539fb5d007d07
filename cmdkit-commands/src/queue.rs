//! 任务入队命令（EnqueueCommand）
//!
//! 准备阶段在后台向任务队列提交任务，业务阶段等待确认；
//! 失败记录为错误键 `queue`，成功时结果为已提交的任务。
//!
use crate::error::CollaboratorError;
use crate::pending::Pending;
use async_trait::async_trait;
use bon::Builder;
use cmdkit_core::{Command, CommandContext, CommandResult, CommandState};
use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const QUEUE_ERROR: &str = "queue";

/// 待执行的后台任务
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
pub struct Task {
    /// 任务处理端点
    #[builder(into)]
    url: String,
    #[builder(default)]
    params: Vec<(String, String)>,
    /// 延迟执行
    countdown: Option<Duration>,
}

impl Task {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn countdown(&self) -> Option<Duration> {
        self.countdown
    }
}

/// 任务队列协作方
#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn enqueue(&self, queue: &str, task: Task) -> Result<(), CollaboratorError>;
}

/// 已入队任务及其最早可执行时刻
#[derive(Debug, Clone)]
struct Scheduled {
    task: Task,
    eta: Instant,
}

/// 内存任务队列：按队列名保存任务，可将某个队列标记为拒收
#[derive(Default)]
pub struct InMemoryTaskQueue {
    queues: DashMap<String, Vec<Scheduled>>,
    rejecting: DashSet<String>,
}

impl InMemoryTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self, queue: &str) -> Vec<Task> {
        self.scheduled(queue, |_| true)
    }

    /// 截至 `at` 已到期（倒计时结束）的任务
    pub fn due(&self, queue: &str, at: Instant) -> Vec<Task> {
        self.scheduled(queue, |entry| entry.eta <= at)
    }

    fn scheduled(&self, queue: &str, keep: impl Fn(&Scheduled) -> bool) -> Vec<Task> {
        self.queues
            .get(queue)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| keep(entry))
                    .map(|entry| entry.task.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn reject(&self, queue: impl Into<String>) {
        self.rejecting.insert(queue.into());
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn enqueue(&self, queue: &str, task: Task) -> Result<(), CollaboratorError> {
        if self.rejecting.contains(queue) {
            return Err(CollaboratorError::Queue(format!(
                "queue `{queue}` is not accepting tasks"
            )));
        }
        let eta = Instant::now() + task.countdown.unwrap_or_default();
        self.queues
            .entry(queue.to_string())
            .or_default()
            .push(Scheduled { task, eta });
        Ok(())
    }
}

#[derive(Debug, Clone, Builder)]
pub struct EnqueueConfig {
    #[builder(into)]
    queue_name: String,
    task: Task,
}

pub struct EnqueueCommand {
    config: EnqueueConfig,
    queue: Arc<dyn TaskQueue>,
    pending: Pending<()>,
    state: CommandState,
}

impl EnqueueCommand {
    pub fn new(config: EnqueueConfig, queue: Arc<dyn TaskQueue>) -> Self {
        Self {
            config,
            queue,
            pending: Pending::default(),
            state: CommandState::new(),
        }
    }
}

impl fmt::Debug for EnqueueCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnqueueCommand")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish()
    }
}

#[async_trait]
impl Command for EnqueueCommand {
    fn name(&self) -> &'static str {
        "enqueue"
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CommandState {
        &mut self.state
    }

    async fn prepare(&mut self, _ctx: &CommandContext) {
        let queue = self.queue.clone();
        let queue_name = self.config.queue_name.clone();
        let task = self.config.task.clone();
        self.pending
            .start(async move { queue.enqueue(&queue_name, task).await });
    }

    async fn run_business(&mut self, _ctx: &CommandContext) -> CommandResult<()> {
        match self.pending.wait(QUEUE_ERROR).await {
            Ok(()) => {
                tracing::debug!(queue = %self.config.queue_name, url = %self.config.task.url, "task enqueued");
                self.state.set_result(self.config.task.clone());
            }
            Err(err) => self.add_error(QUEUE_ERROR, &err.to_string()),
        }
        Ok(())
    }
}
