//! 命令（Command）
//!
//! 业务用例的原子单元，生命周期分三段：
//! 1. `prepare`：非阻塞准备（可发起异步请求供后续阶段等待），仅记录准备期错误；
//! 2. `run_business`：核心计算，记录业务错误、设置结果并暂存待写实体；
//! 3. `stage_for_commit`：无错误时交出暂存实体，否则不交出任何数据。
//!
//! `CommandExt::execute` 负责编排以上阶段并在成功后一次性批量写入。
//! 组合命令（`CommandList`）同样实现本 trait，因而可任意嵌套。
//!
use crate::context::CommandContext;
use crate::error::{CommandError, CommandResult, ErrorMap};
use crate::persist::StagedEntity;
use async_trait::async_trait;
use std::any::{Any, type_name};
use std::fmt;

/// 命令所处阶段：`Idle → Prepared → Succeeded | Failed`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Prepared,
    Succeeded,
    Failed,
}

impl Phase {
    pub fn is_finished(self) -> bool {
        matches!(self, Phase::Succeeded | Phase::Failed)
    }
}

/// 类型擦除的业务结果
pub struct Output {
    value: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Output {
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            value: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// 结果的原始类型名（仅用于诊断）
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Output({})", self.type_name)
    }
}

/// 命令的错误/结果槽位，由每个命令内嵌持有
#[derive(Debug, Default)]
pub struct CommandState {
    errors: ErrorMap,
    result: Option<Output>,
    staged: Vec<StagedEntity>,
    phase: Phase,
}

impl CommandState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn add_error(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(key, message);
    }

    pub fn merge_errors(&mut self, errors: &ErrorMap) {
        self.errors.merge(errors);
    }

    pub fn result(&self) -> Option<&Output> {
        self.result.as_ref()
    }

    pub fn set_result<T>(&mut self, value: T)
    where
        T: Any + Send + Sync,
    {
        self.result = Some(Output::new(value));
    }

    pub fn staged(&self) -> &[StagedEntity] {
        &self.staged
    }

    pub fn stage(&mut self, entity: StagedEntity) {
        self.staged.push(entity);
    }

    pub fn stage_all(&mut self, entities: impl IntoIterator<Item = StagedEntity>) {
        self.staged.extend(entities);
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// 业务阶段结束后的结算：
    /// - 以 `Execution` 方式失败的命令，其携带的错误并入自身错误表；
    /// - 错误表非空即失败，返回错误表快照；
    /// - 其他错误原样返回。
    pub(crate) fn settle(&mut self, outcome: CommandResult<()>) -> CommandResult<()> {
        match outcome {
            Ok(()) => {}
            Err(CommandError::Execution(errors)) => self.errors.merge(&errors),
            Err(other) => {
                self.phase = Phase::Failed;
                return Err(other);
            }
        }

        if self.errors.is_empty() {
            self.phase = Phase::Succeeded;
            Ok(())
        } else {
            self.phase = Phase::Failed;
            Err(CommandError::Execution(self.errors.clone()))
        }
    }
}

/// 命令协议
///
/// 叶子命令只需内嵌 `CommandState` 并实现 `state/state_mut/run_business`，
/// 其余阶段按需覆盖。
#[async_trait]
pub trait Command: Send {
    /// 命令名称，用于日志
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    fn state(&self) -> &CommandState;

    fn state_mut(&mut self) -> &mut CommandState;

    /// 准备阶段：可发起异步请求，不应依据业务结果记录错误
    async fn prepare(&mut self, _ctx: &CommandContext) {}

    /// 前序命令交接：在前序命令成功之后、本命令准备之前调用
    fn handle_previous(&mut self, _previous: &dyn Command) {}

    /// 业务阶段：记录错误、设置结果、暂存实体
    async fn run_business(&mut self, ctx: &CommandContext) -> CommandResult<()>;

    /// 无错误时交出暂存实体，否则返回空
    fn stage_for_commit(&self) -> Vec<StagedEntity> {
        if self.errors().is_empty() {
            self.state().staged().to_vec()
        } else {
            Vec::new()
        }
    }

    fn errors(&self) -> &ErrorMap {
        self.state().errors()
    }

    fn result(&self) -> Option<&Output> {
        self.state().result()
    }

    fn add_error(&mut self, key: &str, message: &str) {
        self.state_mut().add_error(key, message);
    }
}

/// 命令执行扩展：为所有命令（含 `dyn Command`）提供 `execute/invoke`
#[async_trait]
pub trait CommandExt: Command {
    /// 准备 → 业务 → 校验错误 → 批量写入，成功返回命令自身
    async fn execute<'a>(&'a mut self, ctx: &CommandContext) -> CommandResult<&'a mut Self>;

    /// 执行并返回结果
    async fn invoke<'a>(&'a mut self, ctx: &CommandContext) -> CommandResult<Option<&'a Output>>;

    /// 执行并按类型取出结果副本
    async fn invoke_as<T>(&mut self, ctx: &CommandContext) -> CommandResult<T>
    where
        T: Any + Clone + Send;
}

#[async_trait]
impl<C> CommandExt for C
where
    C: Command + ?Sized,
{
    async fn execute<'a>(&'a mut self, ctx: &CommandContext) -> CommandResult<&'a mut Self> {
        if self.state().phase() != Phase::Idle {
            return Err(CommandError::invalid_state(format!(
                "command `{}` has already been executed",
                self.name()
            )));
        }

        tracing::debug!(
            command = self.name(),
            correlation_id = ctx.correlation_id(),
            "preparing command"
        );
        self.prepare(ctx).await;
        self.state_mut().set_phase(Phase::Prepared);

        let outcome = self.run_business(ctx).await;
        if let Err(err) = self.state_mut().settle(outcome) {
            tracing::warn!(
                command = self.name(),
                correlation_id = ctx.correlation_id(),
                errors = %self.errors(),
                error = %err,
                "command failed"
            );
            return Err(err);
        }

        let batch = self.stage_for_commit();
        if !batch.is_empty() {
            let entities = batch.len();
            if let Err(err) = ctx.store().persist_batch(batch).await {
                self.state_mut().set_phase(Phase::Failed);
                tracing::warn!(
                    command = self.name(),
                    correlation_id = ctx.correlation_id(),
                    error = %err,
                    "persisting staged entities failed"
                );
                return Err(err);
            }
            tracing::debug!(command = self.name(), entities, "staged entities persisted");
        }

        tracing::info!(
            command = self.name(),
            correlation_id = ctx.correlation_id(),
            "command executed"
        );
        Ok(self)
    }

    async fn invoke<'a>(&'a mut self, ctx: &CommandContext) -> CommandResult<Option<&'a Output>> {
        let this = self.execute(ctx).await?;
        Ok(this.result())
    }

    async fn invoke_as<T>(&mut self, ctx: &CommandContext) -> CommandResult<T>
    where
        T: Any + Clone + Send,
    {
        let Some(output) = self.invoke(ctx).await? else {
            return Err(CommandError::TypeMismatch {
                expected: type_name::<T>(),
                found: "nothing",
            });
        };

        match output.downcast_ref::<T>() {
            Some(value) => Ok(value.clone()),
            None => Err(CommandError::TypeMismatch {
                expected: type_name::<T>(),
                found: output.type_name(),
            }),
        }
    }
}
