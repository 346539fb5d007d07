use crate::command::{Command, CommandState, Output, Phase};
use crate::context::CommandContext;
use crate::error::{CommandError, CommandResult, ErrorMap};
use crate::persist::StagedEntity;
use async_trait::async_trait;
use std::fmt;

/// 组合方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// 按序执行，每个成员完整执行（含自身持久化），首个失败即中止
    Sequential,
    /// 所有成员的业务阶段都会执行，汇总错误后统一判定，由组合一次性批量写入
    Parallel,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Sequential => f.write_str("sequential"),
            Mode::Parallel => f.write_str("parallel"),
        }
    }
}

/// 组合命令（CommandList）
///
/// 有序、独占成员的命令集合，自身同样满足 `Command` 协议：
/// - 错误表始终是已观测成员错误的覆盖式并集；
/// - 结果取自主成员（未指定时为最后一个成员）；
/// - 收到的前序交接只转发给第一个成员。
pub struct CommandList {
    pub(super) mode: Mode,
    pub(super) members: Vec<Box<dyn Command>>,
    pub(super) main: Option<usize>,
    pub(super) chained: bool,
    pub(super) state: CommandState,
}

impl CommandList {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            members: Vec::new(),
            main: None,
            chained: false,
            state: CommandState::new(),
        }
    }

    pub fn sequential() -> Self {
        Self::new(Mode::Sequential)
    }

    pub fn parallel() -> Self {
        Self::new(Mode::Parallel)
    }

    /// 由组合运算符产生的临时顺序链，再次组合时会被展开
    pub(crate) fn chain(members: Vec<Box<dyn Command>>) -> Self {
        Self {
            members,
            chained: true,
            ..Self::sequential()
        }
    }

    /// 构造期追加成员
    pub fn with<C>(mut self, command: C) -> Self
    where
        C: Command + 'static,
    {
        self.members.push(Box::new(command));
        self
    }

    /// 指定主成员；越界时回落到最后一个成员
    pub fn with_main(mut self, index: usize) -> Self {
        self.main = Some(index);
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_chain(&self) -> bool {
        self.chained
    }

    /// 追加一个成员，仅允许在执行开始前调用
    pub fn push<C>(&mut self, command: C) -> CommandResult<()>
    where
        C: Command + 'static,
    {
        self.push_boxed(Box::new(command))
    }

    pub fn push_boxed(&mut self, command: Box<dyn Command>) -> CommandResult<()> {
        self.ensure_idle()?;
        self.members.push(command);
        Ok(())
    }

    /// 批量追加成员，仅允许在执行开始前调用
    pub fn extend<I>(&mut self, commands: I) -> CommandResult<()>
    where
        I: IntoIterator<Item = Box<dyn Command>>,
    {
        self.ensure_idle()?;
        self.members.extend(commands);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&dyn Command> {
        self.members.get(index).map(|m| m.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Command> {
        self.members.iter().map(|m| m.as_ref())
    }

    /// 主成员：显式指定者，否则为最后一个成员
    pub fn main_member(&self) -> Option<&dyn Command> {
        self.main
            .and_then(|index| self.get(index))
            .or_else(|| self.members.last().map(|m| m.as_ref()))
    }

    /// 将错误表并入组合自身（覆盖式并集）
    pub fn merge_errors(&mut self, errors: &ErrorMap) {
        self.state.merge_errors(errors);
    }

    fn ensure_idle(&self) -> CommandResult<()> {
        if self.state.phase() == Phase::Idle {
            Ok(())
        } else {
            Err(CommandError::invalid_state(format!(
                "{} list cannot be modified once execution has started",
                self.mode
            )))
        }
    }
}

impl fmt::Debug for CommandList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandList")
            .field("mode", &self.mode)
            .field("members", &self.iter().map(|m| m.name()).collect::<Vec<_>>())
            .field("main", &self.main)
            .field("chained", &self.chained)
            .field("state", &self.state)
            .finish()
    }
}

#[async_trait]
impl Command for CommandList {
    fn name(&self) -> &'static str {
        match self.mode {
            Mode::Sequential => "sequential",
            Mode::Parallel => "parallel",
        }
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CommandState {
        &mut self.state
    }

    async fn prepare(&mut self, ctx: &CommandContext) {
        match self.mode {
            // 顺序成员在轮到自己时才完整执行，包括准备阶段
            Mode::Sequential => {}
            Mode::Parallel => self.prepare_parallel(ctx).await,
        }
    }

    fn handle_previous(&mut self, previous: &dyn Command) {
        if let Some(first) = self.members.first_mut() {
            first.handle_previous(previous);
        }
    }

    async fn run_business(&mut self, ctx: &CommandContext) -> CommandResult<()> {
        tracing::debug!(
            command = self.name(),
            mode = %self.mode,
            members = self.members.len(),
            correlation_id = ctx.correlation_id(),
            "running composite"
        );
        match self.mode {
            Mode::Sequential => self.run_sequential(ctx).await,
            Mode::Parallel => self.run_parallel(ctx).await,
        }
    }

    fn stage_for_commit(&self) -> Vec<StagedEntity> {
        if !self.state.errors().is_empty() {
            return Vec::new();
        }
        match self.mode {
            Mode::Sequential => self.state.staged().to_vec(),
            Mode::Parallel => self.stage_parallel(),
        }
    }

    fn result(&self) -> Option<&Output> {
        self.main_member().and_then(|m| m.result())
    }
}
