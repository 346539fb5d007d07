//! 保存命令（SaveCommand）
//!
//! 准备阶段校验模型，业务阶段暂存一次写入并以模型作为结果。
//! 通过 `linked` 可在顺序组合中用前序命令的结果补全模型（如外键）。
//!
use async_trait::async_trait;
use cmdkit_core::persist::StagedEntity;
use cmdkit_core::{Command, CommandContext, CommandResult, CommandState, ErrorMap, Output};
use serde::Serialize;
use std::fmt;

/// 可持久化的业务模型
pub trait Record: Serialize + Clone + Send + Sync + 'static {
    /// 实体种类
    const KIND: &'static str;

    fn key(&self) -> String;

    /// 字段级校验，返回 字段 → 消息
    fn validate(&self) -> ErrorMap {
        ErrorMap::new()
    }
}

type Link<M> = Box<dyn Fn(&mut M, &Output) + Send>;

pub struct SaveCommand<M: Record> {
    model: M,
    link: Option<Link<M>>,
    state: CommandState,
}

impl<M: Record> SaveCommand<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            link: None,
            state: CommandState::new(),
        }
    }

    /// 前序命令有结果时，用其更新待保存的模型
    pub fn linked<F>(mut self, link: F) -> Self
    where
        F: Fn(&mut M, &Output) + Send + 'static,
    {
        self.link = Some(Box::new(link));
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<M: Record + fmt::Debug> fmt::Debug for SaveCommand<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveCommand")
            .field("model", &self.model)
            .field("linked", &self.link.is_some())
            .field("state", &self.state)
            .finish()
    }
}

#[async_trait]
impl<M: Record> Command for SaveCommand<M> {
    fn name(&self) -> &'static str {
        "save"
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CommandState {
        &mut self.state
    }

    fn handle_previous(&mut self, previous: &dyn Command) {
        if let (Some(link), Some(output)) = (&self.link, previous.result()) {
            link(&mut self.model, output);
        }
    }

    async fn prepare(&mut self, _ctx: &CommandContext) {
        let errors = self.model.validate();
        self.state.merge_errors(&errors);
    }

    async fn run_business(&mut self, _ctx: &CommandContext) -> CommandResult<()> {
        if !self.errors().is_empty() {
            return Ok(());
        }
        let entity = StagedEntity::upsert(M::KIND, self.model.key(), &self.model)?;
        self.state.stage(entity);
        self.state.set_result(self.model.clone());
        Ok(())
    }
}
