//! 删除命令（DeleteCommand）：暂存一组删除，结果为删除条数
//!
use async_trait::async_trait;
use cmdkit_core::persist::StagedEntity;
use cmdkit_core::{Command, CommandContext, CommandResult, CommandState};

pub const DELETE_ERROR: &str = "delete";

#[derive(Debug)]
pub struct DeleteCommand {
    kind: String,
    keys: Vec<String>,
    state: CommandState,
}

impl DeleteCommand {
    pub fn new<I, K>(kind: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            kind: kind.into(),
            keys: keys.into_iter().map(Into::into).collect(),
            state: CommandState::new(),
        }
    }
}

#[async_trait]
impl Command for DeleteCommand {
    fn name(&self) -> &'static str {
        "delete"
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CommandState {
        &mut self.state
    }

    async fn prepare(&mut self, _ctx: &CommandContext) {
        if self.keys.is_empty() {
            self.add_error(DELETE_ERROR, "no keys to delete");
        }
    }

    async fn run_business(&mut self, _ctx: &CommandContext) -> CommandResult<()> {
        if !self.errors().is_empty() {
            return Ok(());
        }
        let kind = self.kind.clone();
        self.state.stage_all(
            self.keys
                .iter()
                .map(|key| StagedEntity::delete(kind.as_str(), key.as_str())),
        );
        self.state.set_result(self.keys.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdkit_core::CommandExt;
    use cmdkit_core::persist::{InMemoryStore, Persistence};
    use std::sync::Arc;

    #[tokio::test]
    async fn keys_are_removed() {
        let store = Arc::new(InMemoryStore::new());
        store
            .persist_batch(vec![
                StagedEntity::upsert("book", "b-1", &"one").unwrap(),
                StagedEntity::upsert("book", "b-2", &"two").unwrap(),
            ])
            .await
            .unwrap();
        let ctx = CommandContext::new(store.clone());

        let mut cmd = DeleteCommand::new("book", ["b-1", "b-3"]);
        let count = cmd.invoke_as::<usize>(&ctx).await.unwrap();

        assert_eq!(count, 2);
        assert!(!store.contains("book", "b-1"));
        assert!(store.contains("book", "b-2"));
    }

    #[tokio::test]
    async fn empty_key_set_is_an_error() {
        let store = Arc::new(InMemoryStore::new());
        let ctx = CommandContext::new(store.clone());
        let mut cmd = DeleteCommand::new("book", Vec::<String>::new());

        let err = cmd.execute(&ctx).await.unwrap_err();
        assert!(err.is_execution());
        assert!(cmd.errors().contains_key(DELETE_ERROR));
        assert_eq!(store.batch_count(), 0);
    }
}
