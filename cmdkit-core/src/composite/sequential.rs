//! 顺序组合：有序链路，首个失败即停止
//!
//! 每个成员在轮到自己时完整执行（准备、业务、自身持久化），
//! 因此链路中途失败时，先前成员的写入已经落盘，不做回滚。
//!
use super::CommandList;
use crate::command::CommandExt;
use crate::context::CommandContext;
use crate::error::{CommandError, CommandResult};

impl CommandList {
    pub(super) async fn run_sequential(&mut self, ctx: &CommandContext) -> CommandResult<()> {
        for index in 0..self.members.len() {
            // 第一个成员的交接由外层经 `handle_previous` 转发而来
            if index > 0 {
                let (done, rest) = self.members.split_at_mut(index);
                rest[0].handle_previous(done[index - 1].as_ref());
            }

            let remaining = self.members.len() - index - 1;
            let member = &mut self.members[index];
            let outcome = member.execute(ctx).await.map(|_| ());
            self.state.merge_errors(member.errors());

            if let Err(err) = outcome {
                tracing::debug!(
                    command = member.name(),
                    index,
                    skipped = remaining,
                    "sequential member failed, aborting chain"
                );
                return Err(match err {
                    CommandError::Execution(_) => {
                        CommandError::Execution(self.state.errors().clone())
                    }
                    other => other,
                });
            }
        }

        Ok(())
    }
}
