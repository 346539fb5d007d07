//! 并行组合：扇出执行、全部汇合（fan-out, join-all）
//!
//! 成员之间相互独立，依次执行但互不阻断：
//! - 先调用全部成员的 `prepare`，使各自的异步准备可以同时在途；
//! - 再逐个执行业务阶段并合并错误，任何成员失败都不会跳过后续成员；
//! - 所有成员的暂存实体由组合在自身 `execute` 中一次性批量写入。
//!
use super::CommandList;
use crate::command::Phase;
use crate::context::CommandContext;
use crate::error::{CommandError, CommandResult};
use crate::persist::StagedEntity;

impl CommandList {
    pub(super) async fn prepare_parallel(&mut self, ctx: &CommandContext) {
        for member in self.members.iter_mut() {
            if member.state().phase() != Phase::Idle {
                continue;
            }
            member.prepare(ctx).await;
            member.state_mut().set_phase(Phase::Prepared);
        }
    }

    pub(super) async fn run_parallel(&mut self, ctx: &CommandContext) -> CommandResult<()> {
        for (index, member) in self.members.iter_mut().enumerate() {
            if member.state().phase() != Phase::Prepared {
                return Err(CommandError::invalid_state(format!(
                    "parallel member #{index} `{}` was not prepared by this group",
                    member.name()
                )));
            }

            // 准备期已失败的成员不再进入业务阶段，但其错误照常汇总
            let outcome = if member.errors().is_empty() {
                member.run_business(ctx).await
            } else {
                Ok(())
            };
            let settled = member.state_mut().settle(outcome);
            self.state.merge_errors(member.errors());

            match settled {
                Ok(()) => {}
                Err(CommandError::Execution(_)) => {
                    tracing::debug!(
                        command = member.name(),
                        index,
                        errors = %member.errors(),
                        "parallel member failed, continuing with remaining members"
                    );
                }
                Err(other) => return Err(other),
            }
        }

        if self.state.errors().is_empty() {
            Ok(())
        } else {
            Err(CommandError::Execution(self.state.errors().clone()))
        }
    }

    /// 组合自身的暂存实体在前，随后按成员顺序拼接
    pub(super) fn stage_parallel(&self) -> Vec<StagedEntity> {
        let mut entities = self.state.staged().to_vec();
        for member in &self.members {
            entities.extend(member.stage_for_commit());
        }
        entities
    }
}
