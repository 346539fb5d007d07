//! 组合运算符
//!
//! `a.then(b)` 与 `list + c` 产生扁平的有序列表，无需声明新的组合类型：
//! - 由运算符产生的临时链再次参与组合时会被展开；
//! - 显式构造的 `CommandList`（顺序或并行）作为单个成员保留嵌套结构。
//!
use super::CommandList;
use crate::command::Command;
use std::any::Any;
use std::ops::Add;

/// 将命令拆为可拼接的成员
fn chain_members<C>(command: C) -> Vec<Box<dyn Command>>
where
    C: Command + 'static,
{
    let mut slot = Some(command);
    if let Some(list) = (&mut slot as &mut dyn Any).downcast_mut::<Option<CommandList>>() {
        if let Some(list) = list.take() {
            return if list.chained {
                list.members
            } else {
                vec![Box::new(list)]
            };
        }
    }
    slot.map(|command| Box::new(command) as Box<dyn Command>)
        .into_iter()
        .collect()
}

/// 二元追加运算
pub trait Then: Command + Sized + 'static {
    /// 将 `next` 接在自身之后，得到顺序链
    fn then<N>(self, next: N) -> CommandList
    where
        N: Command + 'static,
    {
        let mut members = chain_members(self);
        members.extend(chain_members(next));
        CommandList::chain(members)
    }
}

impl<C> Then for C where C: Command + 'static {}

/// 构造期追加运算，与 `with` 一样不检查阶段；
/// 执行开始后的追加请使用 `push/extend`，已执行的列表不能再次执行
impl<C> Add<C> for CommandList
where
    C: Command + 'static,
{
    type Output = CommandList;

    fn add(mut self, rhs: C) -> Self::Output {
        self.members.extend(chain_members(rhs));
        self
    }
}
