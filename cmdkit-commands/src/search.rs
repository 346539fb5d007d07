//! 分页查询命令（SearchCommand）
//!
//! 准备阶段在后台向分页数据源请求一页，业务阶段取回并以 `Page` 作为结果。
//! 游标由数据源解释，命令只负责原样传递。
//!
use crate::error::CollaboratorError;
use crate::pending::Pending;
use async_trait::async_trait;
use bon::Builder;
use cmdkit_core::{Command, CommandContext, CommandResult, CommandState};
use std::fmt;
use std::sync::Arc;

pub const SEARCH_ERROR: &str = "search";
pub const PAGE_SIZE_ERROR: &str = "page_size";

#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct SearchConfig {
    #[builder(default = 100)]
    page_size: usize,
    /// 上一页返回的游标
    #[builder(into)]
    start_cursor: Option<String>,
    #[builder(default)]
    offset: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SearchConfig {
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn start_cursor(&self) -> Option<&str> {
        self.start_cursor.as_deref()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// 一页查询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 下一页的起始游标
    pub cursor: Option<String>,
    pub more: bool,
}

/// 分页数据源协作方
#[async_trait]
pub trait PageSource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    async fn fetch_page(&self, config: SearchConfig) -> Result<Page<Self::Item>, CollaboratorError>;
}

/// 基于内存向量的数据源，游标为下一条记录的下标
#[derive(Debug, Clone, Default)]
pub struct VecPageSource<T> {
    items: Vec<T>,
}

impl<T> VecPageSource<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl<T> PageSource for VecPageSource<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Item = T;

    async fn fetch_page(&self, config: SearchConfig) -> Result<Page<T>, CollaboratorError> {
        let base = match config.start_cursor() {
            Some(cursor) => cursor
                .parse::<usize>()
                .map_err(|_| CollaboratorError::Source(format!("invalid cursor `{cursor}`")))?,
            None => 0,
        };
        let start = base.saturating_add(config.offset()).min(self.items.len());
        let end = start.saturating_add(config.page_size()).min(self.items.len());
        let more = end < self.items.len();

        Ok(Page {
            items: self.items[start..end].to_vec(),
            cursor: more.then(|| end.to_string()),
            more,
        })
    }
}

pub struct SearchCommand<S: PageSource> {
    config: SearchConfig,
    source: Arc<S>,
    pending: Pending<Page<S::Item>>,
    state: CommandState,
}

impl<S: PageSource> SearchCommand<S> {
    pub fn new(config: SearchConfig, source: Arc<S>) -> Self {
        Self {
            config,
            source,
            pending: Pending::default(),
            state: CommandState::new(),
        }
    }
}

impl<S: PageSource> fmt::Debug for SearchCommand<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchCommand")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish()
    }
}

#[async_trait]
impl<S: PageSource> Command for SearchCommand<S> {
    fn name(&self) -> &'static str {
        "search"
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CommandState {
        &mut self.state
    }

    async fn prepare(&mut self, _ctx: &CommandContext) {
        if self.config.page_size == 0 {
            self.add_error(PAGE_SIZE_ERROR, "page size must be positive");
            return;
        }
        let source = self.source.clone();
        let config = self.config.clone();
        self.pending
            .start(async move { source.fetch_page(config).await });
    }

    async fn run_business(&mut self, _ctx: &CommandContext) -> CommandResult<()> {
        if !self.errors().is_empty() {
            return Ok(());
        }
        match self.pending.wait(SEARCH_ERROR).await {
            Ok(page) => {
                tracing::debug!(items = page.items.len(), more = page.more, "page fetched");
                self.state.set_result(page);
            }
            Err(err) => self.add_error(SEARCH_ERROR, &err.to_string()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdkit_core::CommandExt;
    use cmdkit_core::persist::InMemoryStore;

    fn context() -> CommandContext {
        CommandContext::new(Arc::new(InMemoryStore::new()))
    }

    fn source() -> Arc<VecPageSource<u32>> {
        Arc::new(VecPageSource::new((1..=5).collect()))
    }

    #[tokio::test]
    async fn pages_follow_cursor() {
        let ctx = context();
        let source = source();

        let mut first = SearchCommand::new(SearchConfig::builder().page_size(2).build(), source.clone());
        let page = first.invoke_as::<Page<u32>>(&ctx).await.unwrap();
        assert_eq!(page.items, vec![1, 2]);
        assert!(page.more);

        let mut second = SearchCommand::new(
            SearchConfig::builder()
                .page_size(2)
                .maybe_start_cursor(page.cursor)
                .build(),
            source.clone(),
        );
        let page = second.invoke_as::<Page<u32>>(&ctx).await.unwrap();
        assert_eq!(page.items, vec![3, 4]);

        let mut last = SearchCommand::new(
            SearchConfig::builder()
                .page_size(2)
                .maybe_start_cursor(page.cursor)
                .build(),
            source,
        );
        let page = last.invoke_as::<Page<u32>>(&ctx).await.unwrap();
        assert_eq!(page.items, vec![5]);
        assert!(!page.more);
        assert!(page.cursor.is_none());
    }

    #[tokio::test]
    async fn offset_skips_items() {
        let ctx = context();
        let mut cmd = SearchCommand::new(
            SearchConfig::builder().page_size(10).offset(3).build(),
            source(),
        );

        let page = cmd.invoke_as::<Page<u32>>(&ctx).await.unwrap();
        assert_eq!(page.items, vec![4, 5]);
        assert!(!page.more);
    }

    #[tokio::test]
    async fn zero_page_size_is_rejected_before_fetching() {
        let ctx = context();
        let mut cmd = SearchCommand::new(SearchConfig::builder().page_size(0).build(), source());

        let err = cmd.execute(&ctx).await.unwrap_err();
        assert!(err.is_execution());
        assert!(cmd.errors().contains_key(PAGE_SIZE_ERROR));
        assert!(!cmd.errors().contains_key(SEARCH_ERROR));
    }

    #[tokio::test]
    async fn invalid_cursor_is_recorded() {
        let ctx = context();
        let mut cmd = SearchCommand::new(
            SearchConfig::builder().start_cursor("nope").build(),
            source(),
        );

        cmd.execute(&ctx).await.unwrap_err();
        assert!(
            cmd.errors()
                .get(SEARCH_ERROR)
                .is_some_and(|m| m.contains("invalid cursor"))
        );
    }

    #[test]
    fn debug_shows_config_and_state() {
        let cmd = SearchCommand::new(SearchConfig::builder().page_size(7).build(), source());
        let rendered = format!("{cmd:?}");
        assert!(rendered.starts_with("SearchCommand"));
        assert!(rendered.contains("page_size: 7"));
        assert!(rendered.contains("Idle"));
    }

    #[test]
    fn config_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.page_size(), 100);
        assert_eq!(config.offset(), 0);
        assert!(config.start_cursor().is_none());
    }
}
