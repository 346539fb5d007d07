use crate::error::CollaboratorError;
use std::future::Future;
use tokio::task::JoinHandle;

/// 准备阶段发起、业务阶段等待的后台请求
///
/// 并行组合会先准备所有成员，因此多个请求可以同时在途。
pub(crate) struct Pending<T> {
    handle: Option<JoinHandle<Result<T, CollaboratorError>>>,
}

impl<T> Default for Pending<T> {
    fn default() -> Self {
        Self { handle: None }
    }
}

impl<T> Pending<T>
where
    T: Send + 'static,
{
    pub(crate) fn start<F>(&mut self, request: F)
    where
        F: Future<Output = Result<T, CollaboratorError>> + Send + 'static,
    {
        self.handle = Some(tokio::spawn(request));
    }

    pub(crate) async fn wait(&mut self, what: &'static str) -> Result<T, CollaboratorError> {
        let handle = self.handle.take().ok_or(CollaboratorError::NotPrepared(what))?;
        handle.await?
    }
}
