use cmdkit_core::CommandError;

/// 协作方（HTTP、队列、分页数据源）失败
///
/// 叶子命令通常将其转为错误表中的一条记录，而不是直接向上传播。
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum CollaboratorError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("queue: {0}")]
    Queue(String),

    #[error("page source: {0}")]
    Source(String),

    #[error("background task: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("request was not prepared: {0}")]
    NotPrepared(&'static str),
}

impl From<CollaboratorError> for CommandError {
    fn from(err: CollaboratorError) -> Self {
        CommandError::collaborator(err.to_string())
    }
}
