use cmdkit_commands::queue::QUEUE_ERROR;
use cmdkit_commands::{
    DeleteCommand, EnqueueCommand, EnqueueConfig, InMemoryTaskQueue, Page, Record, SaveCommand,
    SearchCommand, SearchConfig, Task, VecPageSource,
};
use cmdkit_core::persist::InMemoryStore;
use cmdkit_core::{
    BusinessContext, Command, CommandContext, CommandExt, CommandList, ErrorMap, Output, Then,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    id: String,
    email: String,
}

impl Record for User {
    const KIND: &'static str = "user";

    fn key(&self) -> String {
        self.id.clone()
    }

    fn validate(&self) -> ErrorMap {
        let mut errors = ErrorMap::new();
        if !self.email.contains('@') {
            errors.insert("email", "invalid address");
        }
        errors
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Profile {
    id: String,
    user_id: Option<String>,
}

impl Record for Profile {
    const KIND: &'static str = "profile";

    fn key(&self) -> String {
        self.id.clone()
    }
}

fn user(email: &str) -> User {
    User {
        id: "u-1".into(),
        email: email.into(),
    }
}

fn profile() -> SaveCommand<Profile> {
    SaveCommand::new(Profile {
        id: "p-1".into(),
        user_id: None,
    })
    .linked(|profile: &mut Profile, previous: &Output| {
        profile.user_id = previous.downcast_ref::<User>().map(|u| u.id.clone());
    })
}

fn welcome(queue: &Arc<InMemoryTaskQueue>, name: &str) -> EnqueueCommand {
    EnqueueCommand::new(
        EnqueueConfig::builder()
            .queue_name(name)
            .task(Task::builder().url("/tasks/welcome").build())
            .build(),
        queue.clone(),
    )
}

fn context(store: &Arc<InMemoryStore>) -> CommandContext {
    CommandContext::builder()
        .store(store.clone())
        .business(
            BusinessContext::builder()
                .correlation_id("req-1".to_string())
                .build(),
        )
        .build()
}

#[tokio::test]
async fn sign_up_saves_user_then_profile_and_task_together() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryStore::new());
    let queue = Arc::new(InMemoryTaskQueue::new());
    let ctx = context(&store);

    let mut sign_up = CommandList::sequential()
        .with(SaveCommand::new(user("ada@example.com")))
        .with(CommandList::parallel().with(profile()).with(welcome(&queue, "mail")));

    sign_up.execute(&ctx).await?;

    let stored: Profile = store.get_as("profile", "p-1")?.expect("profile stored");
    assert_eq!(stored.user_id.as_deref(), Some("u-1"));
    assert!(store.contains("user", "u-1"));
    assert_eq!(queue.tasks("mail").len(), 1);
    // 顺序组合逐个成员写入：用户一批，并行组一批
    assert_eq!(store.batch_count(), 2);
    Ok(())
}

#[tokio::test]
async fn parallel_failures_are_collected_at_the_root() {
    let store = Arc::new(InMemoryStore::new());
    let queue = Arc::new(InMemoryTaskQueue::new());
    queue.reject("mail");
    let ctx = context(&store);

    let mut sign_up = CommandList::parallel()
        .with(SaveCommand::new(user("not-an-address")))
        .with(welcome(&queue, "mail"));

    let err = sign_up.execute(&ctx).await.unwrap_err();

    assert!(err.is_execution());
    assert_eq!(sign_up.errors().get("email"), Some("invalid address"));
    assert!(sign_up.errors().contains_key(QUEUE_ERROR));
    assert!(store.is_empty());
    assert_eq!(store.batch_count(), 0);
}

#[tokio::test]
async fn earlier_members_stay_committed_when_a_later_one_fails() {
    let store = Arc::new(InMemoryStore::new());
    let ctx = context(&store);

    let mut chain = SaveCommand::new(user("ada@example.com")).then(SaveCommand::new(User {
        id: "u-2".into(),
        email: "broken".into(),
    }));

    let err = chain.execute(&ctx).await.unwrap_err();

    assert_eq!(err.errors().and_then(|e| e.get("email")), Some("invalid address"));
    assert!(store.contains("user", "u-1"));
    assert!(!store.contains("user", "u-2"));
}

#[tokio::test]
async fn cleanup_then_search_returns_page() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryStore::new());
    let ctx = context(&store);
    SaveCommand::new(user("ada@example.com")).execute(&ctx).await?;

    let source = Arc::new(VecPageSource::new(
        ["a", "b", "c"].map(String::from).to_vec(),
    ));
    let mut flow = DeleteCommand::new("user", ["u-1"])
        .then(SearchCommand::new(SearchConfig::builder().page_size(2).build(), source));

    let page = flow.invoke_as::<Page<String>>(&ctx).await?;

    assert_eq!(page.items, ["a", "b"]);
    assert!(page.more);
    assert!(!store.contains("user", "u-1"));
    Ok(())
}

#[tokio::test]
async fn explicit_main_member_supplies_the_result() -> anyhow::Result<()> {
    let store = Arc::new(InMemoryStore::new());
    let ctx = context(&store);

    let mut flow = CommandList::sequential()
        .with(SaveCommand::new(user("ada@example.com")))
        .with(DeleteCommand::new("session", ["s-1", "s-2"]))
        .with_main(0);

    let saved = flow.invoke_as::<User>(&ctx).await?;
    assert_eq!(saved, user("ada@example.com"));
    assert_eq!(flow.get(1).and_then(|c| c.result()).and_then(|o| o.downcast_ref::<usize>()), Some(&2));
    Ok(())
}
