use cmdkit_commands::{Record, SaveCommand};
use cmdkit_core::logging::{self, LoggingConfig};
use cmdkit_core::persist::InMemoryStore;
use cmdkit_core::{BusinessContext, Command, CommandContext, CommandExt, CommandList, ErrorMap, Output};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Author {
    id: String,
    name: String,
}

impl Record for Author {
    const KIND: &'static str = "author";

    fn key(&self) -> String {
        self.id.clone()
    }

    fn validate(&self) -> ErrorMap {
        let mut errors = ErrorMap::new();
        if self.name.trim().is_empty() {
            errors.insert("name", "must not be blank");
        }
        errors
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Book {
    id: String,
    title: String,
    author_id: Option<String>,
}

impl Record for Book {
    const KIND: &'static str = "book";

    fn key(&self) -> String {
        self.id.clone()
    }

    fn validate(&self) -> ErrorMap {
        let mut errors = ErrorMap::new();
        if self.title.is_empty() {
            errors.insert("title", "required");
        }
        errors
    }
}

fn book(id: &str, title: &str) -> SaveCommand<Book> {
    SaveCommand::new(Book {
        id: id.to_string(),
        title: title.to_string(),
        author_id: None,
    })
    .linked(|book: &mut Book, previous: &Output| {
        book.author_id = previous.downcast_ref::<Author>().map(|a| a.id.clone());
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init(&LoggingConfig::default());

    let store = Arc::new(InMemoryStore::new());
    let ctx = CommandContext::builder()
        .store(store.clone())
        .business(
            BusinessContext::builder()
                .correlation_id("demo-1".to_string())
                .build(),
        )
        .build();

    // 作者先落盘，再并行保存两本书；只有第一本书接到作者交接
    let mut publish = CommandList::sequential()
        .with(SaveCommand::new(Author {
            id: "a-1".to_string(),
            name: "Ada".to_string(),
        }))
        .with(
            CommandList::parallel()
                .with(book("b-1", "Notes"))
                .with(book("b-2", "Sketches")),
        );

    match publish.execute(&ctx).await {
        Ok(_) => println!(
            "published: {} rows in {} batches",
            store.len(),
            store.batch_count()
        ),
        Err(err) => println!("publish failed: {err}"),
    }
    if let Ok(Some(first)) = store.get_as::<Book>("book", "b-1") {
        println!("b-1 author: {:?}", first.author_id);
    }

    let mut broken = CommandList::parallel()
        .with(SaveCommand::new(Author {
            id: "a-2".to_string(),
            name: " ".to_string(),
        }))
        .with(book("b-3", ""));

    if let Err(err) = broken.execute(&ctx).await {
        tracing::warn!(error = %err, "validation failed");
        println!("errors: {}", broken.errors());
    }
    println!("rows after failure: {}", store.len());
}
