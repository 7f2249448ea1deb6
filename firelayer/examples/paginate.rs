//! Pages through the newest active users, two at a time.
//!
//! ```text
//! FIRESTORE_EMULATOR_HOST=localhost:8080 FIRELAYER_CONTEXT=admin cargo run -p firelayer --example paginate
//! ```

use firelayer::prelude::*;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct User {
    name: String,
    age: u32,
    active: bool,
    created_at: Timestamp,
}

const PAGE_SIZE: u32 = 2;

fn active_newest_first(after: Option<Timestamp>) -> QueryOptions {
    let builder = QueryOptions::builder()
        .filter(Field::new("active").eq(true))
        .order_by("createdAt", Direction::Desc)
        .limit(PAGE_SIZE);

    match after {
        Some(created_at) => builder.start_after(created_at).build(),
        None => builder.build(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let context: ExecutionContext = std::env::var("FIRELAYER_CONTEXT")
        .unwrap_or_else(|_| "admin".into())
        .parse()?;
    let config = FirebaseConfig::new()
        .with_project_id(std::env::var("GOOGLE_CLOUD_PROJECT").unwrap_or_else(|_| "demo-test-project".into()))
        .with_emulator_host(std::env::var("FIRESTORE_EMULATOR_HOST").unwrap_or_else(|_| "localhost:8080".into()));

    let store = create_database(context, config);

    for (id, name, age, active, created_at) in [
        ("user1", "John Doe", 30, true, "2024-01-01T00:00:00Z"),
        ("user2", "Jane Smith", 25, true, "2024-01-02T00:00:00Z"),
        ("user3", "Bob Johnson", 35, true, "2024-01-03T00:00:00Z"),
        ("user4", "Tim Young", 41, false, "2024-01-04T00:00:00Z"),
    ] {
        let user = User {
            name: name.into(),
            age,
            active,
            created_at: created_at.parse()?,
        };
        store.set_document("users", id, &user).await?;
    }

    let mut cursor: Option<Timestamp> = None;
    let mut page = 1;
    loop {
        let users: Vec<User> = store
            .query("users", active_newest_first(cursor))
            .await?;
        if users.is_empty() {
            break;
        }

        println!("page {page}:");
        for user in &users {
            println!("  {} ({}), joined {}", user.name, user.age, user.created_at);
        }

        cursor = users.last().map(|user| user.created_at);
        page += 1;
    }

    Ok(())
}
