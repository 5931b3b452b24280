//! Shared fixtures for the frugal-json benchmarks

use std::sync::Once;

pub const SMALL_JSON: &str = r#"{"id": 1, "name": "test", "status": "active"}"#;

pub const MEDIUM_JSON: &str = r#"{
  "user": {
    "id": 12345,
    "name": "John Doe",
    "email": "john.doe@example.com",
    "status": "active",
    "profile": {
      "bio": "Software engineer",
      "location": "San Francisco",
      "company": "TechCorp"
    },
    "posts": [
      {"id": 1, "title": "Hello World", "likes": 25},
      {"id": 2, "title": "Tech Tips", "likes": 42}
    ]
  }
}"#;

/// Catalogue document with `items` entries
pub fn generate_large_json(items: usize) -> String {
    let entries: Vec<String> = (0..items)
        .map(|i| {
            format!(
                r#"{{
            "id": {i},
            "name": "Item {i}",
            "description": "This is item number {i} with some content",
            "price": {:.2},
            "category": "Category {}",
            "active": {},
            "metadata": {{
                "created": "2024-01-01T10:30:00Z",
                "tags": ["tag1", "tag2", "tag3"]
            }}
        }}"#,
                i as f64 * 1.5 + 10.0,
                i % 10,
                i % 2 == 0
            )
        })
        .collect();

    format!(
        r#"{{
        "data": [{}],
        "total": {items},
        "page": 1,
        "metadata": {{
            "generated_at": "2024-01-15T12:00:00Z",
            "version": "1.0"
        }}
    }}"#,
        entries.join(",")
    )
}

/// Install a fmt subscriber once; filter with `RUST_LOG`
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}
