//! Project data shared by the integration tests

use std::sync::Arc;

use quill_core::ProjectSnapshot;
use quill_tools::{InMemoryStore, ToolContext};

pub const SNAPSHOT: &str = r#"{
    "project": {"title": "The Salt Road", "genre": "fantasy", "tense": "past", "point_of_view": "close third"},
    "characters": [
        {"id": "c1", "name": "Mara Venn", "role": "protagonist", "goals": "Find her brother at the salt mines"},
        {"id": "c2", "name": "Oren", "role": "mentor"}
    ],
    "locations": [
        {"id": "l1", "name": "Harbour of Tesk", "type": "port", "description": "Fog and salt"}
    ],
    "chapters": [
        {"id": "ch1", "title": "Arrival", "order": 1,
         "content": "Mara stepped off the ferry.\n\nThe harbour smelled of salt.\n\n* * *\n\nOren waited by the lighthouse."}
    ],
    "style_guide": [
        {"id": "s1", "title": "Tense", "category": "grammar", "content": "Past tense throughout."}
    ]
}"#;

pub fn snapshot() -> ProjectSnapshot {
    ProjectSnapshot::from_json(SNAPSHOT).unwrap()
}

pub fn tool_context() -> (ToolContext, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new(snapshot()));
    (ToolContext::new(store.clone()), store)
}
