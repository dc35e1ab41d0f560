//! Task document schema
//!
//! Tasks are shared with other services writing to the same collection, so
//! every field tolerates being absent and unknown fields are ignored.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Deserializer, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::tasks::Priority;

/// Default collection name for tasks
pub const TASK_COLLECTION: &str = "tasks";

/// Task document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct TaskDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,

    /// Due date; tasks without one are never reclassified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime>,

    /// Stored label. `None` when missing or not one of HIGH/MEDIUM/LOW.
    #[serde(
        default,
        deserialize_with = "lenient_priority",
        skip_serializing_if = "Option::is_none"
    )]
    pub priority: Option<Priority>,
}

impl TaskDoc {
    /// Create a new task document (no ID until inserted)
    pub fn new(
        title: String,
        description: String,
        deadline: Option<DateTime>,
        priority: Option<Priority>,
    ) -> Self {
        Self {
            _id: None,
            title,
            description,
            deadline,
            priority,
        }
    }

    /// Hex form of the document ID, empty if not yet stored
    pub fn id_hex(&self) -> String {
        self._id.map(|id| id.to_hex()).unwrap_or_default()
    }
}

/// Read a text field, treating `null` as empty
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read a stored label, treating anything outside the label set as absent
fn lenient_priority<'de, D>(deserializer: D) -> Result<Option<Priority>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<bson::Bson>::deserialize(deserializer)?;
    Ok(match raw {
        Some(bson::Bson::String(s)) => s.parse().ok(),
        _ => None,
    })
}

impl IntoIndexes for TaskDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "deadline": 1 },
            Some(
                IndexOptions::builder()
                    .name("deadline_index".to_string())
                    .build(),
            ),
        )]
    }
}
