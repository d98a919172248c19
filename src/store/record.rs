//! Record types held by the document store.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The whole persisted state: collection name -> records in insertion order.
pub type Database = BTreeMap<String, Vec<Record>>;

/// One row of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    pub(crate) fn new(id: Uuid, fields: NewRecord, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: fields.title,
            description: fields.description,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Advance `updated_at`, keeping it strictly increasing even when two
    /// mutations land on the same clock reading.
    fn touch(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::nanoseconds(1)
        };
        self.updated_at
    }

    pub(crate) fn apply(&mut self, patch: RecordPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        self.touch(now);
    }

    pub(crate) fn toggle_completion(&mut self, now: DateTime<Utc>) {
        let stamp = self.touch(now);
        self.completed_at = match self.completed_at {
            Some(_) => None,
            None => Some(stamp),
        };
    }
}

/// Caller-supplied fields for a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub title: String,
    pub description: String,
}

impl NewRecord {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

/// Substring search criteria.
///
/// Only one criterion is applied: `title` when set, otherwise
/// `description`. A filter with neither matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl Filter {
    pub fn by_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            description: None,
        }
    }

    pub fn by_description(description: impl Into<String>) -> Self {
        Self {
            title: None,
            description: Some(description.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }

    pub fn matches(&self, record: &Record) -> bool {
        match (&self.title, &self.description) {
            (Some(title), _) => contains_ignore_case(&record.title, title),
            (None, Some(description)) => contains_ignore_case(&record.description, description),
            (None, None) => false,
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, description: &str) -> Record {
        Record::new(Uuid::new_v4(), NewRecord::new(title, description), Utc::now())
    }

    #[test]
    fn test_new_record_timestamps() {
        let r = record("A", "B");
        assert_eq!(r.created_at, r.updated_at);
        assert!(!r.is_completed());
    }

    #[test]
    fn test_touch_is_strictly_increasing() {
        let mut r = record("A", "B");
        let frozen = r.updated_at;

        r.apply(RecordPatch::default(), frozen);
        assert!(r.updated_at > frozen);

        // A clock reading from the past still moves forward
        let before = r.updated_at;
        r.apply(RecordPatch::default(), frozen - Duration::seconds(5));
        assert!(r.updated_at > before);
        assert!(r.created_at <= r.updated_at);
    }

    #[test]
    fn test_toggle_is_an_involution() {
        let mut r = record("A", "B");
        let now = r.updated_at;

        r.toggle_completion(now);
        assert_eq!(r.completed_at, Some(r.updated_at));

        r.toggle_completion(now);
        assert_eq!(r.completed_at, None);
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let mut r = record("A", "B");
        r.apply(
            RecordPatch {
                title: Some("A2".into()),
                description: None,
            },
            Utc::now(),
        );
        assert_eq!(r.title, "A2");
        assert_eq!(r.description, "B");
    }

    #[test]
    fn test_filter_semantics() {
        let foobar = record("Foobar", "x");
        let afoo = record("afoo", "y");
        let fox = record("FOX", "foo in description");

        let by_title = Filter::by_title("Foo");
        assert!(by_title.matches(&foobar));
        assert!(by_title.matches(&afoo));
        assert!(!by_title.matches(&fox));

        let by_description = Filter::by_description("FOO");
        assert!(by_description.matches(&fox));
        assert!(!by_description.matches(&foobar));

        // Title wins when both are set
        let both = Filter {
            title: Some("fox".into()),
            description: Some("x".into()),
        };
        assert!(both.matches(&fox));
        assert!(!both.matches(&foobar));

        assert!(!Filter::default().matches(&foobar));
    }

    #[test]
    fn test_record_json_shape() {
        let r = record("A", "B");
        let json = serde_json::to_value(&r).unwrap();
        let obj = json.as_object().unwrap();
        for key in ["id", "title", "description", "completed_at", "created_at", "updated_at"] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert!(obj["completed_at"].is_null());
        assert!(obj["created_at"].as_str().unwrap().parse::<DateTime<Utc>>().is_ok());
    }
}
