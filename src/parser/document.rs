//! Key sniffing for a single JSON document of unknown shape.
//!
//! Each top-level key is matched by substring; the first matching category wins for that
//! key. Values of the wrong shape contribute nothing.

use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::Ignored;
use crate::models::{
    EntryKind, Friend, Interest, ParsedExportBundle, PhotoRecord, Post, ProfileInfo,
    WorkEducation,
};
use crate::parser::resolve::resolve_local_path;
use crate::parser::rules::{collect_items, require_object, Extracted};
use crate::utils::{
    list_field, name_or_text, opt_str_field, parse_birthday, str_field, timestamp_field,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Profile,
    Photos,
    Posts,
    Friends,
    Interests,
    WorkEducation,
}

fn categorize(key: &str) -> Option<Category> {
    let key = key.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| key.contains(n));

    if has(&["profile"]) {
        Some(Category::Profile)
    } else if has(&["photo"]) {
        Some(Category::Photos)
    } else if has(&["post", "status"]) {
        Some(Category::Posts)
    } else if has(&["friend"]) {
        Some(Category::Friends)
    } else if has(&["like", "page"]) {
        Some(Category::Interests)
    } else if has(&["work", "education"]) {
        Some(Category::WorkEducation)
    } else {
        None
    }
}

/// Extracts whatever is recognisable from `document`; photo URIs resolve against `base`.
pub fn process_document(document: &Value, base: &Path) -> ParsedExportBundle {
    let mut bundle = ParsedExportBundle::default();

    let Some(obj) = document.as_object() else {
        warn!("export document is not a JSON object; nothing to extract");
        return bundle;
    };

    for (key, value) in obj {
        let Some(category) = categorize(key) else {
            debug!(key = key.as_str(), "unrecognised top-level key");
            continue;
        };
        match extract(category, value, base) {
            Ok(extracted) => bundle.absorb(extracted),
            Err(ignored) => warn!(key = key.as_str(), reason = %ignored, "skipping section"),
        }
    }

    bundle
}

fn extract(category: Category, value: &Value, base: &Path) -> Result<Extracted, Ignored> {
    let items = || {
        value
            .as_array()
            .ok_or_else(|| Ignored::new("section is not a list"))
    };

    Ok(match category {
        Category::Profile => Extracted::Profile(profile(value)?),
        Category::Photos => Extracted::Photos(collect_items(items()?, "photo", |item| {
            let item = require_object(item)?;
            let source_uri = str_field(item, "uri");
            Ok(PhotoRecord {
                title: str_field(item, "title"),
                description: str_field(item, "description"),
                creation_time: timestamp_field(item, "timestamp")
                    .or_else(|| timestamp_field(item, "creation_timestamp")),
                resolved_local_path: resolve_local_path(&source_uri, base),
                source_uri,
                ..Default::default()
            })
        })),
        Category::Posts => Extracted::Posts(collect_items(items()?, "post", |item| {
            let item = require_object(item)?;
            Ok(Post {
                timestamp: timestamp_field(item, "timestamp"),
                title: str_field(item, "title"),
                data: list_field(item, "data"),
                attachments: list_field(item, "attachments"),
            })
        })),
        Category::Friends => Extracted::Friends(collect_items(items()?, "friend", |item| {
            let item = require_object(item)?;
            Ok(Friend {
                name: str_field(item, "name"),
                timestamp: timestamp_field(item, "timestamp"),
            })
        })),
        Category::Interests => Extracted::Interests(collect_items(items()?, "interest", |item| {
            let item = require_object(item)?;
            Ok(Interest {
                name: str_field(item, "name"),
                category: str_field(item, "category"),
                timestamp: timestamp_field(item, "timestamp"),
                url: opt_str_field(item, "url"),
            })
        })),
        Category::WorkEducation => {
            Extracted::WorkEducation(collect_items(items()?, "work/education", |item| {
                let item = require_object(item)?;
                let is_work = item.get("employer").is_some();
                let (org_key, title_key) = if is_work {
                    ("employer", "position")
                } else {
                    ("school", "degree")
                };
                Ok(WorkEducation {
                    kind: if is_work {
                        EntryKind::Work
                    } else {
                        EntryKind::Education
                    },
                    organization: name_or_text(item.get(org_key)).unwrap_or_default(),
                    title: str_field(item, title_key),
                    field_of_study: str_field(item, "field_of_study"),
                    location: name_or_text(item.get("location")).unwrap_or_default(),
                    start_date: timestamp_field(item, "start_timestamp"),
                    end_date: timestamp_field(item, "end_timestamp"),
                })
            }))
        }
    })
}

/// Accepts both flat (`"name": "..."`) and nested (`"name": {"full_name": ...}`) shapes.
fn profile(value: &Value) -> Result<ProfileInfo, Ignored> {
    let p = require_object(value)?;

    let name = opt_str_field(p, "name").or_else(|| {
        p.get("name")
            .and_then(|n| n.get("full_name"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    });
    let birthday = opt_str_field(p, "birthday").or_else(|| parse_birthday(p.get("birthday")));
    let bio = opt_str_field(p, "bio").or_else(|| {
        p.get("bio")
            .and_then(|b| b.get("text"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    });

    Ok(ProfileInfo {
        name,
        birthday,
        location: name_or_text(p.get("location")),
        bio,
        website: opt_str_field(p, "website"),
        email: opt_str_field(p, "email"),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    #[test]
    fn keys_are_routed_by_substring() {
        assert_eq!(categorize("profile_v2"), Some(Category::Profile));
        assert_eq!(categorize("Photos"), Some(Category::Photos));
        assert_eq!(categorize("status_updates"), Some(Category::Posts));
        assert_eq!(categorize("friends_v2"), Some(Category::Friends));
        assert_eq!(categorize("page_likes_v2"), Some(Category::Interests));
        assert_eq!(categorize("work_history"), Some(Category::WorkEducation));
        assert_eq!(categorize("security"), None);
        // first match wins: "profile_photos" is a profile section
        assert_eq!(categorize("profile_photos"), Some(Category::Profile));
    }

    #[test]
    fn mixed_document_fills_every_bucket() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("me.jpg"), b"jpeg").unwrap();

        let doc = json!({
            "profile": {"name": "Alex Kim", "birthday": "1990-05-17", "location": {"name": "Austin"}},
            "photos": [{"title": "Me", "uri": "me.jpg", "timestamp": 1_650_000_000}, "junk"],
            "posts": [{"title": "Alex Kim shared a memory.", "timestamp": "2022-01-01T10:00:00"}],
            "friends": [{"name": "Sam"}],
            "likes": [{"name": "Climbing", "category": "Sport"}],
            "work": [
                {"employer": "Tech Corp", "position": "Software Engineer"},
                {"school": "UT Austin", "degree": "BS"}
            ],
            "unknown": {"x": 1}
        });

        let bundle = process_document(&doc, dir.path());
        assert_eq!(bundle.profile_info.name.as_deref(), Some("Alex Kim"));
        assert_eq!(bundle.profile_info.birthday.as_deref(), Some("1990-05-17"));
        assert_eq!(bundle.profile_info.location.as_deref(), Some("Austin"));
        assert_eq!(bundle.photos.len(), 1);
        assert!(bundle.photos[0].resolved_local_path.is_some());
        assert!(bundle.photos[0].creation_time.is_some());
        assert_eq!(bundle.posts[0].timestamp.as_deref(), Some("2022-01-01T10:00:00"));
        assert_eq!(bundle.friends.len(), 1);
        assert_eq!(bundle.interests[0].category, "Sport");
        assert_eq!(bundle.work_education[0].kind, EntryKind::Work);
        assert_eq!(bundle.work_education[1].kind, EntryKind::Education);
        assert_eq!(bundle.work_education[1].organization, "UT Austin");
    }

    #[test]
    fn wrong_shapes_contribute_nothing() {
        let doc = json!({"photos": {"not": "a list"}, "profile": ["nope"], "friends": 3});
        let bundle = process_document(&doc, Path::new("."));
        assert_eq!(bundle, ParsedExportBundle::default());
    }

    #[test]
    fn non_object_document_is_empty() {
        let bundle = process_document(&json!([1, 2, 3]), Path::new("."));
        assert_eq!(bundle, ParsedExportBundle::default());
    }

    #[test]
    fn nested_profile_shape_is_accepted() {
        let doc = json!({"profile_v2": {
            "name": {"full_name": "Jane Doe"},
            "birthday": {"year": 1994, "month": 6, "day": 2},
            "bio": {"text": "Coffee first."}
        }});
        let info = process_document(&doc, Path::new(".")).profile_info;
        assert_eq!(info.name.as_deref(), Some("Jane Doe"));
        assert_eq!(info.birthday.as_deref(), Some("1994-06-02"));
        assert_eq!(info.bio.as_deref(), Some("Coffee first."));
    }
}
