//! Extractors for the older `*_v2` export layout (`profile_information.json`,
//! `photos_v2`, `status_updates`, ...).

use serde_json::Value;
use std::path::Path;

use crate::error::Ignored;
use crate::models::{
    Comment, EntryKind, Friend, Interest, PhotoRecord, Post, ProfileInfo, Reaction, WorkEducation,
};
use crate::parser::resolve::resolve_local_path;
use crate::parser::rules::{
    collect_items, list_under, require_object, Bucket, Extracted, Layout, Rule,
};
use crate::utils::{
    fix_mojibake, list_field, name_or_text, opt_str_field, parse_birthday, parse_timestamp,
    str_field,
};

pub fn rules() -> Vec<Rule> {
    vec![
        Rule::new(
            "legacy-profile",
            Layout::Legacy,
            Bucket::Profile,
            |f| f.name_contains(&["profile_information"]),
            |v, _| Ok(Extracted::Profile(profile(v)?)),
        ),
        Rule::new(
            "legacy-photos",
            Layout::Legacy,
            Bucket::Photos,
            |f| f.name_contains(&["photos"]),
            |v, root| Ok(Extracted::Photos(photos(v, root)?)),
        ),
        Rule::new(
            "legacy-posts",
            Layout::Legacy,
            Bucket::Posts,
            |f| f.name_contains(&["posts", "status"]),
            |v, _| Ok(Extracted::Posts(status_updates(v)?)),
        ),
        Rule::new(
            "legacy-friends",
            Layout::Legacy,
            Bucket::Friends,
            |f| f.name_contains(&["friends"]),
            |v, _| Ok(Extracted::Friends(friends(v)?)),
        ),
        Rule::new(
            "legacy-interests",
            Layout::Legacy,
            Bucket::Interests,
            |f| f.name_contains(&["likes", "pages"]),
            |v, _| Ok(Extracted::Interests(page_likes(v)?)),
        ),
        Rule::new(
            "legacy-work-education",
            Layout::Legacy,
            Bucket::WorkEducation,
            |f| f.name_contains(&["work", "education", "profile_information"]),
            |v, _| Ok(Extracted::WorkEducation(work_education(v)?)),
        ),
    ]
}

/// Reads `path` inside `value`, e.g. `["name", "full_name"]`.
fn nested_str(value: &Value, path: &[&str]) -> Option<String> {
    let mut cur = value;
    for key in path {
        cur = cur.get(key)?;
    }
    cur.as_str().filter(|s| !s.is_empty()).map(fix_mojibake)
}

pub fn profile(value: &Value) -> Result<ProfileInfo, Ignored> {
    let Some(p) = value.get("profile_v2") else {
        return Ok(ProfileInfo::default());
    };
    let p = require_object(p)?;

    Ok(ProfileInfo {
        name: nested_str(p, &["name", "full_name"]).or_else(|| opt_str_field(p, "name")),
        birthday: parse_birthday(p.get("birthday")),
        gender: nested_str(p, &["gender", "pronoun"]),
        location: name_or_text(p.get("current_city")),
        hometown: name_or_text(p.get("hometown")),
        relationship_status: nested_str(p, &["relationship", "status"]),
        bio: nested_str(p, &["bio", "text"]),
        website: opt_str_field(p, "website"),
        email: opt_str_field(p, "email"),
        phone: opt_str_field(p, "phone"),
    })
}

pub fn photos(value: &Value, root: &Path) -> Result<Vec<PhotoRecord>, Ignored> {
    Ok(collect_items(list_under(value, "photos_v2")?, "photo", |item| {
        let item = require_object(item)?;
        let source_uri = str_field(item, "uri");
        Ok(PhotoRecord {
            title: str_field(item, "title"),
            description: str_field(item, "description"),
            creation_time: parse_timestamp(item.get("creation_timestamp")),
            resolved_local_path: resolve_local_path(&source_uri, root),
            source_uri,
            metadata: item
                .get("media_metadata")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
            comments: comments(&list_field(item, "comments")),
            reactions: reactions(&list_field(item, "reactions")),
        })
    }))
}

fn comments(items: &[Value]) -> Vec<Comment> {
    collect_items(items, "comment", |c| {
        let c = require_object(c)?;
        Ok(Comment {
            author: str_field(c, "author"),
            text: str_field(c, "comment"),
            timestamp: parse_timestamp(c.get("timestamp")),
        })
    })
}

fn reactions(items: &[Value]) -> Vec<Reaction> {
    collect_items(items, "reaction", |r| {
        let r = require_object(r)?;
        Ok(Reaction {
            reaction: str_field(r, "reaction"),
            actor: str_field(r, "actor"),
        })
    })
}

pub fn status_updates(value: &Value) -> Result<Vec<Post>, Ignored> {
    Ok(collect_items(list_under(value, "status_updates")?, "post", |item| {
        let item = require_object(item)?;
        Ok(Post {
            timestamp: parse_timestamp(item.get("timestamp")),
            title: str_field(item, "title"),
            data: list_field(item, "data"),
            attachments: list_field(item, "attachments"),
        })
    }))
}

pub fn friends(value: &Value) -> Result<Vec<Friend>, Ignored> {
    Ok(collect_items(list_under(value, "friends_v2")?, "friend", |item| {
        let item = require_object(item)?;
        Ok(Friend {
            name: str_field(item, "name"),
            timestamp: parse_timestamp(item.get("timestamp")),
        })
    }))
}

pub fn page_likes(value: &Value) -> Result<Vec<Interest>, Ignored> {
    Ok(collect_items(list_under(value, "page_likes_v2")?, "page like", |item| {
        let item = require_object(item)?;
        Ok(Interest {
            name: str_field(item, "name"),
            category: str_field(item, "category"),
            timestamp: parse_timestamp(item.get("timestamp")),
            url: None,
        })
    }))
}

pub fn work_education(value: &Value) -> Result<Vec<WorkEducation>, Ignored> {
    let mut out = collect_items(list_under(value, "work_v2")?, "work", |item| {
        let item = require_object(item)?;
        Ok(WorkEducation {
            kind: EntryKind::Work,
            organization: name_or_text(item.get("employer")).unwrap_or_default(),
            title: str_field(item, "position"),
            field_of_study: String::new(),
            location: name_or_text(item.get("location")).unwrap_or_default(),
            start_date: parse_timestamp(item.get("start_timestamp")),
            end_date: parse_timestamp(item.get("end_timestamp")),
        })
    });

    out.extend(collect_items(list_under(value, "education_v2")?, "education", |item| {
        let item = require_object(item)?;
        Ok(WorkEducation {
            kind: EntryKind::Education,
            organization: name_or_text(item.get("school")).unwrap_or_default(),
            title: str_field(item, "degree"),
            field_of_study: str_field(item, "field_of_study"),
            location: name_or_text(item.get("location")).unwrap_or_default(),
            start_date: parse_timestamp(item.get("start_timestamp")),
            end_date: parse_timestamp(item.get("end_timestamp")),
        })
    }));

    Ok(out)
}
