//! Extractors for the current export layout (`your_facebook_activity/...`).

use serde_json::Value;
use std::path::Path;

use crate::error::Ignored;
use crate::models::{Interest, PhotoRecord, Post};
use crate::parser::resolve::resolve_local_path;
use crate::parser::rules::{
    collect_items, list_under, require_object, Bucket, Extracted, Layout, Rule,
};
use crate::utils::{list_field, opt_str_field, parse_timestamp, str_field};

const UNCATEGORIZED_TITLE: &str = "Uncategorized Photo";
const UNKNOWN_ALBUM: &str = "Unknown Album";

pub fn rules() -> Vec<Rule> {
    vec![
        Rule::new(
            "current-posts",
            Layout::Current,
            Bucket::Posts,
            |f| f.name_contains(&["your_posts__check_ins__photos"]),
            |v, _| Ok(Extracted::Posts(posts(v)?)),
        ),
        Rule::new(
            "current-photos",
            Layout::Current,
            Bucket::Photos,
            |f| f.name_contains(&["your_uncategorized_photos"]) || f.path_contains("album"),
            |v, root| Ok(Extracted::Photos(photos(v, root)?)),
        ),
        Rule::new(
            "current-interests",
            Layout::Current,
            Bucket::Interests,
            |f| f.name_contains(&["pages_you've_liked", "pages_you_have_liked"]),
            |v, _| Ok(Extracted::Interests(liked_pages(v)?)),
        ),
    ]
}

/// Posts are a bare top-level list.
pub fn posts(value: &Value) -> Result<Vec<Post>, Ignored> {
    let items = value
        .as_array()
        .ok_or_else(|| Ignored::new("posts file is not a list"))?;

    Ok(collect_items(items, "post", |item| {
        let item = require_object(item)?;
        Ok(Post {
            timestamp: parse_timestamp(item.get("timestamp")),
            title: str_field(item, "title"),
            data: list_field(item, "data"),
            attachments: list_field(item, "attachments"),
        })
    }))
}

/// Uncategorized photos live under `other_photos_v2`; album files carry the album `name` and
/// a `photos` list.
pub fn photos(value: &Value, root: &Path) -> Result<Vec<PhotoRecord>, Ignored> {
    let mut out = collect_items(list_under(value, "other_photos_v2")?, "photo", |item| {
        Ok(photo(require_object(item)?, UNCATEGORIZED_TITLE.to_string(), root))
    });

    let album = opt_str_field(value, "name").unwrap_or_else(|| UNKNOWN_ALBUM.to_string());
    out.extend(collect_items(list_under(value, "photos")?, "photo", |item| {
        let item = require_object(item)?;
        let title = opt_str_field(item, "title").unwrap_or_else(|| album.clone());
        let mut record = photo(item, title, root);
        record.description = str_field(item, "description");
        Ok(record)
    }));

    Ok(out)
}

fn photo(item: &Value, title: String, root: &Path) -> PhotoRecord {
    let source_uri = str_field(item, "uri");
    PhotoRecord {
        title,
        description: String::new(),
        creation_time: parse_timestamp(item.get("creation_timestamp")),
        resolved_local_path: resolve_local_path(&source_uri, root),
        source_uri,
        metadata: item
            .get("media_metadata")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
        comments: Vec::new(),
        reactions: Vec::new(),
    }
}

pub fn liked_pages(value: &Value) -> Result<Vec<Interest>, Ignored> {
    Ok(collect_items(list_under(value, "page_likes_v2")?, "liked page", |item| {
        let item = require_object(item)?;
        Ok(Interest {
            name: str_field(item, "name"),
            category: "Page".to_string(),
            timestamp: parse_timestamp(item.get("timestamp")),
            url: opt_str_field(item, "url"),
        })
    }))
}
