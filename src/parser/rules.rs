//! File routing for archive imports.
//!
//! Export producers rename files and keys between versions, so files are matched by
//! substrings of their name or relative path. Every rule whose predicate matches a file runs
//! against it; a file can feed several buckets.

use serde_json::Value;
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::error::Ignored;
use crate::models::{
    Friend, Interest, ParsedExportBundle, PhotoRecord, Post, ProfileInfo, WorkEducation,
};
use crate::parser::{current, legacy};

/// Lower-cased name and archive-relative path of one export file.
#[derive(Debug, Clone)]
pub struct FileName {
    pub name: String,
    pub relative_path: String,
}

impl FileName {
    pub fn new(path: &Path, root: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let relative_path = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .to_lowercase();
        Self {
            name,
            relative_path,
        }
    }

    pub fn name_contains(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.name.contains(n))
    }

    pub fn path_contains(&self, needle: &str) -> bool {
        self.relative_path.contains(needle)
    }
}

/// What one extractor pulled out of one file.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    Profile(ProfileInfo),
    Photos(Vec<PhotoRecord>),
    Posts(Vec<Post>),
    Friends(Vec<Friend>),
    Interests(Vec<Interest>),
    WorkEducation(Vec<WorkEducation>),
}

/// The bundle field a rule feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Profile,
    Photos,
    Posts,
    Friends,
    Interests,
    WorkEducation,
}

impl Extracted {
    pub fn bucket(&self) -> Bucket {
        match self {
            Extracted::Profile(_) => Bucket::Profile,
            Extracted::Photos(_) => Bucket::Photos,
            Extracted::Posts(_) => Bucket::Posts,
            Extracted::Friends(_) => Bucket::Friends,
            Extracted::Interests(_) => Bucket::Interests,
            Extracted::WorkEducation(_) => Bucket::WorkEducation,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Extracted::Profile(info) => usize::from(*info != ProfileInfo::default()),
            Extracted::Photos(v) => v.len(),
            Extracted::Posts(v) => v.len(),
            Extracted::Friends(v) => v.len(),
            Extracted::Interests(v) => v.len(),
            Extracted::WorkEducation(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ParsedExportBundle {
    pub fn absorb(&mut self, extracted: Extracted) {
        match extracted {
            Extracted::Profile(info) => self.profile_info.merge(info),
            Extracted::Photos(v) => self.photos.extend(v),
            Extracted::Posts(v) => self.posts.extend(v),
            Extracted::Friends(v) => self.friends.extend(v),
            Extracted::Interests(v) => self.interests.extend(v),
            Extracted::WorkEducation(v) => self.work_education.extend(v),
        }
    }
}

/// Which export generation a rule was written against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Legacy,
    Current,
    Custom,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Layout::Legacy => "legacy",
            Layout::Current => "current",
            Layout::Custom => "custom",
        })
    }
}

type Predicate = Box<dyn Fn(&FileName) -> bool + Send + Sync>;
type Extractor = Box<dyn Fn(&Value, &Path) -> Result<Extracted, Ignored> + Send + Sync>;

pub struct Rule {
    pub name: &'static str,
    pub layout: Layout,
    pub bucket: Bucket,
    predicate: Predicate,
    extractor: Extractor,
}

impl Rule {
    pub fn new<P, E>(
        name: &'static str,
        layout: Layout,
        bucket: Bucket,
        predicate: P,
        extractor: E,
    ) -> Self
    where
        P: Fn(&FileName) -> bool + Send + Sync + 'static,
        E: Fn(&Value, &Path) -> Result<Extracted, Ignored> + Send + Sync + 'static,
    {
        Self {
            name,
            layout,
            bucket,
            predicate: Box::new(predicate),
            extractor: Box::new(extractor),
        }
    }

    pub fn matches(&self, file: &FileName) -> bool {
        (self.predicate)(file)
    }

    /// `root` is the directory declared photo URIs are resolved against.
    pub fn extract(&self, value: &Value, root: &Path) -> Result<Extracted, Ignored> {
        (self.extractor)(value, root)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("layout", &self.layout)
            .field("bucket", &self.bucket)
            .finish()
    }
}

/// Ordered rule table. Rules are evaluated in insertion order; every matching rule runs, but
/// once a rule has filled a bucket for a file, later rules targeting the same bucket are
/// skipped for that file.
#[derive(Debug)]
pub struct Router {
    rules: Vec<Rule>,
}

impl Router {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn push(&mut self, rule: Rule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn matching<'a>(&'a self, file: &'a FileName) -> impl Iterator<Item = &'a Rule> + 'a {
        self.rules.iter().filter(move |rule| {
            let hit = rule.matches(file);
            if hit {
                debug!(rule = rule.name, layout = %rule.layout, file = %file.relative_path, "rule matched");
            }
            hit
        })
    }
}

impl Default for Router {
    /// Current-layout rules first, then the legacy ones.
    fn default() -> Self {
        let mut router = Self::empty();
        for rule in current::rules().into_iter().chain(legacy::rules()) {
            router.push(rule);
        }
        router
    }
}

/// Maps every element of a list through `f`, dropping elements that fail.
pub(crate) fn collect_items<T>(
    items: &[Value],
    what: &str,
    mut f: impl FnMut(&Value) -> Result<T, Ignored>,
) -> Vec<T> {
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| match f(item) {
            Ok(v) => Some(v),
            Err(ignored) => {
                debug!(index = i, kind = what, reason = %ignored, "skipping record");
                None
            }
        })
        .collect()
}

pub(crate) fn require_object(value: &Value) -> Result<&Value, Ignored> {
    if value.is_object() {
        Ok(value)
    } else {
        Err(Ignored::new("record is not an object"))
    }
}

/// A list under `key`; a missing key is an empty list, anything else is a shape error.
pub(crate) fn list_under<'a>(value: &'a Value, key: &str) -> Result<&'a [Value], Ignored> {
    match value.get(key) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(Ignored::new(format!("`{key}` is not a list"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn file(rel: &str) -> FileName {
        let root = PathBuf::from("/export");
        FileName::new(&root.join(rel), &root)
    }

    fn names<'a>(router: &'a Router, f: &'a FileName) -> Vec<&'static str> {
        router.matching(f).map(|r| r.name).collect()
    }

    #[test]
    fn file_names_are_lower_cased() {
        let f = file("Your_Activity/Photos/Album/0.JSON");
        assert_eq!(f.name, "0.json");
        assert_eq!(f.relative_path, "your_activity/photos/album/0.json");
    }

    #[test]
    fn matching_is_non_exclusive() {
        let router = Router::default();
        let f = file("posts/your_posts__check_ins__photos_and_videos_1.json");
        let hits = names(&router, &f);
        assert!(hits.contains(&"current-posts"));
        assert!(hits.contains(&"legacy-photos"));
        assert!(hits.contains(&"legacy-posts"));
    }

    #[test]
    fn album_path_routes_to_photos() {
        let router = Router::default();
        let f = file("your_facebook_activity/posts/album/0.json");
        assert_eq!(names(&router, &f), vec!["current-photos"]);
    }

    #[test]
    fn unrecognised_files_match_nothing() {
        let router = Router::default();
        assert!(names(&router, &file("security/login_history.json")).is_empty());
    }

    #[test]
    fn custom_rules_extend_the_table() {
        let mut router = Router::default();
        router.push(Rule::new(
            "followers",
            Layout::Custom,
            Bucket::Friends,
            |f| f.name_contains(&["followers"]),
            |v, _| {
                let friends = collect_items(list_under(v, "followers_v2")?, "friend", |item| {
                    Ok(Friend {
                        name: crate::utils::str_field(require_object(item)?, "name"),
                        timestamp: None,
                    })
                });
                Ok(Extracted::Friends(friends))
            },
        ));

        let f = file("connections/followers.json");
        let rule = router.matching(&f).next().expect("custom rule");
        let out = rule
            .extract(&json!({"followers_v2": [{"name": "Kim"}, 3]}), Path::new("/export"))
            .unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn wrong_shape_under_key_is_ignored() {
        let v = json!({"photos_v2": {"not": "a list"}});
        assert!(list_under(&v, "photos_v2").is_err());
        assert!(list_under(&v, "missing").unwrap().is_empty());
    }
}
