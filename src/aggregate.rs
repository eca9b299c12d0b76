//! Flattens a parsed export into the record a dating profile is built from.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::models::{DatingProfileData, EntryKind, ParsedExportBundle, PhotoRecord, Post};

const MAX_INTERESTS: usize = 15;
const BIO_INTERESTS: usize = 5;

pub fn aggregate(bundle: &ParsedExportBundle) -> DatingProfileData {
    aggregate_on(bundle, Local::now().date_naive())
}

/// Same as [`aggregate`], with ages computed relative to `today`.
pub fn aggregate_on(bundle: &ParsedExportBundle, today: NaiveDate) -> DatingProfileData {
    let info = &bundle.profile_info;

    let mut name = info.name.clone().unwrap_or_default();
    if name.is_empty() {
        if let Some(found) = name_from_posts(&bundle.posts) {
            debug!(name = found.as_str(), "name taken from post titles");
            name = found;
        }
    }

    let occupation = bundle
        .work_education
        .iter()
        .find(|e| e.kind == EntryKind::Work && e.end_date.is_none())
        .map(|e| format!("{} at {}", e.title, e.organization).trim().to_string());
    let education = bundle
        .work_education
        .iter()
        .find(|e| e.kind == EntryKind::Education)
        .map(|e| format!("{} from {}", e.title, e.organization).trim().to_string());

    let top_interests: Vec<&str> = bundle
        .interests
        .iter()
        .take(MAX_INTERESTS)
        .map(|i| i.name.as_str())
        .filter(|n| !n.is_empty())
        .collect();

    let bio = match info.bio.as_deref() {
        Some(bio) if !bio.is_empty() => bio.to_string(),
        _ if !top_interests.is_empty() => {
            let shown = &top_interests[..top_interests.len().min(BIO_INTERESTS)];
            format!("Interested in {}", shown.join(", "))
        }
        _ => String::new(),
    };

    let photos = available_photos(&bundle.photos);

    DatingProfileData {
        age: info.birthday.as_deref().and_then(|b| age_on(b, today)),
        name,
        occupation,
        education,
        location: info.location.clone().unwrap_or_default(),
        hometown: info.hometown.clone().unwrap_or_default(),
        bio,
        interests: top_interests.join(", "),
        relationship_status: info.relationship_status.clone().unwrap_or_default(),
        total_photos_found: bundle.photos.len(),
        available_photos_count: photos.len(),
        photos,
        posts_analyzed: bundle.posts.len(),
        interests_found: bundle.interests.len(),
    }
}

/// Whole years between `birthday` and `today`, counting a year as 365 days.
fn age_on(birthday: &str, today: NaiveDate) -> Option<u32> {
    let born = NaiveDate::parse_from_str(birthday, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(birthday).ok().map(|d| d.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(birthday, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|d| d.date())
        })
        .filter(|d| d.year() >= 1000)?;
    let days = (today - born).num_days();
    u32::try_from(days.div_euclid(365)).ok()
}

/// Photos whose file exists right now, newest first; undated photos go last.
fn available_photos(photos: &[PhotoRecord]) -> Vec<PhotoRecord> {
    let mut available: Vec<PhotoRecord> = photos
        .iter()
        .filter(|p| p.resolved_local_path.as_ref().is_some_and(|path| path.exists()))
        .cloned()
        .collect();
    // ISO-8601 local timestamps sort lexicographically
    available.sort_by(|a, b| match (&a.creation_time, &b.creation_time) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    available
}

/// "Jane Doe shared a link." -> "Jane Doe".
fn name_from_posts(posts: &[Post]) -> Option<String> {
    posts
        .iter()
        .map(|p| p.title.as_str())
        .filter(|t| t.contains("shared") || t.contains("posted"))
        .find_map(|title| {
            let parts: Vec<&str> = title.split(' ').collect();
            if parts.len() < 2 {
                return None;
            }
            let candidate = parts[..2].join(" ");
            let lower = candidate.to_lowercase();
            let is_verb = ["shared", "posted", "updated"]
                .iter()
                .any(|w| lower.contains(w));
            (!candidate.trim().is_empty() && !is_verb).then_some(candidate)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Interest, ProfileInfo, WorkEducation};
    use std::fs;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn interest(name: &str) -> Interest {
        Interest {
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn age_counts_365_day_years() {
        assert_eq!(age_on("1990-06-01", today()), Some(34));
        assert_eq!(age_on("1990-06-02", today()), Some(34));
        assert_eq!(age_on("1994-01-15T08:00:00", today()), Some(30));
        assert_eq!(age_on("2000-01-01T00:00:00Z", today()), Some(24));
        assert_eq!(age_on("someday", today()), None);
        assert_eq!(age_on("2030-01-01", today()), None);
        assert_eq!(age_on("0000-06-02", today()), None);
        assert_eq!(age_on("0095-06-02", today()), None);
    }

    #[test]
    fn current_job_and_first_school() {
        let bundle = ParsedExportBundle {
            work_education: vec![
                WorkEducation {
                    kind: EntryKind::Work,
                    organization: "Old Co".into(),
                    title: "Intern".into(),
                    end_date: Some("2015-01-01T00:00:00".into()),
                    ..Default::default()
                },
                WorkEducation {
                    kind: EntryKind::Work,
                    organization: "Tech Corp".into(),
                    title: "Software Engineer".into(),
                    ..Default::default()
                },
                WorkEducation {
                    kind: EntryKind::Education,
                    organization: "State University".into(),
                    title: "BSc".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let data = aggregate_on(&bundle, today());
        assert_eq!(data.occupation.as_deref(), Some("Software Engineer at Tech Corp"));
        assert_eq!(data.education.as_deref(), Some("BSc from State University"));
    }

    #[test]
    fn interests_are_capped_and_feed_the_bio() {
        let mut interests: Vec<Interest> = (0..20).map(|i| interest(&format!("i{i}"))).collect();
        interests[1].name.clear();
        let bundle = ParsedExportBundle {
            interests,
            ..Default::default()
        };

        let data = aggregate_on(&bundle, today());
        assert_eq!(data.interests.split(", ").count(), 14);
        assert!(!data.interests.contains("i15"));
        assert_eq!(data.bio, "Interested in i0, i2, i3, i4, i5");
        assert_eq!(data.interests_found, 20);
    }

    #[test]
    fn explicit_bio_wins() {
        let bundle = ParsedExportBundle {
            profile_info: ProfileInfo {
                bio: Some("Coffee first.".into()),
                ..Default::default()
            },
            interests: vec![interest("Jazz")],
            ..Default::default()
        };
        assert_eq!(aggregate_on(&bundle, today()).bio, "Coffee first.");
        assert_eq!(aggregate_on(&ParsedExportBundle::default(), today()).bio, "");
    }

    #[test]
    fn photos_filtered_at_call_time_and_sorted_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut photos = Vec::new();
        for (file, time) in [
            ("a.jpg", Some("2020-01-01T00:00:00")),
            ("b.jpg", None),
            ("c.jpg", Some("2023-05-01T12:00:00")),
            ("d.jpg", Some("2021-01-01T00:00:00")),
        ] {
            let path = dir.path().join(file);
            fs::write(&path, b"x").unwrap();
            photos.push(PhotoRecord {
                title: file.into(),
                creation_time: time.map(str::to_string),
                resolved_local_path: Some(path),
                ..Default::default()
            });
        }
        photos.push(PhotoRecord {
            title: "unresolved".into(),
            ..Default::default()
        });
        let bundle = ParsedExportBundle {
            photos,
            ..Default::default()
        };

        let data = aggregate_on(&bundle, today());
        let order: Vec<&str> = data.photos.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(order, vec!["c.jpg", "d.jpg", "a.jpg", "b.jpg"]);
        assert_eq!(data.total_photos_found, 5);
        assert_eq!(data.available_photos_count, 4);

        fs::remove_file(dir.path().join("d.jpg")).unwrap();
        let data = aggregate_on(&bundle, today());
        assert_eq!(data.available_photos_count, 3);
    }

    #[test]
    fn name_is_backfilled_from_post_titles() {
        let post = |title: &str| Post {
            title: title.into(),
            ..Default::default()
        };
        let bundle = ParsedExportBundle {
            posts: vec![
                post("Went hiking today"),
                post("shared something"),
                post("Jane Doe shared a link."),
            ],
            ..Default::default()
        };
        assert_eq!(aggregate_on(&bundle, today()).name, "Jane Doe");

        let named = ParsedExportBundle {
            profile_info: ProfileInfo {
                name: Some("Alex Kim".into()),
                ..Default::default()
            },
            ..bundle
        };
        assert_eq!(aggregate_on(&named, today()).name, "Alex Kim");
    }

    #[test]
    fn missing_fields_are_empty() {
        let data = aggregate_on(&ParsedExportBundle::default(), today());
        assert_eq!(data.age, None);
        assert_eq!(data.occupation, None);
        assert!(data.location.is_empty());
        assert!(data.photos.is_empty());
    }
}
