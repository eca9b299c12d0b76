use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

use crate::error::{ProfileError, Result};

/// Named profile attributes. Any subset may be missing from an export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hometown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ProfileInfo {
    /// Fields present in `other` win; fields it lacks are kept.
    pub fn merge(&mut self, other: ProfileInfo) {
        fn take(slot: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *slot = value;
            }
        }
        take(&mut self.name, other.name);
        take(&mut self.birthday, other.birthday);
        take(&mut self.gender, other.gender);
        take(&mut self.location, other.location);
        take(&mut self.hometown, other.hometown);
        take(&mut self.relationship_status, other.relationship_status);
        take(&mut self.bio, other.bio);
        take(&mut self.website, other.website);
        take(&mut self.email, other.email);
        take(&mut self.phone, other.phone);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub text: String,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub reaction: String,
    pub actor: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub title: String,
    pub description: String,
    pub creation_time: Option<String>,
    pub source_uri: String,
    pub metadata: Map<String, Value>,
    pub comments: Vec<Comment>,
    pub reactions: Vec<Reaction>,
    pub resolved_local_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub timestamp: Option<String>,
    pub title: String,
    pub data: Vec<Value>,
    pub attachments: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Friend {
    pub name: String,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interest {
    pub name: String,
    pub category: String,
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    Work,
    Education,
}

/// A job or a school. `organization` is the employer or school, `title` the position or degree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkEducation {
    pub kind: EntryKind,
    pub organization: String,
    pub title: String,
    pub field_of_study: String,
    pub location: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Everything recognised in one export, aggregated over all of its files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedExportBundle {
    pub profile_info: ProfileInfo,
    pub photos: Vec<PhotoRecord>,
    pub posts: Vec<Post>,
    pub friends: Vec<Friend>,
    pub interests: Vec<Interest>,
    pub work_education: Vec<WorkEducation>,
    pub extraction_root: Option<PathBuf>,
}

/// The flat record a dating profile is built from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatingProfileData {
    pub age: Option<u32>,
    pub name: String,
    pub occupation: Option<String>,
    pub education: Option<String>,
    pub location: String,
    pub hometown: String,
    pub bio: String,
    pub interests: String,
    pub relationship_status: String,
    pub photos: Vec<PhotoRecord>,
    pub total_photos_found: usize,
    pub available_photos_count: usize,
    pub posts_analyzed: usize,
    pub interests_found: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            SentimentLabel::Positive => "POSITIVE",
            SentimentLabel::Negative => "NEGATIVE",
            SentimentLabel::Neutral => "NEUTRAL",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    pub score: f32,
}

impl Sentiment {
    pub fn new(label: SentimentLabel, score: f32) -> Self {
        Self {
            label,
            score: score.clamp(0.0, 1.0),
        }
    }

    pub fn neutral() -> Self {
        Self::new(SentimentLabel::Neutral, 0.5)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoAnalysis {
    pub image_path: PathBuf,
    pub caption: String,
    pub sentiment: Sentiment,
    pub attractiveness_score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStyle {
    /// Mix of fun and serious
    Balanced,
    /// Light-hearted and funny
    Humorous,
    /// Focus on activities and experiences
    Adventurous,
    /// Emphasis on connection and relationships
    Romantic,
    /// Career-focused and ambitious
    Professional,
}

impl fmt::Display for ProfileStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProfileStyle::Balanced => "balanced",
            ProfileStyle::Humorous => "humorous",
            ProfileStyle::Adventurous => "adventurous",
            ProfileStyle::Romantic => "romantic",
            ProfileStyle::Professional => "professional",
        })
    }
}

/// Facts the user supplies (or accepts from an import) for description generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub age: Option<u32>,
    pub occupation: String,
    pub location: String,
    pub interests: String,
    pub personality: String,
    pub looking_for: String,
    pub style: Option<ProfileStyle>,
}

impl UserInfo {
    pub fn validate(&self) -> Result<()> {
        match self.age {
            None => return Err(ProfileError::InvalidUserInfo("age is required".into())),
            Some(age) if !(18..=100).contains(&age) => {
                return Err(ProfileError::InvalidUserInfo(format!(
                    "age must be between 18 and 100, got {age}"
                )))
            }
            Some(_) => {}
        }
        if self.occupation.trim().is_empty() {
            return Err(ProfileError::InvalidUserInfo("occupation is required".into()));
        }
        Ok(())
    }

    /// Pre-fills the fields an import can provide.
    pub fn from_profile(profile: &DatingProfileData) -> Self {
        Self {
            age: profile.age,
            occupation: profile.occupation.clone().unwrap_or_default(),
            location: profile.location.clone(),
            interests: profile.interests.clone(),
            ..Self::default()
        }
    }
}
