//! On-disk outputs: the JSON profile export, the photo analysis log, and result files.

use chrono::Local;
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs::{self, File, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{ProfileError, Result};
use crate::models::{DatingProfileData, ParsedExportBundle, PhotoAnalysis, SentimentLabel};
use crate::scoring::{top_photos, DEFAULT_TOP_PHOTOS};

pub const DESCRIPTION_FILE: &str = "profile_description.txt";
pub const RECOMMENDATIONS_FILE: &str = "photo_recommendations.json";

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Writes the aggregate plus summary counts of the raw bundle as pretty JSON.
pub fn export_profile(
    path: &Path,
    bundle: &ParsedExportBundle,
    profile: &DatingProfileData,
) -> Result<()> {
    create_parent(path)?;
    let export = json!({
        "dating_profile_data": profile,
        "raw_export_summary": {
            "profile_info": bundle.profile_info,
            "photos_count": bundle.photos.len(),
            "interests_count": bundle.interests.len(),
            "posts_count": bundle.posts.len(),
            "friends_count": bundle.friends.len(),
        },
        "export_timestamp": Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
    });

    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &export)?;
    info!(path = %path.display(), "profile data exported");
    Ok(())
}

/// One row of the photo analysis log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    #[serde(rename = "ImagePath")]
    pub image_path: String,
    #[serde(rename = "Caption")]
    pub caption: String,
    #[serde(rename = "Sentiment")]
    pub sentiment: SentimentLabel,
    #[serde(rename = "SentimentScore")]
    pub sentiment_score: f32,
    #[serde(rename = "AttractivenessScore")]
    pub attractiveness_score: f32,
    #[serde(rename = "AnalyzedAt")]
    pub analyzed_at: String,
}

impl AnalysisRecord {
    fn from_analysis(analysis: &PhotoAnalysis, analyzed_at: &str) -> Self {
        Self {
            image_path: analysis.image_path.display().to_string(),
            caption: analysis.caption.clone(),
            sentiment: analysis.sentiment.label,
            sentiment_score: analysis.sentiment.score,
            attractiveness_score: analysis.attractiveness_score,
            analyzed_at: analyzed_at.to_string(),
        }
    }
}

/// Appends `analyses` to the CSV log at `path`; the header row is written only for a new file.
pub fn append_analysis_log(path: &Path, analyses: &[PhotoAnalysis]) -> Result<()> {
    create_parent(path)?;
    let is_new = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut wtr = WriterBuilder::new().has_headers(is_new).from_writer(file);

    let analyzed_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    for analysis in analyses {
        wtr.serialize(AnalysisRecord::from_analysis(analysis, &analyzed_at))?;
    }
    wtr.flush()?;
    info!(path = %path.display(), rows = analyses.len(), "analysis log updated");
    Ok(())
}

pub fn read_analysis_log(path: &Path) -> Result<Vec<AnalysisRecord>> {
    if !path.exists() {
        return Err(ProfileError::NotFound(path.to_path_buf()));
    }
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: AnalysisRecord = result?;
        records.push(record);
    }
    Ok(records)
}

/// Writes a generated description to `dir/profile_description.txt`.
pub fn write_description(dir: &Path, description: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(DESCRIPTION_FILE);
    fs::write(&path, description)?;
    info!(path = %path.display(), "description written");
    Ok(path)
}

/// Writes the top-scoring photos to `dir/photo_recommendations.json`.
pub fn write_recommendations(dir: &Path, analyses: &[PhotoAnalysis]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(RECOMMENDATIONS_FILE);
    let recommended: Vec<_> = top_photos(analyses, DEFAULT_TOP_PHOTOS)
        .into_iter()
        .map(|p| {
            json!({
                "path": p.image_path,
                "score": p.attractiveness_score,
                "caption": p.caption,
            })
        })
        .collect();

    let writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(writer, &json!({ "recommended_photos": recommended }))?;
    info!(path = %path.display(), photos = recommended.len(), "recommendations written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Friend, ProfileInfo, Sentiment};
    use serde_json::Value;

    fn analysis(path: &str, caption: &str, score: f32) -> PhotoAnalysis {
        PhotoAnalysis {
            image_path: PathBuf::from(path),
            caption: caption.into(),
            sentiment: Sentiment::new(SentimentLabel::Positive, 0.9),
            attractiveness_score: score,
        }
    }

    #[test]
    fn export_has_summary_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/profile.json");
        let bundle = ParsedExportBundle {
            profile_info: ProfileInfo {
                name: Some("Zoë".into()),
                ..Default::default()
            },
            friends: vec![Friend::default(), Friend::default()],
            ..Default::default()
        };
        let profile = DatingProfileData {
            name: "Zoë".into(),
            age: Some(29),
            ..Default::default()
        };

        export_profile(&path, &bundle, &profile).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("Zoë"));
        assert!(text.contains("\n  \"dating_profile_data\""));
        let v: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["dating_profile_data"]["age"], 29);
        assert_eq!(v["raw_export_summary"]["friends_count"], 2);
        assert_eq!(v["raw_export_summary"]["photos_count"], 0);
        assert_eq!(v["raw_export_summary"]["profile_info"]["name"], "Zoë");
        assert!(v["export_timestamp"].is_string());
    }

    #[test]
    fn log_header_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo_analyses.csv");

        append_analysis_log(&path, &[analysis("a.jpg", "a person smiling, outdoors", 0.9)]).unwrap();
        append_analysis_log(&path, &[analysis("b.jpg", "blurry", 0.3)]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("ImagePath").count(), 1);
        assert!(text.starts_with(
            "ImagePath,Caption,Sentiment,SentimentScore,AttractivenessScore,AnalyzedAt"
        ));

        let records = read_analysis_log(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].caption, "a person smiling, outdoors");
        assert_eq!(records[0].sentiment, SentimentLabel::Positive);
        assert_eq!(records[1].image_path, "b.jpg");
    }

    #[test]
    fn reading_a_missing_log_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_analysis_log(&dir.path().join("none.csv")).unwrap_err();
        assert!(matches!(err, ProfileError::NotFound(_)));
    }

    #[test]
    fn result_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("exports");

        let desc = write_description(&out, "Weekend hiker and coffee snob.").unwrap();
        assert_eq!(fs::read_to_string(desc).unwrap(), "Weekend hiker and coffee snob.");

        let analyses: Vec<_> = (0..7)
            .map(|i| analysis(&format!("{i}.jpg"), "photo", i as f32 / 10.0))
            .collect();
        let recs = write_recommendations(&out, &analyses).unwrap();
        let v: Value = serde_json::from_str(&fs::read_to_string(recs).unwrap()).unwrap();
        let list = v["recommended_photos"].as_array().unwrap();
        assert_eq!(list.len(), 5);
        assert_eq!(list[0]["path"], "6.jpg");
    }
}
