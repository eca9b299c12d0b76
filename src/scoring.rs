use crate::models::{PhotoAnalysis, Sentiment, SentimentLabel};

const BASE_SCORE: f32 = 0.5;
const SENTIMENT_WEIGHT: f32 = 0.3;
const KEYWORD_STEP: f32 = 0.05;
const KEYWORD_CAP: f32 = 0.2;

pub const DEFAULT_TOP_PHOTOS: usize = 5;

const POSITIVE_KEYWORDS: &[&str] = &[
    "beautiful",
    "attractive",
    "handsome",
    "pretty",
    "smile",
    "smiling",
    "confident",
    "happy",
    "laughing",
    "stylish",
];

const NEGATIVE_KEYWORDS: &[&str] = &[
    "blurry",
    "out of focus",
    "looking away",
    "sad",
    "frowning",
    "dark",
    "crowded",
    "angry",
];

/// Attractiveness heuristic in `[0, 1]` from a caption and the sentiment of that caption.
pub fn score(caption: &str, sentiment: &Sentiment) -> f32 {
    let caption = caption.to_lowercase();

    let polarity = match sentiment.label {
        SentimentLabel::Positive => sentiment.score * SENTIMENT_WEIGHT,
        SentimentLabel::Negative => -sentiment.score * SENTIMENT_WEIGHT,
        SentimentLabel::Neutral => 0.0,
    };

    let bonus = keyword_adjustment(&caption, POSITIVE_KEYWORDS);
    let penalty = keyword_adjustment(&caption, NEGATIVE_KEYWORDS);

    (BASE_SCORE + polarity + bonus - penalty).clamp(0.0, 1.0)
}

fn keyword_adjustment(caption: &str, keywords: &[&str]) -> f32 {
    let hits = keywords.iter().filter(|k| caption.contains(*k)).count();
    (hits as f32 * KEYWORD_STEP).min(KEYWORD_CAP)
}

/// Highest score first; ties keep their input order.
pub fn rank(analyses: &mut [PhotoAnalysis]) {
    analyses.sort_by(|a, b| b.attractiveness_score.total_cmp(&a.attractiveness_score));
}

pub fn top_photos(analyses: &[PhotoAnalysis], n: usize) -> Vec<PhotoAnalysis> {
    let mut ranked = analyses.to_vec();
    rank(&mut ranked);
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn analysis(path: &str, score: f32) -> PhotoAnalysis {
        PhotoAnalysis {
            image_path: PathBuf::from(path),
            caption: String::new(),
            sentiment: Sentiment::neutral(),
            attractiveness_score: score,
        }
    }

    #[test]
    fn positive_caption_and_sentiment_score_high() {
        let s = score(
            "beautiful person with confident smile",
            &Sentiment::new(SentimentLabel::Positive, 0.95),
        );
        assert!(s > 0.8, "{s}");
        assert!(s <= 1.0);
    }

    #[test]
    fn negative_caption_and_sentiment_score_low() {
        let s = score(
            "blurry photo of person looking away",
            &Sentiment::new(SentimentLabel::Negative, 0.8),
        );
        assert!(s < 0.4, "{s}");

        let sad = score("A sad looking person", &Sentiment::new(SentimentLabel::Negative, 0.8));
        assert!(sad < 0.5 && sad >= 0.0);
    }

    #[test]
    fn neutral_stays_near_base() {
        let s = score("person standing in room", &Sentiment::neutral());
        assert!((s - 0.5).abs() < 1e-6);
    }

    #[test]
    fn keyword_bonus_is_capped() {
        let caption = "beautiful attractive handsome pretty smiling confident happy stylish";
        let s = score(caption, &Sentiment::neutral());
        assert!((s - 0.7).abs() < 1e-6, "{s}");
    }

    #[test]
    fn result_is_clamped() {
        let s = score(
            "beautiful attractive handsome pretty smile",
            &Sentiment::new(SentimentLabel::Positive, 1.0),
        );
        assert!(s > 0.99 && s <= 1.0);
        let s = score(
            "dark blurry sad crowded angry",
            &Sentiment::new(SentimentLabel::Negative, 1.0),
        );
        assert!(s >= 0.0 && s < 0.01);
    }

    #[test]
    fn rank_is_descending_and_stable() {
        let mut items = vec![
            analysis("a", 0.4),
            analysis("b", 0.9),
            analysis("c", 0.4),
            analysis("d", 0.7),
        ];
        rank(&mut items);
        let order: Vec<_> = items.iter().map(|a| a.image_path.to_str().unwrap()).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn top_photos_truncates() {
        let items: Vec<_> = (0..8).map(|i| analysis(&i.to_string(), i as f32 / 10.0)).collect();
        let top = top_photos(&items, DEFAULT_TOP_PHOTOS);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].image_path, PathBuf::from("7"));
        assert_eq!(items.len(), 8);
    }
}
