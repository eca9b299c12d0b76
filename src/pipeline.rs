//! Photo analysis and description generation over pluggable model collaborators.
//!
//! The models themselves live behind small traits so the pipeline can run against
//! rust-bert, an external command, or test doubles. All of them are synchronous and
//! fallible; callers that need a responsive foreground run the pipeline on a blocking task.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use crate::error::{ProfileError, Result};
use crate::models::{PhotoAnalysis, Sentiment, UserInfo};
use crate::prompt::{build_prompt, clean_description, strip_prompt_echo};
use crate::scoring;

pub const ANALYSIS_FALLBACK_CAPTION: &str = "Error analyzing image";
pub const GENERATION_FALLBACK: &str = "Error generating description. Please try again.";

pub trait Captioner {
    fn caption(&self, image_path: &Path) -> Result<String>;
}

pub trait SentimentClassifier {
    fn classify(&self, text: &str) -> Result<Sentiment>;
}

pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Progress of [`ModelManager::analyze_batch`].
#[derive(Debug, Clone, PartialEq)]
pub enum BatchProgress {
    Started {
        total: usize,
    },
    /// Sent after the photo at `index` (zero based) has been analyzed.
    Item {
        index: usize,
        total: usize,
        percent: u8,
        path: PathBuf,
    },
    Finished {
        analyzed: usize,
    },
    Cancelled {
        analyzed: usize,
    },
}

/// Holds whichever models have been loaded. Constructed once and passed to whatever needs it.
#[derive(Default)]
pub struct ModelManager {
    captioner: Option<Box<dyn Captioner>>,
    sentiment: Option<Box<dyn SentimentClassifier>>,
    generator: Option<Box<dyn TextGenerator>>,
}

impl ModelManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_captioner(&mut self, captioner: impl Captioner + 'static) {
        self.captioner = Some(Box::new(captioner));
    }

    pub fn set_sentiment(&mut self, classifier: impl SentimentClassifier + 'static) {
        self.sentiment = Some(Box::new(classifier));
    }

    pub fn set_generator(&mut self, generator: impl TextGenerator + 'static) {
        self.generator = Some(Box::new(generator));
    }

    pub fn with_captioner(mut self, captioner: impl Captioner + 'static) -> Self {
        self.set_captioner(captioner);
        self
    }

    pub fn with_sentiment(mut self, classifier: impl SentimentClassifier + 'static) -> Self {
        self.set_sentiment(classifier);
        self
    }

    pub fn with_generator(mut self, generator: impl TextGenerator + 'static) -> Self {
        self.set_generator(generator);
        self
    }

    /// True once every collaborator is present.
    pub fn models_loaded(&self) -> bool {
        self.captioner.is_some() && self.sentiment.is_some() && self.generator.is_some()
    }

    pub fn can_analyze(&self) -> bool {
        self.captioner.is_some() && self.sentiment.is_some()
    }

    pub fn can_generate(&self) -> bool {
        self.generator.is_some()
    }

    /// Captions, classifies and scores one photo. Never fails; a photo that can't be analyzed
    /// gets a neutral fallback result.
    pub fn analyze(&self, image_path: &Path) -> PhotoAnalysis {
        match self.try_analyze(image_path) {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(path = %image_path.display(), error = %e, "photo analysis failed");
                PhotoAnalysis {
                    image_path: image_path.to_path_buf(),
                    caption: ANALYSIS_FALLBACK_CAPTION.to_string(),
                    sentiment: Sentiment::neutral(),
                    attractiveness_score: 0.5,
                }
            }
        }
    }

    fn try_analyze(&self, image_path: &Path) -> Result<PhotoAnalysis> {
        let captioner = self.captioner.as_ref().ok_or(ProfileError::ModelNotLoaded)?;
        let classifier = self.sentiment.as_ref().ok_or(ProfileError::ModelNotLoaded)?;

        // decode first so unreadable files never reach the captioner
        let image = image::ImageReader::open(image_path)?
            .with_guessed_format()?
            .decode()?;
        debug!(path = %image_path.display(), width = image.width(), height = image.height(), "image decoded");

        let caption = captioner.caption(image_path)?;
        let sentiment = classifier.classify(&caption)?;
        let attractiveness_score = scoring::score(&caption, &sentiment);

        Ok(PhotoAnalysis {
            image_path: image_path.to_path_buf(),
            caption,
            sentiment,
            attractiveness_score,
        })
    }

    /// Analyzes `paths` in order, reporting on `progress`. `cancel` is checked before each
    /// photo; a cancelled batch returns what it finished.
    pub fn analyze_batch(
        &self,
        paths: &[PathBuf],
        progress: &UnboundedSender<BatchProgress>,
        cancel: &AtomicBool,
    ) -> Vec<PhotoAnalysis> {
        let total = paths.len();
        let mut results = Vec::with_capacity(total);
        // a dropped receiver only means nobody is watching
        let _ = progress.send(BatchProgress::Started { total });

        for (index, path) in paths.iter().enumerate() {
            if cancel.load(Ordering::SeqCst) {
                info!(analyzed = results.len(), total, "photo analysis cancelled");
                let _ = progress.send(BatchProgress::Cancelled {
                    analyzed: results.len(),
                });
                return results;
            }

            results.push(self.analyze(path));

            let _ = progress.send(BatchProgress::Item {
                index,
                total,
                percent: ((index + 1) * 100 / total) as u8,
                path: path.clone(),
            });
        }

        info!(analyzed = results.len(), "photo analysis finished");
        let _ = progress.send(BatchProgress::Finished {
            analyzed: results.len(),
        });
        results
    }

    /// Generates a cleaned profile description. Only a missing generator is an error;
    /// generation failures return [`GENERATION_FALLBACK`].
    pub fn generate_description(&self, user_info: &UserInfo, captions: &[String]) -> Result<String> {
        let generator = self.generator.as_ref().ok_or(ProfileError::ModelNotLoaded)?;
        let prompt = build_prompt(user_info, captions);
        debug!(prompt_chars = prompt.len(), "generating description");

        match generator.generate(&prompt) {
            Ok(generated) => Ok(clean_description(strip_prompt_echo(&generated, &prompt))),
            Err(e) => {
                error!(error = %e, "description generation failed");
                Ok(GENERATION_FALLBACK.to_string())
            }
        }
    }
}
