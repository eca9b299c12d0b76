//! Concrete model collaborators: rust-bert for sentiment and text generation, an external
//! command for image captioning.

use rust_bert::pipelines::sentiment::{SentimentConfig, SentimentModel, SentimentPolarity};
use rust_bert::pipelines::text_generation::{TextGenerationConfig, TextGenerationModel};
use rust_bert::RustBertError;
use std::path::Path;
use std::process::Command;
use tch::Device;
use tracing::{debug, info};

use crate::config::{CaptionerConfig, Config, DeviceChoice, ModelsConfig};
use crate::error::{ProfileError, Result};
use crate::models::{Sentiment, SentimentLabel};
use crate::pipeline::{Captioner, ModelManager, SentimentClassifier, TextGenerator};

fn invocation(err: RustBertError) -> ProfileError {
    ProfileError::ModelInvocation(err.to_string())
}

pub fn device(choice: DeviceChoice) -> Device {
    match choice {
        DeviceChoice::Cpu => Device::Cpu,
        DeviceChoice::Cuda => Device::Cuda(0),
        DeviceChoice::Auto => Device::cuda_if_available(),
    }
}

pub struct BertSentiment {
    model: SentimentModel,
}

impl BertSentiment {
    pub fn new(device: Device) -> Result<Self> {
        let model = SentimentModel::new(SentimentConfig {
            device,
            ..Default::default()
        })
        .map_err(invocation)?;
        Ok(Self { model })
    }
}

impl SentimentClassifier for BertSentiment {
    fn classify(&self, text: &str) -> Result<Sentiment> {
        let output = self.model.predict(&[text]);
        let first = output
            .first()
            .ok_or_else(|| ProfileError::ModelInvocation("sentiment model returned nothing".into()))?;
        let label = match first.polarity {
            SentimentPolarity::Positive => SentimentLabel::Positive,
            SentimentPolarity::Negative => SentimentLabel::Negative,
        };
        Ok(Sentiment::new(label, first.score as f32))
    }
}

/// GPT-2 text generation.
pub struct GptGenerator {
    model: TextGenerationModel,
}

impl GptGenerator {
    pub fn new(config: &ModelsConfig) -> Result<Self> {
        let generation_config = TextGenerationConfig {
            max_length: Some(config.max_length),
            do_sample: config.do_sample,
            temperature: config.temperature,
            top_p: config.top_p,
            repetition_penalty: config.repetition_penalty,
            no_repeat_ngram_size: config.no_repeat_ngram_size,
            device: device(config.device),
            ..Default::default()
        };
        let model = TextGenerationModel::new(generation_config).map_err(invocation)?;
        Ok(Self { model })
    }
}

impl TextGenerator for GptGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        let output = self.model.generate(&[prompt], None).map_err(invocation)?;
        output
            .into_iter()
            .next()
            .ok_or_else(|| ProfileError::ModelInvocation("generator returned nothing".into()))
    }
}

/// Captions an image by running `program [args..] <image>` and reading stdout.
#[derive(Debug, Clone)]
pub struct CommandCaptioner {
    program: String,
    args: Vec<String>,
}

impl CommandCaptioner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &CaptionerConfig) -> Result<Self> {
        let program = config
            .program
            .clone()
            .ok_or_else(|| ProfileError::Config("no captioner program configured".into()))?;
        Ok(Self::new(program, config.args.clone()))
    }
}

impl Captioner for CommandCaptioner {
    fn caption(&self, image_path: &Path) -> Result<String> {
        debug!(program = self.program.as_str(), image = %image_path.display(), "running captioner");
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(image_path)
            .output()
            .map_err(|e| ProfileError::ModelInvocation(format!("failed to run `{}`: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProfileError::ModelInvocation(format!(
                "`{}` exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let caption = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if caption.is_empty() {
            return Err(ProfileError::ModelInvocation(format!(
                "`{}` produced no caption",
                self.program
            )));
        }
        Ok(caption)
    }
}

/// Which collaborators [`load_models`] should bring up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSelection {
    pub generator: bool,
    pub captioner: bool,
    pub sentiment: bool,
}

impl ModelSelection {
    pub const ALL: Self = Self {
        generator: true,
        captioner: true,
        sentiment: true,
    };
    pub const ANALYSIS: Self = Self {
        generator: false,
        captioner: true,
        sentiment: true,
    };
    pub const GENERATION: Self = Self {
        generator: true,
        captioner: false,
        sentiment: false,
    };

    fn steps(&self) -> usize {
        [self.generator, self.captioner, self.sentiment]
            .iter()
            .filter(|s| **s)
            .count()
    }
}

/// Loads the selected models into `manager` (generator, then captioner, then sentiment),
/// calling `progress(message, percent)` before each one and once more at 100.
pub fn load_models(
    manager: &mut ModelManager,
    config: &Config,
    selection: ModelSelection,
    mut progress: impl FnMut(&str, u8),
) -> Result<()> {
    let steps = selection.steps().max(1);
    let mut done = 0;
    let mut step = |message: &str, done: &mut usize| {
        progress(message, (*done * 100 / steps) as u8);
        *done += 1;
    };

    if selection.generator {
        step("Loading text generator...", &mut done);
        manager.set_generator(GptGenerator::new(&config.models)?);
        info!(device = %config.models.device, "text generator loaded");
    }
    if selection.captioner {
        step("Loading image captioner...", &mut done);
        manager.set_captioner(CommandCaptioner::from_config(&config.captioner)?);
        info!("image captioner ready");
    }
    if selection.sentiment {
        step("Loading sentiment analyzer...", &mut done);
        manager.set_sentiment(BertSentiment::new(device(config.models.device))?);
        info!(device = %config.models.device, "sentiment analyzer loaded");
    }

    progress("Models loaded", 100);
    Ok(())
}
