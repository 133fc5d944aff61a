use std::sync::Arc;

use image::{imageops::FilterType, DynamicImage};
use rand::{seq::IndexedRandom, Rng};
use thiserror::Error;

use crate::config::ModelConfig;
use crate::labels::{Category, UNKNOWN_CATEGORY_LABEL};

/// Square input resolution expected by the classifier.
pub const IMAGE_SIZE: u32 = 224;
const CHANNELS: u64 = 3;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("image could not be decoded: {0}")]
    Decode(#[from] image::ImageError),
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model file not found at {0}")]
    NotFound(String),

    #[error("model support is not compiled in (build with the default `tensorflow` feature)")]
    Unsupported,

    #[error("operation '{0}' not found in graph")]
    MissingOperation(String),

    #[error("model returned no scores")]
    EmptyOutput,

    #[error("inference failed: {0}")]
    Inference(String),
}

/// Preprocessed image in NHWC layout with a batch dimension of one.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    pub shape: [u64; 4],
    pub data: Vec<f32>,
}

/// Decodes raw bytes into the normalised tensor the classifier consumes.
pub fn preprocess(image_data: &[u8]) -> Result<InputTensor, PreprocessError> {
    let img = image::load_from_memory(image_data)?;
    Ok(to_input_tensor(&img))
}

fn to_input_tensor(img: &DynamicImage) -> InputTensor {
    let rgb = img.to_rgb8();
    let resized = image::imageops::resize(&rgb, IMAGE_SIZE, IMAGE_SIZE, FilterType::CatmullRom);

    let mut data = Vec::with_capacity((IMAGE_SIZE * IMAGE_SIZE) as usize * CHANNELS as usize);
    for pixel in resized.pixels() {
        data.push(pixel[0] as f32 / 255.0);
        data.push(pixel[1] as f32 / 255.0);
        data.push(pixel[2] as f32 / 255.0);
    }

    InputTensor {
        shape: [1, IMAGE_SIZE as u64, IMAGE_SIZE as u64, CHANNELS],
        data,
    }
}

/// A loaded image classifier. Implementations must tolerate concurrent
/// `scores` calls since the handle is shared across requests without a lock.
pub trait Classifier: Send + Sync {
    /// Runs one forward pass and returns the raw score for every class.
    fn scores(&self, input: &InputTensor) -> Result<Vec<f32>, ModelError>;
}

#[cfg(feature = "tensorflow")]
pub use self::tf::TensorflowClassifier;

#[cfg(feature = "tensorflow")]
mod tf {
    use std::path::Path;

    use tensorflow::{Graph, ImportGraphDefOptions, Session, SessionOptions, SessionRunArgs, Tensor};

    use super::{Classifier, InputTensor, ModelError};
    use crate::config::ModelConfig;

    fn tf_err(status: tensorflow::Status) -> ModelError {
        ModelError::Inference(status.to_string())
    }

    pub struct TensorflowClassifier {
        session: Session,
        graph: Graph,
        input_op: String,
        output_op: String,
    }

    impl TensorflowClassifier {
        pub fn load(config: &ModelConfig) -> Result<Self, ModelError> {
            let path: &Path = &config.path;
            let model_bytes = std::fs::read(path)
                .map_err(|_| ModelError::NotFound(path.display().to_string()))?;

            let mut graph = Graph::new();
            graph
                .import_graph_def(&model_bytes, &ImportGraphDefOptions::new())
                .map_err(tf_err)?;
            let session = Session::new(&SessionOptions::new(), &graph).map_err(tf_err)?;

            let classifier = TensorflowClassifier {
                session,
                graph,
                input_op: config.input_op.clone(),
                output_op: config.output_op.clone(),
            };
            // fail at startup rather than on the first request
            classifier.operation(&classifier.input_op)?;
            classifier.operation(&classifier.output_op)?;
            Ok(classifier)
        }

        fn operation(&self, name: &str) -> Result<tensorflow::Operation, ModelError> {
            self.graph
                .operation_by_name(name)
                .map_err(tf_err)?
                .ok_or_else(|| ModelError::MissingOperation(name.to_string()))
        }
    }

    impl Classifier for TensorflowClassifier {
        fn scores(&self, input: &InputTensor) -> Result<Vec<f32>, ModelError> {
            let mut input_tensor = Tensor::<f32>::new(&input.shape);
            input_tensor.copy_from_slice(&input.data);

            let input_operation = self.operation(&self.input_op)?;
            let output_operation = self.operation(&self.output_op)?;

            let mut args = SessionRunArgs::new();
            args.add_feed(&input_operation, 0, &input_tensor);
            let output_token = args.request_fetch(&output_operation, 0);
            self.session.run(&mut args).map_err(tf_err)?;

            let output_tensor: Tensor<f32> = args.fetch(output_token).map_err(tf_err)?;
            Ok(output_tensor.to_vec())
        }
    }
}

/// Loads the classifier described by `config`. Failures are logged and
/// leave the service in fallback mode instead of aborting startup.
pub fn load_classifier(config: &ModelConfig) -> Option<Arc<dyn Classifier>> {
    match try_load(config) {
        Ok(classifier) => {
            tracing::info!(path = %config.path.display(), "loaded classification model");
            Some(classifier)
        }
        Err(err) => {
            tracing::error!(
                path = %config.path.display(),
                error = %err,
                "could not load classification model, using random fallback categories"
            );
            None
        }
    }
}

#[cfg(feature = "tensorflow")]
fn try_load(config: &ModelConfig) -> Result<Arc<dyn Classifier>, ModelError> {
    Ok(Arc::new(TensorflowClassifier::load(config)?))
}

#[cfg(not(feature = "tensorflow"))]
fn try_load(config: &ModelConfig) -> Result<Arc<dyn Classifier>, ModelError> {
    if !config.path.exists() {
        return Err(ModelError::NotFound(config.path.display().to_string()));
    }
    Err(ModelError::Unsupported)
}

/// How a classification label was produced. Only used for logging; the
/// HTTP payload does not distinguish these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    Model,
    Fallback,
    OutOfRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub label: String,
    pub source: LabelSource,
}

/// Index of the first highest score.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if score <= top => {}
            Some(_) if score.is_nan() => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}

/// Turns uploaded bytes into a category label, always answering when the
/// image itself is readable.
#[derive(Clone, Default)]
pub struct ClassifierAdapter {
    model: Option<Arc<dyn Classifier>>,
}

impl ClassifierAdapter {
    pub fn new(model: Option<Arc<dyn Classifier>>) -> Self {
        Self { model }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn classify<R: Rng>(
        &self,
        image_data: &[u8],
        rng: &mut R,
    ) -> Result<Classification, PreprocessError> {
        let input = preprocess(image_data)?;

        let Some(model) = &self.model else {
            tracing::warn!("classification model not loaded, picking a random category");
            return Ok(fallback(rng));
        };

        let scores = match model.scores(&input) {
            Ok(scores) => scores,
            Err(err) => {
                tracing::error!(error = %err, "classification failed, picking a random category");
                return Ok(fallback(rng));
            }
        };

        let Some(index) = argmax(&scores) else {
            tracing::error!(error = %ModelError::EmptyOutput, "classification failed, picking a random category");
            return Ok(fallback(rng));
        };

        match Category::from_index(index) {
            Some(category) => Ok(Classification {
                label: category.label().to_string(),
                source: LabelSource::Model,
            }),
            None => {
                tracing::warn!(
                    index,
                    classes = Category::ALL.len(),
                    "predicted class index out of range"
                );
                Ok(Classification {
                    label: UNKNOWN_CATEGORY_LABEL.to_string(),
                    source: LabelSource::OutOfRange,
                })
            }
        }
    }
}

fn fallback<R: Rng>(rng: &mut R) -> Classification {
    // ALL is non-empty, choose only returns None for an empty slice
    let category = Category::ALL
        .choose(rng)
        .copied()
        .unwrap_or(Category::JacketsAndVests);
    Classification {
        label: category.label().to_string(),
        source: LabelSource::Fallback,
    }
}
