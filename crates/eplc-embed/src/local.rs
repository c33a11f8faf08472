//! In-process BERT-family sentence embedder (BGE-large style) built on candle.
//!
//! Loads `tokenizer.json`, `config.json` and either `model.safetensors` or
//! `pytorch_model.bin` from a model directory. Encoding is CPU/GPU bound, so
//! each call runs on tokio's blocking pool.

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use eplc_core::config::{expand_path, LocalEmbedderSettings, Pooling};
use eplc_core::error::{Error, Result};
use eplc_core::traits::Embedder;

use crate::device::select_device;
use crate::pool::pool_l2;
use crate::tokenize::tokenize_on_device;

const DEFAULT_MODEL_DIRS: [&str; 2] = ["models/bge-large-en-v1.5", "../models/bge-large-en-v1.5"];

struct BertEncoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    max_len: usize,
    pooling: Pooling,
}

impl BertEncoder {
    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let input = tokenize_on_device(&self.tokenizer, text, self.max_len, &self.device)?;
        let hidden = self
            .model
            .forward(&input.input_ids, &input.token_type_ids, Some(&input.attention_mask))
            .map_err(candle_err)?;
        let pooled = pool_l2(self.pooling, &hidden, &input.attention_mask).map_err(candle_err)?;
        pooled
            .to_device(&Device::Cpu)
            .and_then(|t| t.squeeze(0))
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(candle_err)
    }
}

pub struct LocalEmbedder {
    encoder: Arc<BertEncoder>,
    dim: usize,
    query_prefix: String,
}

impl LocalEmbedder {
    pub fn load(settings: &LocalEmbedderSettings) -> Result<Self> {
        let model_dir = resolve_model_dir(settings.model_dir.as_deref())?;
        let device = select_device();

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            Error::Configuration(format!("failed to load tokenizer from {}: {e}", tokenizer_path.display()))
        })?;

        let config_path = model_dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| Error::Configuration(format!("failed to read {}: {e}", config_path.display())))?;
        let config: BertConfig = serde_json::from_str(&raw)
            .map_err(|e| Error::Configuration(format!("invalid model config {}: {e}", config_path.display())))?;

        let weights = load_weights(&model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model =
            BertModel::load(vb, &config).map_err(|e| Error::Configuration(format!("failed to build model: {e}")))?;
        info!(
            model_dir = %model_dir.display(),
            dim = settings.dimension,
            pooling = ?settings.pooling,
            "local embedder loaded"
        );

        Ok(Self {
            encoder: Arc::new(BertEncoder {
                model,
                tokenizer,
                device,
                max_len: settings.max_len,
                pooling: settings.pooling,
            }),
            dim: settings.dimension,
            query_prefix: settings.query_prefix.clone(),
        })
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let encoder = Arc::clone(&self.encoder);
        let input = format!("{}{}", self.query_prefix, text);
        let start = Instant::now();
        let vector = tokio::task::spawn_blocking(move || encoder.encode(&input))
            .await
            .map_err(|e| Error::Embedding(format!("embedding task failed: {e}")))??;
        if vector.len() != self.dim {
            return Err(Error::Embedding(format!(
                "model returned {} dimensions, expected {}",
                vector.len(),
                self.dim
            )));
        }
        let elapsed = start.elapsed();
        if elapsed.as_millis() > 100 {
            warn!(elapsed_ms = elapsed.as_millis() as u64, "slow embedding");
        } else {
            debug!(elapsed_ms = elapsed.as_millis() as u64, "query embedded");
        }
        Ok(vector)
    }
}

fn candle_err(e: candle_core::Error) -> Error {
    Error::Embedding(e.to_string())
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return candle_core::safetensors::load(&safetensors, device)
            .map_err(|e| Error::Configuration(format!("failed to load {}: {e}", safetensors.display())));
    }
    let pickle = model_dir.join("pytorch_model.bin");
    let tensors = candle_core::pickle::read_all(&pickle)
        .map_err(|e| Error::Configuration(format!("failed to load {}: {e}", pickle.display())))?;
    Ok(tensors.into_iter().collect())
}

fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        let p = expand_path(dir);
        if p.exists() {
            return Ok(p);
        }
        return Err(Error::Configuration(format!("local_embedder.model_dir not found: {}", p.display())));
    }
    if let Ok(dir) = std::env::var("MODEL_DIR") {
        let p = expand_path(dir);
        if p.exists() {
            return Ok(p);
        }
    }
    DEFAULT_MODEL_DIRS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| Error::Configuration("could not locate the local embedding model directory".into()))
}
