use candle::{DType, Device, Result, Tensor};
use candle_core as candle;
use candle_core::IndexOp;
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use std::path::Path;

/// Bare BERT encoder (no task head) with `[CLS]` extraction.
pub struct BertBackbone {
    bert: BertModel,
    config: Config,
}

impl BertBackbone {
    /// Loads `config.json` + `model.safetensors` from `model_dir`.
    ///
    /// Accepts checkpoints saved from a bare `BertModel` as well as ones nested
    /// under a `bert.` or `roberta.` prefix (pretraining / task-head exports).
    pub fn load<P: AsRef<Path>>(model_dir: P, device: &Device) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        let config_path = model_dir.join("config.json");
        let weights_path = model_dir.join("model.safetensors");

        let config_content = std::fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| candle::Error::Msg(format!("Failed to parse config: {}", e)))?;

        // SAFETY: the weights file is mmapped read-only and not modified while loaded.
        let vb =
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? };

        let bert = if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
            BertModel::load(vb.pp("bert"), &config)?
        } else if vb.contains_tensor("roberta.embeddings.word_embeddings.weight") {
            BertModel::load(vb.pp("roberta"), &config)?
        } else {
            BertModel::load(vb, &config)?
        };

        Ok(Self { bert, config })
    }

    /// Final-layer hidden state at position 0 for each sequence: `[batch, hidden]`.
    pub fn cls_embeddings(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: Option<&Tensor>,
    ) -> Result<Tensor> {
        let output = self
            .bert
            .forward(input_ids, token_type_ids, attention_mask)?;
        output.i((.., 0, ..))
    }

    pub fn hidden_size(&self) -> usize {
        self.config.hidden_size
    }

    pub fn max_position_embeddings(&self) -> usize {
        self.config.max_position_embeddings
    }
}
