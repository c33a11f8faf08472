use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

use eplc_core::error::{Error, Result};

/// Model inputs for a single sequence, each shaped `[1, T]`.
pub struct EncodedInput {
    pub input_ids: Tensor,
    pub token_type_ids: Tensor,
    pub attention_mask: Tensor,
}

/// Tokenizes `text`, truncating to `max_len` tokens. A single sequence needs no padding.
pub fn tokenize_on_device(tokenizer: &Tokenizer, text: &str, max_len: usize, device: &Device) -> Result<EncodedInput> {
    let enc = tokenizer
        .encode(text, true)
        .map_err(|e| Error::Embedding(format!("tokenization failed: {e}")))?;
    let mut ids = enc.get_ids().to_vec();
    let mut mask = enc.get_attention_mask().to_vec();
    if ids.len() > max_len {
        ids.truncate(max_len);
        mask.truncate(max_len);
    }
    if ids.is_empty() {
        return Err(Error::Embedding("tokenizer produced no tokens".into()));
    }
    let type_ids = vec![0u32; ids.len()];
    let to_tensor = |v: Vec<u32>| -> Result<Tensor> {
        Tensor::new(v.as_slice(), device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| Error::Embedding(e.to_string()))
    };
    Ok(EncodedInput {
        input_ids: to_tensor(ids)?,
        token_type_ids: to_tensor(type_ids)?,
        attention_mask: to_tensor(mask)?,
    })
}
