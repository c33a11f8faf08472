use candle_core::{DType, IndexOp, Result, Tensor};

use eplc_core::config::Pooling;

pub fn pool_l2(pooling: Pooling, hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    match pooling {
        Pooling::Cls => cls_l2(hidden),
        Pooling::Mean => masked_mean_l2(hidden, attention_mask),
    }
}

pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, _time, hidden_dim) = hidden.dims3()?;
    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let mask_broadcast = mask.unsqueeze(2)?.broadcast_as(hidden.shape())?;
    let sum = (hidden * &mask_broadcast)?.sum(1)?;
    let lengths = mask.sum(1)?.unsqueeze(1)?.to_dtype(sum.dtype())?;
    let mean = sum.broadcast_div(&lengths)?;
    let out = l2_normalize(&mean)?;
    debug_assert_eq!(out.dims(), &[batch, hidden_dim]);
    Ok(out)
}

pub fn cls_l2(hidden: &Tensor) -> Result<Tensor> {
    let cls = hidden.i((.., 0))?;
    l2_normalize(&cls)
}

fn l2_normalize(t: &Tensor) -> Result<Tensor> {
    let eps = match t.dtype() { DType::F16 => 1e-6, _ => 1e-12 };
    let norm = t.sqr()?.sum_keepdim(1)?.sqrt()?.affine(1.0, eps)?;
    t.broadcast_div(&norm)
}
