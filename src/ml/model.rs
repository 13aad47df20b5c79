// ============================================================
// Layer 5 - TSTPlus Model
// ============================================================
// Time Series Transformer for regression:
//
//   x [batch, c_in, seq_len]
//     │  (optional) strided Conv1d when seq_len > max_seq_len
//     ▼
//   input projection W_P: Linear(c_in → d_model) per time step
//     │  + learnable positional encoding W_pos [q_len, d_model]
//     │  dropout
//     ▼
//   n_layers × EncoderBlock (post-norm)
//     ▼
//   head: GELU → flatten [batch, q_len * d_model] → dropout → Linear → c_out
//
// Reference: Zerveas et al. (2021) "A Transformer-based Framework
//            for Multivariate Time Series Representation Learning"
//            Burn Book §3 (Building Blocks)

use burn::{
    module::Param,
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        conv::{Conv1d, Conv1dConfig},
        Dropout, DropoutConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
        PaddingConfig1d,
    },
    prelude::*,
    tensor::{activation::gelu, Distribution},
};

use crate::error::TsError;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct TstPlusConfig {
    /// Number of input channels
    pub c_in:    usize,
    /// Number of regression outputs
    pub c_out:   usize,
    /// Time steps per input series
    pub seq_len: usize,
    #[config(default = 3)]
    pub n_layers: usize,
    #[config(default = 128)]
    pub d_model: usize,
    #[config(default = 16)]
    pub n_heads: usize,
    #[config(default = 256)]
    pub d_ff: usize,
    #[config(default = 0.1)]
    pub dropout: f64,
    #[config(default = 0.0)]
    pub fc_dropout: f64,
    /// Longer inputs are shortened by a strided convolution
    #[config(default = 512)]
    pub max_seq_len: usize,
}

impl TstPlusConfig {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.c_in == 0 || self.c_out == 0 || self.seq_len == 0 {
            return Err(TsError::InvalidArgument(format!(
                "c_in, c_out and seq_len must be positive (got {}, {}, {})",
                self.c_in, self.c_out, self.seq_len
            )));
        }
        if self.n_heads == 0 || self.d_model % self.n_heads != 0 {
            return Err(TsError::InvalidArgument(format!(
                "d_model ({}) must be divisible by n_heads ({})",
                self.d_model, self.n_heads
            )));
        }
        if self.max_seq_len == 0 {
            return Err(TsError::InvalidArgument("max_seq_len must be positive".into()));
        }
        Ok(())
    }

    /// (kernel = stride, padding) of the length-reducing convolution, if one is needed.
    fn reduction(&self) -> Option<(usize, usize)> {
        if self.seq_len <= self.max_seq_len {
            return None;
        }
        let factor        = self.seq_len.div_ceil(self.max_seq_len);
        let total_padding = factor * self.max_seq_len - self.seq_len;
        Some((factor, total_padding.div_ceil(2)))
    }

    /// Number of positions the encoder sees.
    pub fn q_len(&self) -> usize {
        match self.reduction() {
            None => self.seq_len,
            Some((k, pad)) => (self.seq_len + 2 * pad - k) / k + 1,
        }
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> TstPlus<B> {
        let reduce = self.reduction().map(|(k, pad)| {
            Conv1dConfig::new(self.c_in, self.c_in, k)
                .with_stride(k)
                .with_padding(PaddingConfig1d::Explicit(pad))
                .init(device)
        });
        let w_p   = LinearConfig::new(self.c_in, self.d_model).init(device);
        let w_pos = Param::from_tensor(Tensor::random(
            [self.q_len(), self.d_model],
            Distribution::Uniform(-0.02, 0.02),
            device,
        ));
        let layers: Vec<EncoderBlock<B>> = (0..self.n_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let head = LinearConfig::new(self.d_model * self.q_len(), self.c_out).init(device);

        TstPlus {
            reduce,
            w_p,
            w_pos,
            dropout: DropoutConfig::new(self.dropout).init(),
            layers,
            head_dropout: DropoutConfig::new(self.fc_dropout).init(),
            head,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.n_heads)
            .with_dropout(0.0)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// x: [batch, q_len, d_model] → same shape
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let attn_output = self.self_attn.forward(MhaInput::self_attn(x.clone())).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));

        let hidden  = self.dropout.forward(gelu(self.ffn_linear1.forward(x.clone())));
        let ffn_out = self.ffn_linear2.forward(hidden);
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct TstPlus<B: Backend> {
    pub reduce:       Option<Conv1d<B>>,
    pub w_p:          Linear<B>,
    pub w_pos:        Param<Tensor<B, 2>>,
    pub dropout:      Dropout,
    pub layers:       Vec<EncoderBlock<B>>,
    pub head_dropout: Dropout,
    pub head:         Linear<B>,
}

impl<B: Backend> TstPlus<B> {
    /// x: [batch, c_in, seq_len] → [batch, c_out]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        let x = match &self.reduce {
            Some(conv) => conv.forward(x),
            None => x,
        };

        // [batch, c_in, q_len] → [batch, q_len, c_in] → [batch, q_len, d_model]
        let u = self.w_p.forward(x.swap_dims(1, 2));
        let [batch_size, q_len, d_model] = u.dims();

        let pos = self.w_pos.val()
            .unsqueeze::<3>()
            .expand([batch_size, q_len, d_model]);
        let mut z = self.dropout.forward(u + pos);

        for layer in &self.layers {
            z = layer.forward(z);
        }

        let z = gelu(z).flatten::<2>(1, 2);
        self.head.forward(self.head_dropout.forward(z))
    }
}
