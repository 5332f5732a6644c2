use burn::{
    nn::{
        attention::{generate_autoregressive_mask, MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::infra::tokenizer_store::PAD_ID;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct Seq2SeqConfig {
    pub vocab_size:         usize,
    pub max_source_len:     usize,
    pub max_target_len:     usize,
    pub d_model:            usize,
    pub num_heads:          usize,
    pub num_encoder_layers: usize,
    pub num_decoder_layers: usize,
    pub d_ff:               usize,
    #[config(default = 0.1)]
    pub dropout:            f64,
}

impl Seq2SeqConfig {
    /// Named architecture presets mirroring the shapes of the
    /// public checkpoints the original scripts loaded by name.
    /// The vocab_size here is an upper bound — the tokenizer
    /// built from the corpus narrows it before init.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "t5-small" => Some(Self::new(32128, 512, 512, 512, 8, 6, 6, 2048)),
            "t5-base"  => Some(Self::new(32128, 512, 512, 768, 12, 12, 12, 3072)),
            _ => None,
        }
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Seq2SeqModel<B> {
        // One embedding table for both sides (T5-style weight tying)
        let token_embedding = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let encoder_pos     = EmbeddingConfig::new(self.max_source_len, self.d_model).init(device);
        let decoder_pos     = EmbeddingConfig::new(self.max_target_len, self.d_model).init(device);

        let encoder_layers: Vec<EncoderBlock<B>> = (0..self.num_encoder_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let decoder_layers: Vec<DecoderBlock<B>> = (0..self.num_decoder_layers)
            .map(|_| self.build_decoder_block(device))
            .collect();

        let encoder_norm = LayerNormConfig::new(self.d_model).init(device);
        let decoder_norm = LayerNormConfig::new(self.d_model).init(device);
        let lm_head      = LinearConfig::new(self.d_model, self.vocab_size).init(device);
        let dropout      = DropoutConfig::new(self.dropout).init();

        Seq2SeqModel {
            token_embedding, encoder_pos, decoder_pos,
            encoder_layers, decoder_layers,
            encoder_norm, decoder_norm, lm_head, dropout,
            vocab_size:     self.vocab_size,
            max_source_len: self.max_source_len,
            max_target_len: self.max_target_len,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }

    fn build_decoder_block<B: Backend>(&self, device: &B::Device) -> DecoderBlock<B> {
        let self_attn  = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let cross_attn = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let norm3   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        DecoderBlock {
            self_attn, cross_attn, ffn_linear1, ffn_linear2,
            norm1, norm2, norm3, dropout,
        }
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
    pub fn forward(&self, x: Tensor<B, 3>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn_input  = MhaInput::self_attn(x.clone()).mask_pad(pad_mask);
        let attn_output = self.self_attn.forward(attn_input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct DecoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub cross_attn:  MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub norm3:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> DecoderBlock<B> {
    pub fn forward(
        &self,
        x:            Tensor<B, 3>,
        memory:       Tensor<B, 3>,
        causal_mask:  Tensor<B, 3, Bool>,
        src_pad_mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 3> {
        // Masked self-attention over what has been generated so far
        let self_input  = MhaInput::self_attn(x.clone()).mask_attn(causal_mask);
        let self_output = self.self_attn.forward(self_input).context;
        let x = self.norm1.forward(x + self.dropout.forward(self_output));

        // Cross-attention: queries from the decoder, keys/values
        // from the encoder memory, padded source positions masked
        let cross_input = MhaInput::new(x.clone(), memory.clone(), memory)
            .mask_pad(src_pad_mask);
        let cross_output = self.cross_attn.forward(cross_input).context;
        let x = self.norm2.forward(x + self.dropout.forward(cross_output));

        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm3.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct Seq2SeqModel<B: Backend> {
    pub token_embedding: Embedding<B>,
    pub encoder_pos:     Embedding<B>,
    pub decoder_pos:     Embedding<B>,
    pub encoder_layers:  Vec<EncoderBlock<B>>,
    pub decoder_layers:  Vec<DecoderBlock<B>>,
    pub encoder_norm:    LayerNorm<B>,
    pub decoder_norm:    LayerNorm<B>,
    pub lm_head:         Linear<B>,
    pub dropout:         Dropout,
    pub vocab_size:      usize,
    pub max_source_len:  usize,
    pub max_target_len:  usize,
}

impl<B: Backend> Seq2SeqModel<B> {
    /// Padding positions of a token id tensor, for attention masking
    pub fn pad_mask(input_ids: &Tensor<B, 2, Int>) -> Tensor<B, 2, Bool> {
        input_ids.clone().equal_elem(PAD_ID as i32)
    }

    /// input_ids: [batch, src_len] → encoder memory: [batch, src_len, d_model]
    pub fn encode(
        &self,
        input_ids:    Tensor<B, 2, Int>,
        src_pad_mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 3> {
        let [_, src_len] = input_ids.dims();
        let device = input_ids.device();

        let tok_emb = self.token_embedding.forward(input_ids);
        // Self-attention is permutation-invariant, so position must
        // be injected explicitly. [1, src_len, d] broadcasts over batch.
        let pos_emb = self
            .encoder_pos
            .forward(Tensor::arange(0..src_len as i64, &device).unsqueeze());

        let mut x = self.dropout.forward(tok_emb + pos_emb);
        for layer in &self.encoder_layers {
            x = layer.forward(x, src_pad_mask.clone());
        }
        self.encoder_norm.forward(x)
    }

    /// memory + decoder_input_ids: [batch, tgt_len]
    /// → logits: [batch, tgt_len, vocab_size]
    pub fn decode(
        &self,
        memory:            Tensor<B, 3>,
        src_pad_mask:      Tensor<B, 2, Bool>,
        decoder_input_ids: Tensor<B, 2, Int>,
    ) -> Tensor<B, 3> {
        let [batch_size, tgt_len] = decoder_input_ids.dims();
        let device = decoder_input_ids.device();

        let tok_emb = self.token_embedding.forward(decoder_input_ids);
        let pos_emb = self
            .decoder_pos
            .forward(Tensor::arange(0..tgt_len as i64, &device).unsqueeze());

        let causal_mask = generate_autoregressive_mask::<B>(batch_size, tgt_len, &device);

        let mut x = self.dropout.forward(tok_emb + pos_emb);
        for layer in &self.decoder_layers {
            x = layer.forward(x, memory.clone(), causal_mask.clone(), src_pad_mask.clone());
        }
        let x = self.decoder_norm.forward(x);
        self.lm_head.forward(x)
    }

    /// Full teacher-forced forward pass
    pub fn forward(
        &self,
        input_ids:         Tensor<B, 2, Int>,
        attention_mask:    Tensor<B, 2, Int>,
        decoder_input_ids: Tensor<B, 2, Int>,
    ) -> Tensor<B, 3> {
        // attention_mask uses 0 for padded positions
        let src_pad_mask = attention_mask.equal_elem(0);
        let memory = self.encode(input_ids, src_pad_mask.clone());
        self.decode(memory, src_pad_mask, decoder_input_ids)
    }

    pub fn forward_loss(
        &self,
        input_ids:         Tensor<B, 2, Int>,
        attention_mask:    Tensor<B, 2, Int>,
        decoder_input_ids: Tensor<B, 2, Int>,
        labels:            Tensor<B, 2, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 3>)
    where
        B: AutodiffBackend,
    {
        let logits = self.forward(input_ids, attention_mask, decoder_input_ids);
        let [batch_size, tgt_len, vocab] = logits.dims();

        // Padded label positions carry no gradient
        let ce = burn::nn::loss::CrossEntropyLossConfig::new()
            .with_pad_tokens(Some(vec![PAD_ID as usize]))
            .init(&logits.device());

        let loss = ce.forward(
            logits.clone().reshape([batch_size * tgt_len, vocab]),
            labels.reshape([batch_size * tgt_len]),
        );
        (loss, logits)
    }
}
