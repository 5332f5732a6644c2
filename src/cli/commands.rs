// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `gen-qa`, `finetune`, `query`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, enum, etc.)
//
// Long flag spellings follow the original tooling exactly
// (`--data_dir`, not `--data-dir`), set explicitly where they
// differ from clap's kebab-case default.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::finetune_use_case::FinetuneConfig;
use crate::application::generate_use_case::GenerateConfig;
use crate::backend::DevicePreference;

/// The three top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate QA pairs from a PDF document
    GenQa(GenQaArgs),

    /// Fine-tune the model on a directory of QA-pair JSON files
    Finetune(FinetuneArgs),

    /// Answer questions with a fine-tuned model
    Query(QueryArgs),
}

/// `--device` flag shared by all three commands
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum DeviceArg {
    /// Best available device
    #[default]
    Auto,
    /// Force CPU
    Cpu,
    /// Force the first discrete GPU
    Gpu,
}

/// Convert the clap enum into the backend-layer preference.
/// The backend never sees clap types.
impl From<DeviceArg> for DevicePreference {
    fn from(d: DeviceArg) -> Self {
        match d {
            DeviceArg::Auto => DevicePreference::Auto,
            DeviceArg::Cpu  => DevicePreference::Cpu,
            DeviceArg::Gpu  => DevicePreference::Gpu,
        }
    }
}

/// All arguments for the `gen-qa` command
#[derive(Args, Debug)]
pub struct GenQaArgs {
    /// Path to the input PDF document
    #[arg(short, long)]
    pub input: String,

    /// Path of the JSON corpus file to write
    #[arg(short, long)]
    pub output: String,

    /// Directory holding the pretrained question-generation model
    #[arg(short, long, default_value = "weights")]
    pub weights: String,

    /// Characters per text chunk fed to one generation call
    #[arg(long, default_value_t = 512)]
    pub chunk_size: usize,

    /// Maximum tokens generated per chunk
    #[arg(long, default_value_t = 256)]
    pub max_new_tokens: usize,

    /// Compute device to run on
    #[arg(long, value_enum, default_value_t)]
    pub device: DeviceArg,
}

impl From<GenQaArgs> for GenerateConfig {
    fn from(a: GenQaArgs) -> Self {
        Self {
            input:          a.input,
            output:         a.output,
            weights_dir:    a.weights,
            chunk_size:     a.chunk_size,
            max_new_tokens: a.max_new_tokens,
        }
    }
}

/// All arguments for the `finetune` command.
/// The optimizer recipe (lr, weight decay, warmup, checkpoint
/// cadence) is fixed in FinetuneConfig — only the corpus, the
/// model source, and the epoch/batch counts are flags.
#[derive(Args, Debug)]
pub struct FinetuneArgs {
    /// Directory containing QA pairs in JSON format
    #[arg(short, long = "data_dir")]
    pub data_dir: String,

    /// Directory to save the fine-tuned model
    #[arg(short, long = "output_dir")]
    pub output_dir: String,

    /// Preset name (t5-small, t5-base) or path to an existing artifact
    #[arg(short, long = "model_name", default_value = "t5-small")]
    pub model_name: String,

    /// Number of training epochs
    #[arg(short, long, default_value_t = 3)]
    pub epochs: usize,

    /// Training batch size
    #[arg(short, long = "batch_size", default_value_t = 8)]
    pub batch_size: usize,

    /// Compute device to run on
    #[arg(long, value_enum, default_value_t)]
    pub device: DeviceArg,
}

/// Convert CLI args into the application-layer config. This is
/// the boundary between Layer 1 and Layer 2 — the application
/// layer never sees clap types.
impl From<FinetuneArgs> for FinetuneConfig {
    fn from(a: FinetuneArgs) -> Self {
        Self {
            data_dir:     a.data_dir,
            output_dir:   a.output_dir,
            model_source: a.model_name,
            epochs:       a.epochs,
            batch_size:   a.batch_size,
            ..Self::default()
        }
    }
}

/// All arguments for the `query` command
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Path to the input text file containing one question per line
    #[arg(short, long)]
    pub input: String,

    /// Path to the output text file for answers
    #[arg(short, long)]
    pub output: String,

    /// Directory containing the fine-tuned model
    #[arg(short, long = "model_dir")]
    pub model_dir: String,

    /// Compute device to run on
    #[arg(long, value_enum, default_value_t)]
    pub device: DeviceArg,
}
