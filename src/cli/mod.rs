// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `gen-qa`   — generates QA pairs from a PDF
//   2. `finetune` — fine-tunes the model on a QA corpus
//   3. `query`    — answers questions with a fine-tuned model
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, FinetuneArgs, GenQaArgs, QueryArgs};

use crate::backend::select_device;

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "qa-slm",
    version = "0.1.0",
    about = "Generate QA pairs from PDFs, fine-tune a small seq2seq model, answer questions."
)]
pub struct Cli {
    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin — it only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::GenQa(args)    => run_gen_qa(args),
            Commands::Finetune(args) => run_finetune(args),
            Commands::Query(args)    => run_query(args),
        }
    }
}

/// Handles the `gen-qa` subcommand.
fn run_gen_qa(args: GenQaArgs) -> Result<()> {
    use crate::application::generate_use_case::GenerateUseCase;

    tracing::info!("Generating QA pairs from '{}'", args.input);

    // The device is resolved exactly once, here, and injected down
    let device = select_device(args.device.into());
    let output = args.output.clone();

    let use_case = GenerateUseCase::new(args.into(), device);
    let count    = use_case.execute()?;

    println!("QA pairs saved to {output} ({count} pairs).");
    Ok(())
}

/// Handles the `finetune` subcommand.
fn run_finetune(args: FinetuneArgs) -> Result<()> {
    use crate::application::finetune_use_case::FinetuneUseCase;

    tracing::info!("Starting fine-tuning on corpus in '{}'", args.data_dir);

    let device     = select_device(args.device.into());
    let output_dir = args.output_dir.clone();

    let use_case = FinetuneUseCase::new(args.into(), device);
    use_case.execute()?;

    println!("Fine-tuning completed. Model saved to {output_dir}.");
    Ok(())
}

/// Handles the `query` subcommand.
fn run_query(args: QueryArgs) -> Result<()> {
    use crate::application::query_use_case::QueryUseCase;
    use std::path::Path;

    let device = select_device(args.device.into());

    let use_case = QueryUseCase::new(&args.model_dir, device)?;
    let count    = use_case.execute(Path::new(&args.input), Path::new(&args.output))?;

    println!("Answers saved to {} ({count} questions).", args.output);
    Ok(())
}
