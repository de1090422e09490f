//! mimir-gen - scenario generator CLI
//!
//! Prints a scenario as indented JSON, or publishes it to the ingestion
//! pipeline with `--send`.

use anyhow::bail;
use clap::{Parser, ValueEnum};
use uuid::Uuid;

use mimir_generator::publish::{default_push_target, Publisher};
use mimir_generator::scenarios::{
    abductive, anchoring, apophenia, AbductiveVariant, AnchoringVariant, ApopheniaVariant,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Family {
    Anchoring,
    Apophenia,
    Abduction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Variant {
    Trap,
    Truth,
    /// Apophenia only: partial-signal DNS interleave.
    Uncertain,
}

#[derive(Debug, Parser)]
#[command(name = "mimir-gen", about = "Generate cognitive-bias alert scenarios")]
struct Cli {
    /// Scenario family to generate
    #[arg(value_enum)]
    family: Family,

    /// Scenario variant
    #[arg(long, value_enum, default_value = "trap")]
    variant: Variant,

    /// Use the DNS template family for apophenia trap/truth
    #[arg(long)]
    dns: bool,

    /// Attach this group id instead of minting one
    #[arg(long)]
    group: Option<Uuid>,

    /// Publish to the push transport instead of printing
    #[arg(long)]
    send: bool,

    /// Override the transport push target
    #[arg(long, value_name = "URL")]
    project: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    // Variant strings are decoded into the closed per-family enums here,
    // once, at the boundary.
    let scenario = match cli.family {
        Family::Anchoring => {
            let variant = match cli.variant {
                Variant::Trap => AnchoringVariant::Trap,
                Variant::Truth => AnchoringVariant::Truth,
                Variant::Uncertain => bail!("variant 'uncertain' is only valid for apophenia"),
            };
            anchoring(variant, cli.group)
        }
        Family::Apophenia => {
            let variant = match cli.variant {
                Variant::Trap => ApopheniaVariant::Trap,
                Variant::Truth => ApopheniaVariant::Truth,
                Variant::Uncertain => ApopheniaVariant::Uncertain,
            };
            apophenia(variant, cli.dns, cli.group)
        }
        Family::Abduction => {
            let variant = match cli.variant {
                Variant::Trap => AbductiveVariant::Trap,
                Variant::Truth => AbductiveVariant::Truth,
                Variant::Uncertain => bail!("variant 'uncertain' is only valid for apophenia"),
            };
            abductive(variant, cli.group)
        }
    };

    if cli.send {
        let target = cli.project.unwrap_or_else(default_push_target);
        let publisher = Publisher::new(target)?;
        // Best-effort: a rejected push is a diagnostic, not a failure.
        publisher.publish(&scenario);
    } else {
        println!("{}", scenario.to_pretty_json());
    }

    Ok(())
}
