use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use atlasreg_ants::{RegistrationSession, REGISTRATION_SUBDIR};
use atlasreg_core::{AntsConfig, Interpolation, RegistrationMethod};

#[derive(Parser)]
#[command(name = "atlasreg")]
#[command(about = "ANTs-backed registration coordination for imaging pipelines")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a moving volume onto a fixed reference and resample outputs
    Register(RegisterArgs),

    /// Remove the registration working directory under an output folder
    Clean {
        /// Pipeline output folder
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },
}

#[derive(Args)]
struct RegisterArgs {
    /// Moving volume (registered onto the reference)
    #[arg(short, long)]
    moving: PathBuf,

    /// Fixed reference volume
    #[arg(short, long)]
    fixed: PathBuf,

    /// Registration method tag (sq, SyN, antsRegistrationSyN[s], a, r)
    #[arg(long, default_value = "sq")]
    method: String,

    /// Pipeline output folder; transforms land in its registration/ subfolder
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// JSON resource configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend override (python, executable)
    #[arg(long)]
    backend: Option<String>,

    /// Interpolation for the forward resample
    #[arg(long, default_value = "linear")]
    interpolation: String,

    /// Atlas-space label masks to back-project into patient space, as NAME=PATH
    #[arg(long = "label")]
    labels: Vec<String>,

    /// Keep transform files instead of clearing the session
    #[arg(long)]
    keep_transforms: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Register(args) => register(args)?,
        Commands::Clean { output } => clean(&output)?,
    }

    Ok(())
}

fn register(args: RegisterArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => AntsConfig::from_file(path)?,
        None => AntsConfig::default(),
    };
    if let Some(backend) = &args.backend {
        config.backend = backend.parse()?;
    }
    let method: RegistrationMethod = args.method.parse()?;
    let interpolation: Interpolation = args.interpolation.parse()?;
    let labels = parse_labels(&args.labels)?;

    let mut session = RegistrationSession::new(&config, &args.output)?;
    session.compute(&args.moving, &args.fixed, method)?;

    let warped = session.apply_forward(&args.moving, &args.fixed, interpolation)?;
    info!("registered volume written to {}", warped.display());
    println!("{}", warped.display());

    for (label, mask) in labels {
        let projected =
            session.apply_inverse(&mask, &args.moving, Interpolation::NearestNeighbor, &label)?;
        info!(label = %label, "label mask written to {}", projected.display());
        println!("{}", projected.display());
    }

    if args.keep_transforms {
        info!(
            "keeping transform files in {}",
            session.workdir().display()
        );
    } else {
        session.clear()?;
    }

    Ok(())
}

fn clean(output: &Path) -> Result<()> {
    let workdir = output.join(REGISTRATION_SUBDIR);
    if workdir.exists() {
        info!("removing registration directory: {}", workdir.display());
        std::fs::remove_dir_all(&workdir)?;
    } else {
        info!("no registration outputs to clean");
    }
    Ok(())
}

fn parse_labels(entries: &[String]) -> Result<Vec<(String, PathBuf)>> {
    entries
        .iter()
        .map(|entry| match entry.split_once('=') {
            Some((name, path)) if !name.is_empty() && !path.is_empty() => {
                Ok((name.to_string(), PathBuf::from(path)))
            }
            _ => anyhow::bail!("invalid label '{}', expected NAME=PATH", entry),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels() {
        let labels =
            parse_labels(&["tumor=/data/tumor.nii.gz".to_string(), "ventricles=v.nii.gz".to_string()])
                .unwrap();
        assert_eq!(labels[0].0, "tumor");
        assert_eq!(labels[0].1, PathBuf::from("/data/tumor.nii.gz"));
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn test_parse_labels_rejects_malformed() {
        assert!(parse_labels(&["tumor".to_string()]).is_err());
        assert!(parse_labels(&["=path.nii.gz".to_string()]).is_err());
    }
}
