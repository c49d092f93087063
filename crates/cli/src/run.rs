//! Execute a validated `jubamodel` invocation.
//!
//! Steps run in a fixed order: load, transform, replace config, replace
//! version, fix header, write the model, write the config.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use jubakit_model::{FileFormat, JsonOptions, LoadOptions, Model};
use tracing::{debug, warn};

use crate::parse::{InFormat, ModelCommand, OutFormat};

fn load(cmd: &ModelCommand) -> Result<Model> {
    let target = cmd.target.as_path();
    let format = match cmd.in_format {
        InFormat::Fixed(format) => format,
        InFormat::Auto => Model::predict_format(target)
            .with_context(|| format!("{}: failed to predict model format", target.display()))?,
    };
    debug!(path = %target.display(), ?format, "loading model");

    let file = File::open(target)
        .with_context(|| format!("{}: failed to open model file", target.display()))?;
    let mut reader = BufReader::new(file);
    let model = match format {
        FileFormat::Binary => {
            let options = LoadOptions {
                validate: !cmd.no_validate,
            };
            Model::load_binary(&mut reader, options)
        }
        FileFormat::Json => Model::load_json(&mut reader),
    };
    model.with_context(|| {
        let name = match format {
            FileFormat::Binary => "binary",
            FileFormat::Json => "json",
        };
        format!("{}: failed to parse model as {}", target.display(), name)
    })
}

fn write_model<W: Write>(model: &Model, format: OutFormat, w: &mut W) -> Result<()> {
    match format {
        OutFormat::Binary => model.dump_binary(w)?,
        OutFormat::Json => model.dump_json(w, JsonOptions::default())?,
        OutFormat::Text => model.dump_text(w)?,
    }
    w.flush()?;
    Ok(())
}

fn write_to_file(model: &Model, format: OutFormat, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_model(model, format, &mut BufWriter::new(file))
}

/// Run `cmd`, writing to `stdout` when no output file is given.
pub fn run<W: Write>(cmd: &ModelCommand, stdout: &mut W) -> Result<()> {
    let target = cmd.target.display();
    let mut model = load(cmd)?;

    if let Some(service) = &cmd.transform {
        model = model.transform(service).with_context(|| {
            format!(
                "{}: failed to transform model (supported targets: {})",
                target,
                model.transform_targets().join(", ")
            )
        })?;
    }

    if let Some(path) = &cmd.replace_config {
        let config = fs::read_to_string(path)
            .with_context(|| format!("{}: failed to read config", path.display()))?;
        model.replace_config(config);
        if !cmd.fix_header {
            warn!("replacing config without fixing header; may generate corrupt model");
        }
    }

    if let Some(version) = cmd.replace_version {
        model.replace_version(version);
        if !cmd.fix_header {
            warn!("replacing version without fixing header; may generate corrupt model");
        }
    }

    if cmd.fix_header {
        model
            .fix_header()
            .with_context(|| format!("{}: failed to fix header", target))?;
    }

    match &cmd.output {
        Some(path) => write_to_file(&model, cmd.out_format, path)
            .with_context(|| format!("{}: failed to write model", path.display()))?,
        None => write_model(&model, cmd.out_format, stdout)
            .context("failed to write model to stdout")?,
    }

    if let Some(path) = &cmd.output_config {
        fs::write(path, &model.system.config)
            .with_context(|| format!("{}: failed to write config", path.display()))?;
    }

    Ok(())
}
