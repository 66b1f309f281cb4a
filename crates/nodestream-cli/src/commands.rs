// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Subcommand implementations.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::Table;
use nodestream::{CodecConfig, DictionaryStats, NodeDataInput, NodeDataOutput, StreamVersion};
use nodestream_config_fs::{CodecSettings, FsConfigStore, CODEC_CONFIG_KEY};
use nodestream_model::NormalizedNode;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Serialize)]
struct Report {
    version: StreamVersion,
    bytes: u64,
    root: String,
    kind: &'static str,
    nodes: usize,
    depth: usize,
    dictionary: DictionaryStats,
}

fn open_settings(config_dir: Option<&Path>) -> Result<CodecSettings<FsConfigStore>> {
    let store = match config_dir {
        Some(dir) => FsConfigStore::at(dir),
        None => FsConfigStore::new(),
    }
    .context("failed to open config store")?;
    debug!(dir = %store.base().display(), "config store");
    Ok(CodecSettings::new(store))
}

/// Stored codec config; falls back to defaults when the store is unusable.
fn codec_config(config_dir: Option<&Path>) -> CodecConfig {
    match open_settings(config_dir).and_then(|settings| settings.load().map_err(Into::into)) {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "codec config unavailable; using defaults");
            CodecConfig::default()
        }
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
            Ok(())
        }
    }
}

fn decode(bytes: &[u8], config: CodecConfig) -> Result<(NormalizedNode, Report)> {
    let mut input = NodeDataInput::with_config(bytes, config);
    let version = input.version().context("failed to read stream header")?;
    let tree = input.read_node().context("failed to decode tree")?;
    let trailing = (bytes.len() as u64).saturating_sub(input.bytes_read());
    if trailing > 0 {
        info!(trailing, "stream holds more data after the first tree");
    }
    let report = Report {
        version,
        bytes: input.bytes_read(),
        root: tree.identifier().to_string(),
        kind: tree.kind_name(),
        nodes: tree.node_count(),
        depth: tree.depth(),
        dictionary: input.dictionary_stats(),
    };
    Ok((tree, report))
}

fn encode(tree: &NormalizedNode, config: CodecConfig) -> Result<Vec<u8>> {
    let mut out = NodeDataOutput::with_config(Vec::new(), config);
    out.write_node(tree)
        .with_context(|| format!("failed to encode tree as {}", config.version))?;
    debug!(bytes = out.bytes_written(), entries = ?out.dictionary_stats(), "encoded");
    Ok(out.into_inner())
}

pub fn inspect(config_dir: Option<&Path>, input: &Path, json: bool) -> Result<()> {
    let bytes = read_input(input)?;
    let (_, report) = decode(&bytes, codec_config(config_dir))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    let mut table = Table::new();
    table.set_header(vec!["field", "value"]);
    table.add_row(vec!["version".to_owned(), format!("{} ({})", report.version, report.version.code())]);
    table.add_row(vec!["bytes".to_owned(), report.bytes.to_string()]);
    table.add_row(vec!["root".to_owned(), format!("{} {}", report.kind, report.root)]);
    table.add_row(vec!["nodes".to_owned(), report.nodes.to_string()]);
    table.add_row(vec!["depth".to_owned(), report.depth.to_string()]);
    table.add_row(vec!["strings".to_owned(), report.dictionary.strings.to_string()]);
    table.add_row(vec!["modules".to_owned(), report.dictionary.modules.to_string()]);
    table.add_row(vec!["qnames".to_owned(), report.dictionary.qnames.to_string()]);
    table.add_row(vec![
        "augmentations".to_owned(),
        report.dictionary.augmentations.to_string(),
    ]);
    println!("{table}");
    Ok(())
}

pub fn to_json(config_dir: Option<&Path>, input: &Path, output: Option<&Path>) -> Result<()> {
    let bytes = read_input(input)?;
    let (tree, _) = decode(&bytes, codec_config(config_dir))?;
    let mut text = serde_json::to_vec_pretty(&tree)?;
    text.push(b'\n');
    write_output(output, &text)
}

pub fn from_json(
    config_dir: Option<&Path>,
    input: &Path,
    version: Option<StreamVersion>,
    output: Option<&Path>,
) -> Result<()> {
    let text = read_input(input)?;
    let tree: NormalizedNode = serde_json::from_slice(&text)
        .with_context(|| format!("{} is not a JSON tree", input.display()))?;
    let mut config = codec_config(config_dir);
    if let Some(version) = version {
        config = config.with_version(version);
    }
    write_output(output, &encode(&tree, config)?)
}

pub fn transcode(
    config_dir: Option<&Path>,
    input: &Path,
    to: Option<StreamVersion>,
    output: Option<&Path>,
) -> Result<()> {
    let bytes = read_input(input)?;
    let mut config = codec_config(config_dir);
    let (tree, report) = decode(&bytes, config)?;
    if let Some(version) = to {
        config = config.with_version(version);
    }
    if config.version < report.version {
        warn!(from = %report.version, to = %config.version, "older formats widen unsigned values");
    }
    write_output(output, &encode(&tree, config)?)
}

pub fn config_show(config_dir: Option<&Path>) -> Result<()> {
    let config = open_settings(config_dir)?.load()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

pub fn config_set(
    config_dir: Option<&Path>,
    version: Option<StreamVersion>,
    max_depth: Option<usize>,
) -> Result<()> {
    let settings = open_settings(config_dir)?;
    let mut config = settings.load()?;
    if let Some(version) = version {
        config = config.with_version(version);
    }
    if let Some(max_depth) = max_depth {
        anyhow::ensure!(max_depth > 0, "max depth must be positive");
        config = config.with_max_depth(max_depth);
    }
    settings.save(&config)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

pub fn config_path(config_dir: Option<&Path>) -> Result<()> {
    let settings = open_settings(config_dir)?;
    println!("{}", settings.store().path_for(CODEC_CONFIG_KEY).display());
    Ok(())
}
