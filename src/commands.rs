//! CLI command implementations

use crate::ui::Ui;
use anyhow::{Context, bail};
use pathgen_core::{
    CorpusPaths, CorpusWriter, GraphLoader, LoadedGraph, NodeTable, PathEnumerator, Progress,
    count_lines, read_path_line, render_path,
};
use pathgen_extractors::{available, get_extractor};
use std::path::Path;

pub fn generate(
    input: &Path,
    prefix: &Path,
    step_limit: usize,
    protocol: &str,
    ui: &Ui,
) -> anyhow::Result<()> {
    let Some(extractor) = get_extractor(protocol) else {
        bail!(
            "unknown protocol '{}' (available: {})",
            protocol,
            available().join(", ")
        );
    };
    tracing::info!("Using the {} extractor", protocol);

    let loaded = load(input, ui)?;
    let graph = &loaded.graph;
    let root = graph.validate_root().context("state graph has no usable root")?;
    tracing::info!("Root state {}", root);

    let mut writer = CorpusWriter::create(prefix, extractor)
        .with_context(|| format!("failed to create output files for {}", prefix.display()))?;
    writer.write_nodes(graph, &ui.stage("states"))?;

    let mut enumerator = PathEnumerator::new(graph, step_limit);
    let estimate = enumerator.estimate_paths(root, &ui.stage("sizing"))?;

    let bar = ui.stage("paths");
    bar.set_total(Some(estimate));
    let stats = enumerator
        .enumerate(root, &mut writer, &bar)
        .with_context(|| format!("failed to write paths to {}", prefix.display()))?;
    let summary = writer.finish()?;

    let paths = CorpusPaths::from_prefix(prefix);
    tracing::info!(
        "Wrote {} states, {} paths and {} transitions to {}, {} and {}",
        summary.nodes,
        summary.paths,
        summary.transitions,
        paths.node.display(),
        paths.edge.display(),
        paths.message.display()
    );
    tracing::debug!("Longest path: {} transitions", stats.max_transitions);

    Ok(())
}

pub fn show(prefix: &Path, lines: &[usize]) -> anyhow::Result<()> {
    let paths = CorpusPaths::from_prefix(prefix);
    let table = NodeTable::load(&paths.node)?;
    tracing::debug!("Loaded {} state labels", table.len());

    for &line_no in lines {
        let Some(line) = read_path_line(&paths.edge, line_no)? else {
            bail!("{} has no line {}", paths.edge.display(), line_no);
        };
        print!("{}", render_path(line_no, &line, &table)?);
    }
    Ok(())
}

pub fn stats(input: &Path) -> anyhow::Result<()> {
    let loaded = load(input, &Ui::new(false))?;
    let graph = &loaded.graph;
    let root = graph.validate_root().context("state graph has no usable root")?;
    let estimate = PathEnumerator::new(graph, 0).estimate_paths(root, &pathgen_core::NoProgress)?;

    let rows = [
        ("states", graph.node_count().to_string()),
        ("transitions", graph.edge_count().to_string()),
        ("root", root.to_string()),
        ("leaves", graph.leaf_count().to_string()),
        ("estimate", estimate.to_string()),
        ("lines", loaded.lines.to_string()),
        ("skipped", loaded.skipped.to_string()),
    ];
    let key_width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in rows {
        println!("{key:>key_width$}: {value}");
    }
    Ok(())
}

fn load(input: &Path, ui: &Ui) -> anyhow::Result<LoadedGraph> {
    let bar = ui.stage("loading");
    let lines = count_lines(input)
        .with_context(|| format!("failed to read state graph {}", input.display()))?;
    bar.set_total(Some(lines));
    let loaded = GraphLoader::with_progress(&bar)
        .load_path(input)
        .with_context(|| format!("failed to load state graph {}", input.display()))?;
    tracing::info!(
        "Loaded {} states and {} transitions ({} lines, {} skipped)",
        loaded.graph.node_count(),
        loaded.graph.edge_count(),
        loaded.lines,
        loaded.skipped
    );
    Ok(loaded)
}
