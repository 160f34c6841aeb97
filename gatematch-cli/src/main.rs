use clap::Parser;
use gatematch::image::io::load_gray_image;
use gatematch::layout::memory::{GateId, MemoryLayer, MemoryLayout};
use gatematch::{
    CompileConfig, GateTemplate, LayerType, MatchConfig, MatchProgress, MatchReport, Matcher,
    Orientation, PlacementGrid, Rect, SearchOrder, TemplateBank, TemplateId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "GateMatch CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output (progress, placements, timing spans).
    #[arg(long)]
    trace: bool,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
enum LayerTypeConfig {
    Transistor,
    Logic,
    Metal,
}

impl From<LayerTypeConfig> for LayerType {
    fn from(value: LayerTypeConfig) -> Self {
        match value {
            LayerTypeConfig::Transistor => LayerType::Transistor,
            LayerTypeConfig::Logic => LayerType::Logic,
            LayerTypeConfig::Metal => LayerType::Metal,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
enum OrientationConfig {
    Identity,
    FlipVertical,
    FlipHorizontal,
    FlipBoth,
}

impl From<OrientationConfig> for Orientation {
    fn from(value: OrientationConfig) -> Self {
        match value {
            OrientationConfig::Identity => Orientation::Identity,
            OrientationConfig::FlipVertical => Orientation::FlipVertical,
            OrientationConfig::FlipHorizontal => Orientation::FlipHorizontal,
            OrientationConfig::FlipBoth => Orientation::FlipBoth,
        }
    }
}

impl From<Orientation> for OrientationConfig {
    fn from(value: Orientation) -> Self {
        match value {
            Orientation::Identity => OrientationConfig::Identity,
            Orientation::FlipVertical => OrientationConfig::FlipVertical,
            Orientation::FlipHorizontal => OrientationConfig::FlipHorizontal,
            Orientation::FlipBoth => OrientationConfig::FlipBoth,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GridSpacingConfig {
    Regular { offset: usize, distance: usize },
    Irregular { offsets: Vec<usize> },
}

#[derive(Debug, Deserialize)]
struct GridConfig {
    #[serde(flatten)]
    spacing: GridSpacingConfig,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl From<GridConfig> for PlacementGrid {
    fn from(value: GridConfig) -> Self {
        let grid = match value.spacing {
            GridSpacingConfig::Regular { offset, distance } => {
                PlacementGrid::regular(offset, distance)
            }
            GridSpacingConfig::Irregular { offsets } => PlacementGrid::irregular(offsets),
        };
        grid.with_enabled(value.enabled)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum OrderConfig {
    #[default]
    Free,
    Rows {
        grid: GridConfig,
    },
    Columns {
        grid: GridConfig,
    },
}

impl From<OrderConfig> for SearchOrder {
    fn from(value: OrderConfig) -> Self {
        match value {
            OrderConfig::Free => SearchOrder::Free,
            OrderConfig::Rows { grid } => SearchOrder::Rows(grid.into()),
            OrderConfig::Columns { grid } => SearchOrder::Columns(grid.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct CompileConfigJson {
    layer: LayerTypeConfig,
    orientations: Vec<OrientationConfig>,
    pyramid_factor: usize,
    parallel: bool,
}

impl Default for CompileConfigJson {
    fn default() -> Self {
        let cfg = CompileConfig::default();
        Self {
            layer: LayerTypeConfig::Logic,
            orientations: cfg.orientations.into_iter().map(Into::into).collect(),
            pyramid_factor: cfg.pyramid_factor,
            parallel: cfg.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MatchConfigJson {
    layer_position: usize,
    order: OrderConfig,
    threshold_hc: f32,
    threshold_detection: f32,
    threshold_steps: usize,
    max_step: usize,
    hill_climb_radius: usize,
}

impl Default for MatchConfigJson {
    fn default() -> Self {
        let cfg = MatchConfig::default();
        Self {
            layer_position: cfg.layer_position,
            order: OrderConfig::Free,
            threshold_hc: cfg.threshold_hc,
            threshold_detection: cfg.threshold_detection,
            threshold_steps: cfg.threshold_steps,
            max_step: cfg.max_step,
            hill_climb_radius: cfg.hill_climb_radius,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AreaConfig {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
}

#[derive(Debug, Deserialize, Serialize)]
struct PortConfig {
    name: String,
    x: usize,
    y: usize,
}

#[derive(Debug, Deserialize)]
struct TemplateConfig {
    id: u32,
    name: String,
    path: String,
    #[serde(default)]
    ports: Vec<PortConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    layer_path: String,
    area: Option<AreaConfig>,
    templates: Vec<TemplateConfig>,
    output_path: Option<String>,
    time_limit_secs: Option<f64>,
    progress_interval_ms: u64,
    compile: CompileConfigJson,
    #[serde(rename = "match")]
    match_cfg: MatchConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layer_path: String::new(),
            area: None,
            templates: Vec::new(),
            output_path: None,
            time_limit_secs: None,
            progress_interval_ms: 500,
            compile: CompileConfigJson::default(),
            match_cfg: MatchConfigJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct GateRecord {
    gate: u64,
    template: u32,
    name: String,
    orientation: OrientationConfig,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    score: f32,
    ports: Vec<PortConfig>,
}

#[derive(Debug, Serialize)]
struct IssueRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    gate: Option<u64>,
    template: u32,
    orientation: OrientationConfig,
    error: String,
}

#[derive(Debug, Serialize)]
struct Stats {
    conflicts: usize,
    candidates_scored: usize,
    hill_climbs: usize,
    passes_completed: usize,
    cancelled: bool,
    elapsed_ms: f64,
}

#[derive(Debug, Serialize)]
struct Output {
    gates: Vec<GateRecord>,
    rejected: Vec<IssueRecord>,
    failures: Vec<IssueRecord>,
    stats: Stats,
}

fn load_templates(
    configs: &[TemplateConfig],
    layer: LayerType,
) -> Result<Vec<GateTemplate>, Box<dyn std::error::Error>> {
    let mut templates = Vec::with_capacity(configs.len());
    for cfg in configs {
        let image = load_gray_image(&cfg.path)?;
        let mut tpl = GateTemplate::from_image(TemplateId(cfg.id), cfg.name.as_str(), layer, image);
        for port in &cfg.ports {
            tpl = tpl.with_port(port.name.as_str(), port.x, port.y)?;
        }
        templates.push(tpl);
    }
    Ok(templates)
}

fn build_output(
    report: MatchReport<GateId>,
    layout: &MemoryLayout,
    templates: &[GateTemplate],
) -> Output {
    let names: HashMap<TemplateId, &str> =
        templates.iter().map(|t| (t.id(), t.name())).collect();
    let gates = report
        .placed
        .iter()
        .map(|placed| GateRecord {
            gate: placed.handle.0,
            template: placed.template.0,
            name: names.get(&placed.template).copied().unwrap_or_default().to_string(),
            orientation: placed.orientation.into(),
            x: placed.rect.min_x,
            y: placed.rect.min_y,
            width: placed.rect.width(),
            height: placed.rect.height(),
            score: placed.score,
            ports: layout
                .gate(placed.handle)
                .map(|gate| {
                    gate.ports
                        .iter()
                        .map(|p| PortConfig {
                            name: p.name.clone(),
                            x: p.x,
                            y: p.y,
                        })
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect();
    let rejected = report
        .rejected
        .iter()
        .map(|r| IssueRecord {
            gate: None,
            template: r.template.0,
            orientation: r.orientation.into(),
            error: r.error.to_string(),
        })
        .collect();
    let failures = report
        .failures
        .iter()
        .map(|f| IssueRecord {
            gate: f.gate.map(|id| id.0),
            template: f.template.0,
            orientation: f.orientation.into(),
            error: f.error.to_string(),
        })
        .collect();

    Output {
        gates,
        rejected,
        failures,
        stats: Stats {
            conflicts: report.conflicts,
            candidates_scored: report.candidates_scored,
            hill_climbs: report.hill_climbs,
            passes_completed: report.passes_completed,
            cancelled: report.cancelled,
            elapsed_ms: report.elapsed.as_secs_f64() * 1e3,
        },
    }
}

fn parse_time_limit(secs: Option<f64>) -> Result<Option<Duration>, Box<dyn std::error::Error>> {
    match secs.map(Duration::try_from_secs_f64).transpose() {
        Ok(limit) => Ok(limit),
        Err(_) => Err("time_limit_secs must be a finite, non-negative number of seconds".into()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("gatematch=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.layer_path.is_empty() || config.templates.is_empty() {
        return Err("layer_path and at least one template must be set in the config".into());
    }
    if config.progress_interval_ms == 0 {
        return Err("progress_interval_ms must be at least 1".into());
    }
    let time_limit = parse_time_limit(config.time_limit_secs)?;

    let layer_type: LayerType = config.compile.layer.into();
    let layer = MemoryLayer::new(load_gray_image(&config.layer_path)?);
    let templates = load_templates(&config.templates, layer_type)?;
    let area = match &config.area {
        Some(a) => Rect::from_origin(a.x, a.y, a.width, a.height),
        None => layer.bounds(),
    };

    let bank = TemplateBank::compile(
        &templates,
        &CompileConfig {
            layer: layer_type,
            orientations: config
                .compile
                .orientations
                .iter()
                .map(|&o| o.into())
                .collect(),
            pyramid_factor: config.compile.pyramid_factor,
            parallel: config.compile.parallel,
        },
    )?;
    let matcher = Matcher::new(bank).with_config(MatchConfig {
        layer_position: config.match_cfg.layer_position,
        order: config.match_cfg.order.into(),
        threshold_hc: config.match_cfg.threshold_hc,
        threshold_detection: config.match_cfg.threshold_detection,
        threshold_steps: config.match_cfg.threshold_steps,
        max_step: config.match_cfg.max_step,
        hill_climb_radius: config.match_cfg.hill_climb_radius,
    });
    matcher.config().validate()?;

    let progress = MatchProgress::new();
    let mut layout = MemoryLayout::with_templates(&templates);
    let poll = Duration::from_millis(config.progress_interval_ms);
    let started = Instant::now();

    let report = thread::scope(|scope| {
        let worker = scope.spawn(|| matcher.run(&layer, &mut layout, area, &progress));
        while !worker.is_finished() {
            thread::sleep(poll);
            tracing::info!(
                done = progress.done(),
                total = progress.total(),
                percent = progress.fraction() * 100.0,
                "progress"
            );
            if time_limit.is_some_and(|limit| started.elapsed() >= limit) && !progress.is_cancelled()
            {
                tracing::warn!("time limit reached, cancelling");
                progress.cancel();
            }
        }
        worker.join()
    })
    .map_err(|_| "matcher thread panicked")??;

    let output = build_output(report, &layout, &templates);
    let json = serde_json::to_string_pretty(&output)?;
    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_time_limit;
    use std::time::Duration;

    #[test]
    fn time_limit_accepts_fractional_seconds() {
        assert_eq!(parse_time_limit(None).unwrap(), None);
        assert_eq!(
            parse_time_limit(Some(1.5)).unwrap(),
            Some(Duration::from_millis(1500))
        );
    }

    #[test]
    fn time_limit_rejects_unrepresentable_values() {
        for secs in [-1.0, f64::NAN, f64::INFINITY, 1e30] {
            assert!(parse_time_limit(Some(secs)).is_err(), "{secs}");
        }
    }
}
