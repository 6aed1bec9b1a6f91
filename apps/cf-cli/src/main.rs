use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use cf_app::{
    AppResult, EditorSession, Jurisdiction, Player, ServiceConfig, Settlement, SimulationDuration,
    project_service, query,
};
use cf_graph::NodeKind;
use cf_graph::params::{NodeParams, specs_for};
use cf_results::{RunMetrics, SimulationRun};

#[derive(Parser)]
#[command(name = "cf-cli")]
#[command(about = "CarbonFlow CLI - CO2 value chain editor and simulation client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List reporting frameworks
    Jurisdictions,
    /// List node kinds and their parameters
    Kinds,
    /// Print a graph with stored weights and derived shares
    Graph {
        /// Scenario file (defaults to the built-in reference chain)
        #[arg(long)]
        scenario: Option<PathBuf>,
    },
    /// Validate a scenario file
    Validate {
        /// Path to the scenario YAML or JSON file
        scenario_path: PathBuf,
    },
    /// Print the request that simulate would send (no network)
    Request {
        #[arg(long)]
        scenario: Option<PathBuf>,
        /// Framework id: epa, alberta, lcfs, puro
        #[arg(long, default_value = "epa")]
        jurisdiction: String,
        /// Minutes: 5, 12, 30 or 60
        #[arg(long, default_value_t = 12)]
        duration: u32,
    },
    /// Run a simulation against the service and play back the result
    Simulate {
        #[arg(long)]
        scenario: Option<PathBuf>,
        #[arg(long, default_value = "epa")]
        jurisdiction: String,
        #[arg(long, default_value_t = 12)]
        duration: u32,
        /// Archive the received run as JSON
        #[arg(long)]
        save: Option<PathBuf>,
        /// Playback tick interval in milliseconds
        #[arg(long)]
        tick_ms: Option<u64>,
    },
    /// Play back an archived run
    Replay {
        /// Path to the run JSON file
        run_path: PathBuf,
        #[arg(long)]
        tick_ms: Option<u64>,
    },
    /// Export one node series from an archived run as CSV
    ExportSeries {
        /// Path to the run JSON file
        run_path: PathBuf,
        /// Node ID
        node_id: String,
        /// Field name (flow_kg_min, EFFICIENCY, LEAKAGE, ...)
        field: String,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Jurisdictions => cmd_jurisdictions(),
        Commands::Kinds => cmd_kinds(),
        Commands::Graph { scenario } => cmd_graph(scenario.as_deref()),
        Commands::Validate { scenario_path } => cmd_validate(&scenario_path),
        Commands::Request {
            scenario,
            jurisdiction,
            duration,
        } => cmd_request(scenario.as_deref(), &jurisdiction, duration),
        Commands::Simulate {
            scenario,
            jurisdiction,
            duration,
            save,
            tick_ms,
        } => cmd_simulate(
            scenario.as_deref(),
            &jurisdiction,
            duration,
            save.as_deref(),
            tick_ms,
        ),
        Commands::Replay { run_path, tick_ms } => cmd_replay(&run_path, tick_ms),
        Commands::ExportSeries {
            run_path,
            node_id,
            field,
            output,
        } => cmd_export_series(&run_path, &node_id, &field, output.as_deref()),
    }
}

fn parse_duration(minutes: u32) -> AppResult<SimulationDuration> {
    minutes.to_string().parse()
}

fn cmd_jurisdictions() -> AppResult<()> {
    for j in Jurisdiction::ALL {
        println!("{:<8} {:<16} {}", j.id(), j.label(), j.description());
    }
    Ok(())
}

fn cmd_kinds() -> AppResult<()> {
    for kind in NodeKind::ALL {
        println!("{} ({})", kind.label(), kind.as_str());
        println!("  {}", kind.guidance());
        let defaults = NodeParams::defaults(kind);
        for spec in specs_for(kind) {
            let default = defaults
                .get(spec.key)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "    {:<16} {:<20} [{}] range {}  default {}",
                spec.key,
                spec.label,
                spec.unit,
                spec.bounds.describe(),
                default
            );
        }
    }
    Ok(())
}

fn cmd_graph(scenario: Option<&Path>) -> AppResult<()> {
    let graph = project_service::load_graph(scenario)?;

    println!("Nodes:");
    for node in graph.nodes() {
        println!("  {} [{}] {}", node.id(), node.kind(), node.name);
        for (key, value) in node.params().to_flat() {
            println!("      {} = {}", key, value);
        }
        for (spec, value) in node.params().out_of_bounds() {
            println!("      ! {} = {} outside {}", spec.key, value, spec.bounds.describe());
        }
    }

    println!("Edges:");
    for edge in graph.edges() {
        let weight = edge
            .weight()
            .map(|w| format!("{w}"))
            .unwrap_or_else(|| "unset".to_string());
        let share = graph.share(edge.id()).unwrap_or(0.0);
        println!(
            "  {} {} -> {}  weight {}  share {:.1}%",
            edge.id(),
            edge.source(),
            edge.target(),
            weight,
            share
        );
    }
    Ok(())
}

fn cmd_validate(scenario_path: &Path) -> AppResult<()> {
    println!("Validating scenario: {}", scenario_path.display());
    let scenario = project_service::load_scenario(Some(scenario_path))?;
    let graph = project_service::build_graph(&scenario)?;
    println!(
        "✓ Scenario is valid ({} nodes, {} edges)",
        graph.nodes().len(),
        graph.edges().len()
    );
    Ok(())
}

fn cmd_request(scenario: Option<&Path>, jurisdiction: &str, duration: u32) -> AppResult<()> {
    let graph = project_service::load_graph(scenario)?;
    let prepared = cf_app::prepare(&graph, jurisdiction.parse()?, parse_duration(duration)?);
    let body = serde_json::to_string_pretty(&prepared.body)
        .map_err(|e| cf_app::AppError::InvalidInput(e.to_string()))?;
    println!("POST /simulate?readings={}", prepared.readings);
    println!("{}", body);
    Ok(())
}

fn cmd_simulate(
    scenario: Option<&Path>,
    jurisdiction: &str,
    duration: u32,
    save: Option<&Path>,
    tick_ms: Option<u64>,
) -> AppResult<()> {
    let graph = project_service::load_graph(scenario)?;
    let config = ServiceConfig::from_env();
    let wait = config
        .as_ref()
        .map(|c| c.timeout() + Duration::from_secs(5))
        .unwrap_or_default();

    let mut session = EditorSession::with_config(graph, config);
    session.set_jurisdiction(jurisdiction.parse()?);
    session.set_duration(parse_duration(duration)?);
    if let Some(ms) = tick_ms {
        session.set_tick_interval(Duration::from_millis(ms.max(1)));
    }

    println!(
        "Simulating under {} for {}...",
        session.jurisdiction().label(),
        session.duration()
    );
    session.simulate()?;

    match session.wait_for_result(wait) {
        Some(Settlement::Loaded { readings, .. }) => {
            println!("✓ Received {} readings", readings);
        }
        Some(Settlement::Failed { message, .. }) => {
            eprintln!("✗ {}", message);
            std::process::exit(1);
        }
        None => {
            session.cancel();
            eprintln!("✗ {}", cf_app::GENERIC_FAILURE);
            std::process::exit(1);
        }
    }

    if let (Some(path), Some(run)) = (save, session.player().run()) {
        cf_results::save_run(path, run)?;
        println!("  Archived to {}", path.display());
    }

    play_out(session.player_mut());
    if let (Some(run), Some(metrics)) = (session.player().run(), session.metrics()) {
        print_summary(run, &metrics);
    }
    Ok(())
}

fn cmd_replay(run_path: &Path, tick_ms: Option<u64>) -> AppResult<()> {
    let run = cf_results::load_run(run_path)?;
    let mut player = match tick_ms {
        Some(ms) => Player::new(Duration::from_millis(ms.max(1))),
        None => Player::default(),
    };
    player.load(run, Instant::now());
    play_out(&mut player);
    if let (Some(run), Some(metrics)) = (player.run(), player.metrics()) {
        print_summary(run, &metrics);
    }
    Ok(())
}

fn cmd_export_series(
    run_path: &Path,
    node_id: &str,
    field: &str,
    output: Option<&Path>,
) -> AppResult<()> {
    let run = cf_results::load_run(run_path)?;
    let series = query::extract_node_series(&run, node_id, field, None)?;

    match output {
        Some(path) => {
            query::write_series_csv(path, field, &series)?;
            println!("✓ Exported {} points to {}", series.len(), path.display());
        }
        None => print!("{}", query::series_to_csv(field, &series)),
    }
    Ok(())
}

/// Drive the player's timer until playback is done, redrawing on each step.
fn play_out(player: &mut Player) {
    let mut drawn = None;
    loop {
        player.advance(Instant::now());
        let cursor = player.playback().cursor();
        if drawn != Some(cursor) {
            if let Some(metrics) = player.metrics() {
                render_progress(&metrics);
            }
            drawn = Some(cursor);
        }
        if !player.playback().is_playing() {
            break;
        }
        if let Some(deadline) = player.next_deadline() {
            std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
        }
    }
    clear_progress_line();
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_progress(metrics: &RunMetrics) {
    let width = 28usize;
    let fraction = (metrics.progress_pct / 100.0).clamp(0.0, 1.0);
    let filled = ((fraction * width as f64).round() as usize).min(width);
    let bar = format!(
        "{}{}",
        "#".repeat(filled),
        "-".repeat(width.saturating_sub(filled))
    );
    let now = metrics
        .flow
        .last()
        .map(|p| p.time.as_str())
        .unwrap_or("--:--:--");
    print!(
        "\r[{}] {:>5.1}%  {}  t={:.1}/{:.1} min  captured={:.3} t  stored={:.3} t  retention={:.1}%",
        bar,
        metrics.progress_pct,
        now,
        metrics.elapsed_minutes,
        metrics.duration_minutes,
        metrics.captured_tonnes,
        metrics.stored_tonnes,
        metrics.retention_pct
    );
    let _ = io::stdout().flush();
}

fn print_summary(run: &SimulationRun, metrics: &RunMetrics) {
    let summary = query::get_run_summary(run);
    println!("Run summary ({}):", summary.jurisdiction);
    println!(
        "  Readings: {} x {}s ({:.1} min)",
        summary.total_readings, summary.timestep_seconds, summary.duration_minutes
    );
    println!("  Captured: {:.3} t", metrics.captured_tonnes);
    println!("  Stored/utilized: {:.3} t", metrics.stored_tonnes);
    println!("  Retention: {:.1}%", metrics.retention_pct);
    if let Some(net) = summary.total_net_tonnes {
        println!("  Net (service): {:.3} t", net);
    }

    println!("Per component:");
    for total in &metrics.components {
        println!(
            "  {:<28} {:<12} {:>10.3} t",
            total.name, total.kind, total.tonnes
        );
    }

    for series in &metrics.performance {
        let last = series
            .points
            .last()
            .map(|(_, v)| format!("{v:.2}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {} {}: {} points, last {}",
            series.name,
            series.metric.label(),
            series.points.len(),
            last
        );
    }

    for node in run.nodes.iter().filter(|n| !n.audit.is_null()) {
        println!("  audit {}: {}", node.id, node.audit);
    }
}
