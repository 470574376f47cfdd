use super::CliError;
use super::helpers::{format_triple, load_agent_overrides, parse_positive_f64, yes_no};
use serde::Serialize;
use simularium_core::archive::ArchiveOptions;
use simularium_core::common::{ConversionConfig, SpatialUnit, TimeUnit};
use simularium_core::simularium::read_document;
use simularium_core::{OutputEncoding, convert_archive, inspect_archive};
use std::path::PathBuf;
use tracing::debug;

#[derive(clap::Args)]
pub(super) struct ConvertArgs {
    /// Extracted archive directory holding manifest.xml
    #[arg(value_name = "ARCHIVE")]
    archive: PathBuf,
    /// Output file (defaults to <ARCHIVE>/<archive-name>.simularium)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
    /// Output encoding: json or binary
    #[arg(long, default_value = "json")]
    encoding: OutputEncoding,
    /// JSON file of per-agent overrides (radius, color, density, molecular_mass)
    #[arg(long = "agent-params", value_name = "FILE")]
    agent_params: Option<PathBuf>,
    /// Edge length of a cubic bounding box, replacing model and observed bounds
    #[arg(long = "box-size", value_parser = parse_positive_f64)]
    box_size: Option<f64>,
    /// Spatial unit of the log coordinates (m, cm, mm, um, nm, angstrom)
    #[arg(long = "spatial-units", default_value = "nm")]
    spatial_units: SpatialUnit,
    /// Time unit of the log timestamps (s, ms, us, ns, ps)
    #[arg(long = "time-units", default_value = "s")]
    time_units: TimeUnit,
    /// Trajectory log relative to the archive root, bypassing discovery
    #[arg(long)]
    trajectory: Option<PathBuf>,
    /// Trajectory title (defaults to the archive directory name)
    #[arg(long)]
    title: Option<String>,
    /// Keep raw coordinates instead of centering the box on the origin
    #[arg(long = "no-center")]
    no_center: bool,
    /// Do not add the output to manifest.xml
    #[arg(long = "no-register")]
    no_register: bool,
    /// Fail when the output file already exists
    #[arg(long = "no-overwrite")]
    no_overwrite: bool,
}

#[derive(clap::Args)]
pub(super) struct InspectArgs {
    /// Extracted archive directory holding manifest.xml
    #[arg(value_name = "ARCHIVE")]
    archive: PathBuf,
    /// Trajectory log relative to the archive root, bypassing discovery
    #[arg(long)]
    trajectory: Option<PathBuf>,
    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
pub(super) struct DecodeArgs {
    /// Simularium file in JSON or binary encoding
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct InspectSummary {
    root: String,
    model: String,
    simulation: String,
    trajectory: String,
    dimensionality: usize,
    species: Vec<String>,
    model_box: Option<[f64; 3]>,
    skipped_directives: Vec<String>,
    time_course_steps: Option<u64>,
    time_course_step: Option<f64>,
    frame_count: usize,
    record_count: usize,
    first_time: Option<f64>,
    last_time: Option<f64>,
    agents: Vec<String>,
}

#[derive(Debug, Serialize)]
struct DecodeSummary {
    encoding: &'static str,
    title: String,
    frame_count: usize,
    agent_types: Vec<String>,
    spatial_units: String,
    time_units: String,
    time_step: f64,
    size: [f64; 3],
    first_time: Option<f32>,
    last_time: Option<f32>,
}

pub(super) fn run_convert_command(args: ConvertArgs) -> Result<i32, CliError> {
    let mut config = ConversionConfig::new(&args.archive).with_encoding(args.encoding);
    if let Some(path) = &args.agent_params {
        config = config.with_overrides(load_agent_overrides(path)?);
    }
    if let Some(output) = args.output {
        config = config.with_output_path(output);
    }
    if let Some(box_size) = args.box_size {
        config = config.with_box_size(box_size);
    }
    config.spatial_unit = args.spatial_units;
    config.time_unit = args.time_units;
    config.trajectory_file = args.trajectory;
    config.title = args.title;
    config.center = !args.no_center;
    config.register_output = !args.no_register;
    config.overwrite = !args.no_overwrite;

    debug!(
        archive = %config.archive_root.display(),
        output = %config.resolved_output_path().display(),
        overrides = config.overrides.len(),
        "starting conversion"
    );
    let report = convert_archive(&config)?;

    println!(
        "Converted {} -> {}",
        report.trajectory_path.display(),
        report.artifact.path.display()
    );
    println!("encoding: {}", report.artifact.encoding);
    println!("frames: {}", report.frame_count);
    println!("records: {}", report.record_count);
    println!(
        "box: {} {} ({})",
        format_triple(report.box_size),
        config.spatial_unit,
        report.box_source.as_str()
    );
    if report.outside_count > 0 {
        println!("positions outside box: {}", report.outside_count);
    }
    for agent in &report.agents {
        println!(
            "agent {} '{}': radius {} {} ({}), color {} ({})",
            agent.type_id,
            agent.name,
            agent.radius,
            config.spatial_unit,
            agent.radius_source,
            agent.color,
            agent.color_source
        );
    }
    if !report.skipped_directives.is_empty() {
        println!(
            "skipped model directives: {}",
            report.skipped_directives.len()
        );
    }
    println!("registered in manifest: {}", yes_no(report.artifact.registered));
    Ok(0)
}

pub(super) fn run_inspect_command(args: InspectArgs) -> Result<i32, CliError> {
    let options = ArchiveOptions {
        trajectory_file: args.trajectory,
        ..ArchiveOptions::default()
    };
    let report = inspect_archive(&args.archive, &options)?;

    let summary = InspectSummary {
        root: report.root.display().to_string(),
        model: report.model_path.display().to_string(),
        simulation: report.simulation_path.display().to_string(),
        trajectory: report.trajectory_path.display().to_string(),
        dimensionality: report.model.dimensionality(),
        species: report
            .model
            .declared_species()
            .map(|species| species.name.clone())
            .collect(),
        model_box: report.model.box_size(),
        skipped_directives: report
            .model
            .skipped
            .iter()
            .map(|skipped| format!("{}:{}", skipped.line, skipped.keyword))
            .collect(),
        time_course_steps: report.time_course.map(|course| course.number_of_steps),
        time_course_step: report.time_course.and_then(|course| course.step_size()),
        frame_count: report.trajectory.frame_count,
        record_count: report.trajectory.record_count,
        first_time: report.trajectory.first_time,
        last_time: report.trajectory.last_time,
        agents: report.trajectory.agent_names,
    };

    if args.json {
        let rendered = serde_json::to_string_pretty(&summary)
            .map_err(|error| CliError::Internal(error.into()))?;
        println!("{}", rendered);
        return Ok(0);
    }

    println!("archive: {}", summary.root);
    println!("model: {}", summary.model);
    println!("simulation: {}", summary.simulation);
    println!("trajectory: {}", summary.trajectory);
    println!("dimensionality: {}", summary.dimensionality);
    println!("declared species: {}", summary.species.join(", "));
    match summary.model_box {
        Some(size) => println!("model box: {}", format_triple(size)),
        None => println!("model box: (none)"),
    }
    if let Some(steps) = summary.time_course_steps {
        println!("time course steps: {}", steps);
    }
    if let Some(step) = summary.time_course_step {
        println!("time course step: {}", step);
    }
    println!("frames: {}", summary.frame_count);
    println!("records: {}", summary.record_count);
    if let (Some(first), Some(last)) = (summary.first_time, summary.last_time) {
        println!("time span: {} .. {}", first, last);
    }
    println!("observed agents: {}", summary.agents.join(", "));
    for skipped in &summary.skipped_directives {
        println!("skipped directive: {}", skipped);
    }
    Ok(0)
}

pub(super) fn run_decode_command(args: DecodeArgs) -> Result<i32, CliError> {
    let (document, encoding) = read_document(&args.file)?;
    debug!(file = %args.file.display(), encoding = %encoding, "decoded Simularium file");
    let info = &document.trajectory_info;
    let frames = &document.spatial_data.bundle_data;

    let summary = DecodeSummary {
        encoding: encoding.as_str(),
        title: info.trajectory_title.clone(),
        frame_count: document.frame_count(),
        agent_types: info
            .type_mapping
            .iter()
            .map(|(id, mapping)| format!("{}={}", id, mapping.name))
            .collect(),
        spatial_units: format!("{} {}", info.spatial_units.magnitude, info.spatial_units.name),
        time_units: format!("{} {}", info.time_units.magnitude, info.time_units.name),
        time_step: info.time_step_size,
        size: [info.size.x, info.size.y, info.size.z],
        first_time: frames.first().map(|frame| frame.time),
        last_time: frames.last().map(|frame| frame.time),
    };

    if args.json {
        let rendered = serde_json::to_string_pretty(&summary)
            .map_err(|error| CliError::Internal(error.into()))?;
        println!("{}", rendered);
        return Ok(0);
    }

    println!("file: {}", args.file.display());
    println!("encoding: {}", summary.encoding);
    println!("title: {}", summary.title);
    println!("frames: {}", summary.frame_count);
    println!("agent types: {}", summary.agent_types.join(", "));
    println!("spatial units: {}", summary.spatial_units);
    println!("time units: {}", summary.time_units);
    println!("time step: {}", summary.time_step);
    println!("size: {}", format_triple(summary.size));
    Ok(0)
}
