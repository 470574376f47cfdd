use crate::archive::{Archive, ArchiveOptions, SIMULARIUM_FORMAT, UniformTimeCourse};
use crate::common::ConversionConfig;
use crate::domain::{AgentDefinition, ConversionResult, OutputArtifact, PipelineStage};
use crate::model::{ModelParameters, SkippedDirective, extract_model_parameters};
use crate::resolve::{DefaultTable, resolve_agents};
use crate::simularium::{BuildOptions, build_document, write_document};
use crate::trajectory::{
    BoxSource, Trajectory, TrajectorySummary, parse_trajectory_file, resolve_box,
    scan_trajectory_file,
};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionReport {
    pub artifact: OutputArtifact,
    pub stage: PipelineStage,
    pub model_path: PathBuf,
    pub trajectory_path: PathBuf,
    pub frame_count: usize,
    pub record_count: usize,
    pub agents: Vec<AgentDefinition>,
    pub skipped_directives: Vec<SkippedDirective>,
    pub box_size: [f64; 3],
    pub box_source: BoxSource,
    pub outside_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InspectionReport {
    pub root: PathBuf,
    pub model_path: PathBuf,
    pub simulation_path: PathBuf,
    pub trajectory_path: PathBuf,
    pub model: ModelParameters,
    pub time_course: Option<UniformTimeCourse>,
    pub trajectory: TrajectorySummary,
}

#[derive(Debug, Default)]
struct StageTracker {
    stage: PipelineStage,
}

impl StageTracker {
    fn reach(&mut self, stage: PipelineStage) {
        info!(stage = %stage, "pipeline stage reached");
        self.stage = stage;
    }
}

/// Runs archive resolution, extraction, parsing, agent resolution and output writing.
/// Errors report the last stage that completed.
pub fn convert_archive(config: &ConversionConfig) -> ConversionResult<ConversionReport> {
    convert_archive_with_defaults(config, &DefaultTable::v1())
}

pub fn convert_archive_with_defaults(
    config: &ConversionConfig,
    defaults: &DefaultTable,
) -> ConversionResult<ConversionReport> {
    let mut tracker = StageTracker::default();
    run_conversion(config, defaults, &mut tracker).map_err(|error| error.at_stage(tracker.stage))
}

fn run_conversion(
    config: &ConversionConfig,
    defaults: &DefaultTable,
    tracker: &mut StageTracker,
) -> ConversionResult<ConversionReport> {
    config.validate()?;

    let options = ArchiveOptions {
        trajectory_file: config.trajectory_file.clone(),
        ..ArchiveOptions::default()
    };
    let mut archive = Archive::open(&config.archive_root, &options)?;
    tracker.reach(PipelineStage::ArchiveResolved);

    let model = extract_model_parameters(archive.model_path())?;
    tracker.reach(PipelineStage::ModelExtracted);

    let frames = parse_trajectory_file(archive.trajectory_path(), model.dimensionality())?;
    let geometry = resolve_box(config.box_size, &model, &frames);
    let trajectory = Trajectory::new(frames, geometry, config.time_unit, config.spatial_unit);
    tracker.reach(PipelineStage::TrajectoryParsed);

    let observed = trajectory.observed_agents();
    let agents = resolve_agents(
        &observed,
        &model,
        &config.overrides,
        defaults,
        config.spatial_unit,
    )?;
    tracker.reach(PipelineStage::AgentsResolved);

    let document = build_document(
        &trajectory,
        &agents,
        &BuildOptions {
            title: config.resolved_title(),
            center: config.center,
        },
    )?;
    let output_path = config.resolved_output_path();
    write_document(&document, &output_path, config.encoding, config.overwrite)?;
    let registered = if config.register_output {
        archive.register_output(&output_path, SIMULARIUM_FORMAT)?
    } else {
        false
    };
    tracker.reach(PipelineStage::Converted);

    info!(
        output = %output_path.display(),
        encoding = %config.encoding,
        frames = trajectory.frames.len(),
        agents = agents.len(),
        registered,
        "wrote Simularium trajectory"
    );

    Ok(ConversionReport {
        artifact: OutputArtifact {
            path: output_path,
            encoding: config.encoding,
            registered,
        },
        stage: tracker.stage,
        model_path: archive.model_path().to_path_buf(),
        trajectory_path: archive.trajectory_path().to_path_buf(),
        frame_count: trajectory.frames.len(),
        record_count: trajectory
            .frames
            .iter()
            .map(|frame| frame.records.len())
            .sum(),
        agents,
        skipped_directives: model.skipped,
        box_size: trajectory.box_size(),
        box_source: trajectory.geometry.source,
        outside_count: trajectory.outside_count,
    })
}

/// Resolves the archive and scans its inputs without writing anything.
pub fn inspect_archive(root: &Path, options: &ArchiveOptions) -> ConversionResult<InspectionReport> {
    let mut tracker = StageTracker::default();
    run_inspection(root, options, &mut tracker).map_err(|error| error.at_stage(tracker.stage))
}

fn run_inspection(
    root: &Path,
    options: &ArchiveOptions,
    tracker: &mut StageTracker,
) -> ConversionResult<InspectionReport> {
    let archive = Archive::open(root, options)?;
    tracker.reach(PipelineStage::ArchiveResolved);

    let model = extract_model_parameters(archive.model_path())?;
    tracker.reach(PipelineStage::ModelExtracted);

    let trajectory = scan_trajectory_file(archive.trajectory_path(), model.dimensionality())?;
    tracker.reach(PipelineStage::TrajectoryParsed);

    Ok(InspectionReport {
        root: archive.root().to_path_buf(),
        model_path: archive.model_path().to_path_buf(),
        simulation_path: archive.simulation_path().to_path_buf(),
        trajectory_path: archive.trajectory_path().to_path_buf(),
        model,
        time_course: archive.simulation().time_course,
        trajectory,
    })
}
