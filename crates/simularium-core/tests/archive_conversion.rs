use simularium_core::archive::{MANIFEST_FILE_NAME, Manifest, SIMULARIUM_FORMAT};
use simularium_core::common::{AgentOverride, AgentOverrides, ConversionConfig};
use simularium_core::domain::ValueSource;
use simularium_core::simularium::read_document;
use simularium_core::{ErrorKind, OutputEncoding, PipelineStage, convert_archive};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<omexManifest xmlns="http://identifiers.org/combine.specifications/omex-manifest">
  <content location="." format="http://identifiers.org/combine.specifications/omex"/>
  <content location="./model.txt" format="http://purl.org/NET/mediatypes/text/smoldyn+plain" master="true"/>
  <content location="./simulation.sedml" format="http://identifiers.org/combine.specifications/sed-ml"/>
</omexManifest>
"#;

const SEDML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sedML xmlns="http://sed-ml.org/sed-ml/level1/version3" level="1" version="3">
  <listOfSimulations>
    <uniformTimeCourse id="sim" initialTime="0" outputStartTime="0" outputEndTime="2" numberOfSteps="2"/>
  </listOfSimulations>
  <listOfModels>
    <model id="model" source="model.txt" language="urn:sedml:language:smoldyn"/>
  </listOfModels>
</sedML>
"#;

const RED_GREEN_MODEL: &str = "\
# two species, no diffusion constants
dim 3
species red green
boundaries x 0 100
boundaries y 0 100
boundaries z 0 100
time_start 0
time_stop 2
time_step 1
graphics opengl
mol 1 red 10 10 10
mol 1 green 20 20 20
end_file
";

const RED_GREEN_LOG: &str = "\
0 0
red 10 10 10 1
green 20 20 20 2
1 1
red 11 10 10 1
green 20 21 20 2
2 2
red 12 10 10 1
green 20 22 20 2
";

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent directory should be created");
    }
    fs::write(path, content).expect("fixture file should be written");
}

fn write_archive(temp: &TempDir, model: &str, log: &str) -> PathBuf {
    let root = temp.path().join("demo-archive");
    write_file(&root.join(MANIFEST_FILE_NAME), MANIFEST);
    write_file(&root.join("simulation.sedml"), SEDML);
    write_file(&root.join("model.txt"), model);
    write_file(&root.join("modelout.txt"), log);
    root
}

#[test]
fn red_green_archive_converts_with_default_agents() {
    let temp = TempDir::new().expect("tempdir should be created");
    let root = write_archive(&temp, RED_GREEN_MODEL, RED_GREEN_LOG);

    let report = convert_archive(&ConversionConfig::new(&root)).expect("conversion should succeed");
    assert_eq!(report.stage, PipelineStage::Converted);
    assert_eq!(report.artifact.path, root.join("demo-archive.simularium"));
    assert_eq!(report.artifact.encoding, OutputEncoding::Json);
    assert_eq!(report.frame_count, 3);
    assert_eq!(report.record_count, 6);
    assert_eq!(report.box_size, [100.0, 100.0, 100.0]);

    let names = report
        .agents
        .iter()
        .map(|agent| agent.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["red", "green"]);
    for agent in &report.agents {
        assert_eq!(agent.radius_source, ValueSource::Default);
        assert_eq!(agent.color_source, ValueSource::Default);
        assert_eq!(agent.radius, 1.0);
    }
    assert_ne!(report.agents[0].color, report.agents[1].color);

    let (document, encoding) = read_document(&report.artifact.path).expect("output should decode");
    assert_eq!(encoding, OutputEncoding::Json);
    assert_eq!(document.frame_count(), 3);
    assert_eq!(document.agent_type_count(), 2);
    assert_eq!(document.trajectory_info.trajectory_title, "demo-archive");
    for frame in &document.spatial_data.bundle_data {
        assert_eq!(frame.agent_count(), 2);
    }
    let times = document
        .spatial_data
        .bundle_data
        .iter()
        .map(|frame| frame.time)
        .collect::<Vec<_>>();
    assert_eq!(times, vec![0.0, 1.0, 2.0]);

    // Box spans 0..100 on every axis, so red at (10, 10, 10) lands at (-40, -40, -40).
    let first = &document.spatial_data.bundle_data[0].data;
    assert_eq!(&first[3..6], &[-40.0, -40.0, -40.0]);
}

#[test]
fn mass_and_density_override_derives_radius() {
    let temp = TempDir::new().expect("tempdir should be created");
    let root = write_archive(&temp, RED_GREEN_MODEL, RED_GREEN_LOG);
    let overrides = AgentOverrides::from_json_str(r#"{"red": {"density": 1.0, "molecular_mass": 11004}}"#)
        .expect("overrides should parse");

    let report = convert_archive(&ConversionConfig::new(&root).with_overrides(overrides))
        .expect("conversion should succeed");
    let red = &report.agents[0];
    assert_eq!(red.name, "red");
    assert_eq!(red.radius_source, ValueSource::Derived);
    assert!(
        (red.radius - 16.3394).abs() < 1.0e-3,
        "derived radius should follow the spherical mass/density relation, got {}",
        red.radius
    );
    assert_eq!(report.agents[1].radius_source, ValueSource::Default);
}

#[test]
fn explicit_radius_and_color_override_model_values() {
    let temp = TempDir::new().expect("tempdir should be created");
    let model = format!("{}color green blue\ndisplay_size green 4\n", RED_GREEN_MODEL.replace("end_file\n", ""));
    let root = write_archive(&temp, &model, RED_GREEN_LOG);
    let mut overrides = AgentOverrides::new();
    overrides.insert(
        "green",
        AgentOverride {
            radius: Some(2.5),
            color: Some("#FF0000".to_string()),
            ..AgentOverride::default()
        },
    );

    let report = convert_archive(&ConversionConfig::new(&root)).expect("conversion should succeed");
    let green = &report.agents[1];
    assert_eq!(green.radius, 4.0);
    assert_eq!(green.radius_source, ValueSource::Model);
    assert_eq!(green.color.as_str(), "#0000ff");
    assert_eq!(green.color_source, ValueSource::Model);

    let report = convert_archive(&ConversionConfig::new(&root).with_overrides(overrides))
        .expect("conversion should succeed");
    let green = &report.agents[1];
    assert_eq!(green.radius, 2.5);
    assert_eq!(green.radius_source, ValueSource::Override);
    assert_eq!(green.color.as_str(), "#ff0000");
}

#[test]
fn surface_blocks_do_not_leak_into_agents() {
    let temp = TempDir::new().expect("tempdir should be created");
    let model = RED_GREEN_MODEL.replace(
        "graphics opengl\n",
        "graphics opengl\nstart_surface membrane\naction both all reflect\ncolor both 0.5 0.5 0.5 1\npanel sphere 50 50 50 40 20\nend_surface\ncolor red purple\n",
    );
    let root = write_archive(&temp, &model, RED_GREEN_LOG);

    let report = convert_archive(&ConversionConfig::new(&root)).expect("conversion should succeed");
    let names = report
        .agents
        .iter()
        .map(|agent| agent.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["red", "green"]);
    assert_eq!(report.agents[0].color_source, ValueSource::Model);
    let skipped = report
        .skipped_directives
        .iter()
        .map(|directive| directive.keyword.as_str())
        .collect::<Vec<_>>();
    assert!(skipped.contains(&"surface.color"), "skipped: {:?}", skipped);
    assert!(skipped.contains(&"surface.panel"), "skipped: {:?}", skipped);
}

#[test]
fn missing_coordinate_reports_line_number() {
    let temp = TempDir::new().expect("tempdir should be created");
    let log = "0 0\nred 10 10 10 1\ngreen 20 20 20 2\n1 1\nred 11 10\ngreen 20 21 20 2\n";
    let root = write_archive(&temp, RED_GREEN_MODEL, log);

    let error = convert_archive(&ConversionConfig::new(&root)).expect_err("conversion should fail");
    assert_eq!(error.kind(), ErrorKind::TrajectoryParse);
    assert_eq!(error.line(), Some(5));
    assert!(
        error.diagnostic_line().contains(":5"),
        "diagnostic should name the line: {}",
        error.diagnostic_line()
    );
    assert!(!root.join("demo-archive.simularium").exists());
}

#[test]
fn decreasing_frame_times_are_rejected() {
    let temp = TempDir::new().expect("tempdir should be created");
    let log = "0 0\nred 10 10 10 1\n2 1\nred 11 10 10 1\n1 2\nred 12 10 10 1\n";
    let root = write_archive(&temp, RED_GREEN_MODEL, log);

    let error = convert_archive(&ConversionConfig::new(&root)).expect_err("conversion should fail");
    assert_eq!(error.kind(), ErrorKind::TrajectoryParse);
    assert_eq!(error.placeholder(), "TRAJECTORY.TIME_ORDER");
    assert_eq!(error.line(), Some(5));
}

#[test]
fn agents_missing_from_a_frame_are_not_errors() {
    let temp = TempDir::new().expect("tempdir should be created");
    let log = "0 0\nred 10 10 10 1\ngreen 20 20 20 2\n1 1\nred 11 10 10 1\n";
    let root = write_archive(&temp, RED_GREEN_MODEL, log);

    let report = convert_archive(&ConversionConfig::new(&root)).expect("conversion should succeed");
    let (document, _) = read_document(&report.artifact.path).expect("output should decode");
    let counts = document
        .spatial_data
        .bundle_data
        .iter()
        .map(|frame| frame.agent_count())
        .collect::<Vec<_>>();
    assert_eq!(counts, vec![2, 1]);
}

#[test]
fn json_and_binary_outputs_carry_the_same_trajectory() {
    let temp = TempDir::new().expect("tempdir should be created");
    let root = write_archive(&temp, RED_GREEN_MODEL, RED_GREEN_LOG);

    let json = convert_archive(
        &ConversionConfig::new(&root)
            .with_output_path(root.join("out/trajectory.simularium"))
            .with_encoding(OutputEncoding::Json),
    )
    .expect("json conversion should succeed");
    let binary = convert_archive(
        &ConversionConfig::new(&root)
            .with_output_path(root.join("out/trajectory.bin.simularium"))
            .with_encoding(OutputEncoding::Binary),
    )
    .expect("binary conversion should succeed");

    let (from_json, json_encoding) = read_document(&json.artifact.path).expect("json should decode");
    let (from_binary, binary_encoding) =
        read_document(&binary.artifact.path).expect("binary should decode");
    assert_eq!(json_encoding, OutputEncoding::Json);
    assert_eq!(binary_encoding, OutputEncoding::Binary);
    assert_eq!(from_json, from_binary);
}

#[test]
fn repeated_conversion_is_byte_identical() {
    let temp = TempDir::new().expect("tempdir should be created");
    let root = write_archive(&temp, RED_GREEN_MODEL, RED_GREEN_LOG);
    let config = ConversionConfig::new(&root).with_encoding(OutputEncoding::Binary);

    let first = convert_archive(&config).expect("first conversion should succeed");
    let first_bytes = fs::read(&first.artifact.path).expect("output should be readable");
    let first_manifest = fs::read_to_string(root.join(MANIFEST_FILE_NAME)).expect("manifest");

    let second = convert_archive(&config).expect("second conversion should succeed");
    let second_bytes = fs::read(&second.artifact.path).expect("output should be readable");
    let second_manifest = fs::read_to_string(root.join(MANIFEST_FILE_NAME)).expect("manifest");

    assert_eq!(first_bytes, second_bytes);
    assert_eq!(first_manifest, second_manifest);
}

#[test]
fn output_is_registered_once_in_manifest() {
    let temp = TempDir::new().expect("tempdir should be created");
    let root = write_archive(&temp, RED_GREEN_MODEL, RED_GREEN_LOG);

    convert_archive(&ConversionConfig::new(&root)).expect("conversion should succeed");
    convert_archive(&ConversionConfig::new(&root)).expect("conversion should succeed");

    let manifest = Manifest::read(&root.join(MANIFEST_FILE_NAME)).expect("manifest should parse");
    let registered = manifest
        .entries()
        .iter()
        .filter(|entry| entry.format == SIMULARIUM_FORMAT)
        .collect::<Vec<_>>();
    assert_eq!(registered.len(), 1);
    assert_eq!(registered[0].relative_location(), "demo-archive.simularium");
    assert_eq!(manifest.entries().len(), 4);
}

#[test]
fn output_outside_archive_is_written_but_not_registered() {
    let temp = TempDir::new().expect("tempdir should be created");
    let root = write_archive(&temp, RED_GREEN_MODEL, RED_GREEN_LOG);
    let outside = temp.path().join("elsewhere/result.simularium");

    let report = convert_archive(&ConversionConfig::new(&root).with_output_path(&outside))
        .expect("conversion should succeed");
    assert!(outside.is_file());
    assert!(!report.artifact.registered);
    let manifest = fs::read_to_string(root.join(MANIFEST_FILE_NAME)).expect("manifest");
    assert_eq!(manifest, MANIFEST);
}

#[test]
fn box_size_override_replaces_model_bounds() {
    let temp = TempDir::new().expect("tempdir should be created");
    let root = write_archive(&temp, RED_GREEN_MODEL, RED_GREEN_LOG);

    let report = convert_archive(&ConversionConfig::new(&root).with_box_size(250.0))
        .expect("conversion should succeed");
    assert_eq!(report.box_size, [250.0, 250.0, 250.0]);

    let error = convert_archive(&ConversionConfig::new(&root).with_box_size(-1.0))
        .expect_err("negative box should fail");
    assert_eq!(error.kind(), ErrorKind::ArchiveStructure);
    assert_eq!(error.stage(), PipelineStage::Unstarted);
}

#[test]
fn missing_manifest_is_an_archive_structure_error() {
    let temp = TempDir::new().expect("tempdir should be created");
    let root = write_archive(&temp, RED_GREEN_MODEL, RED_GREEN_LOG);
    fs::remove_file(root.join(MANIFEST_FILE_NAME)).expect("manifest should be removed");

    let error = convert_archive(&ConversionConfig::new(&root)).expect_err("conversion should fail");
    assert_eq!(error.kind(), ErrorKind::ArchiveStructure);
    assert_eq!(error.exit_code(), 2);
}

#[test]
fn refusing_overwrite_keeps_existing_output() {
    let temp = TempDir::new().expect("tempdir should be created");
    let root = write_archive(&temp, RED_GREEN_MODEL, RED_GREEN_LOG);
    let output = root.join("demo-archive.simularium");
    write_file(&output, "keep me");

    let mut config = ConversionConfig::new(&root);
    config.overwrite = false;
    let error = convert_archive(&config).expect_err("conversion should refuse to overwrite");
    assert_eq!(error.kind(), ErrorKind::Serialization);
    assert_eq!(
        fs::read_to_string(&output).expect("output should be readable"),
        "keep me"
    );
}
