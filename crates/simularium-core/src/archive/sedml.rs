use crate::domain::{ConversionError, ConversionResult};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformTimeCourse {
    pub initial_time: f64,
    pub output_start_time: f64,
    pub output_end_time: f64,
    pub number_of_steps: u64,
}

impl UniformTimeCourse {
    pub fn step_size(&self) -> Option<f64> {
        if self.number_of_steps == 0 {
            return None;
        }
        Some((self.output_end_time - self.output_start_time) / self.number_of_steps as f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationDescription {
    pub model_sources: Vec<String>,
    pub time_course: Option<UniformTimeCourse>,
}

impl SimulationDescription {
    pub fn read(path: &Path) -> ConversionResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| {
            ConversionError::archive_structure(
                "ARCHIVE.SEDML_READ",
                format!("failed to read simulation description: {}", source),
            )
            .with_path(path)
        })?;
        Self::parse(&content).map_err(|error| error.with_path(path))
    }

    pub fn parse(content: &str) -> ConversionResult<Self> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut description = Self::default();
        loop {
            let event = reader.read_event().map_err(|source| {
                ConversionError::archive_structure(
                    "ARCHIVE.SEDML_PARSE",
                    format!(
                        "malformed SED-ML at byte {}: {}",
                        reader.buffer_position(),
                        source
                    ),
                )
            })?;
            match event {
                Event::Start(element) | Event::Empty(element) => {
                    match element.local_name().as_ref() {
                        b"model" => {
                            let attributes = collect_attributes(&element)?;
                            if let Some(source) = attributes.get("source") {
                                description.model_sources.push(source.clone());
                            }
                        }
                        b"uniformTimeCourse" if description.time_course.is_none() => {
                            let attributes = collect_attributes(&element)?;
                            description.time_course = Some(parse_time_course(&attributes)?);
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(description)
    }

    /// True when any declared model source points at `model_location`.
    pub fn references_model(&self, model_location: &str) -> bool {
        let target = strip_dot_prefix(model_location);
        self.model_sources
            .iter()
            .any(|source| strip_dot_prefix(source) == target)
    }
}

fn strip_dot_prefix(value: &str) -> &str {
    let mut value = value.trim();
    while let Some(stripped) = value.strip_prefix("./") {
        value = stripped;
    }
    value
}

fn collect_attributes(element: &BytesStart<'_>) -> ConversionResult<BTreeMap<String, String>> {
    let mut attributes = BTreeMap::new();
    for attribute in element.attributes() {
        let attribute = attribute.map_err(|source| {
            ConversionError::archive_structure(
                "ARCHIVE.SEDML_PARSE",
                format!("malformed SED-ML attribute: {}", source),
            )
        })?;
        let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(|source| {
            ConversionError::archive_structure(
                "ARCHIVE.SEDML_PARSE",
                format!("malformed SED-ML attribute '{}': {}", key, source),
            )
        })?;
        attributes.insert(key, value.into_owned());
    }
    Ok(attributes)
}

fn parse_time_course(attributes: &BTreeMap<String, String>) -> ConversionResult<UniformTimeCourse> {
    let number = |key: &str| -> ConversionResult<f64> {
        let raw = attributes.get(key).ok_or_else(|| {
            ConversionError::archive_structure(
                "ARCHIVE.SEDML_TIME_COURSE",
                format!("uniformTimeCourse is missing '{}'", key),
            )
        })?;
        raw.trim().parse::<f64>().map_err(|_| {
            ConversionError::archive_structure(
                "ARCHIVE.SEDML_TIME_COURSE",
                format!("uniformTimeCourse attribute '{}' is not numeric: '{}'", key, raw),
            )
        })
    };

    let steps = number("numberOfSteps")?;
    if !(steps.is_finite() && steps >= 0.0 && steps.fract() == 0.0) {
        return Err(ConversionError::archive_structure(
            "ARCHIVE.SEDML_TIME_COURSE",
            format!("numberOfSteps must be a non-negative integer, got {}", steps),
        ));
    }

    Ok(UniformTimeCourse {
        initial_time: number("initialTime")?,
        output_start_time: number("outputStartTime")?,
        output_end_time: number("outputEndTime")?,
        number_of_steps: steps as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::SimulationDescription;

    const SEDML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sedML xmlns="http://sed-ml.org/sed-ml/level1/version3" level="1" version="3">
  <listOfSimulations>
    <uniformTimeCourse id="sim" initialTime="0" outputStartTime="0" outputEndTime="10" numberOfSteps="100">
      <algorithm kisaoID="KISAO:0000057"/>
    </uniformTimeCourse>
  </listOfSimulations>
  <listOfModels>
    <model id="model" language="urn:sedml:language:smoldyn" source="model.txt"/>
  </listOfModels>
</sedML>
"#;

    #[test]
    fn extracts_model_source_and_time_course() {
        let description = SimulationDescription::parse(SEDML).expect("SED-ML should parse");

        assert_eq!(description.model_sources, vec!["model.txt".to_string()]);
        assert!(description.references_model("./model.txt"));
        assert!(!description.references_model("other.txt"));

        let course = description.time_course.expect("time course should exist");
        assert_eq!(course.number_of_steps, 100);
        assert_eq!(course.output_end_time, 10.0);
        assert_eq!(course.step_size(), Some(0.1));
    }

    #[test]
    fn non_numeric_time_course_is_rejected() {
        let content = SEDML.replace(r#"outputEndTime="10""#, r#"outputEndTime="ten""#);
        let error = SimulationDescription::parse(&content).expect_err("should fail");
        assert_eq!(error.placeholder(), "ARCHIVE.SEDML_TIME_COURSE");
    }

    #[test]
    fn mismatched_tags_are_rejected() {
        let error = SimulationDescription::parse("<sedML><listOfModels></sedML>")
            .expect_err("should fail");
        assert_eq!(error.placeholder(), "ARCHIVE.SEDML_PARSE");
    }
}
