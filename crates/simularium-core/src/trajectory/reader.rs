use super::{AgentRecord, Frame};
use crate::domain::{ConversionError, ConversionResult};
use std::io::{BufRead, Lines};

const AXIS_NAMES: [&str; 3] = ["x", "y", "z"];

enum ParsedLine {
    Marker { time: f64, iteration: u64 },
    Record(AgentRecord),
}

/// Lazily yields frames from Smoldyn `executiontime`/`listmols` output.
///
/// Parsing stops at the first error; the iterator is fused afterwards.
pub struct TrajectoryReader<R> {
    lines: Lines<R>,
    dimensionality: usize,
    line_number: usize,
    current: Option<Frame>,
    last_time: Option<f64>,
    finished: bool,
}

impl<R: BufRead> TrajectoryReader<R> {
    pub fn new(reader: R, dimensionality: usize) -> Self {
        Self {
            lines: reader.lines(),
            dimensionality: dimensionality.clamp(1, 3),
            line_number: 0,
            current: None,
            last_time: None,
            finished: false,
        }
    }

    pub fn dimensionality(&self) -> usize {
        self.dimensionality
    }

    fn fail(&mut self, error: ConversionError) -> Option<ConversionResult<Frame>> {
        self.finished = true;
        self.current = None;
        Some(Err(error))
    }

    fn parse_line(&self, line: &str) -> ConversionResult<Option<ParsedLine>> {
        let tokens = line.split_whitespace().collect::<Vec<_>>();
        match tokens.as_slice() {
            [] => Ok(None),
            [time, iteration] if is_numeric(time) && is_numeric(iteration) => {
                self.parse_marker(time, iteration).map(Some)
            }
            [name, values @ ..] => self
                .parse_record(name, values)
                .map(|record| Some(ParsedLine::Record(record))),
        }
    }

    fn parse_marker(&self, time: &str, iteration: &str) -> ConversionResult<ParsedLine> {
        let time = time.parse::<f64>().map_err(|_| self.error(
            "TRAJECTORY.TIME",
            format!("timestamp '{}' is not a number", time),
        ))?;
        if !time.is_finite() || time < 0.0 {
            return Err(self.error(
                "TRAJECTORY.TIME",
                format!("timestamp must be finite and >= 0, got {}", time),
            ));
        }
        let iteration = iteration.parse::<u64>().map_err(|_| {
            self.error(
                "TRAJECTORY.ITERATION",
                format!("iteration '{}' is not a non-negative integer", iteration),
            )
        })?;
        Ok(ParsedLine::Marker { time, iteration })
    }

    fn parse_record(&self, name: &str, values: &[&str]) -> ConversionResult<AgentRecord> {
        if values.len() < self.dimensionality {
            return Err(self.error(
                "TRAJECTORY.RECORD",
                format!(
                    "record '{}' is missing coordinate {}",
                    name, AXIS_NAMES[values.len()]
                ),
            ));
        }
        if values.len() > self.dimensionality + 1 {
            return Err(self.error(
                "TRAJECTORY.RECORD",
                format!(
                    "record '{}' has {} values; expected {} coordinates and an optional serial number",
                    name,
                    values.len(),
                    self.dimensionality
                ),
            ));
        }

        let mut position = [0.0; 3];
        for (axis, raw) in values.iter().take(self.dimensionality).enumerate() {
            position[axis] = match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => value,
                _ => {
                    return Err(self.error(
                        "TRAJECTORY.RECORD",
                        format!(
                            "record '{}' has unparseable {} coordinate '{}'",
                            name, AXIS_NAMES[axis], raw
                        ),
                    ));
                }
            };
        }

        let serial = match values.get(self.dimensionality) {
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
                self.error(
                    "TRAJECTORY.SERIAL",
                    format!("record '{}' has non-integer serial number '{}'", name, raw),
                )
            })?),
            None => None,
        };

        Ok(AgentRecord {
            name: name.to_string(),
            position,
            orientation: None,
            serial,
            source_line: self.line_number,
        })
    }

    fn error(&self, placeholder: &'static str, message: String) -> ConversionError {
        ConversionError::trajectory_parse(placeholder, message).with_line(self.line_number)
    }
}

impl<R: BufRead> Iterator for TrajectoryReader<R> {
    type Item = ConversionResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            let Some(line) = self.lines.next() else {
                self.finished = true;
                return self.current.take().map(Ok);
            };
            self.line_number += 1;
            let line = match line {
                Ok(line) => line,
                Err(source) => {
                    let error = self.error(
                        "TRAJECTORY.READ",
                        format!("failed to read trajectory: {}", source),
                    );
                    return self.fail(error);
                }
            };

            match self.parse_line(&line) {
                Ok(None) => continue,
                Ok(Some(ParsedLine::Marker { time, iteration })) => {
                    if let Some(previous) = self.last_time
                        && time <= previous
                    {
                        let error = self.error(
                            "TRAJECTORY.TIME_ORDER",
                            format!(
                                "timestamp {} does not follow previous timestamp {}",
                                time, previous
                            ),
                        );
                        return self.fail(error);
                    }
                    self.last_time = Some(time);
                    let next = Frame {
                        time,
                        iteration,
                        records: Vec::new(),
                    };
                    if let Some(completed) = self.current.replace(next) {
                        return Some(Ok(completed));
                    }
                }
                Ok(Some(ParsedLine::Record(record))) => match self.current.as_mut() {
                    Some(frame) => frame.records.push(record),
                    None => {
                        let error = self.error(
                            "TRAJECTORY.NO_TIMESTAMP",
                            format!("record '{}' appears before the first timestamp", record.name),
                        );
                        return self.fail(error);
                    }
                },
                Err(error) => return self.fail(error),
            }
        }
    }
}

impl<R: BufRead> std::iter::FusedIterator for TrajectoryReader<R> {}

fn is_numeric(token: &str) -> bool {
    token.parse::<f64>().is_ok()
}
