use super::{AxisBounds, ModelParameters, SkippedDirective};
use crate::domain::{ConversionError, ConversionResult, HexColor, split_species_token};
use std::collections::BTreeMap;

const END_OF_FILE_KEYWORD: &str = "end_file";
const BLOCK_START_PREFIX: &str = "start_";
const BLOCK_END_PREFIX: &str = "end_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelTokenLine {
    pub source_line: usize,
    pub raw: String,
    pub tokens: Vec<String>,
}

impl ModelTokenLine {
    fn keyword(&self) -> &str {
        self.tokens.first().map(String::as_str).unwrap_or_default()
    }

    fn values(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or_default()
    }
}

/// Splits a Smoldyn configuration into non-empty token lines, dropping comments and
/// everything after `end_file`.
pub fn tokenize_model(source: &str) -> Vec<ModelTokenLine> {
    let mut in_block_comment = false;
    let mut lines = Vec::new();
    for (index, line) in source.lines().enumerate() {
        let uncommented = strip_comments(line, &mut in_block_comment);
        let normalized = uncommented.trim();
        if normalized.is_empty() {
            continue;
        }
        let tokens = normalized
            .split_whitespace()
            .map(ToOwned::to_owned)
            .collect::<Vec<_>>();
        if tokens[0] == END_OF_FILE_KEYWORD {
            break;
        }
        lines.push(ModelTokenLine {
            source_line: index + 1,
            raw: normalized.to_owned(),
            tokens,
        });
    }
    lines
}

/// Parses top-level directives. Lines inside `start_<block>` … `end_<block>` sections
/// (surfaces, compartments, reactions, ports, filaments) describe non-species objects and
/// are recorded as skipped with a `<block>.<keyword>` name.
pub fn parse_model_source(source: &str) -> ConversionResult<ModelParameters> {
    let mut parameters = ModelParameters::default();
    let mut macros = MacroTable::default();
    let mut blocks: Vec<String> = Vec::new();

    for mut line in tokenize_model(source) {
        if let Some(block) = line.keyword().strip_prefix(BLOCK_START_PREFIX) {
            blocks.push(block.to_string());
            continue;
        }
        if let Some(block) = line.keyword().strip_prefix(BLOCK_END_PREFIX)
            && blocks.last().is_some_and(|open| open == block)
        {
            blocks.pop();
            continue;
        }
        match line.keyword() {
            "define" | "define_global" => {
                let values = line.values();
                if values.len() < 2 {
                    return Err(arity_error(&line, "a name and a value"));
                }
                macros.define(&values[0], macros.substitute_all(&values[1..]).join(" "));
                continue;
            }
            "undefine" => {
                if let Some(name) = line.values().first() {
                    macros.undefine(name);
                }
                continue;
            }
            _ => {}
        }

        if let Some(block) = blocks.last() {
            parameters.skipped.push(SkippedDirective {
                line: line.source_line,
                keyword: format!("{}.{}", block, line.keyword()),
            });
            continue;
        }

        let substituted = macros.substitute_all(line.values());
        line.tokens.truncate(1);
        line.tokens.extend(substituted);
        apply_directive(&mut parameters, &line)?;
    }

    Ok(parameters)
}

fn apply_directive(parameters: &mut ModelParameters, line: &ModelTokenLine) -> ConversionResult<()> {
    let values = line.values();
    match line.keyword() {
        "dim" => {
            expect_arity(line, 1, 1, "one integer")?;
            let dim = parse_integer(line, &values[0])?;
            if !(1..=3).contains(&dim) {
                return Err(value_error(line, format!("dim must be 1, 2 or 3, got {}", dim)));
            }
            parameters.dim = Some(dim as usize);
        }
        "species" => {
            expect_arity(line, 1, usize::MAX, "at least one species name")?;
            for name in values {
                let (base, _) = split_species_token(name);
                parameters.species_entry(base).declared = true;
            }
        }
        "difc" => {
            expect_arity(line, 2, 2, "a species and a diffusion coefficient")?;
            let value = parse_number(line, &values[1])?;
            let (base, state) = split_species_token(&values[0]);
            parameters.species_entry(base).set_diffusion(state, value);
        }
        "color" | "colour" => {
            let color = match values.len() {
                2 => parse_named_color(line, &values[1])?,
                4 | 5 => {
                    let red = parse_number(line, &values[1])?;
                    let green = parse_number(line, &values[2])?;
                    let blue = parse_number(line, &values[3])?;
                    if let Some(alpha) = values.get(4) {
                        parse_number(line, alpha)?;
                    }
                    HexColor::from_fractions(red, green, blue).ok_or_else(|| {
                        value_error(line, "color channels must lie between 0 and 1".to_string())
                    })?
                }
                _ => {
                    return Err(arity_error(
                        line,
                        "a species and either a color name or three or four channel values",
                    ));
                }
            };
            let (base, _) = split_species_token(&values[0]);
            parameters.species_entry(base).color = Some(color);
        }
        "display_size" => {
            expect_arity(line, 2, 2, "a species and a size")?;
            let size = parse_number(line, &values[1])?;
            if size < 0.0 {
                return Err(value_error(line, format!("display_size must be >= 0, got {}", size)));
            }
            let (base, _) = split_species_token(&values[0]);
            parameters.species_entry(base).display_size = Some(size);
        }
        "boundaries" => {
            expect_arity(line, 3, 4, "an axis, a low and a high position")?;
            let axis = parse_axis(line, &values[0])?;
            let low = parse_number(line, &values[1])?;
            let high = parse_number(line, &values[2])?;
            parameters.bounds[axis] = AxisBounds {
                low: Some(low),
                high: Some(high),
            };
        }
        "low_wall" | "high_wall" => {
            expect_arity(line, 2, 3, "an axis and a position")?;
            let axis = parse_axis(line, &values[0])?;
            let position = parse_number(line, &values[1])?;
            if line.keyword() == "low_wall" {
                parameters.bounds[axis].low = Some(position);
            } else {
                parameters.bounds[axis].high = Some(position);
            }
        }
        "time_start" | "time_stop" | "time_step" => {
            expect_arity(line, 1, 1, "one time value")?;
            let value = parse_number(line, &values[0])?;
            match line.keyword() {
                "time_start" => parameters.time.start = Some(value),
                "time_stop" => parameters.time.stop = Some(value),
                _ => parameters.time.step = Some(value),
            }
        }
        "mol" | "surface_mol" => {
            expect_arity(line, 2, usize::MAX, "a count and a species")?;
            let count = parse_integer(line, &values[0])?;
            if count < 0 {
                return Err(value_error(line, format!("molecule count must be >= 0, got {}", count)));
            }
            let (base, _) = split_species_token(&values[1]);
            let entry = parameters.species_entry(base);
            entry.initial_count = entry.initial_count.saturating_add(count as u64);
        }
        keyword => parameters.skipped.push(SkippedDirective {
            line: line.source_line,
            keyword: keyword.to_string(),
        }),
    }
    Ok(())
}

#[derive(Debug, Default)]
struct MacroTable {
    definitions: BTreeMap<String, String>,
}

impl MacroTable {
    fn define(&mut self, name: &str, value: String) {
        self.definitions.insert(name.to_string(), value);
    }

    fn undefine(&mut self, name: &str) {
        self.definitions.remove(name);
    }

    /// Replaces whole tokens that name a macro. Multi-token values are split again.
    fn substitute_all(&self, tokens: &[String]) -> Vec<String> {
        tokens
            .iter()
            .flat_map(|token| match self.definitions.get(token) {
                Some(value) => value
                    .split_whitespace()
                    .map(ToOwned::to_owned)
                    .collect::<Vec<_>>(),
                None => vec![token.clone()],
            })
            .collect()
    }
}

fn strip_comments(line: &str, in_block_comment: &mut bool) -> String {
    let mut kept = String::new();
    let mut rest = line;
    loop {
        if *in_block_comment {
            let Some(end) = rest.find("*/") else {
                return kept;
            };
            *in_block_comment = false;
            rest = &rest[end + 2..];
            continue;
        }

        let block = rest.find("/*");
        let hash = find_line_comment(rest);
        match (block, hash) {
            (Some(block), Some(hash)) if hash < block => {
                kept.push_str(&rest[..hash]);
                return kept;
            }
            (Some(block), _) => {
                kept.push_str(&rest[..block]);
                kept.push(' ');
                *in_block_comment = true;
                rest = &rest[block + 2..];
            }
            (None, Some(hash)) => {
                kept.push_str(&rest[..hash]);
                return kept;
            }
            (None, None) => {
                kept.push_str(rest);
                return kept;
            }
        }
    }
}

/// `#` starts a comment unless it begins a `#rgb` or `#rrggbb` color literal after a keyword.
fn find_line_comment(text: &str) -> Option<usize> {
    text.match_indices('#')
        .map(|(index, _)| index)
        .find(|index| text[..*index].trim().is_empty() || !is_hex_literal(&text[*index..]))
}

fn is_hex_literal(text: &str) -> bool {
    let literal = text.split_whitespace().next().unwrap_or_default();
    HexColor::parse(literal).is_some()
}

fn parse_named_color(line: &ModelTokenLine, token: &str) -> ConversionResult<HexColor> {
    if let Some(color) = HexColor::parse(token) {
        return Ok(color);
    }
    let hex = match token.to_ascii_lowercase().as_str() {
        "black" => "#000000",
        "white" => "#ffffff",
        "red" => "#ff0000",
        "green" => "#00ff00",
        "blue" => "#0000ff",
        "yellow" => "#ffff00",
        "cyan" => "#00ffff",
        "magenta" => "#ff00ff",
        "grey" | "gray" => "#808080",
        "orange" => "#ffa500",
        "purple" => "#800080",
        "brown" => "#a52a2a",
        "pink" => "#ffc0cb",
        "violet" => "#ee82ee",
        "darkred" => "#8b0000",
        "darkgreen" => "#006400",
        "darkblue" => "#00008b",
        "lightgrey" | "lightgray" => "#d3d3d3",
        "darkgrey" | "darkgray" => "#a9a9a9",
        "olive" => "#808000",
        "navy" => "#000080",
        "teal" => "#008080",
        "maroon" => "#800000",
        "aqua" => "#00ffff",
        "lime" => "#00ff00",
        "gold" => "#ffd700",
        _ => {
            return Err(value_error(line, format!("unknown color '{}'", token)));
        }
    };
    HexColor::parse(hex).ok_or_else(|| value_error(line, format!("unknown color '{}'", token)))
}

fn parse_axis(line: &ModelTokenLine, token: &str) -> ConversionResult<usize> {
    match token {
        "0" | "x" => Ok(0),
        "1" | "y" => Ok(1),
        "2" | "z" => Ok(2),
        other => Err(value_error(line, format!("unknown axis '{}'", other))),
    }
}

fn parse_number(line: &ModelTokenLine, token: &str) -> ConversionResult<f64> {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(value_error(
            line,
            format!("'{}' expects a number, got '{}'", line.keyword(), token),
        )),
    }
}

fn parse_integer(line: &ModelTokenLine, token: &str) -> ConversionResult<i64> {
    token.parse::<i64>().map_err(|_| {
        value_error(
            line,
            format!("'{}' expects an integer, got '{}'", line.keyword(), token),
        )
    })
}

fn expect_arity(
    line: &ModelTokenLine,
    min: usize,
    max: usize,
    expected: &str,
) -> ConversionResult<()> {
    let count = line.values().len();
    if count < min || count > max {
        return Err(arity_error(line, expected));
    }
    Ok(())
}

fn arity_error(line: &ModelTokenLine, expected: &str) -> ConversionError {
    ConversionError::model_parse(
        "MODEL.DIRECTIVE_ARITY",
        format!(
            "'{}' expects {}, got {} value(s): '{}'",
            line.keyword(),
            expected,
            line.values().len(),
            line.raw
        ),
    )
    .with_line(line.source_line)
}

fn value_error(line: &ModelTokenLine, message: String) -> ConversionError {
    ConversionError::model_parse("MODEL.DIRECTIVE_VALUE", message).with_line(line.source_line)
}
