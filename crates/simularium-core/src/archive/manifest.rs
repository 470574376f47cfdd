//! COMBINE `manifest.xml` reading and rewriting.

use crate::domain::{ConversionError, ConversionResult};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use serde::Deserialize;
use std::fmt::Display;
use std::fs;
use std::path::Path;

pub const MANIFEST_FILE_NAME: &str = "manifest.xml";
pub const MANIFEST_NAMESPACE: &str = "http://identifiers.org/combine.specifications/omex-manifest";
pub const SIMULARIUM_FORMAT: &str = "http://identifiers.org/combine.specifications/simularium";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub location: String,
    pub format: String,
    pub master: bool,
}

impl ManifestEntry {
    pub fn new(location: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            format: format.into(),
            master: false,
        }
    }

    /// Location with any leading `./` removed.
    pub fn relative_location(&self) -> &str {
        let mut location = self.location.trim();
        while let Some(stripped) = location.strip_prefix("./") {
            location = stripped;
        }
        location
    }

    /// The `.` entry describing the archive itself.
    pub fn is_archive_self_entry(&self) -> bool {
        let location = self.relative_location();
        location.is_empty() || location == "."
    }

    pub fn is_smoldyn_model(&self) -> bool {
        !self.is_archive_self_entry() && self.format.to_ascii_lowercase().contains("smoldyn")
    }

    pub fn is_sedml(&self) -> bool {
        let format = self.format.to_ascii_lowercase();
        !self.is_archive_self_entry() && format.contains("sed-ml")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
struct ManifestDocument {
    #[serde(rename = "content", default)]
    contents: Vec<ContentElement>,
}

#[derive(Debug, Deserialize)]
struct ContentElement {
    #[serde(rename = "@location")]
    location: String,
    #[serde(rename = "@format")]
    format: String,
    #[serde(rename = "@master", default)]
    master: Option<String>,
}

impl Manifest {
    pub fn read(path: &Path) -> ConversionResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| {
            ConversionError::archive_structure(
                "ARCHIVE.MANIFEST_READ",
                format!("failed to read manifest: {}", source),
            )
            .with_path(path)
        })?;
        Self::parse(&content).map_err(|error| error.with_path(path))
    }

    pub fn parse(content: &str) -> ConversionResult<Self> {
        let document: ManifestDocument = quick_xml::de::from_str(content).map_err(|source| {
            ConversionError::archive_structure(
                "ARCHIVE.MANIFEST_PARSE",
                format!("malformed manifest: {}", source),
            )
        })?;

        let entries = document
            .contents
            .into_iter()
            .map(|element| ManifestEntry {
                location: element.location,
                format: element.format,
                master: element
                    .master
                    .as_deref()
                    .map(|value| matches!(value.trim(), "true" | "1"))
                    .unwrap_or(false),
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Adds `entry`, replacing any entry with the same location. Returns true on replacement.
    pub fn upsert(&mut self, entry: ManifestEntry) -> bool {
        let target = entry.relative_location().to_string();
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|existing| existing.relative_location() == target)
        {
            *existing = entry;
            return true;
        }
        self.entries.push(entry);
        false
    }

    pub fn to_xml(&self) -> ConversionResult<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_write_error)?;

        let mut root = BytesStart::new("omexManifest");
        root.push_attribute(("xmlns", MANIFEST_NAMESPACE));
        writer
            .write_event(Event::Start(root))
            .map_err(xml_write_error)?;

        for entry in &self.entries {
            let mut element = BytesStart::new("content");
            element.push_attribute(("location", entry.location.as_str()));
            element.push_attribute(("format", entry.format.as_str()));
            if entry.master {
                element.push_attribute(("master", "true"));
            }
            writer
                .write_event(Event::Empty(element))
                .map_err(xml_write_error)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("omexManifest")))
            .map_err(xml_write_error)?;

        String::from_utf8(writer.into_inner()).map_err(xml_write_error)
    }
}

fn xml_write_error(error: impl Display) -> ConversionError {
    ConversionError::serialization(
        "ARCHIVE.MANIFEST_WRITE",
        format!("failed to encode manifest: {}", error),
    )
}

#[cfg(test)]
mod tests {
    use super::{Manifest, ManifestEntry, SIMULARIUM_FORMAT};

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<omexManifest xmlns="http://identifiers.org/combine.specifications/omex-manifest">
  <content location="." format="http://identifiers.org/combine.specifications/omex"/>
  <content location="./model.txt" format="http://purl.org/NET/mediatypes/text/smoldyn+plain"/>
  <content location="./simulation.sedml" format="http://identifiers.org/combine.specifications/sed-ml" master="true"/>
</omexManifest>
"#;

    #[test]
    fn parses_entries_and_classifies_formats() {
        let manifest = Manifest::parse(MANIFEST).expect("manifest should parse");
        let entries = manifest.entries();

        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_archive_self_entry());
        assert!(!entries[0].is_smoldyn_model());
        assert!(entries[1].is_smoldyn_model());
        assert_eq!(entries[1].relative_location(), "model.txt");
        assert!(entries[2].is_sedml());
        assert!(entries[2].master);
    }

    #[test]
    fn malformed_manifest_is_rejected() {
        let error = Manifest::parse("<omexManifest><content location=").expect_err("should fail");
        assert_eq!(error.placeholder(), "ARCHIVE.MANIFEST_PARSE");
    }

    #[test]
    fn upsert_replaces_same_location() {
        let mut manifest = Manifest::parse(MANIFEST).expect("manifest should parse");

        assert!(!manifest.upsert(ManifestEntry::new("./out.simularium", SIMULARIUM_FORMAT)));
        assert!(manifest.upsert(ManifestEntry::new("out.simularium", SIMULARIUM_FORMAT)));
        assert_eq!(manifest.entries().len(), 4);
    }

    #[test]
    fn written_manifest_parses_back() {
        let mut manifest = Manifest::parse(MANIFEST).expect("manifest should parse");
        manifest.upsert(ManifestEntry::new("./out.simularium", SIMULARIUM_FORMAT));

        let xml = manifest.to_xml().expect("manifest should encode");
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains(r#"location="./out.simularium""#));

        let reparsed = Manifest::parse(&xml).expect("written manifest should parse");
        assert_eq!(reparsed, manifest);
    }
}
