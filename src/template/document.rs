use std::{collections::HashSet, path::Path};

use anyhow::Context as _;

use crate::foundation::error::{GifweaveError, GifweaveResult};

/// Version stamped into every exported template.
pub const TEMPLATE_VERSION: &str = "1.0";

fn default_output_dim() -> u32 {
    256
}

fn default_color_count() -> u16 {
    256
}

fn default_frame_duration() -> u32 {
    100
}

fn default_scale() -> f32 {
    1.0
}

fn default_opacity() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

/// Render settings carried inside a template.
///
/// `material_count` is only meaningful for legacy layered documents, which
/// declare how many materials the template expects at apply time.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TemplateSettings {
    #[serde(default = "default_output_dim")]
    pub output_width: u32,
    #[serde(default = "default_output_dim")]
    pub output_height: u32,
    #[serde(default)]
    pub loop_count: u16,
    #[serde(default)]
    pub transparent_bg: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_count: Option<usize>,
    #[serde(default = "default_color_count")]
    pub color_count: u16,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            output_width: default_output_dim(),
            output_height: default_output_dim(),
            loop_count: 0,
            transparent_bg: false,
            material_count: None,
            color_count: default_color_count(),
        }
    }
}

/// Wire form of a multi-timeline model.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct MultiTimelineDocument {
    pub version: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub settings: TemplateSettings,
    #[serde(default)]
    pub timebase: TimebaseSection,
    #[serde(default)]
    pub main_timeline_index: usize,
    #[serde(default)]
    pub timelines: Vec<TimelineSection>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct TimebaseSection {
    #[serde(default)]
    pub durations_ms: Vec<u32>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TimelineSection {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub offset_x: i32,
    #[serde(default)]
    pub offset_y: i32,
    /// One entry per timebase frame; `null` is an empty slot.
    #[serde(default)]
    pub frames: Vec<Option<SlotEntry>>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SlotEntry {
    pub material_index: usize,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

/// Wire form of a legacy layered sequence.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LayeredDocument {
    pub version: String,
    #[serde(default)]
    pub settings: TemplateSettings,
    #[serde(default)]
    pub frames: Vec<FrameEntry>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct FrameEntry {
    #[serde(default)]
    pub index: usize,
    #[serde(default = "default_frame_duration")]
    pub duration: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub layers: Vec<LayerEntry>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LayerEntry {
    #[serde(default)]
    pub index: usize,
    pub material_index: usize,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub crop_x: i32,
    #[serde(default)]
    pub crop_y: i32,
    /// Crop extents are nullable on the wire; a crop only exists when both
    /// are present.
    #[serde(default)]
    pub crop_width: Option<u32>,
    #[serde(default)]
    pub crop_height: Option<u32>,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default = "default_true")]
    pub visible: bool,
}

/// A parsed template, discriminated by format at parse time.
#[derive(Clone, Debug)]
pub enum TemplateDocument {
    MultiTimeline(MultiTimelineDocument),
    Layered(LayeredDocument),
}

/// Summary of a template document, for compatibility checks before apply.
#[derive(Clone, Debug, serde::Serialize)]
pub struct TemplateInfo {
    pub version: String,
    pub format: &'static str,
    pub frame_count: usize,
    pub unique_materials: usize,
    pub total_duration_ms: u32,
    pub output_width: u32,
    pub output_height: u32,
    pub loop_count: u16,
    pub transparent_bg: bool,
    pub color_count: u16,
    /// Multi-timeline documents only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline_count: Option<usize>,
    /// Legacy documents only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_layers: Option<usize>,
    /// Legacy documents only: declared requirement, falling back to the
    /// referenced count when the declaration is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_count: Option<usize>,
}

impl TemplateDocument {
    pub fn version(&self) -> &str {
        match self {
            Self::MultiTimeline(doc) => &doc.version,
            Self::Layered(doc) => &doc.version,
        }
    }

    pub fn format_name(&self) -> &'static str {
        match self {
            Self::MultiTimeline(_) => "multi_timeline",
            Self::Layered(_) => "layered",
        }
    }

    pub fn settings(&self) -> &TemplateSettings {
        match self {
            Self::MultiTimeline(doc) => &doc.settings,
            Self::Layered(doc) => &doc.settings,
        }
    }

    pub fn to_json_string(&self) -> GifweaveResult<String> {
        let json = match self {
            Self::MultiTimeline(doc) => serde_json::to_string_pretty(doc),
            Self::Layered(doc) => serde_json::to_string_pretty(doc),
        }
        .map_err(|e| GifweaveError::template(format!("failed to serialize template: {e}")))?;
        Ok(json)
    }

    pub fn info(&self) -> TemplateInfo {
        let settings = self.settings();
        let mut info = TemplateInfo {
            version: self.version().to_string(),
            format: self.format_name(),
            frame_count: 0,
            unique_materials: 0,
            total_duration_ms: 0,
            output_width: settings.output_width,
            output_height: settings.output_height,
            loop_count: settings.loop_count,
            transparent_bg: settings.transparent_bg,
            color_count: settings.color_count,
            timeline_count: None,
            total_layers: None,
            material_count: None,
        };

        match self {
            Self::MultiTimeline(doc) => {
                let referenced: HashSet<usize> = doc
                    .timelines
                    .iter()
                    .flat_map(|t| t.frames.iter())
                    .flatten()
                    .map(|slot| slot.material_index)
                    .collect();
                info.frame_count = doc.timebase.durations_ms.len();
                info.unique_materials = referenced.len();
                info.total_duration_ms = saturating_sum(&doc.timebase.durations_ms);
                info.timeline_count = Some(doc.timelines.len());
            }
            Self::Layered(doc) => {
                let referenced: HashSet<usize> = doc
                    .frames
                    .iter()
                    .flat_map(|f| f.layers.iter())
                    .map(|layer| layer.material_index)
                    .collect();
                info.frame_count = doc.frames.len();
                info.unique_materials = referenced.len();
                info.total_duration_ms = doc
                    .frames
                    .iter()
                    .fold(0u32, |acc, f| acc.saturating_add(f.duration));
                info.total_layers = Some(doc.frames.iter().map(|f| f.layers.len()).sum());
                info.material_count =
                    Some(doc.settings.material_count.unwrap_or(referenced.len()));
            }
        }

        info
    }
}

/// Parses a JSON value into a discriminated template.
///
/// A missing `version` field is a hard error. A present-but-different version
/// is accepted as-is, no migration is attempted. The format is multi-timeline
/// when the `format` tag says so or when both `timelines` and `timebase` keys
/// are present, legacy layered otherwise.
pub fn parse_template(value: serde_json::Value) -> GifweaveResult<TemplateDocument> {
    let Some(root) = value.as_object() else {
        return Err(GifweaveError::template("template root must be a JSON object"));
    };
    if !root.contains_key("version") {
        return Err(GifweaveError::template("invalid template: missing version"));
    }
    if let Some(version) = root.get("version").and_then(|v| v.as_str())
        && version != TEMPLATE_VERSION
    {
        tracing::debug!(version, "template version differs, applying as-is");
    }

    let is_multi = root.get("format").and_then(|f| f.as_str()) == Some("multi_timeline")
        || (root.contains_key("timelines") && root.contains_key("timebase"));

    if is_multi {
        let doc: MultiTimelineDocument = serde_json::from_value(value).map_err(|e| {
            GifweaveError::template(format!("failed to parse multi-timeline template: {e}"))
        })?;
        Ok(TemplateDocument::MultiTimeline(doc))
    } else {
        let doc: LayeredDocument = serde_json::from_value(value).map_err(|e| {
            GifweaveError::template(format!("failed to parse layered template: {e}"))
        })?;
        Ok(TemplateDocument::Layered(doc))
    }
}

pub fn parse_template_str(text: &str) -> GifweaveResult<TemplateDocument> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| GifweaveError::template(format!("template is not valid JSON: {e}")))?;
    parse_template(value)
}

pub fn load_template(path: &Path) -> GifweaveResult<TemplateDocument> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read template '{}'", path.display()))?;
    parse_template_str(&text)
}

pub fn save_template(document: &TemplateDocument, path: &Path) -> GifweaveResult<()> {
    let json = document.to_json_string()?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write template '{}'", path.display()))?;
    Ok(())
}

fn saturating_sum(durations: &[u32]) -> u32 {
    durations.iter().fold(0u32, |acc, &d| acc.saturating_add(d))
}

#[cfg(test)]
#[path = "../../tests/unit/template/document.rs"]
mod tests;
