use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::strokes::{Split, StrokeRecord};
use crate::{DatasetError, Result};

/// Caption used when a stroke id has no entry in the caption table.
pub const NO_CAPTION: &str = "no caption";

/// Read-only stroke-id -> caption map.
#[derive(Clone, Debug, Default)]
pub struct CaptionLookup {
    captions: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct CaptionEntry {
    image_id: String,
    #[serde(default)]
    caption: Option<String>,
}

impl CaptionLookup {
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| DatasetError::io(path, e))?;
        Self::from_reader(file, path)
    }

    pub fn from_reader<R: Read>(reader: R, label: &Path) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let mut captions = HashMap::new();
        for result in rdr.deserialize::<CaptionEntry>() {
            let entry = result.map_err(|e| DatasetError::csv(label, e))?;
            // blank captions fall through to NO_CAPTION at lookup time
            if let Some(caption) = entry.caption.filter(|c| !c.trim().is_empty()) {
                captions.insert(entry.image_id, caption);
            }
        }
        Ok(Self { captions })
    }

    /// Caption for `stroke_id`, or [`NO_CAPTION`].
    pub fn get(&self, stroke_id: &str) -> &str {
        self.captions
            .get(stroke_id)
            .map(String::as_str)
            .unwrap_or(NO_CAPTION)
    }

    pub fn len(&self) -> usize {
        self.captions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captions.is_empty()
    }
}

impl FromIterator<(String, String)> for CaptionLookup {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            captions: iter.into_iter().collect(),
        }
    }
}

/// One row of the caption table written by `generate_captions`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaptionRow {
    pub image_id: String,
    pub image: String,
    pub caption: String,
    pub split: Split,
}

impl CaptionRow {
    pub fn from_stroke(stroke: &StrokeRecord, media_extension: &str) -> Self {
        Self {
            image_id: stroke.id.clone(),
            image: stroke.filename(media_extension),
            caption: synthesize_caption(stroke),
            split: stroke.split,
        }
    }
}

/// "<player> hits a <stroke> <hit_area>", leaving out a missing hit area.
pub fn synthesize_caption(stroke: &StrokeRecord) -> String {
    match &stroke.hit_area {
        Some(area) => format!("{} hits a {} {}", stroke.player, stroke.stroke_name, area),
        None => format!("{} hits a {}", stroke.player, stroke.stroke_name),
    }
}
