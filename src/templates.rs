use std::fmt;
use std::path::Path;

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::strokes::{Player, StrokeRecord};
use crate::{DatasetError, Result};

// `{{` and `}}` are literal braces; `{name}` is a placeholder
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern")
});

/// Which fields a question (and its answer mask) is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    PlayerStrokeArea,
    PlayerStroke,
    StrokeOnly,
    HitAreaOnly,
}

impl Granularity {
    /// Order negatives are emitted in.
    pub const ALL: [Granularity; 4] = [
        Granularity::PlayerStrokeArea,
        Granularity::PlayerStroke,
        Granularity::StrokeOnly,
        Granularity::HitAreaOnly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::PlayerStrokeArea => "player_stroke_area",
            Granularity::PlayerStroke => "player_stroke",
            Granularity::StrokeOnly => "stroke_only",
            Granularity::HitAreaOnly => "hit_area_only",
        }
    }

    /// Placeholders a template of this granularity may reference.
    pub fn placeholders(&self) -> &'static [&'static str] {
        match self {
            Granularity::PlayerStrokeArea => &["player", "stroke", "hit_area"],
            Granularity::PlayerStroke => &["player", "stroke"],
            Granularity::StrokeOnly => &["stroke"],
            Granularity::HitAreaOnly => &["hit_area"],
        }
    }

    pub fn needs_hit_area(&self) -> bool {
        matches!(
            self,
            Granularity::PlayerStrokeArea | Granularity::HitAreaOnly
        )
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate fact about a chunk, shaped by its granularity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyTuple<'a> {
    PlayerStrokeArea {
        player: Player,
        stroke: &'a str,
        hit_area: &'a str,
    },
    PlayerStroke {
        player: Player,
        stroke: &'a str,
    },
    Stroke(&'a str),
    HitArea(&'a str),
}

impl<'a> PropertyTuple<'a> {
    /// Projects a stroke onto `granularity`; `None` when the stroke lacks a needed hit area.
    pub fn project(stroke: &'a StrokeRecord, granularity: Granularity) -> Option<Self> {
        let name = stroke.stroke_name.as_str();
        Some(match granularity {
            Granularity::PlayerStrokeArea => PropertyTuple::PlayerStrokeArea {
                player: stroke.player,
                stroke: name,
                hit_area: stroke.hit_area.as_deref()?,
            },
            Granularity::PlayerStroke => PropertyTuple::PlayerStroke {
                player: stroke.player,
                stroke: name,
            },
            Granularity::StrokeOnly => PropertyTuple::Stroke(name),
            Granularity::HitAreaOnly => PropertyTuple::HitArea(stroke.hit_area.as_deref()?),
        })
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            PropertyTuple::PlayerStrokeArea { .. } => Granularity::PlayerStrokeArea,
            PropertyTuple::PlayerStroke { .. } => Granularity::PlayerStroke,
            PropertyTuple::Stroke(_) => Granularity::StrokeOnly,
            PropertyTuple::HitArea(_) => Granularity::HitAreaOnly,
        }
    }

    /// Whether `stroke` exhibits this property. A missing hit area never matches.
    pub fn matches(&self, stroke: &StrokeRecord) -> bool {
        let area = stroke.hit_area.as_deref();
        match *self {
            PropertyTuple::PlayerStrokeArea {
                player,
                stroke: name,
                hit_area,
            } => stroke.player == player && stroke.stroke_name == name && area == Some(hit_area),
            PropertyTuple::PlayerStroke {
                player,
                stroke: name,
            } => stroke.player == player && stroke.stroke_name == name,
            PropertyTuple::Stroke(name) => stroke.stroke_name == name,
            PropertyTuple::HitArea(hit_area) => area == Some(hit_area),
        }
    }

    fn field(&self, placeholder: &str) -> Option<&'a str> {
        match (*self, placeholder) {
            (PropertyTuple::PlayerStrokeArea { player, .. }, "player")
            | (PropertyTuple::PlayerStroke { player, .. }, "player") => Some(player.as_str()),
            (PropertyTuple::PlayerStrokeArea { stroke, .. }, "stroke")
            | (PropertyTuple::PlayerStroke { stroke, .. }, "stroke")
            | (PropertyTuple::Stroke(stroke), "stroke") => Some(stroke),
            (PropertyTuple::PlayerStrokeArea { hit_area, .. }, "hit_area")
            | (PropertyTuple::HitArea(hit_area), "hit_area") => Some(hit_area),
            _ => None,
        }
    }

    /// Fills the template's placeholders, unescapes doubled braces and collapses whitespace.
    pub fn render(&self, template: &str) -> String {
        let filled = PLACEHOLDER.replace_all(template, |caps: &Captures| match caps.get(1) {
            Some(name) => self.field(name.as_str()).unwrap_or(&caps[0]).to_string(),
            None => caps[0][..1].to_string(),
        });
        filled.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Caller-supplied question templates, one pool per granularity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatePools {
    pub player_stroke_area: Vec<String>,
    pub player_stroke: Vec<String>,
    pub stroke_only: Vec<String>,
    pub hit_area_only: Vec<String>,
}

impl Default for TemplatePools {
    fn default() -> Self {
        Self {
            player_stroke_area: vec!["When does the {player} hits a {stroke} {hit_area}?".into()],
            player_stroke: vec!["When does the {player} hits a {stroke}?".into()],
            stroke_only: vec!["When is a {stroke} hits?".into()],
            hit_area_only: vec!["Which stroke is hit {hit_area}?".into()],
        }
    }
}

impl TemplatePools {
    /// Loads pools from a JSON object keyed by granularity name and validates them.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| DatasetError::io(path, e))?;
        let pools: TemplatePools =
            serde_json::from_reader(file).map_err(|e| DatasetError::json(path, e))?;
        pools.validate()?;
        Ok(pools)
    }

    pub fn pool(&self, granularity: Granularity) -> &[String] {
        match granularity {
            Granularity::PlayerStrokeArea => &self.player_stroke_area,
            Granularity::PlayerStroke => &self.player_stroke,
            Granularity::StrokeOnly => &self.stroke_only,
            Granularity::HitAreaOnly => &self.hit_area_only,
        }
    }

    /// Every pool must be non-empty and only use its granularity's placeholders.
    pub fn validate(&self) -> Result<()> {
        for granularity in Granularity::ALL {
            let pool = self.pool(granularity);
            if pool.is_empty() {
                return Err(DatasetError::Configuration(format!(
                    "template pool '{granularity}' is empty"
                )));
            }
            let allowed = granularity.placeholders();
            for template in pool {
                if let Some(name) = PLACEHOLDER
                    .captures_iter(template)
                    .filter_map(|caps| caps.get(1))
                    .find(|name| !allowed.iter().any(|p| *p == name.as_str()))
                {
                    return Err(DatasetError::InvalidTemplate {
                        granularity,
                        template: template.clone(),
                        placeholder: name.as_str().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        Granularity::ALL.iter().map(|g| self.pool(*g).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Uniform draw from one granularity's pool.
    pub fn choose<R: Rng + ?Sized>(&self, granularity: Granularity, rng: &mut R) -> Option<&str> {
        self.pool(granularity).choose(rng).map(String::as_str)
    }

    /// Uniform draw over the concatenation of every pool whose granularity passes `allow`.
    pub fn choose_tagged<R, F>(&self, rng: &mut R, allow: F) -> Option<(Granularity, &str)>
    where
        R: Rng + ?Sized,
        F: Fn(Granularity) -> bool,
    {
        let candidates: Vec<(Granularity, &str)> = Granularity::ALL
            .into_iter()
            .filter(|g| allow(*g))
            .flat_map(|g| self.pool(g).iter().map(move |t| (g, t.as_str())))
            .collect();
        candidates.choose(rng).copied()
    }
}
