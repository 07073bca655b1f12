use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::strokes::Player;
use crate::{DatasetError, Result};

/// Row of the raw encoder export; only the columns the pipeline needs.
#[derive(Clone, Debug, Deserialize)]
pub struct EncoderRow {
    pub id: String,
    pub upper: String,
    #[serde(rename = "type")]
    pub stroke_type: String,
    pub backhand: String,
    pub relabel_hit_area: String,
    pub split: String,
    pub rally: String,
}

/// Canonical stroke row consumed by caption and QA generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalStroke {
    pub id: String,
    #[serde(rename = "type")]
    pub stroke_type: String,
    pub backhand: u8,
    pub relabel_hit_area: i64,
    pub split: String,
    pub rally: u32,
    pub player: Player,
    pub hit_area: Option<String>,
    pub stroke_name: String,
    #[serde(rename = "stroke_LLM")]
    pub stroke_llm: Option<String>,
}

/// Which occurrence survives when an id repeats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DedupKeep {
    First,
    #[default]
    Last,
}

impl FromStr for DedupKeep {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "first" => Ok(DedupKeep::First),
            "last" => Ok(DedupKeep::Last),
            other => Err(format!("expected 'first' or 'last', got '{other}'")),
        }
    }
}

impl fmt::Display for DedupKeep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DedupKeep::First => "first",
            DedupKeep::Last => "last",
        })
    }
}

/// Canonical column the rows are stably sorted by before deduplication.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Type,
    Backhand,
    RelabelHitArea,
    Split,
    Rally,
    Player,
    HitArea,
    StrokeName,
    StrokeLlm,
}

impl SortColumn {
    pub const ALL: [SortColumn; 10] = [
        SortColumn::Id,
        SortColumn::Type,
        SortColumn::Backhand,
        SortColumn::RelabelHitArea,
        SortColumn::Split,
        SortColumn::Rally,
        SortColumn::Player,
        SortColumn::HitArea,
        SortColumn::StrokeName,
        SortColumn::StrokeLlm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortColumn::Id => "id",
            SortColumn::Type => "type",
            SortColumn::Backhand => "backhand",
            SortColumn::RelabelHitArea => "relabel_hit_area",
            SortColumn::Split => "split",
            SortColumn::Rally => "rally",
            SortColumn::Player => "player",
            SortColumn::HitArea => "hit_area",
            SortColumn::StrokeName => "stroke_name",
            SortColumn::StrokeLlm => "stroke_LLM",
        }
    }

    // numeric columns compare as numbers, missing values sort last
    fn compare(&self, a: &CanonicalStroke, b: &CanonicalStroke) -> Ordering {
        match self {
            SortColumn::Id => a.id.cmp(&b.id),
            SortColumn::Type => compare_codes(&a.stroke_type, &b.stroke_type),
            SortColumn::Backhand => a.backhand.cmp(&b.backhand),
            SortColumn::RelabelHitArea => a.relabel_hit_area.cmp(&b.relabel_hit_area),
            SortColumn::Split => a.split.cmp(&b.split),
            SortColumn::Rally => a.rally.cmp(&b.rally),
            SortColumn::Player => a.player.as_str().cmp(b.player.as_str()),
            SortColumn::HitArea => missing_last(a.hit_area.as_deref(), b.hit_area.as_deref()),
            SortColumn::StrokeName => a.stroke_name.cmp(&b.stroke_name),
            SortColumn::StrokeLlm => missing_last(a.stroke_llm.as_deref(), b.stroke_llm.as_deref()),
        }
    }
}

fn compare_codes(a: &str, b: &str) -> Ordering {
    match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => a.cmp(b),
    }
}

fn missing_last(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        SortColumn::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = SortColumn::ALL.iter().map(|c| c.as_str()).collect();
                format!("unknown column '{s}', expected one of {}", names.join(", "))
            })
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookup tables applied to the encoder export.
#[derive(Clone, Debug, Default)]
pub struct Mappings {
    /// stroke code -> English stroke type; also the filter of valid codes
    pub strokes: HashMap<String, String>,
    /// numeric hit-area code -> hit-area label
    pub hit_areas: HashMap<i64, String>,
    /// stroke code -> stroke type phrased for the LLM
    pub llm_strokes: HashMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreprocessStats {
    pub input_rows: usize,
    pub unknown_stroke: usize,
    pub non_numeric_area: usize,
    pub non_numeric_rally: usize,
    pub unmapped_area: usize,
    pub duplicates: usize,
}

pub fn load_encoder_rows(path: &Path) -> Result<Vec<EncoderRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| DatasetError::csv(path, e))?;
    rdr.deserialize()
        .collect::<std::result::Result<Vec<EncoderRow>, _>>()
        .map_err(|e| DatasetError::csv(path, e))
}

/// Reads a two-column mapping table (`key_column` -> `value_column`).
pub fn load_mapping(path: &Path, key_column: &str, value_column: &str) -> Result<HashMap<String, String>> {
    let file = std::fs::File::open(path).map_err(|e| DatasetError::io(path, e))?;
    read_mapping(file, path, key_column, value_column)
}

pub fn read_mapping<R: Read>(
    reader: R,
    label: &Path,
    key_column: &str,
    value_column: &str,
) -> Result<HashMap<String, String>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = rdr.headers().map_err(|e| DatasetError::csv(label, e))?.clone();
    let column = |name: &str| {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            DatasetError::Configuration(format!("{} has no '{name}' column", label.display()))
        })
    };
    let (key_idx, value_idx) = (column(key_column)?, column(value_column)?);

    let mut mapping = HashMap::new();
    for result in rdr.records() {
        let record = result.map_err(|e| DatasetError::csv(label, e))?;
        let key = record.get(key_idx).unwrap_or_default().trim();
        let value = record.get(value_idx).unwrap_or_default().trim();
        if !key.is_empty() && !value.is_empty() {
            mapping.insert(key.to_string(), value.to_string());
        }
    }
    Ok(mapping)
}

/// Converts a string-keyed hit-area table into numeric codes; non-numeric keys are skipped.
pub fn numeric_keys(mapping: HashMap<String, String>) -> HashMap<i64, String> {
    mapping
        .into_iter()
        .filter_map(|(k, v)| parse_code(&k).map(|code| (code, v)))
        .collect()
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

// "3", "3.0" and " 3 " all become 3
fn parse_code(raw: &str) -> Option<i64> {
    parse_number(raw).map(|v| v.trunc() as i64)
}

fn is_one(raw: &str) -> bool {
    parse_number(raw) == Some(1.0)
}

/// Filters, maps and deduplicates encoder rows into the canonical stroke table.
///
/// With `sort_by`, surviving rows are stably sorted by that column first, which
/// decides the occurrence `keep` retains; otherwise input order is kept.
pub fn preprocess(
    rows: Vec<EncoderRow>,
    mappings: &Mappings,
    keep: DedupKeep,
    sort_by: Option<SortColumn>,
) -> (Vec<CanonicalStroke>, PreprocessStats) {
    let mut stats = PreprocessStats {
        input_rows: rows.len(),
        ..PreprocessStats::default()
    };

    let mut mapped = Vec::with_capacity(rows.len());
    for row in rows {
        let stroke_type = row.stroke_type.trim().to_string();
        let Some(english) = mappings.strokes.get(&stroke_type) else {
            stats.unknown_stroke += 1;
            continue;
        };
        let Some(code) = parse_code(&row.relabel_hit_area) else {
            stats.non_numeric_area += 1;
            continue;
        };
        let Some(rally) = parse_code(&row.rally).and_then(|r| u32::try_from(r).ok()) else {
            stats.non_numeric_rally += 1;
            continue;
        };
        let hit_area = mappings.hit_areas.get(&code).cloned();
        if hit_area.is_none() {
            stats.unmapped_area += 1;
        }

        mapped.push(CanonicalStroke {
            id: row.id,
            backhand: u8::from(is_one(&row.backhand)),
            relabel_hit_area: code,
            split: row.split,
            rally,
            player: if is_one(&row.upper) {
                Player::Upper
            } else {
                Player::Bottom
            },
            hit_area,
            stroke_name: english.to_lowercase(),
            stroke_llm: mappings.llm_strokes.get(&stroke_type).cloned(),
            stroke_type,
        });
    }

    if let Some(column) = sort_by {
        mapped.sort_by(|a, b| column.compare(a, b));
    }

    let before = mapped.len();
    let deduped = dedup_by_id(mapped, keep);
    stats.duplicates = before - deduped.len();
    (deduped, stats)
}

fn dedup_by_id(rows: Vec<CanonicalStroke>, keep: DedupKeep) -> Vec<CanonicalStroke> {
    let mut survivor: HashMap<&str, usize> = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        match keep {
            DedupKeep::First => {
                survivor.entry(row.id.as_str()).or_insert(i);
            }
            DedupKeep::Last => {
                survivor.insert(row.id.as_str(), i);
            }
        }
    }
    let keep_idx: Vec<bool> = (0..rows.len())
        .map(|i| survivor.get(rows[i].id.as_str()) == Some(&i))
        .collect();

    rows.into_iter()
        .zip(keep_idx)
        .filter_map(|(row, keep)| keep.then_some(row))
        .collect()
}

pub fn write_canonical(path: &Path, rows: &[CanonicalStroke]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| DatasetError::io(parent, e))?;
    }
    let mut wtr = csv::Writer::from_path(path).map_err(|e| DatasetError::csv(path, e))?;
    for row in rows {
        wtr.serialize(row).map_err(|e| DatasetError::csv(path, e))?;
    }
    wtr.flush().map_err(|e| DatasetError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, upper: &str, stroke_type: &str, area: &str) -> EncoderRow {
        rally_row(id, upper, stroke_type, area, "4")
    }

    fn rally_row(id: &str, upper: &str, stroke_type: &str, area: &str, rally: &str) -> EncoderRow {
        EncoderRow {
            id: id.into(),
            upper: upper.into(),
            stroke_type: stroke_type.into(),
            backhand: "1.0".into(),
            relabel_hit_area: area.into(),
            split: "train".into(),
            rally: rally.into(),
        }
    }

    fn mappings() -> Mappings {
        Mappings {
            strokes: [("1", "Smash"), ("2", "Net Shot")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            hit_areas: [(3, "back court".to_string())].into_iter().collect(),
            llm_strokes: [("1".to_string(), "a smash".to_string())].into_iter().collect(),
        }
    }

    #[test]
    fn filters_maps_and_keeps_last_duplicate() {
        let rows = vec![
            row("g1_s1_10", "1", "1", "3"),
            row("g1_s1_20", "0", "9", "3"),
            row("g1_s1_30", "0", "2", "n/a"),
            row("g1_s1_40", "0", "2", "7.0"),
            row("g1_s1_10", "0", "2", "3"),
        ];
        let (out, stats) = preprocess(rows, &mappings(), DedupKeep::Last, None);

        assert_eq!(stats.unknown_stroke, 1);
        assert_eq!(stats.non_numeric_area, 1);
        assert_eq!(stats.unmapped_area, 1);
        assert_eq!(stats.duplicates, 1);

        let ids: Vec<&str> = out.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["g1_s1_40", "g1_s1_10"]);
        assert_eq!(out[0].hit_area, None);
        assert_eq!(out[0].relabel_hit_area, 7);
        assert_eq!(out[1].player, Player::Bottom);
        assert_eq!(out[1].stroke_name, "net shot");
        assert_eq!(out[1].stroke_llm, None);
        assert_eq!(out[1].backhand, 1);
    }

    #[test]
    fn keep_first_retains_earliest_row() {
        let rows = vec![row("g1_s1_10", "1", "1", "3"), row("g1_s1_10", "0", "2", "3")];
        let (out, _) = preprocess(rows, &mappings(), DedupKeep::First, None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].player, Player::Upper);
        assert_eq!(out[0].stroke_llm.as_deref(), Some("a smash"));
    }

    #[test]
    fn mapping_tables_and_canonical_output() {
        let table = "id,hit_area\n3,back court\n4.0,front court\nx,ignored\n";
        let raw = read_mapping(table.as_bytes(), Path::new("areas.csv"), "id", "hit_area").unwrap();
        let areas = numeric_keys(raw);
        assert_eq!(areas.get(&4).map(String::as_str), Some("front court"));
        assert_eq!(areas.len(), 2);
        assert!(read_mapping(table.as_bytes(), Path::new("areas.csv"), "Stroke", "hit_area").is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canonical.csv");
        let (out, _) = preprocess(vec![row("g1_s1_10", "1", "1", "3")], &mappings(), DedupKeep::Last, None);
        write_canonical(&path, &out).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "id,type,backhand,relabel_hit_area,split,rally,player,hit_area,stroke_name,stroke_LLM\n\
             g1_s1_10,1,1,3,train,4,upper player,back court,smash,a smash\n"
        );

        let strokes = crate::strokes::load_strokes(&path).unwrap();
        assert_eq!(strokes[0].rally, 4);
        assert_eq!(strokes[0].hit_area.as_deref(), Some("back court"));
    }

    #[test]
    fn float_rallies_load_back_and_blank_rallies_drop() {
        let rows = vec![
            rally_row("g1_s1_10", "1", "1", "3", "4.0"),
            rally_row("g1_s1_20", "0", "2", "3", ""),
            rally_row("g1_s1_30", "0", "2", "3", "-1"),
        ];
        let (out, stats) = preprocess(rows, &mappings(), DedupKeep::Last, None);
        assert_eq!(stats.non_numeric_rally, 2);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rally, 4);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canonical.csv");
        write_canonical(&path, &out).unwrap();
        let strokes = crate::strokes::load_strokes(&path).unwrap();
        assert_eq!(strokes.len(), 1);
        assert_eq!(strokes[0].rally, 4);
    }

    #[test]
    fn sorting_decides_which_duplicate_survives() {
        let rows = vec![
            rally_row("g1_s1_10", "1", "1", "3", "9"),
            rally_row("g1_s1_10", "0", "2", "3", "2"),
            rally_row("g1_s1_20", "0", "2", "3", "5"),
        ];

        let (unsorted, _) = preprocess(rows.clone(), &mappings(), DedupKeep::Last, None);
        let g1 = unsorted.iter().find(|r| r.id == "g1_s1_10").unwrap();
        assert_eq!(g1.rally, 2);

        let (sorted, stats) =
            preprocess(rows.clone(), &mappings(), DedupKeep::Last, Some(SortColumn::Rally));
        assert_eq!(stats.duplicates, 1);
        let ids: Vec<(&str, u32)> = sorted.iter().map(|r| (r.id.as_str(), r.rally)).collect();
        assert_eq!(ids, vec![("g1_s1_20", 5), ("g1_s1_10", 9)]);

        let (first, _) = preprocess(rows, &mappings(), DedupKeep::First, Some(SortColumn::Rally));
        assert_eq!(first[0].rally, 2);
        assert_eq!(first[0].player, Player::Bottom);
    }

    #[test]
    fn sort_columns_parse_by_csv_name() {
        assert_eq!("stroke_LLM".parse::<SortColumn>().unwrap(), SortColumn::StrokeLlm);
        assert_eq!("relabel_hit_area".parse::<SortColumn>().unwrap(), SortColumn::RelabelHitArea);
        assert!("upper".parse::<SortColumn>().is_err());
    }

    #[test]
    fn dedup_keep_parses() {
        assert_eq!("first".parse::<DedupKeep>().unwrap(), DedupKeep::First);
        assert!("middle".parse::<DedupKeep>().is_err());
    }
}
