//! Tile grid loaded from city-map JSON
//!
//! Each tile is a one-character code looked up in a legend that says
//! whether the tile blocks movement and how expensive it is to enter.

use std::path::Path;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{CourierError, Result};
use crate::world::WorldQuery;

/// Street tile code
pub const STREET: char = 'C';
/// Building tile code
pub const BUILDING: char = 'B';
/// Park tile code
pub const PARK: char = 'P';

/// Legend entry for a tile code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileKind {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default = "default_surface_weight")]
    pub surface_weight: f32,
}

fn default_surface_weight() -> f32 {
    1.0
}

impl TileKind {
    pub fn new(name: &str, blocked: bool, surface_weight: f32) -> Self {
        Self {
            name: name.to_string(),
            blocked,
            surface_weight,
        }
    }

    /// Surface weights feed shortest-path costs and must be finite and non-negative
    pub fn validate(&self, code: char) -> Result<()> {
        if !self.surface_weight.is_finite() || self.surface_weight < 0.0 {
            return Err(CourierError::InvalidMap(format!(
                "tile '{}' ({}) has surface_weight {}, expected a finite value >= 0",
                code, self.name, self.surface_weight
            )));
        }
        Ok(())
    }
}

/// Legend used when a map does not ship its own
pub fn default_legend() -> AHashMap<char, TileKind> {
    let mut legend = AHashMap::new();
    legend.insert(STREET, TileKind::new("street", false, 1.0));
    legend.insert(PARK, TileKind::new("park", false, 0.95));
    legend.insert(BUILDING, TileKind::new("building", true, 1.0));
    legend
}

/// Map rows come either as strings or as arrays of one-character strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRow {
    Text(String),
    Cells(Vec<String>),
}

impl RawRow {
    fn into_codes(self) -> Vec<char> {
        match self {
            RawRow::Text(text) => text.chars().collect(),
            RawRow::Cells(cells) => cells
                .into_iter()
                .map(|cell| cell.chars().next().unwrap_or(' '))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawMap {
    width: i32,
    height: i32,
    tiles: Vec<RawRow>,
    #[serde(default)]
    legend: AHashMap<String, TileKind>,
}

#[derive(Debug, Deserialize)]
struct MapDocument {
    data: RawMap,
}

/// Rectangular tile grid
#[derive(Debug, Clone)]
pub struct TileMap {
    width: i32,
    height: i32,
    tiles: Vec<char>,
    legend: AHashMap<char, TileKind>,
    revision: u64,
}

impl TileMap {
    /// All-street map of the given size
    pub fn open(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            tiles: vec![STREET; (width * height) as usize],
            legend: default_legend(),
            revision: 0,
        }
    }

    /// Build from rows of tile codes using the default legend
    ///
    /// Rows shorter than the first row are padded with buildings.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as i32;
        let width = rows.first().map_or(0, |row| row.chars().count()) as i32;
        let mut map = Self::open(width, height);
        for (y, row) in rows.iter().enumerate() {
            let mut codes: Vec<char> = row.chars().take(width as usize).collect();
            codes.resize(width as usize, BUILDING);
            for (x, code) in codes.into_iter().enumerate() {
                map.tiles[y * width as usize + x] = code;
            }
        }
        map
    }

    /// Parse a city-map JSON document (`{"data": {...}}`)
    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: MapDocument = serde_json::from_str(json)?;
        let raw = document.data;

        if raw.width <= 0 || raw.height <= 0 {
            return Err(CourierError::InvalidMap(format!(
                "dimensions must be positive, got {}x{}",
                raw.width, raw.height
            )));
        }
        if raw.tiles.len() != raw.height as usize {
            return Err(CourierError::InvalidMap(format!(
                "expected {} rows, found {}",
                raw.height,
                raw.tiles.len()
            )));
        }

        let mut tiles = Vec::with_capacity((raw.width * raw.height) as usize);
        for (y, row) in raw.tiles.into_iter().enumerate() {
            let codes = row.into_codes();
            if codes.len() != raw.width as usize {
                return Err(CourierError::InvalidMap(format!(
                    "row {} has {} tiles, expected {}",
                    y,
                    codes.len(),
                    raw.width
                )));
            }
            tiles.extend(codes);
        }

        let legend: AHashMap<char, TileKind> = if raw.legend.is_empty() {
            default_legend()
        } else {
            raw.legend
                .into_iter()
                .filter_map(|(code, kind)| code.chars().next().map(|c| (c, kind)))
                .collect()
        };
        for (code, kind) in &legend {
            kind.validate(*code)?;
        }

        Ok(Self {
            width: raw.width,
            height: raw.height,
            tiles,
            legend,
            revision: 0,
        })
    }

    /// Load a city-map JSON file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some((y * self.width + x) as usize)
    }

    /// Tile code at a coordinate, None when off the map
    pub fn tile(&self, x: i32, y: i32) -> Option<char> {
        self.index(x, y).map(|i| self.tiles[i])
    }

    pub fn kind(&self, x: i32, y: i32) -> Option<&TileKind> {
        self.tile(x, y).and_then(|code| self.legend.get(&code))
    }

    /// Overwrite a tile; out-of-bounds writes are ignored
    pub fn set_tile(&mut self, x: i32, y: i32, code: char) {
        if let Some(i) = self.index(x, y) {
            if self.tiles[i] != code {
                self.tiles[i] = code;
                self.revision += 1;
            }
        }
    }

    pub fn set_blocked(&mut self, x: i32, y: i32) {
        self.set_tile(x, y, BUILDING);
    }

    /// Register or replace a legend entry
    pub fn define(&mut self, code: char, kind: TileKind) -> Result<()> {
        kind.validate(code)?;
        self.legend.insert(code, kind);
        self.revision += 1;
        Ok(())
    }

    /// Number of tiles that can be walked on
    pub fn open_tile_count(&self) -> usize {
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .filter(|&(x, y)| !self.is_blocked(x, y))
            .count()
    }
}

impl WorldQuery for TileMap {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn is_blocked(&self, x: i32, y: i32) -> bool {
        match self.index(x, y) {
            None => true,
            Some(i) => self
                .legend
                .get(&self.tiles[i])
                .is_some_and(|kind| kind.blocked),
        }
    }

    fn surface_cost(&self, x: i32, y: i32) -> f32 {
        self.kind(x, y).map_or(1.0, |kind| kind.surface_weight)
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}
