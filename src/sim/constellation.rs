//! Constellation definitions
//!
//! A definition lists star positions as fractions of the surface (0-1 range)
//! and the edges connecting them by star index. Definitions are validated once
//! when a [`Catalog`] is built, so the simulation never has to re-check them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StarfieldError};

/// A single constellation as authored (names, fractional star coords, edges)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstellationDef {
    pub name: String,
    /// Star positions as `[x, y]` surface fractions
    pub stars: Vec<[f32; 2]>,
    /// Connections as `[a, b]` star indices
    #[serde(default)]
    pub edges: Vec<[usize; 2]>,
}

impl ConstellationDef {
    pub fn new(name: &str, stars: &[[f32; 2]], edges: &[[usize; 2]]) -> Self {
        Self {
            name: name.to_string(),
            stars: stars.to_vec(),
            edges: edges.to_vec(),
        }
    }

    /// Star position scaled onto a surface
    #[inline]
    pub fn star_position(&self, index: usize, width: f32, height: f32) -> Option<Vec2> {
        self.stars
            .get(index)
            .map(|&[x, y]| Vec2::new(x * width, y * height))
    }

    /// Check member count against edge bounds and coordinate ranges
    pub fn validate(&self) -> Result<()> {
        if self.stars.is_empty() {
            return Err(StarfieldError::EmptyConstellation {
                name: self.name.clone(),
            });
        }

        for (index, &[x, y]) in self.stars.iter().enumerate() {
            let in_unit = |v: f32| v.is_finite() && (0.0..=1.0).contains(&v);
            if !in_unit(x) || !in_unit(y) {
                return Err(StarfieldError::StarOutOfBounds {
                    name: self.name.clone(),
                    index,
                    x,
                    y,
                });
            }
        }

        let len = self.stars.len();
        for &[a, b] in &self.edges {
            if a >= len || b >= len {
                return Err(StarfieldError::EdgeOutOfRange {
                    name: self.name.clone(),
                    a,
                    b,
                    len,
                });
            }
            if a == b {
                return Err(StarfieldError::SelfLoop {
                    name: self.name.clone(),
                    index: a,
                });
            }
        }

        Ok(())
    }
}

/// A validated, ordered set of constellation definitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ConstellationDef>", into = "Vec<ConstellationDef>")]
pub struct Catalog {
    defs: Vec<ConstellationDef>,
}

impl Catalog {
    /// Validate every definition and reject duplicate names
    pub fn new(defs: Vec<ConstellationDef>) -> Result<Self> {
        for (i, def) in defs.iter().enumerate() {
            def.validate()?;
            if defs[..i].iter().any(|d| d.name == def.name) {
                return Err(StarfieldError::DuplicateName(def.name.clone()));
            }
        }
        Ok(Self { defs })
    }

    /// Empty catalog (ambient particle fields have no constellations)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a catalog from a JSON array of definitions
    pub fn from_json(json: &str) -> Result<Self> {
        let defs: Vec<ConstellationDef> = serde_json::from_str(json)?;
        Self::new(defs)
    }

    pub fn defs(&self) -> &[ConstellationDef] {
        &self.defs
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Total number of member stars across all constellations
    pub fn star_count(&self) -> usize {
        self.defs.iter().map(|d| d.stars.len()).sum()
    }

    /// Built-in tables are authored in this file and covered by tests
    fn builtin(defs: Vec<ConstellationDef>) -> Self {
        debug_assert!(Self::new(defs.clone()).is_ok());
        Self { defs }
    }

    /// Twelve constellations spread over the whole surface
    pub fn classic() -> Self {
        Self::builtin(vec![
            ConstellationDef::new(
                "Orion",
                &[
                    [0.48, 0.18], // Betelgeuse
                    [0.56, 0.18], // Bellatrix
                    [0.50, 0.28],
                    [0.54, 0.28],
                    [0.52, 0.35], // Belt
                    [0.49, 0.36],
                    [0.55, 0.34],
                    [0.46, 0.48], // Saiph
                    [0.58, 0.48], // Rigel
                ],
                &[[0, 2], [1, 3], [2, 3], [2, 4], [3, 6], [4, 5], [5, 6], [4, 7], [6, 8]],
            ),
            ConstellationDef::new(
                "Ursa Major",
                &[
                    [0.08, 0.12],
                    [0.12, 0.10],
                    [0.16, 0.11],
                    [0.20, 0.14],
                    [0.19, 0.18],
                    [0.24, 0.15],
                    [0.25, 0.19],
                ],
                &[[0, 1], [1, 2], [2, 3], [3, 4], [4, 6], [3, 5], [5, 6]],
            ),
            ConstellationDef::new(
                "Cassiopeia",
                &[[0.75, 0.08], [0.78, 0.12], [0.82, 0.09], [0.86, 0.13], [0.89, 0.10]],
                &[[0, 1], [1, 2], [2, 3], [3, 4]],
            ),
            ConstellationDef::new(
                "Leo",
                &[
                    [0.82, 0.72],
                    [0.86, 0.68],
                    [0.90, 0.70],
                    [0.94, 0.74],
                    [0.88, 0.78],
                    [0.84, 0.80],
                ],
                &[[0, 1], [1, 2], [2, 3], [2, 4], [4, 5], [5, 0]],
            ),
            ConstellationDef::new(
                "Cygnus",
                &[
                    [0.05, 0.52],
                    [0.08, 0.58],
                    [0.11, 0.63],
                    [0.06, 0.63],
                    [0.12, 0.56],
                    [0.14, 0.68],
                ],
                &[[0, 1], [1, 2], [1, 3], [1, 4], [2, 5]],
            ),
            ConstellationDef::new(
                "Lyra",
                &[[0.92, 0.42], [0.95, 0.46], [0.97, 0.50], [0.95, 0.53], [0.93, 0.50]],
                &[[0, 1], [1, 2], [2, 3], [3, 4], [4, 1]],
            ),
            ConstellationDef::new(
                "Scorpius",
                &[
                    [0.08, 0.78],
                    [0.11, 0.82],
                    [0.14, 0.85],
                    [0.18, 0.87],
                    [0.22, 0.88],
                    [0.25, 0.85],
                    [0.27, 0.82],
                ],
                &[[0, 1], [1, 2], [2, 3], [3, 4], [4, 5], [5, 6]],
            ),
            ConstellationDef::new(
                "Gemini",
                &[
                    [0.32, 0.08],
                    [0.35, 0.12],
                    [0.38, 0.16],
                    [0.36, 0.10],
                    [0.40, 0.14],
                    [0.42, 0.18],
                ],
                &[[0, 1], [1, 2], [3, 4], [4, 5], [1, 4]],
            ),
            ConstellationDef::new(
                "Aquarius",
                &[[0.62, 0.75], [0.65, 0.78], [0.68, 0.80], [0.66, 0.83], [0.70, 0.85]],
                &[[0, 1], [1, 2], [2, 3], [3, 4]],
            ),
            ConstellationDef::new(
                "Draco",
                &[[0.40, 0.65], [0.38, 0.70], [0.35, 0.74], [0.32, 0.78], [0.28, 0.75]],
                &[[0, 1], [1, 2], [2, 3], [3, 4]],
            ),
            ConstellationDef::new(
                "Perseus",
                &[[0.55, 0.08], [0.58, 0.11], [0.60, 0.15], [0.57, 0.14], [0.54, 0.12]],
                &[[0, 1], [1, 2], [1, 3], [0, 4]],
            ),
            ConstellationDef::new(
                "Aries",
                &[[0.70, 0.55], [0.73, 0.58], [0.77, 0.56], [0.80, 0.58]],
                &[[0, 1], [1, 2], [2, 3]],
            ),
        ])
    }

    /// Four corner constellations that frame a central focal graphic
    pub fn horizon() -> Self {
        Self::builtin(vec![
            ConstellationDef::new(
                "Ursa Major",
                &[
                    [0.05, 0.08],
                    [0.08, 0.06],
                    [0.11, 0.07],
                    [0.14, 0.10],
                    [0.13, 0.14],
                    [0.17, 0.11],
                    [0.18, 0.15],
                ],
                &[[0, 1], [1, 2], [2, 3], [3, 4], [4, 6], [3, 5], [5, 6]],
            ),
            ConstellationDef::new(
                "Cassiopeia",
                &[[0.88, 0.06], [0.91, 0.10], [0.94, 0.07], [0.97, 0.11], [0.99, 0.08]],
                &[[0, 1], [1, 2], [2, 3], [3, 4]],
            ),
            ConstellationDef::new(
                "Leo",
                &[[0.03, 0.85], [0.06, 0.82], [0.09, 0.84], [0.12, 0.88], [0.08, 0.90]],
                &[[0, 1], [1, 2], [2, 3], [2, 4], [4, 0]],
            ),
            ConstellationDef::new(
                "Lyra",
                &[[0.92, 0.82], [0.94, 0.86], [0.96, 0.89], [0.95, 0.92], [0.93, 0.90]],
                &[[0, 1], [1, 2], [2, 3], [3, 4], [4, 1]],
            ),
        ])
    }
}

impl TryFrom<Vec<ConstellationDef>> for Catalog {
    type Error = StarfieldError;

    fn try_from(defs: Vec<ConstellationDef>) -> Result<Self> {
        Self::new(defs)
    }
}

impl From<Catalog> for Vec<ConstellationDef> {
    fn from(catalog: Catalog) -> Self {
        catalog.defs
    }
}
