use crate::error::{DbForgeError, DfResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Color delimiting the mutable area (exactly four dots).
pub const AREA_COLOR: &str = "#ff00ffff";
/// Inputs are `#ffffffxx`, where `xx` orders them.
pub const INPUT_PREFIX: &str = "#ffffff";
/// Outputs are `#ffff00xx`; consecutive dots form one pair.
pub const OUTPUT_PREFIX: &str = "#ffff00";
/// Dots produced by an individual. Close to, but distinct from, the area color.
pub const INNER_COLOR: &str = "#ff01ffff";

/// Lattice spacing along a dimer row, in angstrom.
const LATTICE_A: f64 = 3.84;
/// Spacing between dimer rows, in angstrom.
const LATTICE_B: f64 = 7.68;
/// Offset of the second atom of a dimer, in angstrom.
const LATTICE_C: f64 = 2.25;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dot {
    pub n: i32, // column
    pub m: i32, // dimer row
    pub l: i32, // sub-layer (0 = up, 1 = down)
    pub color: String,
}

impl Dot {
    pub fn new(n: i32, m: i32, l: i32, color: impl Into<String>) -> Self {
        Self {
            n,
            m,
            l,
            color: color.into(),
        }
    }

    pub fn inner(n: i32, m: i32, l: i32) -> Self {
        Self::new(n, m, l, INNER_COLOR)
    }

    /// Physical position in angstrom.
    pub fn physical_location(&self) -> (f64, f64) {
        let x = self.n as f64 * LATTICE_A;
        let y = self.m as f64 * LATTICE_B + self.l as f64 * LATTICE_C;
        (x, y)
    }

    pub fn normalized_color(&self) -> String {
        self.color.to_lowercase()
    }
}

/// A dot with its final linear index in a simulation problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedDot {
    pub index: usize,
    #[serde(flatten)]
    pub dot: Dot,
}

/// Inclusive bounds of the mutable area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub n_min: i32,
    pub n_max: i32,
    pub m_min: i32,
    pub m_max: i32,
}

impl Area {
    pub fn from_corners(corners: &[Dot]) -> Self {
        let mut area = Area {
            n_min: i32::MAX,
            n_max: i32::MIN,
            m_min: i32::MAX,
            m_max: i32::MIN,
        };
        for c in corners {
            area.n_min = area.n_min.min(c.n);
            area.n_max = area.n_max.max(c.n);
            area.m_min = area.m_min.min(c.m);
            area.m_max = area.m_max.max(c.m);
        }
        area
    }

    pub fn width(&self) -> usize {
        (self.n_max - self.n_min + 1).max(0) as usize
    }

    pub fn height(&self) -> usize {
        (self.m_max - self.m_min + 1).max(0) as usize
    }

    pub fn contains(&self, dot: &Dot) -> bool {
        dot.n >= self.n_min && dot.n <= self.n_max && dot.m >= self.m_min && dot.m <= self.m_max
    }
}

/// Body of a layout file: a named list of raw dots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutDocument {
    #[serde(default)]
    pub name: Option<String>,
    pub dots: Vec<Dot>,
}

impl LayoutDocument {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> DfResult<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Verbatim snapshot of a layout file, as embedded in checkpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutFile {
    pub path: String,
    pub content: String,
}

impl LayoutFile {
    pub fn open<P: AsRef<Path>>(path: P) -> DfResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            DbForgeError::Config(format!(
                "Failed to read layout file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self {
            path: path.to_string_lossy().to_string(),
            content,
        })
    }

    pub fn document(&self) -> DfResult<LayoutDocument> {
        Ok(serde_json::from_str(&self.content)?)
    }

    /// File stem, used to name simulation files and exports.
    pub fn name(&self) -> String {
        Path::new(&self.path)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "layout".to_string())
    }
}
