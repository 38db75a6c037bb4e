use crate::error::{DbForgeError, DfResult};
use crate::geometry::{Area, Dot};
use crate::layout::Layout;
use crate::scorer::{EvaluationReport, Evaluator};
use crate::truth::TruthTable;
use std::fmt;

/// State of one cell of the mutable area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Gene {
    Empty = 0,
    Up = 1,
    Down = 2,
}

impl Gene {
    pub const ALL: [Gene; 3] = [Gene::Empty, Gene::Up, Gene::Down];

    pub fn from_index(i: usize) -> Self {
        Self::ALL[i % 3]
    }

    pub fn from_digit(c: char) -> Option<Self> {
        match c {
            '0' => Some(Gene::Empty),
            '1' => Some(Gene::Up),
            '2' => Some(Gene::Down),
            _ => None,
        }
    }

    pub fn digit(self) -> char {
        match self {
            Gene::Empty => '0',
            Gene::Up => '1',
            Gene::Down => '2',
        }
    }

    /// One of the two other states; `k` picks which (0 or 1).
    pub fn cycled(self, k: usize) -> Self {
        Self::from_index(self as usize + 1 + k)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Fitness {
    Unevaluated,
    /// `id` is the identifier of the layout snapshot that was scored.
    Evaluated { score: f64, id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    width: usize,
    height: usize,
    genes: Vec<Gene>,
    fitness: Fitness,
}

impl Individual {
    pub fn new(width: usize, height: usize, genes: Vec<Gene>) -> DfResult<Self> {
        if genes.len() != width * height {
            return Err(DbForgeError::Validation(format!(
                "Genetic code has {} genes, expected {}x{}.",
                genes.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            genes,
            fitness: Fitness::Unevaluated,
        })
    }

    /// Operators build children of known shape; no length check needed.
    pub(crate) fn from_genes(width: usize, height: usize, genes: Vec<Gene>) -> Self {
        debug_assert_eq!(genes.len(), width * height);
        Self {
            width,
            height,
            genes,
            fitness: Fitness::Unevaluated,
        }
    }

    /// Parses a genetic code string such as `"0012"`.
    pub fn from_code(width: usize, height: usize, code: &str) -> DfResult<Self> {
        let genes = code
            .chars()
            .map(|c| {
                Gene::from_digit(c).ok_or_else(|| {
                    DbForgeError::Validation(format!("Invalid gene '{}' in genetic code.", c))
                })
            })
            .collect::<DfResult<Vec<_>>>()?;
        Self::new(width, height, genes)
    }

    /// Marks the individual as already scored (used when rebuilding from a checkpoint).
    pub fn with_fitness(mut self, score: f64, id: impl Into<String>) -> Self {
        self.fitness = Fitness::Evaluated {
            score,
            id: id.into(),
        };
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    pub fn fitness(&self) -> &Fitness {
        &self.fitness
    }

    pub fn is_evaluated(&self) -> bool {
        matches!(self.fitness, Fitness::Evaluated { .. })
    }

    /// Cached score; unevaluated individuals count as zero.
    pub fn score(&self) -> f64 {
        match &self.fitness {
            Fitness::Evaluated { score, .. } => *score,
            Fitness::Unevaluated => 0.0,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match &self.fitness {
            Fitness::Evaluated { id, .. } => Some(id),
            Fitness::Unevaluated => None,
        }
    }

    pub fn db_count(&self) -> usize {
        self.genes.iter().filter(|&&g| g != Gene::Empty).count()
    }

    pub fn genetic_code(&self) -> String {
        self.genes.iter().map(|g| g.digit()).collect()
    }

    /// Placed DBs, offset by the area origin. Row-major over the grid.
    pub fn phenotype(&self, area: &Area) -> Vec<Dot> {
        self.genes
            .iter()
            .enumerate()
            .filter(|(_, &g)| g != Gene::Empty)
            .map(|(i, &g)| {
                let col = area.n_min + (i % self.width) as i32;
                let row = area.m_min + (i / self.width) as i32;
                Dot::inner(col, row, g as i32 - 1)
            })
            .collect()
    }

    /// Scores this individual unless it already carries a fitness.
    ///
    /// Returns the evaluator's report when a simulation actually happened.
    pub fn evaluate_fitness(
        &mut self,
        layout: &Layout,
        table: &TruthTable,
        evaluator: &Evaluator,
    ) -> DfResult<Option<EvaluationReport>> {
        if self.is_evaluated() {
            return Ok(None);
        }
        let snapshot = layout.with_inner(self.phenotype(&layout.area()))?;
        let report = evaluator.evaluate(&snapshot, table)?;
        self.fitness = Fitness::Evaluated {
            score: report.score,
            id: snapshot.id().to_string(),
        };
        Ok(Some(report))
    }

    /// Grid preview, one text line per row (`.` empty, `^` up, `v` down).
    pub fn preview(&self) -> String {
        self.genes
            .chunks(self.width.max(1))
            .map(|row| {
                row.iter()
                    .map(|g| match g {
                        Gene::Empty => '.',
                        Gene::Up => '^',
                        Gene::Down => 'v',
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Individual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.preview())
    }
}
