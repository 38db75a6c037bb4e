use crate::error::{DbForgeError, DfResult};
use crate::layout::Layout;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruthRow {
    #[serde(deserialize_with = "deserialize_bits")]
    pub input: Vec<bool>,
    #[serde(deserialize_with = "deserialize_bits")]
    pub output: Vec<bool>,
}

/// Accepts `true`/`false` as well as `0`/`1`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Bit {
    Bool(bool),
    Int(u8),
}

fn deserialize_bits<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<bool>, D::Error> {
    let raw: Vec<Bit> = Vec::deserialize(d)?;
    Ok(raw
        .into_iter()
        .map(|b| match b {
            Bit::Bool(v) => v,
            Bit::Int(v) => v != 0,
        })
        .collect())
}

/// A boolean function given as explicit rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TruthTable {
    rows: Vec<TruthRow>,
}

impl TruthTable {
    pub fn new(rows: Vec<TruthRow>) -> DfResult<Self> {
        let first = rows
            .first()
            .ok_or_else(|| DbForgeError::Config("Truth table has no rows.".into()))?;
        let (ni, no) = (first.input.len(), first.output.len());
        if no == 0 {
            return Err(DbForgeError::Config(
                "Truth table rows must have at least one output.".into(),
            ));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.input.len() != ni || row.output.len() != no {
                return Err(DbForgeError::Config(format!(
                    "Truth table row {} has shape {}->{}, expected {}->{}.",
                    i,
                    row.input.len(),
                    row.output.len(),
                    ni,
                    no
                )));
            }
        }
        Ok(Self { rows })
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> DfResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            DbForgeError::Config(format!(
                "Could not open truth table at '{}': {}",
                path.display(),
                e
            ))
        })?;
        let is_csv = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if is_csv {
            Self::from_csv_reader(file)
        } else {
            let rows: Vec<TruthRow> = serde_json::from_reader(file)?;
            Self::new(rows)
        }
    }

    /// Columns named `in*` are inputs and `out*` are outputs, in header order.
    pub fn from_csv_reader<R: Read>(reader: R) -> DfResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let mut in_cols = Vec::new();
        let mut out_cols = Vec::new();
        for (i, h) in headers.iter().enumerate() {
            let h = h.to_lowercase();
            if h.starts_with("out") {
                out_cols.push(i);
            } else if h.starts_with("in") {
                in_cols.push(i);
            }
        }

        let mut rows = Vec::new();
        for (row_idx, record) in rdr.records().enumerate() {
            let rec = record?;
            let parse = |cols: &[usize]| -> DfResult<Vec<bool>> {
                cols.iter()
                    .map(|&c| parse_bit(rec.get(c).unwrap_or("")).ok_or_else(|| {
                        DbForgeError::Config(format!(
                            "Invalid bit '{}' in truth table row {}.",
                            rec.get(c).unwrap_or(""),
                            row_idx + 1
                        ))
                    }))
                    .collect()
            };
            rows.push(TruthRow {
                input: parse(&in_cols)?,
                output: parse(&out_cols)?,
            });
        }
        Self::new(rows)
    }

    pub fn rows(&self) -> &[TruthRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn input_len(&self) -> usize {
        self.rows.first().map(|r| r.input.len()).unwrap_or(0)
    }

    pub fn output_len(&self) -> usize {
        self.rows.first().map(|r| r.output.len()).unwrap_or(0)
    }

    /// Rejects tables whose shape does not fit the layout's inputs and outputs.
    pub fn check_against(&self, layout: &Layout) -> DfResult<()> {
        if self.input_len() != layout.input_count() {
            return Err(DbForgeError::InputSize {
                got: self.input_len(),
                expected: layout.input_count(),
            });
        }
        if self.output_len() != layout.output_count() {
            return Err(DbForgeError::Config(format!(
                "Truth table has {} outputs but the layout has {} output pairs.",
                self.output_len(),
                layout.output_count()
            )));
        }
        Ok(())
    }
}

fn parse_bit(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

pub fn bit_string(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}
