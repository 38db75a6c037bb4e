use crate::error::{DbForgeError, DfResult};
use crate::geometry::{Area, Dot, IndexedDot, LayoutDocument, AREA_COLOR, INPUT_PREFIX, OUTPUT_PREFIX};
use crate::random::random_id;

/// Charge symbol in the simulator's electron-distribution string.
pub const CHARGED: char = '-';

/// An immutable snapshot of a DB layout.
///
/// The fixed region (inputs, output pairs, background dots and the area
/// delimiters) is parsed once; the mutable inner dots are replaced by
/// [`Layout::with_inner`], which yields a new snapshot with a fresh id.
///
/// Index order is part of the simulator contract: fixed dots first, then
/// inner dots, then whichever inputs are active for a given row.
#[derive(Debug, Clone)]
pub struct Layout {
    id: String,
    area: Area,
    markers: Vec<Dot>,
    inputs: Vec<Dot>,
    /// Each pair indexes into `fixed`.
    outputs: Vec<(usize, usize)>,
    fixed: Vec<Dot>,
    inner: Vec<Dot>,
}

impl Layout {
    pub fn parse(dots: Vec<Dot>) -> DfResult<Self> {
        let mut area = Vec::new();
        let mut inputs = Vec::new();
        let mut flat_outputs = Vec::new();
        let mut fixed = Vec::new();

        for dot in dots {
            let c = dot.normalized_color();
            if c == AREA_COLOR {
                area.push(dot);
            } else if c.starts_with(INPUT_PREFIX) {
                inputs.push(dot);
            } else if c.starts_with(OUTPUT_PREFIX) {
                flat_outputs.push(dot);
            } else {
                fixed.push(dot);
            }
        }

        if area.len() != 4 {
            return Err(DbForgeError::Validation(format!(
                "The inner area must be delimited by 4 DBs (colored with {}), found {}.",
                AREA_COLOR,
                area.len()
            )));
        }
        if inputs.is_empty() {
            return Err(DbForgeError::Validation(
                "Layout must have at least 1 input DB (colored with #ffffffxx, where xx is the input number).".into(),
            ));
        }
        if flat_outputs.len() < 2 {
            return Err(DbForgeError::Validation(
                "Layout must have at least 1 pair of output DBs (colored with #ffff00xx, where xx is the output number).".into(),
            ));
        }
        if flat_outputs.len() % 2 != 0 {
            return Err(DbForgeError::Validation(format!(
                "Outputs must be pairs of DBs, found {} output DBs.",
                flat_outputs.len()
            )));
        }

        inputs.sort_by_key(|d| d.normalized_color());
        flat_outputs.sort_by_key(|d| d.normalized_color());

        let offset = fixed.len();
        let mut outputs = Vec::with_capacity(flat_outputs.len() / 2);
        for (pair_idx, pair) in flat_outputs.chunks(2).enumerate() {
            let (a, b) = (&pair[0], &pair[1]);
            let ia = offset + pair_idx * 2;
            let ib = ia + 1;
            // Canonical orientation: `a` is the upper/left dot of the pair.
            if a.n > b.n || a.m > b.m || (a.m == b.m && a.l > b.l) {
                outputs.push((ib, ia));
            } else {
                outputs.push((ia, ib));
            }
        }
        fixed.extend(flat_outputs);

        Ok(Self {
            id: random_id(),
            area: Area::from_corners(&area),
            markers: area,
            inputs,
            outputs,
            fixed,
            inner: Vec::new(),
        })
    }

    /// New snapshot with `dots` as the mutable contents.
    ///
    /// Fails with `OutOfBounds` on the first dot outside the area; `self`
    /// is never touched.
    pub fn with_inner(&self, dots: Vec<Dot>) -> DfResult<Self> {
        if let Some(bad) = dots.iter().find(|d| !self.area.contains(d)) {
            return Err(DbForgeError::OutOfBounds {
                n: bad.n,
                m: bad.m,
                l: bad.l,
            });
        }
        Ok(Self {
            id: random_id(),
            area: self.area,
            markers: self.markers.clone(),
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            fixed: self.fixed.clone(),
            inner: dots,
        })
    }

    /// Ordered, indexed dots to simulate for one input vector.
    pub fn layout_for_input(&self, input: &[bool]) -> DfResult<Vec<IndexedDot>> {
        if input.len() != self.inputs.len() {
            return Err(DbForgeError::InputSize {
                got: input.len(),
                expected: self.inputs.len(),
            });
        }

        let active = self
            .inputs
            .iter()
            .zip(input)
            .filter(|(_, on)| **on)
            .map(|(d, _)| d);

        Ok(self
            .fixed
            .iter()
            .chain(self.inner.iter())
            .chain(active)
            .enumerate()
            .map(|(index, dot)| IndexedDot {
                index,
                dot: dot.clone(),
            })
            .collect())
    }

    /// Re-loadable document: area markers followed by the dots of `input`.
    pub fn to_document(&self, name: Option<String>, input: &[bool]) -> DfResult<LayoutDocument> {
        let mut dots = self.markers.clone();
        dots.extend(self.layout_for_input(input)?.into_iter().map(|d| d.dot));
        Ok(LayoutDocument { name, dots })
    }

    /// Reads each output pair out of an electron-distribution string.
    ///
    /// Equal characters on both dots are indeterminate (`None`). Otherwise
    /// the value is whether the second dot of the pair holds the charge.
    pub fn decode_outputs(&self, result: &str) -> Vec<Option<bool>> {
        let chars: Vec<char> = result.chars().collect();
        self.outputs
            .iter()
            .map(|&(a, b)| match (chars.get(a), chars.get(b)) {
                (Some(ca), Some(cb)) if ca != cb => Some(*cb == CHARGED),
                _ => None,
            })
            .collect()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn area(&self) -> Area {
        self.area
    }

    pub fn inputs(&self) -> &[Dot] {
        &self.inputs
    }

    pub fn fixed(&self) -> &[Dot] {
        &self.fixed
    }

    pub fn inner(&self) -> &[Dot] {
        &self.inner
    }

    pub fn output_pairs(&self) -> &[(usize, usize)] {
        &self.outputs
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }
}
