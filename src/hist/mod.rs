//! Minimal 1-D histogram payload.
//!
//! This is the interface boundary to the numeric backend: the capability set
//! is exactly what the operation algebra consumes (clone, scaled add, scale,
//! multiply, divide, integral, per-bin access, axis queries). Binning is
//! arbitrary (variable-width); under/overflow content is kept explicitly.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tolerance for comparing bin edges of two histograms.
const EDGE_EPS: f64 = 1e-9;

/// A 1-D histogram with explicit under/overflow bins.
///
/// `bin_edges` has length `n + 1`, `bin_content` and `sumw2` have length `n`.
/// The statistical error of bin `i` is `sqrt(sumw2[i])`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hist1d {
    /// Bin edges, ascending, length = number of bins + 1.
    pub bin_edges: Vec<f64>,
    /// Bin contents, excluding under/overflow.
    pub bin_content: Vec<f64>,
    /// Sum of squared weights per bin.
    pub sumw2: Vec<f64>,
    /// Underflow content.
    pub underflow: f64,
    /// Overflow content.
    pub overflow: f64,
    /// Underflow sum of squared weights.
    pub underflow_sumw2: f64,
    /// Overflow sum of squared weights.
    pub overflow_sumw2: f64,
    /// Total number of fill operations.
    pub entries: f64,
}

impl Hist1d {
    /// Create an empty histogram with `n` uniform bins over `[lo, hi)`.
    pub fn with_uniform_bins(n: usize, lo: f64, hi: f64) -> Self {
        let width = (hi - lo) / n as f64;
        let edges = (0..=n).map(|i| lo + i as f64 * width).collect();
        Self::from_edges(edges)
    }

    /// Create an empty histogram from explicit ascending bin edges.
    pub fn from_edges(bin_edges: Vec<f64>) -> Self {
        let n = bin_edges.len().saturating_sub(1);
        Self {
            bin_edges,
            bin_content: vec![0.0; n],
            sumw2: vec![0.0; n],
            underflow: 0.0,
            overflow: 0.0,
            underflow_sumw2: 0.0,
            overflow_sumw2: 0.0,
            entries: 0.0,
        }
    }

    /// Number of bins, excluding under/overflow.
    pub fn n_bins(&self) -> usize {
        self.bin_content.len()
    }

    /// Lower edge of the first bin.
    pub fn x_min(&self) -> f64 {
        *self.bin_edges.first().unwrap_or(&0.0)
    }

    /// Upper edge of the last bin.
    pub fn x_max(&self) -> f64 {
        *self.bin_edges.last().unwrap_or(&0.0)
    }

    /// Width of bin `i`.
    pub fn bin_width(&self, i: usize) -> f64 {
        self.bin_edges[i + 1] - self.bin_edges[i]
    }

    /// Center of bin `i`.
    pub fn bin_center(&self, i: usize) -> f64 {
        0.5 * (self.bin_edges[i] + self.bin_edges[i + 1])
    }

    /// Index of the bin containing `x`, `None` if `x` falls into a flow bin.
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        if x < self.x_min() || x >= self.x_max() {
            return None;
        }
        match self
            .bin_edges
            .binary_search_by(|e| e.partial_cmp(&x).expect("non-finite bin edge"))
        {
            Ok(i) => Some(i.min(self.n_bins() - 1)),
            Err(i) => Some(i - 1),
        }
    }

    /// Content of bin `i`.
    pub fn value(&self, i: usize) -> f64 {
        self.bin_content[i]
    }

    /// Statistical error of bin `i`.
    pub fn error(&self, i: usize) -> f64 {
        self.sumw2[i].sqrt()
    }

    /// Set the content of bin `i`.
    pub fn set_value(&mut self, i: usize, v: f64) {
        self.bin_content[i] = v;
    }

    /// Set the statistical error of bin `i`.
    pub fn set_error(&mut self, i: usize, e: f64) {
        self.sumw2[i] = e * e;
    }

    /// Fill with weight `w` at `x`.
    pub fn fill(&mut self, x: f64, w: f64) {
        self.entries += 1.0;
        match self.find_bin(x) {
            Some(i) => {
                self.bin_content[i] += w;
                self.sumw2[i] += w * w;
            }
            None if x < self.x_min() => {
                self.underflow += w;
                self.underflow_sumw2 += w * w;
            }
            None => {
                self.overflow += w;
                self.overflow_sumw2 += w * w;
            }
        }
    }

    /// True if `other` has bit-compatible binning (within tolerance).
    pub fn same_binning(&self, other: &Hist1d) -> bool {
        self.bin_edges.len() == other.bin_edges.len()
            && self
                .bin_edges
                .iter()
                .zip(&other.bin_edges)
                .all(|(a, b)| (a - b).abs() < EDGE_EPS)
    }

    fn check_binning(&self, other: &Hist1d, op: &str) -> Result<()> {
        if !self.same_binning(other) {
            return Err(Error::WrongInput(format!(
                "{op}: incompatible binning ({} vs {} bins over [{}, {}] vs [{}, {}])",
                self.n_bins(),
                other.n_bins(),
                self.x_min(),
                self.x_max(),
                other.x_min(),
                other.x_max(),
            )));
        }
        Ok(())
    }

    /// Add `scale * other` bin-wise, including flow bins.
    pub fn add(&mut self, other: &Hist1d, scale: f64) -> Result<()> {
        self.check_binning(other, "add")?;
        let s2 = scale * scale;
        for i in 0..self.n_bins() {
            self.bin_content[i] += scale * other.bin_content[i];
            self.sumw2[i] += s2 * other.sumw2[i];
        }
        self.underflow += scale * other.underflow;
        self.underflow_sumw2 += s2 * other.underflow_sumw2;
        self.overflow += scale * other.overflow;
        self.overflow_sumw2 += s2 * other.overflow_sumw2;
        self.entries += other.entries;
        Ok(())
    }

    /// Scale all contents (and flow bins) by `factor`.
    pub fn scale(&mut self, factor: f64) {
        let f2 = factor * factor;
        for v in &mut self.bin_content {
            *v *= factor;
        }
        for w in &mut self.sumw2 {
            *w *= f2;
        }
        self.underflow *= factor;
        self.underflow_sumw2 *= f2;
        self.overflow *= factor;
        self.overflow_sumw2 *= f2;
    }

    /// Multiply bin-wise by `other`, propagating uncorrelated errors.
    pub fn multiply(&mut self, other: &Hist1d) -> Result<()> {
        self.check_binning(other, "multiply")?;
        for i in 0..self.n_bins() {
            let (a, b) = (self.bin_content[i], other.bin_content[i]);
            self.sumw2[i] = b * b * self.sumw2[i] + a * a * other.sumw2[i];
            self.bin_content[i] = a * b;
        }
        self.underflow *= other.underflow;
        self.overflow *= other.overflow;
        Ok(())
    }

    /// Divide bin-wise by `other`, propagating uncorrelated errors.
    ///
    /// Bins where the divisor is zero yield zero content and zero error.
    pub fn divide(&mut self, other: &Hist1d) -> Result<()> {
        self.check_binning(other, "divide")?;
        for i in 0..self.n_bins() {
            let (a, b) = (self.bin_content[i], other.bin_content[i]);
            if b == 0.0 {
                self.bin_content[i] = 0.0;
                self.sumw2[i] = 0.0;
            } else {
                self.bin_content[i] = a / b;
                self.sumw2[i] = self.sumw2[i] / (b * b) + a * a * other.sumw2[i] / (b * b * b * b);
            }
        }
        self.underflow = 0.0;
        self.overflow = 0.0;
        Ok(())
    }

    /// Integral over `range` (full axis when `None`), optionally weighting
    /// each bin by its width.
    ///
    /// A bin contributes when its center lies inside the closed range.
    pub fn integral(&self, range: Option<(f64, f64)>, weighted: bool) -> f64 {
        (0..self.n_bins())
            .filter(|&i| match range {
                Some((lo, hi)) => {
                    let c = self.bin_center(i);
                    lo <= c && c <= hi
                }
                None => true,
            })
            .map(|i| {
                if weighted {
                    self.bin_content[i] * self.bin_width(i)
                } else {
                    self.bin_content[i]
                }
            })
            .sum()
    }

    /// Rebin onto `edges`, which must coincide with a subset of the existing
    /// edges. Content falling outside the new range moves into the flow bins.
    ///
    /// With `norm_by_width`, each destination bin is divided by its width
    /// relative to the mean destination width.
    pub fn rebinned(&self, edges: &[f64], norm_by_width: bool) -> Result<Hist1d> {
        if edges.len() < 2 {
            return Err(Error::WrongInput(format!(
                "rebin: need at least two edges, got {}",
                edges.len()
            )));
        }
        for e in edges {
            if !self.bin_edges.iter().any(|x| (x - e).abs() < EDGE_EPS) {
                return Err(Error::WrongInput(format!(
                    "rebin: edge {e} does not coincide with any source bin edge"
                )));
            }
        }
        let mut out = Hist1d::from_edges(edges.to_vec());
        out.entries = self.entries;
        out.underflow = self.underflow;
        out.underflow_sumw2 = self.underflow_sumw2;
        out.overflow = self.overflow;
        out.overflow_sumw2 = self.overflow_sumw2;
        for i in 0..self.n_bins() {
            let c = self.bin_center(i);
            match out.find_bin(c) {
                Some(j) => {
                    out.bin_content[j] += self.bin_content[i];
                    out.sumw2[j] += self.sumw2[i];
                }
                None if c < out.x_min() => {
                    out.underflow += self.bin_content[i];
                    out.underflow_sumw2 += self.sumw2[i];
                }
                None => {
                    out.overflow += self.bin_content[i];
                    out.overflow_sumw2 += self.sumw2[i];
                }
            }
        }
        if norm_by_width {
            let mean_width = (out.x_max() - out.x_min()) / out.n_bins() as f64;
            for j in 0..out.n_bins() {
                let rel = out.bin_width(j) / mean_width;
                out.bin_content[j] /= rel;
                out.sumw2[j] /= rel * rel;
            }
        }
        Ok(out)
    }

    /// Index range `(first, last)` of non-empty bins, `None` if all empty.
    pub fn content_bounds(&self) -> Option<(usize, usize)> {
        let first = self.bin_content.iter().position(|&v| v != 0.0)?;
        let last = self.bin_content.iter().rposition(|&v| v != 0.0)?;
        Some((first, last))
    }
}
