//! Typed filter-graph IR.
//!
//! The composition is expressed as an ordered list of labeled filter
//! chains and rendered to ffmpeg's `-filter_complex` syntax only at the
//! process boundary, so the graph structure stays testable independent of
//! that syntax.

use std::fmt::Write;

/// Placement of an overlaid layer along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayPos {
    /// Centered within the underlying frame
    Centered,
    /// Fixed pixel offset
    Pixels(i64),
}

/// One filter operation inside a chain.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// Scale to a width/height; -1 preserves aspect ratio
    Scale { width: i64, height: i64 },
    /// Rebase video timestamps to start at zero
    SetPtsStart,
    /// Linear alpha fade-in from t=0
    FadeIn { duration: f64 },
    /// Force RGBA so the overlay honors the caption's alpha channel
    FormatRgba,
    /// Trim the layer to a duration
    Trim { duration: f64 },
    /// Overlay the second input onto the first
    Overlay { x: OverlayPos, y: OverlayPos },
    /// Rebase audio timestamps to start at zero
    AudioSetPtsStart,
}

impl FilterOp {
    fn render(&self, out: &mut String) {
        match self {
            FilterOp::Scale { width, height } => {
                let _ = write!(out, "scale={}:{}", width, height);
            }
            FilterOp::SetPtsStart => out.push_str("setpts=PTS-STARTPTS"),
            FilterOp::FadeIn { duration } => {
                let _ = write!(out, "fade=t=in:st=0:d={}", duration);
            }
            FilterOp::FormatRgba => out.push_str("format=rgba"),
            FilterOp::Trim { duration } => {
                let _ = write!(out, "trim=duration={}", duration);
            }
            FilterOp::Overlay { x, y } => {
                let _ = write!(out, "overlay={}:{}", render_pos(*x, 'W', 'w'), render_pos(*y, 'H', 'h'));
            }
            FilterOp::AudioSetPtsStart => out.push_str("asetpts=PTS-STARTPTS"),
        }
    }
}

fn render_pos(pos: OverlayPos, outer: char, inner: char) -> String {
    match pos {
        OverlayPos::Centered => format!("({}-{})/2", outer, inner),
        OverlayPos::Pixels(px) => px.to_string(),
    }
}

/// A labeled chain: named inputs, ordered ops, one named output.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterChain {
    pub inputs: Vec<String>,
    pub ops: Vec<FilterOp>,
    pub output: String,
}

impl FilterChain {
    pub fn new(
        inputs: impl IntoIterator<Item = impl Into<String>>,
        ops: Vec<FilterOp>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            ops,
            output: output.into(),
        }
    }

    fn render(&self) -> String {
        let mut s = String::new();
        for input in &self.inputs {
            let _ = write!(s, "[{}]", input);
        }
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                s.push(',');
            }
            op.render(&mut s);
        }
        let _ = write!(s, "[{}]", self.output);
        s
    }
}

/// An ordered set of chains forming one `-filter_complex` graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterGraph {
    chains: Vec<FilterChain>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chain: FilterChain) {
        self.chains.push(chain);
    }

    pub fn chains(&self) -> &[FilterChain] {
        &self.chains
    }

    /// Find the chain producing a given output label.
    pub fn chain_for(&self, output: &str) -> Option<&FilterChain> {
        self.chains.iter().find(|c| c.output == output)
    }

    /// Render the complete graph to ffmpeg syntax.
    pub fn render(&self) -> String {
        self.chains
            .iter()
            .map(FilterChain::render)
            .collect::<Vec<_>>()
            .join(";")
    }
}
