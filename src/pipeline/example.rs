//! Example, continuous-action label, and prediction types

use std::fmt::Write as _;

/// Sentinel stored in the action slot of a label element that carries no action.
pub const MISSING_ACTION: f32 = f32::MAX;

/// One cost/action/density triple of a continuous-action label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContinuousLabelElm {
    pub action: f32,
    pub cost: f32,
    pub pdf_value: f32,
}

impl ContinuousLabelElm {
    pub fn new(action: f32, cost: f32, pdf_value: f32) -> Self {
        Self {
            action,
            cost,
            pdf_value,
        }
    }

    /// True when the action slot holds a real action rather than the sentinel.
    pub fn has_action(&self) -> bool {
        self.action != MISSING_ACTION
    }
}

/// Continuous-action label. Only the first element is consulted by the reductions here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContinuousLabel {
    pub costs: Vec<ContinuousLabelElm>,
}

impl ContinuousLabel {
    pub fn single(action: f32, cost: f32, pdf_value: f32) -> Self {
        Self {
            costs: vec![ContinuousLabelElm::new(action, cost, pdf_value)],
        }
    }

    pub fn first(&self) -> Option<&ContinuousLabelElm> {
        self.costs.first()
    }

    /// Non-empty and the first element carries a real action.
    pub fn is_usable(&self) -> bool {
        self.first().is_some_and(ContinuousLabelElm::has_action)
    }
}

/// One segment of a piecewise-constant density over `[left, right)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfSegment {
    pub left: f32,
    pub right: f32,
    pub pdf_value: f32,
}

impl PdfSegment {
    pub fn mass(&self) -> f32 {
        (self.right - self.left) * self.pdf_value
    }
}

/// A chosen continuous action together with the density it was drawn at.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActionPdfValue {
    pub action: f32,
    pub pdf_value: f32,
}

impl ActionPdfValue {
    pub fn new(action: f32, pdf_value: f32) -> Self {
        Self { action, pdf_value }
    }

    /// Canonical text form `action,pdf_value`.
    ///
    /// With `newline` set this is the human + machine readable variant written to
    /// prediction sinks, one prediction per line.
    pub fn to_text(&self, newline: bool) -> String {
        let mut s = format!("{},{}", self.action, self.pdf_value);
        if newline {
            s.push('\n');
        }
        s
    }
}

/// Prediction slots filled in by the stages of the chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prediction {
    /// Full density produced by the pdf stage.
    pub pdf: Vec<PdfSegment>,
    /// Sampled action and its density, the final output of the chain.
    pub a_pdf: ActionPdfValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub name: String,
    pub value: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    pub name: String,
    pub features: Vec<Feature>,
}

/// A single data point flowing through the reduction stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub namespaces: Vec<Namespace>,
    pub label: ContinuousLabel,
    pub test_only: bool,
    pub weight: f32,
    pub pred: Prediction,
    pub tag: Option<String>,
}

impl Default for Example {
    fn default() -> Self {
        Self {
            namespaces: Vec::new(),
            label: ContinuousLabel::default(),
            test_only: false,
            weight: 1.0,
            pred: Prediction::default(),
            tag: None,
        }
    }
}

impl Example {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, action: f32, cost: f32, pdf_value: f32) -> Self {
        self.label = ContinuousLabel::single(action, cost, pdf_value);
        self
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_test_only(mut self, test_only: bool) -> Self {
        self.test_only = test_only;
        self
    }

    /// Add a feature to the namespace `ns`, creating the namespace on first use.
    pub fn with_feature(mut self, ns: &str, name: &str, value: f32) -> Self {
        self.push_feature(ns, name, value);
        self
    }

    pub fn push_feature(&mut self, ns: &str, name: &str, value: f32) {
        let feature = Feature {
            name: name.to_string(),
            value,
        };
        match self.namespaces.iter_mut().find(|n| n.name == ns) {
            Some(namespace) => namespace.features.push(feature),
            None => self.namespaces.push(Namespace {
                name: ns.to_string(),
                features: vec![feature],
            }),
        }
    }

    pub fn num_features(&self) -> usize {
        self.namespaces.iter().map(|ns| ns.features.len()).sum()
    }

    /// Iterate features as `(namespace, feature)` pairs.
    pub fn features(&self) -> impl Iterator<Item = (&str, &Feature)> {
        self.namespaces
            .iter()
            .flat_map(|ns| ns.features.iter().map(move |f| (ns.name.as_str(), f)))
    }
}

/// Render a label element as `action:cost:pdf_value`.
pub fn label_elm_to_string(elm: &ContinuousLabelElm) -> String {
    if elm.has_action() {
        format!("{}:{}:{}", elm.action, elm.cost, elm.pdf_value)
    } else {
        format!(":{}:{}", elm.cost, elm.pdf_value)
    }
}

/// Render the consulted (first) label element, or `unknown` when there is none.
pub fn label_to_string(ec: &Example) -> String {
    ec.label
        .first()
        .map(label_elm_to_string)
        .unwrap_or_else(|| "unknown".to_string())
}

/// Compact feature summary used by debug traces.
pub fn features_to_string(ec: &Example) -> String {
    let mut out = String::new();
    for ns in &ec.namespaces {
        let _ = write!(out, "|{}", ns.name);
        for f in &ns.features {
            let _ = write!(out, " {}:{}", f.name, f.value);
        }
        out.push(' ');
    }
    out.trim_end().to_string()
}
