//! Rust backend: a module file with `const` tables and one `pub fn`.
//!
//! The module is meant to be declared with `mod <name>;`, so it carries its
//! own inner `allow` attributes for the long literals and indexed loops.

use super::{describe_kind, format_float, format_list, ArtifactBackend, EmitRequest};
use crate::repr::EstimatorRepr;

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait",
    "true", "type", "unsafe", "use", "where", "while", "abstract", "become", "box", "do",
    "final", "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Names the emitted module already uses for its constants.
const RESERVED: &[&str] = &["N_FEATURES", "N_CLASSES", "WEIGHTS", "BIAS", "MEAN", "SCALE"];

pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactBackend for RustBackend {
    fn target_name(&self) -> &str {
        "rust"
    }

    fn file_extension(&self) -> &str {
        "rs"
    }

    fn is_keyword(&self, name: &str) -> bool {
        if name == "_" || RUST_KEYWORDS.contains(&name) || RESERVED.contains(&name) {
            return true;
        }
        // W0, B1, ... are the per-class tables
        let mut chars = name.chars();
        matches!(chars.next(), Some('W') | Some('B'))
            && !chars.as_str().is_empty()
            && chars.all(|c| c.is_ascii_digit())
    }

    fn emit(&self, request: &EmitRequest<'_>) -> String {
        let estimator = request.estimator;
        let (title, contract) = describe_kind(estimator.kind());

        let mut out = Vec::new();
        out.push(format!("// Auto-generated {} inference.", title));
        out.push(format!("// {}", contract));
        out.push("#![allow(clippy::excessive_precision, clippy::needless_range_loop)]".to_string());
        out.push(String::new());
        out.push(format!(
            "pub const N_FEATURES: usize = {};",
            estimator.n_features()
        ));
        if let EstimatorRepr::MulticlassClassifier { biases, .. } = estimator {
            out.push(format!("pub const N_CLASSES: usize = {};", biases.len()));
        }
        out.push(String::new());

        if let Some(s) = request.scaling {
            out.push(const_array("MEAN", "N_FEATURES", &s.mean));
            out.push(const_array("SCALE", "N_FEATURES", &s.scale));
        }
        match estimator {
            EstimatorRepr::Regression { weights, bias }
            | EstimatorRepr::BinaryClassifier { weights, bias } => {
                out.push(const_array("WEIGHTS", "N_FEATURES", weights));
                out.push(const_scalar("BIAS", *bias));
            }
            EstimatorRepr::MulticlassClassifier { weights, biases } => {
                for (c, (row, b)) in weights.iter().zip(biases).enumerate() {
                    out.push(const_array(&format!("W{}", c), "N_FEATURES", row));
                    out.push(const_scalar(&format!("B{}", c), *b));
                }
            }
        }
        out.push(String::new());

        let ret = match estimator {
            EstimatorRepr::MulticlassClassifier { .. } => "usize",
            _ => "f32",
        };
        out.push(format!(
            "pub fn {}(x: &[f32; N_FEATURES]) -> {} {{",
            request.func_name, ret
        ));

        let input = if request.scaling.is_some() {
            out.push("    let mut xs = [0.0f32; N_FEATURES];".to_string());
            out.push("    for i in 0..N_FEATURES {".to_string());
            out.push("        xs[i] = (x[i] - MEAN[i]) / SCALE[i];".to_string());
            out.push("    }".to_string());
            "xs"
        } else {
            "x"
        };

        match estimator {
            EstimatorRepr::Regression { .. } | EstimatorRepr::BinaryClassifier { .. } => {
                out.push("    let mut s = BIAS;".to_string());
                out.push("    for i in 0..N_FEATURES {".to_string());
                out.push(format!("        s += WEIGHTS[i] * {}[i];", input));
                out.push("    }".to_string());
                if matches!(estimator, EstimatorRepr::BinaryClassifier { .. }) {
                    out.push("    1.0 / (1.0 + (-s).exp())".to_string());
                } else {
                    out.push("    s".to_string());
                }
            }
            EstimatorRepr::MulticlassClassifier { biases, .. } => {
                out.push("    let mut scores = [0.0f32; N_CLASSES];".to_string());
                for c in 0..biases.len() {
                    out.push(format!("    scores[{}] = B{};", c, c));
                    out.push("    for i in 0..N_FEATURES {".to_string());
                    out.push(format!("        scores[{}] += W{}[i] * {}[i];", c, c, input));
                    out.push("    }".to_string());
                }
                out.push("    let mut best = 0;".to_string());
                out.push("    for c in 1..N_CLASSES {".to_string());
                out.push("        if scores[c] > scores[best] {".to_string());
                out.push("            best = c;".to_string());
                out.push("        }".to_string());
                out.push("    }".to_string());
                out.push("    best".to_string());
            }
        }
        out.push("}".to_string());

        let mut text = out.join("\n");
        text.push('\n');
        text
    }
}

fn const_array(name: &str, len: &str, values: &[f64]) -> String {
    format!("const {}: [f32; {}] = [{}];", name, len, format_list(values, ""))
}

fn const_scalar(name: &str, value: f64) -> String {
    format!("const {}: f32 = {};", name, format_float(value))
}
