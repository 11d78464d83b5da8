//! C backend: a self-contained header with `static inline` inference.
//!
//! Constants are prefixed with the upper-cased function name so several
//! generated headers can share one translation unit.

use super::{describe_kind, format_float, format_list, ArtifactBackend, EmitRequest};
use crate::repr::EstimatorRepr;

const C_KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while", "main",
];

// <math.h> names and the locals the emitted function declares
const RESERVED: &[&str] = &[
    "exp", "expf", "expl", "log", "logf", "pow", "powf", "sqrt", "sqrtf", "fabs", "fabsf",
    "floor", "ceil", "round", "fmax", "fmin", "isnan", "isinf", "NAN", "INFINITY", "HUGE_VAL",
    "x", "xs", "s", "scores", "best", "i", "c",
];

pub struct CBackend;

impl CBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactBackend for CBackend {
    fn target_name(&self) -> &str {
        "c"
    }

    fn file_extension(&self) -> &str {
        "h"
    }

    fn is_keyword(&self, name: &str) -> bool {
        // the upper-cased prefix of `_name` starts with `_` + uppercase,
        // which C reserves
        name.starts_with('_') || C_KEYWORDS.contains(&name) || RESERVED.contains(&name)
    }

    fn emit(&self, request: &EmitRequest<'_>) -> String {
        let prefix = request.func_name.to_ascii_uppercase();
        let n = format!("{}_N_FEATURES", prefix);
        let estimator = request.estimator;
        let (title, contract) = describe_kind(estimator.kind());

        let mut out = Vec::new();
        out.push(format!("// Auto-generated {} inference.", title));
        out.push(format!("// {}", contract));
        out.push("#pragma once".to_string());
        out.push(String::new());
        if matches!(estimator, EstimatorRepr::BinaryClassifier { .. }) {
            out.push("#include <math.h>".to_string());
            out.push(String::new());
        }
        out.push(format!("#define {} {}", n, estimator.n_features()));
        if let EstimatorRepr::MulticlassClassifier { biases, .. } = estimator {
            out.push(format!("#define {}_N_CLASSES {}", prefix, biases.len()));
        }
        out.push(String::new());

        if let Some(s) = request.scaling {
            out.push(const_array(&format!("{}_MEAN", prefix), &n, &s.mean));
            out.push(const_array(&format!("{}_SCALE", prefix), &n, &s.scale));
        }

        match estimator {
            EstimatorRepr::Regression { weights, bias }
            | EstimatorRepr::BinaryClassifier { weights, bias } => {
                out.push(const_array(&format!("{}_WEIGHTS", prefix), &n, weights));
                out.push(const_scalar(&format!("{}_BIAS", prefix), *bias));
            }
            EstimatorRepr::MulticlassClassifier { weights, biases } => {
                for (c, (row, b)) in weights.iter().zip(biases).enumerate() {
                    out.push(const_array(&format!("{}_W{}", prefix, c), &n, row));
                    out.push(const_scalar(&format!("{}_B{}", prefix, c), *b));
                }
            }
        }
        out.push(String::new());

        let ret = match estimator {
            EstimatorRepr::MulticlassClassifier { .. } => "int",
            _ => "float",
        };
        out.push(format!(
            "static inline {} {}(const float *x) {{",
            ret, request.func_name
        ));

        let input = if request.scaling.is_some() {
            out.push(format!("    float xs[{}];", n));
            out.push(format!("    for (int i = 0; i < {}; i++) {{", n));
            out.push(format!(
                "        xs[i] = (x[i] - {p}_MEAN[i]) / {p}_SCALE[i];",
                p = prefix
            ));
            out.push("    }".to_string());
            "xs"
        } else {
            "x"
        };

        match estimator {
            EstimatorRepr::Regression { .. } | EstimatorRepr::BinaryClassifier { .. } => {
                out.push(format!("    float s = {}_BIAS;", prefix));
                out.push(format!("    for (int i = 0; i < {}; i++) {{", n));
                out.push(format!("        s += {}_WEIGHTS[i] * {}[i];", prefix, input));
                out.push("    }".to_string());
                if matches!(estimator, EstimatorRepr::BinaryClassifier { .. }) {
                    out.push("    return 1.0f / (1.0f + expf(-s));".to_string());
                } else {
                    out.push("    return s;".to_string());
                }
            }
            EstimatorRepr::MulticlassClassifier { biases, .. } => {
                out.push(format!("    float scores[{}_N_CLASSES];", prefix));
                for c in 0..biases.len() {
                    out.push(format!("    scores[{}] = {}_B{};", c, prefix, c));
                    out.push(format!("    for (int i = 0; i < {}; i++) {{", n));
                    out.push(format!(
                        "        scores[{}] += {}_W{}[i] * {}[i];",
                        c, prefix, c, input
                    ));
                    out.push("    }".to_string());
                }
                out.push("    int best = 0;".to_string());
                out.push(format!(
                    "    for (int c = 1; c < {}_N_CLASSES; c++) {{",
                    prefix
                ));
                out.push("        if (scores[c] > scores[best]) {".to_string());
                out.push("            best = c;".to_string());
                out.push("        }".to_string());
                out.push("    }".to_string());
                out.push("    return best;".to_string());
            }
        }
        out.push("}".to_string());

        let mut text = out.join("\n");
        text.push('\n');
        text
    }
}

fn const_array(name: &str, len: &str, values: &[f64]) -> String {
    format!(
        "static const float {}[{}] = {{ {} }};",
        name,
        len,
        format_list(values, "f")
    )
}

fn const_scalar(name: &str, value: f64) -> String {
    format!("static const float {} = {}f;", name, format_float(value))
}
