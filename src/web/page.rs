//! HTML rendering of the predictor page.
//!
//! One page holds the single-record form, the batch upload, the latest
//! outcome and the report images.

use crate::report::ReportView;
use crate::schema::{FeatureSchema, FieldKind, FieldSpec};
use std::collections::HashMap;
use std::fmt::Write;

/// Result banner shown above the forms
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Prediction(String),
    Error(String),
}

/// Everything needed to render the page
pub struct PageContext<'a> {
    pub schema: &'a FeatureSchema,
    /// Values to pre-fill, keyed by field name
    pub values: &'a HashMap<String, String>,
    pub outcome: Option<Outcome>,
    pub report: ReportView,
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn render_field(out: &mut String, spec: &FieldSpec, value: &str) {
    let name = spec.name;
    let label = escape(spec.label);
    match &spec.kind {
        FieldKind::Numeric { min, max, integer, .. } => {
            let step = if *integer { "1" } else { "any" };
            let max_attr = max.map(|m| format!(" max=\"{}\"", m)).unwrap_or_default();
            let _ = writeln!(
                out,
                "<label>{label}<input type=\"number\" name=\"{name}\" min=\"{min}\"{max_attr} step=\"{step}\" value=\"{}\" required></label>",
                escape(value)
            );
        }
        FieldKind::Categorical { options } => {
            let _ = writeln!(out, "<label>{label}<select name=\"{name}\">");
            for option in options.iter() {
                let selected = if *option == value { " selected" } else { "" };
                let option = escape(option);
                let _ = writeln!(out, "<option value=\"{option}\"{selected}>{option}</option>");
            }
            let _ = writeln!(out, "</select></label>");
        }
    }
}

fn render_report(out: &mut String, report: &ReportView) {
    out.push_str("<h2>EDA Visualizations</h2>\n");
    for image in &report.images {
        let _ = writeln!(
            out,
            "<figure><img src=\"/report/{}\" alt=\"{caption}\"><figcaption>{caption}</figcaption></figure>",
            image.file_name,
            caption = escape(image.caption)
        );
    }
    if let Some(warning) = report.warning {
        let _ = writeln!(out, "<p class=\"warning\">{}</p>", escape(warning));
    }
}

/// Render the full page
pub fn render(ctx: &PageContext<'_>) -> String {
    let mut out = String::with_capacity(16 * 1024);
    out.push_str(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Car Insurance Claim Predictor</title>\n\
         <style>body{font-family:sans-serif;max-width:56rem;margin:auto}label{display:block;margin:.3rem 0}\
         .error{color:#b00020}.warning{color:#8a6d00}.result{font-weight:bold}img{max-width:100%}</style>\n\
         </head><body>\n<h1>Car Insurance Claim Predictor</h1>\n",
    );

    match &ctx.outcome {
        Some(Outcome::Prediction(text)) => {
            let _ = writeln!(out, "<p class=\"result\">{}</p>", escape(text));
        }
        Some(Outcome::Error(text)) => {
            let _ = writeln!(out, "<p class=\"error\">{}</p>", escape(text));
        }
        None => {}
    }

    out.push_str("<form method=\"post\" action=\"/predict\">\n<h2>Numerical Features</h2>\n");
    for spec in ctx.schema.numeric_fields() {
        let value = ctx.values.get(spec.name).map(String::as_str).unwrap_or_default();
        render_field(&mut out, spec, value);
    }
    out.push_str("<h2>Categorical Features</h2>\n");
    for spec in ctx.schema.categorical_fields() {
        let value = ctx.values.get(spec.name).map(String::as_str).unwrap_or_default();
        render_field(&mut out, spec, value);
    }
    out.push_str("<button type=\"submit\">Predict</button>\n</form>\n");

    out.push_str(
        "<h2>Batch Prediction</h2>\n<form method=\"post\" action=\"/batch\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"file\" accept=\".csv\" required>\n\
         <button type=\"submit\">Predict and download</button>\n</form>\n",
    );

    render_report(&mut out, &ctx.report);
    out.push_str("</body></html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::default_form_values;
    use crate::report::{ReportImage, MISSING_IMAGES_WARNING};

    fn page(outcome: Option<Outcome>, report: ReportView) -> String {
        let schema = FeatureSchema::new();
        let values = default_form_values(&schema);
        render(&PageContext {
            schema: &schema,
            values: &values,
            outcome,
            report,
        })
    }

    #[test]
    fn test_renders_every_field() {
        let html = page(
            None,
            ReportView {
                images: vec![],
                warning: None,
            },
        );
        for name in FeatureSchema::new().feature_names() {
            assert!(html.contains(&format!("name=\"{}\"", name)), "missing {}", name);
        }
        assert!(html.contains("<option value=\"C1\" selected>C1</option>"));
    }

    #[test]
    fn test_escapes_error_text() {
        let html = page(
            Some(Outcome::Error("Error in prediction: <bad>".to_string())),
            ReportView {
                images: vec![],
                warning: None,
            },
        );
        assert!(html.contains("Error in prediction: &lt;bad&gt;"));
    }

    #[test]
    fn test_missing_images_still_render_page() {
        let html = page(
            Some(Outcome::Prediction("Claim Prediction: No (Probability: 0.04)".to_string())),
            ReportView {
                images: vec![ReportImage {
                    file_name: "claim_distribution.png",
                    caption: "Claim Distribution",
                }],
                warning: Some(MISSING_IMAGES_WARNING),
            },
        );
        assert!(html.contains("Claim Prediction: No (Probability: 0.04)"));
        assert!(html.contains("/report/claim_distribution.png"));
        assert!(html.contains("EDA images not found"));
        assert!(html.ends_with("</body></html>\n"));
    }
}
