//! Extraction of labeled outputs from a completed run document.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use roxmltree::{Document, Node};
use tracing::warn;

/// Two-column table of `[x, y]` samples from a `curve` output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Curve {
    rows: Vec<[f64; 2]>,
}

impl Curve {
    pub fn rows(&self) -> &[[f64; 2]] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The same samples as two column sequences, x then y.
    pub fn columns(&self) -> (Vec<f64>, Vec<f64>) {
        let x = self.rows.iter().map(|r| r[0]).collect();
        let y = self.rows.iter().map(|r| r[1]).collect();
        (x, y)
    }
}

impl From<Vec<[f64; 2]>> for Curve {
    fn from(rows: Vec<[f64; 2]>) -> Self {
        Self { rows }
    }
}

/// A decoded output value. `number` outputs whose text does not parse as a
/// float are kept as [`ResultValue::Text`] rather than rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultValue {
    Number(f64),
    Text(String),
    Curve(Curve),
}

impl ResultValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ResultValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResultValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_curve(&self) -> Option<&Curve> {
        match self {
            ResultValue::Curve(c) => Some(c),
            _ => None,
        }
    }
}

/// Extract labeled outputs from `run_xml` into a label → value map.
///
/// An empty `outputs` slice selects every recognized output; otherwise only
/// the listed labels are extracted (grouped curves match on their group
/// name). `None` means the run has not finished or its results were never
/// fetched; that yields an empty map, not an error. Duplicate labels
/// overwrite in document order.
pub fn extract_results(
    run_xml: Option<&str>,
    outputs: &[&str],
) -> Result<HashMap<String, ResultValue>> {
    let Some(run_xml) = run_xml else {
        warn!("run not finished or results not fetched; nothing to extract");
        return Ok(HashMap::new());
    };

    let doc = Document::parse(run_xml).context("failed to parse run document")?;
    let output = doc
        .root_element()
        .children()
        .find(|n| n.has_tag_name("output"))
        .context("run document has no <output> section")?;

    let return_all = outputs.is_empty();
    let selected = |label: &str| return_all || outputs.contains(&label);

    let mut results = HashMap::new();
    for node in output.descendants().filter(Node::is_element) {
        match node.tag_name().name() {
            "number" => {
                let label = descendant_text(node, "label")
                    .context("number output without a <label>")?;
                if !selected(label) {
                    continue;
                }
                let value = descendant_text(node, "current")
                    .with_context(|| format!("number output `{label}` has no <current>"))?;
                // Keep the raw string when it is not a float
                let decoded = match value.trim().parse::<f64>() {
                    Ok(number) => ResultValue::Number(number),
                    Err(_) => ResultValue::Text(value.to_string()),
                };
                results.insert(label.to_string(), decoded);
            }
            "log" | "text" => {
                let label =
                    descendant_text(node, "label").context("text output without a <label>")?;
                if !selected(label) {
                    continue;
                }
                // First non-whitespace text that is not the label itself
                let body = node
                    .descendants()
                    .filter(Node::is_text)
                    .filter_map(|n| n.text())
                    .find(|t| !t.trim().is_empty() && *t != label);
                if let Some(body) = body {
                    results.insert(label.to_string(), ResultValue::Text(body.to_string()));
                }
            }
            "curve" => {
                let about = node.children().find(|n| n.has_tag_name("about"));
                let group = about
                    .and_then(|a| a.children().find(|n| n.has_tag_name("group")))
                    .and_then(|n| n.text());
                let label = about
                    .and_then(|a| a.children().find(|n| n.has_tag_name("label")))
                    .and_then(|n| n.text());

                // Grouped curves match the selector on either name and are
                // keyed "group: label"
                let name = match (group, label) {
                    (Some(group), Some(label)) if selected(group) || selected(label) => {
                        format!("{group}: {label}")
                    }
                    (Some(group), None) if selected(group) => {
                        bail!("curve in group `{group}` has no label")
                    }
                    (None, Some(label)) if selected(label) => label.to_string(),
                    _ => continue,
                };

                let xy = descendant_text(node, "xy")
                    .with_context(|| format!("curve `{name}` has no <xy> data"))?;
                let curve = parse_xy(xy)
                    .with_context(|| format!("curve `{name}` has malformed <xy> data"))?;
                results.insert(name, ResultValue::Curve(curve));
            }
            _ => {}
        }
    }

    Ok(results)
}

/// Text of the first descendant element with the given tag name.
fn descendant_text<'a>(node: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    node.descendants()
        .find(|n| n.is_element() && n.has_tag_name(tag))
        .and_then(|n| n.text())
}

/// Parse an `xy` block: one `x y` pair per line. Blank lines become
/// `[0.0, 0.0]` rows; extra tokens after the pair are ignored.
fn parse_xy(text: &str) -> Result<Curve> {
    let mut rows = Vec::new();
    for line in text.split('\n') {
        let mut words = line.split_whitespace();
        let Some(x) = words.next() else {
            rows.push([0.0, 0.0]);
            continue;
        };
        let Some(y) = words.next() else {
            bail!("line `{}` has fewer than two values", line.trim());
        };
        let x = x
            .parse::<f64>()
            .with_context(|| format!("bad x value `{x}`"))?;
        let y = y
            .parse::<f64>()
            .with_context(|| format!("bad y value `{y}`"))?;
        rows.push([x, y]);
    }
    Ok(Curve { rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_doc(output_body: &str) -> String {
        format!("<?xml version=\"1.0\"?><run><input/><output>{output_body}</output></run>")
    }

    #[test]
    fn number_output_parses_as_float() -> Result<()> {
        let doc = run_doc(
            "<number id=\"v\"><about><label>L</label></about><current>3.14</current></number>",
        );
        let results = extract_results(Some(&doc), &["L"])?;
        assert_eq!(results["L"], ResultValue::Number(3.14));

        // Empty selector returns everything
        let results = extract_results(Some(&doc), &[])?;
        assert_eq!(results["L"], ResultValue::Number(3.14));
        Ok(())
    }

    #[test]
    fn non_numeric_number_falls_back_to_text() -> Result<()> {
        let doc = run_doc(
            "<number id=\"v\"><about><label>L</label></about><current>N/A</current></number>",
        );
        let results = extract_results(Some(&doc), &[])?;
        assert_eq!(results["L"], ResultValue::Text("N/A".into()));
        Ok(())
    }

    #[test]
    fn log_output_takes_first_non_label_text() -> Result<()> {
        let doc = run_doc("<log><about><label>outlog</label></about>the tool said hi</log>");
        let results = extract_results(Some(&doc), &[])?;
        assert_eq!(results["outlog"], ResultValue::Text("the tool said hi".into()));
        Ok(())
    }

    #[test]
    fn ungrouped_curve_builds_table() -> Result<()> {
        let doc = run_doc(
            "<curve id=\"c\"><about><label>C</label></about><component><xy>0 0\n1 2\n2 4</xy></component></curve>",
        );
        let results = extract_results(Some(&doc), &[])?;
        let curve = results["C"].as_curve().unwrap();
        assert_eq!(curve.rows(), &[[0.0, 0.0], [1.0, 2.0], [2.0, 4.0]]);

        let (x, y) = curve.columns();
        assert_eq!(x, vec![0.0, 1.0, 2.0]);
        assert_eq!(y, vec![0.0, 2.0, 4.0]);
        Ok(())
    }

    #[test]
    fn grouped_curve_is_keyed_group_label() -> Result<()> {
        let doc = run_doc(
            "<curve id=\"c\"><about><group>G</group><label>C</label></about><component><xy>1 1</xy></component></curve>",
        );
        let results = extract_results(Some(&doc), &["G"])?;
        assert_eq!(results.len(), 1);
        assert!(results.contains_key("G: C"));

        // Selecting by the curve's own label uses the same key
        let results = extract_results(Some(&doc), &["C"])?;
        assert!(results.contains_key("G: C"));
        Ok(())
    }

    #[test]
    fn blank_xy_lines_become_zero_rows() -> Result<()> {
        let doc = run_doc(
            "<curve id=\"c\"><about><label>C</label></about><component><xy>1 2\n\n3 4\n</xy></component></curve>",
        );
        let results = extract_results(Some(&doc), &[])?;
        let curve = results["C"].as_curve().unwrap();
        assert_eq!(curve.rows(), &[[1.0, 2.0], [0.0, 0.0], [3.0, 4.0], [0.0, 0.0]]);
        Ok(())
    }

    #[test]
    fn short_xy_line_is_an_error() {
        let doc = run_doc(
            "<curve id=\"c\"><about><label>C</label></about><component><xy>1 2\n3</xy></component></curve>",
        );
        let err = extract_results(Some(&doc), &[]).unwrap_err();
        assert!(format!("{err:#}").contains("fewer than two values"));
    }

    #[test]
    fn selector_excludes_unlisted_labels() -> Result<()> {
        let doc = run_doc(concat!(
            "<number><about><label>A</label></about><current>1</current></number>",
            "<number><about><label>B</label></about><current>2</current></number>",
        ));
        let results = extract_results(Some(&doc), &["B"])?;
        assert!(!results.contains_key("A"));
        assert_eq!(results["B"], ResultValue::Number(2.0));
        Ok(())
    }

    #[test]
    fn all_kinds_extracted_with_empty_selector() -> Result<()> {
        let doc = run_doc(concat!(
            "<number><about><label>n</label></about><current>7</current></number>",
            "<log><about><label>l</label></about>done</log>",
            "<curve><about><label>c</label></about><component><xy>0 1</xy></component></curve>",
        ));
        let results = extract_results(Some(&doc), &[])?;
        assert_eq!(results.len(), 3);
        assert_eq!(results["n"].as_number(), Some(7.0));
        assert_eq!(results["l"].as_text(), Some("done"));
        assert_eq!(results["c"].as_curve().unwrap().len(), 1);
        Ok(())
    }

    #[test]
    fn missing_run_document_yields_empty_map() -> Result<()> {
        let results = extract_results(None, &["L"])?;
        assert!(results.is_empty());
        Ok(())
    }

    #[test]
    fn document_without_output_section_is_an_error() {
        let err = extract_results(Some("<run><input/></run>"), &[]).unwrap_err();
        assert!(err.to_string().contains("<output>"));
    }

    #[test]
    fn duplicate_labels_keep_the_last_node() -> Result<()> {
        let doc = run_doc(concat!(
            "<number><about><label>L</label></about><current>1</current></number>",
            "<number><about><label>L</label></about><current>2</current></number>",
        ));
        let results = extract_results(Some(&doc), &[])?;
        assert_eq!(results["L"], ResultValue::Number(2.0));
        Ok(())
    }
}
