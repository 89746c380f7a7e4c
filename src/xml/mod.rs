//! Tag-path lookups in XML documents.

use anyhow::{Context, Result};
use roxmltree::Document;

/// Return the trimmed text of the first node matching `path`, a
/// `/`-separated sequence of tag names below the document root.
pub fn first_tag_text(xml: &str, path: &str) -> Result<String> {
    let doc = Document::parse(xml).context("failed to parse XML document")?;

    let mut node = doc.root_element();
    for tag in path.split('/') {
        node = node
            .children()
            .find(|n| n.has_tag_name(tag))
            .with_context(|| format!("XML tag `{tag}` not found in `{path}`"))?;
    }

    Ok(node.text().unwrap_or_default().trim().to_string())
}
