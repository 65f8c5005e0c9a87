//! # SVG Label Template
//!
//! [`Template`] wraps a parsed SVG document: the non-label part (canvas,
//! defs, metadata) becomes the base every output page starts from, and each
//! top-level `<g>` subtree is one label to replicate. The template itself is
//! never mutated after load; every row operates on a deep copy.
//!
//! ```
//! use etiqueta::template::Template;
//!
//! let template = Template::parse(
//!     r#"<svg width="100" height="40"><g><text>%(name)</text></g></svg>"#,
//! )
//! .unwrap();
//! let row = [("name".to_string(), "Alice".to_string())].into_iter().collect();
//! let (labels, errors) = template.generate(&row);
//! assert_eq!(labels.len(), 1);
//! assert!(errors.is_empty());
//! ```

pub mod command;
pub mod filter;

pub use command::Command;
pub use filter::{Filter, ImageFilter, StyleFilter, TextFilter, interpolate};

use crate::data::Row;
use crate::error::EtiquetaError;
use crate::svg::{self, Element, Node};

/// An immutable label template plus the filter pass to run per row.
#[derive(Debug, Clone)]
pub struct Template {
    base: Element,
    labels: Vec<Element>,
    filters: Vec<Filter>,
}

impl Template {
    /// Parse a template with the standard filter pass (text, image, style).
    pub fn parse(svg_text: &str) -> Result<Self, EtiquetaError> {
        Self::with_filters(svg_text, Filter::standard_set())
    }

    /// Parse a template with an explicit filter list. Filter order matters:
    /// each filter runs through the whole tree before the next starts.
    pub fn with_filters(svg_text: &str, filters: Vec<Filter>) -> Result<Self, EtiquetaError> {
        let mut base = svg::parse(svg_text)?;
        if base.local_name() != "svg" {
            return Err(EtiquetaError::Template(format!(
                "root element must be <svg>, got <{}>",
                base.name
            )));
        }
        reject_legacy_config(&base)?;

        // Split the document: top-level groups are the label subtrees,
        // everything else stays in the base.
        let mut labels = Vec::new();
        let mut rest = Vec::with_capacity(base.children.len());
        for node in base.children.drain(..) {
            match node {
                Node::Element(elt) if elt.local_name() == "g" => labels.push(elt),
                other => rest.push(other),
            }
        }
        base.children = rest;

        Ok(Self {
            base,
            labels,
            filters,
        })
    }

    /// A fresh copy of the non-label portion of the document.
    pub fn clone_base(&self) -> Element {
        self.base.clone()
    }

    /// Number of label subtrees found in the template.
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Instantiate the template for one row: deep-copies the label subtrees
    /// and runs the filter pass over the copies.
    ///
    /// Per-row errors do not abort the pass: the failing placeholder stays
    /// unfiltered and the remaining placeholders still run. The caller
    /// decides what to do with the collected errors.
    pub fn generate(&self, row: &Row) -> (Vec<Element>, Vec<EtiquetaError>) {
        let mut instances = self.labels.clone();
        let mut errors = Vec::new();
        for filter in &self.filters {
            for label in &mut instances {
                apply_preorder(filter, label, row, &mut errors);
            }
        }
        (instances, errors)
    }
}

fn apply_preorder(filter: &Filter, elt: &mut Element, row: &Row, errors: &mut Vec<EtiquetaError>) {
    if let Err(error) = filter.apply(elt, row) {
        errors.push(error);
    }
    for child in elt.child_elements_mut() {
        apply_preorder(filter, child, row, errors);
    }
}

/// The in-template `#config` command predates the external sheet
/// configuration file. Rejecting it loudly beats reinterpreting it.
fn reject_legacy_config(elt: &Element) -> Result<(), EtiquetaError> {
    if elt.local_name() == "text" {
        if let Ok(text) = svg::text_contents(elt) {
            if Command::name_of(&text) == Some("config") {
                return Err(EtiquetaError::Template(
                    "in-template #config is no longer supported; move the sheet geometry to a configuration file".into(),
                ));
            }
        }
    }
    for child in elt.child_elements() {
        reject_legacy_config(child)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_splits_labels_from_base() {
        let template = Template::parse(
            r#"<svg width="10"><defs/><g id="label"><text>%(a)</text></g></svg>"#,
        )
        .unwrap();
        assert_eq!(template.label_count(), 1);
        let base = template.clone_base();
        assert_eq!(base.child_elements().count(), 1);
        assert_eq!(base.child_elements().next().unwrap().local_name(), "defs");
    }

    #[test]
    fn test_non_svg_root_rejected() {
        assert!(Template::parse("<html/>").is_err());
    }

    #[test]
    fn test_legacy_config_command_is_fatal() {
        let err = Template::parse(
            r#"<svg><g><text>#config nrows=3</text></g></svg>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("#config"));
    }

    #[test]
    fn test_generate_interpolates_copies() {
        let template =
            Template::parse(r#"<svg><g><text>%(name)</text></g></svg>"#).unwrap();
        let (first, errors) = template.generate(&row(&[("name", "Alice")]));
        assert!(errors.is_empty());
        assert_eq!(svg::text_contents(first[0].child_elements().next().unwrap()).unwrap(), "Alice");

        // The template itself is untouched; the next row starts clean.
        let (second, _) = template.generate(&row(&[("name", "Bob")]));
        assert_eq!(svg::text_contents(second[0].child_elements().next().unwrap()).unwrap(), "Bob");
    }

    #[test]
    fn test_error_does_not_stop_other_placeholders() {
        let template = Template::parse(
            r#"<svg><g><text>%(missing)</text><text>%(name)</text></g></svg>"#,
        )
        .unwrap();
        let (labels, errors) = template.generate(&row(&[("name", "Ada")]));
        assert_eq!(errors.len(), 1);
        let texts: Vec<String> = labels[0]
            .child_elements()
            .map(|e| svg::text_contents(e).unwrap())
            .collect();
        // The failing placeholder stays literal, the other is filled.
        assert_eq!(texts, vec!["%(missing)".to_string(), "Ada".to_string()]);
    }

    #[test]
    fn test_barcode_and_style_filters_run_after_text() {
        let template = Template::parse(
            r#"<svg><g><g><rect width="500" height="30"/><text>#code128 quiet=false %(sku)</text></g></g></svg>"#,
        )
        .unwrap();
        let (labels, errors) = template.generate(&row(&[("sku", "12345")]));
        assert!(errors.is_empty(), "{errors:?}");
        let inner = labels[0].child_elements().next().unwrap();
        let image = inner.child_elements().next().unwrap();
        assert_eq!(image.name, "image");
        assert!(image.attr("href").unwrap().starts_with("data:image/png;base64,"));
    }
}
