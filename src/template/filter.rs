//! # Template Filters
//!
//! The closed set of content-generating filters applied to each label
//! instance, dispatched by placeholder command name:
//!
//! | Filter | Trigger | Effect |
//! |--------|---------|--------|
//! | [`TextFilter`] | `%(field)` in a text node | interpolates the row's field values |
//! | [`ImageFilter`] | `#code128` group | replaces rect + command with an embedded barcode image |
//! | [`StyleFilter`] | `#style` group | merges command options into the target's style attribute |
//!
//! Filters run in that fixed order, each in a full preorder pass, so image
//! and style commands always see already-interpolated free text. A filter
//! either succeeds and mutates its element, or fails and leaves the element
//! untouched (the command text stays visible in the output).

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use indexmap::IndexMap;

use crate::code128;
use crate::data::Row;
use crate::error::EtiquetaError;
use crate::geom::parse_length;
use crate::svg::{Element, Node, text_contents};
use crate::template::command::Command;

/// Elements whose direct text children are subject to interpolation.
const TEXT_TAGS: &[&str] = &["text", "tspan", "flowRoot", "flowPara", "flowSpan"];

/// Default barcode module width in user units.
const DEFAULT_THICKNESS: f64 = 3.0;

/// One filter variant. Dispatch is a tagged enum over a closed set, not an
/// open registry.
#[derive(Debug, Clone, Copy)]
pub enum Filter {
    Text(TextFilter),
    Image(ImageFilter),
    Style(StyleFilter),
}

impl Filter {
    /// The standard filter pass, in application order.
    pub fn standard_set() -> Vec<Filter> {
        vec![
            Filter::Text(TextFilter),
            Filter::Image(ImageFilter),
            Filter::Style(StyleFilter),
        ]
    }

    /// Apply this filter to one element (not its descendants).
    pub fn apply(&self, elt: &mut Element, row: &Row) -> Result<(), EtiquetaError> {
        match self {
            Filter::Text(f) => f.apply(elt, row),
            Filter::Image(f) => f.apply(elt, row),
            Filter::Style(f) => f.apply(elt),
        }
    }
}

// ============================================================================
// TEXT INTERPOLATION
// ============================================================================

/// Rewrites `%(field)` references in text content from the current row.
#[derive(Debug, Clone, Copy)]
pub struct TextFilter;

impl TextFilter {
    fn apply(&self, elt: &mut Element, row: &Row) -> Result<(), EtiquetaError> {
        if !TEXT_TAGS.contains(&elt.local_name()) {
            return Ok(());
        }
        // Resolve every text child before committing any, so a failed
        // lookup leaves the whole element unfiltered.
        let mut replacements = Vec::new();
        for (i, child) in elt.children.iter().enumerate() {
            if let Node::Text(text) = child {
                replacements.push((i, interpolate(text, row)?));
            }
        }
        for (i, text) in replacements {
            elt.children[i] = Node::Text(text);
        }
        Ok(())
    }
}

/// Replace every `%(field)` occurrence in `text` with the row's value.
///
/// A single left-to-right pass: substituted values are never rescanned, so a
/// field value containing `%(...)` cannot trigger another substitution. A
/// `%` not followed by `(`, an unclosed `%(`, and an empty or nested field
/// name all pass through literally.
pub fn interpolate(text: &str, row: &Row) -> Result<String, EtiquetaError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("%(") {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 2..];
        match after.find(')') {
            Some(end) if end > 0 && !after[..end].contains('(') => {
                let field = &after[..end];
                match row.get(field) {
                    Some(value) => out.push_str(value),
                    None => return Err(EtiquetaError::UnknownField(field.to_string())),
                }
                rest = &after[end + 1..];
            }
            _ => {
                out.push_str("%(");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

// ============================================================================
// IMAGE FILTER FAMILY (code128)
// ============================================================================

/// Replaces an image-placeholder group (sizing rect + command text) with an
/// embedded barcode image sized to the rect.
#[derive(Debug, Clone, Copy)]
pub struct ImageFilter;

impl ImageFilter {
    fn apply(&self, elt: &mut Element, _row: &Row) -> Result<(), EtiquetaError> {
        let Some(shape) = image_group_shape(elt) else {
            return Ok(());
        };
        let command_text = {
            let Node::Element(text_elt) = &elt.children[shape.text] else {
                return Ok(());
            };
            text_contents(text_elt)?
        };
        // Only the code128 generator is registered; any other name (or none)
        // passes the group through unchanged.
        if Command::name_of(&command_text) != Some("code128") {
            return Ok(());
        }
        let cmd = Command::parse(&command_text)?;
        reject_unknown_options(&cmd, &["align", "quiet", "fill", "thickness"])?;

        let value = cmd.arg.clone();
        if value.is_empty() {
            // An empty request generates nothing.
            elt.children.clear();
            return Ok(());
        }
        if value.contains("%(") {
            // Interpolation failed earlier in the pass; leave the
            // placeholder visible rather than encode the raw reference.
            return Ok(());
        }

        let align = match cmd.option("align") {
            None => "xMid",
            Some(a @ ("xMin" | "xMid" | "xMax")) => a,
            Some(other) => {
                return Err(EtiquetaError::CommandSyntax(format!(
                    "align='{other}' must be xMin, xMid or xMax"
                )));
            }
        };
        let quiet = cmd.bool_option("quiet", true)?;
        let fill = parse_color(cmd.option("fill").unwrap_or("#000000"))?;
        let thickness = match cmd.option("thickness") {
            Some(raw) => parse_length(raw)?,
            None => DEFAULT_THICKNESS,
        };
        if thickness <= 0.0 {
            return Err(EtiquetaError::CommandSyntax(format!(
                "thickness must be positive, got {thickness}"
            )));
        }

        let rect = {
            let Node::Element(rect_elt) = &elt.children[shape.rect] else {
                return Ok(());
            };
            RectExtents::of(rect_elt)?
        };

        let symbol = code128::encode(&value, quiet)?;
        let barcode_width = f64::from(symbol.modules) * thickness;
        if barcode_width > rect.width {
            return Err(EtiquetaError::Layout(format!(
                "barcode '{value}' with width {barcode_width} exceeds allocated width {}",
                rect.width
            )));
        }
        let x = match align {
            "xMin" => rect.x,
            "xMax" => rect.x + rect.width - barcode_width,
            _ => rect.x + (rect.width - barcode_width) / 2.0,
        };

        let png = render_png(&symbol, thickness, rect.height, fill)?;
        let mut image = Element::new("image");
        image.set_attr("x", x.to_string());
        image.set_attr("y", rect.y.to_string());
        image.set_attr("width", barcode_width.to_string());
        image.set_attr("height", rect.height.to_string());
        image.set_attr("preserveAspectRatio", format!("{align}YMid meet"));
        image.set_attr("href", format!("data:image/png;base64,{}", BASE64.encode(&png)));

        elt.children = vec![Node::Element(image)];
        Ok(())
    }
}

/// Child indices of an image-placeholder group: exactly one rect and one
/// text element, in either order, and no other element children.
struct GroupShape {
    rect: usize,
    text: usize,
}

fn image_group_shape(elt: &Element) -> Option<GroupShape> {
    if elt.local_name() != "g" {
        return None;
    }
    let elements: Vec<(usize, &Element)> = elt
        .children
        .iter()
        .enumerate()
        .filter_map(|(i, node)| match node {
            Node::Element(inner) => Some((i, inner)),
            Node::Text(_) => None,
        })
        .collect();
    match elements.as_slice() {
        [(a, first), (b, second)] => match (first.local_name(), second.local_name()) {
            ("rect", "text") => Some(GroupShape { rect: *a, text: *b }),
            ("text", "rect") => Some(GroupShape { rect: *b, text: *a }),
            _ => None,
        },
        _ => None,
    }
}

fn reject_unknown_options(cmd: &Command, known: &[&str]) -> Result<(), EtiquetaError> {
    for key in cmd.options.keys() {
        if !known.contains(&key.as_str()) {
            return Err(EtiquetaError::CommandSyntax(format!(
                "#{} has unknown option '{key}'",
                cmd.name
            )));
        }
    }
    Ok(())
}

struct RectExtents {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl RectExtents {
    fn of(rect: &Element) -> Result<Self, EtiquetaError> {
        let length = |name: &str| -> Result<f64, EtiquetaError> {
            match rect.attr(name) {
                Some(raw) => parse_length(raw),
                None => Err(EtiquetaError::Template(format!(
                    "sizing rect is missing '{name}'"
                ))),
            }
        };
        Ok(Self {
            // x and y default to zero per SVG.
            x: rect.attr("x").map(parse_length).transpose()?.unwrap_or(0.0),
            y: rect.attr("y").map(parse_length).transpose()?.unwrap_or(0.0),
            width: length("width")?,
            height: length("height")?,
        })
    }
}

fn parse_color(raw: &str) -> Result<[u8; 3], EtiquetaError> {
    let hex = raw.strip_prefix('#').ok_or_else(|| {
        EtiquetaError::CommandSyntax(format!("fill='{raw}' must be a #rgb or #rrggbb color"))
    })?;
    let expand = |nibble: u8| nibble << 4 | nibble;
    let digit = |i: usize| -> Result<u8, EtiquetaError> {
        u8::from_str_radix(&hex[i..i + 1], 16)
            .map_err(|_| EtiquetaError::CommandSyntax(format!("fill='{raw}' is not a valid color")))
    };
    match hex.len() {
        3 => Ok([expand(digit(0)?), expand(digit(1)?), expand(digit(2)?)]),
        6 => {
            let byte = |i: usize| -> Result<u8, EtiquetaError> {
                u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| {
                    EtiquetaError::CommandSyntax(format!("fill='{raw}' is not a valid color"))
                })
            };
            Ok([byte(0)?, byte(2)?, byte(4)?])
        }
        _ => Err(EtiquetaError::CommandSyntax(format!(
            "fill='{raw}' is not a valid color"
        ))),
    }
}

/// Rasterize the run sequence to an RGBA PNG, one module = `thickness`
/// pixels wide, spaces transparent so the sheet background shows through.
fn render_png(
    symbol: &code128::BarcodeSymbol,
    thickness: f64,
    height: f64,
    fill: [u8; 3],
) -> Result<Vec<u8>, EtiquetaError> {
    let width_px = (f64::from(symbol.modules) * thickness).round().max(1.0) as u32;
    let height_px = height.round().max(1.0) as u32;
    let mut img = image::RgbaImage::new(width_px, height_px);

    let mut module = 0u32;
    for run in &symbol.runs {
        if run.bar {
            let x0 = (f64::from(module) * thickness).round() as u32;
            let x1 = (f64::from(module + u32::from(run.width)) * thickness).round() as u32;
            for x in x0..x1.min(width_px) {
                for y in 0..height_px {
                    img.put_pixel(x, y, image::Rgba([fill[0], fill[1], fill[2], 255]));
                }
            }
        }
        module += u32::from(run.width);
    }

    let mut png = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| EtiquetaError::Image(format!("PNG encoding failed: {e}")))?;
    Ok(png)
}

// ============================================================================
// STYLE FILTER
// ============================================================================

/// Merges `#style` command options into the sibling target element's style
/// attribute: replace-if-present, append-if-absent, order preserved.
#[derive(Debug, Clone, Copy)]
pub struct StyleFilter;

impl StyleFilter {
    fn apply(&self, elt: &mut Element) -> Result<(), EtiquetaError> {
        let Some((command_idx, target_idx, command_text)) = style_group_shape(elt)? else {
            return Ok(());
        };
        let cmd = Command::parse(&command_text)?;

        let merged = {
            let Node::Element(target) = &elt.children[target_idx] else {
                return Ok(());
            };
            merge_style(target.attr("style").unwrap_or(""), &cmd)?
        };

        if let Node::Element(target) = &mut elt.children[target_idx] {
            target.set_attr("style", merged);
        }
        elt.children.remove(command_idx);
        Ok(())
    }
}

/// Match a style-placeholder group: exactly two element children, one text
/// node whose command name is `style` and one target element. Any other
/// shape passes through.
fn style_group_shape(elt: &Element) -> Result<Option<(usize, usize, String)>, EtiquetaError> {
    if elt.local_name() != "g" {
        return Ok(None);
    }
    let elements: Vec<(usize, &Element)> = elt
        .children
        .iter()
        .enumerate()
        .filter_map(|(i, node)| match node {
            Node::Element(inner) => Some((i, inner)),
            Node::Text(_) => None,
        })
        .collect();
    let [(a, first), (b, second)] = elements.as_slice() else {
        return Ok(None);
    };

    let is_style_command = |e: &Element| -> Result<Option<String>, EtiquetaError> {
        if e.local_name() != "text" {
            return Ok(None);
        }
        let text = text_contents(e)?;
        Ok((Command::name_of(&text) == Some("style")).then_some(text))
    };
    if let Some(text) = is_style_command(first)? {
        return Ok(Some((*a, *b, text)));
    }
    if let Some(text) = is_style_command(second)? {
        return Ok(Some((*b, *a, text)));
    }
    Ok(None)
}

fn merge_style(existing: &str, cmd: &Command) -> Result<String, EtiquetaError> {
    let mut style: IndexMap<String, String> = IndexMap::new();
    for pair in existing.split(';').filter(|p| !p.trim().is_empty()) {
        let (key, value) = pair.split_once(':').ok_or_else(|| {
            EtiquetaError::Template(format!("malformed style declaration '{pair}'"))
        })?;
        let key = key.trim();
        if style.contains_key(key) {
            return Err(EtiquetaError::Template(format!(
                "duplicate style key '{key}' in template"
            )));
        }
        style.insert(key.to_string(), value.trim().to_string());
    }
    for (key, value) in &cmd.options {
        style.insert(key.clone(), value.clone());
    }
    Ok(style
        .iter()
        .map(|(k, v)| format!("{k}:{v}"))
        .collect::<Vec<_>>()
        .join(";"))
}
