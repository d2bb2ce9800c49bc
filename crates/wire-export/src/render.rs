use wire_data::IconCatalog;
use wire_scene::Element;

use crate::{balsamiq, pencil, svg, Format};

/// Side data a renderer may need beyond the element itself.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    /// Paint order, 0 being the background layer.
    pub z_index: usize,
    pub catalog: &'a IconCatalog,
}

/// A binary file that must ship next to the markup.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub name: String,
    pub png: Vec<u8>,
}

/// Markup for one element plus the files it references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub markup: String,
    pub assets: Vec<Asset>,
}

impl Fragment {
    pub fn markup(markup: String) -> Self {
        Self {
            markup,
            assets: Vec::new(),
        }
    }
}

/// Projection of an element into one output format.
pub trait Render {
    fn render(&self, format: Format, ctx: &RenderContext<'_>) -> Fragment;
}

impl Render for Element {
    fn render(&self, format: Format, ctx: &RenderContext<'_>) -> Fragment {
        match format {
            Format::Pencil => Fragment::markup(pencil::render_element(self, ctx)),
            Format::Svg => Fragment::markup(svg::render_element(self, ctx)),
            Format::Balsamiq => balsamiq::render_element(self, ctx),
        }
    }
}

/// Escape text for XML content and attribute values.
pub(crate) fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Non-empty lines of recognized text, trimmed.
pub(crate) fn text_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}
