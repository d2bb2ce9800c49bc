//! Standalone SVG documents with every bitmap inlined as a data URI.

use std::fmt::Write as _;
use wire_data::TextKind;
use wire_scene::{Element, ElementKind, SceneMeta, TextElement};
use wire_vision::HexColor;

use crate::render::{text_lines, xml_escape, RenderContext};

fn image(out: &mut String, el: &Element, href: &str) {
    let b = el.bbox;
    let _ = writeln!(
        out,
        "  <image id=\"{}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" xlink:href=\"{}\"/>",
        xml_escape(&el.id),
        b.xmin,
        b.ymin,
        b.width(),
        b.height(),
        xml_escape(href)
    );
}

/// `<text>` block whose first baseline sits just under `top`.
fn text_block(out: &mut String, id: &str, x: u32, top: u32, text: &TextElement) {
    let lines = text_lines(&text.text);
    let baseline = top + (text.font_size as f64 * 0.8).round() as u32;
    let _ = write!(
        out,
        "  <text id=\"{}\" x=\"{}\" y=\"{}\" style=\"font-family:Arial;font-size:{}px;fill:{};stroke:none;\">",
        xml_escape(id),
        x,
        baseline,
        text.font_size,
        text.colors.text()
    );
    match lines.as_slice() {
        [] => {}
        [single] => out.push_str(&xml_escape(single)),
        _ => {
            out.push('\n');
            for (i, line) in lines.iter().enumerate() {
                let dy = if i == 0 { "0" } else { "1.2em" };
                let _ = writeln!(
                    out,
                    "    <tspan x=\"{}\" dy=\"{}\">{}</tspan>",
                    x,
                    dy,
                    xml_escape(line)
                );
            }
            out.push_str("  ");
        }
    }
    out.push_str("</text>\n");
}

/// Text with an invisible frame carrying its extent.
fn plain_text(out: &mut String, el: &Element, text: &TextElement) {
    let b = el.bbox;
    let _ = writeln!(out, "  <g id=\"{}\">", xml_escape(&el.id));
    let _ = writeln!(
        out,
        "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" style=\"{}\"/>",
        b.xmin,
        b.ymin,
        b.width(),
        b.height(),
        style(None, None)
    );
    text_block(out, &format!("{}-text", el.id), b.xmin, b.ymin, text);
    out.push_str("  </g>\n");
}

fn style(fill: Option<HexColor>, stroke: Option<HexColor>) -> String {
    let paint = |c: Option<HexColor>| c.map_or("none".to_string(), |c| c.to_string());
    format!(
        "fill:{};stroke:{};stroke-width:1",
        paint(fill),
        paint(stroke)
    )
}

fn control(out: &mut String, el: &Element, text: &TextElement) {
    let b = el.bbox;
    let area = text.text_area.unwrap_or(b);
    let fill = text.colors.fill();
    let stroke = match text.kind {
        TextKind::Input => Some(text.colors.border().unwrap_or(text.colors.text())),
        _ => text.colors.border(),
    };

    let _ = writeln!(out, "  <g id=\"{}\">", xml_escape(&el.id));
    match text.kind {
        TextKind::ButtonOval => {
            let (rx, ry) = (b.width() as f64 / 2.0, b.height() as f64 / 2.0);
            let _ = writeln!(
                out,
                "  <ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\" style=\"{}\"/>",
                b.xmin as f64 + rx,
                b.ymin as f64 + ry,
                rx,
                ry,
                style(fill, stroke)
            );
        }
        _ => {
            let rx = if text.kind == TextKind::ButtonRect {
                b.height() / 4
            } else {
                0
            };
            let _ = writeln!(
                out,
                "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\" style=\"{}\"/>",
                b.xmin,
                b.ymin,
                b.width(),
                b.height(),
                rx,
                style(fill, stroke)
            );
        }
    }
    text_block(out, &format!("{}-text", el.id), area.xmin, area.ymin, text);
    out.push_str("  </g>\n");
}

fn placeholder(out: &mut String, el: &Element, label: &str) {
    let b = el.bbox;
    let _ = writeln!(out, "  <g id=\"{}\">", xml_escape(&el.id));
    let _ = writeln!(
        out,
        "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" style=\"{}\"/>",
        b.xmin,
        b.ymin,
        b.width(),
        b.height(),
        style(None, Some(HexColor::BLACK))
    );
    let _ = writeln!(
        out,
        "  <text x=\"{}\" y=\"{}\" style=\"font-family:Arial;font-size:{}px;fill:#000000;\">{}</text>",
        b.xmin,
        b.ymax,
        (b.height() / 3).max(1),
        xml_escape(label)
    );
    out.push_str("  </g>\n");
}

pub(crate) fn render_element(el: &Element, ctx: &RenderContext<'_>) -> String {
    let mut out = String::new();
    match &el.kind {
        ElementKind::Image(img) => image(&mut out, el, &img.data_uri),
        ElementKind::Icon(icon) => match ctx.catalog.get(&icon.label) {
            Some(asset) => image(&mut out, el, &asset.data_uri),
            None => placeholder(&mut out, el, &icon.label),
        },
        ElementKind::Text(text) if text.kind.is_plain() => plain_text(&mut out, el, text),
        ElementKind::Text(text) => control(&mut out, el, text),
    }
    out
}

pub(crate) fn document(meta: &SceneMeta, elements: &[String]) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n");
    let _ = writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" viewBox=\"0 0 {w} {h}\" width=\"{w}\" height=\"{h}\" id=\"{id}\">",
        w = meta.width,
        h = meta.height,
        id = xml_escape(&meta.id)
    );
    let _ = writeln!(out, "  <title>{}</title>", xml_escape(&meta.name));
    for el in elements {
        out.push_str(el);
    }
    out.push_str("</svg>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use wire_scene::TextColors;

    fn text(kind: TextKind, content: &str) -> TextElement {
        TextElement {
            kind,
            text: content.to_string(),
            font_size: 20,
            colors: TextColors::Ink(HexColor([17, 34, 51])),
            text_area: None,
        }
    }

    #[test]
    fn test_single_line_text() {
        let mut out = String::new();
        text_block(&mut out, "e-1", 10, 40, &text(TextKind::Text, "a < b"));
        assert_eq!(
            out,
            "  <text id=\"e-1\" x=\"10\" y=\"56\" style=\"font-family:Arial;font-size:20px;fill:#112233;stroke:none;\">a &lt; b</text>\n"
        );
    }

    #[test]
    fn test_multi_line_text_uses_tspans() {
        let mut out = String::new();
        text_block(&mut out, "e-1", 10, 40, &text(TextKind::Text, "one\ntwo\n"));
        assert_eq!(out.matches("<tspan").count(), 2);
        assert!(out.contains("<tspan x=\"10\" dy=\"1.2em\">two</tspan>"));
    }

    #[test]
    fn test_style() {
        assert_eq!(
            style(Some(HexColor::WHITE), None),
            "fill:#ffffff;stroke:none;stroke-width:1"
        );
    }
}
