//! Pencil `.epgz` documents: a gzip'd tar holding `content.xml` and one page.

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fmt::Write as _;
use wire_data::TextKind;
use wire_scene::{Element, ElementKind, ImageKind, SceneMeta, TextColors, TextElement};
use wire_vision::HexColor;

use crate::render::{xml_escape, RenderContext};

const NAMESPACE: &str = "http://www.evolus.vn/Namespace/Pencil";

/// Pencil colors carry an alpha byte.
fn color(c: HexColor) -> String {
    format!("{}ff", c)
}

/// CDATA section, splitting any embedded terminator.
fn cdata(s: &str) -> String {
    format!("<![CDATA[{}]]>", s.replace("]]>", "]]]]><![CDATA[>"))
}

fn property(out: &mut String, name: &str, value: &str) {
    let _ = writeln!(out, "      <p:property name=\"{}\">{}</p:property>", name, cdata(value));
}

fn open_shape(out: &mut String, def: &str, el: &Element, locked: bool) {
    let _ = writeln!(
        out,
        "  <g xmlns=\"http://www.w3.org/2000/svg\" p:type=\"Shape\" p:def=\"Evolus.Common:{}\" id=\"{}\" transform=\"matrix(1,0,0,1,{},{})\"{}>",
        def,
        xml_escape(&el.id),
        el.bbox.xmin,
        el.bbox.ymin,
        if locked { " p:locked=\"true\"" } else { "" }
    );
    out.push_str("    <p:metadata>\n");
}

fn close_shape(out: &mut String, inner: &str) {
    out.push_str("    </p:metadata>\n");
    out.push_str(inner);
    out.push_str("  </g>\n");
}

fn size(el: &Element) -> String {
    format!("{},{}", el.bbox.width(), el.bbox.height())
}

fn font(text: &TextElement) -> String {
    format!("Arial|normal|normal|{}px|none", text.font_size)
}

fn bitmap(out: &mut String, el: &Element, data_uri: &str, locked: bool) {
    open_shape(out, "Bitmap", el, locked);
    property(out, "box", &size(el));
    property(out, "imageData", &format!("{},{}", size(el), data_uri));
    close_shape(out, "");
}

/// A `RoundedRect` carrying a label, used for controls and for icons with no asset.
fn labelled_box(out: &mut String, def: &str, el: &Element, label: &str, font_size: u32, colors: TextColors) {
    let (stroke_style, stroke) = match colors {
        TextColors::Bordered { border, .. } => ("2|", border),
        _ => ("0|", colors.fill().unwrap_or(colors.text())),
    };
    open_shape(out, def, el, false);
    property(out, "box", &size(el));
    property(out, "fillColor", &color(colors.fill().unwrap_or(HexColor::WHITE)));
    property(out, "textColor", &color(colors.text()));
    property(out, "textContent", label);
    property(out, "textFont", &format!("Arial|normal|normal|{}px|none", font_size));
    property(out, "strokeStyle", stroke_style);
    property(out, "strokeColor", &color(stroke));
    close_shape(out, "    <text p:name=\"text\"></text>\n");
}

pub(crate) fn render_element(el: &Element, ctx: &RenderContext<'_>) -> String {
    let mut out = String::new();
    match &el.kind {
        ElementKind::Image(image) => {
            bitmap(&mut out, el, &image.data_uri, image.kind == ImageKind::Background);
        }
        ElementKind::Icon(icon) => match ctx.catalog.get(&icon.label) {
            Some(asset) => bitmap(&mut out, el, &asset.data_uri, false),
            None => labelled_box(
                &mut out,
                "RoundedRect",
                el,
                &icon.label,
                (el.bbox.height() / 2).max(1),
                TextColors::Bordered {
                    fill: HexColor::WHITE,
                    border: HexColor::BLACK,
                    text: HexColor::BLACK,
                },
            ),
        },
        ElementKind::Text(text) if text.kind.is_plain() => {
            open_shape(&mut out, "PlainTextV2", el, false);
            property(&mut out, "box", &size(el));
            property(&mut out, "label", &text.text);
            property(&mut out, "textColor", &color(text.colors.text()));
            property(&mut out, "textFont", &font(text));
            property(&mut out, "textAlign", "0,0");
            close_shape(&mut out, "    <text p:name=\"text\"></text>\n");
        }
        ElementKind::Text(text) => {
            let def = match text.kind {
                TextKind::Input => "TextBox",
                TextKind::ButtonOval => "Oval",
                TextKind::ButtonRect | TextKind::Text => "RoundedRect",
            };
            labelled_box(&mut out, def, el, &text.text, text.font_size, text.colors);
        }
    }
    out
}

pub(crate) fn page_file_name(meta: &SceneMeta) -> String {
    format!("page_{}.xml", meta.id)
}

/// The `p:Page` document wrapping already rendered shapes.
pub(crate) fn page(meta: &SceneMeta, shapes: &[String]) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(out, "<p:Page xmlns:p=\"{}\">", NAMESPACE);
    out.push_str("  <p:Properties>\n");
    let _ = writeln!(out, "    <p:Property name=\"id\">{}</p:Property>", xml_escape(&meta.id));
    let _ = writeln!(out, "    <p:Property name=\"name\">{}</p:Property>", xml_escape(&meta.name));
    let _ = writeln!(out, "    <p:Property name=\"width\">{}</p:Property>", meta.width);
    let _ = writeln!(out, "    <p:Property name=\"height\">{}</p:Property>", meta.height);
    let _ = writeln!(
        out,
        "    <p:Property name=\"pageFileName\">{}</p:Property>",
        page_file_name(meta)
    );
    out.push_str("  </p:Properties>\n");
    out.push_str("  <p:Content>\n");
    for shape in shapes {
        out.push_str(shape);
    }
    out.push_str("  </p:Content>\n");
    out.push_str("</p:Page>\n");
    out
}

fn manifest(meta: &SceneMeta) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Document xmlns=\"{}\">\n  <Properties/>\n  <Pages>\n    <Page href=\"{}\"/>\n  </Pages>\n</Document>\n",
        NAMESPACE,
        page_file_name(meta)
    )
}

/// Pack the page and its manifest into a `.epgz` archive.
pub(crate) fn archive(meta: &SceneMeta, shapes: &[String]) -> Result<Vec<u8>> {
    let entries = [
        ("content.xml".to_string(), manifest(meta)),
        (page_file_name(meta), page(meta, shapes)),
    ];

    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (name, body) in &entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, body.as_bytes())
            .with_context(|| format!("Failed to add {} to archive", name))?;
    }
    let encoder = builder.into_inner().context("Failed to finish tar stream")?;
    encoder.finish().context("Failed to finish gzip stream")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdata_splits_terminator() {
        assert_eq!(cdata("a]]>b"), "<![CDATA[a]]]]><![CDATA[>b]]>");
    }

    #[test]
    fn test_page_header() {
        let meta = SceneMeta {
            id: "abc123".to_string(),
            name: "Login & co".to_string(),
            width: 1280,
            height: 720,
        };
        let xml = page(&meta, &["  <g/>\n".to_string()]);
        assert!(xml.contains("<p:Property name=\"name\">Login &amp; co</p:Property>"));
        assert!(xml.contains("<p:Property name=\"width\">1280</p:Property>"));
        assert!(xml.contains("<p:Property name=\"pageFileName\">page_abc123.xml</p:Property>"));
        assert!(xml.contains("<p:Content>\n  <g/>\n  </p:Content>"));
    }
}
