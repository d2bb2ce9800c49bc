//! Balsamiq BMML mockups, zipped together with their image assets.

use anyhow::{Context, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use std::fmt::Write as _;
use std::io::{Cursor, Write};
use wire_data::TextKind;
use wire_scene::{Element, ElementKind, ImageKind, SceneMeta};
use wire_vision::HexColor;
use zip::write::SimpleFileOptions;

use crate::render::{xml_escape, Asset, Fragment, RenderContext};

/// Characters left as-is in BMML text, matching URL path quoting.
const BMML_TEXT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

pub(crate) fn encode_text(text: &str) -> String {
    utf8_percent_encode(text, BMML_TEXT).to_string()
}

/// Balsamiq stores colors as decimal RGB integers.
fn decimal(c: HexColor) -> u32 {
    let [r, g, b] = c.0;
    (r as u32) << 16 | (g as u32) << 8 | b as u32
}

fn open_control(out: &mut String, type_id: &str, el: &Element, z: usize, locked: bool) {
    let b = el.bbox;
    let _ = writeln!(
        out,
        "<control controlID=\"{z}\" controlTypeID=\"com.balsamiq.mockups::{}\" x=\"{}\" y=\"{}\" w=\"{}\" h=\"{}\" measuredW=\"{}\" measuredH=\"{}\" zOrder=\"{z}\" locked=\"{}\" isInGroup=\"-1\">",
        type_id,
        b.xmin,
        b.ymin,
        b.width(),
        b.height(),
        b.width(),
        b.height(),
        locked,
        z = z
    );
    out.push_str("<controlProperties>\n");
}

fn close_control(out: &mut String) {
    out.push_str("</controlProperties>\n</control>\n");
}

pub(crate) fn asset_name(el: &Element) -> String {
    format!("{}.png", el.id)
}

pub(crate) fn render_element(el: &Element, ctx: &RenderContext<'_>) -> Fragment {
    let z = ctx.z_index;
    let mut out = String::new();
    let mut assets = Vec::new();

    match &el.kind {
        ElementKind::Image(image) if image.kind == ImageKind::Checkbox => {
            open_control(&mut out, "CheckBox", el, z, false);
            out.push_str("<text></text>\n");
            close_control(&mut out);
        }
        ElementKind::Image(image) => {
            let name = asset_name(el);
            open_control(&mut out, "Image", el, z, image.kind == ImageKind::Background);
            let _ = writeln!(out, "<src>./assets/{}</src>", xml_escape(&name));
            close_control(&mut out);
            assets.push(Asset {
                name,
                png: image.png.clone(),
            });
        }
        ElementKind::Icon(icon) => {
            let glyph = icon.label.strip_prefix("icon_").unwrap_or(&icon.label);
            open_control(&mut out, "Icon", el, z, false);
            let _ = writeln!(out, "<icon>{}</icon>", encode_text(&format!("{}|small", glyph)));
            close_control(&mut out);
        }
        ElementKind::Text(text) => {
            let type_id = match text.kind {
                TextKind::Text => "SubTitle",
                TextKind::Input => "TextInput",
                TextKind::ButtonRect | TextKind::ButtonOval => "Button",
            };
            open_control(&mut out, type_id, el, z, false);
            let _ = writeln!(out, "<text>{}</text>", encode_text(&text.text));
            let _ = writeln!(out, "<size>{}</size>", text.font_size);
            let _ = writeln!(out, "<color>{}</color>", decimal(text.colors.text()));
            if let Some(fill) = text.colors.fill() {
                let _ = writeln!(out, "<backgroundColor>{}</backgroundColor>", decimal(fill));
            }
            close_control(&mut out);
        }
    }

    Fragment {
        markup: out,
        assets,
    }
}

pub(crate) fn mockup_file_name(meta: &SceneMeta) -> String {
    format!("{}.bmml", meta.name)
}

pub(crate) fn document(meta: &SceneMeta, controls: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "<mockup version=\"1.0\" skin=\"sketch\" fontFace=\"Balsamiq Sans\" measuredW=\"{w}\" measuredH=\"{h}\" mockupW=\"{w}\" mockupH=\"{h}\">",
        w = meta.width,
        h = meta.height
    );
    out.push_str("<controls>\n");
    for control in controls {
        out.push_str(control);
    }
    out.push_str("</controls>\n</mockup>\n");
    out
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    id: &'a str,
    mockup: String,
    width: u32,
    height: u32,
    assets: Vec<String>,
}

/// Zip the BMML file, its assets and a JSON manifest.
pub(crate) fn archive(meta: &SceneMeta, bmml: &str, assets: &[Asset]) -> Result<Vec<u8>> {
    let manifest = Manifest {
        id: &meta.id,
        mockup: mockup_file_name(meta),
        width: meta.width,
        height: meta.height,
        assets: assets.iter().map(|a| format!("assets/{}", a.name)).collect(),
    };
    let manifest =
        serde_json::to_vec_pretty(&manifest).context("Failed to serialize manifest")?;

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    let mut add = |name: &str, bytes: &[u8]| -> Result<()> {
        zip.start_file(name, options)
            .with_context(|| format!("Failed to add {} to archive", name))?;
        zip.write_all(bytes)
            .with_context(|| format!("Failed to write {}", name))?;
        Ok(())
    };
    add(&mockup_file_name(meta), bmml.as_bytes())?;
    for asset in assets {
        add(&format!("assets/{}", asset.name), &asset.png)?;
    }
    add("manifest.json", &manifest)?;

    let cursor = zip.finish().context("Failed to finish zip archive")?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_text() {
        assert_eq!(encode_text("Hello World & co"), "Hello%20World%20%26%20co");
        assert_eq!(encode_text("a-b_c.d/e~"), "a-b_c.d/e~");
        assert_eq!(encode_text("Été"), "%C3%89t%C3%A9");
    }

    #[test]
    fn test_decimal_color() {
        assert_eq!(decimal(HexColor([0xff, 0x00, 0x00])), 16711680);
        assert_eq!(decimal(HexColor::WHITE), 16777215);
        assert_eq!(decimal(HexColor::BLACK), 0);
    }

    #[test]
    fn test_document_header() {
        let meta = SceneMeta {
            id: "abc".to_string(),
            name: "login".to_string(),
            width: 800,
            height: 600,
        };
        let bmml = document(&meta, &[]);
        assert!(bmml.starts_with("<mockup version=\"1.0\""));
        assert!(bmml.contains("mockupW=\"800\" mockupH=\"600\""));
        assert!(bmml.ends_with("</controls>\n</mockup>\n"));
    }
}
