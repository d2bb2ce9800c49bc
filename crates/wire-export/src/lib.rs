use anyhow::{bail, Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;
use wire_data::IconCatalog;
use wire_scene::Mockup;

mod balsamiq;
mod pencil;
mod render;
mod svg;

pub use render::{Asset, Fragment, Render, RenderContext};

/// Output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Pencil,
    Svg,
    Balsamiq,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Pencil, Format::Svg, Format::Balsamiq];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Pencil => "epgz",
            Format::Svg => "svg",
            Format::Balsamiq => "zip",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Pencil => "pencil",
            Format::Svg => "svg",
            Format::Balsamiq => "balsamiq",
        };
        f.write_str(name)
    }
}

impl FromStr for Format {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pencil" | "epgz" => Ok(Format::Pencil),
            "svg" => Ok(Format::Svg),
            "balsamiq" | "bmml" => Ok(Format::Balsamiq),
            other => bail!("Unknown format '{}' (expected pencil, svg or balsamiq)", other),
        }
    }
}

/// A finished output file, not yet written anywhere.
#[derive(Debug, Clone)]
pub struct Document {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Render an aligned mockup into one output format.
pub fn serialize(mockup: &mut Mockup, format: Format, catalog: &IconCatalog) -> Result<Document> {
    let layers = mockup.layers()?;
    let meta = layers.meta;

    let mut markup = Vec::with_capacity(layers.elements.len());
    let mut assets = Vec::new();
    for (z_index, element) in layers.elements.iter().enumerate() {
        let ctx = RenderContext {
            z_index,
            catalog,
        };
        let fragment = element.render(format, &ctx);
        markup.push(fragment.markup);
        assets.extend(fragment.assets);
    }

    let file_name = format!("{}.{}", meta.name, format.extension());
    let bytes = match format {
        Format::Pencil => pencil::archive(&meta, &markup)?,
        Format::Svg => svg::document(&meta, &markup).into_bytes(),
        Format::Balsamiq => {
            let bmml = balsamiq::document(&meta, &markup);
            balsamiq::archive(&meta, &bmml, &assets)?
        }
    };

    info!(
        "Serialized {} element(s) to {} ({} bytes)",
        markup.len(),
        file_name,
        bytes.len()
    );
    Ok(Document { file_name, bytes })
}

/// Serialize and write into `dest_dir`, returning the written path.
pub fn write(
    mockup: &mut Mockup,
    format: Format,
    catalog: &IconCatalog,
    dest_dir: &Path,
) -> Result<PathBuf> {
    let doc = serialize(mockup, format, catalog)?;
    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create {}", dest_dir.display()))?;
    let path = dest_dir.join(&doc.file_name);
    std::fs::write(&path, &doc.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use image::{Rgba, RgbaImage};
    use percent_encoding::percent_decode_str;
    use regex::{Captures, Regex};
    use std::io::Read;
    use wire_data::PipelineConfig;
    use wire_detect::{Detection, PixelBox};
    use wire_vision::DisabledRecognizer;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    /// Heading, blue button, photo and icon on a white page.
    fn scene(name: &str) -> Mockup {
        let page = RgbaImage::from_fn(320, 160, |x, y| {
            let heading = (20..32).contains(&y) && (20..110).contains(&x) && x % 6 < 3;
            let button = (60..90).contains(&y) && (20..140).contains(&x);
            let label = (70..80).contains(&y) && (50..110).contains(&x) && x % 6 < 2;
            let photo = (40..120).contains(&y) && (200..280).contains(&x);
            if heading {
                Rgba([10, 10, 10, 255])
            } else if button && label {
                WHITE
            } else if button {
                Rgba([30, 90, 200, 255])
            } else if photo {
                Rgba([(x - 150) as u8, 140, (y + 60) as u8, 255])
            } else {
                WHITE
            }
        });
        let detections = vec![
            Detection::new(PixelBox::new(15, 15, 37, 115), "text", 0.9).with_text("Hello & <World>"),
            Detection::new(PixelBox::new(55, 15, 95, 145), "button_rect", 0.9).with_text("Sign in"),
            Detection::new(PixelBox::new(35, 195, 125, 285), "image", 0.9),
            Detection::new(PixelBox::new(130, 290, 150, 310), "icon_search", 0.9),
        ];
        let mut mockup = Mockup::new(name, page, &PipelineConfig::default());
        mockup.classify(&detections, &DisabledRecognizer).unwrap();
        mockup.reconstruct_background().unwrap();
        mockup.align().unwrap();
        mockup
    }

    fn catalog() -> IconCatalog {
        let mut catalog = IconCatalog::default();
        catalog.insert("icon_search", "image/svg+xml", b"<svg/>");
        catalog
    }

    #[test]
    fn test_format_names() {
        for format in Format::ALL {
            assert_eq!(format.to_string().parse::<Format>().unwrap(), format);
        }
        assert_eq!("SVG".parse::<Format>().unwrap(), Format::Svg);
        assert!("pdf".parse::<Format>().is_err());
        assert_eq!(Format::Pencil.extension(), "epgz");
    }

    #[test]
    fn test_serialize_requires_alignment() {
        let page = RgbaImage::from_pixel(10, 10, WHITE);
        let mut mockup = Mockup::new("raw", page, &PipelineConfig::default());
        assert!(serialize(&mut mockup, Format::Svg, &IconCatalog::default()).is_err());
    }

    #[test]
    fn test_svg_round_trip() {
        let mut mockup = scene("home");
        let expected: Vec<PixelBox> = mockup.elements().iter().map(|e| e.bbox).collect();
        let doc = serialize(&mut mockup, Format::Svg, &catalog()).unwrap();
        assert_eq!(doc.file_name, "home.svg");
        let svg = String::from_utf8(doc.bytes).unwrap();

        assert!(svg.contains("viewBox=\"0 0 320 160\""));
        assert!(svg.contains(">Hello &amp; &lt;World&gt;</text>"));
        assert!(svg.contains(">Sign in</text>"));

        // background, photo and icon are all inlined
        let image = Regex::new(
            r#"<image id="[^"]+" x="(\d+)" y="(\d+)" width="(\d+)" height="(\d+)" xlink:href="data:image/(png|svg\+xml);base64,"#,
        )
        .unwrap();
        let boxes: Vec<PixelBox> = image
            .captures_iter(&svg)
            .map(|c| {
                let n = |i: usize| c[i].parse::<u32>().unwrap();
                PixelBox::new(n(2), n(1), n(2) + n(4), n(1) + n(3))
            })
            .collect();
        assert_eq!(boxes.len(), 3);
        assert_eq!(boxes[0], PixelBox::full(320, 160));
        for b in &boxes[1..] {
            assert!(expected.contains(b));
        }

        let rect = Regex::new(r#"<rect x="(\d+)" y="(\d+)" width="(\d+)" height="(\d+)" rx="(\d+)""#).unwrap();
        let c = rect.captures(&svg).unwrap();
        assert_eq!((&c[1], &c[2], &c[3], &c[4]), ("20", "60", "120", "30"));
    }

    #[test]
    fn test_svg_icon_placeholder_without_catalog() {
        let mut mockup = scene("bare");
        let doc = serialize(&mut mockup, Format::Svg, &IconCatalog::default()).unwrap();
        let svg = String::from_utf8(doc.bytes).unwrap();
        assert_eq!(svg.matches("<image ").count(), 2);
        assert!(svg.contains(">icon_search</text>"));
    }

    #[test]
    fn test_pencil_archive() {
        let mut mockup = scene("home");
        let id = mockup.id().to_string();
        let doc = serialize(&mut mockup, Format::Pencil, &catalog()).unwrap();
        assert_eq!(doc.file_name, "home.epgz");

        let mut archive = tar::Archive::new(GzDecoder::new(doc.bytes.as_slice()));
        let mut files = Vec::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().to_string();
            let mut body = String::new();
            entry.read_to_string(&mut body).unwrap();
            files.push((name, body));
        }
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].0, "content.xml");
        assert!(files[0].1.contains(&format!("<Page href=\"page_{}.xml\"/>", id)));

        let (name, page) = &files[1];
        assert_eq!(name, &format!("page_{}.xml", id));
        assert!(page.starts_with("<?xml"));
        assert!(page.contains("<p:Property name=\"width\">320</p:Property>"));
        assert_eq!(page.matches("p:locked=\"true\"").count(), 1);
        assert_eq!(page.matches("Evolus.Common:Bitmap").count(), 3);
        assert!(page.contains("Evolus.Common:PlainTextV2"));
        assert!(page.contains("Evolus.Common:RoundedRect"));
        assert!(page.contains("<![CDATA[Hello & <World>]]>"));
        assert!(page.contains("<![CDATA[#1e5ac8ff]]>"));
    }

    #[test]
    fn test_balsamiq_archive() {
        let mut mockup = scene("home");
        let id = mockup.id().to_string();
        let doc = serialize(&mut mockup, Format::Balsamiq, &catalog()).unwrap();
        assert_eq!(doc.file_name, "home.zip");

        let mut zip = zip::ZipArchive::new(std::io::Cursor::new(doc.bytes)).unwrap();
        let names: Vec<String> = zip.file_names().map(str::to_string).collect();
        assert!(names.contains(&"home.bmml".to_string()));
        assert!(names.contains(&"manifest.json".to_string()));
        assert!(names.contains(&format!("assets/{}-0.png", id)));
        assert_eq!(names.iter().filter(|n| n.starts_with("assets/")).count(), 2);

        let mut manifest = String::new();
        zip.by_name("manifest.json")
            .unwrap()
            .read_to_string(&mut manifest)
            .unwrap();
        let manifest: serde_json::Value = serde_json::from_str(&manifest).unwrap();
        assert_eq!(manifest["mockup"], "home.bmml");
        assert_eq!(manifest["width"], 320);
        assert_eq!(manifest["assets"].as_array().unwrap().len(), 2);

        let mut bmml = String::new();
        zip.by_name("home.bmml")
            .unwrap()
            .read_to_string(&mut bmml)
            .unwrap();
        assert!(bmml.contains("<text>Hello%20%26%20%3CWorld%3E</text>"));
        assert!(bmml.contains("com.balsamiq.mockups::Button"));
        assert!(bmml.contains("com.balsamiq.mockups::Icon"));
        assert!(bmml.contains("<icon>search%7Csmall</icon>"));
        assert!(bmml.contains(&format!("<src>./assets/{}-0.png</src>", id)));
        assert_eq!(bmml.matches("locked=\"true\"").count(), 1);
    }

    #[test]
    fn test_write_each_format() {
        let dir = tempfile::tempdir().unwrap();
        let mut mockup = scene("page");
        for format in Format::ALL {
            let path = write(&mut mockup, format, &catalog(), dir.path()).unwrap();
            assert!(path.exists());
            assert_eq!(path.extension().unwrap(), format.extension());
        }
    }

    type Layer = (String, PixelBox, Option<String>);

    /// Id, geometry and text of every layer, in paint order.
    fn expected_layers(mockup: &mut Mockup) -> Vec<Layer> {
        mockup
            .layers()
            .unwrap()
            .elements
            .iter()
            .map(|e| (e.id.clone(), e.bbox, e.text().map(|t| t.text.clone())))
            .collect()
    }

    /// Box from four consecutive x, y, width, height captures.
    fn xywh(c: &Captures, at: usize) -> PixelBox {
        let n = |i: usize| c[at + i].parse::<u32>().unwrap();
        PixelBox::new(n(1), n(0), n(1) + n(3), n(0) + n(2))
    }

    fn number(c: &Captures, i: usize) -> u32 {
        c[i].parse().unwrap()
    }

    fn xml_unescape(s: &str) -> String {
        s.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&amp;", "&")
    }

    fn svg_layer(svg: &str, id: &str) -> Layer {
        let pat = regex::escape(id);
        let image = Regex::new(&format!(
            r#"<image id="{pat}" x="(\d+)" y="(\d+)" width="(\d+)" height="(\d+)""#
        ))
        .unwrap();
        if let Some(c) = image.captures(svg) {
            return (id.to_string(), xywh(&c, 1), None);
        }
        let frame = Regex::new(&format!(
            r#"<g id="{pat}">\n  <rect x="(\d+)" y="(\d+)" width="(\d+)" height="(\d+)""#
        ))
        .unwrap();
        let text = Regex::new(&format!(r#"<text id="{pat}-text"[^>]*>([^<]*)</text>"#)).unwrap();
        let c = frame.captures(svg).unwrap();
        let content = text.captures(svg).map(|t| xml_unescape(&t[1]));
        (id.to_string(), xywh(&c, 1), content)
    }

    fn pencil_page(bytes: &[u8]) -> String {
        let mut archive = tar::Archive::new(GzDecoder::new(bytes));
        let mut entries = archive.entries().unwrap();
        entries.next().unwrap().unwrap();
        let mut page = String::new();
        entries.next().unwrap().unwrap().read_to_string(&mut page).unwrap();
        page
    }

    fn pencil_layer(page: &str, id: &str) -> Layer {
        let shape = Regex::new(&format!(
            r#"(?s)id="{}" transform="matrix\(1,0,0,1,(\d+),(\d+)\)"[^>]*>(.*?)\n  </g>"#,
            regex::escape(id)
        ))
        .unwrap();
        let size = Regex::new(r#"<p:property name="box"><!\[CDATA\[(\d+),(\d+)\]\]>"#).unwrap();
        let text =
            Regex::new(r#"<p:property name="(?:label|textContent)"><!\[CDATA\[(.*?)\]\]>"#).unwrap();

        let c = shape.captures(page).unwrap();
        let body = &c[3];
        let s = size.captures(body).unwrap();
        let (x, y) = (number(&c, 1), number(&c, 2));
        let bbox = PixelBox::new(y, x, y + number(&s, 2), x + number(&s, 1));
        (id.to_string(), bbox, text.captures(body).map(|t| t[1].to_string()))
    }

    fn balsamiq_controls(bytes: Vec<u8>, name: &str) -> Vec<(PixelBox, Option<String>)> {
        let mut zip = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let mut bmml = String::new();
        zip.by_name(&format!("{}.bmml", name))
            .unwrap()
            .read_to_string(&mut bmml)
            .unwrap();

        let control = Regex::new(
            r#"(?s)<control [^>]*? x="(\d+)" y="(\d+)" w="(\d+)" h="(\d+)"[^>]*>(.*?)</control>"#,
        )
        .unwrap();
        let text = Regex::new(r"<text>(.*?)</text>").unwrap();
        control
            .captures_iter(&bmml)
            .map(|c| {
                let content = text.captures(&c[5]).map(|t| {
                    percent_decode_str(&t[1]).decode_utf8().unwrap().to_string()
                });
                (xywh(&c, 1), content)
            })
            .collect()
    }

    #[test]
    fn test_every_format_keeps_geometry_and_text() {
        let mut mockup = scene("trip");
        let expected = expected_layers(&mut mockup);
        assert_eq!(expected.len(), 5);

        let svg = serialize(&mut mockup, Format::Svg, &catalog()).unwrap();
        let svg = String::from_utf8(svg.bytes).unwrap();
        let parsed: Vec<Layer> = expected.iter().map(|(id, _, _)| svg_layer(&svg, id)).collect();
        assert_eq!(parsed, expected);

        let pencil = serialize(&mut mockup, Format::Pencil, &catalog()).unwrap();
        let page = pencil_page(&pencil.bytes);
        assert_eq!(page.matches("p:type=\"Shape\"").count(), expected.len());
        let parsed: Vec<Layer> = expected.iter().map(|(id, _, _)| pencil_layer(&page, id)).collect();
        assert_eq!(parsed, expected);

        let balsamiq = serialize(&mut mockup, Format::Balsamiq, &catalog()).unwrap();
        let parsed = balsamiq_controls(balsamiq.bytes, "trip");
        let expected: Vec<(PixelBox, Option<String>)> =
            expected.into_iter().map(|(_, bbox, text)| (bbox, text)).collect();
        assert_eq!(parsed, expected);
    }
}
