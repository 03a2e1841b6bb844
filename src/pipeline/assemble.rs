//! Document assembler: grid rows → `.docx` bytes.
//!
//! A `.docx` file is a zip archive of OOXML parts. We write the minimum a
//! word processor needs: content types, package relationships, the main
//! `word/document.xml`, its relationships, and one `word/media/imageN.jpeg`
//! per occupied cell.
//!
//! The body is a single section containing one full-width table. Every
//! occupied cell holds a centred paragraph with an inline picture sized to
//! the image's stamped footprint; every empty cell holds an empty paragraph
//! with the same cell properties.
//!
//! Output is deterministic: relationship ids and media names derive from the
//! image's position in the grid, and every zip entry carries the same fixed
//! timestamp, so the same grid always yields the same bytes.

use crate::error::Images2DocxError;
use crate::output::DocumentArtifact;
use crate::pipeline::layout::{GridCell, GridRow};
use crate::pipeline::normalize::NormalizedImage;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use std::io::{self, Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// English Metric Units per CSS pixel (914 400 EMU/inch ÷ 96 px/inch).
pub const EMU_PER_PIXEL: u64 = 9525;

// A4 portrait with 1-inch margins, in twentieths of a point.
const PAGE_WIDTH_TWIPS: u32 = 11_906;
const PAGE_HEIGHT_TWIPS: u32 = 16_838;
const MARGIN_TWIPS: u32 = 1_440;
const TEXT_WIDTH_TWIPS: u32 = PAGE_WIDTH_TWIPS - 2 * MARGIN_TWIPS;

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const NS_PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const CT_MAIN_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";

/// Serialise `rows` into a `.docx` artifact named `file_name`.
pub fn assemble(rows: &[GridRow], file_name: &str) -> Result<DocumentArtifact, Images2DocxError> {
    let images = embedded_images(rows);
    let bytes = write_package(rows, &images).map_err(|e| Images2DocxError::AssemblyFailed {
        detail: e.to_string(),
    })?;
    debug!(
        "Assembled {} rows / {} images → {} bytes",
        rows.len(),
        images.len(),
        bytes.len()
    );
    Ok(DocumentArtifact {
        file_name: file_name.to_string(),
        bytes,
    })
}

/// The `word/document.xml` part for `rows`.
///
/// Depends only on grid shape and image footprints, never on image bytes.
pub fn document_xml(rows: &[GridRow]) -> Result<String, Images2DocxError> {
    let xml = write_document_xml(rows).map_err(|e| Images2DocxError::AssemblyFailed {
        detail: e.to_string(),
    })?;
    String::from_utf8(xml).map_err(|e| Images2DocxError::AssemblyFailed {
        detail: e.to_string(),
    })
}

fn embedded_images(rows: &[GridRow]) -> Vec<&NormalizedImage> {
    rows.iter()
        .flat_map(|r| r.cells.iter())
        .filter_map(|c| match c {
            GridCell::Occupied(img) => Some(img),
            GridCell::Empty => None,
        })
        .collect()
}

fn media_name(ordinal: usize, img: &NormalizedImage) -> String {
    format!("image{}.{}", ordinal, img.encoding.extension())
}

fn image_rel_id(ordinal: usize) -> String {
    format!("rIdImg{ordinal}")
}

fn write_package(rows: &[GridRow], images: &[&NormalizedImage]) -> io::Result<Vec<u8>> {
    let document = write_document_xml(rows)?;
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let xml_opts = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());
    // JPEG data does not shrink further; store it.
    let media_opts = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(DateTime::default());

    let mut add = |name: &str, data: &[u8], opts: &SimpleFileOptions| -> io::Result<()> {
        zip.start_file(name, opts.clone()).map_err(io::Error::other)?;
        zip.write_all(data)
    };

    add("[Content_Types].xml", &content_types_xml(images)?, &xml_opts)?;
    add("_rels/.rels", &package_rels_xml()?, &xml_opts)?;
    add("word/document.xml", &document, &xml_opts)?;
    add("word/_rels/document.xml.rels", &document_rels_xml(images)?, &xml_opts)?;
    for (i, img) in images.iter().enumerate() {
        let name = format!("word/media/{}", media_name(i + 1, img));
        add(&name, &img.bytes, &media_opts)?;
    }

    let cursor = zip.finish().map_err(io::Error::other)?;
    Ok(cursor.into_inner())
}

// ── XML helpers ──────────────────────────────────────────────────────────

struct Xml {
    w: Writer<Vec<u8>>,
}

impl Xml {
    fn new() -> io::Result<Self> {
        let mut w = Writer::new(Vec::new());
        w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(Self { w })
    }

    fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> io::Result<()> {
        let el = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.w.write_event(Event::Start(el))
    }

    fn close(&mut self, name: &str) -> io::Result<()> {
        self.w.write_event(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> io::Result<()> {
        let el = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.w.write_event(Event::Empty(el))
    }

    fn finish(self) -> Vec<u8> {
        self.w.into_inner()
    }
}

// ── Package parts ────────────────────────────────────────────────────────

fn content_types_xml(images: &[&NormalizedImage]) -> io::Result<Vec<u8>> {
    let mut x = Xml::new()?;
    x.open("Types", &[("xmlns", NS_CONTENT_TYPES)])?;
    x.empty(
        "Default",
        &[("Extension", "rels"), ("ContentType", CT_RELATIONSHIPS)],
    )?;
    x.empty(
        "Default",
        &[("Extension", "xml"), ("ContentType", "application/xml")],
    )?;
    let mut encodings: Vec<_> = images.iter().map(|i| i.encoding).collect();
    encodings.dedup();
    for enc in encodings {
        x.empty(
            "Default",
            &[("Extension", enc.extension()), ("ContentType", enc.mime_type())],
        )?;
    }
    x.empty(
        "Override",
        &[("PartName", "/word/document.xml"), ("ContentType", CT_MAIN_DOCUMENT)],
    )?;
    x.close("Types")?;
    Ok(x.finish())
}

fn package_rels_xml() -> io::Result<Vec<u8>> {
    let mut x = Xml::new()?;
    x.open("Relationships", &[("xmlns", NS_PKG_RELS)])?;
    x.empty(
        "Relationship",
        &[
            ("Id", "rId1"),
            ("Type", REL_OFFICE_DOCUMENT),
            ("Target", "word/document.xml"),
        ],
    )?;
    x.close("Relationships")?;
    Ok(x.finish())
}

fn document_rels_xml(images: &[&NormalizedImage]) -> io::Result<Vec<u8>> {
    let mut x = Xml::new()?;
    x.open("Relationships", &[("xmlns", NS_PKG_RELS)])?;
    for (i, img) in images.iter().enumerate() {
        let id = image_rel_id(i + 1);
        let target = format!("media/{}", media_name(i + 1, img));
        x.empty(
            "Relationship",
            &[("Id", id.as_str()), ("Type", REL_IMAGE), ("Target", target.as_str())],
        )?;
    }
    x.close("Relationships")?;
    Ok(x.finish())
}

// ── Main document ────────────────────────────────────────────────────────

fn write_document_xml(rows: &[GridRow]) -> io::Result<Vec<u8>> {
    let mut x = Xml::new()?;
    x.open(
        "w:document",
        &[
            ("xmlns:w", NS_W),
            ("xmlns:r", NS_R),
            ("xmlns:wp", NS_WP),
            ("xmlns:a", NS_A),
            ("xmlns:pic", NS_PIC),
        ],
    )?;
    x.open("w:body", &[])?;

    // OOXML requires at least one row per table, so an empty grid gets no table.
    if !rows.is_empty() {
        write_table(&mut x, rows)?;
    }
    // Body content must end in a paragraph before the section properties.
    x.empty("w:p", &[])?;
    write_section_properties(&mut x)?;

    x.close("w:body")?;
    x.close("w:document")?;
    Ok(x.finish())
}

fn write_table(x: &mut Xml, rows: &[GridRow]) -> io::Result<()> {
    let columns = rows.iter().map(|r| r.cells.len()).max().unwrap_or(1).max(1);
    let col_width = (TEXT_WIDTH_TWIPS / columns as u32).to_string();

    x.open("w:tbl", &[])?;
    x.open("w:tblPr", &[])?;
    x.empty("w:tblW", &[("w:w", "5000"), ("w:type", "pct")])?;
    x.open("w:tblBorders", &[])?;
    for side in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
        x.empty(
            side,
            &[("w:val", "single"), ("w:sz", "4"), ("w:space", "0"), ("w:color", "auto")],
        )?;
    }
    x.close("w:tblBorders")?;
    x.close("w:tblPr")?;

    x.open("w:tblGrid", &[])?;
    for _ in 0..columns {
        x.empty("w:gridCol", &[("w:w", col_width.as_str())])?;
    }
    x.close("w:tblGrid")?;

    let mut ordinal = 0usize;
    for row in rows {
        x.open("w:tr", &[])?;
        for cell in &row.cells {
            x.open("w:tc", &[])?;
            x.open("w:tcPr", &[])?;
            x.empty("w:tcW", &[("w:w", col_width.as_str()), ("w:type", "dxa")])?;
            x.empty("w:vAlign", &[("w:val", "center")])?;
            x.close("w:tcPr")?;
            match cell {
                GridCell::Occupied(img) => {
                    ordinal += 1;
                    write_picture_paragraph(x, img, ordinal)?;
                }
                GridCell::Empty => x.empty("w:p", &[])?,
            }
            x.close("w:tc")?;
        }
        x.close("w:tr")?;
    }

    x.close("w:tbl")
}

fn write_picture_paragraph(x: &mut Xml, img: &NormalizedImage, ordinal: usize) -> io::Result<()> {
    let cx = (u64::from(img.display_width) * EMU_PER_PIXEL).to_string();
    let cy = (u64::from(img.display_height) * EMU_PER_PIXEL).to_string();
    let id = ordinal.to_string();
    let doc_name = format!("Picture {ordinal}");
    let file_name = media_name(ordinal, img);
    let rel_id = image_rel_id(ordinal);

    x.open("w:p", &[])?;
    x.open("w:pPr", &[])?;
    x.empty("w:jc", &[("w:val", "center")])?;
    x.close("w:pPr")?;
    x.open("w:r", &[])?;
    x.open("w:drawing", &[])?;
    x.open(
        "wp:inline",
        &[("distT", "0"), ("distB", "0"), ("distL", "0"), ("distR", "0")],
    )?;
    x.empty("wp:extent", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    x.empty("wp:docPr", &[("id", id.as_str()), ("name", doc_name.as_str())])?;
    x.open("a:graphic", &[])?;
    x.open("a:graphicData", &[("uri", NS_PIC)])?;
    x.open("pic:pic", &[])?;

    x.open("pic:nvPicPr", &[])?;
    x.empty("pic:cNvPr", &[("id", id.as_str()), ("name", file_name.as_str())])?;
    x.empty("pic:cNvPicPr", &[])?;
    x.close("pic:nvPicPr")?;

    x.open("pic:blipFill", &[])?;
    x.empty("a:blip", &[("r:embed", rel_id.as_str())])?;
    x.open("a:stretch", &[])?;
    x.empty("a:fillRect", &[])?;
    x.close("a:stretch")?;
    x.close("pic:blipFill")?;

    x.open("pic:spPr", &[])?;
    x.open("a:xfrm", &[])?;
    x.empty("a:off", &[("x", "0"), ("y", "0")])?;
    x.empty("a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    x.close("a:xfrm")?;
    x.open("a:prstGeom", &[("prst", "rect")])?;
    x.empty("a:avLst", &[])?;
    x.close("a:prstGeom")?;
    x.close("pic:spPr")?;

    x.close("pic:pic")?;
    x.close("a:graphicData")?;
    x.close("a:graphic")?;
    x.close("wp:inline")?;
    x.close("w:drawing")?;
    x.close("w:r")?;
    x.close("w:p")
}

fn write_section_properties(x: &mut Xml) -> io::Result<()> {
    let page_w = PAGE_WIDTH_TWIPS.to_string();
    let page_h = PAGE_HEIGHT_TWIPS.to_string();
    let margin = MARGIN_TWIPS.to_string();
    x.open("w:sectPr", &[])?;
    x.empty("w:pgSz", &[("w:w", page_w.as_str()), ("w:h", page_h.as_str())])?;
    x.empty(
        "w:pgMar",
        &[
            ("w:top", margin.as_str()),
            ("w:right", margin.as_str()),
            ("w:bottom", margin.as_str()),
            ("w:left", margin.as_str()),
            ("w:header", "708"),
            ("w:footer", "708"),
            ("w:gutter", "0"),
        ],
    )?;
    x.close("w:sectPr")
}
