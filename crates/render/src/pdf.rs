//! Serializes a [`LaidOutDocument`] with `pdf-writer`.
//!
//! Layout coordinates have a top-left origin; PDF user space starts at the
//! bottom-left, so every y is flipped against the page height here.

use std::io::Write as _;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect as PdfRect, Ref, Str, TextStr};

use crate::assets::{AssetRole, AssetSet, ImageAsset};
use crate::error::RenderError;
use crate::job::Rgb;
use crate::layout::{DrawOp, LaidOutDocument, Page};
use crate::metrics::{ascender, encode_win_ansi, Font};

const PRODUCER: &str = "cotiza";

struct RefAllocator(i32);

impl RefAllocator {
    fn next(&mut self) -> Ref {
        self.0 += 1;
        Ref::new(self.0)
    }
}

/// Distinct fill opacities below 1.0, each backed by one ExtGState.
#[derive(Default)]
struct AlphaStates {
    entries: Vec<(f32, String, Ref)>,
}

impl AlphaStates {
    fn collect(document: &LaidOutDocument, refs: &mut RefAllocator) -> Self {
        let mut states = Self::default();
        for op in document.pages.iter().flat_map(|page| &page.ops) {
            let opacity = match op {
                DrawOp::Image { opacity, .. } | DrawOp::Fill { opacity, .. } => *opacity,
                _ => continue,
            };
            if opacity < 1.0 && states.name(opacity).is_none() {
                let name = format!("GS{}", states.entries.len() + 1);
                states.entries.push((opacity, name, refs.next()));
            }
        }
        states
    }

    fn name(&self, opacity: f32) -> Option<&str> {
        self.entries
            .iter()
            .find(|(value, _, _)| (*value - opacity).abs() < f32::EPSILON)
            .map(|(_, name, _)| name.as_str())
    }
}

pub fn write_pdf(
    document: &LaidOutDocument,
    assets: &AssetSet,
    title: &str,
) -> Result<Vec<u8>, RenderError> {
    let mut refs = RefAllocator(0);
    let catalog_id = refs.next();
    let page_tree_id = refs.next();
    let info_id = refs.next();
    let font_ids: Vec<(Font, Ref)> =
        Font::ALL.into_iter().map(|font| (font, refs.next())).collect();
    let alpha_states = AlphaStates::collect(document, &mut refs);

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.document_info(info_id).title(TextStr(title)).producer(TextStr(PRODUCER));

    for (font, id) in &font_ids {
        pdf.type1_font(*id)
            .base_font(Name(font.base_name()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    for (opacity, _, id) in &alpha_states.entries {
        pdf.ext_graphics(*id).non_stroking_alpha(*opacity).stroking_alpha(*opacity);
    }

    let mut image_ids = Vec::new();
    for (role, asset) in assets.iter() {
        let id = refs.next();
        write_image(&mut pdf, &mut refs, id, asset)?;
        image_ids.push((role, id));
    }

    let page_ids: Vec<(Ref, Ref)> =
        document.pages.iter().map(|_| (refs.next(), refs.next())).collect();
    pdf.pages(page_tree_id)
        .kids(page_ids.iter().map(|(page_id, _)| *page_id))
        .count(page_ids.len() as i32);

    for (page, (page_id, content_id)) in document.pages.iter().zip(&page_ids) {
        let content = page_content(page, document.page_height, &alpha_states);
        pdf.stream(*content_id, &content);

        let mut writer = pdf.page(*page_id);
        writer
            .media_box(PdfRect::new(0.0, 0.0, document.page_width, document.page_height))
            .parent(page_tree_id)
            .contents(*content_id);

        let mut resources = writer.resources();
        let mut fonts = resources.fonts();
        for (font, id) in &font_ids {
            fonts.pair(Name(font.resource_name()), *id);
        }
        fonts.finish();

        if !alpha_states.entries.is_empty() {
            let mut states = resources.ext_g_states();
            for (_, name, id) in &alpha_states.entries {
                states.pair(Name(name.as_bytes()), *id);
            }
            states.finish();
        }

        if !image_ids.is_empty() {
            let mut objects = resources.x_objects();
            for (role, id) in &image_ids {
                objects.pair(Name(role.resource_name()), *id);
            }
            objects.finish();
        }

        resources.finish();
        writer.finish();
    }

    Ok(pdf.finish())
}

fn write_image(
    pdf: &mut Pdf,
    refs: &mut RefAllocator,
    id: Ref,
    asset: &ImageAsset,
) -> Result<(), RenderError> {
    let mask_id = match &asset.alpha {
        Some(alpha) => {
            let mask_id = refs.next();
            let data = deflate(alpha)?;
            let mut mask = pdf.image_xobject(mask_id, &data);
            mask.filter(Filter::FlateDecode);
            mask.width(asset.width as i32);
            mask.height(asset.height as i32);
            mask.color_space().device_gray();
            mask.bits_per_component(8);
            mask.finish();
            Some(mask_id)
        }
        None => None,
    };

    let data = deflate(&asset.rgb)?;
    let mut image = pdf.image_xobject(id, &data);
    image.filter(Filter::FlateDecode);
    image.width(asset.width as i32);
    image.height(asset.height as i32);
    image.color_space().device_rgb();
    image.bits_per_component(8);
    if let Some(mask_id) = mask_id {
        image.s_mask(mask_id);
    }
    image.finish();
    Ok(())
}

fn deflate(bytes: &[u8]) -> Result<Vec<u8>, RenderError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

fn page_content(page: &Page, page_height: f32, alpha_states: &AlphaStates) -> Vec<u8> {
    let mut content = Content::new();
    let flip = |y: f32, height: f32| page_height - y - height;

    for op in &page.ops {
        match op {
            DrawOp::Image { asset, rect, opacity } => {
                content.save_state();
                set_alpha(&mut content, alpha_states, *opacity);
                let bottom = flip(rect.y, rect.height);
                content.transform([rect.width, 0.0, 0.0, rect.height, rect.x, bottom]);
                content.x_object(Name(AssetRole::resource_name(*asset)));
                content.restore_state();
            }
            DrawOp::Fill { rect, color, opacity } => {
                content.save_state();
                set_alpha(&mut content, alpha_states, *opacity);
                set_fill(&mut content, *color);
                content.rect(rect.x, flip(rect.y, rect.height), rect.width, rect.height);
                content.fill_nonzero();
                content.restore_state();
            }
            DrawOp::Stroke { rect, color, width } => {
                set_stroke(&mut content, *color, *width);
                content.rect(rect.x, flip(rect.y, rect.height), rect.width, rect.height);
                content.stroke();
            }
            DrawOp::Line { x1, y1, x2, y2, color, width } => {
                set_stroke(&mut content, *color, *width);
                content.move_to(*x1, flip(*y1, 0.0));
                content.line_to(*x2, flip(*y2, 0.0));
                content.stroke();
            }
            DrawOp::Text { x, y, font, size, color, text } => {
                set_fill(&mut content, *color);
                content.begin_text();
                content.set_font(Name(font.resource_name()), *size);
                content.next_line(*x, flip(*y + ascender(*size), 0.0));
                content.show(Str(&encode_win_ansi(text)));
                content.end_text();
            }
        }
    }

    content.finish()
}

fn set_alpha(content: &mut Content, alpha_states: &AlphaStates, opacity: f32) {
    if let Some(name) = alpha_states.name(opacity) {
        content.set_parameters(Name(name.as_bytes()));
    }
}

fn set_fill(content: &mut Content, color: Rgb) {
    let (r, g, b) = color.components();
    content.set_fill_rgb(r, g, b);
}

fn set_stroke(content: &mut Content, color: Rgb, width: f32) {
    let (r, g, b) = color.components();
    content.set_stroke_rgb(r, g, b);
    content.set_line_width(width);
}
