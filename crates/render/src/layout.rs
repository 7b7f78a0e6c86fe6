//! Paginated table layout.
//!
//! Produces a display list in page coordinates (origin top-left, y grows
//! downwards). Nothing here touches the PDF encoder, which keeps pagination
//! testable without parsing PDF output.

use cotiza_core::dates::format_long_date;
use cotiza_core::money::{format_money, format_quantity, round_cents};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::assets::{AssetRole, AssetSet};
use crate::input::{RenderItem, RenderQuote};
use crate::job::{Align, Column, ColumnKey, RenderJob, Rgb};
use crate::metrics::{aligned_x, line_height, text_height, wrap_text, Font};

pub const BODY_SIZE: f32 = 10.0;
pub const TITLE_SIZE: f32 = 18.0;
pub const HEADER_HEIGHT: f32 = 26.0;
pub const ROW_PADDING: f32 = 8.0;
pub const MIN_ROW_HEIGHT: f32 = 22.0;
pub const CELL_INSET: f32 = 10.0;
pub const TOTAL_ROW_HEIGHT: f32 = 28.0;

const FIELD_ADVANCE: f32 = 18.0;
const FIELDS_TOP: f32 = 80.0;
const DISCLAIMER_GAP: f32 = 6.0;
const TABLE_GAP: f32 = 28.0;
const ROW_RESERVE: f32 = 10.0;
const TOTAL_RESERVE: f32 = 54.0;
const LABEL_DROP: f32 = 7.0;
const STROKE_WIDTH: f32 = 0.5;

const WATERMARK_WIDTH: f32 = 460.0;
const WATERMARK_ASPECT: f32 = 0.45;
const WATERMARK_SHIFT: f32 = 50.0;
const WATERMARK_OPACITY: f32 = 0.06;
const ZEBRA_OPACITY: f32 = 0.04;

const TEXT_COLOR: Rgb = Rgb::hex(0x111827);
const DISCLAIMER_COLOR: Rgb = Rgb::hex(0x374151);
const HEADER_FILL: Rgb = Rgb::hex(0xf3f4f6);
const ZEBRA_FILL: Rgb = Rgb::hex(0x6b7280);
const TOTAL_FILL: Rgb = Rgb::hex(0xfde68a);

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Image { asset: AssetRole, rect: Rect, opacity: f32 },
    Fill { rect: Rect, color: Rgb, opacity: f32 },
    Stroke { rect: Rect, color: Rgb, width: f32 },
    Line { x1: f32, y1: f32, x2: f32, y2: f32, color: Rgb, width: f32 },
    /// `y` is the top of the line box, not the baseline.
    Text { x: f32, y: f32, font: Font, size: f32, color: Rgb, text: String },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// Text runs in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|text| text.contains(needle))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RowPlacement {
    pub page: usize,
    pub y: f32,
    pub height: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LaidOutDocument {
    pub page_width: f32,
    pub page_height: f32,
    pub pages: Vec<Page>,
    pub rows: Vec<RowPlacement>,
    pub total: Decimal,
}

/// Cursor, page index and the subtotal carried across page breaks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutState {
    pub y: f32,
    pub page_index: usize,
    pub running_subtotal: Decimal,
}

impl LayoutState {
    fn first_page(top: f32) -> Self {
        Self { y: top, page_index: 0, running_subtotal: Decimal::ZERO }
    }

    fn next_page(&mut self, top: f32) {
        self.y = top;
        self.page_index += 1;
    }
}

/// Shared height of a table row: the tallest wrapped cell plus padding,
/// never below the minimum row height.
pub fn row_height(job: &RenderJob, cells: &[(&Column, String)]) -> f32 {
    cells
        .iter()
        .map(|(column, text)| {
            let inner = job.column_width(column) - 2.0 * CELL_INSET;
            let height = text_height(text, column.font, BODY_SIZE, inner);
            (height + 2.0 * ROW_PADDING).max(MIN_ROW_HEIGHT)
        })
        .fold(MIN_ROW_HEIGHT, f32::max)
}

pub fn layout_document(quote: &RenderQuote, job: &RenderJob, assets: &AssetSet) -> LaidOutDocument {
    let mut layout = Layout {
        job,
        assets,
        pages: vec![Page::default()],
        rows: Vec::with_capacity(quote.items.len()),
        state: LayoutState::first_page(job.geometry.first_page_top),
    };

    layout.first_page_chrome();
    layout.fields(quote);
    layout.disclaimer();
    layout.table_header();

    for item in &quote.items {
        layout.item_row(item);
    }

    let total = round_cents(quote.explicit_total.unwrap_or(layout.state.running_subtotal));
    layout.total_row(total);

    debug!(
        event_name = "render.layout.completed",
        pages = layout.pages.len(),
        rows = layout.rows.len(),
        total = %total,
        "document laid out"
    );

    LaidOutDocument {
        page_width: job.geometry.width,
        page_height: job.geometry.height,
        pages: layout.pages,
        rows: layout.rows,
        total,
    }
}

struct Layout<'a> {
    job: &'a RenderJob,
    assets: &'a AssetSet,
    pages: Vec<Page>,
    rows: Vec<RowPlacement>,
    state: LayoutState,
}

impl Layout<'_> {
    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn text(&mut self, x: f32, y: f32, font: Font, color: Rgb, text: impl Into<String>) {
        self.push(DrawOp::Text { x, y, font, size: BODY_SIZE, color, text: text.into() });
    }

    /// Wraps `text` into a box and emits one run per line.
    #[allow(clippy::too_many_arguments)]
    fn text_box(
        &mut self,
        text: &str,
        font: Font,
        color: Rgb,
        x: f32,
        y: f32,
        width: f32,
        align: Align,
    ) {
        let step = line_height(BODY_SIZE);
        for (index, line) in wrap_text(text, font, BODY_SIZE, width).into_iter().enumerate() {
            let line_x = aligned_x(align, x, width, font.text_width(&line, BODY_SIZE));
            self.text(line_x, y + index as f32 * step, font, color, line);
        }
    }

    fn image(&mut self, role: AssetRole, x: f32, y: f32, width: f32, opacity: f32) {
        let Some(asset) = self.assets.get(role) else {
            return;
        };
        let rect = Rect::new(x, y, width, asset.scaled_height(width));
        self.push(DrawOp::Image { asset: role, rect, opacity });
    }

    fn watermark(&mut self) {
        let geometry = self.job.geometry;
        let x = (geometry.width - WATERMARK_WIDTH) / 2.0;
        let y = (geometry.height - WATERMARK_WIDTH * WATERMARK_ASPECT) / 2.0 - WATERMARK_SHIFT;
        self.image(AssetRole::Watermark, x, y, WATERMARK_WIDTH, WATERMARK_OPACITY);
    }

    fn logo(&mut self, width: f32) {
        let geometry = self.job.geometry;
        let x = geometry.width - geometry.margin - width;
        self.image(AssetRole::Logo, x, geometry.first_page_top, width, 1.0);
    }

    fn first_page_chrome(&mut self) {
        let geometry = self.job.geometry;
        self.watermark();
        self.logo(self.job.logo_width);
        self.image(
            AssetRole::SecondaryLogo,
            geometry.margin,
            geometry.first_page_top,
            self.job.secondary_logo_width,
            1.0,
        );
        self.push(DrawOp::Text {
            x: geometry.margin,
            y: self.state.y + self.job.title_offset,
            font: Font::Bold,
            size: TITLE_SIZE,
            color: Rgb::BLACK,
            text: self.job.title.clone(),
        });
        self.state.y = FIELDS_TOP + self.job.title_offset;
    }

    /// Bold label followed by a regular value; continuation lines of a long
    /// value stay aligned with its first line.
    fn field(&mut self, label: &str, value: &str) {
        let geometry = self.job.geometry;
        let label = format!("{label}: ");
        let label_width = Font::Bold.text_width(&label, BODY_SIZE);
        let y = self.state.y;
        self.text(geometry.margin, y, Font::Bold, TEXT_COLOR, label);

        let value_x = geometry.margin + label_width;
        let value_width = geometry.usable_width() - label_width;
        let lines = wrap_text(value, Font::Regular, BODY_SIZE, value_width);
        let extra = lines.len().saturating_sub(1) as f32 * line_height(BODY_SIZE);
        self.text_box(value, Font::Regular, TEXT_COLOR, value_x, y, value_width, Align::Left);
        self.state.y += FIELD_ADVANCE + extra;
    }

    fn fields(&mut self, quote: &RenderQuote) {
        let client = quote.client_name.trim();
        let client = if client.is_empty() { "—".to_string() } else { client.to_uppercase() };
        self.field("EMPRESA", &client);
        self.field("FECHA", &format_long_date(quote.date));

        let description = quote.description.trim();
        if !description.is_empty() {
            self.field("DESCRIPCIÓN", &description.to_uppercase());
        }
    }

    fn disclaimer(&mut self) {
        let geometry = self.job.geometry;
        self.state.y += DISCLAIMER_GAP;
        let width = geometry.usable_width();
        let height = text_height(&self.job.disclaimer, Font::Oblique, BODY_SIZE, width);
        let y = self.state.y;
        let disclaimer = self.job.disclaimer.clone();
        self.text_box(
            &disclaimer,
            Font::Oblique,
            DISCLAIMER_COLOR,
            geometry.margin,
            y,
            width,
            Align::Left,
        );
        self.state.y = y + height + TABLE_GAP;
    }

    fn table_header(&mut self) {
        let job = self.job;
        let x0 = job.geometry.margin;
        let y = self.state.y;
        self.push(DrawOp::Fill {
            rect: Rect::new(x0, y, job.table_width(), HEADER_HEIGHT),
            color: HEADER_FILL,
            opacity: 1.0,
        });

        let mut x = x0;
        for column in &job.columns {
            let width = job.column_width(column);
            self.text_box(
                &column.label,
                Font::Bold,
                TEXT_COLOR,
                x + CELL_INSET,
                y + LABEL_DROP,
                width - 2.0 * CELL_INSET,
                Align::Center,
            );
            x += width;
        }
        self.cell_borders(y, HEADER_HEIGHT);
        self.state.y += HEADER_HEIGHT;
    }

    fn cell_borders(&mut self, y: f32, height: f32) {
        let job = self.job;
        let mut x = job.geometry.margin;
        for column in &job.columns {
            let width = job.column_width(column);
            self.push(DrawOp::Stroke {
                rect: Rect::new(x, y, width, height),
                color: Rgb::BLACK,
                width: STROKE_WIDTH,
            });
            x += width;
        }
    }

    /// Starts a new page when `needed` points would cross the bottom limit.
    /// Continuation pages repeat the watermark, the logo and the table header.
    fn ensure_space(&mut self, needed: f32) {
        let geometry = self.job.geometry;
        if self.state.y + needed <= geometry.bottom_limit() {
            return;
        }

        self.pages.push(Page::default());
        self.state.next_page(geometry.continuation_top);
        debug!(
            event_name = "render.page.break",
            page = self.state.page_index + 1,
            needed,
            "starting continuation page"
        );

        self.watermark();
        self.logo(self.job.continuation_logo_width);
        self.table_header();
    }

    fn item_row(&mut self, item: &RenderItem) {
        let job = self.job;
        let cells: Vec<(&Column, String)> =
            job.columns.iter().map(|column| (column, cell_text(column.key, item))).collect();
        let height = row_height(job, &cells);

        self.state.running_subtotal = self.state.running_subtotal.saturating_add(item.amount);
        self.ensure_space(height + ROW_RESERVE);

        let y = self.state.y;
        self.push(DrawOp::Fill {
            rect: Rect::new(job.geometry.margin, y, job.table_width(), height),
            color: ZEBRA_FILL,
            opacity: ZEBRA_OPACITY,
        });
        self.cell_borders(y, height);

        let mut x = job.geometry.margin;
        for (column, text) in &cells {
            let width = job.column_width(column);
            self.text_box(
                text,
                column.font,
                TEXT_COLOR,
                x + CELL_INSET,
                y + ROW_PADDING,
                width - 2.0 * CELL_INSET,
                column.align,
            );
            x += width;
        }

        self.rows.push(RowPlacement { page: self.state.page_index, y, height });
        self.state.y += height;
    }

    fn total_row(&mut self, total: Decimal) {
        self.ensure_space(TOTAL_RESERVE);

        let job = self.job;
        let x0 = job.geometry.margin;
        let y = self.state.y;
        let table_width = job.table_width();
        let amount_width = job.columns.last().map(|column| job.column_width(column)).unwrap_or(0.0);
        let label_width = table_width - amount_width;

        self.push(DrawOp::Line {
            x1: x0,
            y1: y,
            x2: x0 + table_width,
            y2: y,
            color: Rgb::BLACK,
            width: STROKE_WIDTH,
        });
        self.push(DrawOp::Stroke {
            rect: Rect::new(x0, y, label_width, TOTAL_ROW_HEIGHT),
            color: Rgb::BLACK,
            width: STROKE_WIDTH,
        });
        self.text_box(
            "TOTAL (Bs)",
            Font::Bold,
            TEXT_COLOR,
            x0,
            y + LABEL_DROP,
            label_width,
            Align::Center,
        );

        let amount_rect = Rect::new(x0 + label_width, y, amount_width, TOTAL_ROW_HEIGHT);
        self.push(DrawOp::Fill { rect: amount_rect, color: TOTAL_FILL, opacity: 1.0 });
        self.push(DrawOp::Stroke { rect: amount_rect, color: Rgb::BLACK, width: STROKE_WIDTH });
        self.text_box(
            &format!("Bs {}", format_money(total)),
            Font::Bold,
            TEXT_COLOR,
            amount_rect.x,
            y + LABEL_DROP,
            amount_width,
            Align::Center,
        );

        self.state.y += TOTAL_ROW_HEIGHT;
    }
}

fn cell_text(key: ColumnKey, item: &RenderItem) -> String {
    match key {
        ColumnKey::Quantity => format_quantity(item.quantity),
        ColumnKey::Description => item.description.clone(),
        ColumnKey::Amount => format_money(item.amount),
    }
}
