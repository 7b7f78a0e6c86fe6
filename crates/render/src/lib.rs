pub mod assets;
pub mod error;
pub mod input;
pub mod job;
pub mod layout;
pub mod metrics;
pub mod output;
pub mod pdf;

pub use assets::{AssetRole, AssetSet, ImageAsset};
pub use error::RenderError;
pub use input::{RenderItem, RenderQuote};
pub use job::{AssetPaths, Brand, Column, ColumnKey, PageGeometry, RenderJob};
pub use layout::{layout_document, DrawOp, LaidOutDocument, Page, RowPlacement};
pub use output::{render, render_to_file, QuoteRenderer};
