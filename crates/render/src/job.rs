//! Brand-specific render configuration.
//!
//! A [`RenderJob`] is supplied by the caller and never derived from the quote:
//! page geometry, asset locations, table columns and the few offsets that
//! differ between brands.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::metrics::Font;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Brand {
    Publicom,
    EcoRural,
}

impl Brand {
    /// Upper-case tag used in file names and spreadsheet rows.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Publicom => "PUBLICOM",
            Self::EcoRural => "ECORURAL",
        }
    }

    /// Lower-case prefix for files written to disk.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Publicom => "publicom",
            Self::EcoRural => "eco",
        }
    }
}

impl std::str::FromStr for Brand {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "publicom" => Ok(Self::Publicom),
            "ecorural" | "eco" => Ok(Self::EcoRural),
            other => Err(format!("unsupported brand `{other}` (expected publicom|eco-rural)")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    pub const fn hex(value: u32) -> Self {
        Self((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    pub fn components(self) -> (f32, f32, f32) {
        (f32::from(self.0) / 255.0, f32::from(self.1) / 255.0, f32::from(self.2) / 255.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKey {
    Quantity,
    Description,
    Amount,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub key: ColumnKey,
    pub label: String,
    /// Share of the usable page width.
    pub width_ratio: f32,
    pub align: Align,
    pub font: Font,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    /// Cursor where chrome starts on the first page.
    pub first_page_top: f32,
    /// Cursor where the repeated table header starts on later pages.
    pub continuation_top: f32,
    /// Distance from the page bottom that rows must not cross.
    pub bottom_reserve: f32,
}

impl PageGeometry {
    pub const A4: PageGeometry = PageGeometry {
        width: 595.28,
        height: 841.89,
        margin: 36.0,
        first_page_top: 28.0,
        continuation_top: 42.0,
        bottom_reserve: 64.0,
    };

    pub fn usable_width(&self) -> f32 {
        self.width - self.margin * 2.0
    }

    pub fn bottom_limit(&self) -> f32 {
        self.height - self.bottom_reserve
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPaths {
    pub watermark: Option<PathBuf>,
    pub logo: Option<PathBuf>,
    pub secondary_logo: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderJob {
    pub brand: Brand,
    pub geometry: PageGeometry,
    pub assets: AssetPaths,
    pub columns: Vec<Column>,
    pub title: String,
    /// Distance from the first-page top to the title baseline box.
    pub title_offset: f32,
    pub logo_width: f32,
    pub continuation_logo_width: f32,
    pub secondary_logo_width: f32,
    pub disclaimer: String,
}

const DISCLAIMER: &str = "“Para su consideración, remitimos la presente cotización con el detalle de los servicios solicitados.”";

impl RenderJob {
    pub fn for_brand(brand: Brand, assets_dir: &Path) -> Self {
        match brand {
            Brand::Publicom => Self::publicom(assets_dir),
            Brand::EcoRural => Self::eco_rural(assets_dir),
        }
    }

    pub fn publicom(assets_dir: &Path) -> Self {
        Self {
            brand: Brand::Publicom,
            geometry: PageGeometry::A4,
            assets: AssetPaths {
                watermark: Some(assets_dir.join("publicom-p-transparent.png")),
                logo: Some(assets_dir.join("publicom-logo.png")),
                secondary_logo: None,
            },
            columns: default_columns(),
            title: "COTIZACIÓN".to_string(),
            title_offset: 24.0,
            logo_width: 120.0,
            continuation_logo_width: 100.0,
            secondary_logo_width: 60.0,
            disclaimer: DISCLAIMER.to_string(),
        }
    }

    /// Publicom layout plus a small secondary logo above the title, which is
    /// pushed further down to clear it.
    pub fn eco_rural(assets_dir: &Path) -> Self {
        Self {
            brand: Brand::EcoRural,
            assets: AssetPaths {
                secondary_logo: Some(assets_dir.join("logo-c.png")),
                ..Self::publicom(assets_dir).assets
            },
            title_offset: 72.0,
            ..Self::publicom(assets_dir)
        }
    }

    /// Same layout with every asset removed.
    pub fn without_assets(mut self) -> Self {
        self.assets = AssetPaths::default();
        self
    }

    pub fn table_width(&self) -> f32 {
        self.columns.iter().map(|column| self.column_width(column)).sum()
    }

    pub fn column_width(&self, column: &Column) -> f32 {
        self.geometry.usable_width() * column.width_ratio
    }
}

fn default_columns() -> Vec<Column> {
    vec![
        Column {
            key: ColumnKey::Quantity,
            label: "CANTIDAD".to_string(),
            width_ratio: 0.18,
            align: Align::Center,
            font: Font::Regular,
        },
        Column {
            key: ColumnKey::Description,
            label: "DESCRIPCIÓN".to_string(),
            width_ratio: 0.56,
            align: Align::Left,
            font: Font::Bold,
        },
        Column {
            key: ColumnKey::Amount,
            label: "SUBTOTAL (Bs)".to_string(),
            width_ratio: 0.26,
            align: Align::Center,
            font: Font::Regular,
        },
    ]
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{Brand, RenderJob, Rgb};

    #[test]
    fn eco_rural_adds_secondary_logo_and_lowers_title() {
        let publicom = RenderJob::publicom(Path::new("public"));
        let eco = RenderJob::eco_rural(Path::new("public"));

        assert!(publicom.assets.secondary_logo.is_none());
        assert_eq!(eco.assets.secondary_logo.as_deref(), Some(Path::new("public/logo-c.png")));
        assert_eq!(eco.assets.logo, publicom.assets.logo);
        assert!(eco.title_offset > publicom.title_offset);
    }

    #[test]
    fn columns_span_the_usable_width() {
        let job = RenderJob::publicom(Path::new("public"));
        assert!((job.table_width() - job.geometry.usable_width()).abs() < 0.01);
    }

    #[test]
    fn brands_parse_from_cli_spellings() {
        assert_eq!("publicom".parse::<Brand>(), Ok(Brand::Publicom));
        assert_eq!("eco-rural".parse::<Brand>(), Ok(Brand::EcoRural));
        assert_eq!("ECORURAL".parse::<Brand>(), Ok(Brand::EcoRural));
        assert!("acme".parse::<Brand>().is_err());
    }

    #[test]
    fn hex_colors_split_into_channels() {
        assert_eq!(Rgb::hex(0xfde68a), Rgb(0xfd, 0xe6, 0x8a));
    }
}
