use std::io::Cursor;
use std::path::Path;

use chrono::NaiveDate;
use cotiza_core::dates::default_offset;
use cotiza_core::{QuoteParser, QuoteSession};
use cotiza_render::{
    render, render_to_file, Brand, QuoteRenderer, RenderError, RenderItem, RenderJob, RenderQuote,
};
use image::{ImageFormat, Rgba, RgbaImage};
use rust_decimal::Decimal;
use tempfile::TempDir;

fn quote() -> RenderQuote {
    RenderQuote {
        client_name: "Acme".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 1, 15).expect("date"),
        description: String::new(),
        items: vec![RenderItem {
            quantity: Decimal::new(2, 0),
            description: "Banner".to_string(),
            amount: Decimal::new(300, 0),
        }],
        explicit_total: None,
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

fn write_png(path: &Path) {
    let image = RgbaImage::from_pixel(8, 4, Rgba([200, 30, 30, 255]));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png).expect("encode png");
    std::fs::write(path, bytes.into_inner()).expect("write png");
}

#[tokio::test]
async fn missing_assets_still_render() {
    let job = RenderJob::for_brand(Brand::EcoRural, Path::new("/nonexistent/assets"));

    let bytes = render(&quote(), &job).await.expect("render");

    assert!(bytes.starts_with(b"%PDF-"));
    assert!(!contains(&bytes, b"/XObject"));
}

#[tokio::test]
async fn present_assets_are_embedded() {
    let dir = TempDir::new().expect("temp dir");
    write_png(&dir.path().join("publicom-logo.png"));
    write_png(&dir.path().join("publicom-p-transparent.png"));
    let job = RenderJob::for_brand(Brand::Publicom, dir.path());

    let bytes = render(&quote(), &job).await.expect("render");

    assert!(contains(&bytes, b"/Im1 Do"));
    assert!(contains(&bytes, b"/Im2 Do"));
    assert!(!contains(&bytes, b"/Im3 Do"));
    assert!(contains(&bytes, b"/ExtGState"));
}

#[tokio::test]
async fn render_to_file_writes_into_new_directories() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("nested").join("quote.pdf");
    let job = RenderJob::for_brand(Brand::Publicom, dir.path());

    render_to_file(&quote(), &job, &path).await.expect("render to file");

    let bytes = std::fs::read(&path).expect("read pdf");
    assert!(bytes.starts_with(b"%PDF-"));
    let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("nested"))
        .expect("read dir")
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn uncreatable_output_directory_is_an_error() {
    let dir = TempDir::new().expect("temp dir");
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"file").expect("write blocker");
    let job = RenderJob::for_brand(Brand::Publicom, dir.path());

    let error = render_to_file(&quote(), &job, &blocker.join("sub").join("quote.pdf"))
        .await
        .expect_err("directory under a file");

    assert!(matches!(error, RenderError::CreateDir { .. }), "{error:?}");
}

#[tokio::test]
async fn parsed_text_renders_through_the_session_entry_point() {
    let dir = TempDir::new().expect("temp dir");
    let parsed = QuoteParser::default()
        .with_today(NaiveDate::from_ymd_opt(2024, 5, 2).expect("date"))
        .parse("Cliente: Acme\nItems:\n2;Banner;300\n1 x Roll up @ 150\nTotal: 450");
    let session = QuoteSession::from_quote(&parsed);
    let renderer = QuoteRenderer::new(dir.path().join("out"), default_offset());
    let job = RenderJob::for_brand(Brand::EcoRural, dir.path());

    let path = renderer.render_session("chat-7", &session, &job).await.expect("render session");

    assert!(path.starts_with(dir.path().join("out")));
    let bytes = std::fs::read(&path).expect("read pdf");
    assert!(contains(&bytes, b"(Bs 450.00)"));
    assert!(contains(&bytes, b"(ACME)"));
}
