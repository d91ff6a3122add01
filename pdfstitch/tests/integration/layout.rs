//! Integration tests for page sizing and image placement.

use pdfstitch::config::{Orientation, PageLayout, PageSize, SessionOptions};
use rstest::rstest;

use crate::common::{first_transform, jpeg_file, page_sizes, pdf_file, png_file, run_merge};

const EPSILON: f32 = 0.01;

fn options(size: PageSize, orientation: Orientation) -> SessionOptions {
    SessionOptions {
        layout: PageLayout::new(size, orientation),
        ..Default::default()
    }
}

fn assert_close(actual: f32, expected: f32, what: &str) {
    assert!(
        (actual - expected).abs() < EPSILON,
        "{what}: expected {expected}, got {actual}"
    );
}

#[rstest]
#[case(400, 200)]
#[case(200, 400)]
#[case(300, 300)]
#[case(4000, 50)]
#[tokio::test]
async fn test_image_centered_and_uniform_on_a4(#[case] width: u32, #[case] height: u32) {
    let layout = options(PageSize::A4, Orientation::Portrait);
    let (page_w, page_h) = layout.layout.dimensions().unwrap();

    let (_, bytes) = run_merge(vec![jpeg_file("pic.jpg", width, height)], layout).await;

    let sizes = page_sizes(&bytes);
    assert_close(sizes[0].0, page_w, "page width");
    assert_close(sizes[0].1, page_h, "page height");

    let [drawn_w, b, c, drawn_h, x, y] = first_transform(&bytes, 0);
    assert_close(b, 0.0, "no skew");
    assert_close(c, 0.0, "no skew");

    // Same scale on both axes.
    assert_close(drawn_w / width as f32, drawn_h / height as f32, "uniform scale");

    // Centered on both axes.
    assert_close(x + drawn_w / 2.0, page_w / 2.0, "horizontal center");
    assert_close(y + drawn_h / 2.0, page_h / 2.0, "vertical center");

    // Fits, touching at least one pair of edges.
    assert!(drawn_w <= page_w + EPSILON && drawn_h <= page_h + EPSILON);
    assert!((drawn_w - page_w).abs() < EPSILON || (drawn_h - page_h).abs() < EPSILON);
}

#[rstest]
#[case(PageSize::A4, Orientation::Portrait, (595.28, 841.89))]
#[case(PageSize::A4, Orientation::Landscape, (841.89, 595.28))]
#[case(PageSize::Letter, Orientation::Portrait, (612.0, 792.0))]
#[case(PageSize::Letter, Orientation::Landscape, (792.0, 612.0))]
#[case(PageSize::Legal, Orientation::Portrait, (612.0, 1008.0))]
#[tokio::test]
async fn test_page_sizes(
    #[case] size: PageSize,
    #[case] orientation: Orientation,
    #[case] expected: (f32, f32),
) {
    let (_, bytes) = run_merge(vec![png_file("p.png", 10, 10)], options(size, orientation)).await;
    let (w, h) = page_sizes(&bytes)[0];
    assert!((w - expected.0).abs() < 0.05, "width {w}");
    assert!((h - expected.1).abs() < 0.05, "height {h}");
}

#[tokio::test]
async fn test_fit_to_image_uses_native_size() {
    let options = SessionOptions {
        layout: PageLayout::fit_to_image(),
        ..Default::default()
    };
    let files = vec![jpeg_file("a.jpg", 123, 77), png_file("b.png", 64, 200)];

    let (_, bytes) = run_merge(files, options).await;

    assert_eq!(page_sizes(&bytes), vec![(123.0, 77.0), (64.0, 200.0)]);
    let [w, _, _, h, x, y] = first_transform(&bytes, 0);
    assert_eq!((w, h, x, y), (123.0, 77.0, 0.0, 0.0));
}

#[tokio::test]
async fn test_fit_to_image_keeps_pdf_size() {
    let options = SessionOptions {
        layout: PageLayout::fit_to_image(),
        ..Default::default()
    };
    let (_, bytes) = run_merge(vec![pdf_file("letter.pdf", 2)], options).await;
    assert_eq!(page_sizes(&bytes), vec![(612.0, 792.0), (612.0, 792.0)]);
}

#[tokio::test]
async fn test_pdf_pages_refitted_to_layout() {
    let layout = options(PageSize::A4, Orientation::Portrait);
    let (page_w, page_h) = layout.layout.dimensions().unwrap();

    let (_, bytes) = run_merge(vec![pdf_file("letter.pdf", 1)], layout).await;

    let (w, h) = page_sizes(&bytes)[0];
    assert_close(w, page_w, "page width");
    assert_close(h, page_h, "page height");

    // Letter content scaled uniformly and centered vertically.
    let [a, _, _, d, tx, ty] = first_transform(&bytes, 0);
    let scale = page_w / 612.0;
    assert_close(a, scale, "scale x");
    assert_close(d, scale, "scale y");
    assert_close(tx, 0.0, "offset x");
    assert_close(ty, (page_h - 792.0 * scale) / 2.0, "offset y");
}
