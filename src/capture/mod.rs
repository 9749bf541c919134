//! # Frame Capture and Export
//!
//! Flattens one rendered frame into a raster image: the 3D pass is rendered
//! offscreen on an opaque white background, the overlay labels are stamped
//! into the pixels (they live in a separate visual layer and are not part of
//! the 3D raster), and the result is written as a PNG or embedded into a
//! single-page PDF sized to the image's aspect ratio.
//!
//! Capture waits for the growth animation to settle first, by polling the
//! session's settled predicate under a fixed deadline, so exports never
//! sample a mid-animation frame.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::Local;
use image::{Rgb, RgbImage};
use log::{info, warn};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::error::ChartError;
use crate::gfx::scene::SceneSession;
use crate::overlay::{self, Label, LabelKind};

/// Default offscreen capture size when the caller has no live surface to
/// match.
pub const DEFAULT_CAPTURE_SIZE: (u32, u32) = (1600, 900);

/// Upper bound on the simulated settle time before capturing anyway.
pub const SETTLE_DEADLINE: f32 = 1.0;

/// Resolution exports are rated at; also sizes the PDF page.
const EXPORT_DPI: f32 = 150.0;

const SETTLE_STEP: f32 = 1.0 / 60.0;
const TITLE_FONT_SIZE: i32 = 34;
const TITLE_MARGIN: i32 = 18;

/// Output container for an exported frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Standalone raster image.
    Png,
    /// The same raster embedded in a single-page document.
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Pdf => "pdf",
        }
    }
}

/// Advances the session until every bar has finished growing, or until the
/// settle deadline elapses.
///
/// Runs on simulated frames rather than wall-clock sleeps, so the render
/// loop is never blocked and the result is deterministic.
pub fn settle(session: &mut SceneSession) {
    let mut elapsed = 0.0;
    while !session.is_settled() && elapsed < SETTLE_DEADLINE {
        session.advance(SETTLE_STEP);
        elapsed += SETTLE_STEP;
    }
    if !session.is_settled() {
        warn!("capture settle deadline reached with animation still in flight");
    }
}

/// Renders the session offscreen and composites the overlay labels into the
/// returned image.
///
/// # Errors
/// [`ChartError::CaptureUnavailable`] when the session has no renderable
/// surface, plus readback/compositing failures from downstream.
pub fn capture_frame(
    session: &mut SceneSession,
    width: u32,
    height: u32,
) -> Result<RgbImage, ChartError> {
    settle(session);

    let pixels = session.render_offscreen(width, height)?;
    let mut image = flatten_to_white(&pixels, width, height);

    let view_proj = session.view_projection_at(width, height);
    let labels = overlay::layout_labels(session, &view_proj, (width as f32, height as f32));
    stamp_labels(&mut image, &labels, &session.config().title)?;

    Ok(image)
}

/// Captures the current frame and writes it next to `dir`, named from the
/// chart title and a timestamp. Returns the written path.
///
/// # Errors
/// [`ChartError::CaptureUnavailable`] when nothing is mounted; no file is
/// produced in that case.
pub fn export_frame(
    session: &mut SceneSession,
    dir: &Path,
    format: ExportFormat,
    (width, height): (u32, u32),
) -> Result<PathBuf, ChartError> {
    if !session.is_mounted() {
        return Err(ChartError::CaptureUnavailable);
    }

    let image = capture_frame(session, width, height)?;
    let title = session.config().title.clone();
    let path = dir.join(export_file_name(&title, format));
    match format {
        ExportFormat::Png => write_png(&image, &path)?,
        ExportFormat::Pdf => write_pdf(&image, &title, &path)?,
    }
    info!("exported chart frame to {}", path.display());
    Ok(path)
}

/// Writes the captured image as a PNG file.
pub fn write_png(image: &RgbImage, path: &Path) -> Result<(), ChartError> {
    image.save(path)?;
    Ok(())
}

/// Embeds the captured image into a single-page PDF whose page matches the
/// image's aspect ratio at the export DPI.
pub fn write_pdf(image: &RgbImage, title: &str, path: &Path) -> Result<(), ChartError> {
    use printpdf::{
        ColorBits, ColorSpace, ImageTransform, ImageXObject, Mm, PdfDocument, Px,
    };

    let (width, height) = image.dimensions();
    let doc_title = if title.is_empty() { "chart" } else { title };
    let (doc, page, layer) = PdfDocument::new(
        doc_title,
        Mm(px_to_mm(width)),
        Mm(px_to_mm(height)),
        "chart",
    );

    let pdf_image = printpdf::Image::from(ImageXObject {
        width: Px(width as usize),
        height: Px(height as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: image.as_raw().clone(),
        image_filter: None,
        smask: None,
        clipping_bbox: None,
    });
    pdf_image.add_to_layer(
        doc.get_page(page).get_layer(layer),
        ImageTransform {
            dpi: Some(EXPORT_DPI),
            ..Default::default()
        },
    );

    let file = File::create(path)?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|err| ChartError::DocumentWrite(err.to_string()))?;
    Ok(())
}

/// File name for an export: sanitized title, timestamp, extension.
pub fn export_file_name(title: &str, format: ExportFormat) -> String {
    let stem = sanitize_title(title);
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    format!("{stem}_{timestamp}.{}", format.extension())
}

fn px_to_mm(px: u32) -> f32 {
    px as f32 / EXPORT_DPI * 25.4
}

fn sanitize_title(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "chart".to_owned()
    } else {
        stem.to_owned()
    }
}

/// Converts tightly packed RGBA rows into an RGB image blended onto opaque
/// white, the background exports are defined against.
fn flatten_to_white(pixels: &[u8], width: u32, height: u32) -> RgbImage {
    let mut image = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    for (i, chunk) in pixels.chunks_exact(4).enumerate() {
        let x = i as u32 % width;
        let y = i as u32 / width;
        if y >= height {
            break;
        }
        let alpha = chunk[3] as f32 / 255.0;
        let blend =
            |c: u8| ((c as f32) * alpha + 255.0 * (1.0 - alpha)).round().clamp(0.0, 255.0) as u8;
        image.put_pixel(x, y, Rgb([blend(chunk[0]), blend(chunk[1]), blend(chunk[2])]));
    }
    image
}

/// Stamps the laid-out overlay labels and the chart title into the pixels.
fn stamp_labels(image: &mut RgbImage, labels: &[Label], title: &str) -> Result<(), ChartError> {
    let (width, height) = image.dimensions();
    let root = BitMapBackend::with_buffer(&mut **image, (width, height)).into_drawing_area();

    for label in labels {
        let style = label_text_style(label);
        root.draw_text(
            &label.text,
            &style,
            (label.position[0] as i32, label.position[1] as i32),
        )
        .map_err(|err| ChartError::Composite(err.to_string()))?;
    }

    if !title.is_empty() {
        let style = TextStyle::from(("sans-serif", TITLE_FONT_SIZE))
            .color(&RGBColor(30, 33, 40))
            .pos(Pos::new(HPos::Center, VPos::Top));
        root.draw_text(title, &style, (width as i32 / 2, TITLE_MARGIN))
            .map_err(|err| ChartError::Composite(err.to_string()))?;
    }

    root.present()
        .map_err(|err| ChartError::Composite(err.to_string()))?;
    Ok(())
}

fn label_text_style(label: &Label) -> TextStyle<'static> {
    let [r, g, b, alpha] = overlay::label_color(label);
    // Faded labels blend toward the white background instead of using alpha,
    // which the stamping backend has no channel for.
    let toward_white = |c: f32| ((c * alpha + (1.0 - alpha)) * 255.0).round() as u8;
    let color = RGBColor(toward_white(r), toward_white(g), toward_white(b));
    let size: i32 = match label.kind {
        LabelKind::Category | LabelKind::Value => 18,
        LabelKind::AxisTitle => 22,
    };
    // `TextStyle::color` borrows its argument for the style's lifetime, which
    // would tie the returned style to the local `color`; the stored field is
    // owned, so set it directly instead.
    let mut style =
        TextStyle::from(("sans-serif", size)).pos(Pos::new(HPos::Center, VPos::Center));
    style.color = color.to_backend_color();
    style
}
