//! End-to-end helpers working on `image` buffers and files.

use std::path::{Path, PathBuf};

use boxmark_coarse::CoarseStrategy;
use boxmark_core::{GrayImage, GrayImageView};
use boxmark_overlay::{
    OverlayConfig, OverlayError, OverlayIoError, OverlayPipeline, OverlayReport, OverlayResult,
};
use log::{info, warn};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the high-level facade helpers.
#[derive(thiserror::Error, Debug)]
pub enum MeasureError {
    #[error("failed to read image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: ::image::ImageError,
    },

    #[error("configuration lists no images")]
    NoImages,

    #[error("the detector strategy needs a detector and cannot run from a configuration file")]
    DetectorUnavailable,

    #[error(transparent)]
    Overlay(#[from] OverlayError),

    #[error(transparent)]
    Io(#[from] OverlayIoError),
}

/// Convert an `image::GrayImage` into the lightweight `boxmark-core` view type.
pub fn gray_view(img: &::image::GrayImage) -> GrayImageView<'_> {
    GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Copy a `boxmark-core` image into an `image::GrayImage`.
pub fn to_luma(img: &GrayImage) -> ::image::GrayImage {
    let view = img.view();
    ::image::GrayImage::from_fn(img.width as u32, img.height as u32, |x, y| {
        ::image::Luma([view.get(x as usize, y as usize)])
    })
}

/// Decode an image file and convert it to 8-bit grayscale.
pub fn load_gray(path: impl AsRef<Path>) -> Result<::image::GrayImage, MeasureError> {
    let path = path.as_ref();
    let img = ::image::open(path).map_err(|source| MeasureError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.to_luma8())
}

/// Measure the overlay of the mark in an `image::GrayImage`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(pipeline, img), fields(width = img.width(), height = img.height()))
)]
pub fn measure_image(
    pipeline: &OverlayPipeline,
    img: &::image::GrayImage,
) -> Result<OverlayResult, OverlayError> {
    pipeline.measure(&gray_view(img))
}

/// Resolve a path from a config file relative to the config's directory.
fn resolve(base: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

/// Build and initialize a pipeline from a configuration.
///
/// Relative paths in `cfg` are resolved against `base_dir`.
pub fn build_pipeline(cfg: &OverlayConfig, base_dir: &Path) -> Result<OverlayPipeline, MeasureError> {
    if cfg.params.coarse.strategy == CoarseStrategy::Detector {
        return Err(MeasureError::DetectorUnavailable);
    }
    cfg.params.fine.validate()?;
    let reference_path = cfg.reference_path().ok_or(MeasureError::NoImages)?;
    let reference = load_gray(resolve(base_dir, reference_path))?;

    let mut pipeline = OverlayPipeline::new(cfg.params);
    pipeline.initialize_template(&gray_view(&reference), cfg.template_roi)?;
    info!(
        "template ready from {reference_path} ({}x{})",
        reference.width(),
        reference.height()
    );
    Ok(pipeline)
}

/// Run every image of a configuration and collect the report.
///
/// Per-image failures are recorded in the report; only configuration,
/// template and decoding problems abort the run.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip(cfg)))]
pub fn run_config(cfg: &OverlayConfig, config_path: &Path) -> Result<OverlayReport, MeasureError> {
    if cfg.image_paths.is_empty() {
        return Err(MeasureError::NoImages);
    }
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let pipeline = build_pipeline(cfg, base_dir)?;

    let images = cfg
        .image_paths
        .iter()
        .map(|p| load_gray(resolve(base_dir, p)))
        .collect::<Result<Vec<_>, _>>()?;
    let views: Vec<GrayImageView<'_>> = images.iter().map(gray_view).collect();
    let outcomes = pipeline.measure_batch(&views);

    for (path, outcome) in cfg.image_paths.iter().zip(&outcomes) {
        match outcome {
            Ok(r) => info!(
                "{path}: overlay ({:.4}, {:.4}) px, ({:.5}, {:.5}) physical",
                r.error_px.x, r.error_px.y, r.error_physical.x, r.error_physical.y
            ),
            Err(e) => warn!("{path}: {e}"),
        }
    }

    let mut report = OverlayReport::new(cfg, config_path);
    report.set_results(&cfg.image_paths, &outcomes);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxmark_sim::render_mark;

    #[test]
    fn luma_round_trip_keeps_pixels() {
        let img = render_mark(64, 0.0, 0.0, 0.0, 0.0);
        let luma = to_luma(&img);
        let view = gray_view(&luma);
        assert_eq!((view.width, view.height), (64, 64));
        assert_eq!(view.data, img.data.as_slice());
    }

    #[test]
    fn detector_strategy_cannot_run_from_config() {
        let mut cfg: OverlayConfig =
            serde_json::from_str(r#"{"image_paths": ["a.png"]}"#).unwrap();
        cfg.params.coarse.strategy = CoarseStrategy::Detector;
        assert!(matches!(
            build_pipeline(&cfg, Path::new(".")),
            Err(MeasureError::DetectorUnavailable)
        ));
    }

    #[test]
    fn zero_width_roi_fails_before_loading_images() {
        let cfg: OverlayConfig = serde_json::from_str(
            r#"{"image_paths": ["does-not-exist.png"], "params": {"fine": {"roi_width": 0}}}"#,
        )
        .unwrap();
        assert!(matches!(
            build_pipeline(&cfg, Path::new("/nonexistent")),
            Err(MeasureError::Overlay(OverlayError::InvalidRoi { width: 0, .. }))
        ));
    }

    #[test]
    fn missing_image_is_reported_with_path() {
        let cfg: OverlayConfig =
            serde_json::from_str(r#"{"image_paths": ["does-not-exist.png"]}"#).unwrap();
        match build_pipeline(&cfg, Path::new("/nonexistent")) {
            Err(MeasureError::Image { path, .. }) => {
                assert!(path.ends_with("does-not-exist.png"))
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
