use boxmark_coarse::{
    BoxDetector, CoarseError, CoarseLocator, CoarseParams, CoarseStrategy, Detection,
    TemplateMismatch,
};
use boxmark_core::{Axis, AxisEdges, CoarseEdges, GrayImage, GrayImageView, Rect};
use boxmark_sim::{MarkParams, MarkRenderer, Scene};
use nalgebra::Vector2;

fn reference() -> GrayImage {
    MarkRenderer::default().render(&Scene::default()).image
}

fn noisy(shift: (f64, f64)) -> boxmark_sim::SyntheticMark {
    MarkRenderer::new(MarkParams {
        salt_pepper: 0.002,
        ..MarkParams::default()
    })
    .render(&Scene {
        shift: Vector2::new(shift.0, shift.1),
        noise: 0.1,
        ..Scene::default()
    })
}

fn axis_tuple(e: &AxisEdges<i32>) -> (i32, i32, i32, i32) {
    (e.outer_start, e.inner_start, e.inner_end, e.outer_end)
}

fn template_roi() -> Rect {
    Rect::centered(320, 320, 240, 240)
}

#[test]
fn correlation_finds_centered_mark() {
    let mut locator = CoarseLocator::new(CoarseParams::default());
    assert!(!locator.is_ready());
    locator
        .initialize(&reference().view(), Some(template_roi()))
        .expect("template");
    assert!(locator.is_ready());

    let target = noisy((0.5, 0.5));
    let edges = locator.locate(&target.image.view()).expect("coarse edges");
    assert_eq!(axis_tuple(&edges.x), (220, 270, 370, 420));
    assert_eq!(axis_tuple(&edges.y), (220, 270, 370, 420));
}

#[test]
fn correlation_follows_translated_mark() {
    let mut locator = CoarseLocator::new(CoarseParams::default());
    locator
        .initialize(&reference().view(), Some(template_roi()))
        .expect("template");

    let full = noisy((0.0, 0.0)).image;
    let moved = full.view().crop(Rect::new(13, 27, 600, 600)).expect("crop");
    let edges = locator.locate(&moved.view()).expect("coarse edges");
    assert_eq!(axis_tuple(&edges.x), (207, 257, 357, 407));
    assert_eq!(axis_tuple(&edges.y), (193, 243, 343, 393));
}

#[test]
fn correlation_rejects_image_smaller_than_template() {
    let mut locator = CoarseLocator::new(CoarseParams::default());
    locator
        .initialize(&reference().view(), Some(template_roi()))
        .expect("template");
    let small = GrayImage::filled(200, 400, 128);
    assert_eq!(
        locator.locate(&small.view()),
        Err(CoarseError::TemplateMismatch(
            TemplateMismatch::SearchAreaTooSmall {
                axis: Axis::X,
                search: 200,
                template: 240
            }
        ))
    );
}

fn rms_locator() -> CoarseLocator {
    let mut locator = CoarseLocator::new(CoarseParams {
        strategy: CoarseStrategy::RmsProfile,
        ..CoarseParams::default()
    });
    locator.initialize(&reference().view(), None).expect("rms template");
    locator
}

fn assert_within_a_pixel(e: &AxisEdges<i32>, nominal: [i32; 4], axis: Axis) {
    let got = axis_tuple(e);
    for (g, n) in [got.0, got.1, got.2, got.3].into_iter().zip(nominal) {
        assert!((g - n).abs() <= 1, "{axis:?}: {got:?}, expected near {nominal:?}");
    }
}

#[test]
fn rms_profile_template_locates_edges_within_a_pixel() {
    let mut locator = CoarseLocator::new(CoarseParams {
        strategy: CoarseStrategy::RmsProfile,
        ..CoarseParams::default()
    });
    locator.initialize(&reference().view(), None).expect("rms template");

    let target = noisy((0.5, -0.5));
    let edges = locator.locate(&target.image.view()).expect("coarse edges");
    let nominal = [220, 270, 370, 420];
    for (axis, e) in [(Axis::X, edges.x), (Axis::Y, edges.y)] {
        let got = axis_tuple(&e);
        for (g, n) in [got.0, got.1, got.2, got.3].into_iter().zip(nominal) {
            assert!((g - n).abs() <= 1, "{axis:?}: {got:?}");
        }
    }
}

#[test]
fn rms_profile_locates_clean_mark() {
    let locator = rms_locator();
    let edges = locator.locate(&reference().view()).expect("coarse edges");
    assert_within_a_pixel(&edges.x, [220, 270, 370, 420], Axis::X);
    assert_within_a_pixel(&edges.y, [220, 270, 370, 420], Axis::Y);
}

#[test]
fn rms_profile_handles_noise_with_any_shift_sign() {
    let locator = rms_locator();
    for shift in [(0.5, 0.5), (-0.5, 0.5), (-0.5, -0.5)] {
        let target = noisy(shift);
        let edges = locator
            .locate(&target.image.view())
            .unwrap_or_else(|e| panic!("shift {shift:?}: {e}"));
        assert_within_a_pixel(&edges.x, [220, 270, 370, 420], Axis::X);
        assert_within_a_pixel(&edges.y, [220, 270, 370, 420], Axis::Y);
    }
}

#[test]
fn rms_profile_follows_translated_mark() {
    let locator = rms_locator();
    let full = noisy((0.0, 0.0)).image;
    let moved = full.view().crop(Rect::new(13, 27, 600, 600)).expect("crop");
    let edges = locator.locate(&moved.view()).expect("coarse edges");
    assert_within_a_pixel(&edges.x, [207, 257, 357, 407], Axis::X);
    assert_within_a_pixel(&edges.y, [193, 243, 343, 393], Axis::Y);
}

#[test]
fn rms_template_needs_four_edges() {
    let mut locator = CoarseLocator::new(CoarseParams {
        strategy: CoarseStrategy::RmsProfile,
        ..CoarseParams::default()
    });
    let flat = GrayImage::filled(100, 100, 90);
    assert_eq!(
        locator.initialize(&flat.view(), None),
        Err(CoarseError::TemplateMismatch(TemplateMismatch::PeaksNotFound {
            axis: Axis::X,
            found: 0
        }))
    );
    assert!(!locator.is_ready());
}

struct GroundTruth(Vec<Detection>);

impl BoxDetector for GroundTruth {
    fn detect(&self, _image: &GrayImageView<'_>) -> Vec<Detection> {
        self.0.clone()
    }
}

#[test]
fn detector_boxes_map_to_literal_edges_in_any_order() {
    let outer = Detection {
        rect: Rect::new(220, 220, 200, 200),
        class_id: 0,
        confidence: 0.97,
    };
    let inner = Detection {
        rect: Rect::new(270, 270, 100, 100),
        class_id: 1,
        confidence: 0.91,
    };
    assert_eq!(outer.rect.area(), 40_000);
    assert_eq!(inner.rect.area(), 10_000);

    let params = CoarseParams {
        strategy: CoarseStrategy::Detector,
        ..CoarseParams::default()
    };
    let img = reference();
    let mut results: Vec<CoarseEdges> = Vec::new();
    for order in [vec![outer, inner], vec![inner, outer]] {
        let locator = CoarseLocator::new(params).with_detector(Box::new(GroundTruth(order)));
        assert!(locator.is_ready());
        results.push(locator.locate(&img.view()).expect("detector edges"));
    }
    assert_eq!(results[0], results[1]);
    assert_eq!(axis_tuple(&results[0].x), (220, 270, 370, 420));
    assert_eq!(axis_tuple(&results[0].y), (220, 270, 370, 420));
}

#[test]
fn detector_with_one_box_fails() {
    let params = CoarseParams {
        strategy: CoarseStrategy::Detector,
        ..CoarseParams::default()
    };
    let locator = CoarseLocator::new(params).with_detector(Box::new(|_: &GrayImageView<'_>| {
        vec![Detection {
            rect: Rect::new(0, 0, 10, 10),
            class_id: 0,
            confidence: 0.5,
        }]
    }));
    assert_eq!(
        locator.locate(&reference().view()),
        Err(CoarseError::InsufficientDetections { found: 1 })
    );
}

#[test]
fn locating_before_initialization_fails() {
    let img = reference();
    for strategy in [
        CoarseStrategy::Correlation,
        CoarseStrategy::RmsProfile,
        CoarseStrategy::Detector,
    ] {
        let locator = CoarseLocator::new(CoarseParams {
            strategy,
            ..CoarseParams::default()
        });
        assert_eq!(
            locator.locate(&img.view()),
            Err(CoarseError::TemplateMismatch(TemplateMismatch::NotInitialized))
        );
    }
}

#[test]
fn params_round_trip_through_json() {
    let json = r#"{"strategy": "rms_profile", "correlation": {"min_score": 0.7}}"#;
    let params: CoarseParams = serde_json::from_str(json).expect("params");
    assert_eq!(params.strategy, CoarseStrategy::RmsProfile);
    assert_eq!(params.correlation.pyramid_levels, 2);
    assert_eq!(params.rms.min_peak_separation, 40);
}
