use super::*;

fn samples() -> Vec<f64> {
    (0..=100).map(|i| f64::from(i) / 100.0).collect()
}

#[test]
fn zoom_in_scale_strictly_increases_to_factor() {
    let ps = samples();
    for w in ps.windows(2) {
        let a = transform(MotionStyle::ZoomIn, w[0]).scale;
        let b = transform(MotionStyle::ZoomIn, w[1]).scale;
        assert!(b > a, "scale must increase: {a} -> {b}");
    }
    assert_eq!(transform(MotionStyle::ZoomIn, 0.0).scale, 1.0);
    assert!((transform(MotionStyle::ZoomIn, 1.0).scale - 1.3).abs() < 1e-12);
}

#[test]
fn zoom_out_scale_strictly_decreases_to_reciprocal() {
    let ps = samples();
    for w in ps.windows(2) {
        let a = transform(MotionStyle::ZoomOut, w[0]).scale;
        let b = transform(MotionStyle::ZoomOut, w[1]).scale;
        assert!(b < a);
    }
    assert_eq!(transform(MotionStyle::ZoomOut, 0.0).scale, 1.0);
    assert!((transform(MotionStyle::ZoomOut, 1.0).scale - 1.0 / 1.3).abs() < 1e-12);
}

#[test]
fn pan_is_centered_with_twenty_percent_amplitude() {
    assert!((transform(MotionStyle::Pan, 0.0).translate_x + 0.1).abs() < 1e-12);
    assert_eq!(transform(MotionStyle::Pan, 0.5).translate_x, 0.0);
    assert!((transform(MotionStyle::Pan, 1.0).translate_x - 0.1).abs() < 1e-12);
    let ps = samples();
    for w in ps.windows(2) {
        assert!(
            transform(MotionStyle::Pan, w[1]).translate_x
                > transform(MotionStyle::Pan, w[0]).translate_x
        );
    }
}

#[test]
fn orbit_rotation_reaches_tenth_pi() {
    assert_eq!(transform(MotionStyle::Orbit, 0.0).rotation, 0.0);
    assert!((transform(MotionStyle::Orbit, 1.0).rotation - 0.1 * PI).abs() < 1e-12);
    assert!(transform(MotionStyle::Orbit, 0.25).rotation < transform(MotionStyle::Orbit, 0.5).rotation);
}

#[test]
fn dynamic_matches_pan() {
    for p in samples() {
        assert_eq!(
            transform(MotionStyle::Dynamic, p),
            transform(MotionStyle::Pan, p)
        );
    }
}

#[test]
fn transform_is_idempotent() {
    for style in MotionStyle::ALL {
        for p in samples() {
            assert_eq!(transform(style, p), transform(style, p));
        }
    }
}

#[test]
fn progress_is_clamped() {
    assert_eq!(
        transform(MotionStyle::ZoomIn, -3.0),
        transform(MotionStyle::ZoomIn, 0.0)
    );
    assert_eq!(
        transform(MotionStyle::ZoomIn, 7.0),
        transform(MotionStyle::ZoomIn, 1.0)
    );
    assert_eq!(
        transform(MotionStyle::Orbit, f64::NAN),
        transform(MotionStyle::Orbit, 0.0)
    );
}

#[test]
fn unknown_style_falls_back_to_dynamic() {
    assert_eq!(MotionStyle::parse("spiral"), MotionStyle::Dynamic);
    assert_eq!(MotionStyle::parse("Zoom_In"), MotionStyle::ZoomIn);
    let s: MotionStyle = serde_json::from_str("\"wobble\"").unwrap();
    assert_eq!(s, MotionStyle::Dynamic);
    let s: MotionStyle = serde_json::from_str("\"zoom-out\"").unwrap();
    assert_eq!(s, MotionStyle::ZoomOut);
    assert_eq!(serde_json::to_string(&MotionStyle::ZoomIn).unwrap(), "\"zoom-in\"");
}

#[test]
fn to_affine_keeps_center_fixed_for_zoom_and_orbit() {
    let canvas = Canvas {
        width: 200,
        height: 100,
    };
    let center = kurbo::Point::new(100.0, 50.0);
    for style in [MotionStyle::ZoomIn, MotionStyle::ZoomOut, MotionStyle::Orbit] {
        let a = transform(style, 0.8).to_affine(canvas);
        let mapped = a * center;
        assert!((mapped - center).hypot() < 1e-9, "{style} moved the center");
    }
}

#[test]
fn to_affine_pan_shifts_by_fraction_of_width() {
    let canvas = Canvas {
        width: 1000,
        height: 500,
    };
    let a = transform(MotionStyle::Pan, 1.0).to_affine(canvas);
    let mapped = a * kurbo::Point::new(0.0, 0.0);
    assert!((mapped.x - 100.0).abs() < 1e-9);
    assert!(mapped.y.abs() < 1e-9);
}

#[test]
fn identity_maps_to_identity_affine() {
    let canvas = Canvas {
        width: 64,
        height: 64,
    };
    let a = AffineParameters::IDENTITY.to_affine(canvas);
    let p = a * kurbo::Point::new(3.0, 7.0);
    assert!((p.x - 3.0).abs() < 1e-9 && (p.y - 7.0).abs() < 1e-9);
}
