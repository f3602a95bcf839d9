use std::f64::consts::PI;

use crate::foundation::core::{Affine, Canvas, Vec2};

/// Horizontal pan amplitude as a fraction of frame width.
pub const PAN_AMPLITUDE: f64 = 0.2;
/// Scale reached at the end of a zoom-in (zoom-out ends at the reciprocal).
pub const ZOOM_FACTOR: f64 = 1.3;
/// Rotation reached at the end of an orbit, in radians.
pub const ORBIT_MAX_RADIANS: f64 = 0.1 * PI;

/// Named camera-movement pattern.
///
/// Deserialization is lenient: unknown identifiers become [`MotionStyle::Dynamic`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum MotionStyle {
    /// Horizontal drift across the frame.
    Pan,
    /// Push towards the frame center.
    ZoomIn,
    /// Pull back from the frame center.
    ZoomOut,
    /// Slow rotation about the frame center.
    Orbit,
    /// Default style; renders as a pan.
    #[default]
    Dynamic,
}

impl MotionStyle {
    /// All styles, in presentation order.
    pub const ALL: [MotionStyle; 5] = [
        Self::ZoomIn,
        Self::ZoomOut,
        Self::Pan,
        Self::Orbit,
        Self::Dynamic,
    ];

    /// Parse a style identifier, falling back to `Dynamic` for anything unrecognized.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "pan" => Self::Pan,
            "zoom-in" | "zoomin" => Self::ZoomIn,
            "zoom-out" | "zoomout" => Self::ZoomOut,
            "orbit" => Self::Orbit,
            _ => Self::Dynamic,
        }
    }

    /// Canonical kebab-case identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pan => "pan",
            Self::ZoomIn => "zoom-in",
            Self::ZoomOut => "zoom-out",
            Self::Orbit => "orbit",
            Self::Dynamic => "dynamic",
        }
    }

    /// Camera-movement phrase appended to prompts on the remote path.
    pub fn prompt_hint(self) -> &'static str {
        match self {
            Self::Pan => "smooth horizontal camera pan",
            Self::ZoomIn => "camera slowly pushes in towards the subject",
            Self::ZoomOut => "camera slowly pulls back to reveal the scene",
            Self::Orbit => "camera gently orbits around the subject",
            Self::Dynamic => "dynamic cinematic camera movement",
        }
    }
}

impl From<String> for MotionStyle {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<MotionStyle> for &'static str {
    fn from(style: MotionStyle) -> Self {
        style.as_str()
    }
}

impl std::fmt::Display for MotionStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolution-independent affine parameters, anchored at the frame center.
///
/// Translation is expressed as a fraction of the frame size so the same parameters apply to any
/// working canvas.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AffineParameters {
    /// Horizontal translation as a fraction of frame width.
    pub translate_x: f64,
    /// Vertical translation as a fraction of frame height.
    pub translate_y: f64,
    /// Uniform scale about the center.
    pub scale: f64,
    /// Counter-clockwise rotation about the center, radians.
    pub rotation: f64,
}

impl Default for AffineParameters {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl AffineParameters {
    /// No motion.
    pub const IDENTITY: Self = Self {
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
        rotation: 0.0,
    };

    /// Pixel-space transform for `canvas`: scale and rotate about the center, then translate.
    pub fn to_affine(self, canvas: Canvas) -> Affine {
        let center = canvas.center();
        let shift = Vec2::new(
            self.translate_x * f64::from(canvas.width),
            self.translate_y * f64::from(canvas.height),
        );
        Affine::translate(shift + center)
            * Affine::rotate(self.rotation)
            * Affine::scale(self.scale)
            * Affine::translate(-center)
    }
}

/// Transform for `style` at `progress` (clamped to `[0, 1]`).
///
/// Deterministic and total: `Dynamic` shares the pan curve.
pub fn transform(style: MotionStyle, progress: f64) -> AffineParameters {
    let p = if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    };
    match style {
        MotionStyle::Pan | MotionStyle::Dynamic => AffineParameters {
            translate_x: (p - 0.5) * PAN_AMPLITUDE,
            ..AffineParameters::IDENTITY
        },
        MotionStyle::ZoomIn => AffineParameters {
            scale: 1.0 + (ZOOM_FACTOR - 1.0) * p,
            ..AffineParameters::IDENTITY
        },
        MotionStyle::ZoomOut => AffineParameters {
            scale: 1.0 / (1.0 + (ZOOM_FACTOR - 1.0) * p),
            ..AffineParameters::IDENTITY
        },
        MotionStyle::Orbit => AffineParameters {
            rotation: ORBIT_MAX_RADIANS * p,
            ..AffineParameters::IDENTITY
        },
    }
}

#[cfg(test)]
#[path = "../../tests/unit/motion/model.rs"]
mod tests;
