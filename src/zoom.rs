/// Pinch and pan state of the photo under the viewer cursor.
///
/// Gestures are committed on release: a finished pinch multiplies the scale,
/// a finished pan adds to the offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomState {
    scale: f32,
    offset_x: f32,
    offset_y: f32,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl ZoomState {
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn offset(&self) -> (f32, f32) {
        (self.offset_x, self.offset_y)
    }

    /// Scale to draw while a pinch of `factor` is still in progress.
    pub fn live_scale(&self, factor: f32) -> f32 {
        if valid_factor(factor) {
            self.scale * factor
        } else {
            self.scale
        }
    }

    pub fn end_pinch(&mut self, factor: f32) {
        if valid_factor(factor) {
            self.scale *= factor;
        }
    }

    pub fn end_pan(&mut self, dx: f32, dy: f32) {
        if dx.is_finite() && dy.is_finite() {
            self.offset_x += dx;
            self.offset_y += dy;
        }
    }

    /// The viewer offers a "reset zoom" control only while magnified.
    pub fn is_zoomed(&self) -> bool {
        self.scale > 1.0
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn valid_factor(factor: f32) -> bool {
    factor.is_finite() && factor > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinches_accumulate() {
        let mut zoom = ZoomState::default();
        zoom.end_pinch(2.0);
        zoom.end_pinch(1.5);
        assert!((zoom.scale() - 3.0).abs() < f32::EPSILON);
        assert!((zoom.live_scale(2.0) - 6.0).abs() < f32::EPSILON);
        assert!(zoom.is_zoomed());
    }

    #[test]
    fn pans_accumulate_and_reset_restores_identity() {
        let mut zoom = ZoomState::default();
        zoom.end_pan(10.0, -4.0);
        zoom.end_pan(5.0, 4.0);
        assert_eq!(zoom.offset(), (15.0, 0.0));
        zoom.end_pinch(0.5);
        assert!(!zoom.is_zoomed());
        zoom.reset();
        assert_eq!(zoom, ZoomState::default());
    }

    #[test]
    fn ignores_degenerate_gestures() {
        let mut zoom = ZoomState::default();
        zoom.end_pinch(0.0);
        zoom.end_pinch(f32::NAN);
        zoom.end_pan(f32::INFINITY, 1.0);
        assert_eq!(zoom, ZoomState::default());
    }
}
