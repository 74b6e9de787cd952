use towerdoc_types::Rect;

pub struct BreakAnalysis {
    pub should_break: bool,
    pub remaining_height: f32,
}

/// Checks whether a child of `child_height` fits below `cursor_y`.
///
/// * `cursor_y`: position relative to the top of `bounds`.
/// * `bounds`: the content area of the current page.
pub fn check_child_fit(cursor_y: f32, child_height: f32, bounds: Rect) -> BreakAnalysis {
    let available = (bounds.height - cursor_y).max(0.0);
    // Absorbs float drift from summed line boxes.
    const EPSILON: f32 = 0.01;
    BreakAnalysis {
        should_break: child_height > available + EPSILON,
        remaining_height: available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_exactly() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let analysis = check_child_fit(60.0, 40.0, bounds);
        assert!(!analysis.should_break);
        assert_eq!(analysis.remaining_height, 40.0);
    }

    #[test]
    fn breaks_when_taller_than_remaining() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(check_child_fit(60.0, 40.5, bounds).should_break);
        assert_eq!(check_child_fit(120.0, 1.0, bounds).remaining_height, 0.0);
    }
}
