use super::WidthPolicy;

const WIDTH_EPSILON: f32 = 1e-3;

pub fn even_widths(cols: usize, inner: f32) -> Vec<f32> {
    if cols == 0 {
        return Vec::new();
    }
    vec![inner / cols as f32; cols]
}

fn usable(values: Option<&[f32]>, cols: usize) -> Option<&[f32]> {
    values.filter(|v| {
        v.len() == cols && v.iter().all(|w| w.is_finite() && *w >= 0.0) && v.iter().sum::<f32>() > 0.0
    })
}

/// Column widths for a table inside `inner` points.
///
/// Fractions win over point widths; both are ignored when their length does
/// not match `cols`. Point widths are rescaled to `inner` under
/// [`WidthPolicy::Fit`] and only scaled down, when too wide, under
/// [`WidthPolicy::Exact`].
pub fn resolve_column_widths(
    cols: usize,
    fractions: Option<&[f32]>,
    points: Option<&[f32]>,
    policy: WidthPolicy,
    inner: f32,
) -> Vec<f32> {
    if policy == WidthPolicy::Even {
        return even_widths(cols, inner);
    }
    if let Some(frac) = usable(fractions, cols) {
        let total: f32 = frac.iter().sum();
        return frac.iter().map(|f| f / total * inner).collect();
    }
    if let Some(pts) = usable(points, cols) {
        let total: f32 = pts.iter().sum();
        let scale = match policy {
            WidthPolicy::Exact if total <= inner => 1.0,
            _ => inner / total,
        };
        return pts.iter().map(|w| w * scale).collect();
    }
    if fractions.is_some() || points.is_some() {
        log::warn!("Column widths do not match {} columns; dividing evenly.", cols);
    }
    even_widths(cols, inner)
}

/// Raises every column to at least `max(min_abs, avg * min_frac)` and takes
/// the difference proportionally from the other columns. The total is
/// unchanged. When the floor cannot be met for every column the widths
/// become even.
pub fn clamp_min_widths(widths: &mut [f32], min_abs: f32, min_frac: f32) {
    let n = widths.len();
    if n == 0 {
        return;
    }
    let total: f32 = widths.iter().sum();
    let floor = min_abs.max(total / n as f32 * min_frac);
    if floor * n as f32 > total + WIDTH_EPSILON {
        log::warn!("Columns cannot all reach {:.2}pt; dividing {:.2}pt evenly.", floor, total);
        widths.fill(total / n as f32);
        return;
    }

    let mut clamped = vec![false; n];
    loop {
        let mut changed = false;
        for (w, c) in widths.iter_mut().zip(clamped.iter_mut()) {
            if !*c && *w < floor - WIDTH_EPSILON {
                *w = floor;
                *c = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        let fixed: f32 = widths.iter().zip(&clamped).filter(|(_, c)| **c).map(|(w, _)| *w).sum();
        let free: f32 = widths.iter().zip(&clamped).filter(|(_, c)| !**c).map(|(w, _)| *w).sum();
        let target = total - fixed;
        if free <= 0.0 || target <= 0.0 {
            widths.fill(total / n as f32);
            return;
        }
        let scale = target / free;
        for (w, c) in widths.iter_mut().zip(&clamped) {
            if !*c {
                *w *= scale;
            }
        }
    }
}
