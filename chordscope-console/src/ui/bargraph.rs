/// Renders vertical bars as text rows, top row first.
///
/// Each bar is `bars[j] * vscale` rows tall, clipped to `height`. The output
/// holds `height` rows followed by a base line of `symbol`, each exactly
/// `bars.len()` characters wide.
pub fn render_bargraph(bars: &[i32], height: usize, vscale: f32, symbol: char) -> Vec<String> {
    let heights: Vec<usize> = bars
        .iter()
        .map(|&bar| ((bar as f32 * vscale) as i64).clamp(0, height as i64) as usize)
        .collect();

    let mut rows: Vec<String> = (0..height)
        .map(|row| {
            let level = height - row;
            heights
                .iter()
                .map(|&bar| if bar >= level { symbol } else { ' ' })
                .collect()
        })
        .collect();
    rows.push(std::iter::repeat_n(symbol, bars.len()).collect());
    rows
}

/// Fills each zero bar with the average of its two neighbours.
pub fn smooth(bars: &mut [i32]) {
    for i in 1..bars.len().saturating_sub(1) {
        if bars[i] == 0 {
            bars[i] = (bars[i - 1] + bars[i + 1]) / 2;
        }
    }
}

/// Scale that makes the tallest bar exactly one unit, if any bar is positive.
pub fn adaptive_scale(bars: &[i32]) -> Option<f32> {
    bars.iter()
        .copied()
        .max()
        .filter(|&max| max > 0)
        .map(|max| 1.0 / max as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_is_height_plus_base_line() {
        let rows = render_bargraph(&[1, 2, 3], 4, 1.0, '|');
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|row| row.chars().count() == 3));
        assert_eq!(rows[4], "|||");
    }

    #[test]
    fn bars_grow_from_the_bottom() {
        let rows = render_bargraph(&[0, 1, 3], 3, 1.0, ':');
        assert_eq!(rows, vec!["  :", "  :", " ::", ":::"]);
    }

    #[test]
    fn bars_are_clipped_to_height() {
        let rows = render_bargraph(&[100, -5], 2, 1.0, '#');
        assert_eq!(rows, vec!["# ", "# ", "##"]);
    }

    #[test]
    fn vertical_scale_applies() {
        let rows = render_bargraph(&[10], 4, 0.2, '=');
        assert_eq!(rows, vec![" ", " ", "=", "=", "="]);
    }

    #[test]
    fn smoothing_fills_interior_gaps() {
        let mut bars = [0, 4, 0, 8, 0];
        smooth(&mut bars);
        assert_eq!(bars, [0, 4, 6, 8, 0]);
        let mut short = [0];
        smooth(&mut short);
        assert_eq!(short, [0]);
    }

    #[test]
    fn adaptive_scale_normalizes_the_peak() {
        assert_eq!(adaptive_scale(&[1, 4, 2]), Some(0.25));
        assert_eq!(adaptive_scale(&[0, 0]), None);
        assert_eq!(adaptive_scale(&[]), None);
    }
}
