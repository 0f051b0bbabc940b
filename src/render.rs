use crate::types::CuttingPlan;

const MAX_WIDTH: f64 = 80.0;

/// Draws one bar of a plan: pieces longest first, then the offcut.
pub fn render_plan(plan: &CuttingPlan) -> String {
    let pieces: Vec<f64> = plan
        .cut_lengths
        .iter()
        .zip(&plan.cut_counts)
        .flat_map(|(&length, &count)| std::iter::repeat_n(length, count as usize))
        .collect();
    render_bar(plan.stock_length, &pieces)
}

/// ASCII strip of a bar scaled to 80 columns. Offcut is hatched with `#`.
pub fn render_bar(stock_length: f64, cuts: &[f64]) -> String {
    if stock_length <= 0.0 {
        return String::new();
    }
    let scale = MAX_WIDTH / stock_length;
    let width = (stock_length * scale).round() as usize;
    if width == 0 {
        return String::new();
    }

    let mut border = vec!['-'; width + 1];
    let mut body = vec![' '; width + 1];
    mark_boundary(&mut border, &mut body, 0);

    let mut x = 0;
    for &cut in cuts {
        let w = ((cut * scale).round() as usize).max(1);
        let end = (x + w).min(width);
        mark_boundary(&mut border, &mut body, end);
        draw_label(&mut body, x, end, &cut.to_string());
        x = end;
    }

    for cell in body.iter_mut().take(width).skip(x + 1) {
        *cell = '#';
    }
    mark_boundary(&mut border, &mut body, width);

    let mut result = String::new();
    for row in [&border, &body, &border] {
        let line: String = row.iter().collect();
        result.push_str(line.trim_end());
        result.push('\n');
    }
    result
}

fn mark_boundary(border: &mut [char], body: &mut [char], x: usize) {
    if x < border.len() {
        border[x] = '+';
        body[x] = '|';
    }
}

/// Centers `label` strictly between two boundaries; dropped if it can't fit.
fn draw_label(body: &mut [char], start: usize, end: usize, label: &str) {
    let chars: Vec<char> = label.chars().collect();
    if end <= start + chars.len() + 1 {
        return;
    }
    let center = start + (end - start) / 2;
    let first = center.saturating_sub(chars.len() / 2).max(start + 1);
    for (i, &ch) in chars.iter().enumerate() {
        let x = first + i;
        if x > start && x < end {
            body[x] = ch;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_bar_has_no_offcut() {
        let out = render_bar(100.0, &[60.0, 40.0]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 81);
        assert_eq!(lines[0].matches('+').count(), 3);
        assert!(lines[1].starts_with('|') && lines[1].ends_with('|'));
        assert!(lines[1].contains("60") && lines[1].contains("40"));
        assert!(!lines[1].contains('#'));
    }

    #[test]
    fn test_offcut_is_hatched() {
        let out = render_bar(100.0, &[50.0]);
        let body = out.lines().nth(1).unwrap();
        assert!(body.contains("50"));
        assert_eq!(body.matches('#').count(), 39);
    }

    #[test]
    fn test_render_plan_expands_counts() {
        let plan = CuttingPlan {
            stock_length: 90.0,
            cut_lengths: vec![30.0],
            cut_counts: vec![3],
            count: 2,
            total_waste: 0.0,
            avg_waste: 0.0,
        };
        let out = render_plan(&plan);
        assert_eq!(out.lines().nth(1).unwrap().matches("30").count(), 3);
    }

    #[test]
    fn test_degenerate_stock() {
        assert!(render_bar(0.0, &[]).is_empty());
    }
}
