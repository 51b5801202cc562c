// src/wordcloud.rs
//
// Minimal word-cloud renderer on top of plotters: font size scales linearly
// with count, words walk an outward spiral from the canvas center until they
// find a spot that does not overlap anything already placed.

use anyhow::{anyhow, Result};
use plotters::prelude::*;
use std::path::Path;
use tracing::debug;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;
const MIN_FONT: f64 = 16.0;
const MAX_FONT: f64 = 72.0;
const PADDING: i32 = 4;

#[derive(Debug, Clone, Copy)]
struct Rect {
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
}

impl Rect {
    fn intersects(&self, other: &Rect) -> bool {
        self.x0 - PADDING < other.x1
            && other.x0 - PADDING < self.x1
            && self.y0 - PADDING < other.y1
            && other.y0 - PADDING < self.y1
    }

    fn inside_canvas(&self) -> bool {
        self.x0 >= 0 && self.y0 >= 0 && self.x1 <= WIDTH as i32 && self.y1 <= HEIGHT as i32
    }
}

/// Render `keywords` (already ordered, highest count first) to `path`.
/// Returns how many words found a spot; the rest are dropped.
pub fn render(keywords: &[(String, usize)], path: &Path) -> Result<usize> {
    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("fill canvas: {}", e))?;

    let max_count = keywords.iter().map(|(_, n)| *n).max().unwrap_or(1).max(1);
    let mut placed: Vec<Rect> = Vec::new();
    let mut drawn = 0usize;

    for (i, (word, count)) in keywords.iter().enumerate() {
        let scale = *count as f64 / max_count as f64;
        let size = MIN_FONT + scale * (MAX_FONT - MIN_FONT);
        let color = Palette99::pick(i).to_rgba();
        let style = TextStyle::from(("sans-serif", size).into_font()).color(&color);

        let (w, h) = root
            .estimate_text_size(word, &style)
            .map_err(|e| anyhow!("measure {:?}: {}", word, e))?;

        match find_spot(w as i32, h as i32, &placed) {
            Some(rect) => {
                root.draw(&Text::new(word.clone(), (rect.x0, rect.y0), style))
                    .map_err(|e| anyhow!("draw {:?}: {}", word, e))?;
                placed.push(rect);
                drawn += 1;
            }
            None => debug!("Word dropped, no room left - word={}, count={}", word, count),
        }
    }

    root.present().map_err(|e| anyhow!("write {:?}: {}", path, e))?;
    Ok(drawn)
}

/// Walk an archimedean spiral from the canvas center, returning the first
/// collision-free position for a w x h box.
fn find_spot(w: i32, h: i32, placed: &[Rect]) -> Option<Rect> {
    let cx = WIDTH as f64 / 2.0;
    let cy = HEIGHT as f64 / 2.0;

    for step in 0..4000 {
        let t = step as f64 * 0.1;
        let r = 2.0 * t;
        let x = cx + r * t.cos() - w as f64 / 2.0;
        // squash vertically so the cloud fills the landscape canvas
        let y = cy + r * 0.6 * t.sin() - h as f64 / 2.0;

        let rect = Rect {
            x0: x as i32,
            y0: y as i32,
            x1: x as i32 + w,
            y1: y as i32 + h,
        };
        if rect.inside_canvas() && !placed.iter().any(|p| rect.intersects(p)) {
            return Some(rect);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_word_lands_near_the_center() {
        let rect = find_spot(100, 40, &[]).unwrap();
        assert!((rect.x0 - (WIDTH as i32 / 2 - 50)).abs() < 30);
        assert!((rect.y0 - (HEIGHT as i32 / 2 - 20)).abs() < 30);
    }

    #[test]
    fn placements_do_not_overlap() {
        let mut placed = Vec::new();
        for _ in 0..20 {
            let rect = find_spot(120, 30, &placed).unwrap();
            assert!(!placed.iter().any(|p| rect.intersects(p)));
            placed.push(rect);
        }
    }

    #[test]
    fn oversized_box_is_rejected() {
        assert!(find_spot(WIDTH as i32 + 1, 40, &[]).is_none());
    }
}
