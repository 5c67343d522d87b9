//! Fixed-width block layout for the certificate scene.
//!
//! The width is pinned by the caller; the height follows content flow, so a
//! long achievement title wraps into extra lines and pushes everything below
//! it down instead of overflowing the page.

/// Estimated advance width per glyph as a fraction of the font size. Glyph
/// metrics are confirmed by the renderer-side measurement, not trusted here.
const GLYPH_WIDTH_FACTOR: f32 = 0.55;

const SIDE_MARGIN: f32 = 140.0;
const HEADING_Y: f32 = 170.0;
const PRESENTED_Y: f32 = 250.0;
const SUBJECT_Y: f32 = 345.0;
const COMPLETION_Y: f32 = 415.0;
const TITLE_TOP: f32 = 485.0;
const TITLE_LINE_HEIGHT: f32 = 48.0;

pub const TITLE_FONT_SIZE: f32 = 34.0;

const DATE_GAP: f32 = 90.0;
const FOOTER_GAP: f32 = 60.0;
const FOOTER_BLOCK_HEIGHT: f32 = 200.0;
const BOTTOM_MARGIN: f32 = 40.0;

#[derive(Debug, Clone, PartialEq)]
pub struct LineSpan {
    pub text: String,
    pub y: f32,
}

/// Resolved positions for one render pass at a given pinned width.
#[derive(Debug, Clone)]
pub struct LayoutPlan {
    pub width: f32,
    pub height: f32,
    pub heading_y: f32,
    pub presented_y: f32,
    pub subject_y: f32,
    pub completion_y: f32,
    pub title_lines: Vec<LineSpan>,
    pub date_y: f32,
    pub footer_y: f32,
}

pub fn plan(achievement_title: &str, width: f32) -> LayoutPlan {
    let max_text_width = width - 2.0 * SIDE_MARGIN;
    let lines = wrap_text(achievement_title, TITLE_FONT_SIZE, max_text_width);

    let title_lines: Vec<LineSpan> = lines
        .into_iter()
        .enumerate()
        .map(|(i, text)| LineSpan {
            text,
            y: TITLE_TOP + i as f32 * TITLE_LINE_HEIGHT,
        })
        .collect();

    let last_line_y = title_lines.last().map(|l| l.y).unwrap_or(TITLE_TOP);
    let date_y = last_line_y + DATE_GAP;
    let footer_y = date_y + FOOTER_GAP;
    let height = footer_y + FOOTER_BLOCK_HEIGHT + BOTTOM_MARGIN;

    LayoutPlan {
        width,
        height,
        heading_y: HEADING_Y,
        presented_y: PRESENTED_Y,
        subject_y: SUBJECT_Y,
        completion_y: COMPLETION_Y,
        title_lines,
        date_y,
        footer_y,
    }
}

/// Greedy word wrap against an estimated glyph width. Words longer than a
/// whole line are hard-split so no line ever exceeds the text width.
pub fn wrap_text(text: &str, font_size: f32, max_width: f32) -> Vec<String> {
    let glyph_width = font_size * GLYPH_WIDTH_FACTOR;
    let max_chars = ((max_width / glyph_width).floor() as usize).max(1);

    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        for chunk in split_long_word(word, max_chars) {
            let needed = if current.is_empty() {
                chunk.chars().count()
            } else {
                current.chars().count() + 1 + chunk.chars().count()
            };
            if needed <= max_chars {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(&chunk);
            } else {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                current = chunk;
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn split_long_word(word: &str, max_chars: usize) -> Vec<String> {
    if word.chars().count() <= max_chars {
        return vec![word.to_string()];
    }
    word.chars()
        .collect::<Vec<_>>()
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: f32 = 1200.0;

    #[test]
    fn short_title_stays_on_one_line() {
        let p = plan("Intro to Hebrew", WIDTH);
        assert_eq!(p.title_lines.len(), 1);
        assert_eq!(p.title_lines[0].text, "Intro to Hebrew");
    }

    #[test]
    fn long_title_wraps_without_exceeding_text_width() {
        let title = "A Very Long Survey of the Historical Books, Wisdom \
                     Literature, Major and Minor Prophets of the Old Testament";
        let p = plan(title, WIDTH);
        assert!(p.title_lines.len() > 1);

        let max_text_width = WIDTH - 2.0 * 140.0;
        for line in &p.title_lines {
            let estimated = line.text.chars().count() as f32 * TITLE_FONT_SIZE * 0.55;
            assert!(
                estimated <= max_text_width,
                "line too wide: {:?}",
                line.text
            );
        }
    }

    #[test]
    fn height_grows_with_each_extra_line() {
        let one = plan("Short", WIDTH);
        let many = plan(
            "A Very Long Survey of the Historical Books, Wisdom Literature, \
             Major and Minor Prophets of the Old Testament",
            WIDTH,
        );
        let extra_lines = (many.title_lines.len() - one.title_lines.len()) as f32;
        assert_eq!(many.height - one.height, extra_lines * 48.0);
    }

    #[test]
    fn wrapping_preserves_every_word() {
        let title = "One Two Three Four Five Six Seven Eight Nine Ten Eleven \
                     Twelve Thirteen Fourteen Fifteen Sixteen Seventeen";
        let lines = wrap_text(title, TITLE_FONT_SIZE, WIDTH - 280.0);
        let rejoined = lines.join(" ");
        assert_eq!(rejoined, title.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn overlong_word_is_hard_split() {
        let lines = wrap_text(&"x".repeat(200), TITLE_FONT_SIZE, 400.0);
        assert!(lines.len() > 1);
        let max_chars = (400.0 / (TITLE_FONT_SIZE * 0.55)).floor() as usize;
        for line in &lines {
            assert!(line.chars().count() <= max_chars);
        }
    }
}
