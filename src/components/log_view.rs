use ratatui::{
    layout::Rect,
    style::{palette::tailwind::{FUCHSIA, PINK, SLATE}, Style, Stylize},
    text::Line,
    widgets::{Block, Borders, List, ListItem, Padding},
};

const BANNER_STYLE: Style = Style::new().fg(PINK.c400);
const ERROR_STYLE: Style = Style::new().fg(PINK.c600);

/// The append-only conversion log, scrolled to its newest lines.
pub struct LogView<'a> {
    lines: &'a [String],
}

impl<'a> LogView<'a> {
    pub fn new(lines: &'a [String]) -> Self {
        LogView { lines }
    }

    /// The lines that fit in `area` once the border is drawn.
    fn visible(&self, area: Rect) -> &'a [String] {
        let rows = area.height.saturating_sub(2) as usize;
        let start = self.lines.len().saturating_sub(rows);
        &self.lines[start..]
    }

    pub fn widget(&self, area: Rect) -> List<'a> {
        let items: Vec<ListItem> = self.visible(area)
            .iter()
            .map(|l| {
                let style = if l.starts_with("===") {
                    BANNER_STYLE.bold()
                } else if l.starts_with("ERROR") {
                    ERROR_STYLE
                } else {
                    Style::new().fg(SLATE.c300)
                };
                ListItem::new(Line::styled(l.as_str(), style))
            })
            .collect();

        let block = Block::new()
            .title(Line::raw("CONVERSION LOG"))
            .borders(Borders::ALL)
            .border_style(Style::new().fg(FUCHSIA.c900))
            .bg(SLATE.c950)
            .padding(Padding::horizontal(1));

        List::new(items).block(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_tail() {
        let lines: Vec<String> = (0..10).map(|i| format!("line {i}")).collect();
        let view = LogView::new(&lines);
        let tail = view.visible(Rect::new(0, 0, 40, 5));
        assert_eq!(tail, &lines[7..]);
        assert_eq!(view.visible(Rect::new(0, 0, 40, 40)).len(), 10);
        assert!(view.visible(Rect::new(0, 0, 40, 1)).is_empty());
    }
}
