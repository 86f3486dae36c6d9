use ratatui::{
    style::{palette::tailwind::{FUCHSIA, PINK, SLATE}, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph},
};

/// A single-line path entry. Editing happens at the end of the text.
#[derive(Clone, Debug, Default)]
pub struct TextField {
    value: String,
}

impl TextField {
    pub fn new(value: &str) -> Self {
        TextField { value: String::from(value) }
    }

    pub fn value(&self) -> &str { &self.value }

    pub fn set(&mut self, value: &str) {
        self.value = String::from(value);
    }

    pub fn push(&mut self, c: char) {
        self.value.push(c);
    }

    pub fn backspace(&mut self) {
        self.value.pop();
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    pub fn widget<'a>(&'a self, title: &'a str, placeholder: &'a str, focused: bool) -> Paragraph<'a> {
        let border_style = if focused { Style::new().fg(PINK.c400) } else { Style::new().fg(FUCHSIA.c900) };
        let block = Block::new()
            .title(Line::raw(title))
            .borders(Borders::ALL)
            .border_style(border_style)
            .padding(Padding::horizontal(1));

        let mut spans = if self.value.is_empty() && !focused {
            vec![Span::styled(placeholder, Style::new().fg(SLATE.c500))]
        } else {
            vec![Span::styled(self.value.as_str(), Style::new().fg(SLATE.c50))]
        };
        if focused {
            spans.push(Span::styled("▏", Style::new().fg(PINK.c400)));
        }

        Paragraph::new(Line::from(spans)).block(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editing() {
        let mut field = TextField::new("/tmp");
        field.push('/');
        field.push('a');
        assert_eq!(field.value(), "/tmp/a");
        field.backspace();
        assert_eq!(field.value(), "/tmp/");
        field.clear();
        field.backspace();
        assert_eq!(field.value(), "");
        field.set("/music");
        assert_eq!(field.value(), "/music");
    }
}
