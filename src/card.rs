use std::fmt;

const BODY_WIDTH: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStatus {
    Basic,
    Primary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: &'static str,
    pub status: ButtonStatus,
}

/// Static, non-interactive card: header, body paragraph and footer buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub title: &'static str,
    pub attribution: &'static str,
    pub body: &'static str,
    pub footer: [Button; 2],
}

impl Default for Card {
    fn default() -> Self {
        Self {
            title: "Maldives",
            attribution: "By Wikipedia",
            body: "The Maldives, officially the Republic of Maldives, is a small country in \
                   South Asia, located in the Arabian Sea of the Indian Ocean. It lies \
                   southwest of Sri Lanka and India, about 1,000 kilometres (620 mi) from the \
                   Asian continent",
            footer: [
                Button {
                    label: "CANCEL",
                    status: ButtonStatus::Basic,
                },
                Button {
                    label: "ACCEPT",
                    status: ButtonStatus::Primary,
                },
            ],
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            ButtonStatus::Basic => write!(f, "[ {} ]", self.label),
            ButtonStatus::Primary => write!(f, "[*{}*]", self.label),
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(BODY_WIDTH + 2);
        writeln!(f, "+{}+", rule)?;
        boxed_line(f, self.title)?;
        boxed_line(f, self.attribution)?;
        writeln!(f, "+{}+", rule)?;
        for row in wrap(self.body, BODY_WIDTH) {
            boxed_line(f, &row)?;
        }
        writeln!(f, "+{}+", rule)?;
        let buttons = self
            .footer
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(f, "|{:>width$}|", format!("{} ", buttons), width = BODY_WIDTH + 2)?;
        write!(f, "+{}+", rule)
    }
}

fn boxed_line(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    writeln!(f, "|{:<width$}|", format!(" {}", text), width = BODY_WIDTH + 2)
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut rows = Vec::new();
    let mut row = String::new();
    for word in text.split_whitespace() {
        if !row.is_empty() && row.len() + 1 + word.len() > width {
            rows.push(std::mem::take(&mut row));
        }
        if !row.is_empty() {
            row.push(' ');
        }
        row.push_str(word);
    }
    if !row.is_empty() {
        rows.push(row);
    }
    rows
}
