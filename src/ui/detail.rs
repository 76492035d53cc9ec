use std::fs;

use anyhow::{Context, Result};

use crate::models::BlogEntry;

/// What the detail collaborator reports back when it returns control.
///
/// The controller consumes only this signal: `Saved` triggers a full re-render
/// of the unfiltered list, `Closed` changes nothing. The bundled terminal
/// implementation is read-only and always reports `Closed`; the contract keeps
/// both variants because the collaborator boundary does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailOutcome {
    Closed,
    Saved,
}

/// Full-text view of a single entry. Receives the record triple by value;
/// nothing here touches storage.
pub(crate) struct DetailScreen {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) body: String,
    pub(crate) scroll: u16,
}

impl DetailScreen {
    pub(crate) fn new(id: i64, name: String, body: String) -> Self {
        Self {
            id,
            name,
            body,
            scroll: 0,
        }
    }

    pub(crate) fn from_entry(entry: &BlogEntry) -> Self {
        Self::new(entry.id, entry.name.clone(), entry.body.clone())
    }

    pub(crate) fn scroll_by(&mut self, delta: i32) {
        let next = self.scroll as i32 + delta;
        self.scroll = next.clamp(0, u16::MAX as i32) as u16;
    }

    /// Hand the full text to the OS default opener. The write goes to a
    /// throwaway file in the system temp directory; viewing it has no effect
    /// on the outcome the collaborator reports.
    pub(crate) fn open_externally(&self) -> Result<()> {
        let path = std::env::temp_dir().join(format!("blog-{}.txt", self.id));
        fs::write(&path, format!("{}\n\n{}", self.name, self.body))
            .context("failed to write detail text")?;
        open::that(&path).context("failed to open detail text externally")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_never_goes_negative() {
        let mut screen = DetailScreen::new(1, "Trip".into(), "body".into());
        screen.scroll_by(-5);
        assert_eq!(screen.scroll, 0);
        screen.scroll_by(3);
        screen.scroll_by(-1);
        assert_eq!(screen.scroll, 2);
    }

    #[test]
    fn from_entry_copies_the_triple() {
        let entry = BlogEntry {
            id: 7,
            name: "Trip".into(),
            body: "Went hiking".into(),
        };
        let screen = DetailScreen::from_entry(&entry);
        assert_eq!(
            (screen.id, screen.name.as_str(), screen.body.as_str()),
            (7, "Trip", "Went hiking")
        );
    }
}
