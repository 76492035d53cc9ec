//! Domain models that mirror the SQLite schema and get passed throughout the
//! TUI. These types stay light-weight data holders so the persistence and
//! presentation layers can exchange plain records instead of sharing view
//! state.

#[derive(Debug, Clone, PartialEq, Eq)]
/// One persisted note. Mirrors a row of the `blogs` table.
pub struct BlogEntry {
    /// Primary key from the database. The UI keeps it around even though it
    /// only displays name and body, because select/delete/detail flows bubble
    /// the id back to the persistence layer.
    pub id: i64,
    /// Short title shown on every list card.
    pub name: String,
    /// Full note text. Only the first line appears on the card; the detail
    /// view shows the rest.
    pub body: String,
}

impl BlogEntry {
    /// First line of the body, truncated to `max` characters, for list cards.
    pub fn body_preview(&self, max: usize) -> String {
        let first_line = self.body.lines().next().unwrap_or_default();
        let mut preview: String = first_line.chars().take(max).collect();
        if first_line.chars().count() > max {
            preview.push('…');
        }
        preview
    }
}
