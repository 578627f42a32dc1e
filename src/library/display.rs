use super::model::{Track, UNKNOWN_ARTIST};

/// Format milliseconds as `m:ss` (minutes are not wrapped into hours).
pub fn format_duration(duration_ms: u64) -> String {
    let total_seconds = duration_ms / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

impl Track {
    /// One-line label: `Artist - Title`, or just the title when the artist is unknown.
    pub fn display(&self) -> String {
        if self.artist == UNKNOWN_ARTIST {
            self.title.clone()
        } else {
            format!("{} - {}", self.artist, self.title)
        }
    }
}
