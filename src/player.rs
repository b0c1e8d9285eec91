use crate::models::{MediaItem, MediaKind};

const EMBED_BASE: &str = "https://www.2embed.cc";
const EMBED_SERVER: &str = "player4u";

/// Identifiers the third-party embed player needs. Playback itself is the
/// embed provider's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackTarget {
    pub kind: MediaKind,
    pub id: i64,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl PlaybackTarget {
    pub fn movie(id: i64) -> Self {
        Self {
            kind: MediaKind::Movie,
            id,
            season: None,
            episode: None,
        }
    }

    pub fn episode(id: i64, season: u32, episode: u32) -> Self {
        Self {
            kind: MediaKind::Tv,
            id,
            season: Some(season),
            episode: Some(episode),
        }
    }

    pub fn for_item(item: &MediaItem, season: Option<u32>, episode: Option<u32>) -> Self {
        Self {
            kind: item.kind,
            id: item.id,
            season,
            episode,
        }
    }

    /// Movies ignore season/episode; tv defaults to S1E1.
    pub fn embed_url(&self) -> String {
        match self.kind {
            MediaKind::Movie => format!("{EMBED_BASE}/embed/{}?sv={EMBED_SERVER}", self.id),
            MediaKind::Tv => format!(
                "{EMBED_BASE}/embedtv/{}?s={}&e={}&sv={EMBED_SERVER}",
                self.id,
                self.season.unwrap_or(1),
                self.episode.unwrap_or(1)
            ),
        }
    }
}
