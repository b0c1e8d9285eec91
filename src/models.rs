use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/";
pub const POSTER_SIZE: &str = "w500";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "tv",
        }
    }

    /// Kind implied by the upstream endpoint that produced a result list.
    pub fn from_endpoint(endpoint: &str) -> Option<Self> {
        let mut segments = endpoint.trim_matches('/').split('/');
        let first = segments.next()?;
        let candidate = match first {
            "discover" | "search" | "trending" => segments.next()?,
            other => other,
        };
        candidate.parse().ok()
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "movie" => Ok(MediaKind::Movie),
            "tv" => Ok(MediaKind::Tv),
            _ => Err(anyhow::anyhow!("media kind must be 'movie' or 'tv'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: i64,
    pub kind: MediaKind,
    pub title: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub overview: String,
}

impl MediaItem {
    /// Normalizes one upstream result into an explicit `MediaItem`.
    ///
    /// Kind is resolved in a fixed order: the upstream `media_type` field, then
    /// the kind implied by the requesting endpoint (`hint`), then the presence of
    /// `title` (movie) or `name` (tv). Entries that are people, or that cannot
    /// be resolved, are skipped.
    pub fn from_upstream(raw: &Value, hint: Option<MediaKind>) -> Option<Self> {
        let id = raw.get("id").and_then(Value::as_i64)?;
        let title_field = non_empty_str(raw, "title");
        let name_field = non_empty_str(raw, "name");

        let kind = match raw.get("media_type").and_then(Value::as_str) {
            Some(media_type) => media_type.parse().ok()?,
            None => match hint {
                Some(kind) => kind,
                None if title_field.is_some() => MediaKind::Movie,
                None if name_field.is_some() => MediaKind::Tv,
                None => return None,
            },
        };

        let title = match kind {
            MediaKind::Movie => title_field.or(name_field),
            MediaKind::Tv => name_field.or(title_field),
        }?;

        Some(Self {
            id,
            kind,
            title: title.to_string(),
            poster_path: non_empty_str(raw, "poster_path").map(str::to_string),
            backdrop_path: non_empty_str(raw, "backdrop_path").map(str::to_string),
            overview: raw
                .get("overview")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }

    pub fn poster_url(&self) -> Option<String> {
        self.poster_path
            .as_deref()
            .map(|p| image_url(p, POSTER_SIZE))
    }
}

fn non_empty_str<'a>(raw: &'a Value, key: &str) -> Option<&'a str> {
    raw.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub fn image_url(path: &str, size: &str) -> String {
    format!("{IMAGE_BASE}{size}{path}")
}

/// Extracts the `results` array of a paginated upstream response.
pub fn parse_results(page: &Value, hint: Option<MediaKind>) -> Vec<MediaItem> {
    page.get("results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .filter_map(|raw| MediaItem::from_upstream(raw, hint))
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub title: String,
    pub items: Vec<MediaItem>,
}

/// Persisted projection of a `MediaItem`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListEntry {
    pub id: i64,
    pub kind: MediaKind,
    pub poster_path: Option<String>,
    pub title: String,
}

impl UserListEntry {
    pub fn matches(&self, id: i64, kind: MediaKind) -> bool {
        self.id == id && self.kind == kind
    }
}

impl From<&MediaItem> for UserListEntry {
    fn from(item: &MediaItem) -> Self {
        Self {
            id: item.id,
            kind: item.kind,
            poster_path: item.poster_path.clone(),
            title: item.title.clone(),
        }
    }
}

impl From<&UserListEntry> for MediaItem {
    fn from(entry: &UserListEntry) -> Self {
        Self {
            id: entry.id,
            kind: entry.kind,
            title: entry.title.clone(),
            poster_path: entry.poster_path.clone(),
            backdrop_path: None,
            overview: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub view: String,
    pub hero: Option<MediaItem>,
    pub rows: Vec<Row>,
    pub search_results: Vec<MediaItem>,
    pub is_loading: bool,
}

impl ViewModel {
    pub fn empty(view: &str) -> Self {
        Self {
            view: view.to_string(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn media_type_wins_over_endpoint_hint() {
        let raw = json!({"id": 1, "media_type": "tv", "name": "Show", "title": "Ignored"});
        let item = MediaItem::from_upstream(&raw, Some(MediaKind::Movie)).unwrap();
        assert_eq!(item.kind, MediaKind::Tv);
        assert_eq!(item.title, "Show");
    }

    #[test]
    fn endpoint_hint_wins_over_field_presence() {
        // A tv entry that unexpectedly carries `title` stays tv.
        let raw = json!({"id": 7, "title": "Odd Show"});
        let item = MediaItem::from_upstream(&raw, Some(MediaKind::Tv)).unwrap();
        assert_eq!(item.kind, MediaKind::Tv);
        assert_eq!(item.title, "Odd Show");
    }

    #[test]
    fn falls_back_to_title_or_name() {
        let movie = MediaItem::from_upstream(&json!({"id": 2, "title": "Film"}), None).unwrap();
        let show = MediaItem::from_upstream(&json!({"id": 3, "name": "Series"}), None).unwrap();
        assert_eq!(movie.kind, MediaKind::Movie);
        assert_eq!(show.kind, MediaKind::Tv);
    }

    #[test]
    fn skips_people_and_unresolvable_entries() {
        let person = json!({"id": 4, "media_type": "person", "name": "Actor"});
        assert!(MediaItem::from_upstream(&person, None).is_none());
        assert!(MediaItem::from_upstream(&json!({"id": 5}), None).is_none());
        assert!(MediaItem::from_upstream(&json!({"title": "No id"}), None).is_none());
    }

    #[test]
    fn missing_images_are_absent_not_errors() {
        let raw = json!({"id": 9, "title": "Film", "poster_path": null, "backdrop_path": ""});
        let item = MediaItem::from_upstream(&raw, None).unwrap();
        assert!(item.poster_path.is_none());
        assert!(item.backdrop_path.is_none());
        assert!(item.poster_url().is_none());
        assert_eq!(item.overview, "");
    }

    #[test]
    fn endpoint_kinds() {
        assert_eq!(MediaKind::from_endpoint("movie/top_rated"), Some(MediaKind::Movie));
        assert_eq!(MediaKind::from_endpoint("discover/tv"), Some(MediaKind::Tv));
        assert_eq!(MediaKind::from_endpoint("trending/movie/week"), Some(MediaKind::Movie));
        assert_eq!(MediaKind::from_endpoint("trending/all/week"), None);
        assert_eq!(MediaKind::from_endpoint("search/multi"), None);
    }

    #[test]
    fn poster_url_uses_w500() {
        let raw = json!({"id": 1, "title": "Film", "poster_path": "/p.jpg"});
        let item = MediaItem::from_upstream(&raw, None).unwrap();
        assert_eq!(
            item.poster_url().as_deref(),
            Some("https://image.tmdb.org/t/p/w500/p.jpg")
        );
    }

    #[test]
    fn user_list_entry_uses_camel_case_keys() {
        let entry = UserListEntry {
            id: 550,
            kind: MediaKind::Movie,
            poster_path: Some("/x.jpg".to_string()),
            title: "Fight Club".to_string(),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["posterPath"], "/x.jpg");
        assert_eq!(value["kind"], "movie");
    }
}
