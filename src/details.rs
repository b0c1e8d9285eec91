use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::fetch::CatalogSource;
use crate::models::{parse_results, MediaItem, MediaKind};

const MAX_CAST: usize = 8;
const MAX_RECOMMENDATIONS: usize = 12;
pub const TRAILER_UNAVAILABLE: &str = "Trailer not available.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleDetails {
    pub item: MediaItem,
    pub tagline: Option<String>,
    pub genres: Vec<String>,
    pub release_date: Option<String>,
    pub runtime_minutes: Option<u32>,
    pub vote_average: Option<f64>,
    pub trailer: Option<Trailer>,
    pub cast: Vec<CastMember>,
    pub recommendations: Vec<MediaItem>,
    pub seasons: Vec<SeasonSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trailer {
    pub key: String,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct CastMember {
    pub name: String,
    pub character: Option<String>,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct SeasonSummary {
    pub season_number: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub episode_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    pub show_id: i64,
    pub season_number: u32,
    pub name: String,
    pub episodes: Vec<Episode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Episode {
    pub episode_number: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub overview: String,
    pub still_path: Option<String>,
}

/// Result of a trailer lookup. `Unavailable` carries the one notice shown to
/// the user; it never blocks anything else.
#[derive(Debug, Clone, PartialEq)]
pub enum TrailerLookup {
    Found(Trailer),
    Unavailable,
}

impl TrailerLookup {
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            TrailerLookup::Found(_) => None,
            TrailerLookup::Unavailable => Some(TRAILER_UNAVAILABLE),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Videos {
    #[serde(default)]
    results: Vec<Video>,
}

#[derive(Debug, Deserialize)]
struct Video {
    #[serde(default)]
    site: String,
    #[serde(rename = "type", default)]
    video_type: String,
    key: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct Credits {
    #[serde(default)]
    cast: Vec<CastMember>,
}

#[derive(Debug, Deserialize)]
struct Genre {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct DetailExtras {
    tagline: Option<String>,
    #[serde(default)]
    genres: Vec<Genre>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    runtime: Option<u32>,
    episode_run_time: Option<Vec<u32>>,
    vote_average: Option<f64>,
    videos: Option<Videos>,
    credits: Option<Credits>,
    seasons: Option<Vec<SeasonSummary>>,
}

#[derive(Debug, Deserialize)]
struct SeasonDetail {
    #[serde(default)]
    name: String,
    #[serde(default)]
    episodes: Vec<Episode>,
}

/// Movie detail with videos and credits appended, fetched together with the
/// recommendations.
pub async fn movie_details(source: &dyn CatalogSource, id: i64) -> Option<TitleDetails> {
    let path = format!("movie/{id}");
    let recs_path = format!("movie/{id}/recommendations");
    let (detail, recs) = tokio::join!(
        source.fetch(&path, &[("append_to_response", "videos,credits")]),
        source.fetch(&recs_path, &[]),
    );
    let recommendations = recs.map(|page| recommendations_from(&page)).unwrap_or_default();
    build_details(&detail?, MediaKind::Movie, recommendations)
}

/// Leading recommendations, minus the ones without a poster.
fn recommendations_from(page: &Value) -> Vec<MediaItem> {
    parse_results(page, Some(MediaKind::Movie))
        .into_iter()
        .take(MAX_RECOMMENDATIONS)
        .filter(|m| m.poster_path.is_some())
        .collect()
}

pub async fn show_details(source: &dyn CatalogSource, id: i64) -> Option<TitleDetails> {
    let path = format!("tv/{id}");
    let detail = source
        .fetch(&path, &[("append_to_response", "videos,credits")])
        .await?;
    build_details(&detail, MediaKind::Tv, Vec::new())
}

pub async fn season(
    source: &dyn CatalogSource,
    show_id: i64,
    season_number: u32,
) -> Option<Season> {
    let path = format!("tv/{show_id}/season/{season_number}");
    let raw = source.fetch(&path, &[]).await?;
    match serde_json::from_value::<SeasonDetail>(raw) {
        Ok(detail) => Some(Season {
            show_id,
            season_number,
            name: detail.name,
            episodes: detail.episodes,
        }),
        Err(e) => {
            warn!("Unexpected season shape for {}: {}", path, e);
            None
        }
    }
}

pub async fn trailer(source: &dyn CatalogSource, kind: MediaKind, id: i64) -> TrailerLookup {
    let path = format!("{kind}/{id}/videos");
    source
        .fetch(&path, &[])
        .await
        .and_then(|raw| serde_json::from_value::<Videos>(raw).ok())
        .and_then(|videos| select_trailer(&videos))
        .map(TrailerLookup::Found)
        .unwrap_or(TrailerLookup::Unavailable)
}

fn build_details(
    raw: &Value,
    kind: MediaKind,
    recommendations: Vec<MediaItem>,
) -> Option<TitleDetails> {
    let item = MediaItem::from_upstream(raw, Some(kind))?;
    let extras: DetailExtras = match serde_json::from_value(raw.clone()) {
        Ok(extras) => extras,
        Err(e) => {
            warn!("Unexpected detail shape for {} {}: {}", kind, item.id, e);
            DetailExtras::default()
        }
    };

    let trailer = extras.videos.as_ref().and_then(select_trailer);
    let cast = extras
        .credits
        .unwrap_or_default()
        .cast
        .into_iter()
        .take(MAX_CAST)
        .filter(|c| c.profile_path.is_some())
        .collect();
    let seasons = extras
        .seasons
        .unwrap_or_default()
        .into_iter()
        .filter(|s| s.season_number > 0 && s.episode_count > 0)
        .collect();

    Some(TitleDetails {
        item,
        tagline: extras.tagline.filter(|t| !t.is_empty()),
        genres: extras.genres.into_iter().map(|g| g.name).collect(),
        release_date: extras.release_date.or(extras.first_air_date),
        runtime_minutes: extras
            .runtime
            .or_else(|| extras.episode_run_time.and_then(|r| r.first().copied())),
        vote_average: extras.vote_average,
        trailer,
        cast,
        recommendations,
        seasons,
    })
}

fn select_trailer(videos: &Videos) -> Option<Trailer> {
    videos
        .results
        .iter()
        .find(|v| v.site.eq_ignore_ascii_case("YouTube") && v.video_type == "Trailer")
        .map(|v| Trailer {
            key: v.key.clone(),
            name: v.name.clone(),
            url: format!("https://www.youtube.com/watch?v={}", v.key),
        })
}
