/// Film and series catalog
///
/// Movies and series share one id space but are distinct variants of a
/// tagged union, so lookups are exhaustive - no "try as movie, else try as
/// series" probing. The catalog seeds from fixture data in mock mode and
/// refreshes from the backend otherwise, always falling back to local data
/// when the network misbehaves.
use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Rating bands for the lemon-pie scale.
/// Boundaries: pie >= 7.0, neutral [4.0, 7.0), lemon < 4.0. The 4.0 edge is
/// neutral, settling an inconsistency in the original frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingBand {
    Pie,
    Neutral,
    Lemon,
}

impl RatingBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            RatingBand::Pie => "pie",
            RatingBand::Neutral => "neutral",
            RatingBand::Lemon => "lemon",
        }
    }

    pub fn from_str(s: &str) -> AppResult<Self> {
        match s.to_lowercase().as_str() {
            "pie" => Ok(RatingBand::Pie),
            "neutral" => Ok(RatingBand::Neutral),
            "lemon" => Ok(RatingBand::Lemon),
            _ => Err(AppError::Validation(format!("Invalid rating band: {}", s))),
        }
    }

    pub fn of(rating: f32) -> Self {
        if rating >= 7.0 {
            RatingBand::Pie
        } else if rating >= 4.0 {
            RatingBand::Neutral
        } else {
            RatingBand::Lemon
        }
    }
}

/// Series production status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesStatus {
    Ongoing,
    Completed,
    Cancelled,
}

/// A feature film
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub local_title: Option<String>,
    pub release_date: NaiveDate,
    pub runtime_minutes: u32,
    pub genres: Vec<String>,
    pub languages: Vec<String>,
    pub director: String,
    pub producer: String,
    pub cast: Vec<String>,
    pub plot_summary: String,
    pub production_state: String,
    pub streaming_platforms: Vec<String>,
    pub lemon_pie_rating: f32,
    pub review_count: u32,
}

/// A TV series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: String,
    pub title: String,
    pub local_title: Option<String>,
    pub release_date: NaiveDate,
    pub seasons: u32,
    pub episodes: u32,
    pub genres: Vec<String>,
    pub languages: Vec<String>,
    pub creator: String,
    pub producer: String,
    pub cast: Vec<String>,
    pub plot_summary: String,
    pub production_state: String,
    pub streaming_platforms: Vec<String>,
    pub status: SeriesStatus,
    pub lemon_pie_rating: f32,
    pub review_count: u32,
}

/// A catalog entry: movie or series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Work {
    Movie(Movie),
    Series(Series),
}

impl Work {
    pub fn id(&self) -> &str {
        match self {
            Work::Movie(m) => &m.id,
            Work::Series(s) => &s.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Work::Movie(m) => &m.title,
            Work::Series(s) => &s.title,
        }
    }

    pub fn local_title(&self) -> Option<&str> {
        match self {
            Work::Movie(m) => m.local_title.as_deref(),
            Work::Series(s) => s.local_title.as_deref(),
        }
    }

    pub fn release_date(&self) -> NaiveDate {
        match self {
            Work::Movie(m) => m.release_date,
            Work::Series(s) => s.release_date,
        }
    }

    pub fn genres(&self) -> &[String] {
        match self {
            Work::Movie(m) => &m.genres,
            Work::Series(s) => &s.genres,
        }
    }

    pub fn languages(&self) -> &[String] {
        match self {
            Work::Movie(m) => &m.languages,
            Work::Series(s) => &s.languages,
        }
    }

    pub fn cast(&self) -> &[String] {
        match self {
            Work::Movie(m) => &m.cast,
            Work::Series(s) => &s.cast,
        }
    }

    /// Director for films, creator for series
    pub fn credited_lead(&self) -> &str {
        match self {
            Work::Movie(m) => &m.director,
            Work::Series(s) => &s.creator,
        }
    }

    pub fn production_state(&self) -> &str {
        match self {
            Work::Movie(m) => &m.production_state,
            Work::Series(s) => &s.production_state,
        }
    }

    pub fn rating(&self) -> f32 {
        match self {
            Work::Movie(m) => m.lemon_pie_rating,
            Work::Series(s) => s.lemon_pie_rating,
        }
    }

    pub fn review_count(&self) -> u32 {
        match self {
            Work::Movie(m) => m.review_count,
            Work::Series(s) => s.review_count,
        }
    }

    pub fn band(&self) -> RatingBand {
        RatingBand::of(self.rating())
    }

    pub fn is_series(&self) -> bool {
        matches!(self, Work::Series(_))
    }
}

/// Sort keys for catalog listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Title,
    Year,
    Rating,
    Reviews,
}

/// Ascending is the default everywhere a sort is exposed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Catalog filters; empty filters match everything
#[derive(Debug, Clone, Default)]
pub struct WorkFilters {
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub language: Option<String>,
    pub production_state: Option<String>,
    pub band: Option<RatingBand>,
}

/// In-memory catalog store
pub struct Catalog {
    config: Arc<AppConfig>,
    api: Arc<ApiClient>,
    works: RwLock<Vec<Work>>,
}

impl Catalog {
    pub fn new(config: Arc<AppConfig>, api: Arc<ApiClient>) -> Self {
        Self {
            config,
            api,
            works: RwLock::new(Vec::new()),
        }
    }

    /// Catalog pre-populated with fixture works
    pub fn seeded(config: Arc<AppConfig>, api: Arc<ApiClient>) -> Self {
        Self {
            config,
            api,
            works: RwLock::new(seed_works()),
        }
    }

    pub async fn insert(&self, work: Work) {
        self.works.write().await.push(work);
    }

    pub async fn replace_all(&self, works: Vec<Work>) {
        *self.works.write().await = works;
    }

    pub async fn get(&self, id: &str) -> Option<Work> {
        self.works
            .read()
            .await
            .iter()
            .find(|w| w.id() == id)
            .cloned()
    }

    pub async fn all(&self) -> Vec<Work> {
        self.works.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.works.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.works.read().await.is_empty()
    }

    /// Refresh the catalog from the backend. Failures keep the local data.
    pub async fn refresh(&self) -> AppResult<usize> {
        if self.config.api.mock_mode {
            return Ok(self.len().await);
        }

        match self.api.movies().await {
            Ok(works) => {
                let count = works.len();
                self.replace_all(works).await;
                Ok(count)
            }
            Err(e) => {
                tracing::warn!("Catalog refresh failed, keeping local data: {}", e);
                Err(e)
            }
        }
    }

    /// Case-insensitive substring search over titles, credited lead, cast,
    /// and genres. In API mode the backend search is tried first and this
    /// local filter is the fallback.
    pub async fn search(&self, query: &str) -> Vec<Work> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        if !self.config.api.mock_mode {
            match self.api.search_movies(query).await {
                Ok(works) => return works,
                Err(e) => {
                    tracing::debug!("Remote search failed, using local filter: {}", e);
                }
            }
        }

        self.search_local(query).await
    }

    pub async fn search_local(&self, query: &str) -> Vec<Work> {
        let needle = query.to_lowercase();
        let matches = |text: &str| text.to_lowercase().contains(&needle);

        self.works
            .read()
            .await
            .iter()
            .filter(|w| {
                matches(w.title())
                    || w.local_title().map(matches).unwrap_or(false)
                    || matches(w.credited_lead())
                    || w.cast().iter().any(|c| matches(c))
                    || w.genres().iter().any(|g| matches(g))
            })
            .cloned()
            .collect()
    }

    pub async fn filter(&self, filters: &WorkFilters) -> Vec<Work> {
        let matches_opt = |value: &str, filter: &Option<String>| {
            filter
                .as_ref()
                .map(|f| value.to_lowercase().contains(&f.to_lowercase()))
                .unwrap_or(true)
        };

        self.works
            .read()
            .await
            .iter()
            .filter(|w| {
                filters
                    .genre
                    .as_ref()
                    .map(|g| {
                        w.genres()
                            .iter()
                            .any(|x| x.to_lowercase().contains(&g.to_lowercase()))
                    })
                    .unwrap_or(true)
                    && filters
                        .year
                        .map(|y| {
                            use chrono::Datelike;
                            w.release_date().year() == y
                        })
                        .unwrap_or(true)
                    && filters
                        .language
                        .as_ref()
                        .map(|l| {
                            w.languages()
                                .iter()
                                .any(|x| x.to_lowercase().contains(&l.to_lowercase()))
                        })
                        .unwrap_or(true)
                    && matches_opt(w.production_state(), &filters.production_state)
                    && filters.band.map(|b| w.band() == b).unwrap_or(true)
            })
            .cloned()
            .collect()
    }

    pub async fn by_band(&self, band: RatingBand) -> Vec<Work> {
        self.works
            .read()
            .await
            .iter()
            .filter(|w| w.band() == band)
            .cloned()
            .collect()
    }

    /// Top-rated works, descending
    pub async fn top_rated(&self, limit: usize) -> Vec<Work> {
        let mut works = self.all().await;
        sort_works(&mut works, SortKey::Rating, SortOrder::Descending);
        works.truncate(limit);
        works
    }

    /// Most recently released works
    pub async fn recently_added(&self, limit: usize) -> Vec<Work> {
        let mut works = self.all().await;
        sort_works(&mut works, SortKey::Year, SortOrder::Descending);
        works.truncate(limit);
        works
    }

    /// Trending: backend signal in API mode, review-count proxy locally
    pub async fn trending(&self, limit: usize) -> Vec<Work> {
        if !self.config.api.mock_mode {
            match self.api.trending().await {
                Ok(works) => return works,
                Err(e) => {
                    tracing::debug!("Trending fetch failed, using local proxy: {}", e);
                }
            }
        }

        let mut works = self.all().await;
        sort_works(&mut works, SortKey::Reviews, SortOrder::Descending);
        works.truncate(limit);
        works
    }

    /// Featured work: backend pick in API mode, highest rated locally
    pub async fn featured(&self) -> Option<Work> {
        if !self.config.api.mock_mode {
            match self.api.featured().await {
                Ok(work) => return Some(work),
                Err(e) => {
                    tracing::debug!("Featured fetch failed, using local pick: {}", e);
                }
            }
        }

        self.top_rated(1).await.into_iter().next()
    }

    pub async fn sorted(&self, key: SortKey, order: SortOrder) -> Vec<Work> {
        let mut works = self.all().await;
        sort_works(&mut works, key, order);
        works
    }
}

/// Sort a slice of works in place
pub fn sort_works(works: &mut [Work], key: SortKey, order: SortOrder) {
    works.sort_by(|a, b| {
        let ordering = match key {
            SortKey::Title => a.title().cmp(b.title()),
            SortKey::Year => a.release_date().cmp(&b.release_date()),
            SortKey::Rating => a
                .rating()
                .partial_cmp(&b.rating())
                .unwrap_or(Ordering::Equal),
            SortKey::Reviews => a.review_count().cmp(&b.review_count()),
        };

        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}

/// Fixture catalog: a spread of ratings across both bands and kinds
fn seed_works() -> Vec<Work> {
    let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
    let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    vec![
        Work::Movie(Movie {
            id: "1".to_string(),
            title: "The Wedding Party 2".to_string(),
            local_title: Some("Ogbako Igbeyawo 2".to_string()),
            release_date: date(2017, 12, 15),
            runtime_minutes: 98,
            genres: strings(&["Comedy", "Romance"]),
            languages: strings(&["English", "Yoruba"]),
            director: "Niyi Akinmolayan".to_string(),
            producer: "Mo Abudu".to_string(),
            cast: strings(&["Adesua Etomi", "Banky Wellington", "Sola Sobowale"]),
            plot_summary: "Nonso proposes to Deirdre by accident and sets off a chain of \
                           events too powerful to stop."
                .to_string(),
            production_state: "Lagos".to_string(),
            streaming_platforms: strings(&["Netflix", "Prime Video"]),
            lemon_pie_rating: 8.2,
            review_count: 1247,
        }),
        Work::Movie(Movie {
            id: "2".to_string(),
            title: "King of Boys".to_string(),
            local_title: Some("Oba Awon Omokunrin".to_string()),
            release_date: date(2018, 10, 26),
            runtime_minutes: 170,
            genres: strings(&["Crime", "Drama", "Thriller"]),
            languages: strings(&["English", "Yoruba"]),
            director: "Kemi Adetiba".to_string(),
            producer: "Kemi Adetiba".to_string(),
            cast: strings(&["Sola Sobowale", "Adesua Etomi", "Reminisce"]),
            plot_summary: "A businesswoman doubling as a crime boss must choose between her \
                           family and her empire."
                .to_string(),
            production_state: "Lagos".to_string(),
            streaming_platforms: strings(&["Netflix"]),
            lemon_pie_rating: 9.1,
            review_count: 2103,
        }),
        Work::Movie(Movie {
            id: "3".to_string(),
            title: "Dry Bones Rising".to_string(),
            local_title: None,
            release_date: date(2021, 5, 7),
            runtime_minutes: 104,
            genres: strings(&["Drama"]),
            languages: strings(&["English"]),
            director: "Tunde Bakare".to_string(),
            producer: "Ada Eze".to_string(),
            cast: strings(&["Chidi Mokeme", "Ini Edo"]),
            plot_summary: "A hastily produced village drama that never finds its footing."
                .to_string(),
            production_state: "Enugu".to_string(),
            streaming_platforms: strings(&["IrokoTV"]),
            lemon_pie_rating: 3.2,
            review_count: 88,
        }),
        Work::Movie(Movie {
            id: "4".to_string(),
            title: "Midnight Okada".to_string(),
            local_title: None,
            release_date: date(2020, 2, 14),
            runtime_minutes: 92,
            genres: strings(&["Action"]),
            languages: strings(&["Pidgin", "English"]),
            director: "Femi Olatunde".to_string(),
            producer: "Femi Olatunde".to_string(),
            cast: strings(&["Zubby Michael"]),
            plot_summary: "A motorcycle courier takes one last job across Lagos at night."
                .to_string(),
            production_state: "Lagos".to_string(),
            streaming_platforms: strings(&[]),
            lemon_pie_rating: 2.1,
            review_count: 41,
        }),
        Work::Series(Series {
            id: "5".to_string(),
            title: "Checkmate Reloaded".to_string(),
            local_title: None,
            release_date: date(2022, 9, 1),
            seasons: 2,
            episodes: 26,
            genres: strings(&["Drama", "Soap"]),
            languages: strings(&["English", "Igbo"]),
            creator: "Amaka Igwe Studios".to_string(),
            producer: "Obi Nwankwo".to_string(),
            cast: strings(&["Nse Ikpe-Etim", "Richard Mofe-Damijo"]),
            plot_summary: "A family fights to keep its business from corporate raiders."
                .to_string(),
            production_state: "Lagos".to_string(),
            streaming_platforms: strings(&["Showmax"]),
            status: SeriesStatus::Ongoing,
            lemon_pie_rating: 6.8,
            review_count: 312,
        }),
        Work::Series(Series {
            id: "6".to_string(),
            title: "Shanty Town Tales".to_string(),
            local_title: None,
            release_date: date(2023, 1, 20),
            seasons: 1,
            episodes: 8,
            genres: strings(&["Crime", "Thriller"]),
            languages: strings(&["English", "Hausa"]),
            creator: "Dimbo Atiya".to_string(),
            producer: "Chichi Nworah".to_string(),
            cast: strings(&["Ini Edo", "Chidi Mokeme"]),
            plot_summary: "A crime lord tightens his grip on a coastal slum as its residents \
                           plot their escape."
                .to_string(),
            production_state: "Lagos".to_string(),
            streaming_platforms: strings(&["Netflix"]),
            status: SeriesStatus::Completed,
            lemon_pie_rating: 7.4,
            review_count: 540,
        }),
    ]
}
