/// One content row the view asks the upstream for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub label: &'static str,
    pub endpoint: &'static str,
    pub params: &'static [(&'static str, &'static str)],
}

/// Loading recipe for a named view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewConfig {
    pub name: &'static str,
    pub hero_endpoint: Option<&'static str>,
    pub categories: &'static [Category],
    pub include_continue_watching: bool,
    pub include_my_list: bool,
}

const fn category(label: &'static str, endpoint: &'static str) -> Category {
    Category {
        label,
        endpoint,
        params: &[],
    }
}

pub const HOME: ViewConfig = ViewConfig {
    name: "home",
    hero_endpoint: Some("trending/all/week"),
    categories: &[
        category("Trending This Week", "trending/all/week"),
        Category {
            label: "Popular in India",
            endpoint: "discover/movie",
            params: &[
                ("region", "IN"),
                ("sort_by", "popularity.desc"),
                ("with_original_language", "hi|te|ta"),
            ],
        },
        category("Top Rated Movies", "movie/top_rated"),
        category("Popular TV Shows", "tv/popular"),
    ],
    include_continue_watching: true,
    include_my_list: false,
};

pub const MOVIES: ViewConfig = ViewConfig {
    name: "movies",
    hero_endpoint: Some("movie/popular"),
    categories: &[
        category("Popular Movies", "movie/popular"),
        category("Now Playing", "movie/now_playing"),
        category("Upcoming", "movie/upcoming"),
        category("Top Rated Movies", "movie/top_rated"),
        Category {
            label: "Action",
            endpoint: "discover/movie",
            params: &[("with_genres", "28")],
        },
        Category {
            label: "Comedy",
            endpoint: "discover/movie",
            params: &[("with_genres", "35")],
        },
    ],
    include_continue_watching: false,
    include_my_list: false,
};

pub const TV: ViewConfig = ViewConfig {
    name: "tv",
    hero_endpoint: Some("tv/popular"),
    categories: &[
        category("Popular TV Shows", "tv/popular"),
        category("Airing Today", "tv/airing_today"),
        category("On The Air", "tv/on_the_air"),
        category("Top Rated TV", "tv/top_rated"),
        Category {
            label: "Crime",
            endpoint: "discover/tv",
            params: &[("with_genres", "80")],
        },
    ],
    include_continue_watching: false,
    include_my_list: false,
};

pub const MY_LIST: ViewConfig = ViewConfig {
    name: "my-list",
    hero_endpoint: None,
    categories: &[],
    include_continue_watching: true,
    include_my_list: true,
};

/// Results land in `search_results`; the view itself has no rows.
pub const SEARCH: ViewConfig = ViewConfig {
    name: "search",
    hero_endpoint: None,
    categories: &[],
    include_continue_watching: false,
    include_my_list: false,
};

pub const PROFILE: ViewConfig = ViewConfig {
    name: "profile",
    hero_endpoint: None,
    categories: &[],
    include_continue_watching: true,
    include_my_list: false,
};

pub const VIEWS: &[ViewConfig] = &[HOME, MOVIES, TV, MY_LIST, SEARCH, PROFILE];

pub fn lookup(name: &str) -> Option<&'static ViewConfig> {
    VIEWS.iter().find(|v| v.name == name)
}
