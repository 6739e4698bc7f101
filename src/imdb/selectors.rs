//! CSS selectors for IMDb HTML parsing.
//!
//! This file contains all CSS selectors used for parsing IMDb pages.
//! Update this file when IMDb changes their HTML structure.
//!
//! Title page fields come in primary/secondary pairs: the secondary
//! selector is only consulted when the primary matches nothing.

use scraper::Selector;
use std::sync::LazyLock;

/// Embedded structured data.
pub mod structured {
    use super::*;

    pub static JSON_LD: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("script[type='application/ld+json']").unwrap());
}

/// Selectors for the chart (listing) page.
pub mod listing {
    use super::*;

    /// Ranked title links, legacy heading-wrapped markup and the current wrapper link.
    pub static TITLE_LINK: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "h3.ipc-title__text a[href*='/title/'], \
             a.ipc-title-link-wrapper[href*='/title/']",
        )
        .unwrap()
    });

    /// Any link on the page (generic tier).
    pub static ANY_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

    /// Path fragment identifying a title page link.
    pub const TITLE_PATH: &str = "/title/";

    /// Stricter fragment used by the generic tier.
    pub const TITLE_ID_PATH: &str = "/title/tt";
}

/// Selectors for individual title pages.
pub mod title {
    use super::*;

    pub static HEADING: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "h1[data-testid='hero-title-block__title'], \
             h1[data-testid='hero__pageTitle']",
        )
        .unwrap()
    });

    pub static HEADING_FALLBACK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("h1.sc-afe43def-0").unwrap());

    /// First metadata list item holds the release year.
    pub static YEAR: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse("span[data-testid='hero-title-block__metadata'] li").unwrap()
    });

    pub static YEAR_FALLBACK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("ul.ipc-inline-list li").unwrap());

    pub static RATING: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse("span[data-testid='hero-rating-bar__aggregate-rating__score'] span")
            .unwrap()
    });

    pub static RATING_FALLBACK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.sc-7ab21ed2-1").unwrap());

    pub static RUNTIME: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("li[data-testid='title-techspec-runtime']").unwrap());

    pub static RUNTIME_FALLBACK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("time").unwrap());

    pub static CAST: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("a[data-testid='title-cast-item__actor']").unwrap());

    pub static CAST_FALLBACK: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse("div[data-testid='title-cast'] a[href*='/name/']").unwrap()
    });

    /// Metascore candidates, tried in this order.
    pub static METASCORE: LazyLock<[Selector; 3]> = LazyLock::new(|| {
        [
            Selector::parse("span.metacritic-score-box").unwrap(),
            Selector::parse("div[data-testid='metacritic-score-box']").unwrap(),
            Selector::parse("span.score-meta").unwrap(),
        ]
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_selectors_compile() {
        let _ = &*structured::JSON_LD;
        let _ = &*listing::TITLE_LINK;
        let _ = &*listing::ANY_LINK;
        let _ = &*title::HEADING;
        let _ = &*title::HEADING_FALLBACK;
        let _ = &*title::YEAR;
        let _ = &*title::YEAR_FALLBACK;
        let _ = &*title::RATING;
        let _ = &*title::RATING_FALLBACK;
        let _ = &*title::RUNTIME;
        let _ = &*title::RUNTIME_FALLBACK;
        let _ = &*title::CAST;
        let _ = &*title::CAST_FALLBACK;
        assert_eq!(title::METASCORE.len(), 3);
    }

    #[test]
    fn test_title_link_matching() {
        let html = Html::parse_document(
            r#"<ul>
                <li><h3 class="ipc-title__text"><a href="/title/tt0111161/">1. The Shawshank Redemption</a></h3></li>
                <li><a class="ipc-title-link-wrapper" href="/title/tt0068646/"><h3 class="ipc-title__text">2. The Godfather</h3></a></li>
                <li><a href="/name/nm0000209/">Tim Robbins</a></li>
            </ul>"#,
        );

        let links: Vec<_> = html
            .select(&listing::TITLE_LINK)
            .filter_map(|a| a.value().attr("href"))
            .collect();
        assert_eq!(links, vec!["/title/tt0111161/", "/title/tt0068646/"]);
    }
}
