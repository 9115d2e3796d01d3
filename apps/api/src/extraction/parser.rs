//! Markup parser for the jobs.ac.uk search results page.
//!
//! Pure function of (html, origin): no I/O, so fixtures exercise it directly.
//! Selector drift degrades to an empty result, never an error.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::models::job::{JobListing, DEFAULT_SALARY, SOURCE_JOBS_AC_UK};

const RESULT_CONTAINER: &str = ".j-search-result__result";
const TITLE_ANCHOR: &str = ".j-search-result__text a";
const EMPLOYER: &str = ".j-search-result__employer";
const LOCATION: &str = ".j-search-result__department";
const INFO_BLOCK: &str = ".j-search-result__info";
const CLOSING_DATE: &str = ".j-search-result__date--blue";
const LOGO_IMAGE: &str = ".j-search-result__small-logo img";

const ADVERT_ID_ATTR: &str = "data-advert-id";
const SALARY_PATTERN: &str = r"(?is)salary:\s*(.+)";

/// Placeholder scores live in [85, 100) until the ranker overwrites them.
const PLACEHOLDER_FLOOR: u32 = 85;
const PLACEHOLDER_SPAN: u32 = 15;

/// Compiled selectors for one parse pass.
struct ListingSelectors {
    container: Selector,
    title: Selector,
    employer: Selector,
    location: Selector,
    info: Selector,
    closing_date: Selector,
    logo: Selector,
    salary: Regex,
}

impl ListingSelectors {
    fn compile() -> Option<Self> {
        Some(Self {
            container: selector(RESULT_CONTAINER)?,
            title: selector(TITLE_ANCHOR)?,
            employer: selector(EMPLOYER)?,
            location: selector(LOCATION)?,
            info: selector(INFO_BLOCK)?,
            closing_date: selector(CLOSING_DATE)?,
            logo: selector(LOGO_IMAGE)?,
            salary: Regex::new(SALARY_PATTERN).ok()?,
        })
    }
}

fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("Invalid selector '{css}': {e:?}");
            None
        }
    }
}

/// Parses a search results page into listings, in document order.
///
/// `origin` is the site root (e.g. `https://www.jobs.ac.uk`) used to absolutize
/// site-relative links and logo paths.
pub fn parse_listings(html: &str, origin: &Url) -> Vec<JobListing> {
    let Some(selectors) = ListingSelectors::compile() else {
        return vec![];
    };

    let document = Html::parse_document(html);
    let mut listings = Vec::new();
    let mut containers = 0usize;

    for (index, container) in document.select(&selectors.container).enumerate() {
        containers += 1;
        match parse_container(container, index, listings.len(), &selectors, origin) {
            Some(listing) => listings.push(listing),
            None => debug!("Skipping result container {index}: empty title"),
        }
    }

    if containers == 0 {
        warn!("No '{RESULT_CONTAINER}' containers found; page markup may have changed");
    }

    listings
}

fn parse_container(
    container: ElementRef<'_>,
    index: usize,
    position: usize,
    selectors: &ListingSelectors,
    origin: &Url,
) -> Option<JobListing> {
    let anchor = container.select(&selectors.title).next();
    let title = anchor.map(element_text).unwrap_or_default();
    if title.is_empty() {
        return None;
    }

    let href = anchor
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|h| !h.is_empty());
    let link = href.map(|h| resolve_url(origin, h)).unwrap_or_default();

    let id = container
        .value()
        .attr(ADVERT_ID_ATTR)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or_else(|| href.and_then(|h| id_from_link(origin, h)))
        .unwrap_or_else(|| format!("job-{index}"));

    let salary = container
        .select(&selectors.info)
        .next()
        .and_then(|info| extract_salary(&selectors.salary, &info.text().collect::<String>()))
        .unwrap_or_else(|| DEFAULT_SALARY.to_string());

    let image_url = container
        .select(&selectors.logo)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .map(|src| resolve_url(origin, src));

    Some(JobListing {
        match_score: placeholder_score(&id),
        id,
        title,
        employer: first_text(container, &selectors.employer),
        location: first_text(container, &selectors.location),
        salary,
        deadline: first_text(container, &selectors.closing_date),
        link,
        image_url,
        source: SOURCE_JOBS_AC_UK.to_string(),
        position,
        match_reason: None,
        missing_skills: vec![],
    })
}

fn first_text(container: ElementRef<'_>, selector: &Selector) -> String {
    container
        .select(selector)
        .next()
        .map(element_text)
        .unwrap_or_default()
}

/// Concatenated text content with internal whitespace collapsed.
fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pulls the text after `Salary:` out of the info block.
fn extract_salary(pattern: &Regex, info: &str) -> Option<String> {
    pattern
        .captures(info)
        .and_then(|caps| caps.get(1))
        .map(|m| collapse_whitespace(m.as_str()))
        .filter(|s| !s.is_empty())
}

/// Resolves a site-relative path against `origin`. Absolute URLs pass through untouched.
pub fn resolve_url(origin: &Url, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    match origin.join(href) {
        Ok(url) => url.to_string(),
        Err(e) => {
            warn!("Could not resolve '{href}' against {origin}: {e}");
            href.to_string()
        }
    }
}

/// Detail links look like `/job/DKL123/lecturer-in-x`; the id is the second path segment.
fn id_from_link(origin: &Url, href: &str) -> Option<String> {
    let url = origin.join(href).ok()?;
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .nth(1)
        .map(str::to_string)
}

fn placeholder_score(id: &str) -> u32 {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    PLACEHOLDER_FLOOR + (hasher.finish() % PLACEHOLDER_SPAN as u64) as u32
}
