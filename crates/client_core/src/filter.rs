//! Client-side narrowing of an already fetched screening list.

use chrono::NaiveDate;
use cinema_shared::protocol::Screening;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreeningFilter {
    pub title: Option<String>,
    pub cast: Option<String>,
    pub genre: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ScreeningFilter {
    pub fn is_empty(&self) -> bool {
        criterion(&self.title).is_none()
            && criterion(&self.cast).is_none()
            && criterion(&self.genre).is_none()
            && self.from.is_none()
            && self.to.is_none()
    }

    pub fn matches(&self, screening: &Screening) -> bool {
        if !contains(&screening.film_title, &self.title)
            || !contains(&screening.film_cast, &self.cast)
            || !contains(&screening.film_genres, &self.genre)
        {
            return false;
        }

        if self.from.is_none() && self.to.is_none() {
            return true;
        }
        let Some(day) = screening.start_time.map(|start| start.date()) else {
            return false;
        };
        self.from.map_or(true, |from| day >= from) && self.to.map_or(true, |to| day <= to)
    }

    pub fn apply(&self, screenings: &[Screening]) -> Vec<Screening> {
        screenings
            .iter()
            .filter(|screening| self.matches(screening))
            .cloned()
            .collect()
    }
}

fn criterion(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

fn contains(field: &Option<String>, wanted: &Option<String>) -> bool {
    let Some(wanted) = criterion(wanted) else {
        return true;
    };
    field
        .as_deref()
        .is_some_and(|field| field.to_lowercase().contains(&wanted.to_lowercase()))
}

/// The last full fetch and the subset currently shown.
#[derive(Debug, Clone, Default)]
pub struct ScreeningCatalog {
    all: Vec<Screening>,
    filtered: Vec<Screening>,
    criteria: ScreeningFilter,
}

impl ScreeningCatalog {
    /// Stores a fresh fetch and re-applies whatever filter is active.
    pub fn replace_all(&mut self, screenings: Vec<Screening>) {
        self.filtered = self.criteria.apply(&screenings);
        self.all = screenings;
    }

    pub fn apply(&mut self, criteria: ScreeningFilter) {
        self.filtered = criteria.apply(&self.all);
        self.criteria = criteria;
    }

    pub fn clear(&mut self) {
        self.criteria = ScreeningFilter::default();
        self.filtered = self.all.clone();
    }

    pub fn reset(&mut self) {
        self.all.clear();
        self.filtered.clear();
    }

    pub fn all(&self) -> &[Screening] {
        &self.all
    }

    pub fn visible(&self) -> &[Screening] {
        &self.filtered
    }

    pub fn criteria(&self) -> &ScreeningFilter {
        &self.criteria
    }

    /// Screenings from the last fetch handled by `caller`.
    pub fn assigned_to(&self, caller: &str) -> Vec<Screening> {
        if caller.is_empty() {
            return Vec::new();
        }
        self.all
            .iter()
            .filter(|screening| screening.handler_username.as_deref() == Some(caller))
            .cloned()
            .collect()
    }
}
