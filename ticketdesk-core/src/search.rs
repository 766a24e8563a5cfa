use serde::{Deserialize, Serialize};
use chrono::NaiveDate;
use crate::route::Route;

/// Route search criteria. Empty city terms match every city.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteQuery {
    pub departure: String,
    pub arrival: String,
    pub date: Option<NaiveDate>, // UTC calendar day of departure
    pub transport_type: Option<String>,
    pub passengers: i32,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}

impl RouteQuery {
    /// Full match: both cities, date, transport type and enough free seats.
    pub fn matches(&self, route: &Route) -> bool {
        if !contains_ignore_case(&route.departure_city, &self.departure)
            || !contains_ignore_case(&route.arrival_city, &self.arrival)
        {
            return false;
        }

        if let Some(date) = self.date {
            if route.departure_time.date_naive() != date {
                return false;
            }
        }

        if let Some(kind) = self.transport_type.as_deref() {
            if !route.transport_type.eq_ignore_ascii_case(kind.trim()) {
                return false;
            }
        }

        route.available_seats >= self.passengers
    }

    /// Loose match used for suggestions: either city matches its term.
    pub fn matches_loosely(&self, route: &Route) -> bool {
        contains_ignore_case(&route.departure_city, &self.departure)
            || contains_ignore_case(&route.arrival_city, &self.arrival)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteSearchResult {
    pub routes: Vec<Route>,
    pub suggestions: Vec<Route>,
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn clamp_per_page(self, max: u32) -> Self {
        Self::new(self.page, self.per_page.min(max.max(1)))
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

impl<T> Paginated<T> {
    pub fn total_pages(&self) -> i64 {
        let per_page = i64::from(self.per_page.max(1));
        (self.total + per_page - 1) / per_page
    }
}
