// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Filter, sort and pagination for the shirt list.
//!
//! Query strings are parsed into a [`ShirtQuery`] up front so that bad input
//! is rejected with 400 before any data is loaded. The query is then applied
//! to the requester's shirts in memory.

use crate::error::AppError;
use crate::models::{Condition, Shirt, ShirtColor, ShirtSize, ShirtType};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 12;
pub const MAX_LIMIT: u32 = 100;

/// Raw list query parameters, all optional strings as sent by the client.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShirtListParams {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub season: Option<String>,
    pub condition: Option<String>,
    pub brand: Option<String>,
    pub is_favorite: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Field predicates; every present predicate must match.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ShirtFilter {
    /// Lowercased; matched against team, player and competition
    pub search: Option<String>,
    pub kind: Option<String>,
    pub season: Option<String>,
    pub condition: Option<String>,
    /// Lowercased substring
    pub brand: Option<String>,
    pub favorites_only: bool,
}

impl ShirtFilter {
    pub fn matches(&self, shirt: &Shirt) -> bool {
        if let Some(needle) = &self.search {
            let hit = contains_ci(&shirt.team_name, needle)
                || shirt
                    .player_name
                    .as_deref()
                    .is_some_and(|p| contains_ci(p, needle))
                || shirt
                    .competition
                    .as_deref()
                    .is_some_and(|c| contains_ci(c, needle));
            if !hit {
                return false;
            }
        }

        if let Some(kind) = &self.kind {
            if shirt.kind.as_str() != kind {
                return false;
            }
        }

        if let Some(season) = &self.season {
            if &shirt.season != season {
                return false;
            }
        }

        if let Some(condition) = &self.condition {
            if shirt.condition.as_str() != condition {
                return false;
            }
        }

        if let Some(brand) = &self.brand {
            if !shirt.brand.as_deref().is_some_and(|b| contains_ci(b, brand)) {
                return false;
            }
        }

        !self.favorites_only || shirt.is_favorite
    }
}

fn contains_ci(haystack: &str, lowercase_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowercase_needle)
}

/// Sortable shirt fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    TeamName,
    Season,
    PurchaseDate,
    PurchasePrice,
    CurrentValue,
}

impl SortField {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "createdAt" => SortField::CreatedAt,
            "updatedAt" => SortField::UpdatedAt,
            "teamName" => SortField::TeamName,
            "season" => SortField::Season,
            "purchaseDate" => SortField::PurchaseDate,
            "purchasePrice" => SortField::PurchasePrice,
            "currentValue" => SortField::CurrentValue,
            _ => return None,
        })
    }
}

/// Sort order, e.g. `-createdAt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub descending: bool,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            descending: true,
        }
    }
}

impl SortSpec {
    /// Parse `field` or `-field`.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let raw = raw.trim();
        let (name, descending) = match raw.strip_prefix('-') {
            Some(name) => (name, true),
            None => (raw, false),
        };
        let field = SortField::parse(name)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid sort field: {}", name)))?;
        Ok(Self { field, descending })
    }

    /// Compare two shirts. Missing values sort before present ones in
    /// ascending order.
    pub fn compare(&self, a: &Shirt, b: &Shirt) -> Ordering {
        let ord = match self.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::TeamName => a.team_name.cmp(&b.team_name),
            SortField::Season => a.season.cmp(&b.season),
            SortField::PurchaseDate => a.purchase_date.cmp(&b.purchase_date),
            SortField::PurchasePrice => cmp_opt_f64(a.purchase_price, b.purchase_price),
            SortField::CurrentValue => cmp_opt_f64(a.current_value, b.current_value),
        };
        let ord = if self.descending { ord.reverse() } else { ord };
        ord.then_with(|| a.id.cmp(&b.id))
    }
}

fn cmp_opt_f64(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Page metadata returned next to the list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_shirts: u32,
    pub has_more: bool,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u32) -> Self {
        Self {
            current_page: page,
            total_pages: total.div_ceil(limit),
            total_shirts: total,
            has_more: (page as u64) * (limit as u64) < total as u64,
        }
    }
}

/// A validated list query.
#[derive(Debug, Clone, PartialEq)]
pub struct ShirtQuery {
    pub filter: ShirtFilter,
    pub sort: SortSpec,
    pub page: u32,
    pub limit: u32,
}

impl ShirtQuery {
    /// Validate raw parameters. Empty strings are treated as absent.
    pub fn from_params(params: &ShirtListParams) -> Result<Self, AppError> {
        let filter = ShirtFilter {
            search: non_empty(&params.search).map(|s| s.to_lowercase()),
            kind: non_empty(&params.kind).map(str::to_string),
            season: non_empty(&params.season).map(str::to_string),
            condition: non_empty(&params.condition).map(str::to_string),
            brand: non_empty(&params.brand).map(|s| s.to_lowercase()),
            favorites_only: params.is_favorite.as_deref() == Some("true"),
        };

        let sort = match non_empty(&params.sort) {
            Some(raw) => SortSpec::parse(raw)?,
            None => SortSpec::default(),
        };

        let page = parse_positive(&params.page, "page")?.unwrap_or(DEFAULT_PAGE);
        let limit = parse_positive(&params.limit, "limit")?
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);

        Ok(Self {
            filter,
            sort,
            page,
            limit,
        })
    }

    /// Filter, sort and slice out the requested page.
    pub fn apply(&self, shirts: Vec<Shirt>) -> (Vec<Shirt>, Pagination) {
        let mut matching: Vec<Shirt> = shirts
            .into_iter()
            .filter(|s| self.filter.matches(s))
            .collect();
        matching.sort_by(|a, b| self.sort.compare(a, b));

        let total = matching.len() as u32;
        let skip = ((self.page - 1) as usize).saturating_mul(self.limit as usize);
        let page: Vec<Shirt> = matching
            .into_iter()
            .skip(skip)
            .take(self.limit as usize)
            .collect();

        (page, Pagination::new(self.page, self.limit, total))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_positive(value: &Option<String>, name: &str) -> Result<Option<u32>, AppError> {
    match non_empty(value) {
        None => Ok(None),
        Some(raw) => match raw.parse::<u32>() {
            Ok(n) if n > 0 => Ok(Some(n)),
            _ => Err(AppError::BadRequest(format!(
                "'{}' must be a positive integer",
                name
            ))),
        },
    }
}

/// Values for populating the client's filter dropdowns.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub teams: Vec<String>,
    /// Newest first
    pub seasons: Vec<String>,
    pub brands: Vec<String>,
    pub competitions: Vec<String>,
    pub types: Vec<&'static str>,
    pub sizes: Vec<&'static str>,
    pub conditions: Vec<&'static str>,
    pub colors: Vec<&'static str>,
}

/// Distinct values present in a user's collection plus all enum values.
pub fn filter_options(shirts: &[Shirt]) -> FilterOptions {
    let mut teams = BTreeSet::new();
    let mut seasons = BTreeSet::new();
    let mut brands = BTreeSet::new();
    let mut competitions = BTreeSet::new();

    for shirt in shirts {
        teams.insert(shirt.team_name.clone());
        seasons.insert(shirt.season.clone());
        if let Some(brand) = shirt.brand.as_deref().filter(|b| !b.is_empty()) {
            brands.insert(brand.to_string());
        }
        if let Some(comp) = shirt.competition.as_deref().filter(|c| !c.is_empty()) {
            competitions.insert(comp.to_string());
        }
    }

    FilterOptions {
        teams: teams.into_iter().collect(),
        seasons: seasons.into_iter().rev().collect(),
        brands: brands.into_iter().collect(),
        competitions: competitions.into_iter().collect(),
        types: ShirtType::ALL.iter().map(|t| t.as_str()).collect(),
        sizes: ShirtSize::ALL.iter().map(|s| s.as_str()).collect(),
        conditions: Condition::ALL.iter().map(|c| c.as_str()).collect(),
        colors: ShirtColor::ALL.iter().map(|c| c.as_str()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn shirt(id: &str, team: &str, age_days: i64) -> Shirt {
        let created = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() - Duration::days(age_days);
        Shirt {
            id: id.to_string(),
            user: "u1".to_string(),
            team_name: team.to_string(),
            season: "2023/24".to_string(),
            kind: ShirtType::Home,
            brand: None,
            size: None,
            condition: Condition::Good,
            player_name: None,
            player_number: None,
            competition: None,
            signed: false,
            match_worn: false,
            player_issue: false,
            color: None,
            images: vec![],
            purchase_date: None,
            purchase_price: None,
            current_value: None,
            purchase_location: None,
            notes: None,
            is_favorite: false,
            created_at: created,
            updated_at: created,
        }
    }

    fn params(pairs: &[(&str, &str)]) -> ShirtListParams {
        let map: serde_json::Map<String, serde_json::Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        serde_json::from_value(serde_json::Value::Object(map)).unwrap()
    }

    #[test]
    fn test_defaults() {
        let q = ShirtQuery::from_params(&ShirtListParams::default()).unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 12);
        assert_eq!(q.sort, SortSpec::default());
        assert_eq!(q.filter, ShirtFilter::default());
    }

    #[test]
    fn test_limit_capped() {
        let q = ShirtQuery::from_params(&params(&[("limit", "500")])).unwrap();
        assert_eq!(q.limit, MAX_LIMIT);
    }

    #[test]
    fn test_bad_page_and_limit_rejected() {
        for (k, v) in [("page", "0"), ("page", "abc"), ("limit", "-3"), ("limit", "1.5")] {
            let err = ShirtQuery::from_params(&params(&[(k, v)])).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "{}={}", k, v);
        }
    }

    #[test]
    fn test_unknown_sort_field_rejected() {
        assert!(SortSpec::parse("-password").is_err());
        let spec = SortSpec::parse("teamName").unwrap();
        assert_eq!(spec.field, SortField::TeamName);
        assert!(!spec.descending);
    }

    #[test]
    fn test_pagination_math() {
        let p = Pagination::new(1, 12, 25);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_more);

        let p = Pagination::new(3, 12, 25);
        assert!(!p.has_more);

        let p = Pagination::new(1, 12, 0);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_more);

        let p = Pagination::new(2, 5, 10);
        assert_eq!(p.total_pages, 2);
        assert!(!p.has_more);
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let mut a = shirt("a", "Arsenal", 0);
        a.player_name = Some("Thierry Henry".to_string());
        let mut b = shirt("b", "Juventus", 1);
        b.competition = Some("Serie A".to_string());
        let c = shirt("c", "Ajax", 2);

        let q = ShirtQuery::from_params(&params(&[("search", "HENRY")])).unwrap();
        let (page, _) = q.apply(vec![a.clone(), b.clone(), c.clone()]);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, "a");

        let q = ShirtQuery::from_params(&params(&[("search", "serie")])).unwrap();
        let (page, _) = q.apply(vec![a, b, c]);
        assert_eq!(page[0].id, "b");
    }

    #[test]
    fn test_favorite_filter_only_on_true() {
        let mut a = shirt("a", "Arsenal", 0);
        a.is_favorite = true;
        let b = shirt("b", "Ajax", 1);

        let q = ShirtQuery::from_params(&params(&[("isFavorite", "false")])).unwrap();
        assert_eq!(q.apply(vec![a.clone(), b.clone()]).0.len(), 2);

        let q = ShirtQuery::from_params(&params(&[("isFavorite", "true")])).unwrap();
        assert_eq!(q.apply(vec![a, b]).0.len(), 1);
    }

    #[test]
    fn test_default_sort_newest_first_and_paging() {
        let shirts: Vec<Shirt> = (0..5).map(|i| shirt(&format!("s{}", i), "T", i)).collect();
        let q = ShirtQuery::from_params(&params(&[("limit", "2"), ("page", "2")])).unwrap();
        let (page, pagination) = q.apply(shirts);

        let ids: Vec<&str> = page.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s2", "s3"]);
        assert_eq!(pagination.total_pages, 3);
        assert!(pagination.has_more);
    }

    #[test]
    fn test_sort_by_value_puts_missing_last_when_descending() {
        let mut a = shirt("a", "A", 0);
        a.current_value = Some(10.0);
        let b = shirt("b", "B", 0);
        let mut c = shirt("c", "C", 0);
        c.current_value = Some(99.0);

        let q = ShirtQuery::from_params(&params(&[("sort", "-currentValue")])).unwrap();
        let ids: Vec<String> = q.apply(vec![a, b, c]).0.into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_filter_options() {
        let mut a = shirt("a", "Milan", 0);
        a.brand = Some("Adidas".to_string());
        a.season = "1994/95".to_string();
        let mut b = shirt("b", "Inter", 0);
        b.brand = Some("Umbro".to_string());

        let opts = filter_options(&[a, b]);
        assert_eq!(opts.teams, vec!["Inter", "Milan"]);
        assert_eq!(opts.seasons, vec!["2023/24", "1994/95"]);
        assert_eq!(opts.brands, vec!["Adidas", "Umbro"]);
        assert!(opts.competitions.is_empty());
        assert_eq!(opts.types.len(), 8);
    }
}
