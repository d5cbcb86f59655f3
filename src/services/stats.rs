// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Collection statistics, computed over one user's shirts.

use crate::error::AppError;
use crate::models::stats::{GroupStat, GroupTally, Overview, TeamStat, TeamTally};
use crate::models::Shirt;
use std::cmp::Ordering;
use std::collections::HashSet;

pub const DEFAULT_REPORT_LIMIT: usize = 5;
pub const MAX_REPORT_LIMIT: usize = 50;
pub const TOP_GROUPS: usize = 10;

/// Parse the `limit` query parameter of the top-N reports.
pub fn report_limit(raw: Option<&str>) -> Result<usize, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(DEFAULT_REPORT_LIMIT),
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n.min(MAX_REPORT_LIMIT)),
            _ => Err(AppError::BadRequest(
                "'limit' must be a positive integer".to_string(),
            )),
        },
    }
}

pub fn overview(shirts: &[Shirt]) -> Overview {
    let mut total_investment = 0.0;
    let mut priced = 0u32;
    let mut total_value = 0.0;
    let mut valued = 0u32;

    let mut teams = HashSet::new();
    let mut competitions = HashSet::new();
    let mut brands = HashSet::new();
    let mut colors = HashSet::new();

    let mut favorites = 0;
    let mut signed = 0;
    let mut match_worn = 0;

    for shirt in shirts {
        if let Some(price) = shirt.purchase_price {
            total_investment += price;
            priced += 1;
        }
        if let Some(value) = shirt.current_value {
            total_value += value;
            valued += 1;
        }

        teams.insert(shirt.team_name.as_str());
        if let Some(c) = shirt.competition.as_deref().filter(|c| !c.is_empty()) {
            competitions.insert(c);
        }
        if let Some(b) = shirt.brand.as_deref().filter(|b| !b.is_empty()) {
            brands.insert(b);
        }
        if let Some(color) = shirt.color {
            colors.insert(color);
        }

        favorites += u32::from(shirt.is_favorite);
        signed += u32::from(shirt.signed);
        match_worn += u32::from(shirt.match_worn);
    }

    Overview {
        total_shirts: shirts.len() as u32,
        total_investment,
        total_value,
        average_purchase_price: average(total_investment, priced),
        average_value: average(total_value, valued),
        value_change: total_value - total_investment,
        unique_teams: teams.len() as u32,
        unique_competitions: competitions.len() as u32,
        unique_brands: brands.len() as u32,
        unique_colors: colors.len() as u32,
        favorites,
        signed,
        match_worn,
        most_valuable: most_valuable(shirts, 1).into_iter().next(),
    }
}

fn average(sum: f64, count: u32) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Group by any key; shirts without the key are excluded.
fn tally_by<F>(shirts: &[Shirt], key: F) -> GroupTally
where
    F: Fn(&Shirt) -> Option<&str>,
{
    let mut tally = GroupTally::default();
    for shirt in shirts {
        if let Some(k) = key(shirt) {
            tally.add(k, shirt.current_value);
        }
    }
    tally
}

pub fn by_type(shirts: &[Shirt]) -> Vec<GroupStat> {
    tally_by(shirts, |s| Some(s.kind.as_str())).by_count_desc()
}

/// Newest season first.
pub fn by_season(shirts: &[Shirt]) -> Vec<GroupStat> {
    tally_by(shirts, |s| Some(s.season.as_str())).by_key_desc()
}

/// The ten most common brands.
pub fn by_brand(shirts: &[Shirt]) -> Vec<GroupStat> {
    let mut rows = tally_by(shirts, |s| s.brand.as_deref()).by_count_desc();
    rows.truncate(TOP_GROUPS);
    rows
}

pub fn by_condition(shirts: &[Shirt]) -> Vec<GroupStat> {
    tally_by(shirts, |s| Some(s.condition.as_str())).by_count_desc()
}

pub fn by_competition(shirts: &[Shirt]) -> Vec<GroupStat> {
    tally_by(shirts, |s| s.competition.as_deref()).by_count_desc()
}

pub fn by_size(shirts: &[Shirt]) -> Vec<GroupStat> {
    tally_by(shirts, |s| s.size.map(|size| size.as_str())).by_count_desc()
}

/// The ten teams with the most shirts, with the seasons owned for each.
pub fn most_teams(shirts: &[Shirt]) -> Vec<TeamStat> {
    let mut tally = TeamTally::default();
    for shirt in shirts {
        tally.add(shirt);
    }
    tally.top(TOP_GROUPS)
}

/// Highest `currentValue` first; shirts without a value are skipped.
pub fn most_valuable(shirts: &[Shirt], limit: usize) -> Vec<Shirt> {
    let mut valued: Vec<&Shirt> = shirts.iter().filter(|s| s.current_value.is_some()).collect();
    valued.sort_by(|a, b| {
        let (av, bv) = (a.current_value.unwrap_or(0.0), b.current_value.unwrap_or(0.0));
        bv.total_cmp(&av).then_with(|| newest_first(a, b))
    });
    valued.into_iter().take(limit).cloned().collect()
}

/// Most recently added first.
pub fn recent(shirts: &[Shirt], limit: usize) -> Vec<Shirt> {
    let mut all: Vec<&Shirt> = shirts.iter().collect();
    all.sort_by(|a, b| newest_first(a, b));
    all.into_iter().take(limit).cloned().collect()
}

/// Every shirt, newest first.
pub fn export(mut shirts: Vec<Shirt>) -> Vec<Shirt> {
    shirts.sort_by(newest_first);
    shirts
}

fn newest_first(a: &Shirt, b: &Shirt) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}
