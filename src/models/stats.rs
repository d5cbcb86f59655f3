//! Collection statistics report shapes.
//!
//! Group rows keep the `_id` key of the aggregation results the web client
//! was written against.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::models::Shirt;

/// One row of a group-by report (`by-type`, `by-brand`, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStat {
    #[serde(rename = "_id")]
    pub id: String,
    pub count: u32,
    /// Sum of `currentValue` over the group (missing values count as 0)
    pub total_value: f64,
}

/// One row of the most-teams report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStat {
    #[serde(rename = "_id")]
    pub id: String,
    pub count: u32,
    pub total_value: f64,
    /// Distinct seasons owned for this team, sorted
    pub seasons: Vec<String>,
}

/// Collection overview.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_shirts: u32,
    pub total_investment: f64,
    pub total_value: f64,
    pub average_purchase_price: f64,
    pub average_value: f64,
    /// `total_value - total_investment`
    pub value_change: f64,
    pub unique_teams: u32,
    pub unique_competitions: u32,
    pub unique_brands: u32,
    pub unique_colors: u32,
    pub favorites: u32,
    pub signed: u32,
    pub match_worn: u32,
    pub most_valuable: Option<Shirt>,
}

/// Running count and value sum per group key.
#[derive(Debug, Default)]
pub struct GroupTally {
    groups: HashMap<String, (u32, f64)>,
}

impl GroupTally {
    /// Count one shirt under `key`, compared exactly. Empty keys are
    /// skipped, like documents missing the grouped field.
    pub fn add(&mut self, key: &str, value: Option<f64>) {
        if key.is_empty() {
            return;
        }
        let entry = self.groups.entry(key.to_string()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += value.unwrap_or(0.0);
    }

    /// Rows sorted by count descending, ties broken by key.
    pub fn by_count_desc(self) -> Vec<GroupStat> {
        let mut rows = self.into_rows();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.id.cmp(&b.id)));
        rows
    }

    /// Rows sorted by key descending.
    pub fn by_key_desc(self) -> Vec<GroupStat> {
        let mut rows = self.into_rows();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        rows
    }

    fn into_rows(self) -> Vec<GroupStat> {
        self.groups
            .into_iter()
            .map(|(id, (count, total_value))| GroupStat {
                id,
                count,
                total_value,
            })
            .collect()
    }
}

/// Like [`GroupTally`], additionally collecting the seasons per team.
#[derive(Debug, Default)]
pub struct TeamTally {
    teams: HashMap<String, (u32, f64, BTreeSet<String>)>,
}

impl TeamTally {
    pub fn add(&mut self, shirt: &Shirt) {
        let team = shirt.team_name.as_str();
        if team.is_empty() {
            return;
        }
        let entry = self
            .teams
            .entry(team.to_string())
            .or_insert_with(|| (0, 0.0, BTreeSet::new()));
        entry.0 += 1;
        entry.1 += shirt.current_value.unwrap_or(0.0);
        entry.2.insert(shirt.season.clone());
    }

    /// Rows sorted by count descending (ties by team name), capped at `limit`.
    pub fn top(self, limit: usize) -> Vec<TeamStat> {
        let mut rows: Vec<TeamStat> = self
            .teams
            .into_iter()
            .map(|(id, (count, total_value, seasons))| TeamStat {
                id,
                count,
                total_value,
                seasons: seasons.into_iter().collect(),
            })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.id.cmp(&b.id)));
        rows.truncate(limit);
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_tally_counts_and_sums() {
        let mut tally = GroupTally::default();
        tally.add("Nike", Some(100.0));
        tally.add("Nike", None);
        tally.add("Adidas", Some(40.0));
        tally.add("", Some(999.0));

        let rows = tally.by_count_desc();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "Nike");
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].total_value, 100.0);
        assert_eq!(rows[1].id, "Adidas");
    }

    #[test]
    fn test_group_keys_are_exact() {
        let mut tally = GroupTally::default();
        tally.add("Nike", None);
        tally.add("Nike ", None);
        tally.add("nike", None);
        assert_eq!(tally.by_count_desc().len(), 3);
    }

    #[test]
    fn test_group_rows_serialize_with_underscore_id() {
        let row = GroupStat {
            id: "home".to_string(),
            count: 3,
            total_value: 12.5,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["_id"], "home");
        assert_eq!(json["totalValue"], 12.5);
    }

    #[test]
    fn test_key_desc_orders_seasons_newest_first() {
        let mut tally = GroupTally::default();
        tally.add("1998/99", None);
        tally.add("2023/24", None);
        tally.add("2010/11", None);

        let ids: Vec<String> = tally.by_key_desc().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["2023/24", "2010/11", "1998/99"]);
    }
}
