//! Product listing query: query string → filter document, page and sort.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::config::CatalogConfig;
use crate::database::ProductQuery;
use crate::filter::FilterOrderInfo;
use crate::security::{is_valid_object_id, sanitize_number_str, sanitize_string};

/// Raw query string of `GET /api/productos`. Every value arrives as text and
/// is interpreted leniently: malformed values are dropped, not rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingParams {
    pub category: Option<String>,
    pub material: Option<String>,
    pub search: Option<String>,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub include_inactive: Option<String>,
}

/// Allowed sort keys. Anything else means newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOption {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
}

impl SortOption {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("createdAt") => SortOption::Oldest,
            Some("-createdAt") => SortOption::Newest,
            Some("price") => SortOption::PriceAsc,
            Some("-price") => SortOption::PriceDesc,
            Some("name") => SortOption::NameAsc,
            Some("-name") => SortOption::NameDesc,
            _ => SortOption::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::Newest => "-createdAt",
            SortOption::Oldest => "createdAt",
            SortOption::PriceAsc => "price",
            SortOption::PriceDesc => "-price",
            SortOption::NameAsc => "name",
            SortOption::NameDesc => "-name",
        }
    }

    /// Column ordering, with `id` as a final tiebreak so pages are stable.
    pub fn order(&self) -> Vec<FilterOrderInfo> {
        let primary = match self {
            SortOption::Newest => FilterOrderInfo::desc("created_at"),
            SortOption::Oldest => FilterOrderInfo::asc("created_at"),
            SortOption::PriceAsc => FilterOrderInfo::asc("price"),
            SortOption::PriceDesc => FilterOrderInfo::desc("price"),
            SortOption::NameAsc => FilterOrderInfo::asc("name"),
            SortOption::NameDesc => FilterOrderInfo::desc("name"),
        };
        let tiebreak = FilterOrderInfo { column: "id".to_string(), sort: primary.sort };
        vec![primary, tiebreak]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub include_inactive: bool,
    pub category: Option<String>,
    pub material: Option<String>,
    pub search: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub page: i64,
    pub limit: i64,
    pub sort: SortOption,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self { page, limit, total, pages }
    }
}

/// A flag is on when the parameter is present with a non-empty value.
pub fn flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

/// Leading integer of `raw`, the way `parseInt` reads `"2abc"` or `"3.7"`.
fn leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Saturate absurdly long inputs; they are clamped right after.
    Some(digits[..end].parse::<i64>().unwrap_or(i64::MAX) * sign)
}

fn valid_id(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|id| is_valid_object_id(id))
        .map(|id| id.to_ascii_lowercase())
}

fn price(raw: Option<&str>) -> Option<f64> {
    raw.filter(|v| !v.trim().is_empty()).and_then(sanitize_number_str)
}

impl ListingQuery {
    pub fn from_params(params: &ListingParams, catalog: &CatalogConfig) -> Self {
        let page = params
            .page
            .as_deref()
            .and_then(leading_int)
            .unwrap_or(1)
            .clamp(1, catalog.max_page);
        let limit = params
            .limit
            .as_deref()
            .and_then(leading_int)
            .unwrap_or(catalog.default_limit)
            .clamp(1, catalog.max_limit);

        let search = params
            .search
            .as_deref()
            .map(sanitize_string)
            .filter(|s| !s.is_empty());

        let query = Self {
            include_inactive: flag(params.include_inactive.as_deref()),
            category: valid_id(params.category.as_deref()),
            material: valid_id(params.material.as_deref()),
            search,
            price_min: price(params.price_min.as_deref()),
            price_max: price(params.price_max.as_deref()),
            page,
            limit,
            sort: SortOption::parse(params.sort.as_deref()),
        };

        if params.category.is_some() && query.category.is_none() {
            tracing::debug!("Ignoring malformed category filter");
        }
        if params.material.is_some() && query.material.is_none() {
            tracing::debug!("Ignoring malformed material filter");
        }
        query
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// Filter document for this query. `material_name` is the resolved name
    /// of the material filter; rows still holding a free-text material match
    /// on either the id string or that name.
    pub fn to_filter(&self, material_name: Option<&str>) -> Value {
        let mut filter = Map::new();

        if !self.include_inactive {
            filter.insert("active".into(), json!(true));
        }
        if let Some(ref category) = self.category {
            filter.insert("category_id".into(), json!(category));
        }
        if let Some(ref material) = self.material {
            let mut legacy = vec![json!(material)];
            if let Some(name) = material_name {
                legacy.push(json!(name));
            }
            filter.insert(
                "$or".into(),
                json!([
                    { "material_id": material },
                    { "material_name": { "$in": legacy } }
                ]),
            );
        }
        if let Some(ref search) = self.search {
            filter.insert("$text".into(), json!({ "$search": search }));
        }
        if self.price_min.is_some() || self.price_max.is_some() {
            let mut range = Map::new();
            if let Some(min) = self.price_min {
                range.insert("$gte".into(), json!(min));
            }
            if let Some(max) = self.price_max {
                range.insert("$lte".into(), json!(max));
            }
            filter.insert("price".into(), Value::Object(range));
        }

        Value::Object(filter)
    }

    pub fn to_product_query(&self, material_name: Option<&str>) -> ProductQuery {
        ProductQuery {
            filter: self.to_filter(material_name),
            order: self.sort.order(),
            limit: self.limit,
            offset: self.offset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn catalog() -> CatalogConfig {
        AppConfig::development().catalog
    }

    fn params(pairs: &[(&str, &str)]) -> ListingParams {
        let mut p = ListingParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "category" => p.category = value,
                "material" => p.material = value,
                "search" => p.search = value,
                "priceMin" => p.price_min = value,
                "priceMax" => p.price_max = value,
                "page" => p.page = value,
                "limit" => p.limit = value,
                "sort" => p.sort = value,
                "includeInactive" => p.include_inactive = value,
                other => panic!("unknown parameter {}", other),
            }
        }
        p
    }

    #[test]
    fn defaults_to_active_newest_first_page() {
        let q = ListingQuery::from_params(&ListingParams::default(), &catalog());
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 12);
        assert_eq!(q.sort, SortOption::Newest);
        assert_eq!(q.to_filter(None), json!({ "active": true }));
    }

    #[test]
    fn clamps_page_and_limit() {
        let q = ListingQuery::from_params(&params(&[("page", "0"), ("limit", "500")]), &catalog());
        assert_eq!((q.page, q.limit), (1, 100));

        let q = ListingQuery::from_params(&params(&[("page", "99999"), ("limit", "-3")]), &catalog());
        assert_eq!((q.page, q.limit), (1000, 1));

        let q = ListingQuery::from_params(&params(&[("page", "3abc"), ("limit", "abc")]), &catalog());
        assert_eq!((q.page, q.limit), (3, 12));
        assert_eq!(q.offset(), 24);
    }

    #[test]
    fn unknown_sort_falls_back_to_newest() {
        assert_eq!(SortOption::parse(Some("malicious")), SortOption::Newest);
        assert_eq!(SortOption::parse(Some("price; DROP TABLE")), SortOption::Newest);
        assert_eq!(SortOption::parse(Some("-price")), SortOption::PriceDesc);
        assert_eq!(SortOption::Newest.order()[0], FilterOrderInfo::desc("created_at"));
    }

    #[test]
    fn malformed_ids_are_silently_dropped() {
        let q = ListingQuery::from_params(&params(&[("category", "nope"), ("material", "123")]), &catalog());
        assert_eq!(q.category, None);
        assert_eq!(q.material, None);
        assert_eq!(q.to_filter(None), json!({ "active": true }));
    }

    #[test]
    fn builds_full_filter_document() {
        let q = ListingQuery::from_params(
            &params(&[
                ("category", "64B000000000000000000001"),
                ("material", "64b000000000000000000002"),
                ("search", "anillo {$where}"),
                ("priceMin", "10"),
                ("priceMax", "-5"),
                ("includeInactive", "1"),
            ]),
            &catalog(),
        );
        assert_eq!(
            q.to_filter(Some("Plata")),
            json!({
                "category_id": "64b000000000000000000001",
                "$or": [
                    { "material_id": "64b000000000000000000002" },
                    { "material_name": { "$in": ["64b000000000000000000002", "Plata"] } }
                ],
                "$text": { "$search": "anillo where" },
                "price": { "$gte": 10.0 }
            })
        );
    }

    #[test]
    fn empty_flags_and_blank_search_are_off() {
        let q = ListingQuery::from_params(&params(&[("includeInactive", ""), ("search", " $ ")]), &catalog());
        assert!(!q.include_inactive);
        assert_eq!(q.search, None);
    }

    #[test]
    fn pages_round_up() {
        assert_eq!(Pagination::new(1, 12, 25).pages, 3);
        assert_eq!(Pagination::new(1, 12, 24).pages, 2);
        assert_eq!(Pagination::new(1, 12, 0).pages, 0);
    }
}
