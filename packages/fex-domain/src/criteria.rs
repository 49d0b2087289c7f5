use serde::{Deserialize, Serialize};

use crate::lexicon::{self, LocationKind};

/// Upper bound for any company age, in years.
pub const MAX_COMPANY_AGE: i64 = 500;

/// Comparison applied by a [`NumericRange`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeOp {
	#[default]
	Gte,
	Lte,
	Eq,
	Between,
}
impl RangeOp {
	/// Parses an operator token. Strict comparisons are reported through the second value.
	pub fn parse(token: &str) -> Option<(Self, bool)> {
		match token.trim().to_ascii_lowercase().as_str() {
			"gte" | ">=" => Some((Self::Gte, false)),
			"gt" | ">" => Some((Self::Gte, true)),
			"lte" | "<=" => Some((Self::Lte, false)),
			"lt" | "<" => Some((Self::Lte, true)),
			"eq" | "=" | "==" => Some((Self::Eq, false)),
			"between" | "range" => Some((Self::Between, false)),
			_ => None,
		}
	}
}

/// Range over a numeric company attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange<T> {
	pub min: Option<T>,
	pub max: Option<T>,
	pub exact: Option<T>,
	pub operator: RangeOp,
}
impl<T> NumericRange<T>
where
	T: Copy + PartialOrd,
{
	pub fn at_least(min: T) -> Self {
		Self { min: Some(min), max: None, exact: None, operator: RangeOp::Gte }
	}

	pub fn at_most(max: T) -> Self {
		Self { min: None, max: Some(max), exact: None, operator: RangeOp::Lte }
	}

	pub fn exactly(value: T) -> Self {
		Self { min: None, max: None, exact: Some(value), operator: RangeOp::Eq }
	}

	pub fn between(a: T, b: T) -> Self {
		let (min, max) = if a > b { (b, a) } else { (a, b) };

		Self { min: Some(min), max: Some(max), exact: None, operator: RangeOp::Between }
	}

	/// Builds a range from loosely populated parts, inferring the operator when it is missing
	/// or inconsistent with the populated bounds.
	pub fn from_parts(
		min: Option<T>,
		max: Option<T>,
		exact: Option<T>,
		operator: Option<RangeOp>,
	) -> Option<Self> {
		match (operator, min, max, exact) {
			(Some(RangeOp::Eq), _, _, Some(value)) => Some(Self::exactly(value)),
			(Some(RangeOp::Between), Some(a), Some(b), _) => Some(Self::between(a, b)),
			(Some(RangeOp::Gte), Some(a), _, _) => Some(Self::at_least(a)),
			(Some(RangeOp::Lte), _, Some(b), _) => Some(Self::at_most(b)),
			(_, _, _, Some(value)) => Some(Self::exactly(value)),
			(_, Some(a), Some(b), _) => Some(Self::between(a, b)),
			(_, Some(a), None, _) => Some(Self::at_least(a)),
			(_, None, Some(b), _) => Some(Self::at_most(b)),
			_ => None,
		}
	}

	/// Inclusive lower and upper bounds implied by the operator.
	pub fn bounds(&self) -> (Option<T>, Option<T>) {
		match self.operator {
			RangeOp::Eq => {
				let value = self.exact.or(self.min).or(self.max);

				(value, value)
			},
			RangeOp::Gte => (self.min.or(self.exact), None),
			RangeOp::Lte => (None, self.max.or(self.exact)),
			RangeOp::Between => (self.min, self.max),
		}
	}

	pub fn contains(&self, value: T) -> bool {
		let (lo, hi) = self.bounds();

		lo.is_none_or(|lo| value >= lo) && hi.is_none_or(|hi| value <= hi)
	}
}
impl NumericRange<i64> {
	/// Like [`NumericRange::from_parts`] but accepts raw operator tokens, turning `gt`/`lt` into
	/// inclusive bounds shifted by one.
	pub fn from_tokens(
		min: Option<i64>,
		max: Option<i64>,
		exact: Option<i64>,
		operator: Option<&str>,
	) -> Option<Self> {
		let parsed = operator.and_then(RangeOp::parse);
		let (min, max) = match parsed {
			Some((RangeOp::Gte, true)) => (min.or(exact).map(|v| v.saturating_add(1)), max),
			Some((RangeOp::Lte, true)) => (min, max.or(exact).map(|v| v.saturating_sub(1))),
			_ => (min, max),
		};
		let exact = match parsed {
			Some((_, true)) => None,
			_ => exact,
		};

		Self::from_parts(min, max, exact, parsed.map(|(op, _)| op))
	}

	/// Pulls every populated bound into `lo..=hi`.
	pub fn clamped(self, lo: i64, hi: i64) -> Self {
		let clamp = |value: Option<i64>| value.map(|v| v.clamp(lo, hi));

		Self { min: clamp(self.min), max: clamp(self.max), exact: clamp(self.exact), ..self }
	}
}
impl NumericRange<f64> {
	pub fn from_tokens(
		min: Option<f64>,
		max: Option<f64>,
		exact: Option<f64>,
		operator: Option<&str>,
	) -> Option<Self> {
		let parsed = operator.and_then(RangeOp::parse);
		let (min, max) = match parsed {
			Some((RangeOp::Gte, true)) => (min.or(exact), max),
			Some((RangeOp::Lte, true)) => (min, max.or(exact)),
			_ => (min, max),
		};
		let exact = match parsed {
			Some((_, true)) => None,
			_ => exact,
		};
		let finite = |v: Option<f64>| v.filter(|v| v.is_finite());

		Self::from_parts(finite(min), finite(max), finite(exact), parsed.map(|(op, _)| op))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanyType {
	Manufacturer,
	Trading,
	Factory,
}
impl CompanyType {
	pub fn parse(token: &str) -> Option<Self> {
		match token.trim().to_ascii_lowercase().as_str() {
			"manufacturer" | "manufacturing" | "producer" => Some(Self::Manufacturer),
			"trading" | "trader" | "trade" | "distributor" => Some(Self::Trading),
			"factory" | "plant" => Some(Self::Factory),
			_ => None,
		}
	}

	/// Name fragments that identify the company type.
	pub fn name_patterns(self) -> &'static [&'static str] {
		match self {
			Self::Manufacturer =>
				&["Manufactur", "Industrial", "Industry", "Technology", "制造", "工业", "科技"],
			Self::Trading => &["Trading", "Trade", "Import", "Export", "贸易", "进出口", "商贸"],
			Self::Factory => &["Factory", "Works", "Manufactur", "厂", "制造"],
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
	Employees,
	Age,
	Capital,
	Name,
	Credit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
	Asc,
	#[default]
	Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
	pub field: SortField,
	#[serde(default)]
	pub order: SortOrder,
}
impl Default for SortSpec {
	fn default() -> Self {
		Self { field: SortField::Employees, order: SortOrder::Desc }
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
	ProductSearch,
	CompanySearch,
	LocationSearch,
	#[default]
	GeneralSearch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Exclusions {
	pub products: Vec<String>,
	pub locations: Vec<String>,
	pub company_names: Vec<String>,
}

/// Structured filter resolved from one free-text query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchCriteria {
	pub products: Vec<String>,
	pub location: Option<String>,
	pub employees: Option<NumericRange<i64>>,
	/// Years since establishment.
	pub company_age: Option<NumericRange<i64>>,
	/// Registered capital in yuan.
	pub capital: Option<NumericRange<f64>>,
	pub credit_rating: Option<String>,
	pub brands: Vec<String>,
	pub certifications: Vec<String>,
	pub company_type: Option<CompanyType>,
	pub provinces_excluded: Vec<String>,
	pub cities_excluded: Vec<String>,
	pub sorting: Option<SortSpec>,
	pub limit: Option<u32>,
	pub confidence: u8,
	pub query_intent: QueryIntent,
	pub company_name: Option<String>,
	pub exclusions: Exclusions,
}
impl SearchCriteria {
	/// Cleans terms and applies precedence rules. Explicit exclusions always beat inclusions.
	pub fn normalize(&mut self, max_limit: u32) {
		clean_terms(&mut self.products);
		clean_terms(&mut self.brands);
		clean_terms(&mut self.certifications);
		clean_terms(&mut self.provinces_excluded);
		clean_terms(&mut self.cities_excluded);
		clean_terms(&mut self.exclusions.products);
		clean_terms(&mut self.exclusions.locations);
		clean_terms(&mut self.exclusions.company_names);
		clean_optional(&mut self.location);
		clean_optional(&mut self.company_name);
		clean_optional(&mut self.credit_rating);

		for location in std::mem::take(&mut self.exclusions.locations) {
			match lexicon::location(&location).map(|entry| entry.kind) {
				Some(LocationKind::Province) => self.provinces_excluded.push(location),
				Some(LocationKind::City) => self.cities_excluded.push(location),
				None => {
					self.provinces_excluded.push(location.clone());
					self.cities_excluded.push(location);
				},
			}
		}

		clean_terms(&mut self.provinces_excluded);
		clean_terms(&mut self.cities_excluded);

		if let Some(location) = self.location.as_deref()
			&& self
				.provinces_excluded
				.iter()
				.chain(self.cities_excluded.iter())
				.any(|excluded| lexicon::same_location(location, excluded))
		{
			self.location = None;
		}

		let excluded_products = self.exclusions.products.clone();

		self.products.retain(|product| {
			!excluded_products.iter().any(|excluded| lexicon::same_product(product, excluded))
		});

		if let Some(name) = self.company_name.as_deref()
			&& self.exclusions.company_names.iter().any(|excluded| excluded.eq_ignore_ascii_case(name))
		{
			self.company_name = None;
		}

		self.company_age = self.company_age.map(|range| range.clamped(0, MAX_COMPANY_AGE));
		self.limit = self.limit.map(|limit| limit.clamp(1, max_limit.max(1)));
		self.confidence = self.confidence.min(100);
	}

	/// True when no field constrains retrieval.
	pub fn is_unconstrained(&self) -> bool {
		self.products.is_empty()
			&& self.location.is_none()
			&& self.employees.is_none()
			&& self.company_age.is_none()
			&& self.capital.is_none()
			&& self.credit_rating.is_none()
			&& self.brands.is_empty()
			&& self.certifications.is_empty()
			&& self.company_type.is_none()
			&& self.provinces_excluded.is_empty()
			&& self.cities_excluded.is_empty()
			&& self.company_name.is_none()
			&& self.exclusions == Exclusions::default()
	}

	pub fn has_numeric_range(&self) -> bool {
		self.employees.is_some() || self.company_age.is_some() || self.capital.is_some()
	}
}

fn clean_terms(terms: &mut Vec<String>) {
	let mut seen: Vec<String> = Vec::with_capacity(terms.len());

	terms.retain_mut(|term| {
		let trimmed = term.trim();

		if trimmed.is_empty() {
			return false;
		}

		let key = trimmed.to_lowercase();

		if seen.contains(&key) {
			return false;
		}

		seen.push(key);

		*term = trimmed.to_string();

		true
	});
}

fn clean_optional(value: &mut Option<String>) {
	if let Some(inner) = value.as_deref() {
		let trimmed = inner.trim();

		*value = if trimmed.is_empty() { None } else { Some(trimmed.to_string()) };
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strict_operators_shift_integer_bounds() {
		let range = NumericRange::<i64>::from_tokens(Some(100), None, None, Some("gt"))
			.expect("range expected");

		assert_eq!(range.operator, RangeOp::Gte);
		assert_eq!(range.min, Some(101));
		assert!(range.contains(101));
		assert!(!range.contains(100));

		let range = NumericRange::<i64>::from_tokens(None, Some(50), None, Some("lt"))
			.expect("range expected");

		assert_eq!(range.bounds(), (None, Some(49)));
	}

	#[test]
	fn operator_is_inferred_from_populated_fields() {
		let range = NumericRange::from_parts(Some(500), Some(100), None, None)
			.expect("range expected");

		assert_eq!(range.operator, RangeOp::Between);
		assert_eq!(range.bounds(), (Some(100), Some(500)));

		let range = NumericRange::from_parts(Some(10), None, None, Some(RangeOp::Lte))
			.expect("range expected");

		assert_eq!(range.operator, RangeOp::Gte);
		assert!(NumericRange::<i64>::from_parts(None, None, None, Some(RangeOp::Eq)).is_none());
	}

	#[test]
	fn exclusion_wins_over_inclusion() {
		let mut criteria = SearchCriteria {
			location: Some("广东".to_string()),
			products: vec!["LED".to_string(), "PVC".to_string()],
			provinces_excluded: vec!["Guangdong".to_string()],
			exclusions: Exclusions { products: vec!["pvc".to_string()], ..Default::default() },
			..Default::default()
		};

		criteria.normalize(50);

		assert_eq!(criteria.location, None);
		assert_eq!(criteria.products, vec!["LED".to_string()]);
	}

	#[test]
	fn excluded_locations_are_routed_by_kind() {
		let mut criteria = SearchCriteria {
			exclusions: Exclusions {
				locations: vec!["Shenzhen".to_string(), "Zhejiang".to_string()],
				..Default::default()
			},
			limit: Some(500),
			..Default::default()
		};

		criteria.normalize(50);

		assert_eq!(criteria.cities_excluded, vec!["Shenzhen".to_string()]);
		assert_eq!(criteria.provinces_excluded, vec!["Zhejiang".to_string()]);
		assert!(criteria.exclusions.locations.is_empty());
		assert_eq!(criteria.limit, Some(50));
	}

	#[test]
	fn criteria_serializes_operator_tokens() {
		let criteria = SearchCriteria {
			employees: Some(NumericRange::at_least(101)),
			..Default::default()
		};
		let json = serde_json::to_value(&criteria).expect("serialize failed");

		assert_eq!(json["employees"]["operator"], "gte");
		assert_eq!(json["employees"]["min"], 101);
		assert_eq!(json["query_intent"], "general_search");
	}
}
