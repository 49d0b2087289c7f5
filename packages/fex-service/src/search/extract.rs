//! Model-backed criteria extraction with a heuristic safety net.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use fex_domain::{
	CompanyType, Exclusions, NumericRange, QueryIntent, SearchCriteria, SortField, SortOrder,
	SortSpec, capital,
	heuristic::{self, HeuristicOptions},
	lexicon,
};

use crate::FexService;

/// Confidence assumed when the model omits one.
const DEFAULT_MODEL_CONFIDENCE: u8 = 85;
const MIN_MODEL_CONFIDENCE: u8 = 70;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExtractionOutput {
	#[serde(deserialize_with = "nullable")]
	products: Vec<String>,
	location: Option<String>,
	employees: Option<RangeOutput>,
	company_age: Option<RangeOutput>,
	capital: Option<CapitalOutput>,
	credit_rating: Option<String>,
	#[serde(deserialize_with = "nullable")]
	brands: Vec<String>,
	#[serde(deserialize_with = "nullable")]
	certifications: Vec<String>,
	company_type: Option<String>,
	#[serde(deserialize_with = "nullable")]
	provinces_excluded: Vec<String>,
	#[serde(deserialize_with = "nullable")]
	cities_excluded: Vec<String>,
	sorting: Option<SortingOutput>,
	limit: Option<Value>,
	confidence: Option<Value>,
	query_intent: Option<String>,
	company_name: Option<String>,
	#[serde(deserialize_with = "nullable")]
	exclusions: Exclusions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RangeOutput {
	min: Option<Value>,
	max: Option<Value>,
	exact: Option<Value>,
	operator: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CapitalOutput {
	#[serde(flatten)]
	range: RangeOutput,
	unit: Option<String>,
	currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SortingOutput {
	field: Option<String>,
	order: Option<String>,
}

impl FexService {
	/// Resolves criteria for `query`. The flag is true when the model produced them.
	pub(super) async fn extract_criteria(
		&self,
		query: &str,
		opts: &HeuristicOptions,
	) -> (SearchCriteria, bool) {
		if !self.breakers.llm.allow() {
			return (heuristic::extract(query, opts), false);
		}

		let messages = build_extraction_messages(query);
		let raw =
			self.providers.extractor.extract(&self.cfg.providers.llm_extractor, &messages).await;

		self.breakers.llm.observe(&raw);

		let raw = match raw {
			Ok(value) => value,
			Err(err) => {
				tracing::warn!(error = %err, "Criteria extraction failed. Using heuristics.");

				return (heuristic::extract(query, opts), false);
			},
		};

		match parse_criteria(raw, opts) {
			Ok(criteria) => (criteria, true),
			Err(err) => {
				tracing::warn!(
					error = %err,
					"Criteria extraction returned an invalid payload. Using heuristics."
				);

				(heuristic::extract(query, opts), false)
			},
		}
	}
}

/// Validates model output against the criteria schema and normalizes it.
pub(super) fn parse_criteria(
	raw: Value,
	opts: &HeuristicOptions,
) -> serde_json::Result<SearchCriteria> {
	let out: ExtractionOutput = serde_json::from_value(raw)?;
	let employees = out.employees.and_then(|range| {
		NumericRange::<i64>::from_tokens(
			integer(range.min.as_ref()),
			integer(range.max.as_ref()),
			integer(range.exact.as_ref()),
			range.operator.as_deref(),
		)
	});
	let company_age = out.company_age.and_then(|range| {
		NumericRange::<i64>::from_tokens(
			integer(range.min.as_ref()),
			integer(range.max.as_ref()),
			integer(range.exact.as_ref()),
			range.operator.as_deref(),
		)
	});
	let capital = out.capital.and_then(|capital| {
		let scale = unit_multiplier(capital.unit.as_deref())
			* currency_rate(capital.currency.as_deref(), opts.usd_to_cny_rate);
		let scaled = |value: Option<&Value>| number(value).map(|value| value * scale);

		NumericRange::<f64>::from_tokens(
			scaled(capital.range.min.as_ref()),
			scaled(capital.range.max.as_ref()),
			scaled(capital.range.exact.as_ref()),
			capital.range.operator.as_deref(),
		)
	});
	let confidence = number(out.confidence.as_ref())
		.map(|value| value.round().clamp(f64::from(MIN_MODEL_CONFIDENCE), 100.0) as u8)
		.unwrap_or(DEFAULT_MODEL_CONFIDENCE);
	let mut criteria = SearchCriteria {
		products: out.products,
		location: out.location,
		employees,
		company_age,
		capital,
		credit_rating: out.credit_rating,
		brands: out.brands,
		certifications: out.certifications,
		company_type: out.company_type.as_deref().and_then(CompanyType::parse),
		provinces_excluded: out.provinces_excluded,
		cities_excluded: out.cities_excluded,
		sorting: out.sorting.and_then(sorting),
		limit: integer(out.limit.as_ref())
			.filter(|limit| *limit > 0)
			.map(|limit| u32::try_from(limit).unwrap_or(u32::MAX)),
		confidence,
		query_intent: QueryIntent::GeneralSearch,
		company_name: out.company_name,
		exclusions: out.exclusions,
	};

	criteria.query_intent = out
		.query_intent
		.as_deref()
		.and_then(intent)
		.unwrap_or_else(|| inferred_intent(&criteria));

	criteria.normalize(opts.max_limit);

	Ok(criteria)
}

pub(super) fn build_extraction_messages(query: &str) -> Vec<Value> {
	let products: Vec<&str> = lexicon::PRODUCTS.iter().map(|entry| entry.canonical).collect();
	let locations: Vec<&str> = lexicon::LOCATIONS.iter().map(|entry| entry.canonical).collect();
	let schema = serde_json::json!({
		"products": ["string"],
		"location": "string|null",
		"employees": { "min": "number|null", "max": "number|null", "exact": "number|null", "operator": "gte|gt|lte|lt|eq|between" },
		"company_age": { "min": "number|null", "max": "number|null", "exact": "number|null", "operator": "gte|gt|lte|lt|eq|between" },
		"capital": { "min": "number|null", "max": "number|null", "exact": "number|null", "operator": "gte|gt|lte|lt|eq|between", "unit": "yuan|wan|yi|million", "currency": "CNY|USD" },
		"credit_rating": "string|null",
		"brands": ["string"],
		"certifications": ["string"],
		"company_type": "manufacturer|trading|factory|null",
		"provinces_excluded": ["string"],
		"cities_excluded": ["string"],
		"sorting": { "field": "employees|age|capital|name|credit", "order": "asc|desc" },
		"limit": "number|null",
		"confidence": "number 0-100",
		"query_intent": "product_search|company_search|location_search|general_search",
		"company_name": "string|null",
		"exclusions": { "products": ["string"], "locations": ["string"], "company_names": ["string"] }
	});
	let schema_text = serde_json::to_string_pretty(&schema).unwrap_or_else(|_| schema.to_string());
	let system_prompt = "You translate buyer queries about Chinese trade-fair exhibitors into search \
criteria. Queries may be in English, Spanish or Chinese. \
Output must be valid JSON only and must match the provided schema exactly. \
Use null or an empty list for anything the query does not state. \
\"more than N\" means operator gt, \"at least N\" means gte, \"between X and Y\" means between. \
Company age is in years. Anything the user negates (not in, except, excluding, 除了, 不在) \
belongs in the exclusion lists, never in the inclusion fields. \
Do not add explanations or extra fields.";
	let user_prompt = format!(
		"Return JSON matching this exact schema:\n{schema_text}\n\
Known product categories: {products}\n\
Known provinces and cities: {locations}\n\
Query:\n{query}",
		products = products.join(", "),
		locations = locations.join(", "),
	);

	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts JSON numbers and numeric strings such as `"1,200"`.
fn number(value: Option<&Value>) -> Option<f64> {
	let parsed = match value? {
		Value::Number(number) => number.as_f64(),
		Value::String(raw) => raw.trim().replace(',', "").parse::<f64>().ok(),
		_ => None,
	};

	parsed.filter(|value| value.is_finite())
}

fn integer(value: Option<&Value>) -> Option<i64> {
	number(value).map(|value| value.round() as i64)
}

fn unit_multiplier(unit: Option<&str>) -> f64 {
	match unit.map(|unit| unit.trim().to_lowercase()).as_deref() {
		Some("wan" | "万" | "万元" | "ten_thousand") => capital::WAN,
		Some("yi" | "亿" | "亿元" | "hundred_million") => capital::YI,
		Some("million" | "m" | "mm") => 1_000_000.0,
		Some("billion" | "b" | "bn") => 1_000_000_000.0,
		_ => 1.0,
	}
}

fn currency_rate(currency: Option<&str>, usd_to_cny_rate: f64) -> f64 {
	match currency.map(|currency| currency.trim().to_lowercase()).as_deref() {
		Some("usd" | "us$" | "$" | "dollar" | "dollars") => usd_to_cny_rate,
		_ => 1.0,
	}
}

fn sorting(out: SortingOutput) -> Option<SortSpec> {
	let field = match out.field?.trim().to_lowercase().as_str() {
		"employees" | "employee_count" | "insured_employees" | "size" => SortField::Employees,
		"age" | "establishment_year" | "founded" => SortField::Age,
		"capital" | "registered_capital" => SortField::Capital,
		"name" | "name_en" => SortField::Name,
		"credit" | "credit_score" | "rating" => SortField::Credit,
		_ => return None,
	};
	let order = match out.order.as_deref().map(str::trim) {
		Some(order) if order.eq_ignore_ascii_case("asc") => SortOrder::Asc,
		_ => SortOrder::Desc,
	};

	Some(SortSpec { field, order })
}

fn intent(raw: &str) -> Option<QueryIntent> {
	match raw.trim().to_lowercase().as_str() {
		"product_search" => Some(QueryIntent::ProductSearch),
		"company_search" => Some(QueryIntent::CompanySearch),
		"location_search" => Some(QueryIntent::LocationSearch),
		"general_search" => Some(QueryIntent::GeneralSearch),
		_ => None,
	}
}

fn inferred_intent(criteria: &SearchCriteria) -> QueryIntent {
	if criteria.company_name.is_some() {
		QueryIntent::CompanySearch
	} else if !criteria.products.is_empty() {
		QueryIntent::ProductSearch
	} else if criteria.location.is_some() {
		QueryIntent::LocationSearch
	} else {
		QueryIntent::GeneralSearch
	}
}
