//! Predicate model shared by every company store.
//!
//! A [`CompanyFilter`] is a conjunction of clauses and each clause is a disjunction of predicates.
//! The in-memory evaluator here is the reference semantics; SQL renderings must agree with it.

use std::cmp::Ordering;

use unicode_segmentation::UnicodeSegmentation;

use crate::{
	company::{Company, NumberField, TextField},
	criteria::{MAX_COMPANY_AGE, SearchCriteria, SortField, SortOrder, SortSpec},
	lexicon::{self, LocationKind},
};

const PRODUCT_FIELDS: &[TextField] = &[
	TextField::NameEn,
	TextField::NameCn,
	TextField::MainProducts,
	TextField::Keywords,
	TextField::Category,
];
const NAME_FIELDS: &[TextField] = &[TextField::NameEn, TextField::NameCn];
const BRAND_FIELDS: &[TextField] = &[
	TextField::NameEn,
	TextField::NameCn,
	TextField::OfficialWebsite,
	TextField::FairWebsite,
];
const CERTIFICATION_FIELDS: &[TextField] = &[
	TextField::Profile,
	TextField::BusinessScope,
	TextField::Keywords,
	TextField::MainProducts,
];
const BROAD_FIELDS: &[TextField] = &[
	TextField::NameEn,
	TextField::NameCn,
	TextField::MainProducts,
	TextField::Keywords,
	TextField::Category,
	TextField::Industry,
	TextField::BusinessScope,
];

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
	/// Case-insensitive substring. A missing value never matches.
	Contains { field: TextField, term: String },
	/// Case-insensitive negated substring. A missing value counts as empty and passes.
	NotContains { field: TextField, term: String },
	/// Inclusive bounds. A missing or unparsable value fails.
	Range { field: NumberField, min: Option<f64>, max: Option<f64> },
}
impl Predicate {
	pub fn matches(&self, company: &Company) -> bool {
		match self {
			Self::Contains { field, term } => company
				.text(*field)
				.is_some_and(|value| value.to_lowercase().contains(&term.to_lowercase())),
			Self::NotContains { field, term } => !company
				.text(*field)
				.unwrap_or_default()
				.to_lowercase()
				.contains(&term.to_lowercase()),
			Self::Range { field, min, max } => company.number(*field).is_some_and(|value| {
				min.is_none_or(|min| value >= min) && max.is_none_or(|max| value <= max)
			}),
		}
	}
}

/// Disjunction of predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clause {
	pub any_of: Vec<Predicate>,
}
impl Clause {
	pub fn matches(&self, company: &Company) -> bool {
		self.any_of.iter().any(|predicate| predicate.matches(company))
	}
}

/// Conjunction of clauses. An empty filter accepts every company.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyFilter {
	pub clauses: Vec<Clause>,
}
impl CompanyFilter {
	pub fn matches(&self, company: &Company) -> bool {
		self.clauses.iter().all(|clause| clause.matches(company))
	}

	pub fn is_empty(&self) -> bool {
		self.clauses.is_empty()
	}

	fn require(&mut self, any_of: Vec<Predicate>) {
		if !any_of.is_empty() {
			self.clauses.push(Clause { any_of });
		}
	}

	fn forbid(&mut self, field: TextField, term: &str) {
		self.clauses.push(Clause {
			any_of: vec![Predicate::NotContains { field, term: term.to_string() }],
		});
	}
}

/// Ranges and exclusions. Every strategy's output must satisfy these.
pub fn hard_constraints(criteria: &SearchCriteria, current_year: i32) -> CompanyFilter {
	let mut filter = CompanyFilter::default();

	if let Some(range) = criteria.employees {
		let (lo, hi) = range.bounds();

		filter.require(vec![Predicate::Range {
			field: NumberField::InsuredEmployees,
			min: lo.map(|v| v as f64),
			max: hi.map(|v| v as f64),
		}]);
	}
	if let Some(range) = criteria.company_age {
		let (lo, hi) = range.bounds();
		let year = i64::from(current_year);

		// Older companies have smaller establishment years.
		filter.require(vec![Predicate::Range {
			field: NumberField::EstablishmentYear,
			min: hi.map(|age| year.saturating_sub(age.clamp(0, MAX_COMPANY_AGE)) as f64),
			max: lo.map(|age| year.saturating_sub(age.clamp(0, MAX_COMPANY_AGE)) as f64),
		}]);
	}
	if let Some(range) = criteria.capital {
		let (lo, hi) = range.bounds();

		filter.require(vec![Predicate::Range { field: NumberField::RegisteredCapital, min: lo, max: hi }]);
	}

	for province in &criteria.provinces_excluded {
		for term in lexicon::location_terms(province) {
			filter.forbid(TextField::Province, &term);
		}
	}
	for city in &criteria.cities_excluded {
		for term in lexicon::location_terms(city) {
			filter.forbid(TextField::Address, &term);
		}
	}
	for product in &criteria.exclusions.products {
		for term in lexicon::product_terms(product) {
			filter.forbid(TextField::MainProducts, &term);
		}
	}
	for name in &criteria.exclusions.company_names {
		for field in NAME_FIELDS {
			filter.forbid(*field, name);
		}
	}

	filter
}

/// Structured predicates for the exact strategy: hard constraints plus every inclusion group.
pub fn exact(criteria: &SearchCriteria, current_year: i32) -> CompanyFilter {
	let mut filter = hard_constraints(criteria, current_year);

	filter.require(
		criteria
			.products
			.iter()
			.flat_map(|product| lexicon::product_terms(product))
			.flat_map(|term| contains_any(PRODUCT_FIELDS, &term))
			.collect(),
	);
	filter.require(
		criteria.brands.iter().flat_map(|brand| contains_any(BRAND_FIELDS, brand)).collect(),
	);

	if let Some(location) = criteria.location.as_deref() {
		filter.require(
			lexicon::location_terms(location)
				.iter()
				.flat_map(|term| contains_any(location_fields(location), term))
				.collect(),
		);
	}
	if let Some(kind) = criteria.company_type {
		filter.require(
			kind.name_patterns()
				.iter()
				.flat_map(|pattern| contains_any(NAME_FIELDS, pattern))
				.collect(),
		);
	}

	filter.require(
		criteria
			.certifications
			.iter()
			.flat_map(|cert| contains_any(CERTIFICATION_FIELDS, cert))
			.collect(),
	);

	if let Some(name) = criteria.company_name.as_deref() {
		filter.require(contains_any(NAME_FIELDS, &core_name(name)));
	}
	if let Some(rating) = criteria.credit_rating.as_deref() {
		filter.require(vec![Predicate::Contains {
			field: TextField::CreditRating,
			term: rating.to_string(),
		}]);
	}

	filter
}

/// Wide prefetch for the fuzzy strategy: any criteria term (or query word) in any text field.
pub fn broad(criteria: &SearchCriteria, query: &str, current_year: i32) -> CompanyFilter {
	let mut filter = hard_constraints(criteria, current_year);
	let mut terms: Vec<String> =
		criteria.products.iter().flat_map(|product| lexicon::product_terms(product)).collect();

	if let Some(location) = criteria.location.as_deref() {
		terms.extend(lexicon::location_terms(location));
	}
	if let Some(name) = criteria.company_name.as_deref() {
		terms.push(core_name(name));
	}
	if terms.is_empty() {
		terms = query_words(query);
	}

	filter.require(terms.iter().flat_map(|term| contains_any(BROAD_FIELDS, term)).collect());

	filter
}

/// Lowercase query words worth matching on: longer than two characters or CJK.
pub fn query_words(query: &str) -> Vec<String> {
	let mut words: Vec<String> = Vec::new();

	for word in query.unicode_words() {
		let lower = word.to_lowercase();

		if (lower.chars().count() > 2 || crate::cjk::contains_cjk(&lower)) && !words.contains(&lower)
		{
			words.push(lower);
		}
	}

	words
}

/// Resolved ordering. Age sorts by establishment year in the opposite direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortPlan {
	pub field: SortField,
	pub ascending: bool,
}
impl SortPlan {
	pub fn resolve(spec: Option<&SortSpec>) -> Self {
		let spec = spec.copied().unwrap_or_default();
		let ascending = matches!(spec.order, SortOrder::Asc);

		match spec.field {
			SortField::Age => Self { field: SortField::Age, ascending: !ascending },
			field => Self { field, ascending },
		}
	}
}

/// Orders companies the way stores order exact results. Missing values sort last.
pub fn sort_companies(companies: &mut [Company], spec: Option<&SortSpec>) {
	let plan = SortPlan::resolve(spec);

	companies.sort_by(|a, b| {
		let ordering = match plan.field {
			SortField::Name => compare_nulls_last(
				a.name_en.as_deref().map(str::to_lowercase),
				b.name_en.as_deref().map(str::to_lowercase),
				plan.ascending,
			),
			field => compare_nulls_last(
				sort_number(a, field),
				sort_number(b, field),
				plan.ascending,
			),
		};

		ordering.then_with(|| a.id.cmp(&b.id))
	});
}

fn sort_number(company: &Company, field: SortField) -> Option<f64> {
	match field {
		SortField::Employees => company.number(NumberField::InsuredEmployees),
		SortField::Age => company.number(NumberField::EstablishmentYear),
		SortField::Capital => company.number(NumberField::RegisteredCapital),
		SortField::Credit => company.number(NumberField::CreditScore),
		SortField::Name => None,
	}
}

fn compare_nulls_last<T: PartialOrd>(a: Option<T>, b: Option<T>, ascending: bool) -> Ordering {
	match (a, b) {
		(Some(a), Some(b)) => {
			let ordering = a.partial_cmp(&b).unwrap_or(Ordering::Equal);

			if ascending { ordering } else { ordering.reverse() }
		},
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => Ordering::Equal,
	}
}

fn contains_any(fields: &[TextField], term: &str) -> Vec<Predicate> {
	fields
		.iter()
		.map(|field| Predicate::Contains { field: *field, term: term.to_string() })
		.collect()
}

fn location_fields(location: &str) -> &'static [TextField] {
	match lexicon::location(location).map(|entry| entry.kind) {
		Some(LocationKind::Province) => &[TextField::Province],
		Some(LocationKind::City) => &[TextField::Address],
		None => &[TextField::Province, TextField::Address],
	}
}

/// Drops legal suffixes so `Xiamen Youngmart Trading Co., Ltd.` still matches records that spell
/// the suffix differently.
fn core_name(name: &str) -> String {
	let mut core = name.trim();

	for suffix in [
		"股份有限公司",
		"有限责任公司",
		"有限公司",
		"Co., Ltd.",
		"Co., Ltd",
		"Co.,Ltd.",
		"Co.,Ltd",
		"Co. Ltd.",
		"Company Limited",
		"Corporation",
		"Limited",
		"Ltd.",
		"Inc.",
	] {
		if let Some(stripped) = core.strip_suffix(suffix) {
			core = stripped.trim_end_matches([' ', ',']);

			break;
		}
	}

	if core.is_empty() { name.trim().to_string() } else { core.to_string() }
}
