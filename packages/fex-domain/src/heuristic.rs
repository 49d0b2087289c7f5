//! Dictionary and pattern based criteria extraction used when the language model is unavailable.

use std::{ops::Range, sync::OnceLock};

use regex::{Captures, Regex};
use unicode_normalization::UnicodeNormalization;

use crate::{
	capital,
	criteria::{
		CompanyType, NumericRange, QueryIntent, SearchCriteria, SortField, SortOrder, SortSpec,
	},
	lexicon::{self, LocationKind},
};

pub const BASE_CONFIDENCE: u8 = 30;
pub const MAX_CONFIDENCE: u8 = 60;

const UNIT: &str = r"(?:employees?|workers?|staff|people|personnel|empleados?|trabajadores)";
const CJK_UNIT: &str = r"(?:名|个|位)?\s*(?:员工|雇员|职工|人)";
const FILLER: &str = r"(?:[a-z-]+\s+)?";
const YEARS: &str = r"(?:years?|yrs?|años)";

const NAME_LEAD_WORDS: &[&str] = &[
	"find", "show", "search", "list", "get", "give", "tell", "check", "verify", "about", "for",
	"me", "info", "information", "on", "is", "are", "who", "what", "the", "i", "need", "want",
	"looking", "buscar", "busca", "encuentra", "información", "sobre",
];
const CJK_NAME_LEAD: &[&str] = &["查找", "搜索", "寻找", "查询", "找"];
const GENERIC_WORDS: &[&str] = &[
	"the", "all", "any", "some", "top", "best", "good", "big", "large", "largest", "small",
	"chinese", "china", "local", "other", "more", "most", "many", "new", "old", "oldest",
	"newest", "verified", "reliable", "trading", "export", "import",
];

/// Inputs the heuristics cannot derive from the query itself.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicOptions {
	pub current_year: i32,
	pub usd_to_cny_rate: f64,
	pub max_limit: u32,
}
impl Default for HeuristicOptions {
	fn default() -> Self {
		Self { current_year: crate::current_year(), usd_to_cny_rate: 7.2, max_limit: 50 }
	}
}

struct Patterns {
	negation_latin: Regex,
	negation_cjk: Regex,
	clause_end: Regex,
	employees_between: Regex,
	employees_dash: Regex,
	employees_gt: Regex,
	employees_gt_cjk: Regex,
	employees_gte: Regex,
	employees_plus: Regex,
	employees_lt: Regex,
	employees_lt_cjk: Regex,
	employees_lte: Regex,
	employees_eq: Regex,
	age_between: Regex,
	age_gt: Regex,
	age_gte: Regex,
	age_lt: Regex,
	age_cjk: Regex,
	founded_before: Regex,
	founded_after: Regex,
	capital_min: Regex,
	capital_max: Regex,
	capital_cjk: Regex,
	name_latin: Regex,
	name_cjk: Regex,
	factory: Regex,
	manufacturer: Regex,
	trading: Regex,
	brand_before: Regex,
	brand_after: Regex,
	sort_explicit: Regex,
	sort_implicit: Vec<(Regex, SortField, SortOrder)>,
	credit: Regex,
	limit_top: Regex,
	limit_count: Regex,
	generic_product: Regex,
	certifications: Vec<(&'static str, Regex)>,
}
impl Patterns {
	fn build() -> Result<Self, regex::Error> {
		let re = |pattern: &str| Regex::new(pattern);

		Ok(Self {
			negation_latin: re(
				r"\b(?:not in|not from|not located in|not|excluding|exclude|except(?: for)?|outside(?: of)?|without|other than|excepto|salvo|sin|no en|fuera de)\b",
			)?,
			negation_cjk: re(r"(?:除了|不在|不要|排除|不含)")?,
			clause_end: re(r"[,;.!?，。；！？]|\b(?:with|that|which|having|con|que)\b|并且|而且")?,
			employees_between: re(&format!(
				r"(?:between|entre)\s+(\d+)\s*(?:and|y|to|-)\s*(\d+)\s+{FILLER}{UNIT}"
			))?,
			employees_dash: re(&format!(
				r"(\d+)\s*(?:-|~|to|至|到)\s*(\d+)\s*(?:{FILLER}{UNIT}|{CJK_UNIT})"
			))?,
			employees_gt: re(&format!(
				r"(?:more than|over|above|greater than|más de|mas de|>)\s*(\d+)\s+{FILLER}{UNIT}"
			))?,
			employees_gt_cjk: re(&format!(r"(?:超过|多于|大于)\s*(\d+)\s*{CJK_UNIT}"))?,
			employees_gte: re(&format!(
				r"(?:at least|minimum of|no less than|al menos|>=)\s*(\d+)\s+{FILLER}{UNIT}|(\d+)\s*{CJK_UNIT}\s*以上"
			))?,
			employees_plus: re(&format!(r"(\d+)\s*\+\s*{UNIT}"))?,
			employees_lt: re(&format!(
				r"(?:less than|fewer than|under|below|menos de|<)\s*(\d+)\s+{FILLER}{UNIT}"
			))?,
			employees_lt_cjk: re(&format!(r"(?:少于|小于|不到|低于)\s*(\d+)\s*{CJK_UNIT}"))?,
			employees_lte: re(&format!(
				r"(?:up to|at most|no more than|maximum of|hasta|<=)\s*(\d+)\s+{FILLER}{UNIT}"
			))?,
			employees_eq: re(&format!(r"\b(\d+)\s+{UNIT}|(\d+)\s*{CJK_UNIT}"))?,
			age_between: re(&format!(r"between\s+(\d+)\s*(?:and|to|-)\s*(\d+)\s*{YEARS}"))?,
			age_gt: re(&format!(
				r"(?:older than|more than|over|above|más de)\s*(\d+)\s*{YEARS}"
			))?,
			age_gte: re(&format!(r"(?:at least|minimum of|al menos)\s*(\d+)\s*{YEARS}|(\d+)\s*\+\s*{YEARS}"))?,
			age_lt: re(&format!(
				r"(?:less than|under|younger than|menos de)\s*(\d+)\s*{YEARS}"
			))?,
			age_cjk: re(r"(?:成立|经营)?\s*(超过|多于|少于|不到)\s*(\d+)\s*年")?,
			founded_before: re(
				r"(?:established|founded|incorporated)\s+(?:before|prior to)\s+((?:19|20)\d{2})",
			)?,
			founded_after: re(
				r"(?:established|founded|incorporated)\s+(after|since|in or after)\s+((?:19|20)\d{2})",
			)?,
			capital_min: re(
				r"capital\s*(?:of\s+)?(?:over|above|more than|at least|exceeding|>=?)\s*(\$|¥|rmb|usd)?\s*(\d+(?:\.\d+)?)\s*(million|billion|bn|k|万|亿)?\s*(usd|dollars?|rmb|yuan|cny|元)?",
			)?,
			capital_max: re(
				r"capital\s*(?:of\s+)?(?:under|below|less than|at most|<=?)\s*(\$|¥|rmb|usd)?\s*(\d+(?:\.\d+)?)\s*(million|billion|bn|k|万|亿)?\s*(usd|dollars?|rmb|yuan|cny|元)?",
			)?,
			capital_cjk: re(
				r"注册资本\s*(超过|大于|不低于|低于|少于|不超过)?\s*(\d+(?:\.\d+)?)\s*(万|亿)?\s*(美元|元|人民币)?\s*(以上|以下)?",
			)?,
			name_latin: re(
				r"((?:[A-Z0-9][\w&'.-]*\s+){0,6}[A-Z0-9][\w&'.-]*\s+(?:Co\.?,?\s*Ltd\.?|Company(?:\s+Limited)?|Corporation|Corp\.?|Group|Inc\.?|Limited|Ltd\.?))",
			)?,
			name_cjk: re(r"([\p{Han}A-Za-z0-9（）()]{2,30}?(?:股份有限公司|有限责任公司|有限公司|集团|公司))")?,
			factory: re(r"\b(?:factory|factories|fábricas?)\b|工厂")?,
			manufacturer: re(
				r"\b(?:manufacturers?|manufacturing|makers?|producers?|fabricantes?)\b|制造商|生产商|厂家",
			)?,
			trading: re(
				r"\b(?:trading|traders?|exporters?|importers?|distributors?|wholesalers?)\b|贸易|外贸",
			)?,
			brand_before: re(
				r"(?i:\bbrands?|\bmarcas?)\s*(?:(?i:like|such as|named|called|including)\s+)?([A-Za-z0-9][\w&-]+)",
			)?,
			brand_after: re(r"\b([A-Z][\w&-]+)\s+(?i:brand)\b")?,
			sort_explicit: re(
				r"(?:sort(?:ed)?|order(?:ed)?)\s+by\s+(employees|size|age|capital|name|credit)(?:\s+(asc|ascending|desc|descending))?",
			)?,
			sort_implicit: vec![
				(re(r"\b(?:largest|biggest|most employees)\b")?, SortField::Employees, SortOrder::Desc),
				(re(r"\bsmallest\b")?, SortField::Employees, SortOrder::Asc),
				(re(r"\b(?:oldest|most established|longest running)\b")?, SortField::Age, SortOrder::Desc),
				(re(r"\b(?:newest|youngest|most recent)\b")?, SortField::Age, SortOrder::Asc),
				(re(r"\b(?:highest|most|largest) capital\b|\bricher?st\b")?, SortField::Capital, SortOrder::Desc),
				(re(r"\b(?:best|highest|top) (?:credit|rated)\b")?, SortField::Credit, SortOrder::Desc),
				(re(r"\balphabetical(?:ly)?\b")?, SortField::Name, SortOrder::Asc),
			],
			credit: re(
				r"\b(credit\s+(?:rating\s+|grade\s+)?|rating\s+|rated\s+)(?:of\s+|:\s*)?(aaa|aa|a|bbb|bb|b|c)([+-]?)(?:[\s,.;]|$)",
			)?,
			limit_top: re(r"\btop\s+(\d{1,3})\b")?,
			limit_count: re(
				r"\b(\d{1,3})\s+(?:companies|suppliers|manufacturers|factories|exporters|firms|empresas|results)\b",
			)?,
			generic_product: re(
				r"\b([a-z][a-z-]{2,})\s+(?:companies|suppliers|manufacturers|makers|factories|exporters|producers|vendors|empresas)\b",
			)?,
			certifications: vec![
				("ISO 9001", re(r"(?i)\biso\s*-?\s*9001\b")?),
				("ISO 14001", re(r"(?i)\biso\s*-?\s*14001\b")?),
				("ISO 13485", re(r"(?i)\biso\s*-?\s*13485\b")?),
				("CE", re(r"\bCE\b")?),
				("FDA", re(r"\bFDA\b")?),
				("RoHS", re(r"(?i)\brohs\b")?),
				("UL", re(r"\bUL\b")?),
				("BSCI", re(r"(?i)\bbsci\b")?),
				("FCC", re(r"\bFCC\b")?),
				("GMP", re(r"\bGMP\b")?),
				("SGS", re(r"\bSGS\b")?),
				("HACCP", re(r"(?i)\bhaccp\b")?),
			],
		})
	}
}

fn patterns() -> Option<&'static Patterns> {
	static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();

	PATTERNS.get_or_init(|| Patterns::build().ok()).as_ref()
}

/// Extracts criteria from free text without any external capability.
///
/// The result always carries a confidence inside the heuristic band so callers can tell it apart
/// from model output.
pub fn extract(query: &str, opts: &HeuristicOptions) -> SearchCriteria {
	let normalized: String = query.nfkc().collect::<String>().trim().to_string();
	let mut criteria = SearchCriteria {
		confidence: BASE_CONFIDENCE,
		query_intent: QueryIntent::GeneralSearch,
		..Default::default()
	};

	if normalized.is_empty() {
		return criteria;
	}

	let Some(p) = patterns() else {
		apply_lexicon(&mut criteria, &normalized.to_lowercase(), &[]);

		return finish(criteria, opts);
	};
	let (name, remainder) = detect_company_name(p, &normalized);

	criteria.company_name = name;

	let lower = remainder.to_lowercase();
	let negated = negation_spans(p, &lower);

	apply_lexicon(&mut criteria, &lower, &negated);

	if criteria.products.is_empty() && criteria.company_name.is_none() {
		apply_generic_product(p, &mut criteria, &lower, &negated);
	}

	criteria.employees = employee_range(p, &lower);
	criteria.company_age = age_range(p, &lower, opts.current_year);
	criteria.capital = capital_range(p, &lower, opts.usd_to_cny_rate);
	criteria.company_type = company_type(p, &lower);
	criteria.certifications = p
		.certifications
		.iter()
		.filter(|(_, re)| re.is_match(&remainder))
		.map(|(name, _)| (*name).to_string())
		.collect();
	criteria.brands = brands(p, &remainder);
	criteria.sorting = sorting(p, &lower);
	criteria.credit_rating = credit_rating(p, &lower);
	criteria.limit = limit(p, &lower);

	if criteria.company_name.is_none() && looks_like_bare_name(&normalized, &criteria) {
		criteria.company_name = Some(normalized.clone());
	}

	finish(criteria, opts)
}

fn finish(mut criteria: SearchCriteria, opts: &HeuristicOptions) -> SearchCriteria {
	criteria.normalize(opts.max_limit);

	let mut confidence = BASE_CONFIDENCE;

	if !criteria.products.is_empty() || criteria.company_name.is_some() {
		confidence += 10;
	}
	if criteria.location.is_some()
		|| !criteria.provinces_excluded.is_empty()
		|| !criteria.cities_excluded.is_empty()
	{
		confidence += 10;
	}
	if criteria.has_numeric_range() {
		confidence += 10;
	}

	criteria.confidence = confidence.min(MAX_CONFIDENCE);
	criteria.query_intent = if criteria.company_name.is_some() {
		QueryIntent::CompanySearch
	} else if !criteria.products.is_empty() {
		QueryIntent::ProductSearch
	} else if criteria.location.is_some() || !criteria.provinces_excluded.is_empty() {
		QueryIntent::LocationSearch
	} else {
		QueryIntent::GeneralSearch
	};

	criteria
}

/// Finds an explicit legal company name and returns the text with that span blanked out.
fn detect_company_name(p: &Patterns, text: &str) -> (Option<String>, String) {
	let found = p
		.name_latin
		.captures(text)
		.and_then(|caps| caps.get(1))
		.map(|m| (m.range(), strip_lead_words(m.as_str())))
		.or_else(|| {
			p.name_cjk
				.captures(text)
				.and_then(|caps| caps.get(1))
				.map(|m| (m.range(), strip_cjk_lead(m.as_str())))
		});
	let Some((range, name)) = found else {
		return (None, text.to_string());
	};

	if name.is_empty() {
		return (None, text.to_string());
	}

	let mut remainder = text.to_string();

	remainder.replace_range(range.clone(), &" ".repeat(range.len()));

	(Some(name), remainder)
}

fn strip_lead_words(name: &str) -> String {
	let mut words: Vec<&str> = name.split_whitespace().collect();

	while words.len() > 1
		&& NAME_LEAD_WORDS.iter().any(|lead| lead.eq_ignore_ascii_case(words[0]))
	{
		words.remove(0);
	}

	words.join(" ")
}

fn strip_cjk_lead(name: &str) -> String {
	let mut out = name;

	for lead in CJK_NAME_LEAD {
		if let Some(rest) = out.strip_prefix(lead) {
			out = rest;
		}
	}

	out.to_string()
}

fn negation_spans(p: &Patterns, lower: &str) -> Vec<Range<usize>> {
	p.negation_latin
		.find_iter(lower)
		.chain(p.negation_cjk.find_iter(lower))
		.map(|marker| {
			let tail = &lower[marker.end()..];
			let end = p.clause_end.find(tail).map(|m| marker.end() + m.start()).unwrap_or(lower.len());

			marker.end()..end
		})
		.collect()
}

fn in_spans(spans: &[Range<usize>], position: usize) -> bool {
	spans.iter().any(|span| span.contains(&position))
}

fn apply_lexicon(criteria: &mut SearchCriteria, lower: &str, negated: &[Range<usize>]) {
	for hit in lexicon::find_products(lower) {
		let canonical = hit.entry.canonical.to_string();

		if in_spans(negated, hit.start) {
			criteria.exclusions.products.push(canonical);
		} else {
			criteria.products.push(canonical);
		}
	}

	for hit in lexicon::find_locations(lower) {
		let canonical = hit.entry.canonical.to_string();

		if in_spans(negated, hit.start) {
			match hit.entry.kind {
				LocationKind::Province => criteria.provinces_excluded.push(canonical),
				LocationKind::City => criteria.cities_excluded.push(canonical),
			}
		} else if criteria.location.is_none() {
			criteria.location = Some(canonical);
		}
	}
}

fn apply_generic_product(
	p: &Patterns,
	criteria: &mut SearchCriteria,
	lower: &str,
	negated: &[Range<usize>],
) {
	for caps in p.generic_product.captures_iter(lower) {
		let Some(word) = caps.get(1) else {
			continue;
		};
		let term = word.as_str();

		if GENERIC_WORDS.contains(&term) || lexicon::location(term).is_some() {
			continue;
		}
		if in_spans(negated, word.start()) {
			criteria.exclusions.products.push(term.to_string());
		} else {
			criteria.products.push(term.to_string());
		}
	}
}

fn number(caps: &Captures<'_>, group: usize) -> Option<i64> {
	caps.get(group).and_then(|m| m.as_str().parse().ok())
}

fn first_number(re: &Regex, text: &str) -> Option<i64> {
	let caps = re.captures(text)?;

	number(&caps, 1).or_else(|| number(&caps, 2))
}

fn employee_range(p: &Patterns, lower: &str) -> Option<NumericRange<i64>> {
	for re in [&p.employees_between, &p.employees_dash] {
		if let Some(caps) = re.captures(lower)
			&& let (Some(a), Some(b)) = (number(&caps, 1), number(&caps, 2))
		{
			return Some(NumericRange::between(a, b));
		}
	}

	let min = first_number(&p.employees_gt, lower)
		.or_else(|| first_number(&p.employees_gt_cjk, lower))
		.map(|n| n.saturating_add(1))
		.or_else(|| first_number(&p.employees_gte, lower))
		.or_else(|| first_number(&p.employees_plus, lower));
	let max = first_number(&p.employees_lt, lower)
		.or_else(|| first_number(&p.employees_lt_cjk, lower))
		.map(|n| n.saturating_sub(1))
		.or_else(|| first_number(&p.employees_lte, lower));

	match (min, max) {
		(None, None) => first_number(&p.employees_eq, lower).map(NumericRange::exactly),
		(min, max) => NumericRange::from_parts(min, max, None, None),
	}
}

fn age_range(p: &Patterns, lower: &str, current_year: i32) -> Option<NumericRange<i64>> {
	let year = i64::from(current_year);

	if let Some(caps) = p.age_between.captures(lower)
		&& let (Some(a), Some(b)) = (number(&caps, 1), number(&caps, 2))
	{
		return Some(NumericRange::between(a, b));
	}

	let mut min = first_number(&p.age_gt, lower)
		.map(|n| n.saturating_add(1))
		.or_else(|| first_number(&p.age_gte, lower));
	let mut max = first_number(&p.age_lt, lower).map(|n| n.saturating_sub(1).max(0));

	if let Some(caps) = p.age_cjk.captures(lower)
		&& let Some(n) = number(&caps, 2)
	{
		match caps.get(1).map(|m| m.as_str()) {
			Some("超过" | "多于") => min = min.or(Some(n.saturating_add(1))),
			_ => max = max.or(Some(n.saturating_sub(1).max(0))),
		}
	}
	if let Some(founded) = first_number(&p.founded_before, lower) {
		min = min.or(Some(year.saturating_sub(founded).saturating_add(1)));
	}
	if let Some(caps) = p.founded_after.captures(lower)
		&& let Some(founded) = number(&caps, 2)
	{
		let inclusive = caps.get(1).is_some_and(|m| m.as_str() != "after");
		let since = year.saturating_sub(founded);
		let bound = if inclusive { since } else { since.saturating_sub(1) };

		max = max.or(Some(bound.max(0)));
	}

	NumericRange::from_parts(min, max, None, None)
}

fn capital_range(p: &Patterns, lower: &str, usd_to_cny_rate: f64) -> Option<NumericRange<f64>> {
	let amount = |caps: &Captures<'_>| -> Option<f64> {
		let value: f64 = caps.get(2)?.as_str().parse().ok()?;
		let unit = match caps.get(3).map(|m| m.as_str()) {
			Some("million") => 1_000_000.0,
			Some("billion" | "bn") => 1_000_000_000.0,
			Some("k") => 1_000.0,
			Some("万") => capital::WAN,
			Some("亿") => capital::YI,
			_ => 1.0,
		};
		let usd = [caps.get(1), caps.get(4)]
			.into_iter()
			.flatten()
			.any(|m| matches!(m.as_str(), "$" | "usd" | "dollar" | "dollars"));
		let cny = value * unit * if usd { usd_to_cny_rate } else { 1.0 };

		cny.is_finite().then_some(cny)
	};
	let min = p.capital_min.captures(lower).and_then(|caps| amount(&caps));
	let max = p.capital_max.captures(lower).and_then(|caps| amount(&caps));

	if min.is_some() || max.is_some() {
		return NumericRange::from_parts(min, max, None, None);
	}

	let caps = p.capital_cjk.captures(lower)?;
	let value: f64 = caps.get(2)?.as_str().parse().ok()?;
	let unit = match caps.get(3).map(|m| m.as_str()) {
		Some("万") => capital::WAN,
		Some("亿") => capital::YI,
		_ => 1.0,
	};
	let rate = if caps.get(4).is_some_and(|m| m.as_str() == "美元") { usd_to_cny_rate } else { 1.0 };
	let cny = value * unit * rate;
	let below = matches!(caps.get(1).map(|m| m.as_str()), Some("低于" | "少于" | "不超过"))
		|| caps.get(5).is_some_and(|m| m.as_str() == "以下");

	if below { Some(NumericRange::at_most(cny)) } else { Some(NumericRange::at_least(cny)) }
}

fn company_type(p: &Patterns, lower: &str) -> Option<CompanyType> {
	if p.factory.is_match(lower) {
		Some(CompanyType::Factory)
	} else if p.manufacturer.is_match(lower) {
		Some(CompanyType::Manufacturer)
	} else if p.trading.is_match(lower) {
		Some(CompanyType::Trading)
	} else {
		None
	}
}

fn brands(p: &Patterns, text: &str) -> Vec<String> {
	p.brand_before
		.captures_iter(text)
		.chain(p.brand_after.captures_iter(text))
		.filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
		.filter(|brand| {
			!matches!(brand.to_lowercase().as_str(), "the" | "and" | "of" | "for" | "with")
				&& lexicon::product(brand).is_none()
		})
		.collect()
}

fn sorting(p: &Patterns, lower: &str) -> Option<SortSpec> {
	if let Some(caps) = p.sort_explicit.captures(lower) {
		let field = match caps.get(1).map(|m| m.as_str()) {
			Some("age") => SortField::Age,
			Some("capital") => SortField::Capital,
			Some("name") => SortField::Name,
			Some("credit") => SortField::Credit,
			_ => SortField::Employees,
		};
		let order = match caps.get(2).map(|m| m.as_str()) {
			Some("asc" | "ascending") => SortOrder::Asc,
			Some(_) => SortOrder::Desc,
			None if field == SortField::Name => SortOrder::Asc,
			None => SortOrder::Desc,
		};

		return Some(SortSpec { field, order });
	}

	p.sort_implicit
		.iter()
		.find(|(re, _, _)| re.is_match(lower))
		.map(|(_, field, order)| SortSpec { field: *field, order: *order })
}

fn credit_rating(p: &Patterns, lower: &str) -> Option<String> {
	let caps = p.credit.captures(lower)?;
	let lead = caps.get(1)?.as_str();
	let grade = caps.get(2)?.as_str();
	let sign = caps.get(3).map(|m| m.as_str()).unwrap_or_default();

	if !lead.starts_with("credit") && sign.is_empty() {
		return None;
	}

	Some(format!("{}{sign}", grade.to_uppercase()))
}

fn limit(p: &Patterns, lower: &str) -> Option<u32> {
	[&p.limit_top, &p.limit_count]
		.into_iter()
		.find_map(|re| re.captures(lower).and_then(|caps| caps.get(1)?.as_str().parse().ok()))
		.filter(|limit: &u32| *limit > 0)
}

/// A short run of capitalized words that names nothing in the lexicon reads as a company name.
fn looks_like_bare_name(normalized: &str, criteria: &SearchCriteria) -> bool {
	let words: Vec<&str> = normalized.split_whitespace().collect();

	(1..=4).contains(&words.len())
		&& criteria.products.is_empty()
		&& criteria.location.is_none()
		&& criteria.brands.is_empty()
		&& !criteria.has_numeric_range()
		&& criteria.company_type.is_none()
		&& words.iter().all(|word| {
			word.chars().next().is_some_and(char::is_uppercase)
				&& word.chars().all(|c| c.is_alphanumeric() || matches!(c, '&' | '-' | '.' | '\''))
		})
}
