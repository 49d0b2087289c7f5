//! Fixed vocabulary for product categories and Chinese locations.
//!
//! `terms` are spellings found in company records (English and Chinese) and drive predicates.
//! `aliases` are additional query-side spellings (Spanish, spaced pinyin) used for detection only.

use crate::cjk;

#[derive(Debug)]
pub struct ProductEntry {
	pub canonical: &'static str,
	pub terms: &'static [&'static str],
	pub aliases: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationKind {
	Province,
	City,
}

#[derive(Debug)]
pub struct LocationEntry {
	pub canonical: &'static str,
	pub kind: LocationKind,
	pub terms: &'static [&'static str],
	pub aliases: &'static [&'static str],
}

/// A lexicon hit inside a lowercase haystack.
#[derive(Debug)]
pub struct Hit<E: 'static> {
	pub entry: &'static E,
	pub start: usize,
	pub end: usize,
}

pub static PRODUCTS: &[ProductEntry] = &[
	ProductEntry {
		canonical: "LED",
		terms: &["LED", "lighting", "lamp", "照明", "灯"],
		aliases: &["luces", "iluminación", "iluminacion", "bombillas", "lámparas", "bulbs"],
	},
	ProductEntry {
		canonical: "textiles",
		terms: &["textile", "fabric", "garment", "clothing", "纺织", "服装"],
		aliases: &["textil", "ropa", "tela", "apparel"],
	},
	ProductEntry {
		canonical: "electronics",
		terms: &["electronic", "电子"],
		aliases: &["electrónicos", "electronicos", "electrónica"],
	},
	ProductEntry {
		canonical: "food",
		terms: &["food", "beverage", "食品"],
		aliases: &["alimentos", "comida", "bebidas"],
	},
	ProductEntry {
		canonical: "medical",
		terms: &["medical", "pharmaceutical", "医疗", "医药"],
		aliases: &["medicina", "médico", "farmacéutico"],
	},
	ProductEntry {
		canonical: "machinery",
		terms: &["machinery", "machine", "机械"],
		aliases: &["maquinaria", "máquinas"],
	},
	ProductEntry {
		canonical: "irrigation",
		terms: &["irrigation", "sprinkler", "drip", "灌溉"],
		aliases: &["riego"],
	},
	ProductEntry {
		canonical: "ceramics",
		terms: &["ceramic", "tile", "陶瓷", "瓷砖"],
		aliases: &["cerámica", "ceramica", "azulejos"],
	},
	ProductEntry {
		canonical: "automotive",
		terms: &["automotive", "auto parts", "汽车"],
		aliases: &["automotriz", "car parts"],
	},
	ProductEntry {
		canonical: "furniture",
		terms: &["furniture", "家具"],
		aliases: &["muebles", "mobiliario"],
	},
	ProductEntry {
		canonical: "PVC",
		terms: &["PVC", "plastic", "塑料"],
		aliases: &["plástico", "vinyl"],
	},
	ProductEntry {
		canonical: "flooring",
		terms: &["flooring", "floor", "地板"],
		aliases: &["pisos", "suelos"],
	},
];

pub static LOCATIONS: &[LocationEntry] = &[
	province("Guangdong", &["Guangdong", "广东"], &["guang dong"]),
	province("Shandong", &["Shandong", "山东"], &["shan dong"]),
	province("Jiangsu", &["Jiangsu", "江苏"], &["jiang su"]),
	province("Zhejiang", &["Zhejiang", "浙江"], &["zhe jiang"]),
	province("Fujian", &["Fujian", "福建"], &["fu jian"]),
	province("Jiangxi", &["Jiangxi", "江西"], &["jiang xi"]),
	province("Hubei", &["Hubei", "湖北"], &["hu bei"]),
	province("Hebei", &["Hebei", "河北"], &["he bei"]),
	province("Henan", &["Henan", "河南"], &["he nan"]),
	province("Sichuan", &["Sichuan", "四川"], &["si chuan"]),
	province("Shanghai", &["Shanghai", "上海"], &["shang hai"]),
	province("Beijing", &["Beijing", "北京"], &["bei jing", "peking"]),
	province("Tianjin", &["Tianjin", "天津"], &["tian jin"]),
	province("Chongqing", &["Chongqing", "重庆"], &["chong qing"]),
	city("Guangzhou", &["Guangzhou", "广州"], &["canton", "cantón"]),
	city("Shenzhen", &["Shenzhen", "深圳"], &["shen zhen"]),
	city("Foshan", &["Foshan", "佛山"], &["fo shan"]),
	city("Dongguan", &["Dongguan", "东莞"], &["dong guan"]),
	city("Xiamen", &["Xiamen", "厦门"], &["xia men", "amoy"]),
	city("Ningbo", &["Ningbo", "宁波"], &["ning bo"]),
	city("Yiwu", &["Yiwu", "义乌"], &["yi wu"]),
	city("Qingdao", &["Qingdao", "青岛"], &["qing dao"]),
	city("Jinan", &["Jinan", "济南"], &["ji nan"]),
	city("Suzhou", &["Suzhou", "苏州"], &["su zhou"]),
];

const fn province(
	canonical: &'static str,
	terms: &'static [&'static str],
	aliases: &'static [&'static str],
) -> LocationEntry {
	LocationEntry { canonical, kind: LocationKind::Province, terms, aliases }
}

const fn city(
	canonical: &'static str,
	terms: &'static [&'static str],
	aliases: &'static [&'static str],
) -> LocationEntry {
	LocationEntry { canonical, kind: LocationKind::City, terms, aliases }
}

/// Finds every product entry mentioned in `haystack`, ordered by position.
pub fn find_products(haystack: &str) -> Vec<Hit<ProductEntry>> {
	find(haystack, PRODUCTS, |entry| entry.terms.iter().chain(entry.aliases).copied())
}

/// Finds every location entry mentioned in `haystack`, ordered by position.
pub fn find_locations(haystack: &str) -> Vec<Hit<LocationEntry>> {
	find(haystack, LOCATIONS, |entry| entry.terms.iter().chain(entry.aliases).copied())
}

pub fn product(term: &str) -> Option<&'static ProductEntry> {
	PRODUCTS.iter().find(|entry| {
		entry.canonical.eq_ignore_ascii_case(term.trim())
			|| entry.terms.iter().chain(entry.aliases).any(|t| t.eq_ignore_ascii_case(term.trim()))
	})
}

pub fn location(term: &str) -> Option<&'static LocationEntry> {
	let trimmed = term.trim();
	let stripped = trimmed.trim_end_matches(['省', '市']);

	LOCATIONS.iter().find(|entry| {
		entry.canonical.eq_ignore_ascii_case(trimmed)
			|| entry
				.terms
				.iter()
				.chain(entry.aliases)
				.any(|t| t.eq_ignore_ascii_case(trimmed) || *t == stripped)
	})
}

/// Record-side spellings for a product term, the term itself first.
pub fn product_terms(term: &str) -> Vec<String> {
	let mut out = vec![term.trim().to_string()];

	if let Some(entry) = product(term) {
		push_unique(&mut out, entry.terms);
	}

	out
}

/// Record-side spellings for a location term, the term itself first.
pub fn location_terms(term: &str) -> Vec<String> {
	let mut out = vec![term.trim().to_string()];

	if let Some(entry) = location(term) {
		push_unique(&mut out, entry.terms);
	}

	out
}

pub fn same_location(a: &str, b: &str) -> bool {
	match (location(a), location(b)) {
		(Some(x), Some(y)) => std::ptr::eq(x, y),
		_ => a.trim().eq_ignore_ascii_case(b.trim()),
	}
}

pub fn same_product(a: &str, b: &str) -> bool {
	match (product(a), product(b)) {
		(Some(x), Some(y)) => std::ptr::eq(x, y),
		_ => a.trim().eq_ignore_ascii_case(b.trim()),
	}
}

/// Case-insensitive containment. Latin terms must sit on word boundaries and may carry a plural
/// suffix; CJK terms match as plain substrings.
pub fn mentions(haystack_lower: &str, term: &str) -> bool {
	first_mention(haystack_lower, &term.to_lowercase()).is_some()
}

fn first_mention(haystack_lower: &str, term_lower: &str) -> Option<(usize, usize)> {
	if term_lower.is_empty() {
		return None;
	}
	if cjk::contains_cjk(term_lower) {
		return haystack_lower.find(term_lower).map(|start| (start, start + term_lower.len()));
	}

	for (start, _) in haystack_lower.match_indices(term_lower) {
		let before_ok = haystack_lower[..start]
			.chars()
			.next_back()
			.is_none_or(|c| !c.is_alphanumeric() || cjk::is_cjk(c));
		let mut end = start + term_lower.len();
		let rest = &haystack_lower[end..];

		for suffix in ["es", "s"] {
			if rest.starts_with(suffix) {
				let after = rest[suffix.len()..].chars().next();

				if after.is_none_or(|c| !c.is_alphanumeric() || cjk::is_cjk(c)) {
					end += suffix.len();

					break;
				}
			}
		}

		let after_ok = haystack_lower[end..]
			.chars()
			.next()
			.is_none_or(|c| !c.is_alphanumeric() || cjk::is_cjk(c));

		if before_ok && after_ok {
			return Some((start, end));
		}
	}

	None
}

fn find<E, I>(
	haystack: &str,
	table: &'static [E],
	spellings: impl Fn(&'static E) -> I,
) -> Vec<Hit<E>>
where
	I: Iterator<Item = &'static str>,
{
	let lower = haystack.to_lowercase();
	let mut hits = Vec::new();

	for entry in table {
		let best = spellings(entry)
			.filter_map(|spelling| first_mention(&lower, &spelling.to_lowercase()))
			.min_by_key(|(start, _)| *start);

		if let Some((start, end)) = best {
			hits.push(Hit { entry, start, end });
		}
	}

	hits.sort_by_key(|hit| hit.start);

	hits
}

fn push_unique(out: &mut Vec<String>, terms: &[&str]) {
	for term in terms {
		if !out.iter().any(|existing| existing.eq_ignore_ascii_case(term)) {
			out.push((*term).to_string());
		}
	}
}
