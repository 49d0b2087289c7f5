//! Capital strings such as `8000万元`, `1.2亿元人民币`, or `5,000,000`.

use std::sync::OnceLock;

use regex::Regex;

pub const WAN: f64 = 10_000.0;
pub const YI: f64 = 100_000_000.0;

/// Parses a capital string into its nominal amount in base currency units.
///
/// Currency words are ignored. `万` scales by 10^4, `亿` by 10^8, `million` by 10^6.
pub fn parse_amount(text: &str) -> Option<f64> {
	let cleaned = text.replace([',', '，', ' '], "");
	let captures = number_re()?.captures(&cleaned)?;
	let number: f64 = captures.get(1)?.as_str().parse().ok()?;
	let rest = &cleaned[captures.get(0)?.end()..];
	let lowered = rest.to_lowercase();
	let multiplier = if rest.starts_with('亿') {
		YI
	} else if rest.starts_with('万') {
		WAN
	} else if lowered.starts_with("million") {
		1_000_000.0
	} else {
		1.0
	};
	let amount = number * multiplier;

	amount.is_finite().then_some(amount)
}

fn number_re() -> Option<&'static Regex> {
	static RE: OnceLock<Option<Regex>> = OnceLock::new();

	RE.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)").ok()).as_ref()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalizes_chinese_units() {
		assert_eq!(parse_amount("8000万元"), Some(80_000_000.0));
		assert_eq!(parse_amount("1.5亿元人民币"), Some(150_000_000.0));
		assert_eq!(parse_amount("5,000,000"), Some(5_000_000.0));
		assert_eq!(parse_amount("3 million USD"), Some(3_000_000.0));
	}

	#[test]
	fn rejects_text_without_numbers() {
		assert_eq!(parse_amount("未公开"), None);
		assert_eq!(parse_amount(""), None);
	}
}
