pub fn contains_cjk(input: &str) -> bool {
	input.chars().any(is_cjk)
}

pub fn is_cjk(c: char) -> bool {
	matches!(
		c as u32,
		0x3000..=0x303F | 0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF | 0xFF00..=0xFFEF
	)
}
