use fex_domain::{
	Company, NumericRange, SearchCriteria, filter,
	heuristic::{self, HeuristicOptions},
	scoring,
};

fn options() -> HeuristicOptions {
	HeuristicOptions { current_year: 2025, usd_to_cny_rate: 7.2, max_limit: 50 }
}

fn fixture() -> Vec<Company> {
	let rows = [
		("Shenzhen Bright LED Co., Ltd.", "Guangdong", "LED bulbs", Some(80), Some(2018)),
		("Foshan Lighting Works", "广东省", "LED panels, lamps", Some(150), Some(2001)),
		("Ningbo Textile Group", "Zhejiang", "cotton textiles", Some(420), Some(1996)),
		("Qingdao Drip Irrigation", "Shandong", "drip irrigation tape", Some(200), Some(2012)),
		("Xiamen Youngmart Trading Co., Ltd.", "Fujian", "ceramic tiles", None, None),
	];

	rows.into_iter()
		.map(|(name, province, products, employees, year)| Company {
			id: uuid::Uuid::new_v4(),
			name_en: Some(name.to_string()),
			province: Some(province.to_string()),
			main_products: Some(products.to_string()),
			insured_employees: employees,
			establishment_year: year,
			..Default::default()
		})
		.collect()
}

#[test]
fn between_range_keeps_only_companies_inside_bounds() {
	let criteria =
		SearchCriteria { employees: Some(NumericRange::between(50, 200)), ..Default::default() };
	let filter = filter::exact(&criteria, 2025);
	let hits: Vec<_> = fixture().into_iter().filter(|company| filter.matches(company)).collect();

	assert_eq!(hits.len(), 3);
	assert!(hits.iter().all(|company| {
		company.insured_employees.is_some_and(|count| (50..=200).contains(&count))
	}));
}

#[test]
fn heuristic_exclusion_removes_every_spelling_of_the_province() {
	let criteria = heuristic::extract("LED manufacturers not in Guangdong", &options());
	let filter = filter::exact(&criteria, 2025);
	let hits: Vec<_> = fixture().into_iter().filter(|company| filter.matches(company)).collect();

	assert!(hits.is_empty(), "Both Guangdong LED makers must be excluded: {hits:?}");

	let broad = filter::broad(&criteria, "LED manufacturers not in Guangdong", 2025);

	assert!(fixture().iter().filter(|company| broad.matches(company)).all(|company| {
		!company.province.as_deref().is_some_and(|p| p.contains("Guangdong") || p.contains("广东"))
	}));
}

#[test]
fn heuristic_range_query_filters_and_scores() {
	let criteria = heuristic::extract("LED companies in Guangdong with more than 100 employees", &options());
	let filter = filter::exact(&criteria, 2025);
	let hits: Vec<_> = fixture().into_iter().filter(|company| filter.matches(company)).collect();

	assert_eq!(hits.len(), 1);
	assert_eq!(hits[0].display_name(), "Foshan Lighting Works");

	let relevance = scoring::score(&hits[0], &criteria, 2025);

	assert!(relevance.matched_fields.contains(&"main_products".to_string()));
	assert!(relevance.matched_fields.contains(&"province".to_string()));
}

#[test]
fn scores_stay_within_bounds_for_every_fixture_row() {
	let criteria = SearchCriteria {
		products: vec!["LED".to_string(), "textiles".to_string(), "irrigation".to_string()],
		location: Some("Guangdong".to_string()),
		brands: vec!["Bright".to_string()],
		..Default::default()
	};

	for company in fixture() {
		let relevance = scoring::score(&company, &criteria, 2025);
		let fuzzy = scoring::fuzzy_score(&company, &criteria, "led textiles irrigation");

		assert!(relevance.score <= scoring::MAX_SCORE);
		assert!(fuzzy.score <= scoring::MAX_FUZZY_SCORE);
	}
}

#[test]
fn age_contribution_depends_on_the_current_year() {
	let company = Company { establishment_year: Some(2014), ..Default::default() };
	let criteria = SearchCriteria::default();

	assert_eq!(scoring::score(&company, &criteria, 2024).score, 0);
	assert_eq!(scoring::score(&company, &criteria, 2025).score, 5);
	assert_eq!(scoring::score(&company, &criteria, 2035).score, 15);
}
