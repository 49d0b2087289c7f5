use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capital;

/// One exhibitor record as stored by the company table.
///
/// Age is intentionally absent. Use [`Company::age`] with the request's current year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Company {
	pub id: Uuid,
	pub name_en: Option<String>,
	pub name_cn: Option<String>,
	pub registration_code: Option<String>,
	pub province: Option<String>,
	pub address: Option<String>,
	pub insured_employees: Option<i64>,
	pub enterprise_scale: Option<String>,
	pub registered_capital: Option<String>,
	pub paid_capital: Option<String>,
	pub establishment_year: Option<i32>,
	pub main_products: Option<String>,
	pub keywords: Option<String>,
	pub category: Option<String>,
	pub industry: Option<String>,
	pub business_scope: Option<String>,
	pub profile: Option<String>,
	pub credit_score: Option<f64>,
	pub credit_rating: Option<String>,
	pub phones: Option<String>,
	pub emails: Option<String>,
	pub official_website: Option<String>,
	pub fair_website: Option<String>,
}
impl Company {
	/// Years since establishment. Future establishment years clamp to zero.
	pub fn age(&self, current_year: i32) -> Option<i32> {
		self.establishment_year.map(|year| (current_year - year).max(0))
	}

	pub fn registered_capital_cny(&self) -> Option<f64> {
		self.registered_capital.as_deref().and_then(capital::parse_amount)
	}

	pub fn text(&self, field: TextField) -> Option<&str> {
		let value = match field {
			TextField::NameEn => &self.name_en,
			TextField::NameCn => &self.name_cn,
			TextField::RegistrationCode => &self.registration_code,
			TextField::Province => &self.province,
			TextField::Address => &self.address,
			TextField::MainProducts => &self.main_products,
			TextField::Keywords => &self.keywords,
			TextField::Category => &self.category,
			TextField::Industry => &self.industry,
			TextField::BusinessScope => &self.business_scope,
			TextField::Profile => &self.profile,
			TextField::CreditRating => &self.credit_rating,
			TextField::OfficialWebsite => &self.official_website,
			TextField::FairWebsite => &self.fair_website,
		};

		value.as_deref()
	}

	pub fn number(&self, field: NumberField) -> Option<f64> {
		match field {
			NumberField::InsuredEmployees => self.insured_employees.map(|v| v as f64),
			NumberField::EstablishmentYear => self.establishment_year.map(f64::from),
			NumberField::RegisteredCapital => self.registered_capital_cny(),
			NumberField::CreditScore => self.credit_score,
		}
	}

	pub fn display_name(&self) -> &str {
		self.name_en.as_deref().or(self.name_cn.as_deref()).unwrap_or("Unnamed company")
	}

	/// Concatenated lowercase text used by approximate matching.
	pub fn searchable_text(&self) -> String {
		[
			TextField::NameEn,
			TextField::NameCn,
			TextField::MainProducts,
			TextField::Keywords,
			TextField::Category,
			TextField::Industry,
			TextField::Province,
			TextField::Address,
			TextField::BusinessScope,
			TextField::Profile,
		]
		.into_iter()
		.filter_map(|field| self.text(field))
		.collect::<Vec<_>>()
		.join(" ")
		.to_lowercase()
	}

	/// Text submitted to the embedding capability for this company.
	pub fn embedding_text(&self) -> String {
		[
			TextField::NameEn,
			TextField::NameCn,
			TextField::MainProducts,
			TextField::Keywords,
			TextField::Province,
			TextField::Category,
			TextField::Industry,
		]
		.into_iter()
		.filter_map(|field| self.text(field))
		.map(str::trim)
		.filter(|value| !value.is_empty())
		.collect::<Vec<_>>()
		.join(" ")
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
	NameEn,
	NameCn,
	RegistrationCode,
	Province,
	Address,
	MainProducts,
	Keywords,
	Category,
	Industry,
	BusinessScope,
	Profile,
	CreditRating,
	OfficialWebsite,
	FairWebsite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberField {
	InsuredEmployees,
	EstablishmentYear,
	RegisteredCapital,
	CreditScore,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn age_is_derived_from_the_supplied_year() {
		let company = Company { establishment_year: Some(2010), ..Default::default() };

		assert_eq!(company.age(2025), Some(15));
		assert_eq!(company.age(2031), Some(21));
		assert_eq!(company.age(2005), Some(0));
		assert_eq!(Company::default().age(2025), None);
	}

	#[test]
	fn embedding_text_skips_blank_fields() {
		let company = Company {
			name_en: Some("Foshan LED Systems Co., Ltd.".to_string()),
			main_products: Some("  ".to_string()),
			province: Some("Guangdong".to_string()),
			..Default::default()
		};

		assert_eq!(company.embedding_text(), "Foshan LED Systems Co., Ltd. Guangdong");
	}
}
