use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use fex_domain::Company;

/// Column list shared by every query that materializes a [`CompanyRow`].
pub const COMPANY_COLUMNS: &str = "\
id, name_en, name_cn, registration_code, province, address, insured_employees, enterprise_scale, \
registered_capital, paid_capital, establishment_year, main_products, keywords, category, industry, \
business_scope, profile, credit_score, credit_rating, phones, emails, official_website, fair_website";

#[derive(Debug, sqlx::FromRow)]
pub struct CompanyRow {
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
impl From<CompanyRow> for Company {
	fn from(row: CompanyRow) -> Self {
		Self {
			id: row.id,
			name_en: row.name_en,
			name_cn: row.name_cn,
			registration_code: row.registration_code,
			province: row.province,
			address: row.address,
			insured_employees: row.insured_employees,
			enterprise_scale: row.enterprise_scale,
			registered_capital: row.registered_capital,
			paid_capital: row.paid_capital,
			establishment_year: row.establishment_year,
			main_products: row.main_products,
			keywords: row.keywords,
			category: row.category,
			industry: row.industry,
			business_scope: row.business_scope,
			profile: row.profile,
			credit_score: row.credit_score,
			credit_rating: row.credit_rating,
			phones: row.phones,
			emails: row.emails,
			official_website: row.official_website,
			fair_website: row.fair_website,
		}
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct SimilarCompanyRow {
	#[sqlx(flatten)]
	pub company: CompanyRow,
	pub similarity: f32,
}

/// A company as seen by the embedding backfill.
#[derive(Debug, sqlx::FromRow)]
pub struct EmbeddingCandidate {
	#[sqlx(flatten)]
	pub company: CompanyRow,
	pub has_embedding: bool,
	pub embedding_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingUpdate {
	pub id: Uuid,
	pub embedding: Vec<f32>,
	pub embedding_hash: String,
	pub embedded_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompanyStats {
	pub total_companies: i64,
	pub with_embeddings: i64,
	pub by_province: Vec<(String, i64)>,
	pub by_industry: Vec<(String, i64)>,
}
