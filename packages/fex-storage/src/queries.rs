//! Company queries. Predicates are rendered from [`CompanyFilter`] so SQL and the in-memory store
//! agree on semantics: `ILIKE` for containment, `COALESCE(col, '')` for negation, and plain
//! comparisons for ranges (NULL never satisfies a range).

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
	Result,
	db::Db,
	models::{
		COMPANY_COLUMNS, CompanyRow, CompanyStats, EmbeddingCandidate, EmbeddingUpdate,
		SimilarCompanyRow,
	},
};
use fex_domain::{
	Company, SortField, SortSpec,
	company::{NumberField, TextField},
	filter::{CompanyFilter, Predicate, SortPlan},
};

pub async fn find_companies(
	db: &Db,
	filter: &CompanyFilter,
	sort: Option<&SortSpec>,
	limit: u32,
) -> Result<Vec<Company>> {
	let mut builder = QueryBuilder::<Postgres>::new(format!(
		"SELECT {COMPANY_COLUMNS} FROM companies WHERE TRUE"
	));

	push_filter(&mut builder, filter);
	builder.push(order_by(SortPlan::resolve(sort)));
	builder.push(" LIMIT ");
	builder.push_bind(i64::from(limit));

	let rows: Vec<CompanyRow> = builder.build_query_as().fetch_all(&db.pool).await?;

	Ok(rows.into_iter().map(Company::from).collect())
}

/// Nearest neighbours by cosine similarity, restricted to similarity strictly above
/// `min_similarity`.
pub async fn find_similar(
	db: &Db,
	embedding: &[f32],
	min_similarity: f32,
	filter: &CompanyFilter,
	limit: u32,
) -> Result<Vec<(Company, f32)>> {
	let vec_text = vector_to_pg(embedding);
	let mut builder = QueryBuilder::<Postgres>::new(format!(
		"SELECT {COMPANY_COLUMNS}, (1 - (embedding <=> "
	));

	builder.push_bind(vec_text.clone());
	builder.push("::text::vector))::real AS similarity FROM companies WHERE embedding IS NOT NULL");
	push_filter(&mut builder, filter);
	builder.push(" AND (1 - (embedding <=> ");
	builder.push_bind(vec_text.clone());
	builder.push("::text::vector)) > ");
	builder.push_bind(f64::from(min_similarity));
	builder.push(" ORDER BY embedding <=> ");
	builder.push_bind(vec_text);
	builder.push("::text::vector, id LIMIT ");
	builder.push_bind(i64::from(limit));

	let rows: Vec<SimilarCompanyRow> = builder.build_query_as().fetch_all(&db.pool).await?;

	Ok(rows.into_iter().map(|row| (Company::from(row.company), row.similarity)).collect())
}

pub async fn company_stats(db: &Db, top: i64) -> Result<CompanyStats> {
	let (total_companies, with_embeddings): (i64, i64) = sqlx::query_as(
		"\
SELECT
	count(*),
	count(*) FILTER (WHERE embedding IS NOT NULL)
FROM companies",
	)
	.fetch_one(&db.pool)
	.await?;
	let by_province: Vec<(String, i64)> = sqlx::query_as(
		"\
SELECT province, count(*) AS total
FROM companies
WHERE province IS NOT NULL AND btrim(province) <> ''
GROUP BY province
ORDER BY total DESC, province
LIMIT $1",
	)
	.bind(top)
	.fetch_all(&db.pool)
	.await?;
	let by_industry: Vec<(String, i64)> = sqlx::query_as(
		"\
SELECT industry, count(*) AS total
FROM companies
WHERE industry IS NOT NULL AND btrim(industry) <> ''
GROUP BY industry
ORDER BY total DESC, industry
LIMIT $1",
	)
	.bind(top)
	.fetch_all(&db.pool)
	.await?;

	Ok(CompanyStats { total_companies, with_embeddings, by_province, by_industry })
}

/// Keyset page over every company, for the embedding backfill.
pub async fn list_embedding_candidates(
	db: &Db,
	after: Option<Uuid>,
	limit: u32,
) -> Result<Vec<EmbeddingCandidate>> {
	let sql = format!(
		"\
SELECT {COMPANY_COLUMNS}, embedding IS NOT NULL AS has_embedding, embedding_hash
FROM companies
WHERE $1::uuid IS NULL OR id > $1
ORDER BY id
LIMIT $2"
	);
	let rows = sqlx::query_as::<_, EmbeddingCandidate>(&sql)
		.bind(after)
		.bind(i64::from(limit))
		.fetch_all(&db.pool)
		.await?;

	Ok(rows)
}

pub async fn update_embedding(db: &Db, update: &EmbeddingUpdate) -> Result<()> {
	let vec_text = vector_to_pg(&update.embedding);

	sqlx::query(
		"\
UPDATE companies
SET
	embedding = $1::text::vector,
	embedding_hash = $2,
	embedded_at = $3,
	updated_at = now()
WHERE id = $4",
	)
	.bind(vec_text.as_str())
	.bind(update.embedding_hash.as_str())
	.bind(update.embedded_at)
	.bind(update.id)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn upsert_company(db: &Db, company: &Company) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO companies (
	id,
	name_en,
	name_cn,
	registration_code,
	province,
	address,
	insured_employees,
	enterprise_scale,
	registered_capital,
	paid_capital,
	establishment_year,
	main_products,
	keywords,
	category,
	industry,
	business_scope,
	profile,
	credit_score,
	credit_rating,
	phones,
	emails,
	official_website,
	fair_website
)
VALUES (
	$1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
	$13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23
)
ON CONFLICT (id) DO UPDATE
SET
	name_en = EXCLUDED.name_en,
	name_cn = EXCLUDED.name_cn,
	registration_code = EXCLUDED.registration_code,
	province = EXCLUDED.province,
	address = EXCLUDED.address,
	insured_employees = EXCLUDED.insured_employees,
	enterprise_scale = EXCLUDED.enterprise_scale,
	registered_capital = EXCLUDED.registered_capital,
	paid_capital = EXCLUDED.paid_capital,
	establishment_year = EXCLUDED.establishment_year,
	main_products = EXCLUDED.main_products,
	keywords = EXCLUDED.keywords,
	category = EXCLUDED.category,
	industry = EXCLUDED.industry,
	business_scope = EXCLUDED.business_scope,
	profile = EXCLUDED.profile,
	credit_score = EXCLUDED.credit_score,
	credit_rating = EXCLUDED.credit_rating,
	phones = EXCLUDED.phones,
	emails = EXCLUDED.emails,
	official_website = EXCLUDED.official_website,
	fair_website = EXCLUDED.fair_website,
	updated_at = now()",
	)
	.bind(company.id)
	.bind(company.name_en.as_deref())
	.bind(company.name_cn.as_deref())
	.bind(company.registration_code.as_deref())
	.bind(company.province.as_deref())
	.bind(company.address.as_deref())
	.bind(company.insured_employees)
	.bind(company.enterprise_scale.as_deref())
	.bind(company.registered_capital.as_deref())
	.bind(company.paid_capital.as_deref())
	.bind(company.establishment_year)
	.bind(company.main_products.as_deref())
	.bind(company.keywords.as_deref())
	.bind(company.category.as_deref())
	.bind(company.industry.as_deref())
	.bind(company.business_scope.as_deref())
	.bind(company.profile.as_deref())
	.bind(company.credit_score)
	.bind(company.credit_rating.as_deref())
	.bind(company.phones.as_deref())
	.bind(company.emails.as_deref())
	.bind(company.official_website.as_deref())
	.bind(company.fair_website.as_deref())
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Appends ` AND (...)` for every clause of `filter`.
pub fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &CompanyFilter) {
	for clause in &filter.clauses {
		if clause.any_of.is_empty() {
			continue;
		}

		builder.push(" AND (");

		for (i, predicate) in clause.any_of.iter().enumerate() {
			if i > 0 {
				builder.push(" OR ");
			}

			push_predicate(builder, predicate);
		}

		builder.push(")");
	}
}

fn push_predicate(builder: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
	match predicate {
		Predicate::Contains { field, term } => {
			builder.push(text_column(*field));
			builder.push(" ILIKE ");
			builder.push_bind(like_pattern(term));
			builder.push(" ESCAPE '\\'");
		},
		Predicate::NotContains { field, term } => {
			builder.push("COALESCE(");
			builder.push(text_column(*field));
			builder.push(", '') NOT ILIKE ");
			builder.push_bind(like_pattern(term));
			builder.push(" ESCAPE '\\'");
		},
		Predicate::Range { field, min, max } => {
			let expr = number_expr(*field);

			builder.push("(");
			builder.push(expr);
			builder.push(" IS NOT NULL");

			if let Some(min) = min {
				builder.push(" AND ");
				builder.push(expr);
				builder.push(" >= ");
				builder.push_bind(*min);
			}
			if let Some(max) = max {
				builder.push(" AND ");
				builder.push(expr);
				builder.push(" <= ");
				builder.push_bind(*max);
			}

			builder.push(")");
		},
	}
}

fn order_by(plan: SortPlan) -> String {
	let expr = match plan.field {
		SortField::Employees => "insured_employees",
		SortField::Age => "establishment_year",
		SortField::Capital => "fex_capital_cny(registered_capital)",
		SortField::Name => "lower(name_en)",
		SortField::Credit => "credit_score",
	};
	let direction = if plan.ascending { "ASC" } else { "DESC" };

	format!(" ORDER BY {expr} {direction} NULLS LAST, id")
}

fn text_column(field: TextField) -> &'static str {
	match field {
		TextField::NameEn => "name_en",
		TextField::NameCn => "name_cn",
		TextField::RegistrationCode => "registration_code",
		TextField::Province => "province",
		TextField::Address => "address",
		TextField::MainProducts => "main_products",
		TextField::Keywords => "keywords",
		TextField::Category => "category",
		TextField::Industry => "industry",
		TextField::BusinessScope => "business_scope",
		TextField::Profile => "profile",
		TextField::CreditRating => "credit_rating",
		TextField::OfficialWebsite => "official_website",
		TextField::FairWebsite => "fair_website",
	}
}

fn number_expr(field: NumberField) -> &'static str {
	match field {
		NumberField::InsuredEmployees => "insured_employees::double precision",
		NumberField::EstablishmentYear => "establishment_year::double precision",
		NumberField::RegisteredCapital => "fex_capital_cny(registered_capital)",
		NumberField::CreditScore => "credit_score",
	}
}

fn like_pattern(term: &str) -> String {
	let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");

	format!("%{escaped}%")
}

pub fn vector_to_pg(vec: &[f32]) -> String {
	let mut out = String::with_capacity(vec.len() * 8);

	out.push('[');

	for (i, value) in vec.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use fex_domain::filter::Clause;

	#[test]
	fn renders_clauses_as_and_of_ors() {
		let filter = CompanyFilter {
			clauses: vec![
				Clause {
					any_of: vec![
						Predicate::Contains { field: TextField::MainProducts, term: "LED".to_string() },
						Predicate::Contains { field: TextField::NameEn, term: "LED".to_string() },
					],
				},
				Clause {
					any_of: vec![Predicate::NotContains {
						field: TextField::Province,
						term: "Guangdong".to_string(),
					}],
				},
				Clause {
					any_of: vec![Predicate::Range {
						field: NumberField::InsuredEmployees,
						min: Some(101.0),
						max: None,
					}],
				},
			],
		};
		let mut builder = QueryBuilder::<Postgres>::new("SELECT id FROM companies WHERE TRUE");

		push_filter(&mut builder, &filter);

		assert_eq!(
			builder.sql(),
			"SELECT id FROM companies WHERE TRUE \
AND (main_products ILIKE $1 ESCAPE '\\' OR name_en ILIKE $2 ESCAPE '\\') \
AND (COALESCE(province, '') NOT ILIKE $3 ESCAPE '\\') \
AND (insured_employees::double precision IS NOT NULL AND insured_employees::double precision >= $4)"
		);
	}

	#[test]
	fn like_metacharacters_are_escaped() {
		assert_eq!(like_pattern("100%_a\\b"), "%100\\%\\_a\\\\b%");
	}

	#[test]
	fn age_sort_orders_by_establishment_year() {
		let plan = SortPlan { field: SortField::Age, ascending: true };

		assert_eq!(order_by(plan), " ORDER BY establishment_year ASC NULLS LAST, id");
	}

	#[test]
	fn vectors_render_as_pgvector_literals() {
		assert_eq!(vector_to_pg(&[0.5, -1.0, 2.25]), "[0.5,-1,2.25]");
	}
}
