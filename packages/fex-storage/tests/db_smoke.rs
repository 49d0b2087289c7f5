use time::OffsetDateTime;
use uuid::Uuid;

use fex_config::Postgres;
use fex_domain::{Company, NumericRange, SearchCriteria, filter};
use fex_storage::{db::Db, models::EmbeddingUpdate, queries};
use fex_testkit::TestDatabase;

const VECTOR_DIM: u32 = 3;

fn company(name: &str, province: &str, employees: i64, capital: &str) -> Company {
	Company {
		id: Uuid::new_v4(),
		name_en: Some(name.to_string()),
		province: Some(province.to_string()),
		main_products: Some("LED bulbs".to_string()),
		industry: Some("Lighting".to_string()),
		insured_employees: Some(employees),
		registered_capital: Some(capital.to_string()),
		establishment_year: Some(2005),
		..Default::default()
	}
}

async fn bootstrap(test_db: &TestDatabase) -> Db {
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema(VECTOR_DIM).await.expect("Failed to ensure schema.");

	db
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set FEX_PG_DSN to run."]
async fn schema_bootstrap_is_idempotent() {
	let Some(base_dsn) = fex_testkit::env_dsn() else {
		eprintln!("Skipping schema_bootstrap_is_idempotent; set FEX_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;

	db.ensure_schema(VECTOR_DIM).await.expect("Second bootstrap failed.");

	let capital: Option<f64> = sqlx::query_scalar("SELECT fex_capital_cny('1.5亿元人民币')")
		.fetch_one(&db.pool)
		.await
		.expect("Failed to call fex_capital_cny.");

	assert_eq!(capital, Some(150_000_000.0));

	test_db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set FEX_PG_DSN to run."]
async fn exact_filter_matches_in_memory_semantics() {
	let Some(base_dsn) = fex_testkit::env_dsn() else {
		eprintln!("Skipping exact_filter_matches_in_memory_semantics; set FEX_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;
	let rows = vec![
		company("Shenzhen Glow", "广东省", 300, "5000万元"),
		company("Foshan Beam", "Guangdong", 40, "800万元"),
		company("Xiamen Lumen", "Fujian", 250, "1.2亿元"),
	];

	for row in &rows {
		queries::upsert_company(&db, row).await.expect("Failed to insert company.");
	}

	let criteria = SearchCriteria {
		products: vec!["LED".to_string()],
		employees: Some(NumericRange::at_least(101)),
		capital: Some(NumericRange::at_least(10_000_000.0)),
		provinces_excluded: vec!["Fujian".to_string()],
		..Default::default()
	};
	let filter = filter::exact(&criteria, 2025);
	let found = queries::find_companies(&db, &filter, None, 10).await.expect("Query failed.");
	let expected: Vec<_> = rows.iter().filter(|row| filter.matches(row)).collect();

	assert_eq!(found.len(), 1);
	assert_eq!(expected.len(), 1);
	assert_eq!(found[0].id, expected[0].id);

	test_db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set FEX_PG_DSN to run."]
async fn similarity_search_uses_stored_embeddings() {
	let Some(base_dsn) = fex_testkit::env_dsn() else {
		eprintln!("Skipping similarity_search_uses_stored_embeddings; set FEX_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;
	let near = company("Near", "Fujian", 10, "100万元");
	let far = company("Far", "Fujian", 10, "100万元");

	for (row, embedding) in [(&near, vec![1.0, 0.0, 0.0]), (&far, vec![0.0, 1.0, 0.0])] {
		queries::upsert_company(&db, row).await.expect("Failed to insert company.");
		queries::update_embedding(
			&db,
			&EmbeddingUpdate {
				id: row.id,
				embedding,
				embedding_hash: "h".to_string(),
				embedded_at: OffsetDateTime::now_utc(),
			},
		)
		.await
		.expect("Failed to store embedding.");
	}

	let hits = queries::find_similar(&db, &[1.0, 0.0, 0.0], 0.7, &Default::default(), 10)
		.await
		.expect("Similarity query failed.");

	assert_eq!(hits.len(), 1);
	assert_eq!(hits[0].0.id, near.id);

	let stats = queries::company_stats(&db, 20).await.expect("Stats query failed.");

	assert_eq!(stats.total_companies, 2);
	assert_eq!(stats.with_embeddings, 2);

	test_db.cleanup().await.expect("Failed to clean up test database.");
}
