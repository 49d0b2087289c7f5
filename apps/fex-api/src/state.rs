use std::sync::Arc;

use fex_service::FexService;
use fex_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<FexService>,
}
impl AppState {
	pub async fn new(config: fex_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema(config.storage.vector_dim).await?;

		let service = FexService::new(config, Arc::new(db))?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: FexService) -> Self {
		Self { service: Arc::new(service) }
	}
}
