use qdrant_client::{
	Qdrant,
	qdrant::{
		CreateCollectionBuilder, DeletePointsBuilder, Distance, PointStruct, PointsIdsList,
		UpsertPointsBuilder, VectorParamsBuilder,
	},
};
use serde_json::Value;

use crate::Result;

pub struct VectorStore {
	pub client: Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl VectorStore {
	pub fn new(cfg: &nudge_config::Qdrant) -> Result<Self> {
		let client = Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	/// One-time idempotent bootstrap: creates the collection if it is absent.
	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(&self.collection).await? {
			return Ok(());
		}

		self.client
			.create_collection(
				CreateCollectionBuilder::new(&self.collection).vectors_config(
					VectorParamsBuilder::new(u64::from(self.vector_dim), Distance::Cosine),
				),
			)
			.await?;

		Ok(())
	}

	/// Upserts one task point keyed by its stable vector id.
	pub async fn upsert_task(
		&self,
		vector_id: &str,
		vector: Vec<f32>,
		payload: Value,
	) -> Result<()> {
		let payload = qdrant_client::Payload::try_from(payload)?;
		let point = PointStruct::new(vector_id.to_string(), vector, payload);
		let upsert = UpsertPointsBuilder::new(&self.collection, vec![point]).wait(true);

		self.client.upsert_points(upsert).await?;

		Ok(())
	}

	pub async fn delete_points(&self, vector_ids: &[String]) -> Result<()> {
		if vector_ids.is_empty() {
			return Ok(());
		}

		let ids = vector_ids.iter().map(|id| id.clone().into()).collect();
		let delete = DeletePointsBuilder::new(&self.collection)
			.points(PointsIdsList { ids })
			.wait(true);

		self.client.delete_points(delete).await?;

		Ok(())
	}
}
