use std::sync::Arc;

use uuid::Uuid;

use nudge_domain::task::LabelingStatus;
use nudge_service::{CreateTaskRequest, LabelingRun};

use super::{FailingEmbedding, StubCompletion, StubEmbedding};

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set NUDGE_PG_DSN and NUDGE_QDRANT_URL to run."]
async fn labeling_persists_ranked_batch_and_syncs_vector() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping labeling_persists_ranked_batch_and_syncs_vector; set NUDGE_PG_DSN.");

		return;
	};
	let Some(qdrant_url) = super::test_qdrant_url() else {
		eprintln!(
			"Skipping labeling_persists_ranked_batch_and_syncs_vector; set NUDGE_QDRANT_URL."
		);

		return;
	};
	let collection = test_db.collection_name("nudge_acceptance");
	let cfg = super::test_config(test_db.dsn().to_string(), qdrant_url, 8, collection);
	let providers = super::stub_providers(
		StubCompletion { content: super::sample_batch_json() },
		Arc::new(StubEmbedding { vector_dim: 8 }),
	);
	let service = super::build_service(cfg, providers).await;
	let user_id = Uuid::new_v4();
	let created = service
		.create_task(
			user_id,
			CreateTaskRequest {
				title: "Water the plants".to_string(),
				description: Some("All of them.".to_string()),
				status: None,
				priority: None,
				due_date: None,
			},
		)
		.await
		.expect("Failed to create task.");
	let task_id = created.task.task_id;
	let run = service.run_labeling(user_id, task_id, None).await;

	let LabelingRun::Completed { labels, embedding } = run else {
		panic!("Expected completed labeling run, got {run:?}.");
	};

	assert_eq!(labels, 7);
	assert!(matches!(embedding, nudge_service::EmbeddingOutcome::Synced { .. }));

	let stored = super::stored_labels(&service, task_id).await;
	let names: Vec<&str> = stored.iter().map(|label| label.name.as_str()).collect();

	assert_eq!(
		names,
		vec!["home", "evening", "low-energy", "quick-5min", "solo", "indoors", "household"]
	);
	assert_eq!(stored.iter().filter(|label| label.is_primary).count(), 5);
	assert!(stored[..5].iter().all(|label| label.is_primary));
	assert!(stored[5..].iter().all(|label| !label.is_primary));

	let report = service.labeling_status(user_id, task_id).await.expect("Status load failed.");

	assert_eq!(report.labeling_status, LabelingStatus::Completed);
	assert_eq!(report.labels_count, 7);
	assert_eq!(report.primary_labels.len(), 5);
	assert!(report.labeling_error.is_none());

	let task = service.get_task(user_id, task_id).await.expect("Task load failed.");

	assert!(task.vector_id.is_some());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NUDGE_PG_DSN to run."]
async fn relabeling_with_identical_output_is_idempotent() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping relabeling_with_identical_output_is_idempotent; set NUDGE_PG_DSN.");

		return;
	};
	let collection = test_db.collection_name("nudge_acceptance");
	let cfg = super::test_config(
		test_db.dsn().to_string(),
		"http://127.0.0.1:1".to_string(),
		8,
		collection,
	);
	// The failing embedding keeps the run off the vector store; labeling
	// still completes and the persisted set is what idempotency is about.
	let providers = super::stub_providers(
		StubCompletion { content: super::sample_batch_json() },
		Arc::new(FailingEmbedding),
	);
	let service = super::build_service(cfg, providers).await;
	let user_id = Uuid::new_v4();
	let created = service
		.create_task(
			user_id,
			CreateTaskRequest {
				title: "Water the plants".to_string(),
				description: None,
				status: None,
				priority: None,
				due_date: None,
			},
		)
		.await
		.expect("Failed to create task.");
	let task_id = created.task.task_id;

	assert!(matches!(
		service.run_labeling(user_id, task_id, None).await,
		LabelingRun::Completed { .. }
	));

	let first = super::stored_labels(&service, task_id).await;

	assert!(matches!(
		service.run_labeling(user_id, task_id, None).await,
		LabelingRun::Completed { .. }
	));

	let second = super::stored_labels(&service, task_id).await;

	assert_eq!(first.len(), second.len());

	for (a, b) in first.iter().zip(second.iter()) {
		assert_eq!(a.name, b.name);
		assert_eq!(a.confidence, b.confidence);
		assert_eq!(a.is_primary, b.is_primary);
	}

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NUDGE_PG_DSN to run."]
async fn validation_failure_marks_failed_and_keeps_prior_labels() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping validation_failure_marks_failed_and_keeps_prior_labels; set NUDGE_PG_DSN.");

		return;
	};
	let collection = test_db.collection_name("nudge_acceptance");
	let cfg = super::test_config(
		test_db.dsn().to_string(),
		"http://127.0.0.1:1".to_string(),
		8,
		collection.clone(),
	);
	let providers = super::stub_providers(
		StubCompletion { content: super::sample_batch_json() },
		Arc::new(FailingEmbedding),
	);
	let service = super::build_service(cfg, providers).await;
	let user_id = Uuid::new_v4();
	let created = service
		.create_task(
			user_id,
			CreateTaskRequest {
				title: "Water the plants".to_string(),
				description: None,
				status: None,
				priority: None,
				due_date: None,
			},
		)
		.await
		.expect("Failed to create task.");
	let task_id = created.task.task_id;

	assert!(matches!(
		service.run_labeling(user_id, task_id, None).await,
		LabelingRun::Completed { .. }
	));

	// Re-label through a collaborator that now returns an undersized batch.
	let failing_cfg = super::test_config(
		test_db.dsn().to_string(),
		"http://127.0.0.1:1".to_string(),
		8,
		collection,
	);
	let failing_service = super::build_service(
		failing_cfg,
		super::stub_providers(
			StubCompletion { content: super::undersized_batch_json() },
			Arc::new(FailingEmbedding),
		),
	)
	.await;
	let run = failing_service.run_labeling(user_id, task_id, None).await;

	let LabelingRun::Failed { error } = run else {
		panic!("Expected failed labeling run, got {run:?}.");
	};

	assert!(error.contains("labels"), "Unexpected failure message: {error}");

	let report =
		failing_service.labeling_status(user_id, task_id).await.expect("Status load failed.");

	assert_eq!(report.labeling_status, LabelingStatus::Failed);
	// The failed run never reached the replace step; the prior batch stays.
	assert_eq!(report.labels_count, 7);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
