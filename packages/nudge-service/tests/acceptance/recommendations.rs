use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use nudge_service::{CreateTaskRequest, NudgeService, RecommendRequest};

use super::{StubCompletion, StubEmbedding};

async fn seeded_task(
	service: &NudgeService,
	user_id: Uuid,
	title: &str,
	labels: &[(&str, f32)],
) -> Uuid {
	let created = service
		.create_task(
			user_id,
			CreateTaskRequest {
				title: title.to_string(),
				description: None,
				status: None,
				priority: None,
				due_date: None,
			},
		)
		.await
		.expect("Failed to create task.");
	let now = OffsetDateTime::now_utc();

	for (name, confidence) in labels {
		sqlx::query(
			"\
INSERT INTO task_labels (
	label_id, task_id, name, category, confidence, is_primary, is_user_edited,
	original_name, reasoning, metadata, created_at, updated_at
)
VALUES ($1, $2, $3, 'location', $4, TRUE, FALSE, NULL, NULL, '{}'::jsonb, $5, $5)",
		)
		.bind(Uuid::new_v4())
		.bind(created.task.task_id)
		.bind(*name)
		.bind(*confidence)
		.bind(now)
		.execute(&service.db.pool)
		.await
		.expect("Failed to seed label.");
	}

	created.task.task_id
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NUDGE_PG_DSN to run."]
async fn recommendations_return_top_k_highest_scores_in_order() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping recommendations_return_top_k_highest_scores_in_order; set NUDGE_PG_DSN.");

		return;
	};
	let collection = test_db.collection_name("nudge_acceptance");
	let cfg = super::test_config(
		test_db.dsn().to_string(),
		"http://127.0.0.1:1".to_string(),
		8,
		collection,
	);
	// Every completion call returns the extracted-context JSON: extraction
	// decodes it, the suggestion step fails to decode it and degrades to an
	// empty list, and justification/summary just echo it as text.
	let providers = super::stub_providers(
		StubCompletion { content: r#"{"location": "home", "other_labels": []}"#.to_string() },
		Arc::new(StubEmbedding { vector_dim: 8 }),
	);
	let service = super::build_service(cfg, providers).await;
	let user_id = Uuid::new_v4();
	let strong = seeded_task(&service, user_id, "Strong match", &[("home", 0.9)]).await;
	let weak = seeded_task(&service, user_id, "Weak match", &[("home", 0.1)]).await;
	let medium = seeded_task(&service, user_id, "Medium match", &[("home", 0.5)]).await;
	let _no_match = seeded_task(&service, user_id, "No match", &[("office", 0.99)]).await;
	let _unlabeled = service
		.create_task(
			user_id,
			CreateTaskRequest {
				title: "Unlabeled".to_string(),
				description: None,
				status: None,
				priority: None,
				due_date: None,
			},
		)
		.await
		.expect("Failed to create task.");
	let response = service
		.recommend(
			user_id,
			RecommendRequest { message: "I'm at home".to_string(), top_k: Some(2) },
		)
		.await
		.expect("Recommendation failed.");

	assert_eq!(response.context.location.as_deref(), Some("home"));

	let ids: Vec<Uuid> = response.recommendations.iter().map(|r| r.task_id).collect();

	assert_eq!(ids, vec![strong, medium]);
	assert!(!ids.contains(&weak));
	assert!(
		response.recommendations.windows(2).all(|w| w[0].match_score >= w[1].match_score),
		"Scores must be descending."
	);
	assert!(response.recommendations.iter().all(|r| r.match_score > 0.0));
	assert!(response.suggestions.is_empty());
	assert!(!response.message.is_empty());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NUDGE_PG_DSN to run."]
async fn zero_overlap_yields_no_recommendations_and_fallback_message() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping zero_overlap_yields_no_recommendations_and_fallback_message; set NUDGE_PG_DSN.");

		return;
	};
	let collection = test_db.collection_name("nudge_acceptance");
	let cfg = super::test_config(
		test_db.dsn().to_string(),
		"http://127.0.0.1:1".to_string(),
		8,
		collection,
	);
	let providers = super::stub_providers(
		StubCompletion { content: r#"{"location": "gym", "other_labels": []}"#.to_string() },
		Arc::new(StubEmbedding { vector_dim: 8 }),
	);
	let service = super::build_service(cfg, providers).await;
	let user_id = Uuid::new_v4();
	let _task = seeded_task(&service, user_id, "Desk work", &[("office", 1.0)]).await;
	let response = service
		.recommend(
			user_id,
			RecommendRequest { message: "Heading to the gym".to_string(), top_k: None },
		)
		.await
		.expect("Recommendation failed.");

	assert!(response.recommendations.is_empty());
	assert!(response.message.contains("couldn't find any tasks"));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
