const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS tasks (
	task_id UUID PRIMARY KEY,
	user_id UUID NOT NULL,
	title TEXT NOT NULL,
	description TEXT,
	status TEXT NOT NULL DEFAULT 'todo'
		CHECK (status IN ('todo', 'in_progress', 'completed', 'cancelled')),
	priority TEXT NOT NULL DEFAULT 'medium'
		CHECK (priority IN ('low', 'medium', 'high', 'urgent')),
	is_active BOOLEAN NOT NULL DEFAULT TRUE,
	created_at TIMESTAMPTZ NOT NULL,
	updated_at TIMESTAMPTZ NOT NULL,
	due_date TIMESTAMPTZ,
	completed_at TIMESTAMPTZ,
	labeling_status TEXT NOT NULL DEFAULT 'pending'
		CHECK (labeling_status IN ('pending', 'in_progress', 'completed', 'failed')),
	labeling_attempted_at TIMESTAMPTZ,
	labeling_completed_at TIMESTAMPTZ,
	labeling_error TEXT,
	vector_id TEXT UNIQUE,
	embedding_model TEXT,
	embedding_version TEXT
);
CREATE INDEX IF NOT EXISTS idx_tasks_user ON tasks (user_id);
CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks (status);
CREATE INDEX IF NOT EXISTS idx_tasks_labeling_status ON tasks (labeling_status);
CREATE TABLE IF NOT EXISTS task_labels (
	label_id UUID PRIMARY KEY,
	task_id UUID NOT NULL REFERENCES tasks (task_id) ON DELETE CASCADE,
	name TEXT NOT NULL,
	category TEXT NOT NULL
		CHECK (category IN (
			'location', 'time', 'energy', 'duration', 'mood', 'category',
			'prerequisites', 'context', 'tools', 'people', 'weather', 'other'
		)),
	confidence REAL NOT NULL CHECK (confidence >= 0 AND confidence <= 1),
	is_primary BOOLEAN NOT NULL DEFAULT FALSE,
	is_user_edited BOOLEAN NOT NULL DEFAULT FALSE,
	original_name TEXT,
	reasoning TEXT,
	metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
	created_at TIMESTAMPTZ NOT NULL,
	updated_at TIMESTAMPTZ NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_task_labels_task ON task_labels (task_id);
CREATE INDEX IF NOT EXISTS idx_task_labels_name ON task_labels (name)";

pub fn render_schema() -> &'static str {
	SCHEMA
}
