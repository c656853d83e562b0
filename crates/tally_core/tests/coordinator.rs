use tally_core::{
    open_db_in_memory, CoreConfig, DataServices, ManualClock, RepoError, ValidationError,
    WorkContext,
};

fn services() -> DataServices {
    let clock = ManualClock::starting_at(1_700_000_000_000);
    DataServices::new(WorkContext::try_with_clock(open_db_in_memory().unwrap(), clock).unwrap())
}

#[test]
fn project_with_task_commits_a_consistent_chain() {
    let services = services();
    let client = services.clients().create_client("Acme", false).unwrap();

    let (project, task) = services
        .create_project_with_task(&client, "Website", "Layout")
        .unwrap();

    assert!(!services.has_changes());
    assert_eq!(project.client_id, client.id);
    assert_eq!(task.client_id, client.id);
    assert_eq!(task.project_id, Some(project.id));

    let stored_task = services.tasks().require_task(task.id).unwrap();
    let stored_project = services
        .projects()
        .require_project(stored_task.project_id.unwrap())
        .unwrap();
    assert_eq!(stored_project.client_id, stored_task.client_id);
}

#[test]
fn blank_task_name_persists_neither() {
    let services = services();
    let client = services.clients().create_client("Acme", false).unwrap();

    let err = services
        .create_project_with_task(&client, "Website", "  ")
        .unwrap_err();

    assert_eq!(err.as_validation(), Some(ValidationError::EmptyName));
    assert!(!services.has_changes());
    assert!(!services.projects().has_projects());
    assert!(!services.tasks().has_tasks());
}

#[test]
fn store_failure_on_task_rolls_back_the_project() {
    let services = services();
    let client = services.clients().create_client("Acme", false).unwrap();
    services
        .context()
        .connection()
        .execute_batch(
            "CREATE TRIGGER reject_tasks BEFORE INSERT ON tasks
             BEGIN SELECT RAISE(ABORT, 'tasks disabled'); END;",
        )
        .unwrap();

    let err = services
        .create_project_with_task(&client, "Website", "Layout")
        .unwrap_err();

    assert!(matches!(err, RepoError::Persistence(_)));
    assert!(!services.has_changes());
    assert!(!services.projects().has_projects());
}

#[test]
fn failure_keeps_earlier_deferred_work_pending() {
    let services = services();
    let client = services.clients().create_client("Acme", false).unwrap();
    let other = services.clients().create_client("Globex", true).unwrap();

    services
        .create_project_with_task(&client, "Website", "")
        .unwrap_err();
    assert!(services.has_changes());

    services.save().unwrap();
    assert!(services.clients().get_client(other.id).unwrap().is_some());
}

#[test]
fn save_and_rollback_are_no_ops_without_changes() {
    let services = services();
    assert!(!services.has_changes());
    services.save().unwrap();
    services.rollback().unwrap();
    assert!(!services.has_changes());
}

#[test]
fn rollback_discards_deferred_creations() {
    let services = services();
    services.clients().create_client("Acme", true).unwrap();
    assert!(services.has_changes());
    assert!(services.clients().has_clients());

    services.rollback().unwrap();
    assert!(!services.has_changes());
    assert!(!services.clients().has_clients());
}

#[test]
fn open_uses_the_configured_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = CoreConfig {
        database_path: Some(dir.path().join("tally.db")),
        ..CoreConfig::default()
    };

    let client_id = {
        let services = DataServices::open(&config).unwrap();
        services.clients().create_client("Acme", false).unwrap().id
    };

    let reopened = DataServices::open(&config).unwrap();
    assert!(reopened.clients().get_client(client_id).unwrap().is_some());
}

#[test]
fn failed_commit_stays_pending_until_rolled_back() {
    let services = services();
    let client = services.clients().create_client("Acme", true).unwrap();
    services
        .context()
        .connection()
        .execute_batch(
            "PRAGMA defer_foreign_keys = ON;
             INSERT INTO tasks (id, client_id, name, created_at, modified_at)
             VALUES ('dangling', 'no-such-client', 'Orphan', 0, 0);",
        )
        .unwrap();

    let err = services.save().unwrap_err();
    assert!(err.to_string().to_lowercase().contains("foreign key"));
    assert!(services.has_changes());

    services.rollback().unwrap();
    assert!(!services.has_changes());
    assert!(services.clients().get_client(client.id).unwrap().is_none());
}
