use tally_core::repo::task_repo::{TaskFilter, TaskSort};
use tally_core::{
    open_db_in_memory, DataServices, ManualClock, NewTask, Repository, TaskUpdate, TimerState,
    ValidationError, WorkContext,
};

const T0: i64 = 1_700_000_000_000;

fn services() -> (DataServices, ManualClock) {
    let clock = ManualClock::starting_at(T0);
    let ctx = WorkContext::try_with_clock(open_db_in_memory().unwrap(), clock.clone()).unwrap();
    (DataServices::new(ctx), clock)
}

#[test]
fn new_task_is_not_started() {
    let (services, _clock) = services();
    let client = services.clients().create_client("Acme", false).unwrap();
    let task = services
        .tasks()
        .create_task(NewTask::new("Call", client.id).with_notes("kickoff"), false)
        .unwrap();

    assert_eq!(task.timer_state(), TimerState::NotStarted);
    assert_eq!(task.duration_secs, 0);
    assert_eq!(task.created_at, T0);

    let loaded = services.tasks().require_task(task.id).unwrap();
    assert_eq!(loaded.notes.as_deref(), Some("kickoff"));
    assert!(services.tasks().has_tasks());
}

#[test]
fn project_of_another_client_is_rejected() {
    let (services, _clock) = services();
    let acme = services.clients().create_client("Acme", false).unwrap();
    let globex = services.clients().create_client("Globex", false).unwrap();
    let audit = services
        .projects()
        .create_project(&globex, "Audit", false)
        .unwrap();

    let err = services
        .tasks()
        .create_task(NewTask::new("Review", acme.id).in_project(audit.id), false)
        .unwrap_err();
    assert_eq!(
        err.as_validation(),
        Some(ValidationError::ProjectClientMismatch {
            project_client: globex.id,
            task_client: acme.id,
        })
    );
    assert!(!services.tasks().has_tasks());
    assert!(!services.has_changes());
}

#[test]
fn per_owner_listings_are_newest_first() {
    let (services, clock) = services();
    let client = services.clients().create_client("Acme", false).unwrap();
    let project = services
        .projects()
        .create_project(&client, "Website", false)
        .unwrap();

    let direct = services
        .tasks()
        .create_task(NewTask::new("Invoice", client.id), false)
        .unwrap();
    clock.advance_secs(1);
    let first = services
        .tasks()
        .create_task(NewTask::new("Layout", client.id).in_project(project.id), false)
        .unwrap();
    clock.advance_secs(1);
    let second = services
        .tasks()
        .create_task(NewTask::new("Copy", client.id).in_project(project.id), false)
        .unwrap();

    let for_client: Vec<_> = services
        .tasks()
        .get_tasks_for_client(&client)
        .into_iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(for_client, vec![second.id, first.id, direct.id]);

    let for_project: Vec<_> = services
        .tasks()
        .get_tasks_for_project(&project)
        .into_iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(for_project, vec![second.id, first.id]);

    let unassigned: Vec<_> = services
        .tasks()
        .get_unassigned_tasks(&client)
        .into_iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(unassigned, vec![direct.id]);

    let by_name: Vec<_> = services
        .tasks()
        .list(&TaskFilter::for_client(client.id), TaskSort::NameAsc)
        .into_iter()
        .map(|task| task.name)
        .collect();
    assert_eq!(by_name, vec!["Copy", "Invoice", "Layout"]);
}

#[test]
fn completed_tasks_exclude_unstarted_and_running() {
    let (services, clock) = services();
    let client = services.clients().create_client("Acme", false).unwrap();
    let tasks = services.tasks();
    let timer = services.timer();

    tasks
        .create_task(NewTask::new("Idle", client.id), false)
        .unwrap();
    let mut done = tasks
        .create_task(NewTask::new("Done", client.id), false)
        .unwrap();
    timer.start_timer(&mut done).unwrap();
    clock.advance_secs(90);
    timer.stop_timer(&mut done).unwrap();
    let mut running = tasks
        .create_task(NewTask::new("Running", client.id), false)
        .unwrap();
    timer.start_timer(&mut running).unwrap();

    let completed: Vec<_> = tasks
        .get_completed_tasks(&client)
        .into_iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(completed, vec![done.id]);

    let running_ids: Vec<_> = tasks
        .get_running_tasks()
        .into_iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(running_ids, vec![running.id]);
    assert_eq!(
        tasks.count(&TaskFilter::default().in_state(TimerState::NotStarted)),
        1
    );
}

#[test]
fn update_can_move_a_task_out_of_its_project() {
    let (services, clock) = services();
    let client = services.clients().create_client("Acme", false).unwrap();
    let project = services
        .projects()
        .create_project(&client, "Website", false)
        .unwrap();
    let mut task = services
        .tasks()
        .create_task(NewTask::new("Layout", client.id).in_project(project.id), false)
        .unwrap();

    clock.advance_secs(3);
    let changes = TaskUpdate {
        project_id: Some(None),
        ..TaskUpdate::rename("Layout v2")
    };
    services
        .tasks()
        .update_task(&mut task, changes, false)
        .unwrap();

    let loaded = services.tasks().require_task(task.id).unwrap();
    assert_eq!(loaded.project_id, None);
    assert_eq!(loaded.name, "Layout v2");
    assert_eq!(loaded.modified_at, T0 + 3_000);
    assert_eq!(loaded.created_at, T0);
}

#[test]
fn negative_duration_update_is_rejected() {
    let (services, _clock) = services();
    let client = services.clients().create_client("Acme", false).unwrap();
    let mut task = services
        .tasks()
        .create_task(NewTask::new("Layout", client.id), false)
        .unwrap();

    let changes = TaskUpdate {
        duration_secs: Some(-1),
        ..TaskUpdate::default()
    };
    let err = services
        .tasks()
        .update_task(&mut task, changes, false)
        .unwrap_err();
    assert_eq!(
        err.as_validation(),
        Some(ValidationError::NegativeDuration(-1))
    );
    assert_eq!(
        services.tasks().require_task(task.id).unwrap().duration_secs,
        0
    );
}

#[test]
fn update_with_unchanged_values_keeps_modified_at() {
    let (services, clock) = services();
    let client = services.clients().create_client("Acme", false).unwrap();
    let mut task = services
        .tasks()
        .create_task(NewTask::new("Call", client.id).with_notes("kickoff"), false)
        .unwrap();

    clock.advance_secs(30);
    let same = TaskUpdate {
        name: Some("Call".to_string()),
        notes: Some(Some("kickoff".to_string())),
        duration_secs: Some(0),
        project_id: Some(None),
    };
    services.tasks().update_task(&mut task, same, false).unwrap();

    assert_eq!(task.modified_at, T0);
    assert_eq!(
        services.tasks().require_task(task.id).unwrap().modified_at,
        T0
    );
    assert!(!services.has_changes());
}

#[test]
fn listings_read_empty_when_the_store_fails() {
    let (services, _clock) = services();
    let client = services.clients().create_client("Acme", false).unwrap();
    services
        .tasks()
        .create_task(NewTask::new("Call", client.id), false)
        .unwrap();
    services
        .context()
        .connection()
        .execute_batch("DROP TABLE tasks;")
        .unwrap();

    assert!(services.tasks().list_all().is_empty());
    assert_eq!(services.tasks().count(&TaskFilter::default()), 0);
    assert!(!services.tasks().has_tasks());
    assert!(services.tasks().get_tasks_for_client(&client).is_empty());
    assert!(services.tasks().get_task(client.id).is_err());
}
