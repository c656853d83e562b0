use tally_core::repo::project_repo::ProjectFilter;
use tally_core::repo::task_repo::TaskFilter;
use tally_core::{open_db_in_memory, DataServices, ManualClock, NewTask, Repository, WorkContext};

fn services() -> DataServices {
    let clock = ManualClock::starting_at(1_700_000_000_000);
    DataServices::new(WorkContext::try_with_clock(open_db_in_memory().unwrap(), clock).unwrap())
}

#[test]
fn deleting_a_client_removes_its_projects_and_tasks() {
    let services = services();
    let acme = services.clients().create_client("Acme", false).unwrap();
    let globex = services.clients().create_client("Globex", false).unwrap();

    for name in ["Website", "App"] {
        let project = services.projects().create_project(&acme, name, false).unwrap();
        for task in ["Design", "Build"] {
            services
                .tasks()
                .create_task(NewTask::new(task, acme.id).in_project(project.id), false)
                .unwrap();
        }
    }
    services
        .tasks()
        .create_task(NewTask::new("Invoice", acme.id), false)
        .unwrap();
    let kept = services
        .tasks()
        .create_task(NewTask::new("Audit", globex.id), false)
        .unwrap();
    assert_eq!(services.tasks().count(&TaskFilter::for_client(acme.id)), 5);

    services.clients().delete_client(&acme, false).unwrap();

    assert_eq!(
        services.projects().count(&ProjectFilter::for_client(acme.id)),
        0
    );
    assert_eq!(services.tasks().count(&TaskFilter::for_client(acme.id)), 0);
    assert_eq!(services.tasks().count(&TaskFilter::default()), 1);
    assert!(services.tasks().get_task(kept.id).unwrap().is_some());
    assert!(services.clients().get_client(acme.id).unwrap().is_none());
}

#[test]
fn deleting_a_project_keeps_its_tasks_with_their_client() {
    let services = services();
    let client = services.clients().create_client("Acme", false).unwrap();
    let project = services
        .projects()
        .create_project(&client, "Website", false)
        .unwrap();
    let task = services
        .tasks()
        .create_task(NewTask::new("Layout", client.id).in_project(project.id), false)
        .unwrap();

    services.projects().delete_project(&project, false).unwrap();

    let loaded = services.tasks().require_task(task.id).unwrap();
    assert_eq!(loaded.project_id, None);
    assert_eq!(loaded.client_id, client.id);
    assert_eq!(services.tasks().get_unassigned_tasks(&client).len(), 1);
}

#[test]
fn rolled_back_delete_leaves_the_graph_intact() {
    let services = services();
    let client = services.clients().create_client("Acme", false).unwrap();
    let project = services
        .projects()
        .create_project(&client, "Website", false)
        .unwrap();
    services
        .tasks()
        .create_task(NewTask::new("Layout", client.id).in_project(project.id), false)
        .unwrap();

    services.clients().delete_client(&client, true).unwrap();
    assert!(services.has_changes());
    assert!(!services.tasks().has_tasks());

    services.rollback().unwrap();
    assert!(!services.has_changes());
    assert!(services.clients().get_client(client.id).unwrap().is_some());
    assert!(services.projects().has_projects_for(&client));
    assert_eq!(services.tasks().get_tasks_for_project(&project).len(), 1);
}
