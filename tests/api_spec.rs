use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::Utc;
use orgboard::api::create_router;
use orgboard::commands::MutationResult;
use orgboard::db::Database;
use orgboard::models::*;
use uuid::Uuid;

fn setup() -> TestServer {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let app = create_router(db);
    TestServer::new(app).expect("Failed to create test server")
}

async fn create_test_org(server: &TestServer) -> Organization {
    let result: MutationResult<Organization> = server
        .post("/api/v1/organizations")
        .json(&CreateOrganizationInput {
            name: "Acme".to_string(),
            contact_email: "a@acme.com".to_string(),
        })
        .await
        .json();
    result.record.expect("organization not created")
}

async fn create_test_project(server: &TestServer, organization_id: Uuid) -> Project {
    let result: MutationResult<Project> = server
        .post("/api/v1/projects")
        .json(&CreateProjectInput {
            organization_id,
            name: "Launch".to_string(),
            description: String::new(),
            status: None,
            due_date: None,
        })
        .await
        .json();
    result.record.expect("project not created")
}

async fn create_test_task(
    server: &TestServer,
    project_id: Uuid,
    status: Option<TaskStatus>,
) -> Task {
    let result: MutationResult<Task> = server
        .post("/api/v1/tasks")
        .json(&CreateTaskInput {
            project_id,
            title: "Ship it".to_string(),
            description: String::new(),
            status,
            assignee_email: String::new(),
            due_date: None,
        })
        .await
        .json();
    result.record.expect("task not created")
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let server = setup();
        let response = server.get("/api/v1/health").await;
        response.assert_status_ok();
    }
}

mod organizations {
    use super::*;

    #[tokio::test]
    async fn create_returns_the_record_in_an_envelope() {
        let server = setup();

        let response = server
            .post("/api/v1/organizations")
            .json(&CreateOrganizationInput {
                name: "Acme".to_string(),
                contact_email: "a@acme.com".to_string(),
            })
            .await;

        response.assert_status(StatusCode::CREATED);
        let result: MutationResult<Organization> = response.json();
        assert!(result.success);
        assert!(result.errors.is_empty());
        let org = result.record.expect("missing record");
        assert!(org.slug.starts_with("acme-a-acme-com-"));
    }

    #[tokio::test]
    async fn create_rejects_a_malformed_contact_email() {
        let server = setup();

        let response = server
            .post("/api/v1/organizations")
            .json(&CreateOrganizationInput {
                name: "Acme".to_string(),
                contact_email: "nope".to_string(),
            })
            .await;

        response.assert_status_ok();
        let result: MutationResult<Organization> = response.json();
        assert!(!result.success);
        assert!(result.record.is_none());
        assert!(result.errors[0].contains("contact_email"));
    }

    #[tokio::test]
    async fn get_missing_returns_404() {
        let server = setup();
        let response = server
            .get(&format!("/api/v1/organizations/{}", Uuid::new_v4()))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_cascades_through_the_tree() {
        let server = setup();
        let org = create_test_org(&server).await;
        let project = create_test_project(&server, org.id).await;
        let task = create_test_task(&server, project.id, None).await;

        let response = server
            .delete(&format!("/api/v1/organizations/{}", org.id))
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        server
            .get(&format!("/api/v1/projects/{}", project.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .get(&format!("/api/v1/tasks/{}", task.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

mod projects {
    use super::*;

    #[tokio::test]
    async fn create_under_missing_organization_reports_not_found() {
        let server = setup();

        let response = server
            .post("/api/v1/projects")
            .json(&CreateProjectInput {
                organization_id: Uuid::new_v4(),
                name: "Orphan".to_string(),
                description: String::new(),
                status: None,
                due_date: None,
            })
            .await;

        response.assert_status_ok();
        let result: MutationResult<Project> = response.json();
        assert!(!result.success);
        assert_eq!(result.errors, vec!["Organization not found".to_string()]);
    }

    #[tokio::test]
    async fn get_includes_derived_metrics() {
        let server = setup();
        let org = create_test_org(&server).await;
        let project = create_test_project(&server, org.id).await;
        create_test_task(&server, project.id, Some(TaskStatus::Done)).await;

        let response = server.get(&format!("/api/v1/projects/{}", project.id)).await;
        response.assert_status_ok();
        let detail: ProjectWithMetrics = response.json();
        assert_eq!(detail.project.name, "Launch");
        assert_eq!(detail.task_count, 1);
        assert_eq!(detail.completed_task_count, 1);
        assert_eq!(detail.completion_rate, 100.0);
    }

    #[tokio::test]
    async fn duplicate_name_in_organization_reports_a_readable_error() {
        let server = setup();
        let org = create_test_org(&server).await;
        create_test_project(&server, org.id).await;

        let response = server
            .post("/api/v1/projects")
            .json(&CreateProjectInput {
                organization_id: org.id,
                name: "Launch".to_string(),
                description: String::new(),
                status: None,
                due_date: None,
            })
            .await;

        response.assert_status_ok();
        let result: MutationResult<Project> = response.json();
        assert!(!result.success);
        assert_eq!(
            result.errors,
            vec!["A project with this name already exists in the organization".to_string()]
        );
    }

    #[tokio::test]
    async fn update_applies_only_supplied_fields() {
        let server = setup();
        let org = create_test_org(&server).await;
        let project = create_test_project(&server, org.id).await;

        let response = server
            .put(&format!("/api/v1/projects/{}", project.id))
            .json(&UpdateProjectInput {
                status: Some(ProjectStatus::Completed),
                ..Default::default()
            })
            .await;

        response.assert_status_ok();
        let result: MutationResult<Project> = response.json();
        assert!(result.success);
        let updated = result.record.expect("missing record");
        assert_eq!(updated.status, ProjectStatus::Completed);
        assert_eq!(updated.name, "Launch");
        assert_eq!(updated.slug, project.slug);
    }

    #[tokio::test]
    async fn list_is_scoped_to_the_organization() {
        let server = setup();
        let org = create_test_org(&server).await;
        create_test_project(&server, org.id).await;

        let response = server
            .get(&format!("/api/v1/organizations/{}/projects", org.id))
            .await;
        response.assert_status_ok();
        let projects: Vec<ProjectWithMetrics> = response.json();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].project.name, "Launch");
        assert_eq!(projects[0].task_count, 0);
    }

    #[tokio::test]
    async fn list_under_missing_organization_returns_404() {
        let server = setup();
        server
            .get(&format!("/api/v1/organizations/{}/projects", Uuid::new_v4()))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

mod tasks {
    use super::*;

    #[tokio::test]
    async fn create_with_missing_project_reports_not_found() {
        let server = setup();

        let response = server
            .post("/api/v1/tasks")
            .json(&CreateTaskInput {
                project_id: Uuid::new_v4(),
                title: "Orphan".to_string(),
                description: String::new(),
                status: None,
                assignee_email: String::new(),
                due_date: None,
            })
            .await;

        response.assert_status_ok();
        let result: MutationResult<Task> = response.json();
        assert!(!result.success);
        assert!(result.record.is_none());
        assert_eq!(result.errors, vec!["Project not found".to_string()]);
    }

    #[tokio::test]
    async fn update_with_only_status_preserves_other_fields() {
        let server = setup();
        let org = create_test_org(&server).await;
        let project = create_test_project(&server, org.id).await;
        let due = Utc::now();

        let created: MutationResult<Task> = server
            .post("/api/v1/tasks")
            .json(&CreateTaskInput {
                project_id: project.id,
                title: "Review PR".to_string(),
                description: "Check the cascade rules".to_string(),
                status: None,
                assignee_email: "dev@acme.com".to_string(),
                due_date: Some(due),
            })
            .await
            .json();
        let task = created.record.expect("missing record");

        let response = server
            .put(&format!("/api/v1/tasks/{}", task.id))
            .json(&UpdateTaskInput {
                status: Some(TaskStatus::InProgress),
                ..Default::default()
            })
            .await;

        response.assert_status_ok();
        let result: MutationResult<Task> = response.json();
        let updated = result.record.expect("missing record");
        assert_eq!(updated.status, TaskStatus::InProgress);
        assert_eq!(updated.title, "Review PR");
        assert_eq!(updated.description, "Check the cascade rules");
        assert_eq!(updated.assignee_email, "dev@acme.com");
        assert!(updated.due_date.is_some());
    }

    #[tokio::test]
    async fn list_under_missing_project_returns_404() {
        let server = setup();
        server
            .get(&format!("/api/v1/projects/{}/tasks", Uuid::new_v4()))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let server = setup();
        let org = create_test_org(&server).await;
        let project = create_test_project(&server, org.id).await;
        create_test_task(&server, project.id, None).await;
        server
            .post("/api/v1/tasks")
            .json(&CreateTaskInput {
                project_id: project.id,
                title: "Newer".to_string(),
                description: String::new(),
                status: None,
                assignee_email: String::new(),
                due_date: None,
            })
            .await;

        let response = server
            .get(&format!("/api/v1/projects/{}/tasks", project.id))
            .await;
        response.assert_status_ok();
        let tasks: Vec<Task> = response.json();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title, "Newer");
    }
}

mod comments {
    use super::*;

    #[tokio::test]
    async fn create_and_list_for_a_task() {
        let server = setup();
        let org = create_test_org(&server).await;
        let project = create_test_project(&server, org.id).await;
        let task = create_test_task(&server, project.id, None).await;

        let response = server
            .post("/api/v1/comments")
            .json(&CreateCommentInput {
                task_id: task.id,
                content: "Looks good".to_string(),
                author_email: "dev@acme.com".to_string(),
            })
            .await;
        response.assert_status(StatusCode::CREATED);

        let response = server
            .get(&format!("/api/v1/tasks/{}/comments", task.id))
            .await;
        response.assert_status_ok();
        let comments: Vec<Comment> = response.json();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].content, "Looks good");
    }

    #[tokio::test]
    async fn create_with_missing_task_reports_not_found() {
        let server = setup();

        let response = server
            .post("/api/v1/comments")
            .json(&CreateCommentInput {
                task_id: Uuid::new_v4(),
                content: "Lost".to_string(),
                author_email: "dev@acme.com".to_string(),
            })
            .await;

        response.assert_status_ok();
        let result: MutationResult<Comment> = response.json();
        assert!(!result.success);
        assert_eq!(result.errors, vec!["Task not found".to_string()]);
    }

    #[tokio::test]
    async fn list_under_missing_task_returns_404() {
        let server = setup();
        server
            .get(&format!("/api/v1/tasks/{}/comments", Uuid::new_v4()))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

mod stats {
    use super::*;

    #[tokio::test]
    async fn reports_organization_wide_completion() {
        let server = setup();
        let org = create_test_org(&server).await;
        let project = create_test_project(&server, org.id).await;
        create_test_task(&server, project.id, Some(TaskStatus::Done)).await;
        create_test_task(&server, project.id, Some(TaskStatus::Todo)).await;

        let response = server
            .get(&format!("/api/v1/organizations/{}/stats", org.id))
            .await;
        response.assert_status_ok();
        let stats: ProjectStats = response.json();
        assert_eq!(stats.total_projects, 1);
        assert_eq!(stats.active_projects, 1);
        assert_eq!(stats.total_tasks, 2);
        assert_eq!(stats.completed_tasks, 1);
        assert_eq!(stats.overall_completion_rate, 50.0);
    }

    #[tokio::test]
    async fn missing_organization_returns_404() {
        let server = setup();
        server
            .get(&format!("/api/v1/organizations/{}/stats", Uuid::new_v4()))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
