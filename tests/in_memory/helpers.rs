//! Seed data shared by the in-memory integration tests.

use mockable::DefaultClock;
use rstest::fixture;
use serde_json::{Value, json};
use std::sync::Arc;
use taskboard::bootstrap::{RAW_COLLECTIONS, ensure_collections};
use taskboard::store::adapters::memory::InMemoryDocumentStore;
use taskboard::store::domain::{Document, TASKS};
use taskboard::store::ports::DocumentStore;
use taskboard::task::domain::{NewTask, Task};
use taskboard::task::services::TaskService;
use taskboard::team::domain::{
    MemberId, NewTeam, NewTeamMember, Role, Team, TeamId, TeamMember,
};
use taskboard::team::repository::TeamMemberRepository;
use taskboard::team::services::TeamService;
use taskboard::view::domain::ViewCatalog;
use taskboard::view::services::ViewManager;

/// Store, services and the identities of the seeded entities.
pub struct Seeded {
    pub store: Arc<InMemoryDocumentStore>,
    pub tasks: TaskService<InMemoryDocumentStore, DefaultClock>,
    pub teams: TeamService<InMemoryDocumentStore>,
    pub views: ViewManager<InMemoryDocumentStore>,
    pub ada: MemberId,
    pub lin: MemberId,
    pub grace: MemberId,
    pub platform: Team,
    pub joined_task: Task,
}

/// Fixture returning an empty in-memory store.
#[fixture]
pub fn store() -> Arc<InMemoryDocumentStore> {
    Arc::new(InMemoryDocumentStore::new())
}

/// Converts a JSON object literal into a document.
pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

/// Seeds members, a team and tasks covering every join outcome, without
/// creating the views.
///
/// The `Platform` team lists Lin (developer) before Ada (team lead) plus a
/// dangling member reference, and is managed by Grace. Tasks:
/// - "Joined": Platform team, assigned to Ada;
/// - "No team": assigned to Ada, no team;
/// - "Dangling team": assigned to Ada, team id of no team;
/// - "Malformed assignee": Platform team, assignee stored as `"bob"`.
pub async fn seed(store: Arc<InMemoryDocumentStore>) -> Seeded {
    ensure_collections(store.as_ref(), &RAW_COLLECTIONS)
        .await
        .expect("raw collections");

    let members = TeamMemberRepository::new(Arc::clone(&store));
    let ada = add_member(&members, "Ada", Role::TeamLead).await;
    let lin = add_member(&members, "Lin", Role::Developer).await;
    let grace = add_member(&members, "Grace", Role::ProjectManager).await;

    let teams = TeamService::new(Arc::clone(&store));
    let platform = teams
        .create(
            NewTeam::new("Platform")
                .with_member(lin, Role::Developer)
                .with_member(ada, Role::TeamLead)
                .with_member(MemberId::new(), Role::Developer)
                .with_project_manager(grace),
        )
        .await
        .expect("team created");

    let tasks = TaskService::new(Arc::clone(&store), Arc::new(DefaultClock));
    let joined_task = tasks
        .create(
            NewTask::new("Joined")
                .with_assignee(ada)
                .with_team(platform.id()),
        )
        .await
        .expect("task created");
    tasks
        .create(NewTask::new("No team").with_assignee(ada))
        .await
        .expect("task created");
    tasks
        .create(
            NewTask::new("Dangling team")
                .with_assignee(ada)
                .with_team(TeamId::new()),
        )
        .await
        .expect("task created");
    store
        .insert_one(
            &TASKS,
            doc(json!({
                "title": "Malformed assignee",
                "status": "assigned",
                "assigned_to": "bob",
                "team_id": platform.id().to_string(),
                "created_at": "2026-10-01T00:00:00Z",
                "updated_at": "2026-10-01T00:00:00Z",
            })),
        )
        .await
        .expect("raw task inserted");

    let views = ViewManager::new(Arc::clone(&store), Arc::new(ViewCatalog::standard()));
    Seeded {
        store,
        tasks,
        teams,
        views,
        ada,
        lin,
        grace,
        platform,
        joined_task,
    }
}

async fn add_member(
    members: &TeamMemberRepository<InMemoryDocumentStore>,
    name: &str,
    role: Role,
) -> MemberId {
    let email = format!("{}@example.com", name.to_ascii_lowercase());
    let member =
        TeamMember::new(NewTeamMember::new(name, email, role, "hash")).expect("valid member");
    members.create(&member).await.expect("member stored")
}
