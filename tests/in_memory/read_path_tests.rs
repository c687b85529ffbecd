//! Fallback reads per entity type and view staleness until refresh.

use super::helpers::{Seeded, doc, seed, store};
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;
use taskboard::read_path::{Fetched, ReadSource};
use taskboard::store::adapters::memory::InMemoryDocumentStore;
use taskboard::store::domain::{Filter, TEAMS};
use taskboard::store::ports::DocumentStore;
use taskboard::task::domain::NewTask;
use taskboard::task::services::TaskServiceError;
use taskboard::team::domain::{Role, TeamChanges, TeamId};

async fn seeded_with_views(store: Arc<InMemoryDocumentStore>) -> Seeded {
    let seeded = seed(store).await;
    seeded.views.ensure_views().await.expect("views ensured");
    seeded
}

async fn drop_raw_team(seeded: &Seeded) {
    let removed = seeded
        .store
        .delete_one(&TEAMS, &Filter::by_id(seeded.platform.id()))
        .await
        .expect("raw delete");
    assert!(removed);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn team_is_read_from_the_collection_when_present(store: Arc<InMemoryDocumentStore>) {
    let seeded = seeded_with_views(store).await;

    let fetched = seeded
        .teams
        .get(seeded.platform.id())
        .await
        .expect("team found");

    assert_eq!(fetched, Fetched::Collection(seeded.platform.clone()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn team_falls_back_to_the_view_after_a_raw_miss(store: Arc<InMemoryDocumentStore>) {
    let seeded = seeded_with_views(store).await;
    drop_raw_team(&seeded).await;

    let fetched = seeded
        .teams
        .get(seeded.platform.id())
        .await
        .expect("team found in view");

    assert_eq!(fetched.source(), ReadSource::View);
    let overview = fetched.into_view().expect("view row");
    assert_eq!(overview.name.as_deref(), Some("Platform"));
    assert_eq!(overview.members.len(), 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn team_listing_falls_back_when_the_collection_is_empty(
    store: Arc<InMemoryDocumentStore>,
) {
    let seeded = seeded_with_views(store).await;
    let raw = seeded.teams.list().await.expect("listing");
    drop_raw_team(&seeded).await;

    let fallback = seeded.teams.list().await.expect("listing");

    assert_eq!(raw.source(), ReadSource::Collection);
    assert_eq!(fallback.source(), ReadSource::View);
    assert_eq!(fallback.into_view().map(|rows| rows.len()), Some(1));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn single_task_reads_never_use_the_view(store: Arc<InMemoryDocumentStore>) {
    let seeded = seeded_with_views(store).await;
    let id = seeded.joined_task.id();
    seeded.tasks.delete(id).await.expect("task deleted");

    let single = seeded.tasks.get(id).await;
    let board = seeded.tasks.list_tasks().await.expect("board listing");

    assert!(matches!(single, Err(TaskServiceError::NotFound(_))));
    assert!(board.iter().any(|row| row.id == id));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn views_are_stale_until_refreshed(store: Arc<InMemoryDocumentStore>) {
    let seeded = seeded_with_views(store).await;
    let created = seeded
        .tasks
        .create(
            NewTask::new("Late arrival")
                .with_assignee(seeded.lin)
                .with_team(seeded.platform.id()),
        )
        .await
        .expect("task created");
    seeded
        .teams
        .update(seeded.platform.id(), TeamChanges::new().with_name("Core"))
        .await
        .expect("team renamed");

    let stale = seeded.tasks.list_tasks().await.expect("board listing");
    seeded.views.refresh_views().await.expect("views refreshed");
    let fresh = seeded.tasks.list_tasks().await.expect("board listing");

    assert!(stale.iter().all(|row| row.id != created.id()));
    assert!(
        stale
            .iter()
            .all(|row| row.team_name.as_deref() == Some("Platform"))
    );
    let late = fresh
        .iter()
        .find(|row| row.id == created.id())
        .expect("refreshed view includes the new task");
    assert_eq!(late.team_name.as_deref(), Some("Core"));
    assert_eq!(late.team_member.as_deref(), Some("Lin"));
    assert_eq!(fresh.len(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn raw_task_listing_includes_unjoinable_tasks(store: Arc<InMemoryDocumentStore>) {
    let seeded = seeded_with_views(store).await;

    let raw = seeded
        .tasks
        .tasks_for_member(seeded.ada)
        .await
        .expect("member listing");

    let titles: Vec<&str> = raw.iter().map(|task| task.title()).collect();
    assert_eq!(titles, ["Joined", "No team", "Dangling team"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_member_references_do_not_fail_team_reads(
    store: Arc<InMemoryDocumentStore>,
) {
    let seeded = seeded_with_views(store).await;
    let legacy = TeamId::new();
    seeded
        .store
        .insert_one(
            &TEAMS,
            doc(json!({
                "_id": legacy.to_string(),
                "name": "Legacy",
                "members": [
                    {"user_id": "60d5ec49f8d2e4b8b4e7c8a1", "role": "developer"},
                    {"user_id": seeded.ada.to_string(), "role": "team_lead"}
                ],
            })),
        )
        .await
        .expect("raw team inserted");

    let single = seeded.teams.get(legacy).await.expect("team readable");
    let listing = seeded.teams.list().await.expect("listing readable");

    let team = single.into_collection().expect("raw team");
    assert_eq!(team.members().len(), 1);
    assert!(team.has_member(seeded.ada));
    assert_eq!(
        team.members().first().map(|entry| entry.role),
        Some(Role::TeamLead)
    );
    assert_eq!(listing.into_collection().map(|teams| teams.len()), Some(2));
}
