//! Materialized views, fallback reads and refresh against a live database.

use super::helpers::{BoxError, PreparedStore, open_store, prepared_store};
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::{Value, json};
use std::sync::Arc;
use taskboard::read_path::ReadSource;
use taskboard::store::adapters::postgres::PostgresDocumentStore;
use taskboard::store::domain::{Document, Filter, TASKS, TEAM_TASKS_VIEW, TEAMS, TEAMS_VIEW};
use taskboard::store::ports::DocumentStore;
use taskboard::task::domain::NewTask;
use taskboard::task::services::TaskService;
use taskboard::team::domain::{MemberId, NewTeam, NewTeamMember, Role, Team, TeamId};
use taskboard::team::services::{MemberService, TeamService};
use taskboard::view::domain::ViewCatalog;
use taskboard::view::services::{ViewManager, ViewOutcome};

type Tasks = TaskService<PostgresDocumentStore, DefaultClock>;

struct Board {
    tasks: Tasks,
    teams: TeamService<PostgresDocumentStore>,
    views: ViewManager<PostgresDocumentStore>,
    ada: MemberId,
    lin: MemberId,
    platform: Team,
}

fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

fn views(store: &Arc<PostgresDocumentStore>) -> ViewManager<PostgresDocumentStore> {
    ViewManager::new(Arc::clone(store), Arc::new(ViewCatalog::standard()))
}

/// Seeds Ada and Lin on team Platform (plus a dangling member entry) and
/// one task per join outcome.
async fn seed_board(store: &Arc<PostgresDocumentStore>) -> Result<Board, BoxError> {
    let members = MemberService::new(Arc::clone(store));
    let ada = members
        .create(NewTeamMember::new("Ada", "ada@example.com", Role::TeamLead, "hash"))
        .await?
        .id();
    let lin = members
        .create(NewTeamMember::new("Lin", "lin@example.com", Role::Developer, "hash"))
        .await?
        .id();

    let teams = TeamService::new(Arc::clone(store));
    let platform = teams
        .create(
            NewTeam::new("Platform")
                .with_member(lin, Role::Developer)
                .with_member(ada, Role::TeamLead)
                .with_member(MemberId::new(), Role::Developer)
                .with_project_manager(ada),
        )
        .await?;

    let tasks: Tasks = TaskService::new(Arc::clone(store), Arc::new(DefaultClock));
    tasks
        .create(
            NewTask::new("Joined")
                .with_assignee(ada)
                .with_team(platform.id()),
        )
        .await?;
    tasks.create(NewTask::new("No team").with_assignee(ada)).await?;
    tasks
        .create(
            NewTask::new("Dangling team")
                .with_assignee(ada)
                .with_team(TeamId::new()),
        )
        .await?;
    store
        .insert_one(
            &TASKS,
            doc(json!({
                "title": "Malformed references",
                "status": "assigned",
                "assigned_to": "bob",
                "team_id": "xyz",
                "created_at": "2026-10-01T00:00:00Z",
                "updated_at": "2026-10-01T00:00:00Z",
            })),
        )
        .await?;

    Ok(Board {
        tasks,
        teams,
        views: views(store),
        ada,
        lin,
        platform,
    })
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn first_run_creates_both_materialized_views(
    #[future] prepared_store: Result<PreparedStore, BoxError>,
) -> Result<(), BoxError> {
    let context = prepared_store.await?;

    let report = views(&context.store).ensure_views().await?;
    let listed = context.store.list_collections().await?;

    assert_eq!(report.outcome_of(&TEAM_TASKS_VIEW), Some(ViewOutcome::Created));
    assert_eq!(report.outcome_of(&TEAMS_VIEW), Some(ViewOutcome::Created));
    let view_names: Vec<&str> = listed
        .iter()
        .filter(|info| info.is_view())
        .map(|info| info.name().as_str())
        .collect();
    assert_eq!(view_names.len(), 2);
    assert!(view_names.contains(&"team_tasks_view"));
    assert!(view_names.contains(&"teams_view"));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn second_run_leaves_views_untouched(
    #[future] prepared_store: Result<PreparedStore, BoxError>,
) -> Result<(), BoxError> {
    let context = prepared_store.await?;
    let board = seed_board(&context.store).await?;
    board.views.ensure_views().await?;
    let before = board.tasks.list_tasks().await?;

    let report = board.views.ensure_views().await?;

    assert!(report.is_noop());
    assert_eq!(board.tasks.list_tasks().await?, before);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn board_view_keeps_only_fully_resolved_tasks(
    #[future] prepared_store: Result<PreparedStore, BoxError>,
) -> Result<(), BoxError> {
    let context = prepared_store.await?;
    let board = seed_board(&context.store).await?;
    board.views.ensure_views().await?;

    let rows = board.tasks.list_tasks().await?;
    let raw = board.tasks.tasks_for_member(board.ada).await?;

    let titles: Vec<Option<&str>> = rows.iter().map(|row| row.title.as_deref()).collect();
    assert_eq!(titles, [Some("Joined")]);
    let row = rows.first().ok_or("one board row")?;
    assert_eq!(row.team_name.as_deref(), Some("Platform"));
    assert_eq!(row.team_member.as_deref(), Some("Ada"));
    assert_eq!(raw.len(), 3);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn teams_view_resolves_members_in_stored_order(
    #[future] prepared_store: Result<PreparedStore, BoxError>,
) -> Result<(), BoxError> {
    let context = prepared_store.await?;
    let board = seed_board(&context.store).await?;
    board.views.ensure_views().await?;
    context
        .store
        .delete_one(&TEAMS, &Filter::by_id(board.platform.id()))
        .await?;

    let fetched = board.teams.get(board.platform.id()).await?;

    assert_eq!(fetched.source(), ReadSource::View);
    let overview = fetched.into_view().ok_or("view row")?;
    assert_eq!(overview.project_manager_name.as_deref(), Some("Ada"));
    let names: Vec<Option<&str>> = overview
        .members
        .iter()
        .map(|member| member.name.as_deref())
        .collect();
    assert_eq!(names, [Some("Lin"), Some("Ada"), None]);
    let roles: Vec<Option<Role>> = overview.members.iter().map(|member| member.role).collect();
    assert_eq!(
        roles,
        [Some(Role::Developer), Some(Role::TeamLead), Some(Role::Developer)]
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn refresh_picks_up_rows_written_after_creation(
    #[future] prepared_store: Result<PreparedStore, BoxError>,
) -> Result<(), BoxError> {
    let context = prepared_store.await?;
    let board = seed_board(&context.store).await?;
    board.views.ensure_views().await?;
    let late = board
        .tasks
        .create(
            NewTask::new("Late arrival")
                .with_assignee(board.lin)
                .with_team(board.platform.id()),
        )
        .await?;

    let stale = board.tasks.list_tasks().await?;
    let report = board.views.refresh_views().await?;
    let fresh = board.tasks.list_tasks().await?;

    assert!(stale.iter().all(|row| row.id != late.id()));
    assert_eq!(report.outcome_of(&TEAM_TASKS_VIEW), Some(ViewOutcome::Refreshed));
    let row = fresh
        .iter()
        .find(|row| row.id == late.id())
        .ok_or("refreshed view includes the new task")?;
    assert_eq!(row.team_member.as_deref(), Some("Lin"));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_startups_create_each_view_once(
    #[future] prepared_store: Result<PreparedStore, BoxError>,
) -> Result<(), BoxError> {
    const RACERS: usize = 8;
    let context = prepared_store.await?;
    let shared = open_store(context.temp_db.url(), 8)?;

    let handles: Vec<_> = (0..RACERS)
        .map(|_| {
            let manager = views(&shared);
            tokio::spawn(async move { manager.ensure_views().await })
        })
        .collect();
    let mut reports = Vec::with_capacity(RACERS);
    for handle in handles {
        reports.push(handle.await??);
    }

    for view in [TEAM_TASKS_VIEW, TEAMS_VIEW] {
        let outcomes: Vec<ViewOutcome> = reports
            .iter()
            .filter_map(|report| report.outcome_of(&view))
            .collect();
        let created = outcomes
            .iter()
            .filter(|outcome| **outcome == ViewOutcome::Created)
            .count();
        assert_eq!(outcomes.len(), RACERS);
        assert_eq!(created, 1, "exactly one racer creates {view}");
        assert!(outcomes.iter().all(|outcome| matches!(
            outcome,
            ViewOutcome::Created | ViewOutcome::CreatedConcurrently | ViewOutcome::AlreadyPresent
        )));
    }
    let listed = context.store.list_collections().await?;
    assert_eq!(listed.iter().filter(|info| info.is_view()).count(), 2);
    Ok(())
}
