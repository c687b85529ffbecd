//! Demo data for local development.
//!
//! Seeding fills empty raw collections with generated members, teams and
//! tasks through the regular services, so every record passes domain
//! validation and back-references are maintained. Views are not touched;
//! callers refresh them afterwards.

use crate::store::ports::DocumentStore;
use crate::task::domain::{NewTask, TaskStatus};
use crate::task::services::{TaskService, TaskServiceError};
use crate::team::domain::{MAX_MEMBERS, MemberId, NewTeam, NewTeamMember, Role, Team};
use crate::team::services::{MemberService, MemberServiceError, TeamService, TeamServiceError};
use mockable::Clock;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Credential placeholder for generated accounts. It matches no password.
pub const DEMO_PASSWORD_HASH: &str = "!demo";

const FIRST_NAMES: [&str; 12] = [
    "Ada", "Grace", "Lin", "Alan", "Barbara", "Edsger", "Frances", "Ken", "Margaret", "Niklaus",
    "Radia", "Tim",
];
const LAST_NAMES: [&str; 8] = [
    "Lovelace", "Hopper", "Turing", "Liskov", "Dijkstra", "Allen", "Hamilton", "Wirth",
];
const TEAM_COLOURS: [&str; 10] = [
    "Amber", "Cobalt", "Crimson", "Emerald", "Indigo", "Ivory", "Jade", "Onyx", "Saffron",
    "Teal",
];
const TASK_VERBS: [&str; 6] = ["Review", "Implement", "Document", "Refactor", "Test", "Deploy"];
const TASK_SUBJECTS: [&str; 6] = [
    "login flow",
    "billing report",
    "search index",
    "audit trail",
    "release notes",
    "team dashboard",
];
const MEMBER_ROLES: [Role; 3] = [Role::ProjectManager, Role::TeamLead, Role::Developer];
const TASK_STATUSES: [TaskStatus; 4] = [
    TaskStatus::Assigned,
    TaskStatus::Pending,
    TaskStatus::InProgress,
    TaskStatus::Completed,
];

/// Errors raised while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// A member could not be created.
    #[error(transparent)]
    Member(#[from] MemberServiceError),
    /// A team could not be created.
    #[error(transparent)]
    Team(#[from] TeamServiceError),
    /// A task could not be created.
    #[error(transparent)]
    Task(#[from] TaskServiceError),
}

/// How much demo data to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedPlan {
    /// Member accounts to create.
    pub members: usize,
    /// Teams to create, capped at the number of team names available.
    pub teams: usize,
    /// Tasks to create.
    pub tasks: usize,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            members: 20,
            teams: 4,
            tasks: 40,
        }
    }
}

/// Counts of the records written by a seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Member accounts created.
    pub members: usize,
    /// Teams created.
    pub teams: usize,
    /// Tasks created.
    pub tasks: usize,
}

/// Generates demo members, teams and tasks.
///
/// Nothing is written when the member collection already holds accounts;
/// the run then returns `None`. Teams get between two and
/// [`MAX_MEMBERS`] members, one of whom manages the team, and every task is
/// assigned to a member of its team.
///
/// # Errors
///
/// Returns the first service failure. Records written before it remain.
pub async fn seed_demo_data<S, C, R>(
    store: Arc<S>,
    clock: Arc<C>,
    rng: &mut R,
    plan: SeedPlan,
) -> Result<Option<SeedSummary>, SeedError>
where
    S: DocumentStore,
    C: Clock + Send + Sync,
    R: Rng,
{
    let members = MemberService::new(Arc::clone(&store));
    if !members.list().await?.is_empty() {
        info!("member accounts present, skipping demo data");
        return Ok(None);
    }
    let teams = TeamService::new(Arc::clone(&store));
    let tasks = TaskService::new(store, clock);

    let mut member_ids = Vec::with_capacity(plan.members);
    for index in 0..plan.members {
        let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Demo");
        let last = LAST_NAMES.choose(rng).copied().unwrap_or("User");
        let role = MEMBER_ROLES.choose(rng).copied().unwrap_or(Role::Developer);
        let email = format!("{first}.{last}{index}@example.com");
        let member = members
            .create(NewTeamMember::new(
                format!("{first} {last}"),
                email,
                role,
                DEMO_PASSWORD_HASH,
            ))
            .await?;
        member_ids.push(member.id());
    }

    let mut created_teams: Vec<Team> = Vec::new();
    if member_ids.len() >= 2 {
        let colours: Vec<&str> = TEAM_COLOURS.choose_multiple(rng, plan.teams).copied().collect();
        for colour in colours {
            let request = team_request(rng, colour, &member_ids);
            created_teams.push(teams.create(request).await?);
        }
    }

    let mut task_count = 0;
    if !created_teams.is_empty() {
        for _ in 0..plan.tasks {
            let Some(request) = task_request(rng, &created_teams) else {
                continue;
            };
            tasks.create(request).await?;
            task_count += 1;
        }
    }

    let summary = SeedSummary {
        members: member_ids.len(),
        teams: created_teams.len(),
        tasks: task_count,
    };
    info!(
        members = summary.members,
        teams = summary.teams,
        tasks = summary.tasks,
        "demo data seeded"
    );
    Ok(Some(summary))
}

fn team_request<R: Rng>(rng: &mut R, colour: &str, member_ids: &[MemberId]) -> NewTeam {
    let size = rng.random_range(2..=MAX_MEMBERS.min(member_ids.len()));
    let chosen: Vec<MemberId> = member_ids.choose_multiple(rng, size).copied().collect();
    let mut request = NewTeam::new(format!("{colour} Team"));
    for member in &chosen {
        let role = MEMBER_ROLES.choose(rng).copied().unwrap_or(Role::Developer);
        request = request.with_member(*member, role);
    }
    match chosen.choose(rng) {
        Some(manager) => request.with_project_manager(*manager),
        None => request,
    }
}

fn task_request<R: Rng>(rng: &mut R, teams: &[Team]) -> Option<NewTask> {
    let team = teams.choose(rng)?;
    let assignee = team.members().choose(rng)?.user_id;
    let verb = TASK_VERBS.choose(rng)?;
    let subject = TASK_SUBJECTS.choose(rng)?;
    let status = TASK_STATUSES.choose(rng).copied()?;
    Some(
        NewTask::new(format!("{verb} {subject}"))
            .with_team(team.id())
            .with_assignee(assignee)
            .with_status(status),
    )
}
