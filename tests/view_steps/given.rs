//! Given steps for view bootstrap BDD scenarios.

use super::world::{ViewWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use std::sync::Arc;
use taskboard::bootstrap::bootstrap;
use taskboard::task::domain::NewTask;
use taskboard::store::ports::DocumentStore;
use taskboard::team::domain::{NewTeam, NewTeamMember, Role, Team, TeamMember};

#[given("an empty document store")]
fn empty_store(world: &mut ViewWorld) -> Result<(), eyre::Report> {
    let listed = run_async(world.store.list_collections()).wrap_err("list namespaces")?;
    if !listed.is_empty() {
        return Err(eyre::eyre!("expected an empty store, found {listed:?}"));
    }
    Ok(())
}

#[given("a bootstrapped document store")]
fn bootstrapped_store(world: &mut ViewWorld) -> Result<(), eyre::Report> {
    run_async(bootstrap(
        Arc::clone(&world.store),
        Arc::clone(&world.catalog),
    ))
    .wrap_err("bootstrap the document store")?;
    Ok(())
}

#[given(r#"a team "{team}" with member "{member}""#)]
fn team_with_member(world: &mut ViewWorld, team: String, member: String) -> Result<(), eyre::Report> {
    let email = format!("{}@example.com", member.to_ascii_lowercase());
    let account = TeamMember::new(NewTeamMember::new(member, email, Role::Developer, "hash"))
        .wrap_err("construct member")?;
    let member_id = run_async(world.members.create(&account)).wrap_err("store member")?;
    let created = run_async(
        world
            .teams
            .create(NewTeam::new(team).with_member(member_id, Role::Developer)),
    )
    .wrap_err("create team")?;

    world.member = Some(member_id);
    world.team = Some(created);
    Ok(())
}

#[given(r#"a task "{title}" assigned to the member in the team"#)]
fn task_in_team(world: &mut ViewWorld, title: String) -> Result<(), eyre::Report> {
    let member = world
        .member
        .ok_or_else(|| eyre::eyre!("missing member in scenario world"))?;
    let team = world
        .team
        .as_ref()
        .map(Team::id)
        .ok_or_else(|| eyre::eyre!("missing team in scenario world"))?;
    run_async(
        world
            .tasks
            .create(NewTask::new(title).with_assignee(member).with_team(team)),
    )
    .wrap_err("create joined task")?;
    Ok(())
}

#[given(r#"a task "{title}" assigned to the member without a team"#)]
fn task_without_team(world: &mut ViewWorld, title: String) -> Result<(), eyre::Report> {
    let member = world
        .member
        .ok_or_else(|| eyre::eyre!("missing member in scenario world"))?;
    run_async(world.tasks.create(NewTask::new(title).with_assignee(member)))
        .wrap_err("create orphan task")?;
    Ok(())
}
