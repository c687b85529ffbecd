//! Then steps for view bootstrap BDD scenarios.

use super::world::{ViewWorld, run_async};
use rstest_bdd_macros::then;
use taskboard::store::domain::CollectionName;
use taskboard::view::services::{EnsureReport, ViewOutcome};

fn bootstrap_report(world: &ViewWorld) -> Result<&EnsureReport, eyre::Report> {
    world
        .last_bootstrap
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing bootstrap result in scenario world"))?
        .as_ref()
        .map_err(|err| eyre::eyre!("unexpected bootstrap failure: {err}"))
}

#[then(r#"the view "{view}" is created"#)]
fn view_is_created(world: &ViewWorld, view: String) -> Result<(), eyre::Report> {
    let report = bootstrap_report(world)?;
    let name = CollectionName::new(view).map_err(|err| eyre::eyre!("bad view name: {err}"))?;

    match report.outcome_of(&name) {
        Some(ViewOutcome::Created) => Ok(()),
        other => Err(eyre::eyre!("expected {name} to be created, found {other:?}")),
    }
}

#[then("no view is created")]
fn no_view_is_created(world: &ViewWorld) -> Result<(), eyre::Report> {
    let report = bootstrap_report(world)?;
    if !report.is_noop() {
        return Err(eyre::eyre!("expected a no-op bootstrap, got {report:?}"));
    }
    Ok(())
}

#[then("the task board is empty")]
fn task_board_is_empty(world: &ViewWorld) -> Result<(), eyre::Report> {
    let rows = run_async(world.tasks.list_tasks())
        .map_err(|err| eyre::eyre!("board listing failed: {err}"))?;
    if !rows.is_empty() {
        return Err(eyre::eyre!("expected an empty board, found {rows:?}"));
    }
    Ok(())
}

#[then(r#"the task board lists only "{title}""#)]
fn task_board_lists_only(world: &ViewWorld, title: String) -> Result<(), eyre::Report> {
    if let Some(Err(err)) = world.last_refresh.as_ref() {
        return Err(eyre::eyre!("view refresh failed: {err}"));
    }
    let rows = run_async(world.tasks.list_tasks())
        .map_err(|err| eyre::eyre!("board listing failed: {err}"))?;
    let titles: Vec<&str> = rows.iter().filter_map(|row| row.title.as_deref()).collect();
    if titles != [title.as_str()] {
        return Err(eyre::eyre!("expected only {title:?} on the board, found {titles:?}"));
    }
    Ok(())
}
