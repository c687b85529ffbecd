//! Definitions of the views maintained for the task board.

use super::definition::ViewDefinition;
use super::pipeline::{Expr, FieldRef, LocalKey, Pipeline, Projection, Resolve, Stage};
use crate::store::domain::{
    FieldPath, ID_PATH, TASKS, TEAM_MEMBERS, TEAM_TASKS_VIEW, TEAMS, TEAMS_VIEW,
};

const fn path(raw: &'static str) -> FieldPath {
    FieldPath::from_static(raw)
}

/// Tasks joined with the name of their team and of their assignee.
///
/// `team_id` and `assigned_to` are stored as strings and coerced to the
/// identity type before joining; malformed references match nothing. Both
/// joins are inner joins, so tasks without a resolvable team or assignee are
/// absent from the view.
///
/// Output rows carry `_id`, `title`, `status`, `team_name` and
/// `team_member`.
#[must_use]
pub fn team_tasks_view() -> ViewDefinition {
    let pipeline = Pipeline::new([
        Stage::coerce(path("team_id"), path("team_ref")),
        Stage::coerce(path("assigned_to"), path("assignee_ref")),
        Stage::lookup(
            TEAMS,
            LocalKey::Field(path("team_ref")),
            ID_PATH,
            path("team"),
        ),
        Stage::unwind(path("team")),
        Stage::lookup(
            TEAM_MEMBERS,
            LocalKey::Field(path("assignee_ref")),
            ID_PATH,
            path("assignee"),
        ),
        Stage::unwind(path("assignee")),
        Stage::project([
            Projection::new(ID_PATH, Expr::field(ID_PATH)),
            Projection::new(path("title"), Expr::field(path("title"))),
            Projection::new(path("status"), Expr::field(path("status"))),
            Projection::new(path("team_name"), Expr::field(path("team.name"))),
            Projection::new(path("team_member"), Expr::field(path("assignee.name"))),
        ]),
    ]);
    ViewDefinition::new(TEAM_TASKS_VIEW, TASKS, pipeline)
}

/// Teams with members and project manager resolved against `team_members`.
///
/// Every team appears, including teams without members. Members keep their
/// stored order and role; identities are rendered as display strings.
/// Unresolvable references yield `null` name and email.
#[must_use]
pub fn teams_view() -> ViewDefinition {
    let member_docs = FieldRef::document(path("member_docs"));
    let manager_docs = FieldRef::document(path("manager_docs"));
    let member_user = FieldRef::element(path("user_id"));
    let manager_ref = FieldRef::document(path("project_manager"));

    let member_field = |select: &'static str| {
        Expr::Resolve(Resolve {
            within: member_docs.clone(),
            key: ID_PATH,
            reference: member_user.clone(),
            select: path(select),
        })
    };
    let manager_field = |select: FieldPath| {
        Expr::Resolve(Resolve {
            within: manager_docs.clone(),
            key: ID_PATH,
            reference: manager_ref.clone(),
            select,
        })
    };

    let pipeline = Pipeline::new([
        Stage::lookup(
            TEAM_MEMBERS,
            LocalKey::EachOf {
                array: path("members"),
                field: path("user_id"),
            },
            ID_PATH,
            path("member_docs"),
        ),
        Stage::lookup(
            TEAM_MEMBERS,
            LocalKey::Field(path("project_manager")),
            ID_PATH,
            path("manager_docs"),
        ),
        Stage::project([
            Projection::new(ID_PATH, Expr::display(Expr::field(ID_PATH))),
            Projection::new(path("name"), Expr::field(path("name"))),
            Projection::new(
                path("project_manager"),
                Expr::display(manager_field(ID_PATH)),
            ),
            Projection::new(path("project_manager_name"), manager_field(path("name"))),
            Projection::new(
                path("members"),
                Expr::Each {
                    input: FieldRef::document(path("members")),
                    fields: vec![
                        Projection::new(path("id"), Expr::display(Expr::element(path("user_id")))),
                        Projection::new(path("role"), Expr::element(path("role"))),
                        Projection::new(path("name"), member_field("name")),
                        Projection::new(path("email"), member_field("email")),
                    ],
                },
            ),
        ]),
    ]);
    ViewDefinition::new(TEAMS_VIEW, TEAMS, pipeline)
}
