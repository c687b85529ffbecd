//! Application services for teams and member accounts.

mod members;
mod teams;

pub use members::{MemberService, MemberServiceError, MemberServiceResult};
pub use teams::{TeamService, TeamServiceError, TeamServiceResult};
