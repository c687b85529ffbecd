//! Environment helpers for the embedded cluster.

use super::BoxError;
use pg_embedded_setup_unpriv::{ExecutionPrivileges, detect_execution_privileges};
use std::ffi::OsString;
use std::net::TcpListener;

pub(super) fn env_vars_to_os(
    env_vars: &[(String, Option<String>)],
) -> Vec<(OsString, Option<OsString>)> {
    env_vars
        .iter()
        .map(|(key, value)| (OsString::from(key), value.as_ref().map(OsString::from)))
        .collect()
}

/// Variables applied while the bootstrap settings are resolved: a free
/// port unless `PG_PORT` is set.
///
/// Under root the cluster is driven by the helper named in
/// `PG_EMBEDDED_WORKER`, which must be set.
pub(super) fn bootstrap_env_changes() -> Result<Vec<(OsString, Option<OsString>)>, BoxError> {
    if matches!(detect_execution_privileges(), ExecutionPrivileges::Root)
        && std::env::var_os("PG_EMBEDDED_WORKER").is_none()
    {
        return Err(Box::new(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "running as root requires PG_EMBEDDED_WORKER to name the cluster worker binary",
        )));
    }

    let mut changes = Vec::new();
    if let Some(port) = free_port()? {
        changes.push((OsString::from("PG_PORT"), Some(port)));
    }
    Ok(changes)
}

fn free_port() -> Result<Option<OsString>, BoxError> {
    if std::env::var_os("PG_PORT").is_some() {
        return Ok(None);
    }

    let listener = TcpListener::bind(("127.0.0.1", 0)).map_err(|err| Box::new(err) as BoxError)?;
    let port = listener
        .local_addr()
        .map(|addr| addr.port())
        .map_err(|err| Box::new(err) as BoxError)?;
    drop(listener);

    Ok(Some(OsString::from(port.to_string())))
}
