//! Multi-step operations built on [`Connection`]: association mutations and
//! server-side joins.
//!
//! Association mutations validate their command before anything is sent, so
//! a malformed call surfaces as a [`ContractError`] from the function itself,
//! never from the returned future.

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use protocol::{AssociationCommand, AssociationTarget, ContractError, Criteria, Method};
use serde_json::Value;
use tracing::debug;

use crate::{Connection, OperationError};

/// A validated request that has not been awaited yet.
pub type PendingRequest = BoxFuture<'static, Result<Value, OperationError>>;

/// Adds a record to `command.association` of the parent record.
///
/// `POST {collection}/{id}/{association}/{foreignId}` with an empty body, or
/// `POST {collection}/{id}/{association}` with `foreignData` as the body.
pub fn add_to(
    connection: &Arc<Connection>,
    collection: &str,
    command: &AssociationCommand,
) -> Result<PendingRequest, ContractError> {
    mutate(connection, Method::Post, collection, command)
}

/// Same target as [`add_to`], dispatched as `DELETE`.
pub fn remove_from(
    connection: &Arc<Connection>,
    collection: &str,
    command: &AssociationCommand,
) -> Result<PendingRequest, ContractError> {
    mutate(connection, Method::Delete, collection, command)
}

/// Callback form of [`add_to`]: spawns the request and hands its outcome to
/// `callback`.
pub fn add_to_with<F>(
    connection: &Arc<Connection>,
    collection: &str,
    command: &AssociationCommand,
    callback: F,
) -> Result<(), ContractError>
where
    F: FnOnce(Result<Value, OperationError>) + Send + 'static,
{
    let pending = add_to(connection, collection, command)?;
    tokio::spawn(async move { callback(pending.await) });
    Ok(())
}

/// Callback form of [`remove_from`].
pub fn remove_from_with<F>(
    connection: &Arc<Connection>,
    collection: &str,
    command: &AssociationCommand,
    callback: F,
) -> Result<(), ContractError>
where
    F: FnOnce(Result<Value, OperationError>) + Send + 'static,
{
    let pending = remove_from(connection, collection, command)?;
    tokio::spawn(async move { callback(pending.await) });
    Ok(())
}

/// Finds records with associations populated by the server.
///
/// The join plan in `criteria.joins` is reduced to its aliases, which replace
/// `criteria.populate`; `joins` itself is not sent.
pub async fn join(
    connection: &Connection,
    collection: &str,
    criteria: Criteria,
) -> Result<Vec<Value>, OperationError> {
    let criteria = criteria.into_populate();
    connection.select(collection, &criteria).await
}

fn mutate(
    connection: &Arc<Connection>,
    method: Method,
    collection: &str,
    command: &AssociationCommand,
) -> Result<PendingRequest, ContractError> {
    let target = AssociationTarget::parse(command)?;
    let request = protocol::Routes::new(connection.config()).association(method, collection, &target);
    debug!(
        connection = %connection.identity(),
        %method,
        url = %request.url,
        "association request prepared"
    );
    let connection = Arc::clone(connection);
    Ok(async move { connection.send(request).await }.boxed())
}
