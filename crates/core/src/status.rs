use crate::state::{bind::BindTable, cache::ServerCache, pending::PendingBuffer};
use crate::NodeAddress;

/// Periodic, purely observational status emission (component G). Never
/// affects protocol behavior; disabled entirely when
/// `ConnectionOptions::status_interval` is `None`.
pub fn report(node: NodeAddress, bind: &BindTable, pending: &PendingBuffer, cache: &ServerCache) {
    log::debug!(
        "anycast status: node={node} bound={bound} pending={pending_len} cached={cached_len}",
        bound = bind.len(),
        pending_len = pending.len(),
        cached_len = cache.len(),
    );
}
