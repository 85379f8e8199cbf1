/// Connection-to-player bookkeeping. The registry itself holds no world
/// state, only identifiers — entity lifecycle lives in the `EntityStore`.
use std::collections::HashMap;

use super::entity::PlayerId;
use super::intake::ConnId;

/// Maps transport connection identifiers to player identifiers, and back.
/// The reverse map lets the simulation thread unbind a connection when its
/// player dies in-world (eaten), not just when the socket itself closes.
#[derive(Default)]
pub struct SessionRegistry {
    conn_to_player: HashMap<ConnId, PlayerId>,
    player_to_conn: HashMap<PlayerId, ConnId>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new connection has no player until it joins.
    pub fn on_connect(&mut self, _conn_id: ConnId) {}

    /// Returns the player id that was bound to this connection, if any, so
    /// the caller can remove it from the entity store.
    pub fn on_disconnect(&mut self, conn_id: ConnId) -> Option<PlayerId> {
        let player_id = self.conn_to_player.remove(&conn_id)?;
        self.player_to_conn.remove(&player_id);
        Some(player_id)
    }

    pub fn bind(&mut self, conn_id: ConnId, player_id: PlayerId) {
        self.conn_to_player.insert(conn_id, player_id);
        self.player_to_conn.insert(player_id, conn_id);
    }

    /// Unbind a player that died in-world (eaten), freeing its connection to
    /// `respawn`. Returns the connection id that owned it, if still bound.
    pub fn unbind_player(&mut self, player_id: PlayerId) -> Option<ConnId> {
        let conn_id = self.player_to_conn.remove(&player_id)?;
        self.conn_to_player.remove(&conn_id);
        Some(conn_id)
    }

    pub fn player_for(&self, conn_id: ConnId) -> Option<PlayerId> {
        self.conn_to_player.get(&conn_id).copied()
    }

    pub fn is_alive(&self, conn_id: ConnId) -> bool {
        self.conn_to_player.contains_key(&conn_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_and_lookup() {
        let mut registry = SessionRegistry::new();
        registry.bind(1, 42);
        assert_eq!(registry.player_for(1), Some(42));
        assert!(registry.is_alive(1));
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut registry = SessionRegistry::new();
        registry.bind(1, 42);
        assert_eq!(registry.on_disconnect(1), Some(42));
        assert_eq!(registry.on_disconnect(1), None);
        assert!(!registry.is_alive(1));
    }

    #[test]
    fn test_join_when_already_alive_is_detectable() {
        let mut registry = SessionRegistry::new();
        registry.bind(1, 42);
        assert!(registry.is_alive(1));
    }

    #[test]
    fn test_unbind_player_frees_connection_for_respawn() {
        let mut registry = SessionRegistry::new();
        registry.bind(1, 42);
        assert_eq!(registry.unbind_player(42), Some(1));
        assert!(!registry.is_alive(1));
        assert_eq!(registry.player_for(1), None);
    }

    #[test]
    fn test_unbind_player_not_bound_is_noop() {
        let mut registry = SessionRegistry::new();
        assert_eq!(registry.unbind_player(99), None);
    }

    #[test]
    fn test_disconnect_clears_reverse_lookup() {
        let mut registry = SessionRegistry::new();
        registry.bind(1, 42);
        registry.on_disconnect(1);
        assert_eq!(registry.unbind_player(42), None);
    }
}
