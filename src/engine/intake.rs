/// Validated ingestion of per-client commands. Parsing and sanitization live
/// here so the simulation thread only ever sees well-formed, bounds-checked
/// `Command` values; anything malformed is dropped before it reaches the
/// inbound queue.
use super::config;

/// A connection identifier. The transport layer's connection id doubles as
/// this, per spec.
pub type ConnId = u32;

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Join { name: String },
    Respawn { name: String },
    Move { x: f64, y: f64 },
    Boost,
    /// Not a client-sent command: injected by the transport layer when a
    /// connection closes, so disconnect is handled on the simulation thread
    /// like everything else.
    Disconnect,
}

/// A validated command tagged with the connection it arrived on.
#[derive(Clone, Debug)]
pub struct InboundCommand {
    pub conn_id: ConnId,
    pub command: Command,
}

/// Strip control characters, trim, truncate to `NAME_MAX_LEN`, and fall back
/// to the default name if the result is empty.
pub fn sanitize_name(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| !c.is_control()).collect();
    let trimmed = cleaned.trim();
    let truncated: String = trimmed.chars().take(config::NAME_MAX_LEN).collect();
    if truncated.is_empty() {
        config::DEFAULT_NAME.to_string()
    } else {
        truncated
    }
}

/// Clamp a move target to map bounds; out-of-range coordinates are accepted
/// after clamping rather than rejected (see error handling design).
pub fn clamp_move_target(x: f64, y: f64) -> Option<(f64, f64)> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    Some((x.clamp(0.0, config::MAP_WIDTH), y.clamp(0.0, config::MAP_HEIGHT)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name_strips_control_chars() {
        assert_eq!(sanitize_name("Al\u{0007}ice"), "Alice");
    }

    #[test]
    fn test_sanitize_name_truncates() {
        let long = "x".repeat(100);
        assert_eq!(sanitize_name(&long).len(), config::NAME_MAX_LEN);
    }

    #[test]
    fn test_sanitize_name_falls_back_to_default() {
        assert_eq!(sanitize_name("   "), config::DEFAULT_NAME);
        assert_eq!(sanitize_name(""), config::DEFAULT_NAME);
    }

    #[test]
    fn test_clamp_move_target_in_bounds() {
        let (x, y) = clamp_move_target(500.0, 500.0).unwrap();
        assert_eq!((x, y), (500.0, 500.0));
    }

    #[test]
    fn test_clamp_move_target_out_of_bounds() {
        let (x, y) = clamp_move_target(-100.0, 9999.0).unwrap();
        assert_eq!(x, 0.0);
        assert_eq!(y, config::MAP_HEIGHT);
    }

    #[test]
    fn test_clamp_move_target_rejects_non_finite() {
        assert!(clamp_move_target(f64::NAN, 0.0).is_none());
        assert!(clamp_move_target(f64::INFINITY, 0.0).is_none());
    }
}
