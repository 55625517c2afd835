//! Opaque node identifier minting.

use uuid::Uuid;

/// Generate a fresh opaque node id: `node_` followed by 8 lowercase hex chars.
pub fn generate_node_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("node_{}", &hex[..8])
}
