use anyhow::anyhow;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::LoadPolicy;
use crate::error::{LibError, Result};
use crate::invariants::{ensure_tree_invariants, repair_members};
use crate::models::{Member, MemberId};
use crate::store::MemberStore;

pub const FORMAT_VERSION: u32 = 1;

/// Serializable copy of a whole tree. Members keep their store order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeSnapshot {
    pub format_version: u32,
    pub root_id: MemberId,
    pub members: Vec<Member>,
    pub saved_at: NaiveDateTime,
}

impl TreeSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(raw)?;
        if snapshot.format_version != FORMAT_VERSION {
            return Err(LibError::invalid(
                "Unsupported snapshot format version",
                anyhow!(
                    "snapshot format version {} is not supported (expected {})",
                    snapshot.format_version,
                    FORMAT_VERSION
                ),
            ));
        }
        Ok(snapshot)
    }
}

pub fn save(store: &MemberStore) -> TreeSnapshot {
    TreeSnapshot {
        format_version: FORMAT_VERSION,
        root_id: store.root_id(),
        members: store.members().to_vec(),
        saved_at: Utc::now().naive_utc(),
    }
}

/// Rebuilds a store from `snapshot`. Under [`LoadPolicy::Repair`] offending references are
/// cleared first; a missing root fails under either policy.
pub fn load(snapshot: TreeSnapshot, policy: LoadPolicy) -> Result<MemberStore> {
    let TreeSnapshot {
        root_id, members, ..
    } = snapshot;

    let members = match policy {
        LoadPolicy::Reject => {
            if let Err(err) = ensure_tree_invariants(&members, root_id) {
                tracing::warn!(%root_id, code = err.code, error = %err.source, "rejected snapshot");
                return Err(err);
            }
            members
        }
        LoadPolicy::Repair => {
            let (members, report) = repair_members(members);
            if !report.is_clean() {
                tracing::warn!(
                    %root_id,
                    dropped_duplicates = report.dropped_duplicates,
                    cleared_partner_refs = report.cleared_partner_refs,
                    cleared_parent_edges = report.cleared_parent_edges,
                    deduplicated_ethnicities = report.deduplicated_ethnicities,
                    "repaired snapshot"
                );
            }
            ensure_tree_invariants(&members, root_id)?;
            members
        }
    };

    let store = MemberStore::from_members(members, root_id)?;
    tracing::info!(%root_id, members = store.len(), "loaded snapshot");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::error::ErrorKind;
    use crate::models::ParentEdge;

    fn id(n: u128) -> MemberId {
        MemberId(Uuid::from_u128(n))
    }

    fn snapshot(members: Vec<Member>, root: u128) -> TreeSnapshot {
        TreeSnapshot {
            format_version: FORMAT_VERSION,
            root_id: id(root),
            members,
            saved_at: Utc::now().naive_utc(),
        }
    }

    fn valid_members() -> Vec<Member> {
        let mut root = Member::new(id(1));
        root.name = "You".to_string();
        root.partner_id = Some(id(2));
        let mut partner = Member::new(id(2));
        partner.partner_id = Some(id(1));
        let mut child = Member::new(id(3));
        child.parent_edge = Some(ParentEdge::child_of(id(1)));
        vec![root, partner, child]
    }

    #[test]
    fn save_then_load_preserves_members_and_order() {
        let store = MemberStore::from_members(valid_members(), id(1)).expect("valid store");
        let raw = save(&store).to_json().expect("encode");
        let decoded = TreeSnapshot::from_json(&raw).expect("decode");
        let loaded = load(decoded, LoadPolicy::Reject).expect("load");

        assert_eq!(loaded.root_id(), id(1));
        assert_eq!(loaded.members(), store.members());
    }

    #[test]
    fn json_uses_camel_case_fields() {
        let store = MemberStore::from_members(valid_members(), id(1)).expect("valid store");
        let value = serde_json::to_value(save(&store)).expect("serialize");
        assert_eq!(value["formatVersion"], json!(1));
        assert_eq!(value["rootId"], json!(id(1).to_string()));
        assert_eq!(value["members"][0]["partnerId"], json!(id(2).to_string()));
        assert_eq!(
            value["members"][2]["parentEdge"],
            json!({ "targetId": id(1).to_string(), "kind": "child" })
        );
        assert!(value.get("savedAt").is_some());
    }

    #[test]
    fn unsupported_version_is_invalid_input() {
        let mut snapshot = snapshot(valid_members(), 1);
        snapshot.format_version = 7;
        let raw = snapshot.to_json_pretty().expect("encode");
        let err = TreeSnapshot::from_json(&raw).expect_err("version 7");
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = TreeSnapshot::from_json("{\"rootId\": 3").expect_err("truncated");
        assert_eq!(err.kind, ErrorKind::Serialization);
    }

    #[test]
    fn reject_policy_refuses_asymmetric_partners() {
        let mut members = valid_members();
        members[1].partner_id = None;
        let err = load(snapshot(members, 1), LoadPolicy::Reject).expect_err("asymmetric");
        assert_eq!(err.kind, ErrorKind::InvariantViolation);
        assert_eq!(err.code, "tree_asymmetric_partner");
    }

    #[test]
    fn repair_policy_clears_bad_references() {
        let mut members = valid_members();
        members[1].partner_id = None;
        members[2].parent_edge = Some(ParentEdge::child_of(id(42)));

        let store = load(snapshot(members, 1), LoadPolicy::Repair).expect("repaired");
        assert_eq!(store.get(id(1)).and_then(|m| m.partner_id), None);
        assert_eq!(store.get(id(3)).and_then(|m| m.parent_edge), None);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn missing_root_fails_under_both_policies() {
        for policy in [LoadPolicy::Reject, LoadPolicy::Repair] {
            let err = load(snapshot(valid_members(), 9), policy).expect_err("missing root");
            assert_eq!(err.code, "tree_missing_root", "policy {}", policy.as_str());
        }
    }
}
