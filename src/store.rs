use std::collections::{HashMap, HashSet};

use anyhow::anyhow;

use crate::error::{LibError, Result};
use crate::models::{Member, MemberId};

/// Ordered member collection with an id index and the designated root.
///
/// Every id ever handed out by [`MemberStore::issue_id`] or inserted is remembered,
/// so a deleted member's id is never issued again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberStore {
    members: Vec<Member>,
    index: HashMap<MemberId, usize>,
    root_id: MemberId,
    issued: HashSet<MemberId>,
}

impl MemberStore {
    /// Starts a store holding only `root`, with its structural references cleared.
    pub fn seeded(mut root: Member) -> Self {
        root.partner_id = None;
        root.parent_edge = None;
        let root_id = root.id;
        Self {
            index: HashMap::from([(root_id, 0)]),
            issued: HashSet::from([root_id]),
            members: vec![root],
            root_id,
        }
    }

    /// Rebuilds a store from an ordered member list. Only id uniqueness and root
    /// presence are checked here; edge invariants belong to `invariants`.
    pub fn from_members(members: Vec<Member>, root_id: MemberId) -> Result<Self> {
        let mut index = HashMap::with_capacity(members.len());
        for (position, member) in members.iter().enumerate() {
            if index.insert(member.id, position).is_some() {
                return Err(LibError::invalid_with_code(
                    "duplicate_member_id",
                    "Member IDs must be unique within a tree",
                    anyhow!("duplicate member id {}", member.id),
                ));
            }
        }
        if !index.contains_key(&root_id) {
            return Err(LibError::not_found(
                "Root member not found",
                anyhow!("root member {} is not in the member list", root_id),
            ));
        }

        Ok(Self {
            issued: index.keys().copied().collect(),
            index,
            members,
            root_id,
        })
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn root_id(&self) -> MemberId {
        self.root_id
    }

    pub fn root(&self) -> Option<&Member> {
        self.get(self.root_id)
    }

    pub fn contains(&self, id: MemberId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: MemberId) -> Option<&Member> {
        self.index.get(&id).map(|position| &self.members[*position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Member> + '_ {
        self.members.iter()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn ids(&self) -> impl Iterator<Item = MemberId> + '_ {
        self.members.iter().map(|member| member.id)
    }

    /// Designates a new root. Returns false, leaving the root unchanged, if `id` is absent.
    pub fn set_root(&mut self, id: MemberId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.root_id = id;
        true
    }

    /// Applies `update` to the member in place. Returns false (no-op) if `id` is absent.
    pub fn update<F>(&mut self, id: MemberId, update: F) -> bool
    where
        F: FnOnce(&mut Member),
    {
        match self.index.get(&id) {
            Some(position) => {
                update(&mut self.members[*position]);
                true
            }
            None => false,
        }
    }

    /// Returns an id that is not live and was never issued by this store.
    pub fn issue_id(&mut self) -> MemberId {
        loop {
            let id = MemberId::new_v4();
            if self.issued.insert(id) {
                return id;
            }
        }
    }

    pub(crate) fn insert(&mut self, member: Member) -> Result<()> {
        if self.contains(member.id) {
            return Err(LibError::invalid_with_code(
                "duplicate_member_id",
                "Member IDs must be unique within a tree",
                anyhow!("member {} already exists", member.id),
            ));
        }
        self.issued.insert(member.id);
        self.index.insert(member.id, self.members.len());
        self.members.push(member);
        Ok(())
    }

    /// Removes every listed member in one pass and returns the removed ids in store order.
    /// The root is never removed.
    pub(crate) fn remove_batch(&mut self, ids: &HashSet<MemberId>) -> Vec<MemberId> {
        let mut removed = Vec::with_capacity(ids.len());
        let root_id = self.root_id;
        self.members.retain(|member| {
            if member.id != root_id && ids.contains(&member.id) {
                removed.push(member.id);
                false
            } else {
                true
            }
        });
        self.reindex();
        removed
    }

    fn reindex(&mut self) {
        self.index = self
            .members
            .iter()
            .enumerate()
            .map(|(position, member)| (member.id, position))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::models::ParentEdge;

    fn member(n: u128) -> Member {
        Member::new(MemberId(Uuid::from_u128(n)))
    }

    #[test]
    fn seeded_store_clears_root_edges() {
        let mut root = member(1);
        root.partner_id = Some(MemberId(Uuid::from_u128(2)));
        root.parent_edge = Some(ParentEdge::child_of(MemberId(Uuid::from_u128(3))));

        let store = MemberStore::seeded(root);
        let root = store.root().expect("root exists");
        assert!(root.partner_id.is_none());
        assert!(root.parent_edge.is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn update_is_a_no_op_for_unknown_ids() {
        let mut store = MemberStore::seeded(member(1));
        let before = store.clone();
        assert!(!store.update(MemberId(Uuid::from_u128(99)), |m| m.name = "x".into()));
        assert_eq!(store, before);

        assert!(store.update(MemberId(Uuid::from_u128(1)), |m| m.name = "You".into()));
        assert_eq!(store.root().map(|m| m.name.as_str()), Some("You"));
    }

    #[test]
    fn from_members_rejects_duplicates_and_missing_root() {
        let err = MemberStore::from_members(vec![member(1), member(1)], member(1).id)
            .expect_err("duplicate ids");
        assert_eq!(err.code, "duplicate_member_id");

        let err = MemberStore::from_members(vec![member(1)], member(2).id)
            .expect_err("missing root");
        assert!(err.is_not_found());
    }

    #[test]
    fn remove_batch_keeps_order_and_root() {
        let members = vec![member(1), member(2), member(3), member(4)];
        let mut store = MemberStore::from_members(members, member(1).id).expect("valid store");
        let targets = HashSet::from([member(1).id, member(2).id, member(4).id]);

        let removed = store.remove_batch(&targets);
        assert_eq!(removed, vec![member(2).id, member(4).id]);
        assert_eq!(store.ids().collect::<Vec<_>>(), vec![member(1).id, member(3).id]);
        assert_eq!(store.get(member(3).id).map(|m| m.id), Some(member(3).id));
        assert!(store.get(member(2).id).is_none());
    }

    #[test]
    fn issued_ids_are_never_reused() {
        let mut store = MemberStore::seeded(member(1));
        let issued = store.issue_id();
        store.insert(Member::new(issued)).expect("insert");
        store.remove_batch(&HashSet::from([issued]));
        assert!(!store.contains(issued));
        assert!(store.issued.contains(&issued));
        for _ in 0..32 {
            assert_ne!(store.issue_id(), issued);
        }
    }

    #[test]
    fn set_root_requires_live_member() {
        let mut store =
            MemberStore::from_members(vec![member(1), member(2)], member(1).id).expect("valid");
        assert!(!store.set_root(member(9).id));
        assert_eq!(store.root_id(), member(1).id);
        assert!(store.set_root(member(2).id));
        assert_eq!(store.root_id(), member(2).id);
    }
}
