//! Read-only relationship queries over a [`MemberStore`].
//!
//! Results follow store order and contain each member at most once. An unknown id
//! resolves to an empty result.

use std::collections::HashSet;

use serde::Serialize;

use crate::algorithms::{child_adjacency, reachable_descendants};
use crate::models::{EdgeKind, Member, MemberId};
use crate::store::MemberStore;

/// Members recorded as parents of `id`: anyone added upward with a `parent` edge onto
/// it, plus the target of its own `child` edge.
pub fn parents_of(store: &MemberStore, id: MemberId) -> Vec<&Member> {
    let Some(member) = store.get(id) else {
        return Vec::new();
    };
    let recorded_parent = member
        .parent_edge
        .filter(|edge| edge.kind == EdgeKind::Child)
        .map(|edge| edge.target_id);

    store
        .iter()
        .filter(|candidate| {
            candidate.id != id
                && (candidate.has_edge(id, EdgeKind::Parent)
                    || Some(candidate.id) == recorded_parent)
        })
        .collect()
}

pub fn children_of(store: &MemberStore, id: MemberId) -> Vec<&Member> {
    if !store.contains(id) {
        return Vec::new();
    }
    store
        .iter()
        .filter(|candidate| candidate.id != id && candidate.has_edge(id, EdgeKind::Child))
        .collect()
}

/// Other members whose `child` edge shares this member's recorded parent.
pub fn siblings_of(store: &MemberStore, id: MemberId) -> Vec<&Member> {
    let Some(edge) = store.get(id).and_then(|member| member.parent_edge) else {
        return Vec::new();
    };
    if edge.kind != EdgeKind::Child {
        return Vec::new();
    }
    store
        .iter()
        .filter(|candidate| {
            candidate.id != id && candidate.has_edge(edge.target_id, EdgeKind::Child)
        })
        .collect()
}

pub fn spouse_of(store: &MemberStore, id: MemberId) -> Option<&Member> {
    store
        .get(id)
        .and_then(|member| member.partner_id)
        .filter(|partner_id| *partner_id != id)
        .and_then(|partner_id| store.get(partner_id))
}

pub fn grandparents_of(store: &MemberStore, id: MemberId) -> Vec<&Member> {
    dedup_by_id(
        parents_of(store, id)
            .into_iter()
            .flat_map(|parent| parents_of(store, parent.id)),
    )
}

pub fn aunts_uncles_of(store: &MemberStore, id: MemberId) -> Vec<&Member> {
    dedup_by_id(
        parents_of(store, id)
            .into_iter()
            .flat_map(|parent| siblings_of(store, parent.id)),
    )
}

pub fn cousins_of(store: &MemberStore, id: MemberId) -> Vec<&Member> {
    dedup_by_id(
        aunts_uncles_of(store, id)
            .into_iter()
            .flat_map(|aunt_or_uncle| children_of(store, aunt_or_uncle.id)),
    )
}

/// Transitive closure of [`children_of`], breadth-first, never including `id` itself.
pub fn descendants_of(store: &MemberStore, id: MemberId) -> Vec<MemberId> {
    if !store.contains(id) {
        return Vec::new();
    }
    let adjacency = child_adjacency(store.members());
    reachable_descendants(id, &adjacency)
}

/// Children of the member together with their partner's, each listed once.
pub fn household_children_of(store: &MemberStore, id: MemberId) -> Vec<&Member> {
    with_spouse(store, id, children_of)
}

/// Parents of the member together with their partner's, each listed once.
pub fn household_parents_of(store: &MemberStore, id: MemberId) -> Vec<&Member> {
    with_spouse(store, id, parents_of)
}

fn with_spouse<'a, F>(store: &'a MemberStore, id: MemberId, query: F) -> Vec<&'a Member>
where
    F: Fn(&'a MemberStore, MemberId) -> Vec<&'a Member>,
{
    let own = query(store, id);
    let spouse = spouse_of(store, id)
        .map(|spouse| query(store, spouse.id))
        .unwrap_or_default();
    dedup_by_id(own.into_iter().chain(spouse))
}

fn dedup_by_id<'a, I>(members: I) -> Vec<&'a Member>
where
    I: IntoIterator<Item = &'a Member>,
{
    let mut seen = HashSet::new();
    members
        .into_iter()
        .filter(|member| seen.insert(member.id))
        .collect()
}

/// Every derived relationship of one member, as ids, for a profile view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelativeSummary {
    pub member_id: MemberId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spouse_id: Option<MemberId>,
    pub parent_ids: Vec<MemberId>,
    pub child_ids: Vec<MemberId>,
    pub sibling_ids: Vec<MemberId>,
    pub grandparent_ids: Vec<MemberId>,
    pub aunt_uncle_ids: Vec<MemberId>,
    pub cousin_ids: Vec<MemberId>,
    pub household_parent_ids: Vec<MemberId>,
    pub household_child_ids: Vec<MemberId>,
}

pub fn relatives_of(store: &MemberStore, id: MemberId) -> Option<RelativeSummary> {
    if !store.contains(id) {
        return None;
    }
    let ids = |members: Vec<&Member>| -> Vec<MemberId> {
        members.into_iter().map(|member| member.id).collect()
    };

    Some(RelativeSummary {
        member_id: id,
        spouse_id: spouse_of(store, id).map(|spouse| spouse.id),
        parent_ids: ids(parents_of(store, id)),
        child_ids: ids(children_of(store, id)),
        sibling_ids: ids(siblings_of(store, id)),
        grandparent_ids: ids(grandparents_of(store, id)),
        aunt_uncle_ids: ids(aunts_uncles_of(store, id)),
        cousin_ids: ids(cousins_of(store, id)),
        household_parent_ids: ids(household_parents_of(store, id)),
        household_child_ids: ids(household_children_of(store, id)),
    })
}
