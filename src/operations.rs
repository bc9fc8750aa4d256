use std::collections::HashSet;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::config::TreeConfig;
use crate::error::{LibError, Result};
use crate::invariants;
use crate::models::{
    Member, MemberAttributes, MemberId, MemberPatch, ParentEdge, RelativeKind,
    capitalize_ethnicity, contains_ethnicity,
};
use crate::resolver::{self, RelativeSummary};
use crate::root;
use crate::snapshot::{self, TreeSnapshot};
use crate::store::MemberStore;

pub const ROOT_RELATION_LABEL: &str = "Self";

/// High-level tree actions, one per user gesture.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum TreeOperation {
    AddRelative {
        anchor_id: MemberId,
        kind: RelativeKind,
        #[serde(default)]
        attributes: MemberAttributes,
    },
    RemoveMember {
        member_id: MemberId,
    },
    UpdateMember {
        member_id: MemberId,
        patch: MemberPatch,
    },
    ToggleDeceased {
        member_id: MemberId,
    },
    AddEthnicity {
        member_id: MemberId,
        ethnicity: String,
    },
    SetRoot {
        member_id: MemberId,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TreeOperationResult {
    Added { member_id: MemberId },
    Removed { report: RemovalReport },
    Updated { member_id: MemberId },
    DeceasedToggled { member_id: MemberId, deceased: bool },
    EthnicityAdded { member_id: MemberId, added: bool },
    RootChanged { root_id: MemberId },
}

/// Outcome of a cascading delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalReport {
    /// Removed ids in their former store order.
    pub removed_ids: Vec<MemberId>,
    /// Surviving members whose partner reference or parent edge was cleared.
    pub detached_ids: Vec<MemberId>,
}

/// Creates a member attached to `anchor_id` and returns the resulting store with the new id.
/// `store` itself is never modified.
pub fn add_relative(
    store: &MemberStore,
    anchor_id: MemberId,
    kind: RelativeKind,
    attributes: MemberAttributes,
) -> Result<(MemberStore, MemberId)> {
    let anchor = store.get(anchor_id).ok_or_else(|| {
        LibError::not_found(
            "Member not found",
            anyhow!("anchor member {} does not exist", anchor_id),
        )
    })?;

    let edge = match kind {
        RelativeKind::Partner => {
            if let Some(partner_id) = anchor.partner_id {
                return Err(LibError::invalid_operation(
                    "already_partnered",
                    "Member already has a partner",
                    anyhow!("member {} is already partnered with {}", anchor_id, partner_id),
                ));
            }
            None
        }
        RelativeKind::Child | RelativeKind::Other => Some(ParentEdge::child_of(anchor_id)),
        RelativeKind::ParentUp => Some(ParentEdge::parent_of(anchor_id)),
        RelativeKind::Sibling => {
            let parent_id = anchor
                .parent_edge
                .and_then(|edge| edge.parent_reference())
                .ok_or_else(|| {
                    LibError::invalid_operation(
                        "no_shared_parent",
                        "Add a parent before adding a sibling",
                        anyhow!("member {} records no parent to share", anchor_id),
                    )
                })?;
            Some(ParentEdge::sibling_under(parent_id))
        }
        RelativeKind::AuntOrUncle => {
            // A parent holding a `sibling` edge still yields the grandparent here, but
            // `aunts_uncles_of` only follows `child` edges, so the new member is not listed
            // among the anchor's aunts and uncles.
            let grandparent_id = resolver::parents_of(store, anchor_id)
                .into_iter()
                .find_map(|parent| parent.parent_edge.and_then(|edge| edge.parent_reference()))
                .ok_or_else(|| {
                    LibError::invalid_operation(
                        "no_resolvable_parent",
                        "Add a parent with a known parent before adding an aunt or uncle",
                        anyhow!("no parent of member {} records a parent of its own", anchor_id),
                    )
                })?;
            Some(ParentEdge::child_of(grandparent_id))
        }
        RelativeKind::Cousin => {
            let aunt_or_uncle_id = resolver::aunts_uncles_of(store, anchor_id)
                .first()
                .map(|member| member.id)
                .ok_or_else(|| {
                    LibError::invalid_operation(
                        "no_resolvable_aunt_or_uncle",
                        "Add an aunt or uncle before adding a cousin",
                        anyhow!("member {} has no aunts or uncles", anchor_id),
                    )
                })?;
            Some(ParentEdge::child_of(aunt_or_uncle_id))
        }
    };

    let mut next = store.clone();
    let member_id = next.issue_id();
    let mut member = attributes.into_member(member_id, kind.default_relation_label());
    member.parent_edge = edge;
    if kind == RelativeKind::Partner {
        member.partner_id = Some(anchor_id);
    }
    next.insert(member)?;
    if kind == RelativeKind::Partner {
        next.update(anchor_id, |anchor| anchor.partner_id = Some(member_id));
    }

    Ok((next, member_id))
}

/// Removes `member_id`, its descendants, and its partner, then clears any surviving
/// reference into the removed set. The partner's own children stay, detached.
/// `store` itself is never modified.
pub fn remove_member_cascade(
    store: &MemberStore,
    member_id: MemberId,
) -> Result<(MemberStore, RemovalReport)> {
    let root_id = store.root_id();
    if member_id == root_id {
        return Err(LibError::invalid_operation(
            "cannot_delete_root",
            "Can't delete the root member",
            anyhow!("member {} is the tree root", member_id),
        ));
    }
    let member = store.get(member_id).ok_or_else(|| {
        LibError::not_found(
            "Member not found",
            anyhow!("member {} does not exist", member_id),
        )
    })?;

    let mut doomed: HashSet<MemberId> = HashSet::from([member_id]);
    doomed.extend(resolver::descendants_of(store, member_id));
    if let Some(partner_id) = member.partner_id.filter(|id| store.contains(*id)) {
        if partner_id == root_id {
            tracing::debug!(%member_id, %partner_id, "partner is the root; keeping it");
        } else {
            doomed.insert(partner_id);
        }
    }
    if doomed.contains(&root_id) {
        return Err(LibError::invalid_operation(
            "cannot_delete_root_ancestor",
            "Can't delete a member whose removal would remove the root member",
            anyhow!("root {} descends from member {}", root_id, member_id),
        ));
    }

    let mut next = store.clone();
    let removed_ids = next.remove_batch(&doomed);
    let detached_ids = detach_references(&mut next, &doomed);

    Ok((
        next,
        RemovalReport {
            removed_ids,
            detached_ids,
        },
    ))
}

fn detach_references(store: &mut MemberStore, removed: &HashSet<MemberId>) -> Vec<MemberId> {
    let affected: Vec<MemberId> = store
        .iter()
        .filter(|member| {
            member.partner_id.is_some_and(|id| removed.contains(&id))
                || member
                    .parent_edge
                    .is_some_and(|edge| removed.contains(&edge.target_id))
        })
        .map(|member| member.id)
        .collect();

    for id in &affected {
        store.update(*id, |member| {
            if member.partner_id.is_some_and(|id| removed.contains(&id)) {
                member.partner_id = None;
            }
            if member
                .parent_edge
                .is_some_and(|edge| removed.contains(&edge.target_id))
            {
                member.parent_edge = None;
            }
        });
    }

    affected
}

/// Owns the member store and applies every mutation as a whole-store swap.
#[derive(Debug, Clone)]
pub struct FamilyTree {
    store: MemberStore,
    config: TreeConfig,
}

impl FamilyTree {
    /// Starts a tree with a single edge-free root member.
    pub fn new(root: MemberAttributes) -> Self {
        Self::with_config(root, TreeConfig::default())
    }

    pub fn with_config(root: MemberAttributes, config: TreeConfig) -> Self {
        let root = root.into_member(MemberId::new_v4(), ROOT_RELATION_LABEL);
        Self {
            store: MemberStore::seeded(root),
            config,
        }
    }

    pub fn load(snapshot: TreeSnapshot, config: TreeConfig) -> Result<Self> {
        let store = snapshot::load(snapshot, config.load_policy)?;
        Ok(Self { store, config })
    }

    pub fn save(&self) -> TreeSnapshot {
        snapshot::save(&self.store)
    }

    pub fn store(&self) -> &MemberStore {
        &self.store
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn root_id(&self) -> MemberId {
        self.store.root_id()
    }

    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.store.get(id)
    }

    pub fn execute(&mut self, operation: TreeOperation) -> Result<TreeOperationResult> {
        match operation {
            TreeOperation::AddRelative {
                anchor_id,
                kind,
                attributes,
            } => {
                let member_id = self.add_relative(anchor_id, kind, attributes)?;
                Ok(TreeOperationResult::Added { member_id })
            }
            TreeOperation::RemoveMember { member_id } => {
                let report = self.remove_member_cascade(member_id)?;
                Ok(TreeOperationResult::Removed { report })
            }
            TreeOperation::UpdateMember { member_id, patch } => {
                self.update_member(member_id, patch)?;
                Ok(TreeOperationResult::Updated { member_id })
            }
            TreeOperation::ToggleDeceased { member_id } => {
                let deceased = self.toggle_deceased(member_id)?;
                Ok(TreeOperationResult::DeceasedToggled {
                    member_id,
                    deceased,
                })
            }
            TreeOperation::AddEthnicity {
                member_id,
                ethnicity,
            } => {
                let added = self.add_ethnicity(member_id, &ethnicity)?;
                Ok(TreeOperationResult::EthnicityAdded { member_id, added })
            }
            TreeOperation::SetRoot { member_id } => {
                self.set_root(member_id)?;
                Ok(TreeOperationResult::RootChanged { root_id: member_id })
            }
        }
    }

    pub fn add_relative(
        &mut self,
        anchor_id: MemberId,
        kind: RelativeKind,
        attributes: MemberAttributes,
    ) -> Result<MemberId> {
        match add_relative(&self.store, anchor_id, kind, attributes) {
            Ok((next, member_id)) => {
                self.commit(next);
                tracing::info!(%member_id, %anchor_id, %kind, "added relative");
                Ok(member_id)
            }
            Err(err) => {
                tracing::warn!(
                    %anchor_id,
                    %kind,
                    code = err.code,
                    error = %err.source,
                    "add relative rejected"
                );
                Err(err)
            }
        }
    }

    pub fn remove_member_cascade(&mut self, member_id: MemberId) -> Result<RemovalReport> {
        match remove_member_cascade(&self.store, member_id) {
            Ok((next, report)) => {
                self.commit(next);
                tracing::info!(
                    %member_id,
                    removed = report.removed_ids.len(),
                    detached = report.detached_ids.len(),
                    "removed member cascade"
                );
                tracing::debug!(
                    detached = ?report.detached_ids,
                    "cleared references into removed members"
                );
                Ok(report)
            }
            Err(err) => {
                tracing::warn!(
                    %member_id,
                    code = err.code,
                    error = %err.source,
                    "remove member rejected"
                );
                Err(err)
            }
        }
    }

    /// Edits display attributes only; partner and parent links are never touched.
    pub fn update_member(&mut self, member_id: MemberId, patch: MemberPatch) -> Result<()> {
        if self.store.update(member_id, |member| patch.apply(member)) {
            Ok(())
        } else {
            Err(missing_member(member_id))
        }
    }

    /// Flips the deceased flag and returns its new value.
    pub fn toggle_deceased(&mut self, member_id: MemberId) -> Result<bool> {
        let mut deceased = false;
        if self.store.update(member_id, |member| {
            member.deceased = !member.deceased;
            deceased = member.deceased;
        }) {
            Ok(deceased)
        } else {
            Err(missing_member(member_id))
        }
    }

    /// Returns false when the value is blank or already present ignoring case.
    pub fn add_ethnicity(&mut self, member_id: MemberId, ethnicity: &str) -> Result<bool> {
        let formatted = capitalize_ethnicity(ethnicity);
        let mut added = false;
        let found = self.store.update(member_id, |member| {
            if !formatted.is_empty() && !contains_ethnicity(&member.ethnicities, &formatted) {
                member.ethnicities.push(formatted);
                added = true;
            }
        });
        if found {
            Ok(added)
        } else {
            Err(missing_member(member_id))
        }
    }

    /// Removes the ethnicity at `index`; an out-of-range index changes nothing.
    pub fn remove_ethnicity(
        &mut self,
        member_id: MemberId,
        index: usize,
    ) -> Result<Option<String>> {
        let mut removed = None;
        let found = self.store.update(member_id, |member| {
            if index < member.ethnicities.len() {
                removed = Some(member.ethnicities.remove(index));
            }
        });
        if found {
            Ok(removed)
        } else {
            Err(missing_member(member_id))
        }
    }

    pub fn remove_last_ethnicity(&mut self, member_id: MemberId) -> Result<Option<String>> {
        let mut removed = None;
        let found = self.store.update(member_id, |member| {
            removed = member.ethnicities.pop();
        });
        if found {
            Ok(removed)
        } else {
            Err(missing_member(member_id))
        }
    }

    pub fn set_root(&mut self, member_id: MemberId) -> Result<()> {
        if self.store.set_root(member_id) {
            tracing::info!(root_id = %member_id, "changed tree root");
            Ok(())
        } else {
            Err(missing_member(member_id))
        }
    }

    pub fn root_candidates(&self) -> Vec<&Member> {
        root::root_candidates(&self.store)
    }

    pub fn relatives_of(&self, member_id: MemberId) -> Option<RelativeSummary> {
        resolver::relatives_of(&self.store, member_id)
    }

    /// The member's image, or the configured placeholder.
    pub fn image_for<'a>(&'a self, member: &'a Member) -> &'a str {
        member.image_or(&self.config.placeholder_image)
    }

    fn commit(&mut self, next: MemberStore) {
        debug_assert!(
            invariants::tree_invariant_violations(next.members(), next.root_id()).is_empty(),
            "mutation produced an invalid tree"
        );
        self.store = next;
    }
}

fn missing_member(member_id: MemberId) -> LibError {
    LibError::not_found(
        "Member not found",
        anyhow!("member {} does not exist", member_id),
    )
}
