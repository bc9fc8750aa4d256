use std::collections::{HashMap, HashSet};

use anyhow::anyhow;

use crate::algorithms::child_cycle_members;
use crate::error::{LibError, Result};
use crate::models::{EdgeKind, InvariantViolation, Member, MemberId, normalize_ethnicities};

pub fn tree_invariant_violations(
    members: &[Member],
    root_id: MemberId,
) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    let mut partners: HashMap<MemberId, Option<MemberId>> = HashMap::with_capacity(members.len());
    for member in members {
        if partners.insert(member.id, member.partner_id).is_some() {
            violations.push(InvariantViolation::DuplicateMemberId {
                member_id: member.id,
            });
        }
    }

    if !partners.contains_key(&root_id) {
        violations.push(InvariantViolation::MissingRoot { root_id });
    }

    for member in members {
        if let Some(partner_id) = member.partner_id {
            if partner_id == member.id {
                violations.push(InvariantViolation::SelfPartner {
                    member_id: member.id,
                });
            } else {
                match partners.get(&partner_id) {
                    None => violations.push(InvariantViolation::DanglingPartner {
                        member_id: member.id,
                        missing_member_id: partner_id,
                    }),
                    Some(back_reference) if *back_reference != Some(member.id) => {
                        violations.push(InvariantViolation::AsymmetricPartner {
                            member_id: member.id,
                            partner_id,
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        if let Some(edge) = member.parent_edge {
            if edge.target_id == member.id {
                violations.push(InvariantViolation::SelfParentEdge {
                    member_id: member.id,
                });
            } else if !partners.contains_key(&edge.target_id) {
                violations.push(InvariantViolation::DanglingParentEdge {
                    member_id: member.id,
                    missing_member_id: edge.target_id,
                });
            }
        }

        let mut seen = HashSet::with_capacity(member.ethnicities.len());
        for ethnicity in &member.ethnicities {
            if !seen.insert(ethnicity.to_lowercase()) {
                violations.push(InvariantViolation::DuplicateEthnicity {
                    member_id: member.id,
                    ethnicity: ethnicity.clone(),
                });
            }
        }
    }

    let cyclic = child_cycle_members(members);
    if !cyclic.is_empty() {
        violations.push(InvariantViolation::ChildCycle { member_ids: cyclic });
    }

    violations
}

pub fn ensure_tree_invariants(members: &[Member], root_id: MemberId) -> Result<()> {
    let violations = tree_invariant_violations(members, root_id);
    if let Some(first) = violations.first() {
        return Err(LibError::invariant(
            first.error_code(),
            first.public_message(),
            anyhow!("tree invariant validation failed: {:?}", violations),
        ));
    }

    Ok(())
}

/// What [`repair_members`] changed, for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub dropped_duplicates: usize,
    pub cleared_partner_refs: usize,
    pub cleared_parent_edges: usize,
    pub deduplicated_ethnicities: usize,
}

impl RepairReport {
    pub fn is_clean(&self) -> bool {
        self == &Self::default()
    }
}

/// Drops or clears whatever references break the structural invariants. A missing
/// root is left alone: there is nothing sensible to replace it with.
pub fn repair_members(members: Vec<Member>) -> (Vec<Member>, RepairReport) {
    let mut report = RepairReport::default();

    let mut seen = HashSet::with_capacity(members.len());
    let mut members: Vec<Member> = members
        .into_iter()
        .filter(|member| {
            let first = seen.insert(member.id);
            if !first {
                report.dropped_duplicates += 1;
            }
            first
        })
        .collect();

    let partners: HashMap<MemberId, Option<MemberId>> = members
        .iter()
        .map(|member| (member.id, member.partner_id))
        .collect();
    for member in &mut members {
        if let Some(partner_id) = member.partner_id {
            let symmetric = partner_id != member.id
                && partners.get(&partner_id) == Some(&Some(member.id));
            if !symmetric {
                member.partner_id = None;
                report.cleared_partner_refs += 1;
            }
        }
        if let Some(edge) = member.parent_edge {
            if edge.target_id == member.id || !partners.contains_key(&edge.target_id) {
                member.parent_edge = None;
                report.cleared_parent_edges += 1;
            }
        }
        let before = member.ethnicities.len();
        member.ethnicities = normalize_ethnicities(std::mem::take(&mut member.ethnicities));
        report.deduplicated_ethnicities += before - member.ethnicities.len();
    }

    // Clearing the edge of the first member still on a cycle breaks that cycle; repeat
    // until the child-edge graph is a forest.
    loop {
        let cyclic = child_cycle_members(&members);
        let Some(first) = cyclic.first().copied() else {
            break;
        };
        let Some(closing) = first_cycle_member(&members, &cyclic, first) else {
            break;
        };
        if let Some(member) = members.iter_mut().find(|member| member.id == closing) {
            member.parent_edge = None;
            report.cleared_parent_edges += 1;
        }
    }

    (members, report)
}

/// Walks parent references from `start` until a member repeats; that member is on the cycle.
/// Members merely hanging below a cycle are never returned.
fn first_cycle_member(
    members: &[Member],
    cyclic: &[MemberId],
    start: MemberId,
) -> Option<MemberId> {
    let cyclic: HashSet<MemberId> = cyclic.iter().copied().collect();
    let parent_of: HashMap<MemberId, MemberId> = members
        .iter()
        .filter_map(|member| {
            member
                .parent_edge
                .filter(|edge| edge.kind == EdgeKind::Child)
                .map(|edge| (member.id, edge.target_id))
        })
        .collect();

    let mut visited = HashSet::new();
    let mut current = start;
    while cyclic.contains(&current) {
        if !visited.insert(current) {
            return Some(current);
        }
        current = *parent_of.get(&current)?;
    }
    None
}
