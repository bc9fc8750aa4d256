use std::collections::{HashMap, HashSet, VecDeque};

use crate::models::{EdgeKind, Member, MemberId};

/// Parent id -> ids of members holding a `child` edge to it, in collection order.
pub fn child_adjacency(members: &[Member]) -> HashMap<MemberId, Vec<MemberId>> {
    let known: HashSet<MemberId> = members.iter().map(|member| member.id).collect();
    let mut adjacency: HashMap<MemberId, Vec<MemberId>> = HashMap::with_capacity(members.len());
    for member in members {
        adjacency.entry(member.id).or_default();
    }
    for member in members {
        let Some(edge) = member.parent_edge else {
            continue;
        };
        if edge.kind != EdgeKind::Child || !known.contains(&edge.target_id) {
            // Dangling or non-child edge.
            continue;
        }
        adjacency.entry(edge.target_id).or_default().push(member.id);
    }
    adjacency
}

/// Every id reachable from `start` over child edges, breadth-first, excluding `start`.
/// The visited set keeps this finite on cyclic input.
pub fn reachable_descendants(
    start: MemberId,
    adjacency: &HashMap<MemberId, Vec<MemberId>>,
) -> Vec<MemberId> {
    let mut visited = HashSet::from([start]);
    let mut ordered = Vec::new();
    let mut queue = VecDeque::from([start]);

    while let Some(member_id) = queue.pop_front() {
        if let Some(children) = adjacency.get(&member_id) {
            for child in children {
                if visited.insert(*child) {
                    ordered.push(*child);
                    queue.push_back(*child);
                }
            }
        }
    }

    ordered
}

/// Members left over after Kahn's algorithm on the child-edge graph, i.e. those on a
/// cycle or hanging below one. Returned in collection order.
pub fn child_cycle_members(members: &[Member]) -> Vec<MemberId> {
    let adjacency = child_adjacency(members);
    let mut indegree: HashMap<MemberId, usize> =
        members.iter().map(|member| (member.id, 0)).collect();
    for children in adjacency.values() {
        for child in children {
            if let Some(degree) = indegree.get_mut(child) {
                *degree += 1;
            }
        }
    }

    let mut queue: VecDeque<MemberId> = members
        .iter()
        .filter(|member| indegree.get(&member.id) == Some(&0))
        .map(|member| member.id)
        .collect();
    let mut resolved = HashSet::with_capacity(members.len());
    while let Some(member_id) = queue.pop_front() {
        resolved.insert(member_id);
        if let Some(children) = adjacency.get(&member_id) {
            for child in children {
                if let Some(degree) = indegree.get_mut(child) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(*child);
                    }
                }
            }
        }
    }

    members
        .iter()
        .map(|member| member.id)
        .filter(|member_id| !resolved.contains(member_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::models::ParentEdge;

    fn id(n: u128) -> MemberId {
        MemberId(Uuid::from_u128(n))
    }

    fn member(n: u128, parent: Option<u128>) -> Member {
        let mut member = Member::new(id(n));
        member.parent_edge = parent.map(|p| ParentEdge::child_of(id(p)));
        member
    }

    #[test]
    fn descendants_follow_child_edges_only() {
        let mut upward = Member::new(id(9));
        upward.parent_edge = Some(ParentEdge::parent_of(id(1)));
        let members = vec![
            member(1, None),
            member(2, Some(1)),
            member(3, Some(2)),
            member(4, Some(1)),
            upward,
        ];
        let adjacency = child_adjacency(&members);
        assert_eq!(
            reachable_descendants(id(1), &adjacency),
            vec![id(2), id(4), id(3)]
        );
        assert!(reachable_descendants(id(3), &adjacency).is_empty());
    }

    #[test]
    fn dangling_edges_are_skipped() {
        let members = vec![member(1, None), member(2, Some(42))];
        let adjacency = child_adjacency(&members);
        assert!(!adjacency.contains_key(&id(42)));
        assert!(child_cycle_members(&members).is_empty());
    }

    #[test]
    fn cyclic_input_terminates_and_is_detected() {
        let members = vec![
            member(1, Some(3)),
            member(2, Some(1)),
            member(3, Some(2)),
            member(4, Some(3)),
        ];
        let adjacency = child_adjacency(&members);
        let reached = reachable_descendants(id(1), &adjacency);
        assert_eq!(reached, vec![id(2), id(3), id(4)]);
        assert_eq!(child_cycle_members(&members), vec![id(1), id(2), id(3), id(4)]);
    }

    #[test]
    fn forest_has_no_cycle() {
        let members = vec![
            member(1, None),
            member(2, Some(1)),
            member(3, None),
            member(4, Some(3)),
        ];
        assert!(child_cycle_members(&members).is_empty());
    }
}
