use crate::models::{Member, MemberId};
use crate::store::MemberStore;

/// Whether `member` may be offered as the displayed root.
///
/// The current root always qualifies. Anyone else is excluded while another member
/// names them as partner, so a couple contributes a single entry.
pub fn is_root_eligible(store: &MemberStore, member: &Member, current_root_id: MemberId) -> bool {
    if member.id == current_root_id {
        return true;
    }
    !store
        .iter()
        .any(|other| other.id != member.id && other.partner_id == Some(member.id))
}

/// Root candidates in store order.
pub fn root_candidates(store: &MemberStore) -> Vec<&Member> {
    let current_root_id = store.root_id();
    store
        .iter()
        .filter(|member| is_root_eligible(store, member, current_root_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn id(n: u128) -> MemberId {
        MemberId(Uuid::from_u128(n))
    }

    fn couple_store(root: u128) -> MemberStore {
        let mut a = Member::new(id(1));
        a.partner_id = Some(id(2));
        let mut b = Member::new(id(2));
        b.partner_id = Some(id(1));
        MemberStore::from_members(vec![a, b, Member::new(id(3))], id(root)).expect("valid")
    }

    #[test]
    fn current_root_is_always_eligible() {
        let store = couple_store(1);
        let root = store.get(id(1)).expect("root");
        assert!(is_root_eligible(&store, root, id(1)));
    }

    #[test]
    fn partnered_members_are_excluded_unless_root() {
        let store = couple_store(1);
        let candidates: Vec<MemberId> = root_candidates(&store).iter().map(|m| m.id).collect();
        assert_eq!(candidates, vec![id(1), id(3)]);

        let store = couple_store(2);
        let candidates: Vec<MemberId> = root_candidates(&store).iter().map(|m| m.id).collect();
        assert_eq!(candidates, vec![id(2), id(3)]);
    }

    #[test]
    fn one_sided_claim_excludes_only_the_claimed_member() {
        let mut a = Member::new(id(1));
        a.partner_id = Some(id(2));
        let members = vec![Member::new(id(3)), a, Member::new(id(2))];
        let store = MemberStore::from_members(members, id(3)).expect("valid");
        let candidates: Vec<MemberId> = root_candidates(&store).iter().map(|m| m.id).collect();
        assert_eq!(candidates, vec![id(3), id(1)]);
    }
}
