pub mod algorithms;
pub mod config;
pub mod error;
pub mod invariants;
pub mod models;
pub mod operations;
pub mod resolver;
pub mod root;
pub mod sample;
pub mod shared;
pub mod snapshot;
pub mod store;

pub mod prelude {
    pub use crate::config::{LoadPolicy, TreeConfig};
    pub use crate::error::{ErrorKind, LibError, Result};
    pub use crate::invariants::{RepairReport, ensure_tree_invariants, tree_invariant_violations};
    pub use crate::models::{
        EdgeKind, InvariantViolation, Member, MemberAttributes, MemberId, MemberPatch, ParentEdge,
        RelativeKind,
    };
    pub use crate::operations::{FamilyTree, RemovalReport, TreeOperation, TreeOperationResult};
    pub use crate::resolver::{
        RelativeSummary, aunts_uncles_of, children_of, cousins_of, descendants_of,
        grandparents_of, household_children_of, household_parents_of, parents_of, relatives_of,
        siblings_of, spouse_of,
    };
    pub use crate::root::{is_root_eligible, root_candidates};
    pub use crate::sample::sample_tree;
    pub use crate::shared::SharedFamilyTree;
    pub use crate::snapshot::TreeSnapshot;
    pub use crate::store::MemberStore;
}
