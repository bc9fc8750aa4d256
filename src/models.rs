use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub Uuid);

impl MemberId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MemberId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}

impl From<Uuid> for MemberId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// How a member relates to the target of its single stored edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// The target is this member's parent.
    Child,
    /// The target is this member's child (an ancestor added upward).
    Parent,
    /// The target is this member's parent, shared with the sibling it was added next to.
    Sibling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentEdge {
    pub target_id: MemberId,
    pub kind: EdgeKind,
}

impl ParentEdge {
    pub const fn new(target_id: MemberId, kind: EdgeKind) -> Self {
        Self { target_id, kind }
    }

    pub const fn child_of(parent_id: MemberId) -> Self {
        Self::new(parent_id, EdgeKind::Child)
    }

    pub const fn parent_of(child_id: MemberId) -> Self {
        Self::new(child_id, EdgeKind::Parent)
    }

    pub const fn sibling_under(parent_id: MemberId) -> Self {
        Self::new(parent_id, EdgeKind::Sibling)
    }

    /// The parent this edge records, if the edge points upward.
    pub fn parent_reference(&self) -> Option<MemberId> {
        match self.kind {
            EdgeKind::Child | EdgeKind::Sibling => Some(self.target_id),
            EdgeKind::Parent => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub relation_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub ethnicities: Vec<String>,
    #[serde(default)]
    pub deceased: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<MemberId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_edge: Option<ParentEdge>,
}

impl Member {
    pub fn new(id: MemberId) -> Self {
        Self {
            id,
            name: String::new(),
            relation_label: String::new(),
            image: None,
            location: String::new(),
            phone: String::new(),
            ethnicities: Vec::new(),
            deceased: false,
            is_admin: false,
            partner_id: None,
            parent_edge: None,
        }
    }

    pub fn has_edge(&self, target_id: MemberId, kind: EdgeKind) -> bool {
        self.parent_edge == Some(ParentEdge::new(target_id, kind))
    }

    /// True when either the partner reference or the parent edge points at `id`.
    pub fn references(&self, id: MemberId) -> bool {
        self.partner_id == Some(id) || self.parent_edge.is_some_and(|edge| edge.target_id == id)
    }

    pub fn display_name(&self) -> String {
        let name = self.name.trim();
        if name.is_empty() {
            format!("Member {}", self.id)
        } else {
            name.to_string()
        }
    }

    pub fn image_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        match self.image.as_deref() {
            Some(image) if !image.trim().is_empty() => image,
            _ => placeholder,
        }
    }
}

/// Relationship requested when attaching a new member to an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeKind {
    Child,
    Sibling,
    Partner,
    ParentUp,
    AuntOrUncle,
    Cousin,
    Other,
}

impl RelativeKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            RelativeKind::Child => "child",
            RelativeKind::Sibling => "sibling",
            RelativeKind::Partner => "partner",
            RelativeKind::ParentUp => "parent_up",
            RelativeKind::AuntOrUncle => "aunt_or_uncle",
            RelativeKind::Cousin => "cousin",
            RelativeKind::Other => "other",
        }
    }

    pub const fn default_relation_label(self) -> &'static str {
        match self {
            RelativeKind::Child => "Child",
            RelativeKind::Sibling => "Sibling",
            RelativeKind::Partner => "Spouse",
            RelativeKind::ParentUp => "Grandparent",
            RelativeKind::AuntOrUncle => "Aunt/Uncle",
            RelativeKind::Cousin => "Cousin",
            RelativeKind::Other => "Other",
        }
    }
}

impl fmt::Display for RelativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display attributes supplied when a member is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemberAttributes {
    pub name: Option<String>,
    pub relation_label: Option<String>,
    pub image: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub ethnicities: Vec<String>,
    pub deceased: bool,
    pub is_admin: bool,
}

impl MemberAttributes {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Builds an edge-free member; `fallback_label` is used when no label was supplied.
    pub fn into_member(self, id: MemberId, fallback_label: &str) -> Member {
        let relation_label = self
            .relation_label
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| fallback_label.to_string());

        Member {
            id,
            name: trimmed(self.name),
            relation_label,
            image: self
                .image
                .map(|image| image.trim().to_string())
                .filter(|image| !image.is_empty()),
            location: trimmed(self.location),
            phone: trimmed(self.phone),
            ethnicities: normalize_ethnicities(self.ethnicities),
            deceased: self.deceased,
            is_admin: self.is_admin,
            partner_id: None,
            parent_edge: None,
        }
    }
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Partial attribute edit. Partner and parent links cannot be changed through it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemberPatch {
    pub name: Option<String>,
    pub relation_label: Option<String>,
    /// `Some(None)` clears the image.
    pub image: Option<Option<String>>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub ethnicities: Option<Vec<String>>,
    pub deceased: Option<bool>,
    pub is_admin: Option<bool>,
}

impl MemberPatch {
    pub fn apply(self, member: &mut Member) {
        if let Some(name) = self.name {
            member.name = name;
        }
        if let Some(label) = self.relation_label {
            member.relation_label = label;
        }
        if let Some(image) = self.image {
            member.image = image.filter(|image| !image.trim().is_empty());
        }
        if let Some(location) = self.location {
            member.location = location;
        }
        if let Some(phone) = self.phone {
            member.phone = phone;
        }
        if let Some(ethnicities) = self.ethnicities {
            member.ethnicities = normalize_ethnicities(ethnicities);
        }
        if let Some(deceased) = self.deceased {
            member.deceased = deceased;
        }
        if let Some(is_admin) = self.is_admin {
            member.is_admin = is_admin;
        }
    }
}

/// Uppercases the first character of every word, including one that follows `(`.
pub fn capitalize_ethnicity(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut previous_is_word = false;
    for ch in value.trim().chars() {
        let is_word = ch.is_alphanumeric() || ch == '_';
        if is_word && !previous_is_word {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        previous_is_word = is_word;
    }
    out
}

pub fn contains_ethnicity(existing: &[String], candidate: &str) -> bool {
    let candidate = candidate.to_lowercase();
    existing
        .iter()
        .any(|value| value.to_lowercase() == candidate)
}

/// Capitalizes, drops blanks, and removes case-insensitive duplicates (first one wins).
pub fn normalize_ethnicities(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(values.len());
    values
        .into_iter()
        .map(|value| capitalize_ethnicity(&value))
        .filter(|value| !value.is_empty())
        .filter(|value| seen.insert(value.to_lowercase()))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InvariantViolation {
    DuplicateMemberId {
        member_id: MemberId,
    },
    SelfPartner {
        member_id: MemberId,
    },
    SelfParentEdge {
        member_id: MemberId,
    },
    DanglingPartner {
        member_id: MemberId,
        missing_member_id: MemberId,
    },
    AsymmetricPartner {
        member_id: MemberId,
        partner_id: MemberId,
    },
    DanglingParentEdge {
        member_id: MemberId,
        missing_member_id: MemberId,
    },
    ChildCycle {
        member_ids: Vec<MemberId>,
    },
    MissingRoot {
        root_id: MemberId,
    },
    DuplicateEthnicity {
        member_id: MemberId,
        ethnicity: String,
    },
}

impl InvariantViolation {
    pub const fn error_code(&self) -> &'static str {
        match self {
            InvariantViolation::DuplicateMemberId { .. } => "tree_duplicate_member_id",
            InvariantViolation::SelfPartner { .. } => "tree_self_partner",
            InvariantViolation::SelfParentEdge { .. } => "tree_self_parent_edge",
            InvariantViolation::DanglingPartner { .. } => "tree_dangling_partner",
            InvariantViolation::AsymmetricPartner { .. } => "tree_asymmetric_partner",
            InvariantViolation::DanglingParentEdge { .. } => "tree_dangling_parent_edge",
            InvariantViolation::ChildCycle { .. } => "tree_child_cycle",
            InvariantViolation::MissingRoot { .. } => "tree_missing_root",
            InvariantViolation::DuplicateEthnicity { .. } => "tree_duplicate_ethnicity",
        }
    }

    pub const fn public_message(&self) -> &'static str {
        match self {
            InvariantViolation::DuplicateMemberId { .. } => "Member IDs must be unique",
            InvariantViolation::SelfPartner { .. } => "A member cannot be their own partner",
            InvariantViolation::SelfParentEdge { .. } => "A member cannot be linked to themselves",
            InvariantViolation::DanglingPartner { .. } => {
                "Partner reference points at a member that does not exist"
            }
            InvariantViolation::AsymmetricPartner { .. } => {
                "Partner references must point at each other"
            }
            InvariantViolation::DanglingParentEdge { .. } => {
                "Family link points at a member that does not exist"
            }
            InvariantViolation::ChildCycle { .. } => "Parent and child links must not form a loop",
            InvariantViolation::MissingRoot { .. } => "The tree root must be an existing member",
            InvariantViolation::DuplicateEthnicity { .. } => {
                "Ethnicities must not repeat for a member"
            }
        }
    }
}
