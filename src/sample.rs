//! A small demonstration family, built through the public mutation API.

use crate::config::TreeConfig;
use crate::error::Result;
use crate::models::{MemberAttributes, RelativeKind};
use crate::operations::FamilyTree;

const PORTRAIT_BASE: &str = "https://randomuser.me/api/portraits/lego";

fn person(
    name: &str,
    label: &str,
    portrait: u8,
    location: &str,
    ethnicities: &[&str],
) -> MemberAttributes {
    MemberAttributes {
        name: Some(name.to_string()),
        relation_label: Some(label.to_string()),
        image: Some(format!("{PORTRAIT_BASE}/{portrait}.jpg")),
        location: Some(location.to_string()),
        ethnicities: ethnicities.iter().map(|e| e.to_string()).collect(),
        ..MemberAttributes::default()
    }
}

pub fn sample_tree() -> Result<FamilyTree> {
    sample_tree_with_config(TreeConfig::default())
}

/// You, a spouse, two children, a grandparent above you with a son and daughter, and
/// one child under each of them.
pub fn sample_tree_with_config(config: TreeConfig) -> Result<FamilyTree> {
    let mut you = person("You", "Self", 1, "Home", &["Indian (Kerala)", "American"]);
    you.phone = Some("555-1234".to_string());
    you.is_admin = true;
    let mut tree = FamilyTree::with_config(you, config);
    let root = tree.root_id();

    let mut spouse = person("Alex", "Spouse", 2, "Home", &["Irish", "American"]);
    spouse.phone = Some("555-5678".to_string());
    tree.add_relative(root, RelativeKind::Partner, spouse)?;

    let mixed = ["Indian (Kerala)", "Irish", "American"];
    tree.add_relative(root, RelativeKind::Child, person("Taylor", "Child", 4, "School", &mixed))?;
    tree.add_relative(root, RelativeKind::Child, person("Jordan", "Child", 5, "School", &mixed))?;

    let grandparent = tree.add_relative(
        root,
        RelativeKind::ParentUp,
        person("Grandma Jo", "Grandparent", 3, "Farm", &["Indian (Kerala)"]),
    )?;

    let mut sam = person("Sam", "Uncle", 6, "City", &["Indian (Kerala)"]);
    sam.deceased = true;
    let uncle = tree.add_relative(grandparent, RelativeKind::Child, sam)?;
    let aunt = tree.add_relative(
        grandparent,
        RelativeKind::Child,
        person("Linda", "Aunt", 7, "City", &["Irish"]),
    )?;

    tree.add_relative(
        uncle,
        RelativeKind::Child,
        person("Chris", "Cousin", 8, "Town", &["Indian (Kerala)", "Irish"]),
    )?;
    let mut pat = person("Pat", "Cousin", 9, "Town", &["Irish"]);
    pat.deceased = true;
    tree.add_relative(aunt, RelativeKind::Child, pat)?;

    Ok(tree)
}
