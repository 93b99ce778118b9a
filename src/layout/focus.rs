use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use crate::ir::{FamilyIndex, Gender, Person, PersonId};

/// Ancestors only contribute their other descendants while they are this
/// close to the focused person.
const ANCESTOR_DESCENT_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusPartner {
    pub id: PersonId,
    pub name: String,
    pub gender: Gender,
    pub alive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl FocusPartner {
    fn from_person(person: &Person) -> Self {
        Self {
            id: person.id.clone(),
            name: person.name.clone(),
            gender: person.gender,
            alive: person.alive,
            image_url: person.image_url.clone(),
        }
    }
}

/// One person in the focused view with ancestors above and descendants
/// below, nested.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusNode {
    pub id: PersonId,
    pub name: String,
    pub gender: Gender,
    pub alive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub parents: Vec<FocusNode>,
    pub children: Vec<FocusNode>,
    pub spouses: Vec<FocusPartner>,
}

impl FocusNode {
    /// Number of people nodes in this subtree, partners excluded.
    pub fn size(&self) -> usize {
        1 + self.parents.iter().map(FocusNode::size).sum::<usize>()
            + self.children.iter().map(FocusNode::size).sum::<usize>()
    }
}

/// Builds the ancestor/descendant tree around `root`.
///
/// Nobody appears twice on a single root-to-leaf path, and nesting stops
/// after `max_depth` levels. Returns `None` when `root` is unknown.
pub fn build_focus_tree(people: &[Person], root: &str, max_depth: usize) -> Option<FocusNode> {
    let index = FamilyIndex::new(people);
    focus_node(&index, root, &[], false, max_depth)
}

fn focus_node<'a>(
    index: &FamilyIndex<'a>,
    person_id: &str,
    path: &[&'a str],
    from_ancestor: bool,
    max_depth: usize,
) -> Option<FocusNode> {
    let person = index.get(person_id)?;
    let id = person.id.as_str();
    if path.contains(&id) || path.len() >= max_depth {
        return None;
    }
    let mut path_here = path.to_vec();
    path_here.push(id);

    let spouses = index
        .spouse_of(person)
        .filter(|spouse| !path_here.contains(&spouse.id.as_str()))
        .map(FocusPartner::from_person)
        .into_iter()
        .collect();

    let parents = person
        .parent_ids()
        .filter_map(|parent| focus_node(index, parent.as_str(), &path_here, true, max_depth))
        .collect();

    let children = if !from_ancestor || path.len() < ANCESTOR_DESCENT_LIMIT {
        index
            .children_of(id)
            .into_iter()
            .filter(|child| !path_here.contains(&child.id.as_str()))
            .filter_map(|child| focus_node(index, child.id.as_str(), &path_here, false, max_depth))
            .collect()
    } else {
        Vec::new()
    };

    Some(FocusNode {
        id: person.id.clone(),
        name: person.name.clone(),
        gender: person.gender,
        alive: person.alive,
        image_url: person.image_url.clone(),
        parents,
        children,
        spouses,
    })
}

/// Everyone within `depth` parent, child or spouse hops of `root`, in input
/// order. Empty when `root` is unknown.
pub fn focus_people(people: &[Person], root: &str, depth: usize) -> Vec<Person> {
    let index = FamilyIndex::new(people);
    let Some(start) = index.get(root) else {
        tracing::warn!(root, "focus person not found");
        return Vec::new();
    };

    // spouse links are often recorded on one side only
    let mut partners: HashMap<&str, Vec<&Person>> = HashMap::new();
    for person in index.iter() {
        if let Some(spouse) = index.spouse_of(person) {
            partners.entry(spouse.id.as_str()).or_default().push(person);
        }
    }

    let mut reached: HashSet<&str> = HashSet::from([start.id.as_str()]);
    let mut queue: VecDeque<(&Person, usize)> = VecDeque::from([(start, 0)]);
    while let Some((person, hops)) = queue.pop_front() {
        if hops >= depth {
            continue;
        }
        let id = person.id.as_str();
        let parents = person.parent_ids().filter_map(|p| index.get(p.as_str()));
        let neighbours = parents
            .chain(index.children_of(id))
            .chain(index.spouse_of(person))
            .chain(partners.get(id).into_iter().flatten().copied());
        for next in neighbours {
            if reached.insert(next.id.as_str()) {
                queue.push_back((next, hops + 1));
            }
        }
    }

    let selected: Vec<Person> = index
        .iter()
        .filter(|person| reached.contains(person.id.as_str()))
        .cloned()
        .collect();
    tracing::debug!(root, depth, people = selected.len(), "selected focus neighbourhood");
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(nodes: &[FocusNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.id.as_str()).collect()
    }

    fn lineage() -> Vec<Person> {
        vec![
            Person::new("gg"),
            Person::new("great-aunt").with_father("gg"),
            Person::new("g").with_father("gg"),
            Person::new("uncle").with_father("g"),
            Person::new("p").with_father("g").with_spouse("q"),
            Person::new("q").with_name("Quinn"),
            Person::new("me").with_father("p").with_mother("q"),
            Person::new("sib").with_father("p"),
            Person::new("kid").with_father("me"),
        ]
    }

    #[test]
    fn tree_has_parents_children_and_partner() {
        let tree = build_focus_tree(&lineage(), "p", 16).unwrap();
        assert_eq!(tree.id.as_str(), "p");
        assert_eq!(ids(&tree.parents), vec!["g"]);
        assert_eq!(ids(&tree.children), vec!["me", "sib"]);
        assert_eq!(tree.spouses.len(), 1);
        assert_eq!(tree.spouses[0].name, "Quinn");
        assert_eq!(ids(&tree.children[0].children), vec!["kid"]);
    }

    #[test]
    fn distant_ancestors_do_not_expand_descendants() {
        let tree = build_focus_tree(&lineage(), "me", 16).unwrap();
        let p = &tree.parents[0];
        assert_eq!(p.id.as_str(), "p");
        assert_eq!(ids(&p.children), vec!["sib"]);
        let g = &p.parents[0];
        assert_eq!(ids(&g.children), vec!["uncle"]);
        let gg = &g.parents[0];
        assert_eq!(gg.id.as_str(), "gg");
        assert!(gg.children.is_empty());
    }

    #[test]
    fn cycles_terminate() {
        let people = vec![
            Person::new("a").with_father("b").with_spouse("a"),
            Person::new("b").with_father("a"),
        ];
        let tree = build_focus_tree(&people, "a", 16).unwrap();
        assert!(tree.spouses.is_empty());
        assert_eq!(ids(&tree.parents), vec!["b"]);
        assert!(tree.parents[0].parents.is_empty());
        assert_eq!(tree.size(), 3);
    }

    #[test]
    fn depth_guard_caps_nesting() {
        let tree = build_focus_tree(&lineage(), "me", 2).unwrap();
        assert_eq!(ids(&tree.parents), vec!["p", "q"]);
        assert!(tree.parents.iter().all(|p| p.parents.is_empty()));
    }

    #[test]
    fn unknown_root_has_no_tree() {
        assert!(build_focus_tree(&lineage(), "nobody", 16).is_none());
        assert!(focus_people(&lineage(), "nobody", 2).is_empty());
    }

    #[test]
    fn neighbourhood_follows_links_in_both_directions() {
        let people = lineage();
        let one: Vec<String> = focus_people(&people, "q", 1)
            .iter()
            .map(|p| p.id.to_string())
            .collect();
        // q records no links itself; p and me point at q
        assert_eq!(one, vec!["p", "q", "me"]);

        let zero = focus_people(&people, "q", 0);
        assert_eq!(zero.len(), 1);

        let two: Vec<String> = focus_people(&people, "q", 2)
            .iter()
            .map(|p| p.id.to_string())
            .collect();
        assert_eq!(two, vec!["g", "p", "q", "me", "sib", "kid"]);
    }
}
