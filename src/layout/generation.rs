use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::config::LayoutConfig;
use crate::ir::{FamilyIndex, Person, PersonId};

/// Assigns every person a relative generation (0 = root generation,
/// negative for ancestors, positive for descendants).
pub fn compute_generations(people: &[Person]) -> BTreeMap<PersonId, i32> {
    let index = FamilyIndex::new(people);
    generation_levels(&index, LayoutConfig::default().iteration_factor)
}

/// People with no recorded parents. When nobody or everybody qualifies the
/// earliest-born person is used instead, then simply the first record.
fn select_roots<'a>(index: &FamilyIndex<'a>) -> Vec<&'a Person> {
    let candidates: Vec<&'a Person> = index.iter().filter(|p| !p.has_parent_refs()).collect();
    if !candidates.is_empty() && candidates.len() < index.len() {
        return candidates;
    }
    index
        .iter()
        .filter(|p| p.birth_date.is_some())
        .min_by_key(|p| p.birth_date)
        .or_else(|| index.iter().next())
        .into_iter()
        .collect()
}

pub(crate) fn generation_levels(
    index: &FamilyIndex<'_>,
    iteration_factor: usize,
) -> BTreeMap<PersonId, i32> {
    if index.is_empty() {
        return BTreeMap::new();
    }

    let mut levels: HashMap<&str, i32> = HashMap::with_capacity(index.len());
    let mut visited: HashSet<&str> = HashSet::with_capacity(index.len());
    let mut queue: VecDeque<(&Person, i32)> = VecDeque::new();
    for root in select_roots(index) {
        if visited.insert(root.id.as_str()) {
            queue.push_back((root, 0));
        }
    }

    let cap = iteration_factor.max(1).saturating_mul(index.len());
    let mut iterations = 0usize;
    while let Some((person, level)) = queue.pop_front() {
        if iterations >= cap {
            tracing::warn!(
                cap,
                pending = queue.len() + 1,
                "generation traversal hit its iteration cap"
            );
            break;
        }
        iterations += 1;
        levels.insert(person.id.as_str(), level);

        for child in index.children_of(person.id.as_str()) {
            if visited.insert(child.id.as_str()) {
                queue.push_back((child, level + 1));
            }
        }
        for parent_id in person.parent_ids() {
            let Some(parent) = index.get(parent_id.as_str()) else {
                continue;
            };
            if visited.insert(parent.id.as_str()) {
                queue.push_back((parent, level - 1));
            }
        }
    }

    // Stragglers get one inference attempt from already-leveled relatives.
    for person in index.iter() {
        let id = person.id.as_str();
        if levels.contains_key(id) {
            continue;
        }
        let inferred = index
            .children_of(id)
            .iter()
            .find_map(|child| levels.get(child.id.as_str()).map(|level| level - 1))
            .or_else(|| {
                person
                    .parent_ids()
                    .find_map(|parent| levels.get(parent.as_str()).map(|level| level + 1))
            })
            .unwrap_or(0);
        levels.insert(id, inferred);
    }

    levels
        .into_iter()
        .map(|(id, level)| (PersonId::new(id), level))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(levels: &BTreeMap<PersonId, i32>, id: &str) -> i32 {
        levels[id]
    }

    #[test]
    fn parent_and_child_levels() {
        let people = vec![
            Person::new("a").with_birth_date("1950-01-01"),
            Person::new("b").with_father("a").with_birth_date("1975-01-01"),
        ];
        let levels = compute_generations(&people);
        assert_eq!(level(&levels, "a"), 0);
        assert_eq!(level(&levels, "b"), 1);
    }

    #[test]
    fn ancestors_of_other_roots_go_negative() {
        // r is the only root; c's mother line climbs above r's generation.
        let people = vec![
            Person::new("r"),
            Person::new("c").with_father("r").with_mother("m"),
            Person::new("m").with_father("g"),
            Person::new("g").with_father("missing"),
        ];
        let levels = compute_generations(&people);
        assert_eq!(level(&levels, "r"), 0);
        assert_eq!(level(&levels, "c"), 1);
        assert_eq!(level(&levels, "m"), 0);
        assert_eq!(level(&levels, "g"), -1);
    }

    #[test]
    fn fully_cyclic_input_falls_back_to_earliest_born() {
        let people = vec![
            Person::new("a").with_father("b").with_birth_date("1990"),
            Person::new("b").with_father("a").with_birth_date("1960"),
        ];
        let levels = compute_generations(&people);
        assert_eq!(level(&levels, "b"), 0);
        assert_eq!(level(&levels, "a"), 1);
    }

    #[test]
    fn self_parent_terminates() {
        let people = vec![Person::new("x").with_father("x")];
        let levels = compute_generations(&people);
        assert_eq!(levels.len(), 1);
        assert_eq!(level(&levels, "x"), 0);
    }

    #[test]
    fn stragglers_infer_from_leveled_relatives() {
        // Everyone has parents, so the earliest-born (p) is the only seed.
        // q's father is dangling, so q is only reachable through inference.
        let people = vec![
            Person::new("p").with_father("ghost").with_birth_date("1900"),
            Person::new("k").with_father("p"),
            Person::new("q").with_father("nobody"),
        ];
        let levels = compute_generations(&people);
        assert_eq!(level(&levels, "p"), 0);
        assert_eq!(level(&levels, "k"), 1);
        assert_eq!(level(&levels, "q"), 0);
    }

    #[test]
    fn empty_input_yields_no_levels() {
        assert!(compute_generations(&[]).is_empty());
    }
}
