use std::collections::{HashMap, HashSet};

use crate::config::LayoutConfig;
use crate::ir::FamilyIndex;

/// Horizontal footprint of a person's descendant subtree.
///
/// Partners sit flush against each other, so a couple is two node widths.
/// Children rows are separated by `sibling_gap`. The visited path is copied
/// on every descent and the walk stops after `max_depth` path entries, so the
/// estimate is finite for cyclic input and never mutates anything.
pub fn subtree_width<'a>(
    index: &FamilyIndex<'a>,
    person_id: &str,
    visited_path: &HashSet<&'a str>,
    max_depth: usize,
    config: &LayoutConfig,
) -> f32 {
    WidthEstimator::new(index, config, max_depth).width(person_id, visited_path)
}

#[derive(Debug, Clone, Copy)]
struct Measured {
    width: f32,
    /// Shallowest path position of a person the walk had to skip because it
    /// was already on the path. `usize::MAX` when nothing was skipped.
    lowest_hit: usize,
}

impl Measured {
    fn clean(width: f32) -> Self {
        Self {
            width,
            lowest_hit: usize::MAX,
        }
    }
}

/// Subtree widths memoized by person and remaining depth budget.
///
/// A width is only cached when every person the walk skipped was entered
/// below the measured person, so the cached value does not depend on how
/// the walk got there. Shared people in dense pedigrees are then measured
/// once per depth instead of once per path.
pub(crate) struct WidthEstimator<'i, 'a> {
    index: &'i FamilyIndex<'a>,
    config: &'i LayoutConfig,
    max_depth: usize,
    memo: HashMap<(&'a str, usize), f32>,
    evaluations: usize,
}

impl<'i, 'a> WidthEstimator<'i, 'a> {
    pub(crate) fn new(index: &'i FamilyIndex<'a>, config: &'i LayoutConfig, max_depth: usize) -> Self {
        Self {
            index,
            config,
            max_depth,
            memo: HashMap::new(),
            evaluations: 0,
        }
    }

    pub(crate) fn width(&mut self, person_id: &str, visited_path: &HashSet<&'a str>) -> f32 {
        // callers' path entries all sit above the measured person
        let path: HashMap<&'a str, usize> = visited_path.iter().map(|&id| (id, 0)).collect();
        self.measure(person_id, &path).width
    }

    fn measure(&mut self, person_id: &str, path: &HashMap<&'a str, usize>) -> Measured {
        let base = self.config.node_width;
        let Some(person) = self.index.get(person_id) else {
            return Measured::clean(base);
        };
        let id = person.id.as_str();
        if let Some(&position) = path.get(id) {
            return Measured {
                width: base,
                lowest_hit: position,
            };
        }
        let depth = path.len();
        if depth >= self.max_depth {
            return Measured::clean(base);
        }
        let key = (id, self.max_depth - depth);
        if let Some(&width) = self.memo.get(&key) {
            return Measured::clean(width);
        }
        self.evaluations += 1;

        let mut lowest_hit = usize::MAX;
        let mut path_here = path.clone();
        path_here.insert(id, depth);

        let mut own = base;
        let mut partner = None;
        if let Some(spouse) = self.index.spouse_of(person) {
            match path_here.get(spouse.id.as_str()) {
                Some(&position) => lowest_hit = lowest_hit.min(position),
                None => {
                    own += base;
                    path_here.insert(spouse.id.as_str(), depth + 1);
                    partner = Some(spouse);
                }
            }
        }

        let mut row = 0.0;
        let mut count = 0usize;
        for child in self.index.couple_children(person, partner) {
            if let Some(&position) = path_here.get(child.id.as_str()) {
                lowest_hit = lowest_hit.min(position);
                continue;
            }
            let measured = self.measure(child.id.as_str(), &path_here);
            lowest_hit = lowest_hit.min(measured.lowest_hit);
            row += measured.width;
            count += 1;
        }

        let width = if count == 0 {
            own
        } else {
            own.max(row + self.config.sibling_gap * (count as f32 - 1.0))
        };
        if lowest_hit >= depth {
            self.memo.insert(key, width);
        }
        Measured { width, lowest_hit }
    }
}
