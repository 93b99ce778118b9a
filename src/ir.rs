use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static PARTIAL_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})(?:-(\d{1,2}))?$").unwrap());

/// Returns true when a relationship reference is present and non-blank.
///
/// Every "is this link set" decision goes through here so that `None`,
/// `""` and whitespace-only values are treated identically.
pub fn is_valid_ref(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

fn normalize_ref(value: Option<&str>) -> Option<PersonId> {
    if is_valid_ref(value) {
        value.map(|v| PersonId::new(v.trim()))
    } else {
        None
    }
}

/// Stable domain key of a person record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PersonId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PersonId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Render-surface key. The first placement of a person reuses the person id;
/// repeat placements get a synthetic id so one node maps to one visual box.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&PersonId> for NodeId {
    fn from(value: &PersonId) -> Self {
        Self(value.0.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Other,
}

impl Gender {
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Self::Male,
            "female" | "f" => Self::Female,
            _ => Self::Other,
        }
    }
}

/// Parses the birth-date shapes seen in person records. Anything that does
/// not parse is "no date".
pub fn parse_birth_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(stamp.date());
        }
    }
    let caps = PARTIAL_DATE_RE.captures(raw)?;
    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 1,
    };
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Chronological order with undated entries last.
pub fn compare_birth(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub gender: Gender,
    pub birth_date: Option<NaiveDate>,
    pub alive: bool,
    pub father_id: Option<PersonId>,
    pub mother_id: Option<PersonId>,
    pub spouse_id: Option<PersonId>,
    pub image_url: Option<String>,
}

impl Person {
    pub const UNKNOWN_NAME: &'static str = "Unknown";

    pub fn new(id: impl Into<String>) -> Self {
        let id: String = id.into();
        Self {
            id: PersonId::new(id.trim()),
            name: Self::UNKNOWN_NAME.to_string(),
            gender: Gender::Other,
            birth_date: None,
            alive: true,
            father_id: None,
            mother_id: None,
            spouse_id: None,
            image_url: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = if name.trim().is_empty() {
            Self::UNKNOWN_NAME.to_string()
        } else {
            name.to_string()
        };
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    pub fn with_birth_date(mut self, raw: &str) -> Self {
        self.birth_date = parse_birth_date(raw);
        self
    }

    pub fn with_alive(mut self, alive: bool) -> Self {
        self.alive = alive;
        self
    }

    pub fn with_father(mut self, id: &str) -> Self {
        self.father_id = normalize_ref(Some(id));
        self
    }

    pub fn with_mother(mut self, id: &str) -> Self {
        self.mother_id = normalize_ref(Some(id));
        self
    }

    pub fn with_spouse(mut self, id: &str) -> Self {
        self.spouse_id = normalize_ref(Some(id));
        self
    }

    pub fn with_image_url(mut self, url: &str) -> Self {
        self.image_url = Some(url.to_string()).filter(|u| !u.trim().is_empty());
        self
    }

    pub fn birth_year(&self) -> Option<i32> {
        self.birth_date.map(|d| d.year())
    }

    pub fn has_parent_refs(&self) -> bool {
        self.father_id.is_some() || self.mother_id.is_some()
    }

    /// Father then mother, with a repeated id reported once.
    pub fn parent_ids(&self) -> impl Iterator<Item = &PersonId> {
        let mother = self
            .mother_id
            .as_ref()
            .filter(|m| Some(*m) != self.father_id.as_ref());
        self.father_id.iter().chain(mother)
    }

    pub fn is_child_of(&self, parent: &str) -> bool {
        self.parent_ids().any(|p| p.as_str() == parent)
    }
}

/// Read-only lookup tables over one input snapshot.
///
/// Records with a blank id are ignored and, when ids repeat, the first record
/// wins. Iteration follows input order.
pub struct FamilyIndex<'a> {
    people: Vec<&'a Person>,
    by_id: HashMap<&'a str, usize>,
    children: HashMap<&'a str, Vec<usize>>,
}

impl<'a> FamilyIndex<'a> {
    pub fn new(people: &'a [Person]) -> Self {
        let mut unique: Vec<&'a Person> = Vec::with_capacity(people.len());
        let mut by_id: HashMap<&'a str, usize> = HashMap::with_capacity(people.len());
        for person in people {
            let id = person.id.as_str();
            if !is_valid_ref(Some(id)) {
                tracing::debug!("ignoring person record with blank id");
                continue;
            }
            if by_id.contains_key(id) {
                tracing::warn!(id, "duplicate person id, keeping the first record");
                continue;
            }
            by_id.insert(id, unique.len());
            unique.push(person);
        }

        let mut children: HashMap<&'a str, Vec<usize>> = HashMap::new();
        for (idx, &person) in unique.iter().enumerate() {
            for parent in person.parent_ids() {
                children.entry(parent.as_str()).or_default().push(idx);
            }
        }

        Self {
            people: unique,
            by_id,
            children,
        }
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Person> {
        self.people.iter().copied()
    }

    pub fn get(&self, id: &str) -> Option<&'a Person> {
        self.by_id.get(id).map(|&idx| self.people[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Position of the person in input order.
    pub fn ordinal(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Everyone whose father or mother is `id`, in input order.
    pub fn children_of(&self, id: &str) -> Vec<&'a Person> {
        self.children
            .get(id)
            .map(|list| list.iter().map(|&idx| self.people[idx]).collect())
            .unwrap_or_default()
    }

    /// The recorded spouse, if it resolves to someone other than the person.
    pub fn spouse_of(&self, person: &Person) -> Option<&'a Person> {
        let spouse = self.get(person.spouse_id.as_ref()?.as_str())?;
        (spouse.id != person.id).then_some(spouse)
    }

    /// Children of a person and (optionally) their partner, each listed once,
    /// oldest first with undated children last.
    pub fn couple_children(&self, person: &Person, partner: Option<&Person>) -> Vec<&'a Person> {
        let mut indices: Vec<usize> = Vec::new();
        let parents = std::iter::once(person.id.as_str()).chain(partner.map(|p| p.id.as_str()));
        for parent in parents {
            if let Some(list) = self.children.get(parent) {
                for &idx in list {
                    if !indices.contains(&idx) {
                        indices.push(idx);
                    }
                }
            }
        }
        indices.sort_by(|&a, &b| {
            compare_birth(self.people[a].birth_date, self.people[b].birth_date).then(a.cmp(&b))
        });
        indices.into_iter().map(|idx| self.people[idx]).collect()
    }
}
