use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type StudentId = String;
pub type SeatKey = String;

/// Storage key the whole dataset is persisted under.
pub const STORAGE_KEY: &str = "classroomData";

const AVATAR_BASE: &str = "https://ui-avatars.com/api/";

// encodeURIComponent leaves these unescaped.
const NAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub photo: String,
    #[serde(default)]
    pub languages: Vec<String>,
}

impl Student {
    /// Stored photo, or the generated avatar when none was set.
    pub fn photo_url(&self) -> String {
        if self.photo.trim().is_empty() {
            placeholder_photo(&self.name)
        } else {
            self.photo.clone()
        }
    }

    /// Appends `language` unless it is blank or already present (ignoring case).
    /// Returns whether the list changed.
    pub fn add_language(&mut self, language: &str) -> bool {
        push_language(&mut self.languages, language)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub seats: BTreeMap<SeatKey, StudentId>,
}

impl Dataset {
    pub fn student(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn student_mut(&mut self, id: &str) -> Option<&mut Student> {
        self.students.iter_mut().find(|s| s.id == id)
    }

    pub fn contains_student(&self, id: &str) -> bool {
        self.student(id).is_some()
    }

    pub fn seat_of(&self, student_id: &str) -> Option<&SeatKey> {
        self.seats
            .iter()
            .find(|(_, occupant)| occupant.as_str() == student_id)
            .map(|(key, _)| key)
    }

    /// Drops every seat entry held by `student_id`. Returns how many were removed.
    pub fn vacate_student(&mut self, student_id: &str) -> usize {
        let before = self.seats.len();
        self.seats.retain(|_, occupant| occupant != student_id);
        before - self.seats.len()
    }

    /// Restores the dataset invariants on data that came from outside the
    /// store: a repeated student id keeps its first entry, seats pointing at
    /// unknown students are dropped, and a student holding several seats
    /// keeps only the first key in order.
    pub fn repair(&mut self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut ids = std::collections::HashSet::new();
        self.students.retain(|s| {
            let first = ids.insert(s.id.clone());
            if !first {
                problems.push(format!("dropped duplicate student {} ({})", s.id, s.name));
            }
            first
        });

        let known: std::collections::HashSet<&str> =
            self.students.iter().map(|s| s.id.as_str()).collect();
        let mut seen = std::collections::HashSet::new();
        let mut keep = BTreeMap::new();
        for (key, occupant) in &self.seats {
            if !known.contains(occupant.as_str()) {
                problems.push(format!("seat {key} references unknown student {occupant}"));
                continue;
            }
            if !seen.insert(occupant.clone()) {
                problems.push(format!("student {occupant} also held seat {key}"));
                continue;
            }
            keep.insert(key.clone(), occupant.clone());
        }
        self.seats = keep;
        problems
    }

    pub fn filter_by_name(&self, search: &str) -> Vec<Student> {
        let needle = search.trim().to_lowercase();
        self.students
            .iter()
            .filter(|s| needle.is_empty() || s.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }
}

/// Fields accepted when a student is created.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub name: String,
    pub age: i64,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub photo: String,
    #[serde(default)]
    pub languages: Vec<String>,
}

/// Partial update; `None` keeps the current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub note: Option<String>,
    pub photo: Option<String>,
    pub languages: Option<Vec<String>>,
}

pub fn placeholder_photo(name: &str) -> String {
    format!(
        "{}?name={}&size=64&background=random",
        AVATAR_BASE,
        utf8_percent_encode(name, NAME_ENCODE_SET)
    )
}

pub fn push_language(languages: &mut Vec<String>, language: &str) -> bool {
    let t = language.trim();
    if t.is_empty() {
        return false;
    }
    let lowered = t.to_lowercase();
    if languages.iter().any(|l| l.to_lowercase() == lowered) {
        return false;
    }
    languages.push(t.to_string());
    true
}

/// Trims, drops blanks and case-insensitive duplicates, keeps first-seen order.
pub fn normalize_languages<I, S>(input: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = Vec::new();
    for l in input {
        push_language(&mut out, l.as_ref());
    }
    out
}

fn seed_student(id: &str, name: &str, age: u32, note: &str, bg: &str, langs: &[&str]) -> Student {
    Student {
        id: id.to_string(),
        name: name.to_string(),
        age,
        note: note.to_string(),
        photo: format!("{AVATAR_BASE}?name={name}&size=64&background={bg}"),
        languages: langs.iter().map(|l| l.to_string()).collect(),
    }
}

/// Dataset materialized the first time an empty workspace is loaded.
pub fn seed_dataset() -> Dataset {
    Dataset {
        students: vec![
            seed_student(
                "s1",
                "Amina",
                22,
                "JS learner, passionate about web development",
                "6366f1",
                &["JavaScript", "HTML", "CSS"],
            ),
            seed_student(
                "s2",
                "John",
                20,
                "Python enthusiast",
                "10b981",
                &["Python", "Django"],
            ),
            seed_student(
                "s3",
                "Sarah",
                21,
                "Full-stack developer",
                "f59e0b",
                &["React", "Node.js", "MongoDB"],
            ),
        ],
        seats: BTreeMap::new(),
    }
}
