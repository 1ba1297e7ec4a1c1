//! The roster store: sole owner of the persisted dataset.
//!
//! Every mutation is a whole-document read-modify-write under `&mut self`,
//! so two mutations can never interleave.

use crate::error::{StoreError, StoreResult};
use crate::model::{
    normalize_languages, seed_dataset, Dataset, NewStudent, Student, StudentId,
    StudentPatch, STORAGE_KEY,
};
use crate::storage::Storage;
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

// Longest slice of a corrupt blob echoed into the log.
const DISCARDED_LOG_LIMIT: usize = 512;

pub struct Store {
    storage: Box<dyn Storage>,
}

impl Store {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn describe(&self) -> String {
        self.storage.describe()
    }

    /// Reads the persisted dataset without seeding or repairing it.
    /// `Ok(None)` means nothing has been persisted yet.
    pub fn try_load(&self) -> StoreResult<Option<Dataset>> {
        match self.read_raw()? {
            None => Ok(None),
            Some(raw) => parse_dataset(&raw).map(Some),
        }
    }

    /// Returns the current dataset, materializing the seed on first use and
    /// replacing unparseable state with the seed.
    pub fn load(&mut self) -> StoreResult<Dataset> {
        let Some(raw) = self.read_raw()? else {
            let seed = seed_dataset();
            self.save(&seed)?;
            info!(backend = %self.describe(), "seeded empty workspace");
            return Ok(seed);
        };

        match parse_dataset(&raw) {
            Ok(mut data) => {
                let problems = data.repair();
                if !problems.is_empty() {
                    warn!(?problems, "repaired inconsistent dataset on load");
                }
                Ok(data)
            }
            Err(e) => {
                let shown: String = raw.chars().take(DISCARDED_LOG_LIMIT).collect();
                warn!(error = %e, discarded = %shown, "discarding corrupt dataset, restoring seed");
                let seed = seed_dataset();
                self.save(&seed)?;
                Ok(seed)
            }
        }
    }

    /// Overwrites the persisted dataset wholesale.
    pub fn save(&mut self, dataset: &Dataset) -> StoreResult<()> {
        let text = serde_json::to_string(dataset).map_err(|e| StoreError::Persistence {
            message: format!("failed to serialize dataset: {e}"),
        })?;
        self.storage
            .write(STORAGE_KEY, &text)
            .map_err(StoreError::persistence)
    }

    pub fn student(&mut self, id: &str) -> StoreResult<Option<Student>> {
        Ok(self.load()?.student(id).cloned())
    }

    pub fn list_students(&mut self, search: &str) -> StoreResult<Vec<Student>> {
        Ok(self.load()?.filter_by_name(search))
    }

    pub fn create_student(&mut self, fields: NewStudent) -> StoreResult<StudentId> {
        let (name, age) = validate_fields(Some(&fields.name), Some(fields.age))?;
        let (Some(name), Some(age)) = (name, age) else {
            return Err(StoreError::validation("name", "name and age are required"));
        };
        let id = self.mutate(|data| {
            let id = fresh_id(data);
            data.students.push(Student {
                id: id.clone(),
                name,
                age,
                note: fields.note.trim().to_string(),
                photo: fields.photo.trim().to_string(),
                languages: normalize_languages(&fields.languages),
            });
            Ok(id)
        })?;
        info!(student_id = %id, "student created");
        Ok(id)
    }

    pub fn update_student(&mut self, id: &str, patch: StudentPatch) -> StoreResult<()> {
        let (name, age) = validate_fields(patch.name.as_deref(), patch.age)?;
        self.mutate(|data| {
            let student = data
                .student_mut(id)
                .ok_or_else(|| StoreError::not_found(id))?;
            if let Some(name) = name {
                student.name = name;
            }
            if let Some(age) = age {
                student.age = age;
            }
            if let Some(note) = patch.note {
                student.note = note.trim().to_string();
            }
            // A blank photo keeps the current one.
            if let Some(photo) = patch.photo.filter(|p| !p.trim().is_empty()) {
                student.photo = photo.trim().to_string();
            }
            if let Some(languages) = patch.languages {
                student.languages = normalize_languages(&languages);
            }
            Ok(())
        })?;
        info!(student_id = %id, "student updated");
        Ok(())
    }

    /// Removes the student and every seat that points at it. Unknown ids are a no-op.
    pub fn delete_student(&mut self, id: &str) -> StoreResult<()> {
        let (removed, vacated) = self.mutate(|data| {
            let before = data.students.len();
            data.students.retain(|s| s.id != id);
            Ok((before - data.students.len(), data.vacate_student(id)))
        })?;
        info!(student_id = %id, removed, vacated, "student deleted");
        Ok(())
    }

    /// Seats `student_id` at `seat_key`, vacating any seat it held before.
    pub fn assign_seat(&mut self, student_id: &str, seat_key: &str) -> StoreResult<()> {
        self.mutate(|data| {
            if !data.contains_student(student_id) {
                return Err(StoreError::not_found(student_id));
            }
            data.vacate_student(student_id);
            data.seats
                .insert(seat_key.to_string(), student_id.to_string());
            Ok(())
        })?;
        info!(student_id, seat_key, "seat assigned");
        Ok(())
    }

    pub fn unassign_seat(&mut self, seat_key: &str) -> StoreResult<()> {
        let previous = self.mutate(|data| Ok(data.seats.remove(seat_key)))?;
        debug!(seat_key, ?previous, "seat unassigned");
        Ok(())
    }

    /// Appends a language to the student. Blank input and case-insensitive
    /// duplicates are ignored. Returns the student's languages afterwards.
    pub fn add_language(&mut self, student_id: &str, language: &str) -> StoreResult<Vec<String>> {
        self.mutate(|data| {
            let student = data
                .student_mut(student_id)
                .ok_or_else(|| StoreError::not_found(student_id))?;
            student.add_language(language);
            Ok(student.languages.clone())
        })
    }

    fn mutate<T>(&mut self, f: impl FnOnce(&mut Dataset) -> StoreResult<T>) -> StoreResult<T> {
        let mut data = self.load()?;
        let out = f(&mut data)?;
        self.save(&data)?;
        Ok(out)
    }

    fn read_raw(&self) -> StoreResult<Option<String>> {
        self.storage
            .read(STORAGE_KEY)
            .map_err(StoreError::persistence)
    }
}

fn parse_dataset(raw: &str) -> StoreResult<Dataset> {
    serde_json::from_str(raw).map_err(|e| StoreError::CorruptState {
        message: e.to_string(),
    })
}

/// Checks every given field and reports all failures together.
fn validate_fields(
    name: Option<&str>,
    age: Option<i64>,
) -> StoreResult<(Option<String>, Option<u32>)> {
    let mut failures = Vec::new();
    let name = name.map(validate_name).transpose().unwrap_or_else(|e| {
        failures.push(e);
        None
    });
    let age = age.map(validate_age).transpose().unwrap_or_else(|e| {
        failures.push(e);
        None
    });
    match StoreError::merge_validation(failures) {
        Some(e) => Err(e),
        None => Ok((name, age)),
    }
}

fn validate_name(name: &str) -> StoreResult<String> {
    let t = name.trim();
    if t.is_empty() {
        return Err(StoreError::validation("name", "name must not be empty"));
    }
    Ok(t.to_string())
}

fn validate_age(age: i64) -> StoreResult<u32> {
    if age < 1 {
        return Err(StoreError::validation("age", "age must be at least 1"));
    }
    u32::try_from(age).map_err(|_| StoreError::validation("age", "age is out of range"))
}

fn fresh_id(data: &Dataset) -> StudentId {
    loop {
        let suffix = Uuid::new_v4().simple().to_string();
        let id = format!("s{}{}", Utc::now().timestamp_millis(), &suffix[..9]);
        if !data.contains_student(&id) {
            return id;
        }
    }
}
