//! Per-gesture controller state: which student the editor is working on,
//! which seat the picker is filling, which student is being dragged.
//!
//! Each slot is set when its gesture starts and cleared when it completes
//! or is cancelled.

use crate::error::StoreError;
use crate::model::{NewStudent, SeatKey, Student, StudentId, StudentPatch};
use crate::store::Store;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no {0} is open")]
    NotOpen(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit(StudentId),
}

/// What the host needs to fill the student form.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EditorPrefill {
    pub mode: &'static str,
    pub student_id: Option<StudentId>,
    pub name: String,
    pub age: Option<u32>,
    pub note: String,
    pub photo: String,
    pub photo_preview: String,
    pub languages: Vec<String>,
}

impl EditorPrefill {
    fn blank() -> Self {
        Self {
            mode: "create",
            student_id: None,
            name: String::new(),
            age: None,
            note: String::new(),
            photo: String::new(),
            photo_preview: crate::model::placeholder_photo("Student"),
            languages: Vec::new(),
        }
    }

    fn from_student(s: &Student) -> Self {
        Self {
            mode: "edit",
            student_id: Some(s.id.clone()),
            name: s.name.clone(),
            age: Some(s.age),
            note: s.note.clone(),
            photo: s.photo.clone(),
            photo_preview: s.photo_url(),
            languages: s.languages.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Session {
    editor: Option<EditorMode>,
    picker: Option<SeatKey>,
    drag: Option<StudentId>,
}

impl Session {
    pub fn editor(&self) -> Option<&EditorMode> {
        self.editor.as_ref()
    }

    pub fn picker_seat(&self) -> Option<&SeatKey> {
        self.picker.as_ref()
    }

    pub fn dragged(&self) -> Option<&StudentId> {
        self.drag.as_ref()
    }

    /// Opens the editor for a new student (`None`) or an existing one.
    pub fn open_editor(
        &mut self,
        store: &mut Store,
        student_id: Option<&str>,
    ) -> SessionResult<EditorPrefill> {
        let prefill = match student_id {
            None => {
                self.editor = Some(EditorMode::Create);
                EditorPrefill::blank()
            }
            Some(id) => {
                let student = store
                    .student(id)?
                    .ok_or_else(|| StoreError::not_found(id))?;
                self.editor = Some(EditorMode::Edit(student.id.clone()));
                EditorPrefill::from_student(&student)
            }
        };
        Ok(prefill)
    }

    /// Creates or updates from the submitted form. The editor stays open when
    /// the store rejects the fields.
    pub fn submit_editor(
        &mut self,
        store: &mut Store,
        fields: NewStudent,
    ) -> SessionResult<StudentId> {
        let mode = self.editor.clone().ok_or(SessionError::NotOpen("editor"))?;
        let id = match mode {
            EditorMode::Create => store.create_student(fields)?,
            EditorMode::Edit(id) => {
                store.update_student(
                    &id,
                    StudentPatch {
                        name: Some(fields.name),
                        age: Some(fields.age),
                        note: Some(fields.note),
                        photo: Some(fields.photo),
                        languages: Some(fields.languages),
                    },
                )?;
                id
            }
        };
        self.editor = None;
        Ok(id)
    }

    pub fn close_editor(&mut self) {
        self.editor = None;
    }

    pub fn open_picker(&mut self, seat_key: &str) {
        self.picker = Some(seat_key.to_string());
    }

    pub fn picker_candidates(&self, store: &mut Store, search: &str) -> SessionResult<Vec<Student>> {
        if self.picker.is_none() {
            return Err(SessionError::NotOpen("picker"));
        }
        Ok(store.list_students(search)?)
    }

    /// Seats the chosen student at the picker's seat and closes the picker.
    pub fn choose_from_picker(
        &mut self,
        store: &mut Store,
        student_id: &str,
    ) -> SessionResult<SeatKey> {
        let seat = self.picker.clone().ok_or(SessionError::NotOpen("picker"))?;
        store.assign_seat(student_id, &seat)?;
        self.picker = None;
        Ok(seat)
    }

    pub fn close_picker(&mut self) {
        self.picker = None;
    }

    pub fn start_drag(&mut self, store: &mut Store, student_id: &str) -> SessionResult<()> {
        if store.student(student_id)?.is_none() {
            return Err(StoreError::not_found(student_id).into());
        }
        self.drag = Some(student_id.to_string());
        Ok(())
    }

    /// Drops the dragged student on `seat_key`. Returns the assigned student,
    /// or `None` when nothing was being dragged.
    pub fn drop_on(
        &mut self,
        store: &mut Store,
        seat_key: &str,
    ) -> SessionResult<Option<StudentId>> {
        let Some(student_id) = self.drag.take() else {
            return Ok(None);
        };
        store.assign_seat(&student_id, seat_key)?;
        Ok(Some(student_id))
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }
}
