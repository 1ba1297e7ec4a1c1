use crate::model::{Dataset, SeatKey, Student};
use serde::Serialize;

pub const DEFAULT_CLASSROOMS: u32 = 3;
pub const DEFAULT_TABLES_PER_CLASSROOM: u32 = 4;

/// Classroom/table grid the board is drawn from. Classrooms are numbered
/// from 1, tables from 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassroomLayout {
    pub classrooms: u32,
    pub tables_per_classroom: u32,
}

impl Default for ClassroomLayout {
    fn default() -> Self {
        Self {
            classrooms: DEFAULT_CLASSROOMS,
            tables_per_classroom: DEFAULT_TABLES_PER_CLASSROOM,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Occupant {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub photo_url: String,
}

impl From<&Student> for Occupant {
    fn from(s: &Student) -> Self {
        Self {
            id: s.id.clone(),
            name: s.name.clone(),
            age: s.age,
            photo_url: s.photo_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub table: u32,
    pub seat_key: SeatKey,
    pub occupant: Option<Occupant>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClassroomView {
    pub classroom: u32,
    pub tables: Vec<TableView>,
}

pub fn seat_key(classroom: u32, table: u32) -> SeatKey {
    format!("c{classroom}_t{table}")
}

/// Splits `c<classroom>_t<table>`. Keys in any other shape return `None`.
pub fn parse_seat_key(key: &str) -> Option<(u32, u32)> {
    let rest = key.strip_prefix('c')?;
    let (c, t) = rest.split_once("_t")?;
    Some((c.parse().ok()?, t.parse().ok()?))
}

impl ClassroomLayout {
    /// Only the canonical spelling counts: `c01_t0` is not `c1_t0`.
    pub fn contains(&self, key: &str) -> bool {
        parse_seat_key(key)
            .filter(|&(c, t)| seat_key(c, t) == key)
            .map(|(c, t)| (1..=self.classrooms).contains(&c) && t < self.tables_per_classroom)
            .unwrap_or(false)
    }

    pub fn seat_keys(&self) -> Vec<SeatKey> {
        (1..=self.classrooms)
            .flat_map(|c| (0..self.tables_per_classroom).map(move |t| seat_key(c, t)))
            .collect()
    }

    /// Every table in the layout with whoever currently sits there.
    pub fn board(&self, data: &Dataset) -> Vec<ClassroomView> {
        (1..=self.classrooms)
            .map(|classroom| ClassroomView {
                classroom,
                tables: (0..self.tables_per_classroom)
                    .map(|table| {
                        let key = seat_key(classroom, table);
                        let occupant = data
                            .seats
                            .get(&key)
                            .and_then(|id| data.student(id))
                            .map(Occupant::from);
                        TableView {
                            table,
                            seat_key: key,
                            occupant,
                        }
                    })
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::seed_dataset;

    #[test]
    fn seat_keys_round_trip_through_parser() {
        assert_eq!(seat_key(2, 3), "c2_t3");
        assert_eq!(parse_seat_key("c2_t3"), Some((2, 3)));
        assert_eq!(parse_seat_key("c12_t0"), Some((12, 0)));
        assert_eq!(parse_seat_key("window-seat"), None);
        assert_eq!(parse_seat_key("c_t1"), None);
    }

    #[test]
    fn default_layout_has_twelve_tables() {
        let layout = ClassroomLayout::default();
        let keys = layout.seat_keys();
        assert_eq!(keys.len(), 12);
        assert_eq!(keys.first().map(String::as_str), Some("c1_t0"));
        assert_eq!(keys.last().map(String::as_str), Some("c3_t3"));
        assert!(layout.contains("c3_t3"));
        assert!(!layout.contains("c0_t0"));
        assert!(!layout.contains("c1_t4"));
    }

    #[test]
    fn non_canonical_keys_are_outside_the_layout() {
        let layout = ClassroomLayout::default();
        for key in ["c01_t0", "c+1_t0", "c1_t00"] {
            assert!(!layout.contains(key), "{key}");
        }

        let mut d = seed_dataset();
        d.seats.insert("c01_t0".into(), "s1".into());
        let on_board = layout
            .board(&d)
            .iter()
            .flat_map(|c| c.tables.iter())
            .filter(|t| t.occupant.is_some())
            .count();
        let outside: Vec<_> = d.seats.keys().filter(|k| !layout.contains(k)).collect();
        assert_eq!(on_board + outside.len(), 1);
        assert_eq!(outside, vec!["c01_t0"]);
    }

    #[test]
    fn board_shows_occupants_and_skips_outside_keys() {
        let mut d = seed_dataset();
        d.seats.insert("c1_t2".into(), "s2".into());
        d.seats.insert("balcony".into(), "s3".into());

        let board = ClassroomLayout::default().board(&d);
        assert_eq!(board.len(), 3);
        let t = &board[0].tables[2];
        assert_eq!(t.seat_key, "c1_t2");
        assert_eq!(t.occupant.as_ref().map(|o| o.name.as_str()), Some("John"));
        let filled = board
            .iter()
            .flat_map(|c| c.tables.iter())
            .filter(|t| t.occupant.is_some())
            .count();
        assert_eq!(filled, 1);
    }
}
