use std::path::PathBuf;

use crate::layout::ClassroomLayout;
use crate::session::Session;
use crate::storage::Backend;
use crate::store::Store;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub backend: Backend,
    pub store: Option<Store>,
    pub session: Session,
    pub layout: ClassroomLayout,
}

impl AppState {
    pub fn new(backend: Backend, layout: ClassroomLayout) -> Self {
        Self {
            workspace: None,
            backend,
            store: None,
            session: Session::default(),
            layout,
        }
    }
}
