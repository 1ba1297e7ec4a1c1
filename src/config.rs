use crate::layout::{ClassroomLayout, DEFAULT_CLASSROOMS, DEFAULT_TABLES_PER_CLASSROOM};
use crate::storage::Backend;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rosterd")]
#[command(about = "Roster and seating-chart sidecar speaking JSON lines on stdin/stdout", long_about = None)]
pub struct Config {
    /// Workspace to open on startup; otherwise wait for `workspace.select`
    #[arg(long, env = "ROSTERD_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Storage backend for workspaces: file or sqlite
    #[arg(long, env = "ROSTERD_BACKEND", default_value = "file")]
    pub backend: Backend,

    /// Number of classrooms on the seating board
    #[arg(long, default_value_t = DEFAULT_CLASSROOMS, value_parser = clap::value_parser!(u32).range(1..))]
    pub classrooms: u32,

    /// Tables per classroom on the seating board
    #[arg(long, default_value_t = DEFAULT_TABLES_PER_CLASSROOM, value_parser = clap::value_parser!(u32).range(1..))]
    pub tables: u32,

    /// Emit log lines on stderr as JSON
    #[arg(long, env = "ROSTERD_LOG_JSON")]
    pub log_json: bool,
}

impl Config {
    pub fn layout(&self) -> ClassroomLayout {
        ClassroomLayout {
            classrooms: self.classrooms,
            tables_per_classroom: self.tables,
        }
    }
}
