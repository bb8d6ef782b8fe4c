use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Todo lists over HTTP.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "TODOS_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Storage backend
    #[arg(long, env = "TODOS_STORE", value_enum, default_value_t = StoreKind::Sqlite)]
    pub store: StoreKind,

    /// Database file (sqlite) or directory (sled). Ignored for `memory`.
    #[arg(long, env = "TODOS_DATABASE_PATH")]
    pub database_path: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, env = "TODOS_DEBUG")]
    pub debug: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Relational store in a SQLite file
    Sqlite,
    /// Key-value store in a sled directory
    Sled,
    /// Key-value store kept in memory for the life of the process
    Memory,
}

impl Config {
    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(|| match self.store {
            StoreKind::Sqlite => PathBuf::from("todos.db"),
            StoreKind::Sled | StoreKind::Memory => PathBuf::from("db"),
        })
    }
}
