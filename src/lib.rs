//! dirsort - sorts a directory tree into category folders
//!
//! Files are routed by extension into `images/`, `video/`, `documents/`,
//! `audio/`, `archives/` and `other files/` under the root, with one subfolder
//! per extension. Names are transliterated from Cyrillic to ASCII, archives are
//! unpacked in place of being moved, and source folders left empty are removed.
//! Top-level folders are processed in parallel.

pub mod archive;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod error;
pub mod file_category;
pub mod file_organizer;
pub mod fs_ops;
pub mod logging;
pub mod output;
pub mod registry;
pub mod scanner;
pub mod transliterate;

pub use config::{CompiledFilters, ConfigError, OrganizerConfig};
pub use error::{OrganizeError, OrganizeResult, RelocateError};
pub use file_category::{Category, Route, RoutingTable};
pub use file_organizer::{FileEntry, FileOrganizer, Relocation};
pub use fs_ops::{FileSystem, LocalFileSystem};
pub use registry::ExtensionRegistry;
pub use scanner::{Organizer, Phase, PlannedMove, RunReport};
pub use transliterate::{normalize_file_name, transliterate};

pub use cli::{Cli, run_cli};
