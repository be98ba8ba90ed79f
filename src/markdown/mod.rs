pub mod export;
pub mod filename;
pub mod frontmatter;

pub use export::{export_filename, export_note, export_note_to_markdown};
pub use filename::{is_note_file, resolve_filename, sanitize_stem, FilenameFallback};
pub use frontmatter::{Field, Frontmatter};
