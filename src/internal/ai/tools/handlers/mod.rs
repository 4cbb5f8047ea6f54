//! Tool handler implementations.

pub mod edit_file;
pub mod read_file;
pub mod shell;
pub mod write_file;

pub use edit_file::EditFileHandler;
pub use read_file::ReadFileHandler;
pub use shell::ShellHandler;
pub use write_file::WriteFileHandler;
