pub mod scanner;

pub use scanner::{main_jar_path, sources_jar_path, GradleScanner};
