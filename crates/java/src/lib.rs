pub mod archive;
pub mod classfile;
pub mod error;
pub mod proto;
pub mod scanner;

pub use archive::{class_entry_fq_name, ArchiveEntry, ArchiveReader};
pub use classfile::{read_class, read_signatures, ClassInfo, MemberSignature};
pub use error::{JavaReaderError, Result};
pub use proto::{parse_proto, ProtoFile};
pub use scanner::{main_jar_path, sources_jar_path, MavenScanner};
