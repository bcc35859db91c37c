//! Decodes a compiled `.class` blob into `{fqName, superName, interfaceNames}`
//! (base spec §4.3). Built on `ristretto_classfile`, which performs the
//! constant-pool walk (magic check, tag dispatch, `Long`/`Double`
//! double-width handling) the base spec describes at contract level; this
//! module only resolves the handful of constant-pool references the ingest
//! pipeline actually needs and maps parse failures onto `MalformedClass`.

use crate::error::{JavaReaderError, Result};
use ristretto_classfile::{ClassFile, ConstantPool};
use std::io::Cursor;

/// The classes, super type, and interfaces a single `.class` file declares.
/// Dotted form throughout (`java/lang/Object` is never seen by callers).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    pub fq_name: String,
    /// `None` when the class has no superclass (only true of
    /// `java.lang.Object` itself) or when the immediate superclass is
    /// `java.lang.Object`, which callers never emit as an inheritance edge.
    pub super_name: Option<String>,
    pub interface_names: Vec<String>,
}

impl ClassInfo {
    pub fn is_nested(&self) -> bool {
        jarscope_api::naming::is_nested_class(&self.fq_name)
    }
}

/// Parse a single `.class` file's bytes.
pub fn read_class(bytes: &[u8]) -> Result<ClassInfo> {
    let class_file = ClassFile::from_bytes(&mut Cursor::new(bytes))
        .map_err(|e| JavaReaderError::MalformedClass(e.to_string()))?;

    let fq_name = resolve_class_name(&class_file.constant_pool, class_file.this_class)?;

    let super_name = if class_file.super_class == 0 {
        None
    } else {
        let name = resolve_class_name(&class_file.constant_pool, class_file.super_class)?;
        if name == "java.lang.Object" {
            None
        } else {
            Some(name)
        }
    };

    let mut interface_names = Vec::with_capacity(class_file.interfaces.len());
    for &index in &class_file.interfaces {
        interface_names.push(resolve_class_name(&class_file.constant_pool, index)?);
    }

    Ok(ClassInfo {
        fq_name,
        super_name,
        interface_names,
    })
}

/// Resolve a constant-pool index that points at a `CONSTANT_Class_info`
/// entry into its dotted, internal-form-converted name.
fn resolve_class_name(pool: &ConstantPool, class_index: u16) -> Result<String> {
    let class_constant = pool
        .try_get_class(class_index)
        .map_err(|e| JavaReaderError::MalformedClass(e.to_string()))?;
    let internal_name = pool
        .try_get_utf8(class_constant.name_index)
        .map_err(|e| JavaReaderError::MalformedClass(e.to_string()))?;
    Ok(internal_name.replace('/', "."))
}

/// One public or protected member's Java-source-shaped signature, as
/// disassembled from bytecode (base spec §4.7 `signatures` resolution step).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSignature {
    pub text: String,
}

/// Disassemble every public/protected field and method declaration of a
/// `.class` file into a source-shaped signature string. Private/package and
/// synthetic/bridge members are omitted, matching what a reader of the
/// public API would expect to see.
pub fn read_signatures(bytes: &[u8]) -> Result<Vec<MemberSignature>> {
    let class_file = ClassFile::from_bytes(&mut Cursor::new(bytes))
        .map_err(|e| JavaReaderError::MalformedClass(e.to_string()))?;

    let mut signatures = Vec::new();

    for field in &class_file.fields {
        if !is_visible(field.access_flags.bits()) {
            continue;
        }
        let name = class_file
            .constant_pool
            .try_get_utf8(field.name_index)
            .map_err(|e| JavaReaderError::MalformedClass(e.to_string()))?;
        let descriptor = class_file
            .constant_pool
            .try_get_utf8(field.descriptor_index)
            .map_err(|e| JavaReaderError::MalformedClass(e.to_string()))?;
        let type_name = parse_field_descriptor(descriptor);
        let modifiers = modifier_string(field.access_flags.bits());
        signatures.push(MemberSignature {
            text: format!("{modifiers}{type_name} {name}"),
        });
    }

    for method in &class_file.methods {
        if !is_visible(method.access_flags.bits()) {
            continue;
        }
        let name = class_file
            .constant_pool
            .try_get_utf8(method.name_index)
            .map_err(|e| JavaReaderError::MalformedClass(e.to_string()))?;
        let descriptor = class_file
            .constant_pool
            .try_get_utf8(method.descriptor_index)
            .map_err(|e| JavaReaderError::MalformedClass(e.to_string()))?;
        let (params, return_type) = parse_method_descriptor(descriptor);
        let modifiers = modifier_string(method.access_flags.bits());
        let display_name = if name == "<init>" {
            class_name_hint(&class_file.constant_pool, class_file.this_class)
                .unwrap_or_else(|| name.to_string())
        } else {
            name.to_string()
        };
        let return_part = if name == "<init>" {
            String::new()
        } else {
            format!("{return_type} ")
        };
        signatures.push(MemberSignature {
            text: format!(
                "{modifiers}{return_part}{display_name}({})",
                params.join(", ")
            ),
        });
    }

    Ok(signatures)
}

fn class_name_hint(pool: &ConstantPool, class_index: u16) -> Option<String> {
    resolve_class_name(pool, class_index)
        .ok()
        .and_then(|fqn| fqn.rsplit('.').next().map(str::to_string))
}

const ACC_PUBLIC: u16 = 0x0001;
const ACC_PROTECTED: u16 = 0x0004;
const ACC_STATIC: u16 = 0x0008;
const ACC_FINAL: u16 = 0x0010;
const ACC_ABSTRACT: u16 = 0x0400;
const ACC_SYNTHETIC: u16 = 0x1000;
const ACC_BRIDGE: u16 = 0x0040;

fn is_visible(flags: u16) -> bool {
    let is_public_or_protected = flags & ACC_PUBLIC != 0 || flags & ACC_PROTECTED != 0;
    let is_compiler_generated = flags & ACC_SYNTHETIC != 0 || flags & ACC_BRIDGE != 0;
    is_public_or_protected && !is_compiler_generated
}

fn modifier_string(flags: u16) -> String {
    let mut parts = Vec::new();
    if flags & ACC_PUBLIC != 0 {
        parts.push("public");
    } else if flags & ACC_PROTECTED != 0 {
        parts.push("protected");
    }
    if flags & ACC_STATIC != 0 {
        parts.push("static");
    }
    if flags & ACC_ABSTRACT != 0 {
        parts.push("abstract");
    }
    if flags & ACC_FINAL != 0 {
        parts.push("final");
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("{} ", parts.join(" "))
    }
}

/// Decode a single JVM field/type descriptor (`I`, `Ljava/lang/String;`,
/// `[[I`, ...) into its Java source spelling.
fn parse_field_descriptor(descriptor: &str) -> String {
    let mut chars = descriptor.chars().peekable();
    decode_type(&mut chars)
}

fn decode_type(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    match chars.next() {
        Some('B') => "byte".to_string(),
        Some('C') => "char".to_string(),
        Some('D') => "double".to_string(),
        Some('F') => "float".to_string(),
        Some('I') => "int".to_string(),
        Some('J') => "long".to_string(),
        Some('S') => "short".to_string(),
        Some('Z') => "boolean".to_string(),
        Some('V') => "void".to_string(),
        Some('[') => format!("{}[]", decode_type(chars)),
        Some('L') => {
            let mut name = String::new();
            for c in chars.by_ref() {
                if c == ';' {
                    break;
                }
                name.push(if c == '/' { '.' } else { c });
            }
            name.rsplit('.').next().unwrap_or(&name).to_string()
        }
        _ => "?".to_string(),
    }
}

/// Decode a method descriptor (`(Ljava/lang/String;I)V`) into its parameter
/// type list and return type.
fn parse_method_descriptor(descriptor: &str) -> (Vec<String>, String) {
    let mut chars = descriptor.chars().peekable();
    let mut params = Vec::new();

    if chars.peek() == Some(&'(') {
        chars.next();
        while chars.peek().is_some_and(|c| *c != ')') {
            params.push(decode_type(&mut chars));
        }
        chars.next(); // consume ')'
    }

    let return_type = decode_type(&mut chars);
    (params, return_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_magic() {
        let bytes = [0u8; 16];
        let err = read_class(&bytes).unwrap_err();
        assert!(matches!(err, JavaReaderError::MalformedClass(_)));
    }

    #[test]
    fn decodes_common_field_descriptors() {
        assert_eq!(parse_field_descriptor("I"), "int");
        assert_eq!(parse_field_descriptor("Ljava/lang/String;"), "String");
        assert_eq!(parse_field_descriptor("[I"), "int[]");
        assert_eq!(parse_field_descriptor("[Ljava/lang/String;"), "String[]");
    }

    #[test]
    fn decodes_method_descriptor_params_and_return() {
        let (params, ret) = parse_method_descriptor("(Ljava/lang/String;I)V");
        assert_eq!(params, vec!["String".to_string(), "int".to_string()]);
        assert_eq!(ret, "void");
    }

    #[test]
    fn modifier_string_orders_public_before_static() {
        assert_eq!(modifier_string(ACC_PUBLIC | ACC_STATIC), "public static ");
    }

    #[test]
    fn synthetic_bridge_methods_are_not_visible() {
        assert!(!is_visible(ACC_PUBLIC | ACC_SYNTHETIC));
        assert!(!is_visible(ACC_PUBLIC | ACC_BRIDGE));
        assert!(is_visible(ACC_PUBLIC));
        assert!(is_visible(ACC_PROTECTED));
    }
}
