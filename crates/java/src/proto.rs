//! Parses a `.proto` text file into the handful of fields needed to derive
//! the logical Java class names a generator would produce for it (base spec
//! §4.4). No crate in this lineage parses protobuf IDL, so this is a small,
//! self-contained token scan rather than a borrowed dependency.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtoFile {
    pub package: Option<String>,
    pub java_package: Option<String>,
    pub java_outer_classname: Option<String>,
    pub java_multiple_files: bool,
    /// Top-level `message` / `enum` / `service` names, in declaration order.
    pub definitions: Vec<String>,
}

impl ProtoFile {
    /// The logical Java class names this file's generated code would expose,
    /// given the base name of the `.proto` file itself (used to derive the
    /// default outer classname when `java_outer_classname` is absent).
    pub fn logical_class_names(&self, file_base_name: &str) -> Vec<String> {
        let outer_class = self
            .java_outer_classname
            .clone()
            .unwrap_or_else(|| camel_case(file_base_name));
        let pkg = self
            .java_package
            .clone()
            .or_else(|| self.package.clone())
            .unwrap_or_default();

        let full_outer = if pkg.is_empty() {
            outer_class.clone()
        } else {
            format!("{pkg}.{outer_class}")
        };

        let mut names = vec![full_outer.clone()];

        if self.java_multiple_files {
            for def in &self.definitions {
                let name = if pkg.is_empty() {
                    def.clone()
                } else {
                    format!("{pkg}.{def}")
                };
                names.push(name);
            }
        } else {
            for def in &self.definitions {
                names.push(format!("{full_outer}.{def}"));
            }
        }

        names
    }
}

/// Strip `//` line comments and `/* ... */` block comments.
fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '/' && chars.peek() == Some(&'/') {
            for c in chars.by_ref() {
                if c == '\n' {
                    out.push('\n');
                    break;
                }
            }
            continue;
        }
        if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }

    out
}

/// Parse a `.proto` file's source text.
pub fn parse_proto(source: &str) -> ProtoFile {
    let cleaned = strip_comments(source);
    let mut result = ProtoFile::default();
    let mut depth: i32 = 0;

    let tokens = tokenize(&cleaned);
    let mut i = 0;
    while i < tokens.len() {
        let tok = tokens[i].as_str();
        match tok {
            "{" => depth += 1,
            "}" => depth -= 1,
            "package" if depth == 0 => {
                if let Some(name) = tokens.get(i + 1) {
                    result.package = Some(name.trim_end_matches(';').to_string());
                }
            }
            "option" if depth == 0 => {
                if let (Some(key), Some(eq_or_value)) = (tokens.get(i + 1), tokens.get(i + 2)) {
                    let value_tokens: Vec<&str> = if eq_or_value.as_str() == "=" {
                        tokens
                            .get(i + 3)
                            .map(|v| vec![v.as_str()])
                            .unwrap_or_default()
                    } else {
                        vec![eq_or_value.as_str()]
                    };
                    if let Some(raw_value) = value_tokens.first() {
                        let value = raw_value
                            .trim_end_matches(';')
                            .trim_matches('"')
                            .to_string();
                        match key.as_str() {
                            "java_package" => result.java_package = Some(value),
                            "java_outer_classname" => result.java_outer_classname = Some(value),
                            "java_multiple_files" => {
                                result.java_multiple_files = value == "true"
                            }
                            _ => {}
                        }
                    }
                }
            }
            "message" | "enum" | "service" if depth == 0 => {
                if let Some(name) = tokens.get(i + 1) {
                    result.definitions.push(name.clone());
                }
            }
            _ => {}
        }
        i += 1;
    }

    result
}

/// Split proto source into a simple whitespace/punctuation token stream,
/// tracking only what the parser above needs: identifiers, `{`, `}`, `=`,
/// and string/semicolon-terminated literals stay attached to their token.
fn tokenize(source: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_string = false;

    for c in source.chars() {
        if in_string {
            current.push(c);
            if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                current.push(c);
            }
            '{' | '}' | '=' | ';' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                if c != ';' {
                    tokens.push(c.to_string());
                } else if let Some(last) = tokens.last_mut() {
                    last.push(';');
                }
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Derive a Java outer-classname-style CamelCase name from a `.proto` file's
/// base name (e.g. `my_message.proto` -> `MyMessage`).
fn camel_case(file_base_name: &str) -> String {
    file_base_name
        .split(|c: char| c == '_' || c == '-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_package_and_java_options() {
        let src = r#"
            // leading comment
            syntax = "proto3";
            package example.protos;

            option java_package = "com.example.multi";
            option java_multiple_files = true;

            message MultiMessage {
                string name = 1;
            }

            enum MultiEnum {
                UNKNOWN = 0;
            }
        "#;

        let parsed = parse_proto(src);
        assert_eq!(parsed.package.as_deref(), Some("example.protos"));
        assert_eq!(parsed.java_package.as_deref(), Some("com.example.multi"));
        assert!(parsed.java_multiple_files);
        assert_eq!(parsed.definitions, vec!["MultiMessage", "MultiEnum"]);
    }

    #[test]
    fn multiple_files_logical_names_skip_outer_wrapping() {
        let mut proto = ProtoFile {
            java_package: Some("com.example.multi".to_string()),
            java_multiple_files: true,
            definitions: vec!["MultiMessage".to_string(), "MultiEnum".to_string()],
            ..Default::default()
        };
        proto.java_outer_classname = Some("MultiProto".to_string());

        let names = proto.logical_class_names("multi");
        assert_eq!(
            names,
            vec![
                "com.example.multi.MultiProto".to_string(),
                "com.example.multi.MultiMessage".to_string(),
                "com.example.multi.MultiEnum".to_string(),
            ]
        );
    }

    #[test]
    fn single_file_logical_names_nest_under_outer_class() {
        let proto = ProtoFile {
            java_package: Some("com.example".to_string()),
            java_outer_classname: Some("Demo".to_string()),
            java_multiple_files: false,
            definitions: vec!["Msg".to_string()],
            ..Default::default()
        };

        let names = proto.logical_class_names("demo");
        assert_eq!(
            names,
            vec!["com.example.Demo".to_string(), "com.example.Demo.Msg".to_string()]
        );
    }

    #[test]
    fn nested_messages_are_not_treated_as_top_level() {
        let src = r#"
            message Outer {
                message Inner {
                    string x = 1;
                }
            }
        "#;
        let parsed = parse_proto(src);
        assert_eq!(parsed.definitions, vec!["Outer"]);
    }

    #[test]
    fn default_outer_classname_is_camel_cased_from_file_name() {
        assert_eq!(camel_case("my_message"), "MyMessage");
        assert_eq!(camel_case("demo"), "Demo");
    }
}
