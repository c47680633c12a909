//! Assembly of the gated extension holding the proxy type.

use std::collections::HashSet;
use std::fmt::Write;

use crate::errors::ExpansionError;
use crate::model::{DeclKind, Member, Modifier};
use crate::scanner::Classification;
use crate::synth::{INSTANCE_RECEIVER, Indent, SynthOptions, Target, synthesize_functions, synthesize_properties};
use crate::syntax::parse_source;

/// Computed property returning the proxy.
pub const ENTRY_POINT: &str = "testHooks";
/// Name of the nested proxy struct.
pub const PROXY_TYPE: &str = "TestHooks";
pub const DEFAULT_BUILD_FLAG: &str = "DEBUG";

/// Synthesized members, one fragment per bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragments {
    pub instance_properties: String,
    pub instance_functions: String,
    pub static_properties: String,
    pub static_functions: String,
}

impl Fragments {
    /// Run both synthesizers over a classification of `type_name`'s members.
    pub fn synthesize(classification: &Classification<'_>, type_name: &str, options: &SynthOptions) -> Self {
        let owner = Target::Type(type_name);
        Self {
            instance_properties: synthesize_properties(&classification.instance_properties, Target::Instance, options),
            instance_functions: synthesize_functions(&classification.instance_functions, Target::Instance, options),
            static_properties: synthesize_properties(&classification.static_properties, owner, options),
            static_functions: synthesize_functions(&classification.static_functions, owner, options),
        }
    }

    /// Fragments in emission order.
    fn in_order(&self) -> [&str; 4] {
        [
            self.instance_properties.as_str(),
            self.instance_functions.as_str(),
            self.static_properties.as_str(),
            self.static_functions.as_str(),
        ]
    }
}

/// Names the proxy declares for itself. Instance members forwarded under
/// one of them would redeclare it.
pub const RESERVED_NAMES: &[&str] = &[INSTANCE_RECEIVER, "init"];

/// Reject instance members whose forwarding member would clash with the
/// proxy's own stored receiver or initializer.
pub fn check_reserved_names(classification: &Classification<'_>) -> Result<(), ExpansionError> {
    let properties = classification
        .instance_properties
        .iter()
        .map(|property| ("property", property.name.as_str(), property.position));
    let functions = classification
        .instance_functions
        .iter()
        .map(|function| ("function", function.name.as_str(), function.position));

    match properties.chain(functions).find(|(_, name, _)| RESERVED_NAMES.contains(name)) {
        Some((member, name, position)) => Err(ExpansionError::ReservedName {
            member,
            name: name.to_owned(),
            proxy: PROXY_TYPE,
            position,
        }),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyOptions {
    /// Compilation condition gating the generated members.
    pub build_flag: String,
    pub indent: Indent,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            build_flag: DEFAULT_BUILD_FLAG.to_owned(),
            indent: Indent::default(),
        }
    }
}

/// Build the extension for `type_name` and check that it parses back.
pub fn assemble(type_name: &str, fragments: &Fragments, options: &AssemblyOptions) -> Result<String, ExpansionError> {
    let text = render(type_name, fragments, options);
    validate(type_name, &text)?;
    Ok(text)
}

/// Extension text without validation.
pub fn render(type_name: &str, fragments: &Fragments, options: &AssemblyOptions) -> String {
    let indent = options.indent;
    let (one, two, three) = (indent.at(1), indent.at(2), indent.at(3));

    let mut out = String::new();
    let _ = writeln!(out, "extension {type_name} {{");
    let _ = writeln!(out, "{one}#if {}", options.build_flag);
    let _ = writeln!(out, "{one}var {ENTRY_POINT}: {PROXY_TYPE} {{");
    let _ = writeln!(out, "{two}return {PROXY_TYPE}({INSTANCE_RECEIVER}: self)");
    let _ = writeln!(out, "{one}}}");
    let _ = writeln!(out, "{one}struct {PROXY_TYPE} {{");
    let _ = writeln!(out, "{two}private var {INSTANCE_RECEIVER}: {type_name}");
    let _ = writeln!(out, "{two}fileprivate init({INSTANCE_RECEIVER}: {type_name}) {{");
    let _ = writeln!(out, "{three}self.{INSTANCE_RECEIVER} = {INSTANCE_RECEIVER}");
    let _ = writeln!(out, "{two}}}");
    for fragment in fragments.in_order() {
        for line in fragment.lines() {
            if line.is_empty() {
                out.push('\n');
            } else {
                let _ = writeln!(out, "{two}{line}");
            }
        }
    }
    let _ = writeln!(out, "{one}}}");
    let _ = writeln!(out, "{one}#endif");
    out.push('}');
    out
}

fn validate(type_name: &str, text: &str) -> Result<(), ExpansionError> {
    let malformed = |reason: String| ExpansionError::Assembly {
        type_name: type_name.to_owned(),
        reason,
    };

    let file = parse_source(text).map_err(|err| malformed(err.to_string()))?;
    let extends = file
        .declarations
        .iter()
        .any(|decl| decl.kind == DeclKind::Extension && decl.name == type_name);
    if !extends {
        return Err(malformed(format!("no extension of '{type_name}' was produced")));
    }
    let proxy = format!("{type_name}.{PROXY_TYPE}");
    let Some(declaration) = file.find(&proxy) else {
        return Err(malformed(format!("'{proxy}' is not declared")));
    };
    if let Some(name) = redeclared_member(&declaration.members) {
        return Err(malformed(format!("'{name}' is declared more than once in '{proxy}'")));
    }
    log::trace!("assembled extension for {type_name} parses back");
    Ok(())
}

/// First property name declared twice at the same level, or shared by a
/// property and a function.
fn redeclared_member(members: &[Member]) -> Option<&str> {
    let is_static = |modifiers: &[Modifier]| modifiers.iter().any(|modifier| modifier.name == "static");
    let mut properties = HashSet::new();
    for member in members {
        if let Member::Property(property) = member
            && !properties.insert((is_static(&property.modifiers), property.name.as_str()))
        {
            return Some(&property.name);
        }
    }
    members.iter().find_map(|member| match member {
        Member::Function(function)
            if properties.contains(&(is_static(&function.modifiers), function.name.as_str())) =>
        {
            Some(function.name.as_str())
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Position, Property};

    #[test]
    fn test_empty_fragments_produce_bare_proxy() {
        let text = assemble("Counter", &Fragments::default(), &AssemblyOptions::default()).unwrap();
        assert_eq!(
            text,
            "extension Counter {\n    #if DEBUG\n    var testHooks: TestHooks {\n        return TestHooks(target: self)\n    }\n    struct TestHooks {\n        private var target: Counter\n        fileprivate init(target: Counter) {\n            self.target = target\n        }\n    }\n    #endif\n}"
        );
    }

    #[test]
    fn test_fragments_are_indented_in_order() {
        let fragments = Fragments {
            instance_properties: "var a: Int {\n    get {\n        return target.a\n    }\n}".to_owned(),
            instance_functions: "func f() {\n    return target.f()\n}".to_owned(),
            static_properties: String::new(),
            static_functions: "static func g() {\n    return Counter.g()\n}".to_owned(),
        };
        let text = assemble("Counter", &fragments, &AssemblyOptions::default()).unwrap();

        assert!(text.contains("\n        var a: Int {\n            get {\n"));
        let a = text.find("var a").unwrap();
        let f = text.find("func f").unwrap();
        let g = text.find("static func g").unwrap();
        assert!(a < f && f < g);
    }

    #[test]
    fn test_custom_flag_and_indent() {
        let options = AssemblyOptions {
            build_flag: "TESTING".to_owned(),
            indent: Indent::new(2),
        };
        let text = assemble("Outer.Inner", &Fragments::default(), &options).unwrap();
        assert!(text.starts_with("extension Outer.Inner {\n  #if TESTING\n  var testHooks"));
        assert!(text.contains("\n    private var target: Outer.Inner\n"));
    }

    #[test]
    fn test_redeclared_proxy_member_is_rejected() {
        let fragments = Fragments {
            instance_properties: "var target: String {\n    get {\n        return target.target\n    }\n}".to_owned(),
            ..Fragments::default()
        };
        let err = assemble("Link", &fragments, &AssemblyOptions::default()).unwrap_err();
        assert!(matches!(err, ExpansionError::Assembly { ref reason, .. } if reason.contains("'target'")));
    }

    #[test]
    fn test_static_member_may_share_an_instance_name() {
        let fragments = Fragments {
            static_properties: "static var target: Int {\n    get {\n        return Link.target\n    }\n}".to_owned(),
            ..Fragments::default()
        };
        assert!(assemble("Link", &fragments, &AssemblyOptions::default()).is_ok());
    }

    #[test]
    fn test_reserved_instance_names() {
        let target = Property::new("target", "String").at(Position::new(2, 5));
        let classification = Classification {
            instance_properties: vec![&target],
            ..Classification::default()
        };
        let err = check_reserved_names(&classification).unwrap_err();
        assert!(matches!(
            err,
            ExpansionError::ReservedName { ref name, position, .. } if name == "target" && position == Position::new(2, 5)
        ));

        let classification = Classification {
            static_properties: vec![&target],
            ..Classification::default()
        };
        assert!(check_reserved_names(&classification).is_ok());
    }

    #[test]
    fn test_malformed_output_is_rejected() {
        let fragments = Fragments {
            instance_functions: "func broken() {".to_owned(),
            ..Fragments::default()
        };
        let err = assemble("Counter", &fragments, &AssemblyOptions::default()).unwrap_err();
        assert!(matches!(err, ExpansionError::Assembly { ref type_name, .. } if type_name == "Counter"));
    }
}
