use std::fmt::Write;

use super::{SynthOptions, Target};
use crate::model::Property;

/// Forwarding accessors for `properties`, in input order.
pub fn synthesize_properties(properties: &[&Property], target: Target<'_>, options: &SynthOptions) -> String {
    let mut fragment = String::new();
    for property in properties {
        fragment.push_str(&render_property(property, target, options));
    }
    fragment.truncate(fragment.trim_end_matches('\n').len());
    fragment
}

/// A single computed property with a getter, plus a setter when the
/// original can be assigned.
pub fn render_property(property: &Property, target: Target<'_>, options: &SynthOptions) -> String {
    let one = options.indent.at(1);
    let two = options.indent.at(2);
    let ty = property.ty.as_deref().unwrap_or(&options.placeholder_type);
    let path = format!("{}.{}", target.receiver(), property.name);

    let mut out = String::new();
    let _ = writeln!(out, "{}var {}: {ty} {{", target.keyword_prefix(), property.name);
    let _ = writeln!(out, "{one}get {{");
    let _ = writeln!(out, "{two}return {path}");
    let _ = writeln!(out, "{one}}}");
    if property.has_setter {
        let _ = writeln!(out, "{one}set {{");
        let _ = writeln!(out, "{two}{path} = newValue");
        let _ = writeln!(out, "{one}}}");
    }
    let _ = writeln!(out, "}}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_only_property() {
        let property = Property::new("someConstant", "Int");
        let text = render_property(&property, Target::Instance, &SynthOptions::default());
        assert_eq!(
            text,
            "var someConstant: Int {\n    get {\n        return target.someConstant\n    }\n}\n"
        );
    }

    #[test]
    fn test_static_settable_property() {
        let property = Property::new("staticVariable", "Int").settable();
        let text = render_property(&property, Target::Type("MyClass"), &SynthOptions::default());
        assert_eq!(
            text,
            "static var staticVariable: Int {\n    get {\n        return MyClass.staticVariable\n    }\n    set {\n        MyClass.staticVariable = newValue\n    }\n}\n"
        );
    }

    #[test]
    fn test_missing_type_uses_placeholder() {
        let property = Property::untyped("inferred");
        let options = SynthOptions {
            placeholder_type: "AnyObject".to_owned(),
            ..SynthOptions::default()
        };
        let text = render_property(&property, Target::Instance, &options);
        assert!(text.starts_with("var inferred: AnyObject {"));
    }

    #[test]
    fn test_fragment_keeps_order_and_count() {
        let a = Property::new("a", "Int");
        let b = Property::new("b", "[String: Int]").settable();
        let fragment = synthesize_properties(&[&a, &b], Target::Instance, &SynthOptions::default());

        assert!(fragment.find("var a: Int").unwrap() < fragment.find("var b: [String: Int]").unwrap());
        assert_eq!(fragment.matches("get {").count(), 2);
        assert_eq!(fragment.matches("set {").count(), 1);
        assert!(!fragment.ends_with('\n'));
    }

    #[test]
    fn test_empty_input_gives_empty_fragment() {
        assert_eq!(synthesize_properties(&[], Target::Instance, &SynthOptions::default()), "");
    }
}
