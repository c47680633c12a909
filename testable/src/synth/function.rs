use std::fmt::Write;

use super::{ArgumentLabels, SynthOptions, Target};
use crate::model::{Function, Parameter};

/// Forwarding wrappers for `functions`, in input order.
pub fn synthesize_functions(functions: &[&Function], target: Target<'_>, options: &SynthOptions) -> String {
    let mut fragment = String::new();
    for function in functions {
        fragment.push_str(&render_function(function, target, options));
    }
    fragment.truncate(fragment.trim_end_matches('\n').len());
    fragment
}

/// A function with the original signature whose body calls through to the
/// original and returns its result.
pub fn render_function(function: &Function, target: Target<'_>, options: &SynthOptions) -> String {
    let one = options.indent.at(1);
    let parameters: Vec<String> = function.parameters.iter().map(declare_parameter).collect();
    let arguments: Vec<String> = function
        .parameters
        .iter()
        .map(|param| pass_argument(param, options.argument_labels))
        .collect();

    // The proxy holds its own copy of the instance, so a mutating original
    // needs a mutating wrapper.
    let mutating = if !target.is_static() && function.is_mutating() { "mutating " } else { "" };
    let mut signature = format!(
        "{}{mutating}func {}({})",
        target.keyword_prefix(),
        function.name,
        parameters.join(", ")
    );
    if function.effects.is_async {
        signature.push_str(" async");
    }
    if let Some(throws) = &function.effects.throws {
        signature.push(' ');
        signature.push_str(throws);
    }
    if let Some(return_type) = &function.return_type {
        let _ = write!(signature, " -> {return_type}");
    }

    let mut call = String::from("return ");
    if function.effects.throws.is_some() {
        call.push_str("try ");
    }
    if function.effects.is_async {
        call.push_str("await ");
    }
    let _ = write!(
        call,
        "{}.{}({})",
        target.receiver(),
        function.name,
        arguments.join(", ")
    );

    let mut out = String::new();
    let _ = writeln!(out, "{signature} {{");
    let _ = writeln!(out, "{one}{call}");
    let _ = writeln!(out, "}}");
    out
}

/// `label name: Type`, with the second name only when it differs.
fn declare_parameter(param: &Parameter) -> String {
    match &param.name {
        Some(name) if *name != param.label => format!("{} {name}: {}", param.label, param.ty),
        _ => format!("{}: {}", param.label, param.ty),
    }
}

fn pass_argument(param: &Parameter, labels: ArgumentLabels) -> String {
    let value = if param.is_inout() {
        format!("&{}", param.internal_name())
    } else {
        param.internal_name().to_owned()
    };
    if param.is_unlabeled() && labels == ArgumentLabels::Omit {
        value
    } else {
        format!("{}: {value}", param.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Effects;

    #[test]
    fn test_function_without_parameters_or_return() {
        let function = Function::new("someFunction2");
        let text = render_function(&function, Target::Instance, &SynthOptions::default());
        assert_eq!(text, "func someFunction2() {\n    return target.someFunction2()\n}\n");
    }

    #[test]
    fn test_labels_and_return_type_are_preserved() {
        let function = Function::new("anotherFunction")
            .with_parameter(Parameter::named("in", "param", "Double"))
            .returning("Double?");
        let text = render_function(&function, Target::Instance, &SynthOptions::default());
        assert_eq!(
            text,
            "func anotherFunction(in param: Double) -> Double? {\n    return target.anotherFunction(in: param)\n}\n"
        );
    }

    #[test]
    fn test_mutating_function_gets_mutating_wrapper() {
        let function = Function::new("bump").with_modifiers(["private", "mutating"]);
        let text = render_function(&function, Target::Instance, &SynthOptions::default());
        assert_eq!(text, "mutating func bump() {\n    return target.bump()\n}\n");

        let plain = Function::new("bump").with_modifiers(["private"]);
        let text = render_function(&plain, Target::Instance, &SynthOptions::default());
        assert!(text.starts_with("func bump() {"));
    }

    #[test]
    fn test_wildcard_label_policies() {
        let function = Function::new("staticFunctionWithParams")
            .with_parameter(Parameter::named("_", "value", "Int"))
            .with_parameter(Parameter::new("name", "String"))
            .returning("Bool");

        let omitted = render_function(&function, Target::Type("MyClass"), &SynthOptions::default());
        assert!(omitted.starts_with("static func staticFunctionWithParams(_ value: Int, name: String) -> Bool {"));
        assert!(omitted.contains("return MyClass.staticFunctionWithParams(value, name: name)"));

        let options = SynthOptions {
            argument_labels: ArgumentLabels::Wildcard,
            ..SynthOptions::default()
        };
        let literal = render_function(&function, Target::Type("MyClass"), &options);
        assert!(literal.contains("return MyClass.staticFunctionWithParams(_: value, name: name)"));
    }

    #[test]
    fn test_effects_are_forwarded() {
        let function = Function::new("load")
            .with_parameter(Parameter::new("id", "Int"))
            .with_effects(Effects {
                is_async: true,
                throws: Some("throws(LoadError)".to_owned()),
            })
            .returning("Data");
        let text = render_function(&function, Target::Instance, &SynthOptions::default());
        assert_eq!(
            text,
            "func load(id: Int) async throws(LoadError) -> Data {\n    return try await target.load(id: id)\n}\n"
        );
    }

    #[test]
    fn test_inout_arguments_take_address() {
        let function = Function::new("bump").with_parameter(Parameter::named("_", "counter", "inout Int"));
        let text = render_function(&function, Target::Instance, &SynthOptions::default());
        assert!(text.contains("func bump(_ counter: inout Int)"));
        assert!(text.contains("return target.bump(&counter)"));
    }

    #[test]
    fn test_redundant_second_name_is_dropped() {
        let function = Function::new("f").with_parameter(Parameter::named("x", "x", "Int"));
        let text = render_function(&function, Target::Instance, &SynthOptions::default());
        assert!(text.starts_with("func f(x: Int)"));
    }

    #[test]
    fn test_fragment_preserves_order() {
        let first = Function::new("first");
        let second = Function::new("second");
        let fragment = synthesize_functions(&[&first, &second], Target::Instance, &SynthOptions::default());
        assert_eq!(
            fragment,
            "func first() {\n    return target.first()\n}\nfunc second() {\n    return target.second()\n}"
        );
    }
}
