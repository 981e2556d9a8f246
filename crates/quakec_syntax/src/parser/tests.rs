#[cfg(test)]
/// Parser unit tests.
///
/// These cover the declaration forms, statement forms, expression operators,
/// the diagnostics contract (messages, severities, ranges), and cross-file
/// scope chaining.
mod tests {
    use super::*;
    use crate::ast::Position;
    use crate::diagnostics::Severity;

    fn parse_source(source: &str) -> Program {
        parse(ParseInfo::new(source))
    }

    fn assert_no_errors(program: &Program) {
        assert!(
            program.errors().is_empty(),
            "unexpected diagnostics: {:?}",
            program.errors()
        );
    }

    // ========================================================================
    // Definitions
    // ========================================================================

    #[test]
    fn test_define_float() {
        let program = parse_source("float time;");
        assert_no_errors(&program);
        assert!(program.global_symbol("time").is_some());
        assert_eq!(program.global_type_string("time").as_deref(), Some("float time"));
    }

    #[test]
    fn test_init_float() {
        assert_no_errors(&parse_source("float time = 0.0;"));
    }

    #[test]
    fn test_init_negative_float() {
        assert_no_errors(&parse_source("float NEGATIVE = -1.0;"));
    }

    #[test]
    fn test_define_multiple_variables() {
        let program = parse_source("float parm1, parm2, parm3;");
        assert_no_errors(&program);
        assert!(program.global_symbol("parm2").is_some());
    }

    #[test]
    fn test_init_multiple_variables() {
        assert_no_errors(&parse_source("float parm1, parm2, parm3 = 0;"));
    }

    #[test]
    fn test_define_string_and_entity() {
        assert_no_errors(&parse_source("string message;"));
        assert_no_errors(&parse_source("string message = \"hello world!\\n\";"));
        assert_no_errors(&parse_source("entity target;"));
    }

    #[test]
    fn test_field_types() {
        assert_no_errors(&parse_source(".float time;"));
        assert_no_errors(&parse_source(".float time = 0.0;"));
        assert_no_errors(&parse_source(".vector position = '1.0 0 -2.0';"));
        assert_no_errors(&parse_source(".string message;"));
        assert_no_errors(&parse_source(".entity target;"));
    }

    #[test]
    fn test_vector_definition_expands_components() {
        let program = parse_source("vector position;");
        assert_no_errors(&program);
        for component in ["position_x", "position_y", "position_z"] {
            let type_string = program.global_type_string(component);
            assert_eq!(
                type_string.as_deref(),
                Some(format!("float {component}").as_str()),
                "component {component}"
            );
        }
    }

    #[test]
    fn test_field_vector_components_are_field_floats() {
        let program = parse_source(".vector origin;");
        assert_no_errors(&program);
        assert_eq!(
            program.global_type_string("origin_x").as_deref(),
            Some(".float origin_x")
        );
    }

    #[test]
    fn test_vector_valued_function_has_no_components() {
        let program = parse_source("vector(entity target) lookAt;");
        assert_no_errors(&program);
        assert!(program.global_symbol("lookAt").is_some());
        assert!(program.global_symbol("lookAt_x").is_none());
        assert!(program.global_symbol("lookAt_y").is_none());
        assert!(program.global_symbol("lookAt_z").is_none());
    }

    #[test]
    fn test_init_vector() {
        assert_no_errors(&parse_source("vector position ='1.0 0 -2.0';"));
    }

    // ========================================================================
    // Function types
    // ========================================================================

    #[test]
    fn test_forward_declare_function() {
        let program = parse_source("void() update;");
        assert_no_errors(&program);
        assert_eq!(program.global_type_string("update").as_deref(), Some("void() update"));
    }

    #[test]
    fn test_function_with_simple_args() {
        let program = parse_source("void(entity target) update;");
        assert_no_errors(&program);
        assert_eq!(
            program.global_type_string("update").as_deref(),
            Some("void(entity target) update")
        );
    }

    #[test]
    fn test_function_with_function_args() {
        let program = parse_source("void(entity target, void() callback) update;");
        assert_no_errors(&program);
        assert_eq!(
            program.global_type_string("update").as_deref(),
            Some("void(entity target, void() callback) update")
        );
    }

    #[test]
    fn test_define_function_body() {
        assert_no_errors(&parse_source("void() update = {float time = 0.0;};"));
    }

    #[test]
    fn test_define_function_via_builtin() {
        assert_no_errors(&parse_source("void(vector ang)\tmakevectors = #1;"));
    }

    #[test]
    fn test_forward_declaration_completed_without_warning() {
        let program = parse_source("void() update;\nvoid() update = { return; };");
        assert_no_errors(&program);
    }

    #[test]
    fn test_parameters_visible_in_body() {
        assert_no_errors(&parse_source("float(float time) test = {\n    return time + 1;\n};"));
    }

    // ========================================================================
    // Frames
    // ========================================================================

    #[test]
    fn test_frame_definitions() {
        let program = parse_source("$frame frame1 frame2 frame3");
        assert_no_errors(&program);
        assert_eq!(
            program.global_type_string("frame2").as_deref(),
            Some("$frame frame2")
        );
    }

    #[test]
    fn test_frame_with_optional_value() {
        assert_no_errors(&parse_source("$frame frame1 1.0"));
    }

    #[test]
    fn test_frame_name_usable_in_expressions() {
        assert_no_errors(&parse_source("$frame stand1\nvoid() test = { float a = stand1; };"));
    }

    #[test]
    fn test_frame_function_specifier() {
        assert_no_errors(&parse_source("void() framename = [$frame1, nextthink] {};"));
        assert_no_errors(&parse_source("void() framename = [0, nextthink] {};"));
    }

    #[test]
    fn test_frame_is_not_a_statement() {
        let program = parse_source("void() test = { $frame bad; };");
        assert!(
            program
                .errors()
                .iter()
                .any(|d| d.message.contains("$frame is not a valid statement."))
        );
    }

    // ========================================================================
    // Statements
    // ========================================================================

    #[test]
    fn test_if_statements() {
        assert_no_errors(&parse_source(
            "void() test = {\n    float i = 10;\n    if (i > 0)\n        i = 0;\n};",
        ));
        assert_no_errors(&parse_source(
            "void() test = {\n    float i = 10;\n    if (i > 0) {\n        i = 0;\n    }\n    else {\n        i = i + 1;\n    }\n};",
        ));
    }

    #[test]
    fn test_nested_if_else() {
        assert_no_errors(&parse_source(
            "void() test = {\n    float i = 10;\n    if (i > 0) {\n        if (i < 100) {\n            i = 0;\n        }\n    }\n    else {\n        i = i + 1;\n    }\n};",
        ));
    }

    #[test]
    fn test_while_loops() {
        assert_no_errors(&parse_source(
            "float i = 0;\nvoid() func = {\n    while (i < 10)\n        i = i - 1;\n};",
        ));
        assert_no_errors(&parse_source(
            "float i = 0;\nvoid() func = {\n    while (i < 10) {\n        i = i - 1;\n    }\n};",
        ));
    }

    #[test]
    fn test_do_loops() {
        assert_no_errors(&parse_source(
            "float i = 0;\nvoid() test = {\n    do\n        i = i - 1;\n    while (i < 10);\n};",
        ));
        assert_no_errors(&parse_source(
            "float i = 0;\nvoid() test = {\n    do {\n        i = i - 1;\n    }\n    while (i < 10);\n};",
        ));
    }

    #[test]
    fn test_return_statements() {
        assert_no_errors(&parse_source("void() test = {\n    return;\n};"));
        assert_no_errors(&parse_source("float() test = {\n    return 42;\n};"));
    }

    #[test]
    fn test_local_variables() {
        assert_no_errors(&parse_source("void() test = {\n    local float time;\n};"));
        assert_no_errors(&parse_source("void() test = {\n    local float time, counter;\n};"));
        assert_no_errors(&parse_source("void() test = {\n    local float time = 0.0;\n};"));
    }

    #[test]
    fn test_parameter_assignment() {
        assert_no_errors(&parse_source(
            "float(float v) test = {\n    v = v - 360;\n    return v;\n};",
        ));
    }

    #[test]
    fn test_invocation() {
        assert_no_errors(&parse_source("void() test = {\n    test();\n};"));
        assert_no_errors(&parse_source(
            "void(float time) test = {\n    float a = 0;\n    test(a - 1);\n};",
        ));
    }

    #[test]
    fn test_field_invocation() {
        assert_no_errors(&parse_source(
            ".void() th_walk;\nentity self;\nvoid() test = {\n    self.th_walk();\n};",
        ));
    }

    #[test]
    fn test_field_assignment() {
        assert_no_errors(&parse_source(
            ".float solid;\nentity self;\nvoid() test = {\n    self.solid = 0;\n};",
        ));
    }

    #[test]
    fn test_undefined_call_target_is_fine() {
        assert_no_errors(&parse_source("void() test = {\n    onerror();\n};"));
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    #[test]
    fn test_infix_operators() {
        for op in ["&&", "||", "<=", ">=", "==", "!=", "*", "/", "+", "<", ">", "&", "|"] {
            let source = format!("float a;\nvoid() test = {{\n    a = 1 {op} 2;\n}};");
            assert_no_errors(&parse_source(&source));
        }
    }

    #[test]
    fn test_prefix_operators() {
        assert_no_errors(&parse_source("float a;\nvoid() test = {\n    a = !1;\n};"));
        assert_no_errors(&parse_source("float a;\nvoid() test = {\n    a = -2;\n};"));
        assert_no_errors(&parse_source("float a;\nvoid() test = {\n    a = (0);\n};"));
    }

    #[test]
    fn test_precedence_structure() {
        // `a = 1 + 2 * 3` must parse the multiplication under the addition.
        let program = parse_source("float a;\nvoid() test = {\n    a = 1 + 2 * 3;\n};");
        assert_no_errors(&program);
        let assignment = program
            .symbol_at(Position::new(2, 6))
            .expect("assignment operator symbol");
        assert_eq!(assignment.name, "=");
        assert_eq!(assignment.arity, Arity::Binary);
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    #[test]
    fn test_shadowing_warns_once() {
        let program = parse_source("float time;\nfloat time;");
        assert_eq!(program.errors().len(), 1);
        let diagnostic = &program.errors()[0];
        assert_eq!(diagnostic.severity, Severity::Warning);
        assert_eq!(diagnostic.message, "[qcc] Already defined: 'time'.");
        assert_eq!(diagnostic.range.start, Position::new(1, 6));
    }

    #[test]
    fn test_reserved_word_redefinition_is_error() {
        let program = parse_source("void() test = {\n    if (1)\n        return;\n    float if;\n};");
        assert!(
            program
                .errors()
                .iter()
                .any(|d| d.severity == Severity::Error && d.message == "[qcc] Already reserved: 'if'.")
        );
    }

    #[test]
    fn test_bracket_operator_not_supported() {
        let program = parse_source("void() test = {\n    onerror[0];\n};");
        let unsupported: Vec<_> = program
            .errors()
            .iter()
            .filter(|d| d.message == "[qcc] Bracket operator not supported.")
            .collect();
        assert_eq!(unsupported.len(), 1);
        let diagnostic = unsupported[0];
        assert_eq!(diagnostic.severity, Severity::Error);
        // The range spans from `[` through `]`.
        assert_eq!(diagnostic.range.start, Position::new(1, 11));
        assert_eq!(diagnostic.range.end, Position::new(1, 14));
    }

    #[test]
    fn test_array_definition_not_supported() {
        let program = parse_source("float() times[4];");
        assert_eq!(program.errors().len(), 1);
        let diagnostic = &program.errors()[0];
        assert_eq!(diagnostic.message, "[qcc] Array definition not supported.");
        assert_eq!(diagnostic.range.start, Position::new(0, 13));
        assert_eq!(diagnostic.range.end, Position::new(0, 16));
    }

    #[test]
    fn test_subtraction_without_whitespace_under_qcc() {
        let program = parse_source("void() test = {\n    local float zero = 1-1;\n};");
        assert_eq!(program.errors().len(), 1);
        let diagnostic = &program.errors()[0];
        assert_eq!(diagnostic.message, "[qcc] Missing whitespace for '-' operator.");
        assert_eq!(diagnostic.range.start, Position::new(1, 24));
        assert_eq!(diagnostic.range.end, Position::new(1, 25));
    }

    #[test]
    fn test_subtraction_with_whitespace_is_fine() {
        assert_no_errors(&parse_source("void() test = {\n    local float zero = 1 - 1;\n};"));
    }

    #[test]
    fn test_subtraction_without_whitespace_under_fteqcc() {
        let mut info = ParseInfo::new("void() test = {\n    local float zero = 1-1;\n};");
        info.dialect = Dialect::Fteqcc;
        let program = parse(info);
        assert_no_errors(&program);
    }

    #[test]
    fn test_bad_lvalue() {
        let program = parse_source("void() test = {\n    1 = 2;\n};");
        assert_eq!(program.errors().len(), 1);
        assert_eq!(program.errors()[0].message, "[qcc] Bad lvalue.");
    }

    #[test]
    fn test_bad_expression_statement() {
        let program = parse_source("void() test = {\n    1 + 2;\n};");
        assert_eq!(program.errors().len(), 1);
        assert_eq!(program.errors()[0].message, "[qcc] Bad expression statement.");
    }

    #[test]
    fn test_missing_semicolon_warns_on_previous_token() {
        let program = parse_source("float health");
        assert_eq!(program.errors().len(), 1);
        let diagnostic = &program.errors()[0];
        assert_eq!(diagnostic.severity, Severity::Warning);
        assert_eq!(diagnostic.message, "[qcc] Missing semicolon.");
        // Attached to `health`, where the semicolon should follow.
        assert_eq!(diagnostic.range.start, Position::new(0, 6));
    }

    #[test]
    fn test_unknown_character_is_reported_and_skipped() {
        let program = parse_source("@");
        assert_eq!(program.errors().len(), 1);
        assert_eq!(program.errors()[0].message, "[qcc] Unexpected token: '@'");
    }

    #[test]
    fn test_recovery_skips_to_next_declaration() {
        let program = parse_source("garbage tokens here\nfloat ok;");
        assert!(
            program
                .errors()
                .iter()
                .any(|d| d.message == "[qcc] Unexpected token: 'garbage'")
        );
        assert!(program.global_symbol("ok").is_some());
    }

    #[test]
    fn test_fatal_error_still_yields_partial_program() {
        let mut source = String::from("float before;\nvoid() test = { x = ");
        for _ in 0..400 {
            source.push('(');
        }
        source.push('1');
        for _ in 0..400 {
            source.push(')');
        }
        source.push_str("; };");

        let program = parse_source(&source);
        let fatal: Vec<_> = program
            .errors()
            .iter()
            .filter(|d| d.severity == Severity::Fatal)
            .collect();
        assert_eq!(fatal.len(), 1);
        assert!(fatal[0].message.contains("fatal error"));
        // The declarations parsed before the failure survive.
        assert!(program.global_symbol("before").is_some());
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[test]
    fn test_hover_definition_and_references() {
        let source = "float health;\nvoid() hurt = {\n    health = health - 1;\n};";
        let program = parse_source(source);
        assert_no_errors(&program);

        assert_eq!(
            program.type_string_at(Position::new(2, 5)).as_deref(),
            Some("float health")
        );

        let definition = program.definition_at(Position::new(2, 14)).expect("definition");
        assert_eq!(definition.range.start, Position::new(0, 6));
        assert_eq!(definition.range.end, Position::new(0, 12));

        let references = program.references_at(Position::new(2, 5), false);
        assert_eq!(references.len(), 2);
        assert_eq!(references[0].range.start, Position::new(2, 4));
        assert_eq!(references[1].range.start, Position::new(2, 13));

        let with_declaration = program.references_at(Position::new(2, 5), true);
        assert_eq!(with_declaration.len(), 3);
        assert_eq!(with_declaration[0].range.start, Position::new(0, 6));
    }

    #[test]
    fn test_hover_on_unresolved_name_is_none() {
        let program = parse_source("void() test = {\n    onerror();\n};");
        assert_eq!(program.type_string_at(Position::new(1, 5)), None);
        assert_eq!(program.definition_at(Position::new(1, 5)), None);
    }

    // ========================================================================
    // Cross-file scope chaining
    // ========================================================================

    fn parse_chained(sources: &[(&str, &str)]) -> Vec<Arc<Program>> {
        let mut programs: Vec<Arc<Program>> = Vec::new();
        for &(uri, source) in sources {
            let info = ParseInfo {
                source,
                uri: Some(uri.to_string()),
                parent: programs.last().cloned(),
                dialect: Dialect::Qcc,
            };
            programs.push(Arc::new(parse(info)));
        }
        programs
    }

    #[test]
    fn test_later_file_sees_earlier_globals() {
        let programs = parse_chained(&[
            ("defs.qc", "float deathmatch;\nvoid() monster_run;"),
            (
                "world.qc",
                "void() worldspawn = {\n    if (deathmatch)\n        monster_run();\n};",
            ),
        ]);
        let world = &programs[1];
        assert_no_errors(world);

        assert_eq!(
            world.type_string_at(Position::new(1, 9)).as_deref(),
            Some("float deathmatch")
        );
        let definition = world.definition_at(Position::new(1, 9)).expect("definition");
        assert_eq!(definition.uri, "defs.qc");
        assert_eq!(definition.range.start, Position::new(0, 6));

        // Both upstream uses are recorded as foreign references.
        assert_eq!(world.foreign_refs().len(), 2);
        assert!(world.foreign_refs().iter().all(|r| r.def_uri == "defs.qc"));
    }

    #[test]
    fn test_chain_spans_multiple_files() {
        let programs = parse_chained(&[
            ("a.qc", "float alpha;"),
            ("b.qc", "float beta;"),
            ("c.qc", "void() use = {\n    alpha = beta;\n};"),
        ]);
        let c = &programs[2];
        assert_no_errors(c);
        assert_eq!(c.definition_at(Position::new(1, 4)).map(|l| l.uri).as_deref(), Some("a.qc"));
        assert_eq!(c.definition_at(Position::new(1, 12)).map(|l| l.uri).as_deref(), Some("b.qc"));
    }
}
