// tests/evaluator_tests.rs

use dq_lang::ast::BinOp;
use dq_lang::evaluator::{EvalError, Evaluator, arithmetic};
use dq_lang::lexer::Lexer;
use dq_lang::parser::Parser;
use dq_lang::value::Value;

/// Evaluates `input` against a single row with columns
/// `name, age, price, city, active, email`.
fn eval(input: &str) -> Result<Value, EvalError> {
    let columns: Vec<String> = ["name", "age", "price", "city", "active", "email"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let row = vec![
        Value::String("Alice".to_string()),
        Value::Integer(30),
        Value::Float(2.5),
        Value::String("NY".to_string()),
        Value::Boolean(true),
        Value::Null,
    ];
    let expr = Parser::new(Lexer::new(input))
        .parse()
        .unwrap_or_else(|e| panic!("failed to parse {input:?}: {e}"));
    Evaluator::new(&columns).eval(&expr, &row)
}

fn eval_ok(input: &str) -> Value {
    eval(input).unwrap_or_else(|e| panic!("failed to evaluate {input:?}: {e}"))
}

fn s(text: &str) -> Value {
    Value::String(text.to_string())
}

// ============================================================================
// Columns and Literals
// ============================================================================

#[test]
fn test_column_lookup() {
    assert_eq!(eval_ok("name"), s("Alice"));
    assert_eq!(eval_ok("email"), Value::Null);
    assert_eq!(
        eval("salary"),
        Err(EvalError::UnknownColumn("salary".to_string()))
    );
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_integer_arithmetic_stays_integral() {
    let test_cases = vec![
        ("age + 1", Value::Integer(31)),
        ("age - 40", Value::Integer(-10)),
        ("age * 2", Value::Integer(60)),
        ("age / 3", Value::Integer(10)),
        ("7 / 2", Value::Float(3.5)),
        ("-6 / 3", Value::Integer(-2)),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_ok(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_mixed_arithmetic_is_float() {
    let test_cases = vec![
        ("age + 0.5", Value::Float(30.5)),
        ("price * 2", Value::Float(5.0)),
        ("price / 2", Value::Float(1.25)),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_ok(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_float_arithmetic_is_decimal_exact() {
    assert_eq!(eval_ok("100 * 1.1"), Value::Float(110.0));
    assert_eq!(eval_ok("0.1 + 0.2"), Value::Float(0.3));
}

#[test]
fn test_tiny_floats_are_not_rounded_to_zero() {
    let tiny = Value::Float(1e-30);
    let test_cases = vec![
        (BinOp::Multiply, Value::Float(1.0), 1e-30),
        (BinOp::Add, Value::Float(0.0), 1e-30),
        (BinOp::Subtract, Value::Float(0.0), 1e-30),
        (BinOp::Divide, Value::Integer(2), 5e-31),
    ];

    for (op, right, expected) in test_cases {
        assert_eq!(
            arithmetic(op, &tiny, &right).unwrap(),
            Value::Float(expected),
            "Failed for op: {:?}",
            op
        );
    }
}

#[test]
fn test_product_underflowing_decimal_scale() {
    let a = Value::Float(1e-15);
    assert_eq!(
        arithmetic(BinOp::Multiply, &a, &a).unwrap(),
        Value::Float(1e-15 * 1e-15)
    );
}

#[test]
fn test_division_by_zero_is_null() {
    let test_cases = vec!["age / 0", "price / 0", "1 / 0.0"];

    for input in test_cases {
        assert_eq!(eval_ok(input), Value::Null, "Failed for input: {}", input);
    }
}

#[test]
fn test_null_propagates_through_arithmetic() {
    let test_cases = vec!["email + 1", "1 - email", "email * price", "null / 2", "-email"];

    for input in test_cases {
        assert_eq!(eval_ok(input), Value::Null, "Failed for input: {}", input);
    }
}

#[test]
fn test_string_concatenation() {
    assert_eq!(eval_ok(r#"name + " from " + city"#), s("Alice from NY"));
}

#[test]
fn test_arithmetic_type_errors() {
    let test_cases = vec![r#"name + 1"#, r#"name - "x""#, "active * 2", "-name"];

    for input in test_cases {
        assert!(
            matches!(eval(input), Err(EvalError::TypeError(_))),
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_integer_overflow() {
    assert!(matches!(
        eval("9223372036854775807 + 1"),
        Err(EvalError::Overflow(_))
    ));
    assert!(matches!(
        eval("-9223372036854775807 - 2"),
        Err(EvalError::Overflow(_))
    ));
}

// ============================================================================
// Comparison
// ============================================================================

#[test]
fn test_numeric_comparison() {
    let test_cases = vec![
        ("age > 29", true),
        ("age >= 30", true),
        ("age < 30", false),
        ("age <= 30", true),
        ("age == 30.0", true),
        ("price != 2.5", false),
        ("price < age", true),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            eval_ok(input),
            Value::Boolean(expected),
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_string_comparison_is_lexical() {
    let test_cases = vec![
        (r#"city == "NY""#, true),
        (r#"city != "LA""#, true),
        (r#"name < "Bob""#, true),
        (r#""10" < "9""#, true),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            eval_ok(input),
            Value::Boolean(expected),
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_boolean_comparison() {
    assert_eq!(eval_ok("active == true"), Value::Boolean(true));
    assert_eq!(eval_ok("active != true"), Value::Boolean(false));
    assert!(matches!(eval("active < false"), Err(EvalError::TypeError(_))));
}

#[test]
fn test_null_comparison() {
    let test_cases = vec![
        ("email == null", Value::Boolean(true)),
        ("email != null", Value::Boolean(false)),
        ("email == 1", Value::Boolean(false)),
        ("age != null", Value::Boolean(true)),
        ("email < 1", Value::Null),
        ("null >= null", Value::Null),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_ok(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_incomparable_kinds() {
    let test_cases = vec![r#"name == 1"#, "active == 1", r#"age > "20""#];

    for input in test_cases {
        assert!(
            matches!(eval(input), Err(EvalError::TypeError(_))),
            "Failed for input: {}",
            input
        );
    }
}

// ============================================================================
// Logic and Null Tests
// ============================================================================

#[test]
fn test_logical_operators() {
    let test_cases = vec![
        (r#"age > 20 and city == "NY""#, true),
        (r#"age > 40 or city == "NY""#, true),
        ("not active", false),
        ("email and true", false),
        ("email or true", true),
        ("not email", true),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            eval_ok(input),
            Value::Boolean(expected),
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_logical_operators_require_booleans() {
    let test_cases = vec!["age and true", r#"true or "yes""#, "not age"];

    for input in test_cases {
        assert!(
            matches!(eval(input), Err(EvalError::NotBoolean { .. })),
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_is_null() {
    assert_eq!(eval_ok("email is null"), Value::Boolean(true));
    assert_eq!(eval_ok("email is not null"), Value::Boolean(false));
    assert_eq!(eval_ok("age is null"), Value::Boolean(false));
    // the suffix tests the whole chain
    assert_eq!(eval_ok("age + email is null"), Value::Boolean(true));
}

#[test]
fn test_is_null_propagates_errors() {
    assert_eq!(
        eval("missing is null"),
        Err(EvalError::UnknownColumn("missing".to_string()))
    );
}

// ============================================================================
// Scalar Functions
// ============================================================================

#[test]
fn test_string_functions() {
    let test_cases = vec![
        ("upper(name)", s("ALICE")),
        ("lower(city)", s("ny")),
        (r#"trim("  pad  ")"#, s("pad")),
        ("len(name)", Value::Integer(5)),
        (r#"len("héllo")"#, Value::Integer(5)),
        ("upper(age)", s("30")),
        ("upper(email)", Value::Null),
        ("len(email)", Value::Null),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_ok(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_substr() {
    let test_cases = vec![
        ("substr(name, 0, 3)", s("Ali")),
        ("substr(name, 2, 100)", s("ice")),
        ("substr(name, 10, 2)", s("")),
        ("substr(name, -3, 2)", s("Al")),
        (r#"substr("héllo", 1, 3)"#, s("éll")),
        ("substr(email, 0, 1)", Value::Null),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_ok(input), expected, "Failed for input: {}", input);
    }

    assert!(matches!(
        eval(r#"substr(name, "a", 1)"#),
        Err(EvalError::TypeError(_))
    ));
}

#[test]
fn test_coalesce() {
    assert_eq!(eval_ok("coalesce(email, name)"), s("Alice"));
    assert_eq!(eval_ok("coalesce(email, null)"), Value::Null);
    assert_eq!(eval_ok("coalesce(age, email)"), Value::Integer(30));
    assert!(matches!(
        eval("coalesce()"),
        Err(EvalError::Arity { found: 0, .. })
    ));
}

#[test]
fn test_if_evaluates_taken_branch_only() {
    assert_eq!(eval_ok(r#"if(age > 18, "adult", "minor")"#), s("adult"));
    assert_eq!(eval_ok(r#"if(email, "yes", "no")"#), s("no"));
    // the branch not taken may contain errors
    assert_eq!(eval_ok("if(true, 1, missing)"), Value::Integer(1));
    assert!(matches!(
        eval("if(age, 1, 2)"),
        Err(EvalError::NotBoolean { .. })
    ));
}

#[test]
fn test_date_parts() {
    let test_cases = vec![
        (r#"year("2024-03-15")"#, 2024),
        (r#"month("2024-03-15")"#, 3),
        (r#"day("2024-03-15")"#, 15),
        (r#"year("2024-03-15T10:20:30")"#, 2024),
        (r#"day("2024-03-15T23:30:00+02:00")"#, 15),
        (r#"month("2024-03-15 08:00:00")"#, 3),
        (r#"day("03/15/2024")"#, 15),
        (r#"month("2024/03/15")"#, 3),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            eval_ok(input),
            Value::Integer(expected),
            "Failed for input: {}",
            input
        );
    }

    assert_eq!(eval_ok("year(email)"), Value::Null);
}

#[test]
fn test_date_parse_errors() {
    assert_eq!(
        eval(r#"year("yesterday")"#),
        Err(EvalError::DateParse {
            function: "year",
            input: "yesterday".to_string(),
        })
    );
    assert!(matches!(
        eval("month(age)"),
        Err(EvalError::DateParse {
            function: "month",
            ..
        })
    ));
}

#[test]
fn test_string_predicates() {
    let test_cases = vec![
        (r#"contains(name, "lic")"#, Value::Boolean(true)),
        (r#"startswith(name, "Al")"#, Value::Boolean(true)),
        (r#"endswith(name, "x")"#, Value::Boolean(false)),
        (r#"matches(name, "^A.*e$")"#, Value::Boolean(true)),
        (r#"matches(city, "[0-9]+")"#, Value::Boolean(false)),
        (r#"contains(email, "@")"#, Value::Null),
        (r#"contains(age, "3")"#, Value::Boolean(true)),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_ok(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_predicate_pattern_must_be_string() {
    assert!(matches!(
        eval("contains(name, 1)"),
        Err(EvalError::TypeError(_))
    ));
}

#[test]
fn test_invalid_regex() {
    assert!(matches!(
        eval(r#"matches(name, "(")"#),
        Err(EvalError::InvalidRegex { .. })
    ));
}

#[test]
fn test_function_names_are_case_insensitive() {
    assert_eq!(eval_ok("UPPER(name)"), s("ALICE"));
}

#[test]
fn test_function_errors() {
    assert_eq!(
        eval("shout(name)"),
        Err(EvalError::UnknownFunction("shout".to_string()))
    );
    assert_eq!(
        eval("sum(age)"),
        Err(EvalError::AggregateOutsideReduce("sum".to_string()))
    );
    assert!(matches!(
        eval("upper(name, city)"),
        Err(EvalError::Arity { found: 2, .. })
    ));
    assert!(matches!(
        eval("substr(name)"),
        Err(EvalError::Arity { found: 1, .. })
    ));
}

#[test]
fn test_regex_cache_reused_across_rows() {
    let columns = vec!["code".to_string()];
    let evaluator = Evaluator::new(&columns);
    let expr = Parser::new(Lexer::new(r#"matches(code, "^[A-Z]{2}$")"#))
        .parse()
        .unwrap();

    let results: Vec<Value> = ["NY", "ny", "LA", "ABC"]
        .iter()
        .map(|code| evaluator.eval(&expr, &[s(code)]).unwrap())
        .collect();
    assert_eq!(
        results,
        vec![
            Value::Boolean(true),
            Value::Boolean(false),
            Value::Boolean(true),
            Value::Boolean(false)
        ]
    );
}
