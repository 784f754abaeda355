//! Integration tests for field resolution, value validation and record validation
//!
//! These tests go through the public API only: the shared engine's free
//! functions and engines assembled with `EngineBuilder`.

use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use vschema::prelude::*;

fn field() -> FieldDeclaration {
    FieldDeclaration::new().name("myfield")
}

mod descriptor_tests {
    use super::*;

    #[test]
    fn test_resolves_field_without_type() {
        let descriptor = resolve_field_descriptor(&field()).expect("field should resolve");
        assert_eq!(descriptor.name, "myfield");
        assert_eq!(descriptor.type_tag, "any");
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let err = resolve_field_descriptor(&field().type_tag("unknown-type"))
            .expect_err("unknown type should fail");
        assert_eq!(err.to_string(), "Unknown field type: unknown-type");
    }

    #[test]
    fn test_type_defaults_come_before_declared_rules() {
        let descriptor = resolve_field_descriptor(
            &field()
                .type_tag("email")
                .validator("isLowercase")
                .filter("trim"),
        )
        .expect("field should resolve");

        let validators: Vec<_> = descriptor.validators.iter().map(|r| r.name()).collect();
        let filters: Vec<_> = descriptor.filters.iter().map(|r| r.name()).collect();
        assert_eq!(validators, vec![Some("isEmail"), Some("isLowercase")]);
        assert_eq!(filters, vec![Some("normalizeEmail"), Some("trim")]);
    }
}

mod value_tests {
    use super::*;

    #[tokio::test]
    async fn test_numbers_out_of_range_are_rejected() {
        let err = validate_value(&field().type_tag("integer"), json!("99999999999999999999"))
            .await
            .expect_err("integer beyond 64 bits should fail");
        assert_eq!(err.to_string(), "Invalid value: 99999999999999999999");

        let digits = "1".repeat(400);
        let err = validate_value(&field().type_tag("number"), json!(digits))
            .await
            .expect_err("number overflowing to infinity should fail");
        assert_eq!(err.to_string(), format!("Invalid value: {}", digits));
    }

    #[tokio::test]
    async fn test_large_unsigned_integer_is_kept() {
        let value = validate_value(&field().type_tag("integer"), json!("18446744073709551615"))
            .await
            .expect("u64 should validate");
        assert_eq!(value, json!(u64::MAX));
    }

    /// (type, valid input, expected output, invalid input)
    fn typed_cases() -> Vec<(&'static str, Value, Value, Option<Value>)> {
        let id = "550e8400-e29b-41d4-a716-446655440000";
        vec![
            ("string", json!("abcd"), json!("abcd"), None),
            ("number", json!("12345"), json!(12345), Some(json!("abcd"))),
            ("integer", json!("1235"), json!(1235), Some(json!("abcd"))),
            ("float", json!("123.45"), json!(123.45), Some(json!("abcd"))),
            ("bool", json!("true"), json!(true), Some(json!("abcd"))),
            ("bool", json!("false"), json!(false), Some(json!("abcd"))),
            ("bool", json!("1"), json!(true), Some(json!("abcd"))),
            ("bool", json!("0"), json!(false), Some(json!("abcd"))),
            ("date", json!("2016-01-01"), json!("2016-01-01T00:00:00Z"), Some(json!("abcd"))),
            ("email", json!("John@Doe.com"), json!("john@doe.com"), Some(json!("john"))),
            ("alpha", json!("John"), json!("John"), Some(json!("John2"))),
            ("uuid", json!(id), json!(id), Some(json!("abcd"))),
        ]
    }

    #[tokio::test]
    async fn test_builtin_types() {
        for (type_tag, valid, expected, invalid) in typed_cases() {
            let decl = field().type_tag(type_tag);

            let value = validate_value(&decl, valid.clone())
                .await
                .unwrap_or_else(|e| panic!("{} should accept {}: {}", type_tag, valid, e));
            assert_eq!(value, expected, "{} normalizes {}", type_tag, valid);

            if let Some(invalid) = invalid {
                assert!(
                    validate_value(&decl, invalid.clone()).await.is_err(),
                    "{} should reject {}",
                    type_tag,
                    invalid
                );
            }
        }
    }

    #[tokio::test]
    async fn test_string_coerces_numbers() {
        let value = validate_value(&field().type_tag("string"), json!(12345))
            .await
            .expect("should validate");
        assert_eq!(value, json!("12345"));
    }

    #[tokio::test]
    async fn test_integer_string_becomes_number() {
        let value = validate_value(&field().type_tag("integer"), json!("1235"))
            .await
            .expect("should validate");
        assert_eq!(value, json!(1235));
        assert!(value.is_i64());
    }

    #[tokio::test]
    async fn test_integer_rejects_letters() {
        let err = validate_value(&field().type_tag("integer"), json!("abcd"))
            .await
            .expect_err("should fail");
        assert!(matches!(err, ValidationError::ValidationFailed { .. }));
    }

    #[tokio::test]
    async fn test_any_accepts_everything() {
        let value = validate_value(&field(), json!("hello"))
            .await
            .expect("should validate");
        assert_eq!(value, json!("hello"));
    }

    #[tokio::test]
    async fn test_custom_error_message_on_required() {
        let decl = field().required().error_message("My Custom Error");
        let err = validate_value(&decl, json!("")).await.expect_err("should fail");
        assert_eq!(err.to_string(), "My Custom Error");
    }

    #[tokio::test]
    async fn test_required_rejects_every_empty_form() {
        let decl = field().required().repeated();
        for empty in [json!(null), json!(""), json!([])] {
            let err = validate_value(&decl, empty.clone())
                .await
                .expect_err("empty value should fail");
            assert_eq!(err.to_string(), REQUIRED_MESSAGE, "for {}", empty);
        }
    }

    #[tokio::test]
    async fn test_required_accepts_falsy_values() {
        let decl = field().required();
        for falsy in [json!(0), json!(false)] {
            assert_eq!(validate_value(&decl, falsy.clone()).await, Ok(falsy));
        }
    }

    #[tokio::test]
    async fn test_default_used_when_value_missing() {
        let decl = field().type_tag("email").default_value("hello@world.com");
        let value = validate_value(&decl, Value::Null).await.expect("should validate");
        assert_eq!(value, json!("hello@world.com"));
    }

    #[tokio::test]
    async fn test_default_does_not_replace_zero() {
        let decl = field().type_tag("integer").default_value(5);
        assert_eq!(validate_value(&decl, json!(0)).await, Ok(json!(0)));
    }

    #[tokio::test]
    async fn test_additional_validator_rejects() {
        let decl = field().type_tag("string").validate_with(|_, _| false);
        let err = validate_value(&decl, json!("hello")).await.expect_err("should fail");
        assert_eq!(err.to_string(), "Invalid value: hello");
    }

    #[tokio::test]
    async fn test_additional_async_validator_rejects() {
        let decl = field().type_tag("string").validate_async(|_, _| async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Err("Invalid".to_string())
        });
        let err = validate_value(&decl, json!("hello")).await.expect_err("should fail");
        assert_eq!(err.to_string(), "Invalid");
    }

    #[tokio::test]
    async fn test_additional_filter_replaces_value() {
        let decl = field().type_tag("string").filter_with(|_| json!("MYFILTER"));
        assert_eq!(validate_value(&decl, json!("hello")).await, Ok(json!("MYFILTER")));
    }

    #[tokio::test]
    async fn test_filters_apply_in_declared_order() {
        let decl = field()
            .filter("trim")
            .filter_with(|v| json!(format!("[{}]", v.as_str().unwrap_or_default())))
            .filter("toUpper");
        assert_eq!(validate_value(&decl, json!("  ab ")).await, Ok(json!("[AB]")));
    }

    #[tokio::test]
    async fn test_repeated_field_is_filtered_element_wise() {
        let decl = field().type_tag("string").repeated().filter("toLower");
        let value = validate_value(&decl, json!(["#AAAAAA", "#bbbbbb"]))
            .await
            .expect("should validate");
        assert_eq!(value, json!(["#aaaaaa", "#bbbbbb"]));
    }

    #[tokio::test]
    async fn test_checkbox_checks_every_element() {
        let decl = field()
            .type_tag("checkbox")
            .repeated()
            .options(json!(["red", "green", "blue"]));

        assert_eq!(
            validate_value(&decl, json!(["red", "blue"])).await,
            Ok(json!(["red", "blue"]))
        );
        let err = validate_value(&decl, json!(["red", "pink"]))
            .await
            .expect_err("pink is not an option");
        assert_eq!(err.to_string(), "Invalid value: pink");
    }

    #[tokio::test]
    async fn test_select_accepts_object_keys() {
        let decl = field()
            .type_tag("select")
            .options(json!({"fr": "France", "de": "Germany"}));
        assert_eq!(validate_value(&decl, json!("fr")).await, Ok(json!("fr")));
        assert!(validate_value(&decl, json!("France")).await.is_err());
    }

    #[tokio::test]
    async fn test_every_validator_runs_even_after_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let decl = (0..4).fold(field().repeated(), |decl, i| {
            let calls = Arc::clone(&calls);
            decl.validate_with(move |_: &Value, _: &FieldDescriptor| {
                calls.fetch_add(1, Ordering::SeqCst);
                i != 0
            })
        });

        assert!(validate_value(&decl, json!([1, 2, 3])).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 12);
    }
}

mod async_validator_tests {
    use super::*;

    struct ReservedNames {
        reserved: Vec<&'static str>,
    }

    #[async_trait]
    impl AsyncValidator for ReservedNames {
        async fn validate(&self, value: &Value, _field: &FieldDescriptor) -> Result<(), String> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            match value.as_str() {
                Some(name) if self.reserved.iter().any(|r| *r == name) => {
                    Err(format!("'{}' is reserved", name))
                }
                _ => Ok(()),
            }
        }
    }

    fn username() -> FieldDeclaration {
        field().type_tag("alnum").validate_by(ReservedNames {
            reserved: vec!["admin", "root"],
        })
    }

    #[tokio::test]
    async fn test_trait_validator_accepts() {
        assert_eq!(validate_value(&username(), json!("alice")).await, Ok(json!("alice")));
    }

    #[tokio::test]
    async fn test_trait_validator_message() {
        let err = validate_value(&username(), json!("root"))
            .await
            .expect_err("root is reserved");
        assert_eq!(err.to_string(), "'root' is reserved");
    }

    #[tokio::test]
    async fn test_error_message_overrides_async_message() {
        let decl = username().error_message("Pick another name");
        let err = validate_value(&decl, json!("admin"))
            .await
            .expect_err("admin is reserved");
        assert_eq!(err.to_string(), "Pick another name");
    }

    #[tokio::test]
    async fn test_deferred_timeout_applies_error_message() {
        let engine = Engine::builder()
            .deferred_timeout(Duration::from_millis(10))
            .build();
        let decl = field()
            .error_message("Try again later")
            .validate_async(|_, _| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            });

        let err = engine
            .validate_value(&decl, json!("x"))
            .await
            .expect_err("should time out");
        assert_eq!(err.to_string(), "Try again later");
    }
}

mod record_tests {
    use super::*;

    fn person() -> Schema {
        Schema::new()
            .field("firstname", FieldDeclaration::new().required())
            .field("lastname", FieldDeclaration::new().required())
            .field("age", FieldDeclaration::new().type_tag("integer"))
    }

    #[tokio::test]
    async fn test_missing_required_fields_are_all_reported() {
        let err = validate_record(&person(), &json!({}))
            .await
            .expect_err("record should fail");

        let errors = err.field_errors().expect("should carry field errors");
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["firstname", "lastname"]);
        assert_eq!(
            errors.get("firstname").map(ToString::to_string).as_deref(),
            Some("This field is required")
        );
        assert!(!errors.contains("age"));
    }

    #[tokio::test]
    async fn test_valid_record_has_exactly_schema_keys() {
        let record = validate_record(
            &person(),
            &json!({"firstname": "John", "lastname": "Doe", "age": "42", "admin": true}),
        )
        .await
        .expect("record should validate");

        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["firstname", "lastname", "age"]);
        assert_eq!(record["age"], json!(42));
    }

    #[tokio::test]
    async fn test_optional_empty_string_survives_record() {
        let schema = Schema::new().field("nick", FieldDeclaration::new());
        let record = validate_record(&schema, &json!({"nick": ""}))
            .await
            .expect("record should validate");
        assert_eq!(record["nick"], json!(""));
    }

    #[tokio::test]
    async fn test_absent_optional_field_is_null() {
        let record = validate_record(&person(), &json!({"firstname": "John", "lastname": "Doe"}))
            .await
            .expect("record should validate");
        assert_eq!(record["age"], Value::Null);
    }

    #[tokio::test]
    async fn test_error_count_matches_invalid_fields() {
        let schema = Schema::new()
            .field("a", FieldDeclaration::new().required())
            .field("b", FieldDeclaration::new().required())
            .field("c", FieldDeclaration::new().required())
            .field("d", FieldDeclaration::new().type_tag("integer"))
            .field("e", FieldDeclaration::new().type_tag("email"));

        let err = validate_record(&schema, &json!({"c": "ok", "d": "7", "e": "a@b.io"}))
            .await
            .expect_err("record should fail");
        assert_eq!(err.field_errors().map(FieldErrors::len), Some(2));
    }

    #[tokio::test]
    async fn test_errors_serialize_as_message_map() {
        let err = validate_record(&person(), &json!({"age": "old"}))
            .await
            .expect_err("record should fail");
        let errors = serde_json::to_value(err.field_errors().expect("field errors"))
            .expect("errors should serialize");
        assert_eq!(
            errors,
            json!({
                "firstname": "This field is required",
                "lastname": "This field is required",
                "age": "Invalid value: old"
            })
        );
    }

    #[tokio::test]
    async fn test_name_property_reads_other_key() {
        let schema = Schema::new().field(
            "email",
            FieldDeclaration::new().name("user_email").type_tag("email"),
        );
        let record = validate_record(&schema, &json!({"user_email": "Jane@Example.com"}))
            .await
            .expect("record should validate");
        assert_eq!(record["email"], json!("jane@example.com"));
    }

    #[tokio::test]
    async fn test_schema_is_reusable() {
        let schema = person();
        let data = json!({"firstname": "John", "lastname": "Doe"});
        let first = validate_record(&schema, &data).await.expect("first run");
        let second = validate_record(&schema, &data).await.expect("second run");
        assert_eq!(first, second);
        assert!(schema.get("age").is_some_and(|d| d.validators.is_empty()));
    }
}
