/// Integration-level tests for the `shared` crate.
///
/// Each section tests one module; unit tests that are tightly coupled to
/// private helpers live inside the modules themselves (see `#[cfg(test)]`
/// blocks in `config.rs` and `directory.rs`).
// ---------------------------------------------------------------------------
// JWT claims
// ---------------------------------------------------------------------------
#[cfg(test)]
mod jwt_tests {
    use shared::types::*;

    fn sample_claims() -> JwtClaims {
        JwtClaims {
            user_id: "8f14e45f-ceea-467f-a0e6-5a8d5b5b4f3e".to_string(),
            username: "admin".to_string(),
            role: Role::Admin,
            iat: 1_700_000_000,
            exp: 1_700_086_400,
        }
    }

    #[test]
    fn claims_serialize_and_deserialize_roundtrip() {
        let c = sample_claims();
        let json = serde_json::to_string(&c).unwrap();
        let back: JwtClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn claims_json_uses_wire_key_names() {
        let json = serde_json::to_value(sample_claims()).unwrap();
        for key in &["userId", "username", "role", "iat", "exp"] {
            assert!(json.get(key).is_some(), "missing key: {}", key);
        }
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn role_is_serialized_lowercase() {
        let json = serde_json::to_value(sample_claims()).unwrap();
        assert_eq!(json["role"], "admin");
    }
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

#[cfg(test)]
mod role_tests {
    use shared::types::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(" editor ".parse::<Role>(), Ok(Role::Editor));
    }

    #[test]
    fn unknown_role_is_an_error() {
        let err = "root".parse::<Role>().unwrap_err();
        assert_eq!(err, UnknownRole("root".to_string()));
        assert_eq!(err.to_string(), "unknown role: root");
    }

    #[test]
    fn display_matches_wire_form() {
        assert_eq!(Role::Editor.to_string(), "editor");
        assert_eq!(serde_json::to_string(&Role::Editor).unwrap(), r#""editor""#);
    }
}

// ---------------------------------------------------------------------------
// Login types
// ---------------------------------------------------------------------------

#[cfg(test)]
mod login_tests {
    use shared::types::*;

    #[test]
    fn login_data_deserializes_both_fields() {
        let d: LoginData =
            serde_json::from_str(r#"{"username":"admin","password":"s3cret"}"#).unwrap();
        assert_eq!(d.username, "admin");
        assert_eq!(d.password, "s3cret");
        assert!(d.is_complete());
    }

    #[test]
    fn missing_password_deserializes_as_incomplete() {
        let d: LoginData = serde_json::from_str(r#"{"username":"admin"}"#).unwrap();
        assert!(!d.is_complete());
    }

    #[test]
    fn blank_username_is_incomplete() {
        let d: LoginData = serde_json::from_str(r#"{"username":"  ","password":"x"}"#).unwrap();
        assert!(!d.is_complete());
    }

    #[test]
    fn login_response_never_contains_a_password_hash() {
        let resp = LoginResponse::new(
            "a.b.c".to_string(),
            UserSummary {
                username: "admin".to_string(),
                name: "Site Admin".to_string(),
                email: "admin@campus.edu".to_string(),
                role: Role::Admin,
            },
        );
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["token"], "a.b.c");
        assert_eq!(json["user"]["role"], "admin");
        assert_eq!(json["user"]["name"], "Site Admin");
        let user = json["user"].as_object().unwrap();
        assert_eq!(user.len(), 4);
        assert!(!json.to_string().contains("hash"));
    }
}

// ---------------------------------------------------------------------------
// Error body
// ---------------------------------------------------------------------------

#[cfg(test)]
mod error_tests {
    use shared::types::ErrorResponse;

    #[test]
    fn error_body_has_single_error_key() {
        let json = serde_json::to_value(ErrorResponse::new("Unauthorized")).unwrap();
        assert_eq!(json, serde_json::json!({"error": "Unauthorized"}));
    }
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

#[cfg(test)]
mod collection_tests {
    use shared::types::Collection;

    #[test]
    fn names_are_unique_url_segments() {
        let names: Vec<_> = Collection::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["locations", "teachers", "timetable"]);
    }

    #[test]
    fn timetable_requires_seven_fields() {
        assert_eq!(Collection::Timetable.required_fields().len(), 7);
        assert!(Collection::Timetable.required_fields().contains(&"semester"));
    }

    #[test]
    fn teachers_require_office_hours() {
        assert!(Collection::Teachers.required_fields().contains(&"officeHours"));
    }
}
