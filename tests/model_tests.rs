use chrono::Utc;
use uuid::Uuid;
use verse_portal::models::{Post, PostPayload, Section, SubmitAccessRequest, UpdateAccessRequest, User};

#[test]
fn test_post_serializes_with_camel_case_keys() {
    let post = Post {
        id: Uuid::new_v4(),
        title: "Title".to_string(),
        category: "History".to_string(),
        author_email: "writer@example.com".to_string(),
        author_name: "Writer".to_string(),
        sections: vec![Section {
            subtitle: "Intro".to_string(),
            description: "Body".to_string(),
            image_url: Some("https://img.example.com/1.jpg".to_string()),
        }],
        created_at: Utc::now(),
        updated_at: Utc::now(),
        ..Post::default()
    };

    let json_output = serde_json::to_string(&post).unwrap();

    // The wire format is camelCase end to end.
    assert!(json_output.contains(r#""authorEmail":"writer@example.com""#));
    assert!(json_output.contains(r#""customCategory""#));
    assert!(json_output.contains(r#""imageUrl""#));
    assert!(json_output.contains(r#""createdAt""#));
    assert!(!json_output.contains("author_email"));
}

#[test]
fn test_user_serialization_never_leaks_the_hash() {
    let user = User {
        id: Uuid::new_v4(),
        username: "scribe".to_string(),
        email: "scribe@example.com".to_string(),
        password_hash: "$argon2id$v=19$secret".to_string(),
        is_admin: false,
        is_allowed_to_create: true,
        created_at: Utc::now(),
    };

    let json_output = serde_json::to_string(&user).unwrap();

    assert!(!json_output.contains("argon2id"));
    assert!(!json_output.contains("passwordHash"));
    assert!(json_output.contains(r#""isAllowedToCreate":true"#));
}

#[test]
fn test_post_payload_ignores_client_supplied_author_email() {
    // The payload type has no author-email field at all; a client sending one
    // deserializes cleanly and the value goes nowhere.
    let payload: PostPayload = serde_json::from_str(
        r#"{
            "title": "T",
            "category": "History",
            "authorName": "A",
            "authorEmail": "attacker@evil.com",
            "sections": [{"subtitle": "s", "description": "d"}]
        }"#,
    )
    .unwrap();

    assert_eq!(payload.title, "T");
    assert_eq!(payload.sections.len(), 1);
    assert!(!serde_json::to_string(&payload).unwrap().contains("attacker"));
}

#[test]
fn test_submit_access_request_defaults_absent_fields() {
    // Absent fields become blanks/None so the handler can answer with its own
    // validation failure instead of a deserialization error.
    let payload: SubmitAccessRequest =
        serde_json::from_str(r#"{ "email": "x@example.com" }"#).unwrap();

    assert_eq!(payload.email, "x@example.com");
    assert_eq!(payload.full_name, "");
    assert_eq!(payload.phone, None);
}

#[test]
fn test_update_access_request_optionality() {
    // This confirms the structure supports partial merges (all fields are Option<T>).
    let partial_update = UpdateAccessRequest {
        profession: Some("Archivist".to_string()),
        ..UpdateAccessRequest::default()
    };

    let json_output = serde_json::to_string(&partial_update).unwrap();
    assert!(json_output.contains(r#""profession":"Archivist""#));
    // None fields are omitted entirely.
    assert!(!json_output.contains("fullName"));
    assert!(!json_output.contains("phone"));
}
