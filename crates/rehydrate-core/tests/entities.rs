mod helpers;

use helpers::{blog_schemas, blog_store, persistent, plain, to_json};
use rehydrate_core::{Bag, Denormalizer, denormalize, denormalize_with_bag};
use rehydrate_schema::{EntitySchema, Schema, SchemaIndex};
use rehydrate_value::{Container, EntityId, PathSegment, PlainValue};
use serde_json::json;

fn article(id: serde_json::Value) -> serde_json::Value {
    let store = plain(blog_store());
    let result = denormalize(
        Some(&plain(id)),
        &store,
        &Schema::entity("articles"),
        &blog_schemas(),
    )
    .expect("denormalized");
    to_json(&result)
}

#[test]
fn article_with_author_and_collections() {
    assert_eq!(
        article(json!(1)),
        json!({
            "id": 1,
            "title": "T",
            "author": {"id": 1, "name": "Dan"},
            "collections": [{"id": 1, "name": "C1"}, {"id": 2, "name": "C2"}]
        })
    );
}

#[test]
fn persistent_article_matches_plain_result() {
    let store = persistent(blog_store());
    let result = denormalize(
        Some(&persistent(json!(1))),
        &store,
        &Schema::entity("articles"),
        &blog_schemas(),
    )
    .expect("denormalized");
    assert_eq!(result.to_json(), article(json!(1)));
}

#[test]
fn id_and_record_forms_agree() {
    let store = plain(blog_store());
    let record = store
        .get_at_path(&["articles".into(), "1".into()])
        .expect("stored article");
    let schemas = blog_schemas();
    let schema = Schema::entity("articles");
    let from_id = denormalize(Some(&plain(json!(1))), &store, &schema, &schemas);
    let from_record = denormalize(Some(&record), &store, &schema, &schemas);
    assert_eq!(
        from_id.as_ref().map(to_json),
        from_record.as_ref().map(to_json)
    );
}

#[test]
fn numeric_and_string_ids_are_the_same_entity() {
    assert_eq!(article(json!(1)), article(json!("1")));
    assert_eq!(article(json!(1)), article(json!(1.0)));
}

#[test]
fn null_attribute_stays_null() {
    assert_eq!(
        article(json!(2)),
        json!({"id": 2, "title": "Null author", "author": null})
    );
}

#[test]
fn absent_attribute_stays_absent() {
    let result = article(json!(3));
    assert_eq!(result, json!({"id": 3, "title": "No author"}));
    assert!(result.get("author").is_none());
}

#[test]
fn missing_record_leaves_the_bare_id() {
    assert_eq!(article(json!(4))["author"], json!(99));
}

#[test]
fn empty_string_is_a_real_id() {
    assert_eq!(
        article(json!(5))["author"],
        json!({"id": "", "name": "Deleted"})
    );
}

#[test]
fn unknown_top_level_id_passes_through() {
    assert_eq!(article(json!(404)), json!(404));
}

#[test]
fn absent_input_stays_absent() {
    let store = plain(blog_store());
    let result = denormalize::<PlainValue>(
        None,
        &store,
        &Schema::entity("articles"),
        &blog_schemas(),
    );
    assert!(result.is_none());
}

#[test]
fn null_input_is_returned_unchanged() {
    assert_eq!(article(json!(null)), json!(null));
}

#[test]
fn unknown_entity_type_passes_through() {
    let store = plain(blog_store());
    let result = denormalize(
        Some(&plain(json!(1))),
        &store,
        &Schema::entity("ghosts"),
        &blog_schemas(),
    )
    .expect("value");
    assert_eq!(to_json(&result), json!(1));
}

#[test]
fn store_is_not_modified() {
    let store = plain(blog_store());
    let before = to_json(&store);
    let schemas = blog_schemas();
    for id in 1..=7 {
        let result = denormalize(
            Some(&plain(json!(id))),
            &store,
            &Schema::entity("articles"),
            &schemas,
        );
        assert!(result.is_some());
    }
    assert_eq!(to_json(&store), before);
}

#[test]
fn embedded_input_is_not_modified() {
    let store = plain(blog_store());
    let input = plain(json!({"id": 1, "title": "T", "author": 1}));
    let result = denormalize(
        Some(&input),
        &store,
        &Schema::entity("articles"),
        &blog_schemas(),
    )
    .expect("denormalized");
    assert!(!result.ptr_eq(&input));
    assert_eq!(to_json(&input), json!({"id": 1, "title": "T", "author": 1}));
    assert_eq!(to_json(&result)["author"], json!({"id": 1, "name": "Dan"}));
}

#[test]
fn embedded_entity_without_id_is_still_expanded() {
    let store = plain(blog_store());
    let input = plain(json!({"title": "Draft", "author": 1}));
    let result = denormalize(
        Some(&input),
        &store,
        &Schema::entity("articles"),
        &blog_schemas(),
    )
    .expect("denormalized");
    assert_eq!(
        to_json(&result),
        json!({"title": "Draft", "author": {"id": 1, "name": "Dan"}})
    );
}

#[test]
fn shared_references_resolve_to_one_instance() {
    let store = plain(json!({
        "articles": {
            "1": {"id": 1, "author": 1, "collections": [1]},
        },
        "users": {"1": {"id": 1, "name": "Dan"}},
        "collections": {"1": {"id": 1, "curator": 1}}
    }));
    let result = denormalize(
        Some(&plain(json!(1))),
        &store,
        &Schema::entity("articles"),
        &blog_schemas(),
    )
    .expect("denormalized");
    let author = result.get("author").expect("author");
    let curator = result
        .get_at_path(&["collections".into(), PathSegment::Index(0), "curator".into()])
        .expect("curator");
    assert!(author.ptr_eq(&curator));
}

#[test]
fn caller_bag_is_reused_across_calls() {
    let store = plain(blog_store());
    let schemas = blog_schemas();
    let mut bag = Bag::new();
    let first = denormalize_with_bag(
        Some(&plain(json!(1))),
        &store,
        &Schema::entity("articles"),
        &schemas,
        &mut bag,
    )
    .expect("article");
    assert!(bag.contains("articles", &EntityId::from("1")));
    assert!(bag.contains("users", &EntityId::from(1)));
    assert_eq!(bag.len(), 4);

    let author = denormalize_with_bag(
        Some(&plain(json!(1))),
        &store,
        &Schema::entity("users"),
        &schemas,
        &mut bag,
    )
    .expect("user");
    assert!(author.ptr_eq(&first.get("author").expect("author")));
    assert_eq!(bag.len(), 4);
}

#[test]
fn fresh_bag_per_call_builds_new_instances() {
    let store = plain(blog_store());
    let schemas = blog_schemas();
    let denormalizer = Denormalizer::new(&schemas);
    let schema = Schema::entity("users");
    let first = denormalizer
        .denormalize(Some(&plain(json!(1))), &store, &schema)
        .expect("user");
    let second = denormalizer
        .denormalize(Some(&plain(json!(1))), &store, &schema)
        .expect("user");
    assert!(!first.ptr_eq(&second));
    assert_eq!(to_json(&first), to_json(&second));
}

#[test]
fn id_accessor_selects_the_bag_slot() {
    let schemas = SchemaIndex::from_entities([
        EntitySchema::new("memberships")
            .with_id_accessor(|entity| {
                let user = entity.attribute_id("user")?;
                let group = entity.attribute_id("group")?;
                Some(EntityId::new(format!("{user}-{group}")))
            })
            .define([("user", Schema::entity("users"))]),
        EntitySchema::new("users"),
    ])
    .expect("schemas");
    let store = plain(json!({"users": {"4": {"id": 4, "name": "Eve"}}}));
    let input = plain(json!([
        {"user": 4, "group": "admins"},
        {"user": 4, "group": "admins"}
    ]));
    let mut bag = Bag::new();
    let result = denormalize_with_bag(
        Some(&input),
        &store,
        &Schema::collection(Schema::entity("memberships")),
        &schemas,
        &mut bag,
    )
    .expect("memberships");
    assert!(bag.contains("memberships", &EntityId::from("4-admins")));
    let first = result.get_at_path(&[PathSegment::Index(0)]).expect("first");
    let second = result.get_at_path(&[PathSegment::Index(1)]).expect("second");
    assert!(first.ptr_eq(&second));
    assert_eq!(
        to_json(&first),
        json!({"user": {"id": 4, "name": "Eve"}, "group": "admins"})
    );
}

#[test]
fn custom_id_attribute_is_used_for_embedded_entities() {
    let schemas = SchemaIndex::from_entities([
        EntitySchema::new("tags").with_id_attribute("slug"),
    ])
    .expect("schemas");
    let store = plain(json!({"tags": {}}));
    let input = plain(json!([{"slug": "rust"}, {"slug": "rust", "extra": true}]));
    let mut bag = Bag::new();
    let result = denormalize_with_bag(
        Some(&input),
        &store,
        &Schema::collection(Schema::entity("tags")),
        &schemas,
        &mut bag,
    )
    .expect("tags");
    assert_eq!(bag.len(), 1);
    assert_eq!(to_json(&result), json!([{"slug": "rust"}, {"slug": "rust"}]));
}
