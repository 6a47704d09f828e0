//! Shared fixtures for the denormalization integration tests.
//!
//! Each integration test compiles this module separately, so some helpers look unused from
//! a given test file.

#![allow(dead_code)]

use rehydrate_schema::SchemaIndex;
use rehydrate_value::{PersistentValue, PlainValue};
use serde_json::{Value as JsonValue, json};

/// Articles reference their author and a list of collections; users list their articles back.
pub fn blog_schemas() -> SchemaIndex {
    let docs = json!([
        {
            "$kind": "defentity",
            "name": "articles",
            "attributes": {
                "author": {"$entity": "users"},
                "collections": {"$list": {"$entity": "collections"}},
                "likes": {"$list": {"user": {"$entity": "users"}}}
            }
        },
        {
            "$kind": "defentity",
            "name": "users",
            "attributes": {
                "articles": {"$list": {"$entity": "articles"}}
            }
        },
        {
            "$kind": "defentity",
            "name": "collections",
            "attributes": {
                "curator": {"$entity": "users"}
            }
        }
    ]);
    SchemaIndex::from_json_str(&docs.to_string()).expect("blog schemas")
}

pub fn blog_store() -> JsonValue {
    json!({
        "articles": {
            "1": {"id": 1, "title": "T", "author": 1, "collections": [1, 2]},
            "2": {"id": 2, "title": "Null author", "author": null},
            "3": {"id": 3, "title": "No author"},
            "4": {"id": 4, "title": "Ghost author", "author": 99},
            "5": {"id": 5, "title": "Deleted author", "author": ""},
            "6": {
                "id": 6,
                "title": "Liked",
                "likes": [{"user": 1, "at": "monday"}, {"user": 8, "at": "tuesday"}]
            },
            "7": {"id": 7, "title": "Cyclic", "author": 8}
        },
        "users": {
            "1": {"id": 1, "name": "Dan"},
            "8": {"id": 8, "name": "Ann", "articles": [7]},
            "": {"id": "", "name": "Deleted"}
        },
        "collections": {
            "1": {"id": 1, "name": "C1"},
            "2": {"id": 2, "name": "C2"}
        }
    })
}

pub fn plain(value: JsonValue) -> PlainValue {
    PlainValue::from(value)
}

pub fn persistent(value: JsonValue) -> PersistentValue {
    PersistentValue::from(value)
}

/// JSON rendering of an acyclic plain result.
pub fn to_json(value: &PlainValue) -> JsonValue {
    value.to_json().expect("acyclic value")
}
