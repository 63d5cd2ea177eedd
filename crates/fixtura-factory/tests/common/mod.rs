#![allow(dead_code)]

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fixtura_core::{Overrides, Record};
use fixtura_factory::{Factory, FactoryConfig};
use fixtura_store::InMemoryStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DreamNote {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub dream: Option<DreamNote>,
    pub visited_places: Vec<String>,
    pub great_ideas: [String; 3],
}

impl Record for User {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: Uuid,
    pub color: String,
}

impl Record for Widget {}

/// Identity lives under a tagged attribute instead of `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub code: String,
    pub label: String,
}

impl Record for Badge {
    fn identity_field() -> Option<&'static str> {
        Some("code")
    }
}

/// No identity attribute at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
}

impl Record for Note {}

pub fn dream(title: &str) -> DreamNote {
    DreamNote {
        title: title.to_string(),
        content: String::new(),
    }
}

pub fn make_user() -> User {
    User {
        id: Uuid::new_v4(),
        name: "name".to_string(),
        dream: Some(dream("My Dream")),
        visited_places: vec!["New York City".to_string(), "San Francisco".to_string()],
        great_ideas: [
            "Meet the one I love".to_string(),
            "Build the greatest product of all time".to_string(),
            "Live and die peacefully".to_string(),
        ],
    }
}

pub fn make_widget() -> Widget {
    Widget {
        id: Uuid::new_v4(),
        color: "red".to_string(),
    }
}

pub fn name(value: &str) -> Overrides {
    Overrides::new().set("name", value)
}

/// Register the user blueprints every suite relies on.
pub fn register_users(factory: &Factory) {
    factory.register("User", make_user);
    factory.register_ref("Pointer User", || Arc::new(make_user()));
    factory.register_ref("PUser", || Arc::new(make_user()));
    factory.register("Widget", make_widget);
    factory
        .ascend("Super User", "User", || {
            Overrides::new().set("name", "Super User")
        })
        .expect("User is registered");
}

pub fn factory() -> Factory {
    let factory = Factory::new(FactoryConfig::default());
    register_users(&factory);
    factory
}

pub fn factory_with_store() -> (Factory, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let factory = Factory::with_store(FactoryConfig::default(), store.clone());
    register_users(&factory);
    (factory, store)
}
