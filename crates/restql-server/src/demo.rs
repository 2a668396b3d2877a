//! Demo dataset: people, accounts, users and plans held in static maps, plus
//! the resolver table serving them through `schema.graphql`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use restql_api::ResolverError;
use restql_schema::{ResolveParams, ResolverResult, ResolverTable};
use serde::Serialize;
use serde_json::Value;

/// The demo schema shipped with the server.
pub const SCHEMA: &str = include_str!("../schema.graphql");

#[derive(Debug, Clone, Serialize)]
pub struct Person {
    pub id: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: &'static str,
    pub plan: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: &'static str,
    pub person: &'static str,
    pub account: &'static str,
    #[serde(rename = "type")]
    pub user_type: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub id: &'static str,
    pub name: &'static str,
}

pub static PEOPLE: LazyLock<BTreeMap<&'static str, Person>> =
    LazyLock::new(|| BTreeMap::from([("1", Person { id: "1" }), ("2", Person { id: "2" })]));

pub static ACCOUNTS: LazyLock<BTreeMap<&'static str, Account>> = LazyLock::new(|| {
    BTreeMap::from([
        ("123", Account { id: "123", plan: "1" }),
        ("234", Account { id: "234", plan: "2" }),
    ])
});

pub static USERS: LazyLock<BTreeMap<&'static str, User>> = LazyLock::new(|| {
    BTreeMap::from([
        (
            "1",
            User {
                id: "1",
                person: "1",
                account: "123",
                user_type: Some("ACCOUNT_HOLDER"),
            },
        ),
        (
            "2",
            User {
                id: "2",
                person: "1",
                account: "234",
                user_type: None,
            },
        ),
        (
            "3",
            User {
                id: "3",
                person: "2",
                account: "123",
                user_type: Some("EMPLOYEE"),
            },
        ),
    ])
});

pub static PLANS: LazyLock<BTreeMap<&'static str, Plan>> = LazyLock::new(|| {
    BTreeMap::from([
        (
            "1",
            Plan {
                id: "1",
                name: "Basic (20 Employees)",
            },
        ),
        (
            "2",
            Plan {
                id: "2",
                name: "Standard (30 Employees)",
            },
        ),
    ])
});

fn to_value<T: Serialize>(value: &T) -> ResolverResult {
    serde_json::to_value(value).map_err(|e| ResolverError::new(e.to_string()))
}

fn to_list<'a, T: Serialize + 'a>(items: impl Iterator<Item = &'a T>) -> ResolverResult {
    items
        .map(to_value)
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

/// Looks up `id` (an argument of a root field) in `table`; misses are 404s.
fn find_by_id<T: Serialize>(
    table: &BTreeMap<&'static str, T>,
    kind: &str,
    params: ResolveParams<'_>,
) -> ResolverResult {
    let id = params.args.get_str("id").unwrap_or_default();
    match table.get(id) {
        Some(item) => to_value(item),
        None => Err(ResolverError::not_found(format!(
            "no {kind} found with ID '{id}'"
        ))),
    }
}

/// Follows the reference stored under `key` in the source value.
///
/// A dangling reference is a server-side inconsistency, not a client error.
fn follow_reference<T: Serialize>(
    table: &BTreeMap<&'static str, T>,
    kind: &str,
    key: &str,
    params: ResolveParams<'_>,
) -> ResolverResult {
    let id = params.source_str(key).unwrap_or_default();
    match table.get(id) {
        Some(item) => to_value(item),
        None => Err(ResolverError::new(format!("no {kind} found with ID '{id}'"))),
    }
}

/// The resolver table for [`SCHEMA`].
pub fn resolvers() -> ResolverTable {
    ResolverTable::builder()
        // Query
        .field("Query", "person", |p| find_by_id(&PEOPLE, "person", p))
        .field("Query", "account", |p| find_by_id(&ACCOUNTS, "account", p))
        .field("Query", "user", |p| find_by_id(&USERS, "user", p))
        // Person
        .source_field("Person", "id", "id")
        .field("Person", "users", |p| {
            let person = p.source_str("id").unwrap_or_default();
            to_list(USERS.values().filter(|user| user.person == person))
        })
        // Account
        .source_field("Account", "id", "id")
        .field("Account", "plan", |p| follow_reference(&PLANS, "plan", "plan", p))
        .field("Account", "users", |p| {
            let account = p.source_str("id").unwrap_or_default();
            to_list(USERS.values().filter(|user| user.account == account))
        })
        .field("Account", "usersByType", |p| {
            let account = p.source_str("id").unwrap_or_default();
            let user_type = p.args.get_str("type").unwrap_or_default();
            to_list(USERS.values().filter(|user| {
                user.account == account && user.user_type.unwrap_or_default() == user_type
            }))
        })
        // Plan
        .source_field("Plan", "id", "id")
        .source_field("Plan", "name", "name")
        // User
        .source_field("User", "id", "id")
        .field("User", "person", |p| {
            follow_reference(&PEOPLE, "person", "person", p)
        })
        .field("User", "account", |p| {
            follow_reference(&ACCOUNTS, "account", "account", p)
        })
        .source_field("User", "type", "type")
        .build()
}
